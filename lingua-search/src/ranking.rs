//! Weighted merge of per-source results.
//!
//! `final_score = relevance * type_weight`. All hits are concatenated in
//! course, lesson, exercise, user order and stably sorted by final score,
//! highest first, so equal scores keep their concatenation order.

use crate::interface::{ByTypeCounts, ResultKind, SearchHit};

/// Maximum results in one response
pub const GLOBAL_LIMIT: usize = 50;

/// Merge-time multiplier per source, separate from the relevance prior
pub fn type_weight(kind: ResultKind) -> f64 {
    match kind {
        ResultKind::Course => 1.2,
        ResultKind::Lesson => 1.0,
        ResultKind::Exercise => 0.8,
        ResultKind::User => 1.1,
    }
}

pub fn final_score(hit: &SearchHit) -> f64 {
    hit.relevance * type_weight(hit.kind())
}

/// Merged output of all sources
#[derive(Debug, Clone, PartialEq)]
pub struct RankedResults {
    /// At most `limit` hits, best first
    pub results: Vec<SearchHit>,
    /// Number of hits before the cut
    pub total: u64,
    pub by_type: ByTypeCounts,
}

/// Score, concatenate, sort, truncate.
///
/// `groups` should be given in concatenation order. `by_type` counts each
/// group as handed in, before any truncation.
pub fn merge_ranked(groups: Vec<(ResultKind, Vec<SearchHit>)>, limit: usize) -> RankedResults {
    let mut by_type = ByTypeCounts::default();
    let mut merged = Vec::with_capacity(groups.iter().map(|(_, hits)| hits.len()).sum());

    for (kind, hits) in groups {
        by_type.add(kind, hits.len() as u64);
        merged.extend(hits.into_iter().map(|mut hit| {
            hit.final_score = Some(final_score(&hit));
            hit
        }));
    }

    let total = merged.len() as u64;
    // sort_by is stable: ties stay in concatenation order
    merged.sort_by(|a, b| {
        let a = a.final_score.unwrap_or(0.0);
        let b = b.final_score.unwrap_or(0.0);
        b.total_cmp(&a)
    });
    merged.truncate(limit);

    RankedResults { results: merged, total, by_type }
}
