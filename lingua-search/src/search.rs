//! Federated search engine
//!
//! One query fans out to four record sources (courses, lessons, exercises,
//! users). Each source does case-insensitive substring matching, newest first,
//! capped per source. Rows are projected into typed hits carrying a fixed
//! per-source relevance, then merged by `ranking::merge_ranked`.
//! Queries under two characters never reach a source.

use crate::database::DatabaseResult;
use crate::interface::{
    CourseHit, ExerciseHit, HitPayload, Identity, LessonHit, LinguaError, ResultKind, SearchFilters, SearchHit,
    SearchResponse, UserHit,
};
use crate::models::{display_name, CourseRow, ExerciseRow, LessonRow, UserRow};
use crate::ranking::{merge_ranked, GLOBAL_LIMIT};
use once_cell::sync::Lazy;
use regex::Regex;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Trimmed raw queries shorter than this return the empty response.
pub const MIN_QUERY_CHARS: usize = 2;

/// Per-source caps, applied before merging
pub const COURSE_LIMIT: usize = 20;
pub const LESSON_LIMIT: usize = 20;
pub const EXERCISE_LIMIT: usize = 20;
pub const USER_LIMIT: usize = 10;

/// Preview budgets in characters
pub const COURSE_DESCRIPTION_PREVIEW_CHARS: usize = 200;
pub const LESSON_CONTENT_PREVIEW_CHARS: usize = 150;
pub const EXERCISE_QUESTION_PREVIEW_CHARS: usize = 100;

/// Appended to every non-empty preview, cut or not
pub const PREVIEW_MARKER: &str = "...";

/// Anything but letters, numbers, underscore, whitespace and hyphens.
/// Numbers include `²` and `½`; connector punctuation (`‿`) and combining
/// marks are dropped. U+001C..U+001F count as whitespace.
static NON_QUERY_CHARS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^\p{Alphabetic}\p{N}_\s\x1C-\x1F\-]").expect("query character class is a valid regex")
});

/// Global fallback Tokio runtime for callers outside any runtime context.
static FALLBACK_RUNTIME: Lazy<tokio::runtime::Runtime> = Lazy::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("lingua-search-fallback")
        .build()
        .expect("Failed to create fallback tokio runtime")
});

/// Current runtime if there is one, otherwise the global fallback
fn runtime_handle() -> tokio::runtime::Handle {
    tokio::runtime::Handle::try_current().unwrap_or_else(|_| FALLBACK_RUNTIME.handle().clone())
}

/// Fixed relevance prior per source. Does not depend on the query.
pub fn base_relevance(kind: ResultKind) -> f64 {
    match kind {
        ResultKind::Course => 1.0,
        ResultKind::Lesson => 0.8,
        ResultKind::Exercise => 0.6,
        ResultKind::User => 0.9,
    }
}

pub fn is_short_query(raw: &str) -> bool {
    raw.trim().chars().count() < MIN_QUERY_CHARS
}

/// Sanitize free text into the needle handed to every source.
///
/// Lowercases, drops characters other than letters, numbers, `_`, `-` and
/// whitespace, then collapses whitespace runs to one space and trims.
/// Stripping happens before collapsing so that `"a ! b"` becomes `"a b"`.
/// Lowercasing comes first because it can emit combining marks (`İ`), which
/// the strip then removes; this keeps the function idempotent.
///
/// The result may be empty (`"!!"`), and an empty needle matches every record.
pub fn normalize_query(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    let stripped = NON_QUERY_CHARS.replace_all(&lowered, "");
    stripped
        .split(is_query_whitespace)
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Unicode whitespace plus the ASCII file/group/record/unit separators
fn is_query_whitespace(c: char) -> bool {
    c.is_whitespace() || ('\u{1c}'..='\u{1f}').contains(&c)
}

/// First `budget` characters followed by the marker. Empty text stays empty.
pub fn truncate_preview(text: &str, budget: usize) -> String {
    if text.is_empty() {
        return String::new();
    }
    let mut preview: String = text.chars().take(budget).collect();
    preview.push_str(PREVIEW_MARKER);
    preview
}

// ─────────────────────────────────────────────────────────────────────────────
// Projection
// ─────────────────────────────────────────────────────────────────────────────

pub fn project_course(row: CourseRow) -> SearchHit {
    let hit = CourseHit {
        description: truncate_preview(&row.description, COURSE_DESCRIPTION_PREVIEW_CHARS),
        id: row.id,
        title: row.title,
        language: row.language_code,
        level: row.level,
        thumbnail: row.thumbnail_url,
    };
    SearchHit::new(HitPayload::Course(hit), base_relevance(ResultKind::Course))
}

pub fn project_lesson(row: LessonRow) -> SearchHit {
    let hit = LessonHit {
        content_preview: truncate_preview(&row.content_text, LESSON_CONTENT_PREVIEW_CHARS),
        id: row.id,
        title: row.title,
        course_title: row.course_title,
        course_id: row.course_id,
        duration: row.duration_minutes,
    };
    SearchHit::new(HitPayload::Lesson(hit), base_relevance(ResultKind::Lesson))
}

pub fn project_exercise(row: ExerciseRow) -> SearchHit {
    let hit = ExerciseHit {
        question_preview: truncate_preview(&row.question_text, EXERCISE_QUESTION_PREVIEW_CHARS),
        subtype: row.exercise_type,
        id: row.id,
        title: row.title,
        lesson_title: row.lesson_title,
        course_title: row.course_title,
        points: row.points,
    };
    SearchHit::new(HitPayload::Exercise(hit), base_relevance(ResultKind::Exercise))
}

pub fn project_user(row: UserRow) -> SearchHit {
    let hit = UserHit {
        name: display_name(&row.first_name, &row.last_name, &row.username),
        id: row.id,
        username: row.username,
        email: row.email,
        user_type: row.user_type,
        avatar: row.avatar_url,
    };
    SearchHit::new(HitPayload::User(hit), base_relevance(ResultKind::User))
}

// ─────────────────────────────────────────────────────────────────────────────
// Sources
// ─────────────────────────────────────────────────────────────────────────────

/// What one source is asked for
#[derive(Debug, Clone)]
pub struct SourceQuery {
    /// Normalized query text, matched as a case-insensitive substring
    pub needle: String,
    pub filters: SearchFilters,
    pub limit: usize,
}

/// Read side of the record store, one method per source.
///
/// Each returns active records matching `needle` on any of its text fields,
/// newest first, at most `limit`. Calls block; the engine runs them on the
/// blocking pool.
pub trait CatalogSource: Send + Sync + 'static {
    fn find_courses(&self, query: &SourceQuery) -> DatabaseResult<Vec<CourseRow>>;
    fn find_lessons(&self, query: &SourceQuery) -> DatabaseResult<Vec<LessonRow>>;
    fn find_exercises(&self, query: &SourceQuery) -> DatabaseResult<Vec<ExerciseRow>>;
    fn find_users(&self, query: &SourceQuery) -> DatabaseResult<Vec<UserRow>>;
}

fn limit_for(kind: ResultKind) -> usize {
    match kind {
        ResultKind::Course => COURSE_LIMIT,
        ResultKind::Lesson => LESSON_LIMIT,
        ResultKind::Exercise => EXERCISE_LIMIT,
        ResultKind::User => USER_LIMIT,
    }
}

fn retrieve<S: CatalogSource>(source: &S, kind: ResultKind, query: &SourceQuery) -> DatabaseResult<Vec<SearchHit>> {
    let hits: Vec<SearchHit> = match kind {
        ResultKind::Course => source.find_courses(query)?.into_iter().map(project_course).collect(),
        ResultKind::Lesson => source.find_lessons(query)?.into_iter().map(project_lesson).collect(),
        ResultKind::Exercise => source.find_exercises(query)?.into_iter().map(project_exercise).collect(),
        ResultKind::User => source.find_users(query)?.into_iter().map(project_user).collect(),
    };
    Ok(hits)
}

/// Run one source on the blocking pool. The returned future resolves to that
/// source's projected hits.
fn spawn_retrieval<S: CatalogSource>(
    runtime: &tokio::runtime::Handle,
    source: &Arc<S>,
    kind: ResultKind,
    needle: &str,
    filters: &SearchFilters,
) -> impl Future<Output = Result<Vec<SearchHit>, LinguaError>> {
    let source = Arc::clone(source);
    let query = SourceQuery {
        needle: needle.to_string(),
        filters: filters.clone(),
        limit: limit_for(kind),
    };
    let handle = runtime.spawn_blocking(move || {
        let started = Instant::now();
        let result = retrieve(source.as_ref(), kind, &query);
        (result, started.elapsed())
    });

    async move {
        match handle.await {
            Ok((Ok(hits), elapsed)) => {
                debug!(source = kind.as_str(), count = hits.len(), elapsed_ms = millis(elapsed), "source retrieved");
                Ok(hits)
            }
            Ok((Err(e), _)) => {
                warn!(source = kind.as_str(), error = %e, "source retrieval failed");
                Err(LinguaError::from(e))
            }
            Err(join_error) => {
                warn!(source = kind.as_str(), error = %join_error, "source retrieval aborted");
                Err(LinguaError::RetrievalUnavailable(format!("{} retrieval aborted: {}", kind.as_str(), join_error)))
            }
        }
    }
}

fn millis(elapsed: Duration) -> u64 {
    elapsed.as_millis() as u64
}

/// Stateless search service over a record source.
pub struct FederatedSearch<S: CatalogSource> {
    source: Arc<S>,
}

impl<S: CatalogSource> Clone for FederatedSearch<S> {
    fn clone(&self) -> Self {
        Self { source: Arc::clone(&self.source) }
    }
}

impl<S: CatalogSource> FederatedSearch<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self { source }
    }

    /// Run one federated search.
    ///
    /// The user source is only consulted when an identity is present. Any
    /// source failing fails the whole search; partial results are never
    /// returned.
    pub async fn search(
        &self,
        query: &str,
        filters: &SearchFilters,
        identity: Option<&Identity>,
    ) -> Result<SearchResponse, LinguaError> {
        if is_short_query(query) {
            debug!("query below minimum length, skipping retrieval");
            return Ok(SearchResponse::short_circuit());
        }

        let started = Instant::now();
        let needle = normalize_query(query);
        let runtime = runtime_handle();

        let courses = spawn_retrieval(&runtime, &self.source, ResultKind::Course, &needle, filters);
        let lessons = spawn_retrieval(&runtime, &self.source, ResultKind::Lesson, &needle, filters);
        let exercises = spawn_retrieval(&runtime, &self.source, ResultKind::Exercise, &needle, filters);
        let users = identity.map(|_| spawn_retrieval(&runtime, &self.source, ResultKind::User, &needle, filters));
        let users = async move {
            match users {
                Some(retrieval) => retrieval.await,
                None => Ok(Vec::new()),
            }
        };

        // On the first failure the other blocking reads run to completion
        // detached and their rows are dropped.
        let (courses, lessons, exercises, users) = tokio::try_join!(courses, lessons, exercises, users)?;

        let groups = ResultKind::ALL.into_iter().zip([courses, lessons, exercises, users]).collect();
        let ranked = merge_ranked(groups, GLOBAL_LIMIT);

        info!(
            query = %query,
            needle = %needle,
            total = ranked.total,
            returned = ranked.results.len(),
            requester = ?identity.map(Identity::user_id),
            elapsed_ms = millis(started.elapsed()),
            "search complete"
        );

        Ok(SearchResponse {
            query: Some(query.to_string()),
            results: ranked.results,
            total: ranked.total,
            by_type: Some(ranked.by_type),
        })
    }
}
