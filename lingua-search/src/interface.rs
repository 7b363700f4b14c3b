//! Lingua search interface definition
//!
//! Public types shared by the engine, the store and the JSON endpoint: result
//! variants, the response shape, request filters, requester identity and the
//! error type.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{CourseLevel, ExerciseType, UserType};

// ═══════════════════════════════════════════════════════════════════════════════
// ENUMS
// ═══════════════════════════════════════════════════════════════════════════════

/// Which source produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultKind {
    Course,
    Lesson,
    Exercise,
    User,
}

impl ResultKind {
    /// Merge concatenation order, used to pair each source with its kind
    pub const ALL: [ResultKind; 4] = [Self::Course, Self::Lesson, Self::Exercise, Self::User];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResultKind::Course => "course",
            ResultKind::Lesson => "lesson",
            ResultKind::Exercise => "exercise",
            ResultKind::User => "user",
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// RESULT VARIANTS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseHit {
    pub id: String,
    pub title: String,
    /// Description preview (200 chars + "...")
    pub description: String,
    /// Language code
    pub language: String,
    pub level: CourseLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LessonHit {
    pub id: String,
    pub title: String,
    /// Content preview (150 chars + "...")
    pub content_preview: String,
    pub course_title: String,
    pub course_id: String,
    /// Minutes
    pub duration: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExerciseHit {
    pub subtype: ExerciseType,
    pub id: String,
    pub title: String,
    /// Question preview (100 chars + "...")
    pub question_preview: String,
    pub lesson_title: String,
    pub course_title: String,
    pub points: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserHit {
    pub id: String,
    /// Full name, or the username when no name is set
    pub name: String,
    pub username: String,
    pub email: String,
    pub user_type: UserType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// Per-source payload. Serializes with a `type` tag and only the fields of its
/// own variant.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HitPayload {
    Course(CourseHit),
    Lesson(LessonHit),
    Exercise(ExerciseHit),
    User(UserHit),
}

/// One search result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    #[serde(flatten)]
    pub payload: HitPayload,
    /// Fixed per-source prior, not derived from the query text
    pub relevance: f64,
    /// `relevance * type_weight`, set during merge
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_score: Option<f64>,
}

impl SearchHit {
    pub fn new(payload: HitPayload, relevance: f64) -> Self {
        Self { payload, relevance, final_score: None }
    }

    pub fn kind(&self) -> ResultKind {
        match &self.payload {
            HitPayload::Course(_) => ResultKind::Course,
            HitPayload::Lesson(_) => ResultKind::Lesson,
            HitPayload::Exercise(_) => ResultKind::Exercise,
            HitPayload::User(_) => ResultKind::User,
        }
    }

    pub fn id(&self) -> &str {
        match &self.payload {
            HitPayload::Course(h) => &h.id,
            HitPayload::Lesson(h) => &h.id,
            HitPayload::Exercise(h) => &h.id,
            HitPayload::User(h) => &h.id,
        }
    }

    /// Title for content results, display name for users
    pub fn label(&self) -> &str {
        match &self.payload {
            HitPayload::Course(h) => &h.title,
            HitPayload::Lesson(h) => &h.title,
            HitPayload::Exercise(h) => &h.title,
            HitPayload::User(h) => &h.name,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// RESPONSE
// ═══════════════════════════════════════════════════════════════════════════════

/// Per-source result counts taken before merging and truncation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByTypeCounts {
    pub courses: u64,
    pub lessons: u64,
    pub exercises: u64,
    pub users: u64,
}

impl ByTypeCounts {
    pub fn get(&self, kind: ResultKind) -> u64 {
        match kind {
            ResultKind::Course => self.courses,
            ResultKind::Lesson => self.lessons,
            ResultKind::Exercise => self.exercises,
            ResultKind::User => self.users,
        }
    }

    pub(crate) fn add(&mut self, kind: ResultKind, count: u64) {
        match kind {
            ResultKind::Course => self.courses += count,
            ResultKind::Lesson => self.lessons += count,
            ResultKind::Exercise => self.exercises += count,
            ResultKind::User => self.users += count,
        }
    }

    pub fn sum(&self) -> u64 {
        self.courses + self.lessons + self.exercises + self.users
    }
}

/// Search response.
///
/// Queries shorter than two characters return only `results` (empty) and
/// `total` (0); `query` and `by_type` are left out of the serialized form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResponse {
    /// Echo of the raw query
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    /// Merged results ordered by final score, at most 50
    pub results: Vec<SearchHit>,
    /// Merged count before the 50-result cut
    pub total: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub by_type: Option<ByTypeCounts>,
}

impl SearchResponse {
    pub fn short_circuit() -> Self {
        Self { query: None, results: Vec::new(), total: 0, by_type: None }
    }

    pub fn is_short_circuit(&self) -> bool {
        self.query.is_none() && self.by_type.is_none()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// REQUEST
// ═══════════════════════════════════════════════════════════════════════════════

/// Filter keys understood by search. Anything else is ignored.
pub const FILTER_KEYS: [&str; 5] = ["language", "level", "course_id", "exercise_type", "user_type"];

/// Optional per-source constraints. Each only narrows its own source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilters {
    /// Course language code
    pub language: Option<String>,
    /// Course level
    pub level: Option<CourseLevel>,
    /// Owning course of a lesson
    pub course_id: Option<Uuid>,
    pub exercise_type: Option<ExerciseType>,
    pub user_type: Option<UserType>,
}

impl SearchFilters {
    /// Parse a raw key/value filter map.
    ///
    /// Empty values count as absent and unknown keys are ignored. A value that
    /// cannot be read for its key is rejected as `InvalidFilter`, whichever key
    /// it is.
    pub fn from_map(raw: &HashMap<String, String>) -> Result<Self, LinguaError> {
        let mut filters = Self::default();
        for (key, value) in raw {
            if value.is_empty() {
                continue;
            }
            match key.as_str() {
                "language" => filters.language = Some(parse_language_code(value)?),
                "level" => {
                    let level = CourseLevel::from_database_str(value)
                        .ok_or_else(|| LinguaError::invalid_filter(key, value, "expected beginner, intermediate or advanced"))?;
                    filters.level = Some(level);
                }
                "course_id" => {
                    let id = Uuid::parse_str(value)
                        .map_err(|e| LinguaError::invalid_filter(key, value, &e.to_string()))?;
                    filters.course_id = Some(id);
                }
                "exercise_type" => {
                    let exercise_type = ExerciseType::from_database_str(value)
                        .ok_or_else(|| LinguaError::invalid_filter(key, value, "unknown exercise type"))?;
                    filters.exercise_type = Some(exercise_type);
                }
                "user_type" => {
                    let user_type = UserType::from_database_str(value)
                        .ok_or_else(|| LinguaError::invalid_filter(key, value, "expected student, teacher or admin"))?;
                    filters.user_type = Some(user_type);
                }
                _ => {}
            }
        }
        Ok(filters)
    }

    pub fn with_language(mut self, code: impl Into<String>) -> Self {
        self.language = Some(code.into());
        self
    }

    pub fn with_level(mut self, level: CourseLevel) -> Self {
        self.level = Some(level);
        self
    }

    pub fn with_course(mut self, course_id: Uuid) -> Self {
        self.course_id = Some(course_id);
        self
    }

    pub fn with_exercise_type(mut self, exercise_type: ExerciseType) -> Self {
        self.exercise_type = Some(exercise_type);
        self
    }

    pub fn with_user_type(mut self, user_type: UserType) -> Self {
        self.user_type = Some(user_type);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Language codes are short identifiers ("fr", "pt-BR", "zh_Hant").
fn parse_language_code(value: &str) -> Result<String, LinguaError> {
    if value.chars().count() > 10 {
        return Err(LinguaError::invalid_filter("language", value, "language codes are at most 10 characters"));
    }
    if !value.chars().all(|c| c.is_alphanumeric() || c == '-' || c == '_') {
        return Err(LinguaError::invalid_filter("language", value, "unexpected character in language code"));
    }
    Ok(value.to_string())
}

/// Requesting identity.
///
/// Search only looks at whether one is present: anonymous requests never
/// search user accounts. The id is never matched against anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    user_id: Uuid,
}

impl Identity {
    pub fn new(user_id: Uuid) -> Self {
        Self { user_id }
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ERRORS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Error)]
pub enum LinguaError {
    /// A record source could not be queried. Fails the whole search.
    #[error("Retrieval unavailable: {0}")]
    RetrievalUnavailable(String),
    #[error("Invalid filter {key}={value:?}: {reason}")]
    InvalidFilter { key: String, value: String, reason: String },
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Storage error: {0}")]
    Storage(String),
}

impl LinguaError {
    pub(crate) fn invalid_filter(key: &str, value: &str, reason: &str) -> Self {
        LinguaError::InvalidFilter {
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn storage(e: crate::database::DatabaseError) -> Self {
        LinguaError::Storage(e.to_string())
    }

    pub fn code_str(&self) -> &'static str {
        match self {
            LinguaError::RetrievalUnavailable(_) => "retrieval_unavailable",
            LinguaError::InvalidFilter { .. } => "invalid_filter",
            LinguaError::InvalidInput(_) => "invalid_input",
            LinguaError::Storage(_) => "storage_error",
        }
    }

    /// Caused by the request rather than the service
    pub fn is_client_error(&self) -> bool {
        matches!(self, LinguaError::InvalidFilter { .. } | LinguaError::InvalidInput(_))
    }
}

impl From<crate::database::DatabaseError> for LinguaError {
    fn from(e: crate::database::DatabaseError) -> Self {
        LinguaError::RetrievalUnavailable(e.to_string())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SERVICE INTERFACE
// ═══════════════════════════════════════════════════════════════════════════════

#[async_trait::async_trait]
pub trait SearchApi: Send + Sync {
    /// Search courses, lessons, exercises and (for identified requesters) users,
    /// merged into one ranked list.
    async fn search(
        &self,
        query: String,
        filters: SearchFilters,
        identity: Option<Identity>,
    ) -> Result<SearchResponse, LinguaError>;

    /// Same as [`SearchApi::search`] with filters given as a raw key/value map.
    /// Short queries return the empty response before the filters are read.
    async fn search_raw(
        &self,
        query: String,
        filters: HashMap<String, String>,
        identity: Option<Identity>,
    ) -> Result<SearchResponse, LinguaError> {
        if crate::search::is_short_query(&query) {
            return Ok(SearchResponse::short_circuit());
        }
        let filters = SearchFilters::from_map(&filters)?;
        self.search(query, filters, identity).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_result_kind_merge_order() {
        assert_eq!(
            ResultKind::ALL,
            [ResultKind::Course, ResultKind::Lesson, ResultKind::Exercise, ResultKind::User]
        );
    }

    #[test]
    fn test_identity_keeps_requester_id() {
        let id = Uuid::new_v4();
        assert_eq!(Identity::new(id).user_id(), id);
    }

    #[test]
    fn test_filters_from_map() {
        let course_id = Uuid::new_v4();
        let filters = SearchFilters::from_map(&raw(&[
            ("language", "fr"),
            ("level", "advanced"),
            ("course_id", &course_id.to_string()),
            ("exercise_type", "speaking"),
            ("user_type", "teacher"),
        ]))
        .unwrap();

        assert_eq!(filters.language.as_deref(), Some("fr"));
        assert_eq!(filters.level, Some(CourseLevel::Advanced));
        assert_eq!(filters.course_id, Some(course_id));
        assert_eq!(filters.exercise_type, Some(ExerciseType::Speaking));
        assert_eq!(filters.user_type, Some(UserType::Teacher));
    }

    #[test]
    fn test_filters_ignore_unknown_and_empty() {
        let filters = SearchFilters::from_map(&raw(&[("colour", "blue"), ("level", ""), ("course_id", "")])).unwrap();
        assert!(filters.is_empty());
    }

    #[test]
    fn test_course_id_accepts_unhyphenated_uppercase() {
        let id = Uuid::new_v4();
        let simple = id.simple().to_string().to_uppercase();
        let filters = SearchFilters::from_map(&raw(&[("course_id", &simple)])).unwrap();
        assert_eq!(filters.course_id, Some(id));
    }

    #[test]
    fn test_malformed_filters_rejected_for_every_key() {
        for (key, value) in [
            ("language", "not a language code"),
            ("level", "expert"),
            ("course_id", "42"),
            ("exercise_type", "karaoke"),
            ("user_type", "robot"),
        ] {
            let err = SearchFilters::from_map(&raw(&[(key, value)])).unwrap_err();
            match &err {
                LinguaError::InvalidFilter { key: k, value: v, .. } => {
                    assert_eq!(k, key);
                    assert_eq!(v, value);
                }
                other => panic!("expected InvalidFilter for {}, got {:?}", key, other),
            }
            assert!(err.is_client_error());
            assert_eq!(err.code_str(), "invalid_filter");
        }
    }

    #[test]
    fn test_short_circuit_response_omits_query_and_by_type() {
        let json = serde_json::to_value(SearchResponse::short_circuit()).unwrap();
        assert_eq!(json, serde_json::json!({"results": [], "total": 0}));
    }

    #[test]
    fn test_hit_serializes_only_its_variant_fields() {
        let hit = SearchHit::new(
            HitPayload::User(UserHit {
                id: "u1".into(),
                name: "ana".into(),
                username: "ana".into(),
                email: "ana@example.com".into(),
                user_type: UserType::Student,
                avatar: None,
            }),
            0.9,
        );
        let json = serde_json::to_value(&hit).unwrap();
        assert_eq!(json["type"], "user");
        assert_eq!(json["user_type"], "student");
        assert!(json.get("avatar").is_none());
        assert!(json.get("final_score").is_none());
        assert!(json.get("title").is_none());
        assert!(json.get("subtype").is_none());
    }

    #[test]
    fn test_by_type_serializes_plural_keys() {
        let mut counts = ByTypeCounts::default();
        counts.add(ResultKind::Course, 2);
        counts.add(ResultKind::User, 1);
        let json = serde_json::to_value(counts).unwrap();
        assert_eq!(json, serde_json::json!({"courses": 2, "lessons": 0, "exercises": 0, "users": 1}));
        assert_eq!(counts.sum(), 3);
    }
}
