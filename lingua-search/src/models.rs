//! Catalog data models
//!
//! Records stored in the catalog database (languages, courses, modules, lessons,
//! exercises, users) plus the row shapes the per-source search queries return.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─────────────────────────────────────────────────────────────────────────────
// VOCABULARIES
// ─────────────────────────────────────────────────────────────────────────────

/// Difficulty level of a course
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourseLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl CourseLevel {
    pub const ALL: [CourseLevel; 3] = [Self::Beginner, Self::Intermediate, Self::Advanced];

    pub fn as_database_str(&self) -> &'static str {
        match self {
            CourseLevel::Beginner => "beginner",
            CourseLevel::Intermediate => "intermediate",
            CourseLevel::Advanced => "advanced",
        }
    }

    pub fn from_database_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.as_database_str() == s)
    }
}

/// How a lesson delivers its content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LessonContentType {
    Video,
    #[default]
    Text,
    Audio,
    Interactive,
}

impl LessonContentType {
    pub const ALL: [LessonContentType; 4] = [Self::Video, Self::Text, Self::Audio, Self::Interactive];

    pub fn as_database_str(&self) -> &'static str {
        match self {
            LessonContentType::Video => "video",
            LessonContentType::Text => "text",
            LessonContentType::Audio => "audio",
            LessonContentType::Interactive => "interactive",
        }
    }

    pub fn from_database_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_database_str() == s)
    }
}

/// Exercise category (exposed as `subtype` on exercise search results)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseType {
    MultipleChoice,
    FillBlank,
    Matching,
    Speaking,
    Listening,
    Writing,
    Translation,
}

impl ExerciseType {
    pub const ALL: [ExerciseType; 7] = [
        Self::MultipleChoice,
        Self::FillBlank,
        Self::Matching,
        Self::Speaking,
        Self::Listening,
        Self::Writing,
        Self::Translation,
    ];

    pub fn as_database_str(&self) -> &'static str {
        match self {
            ExerciseType::MultipleChoice => "multiple_choice",
            ExerciseType::FillBlank => "fill_blank",
            ExerciseType::Matching => "matching",
            ExerciseType::Speaking => "speaking",
            ExerciseType::Listening => "listening",
            ExerciseType::Writing => "writing",
            ExerciseType::Translation => "translation",
        }
    }

    pub fn from_database_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_database_str() == s)
    }
}

/// Account classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    #[default]
    Student,
    Teacher,
    Admin,
}

impl UserType {
    pub const ALL: [UserType; 3] = [Self::Student, Self::Teacher, Self::Admin];

    pub fn as_database_str(&self) -> &'static str {
        match self {
            UserType::Student => "student",
            UserType::Teacher => "teacher",
            UserType::Admin => "admin",
        }
    }

    pub fn from_database_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_database_str() == s)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// VALIDATION
// ─────────────────────────────────────────────────────────────────────────────

fn check_required(field: &str, value: &str, max_chars: usize) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{} must not be empty", field));
    }
    check_max_len(field, value, max_chars)
}

fn check_max_len(field: &str, value: &str, max_chars: usize) -> Result<(), String> {
    let len = value.chars().count();
    if len > max_chars {
        return Err(format!("{} is {} characters, limit is {}", field, len, max_chars));
    }
    Ok(())
}

fn check_url(field: &str, value: Option<&str>) -> Result<(), String> {
    match value {
        Some(url) if !validator::validate_url(url) => Err(format!("{} is not a valid URL: {}", field, url)),
        _ => Ok(()),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// CATALOG RECORDS
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Language {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub native_name: String,
    pub flag_emoji: String,
    pub is_active: bool,
}

impl Language {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: Uuid::new_v4(),
            code: code.into(),
            native_name: name.clone(),
            name,
            flag_emoji: String::new(),
            is_active: true,
        }
    }

    pub fn with_native_name(mut self, native_name: impl Into<String>) -> Self {
        self.native_name = native_name.into();
        self
    }

    pub fn with_flag(mut self, flag_emoji: impl Into<String>) -> Self {
        self.flag_emoji = flag_emoji.into();
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        check_required("language code", &self.code, 10)?;
        check_required("language name", &self.name, 50)?;
        check_max_len("native name", &self.native_name, 50)?;
        check_max_len("flag emoji", &self.flag_emoji, 10)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Course {
    pub id: Uuid,
    pub language_id: Uuid,
    pub title: String,
    pub description: String,
    pub thumbnail_url: Option<String>,
    pub level: CourseLevel,
    pub estimated_hours: f64,
    pub is_free: bool,
    pub is_featured: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Course {
    pub fn new(language_id: Uuid, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            language_id,
            title: title.into(),
            description: description.into(),
            thumbnail_url: None,
            level: CourseLevel::default(),
            estimated_hours: 10.0,
            is_free: false,
            is_featured: false,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    pub fn with_level(mut self, level: CourseLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_thumbnail(mut self, url: impl Into<String>) -> Self {
        self.thumbnail_url = Some(url.into());
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        check_required("course title", &self.title, 200)?;
        check_url("thumbnail url", self.thumbnail_url.as_deref())?;
        if !self.estimated_hours.is_finite() || self.estimated_hours < 0.0 {
            return Err(format!("estimated hours must be a non-negative number, got {}", self.estimated_hours));
        }
        Ok(())
    }
}

/// Grouping of lessons inside a course. Not searchable on its own; lessons
/// reach their course through it.
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub description: String,
    pub order_index: i64,
    pub is_active: bool,
}

impl Module {
    pub fn new(course_id: Uuid, title: impl Into<String>, order_index: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            course_id,
            title: title.into(),
            description: String::new(),
            order_index,
            is_active: true,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        check_required("module title", &self.title, 200)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Lesson {
    pub id: Uuid,
    pub module_id: Uuid,
    pub title: String,
    pub content_type: LessonContentType,
    pub content_text: String,
    pub duration_minutes: i64,
    pub order_index: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Lesson {
    pub fn new(module_id: Uuid, title: impl Into<String>, content_text: impl Into<String>, order_index: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            module_id,
            title: title.into(),
            content_type: LessonContentType::default(),
            content_text: content_text.into(),
            duration_minutes: 15,
            order_index,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    pub fn with_content_type(mut self, content_type: LessonContentType) -> Self {
        self.content_type = content_type;
        self
    }

    pub fn with_duration(mut self, minutes: i64) -> Self {
        self.duration_minutes = minutes;
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        check_required("lesson title", &self.title, 200)?;
        if self.duration_minutes < 0 {
            return Err(format!("lesson duration must not be negative, got {}", self.duration_minutes));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Exercise {
    pub id: Uuid,
    pub lesson_id: Uuid,
    pub exercise_type: ExerciseType,
    pub title: String,
    pub question_text: String,
    pub points: i64,
    pub order_index: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Exercise {
    pub fn new(
        lesson_id: Uuid,
        exercise_type: ExerciseType,
        title: impl Into<String>,
        question_text: impl Into<String>,
        order_index: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            lesson_id,
            exercise_type,
            title: title.into(),
            question_text: question_text.into(),
            points: 10,
            order_index,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    pub fn with_points(mut self, points: i64) -> Self {
        self.points = points;
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        check_required("exercise title", &self.title, 200)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub user_type: UserType,
    pub avatar_url: Option<String>,
    pub is_active: bool,
    pub date_joined: DateTime<Utc>,
}

impl User {
    pub fn new(username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            username: username.into(),
            first_name: String::new(),
            last_name: String::new(),
            user_type: UserType::default(),
            avatar_url: None,
            is_active: true,
            date_joined: Utc::now(),
        }
    }

    pub fn with_name(mut self, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        self.first_name = first_name.into();
        self.last_name = last_name.into();
        self
    }

    pub fn with_user_type(mut self, user_type: UserType) -> Self {
        self.user_type = user_type;
        self
    }

    pub fn with_avatar(mut self, url: impl Into<String>) -> Self {
        self.avatar_url = Some(url.into());
        self
    }

    pub fn joined_at(mut self, date_joined: DateTime<Utc>) -> Self {
        self.date_joined = date_joined;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    pub fn display_name(&self) -> String {
        display_name(&self.first_name, &self.last_name, &self.username)
    }

    pub fn validate(&self) -> Result<(), String> {
        check_required("username", &self.username, 50)?;
        check_max_len("first name", &self.first_name, 30)?;
        check_max_len("last name", &self.last_name, 150)?;
        if !validator::validate_email(self.email.as_str()) {
            return Err(format!("email is not valid: {}", self.email));
        }
        check_url("avatar url", self.avatar_url.as_deref())
    }
}

/// Full name when one is set, otherwise the username.
pub fn display_name(first_name: &str, last_name: &str, username: &str) -> String {
    let full = format!("{} {}", first_name, last_name);
    let full = full.trim();
    if full.is_empty() {
        username.to_string()
    } else {
        full.to_string()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// SOURCE ROWS (what each per-source search query yields)
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct CourseRow {
    pub id: String,
    pub title: String,
    pub description: String,
    pub language_code: String,
    pub level: CourseLevel,
    pub thumbnail_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Lesson joined with its owning course (through its module)
#[derive(Debug, Clone, PartialEq)]
pub struct LessonRow {
    pub id: String,
    pub title: String,
    pub content_text: String,
    pub course_id: String,
    pub course_title: String,
    pub duration_minutes: i64,
    pub created_at: DateTime<Utc>,
}

/// Exercise joined with its lesson and that lesson's root course
#[derive(Debug, Clone, PartialEq)]
pub struct ExerciseRow {
    pub id: String,
    pub exercise_type: ExerciseType,
    pub title: String,
    pub question_text: String,
    pub lesson_title: String,
    pub course_title: String,
    pub points: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserRow {
    pub id: String,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub user_type: UserType,
    pub avatar_url: Option<String>,
    pub date_joined: DateTime<Utc>,
}
