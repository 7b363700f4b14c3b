//! SQLite record store for the learning catalog
//!
//! Languages, courses, modules, lessons, exercises and user accounts, plus the
//! four read queries federated search runs against them.
//! Uses r2d2 connection pooling so the per-source reads of one search can run
//! side by side.

use crate::interface::SearchFilters;
use crate::models::{
    Course, CourseLevel, CourseRow, Exercise, ExerciseRow, ExerciseType, Language, Lesson, LessonRow, Module,
    User, UserRow, UserType,
};
use crate::search::{CatalogSource, SourceQuery};
use chrono::{DateTime, TimeZone, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::functions::FunctionFlags;
use rusqlite::types::Type;
use rusqlite::{named_params, params, Connection};
use std::path::Path;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),
    /// A non-SQLite source could not be reached
    #[error("Source unavailable: {0}")]
    Unavailable(String),
}

pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Fixed width, so text order matches time order
const DB_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

pub(crate) fn format_db_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format(DB_TIMESTAMP_FORMAT).to_string()
}

/// Parse timestamp string from database to DateTime<Utc>
fn parse_db_timestamp(timestamp_str: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    chrono::NaiveDateTime::parse_from_str(timestamp_str, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| chrono::NaiveDateTime::parse_from_str(timestamp_str, "%Y-%m-%d %H:%M:%S"))
        .map(|dt| Utc.from_utc_datetime(&dt))
}

fn timestamp_column(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    parse_db_timestamp(&raw).map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn vocabulary_column<T>(row: &rusqlite::Row, idx: usize, parse: fn(&str) -> Option<T>) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    parse(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, format!("unknown value {:?}", raw).into())
    })
}

/// Register `contains_ci(haystack, needle)`: Unicode lowercase substring test.
///
/// `LIKE` only folds ASCII and reads `_` as a wildcard, and normalized queries
/// keep underscores. A NULL on either side never matches; an empty needle
/// matches every non-NULL haystack.
fn register_functions(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        "contains_ci",
        2,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let haystack: Option<String> = ctx.get(0)?;
            let needle: Option<String> = ctx.get(1)?;
            Ok(match (haystack, needle) {
                (Some(haystack), Some(needle)) => haystack.to_lowercase().contains(&needle.to_lowercase()),
                _ => false,
            })
        },
    )
}

/// Tables that carry an `is_active` flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogTable {
    Languages,
    Courses,
    Modules,
    Lessons,
    Exercises,
    Users,
}

impl CatalogTable {
    fn table_name(&self) -> &'static str {
        match self {
            CatalogTable::Languages => "languages",
            CatalogTable::Courses => "courses",
            CatalogTable::Modules => "modules",
            CatalogTable::Lessons => "lessons",
            CatalogTable::Exercises => "exercises",
            CatalogTable::Users => "users",
        }
    }
}

/// Row counts per table, active and inactive alike
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct CatalogCounts {
    pub languages: u64,
    pub courses: u64,
    pub modules: u64,
    pub lessons: u64,
    pub exercises: u64,
    pub users: u64,
}

/// Thread-safe database wrapper using connection pooling
///
/// WAL mode lets the four per-source reads of a search proceed without
/// blocking each other.
pub struct Database {
    pool: Pool<SqliteConnectionManager>,
}

impl Database {
    /// Open or create a database at the given path with connection pooling
    pub fn open<P: AsRef<Path>>(path: P) -> DatabaseResult<Self> {
        Self::open_with_pool_size(path, 8)
    }

    pub fn open_with_pool_size<P: AsRef<Path>>(path: P, pool_size: u32) -> DatabaseResult<Self> {
        let manager = SqliteConnectionManager::file(path).with_init(|conn| {
            conn.execute_batch(
                "
                PRAGMA journal_mode=WAL;
                PRAGMA synchronous=NORMAL;
                PRAGMA foreign_keys=ON;
                PRAGMA cache_size=-16000;
            ",
            )?;
            register_functions(conn)
        });

        let pool = Pool::builder().max_size(pool_size.max(1)).build(manager)?;

        let db = Self { pool };
        db.setup_schema()?;
        Ok(db)
    }

    /// Open an in-memory database (tests, demos)
    pub fn open_in_memory() -> DatabaseResult<Self> {
        let manager = SqliteConnectionManager::memory().with_init(|conn| {
            conn.execute_batch("PRAGMA foreign_keys=ON;")?;
            register_functions(conn)
        });

        // In-memory needs single connection to maintain state
        let pool = Pool::builder().max_size(1).build(manager)?;

        let db = Self { pool };
        db.setup_schema()?;
        Ok(db)
    }

    fn get_conn(&self) -> DatabaseResult<PooledConnection<SqliteConnectionManager>> {
        Ok(self.pool.get()?)
    }

    fn setup_schema(&self) -> DatabaseResult<()> {
        let conn = self.get_conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS languages (
                id TEXT PRIMARY KEY,
                code TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                native_name TEXT NOT NULL DEFAULT '',
                flag_emoji TEXT NOT NULL DEFAULT '',
                is_active INTEGER NOT NULL DEFAULT 1
            );

            CREATE TABLE IF NOT EXISTS courses (
                id TEXT PRIMARY KEY,
                language_id TEXT NOT NULL REFERENCES languages(id) ON DELETE CASCADE,
                title TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                thumbnail_url TEXT,
                level TEXT NOT NULL DEFAULT 'beginner',
                estimated_hours REAL NOT NULL DEFAULT 10,
                is_free INTEGER NOT NULL DEFAULT 0,
                is_featured INTEGER NOT NULL DEFAULT 0,
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS modules (
                id TEXT PRIMARY KEY,
                course_id TEXT NOT NULL REFERENCES courses(id) ON DELETE CASCADE,
                title TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                order_index INTEGER NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 1
            );

            CREATE TABLE IF NOT EXISTS lessons (
                id TEXT PRIMARY KEY,
                module_id TEXT NOT NULL REFERENCES modules(id) ON DELETE CASCADE,
                title TEXT NOT NULL,
                content_type TEXT NOT NULL DEFAULT 'text',
                content_text TEXT NOT NULL DEFAULT '',
                duration_minutes INTEGER NOT NULL DEFAULT 15,
                order_index INTEGER NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS exercises (
                id TEXT PRIMARY KEY,
                lesson_id TEXT NOT NULL REFERENCES lessons(id) ON DELETE CASCADE,
                exercise_type TEXT NOT NULL,
                title TEXT NOT NULL,
                question_text TEXT NOT NULL DEFAULT '',
                points INTEGER NOT NULL DEFAULT 10,
                order_index INTEGER NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                username TEXT NOT NULL UNIQUE,
                first_name TEXT NOT NULL DEFAULT '',
                last_name TEXT NOT NULL DEFAULT '',
                user_type TEXT NOT NULL DEFAULT 'student',
                avatar_url TEXT,
                is_active INTEGER NOT NULL DEFAULT 1,
                date_joined TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_courses_created ON courses(is_active, created_at);
            CREATE INDEX IF NOT EXISTS idx_courses_language ON courses(language_id);
            CREATE INDEX IF NOT EXISTS idx_modules_course ON modules(course_id);
            CREATE INDEX IF NOT EXISTS idx_lessons_module ON lessons(module_id);
            CREATE INDEX IF NOT EXISTS idx_lessons_created ON lessons(is_active, created_at);
            CREATE INDEX IF NOT EXISTS idx_exercises_lesson ON exercises(lesson_id);
            CREATE INDEX IF NOT EXISTS idx_exercises_created ON exercises(is_active, created_at);
            CREATE INDEX IF NOT EXISTS idx_users_joined ON users(is_active, date_joined);
        "#,
        )?;
        Ok(())
    }

    /// Get the database size in bytes
    pub fn database_size(&self) -> DatabaseResult<i64> {
        let conn = self.get_conn()?;
        let page_count: i64 = conn.query_row("PRAGMA page_count", [], |row| row.get(0))?;
        let page_size: i64 = conn.query_row("PRAGMA page_size", [], |row| row.get(0))?;
        Ok(page_count * page_size)
    }

    pub fn catalog_counts(&self) -> DatabaseResult<CatalogCounts> {
        let conn = self.get_conn()?;
        let count = |table: CatalogTable| -> DatabaseResult<u64> {
            let sql = format!("SELECT COUNT(*) FROM {}", table.table_name());
            let n: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
            Ok(n as u64)
        };
        Ok(CatalogCounts {
            languages: count(CatalogTable::Languages)?,
            courses: count(CatalogTable::Courses)?,
            modules: count(CatalogTable::Modules)?,
            lessons: count(CatalogTable::Lessons)?,
            exercises: count(CatalogTable::Exercises)?,
            users: count(CatalogTable::Users)?,
        })
    }

    /// Flip `is_active` on one record. Returns false when no row has that id.
    pub fn set_active(&self, table: CatalogTable, id: Uuid, active: bool) -> DatabaseResult<bool> {
        let conn = self.get_conn()?;
        let sql = format!("UPDATE {} SET is_active = ?1 WHERE id = ?2", table.table_name());
        let changed = conn.execute(&sql, params![active, id.to_string()])?;
        Ok(changed > 0)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Inserts
    // ─────────────────────────────────────────────────────────────────────────

    pub fn insert_language(&self, language: &Language) -> DatabaseResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO languages (id, code, name, native_name, flag_emoji, is_active) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                language.id.to_string(),
                language.code,
                language.name,
                language.native_name,
                language.flag_emoji,
                language.is_active,
            ],
        )?;
        Ok(())
    }

    pub fn insert_course(&self, course: &Course) -> DatabaseResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO courses (id, language_id, title, description, thumbnail_url, level, estimated_hours,
                                    is_free, is_featured, is_active, created_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"#,
            params![
                course.id.to_string(),
                course.language_id.to_string(),
                course.title,
                course.description,
                course.thumbnail_url,
                course.level.as_database_str(),
                course.estimated_hours,
                course.is_free,
                course.is_featured,
                course.is_active,
                format_db_timestamp(&course.created_at),
            ],
        )?;
        Ok(())
    }

    pub fn insert_module(&self, module: &Module) -> DatabaseResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO modules (id, course_id, title, description, order_index, is_active) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                module.id.to_string(),
                module.course_id.to_string(),
                module.title,
                module.description,
                module.order_index,
                module.is_active,
            ],
        )?;
        Ok(())
    }

    pub fn insert_lesson(&self, lesson: &Lesson) -> DatabaseResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO lessons (id, module_id, title, content_type, content_text, duration_minutes,
                                    order_index, is_active, created_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"#,
            params![
                lesson.id.to_string(),
                lesson.module_id.to_string(),
                lesson.title,
                lesson.content_type.as_database_str(),
                lesson.content_text,
                lesson.duration_minutes,
                lesson.order_index,
                lesson.is_active,
                format_db_timestamp(&lesson.created_at),
            ],
        )?;
        Ok(())
    }

    pub fn insert_exercise(&self, exercise: &Exercise) -> DatabaseResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO exercises (id, lesson_id, exercise_type, title, question_text, points,
                                      order_index, is_active, created_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"#,
            params![
                exercise.id.to_string(),
                exercise.lesson_id.to_string(),
                exercise.exercise_type.as_database_str(),
                exercise.title,
                exercise.question_text,
                exercise.points,
                exercise.order_index,
                exercise.is_active,
                format_db_timestamp(&exercise.created_at),
            ],
        )?;
        Ok(())
    }

    pub fn insert_user(&self, user: &User) -> DatabaseResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO users (id, email, username, first_name, last_name, user_type, avatar_url,
                                  is_active, date_joined)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"#,
            params![
                user.id.to_string(),
                user.email,
                user.username,
                user.first_name,
                user.last_name,
                user.user_type.as_database_str(),
                user.avatar_url,
                user.is_active,
                format_db_timestamp(&user.date_joined),
            ],
        )?;
        Ok(())
    }

    pub fn language_id_by_code(&self, code: &str) -> DatabaseResult<Option<Uuid>> {
        let conn = self.get_conn()?;
        let result = conn.query_row("SELECT id FROM languages WHERE code = ?1", [code], |row| {
            row.get::<_, String>(0)
        });
        match result {
            Ok(id) => Ok(Uuid::parse_str(&id).ok()),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Per-source search reads
    // ─────────────────────────────────────────────────────────────────────────

    pub fn search_courses(&self, needle: &str, filters: &SearchFilters, limit: usize) -> DatabaseResult<Vec<CourseRow>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare_cached(
            r#"SELECT c.id, c.title, c.description, l.code, c.level, c.thumbnail_url, c.created_at
               FROM courses c
               JOIN languages l ON l.id = c.language_id
               WHERE c.is_active = 1
                 AND (:language IS NULL OR l.code = :language)
                 AND (:level IS NULL OR c.level = :level)
                 AND (contains_ci(c.title, :needle) OR contains_ci(c.description, :needle))
               ORDER BY c.created_at DESC, c.rowid DESC
               LIMIT :limit"#,
        )?;
        let rows = stmt
            .query_map(
                named_params! {
                    ":language": filters.language.as_deref(),
                    ":level": filters.level.map(|l| l.as_database_str()),
                    ":needle": needle,
                    ":limit": limit as i64,
                },
                |row| {
                    Ok(CourseRow {
                        id: row.get(0)?,
                        title: row.get(1)?,
                        description: row.get(2)?,
                        language_code: row.get(3)?,
                        level: vocabulary_column(row, 4, CourseLevel::from_database_str)?,
                        thumbnail_url: row.get(5)?,
                        created_at: timestamp_column(row, 6)?,
                    })
                },
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Lessons of active courses, reached through their module
    pub fn search_lessons(&self, needle: &str, filters: &SearchFilters, limit: usize) -> DatabaseResult<Vec<LessonRow>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare_cached(
            r#"SELECT le.id, le.title, le.content_text, c.id, c.title, le.duration_minutes, le.created_at
               FROM lessons le
               JOIN modules m ON m.id = le.module_id
               JOIN courses c ON c.id = m.course_id
               WHERE le.is_active = 1
                 AND c.is_active = 1
                 AND (:course_id IS NULL OR c.id = :course_id)
                 AND (contains_ci(le.title, :needle) OR contains_ci(le.content_text, :needle))
               ORDER BY le.created_at DESC, le.rowid DESC
               LIMIT :limit"#,
        )?;
        let rows = stmt
            .query_map(
                named_params! {
                    ":course_id": filters.course_id.map(|id| id.to_string()),
                    ":needle": needle,
                    ":limit": limit as i64,
                },
                |row| {
                    Ok(LessonRow {
                        id: row.get(0)?,
                        title: row.get(1)?,
                        content_text: row.get(2)?,
                        course_id: row.get(3)?,
                        course_title: row.get(4)?,
                        duration_minutes: row.get(5)?,
                        created_at: timestamp_column(row, 6)?,
                    })
                },
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Exercises whose lesson and root course are both active
    pub fn search_exercises(&self, needle: &str, filters: &SearchFilters, limit: usize) -> DatabaseResult<Vec<ExerciseRow>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare_cached(
            r#"SELECT e.id, e.exercise_type, e.title, e.question_text, le.title, c.title, e.points, e.created_at
               FROM exercises e
               JOIN lessons le ON le.id = e.lesson_id
               JOIN modules m ON m.id = le.module_id
               JOIN courses c ON c.id = m.course_id
               WHERE e.is_active = 1
                 AND le.is_active = 1
                 AND c.is_active = 1
                 AND (:exercise_type IS NULL OR e.exercise_type = :exercise_type)
                 AND (contains_ci(e.title, :needle) OR contains_ci(e.question_text, :needle))
               ORDER BY e.created_at DESC, e.rowid DESC
               LIMIT :limit"#,
        )?;
        let rows = stmt
            .query_map(
                named_params! {
                    ":exercise_type": filters.exercise_type.map(|t| t.as_database_str()),
                    ":needle": needle,
                    ":limit": limit as i64,
                },
                |row| {
                    Ok(ExerciseRow {
                        id: row.get(0)?,
                        exercise_type: vocabulary_column(row, 1, ExerciseType::from_database_str)?,
                        title: row.get(2)?,
                        question_text: row.get(3)?,
                        lesson_title: row.get(4)?,
                        course_title: row.get(5)?,
                        points: row.get(6)?,
                        created_at: timestamp_column(row, 7)?,
                    })
                },
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn search_users(&self, needle: &str, filters: &SearchFilters, limit: usize) -> DatabaseResult<Vec<UserRow>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare_cached(
            r#"SELECT u.id, u.username, u.email, u.first_name, u.last_name, u.user_type, u.avatar_url, u.date_joined
               FROM users u
               WHERE u.is_active = 1
                 AND (:user_type IS NULL OR u.user_type = :user_type)
                 AND (contains_ci(u.username, :needle)
                      OR contains_ci(u.email, :needle)
                      OR contains_ci(u.first_name, :needle)
                      OR contains_ci(u.last_name, :needle))
               ORDER BY u.date_joined DESC, u.rowid DESC
               LIMIT :limit"#,
        )?;
        let rows = stmt
            .query_map(
                named_params! {
                    ":user_type": filters.user_type.map(|t| t.as_database_str()),
                    ":needle": needle,
                    ":limit": limit as i64,
                },
                |row| {
                    Ok(UserRow {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        email: row.get(2)?,
                        first_name: row.get(3)?,
                        last_name: row.get(4)?,
                        user_type: vocabulary_column(row, 5, UserType::from_database_str)?,
                        avatar_url: row.get(6)?,
                        date_joined: timestamp_column(row, 7)?,
                    })
                },
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

impl CatalogSource for Database {
    fn find_courses(&self, query: &SourceQuery) -> DatabaseResult<Vec<CourseRow>> {
        self.search_courses(&query.needle, &query.filters, query.limit)
    }

    fn find_lessons(&self, query: &SourceQuery) -> DatabaseResult<Vec<LessonRow>> {
        self.search_lessons(&query.needle, &query.filters, query.limit)
    }

    fn find_exercises(&self, query: &SourceQuery) -> DatabaseResult<Vec<ExerciseRow>> {
        self.search_exercises(&query.needle, &query.filters, query.limit)
    }

    fn find_users(&self, query: &SourceQuery) -> DatabaseResult<Vec<UserRow>> {
        self.search_users(&query.needle, &query.filters, query.limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LessonContentType;
    use chrono::Duration;

    struct Fixture {
        db: Database,
        language: Language,
        course: Course,
        module: Module,
    }

    fn fixture() -> Fixture {
        let db = Database::open_in_memory().unwrap();
        let language = Language::new("fr", "French").with_native_name("Français");
        db.insert_language(&language).unwrap();
        let course = Course::new(language.id, "French Basics", "Greetings and numbers");
        db.insert_course(&course).unwrap();
        let module = Module::new(course.id, "Unit 1", 0);
        db.insert_module(&module).unwrap();
        Fixture { db, language, course, module }
    }

    fn titles<T>(rows: &[T], title: impl Fn(&T) -> &str) -> Vec<String> {
        rows.iter().map(|r| title(r).to_string()).collect()
    }

    #[test]
    fn test_contains_ci_folds_unicode_case() {
        let f = fixture();
        let course = Course::new(f.language.id, "ÉTUDES AVANCÉES", "");
        f.db.insert_course(&course).unwrap();

        let rows = f.db.search_courses("études", &SearchFilters::default(), 20).unwrap();
        assert_eq!(titles(&rows, |r| &r.title), vec!["ÉTUDES AVANCÉES"]);
    }

    #[test]
    fn test_underscore_is_literal() {
        let f = fixture();
        f.db.insert_course(&Course::new(f.language.id, "snake_case drills", "")).unwrap();
        f.db.insert_course(&Course::new(f.language.id, "snakeXcase drills", "")).unwrap();

        let rows = f.db.search_courses("snake_case", &SearchFilters::default(), 20).unwrap();
        assert_eq!(titles(&rows, |r| &r.title), vec!["snake_case drills"]);
    }

    #[test]
    fn test_null_thumbnail_and_empty_needle() {
        let f = fixture();
        // Empty needle matches every active course
        let rows = f.db.search_courses("", &SearchFilters::default(), 20).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].thumbnail_url, None);
        assert_eq!(rows[0].language_code, "fr");
    }

    #[test]
    fn test_course_or_matching_and_filters() {
        let f = fixture();
        let spanish = Language::new("es", "Spanish");
        f.db.insert_language(&spanish).unwrap();
        f.db.insert_course(
            &Course::new(spanish.id, "Conversational Spanish", "Everyday greetings").with_level(CourseLevel::Intermediate),
        )
        .unwrap();

        // "greetings" only appears in descriptions
        let rows = f.db.search_courses("greetings", &SearchFilters::default(), 20).unwrap();
        assert_eq!(rows.len(), 2);

        let rows = f.db.search_courses("greetings", &SearchFilters::default().with_language("es"), 20).unwrap();
        assert_eq!(titles(&rows, |r| &r.title), vec!["Conversational Spanish"]);

        let rows = f
            .db
            .search_courses("greetings", &SearchFilters::default().with_level(CourseLevel::Advanced), 20)
            .unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_inactive_courses_excluded() {
        let f = fixture();
        assert!(f.db.set_active(CatalogTable::Courses, f.course.id, false).unwrap());
        assert!(f.db.search_courses("french", &SearchFilters::default(), 20).unwrap().is_empty());
        assert!(!f.db.set_active(CatalogTable::Courses, Uuid::new_v4(), false).unwrap());
    }

    #[test]
    fn test_newest_first_with_insertion_tiebreak() {
        let f = fixture();
        let base = Utc::now();
        let old = Lesson::new(f.module.id, "Verbs old", "", 0).with_created_at(base - Duration::days(2));
        let tie_a = Lesson::new(f.module.id, "Verbs tie a", "", 1).with_created_at(base);
        let tie_b = Lesson::new(f.module.id, "Verbs tie b", "", 2).with_created_at(base);
        for lesson in [&old, &tie_a, &tie_b] {
            f.db.insert_lesson(lesson).unwrap();
        }

        let rows = f.db.search_lessons("verbs", &SearchFilters::default(), 20).unwrap();
        assert_eq!(titles(&rows, |r| &r.title), vec!["Verbs tie b", "Verbs tie a", "Verbs old"]);

        let rows = f.db.search_lessons("verbs", &SearchFilters::default(), 2).unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_courses_newest_first() {
        let f = fixture();
        let base = Utc::now();
        let older = Course::new(f.language.id, "Idioms older", "").with_created_at(base - Duration::days(3));
        let newer = Course::new(f.language.id, "Idioms newer", "").with_created_at(base - Duration::days(1));
        f.db.insert_course(&newer).unwrap();
        f.db.insert_course(&older).unwrap();

        let rows = f.db.search_courses("idioms", &SearchFilters::default(), 20).unwrap();
        assert_eq!(titles(&rows, |r| &r.title), vec!["Idioms newer", "Idioms older"]);
    }

    #[test]
    fn test_course_cap_keeps_newest() {
        let f = fixture();
        let base = Utc::now() - Duration::days(100);
        for i in 0..25 {
            let course = Course::new(f.language.id, format!("Reading {:02}", i), "")
                .with_created_at(base + Duration::hours(i));
            f.db.insert_course(&course).unwrap();
        }

        let rows = f.db.search_courses("reading", &SearchFilters::default(), 20).unwrap();
        let expected: Vec<String> = (5..25).rev().map(|i| format!("Reading {:02}", i)).collect();
        assert_eq!(titles(&rows, |r| &r.title), expected);
    }

    #[test]
    fn test_exercises_newest_first() {
        let f = fixture();
        let lesson = Lesson::new(f.module.id, "Numbers", "", 0);
        f.db.insert_lesson(&lesson).unwrap();
        let base = Utc::now();
        let older = Exercise::new(lesson.id, ExerciseType::Listening, "Dictation older", "", 0)
            .with_created_at(base - Duration::hours(5));
        let newer = Exercise::new(lesson.id, ExerciseType::Listening, "Dictation newer", "", 1)
            .with_created_at(base - Duration::hours(1));
        f.db.insert_exercise(&newer).unwrap();
        f.db.insert_exercise(&older).unwrap();

        let rows = f.db.search_exercises("dictation", &SearchFilters::default(), 20).unwrap();
        assert_eq!(titles(&rows, |r| &r.title), vec!["Dictation newer", "Dictation older"]);
    }

    #[test]
    fn test_users_newest_first() {
        let f = fixture();
        let base = Utc::now();
        let older = User::new("polyglot_old", "old@example.com").joined_at(base - Duration::days(30));
        let newer = User::new("polyglot_new", "new@example.com").joined_at(base - Duration::days(2));
        f.db.insert_user(&newer).unwrap();
        f.db.insert_user(&older).unwrap();

        let rows = f.db.search_users("polyglot", &SearchFilters::default(), 10).unwrap();
        assert_eq!(titles(&rows, |r| &r.username), vec!["polyglot_new", "polyglot_old"]);
    }

    #[test]
    fn test_lessons_require_active_course() {
        let f = fixture();
        let lesson = Lesson::new(f.module.id, "Numbers", "un deux trois", 0)
            .with_content_type(LessonContentType::Audio)
            .with_duration(12);
        f.db.insert_lesson(&lesson).unwrap();

        let rows = f.db.search_lessons("deux", &SearchFilters::default(), 20).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].course_title, "French Basics");
        assert_eq!(rows[0].course_id, f.course.id.to_string());
        assert_eq!(rows[0].duration_minutes, 12);

        let other = SearchFilters::default().with_course(Uuid::new_v4());
        assert!(f.db.search_lessons("deux", &other, 20).unwrap().is_empty());
        let same = SearchFilters::default().with_course(f.course.id);
        assert_eq!(f.db.search_lessons("deux", &same, 20).unwrap().len(), 1);

        f.db.set_active(CatalogTable::Courses, f.course.id, false).unwrap();
        assert!(f.db.search_lessons("deux", &SearchFilters::default(), 20).unwrap().is_empty());
    }

    #[test]
    fn test_exercises_resolve_two_hops() {
        let f = fixture();
        let lesson = Lesson::new(f.module.id, "Numbers", "", 0);
        f.db.insert_lesson(&lesson).unwrap();
        let exercise = Exercise::new(lesson.id, ExerciseType::Listening, "Count aloud", "Say the numbers", 0);
        f.db.insert_exercise(&exercise).unwrap();

        let rows = f.db.search_exercises("numbers", &SearchFilters::default(), 20).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].lesson_title, "Numbers");
        assert_eq!(rows[0].course_title, "French Basics");
        assert_eq!(rows[0].exercise_type, ExerciseType::Listening);

        let speaking = SearchFilters::default().with_exercise_type(ExerciseType::Speaking);
        assert!(f.db.search_exercises("numbers", &speaking, 20).unwrap().is_empty());

        f.db.set_active(CatalogTable::Lessons, lesson.id, false).unwrap();
        assert!(f.db.search_exercises("numbers", &SearchFilters::default(), 20).unwrap().is_empty());
    }

    #[test]
    fn test_user_search_any_field() {
        let f = fixture();
        let marie = User::new("mc1867", "marie@example.com")
            .with_name("Marie", "Curie")
            .with_user_type(UserType::Teacher);
        f.db.insert_user(&marie).unwrap();
        f.db.insert_user(&User::new("pierre", "pierre@example.com").inactive()).unwrap();

        for needle in ["mc18", "MARIE@", "curie"] {
            let rows = f.db.search_users(needle, &SearchFilters::default(), 10).unwrap();
            assert_eq!(rows.len(), 1, "needle {}", needle);
        }
        assert!(f.db.search_users("pierre", &SearchFilters::default(), 10).unwrap().is_empty());

        let students = SearchFilters::default().with_user_type(UserType::Student);
        assert!(f.db.search_users("marie", &students, 10).unwrap().is_empty());
    }

    #[test]
    fn test_foreign_keys_enforced() {
        let f = fixture();
        let orphan = Module::new(Uuid::new_v4(), "Orphan", 0);
        assert!(matches!(f.db.insert_module(&orphan), Err(DatabaseError::Sqlite(_))));
    }

    #[test]
    fn test_catalog_counts_and_language_lookup() {
        let f = fixture();
        let counts = f.db.catalog_counts().unwrap();
        assert_eq!(counts.languages, 1);
        assert_eq!(counts.courses, 1);
        assert_eq!(counts.modules, 1);
        assert_eq!(counts.lessons, 0);
        assert_eq!(f.db.language_id_by_code("fr").unwrap(), Some(f.language.id));
        assert_eq!(f.db.language_id_by_code("de").unwrap(), None);
        assert!(f.db.database_size().unwrap() > 0);
    }

    #[test]
    fn test_timestamp_roundtrip_keeps_microseconds() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap() + Duration::microseconds(42);
        let text = format_db_timestamp(&ts);
        assert_eq!(text, "2024-03-01 09:30:00.000042");
        assert_eq!(parse_db_timestamp(&text).unwrap(), ts);
        assert!(parse_db_timestamp("yesterday").is_err());
    }
}
