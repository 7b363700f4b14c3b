//! CatalogStore - main entry point
//!
//! Owns the catalog database, exposes validated catalog writes, and serves
//! federated search over it.
//!
//! Concurrency model:
//! - Database uses an r2d2 connection pool (concurrent reads, no mutex)
//! - Each search runs its per-source reads on tokio blocking threads
//! - Outside any runtime the engine falls back to a global runtime

use crate::database::{CatalogCounts, CatalogTable, Database};
use crate::interface::{Identity, LinguaError, SearchApi, SearchFilters, SearchResponse};
use crate::models::{Course, Exercise, Language, Lesson, Module, User};
use crate::search::FederatedSearch;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Thread-safe catalog store with search
pub struct CatalogStore {
    db: Arc<Database>,
    engine: FederatedSearch<Database>,
}

impl CatalogStore {
    /// Open (or create) a catalog database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, LinguaError> {
        let db = Database::open(path).map_err(LinguaError::storage)?;
        Ok(Self::from_database(db))
    }

    pub fn open_with_pool_size<P: AsRef<Path>>(path: P, pool_size: u32) -> Result<Self, LinguaError> {
        let db = Database::open_with_pool_size(path, pool_size).map_err(LinguaError::storage)?;
        Ok(Self::from_database(db))
    }

    /// Store backed by an in-memory database
    pub fn new_in_memory() -> Result<Self, LinguaError> {
        let db = Database::open_in_memory().map_err(LinguaError::storage)?;
        Ok(Self::from_database(db))
    }

    fn from_database(db: Database) -> Self {
        let db = Arc::new(db);
        let engine = FederatedSearch::new(Arc::clone(&db));
        Self { db, engine }
    }

    /// Get the database size in bytes
    pub fn database_size(&self) -> i64 {
        self.db.database_size().unwrap_or(0)
    }

    pub fn catalog_counts(&self) -> Result<CatalogCounts, LinguaError> {
        self.db.catalog_counts().map_err(LinguaError::storage)
    }

    pub fn language_id(&self, code: &str) -> Result<Option<Uuid>, LinguaError> {
        self.db.language_id_by_code(code).map_err(LinguaError::storage)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Write Operations
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn add_language(&self, language: &Language) -> Result<Uuid, LinguaError> {
        language.validate().map_err(LinguaError::InvalidInput)?;
        self.db.insert_language(language).map_err(LinguaError::storage)?;
        debug!(id = %language.id, code = %language.code, "language added");
        Ok(language.id)
    }

    pub fn add_course(&self, course: &Course) -> Result<Uuid, LinguaError> {
        course.validate().map_err(LinguaError::InvalidInput)?;
        self.db.insert_course(course).map_err(LinguaError::storage)?;
        debug!(id = %course.id, "course added");
        Ok(course.id)
    }

    pub fn add_module(&self, module: &Module) -> Result<Uuid, LinguaError> {
        module.validate().map_err(LinguaError::InvalidInput)?;
        self.db.insert_module(module).map_err(LinguaError::storage)?;
        Ok(module.id)
    }

    pub fn add_lesson(&self, lesson: &Lesson) -> Result<Uuid, LinguaError> {
        lesson.validate().map_err(LinguaError::InvalidInput)?;
        self.db.insert_lesson(lesson).map_err(LinguaError::storage)?;
        debug!(id = %lesson.id, "lesson added");
        Ok(lesson.id)
    }

    pub fn add_exercise(&self, exercise: &Exercise) -> Result<Uuid, LinguaError> {
        exercise.validate().map_err(LinguaError::InvalidInput)?;
        self.db.insert_exercise(exercise).map_err(LinguaError::storage)?;
        Ok(exercise.id)
    }

    pub fn add_user(&self, user: &User) -> Result<Uuid, LinguaError> {
        user.validate().map_err(LinguaError::InvalidInput)?;
        self.db.insert_user(user).map_err(LinguaError::storage)?;
        debug!(id = %user.id, "user added");
        Ok(user.id)
    }

    fn set_active(&self, table: CatalogTable, id: Uuid, active: bool) -> Result<(), LinguaError> {
        let found = self.db.set_active(table, id, active).map_err(LinguaError::storage)?;
        if !found {
            return Err(LinguaError::InvalidInput(format!("no record with id {}", id)));
        }
        Ok(())
    }

    pub fn set_language_active(&self, id: Uuid, active: bool) -> Result<(), LinguaError> {
        self.set_active(CatalogTable::Languages, id, active)
    }

    pub fn set_course_active(&self, id: Uuid, active: bool) -> Result<(), LinguaError> {
        self.set_active(CatalogTable::Courses, id, active)
    }

    pub fn set_module_active(&self, id: Uuid, active: bool) -> Result<(), LinguaError> {
        self.set_active(CatalogTable::Modules, id, active)
    }

    pub fn set_lesson_active(&self, id: Uuid, active: bool) -> Result<(), LinguaError> {
        self.set_active(CatalogTable::Lessons, id, active)
    }

    pub fn set_exercise_active(&self, id: Uuid, active: bool) -> Result<(), LinguaError> {
        self.set_active(CatalogTable::Exercises, id, active)
    }

    pub fn set_user_active(&self, id: Uuid, active: bool) -> Result<(), LinguaError> {
        self.set_active(CatalogTable::Users, id, active)
    }
}

#[async_trait::async_trait]
impl SearchApi for CatalogStore {
    async fn search(
        &self,
        query: String,
        filters: SearchFilters,
        identity: Option<Identity>,
    ) -> Result<SearchResponse, LinguaError> {
        self.engine.search(&query, &filters, identity.as_ref()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interface::{HitPayload, ResultKind};
    use crate::models::{CourseLevel, ExerciseType, UserType};
    use std::collections::HashMap;

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
    }

    struct Seeded {
        store: CatalogStore,
        course: Uuid,
        lesson: Uuid,
    }

    fn seeded() -> Seeded {
        let store = CatalogStore::new_in_memory().unwrap();
        let language = store.add_language(&Language::new("fr", "French")).unwrap();
        let course = store
            .add_course(&Course::new(language, "Français 101", "Learn Français").with_level(CourseLevel::Beginner))
            .unwrap();
        let module = store.add_module(&Module::new(course, "Unit 1", 0)).unwrap();
        let lesson = store
            .add_lesson(&Lesson::new(module, "Bonjour", "Saying hello in French", 0))
            .unwrap();
        store
            .add_exercise(&Exercise::new(lesson, ExerciseType::Speaking, "Say bonjour", "Greet your teacher", 0))
            .unwrap();
        store
            .add_user(&User::new("frenchfan", "fan@example.com").with_user_type(UserType::Student))
            .unwrap();
        Seeded { store, course, lesson }
    }

    fn identity() -> Option<Identity> {
        Some(Identity::new(Uuid::new_v4()))
    }

    #[test]
    fn test_store_creation() {
        let store = CatalogStore::new_in_memory().unwrap();
        assert!(store.database_size() > 0);
        assert_eq!(store.catalog_counts().unwrap(), CatalogCounts::default());
    }

    #[test]
    fn test_search_across_sources() {
        let rt = runtime();
        let s = seeded();

        let response = rt
            .block_on(s.store.search("french".into(), SearchFilters::default(), identity()))
            .unwrap();
        let by_type = response.by_type.unwrap();
        assert_eq!(by_type.courses, 0);
        assert_eq!(by_type.lessons, 1);
        assert_eq!(by_type.users, 1);
        assert_eq!(response.total, 2);
        // user 0.99 beats lesson 0.8
        assert_eq!(response.results[0].kind(), ResultKind::User);
    }

    #[test]
    fn test_accented_query_matches() {
        let rt = runtime();
        let s = seeded();

        let response = rt
            .block_on(s.store.search("Franç ais!!".into(), SearchFilters::default(), identity()))
            .unwrap();
        // "franç ais" is not a substring of "français"
        assert_eq!(response.total, 0);

        let response = rt
            .block_on(s.store.search("FRANÇAIS".into(), SearchFilters::default(), identity()))
            .unwrap();
        assert_eq!(response.total, 1);
        match &response.results[0].payload {
            HitPayload::Course(c) => {
                assert_eq!(c.title, "Français 101");
                assert_eq!(c.description, "Learn Français...");
            }
            other => panic!("expected course, got {:?}", other),
        }
    }

    #[test]
    fn test_inactive_parents_hide_children() {
        let rt = runtime();
        let s = seeded();

        s.store.set_lesson_active(s.lesson, false).unwrap();
        let response = rt
            .block_on(s.store.search("bonjour".into(), SearchFilters::default(), None))
            .unwrap();
        assert_eq!(response.total, 0);

        s.store.set_lesson_active(s.lesson, true).unwrap();
        let response = rt
            .block_on(s.store.search("bonjour".into(), SearchFilters::default(), None))
            .unwrap();
        assert_eq!(response.by_type.unwrap().exercises, 1);
        assert_eq!(response.by_type.unwrap().lessons, 1);

        s.store.set_course_active(s.course, false).unwrap();
        let response = rt
            .block_on(s.store.search("bonjour".into(), SearchFilters::default(), None))
            .unwrap();
        assert_eq!(response.total, 0);
    }

    #[test]
    fn test_search_raw_rejects_bad_filter_but_not_short_query() {
        let rt = runtime();
        let s = seeded();
        let mut filters = HashMap::new();
        filters.insert("course_id".to_string(), "not-a-uuid".to_string());

        let err = rt
            .block_on(s.store.search_raw("bonjour".into(), filters.clone(), None))
            .unwrap_err();
        assert!(matches!(err, LinguaError::InvalidFilter { .. }));

        let response = rt.block_on(s.store.search_raw("b".into(), filters, None)).unwrap();
        assert!(response.is_short_circuit());
    }

    #[test]
    fn test_filters_scope_their_own_source() {
        let rt = runtime();
        let s = seeded();
        // A level filter narrows courses only
        let filters = SearchFilters::default().with_level(CourseLevel::Advanced);
        let response = rt.block_on(s.store.search("bonjour".into(), filters, None)).unwrap();
        assert_eq!(response.by_type.unwrap().lessons, 1);
        assert_eq!(response.by_type.unwrap().exercises, 1);
    }

    #[test]
    fn test_invalid_writes_rejected() {
        let s = seeded();
        let err = s.store.add_user(&User::new("x", "nope")).unwrap_err();
        assert!(matches!(err, LinguaError::InvalidInput(_)));

        // Duplicate username violates the unique constraint
        let err = s.store.add_user(&User::new("frenchfan", "other@example.com")).unwrap_err();
        assert!(matches!(err, LinguaError::Storage(_)));

        let err = s.store.set_course_active(Uuid::new_v4(), false).unwrap_err();
        assert!(matches!(err, LinguaError::InvalidInput(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_searches_on_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(CatalogStore::open(dir.path().join("catalog.sqlite")).unwrap());
        let language = store.add_language(&Language::new("es", "Spanish")).unwrap();
        for i in 0..5 {
            store
                .add_course(&Course::new(language, format!("Spanish {}", i), "Hola"))
                .unwrap();
        }

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.search("hola".into(), SearchFilters::default(), None).await
            }));
        }
        for handle in handles {
            let response = handle.await.unwrap().unwrap();
            assert_eq!(response.total, 5);
        }
    }
}
