use criterion::{criterion_group, criterion_main, Criterion};
use lingua_search::models::{Course, Exercise, ExerciseType, Language, Lesson, Module, User};
use lingua_search::ranking::{merge_ranked, GLOBAL_LIMIT};
use lingua_search::search::{normalize_query, project_course};
use lingua_search::{CatalogStore, Identity, ResultKind, SearchApi, SearchFilters};
use uuid::Uuid;

const TOPICS: &[&str] = &["greetings", "numbers", "travel", "food", "family", "weather", "music", "work"];

fn setup_store() -> CatalogStore {
    // Prefer the generated catalog when present
    let db_path = concat!(env!("CARGO_MANIFEST_DIR"), "/benches/synthetic_catalog.sqlite");
    if std::path::Path::new(db_path).exists() {
        return CatalogStore::open(db_path).expect("Failed to open synthetic catalog");
    }

    let store = CatalogStore::new_in_memory().expect("Failed to create store");
    let language = store.add_language(&Language::new("fr", "French")).unwrap();
    for c in 0..100 {
        let topic = TOPICS[c % TOPICS.len()];
        let course = store
            .add_course(&Course::new(language, format!("French {} {}", topic, c), format!("All about {}", topic)))
            .unwrap();
        let module = store.add_module(&Module::new(course, "Unit 1", 0)).unwrap();
        for l in 0..5 {
            let lesson = store
                .add_lesson(&Lesson::new(module, format!("{} lesson {}", topic, l), "Listen and repeat the phrases.", l))
                .unwrap();
            store
                .add_exercise(&Exercise::new(lesson, ExerciseType::Speaking, format!("{} drill", topic), "Say it aloud.", 0))
                .unwrap();
        }
    }
    for u in 0..500 {
        store
            .add_user(&User::new(format!("learner{}", u), format!("learner{}@example.com", u)))
            .unwrap();
    }
    store
}

fn bench_search(c: &mut Criterion) {
    let store = setup_store();
    let rt = tokio::runtime::Runtime::new().unwrap();
    let identity = Some(Identity::new(Uuid::new_v4()));

    let queries = vec![
        ("short_circuit", "a"),
        ("common_word", "greetings"),
        ("rare_word", "weather lesson 4"),
        ("no_match", "zzzzzz"),
        ("match_all", "!!"),
        ("user_email", "learner42@"),
    ];

    let mut group = c.benchmark_group("search");
    group.sample_size(20);

    for (name, query) in queries {
        group.bench_function(name, |b| {
            b.iter(|| {
                rt.block_on(async {
                    store
                        .search(query.to_string(), SearchFilters::default(), identity)
                        .await
                        .unwrap()
                })
            });
        });
    }
    group.finish();
}

fn bench_pure_stages(c: &mut Criterion) {
    c.bench_function("normalize_query", |b| {
        b.iter(|| normalize_query("  ¿Dónde   está la ESTACIÓN?!  "))
    });

    let rows: Vec<_> = (0..70)
        .map(|i| lingua_search::models::CourseRow {
            id: i.to_string(),
            title: format!("Course {}", i),
            description: "x".repeat(400),
            language_code: "fr".into(),
            level: Default::default(),
            thumbnail_url: None,
            created_at: chrono::Utc::now(),
        })
        .collect();
    c.bench_function("merge_70", |b| {
        b.iter(|| {
            let hits = rows.iter().cloned().map(project_course).collect();
            merge_ranked(vec![(ResultKind::Course, hits)], GLOBAL_LIMIT)
        })
    });
}

criterion_group!(benches, bench_search, bench_pure_stages);
criterion_main!(benches);
