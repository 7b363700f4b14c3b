//! Generate a synthetic catalog database for benchmarks.
//!
//! Usage:
//!     cargo run --release --bin generate-catalog-db -- --courses 500 [output_path]
//!
//! Default output: benches/synthetic_catalog.sqlite

use anyhow::Context;
use chrono::{Duration, Utc};
use clap::Parser;
use lingua_search::database::Database;
use lingua_search::models::{Course, CourseLevel, Exercise, ExerciseType, Language, Lesson, LessonContentType, Module, User, UserType};
use rand::seq::SliceRandom;
use rand::Rng;
use std::path::PathBuf;

const LANGUAGES: &[(&str, &str)] = &[
    ("fr", "French"),
    ("es", "Spanish"),
    ("de", "German"),
    ("it", "Italian"),
    ("pt", "Portuguese"),
    ("ja", "Japanese"),
];

const TOPICS: &[&str] = &[
    "greetings", "numbers", "family", "food", "travel", "weather", "shopping", "directions",
    "hobbies", "work", "health", "music", "sports", "holidays", "colours", "animals",
];

const FILLER: &[&str] = &[
    "practice", "listen", "repeat", "vocabulary", "grammar", "dialogue", "pronunciation",
    "everyday", "phrases", "review", "story", "culture", "question", "answer", "example",
];

const FIRST_NAMES: &[&str] = &["Ana", "Ben", "Chloé", "Dmitri", "Elif", "Farah", "Goro", "Hana", "Iker", "Jonas"];
const LAST_NAMES: &[&str] = &["Silva", "Müller", "Rossi", "Dubois", "Tanaka", "García", "Novak", "Kaya"];

#[derive(Parser)]
#[command(name = "generate-catalog-db", about = "Write a synthetic catalog database")]
struct Args {
    /// Output database path
    output: Option<PathBuf>,

    /// Number of courses
    #[arg(long, default_value_t = 200)]
    courses: usize,

    /// Modules per course
    #[arg(long, default_value_t = 4)]
    modules: usize,

    /// Lessons per module
    #[arg(long, default_value_t = 5)]
    lessons: usize,

    /// Exercises per lesson
    #[arg(long, default_value_t = 3)]
    exercises: usize,

    /// Number of user accounts
    #[arg(long, default_value_t = 2_000)]
    users: usize,
}

fn sentence<R: Rng>(rng: &mut R, topic: &str, words: usize) -> String {
    let mut parts: Vec<&str> = (0..words)
        .map(|_| *FILLER.choose(rng).unwrap_or(&"practice"))
        .collect();
    let at = rng.gen_range(0..=parts.len());
    parts.insert(at, topic);
    let mut text = parts.join(" ");
    if let Some(first) = text.get_mut(0..1) {
        first.make_ascii_uppercase();
    }
    text.push('.');
    text
}

fn pick<'a, R: Rng>(rng: &mut R, items: &'a [&'a str]) -> &'a str {
    items.choose(rng).copied().unwrap_or_default()
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let output_path = args.output.unwrap_or_else(|| {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("benches")
            .join("synthetic_catalog.sqlite")
    });

    if output_path.exists() {
        std::fs::remove_file(&output_path).context("Failed to remove existing database")?;
    }
    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create output directory")?;
    }

    println!("Generating catalog database...");
    println!("Output: {}", output_path.display());

    let db = Database::open(&output_path).context("Failed to create database")?;
    let mut rng = rand::thread_rng();
    let start = Utc::now() - Duration::days(365);

    let mut language_ids = Vec::with_capacity(LANGUAGES.len());
    for (code, name) in LANGUAGES {
        let language = Language::new(*code, *name);
        db.insert_language(&language)?;
        language_ids.push(language.id);
    }

    let mut lesson_count = 0usize;
    let mut exercise_count = 0usize;
    for c in 0..args.courses {
        let topic = pick(&mut rng, TOPICS);
        let language_id = language_ids[c % language_ids.len()];
        let level = CourseLevel::ALL[rng.gen_range(0..CourseLevel::ALL.len())];
        let mut course = Course::new(language_id, format!("{} {} {}", LANGUAGES[c % LANGUAGES.len()].1, topic, c), sentence(&mut rng, topic, 30))
            .with_level(level)
            .with_created_at(start + Duration::minutes(rng.gen_range(0..525_600)));
        // A few retired courses so the activity joins have work to do
        if rng.gen_bool(0.05) {
            course = course.inactive();
        }
        db.insert_course(&course)?;

        for m in 0..args.modules {
            let module = Module::new(course.id, format!("Unit {}", m + 1), m as i64);
            db.insert_module(&module)?;

            for l in 0..args.lessons {
                let lesson_topic = pick(&mut rng, TOPICS);
                let content_type = LessonContentType::ALL[rng.gen_range(0..LessonContentType::ALL.len())];
                let lesson = Lesson::new(module.id, format!("{} lesson {}", lesson_topic, l + 1), sentence(&mut rng, lesson_topic, 60), l as i64)
                    .with_content_type(content_type)
                    .with_duration(rng.gen_range(5..=45))
                    .with_created_at(start + Duration::minutes(rng.gen_range(0..525_600)));
                db.insert_lesson(&lesson)?;
                lesson_count += 1;

                for e in 0..args.exercises {
                    let kind = ExerciseType::ALL[rng.gen_range(0..ExerciseType::ALL.len())];
                    let exercise = Exercise::new(lesson.id, kind, format!("{} drill {}", lesson_topic, e + 1), sentence(&mut rng, lesson_topic, 15), e as i64)
                        .with_points(rng.gen_range(1..=20))
                        .with_created_at(start + Duration::minutes(rng.gen_range(0..525_600)));
                    db.insert_exercise(&exercise)?;
                    exercise_count += 1;
                }
            }
        }

        if (c + 1) % 50 == 0 {
            println!("  Generated {}/{} courses...", c + 1, args.courses);
        }
    }

    for u in 0..args.users {
        let first = pick(&mut rng, FIRST_NAMES);
        let last = pick(&mut rng, LAST_NAMES);
        let username = format!("{}{}", first.to_lowercase(), u);
        let user_type = if u % 20 == 0 { UserType::Teacher } else { UserType::Student };
        let user = User::new(username.clone(), format!("{}@example.com", username))
            .with_name(first, last)
            .with_user_type(user_type)
            .joined_at(start + Duration::minutes(rng.gen_range(0..525_600)));
        db.insert_user(&user)?;
    }

    println!();
    println!("Database created: {}", output_path.display());
    println!("  Courses: {}", args.courses);
    println!("  Lessons: {}", lesson_count);
    println!("  Exercises: {}", exercise_count);
    println!("  Users: {}", args.users);
    println!("  Size: {:.2} MB", db.database_size()? as f64 / 1024.0 / 1024.0);
    Ok(())
}
