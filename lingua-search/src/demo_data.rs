//! Small fixed demo catalog.
//!
//! Three languages, a handful of courses with modules, lessons and exercises,
//! and a few accounts. Creation times are fixed and increase in insertion
//! order, so newest-first ordering is predictable.

use crate::interface::LinguaError;
use crate::models::{Course, CourseLevel, Exercise, ExerciseType, Language, Lesson, LessonContentType, Module, User, UserType};
use crate::store::CatalogStore;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::HashMap;
use uuid::Uuid;

struct DemoLanguage {
    code: &'static str,
    name: &'static str,
    native_name: &'static str,
    flag: &'static str,
}

struct DemoExercise {
    kind: ExerciseType,
    title: &'static str,
    question: &'static str,
    points: i64,
}

struct DemoLesson {
    title: &'static str,
    content_type: LessonContentType,
    content: &'static str,
    minutes: i64,
    exercises: &'static [DemoExercise],
}

struct DemoModule {
    title: &'static str,
    lessons: &'static [DemoLesson],
}

struct DemoCourse {
    language: &'static str,
    title: &'static str,
    description: &'static str,
    level: CourseLevel,
    thumbnail: Option<&'static str>,
    modules: &'static [DemoModule],
}

struct DemoUser {
    username: &'static str,
    email: &'static str,
    first_name: &'static str,
    last_name: &'static str,
    user_type: UserType,
}

const LANGUAGES: &[DemoLanguage] = &[
    DemoLanguage { code: "fr", name: "French", native_name: "Français", flag: "🇫🇷" },
    DemoLanguage { code: "es", name: "Spanish", native_name: "Español", flag: "🇪🇸" },
    DemoLanguage { code: "de", name: "German", native_name: "Deutsch", flag: "🇩🇪" },
];

const COURSES: &[DemoCourse] = &[
    DemoCourse {
        language: "fr",
        title: "Français 101",
        description: "Learn Français",
        level: CourseLevel::Beginner,
        thumbnail: Some("https://cdn.example.com/courses/francais-101.png"),
        modules: &[DemoModule {
            title: "Premiers pas",
            lessons: &[
                DemoLesson {
                    title: "Bonjour et au revoir",
                    content_type: LessonContentType::Video,
                    content: "Greetings for every time of day: bonjour, bonsoir, salut and au revoir.",
                    minutes: 12,
                    exercises: &[
                        DemoExercise {
                            kind: ExerciseType::Speaking,
                            title: "Say bonjour",
                            question: "Record yourself greeting a neighbour in the morning.",
                            points: 10,
                        },
                        DemoExercise {
                            kind: ExerciseType::MultipleChoice,
                            title: "Evening greetings",
                            question: "Which greeting fits after 6 pm?",
                            points: 5,
                        },
                    ],
                },
                DemoLesson {
                    title: "Les nombres",
                    content_type: LessonContentType::Audio,
                    content: "Counting from un to vingt, with listening practice.",
                    minutes: 15,
                    exercises: &[DemoExercise {
                        kind: ExerciseType::Listening,
                        title: "Number dictation",
                        question: "Write down the numbers you hear.",
                        points: 10,
                    }],
                },
            ],
        }],
    },
    DemoCourse {
        language: "fr",
        title: "French Grammar Deep Dive",
        description: "Subjunctive, conditional and the passé composé for intermediate learners.",
        level: CourseLevel::Intermediate,
        thumbnail: None,
        modules: &[DemoModule {
            title: "Verb tenses",
            lessons: &[DemoLesson {
                title: "Passé composé",
                content_type: LessonContentType::Text,
                content: "Building the past tense with avoir and être.",
                minutes: 20,
                exercises: &[DemoExercise {
                    kind: ExerciseType::FillBlank,
                    title: "Complete the past tense",
                    question: "Hier, je ___ (aller) au marché.",
                    points: 15,
                }],
            }],
        }],
    },
    DemoCourse {
        language: "es",
        title: "Spanish for Travellers",
        description: "Ordering food, asking for directions and checking into a hotel.",
        level: CourseLevel::Beginner,
        thumbnail: None,
        modules: &[DemoModule {
            title: "En la ciudad",
            lessons: &[DemoLesson {
                title: "Asking for directions",
                content_type: LessonContentType::Interactive,
                content: "¿Dónde está la estación? Useful phrases for finding your way.",
                minutes: 18,
                exercises: &[
                    DemoExercise {
                        kind: ExerciseType::Translation,
                        title: "Translate directions",
                        question: "Translate: turn left at the station.",
                        points: 10,
                    },
                    DemoExercise {
                        kind: ExerciseType::Matching,
                        title: "Match the places",
                        question: "Match each Spanish word with the place it names.",
                        points: 5,
                    },
                ],
            }],
        }],
    },
    DemoCourse {
        language: "de",
        title: "German Pronunciation Lab",
        description: "Umlauts, the ich-Laut and the ach-Laut, with recorded drills.",
        level: CourseLevel::Advanced,
        thumbnail: None,
        modules: &[DemoModule {
            title: "Vowels",
            lessons: &[DemoLesson {
                title: "Umlauts",
                content_type: LessonContentType::Audio,
                content: "Hearing and producing ä, ö and ü.",
                minutes: 10,
                exercises: &[DemoExercise {
                    kind: ExerciseType::Writing,
                    title: "Spell the umlaut words",
                    question: "Write the word you hear, umlauts included.",
                    points: 10,
                }],
            }],
        }],
    },
];

const USERS: &[DemoUser] = &[
    DemoUser {
        username: "camille_t",
        email: "camille@example.com",
        first_name: "Camille",
        last_name: "Tremblay",
        user_type: UserType::Teacher,
    },
    DemoUser {
        username: "diego",
        email: "diego@example.com",
        first_name: "Diego",
        last_name: "Fernández",
        user_type: UserType::Student,
    },
    DemoUser {
        username: "frenchfan",
        email: "fan@example.com",
        first_name: "",
        last_name: "",
        user_type: UserType::Student,
    },
    DemoUser {
        username: "admin",
        email: "admin@example.com",
        first_name: "Site",
        last_name: "Admin",
        user_type: UserType::Admin,
    },
];

/// Ids of the seeded records, keyed by language code or title
#[derive(Debug, Clone, Default)]
pub struct DemoCatalog {
    pub languages: HashMap<String, Uuid>,
    pub courses: HashMap<String, Uuid>,
    pub lessons: HashMap<String, Uuid>,
    pub exercises: HashMap<String, Uuid>,
    pub users: HashMap<String, Uuid>,
}

/// Monotonic fixed clock for demo records
struct DemoClock {
    next: DateTime<Utc>,
}

impl DemoClock {
    fn new() -> Self {
        // 2024-01-01T00:00:00Z
        let next = Utc.timestamp_opt(1_704_067_200, 0).single().unwrap_or_else(Utc::now);
        Self { next }
    }

    fn tick(&mut self) -> DateTime<Utc> {
        let now = self.next;
        self.next = self.next + Duration::minutes(1);
        now
    }
}

/// Insert the demo catalog into `store`.
pub fn seed_demo_catalog(store: &CatalogStore) -> Result<DemoCatalog, LinguaError> {
    let mut clock = DemoClock::new();
    let mut catalog = DemoCatalog::default();

    for demo in LANGUAGES {
        let language = Language::new(demo.code, demo.name)
            .with_native_name(demo.native_name)
            .with_flag(demo.flag);
        let id = store.add_language(&language)?;
        catalog.languages.insert(demo.code.to_string(), id);
    }

    for demo in COURSES {
        let language_id = catalog
            .languages
            .get(demo.language)
            .copied()
            .ok_or_else(|| LinguaError::InvalidInput(format!("unknown demo language {}", demo.language)))?;
        let mut course = Course::new(language_id, demo.title, demo.description)
            .with_level(demo.level)
            .with_created_at(clock.tick());
        if let Some(url) = demo.thumbnail {
            course = course.with_thumbnail(url);
        }
        let course_id = store.add_course(&course)?;
        catalog.courses.insert(demo.title.to_string(), course_id);

        for (module_index, demo_module) in demo.modules.iter().enumerate() {
            let module_id = store.add_module(&Module::new(course_id, demo_module.title, module_index as i64))?;

            for (lesson_index, demo_lesson) in demo_module.lessons.iter().enumerate() {
                let lesson = Lesson::new(module_id, demo_lesson.title, demo_lesson.content, lesson_index as i64)
                    .with_content_type(demo_lesson.content_type)
                    .with_duration(demo_lesson.minutes)
                    .with_created_at(clock.tick());
                let lesson_id = store.add_lesson(&lesson)?;
                catalog.lessons.insert(demo_lesson.title.to_string(), lesson_id);

                for (exercise_index, demo_exercise) in demo_lesson.exercises.iter().enumerate() {
                    let exercise = Exercise::new(
                        lesson_id,
                        demo_exercise.kind,
                        demo_exercise.title,
                        demo_exercise.question,
                        exercise_index as i64,
                    )
                    .with_points(demo_exercise.points)
                    .with_created_at(clock.tick());
                    let exercise_id = store.add_exercise(&exercise)?;
                    catalog.exercises.insert(demo_exercise.title.to_string(), exercise_id);
                }
            }
        }
    }

    for demo in USERS {
        let user = User::new(demo.username, demo.email)
            .with_name(demo.first_name, demo.last_name)
            .with_user_type(demo.user_type)
            .joined_at(clock.tick());
        let id = store.add_user(&user)?;
        catalog.users.insert(demo.username.to_string(), id);
    }

    Ok(catalog)
}
