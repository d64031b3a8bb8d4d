use std::fmt;

use course_core::model::{
    Lesson, LessonDraft, LessonId, LessonResources, Module, ModuleDraft, ModuleId, Profile, Role,
    UserId,
};
use storage::repository::{Storage, StorageError};

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    admin: Option<String>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("COURSE_DB_URL").unwrap_or_else(|_| "sqlite://course.sqlite3?mode=rwc".into());
        let mut admin = std::env::var("COURSE_ADMIN_ID").ok();

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--admin" => {
                    admin = Some(require_value(&mut args, "--admin")?);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self { db_url, admin })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>   SQLite URL (default: sqlite://course.sqlite3?mode=rwc)");
    eprintln!("  --admin <user_id>   Grant the admin role to this user id");
    eprintln!("  -h, --help          Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  COURSE_DB_URL, COURSE_ADMIN_ID");
}

const SAMPLE_LESSONS: [(&str, &str, &str); 4] = [
    (
        "Introduction to Testing & QA Mindset",
        "Why testing matters and how testers think.",
        "Welcome to Module 1! Testing isn't just about finding bugs. It's a mindset.",
    ),
    (
        "Software Development Life Cycle",
        "Where testing fits in the SDLC.",
        "Every product moves through planning, design, build, test, release and maintenance.",
    ),
    (
        "Types of Testing",
        "Functional, non-functional, manual and automated testing.",
        "Let's map out the testing landscape before we automate any of it.",
    ),
    (
        "Writing Effective Test Cases",
        "Structure, preconditions and expected results.",
        "A good test case is repeatable, precise and independent.",
    ),
];

fn sample_lesson(module_id: &ModuleId, index: usize) -> Result<Lesson, Box<dyn std::error::Error>> {
    let (title, description, script) = SAMPLE_LESSONS[index];
    let draft = LessonDraft {
        module_id: module_id.clone(),
        title: title.to_owned(),
        description: description.to_owned(),
        video_url: "https://www.youtube.com/embed/dQw4w9WgXcQ".to_owned(),
        trainer_script: script.to_owned(),
        visual_suggestion: Some("Title slide with a teal gradient and three icons.".to_owned()),
        example: None,
        resources: LessonResources::from_items(vec![
            "ISTQB Foundation Level syllabus".to_owned(),
            "Playwright documentation".to_owned(),
        ]),
        order_index: i32::try_from(index)?,
    };
    Ok(draft.into_lesson(LessonId::new(format!("module-1-lesson-{}", index + 1)))?)
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;

    let module: Module = ModuleDraft {
        title: "Module 1: Foundation".to_owned(),
        description: "Manual testing foundations before automation.".to_owned(),
        order_index: 0,
    }
    .into_module(ModuleId::new("module-1"))?;
    storage.content.upsert_module(&module).await?;

    for index in 0..SAMPLE_LESSONS.len() {
        let lesson = sample_lesson(module.id(), index)?;
        storage.content.upsert_lesson(&lesson).await?;
    }

    if let Some(admin) = args.admin.as_deref() {
        let user_id = UserId::new(admin);
        storage
            .roles
            .upsert_profile(&Profile {
                id: user_id.clone(),
                email: format!("{admin}@example.com"),
                full_name: None,
            })
            .await?;
        match storage.roles.grant_role(&user_id, Role::Admin).await {
            Ok(()) | Err(StorageError::Conflict) => {}
            Err(err) => return Err(err.into()),
        }
    }

    println!(
        "Seeded module {} with {} lessons into {}",
        module.id(),
        SAMPLE_LESSONS.len(),
        args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
