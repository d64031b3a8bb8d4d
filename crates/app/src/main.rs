use std::fmt;
use std::sync::Arc;

use course_core::model::{Advance, LessonId, LessonMedia, ProgressPolicy, UserId, ViewerState};
use services::{
    AppServices, Clock, CourseError, CourseSession, ProgressStatus, StaticIdentity, ViewerSession,
};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidId { flag: &'static str, raw: String },
    UnknownLesson(LessonId),
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidId { flag, raw } => write!(f, "invalid {flag} value: {raw:?}"),
            ArgsError::UnknownLesson(id) => write!(f, "lesson {id} is not in the course"),
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

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- outline  [--db <sqlite_url>] [--user <id>]");
    eprintln!("  cargo run -p app -- complete [--db <sqlite_url>] --user <id> [--lesson <id>] [--rollback]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite://course.sqlite3");
    eprintln!("  no --user: browse as a demo viewer (progress is not recorded)");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  COURSE_DB_URL, COURSE_USER_ID, RUST_LOG");
    eprintln!("  COURSE_GENERATION_URL, COURSE_GENERATION_KEY");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Outline,
    Complete,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "outline" => Some(Self::Outline),
            "complete" => Some(Self::Complete),
            _ => None,
        }
    }
}

struct Args {
    db_url: String,
    user: Option<UserId>,
    lesson: Option<LessonId>,
    policy: ProgressPolicy,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("COURSE_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://course.sqlite3".into(), normalize_sqlite_url);
        let mut user = std::env::var("COURSE_USER_ID")
            .ok()
            .and_then(|value| value.parse::<UserId>().ok());
        let mut lesson = None;
        let mut policy = ProgressPolicy::default();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--user" => {
                    let value = require_value(args, "--user")?;
                    user = Some(value.parse().map_err(|_| ArgsError::InvalidId {
                        flag: "--user",
                        raw: value.clone(),
                    })?);
                }
                "--lesson" => {
                    let value = require_value(args, "--lesson")?;
                    lesson = Some(value.parse().map_err(|_| ArgsError::InvalidId {
                        flag: "--lesson",
                        raw: value.clone(),
                    })?);
                }
                "--rollback" => policy = ProgressPolicy::RollBack,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            user,
            lesson,
            policy,
        })
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("app=info,services=info")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn print_outline(session: &CourseSession) {
    if session.sequence().is_empty() {
        println!("No lessons yet.");
        return;
    }

    let mut current_module = None;
    for entry in session.outline() {
        if current_module.as_ref() != Some(&entry.module_id) {
            let title = session
                .modules()
                .iter()
                .find(|module| module.id() == &entry.module_id)
                .map_or("", |module| module.title());
            println!("{title}");
            current_module = Some(entry.module_id.clone());
        }
        let mark = if entry.is_complete { "x" } else { " " };
        let pointer = if entry.is_current { ">" } else { " " };
        println!(
            "{pointer} [{mark}] {:>2}. {}  ({})",
            entry.position, entry.title, entry.lesson_id
        );
    }

    let overall = session.progress().overall;
    println!();
    println!(
        "{}/{} lessons complete ({}%)",
        overall.completed,
        overall.total,
        overall.percent()
    );
}

fn print_current(session: &CourseSession) {
    let Some(lesson) = session.current_lesson() else {
        println!("No lesson selected.");
        return;
    };
    println!("Now: {} ({})", lesson.title(), lesson.id());
    match lesson.media() {
        LessonMedia::Generated {
            image_url,
            audio_url,
        } => {
            if let Some(url) = image_url {
                println!("  image: {url}");
            }
            if let Some(url) = audio_url {
                println!("  audio: {url}");
            }
        }
        LessonMedia::Video(url) => println!("  video: {url}"),
    }
}

/// Select the requested lesson, or resume at the first incomplete one.
fn choose_lesson(session: &mut CourseSession, lesson: Option<&LessonId>) -> Result<(), ArgsError> {
    match lesson {
        Some(lesson) if !session.select(lesson) => Err(ArgsError::UnknownLesson(lesson.clone())),
        Some(_) => Ok(()),
        None => {
            session.resume();
            Ok(())
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);

    let cmd = match argv.next() {
        None => {
            print_usage();
            return Ok(());
        }
        Some(first) if first == "--help" || first == "-h" => {
            print_usage();
            return Ok(());
        }
        Some(first) => Command::from_arg(&first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    let parsed = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    // Keep file creation in the binary glue so storage only ever opens.
    prepare_sqlite_file(&parsed.db_url)?;
    let app_services = AppServices::new_sqlite(&parsed.db_url, Clock::default())
        .await?
        .with_progress_policy(parsed.policy);

    let identity = parsed
        .user
        .clone()
        .map_or_else(StaticIdentity::anonymous, StaticIdentity::signed_in);
    let mut viewer = ViewerSession::new(Arc::new(identity));
    let viewer_state: ViewerState = viewer.resolve().await.clone();

    let mut session = app_services.course_session();
    let report = session.open(&viewer_state).await?;
    if report.progress == ProgressStatus::Unavailable {
        eprintln!("warning: progress could not be loaded; showing none");
    }

    match cmd {
        Command::Outline => {
            print_outline(&session);
            Ok(())
        }
        Command::Complete => {
            choose_lesson(&mut session, parsed.lesson.as_ref())?;

            match session.mark_and_advance(&viewer_state).await {
                Ok(Advance::Moved(_)) => print_current(&session),
                Ok(Advance::AtEnd) => println!("Course complete."),
                Ok(Advance::NoSelection) => println!("No lesson selected."),
                Err(err @ CourseError::Unauthorized) => {
                    eprintln!("sign in to record progress (pass --user <id>)");
                    return Err(err.into());
                }
                Err(err) => return Err(err.into()),
            }
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
