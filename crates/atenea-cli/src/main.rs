//! Command-line instructor console for Atenea courses.
//!
//! Each invocation is one console session against a JSON snapshot store:
//! load the snapshot, open the console as the given instructor, run one
//! operation, save the snapshot back.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use atenea_client::{HttpCredentialService, MemoryStore, StaticAuth};
use atenea_console::{
    ConsoleConfig, CourseConsole, Identity, LessonContent, LessonKind, Question,
};

#[derive(Parser)]
#[command(name = "atenea", about = "Instructor console for Atenea courses", version)]
struct Cli {
    /// Path to the configuration file
    #[arg(long, global = true, default_value = "atenea.json")]
    config: PathBuf,

    /// Path to the data snapshot (overrides the configured one)
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Course to open
    #[arg(long, global = true, default_value = "")]
    course: String,

    /// Instructor user id to act as
    #[arg(long, global = true, default_value = "")]
    user: String,

    /// Instructor display name
    #[arg(long, global = true)]
    name: Option<String>,

    /// Instructor email
    #[arg(long, global = true)]
    email: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the course, its lessons, and the roster
    Show,

    /// Add a lesson to the course
    AddLesson {
        /// Lesson title
        #[arg(long)]
        title: String,
        /// Lesson type: text, video, pdf, live, quiz
        #[arg(long, default_value = "text")]
        kind: String,
        #[command(flatten)]
        content: ContentArgs,
    },

    /// Edit an existing lesson
    EditLesson {
        /// Id of the lesson to edit
        #[arg(long)]
        id: String,
        /// New title, if changing it
        #[arg(long)]
        title: Option<String>,
        /// New lesson type, if changing it
        #[arg(long)]
        kind: Option<String>,
        #[command(flatten)]
        content: ContentArgs,
    },

    /// Set a student's grade
    Grade {
        /// Student user id
        #[arg(long)]
        student: String,
        /// Grade on the 0..=10 scale, empty to leave ungraded
        #[arg(long)]
        value: String,
    },

    /// Start a live session for a lesson and print the join info
    Live {
        /// Id of the live lesson
        #[arg(long)]
        lesson: String,
    },

    /// Replace the course cover image
    Cover {
        /// Path to the image file
        #[arg(long)]
        file: PathBuf,
    },
}

/// Per-variant content fields shared by add-lesson and edit-lesson.
#[derive(clap::Args)]
struct ContentArgs {
    /// Body for text lessons
    #[arg(long)]
    text: Option<String>,
    /// URL for video lessons
    #[arg(long)]
    video_url: Option<String>,
    /// URL for PDF lessons
    #[arg(long)]
    pdf_url: Option<String>,
    /// Room name for live lessons
    #[arg(long)]
    room: Option<String>,
    /// Recording URL for live lessons
    #[arg(long)]
    recording_url: Option<String>,
    /// Path to a JSON file with quiz questions
    #[arg(long)]
    questions: Option<PathBuf>,
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.course.is_empty() {
        bail!("--course is required");
    }
    if cli.user.is_empty() {
        bail!("--user is required");
    }

    let config = ConsoleConfig::load_from_file(&cli.config)?;
    let data_file = cli.data.clone().unwrap_or_else(|| config.data_file.clone());

    let store = Arc::new(MemoryStore::new());
    store.load_from_file(&data_file)?;
    debug!(data = %data_file.display(), "snapshot loaded");

    let identity = Identity {
        user_id: cli.user.clone(),
        display_name: cli.name.clone(),
        email: cli.email.clone(),
    };
    let credentials = Arc::new(HttpCredentialService::new(
        config.credential_endpoint.clone(),
    ));
    let auth = Arc::new(StaticAuth::signed_in(identity));

    let mut console = CourseConsole::open(
        store.clone(),
        store.clone(),
        credentials,
        auth,
        config,
        cli.course.clone(),
    )
    .await?;

    let mutated = run(&mut console, &cli.command).await?;
    if mutated {
        store.save_to_file(&data_file)?;
    }
    Ok(())
}

/// Runs one subcommand; returns whether the snapshot needs saving.
async fn run(console: &mut CourseConsole, command: &Command) -> anyhow::Result<bool> {
    match command {
        Command::Show => {
            show(console);
            Ok(false)
        }
        Command::AddLesson {
            title,
            kind,
            content,
        } => {
            console.begin_create()?;
            fill_draft(console, Some(title), Some(kind), content)?;
            let lesson = console.submit_lesson().await?;
            println!("added lesson {} ({})", lesson.id, lesson.kind());
            Ok(true)
        }
        Command::EditLesson {
            id,
            title,
            kind,
            content,
        } => {
            console.begin_edit(id)?;
            fill_draft(console, title.as_ref(), kind.as_ref(), content)?;
            let lesson = console.submit_lesson().await?;
            println!("updated lesson {} ({})", lesson.id, lesson.kind());
            Ok(true)
        }
        Command::Grade { student, value } => {
            console.set_grade_draft(student, value);
            if console.grade_draft(student) != value.as_str() {
                bail!("invalid grade '{value}': expected a number in 0..=10 or an empty string");
            }
            match console.commit_grade(student).await? {
                Some(grade) => println!("graded {student}: {grade}"),
                None => println!("no grade entered for {student}, nothing saved"),
            }
            Ok(true)
        }
        Command::Live { lesson } => {
            let app_id = console.video_app_id().to_string();
            let view = console.start_live(lesson).await?;
            println!("live session ready");
            println!("  room:   {}", view.room_name);
            println!("  app id: {app_id}");
            println!("  token:  {}", view.credential.secret());
            console.close_live();
            Ok(false)
        }
        Command::Cover { file } => {
            let bytes = std::fs::read(file)
                .with_context(|| format!("cannot read {}", file.display()))?;
            let url = console.replace_cover(bytes).await?;
            println!("cover updated: {url}");
            Ok(true)
        }
    }
}

/// Applies the provided form fields to the open draft.
fn fill_draft(
    console: &mut CourseConsole,
    title: Option<&String>,
    kind: Option<&String>,
    content: &ContentArgs,
) -> anyhow::Result<()> {
    let questions = match &content.questions {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("cannot read {}", path.display()))?;
            let parsed: Vec<Question> = serde_json::from_str(&raw)
                .with_context(|| format!("cannot parse questions in {}", path.display()))?;
            Some(parsed)
        }
        None => None,
    };

    let kind = match kind {
        Some(raw) => Some(
            LessonKind::from_str_case_insensitive(raw)
                .with_context(|| format!("invalid lesson type '{raw}'"))?,
        ),
        None => None,
    };

    let Some(draft) = console.draft_mut() else {
        bail!("no lesson form open");
    };
    if let Some(title) = title {
        draft.title.clone_from(title);
    }
    if let Some(kind) = kind {
        draft.kind = kind;
    }
    if let Some(text) = &content.text {
        draft.text.clone_from(text);
    }
    if let Some(url) = &content.video_url {
        draft.video_url.clone_from(url);
    }
    if let Some(url) = &content.pdf_url {
        draft.pdf_url.clone_from(url);
    }
    if let Some(room) = &content.room {
        draft.room_name.clone_from(room);
    }
    if let Some(url) = &content.recording_url {
        draft.recording_url.clone_from(url);
    }
    if let Some(questions) = questions {
        draft.questions = questions;
    }
    Ok(())
}

fn show(console: &CourseConsole) {
    let course = console.course();
    println!("{} ({})", course.title, console.course_id());
    if !course.description.is_empty() {
        println!("  {}", course.description);
    }
    if let Some(image) = &course.image_url {
        println!("  cover: {image}");
    }

    println!("\nlessons:");
    if course.lessons.is_empty() {
        println!("  (none)");
    }
    for lesson in &course.lessons {
        let detail = match &lesson.content {
            LessonContent::Text(_) => String::new(),
            LessonContent::Video(url) | LessonContent::Pdf(url) => format!(" -> {url}"),
            LessonContent::Live(room) => format!(" room {room}"),
            LessonContent::Quiz(questions) => format!(" {} question(s)", questions.len()),
        };
        println!(
            "  [{}] {} ({}){detail}",
            lesson.id,
            lesson.title,
            lesson.kind()
        );
    }

    println!("\nstudents:");
    if console.students().is_empty() {
        println!("  (none)");
    }
    for student in console.students() {
        let grade = student
            .grade
            .map_or_else(|| "ungraded".to_string(), |g| g.to_string());
        let email = student.email.as_deref().unwrap_or("-");
        println!("  {} <{}>: {}", student.name, email, grade);
    }
}
