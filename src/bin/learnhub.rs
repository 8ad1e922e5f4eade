use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use learnhub::api::types::{Course, Role};
use learnhub::config::Config;
use learnhub::content::LessonContent;
use learnhub::guard::{DashboardKind, Decision, Route};
use learnhub::session::{Bootstrap, FileTokenStore};
use learnhub::workspace::{LessonStatus, Navigation, Notice, QuizAttempt, QuizDraft};
use learnhub::{catalog, ApiGateway, CourseWorkspace, Session};

const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

#[derive(Debug, Parser)]
#[command(name = "learnhub", about = "Terminal client for the LearnHub course platform")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Log in and remember the session.
    Login { username: String, password: String },
    /// Create an account and log in.
    Register {
        username: String,
        email: String,
        password: String,
        #[arg(long, default_value = "student")]
        role: Role,
    },
    /// Forget the stored session.
    Logout,
    /// Show the logged-in user.
    Whoami,
    /// List all courses.
    Courses,
    /// Enroll in a course (students).
    Enroll { course: u64 },
    /// Create a course (instructors).
    CreateCourse {
        title: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Role-specific dashboard.
    Dashboard,
    /// Show a course with its lessons.
    Course {
        course: u64,
        /// Lesson to open instead of the first one
        #[arg(long)]
        lesson: Option<u64>,
    },
    /// Mark a lesson complete (students, lessons without a quiz).
    Complete { course: u64, lesson: u64 },
    /// Show a lesson quiz, or submit it with --answer QUESTION=CHOICE.
    Quiz {
        course: u64,
        lesson: u64,
        #[arg(long = "answer", value_parser = parse_answer)]
        answers: Vec<(u64, u64)>,
    },
    /// Generate AI practice questions for a lesson (course instructor).
    Practice {
        course: u64,
        lesson: u64,
        /// Save the generated set as the lesson's quiz
        #[arg(long)]
        save: bool,
    },
    /// Add a lesson (course instructor).
    AddLesson {
        course: u64,
        title: String,
        content: String,
        #[arg(long)]
        order: Option<u32>,
    },
    /// Create or replace a single-question quiz (course instructor).
    AddQuiz {
        course: u64,
        lesson: u64,
        title: String,
        question: String,
        #[arg(long = "option", required = true)]
        options: Vec<String>,
        #[arg(long, default_value_t = 0)]
        correct: usize,
    },
    /// Rate a course from 1 to 5 stars.
    Rate { course: u64, stars: u8 },
    /// Download the completion certificate.
    Certificate {
        course: u64,
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
}

impl Command {
    fn route(&self) -> Route {
        match self {
            Command::Login { .. } => Route::Login,
            Command::Register { .. } => Route::Register,
            Command::Logout | Command::Courses => Route::Home,
            Command::Whoami | Command::Dashboard | Command::Enroll { .. } => Route::Dashboard,
            Command::CreateCourse { .. } => Route::Dashboard,
            Command::Course { course, .. }
            | Command::Complete { course, .. }
            | Command::Quiz { course, .. }
            | Command::Practice { course, .. }
            | Command::AddLesson { course, .. }
            | Command::AddQuiz { course, .. }
            | Command::Rate { course, .. }
            | Command::Certificate { course, .. } => Route::Course(*course),
        }
    }
}

fn parse_answer(raw: &str) -> Result<(u64, u64), String> {
    let (question, choice) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected QUESTION=CHOICE, got '{raw}'"))?;
    let question = question.trim().parse().map_err(|e| format!("{e}"))?;
    let choice = choice.trim().parse().map_err(|e| format!("{e}"))?;
    Ok((question, choice))
}

type ClientSession = Session<FileTokenStore>;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env().context("failed to load configuration")?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let api = ApiGateway::new(&config.api_url, config.timeout);
    let mut session = Session::new(FileTokenStore::new(&config.token_file));

    if session.bootstrap(&api) == Bootstrap::Expired {
        println!("Your session has expired, please log in again.");
    }
    info!(api = api.base_url(), "session ready");

    match cli.command.route().resolve(session.current_user()) {
        Decision::Allow => {}
        Decision::RedirectToLogin => bail!("you need to log in first: learnhub login <username> <password>"),
        Decision::RedirectToHome => bail!("you are already logged in; run `learnhub logout` first"),
    }

    run(cli.command, &api, &mut session)
}

fn run(command: Command, api: &ApiGateway, session: &mut ClientSession) -> anyhow::Result<()> {
    match command {
        Command::Login { username, password } => {
            let user = session
                .login(api, &username, &password)
                .map_err(|e| anyhow::anyhow!(e.user_message()))
                .context("login failed")?;
            println!("Logged in as {BOLD}{}{RESET} ({})", user.username, user.role);
        }
        Command::Register {
            username,
            email,
            password,
            role,
        } => {
            let user = session
                .register(api, &username, &email, &password, role)
                .map_err(|e| anyhow::anyhow!(e.user_message()))
                .context("registration failed")?;
            println!("Welcome, {BOLD}{}{RESET} ({})", user.username, user.role);
        }
        Command::Logout => {
            session.logout();
            println!("Logged out");
        }
        Command::Whoami => {
            let (_, user) = session.require()?;
            println!("{} <{}> ({})", user.username, user.email, user.role);
        }
        Command::Courses => {
            let courses = catalog::list_courses(api, session).context("failed to fetch courses")?;
            for course in &courses {
                print_course_line(course);
            }
        }
        Command::Enroll { course } => {
            let detail = catalog::enroll(api, session, course)
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            println!("{detail}");
        }
        Command::CreateCourse { title, description } => {
            let course = catalog::create_course(api, session, &title, &description)
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            println!("Created course {BOLD}{}{RESET} (id {})", course.title, course.id);
        }
        Command::Dashboard => dashboard(api, session)?,
        Command::Course { course, lesson } => {
            let mut workspace = open(api, session, course)?;
            if let Some(lesson) = lesson {
                workspace.select_lesson(lesson)?;
            }
            print_workspace(&workspace);
        }
        Command::Complete { course, lesson } => {
            let mut workspace = open_lesson(api, session, course, lesson)?;
            let outcome = workspace.mark_complete(api, session);
            finish(&mut workspace, session, outcome)?;
        }
        Command::Quiz {
            course,
            lesson,
            answers,
        } => {
            let mut workspace = open_lesson(api, session, course, lesson)?;
            let outcome = workspace.take_quiz(api, session);
            finish(&mut workspace, session, outcome)?;

            if answers.is_empty() {
                print_attempt(workspace.attempt());
                return Ok(());
            }
            for (question, choice) in answers {
                workspace.answer(question, choice)?;
            }
            let outcome = workspace.submit_quiz(api, session).map(|_| ());
            finish(&mut workspace, session, outcome)?;
            print_attempt(workspace.attempt());
        }
        Command::Practice { course, lesson, save } => {
            let mut workspace = open_lesson(api, session, course, lesson)?;
            let outcome = workspace.generate_practice(api, session);
            finish(&mut workspace, session, outcome)?;

            for (i, q) in workspace.practice().unwrap_or_default().iter().enumerate() {
                println!("{BOLD}{}. {}{RESET}", i + 1, q.question);
                for option in &q.options {
                    println!("   - {option}");
                }
                println!("   answer: {} ({})", q.answer, q.explanation);
            }
            if save {
                let outcome = workspace.save_practice(api, session);
                finish(&mut workspace, session, outcome)?;
            }
        }
        Command::AddLesson {
            course,
            title,
            content,
            order,
        } => {
            let mut workspace = open(api, session, course)?;
            workspace.set_adding_lesson(true);
            let outcome = workspace.add_lesson(api, session, &title, &content, order);
            finish(&mut workspace, session, outcome)?;
        }
        Command::AddQuiz {
            course,
            lesson,
            title,
            question,
            options,
            correct,
        } => {
            let mut workspace = open_lesson(api, session, course, lesson)?;
            workspace.set_adding_quiz(true);
            let draft = QuizDraft {
                title,
                question,
                options,
                correct_index: correct,
            };
            let outcome = workspace.author_quiz(api, session, &draft);
            finish(&mut workspace, session, outcome)?;
        }
        Command::Rate { course, stars } => {
            let mut workspace = open(api, session, course)?;
            workspace.open_rating();
            workspace.select_rating(stars)?;
            let outcome = workspace.submit_rating(api, session);
            finish(&mut workspace, session, outcome)?;
        }
        Command::Certificate { course, out } => {
            let mut workspace = open(api, session, course)?;
            let outcome = workspace.certificate(api, session);
            let title = workspace
                .course()
                .map(|c| c.title.clone())
                .unwrap_or_default();
            let bytes = match outcome {
                Ok(bytes) => bytes,
                Err(e) => return finish(&mut workspace, session, Err(e)),
            };
            let path = catalog::save_certificate(&bytes, &title, &out)
                .context("failed to write certificate")?;
            println!("Saved {}", path.display());
        }
    }

    Ok(())
}

fn open(api: &ApiGateway, session: &ClientSession, course: u64) -> anyhow::Result<CourseWorkspace> {
    let mut workspace = CourseWorkspace::new(course);
    match workspace.load(api, session) {
        Navigation::Stay => Ok(workspace),
        Navigation::Login => bail!("you need to log in first"),
        Navigation::Home => bail!("could not open course {course}"),
    }
}

fn open_lesson(
    api: &ApiGateway,
    session: &ClientSession,
    course: u64,
    lesson: u64,
) -> anyhow::Result<CourseWorkspace> {
    let mut workspace = open(api, session, course)?;
    workspace
        .select_lesson(lesson)
        .with_context(|| format!("lesson {lesson} in course {course}"))?;
    Ok(workspace)
}

/// Prints queued notices and the rating prompt, then surfaces the outcome.
fn finish(
    workspace: &mut CourseWorkspace,
    session: &mut ClientSession,
    outcome: learnhub::Result<()>,
) -> anyhow::Result<()> {
    for notice in workspace.take_notices() {
        match notice {
            Notice::Success(msg) => println!("✓ {msg}"),
            Notice::Info(msg) => println!("i {msg}"),
            Notice::Error(msg) => eprintln!("✗ {msg}"),
        }
    }
    if let Some(course) = workspace.course() {
        if workspace.rating_prompt().open {
            println!(
                "How would you rate {BOLD}{}{RESET}? Run `learnhub rate {} <1-5>`",
                course.title, course.id
            );
        }
    }

    if let Err(e) = outcome {
        session.observe_failure(&e);
        return Err(e.into());
    }
    Ok(())
}

fn dashboard(api: &ApiGateway, session: &ClientSession) -> anyhow::Result<()> {
    let (_, user) = session.require()?;
    match DashboardKind::for_user(user) {
        DashboardKind::Instructor => {
            let overview =
                catalog::instructor_overview(api, session).context("failed to load dashboard")?;
            for row in overview {
                print_course_line(&row.course);
                for student in row.summary.students {
                    println!(
                        "    {:<20} {:<28} {:>3}%",
                        student.student_name, student.email, student.progress
                    );
                }
            }
        }
        DashboardKind::Student => {
            let courses =
                catalog::enrolled_courses(api, session).context("failed to load dashboard")?;
            for course in &courses {
                print_course_line(course);
                println!("    progress {:>3}%", course.progress);
            }
        }
    }
    Ok(())
}

fn print_course_line(course: &Course) {
    let rating = if course.has_ratings() {
        format!("{:.1}★", course.average_rating)
    } else {
        "New".to_string()
    };
    println!(
        "[{}] {BOLD}{}{RESET} by {} ({}, {} enrolled)",
        course.id, course.title, course.instructor_name, rating, course.enrollment_count
    );
}

fn print_workspace(workspace: &CourseWorkspace) {
    let Some(course) = workspace.course() else {
        return;
    };
    print_course_line(course);
    if let Some(rating) = course.user_rating {
        println!("You rated {rating}");
    }
    println!("Progress {}%\n", course.progress);

    let active = workspace.active_lesson().map(|l| l.id);
    for lesson in course.ordered_lessons() {
        let mark = match CourseWorkspace::lesson_status(lesson) {
            LessonStatus::Satisfied => "✓",
            LessonStatus::Pending => "○",
        };
        let cursor = if Some(lesson.id) == active { ">" } else { " " };
        let quiz = if lesson.has_quiz { " [quiz]" } else { "" };
        println!("{cursor} {mark} {}. {} (id {}){quiz}", lesson.order, lesson.title, lesson.id);
    }
    if course.lessons.is_empty() {
        println!("No lessons yet.");
    }

    if let Some(lesson) = workspace.active_lesson() {
        println!("\n{BOLD}{}{RESET}", lesson.title);
        match LessonContent::classify(&lesson.content) {
            LessonContent::Text(text) => println!("{text}"),
            LessonContent::Video { embed, .. } => println!("Video: {embed}"),
        }
    }

    if workspace.can_manage() {
        println!("\n{BOLD}Class progress{RESET}");
        for student in workspace.class_progress() {
            println!("  {:<20} {:>3}%", student.student_name, student.progress);
        }
    }
}

fn print_attempt(attempt: &QuizAttempt) {
    match attempt {
        QuizAttempt::NotStarted => {}
        QuizAttempt::InProgress { quiz, .. } => {
            println!("{BOLD}{}{RESET}", quiz.title);
            for question in &quiz.questions {
                println!("Q{} {}", question.id, question.text);
                for choice in &question.choices {
                    println!("   {} = {}", choice.id, choice.text);
                }
            }
            println!("Submit with: --answer QUESTION=CHOICE for every question");
        }
        QuizAttempt::Reviewed { result, .. } => {
            let verdict = if result.passed { "passed" } else { "not passed" };
            println!("Score {}/{} ({verdict})", result.score, result.total);
            for answer in &result.correct_answers {
                println!("  {} → {}", answer.question_text, answer.correct_choice_text);
            }
        }
    }
}
