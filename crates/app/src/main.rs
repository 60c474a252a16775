mod controller;

use std::fmt;
use std::io::{BufRead, Write as _};

use macer_core::Clock;
use services::{GeneratorSettings, QuestionGenerator, QuizService};
use storage::repository::Storage;

use controller::QuizController;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidNumber { flag: &'static str, raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidNumber { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
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

fn print_usage() {
    eprintln!("Usage:");
    eprintln!(
        "  cargo run -p app -- play    [--db <sqlite_url>] [--ops <n>] [--max-digit <n>] [--batch <n>]"
    );
    eprintln!("  cargo run -p app -- history [--db <sqlite_url>]");
    eprintln!();
    eprintln!("Defaults for play:");
    eprintln!("  --db sqlite:macer.sqlite3");
    eprintln!("  --ops 1  --max-digit 10  --batch 20");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  MACER_DB_URL");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Play,
    History,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "play" => Some(Self::Play),
            "history" => Some(Self::History),
            _ => None,
        }
    }
}

struct Args {
    db_url: String,
    operator_count: usize,
    max_digit: u32,
    batch_size: usize,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("MACER_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://macer.sqlite3".into(), normalize_sqlite_url);
        let mut operator_count = GeneratorSettings::DEFAULT_OPERATOR_COUNT;
        let mut max_digit = GeneratorSettings::DEFAULT_MAX_DIGIT;
        let mut batch_size = GeneratorSettings::DEFAULT_BATCH_SIZE;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--ops" => {
                    let value = require_value(args, "--ops")?;
                    operator_count = value.parse().map_err(|_| ArgsError::InvalidNumber {
                        flag: "--ops",
                        raw: value.clone(),
                    })?;
                }
                "--max-digit" => {
                    let value = require_value(args, "--max-digit")?;
                    max_digit = value.parse().map_err(|_| ArgsError::InvalidNumber {
                        flag: "--max-digit",
                        raw: value.clone(),
                    })?;
                }
                "--batch" => {
                    let value = require_value(args, "--batch")?;
                    batch_size = value.parse().map_err(|_| ArgsError::InvalidNumber {
                        flag: "--batch",
                        raw: value.clone(),
                    })?;
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            operator_count,
            max_digit,
            batch_size,
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

fn render_session(controller: &QuizController, show_results: bool) {
    let Some(session) = controller.session() else {
        println!("No session in progress. Type 'new' to start one.");
        return;
    };

    for (index, question) in session.questions().iter().enumerate() {
        let answer = question
            .answer()
            .map_or_else(String::new, |a| format!(" = {a}"));
        let marker = if show_results && question.is_correct() == Some(false) {
            "  [wrong]"
        } else {
            ""
        };
        println!("{index:>2}: {}{answer}{marker}", question.prompt());
    }
}

fn print_play_help() {
    println!("Commands:");
    println!("  <index> <answer>   enter an answer, e.g. '3 42'");
    println!("  clear <index>      blank an answer");
    println!("  list               show the questions again");
    println!("  time               show elapsed time");
    println!("  new                regenerate a fresh batch");
    println!("  submit             grade, save, and show the summary");
    println!("  quit               exit without saving");
}

async fn play(args: &Args, storage: &Storage) -> Result<(), Box<dyn std::error::Error>> {
    let settings = GeneratorSettings::new(args.operator_count, args.max_digit, args.batch_size)?;
    let service = QuizService::new(
        Clock::default_clock(),
        QuestionGenerator::new(settings),
        storage.sessions.clone(),
    );

    let mut controller = QuizController::new(service);
    controller.new_batch()?;
    let elapsed = controller.elapsed();

    println!("Macer — answer all questions, then 'submit'. 'help' lists commands.");
    render_session(&controller, false);

    let stdin = std::io::stdin();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        let input = line.trim();
        let mut parts = input.split_whitespace();
        match parts.next() {
            None => {}
            Some("help") => print_play_help(),
            Some("list") => render_session(&controller, false),
            Some("time") => println!("{}", *elapsed.borrow()),
            Some("new") => {
                controller.new_batch()?;
                render_session(&controller, false);
            }
            Some("clear") => {
                let outcome = parts
                    .next()
                    .and_then(|raw| raw.parse::<usize>().ok())
                    .map(|index| controller.clear_answer(index));
                match outcome {
                    Some(Ok(())) => {}
                    Some(Err(e)) => eprintln!("{e}"),
                    None => eprintln!("usage: clear <index>"),
                }
            }
            Some("submit") => {
                match controller.submit().await {
                    Ok(report) => {
                        render_session(&controller, true);
                        println!("{report}");
                        println!("Time: {}", *elapsed.borrow());
                        println!("Saved as {}", report.key);
                    }
                    Err(e) => eprintln!("{e}"),
                }
                break;
            }
            Some("quit") | Some("exit") => break,
            Some(first) => {
                let entry = first
                    .parse::<usize>()
                    .ok()
                    .zip(parts.next().and_then(|raw| raw.parse::<f64>().ok()));
                match entry {
                    Some((index, answer)) => {
                        if let Err(e) = controller.enter_answer(index, answer) {
                            eprintln!("{e}");
                        }
                    }
                    None => eprintln!("unrecognized input; 'help' lists commands"),
                }
            }
        }
    }

    Ok(())
}

async fn history(storage: &Storage) -> Result<(), Box<dyn std::error::Error>> {
    let keys = storage.sessions.list_keys(50).await?;
    if keys.is_empty() {
        println!("No saved sessions yet.");
        return Ok(());
    }
    for key in keys {
        let session = storage.sessions.get_session(&key).await?.into_session()?;
        println!(
            "{key}: {} correct from {}",
            session.correct_count(),
            session.total()
        );
    }
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // Default behavior: play when no subcommand is provided.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Play,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Play,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let mut iter = argv.into_iter();
    let args = Args::parse(&mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    // Open + migrate SQLite at startup. Keep this in the binary glue so
    // core/services stay pure.
    prepare_sqlite_file(&args.db_url)?;
    let storage = Storage::sqlite(&args.db_url).await?;

    match cmd {
        Command::Play => play(&args, &storage).await,
        Command::History => history(&storage).await,
    }
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
