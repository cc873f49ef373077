//! `tasks`: command-line rendering surface for the task tracker.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use configs::{AppConfig, StoreKind};
use models::{AuthIntent, Task, TaskId, TaskStatus};
use service::errors::GENERIC_ERROR_MESSAGE;
use service::storage::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
use service::sync::{Confirmation, RemoveOutcome, TaskSnapshot};
use service::{ApiClient, AuthFormController, AuthOutcome, ClientError, SessionController, TaskListSynchronizer};
use tracing::debug;

#[derive(Debug, Parser)]
#[command(name = "tasks", about = "Manage your tasks on a task backend", version)]
struct Cli {
    /// Config file. Falls back to `CONFIG_PATH`, then `config.toml`.
    #[arg(long, value_name = "path")]
    config: Option<PathBuf>,
    /// Backend base URL, overriding the config.
    #[arg(long = "base-url", value_name = "url")]
    base_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Log in and keep the session for later commands.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Create an account. Log in afterwards.
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Logout,
    /// Show whether a session is held.
    Status,
    List,
    Add {
        title: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Flip a task between Pending and Done.
    Toggle { id: TaskId },
    Rm {
        id: TaskId,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
}

/// Asks on the terminal; anything but `y`/`yes` declines.
struct TerminalConfirmation;

impl Confirmation for TerminalConfirmation {
    fn confirm(&self, prompt: &str) -> bool {
        print!("{prompt} [y/N] ");
        if io::stdout().flush().is_err() {
            return false;
        }
        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<AppConfig> {
    let mut cfg = match &cli.config {
        Some(path) => {
            let mut cfg = configs::load_from_file(&path.to_string_lossy())
                .with_context(|| format!("reading {}", path.display()))?;
            cfg.normalize_and_validate()?;
            cfg
        }
        None => AppConfig::load_or_default()?,
    };
    if let Some(url) = &cli.base_url {
        cfg.backend.base_url = url.trim_end_matches('/').to_string();
        cfg.backend.validate()?;
    }
    Ok(cfg)
}

async fn open_store(cfg: &AppConfig) -> anyhow::Result<Arc<dyn CredentialStore>> {
    let store: Arc<dyn CredentialStore> = match cfg.session.store {
        StoreKind::File => FileCredentialStore::new(&cfg.session.path).await?,
        StoreKind::Memory => Arc::new(MemoryCredentialStore::new()),
    };
    Ok(store)
}

fn print_tasks(snapshot: &TaskSnapshot) {
    if snapshot.tasks.is_empty() {
        println!("No tasks yet.");
        return;
    }
    for task in &snapshot.tasks {
        println!("{}", render_task(task));
    }
}

fn render_task(task: &Task) -> String {
    let mark = match task.status {
        TaskStatus::Done => "x",
        TaskStatus::Pending => " ",
    };
    let mut line = format!("{:>4}  [{mark}] {}", task.id, task.title);
    if !task.description.is_empty() {
        line.push_str(&format!(" - {}", task.description));
    }
    line
}

/// Prints the collection after a task command, or why it failed.
fn finish(result: Result<Arc<TaskSnapshot>, ClientError>, tasks: &TaskListSynchronizer<ApiClient>) -> ExitCode {
    match result {
        Ok(snapshot) => {
            print_tasks(&snapshot);
            ExitCode::SUCCESS
        }
        Err(e) => report(&e, tasks.notice()),
    }
}

/// Prints a failed task operation and picks the exit code.
fn report(err: &ClientError, notice: Option<String>) -> ExitCode {
    if err.is_unauthorized() {
        eprintln!("Your session has ended. Log in again with `tasks login`.");
    } else {
        eprintln!("{}", notice.unwrap_or_else(|| err.user_message(GENERIC_ERROR_MESSAGE)));
    }
    ExitCode::FAILURE
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let cfg = load_config(&cli)?;
    debug!(base_url = %cfg.backend.base_url, store = ?cfg.session.store, "client configured");

    let session = SessionController::new(open_store(&cfg).await?).await?;
    let api = Arc::new(ApiClient::from_config(&cfg.backend, Arc::clone(&session))?);

    match cli.command {
        Command::Login { email, password } => submit(api, session, AuthIntent::Login, &email, &password).await,
        Command::Register { email, password } => submit(api, session, AuthIntent::Register, &email, &password).await,
        Command::Logout => {
            session.logout().await?;
            println!("Logged out.");
            Ok(ExitCode::SUCCESS)
        }
        Command::Status => {
            let state = if session.is_authenticated() { "logged in" } else { "not logged in" };
            println!("{state} ({})", api.base_url());
            Ok(ExitCode::SUCCESS)
        }
        Command::List => {
            let tasks = TaskListSynchronizer::new(api, session);
            let result = tasks.open().await;
            Ok(finish(result, &tasks))
        }
        Command::Add { title, description } => {
            let tasks = TaskListSynchronizer::new(api, session);
            let result = match tasks.open().await {
                Ok(_) => tasks.add_task(&title, &description).await,
                Err(e) => Err(e),
            };
            Ok(finish(result, &tasks))
        }
        Command::Toggle { id } => {
            let tasks = TaskListSynchronizer::new(api, session);
            let result = match tasks.open().await {
                Ok(_) => tasks.toggle_status(id).await,
                Err(e) => Err(e),
            };
            Ok(finish(result, &tasks))
        }
        Command::Rm { id, yes } => {
            let tasks = TaskListSynchronizer::new(api, session);
            if let Err(e) = tasks.open().await {
                return Ok(report(&e, tasks.notice()));
            }
            let result = if yes {
                tasks.remove_task(id, &|_: &str| true).await
            } else {
                tasks.remove_task(id, &TerminalConfirmation).await
            };
            Ok(match result {
                Ok(RemoveOutcome::Removed(snapshot)) => {
                    print_tasks(&snapshot);
                    ExitCode::SUCCESS
                }
                Ok(RemoveOutcome::Cancelled) => {
                    println!("Nothing deleted.");
                    ExitCode::SUCCESS
                }
                Err(e) => report(&e, tasks.notice()),
            })
        }
    }
}

async fn submit(
    api: Arc<ApiClient>,
    session: Arc<SessionController>,
    intent: AuthIntent,
    email: &str,
    password: &str,
) -> anyhow::Result<ExitCode> {
    let mut form = AuthFormController::new(api, session);
    Ok(match form.submit(intent, email, password).await {
        Ok(AuthOutcome::ProceedToTasks) => {
            println!("Logged in as {email}.");
            ExitCode::SUCCESS
        }
        Ok(AuthOutcome::SwitchToLogin { notice }) => {
            println!("{notice}");
            ExitCode::SUCCESS
        }
        Err(_) => {
            eprintln!("{}", form.error().unwrap_or(GENERIC_ERROR_MESSAGE));
            ExitCode::FAILURE
        }
    })
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    common::utils::logging::init_logging_cli();

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("failed to start runtime: {e}");
            return ExitCode::FAILURE;
        }
    };
    match runtime.block_on(run(cli)) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
