//! goaltrack - command line client for the goaltrack service.
//!
//! Each subcommand maps onto one API call. The session is persisted in the
//! cache directory between runs and dropped as soon as the server answers 401.

use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use goaltrack_core::api::ApiResponse;
use goaltrack_core::auth::{CredentialStore, SessionStore};
use goaltrack_core::models::{Goal, GoalStatus, ProfileUpdate, Registration, Task};
use goaltrack_core::{ApiError, Config, GoalTrackApi, LoginOutcome, RequestClient, SessionState};
use serde::Serialize;
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "goaltrack", version, about = "Goal and task tracking from the terminal")]
struct Cli {
    /// Backend base URL (overrides config and GOALTRACK_API_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in and keep the session for later commands
    Login {
        username: Option<String>,
        /// Remember the password in the OS keychain
        #[arg(long)]
        remember: bool,
    },
    /// End the session
    Logout {
        /// Also forget the remembered password
        #[arg(long)]
        forget: bool,
    },
    /// Show the logged-in user
    Whoami,
    /// Days on which activity was logged
    Frequency,
    /// Point total
    Points,
    /// Record activity now
    Log,
    /// Today's goals
    Goals,
    /// Goals of an assigned user on a given day
    GoalsByDate { user_id: String, date: NaiveDate },
    /// Users assigned to the current admin
    Users,
    /// Register a new user
    Register(UserArgs),
    /// Update a user's profile
    UpdateProfile {
        user_id: String,
        #[arg(long)]
        username: String,
        #[arg(long)]
        name: String,
    },
    /// Assign a user to the current admin
    Assign { user_id: String },
    /// Remove a user from the current admin
    Unassign { user_id: String },
    /// Create or replace a goal
    SaveGoal(GoalArgs),
    DeleteGoal { goal_id: String },
    /// Tasks of a goal
    Tasks { goal_id: String },
    /// Create or replace a task
    SaveTask(TaskArgs),
    DeleteTask { goal_id: String, task_id: String },
    /// Completion per category for an assigned user
    Progress { user_id: String },
}

#[derive(Args, Debug)]
struct UserArgs {
    #[arg(long)]
    id: String,
    #[arg(long)]
    username: String,
    #[arg(long)]
    name: String,
}

#[derive(Args, Debug)]
struct GoalArgs {
    #[arg(long)]
    id: String,
    #[arg(long)]
    date: NaiveDate,
    #[arg(long)]
    title: String,
    #[arg(long)]
    category: String,
    #[arg(long)]
    user_id: String,
    #[arg(long)]
    done: bool,
}

#[derive(Args, Debug)]
struct TaskArgs {
    #[arg(long)]
    goal_id: String,
    #[arg(long)]
    id: String,
    #[arg(long)]
    title: String,
    #[arg(long, default_value = "")]
    description: String,
    #[arg(long, default_value = "")]
    hint: String,
}

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();

    let mut config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "Failed to load config, using defaults");
            Config::default()
        }
    };
    let base_url = config.resolve_base_url(cli.base_url.as_deref());
    if cli.base_url.is_some() {
        // Later runs talk to the same server
        config.base_url = Some(base_url.clone());
    }
    debug!(%base_url, "Using backend");

    let store = SessionStore::new(Config::cache_dir(&base_url)?);
    let session = SessionState::new();
    match store.load() {
        Ok(Some(auth)) => session.restore(auth),
        Ok(None) => debug!("No saved session"),
        Err(e) => warn!(error = %e, "Ignoring unreadable session file"),
    }

    let client = RequestClient::with_timeout(&base_url, config.request_timeout(), session)?;
    let api = GoalTrackApi::new(client);

    let code = run(cli.command, &api, &mut config, &base_url).await?;

    // A 401 during the command ends the session
    if api.is_user_logged() {
        if let Some(auth) = api.session().snapshot() {
            store.save(&auth)?;
        }
    } else {
        store.clear()?;
    }

    Ok(code)
}

async fn run(command: Command, api: &GoalTrackApi, config: &mut Config, base_url: &str) -> Result<ExitCode> {
    match command {
        Command::Login { username, remember } => login(api, config, base_url, username, remember).await,
        Command::Logout { forget } => {
            let username = api.user().map(|u| u.username);
            api.logout();
            if forget {
                if let Some(username) = username.or_else(|| config.last_username.clone()) {
                    CredentialStore::new(base_url).delete(&username)?;
                }
            }
            println!("Logged out");
            Ok(ExitCode::SUCCESS)
        }
        Command::Whoami => match api.user() {
            Some(user) => print_json(&user),
            None => {
                eprintln!("Not logged in");
                Ok(ExitCode::FAILURE)
            }
        },
        Command::Frequency => report(api.get_routine_accomplishment().await?),
        Command::Points => report(api.get_points().await?),
        Command::Log => report(api.update_log().await?),
        Command::Goals => report(api.get_goals().await?),
        Command::GoalsByDate { user_id, date } => report(api.get_goals_by_date(&user_id, date).await?),
        Command::Users => report(api.get_users().await?),
        Command::Register(args) => {
            let password = prompt_password("Password for new user: ")?;
            let data = Registration {
                id: args.id,
                username: args.username,
                name: args.name,
                password,
            };
            report(api.register_user(&data).await?)
        }
        Command::UpdateProfile { user_id, username, name } => {
            let password = prompt_password("New password: ")?;
            let data = ProfileUpdate { username, name, password };
            report(api.save_user_profile(&user_id, &data).await?)
        }
        Command::Assign { user_id } => report(api.assign_user(&user_id).await?),
        Command::Unassign { user_id } => report(api.unassign_user(&user_id).await?),
        Command::SaveGoal(args) => {
            let goal = Goal {
                id: args.id,
                date: args.date,
                title: args.title,
                category: args.category,
                status: if args.done { GoalStatus::Done } else { GoalStatus::Pending },
                user_id: args.user_id,
            };
            report(api.save_goal(&goal).await?)
        }
        Command::DeleteGoal { goal_id } => report(api.delete_goal(&goal_id).await?),
        Command::Tasks { goal_id } => report(api.get_tasks_by_goal_id(&goal_id).await?),
        Command::SaveTask(args) => {
            let task = Task {
                id: args.id,
                title: args.title,
                description: args.description,
                hint: args.hint,
                goal_id: args.goal_id,
            };
            report(api.save_task(&task).await?)
        }
        Command::DeleteTask { goal_id, task_id } => report(api.delete_task(&goal_id, &task_id).await?),
        Command::Progress { user_id } => report(api.get_user_progress(&user_id).await?),
    }
}

async fn login(
    api: &GoalTrackApi,
    config: &mut Config,
    base_url: &str,
    username: Option<String>,
    remember: bool,
) -> Result<ExitCode> {
    let username = match username.or_else(|| config.last_username.clone()) {
        Some(u) => u,
        None => prompt("Username: ")?,
    };

    let credentials = CredentialStore::new(base_url);
    let password = if credentials.has_credentials(&username) {
        credentials.get_password(&username)?
    } else {
        prompt_password("Password: ")?
    };

    match api.login(&username, &password).await? {
        LoginOutcome::LoggedIn(user) => {
            if remember {
                if let Err(e) = credentials.store(&username, &password) {
                    warn!(error = %e, "Failed to store credentials");
                }
            }
            config.last_username = Some(username);
            if let Err(e) = config.save() {
                warn!(error = %e, "Failed to save config");
            }
            info!(user = %user.username, "Login successful");
            println!("Logged in as {}{}", user.display_name(), if user.is_admin { " (admin)" } else { "" });
            Ok(ExitCode::SUCCESS)
        }
        LoginOutcome::Rejected { status, message } => {
            // A remembered password that no longer works is useless
            if status.as_u16() == 401 && credentials.has_credentials(&username) {
                if let Err(e) = credentials.delete(&username) {
                    warn!(error = %e, "Failed to forget rejected credentials");
                }
            }
            eprintln!("Login failed: {}", ApiError::from_status(status, message));
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Print a successful body, or the status on failure.
fn report<T: Serialize>(response: ApiResponse<T>) -> Result<ExitCode> {
    let status = response.status;
    match response.require() {
        Ok(Some(body)) => print_json(&body),
        Ok(None) => {
            println!("OK ({})", status.as_u16());
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            if e.is_unauthorized() {
                eprintln!("Run `goaltrack login` to start a new session.");
            }
            Ok(ExitCode::FAILURE)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<ExitCode> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(ExitCode::SUCCESS)
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input).context("Failed to read input")?;
    Ok(input.trim().to_string())
}

fn prompt_password(label: &str) -> Result<String> {
    rpassword::prompt_password(label).context("Failed to read password")
}
