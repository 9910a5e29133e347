//! taskapp CLI - personal tasks, subtasks and deadline reminders.

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::disallowed_macros)]
#![allow(clippy::uninlined_format_args)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use colored::Colorize;
use dialoguer::{theme::ColorfulTheme, Password};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use taskapp::domain::{
    AuthDomain, ConfigDomain, ItemRef, NewSubtask, NewTask, SubtaskEdit, TaskEdit, TaskFilter,
    TasksDomain,
};
use taskapp::entities::{TaskPriority, TaskStatus};
use taskapp::errors::TasksError;
use taskapp::notify::{ConsoleChannel, DeadlineWatcher, LogChannel, NotifyChannel, Notifier};
use taskapp::storage::{FileStorage, Storage};
use taskapp::{time, ui};

#[derive(Parser)]
#[command(name = "taskapp")]
#[command(about = "Personal tasks and subtasks with deadline reminders", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Data directory
    #[arg(long, global = true, env = "TASKAPP_DATA_DIR")]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account
    Register {
        /// Display name (letters and spaces)
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        email: String,

        /// Prompted for when omitted
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Log in to an existing account
    Login {
        #[arg(short, long)]
        email: String,

        /// Prompted for when omitted
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Log out
    Logout,

    /// Show the logged-in account
    Whoami,

    /// List tasks
    List {
        /// Search titles (case-insensitive)
        #[arg(short = 'q', long)]
        search: Option<String>,

        /// Filter by priority
        #[arg(short, long)]
        priority: Option<String>,

        /// Filter by status
        #[arg(short, long)]
        status: Option<String>,

        /// Include subtasks
        #[arg(long)]
        with_subtasks: bool,
    },

    /// Show details of tasks or subtasks
    Show {
        /// Task or subtask ID(s), comma-separated (e.g. 3,4.1)
        id: String,
    },

    /// Add a new task
    Add {
        /// Task title
        #[arg(short, long)]
        title: String,

        /// Task description
        #[arg(short, long)]
        description: Option<String>,

        /// Priority (low, medium, high)
        #[arg(short, long)]
        priority: Option<String>,

        /// Initial status (started, paused, completed)
        #[arg(short, long)]
        status: Option<String>,

        /// Deadline (YYYY-MM-DD or DD/MM/YYYY), defaults to one day from now
        #[arg(long)]
        deadline: Option<String>,
    },

    /// Edit a task
    Edit {
        /// Task ID
        #[arg(short, long)]
        id: String,

        #[arg(short, long)]
        title: Option<String>,

        /// New description; an empty value clears it
        #[arg(short, long)]
        description: Option<String>,

        #[arg(short, long)]
        priority: Option<String>,

        #[arg(short, long)]
        status: Option<String>,

        #[arg(long)]
        deadline: Option<String>,
    },

    /// Set task or subtask status
    SetStatus {
        /// Task or subtask ID(s), comma-separated
        #[arg(short, long)]
        id: String,

        /// New status
        #[arg(short, long)]
        status: String,
    },

    /// Remove a task or subtask
    Remove {
        /// Task ID, or TASK.SUBTASK for a subtask
        #[arg(short, long)]
        id: String,

        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Add a subtask to a task
    AddSubtask {
        /// Parent task ID
        #[arg(short, long)]
        id: String,

        /// Subtask title
        #[arg(short, long)]
        title: String,

        /// Subtask description
        #[arg(short, long)]
        description: Option<String>,

        #[arg(short, long)]
        status: Option<String>,

        /// Deadline, defaults to today
        #[arg(long)]
        deadline: Option<String>,
    },

    /// Edit a subtask
    EditSubtask {
        /// Subtask ID (TASK.SUBTASK)
        #[arg(short, long)]
        id: String,

        #[arg(short, long)]
        title: Option<String>,

        /// New description; an empty value clears it
        #[arg(short, long)]
        description: Option<String>,

        #[arg(short, long)]
        status: Option<String>,

        #[arg(long)]
        deadline: Option<String>,
    },

    /// Mark a subtask as completed
    Check {
        /// Subtask ID (TASK.SUBTASK)
        id: String,
    },

    /// Mark a completed subtask as started again
    Uncheck {
        /// Subtask ID (TASK.SUBTASK)
        id: String,
    },

    /// Send reminders for tasks and subtasks due today
    Notify {
        /// Keep checking until interrupted
        #[arg(short, long)]
        watch: bool,

        /// Seconds between checks (defaults to the configured interval)
        #[arg(long)]
        interval: Option<u64>,
    },

    /// Configure deadline reminders
    Reminders {
        #[arg(long, conflicts_with = "off")]
        on: bool,

        #[arg(long)]
        off: bool,

        /// Seconds between checks in watch mode
        #[arg(long)]
        interval: Option<u64>,
    },

    /// Switch between dark and light theme (toggles when no flag is given)
    Theme {
        #[arg(long, conflicts_with = "light")]
        dark: bool,

        #[arg(long)]
        light: bool,
    },
}

fn get_data_dir(cli_path: Option<PathBuf>) -> PathBuf {
    cli_path.unwrap_or_else(|| {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("taskapp")
    })
}

/// `RUST_LOG` directives when set and valid, `warn` otherwise
fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .filter(|d| !d.trim().is_empty())
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new("warn"))
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    let rust_log = std::env::var("RUST_LOG").ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(rust_log.as_deref()))
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        ui::print_error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), TasksError> {
    let data_dir = get_data_dir(cli.data_dir);
    let storage = Arc::new(FileStorage::new(&data_dir));
    if !storage.is_initialized().await? {
        storage.initialize().await?;
    }

    let storage: Arc<dyn Storage> = storage;
    let auth = AuthDomain::new(Arc::clone(&storage));
    let tasks_domain = TasksDomain::new(Arc::clone(&storage));
    let config_domain = ConfigDomain::new(&data_dir);

    match cli.command {
        Commands::Register {
            name,
            email,
            password,
        } => {
            let password = read_password(password, true)?;
            let user = auth.register(&name, &email, &password).await?;
            ui::print_success(&format!("Registered {} <{}>", user.name, user.email));
            ui::print_info("Run 'taskapp login' to start using your account");
        }

        Commands::Login { email, password } => {
            let password = read_password(password, false)?;
            let user = auth.login(&email, &password).await?;
            ui::print_success(&format!("Welcome, {}", user.name));
        }

        Commands::Logout => {
            auth.logout().await?;
            ui::print_success("Logged out");
        }

        Commands::Whoami => {
            let user = auth.current_user().await?;
            let config = config_domain.load().await?;
            println!("{} <{}>", user.name.bold(), user.email);
            println!(
                "{}: {}",
                "Theme".dimmed(),
                if config.theme.dark { "dark" } else { "light" }
            );
            println!("{}: {}", "Data".dimmed(), data_dir.display());
        }

        Commands::List {
            search,
            priority,
            status,
            with_subtasks,
        } => {
            let user = auth.current_user().await?;
            let filter = TaskFilter {
                query: search.unwrap_or_default(),
                priority: parse_opt::<TaskPriority>(priority)?,
                status: parse_opt::<TaskStatus>(status)?,
            };

            let tasks = tasks_domain.list_tasks(&user.id, &filter).await?;

            if tasks.is_empty() {
                ui::print_info("No tasks found");
            } else {
                let table = ui::task_table(&tasks, with_subtasks);
                println!("{table}");
                println!();
                ui::print_info(&format!("{} task(s) total", tasks.len()));
            }
        }

        Commands::Show { id } => {
            let user = auth.current_user().await?;

            for item in parse_item_refs(&id)? {
                match item {
                    ItemRef::Task(task_id) => {
                        let task = tasks_domain.get_task(&user.id, &task_id).await?;
                        ui::display_task_details(&task);
                    }
                    ItemRef::Subtask(task_id, subtask_id) => {
                        let subtask = tasks_domain
                            .get_subtask(&user.id, &task_id, subtask_id)
                            .await?;
                        println!(
                            "{} {} [{}]",
                            "Subtask".cyan().bold(),
                            subtask.full_id().cyan().bold(),
                            ui::status_colored(subtask.status)
                        );
                        println!("{}: {}", "Title".bold(), subtask.title);
                        println!("{}: {}", "Deadline".bold(), time::format_date(subtask.deadline));
                        println!("{}: {}", "Duration".bold(), subtask.duration_display());
                        if let Some(description) = &subtask.description {
                            println!("{}: {}", "Description".bold(), description);
                        }
                        println!();
                    }
                }
            }
        }

        Commands::Add {
            title,
            description,
            priority,
            status,
            deadline,
        } => {
            let user = auth.current_user().await?;
            let config = config_domain.load().await?;

            let new = NewTask {
                title,
                description,
                priority: Some(
                    parse_opt::<TaskPriority>(priority)?.unwrap_or(config.defaults.priority),
                ),
                status: parse_opt::<TaskStatus>(status)?,
                deadline: deadline.as_deref().map(time::parse_deadline).transpose()?,
            };

            let task = tasks_domain.add_task(&user.id, new).await?;
            ui::print_success(&format!("Created task {}: {}", task.id, task.title));
        }

        Commands::Edit {
            id,
            title,
            description,
            priority,
            status,
            deadline,
        } => {
            let user = auth.current_user().await?;
            let edit = TaskEdit {
                title,
                description,
                priority: parse_opt::<TaskPriority>(priority)?,
                status: parse_opt::<TaskStatus>(status)?,
                deadline: deadline.as_deref().map(time::parse_deadline).transpose()?,
            };

            let task = tasks_domain.update_task(&user.id, &id, edit).await?;
            ui::print_success(&format!("Updated task {}", task.id));
        }

        Commands::SetStatus { id, status } => {
            let user = auth.current_user().await?;
            let status = status.parse::<TaskStatus>()?;

            for item in parse_item_refs(&id)? {
                match item {
                    ItemRef::Task(task_id) => {
                        tasks_domain
                            .set_task_status(&user.id, &task_id, status)
                            .await?;
                        ui::print_success(&format!("Task {task_id} status set to {status}"));
                    }
                    ItemRef::Subtask(task_id, subtask_id) => {
                        let propagation = tasks_domain
                            .set_subtask_status(&user.id, &task_id, subtask_id, status)
                            .await?;
                        ui::print_success(&format!(
                            "Subtask {task_id}.{subtask_id} status set to {status}"
                        ));
                        if let Some(message) = ui::describe_propagation(&task_id, propagation) {
                            ui::print_info(&message);
                        }
                    }
                }
            }
        }

        Commands::Remove { id, yes } => {
            let user = auth.current_user().await?;
            let item = id.parse::<ItemRef>()?;

            if !yes {
                ui::print_warning(&format!("About to delete {item}. Use --yes to confirm."));
                return Ok(());
            }

            match item {
                ItemRef::Task(task_id) => {
                    tasks_domain.remove_task(&user.id, &task_id).await?;
                    ui::print_success(&format!("Removed task {task_id}"));
                }
                ItemRef::Subtask(task_id, subtask_id) => {
                    let (removed, propagation) = tasks_domain
                        .remove_subtask(&user.id, &task_id, subtask_id)
                        .await?;
                    ui::print_success(&format!(
                        "Removed subtask {}: {}",
                        removed.full_id(),
                        removed.title
                    ));
                    if let Some(message) = ui::describe_propagation(&task_id, propagation) {
                        ui::print_info(&message);
                    }
                }
            }
        }

        Commands::AddSubtask {
            id,
            title,
            description,
            status,
            deadline,
        } => {
            let user = auth.current_user().await?;
            let new = NewSubtask {
                title,
                description,
                status: parse_opt::<TaskStatus>(status)?,
                deadline: deadline.as_deref().map(time::parse_deadline).transpose()?,
            };

            let (subtask, propagation) = tasks_domain.add_subtask(&user.id, &id, new).await?;
            ui::print_success(&format!(
                "Added subtask {}: {}",
                subtask.full_id(),
                subtask.title
            ));
            if let Some(message) = ui::describe_propagation(&id, propagation) {
                ui::print_info(&message);
            }
        }

        Commands::EditSubtask {
            id,
            title,
            description,
            status,
            deadline,
        } => {
            let user = auth.current_user().await?;
            let (task_id, subtask_id) = parse_subtask_ref(&id)?;
            let edit = SubtaskEdit {
                title,
                description,
                status: parse_opt::<TaskStatus>(status)?,
                deadline: deadline.as_deref().map(time::parse_deadline).transpose()?,
            };

            let propagation = tasks_domain
                .update_subtask(&user.id, &task_id, subtask_id, edit)
                .await?;
            ui::print_success(&format!("Updated subtask {id}"));
            if let Some(message) = ui::describe_propagation(&task_id, propagation) {
                ui::print_info(&message);
            }
        }

        Commands::Check { id } => {
            let user = auth.current_user().await?;
            let (task_id, subtask_id) = parse_subtask_ref(&id)?;
            let propagation = tasks_domain
                .set_subtask_status(&user.id, &task_id, subtask_id, TaskStatus::Completed)
                .await?;
            ui::print_success(&format!("Checked subtask {id}"));
            if let Some(message) = ui::describe_propagation(&task_id, propagation) {
                ui::print_info(&message);
            }
        }

        Commands::Uncheck { id } => {
            let user = auth.current_user().await?;
            let (task_id, subtask_id) = parse_subtask_ref(&id)?;
            let propagation = tasks_domain
                .set_subtask_status(&user.id, &task_id, subtask_id, TaskStatus::Started)
                .await?;
            ui::print_success(&format!("Unchecked subtask {id}"));
            if let Some(message) = ui::describe_propagation(&task_id, propagation) {
                ui::print_info(&message);
            }
        }

        Commands::Notify { watch, interval } => {
            let user = auth.current_user().await?;
            let config = config_domain.load().await?;

            let notifier = if config.notifications.enabled {
                let channels: Vec<Arc<dyn NotifyChannel>> =
                    vec![Arc::new(ConsoleChannel), Arc::new(LogChannel)];
                Notifier::with_channels(channels)
            } else {
                ui::print_warning("Reminders are disabled. Run 'taskapp reminders --on' to enable.");
                Notifier::disabled()
            };

            let interval_secs = interval.unwrap_or(config.notifications.interval_secs).max(1);
            let watcher = DeadlineWatcher::new(
                Arc::clone(&storage),
                &user.id,
                notifier,
                Duration::from_secs(interval_secs),
            );

            if watch {
                let cancel = CancellationToken::new();
                let ctrl_c = cancel.clone();
                tokio::spawn(async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        ctrl_c.cancel();
                    }
                });

                ui::print_info(&format!(
                    "Checking deadlines every {interval_secs}s, press Ctrl-C to stop"
                ));
                watcher.run(cancel).await?;
            } else {
                let due = watcher.check_once(time::today()).await?;
                if due.is_empty() {
                    ui::print_info("Nothing due today");
                } else {
                    ui::print_info(&format!("{} item(s) due today", due.len()));
                }
            }
        }

        Commands::Reminders { on, off, interval } => {
            let enabled = if on {
                Some(true)
            } else if off {
                Some(false)
            } else {
                None
            };

            let config = config_domain.set_notifications(enabled, interval).await?;
            ui::print_success(&format!(
                "Reminders {} (every {}s)",
                if config.notifications.enabled {
                    "enabled"
                } else {
                    "disabled"
                },
                config.notifications.interval_secs
            ));
        }

        Commands::Theme { dark, light } => {
            let dark = if dark || light {
                config_domain.set_dark_theme(dark).await?;
                dark
            } else {
                config_domain.toggle_dark_theme().await?
            };
            ui::print_success(&format!(
                "Theme set to {}",
                if dark { "dark" } else { "light" }
            ));
        }
    }

    Ok(())
}

fn parse_opt<T>(value: Option<String>) -> Result<Option<T>, TasksError>
where
    T: std::str::FromStr<Err = TasksError>,
{
    value.map(|v| v.parse::<T>()).transpose()
}

fn parse_item_refs(ids: &str) -> Result<Vec<ItemRef>, TasksError> {
    ids.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse::<ItemRef>)
        .collect()
}

fn parse_subtask_ref(id: &str) -> Result<(String, u32), TasksError> {
    match id.parse::<ItemRef>()? {
        ItemRef::Subtask(task_id, subtask_id) => Ok((task_id, subtask_id)),
        ItemRef::Task(_) => Err(TasksError::InvalidId { id: id.to_string() }),
    }
}

fn read_password(password: Option<String>, confirm: bool) -> Result<String, TasksError> {
    if let Some(password) = password {
        return Ok(password);
    }

    let theme = ColorfulTheme::default();
    let mut prompt = Password::with_theme(&theme).with_prompt("Password");
    if confirm {
        prompt = prompt.with_confirmation("Confirm password", "Passwords do not match");
    }

    prompt.interact().map_err(|e| TasksError::InvalidArgument {
        reason: format!("failed to read password: {e}"),
    })
}
