//! Subcommands of the `taskbook` binary

use anyhow::{Result, bail};
use clap::{Subcommand, ValueEnum};
use tasks::{TaskDraft, TaskPatch, TaskView};
use tracing::info;

use crate::render;
use crate::state::AppState;

#[derive(Subcommand)]
pub enum Command {
    /// Log in and store the session
    Login {
        email: String,

        #[arg(long, env = "TASKBOOK_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Create an account and log into it
    Register {
        email: String,

        #[arg(long)]
        first_name: String,

        #[arg(long)]
        last_name: String,

        #[arg(long, env = "TASKBOOK_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Remove the stored session
    Logout,

    /// Show the logged-in user
    Whoami,

    /// List one task view
    List {
        #[arg(value_enum, default_value = "all")]
        view: ViewArg,
    },

    /// Fetch every view and print how many tasks each holds
    Sync,

    /// Create a task
    Create {
        name: String,

        #[arg(long)]
        description: Option<String>,

        /// Email of the user the task is for
        #[arg(long = "to")]
        recipient: Option<String>,
    },

    /// Edit a task's name or description
    Update {
        id: i64,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        description: Option<String>,
    },

    /// Delete a task
    Delete { id: i64 },

    /// Mark a task as complete
    Complete { id: i64 },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ViewArg {
    All,
    Mine,
    Created,
    Completed,
}

impl From<ViewArg> for TaskView {
    fn from(view: ViewArg) -> Self {
        match view {
            ViewArg::All => TaskView::All,
            ViewArg::Mine => TaskView::Mine,
            ViewArg::Created => TaskView::Created,
            ViewArg::Completed => TaskView::Completed,
        }
    }
}

pub async fn run(command: Command, state: &AppState) -> Result<()> {
    match command {
        Command::Login { email, password } => {
            let profile = state.session.login(&email, &password).await?;
            println!("Logged in as {}", render::profile_line(&profile));
        }
        Command::Register {
            email,
            first_name,
            last_name,
            password,
        } => {
            let profile = state
                .session
                .register(&email, &password, &first_name, &last_name)
                .await?;
            println!("Registered and logged in as {}", render::profile_line(&profile));
        }
        Command::Logout => {
            state.session.logout().await;
            println!("Logged out");
        }
        Command::Whoami => {
            let profile = state.require_login()?;
            println!("{}", render::profile_line(&profile));
        }
        Command::List { view } => {
            state.require_login()?;
            let view = TaskView::from(view);
            state.tasks.fetch(view).await?;

            let tasks = state.tasks.view(view).await;
            if tasks.is_empty() {
                println!("No {} tasks", view);
            }
            for task in &tasks {
                println!("{}", render::task_detail(task));
            }
        }
        Command::Sync => {
            state.require_login()?;
            state.tasks.refresh_all().await?;

            let views = state.tasks.snapshot().await;
            for view in TaskView::ALL {
                println!("{:<10} {}", view, views.get(view).len());
            }
        }
        Command::Create {
            name,
            description,
            recipient,
        } => {
            state.require_login()?;
            let draft = TaskDraft {
                description,
                recipient_email: recipient,
                ..TaskDraft::new(name)
            };
            let task = state.tasks.create(draft).await?;
            println!("Created {}", render::task_line(&task));
        }
        Command::Update {
            id,
            name,
            description,
        } => {
            state.require_login()?;
            let patch = TaskPatch { name, description };
            if patch.is_empty() {
                bail!("Nothing to update, pass --name or --description");
            }
            match state.tasks.update(id, &patch).await? {
                Some(task) => println!("Updated {}", render::task_line(&task)),
                None => println!("Updated task {}", id),
            }
        }
        Command::Delete { id } => {
            state.require_login()?;
            state.tasks.remove(id).await?;
            println!("Deleted task {}", id);
        }
        Command::Complete { id } => {
            state.require_login()?;
            let task = state.tasks.complete(id).await?;
            println!("Completed {}", render::task_line(&task));
        }
    }

    info!("Command finished");
    Ok(())
}
