//! Command-line definitions
//!
//! Maps each subcommand to its handler in [`crate::command`].

use clap::{Parser, Subcommand};

use crate::activity::DEFAULT_LIMIT;
use crate::command::{self, AppState};
use crate::error::AppError;
use crate::model::ClickData;
use crate::registry::DEFAULT_EXPIRY_MINUTES;

#[derive(Parser, Debug)]
#[command(name = "snaplink", version, about = "Local URL shortener with click analytics")]
pub struct Cli {
    /// Path to the database file (overrides DATABASE_URL)
    #[arg(long, global = true)]
    pub database: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sign in with a demo account
    Login { username: String, password: String },

    /// End the current session
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Create a short link
    Shorten {
        url: String,

        /// Minutes until the link expires
        #[arg(short, long, default_value_t = DEFAULT_EXPIRY_MINUTES)]
        expiry: u32,

        /// Custom shortcode (3-20 alphanumeric characters)
        #[arg(short, long)]
        code: Option<String>,
    },

    /// List every link, newest first
    List,

    /// Show one link with its click log
    Show { code: String },

    /// Delete a link
    Delete { code: String },

    /// Summary counts
    Stats,

    /// Follow a link: record the click and print the target URL
    Open {
        code: String,

        #[arg(long)]
        source: Option<String>,

        #[arg(long)]
        location: Option<String>,

        #[arg(long)]
        user_agent: Option<String>,
    },

    /// Show the activity log, newest first
    Logs {
        /// info, warn, error or success
        #[arg(long)]
        level: Option<String>,

        #[arg(long, default_value_t = DEFAULT_LIMIT)]
        limit: usize,

        /// Remove every entry instead
        #[arg(long)]
        clear: bool,
    },
}

pub async fn dispatch(state: &AppState, command: Command) -> Result<String, AppError> {
    match command {
        Command::Login { username, password } => {
            command::login(state, &username, &password).await
        }
        Command::Logout => command::logout(state),
        Command::Whoami => command::whoami(state),
        Command::Shorten { url, expiry, code } => {
            command::shorten(state, &url, expiry, code.as_deref())
        }
        Command::List => command::list(state),
        Command::Show { code } => command::show(state, &code),
        Command::Delete { code } => command::delete(state, &code),
        Command::Stats => command::stats(state),
        Command::Open {
            code,
            source,
            location,
            user_agent,
        } => command::open(
            state,
            &code,
            ClickData {
                source,
                location,
                user_agent,
            },
        ),
        Command::Logs {
            level,
            limit,
            clear,
        } => command::logs(state, level.as_deref(), limit, clear),
    }
}
