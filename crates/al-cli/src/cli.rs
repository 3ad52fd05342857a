//! Command-line argument definitions.

use std::path::PathBuf;

use al_core::PlannedMinutes;
use clap::{Parser, Subcommand};

/// Aliman focus client.
///
/// Plan your day, run distraction-monitored focus sessions and talk to the
/// Aliman assistant from the terminal.
#[derive(Debug, Parser)]
#[command(name = "aliman", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create an account and log in.
    Register(Credentials),

    /// Log in with an existing account.
    Login(Credentials),

    /// Forget the saved login.
    Logout,

    /// Show who is logged in.
    Whoami,

    /// Show today's question, statistics and plans.
    Dashboard,

    /// Manage today's plans.
    #[command(subcommand)]
    Plans(PlansAction),

    /// Run a focus session.
    Focus {
        /// Session length in minutes (15, 25, 45 or 60).
        #[arg(short, long)]
        minutes: Option<PlannedMinutes>,
    },

    /// Talk to the assistant.
    #[command(subcommand)]
    Chat(ChatAction),

    /// Show the end-of-day review.
    Review,

    /// Ask how the assistant would judge a reason for leaving a session.
    AnalyzeExit {
        /// The reason to analyze.
        reason: String,
    },
}

/// Username and password for register/login.
#[derive(Debug, clap::Args)]
pub struct Credentials {
    #[arg(short, long, env = "ALIMAN_USERNAME", default_value = "")]
    pub username: String,

    #[arg(short, long, env = "ALIMAN_PASSWORD", default_value = "", hide_env_values = true)]
    pub password: String,
}

/// Plan subcommands.
#[derive(Debug, Subcommand)]
pub enum PlansAction {
    /// List today's plans.
    List,
    /// Add a plan for today.
    Add {
        /// Plan text.
        text: Vec<String>,
    },
    /// Mark a plan as done.
    Done {
        /// Plan id as shown by `plans list`.
        id: i64,
    },
}

/// Chat subcommands.
#[derive(Debug, Subcommand)]
pub enum ChatAction {
    /// Send a message.
    Send {
        /// Message text.
        message: Vec<String>,
    },
    /// Show recent messages.
    History {
        /// Number of messages to fetch.
        #[arg(short, long)]
        limit: Option<u32>,
    },
}
