use crate::commands::{
    add, delete, list, misc, session, watch, AppContext, CommandEnum,
};
use clap::{Parser, Subcommand};
use marksync::config::Config;
use marksync::error::Result;
use marksync::session::SessionHub;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional custom database file path (local backend)
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// Optional custom configuration file path
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Disable color output
    #[arg(long)]
    pub nc: bool,

    /// Show debug information
    #[arg(short = 'g', long = "debug")]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List your bookmarks, newest first
    List {
        /// Output format: json, or colored text (default)
        #[arg(short = 'f', long)]
        format: Option<String>,

        /// Show only the N newest bookmarks
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Add a new bookmark
    Add {
        /// URL to bookmark
        url: String,

        /// Bookmark title
        #[arg(short, long)]
        title: String,
    },

    /// Delete bookmark(s) by id or unique id prefix
    Delete {
        #[arg(required = true, num_args = 1..)]
        ids: Vec<String>,

        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Open a bookmark in the browser
    Open {
        /// Bookmark id or unique id prefix
        id: String,
    },

    /// Print changes as they arrive
    Watch {
        /// Exit after this many changes
        #[arg(short = 'c', long)]
        count: Option<usize>,
    },

    /// Store a session for later commands
    Login {
        #[arg(long)]
        user_id: String,

        /// Access token for the hosted backend
        #[arg(long)]
        token: Option<String>,

        #[arg(long)]
        email: Option<String>,
    },

    /// Forget the stored session
    Logout,

    /// Show the stored session
    Whoami,
}

impl Commands {
    pub fn into_command(self) -> CommandEnum {
        match self {
            Commands::List { format, limit } => CommandEnum::List(list::ListCommand { format, limit }),
            Commands::Add { url, title } => CommandEnum::Add(add::AddCommand { url, title }),
            Commands::Delete { ids, force } => {
                CommandEnum::Delete(delete::DeleteCommand { ids, force })
            }
            Commands::Open { id } => CommandEnum::Open(misc::OpenCommand { id }),
            Commands::Watch { count } => CommandEnum::Watch(watch::WatchCommand { count }),
            Commands::Login {
                user_id,
                token,
                email,
            } => CommandEnum::Login(session::LoginCommand {
                user_id,
                token,
                email,
            }),
            Commands::Logout => CommandEnum::Logout(session::LogoutCommand),
            Commands::Whoami => CommandEnum::Whoami(session::WhoamiCommand),
        }
    }
}

pub fn handle_args(cli: Cli, config: &Config, sessions: &SessionHub) -> Result<()> {
    let ctx = AppContext {
        config,
        sessions,
        no_color: cli.nc,
    };
    cli.command.into_command().execute(&ctx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_add() {
        let cli = Cli::try_parse_from(["marksync", "add", "https://go.dev", "--title", "Go"]).unwrap();
        match cli.command.into_command() {
            CommandEnum::Add(cmd) => {
                assert_eq!(cmd.url, "https://go.dev");
                assert_eq!(cmd.title, "Go");
            }
            _ => panic!("expected add"),
        }
    }

    #[test]
    fn test_parse_global_flags() {
        let cli = Cli::try_parse_from(["marksync", "--db", "/tmp/x.db", "-g", "--nc", "list", "-n", "3"])
            .unwrap();
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/x.db")));
        assert!(cli.debug);
        assert!(cli.nc);
        assert!(matches!(
            cli.command,
            Commands::List {
                limit: Some(3),
                ..
            }
        ));
    }

    #[test]
    fn test_delete_requires_ids() {
        assert!(Cli::try_parse_from(["marksync", "delete"]).is_err());
    }

    #[test]
    fn test_add_requires_title() {
        assert!(Cli::try_parse_from(["marksync", "add", "https://go.dev"]).is_err());
    }
}
