use marksync::config::{Backend, Config};
use marksync::error::{Result, SyncError};
use marksync::local::LocalStore;
use marksync::poll::PollSettings;
use marksync::remote::RestStore;
use marksync::session::{Session, SessionHub, SessionProvider};
use marksync::store::BookmarkStore;
use marksync::BookmarkSync;
use std::time::Duration;

pub type CliSync = BookmarkSync<Box<dyn BookmarkStore>>;

pub struct AppContext<'a> {
    pub config: &'a Config,
    pub sessions: &'a SessionHub,
    pub no_color: bool,
}

impl AppContext<'_> {
    pub fn session(&self) -> Result<Session> {
        self.sessions.current_session().ok_or(SyncError::NoSession)
    }

    /// Store for the configured backend, authorized as `session`.
    /// With `follow_file` a local store also sees writes from other processes.
    pub fn open_store(&self, session: &Session, follow_file: bool) -> Result<Box<dyn BookmarkStore>> {
        match self.config.backend {
            Backend::Local => {
                let db_path = self.config.db_path();
                if let Some(parent) = db_path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                let mut store = LocalStore::init(&db_path).map_err(|e| {
                    SyncError::Other(format!("Cannot open database {:?}: {}", db_path, e))
                })?;
                if follow_file {
                    store = store.with_polling(PollSettings {
                        interval: Duration::from_millis(self.config.local_poll_interval_ms.max(1)),
                        max_failures: self.config.remote.max_poll_failures,
                    });
                }
                Ok(Box::new(store))
            }
            Backend::Remote => Ok(Box::new(RestStore::new(&self.config.remote, session)?)),
        }
    }

    /// A sync module for the signed-in user, not yet started
    pub fn open_sync(&self) -> Result<(CliSync, Session)> {
        let session = self.session()?;
        let store = self.open_store(&session, false)?;
        Ok((BookmarkSync::new(store), session))
    }
}

pub mod add;
pub mod delete;
pub mod helpers;
pub mod list;
pub mod misc;
pub mod session;
pub mod watch;

pub trait MarkCommand {
    fn execute(&self, ctx: &AppContext) -> Result<()>;
}

/// Enum-based dispatch for commands (avoids Box<dyn MarkCommand>)
pub enum CommandEnum {
    List(list::ListCommand),
    Add(add::AddCommand),
    Delete(delete::DeleteCommand),
    Open(misc::OpenCommand),
    Watch(watch::WatchCommand),
    Login(session::LoginCommand),
    Logout(session::LogoutCommand),
    Whoami(session::WhoamiCommand),
}

impl CommandEnum {
    pub fn execute(&self, ctx: &AppContext) -> Result<()> {
        match self {
            Self::List(cmd) => cmd.execute(ctx),
            Self::Add(cmd) => cmd.execute(ctx),
            Self::Delete(cmd) => cmd.execute(ctx),
            Self::Open(cmd) => cmd.execute(ctx),
            Self::Watch(cmd) => cmd.execute(ctx),
            Self::Login(cmd) => cmd.execute(ctx),
            Self::Logout(cmd) => cmd.execute(ctx),
            Self::Whoami(cmd) => cmd.execute(ctx),
        }
    }
}
