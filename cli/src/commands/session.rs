use super::{AppContext, MarkCommand};
use marksync::config::Backend;
use marksync::error::Result;
use marksync::session::{Session, SessionProvider};

#[derive(Debug, Clone)]
pub struct LoginCommand {
    pub user_id: String,
    pub token: Option<String>,
    pub email: Option<String>,
}

impl MarkCommand for LoginCommand {
    fn execute(&self, ctx: &AppContext) -> Result<()> {
        let user_id = self.user_id.trim();
        if user_id.is_empty() {
            return Err("User id cannot be empty".into());
        }

        let mut session = Session::new(user_id);
        if let Some(token) = &self.token {
            session = session.with_token(token.as_str());
        }
        if let Some(email) = &self.email {
            session = session.with_email(email.as_str());
        }
        ctx.sessions.sign_in(session)?;
        eprintln!("Signed in as {}", user_id);
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct LogoutCommand;

impl MarkCommand for LogoutCommand {
    fn execute(&self, ctx: &AppContext) -> Result<()> {
        let signed_in = ctx.sessions.current_session().is_some();
        // Also clears a session file that failed to load
        ctx.sessions.sign_out()?;
        if signed_in {
            eprintln!("Signed out.");
        } else {
            eprintln!("Not signed in.");
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct WhoamiCommand;

impl MarkCommand for WhoamiCommand {
    fn execute(&self, ctx: &AppContext) -> Result<()> {
        let session = ctx.session()?;
        let backend = match ctx.config.backend {
            Backend::Local => format!("local ({})", ctx.config.db_path().display()),
            Backend::Remote => format!("remote ({})", ctx.config.remote.url),
        };
        println!("{}", session.user_id);
        if let Some(email) = &session.email {
            println!("email:   {}", email);
        }
        println!("backend: {}", backend);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_env::TestEnv;
    use marksync::error::SyncError;
    use marksync::session::SessionHub;

    #[test]
    fn test_login_then_logout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.yml");
        let env = TestEnv::new();
        let sessions = SessionHub::load_from_path(&path).unwrap();
        let ctx = AppContext {
            config: &env.config,
            sessions: &sessions,
            no_color: true,
        };

        LoginCommand {
            user_id: " u7 ".to_string(),
            token: Some("tok".to_string()),
            email: Some("me@example.com".to_string()),
        }
        .execute(&ctx)
        .unwrap();

        let reloaded = SessionHub::load_from_path(&path).unwrap().current_session().unwrap();
        assert_eq!(reloaded, Session::new("u7").with_token("tok").with_email("me@example.com"));
        assert!(WhoamiCommand.execute(&ctx).is_ok());

        LogoutCommand.execute(&ctx).unwrap();
        assert!(!path.exists());
        assert!(matches!(WhoamiCommand.execute(&ctx), Err(SyncError::NoSession)));
        // Logging out twice is harmless
        assert!(LogoutCommand.execute(&ctx).is_ok());
    }

    #[test]
    fn test_login_replaces_corrupt_session_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.yml");
        std::fs::write(&path, "user_id: [unterminated").unwrap();
        let env = TestEnv::new();
        let sessions = SessionHub::load(&path);
        let ctx = AppContext {
            config: &env.config,
            sessions: &sessions,
            no_color: true,
        };
        assert!(matches!(WhoamiCommand.execute(&ctx), Err(SyncError::NoSession)));

        LoginCommand {
            user_id: "u3".to_string(),
            token: None,
            email: None,
        }
        .execute(&ctx)
        .unwrap();

        let reloaded = SessionHub::load_from_path(&path).unwrap().current_session();
        assert_eq!(reloaded, Some(Session::new("u3")));
    }

    #[test]
    fn test_logout_removes_corrupt_session_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.yml");
        std::fs::write(&path, "user_id: [unterminated").unwrap();
        let env = TestEnv::new();
        let sessions = SessionHub::load(&path);
        let ctx = AppContext {
            config: &env.config,
            sessions: &sessions,
            no_color: true,
        };

        LogoutCommand.execute(&ctx).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_login_rejects_blank_user() {
        let env = TestEnv::new();
        let cmd = LoginCommand {
            user_id: "  ".to_string(),
            token: None,
            email: None,
        };
        assert!(matches!(cmd.execute(&env.ctx()), Err(SyncError::Other(_))));
    }
}
