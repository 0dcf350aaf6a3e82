use super::helpers::{confirm, resolve_id};
use super::{AppContext, MarkCommand};
use crate::output::colorize::short_id;
use marksync::error::{Result, SyncError};

#[derive(Debug, Clone)]
pub struct DeleteCommand {
    pub ids: Vec<String>,
    pub force: bool,
}

impl DeleteCommand {
    /// Resolve, confirm and delete; returns how many deletes the store accepted.
    /// Any rejected delete makes the whole command fail.
    fn run(&self, ctx: &AppContext, confirmed: impl FnOnce(usize) -> Result<bool>) -> Result<usize> {
        let (mut sync, session) = ctx.open_sync()?;
        sync.start(&session.user_id)?;

        let mut targets: Vec<(String, String)> = Vec::new();
        for arg in &self.ids {
            let bookmark = resolve_id(sync.bookmarks(), arg)?;
            if !targets.iter().any(|(id, _)| *id == bookmark.id) {
                targets.push((bookmark.id.clone(), bookmark.title.clone()));
            }
        }

        eprintln!("Bookmarks to be deleted:");
        for (id, title) in &targets {
            eprintln!("  {}. {}", short_id(id), title);
        }

        if !self.force && !confirmed(targets.len())? {
            eprintln!("Deletion cancelled.");
            return Ok(0);
        }

        let mut deleted = 0;
        for (id, _) in &targets {
            match sync.request_delete(id, &session.user_id) {
                Ok(()) => deleted += 1,
                Err(e) => eprintln!("✗ Bookmark {}: {}", short_id(id), e),
            }
        }

        sync.pump()?;
        eprintln!(
            "Deleted {} bookmark(s), {} left.",
            deleted,
            sync.bookmarks().len()
        );
        if deleted < targets.len() {
            return Err(SyncError::Other(format!(
                "{} of {} delete(s) failed",
                targets.len() - deleted,
                targets.len()
            )));
        }
        Ok(deleted)
    }
}

impl MarkCommand for DeleteCommand {
    fn execute(&self, ctx: &AppContext) -> Result<()> {
        self.run(ctx, |count| {
            confirm(&format!("\nDelete {} bookmark(s)? [y/N]: ", count))
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_env::TestEnv;
    use marksync::store::BookmarkStore;
    use rstest::rstest;

    #[rstest]
    fn test_delete_command() {
        let env = TestEnv::new();
        let keep = env.seed("u1", "Keep", "https://keep.example");
        let gone = env.seed("u1", "Gone", "https://gone.example");

        let cmd = DeleteCommand {
            ids: vec![gone.id.clone(), gone.id[..8].to_string()],
            force: true, // Force to skip confirmation in tests
        };

        assert_eq!(cmd.run(&env.ctx(), |_| Ok(false)).unwrap(), 1);
        assert_eq!(env.store().fetch_all("u1").unwrap(), vec![keep]);
    }

    #[rstest]
    fn test_delete_cancelled() {
        let env = TestEnv::new();
        let b = env.seed("u1", "Stay", "https://stay.example");

        let cmd = DeleteCommand {
            ids: vec![b.id.clone()],
            force: false,
        };

        assert_eq!(cmd.run(&env.ctx(), |_| Ok(false)).unwrap(), 0);
        assert_eq!(env.store().fetch_all("u1").unwrap().len(), 1);
    }

    #[rstest]
    fn test_rejected_delete_fails_command() {
        let env = TestEnv::new();
        let b = env.seed("u1", "Racy", "https://racy.example");

        let cmd = DeleteCommand {
            ids: vec![b.id.clone()],
            force: false,
        };

        // Removed by someone else between listing and confirming
        let err = cmd
            .run(&env.ctx(), |_| {
                env.store().delete(&b.id, "u1").unwrap();
                Ok(true)
            })
            .unwrap_err();
        assert!(matches!(err, SyncError::Other(msg) if msg.contains("1 of 1")));
    }

    #[rstest]
    fn test_delete_other_users_bookmark_is_not_found() {
        let env = TestEnv::new();
        let theirs = env.seed("u2", "Theirs", "https://theirs.example");

        let cmd = DeleteCommand {
            ids: vec![theirs.id.clone()],
            force: true,
        };

        assert!(cmd.execute(&env.ctx()).is_err());
        assert_eq!(env.store().fetch_all("u2").unwrap().len(), 1);
    }
}
