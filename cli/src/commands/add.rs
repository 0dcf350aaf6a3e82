use super::{AppContext, MarkCommand};
use log::warn;
use marksync::error::Result;
use marksync::models::{Bookmark, BookmarkInput};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct AddCommand {
    pub url: String,
    pub title: String,
}

impl AddCommand {
    /// Create the bookmark and report whether its insert event arrived in time
    pub fn run(&self, ctx: &AppContext) -> Result<(Bookmark, bool)> {
        let (mut sync, session) = ctx.open_sync()?;
        sync.start(&session.user_id)?;

        let input = BookmarkInput::new(self.title.as_str(), self.url.as_str());
        let created = sync.request_create(&input, &session.user_id)?;

        let now = Instant::now();
        let deadline = now
            .checked_add(confirm_wait(ctx.config.remote.poll_interval_ms))
            .unwrap_or(now);
        let mut confirmed = false;
        while !confirmed {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            sync.pump_timeout(remaining)?;
            confirmed = sync.bookmarks().iter().any(|b| b.id == created.id);
        }
        Ok((created, confirmed))
    }
}

const MAX_CONFIRM_WAIT: Duration = Duration::from_secs(60);

/// A couple of poll rounds, capped
fn confirm_wait(poll_interval_ms: u64) -> Duration {
    Duration::from_millis(poll_interval_ms.saturating_mul(2)).min(MAX_CONFIRM_WAIT)
}

impl MarkCommand for AddCommand {
    fn execute(&self, ctx: &AppContext) -> Result<()> {
        let (created, confirmed) = self.run(ctx)?;
        if !confirmed {
            warn!("Insert of {} not yet confirmed by the store", created.id);
        }
        eprintln!("Added bookmark {} ({})", created.id, created.title);
        Ok(())
    }
}
