use super::{AppContext, MarkCommand};
use crate::output::colorize::{display_domain, short_id};
use log::info;
use marksync::error::Result;
use marksync::models::{ChangeEvent, ChangeKind};
use marksync::session::SessionBinding;
use marksync::BookmarkSync;
use owo_colors::OwoColorize;
use std::time::Duration;

const TICK: Duration = Duration::from_millis(500);

#[derive(Debug, Clone)]
pub struct WatchCommand {
    pub count: Option<usize>,
}

impl WatchCommand {
    /// Follow the signed-in user's bookmarks until signed out or `count` changes are seen
    fn run(&self, ctx: &AppContext, mut on_event: impl FnMut(&ChangeEvent)) -> Result<usize> {
        let session = ctx.session()?;
        let mut sync = BookmarkSync::new(ctx.open_store(&session, true)?);
        let binding = SessionBinding::attach(ctx.sessions);

        let mut seen = 0;
        loop {
            if let Some(next) = binding.latest() {
                sync.apply_session(next.as_ref())?;
                match sync.user_id() {
                    Some(user_id) => eprintln!(
                        "Watching {} bookmark(s) for {}. Press Ctrl-C to stop.",
                        sync.bookmarks().len(),
                        user_id
                    ),
                    None => {
                        eprintln!("Signed out, stopping.");
                        return Ok(seen);
                    }
                }
            }

            for event in sync.pump_timeout(TICK)? {
                on_event(&event);
                seen += 1;
                if self.count.is_some_and(|limit| seen >= limit) {
                    info!("Seen {} change(s), stopping", seen);
                    return Ok(seen);
                }
            }
        }
    }
}

impl MarkCommand for WatchCommand {
    fn execute(&self, ctx: &AppContext) -> Result<()> {
        self.run(ctx, |event| println!("{}", describe(event, ctx.no_color)))?;
        Ok(())
    }
}

/// One line per change: `+` added, `~` changed, `-` removed
pub fn describe(event: &ChangeEvent, no_color: bool) -> String {
    let text = match event.record() {
        Some(b) => format!("{}. {} ({})", short_id(&b.id), b.title, display_domain(&b.url)),
        None => short_id(event.id()).to_string(),
    };
    let mark = match (event.kind(), no_color) {
        (ChangeKind::Insert, true) => "+".to_string(),
        (ChangeKind::Update, true) => "~".to_string(),
        (ChangeKind::Delete, true) => "-".to_string(),
        (ChangeKind::Insert, false) => "+".green().to_string(),
        (ChangeKind::Update, false) => "~".yellow().to_string(),
        (ChangeKind::Delete, false) => "-".red().to_string(),
    };
    format!("{} {}", mark, text)
}
