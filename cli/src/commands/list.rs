use super::{AppContext, MarkCommand};
use crate::format::OutputFormat;
use log::debug;
use marksync::error::Result;
use marksync::models::Bookmark;

#[derive(Debug, Clone)]
pub struct ListCommand {
    pub format: Option<String>,
    pub limit: Option<usize>,
}

impl ListCommand {
    /// The bookmarks this command prints, newest first
    pub fn collect(&self, ctx: &AppContext) -> Result<Vec<Bookmark>> {
        let (mut sync, session) = ctx.open_sync()?;
        sync.initialize(&session.user_id)?;
        debug!("{} bookmark(s) for {}", sync.bookmarks().len(), session.user_id);

        let limit = self.limit.unwrap_or(usize::MAX);
        Ok(sync.bookmarks().iter().take(limit).cloned().collect())
    }
}

impl MarkCommand for ListCommand {
    fn execute(&self, ctx: &AppContext) -> Result<()> {
        let records = self.collect(ctx)?;
        if records.is_empty() {
            eprintln!("No bookmarks yet. Add one with `marksync add <url> --title <title>`.");
            return Ok(());
        }

        let output_format = self
            .format
            .as_deref()
            .map(OutputFormat::from_string)
            .unwrap_or(OutputFormat::Colored);
        output_format.print_bookmarks(&records, ctx.no_color);
        Ok(())
    }
}
