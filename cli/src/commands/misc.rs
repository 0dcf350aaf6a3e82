use super::helpers::resolve_id;
use super::{AppContext, MarkCommand};
use marksync::browser;
use marksync::error::Result;

#[derive(Debug, Clone)]
pub struct OpenCommand {
    pub id: String,
}

impl MarkCommand for OpenCommand {
    fn execute(&self, ctx: &AppContext) -> Result<()> {
        let (mut sync, session) = ctx.open_sync()?;
        sync.initialize(&session.user_id)?;

        let bookmark = resolve_id(sync.bookmarks(), &self.id)?;
        eprintln!("Opening: {}", bookmark.url);
        browser::open_url(&bookmark.url)?;
        Ok(())
    }
}
