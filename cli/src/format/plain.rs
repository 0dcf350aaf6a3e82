use crate::format::traits::BookmarkFormat;
use crate::output::colorize::{display_domain, relative_date, short_id};
use chrono::Local;
use marksync::models::Bookmark;

pub struct PlainBookmark<'a>(pub &'a Bookmark);

impl<'a> BookmarkFormat for PlainBookmark<'a> {
    fn to_string(&self) -> String {
        let id = short_id(&self.0.id);
        let padding = id.len() + 3;
        format!(
            "{}. {}\n{:>padding$} {}\n{:>padding$} {} {}\n",
            id,
            self.0.title,
            ">",
            self.0.url,
            "@",
            display_domain(&self.0.url),
            relative_date(&self.0.created_at, &Local::now()),
        )
    }
}
