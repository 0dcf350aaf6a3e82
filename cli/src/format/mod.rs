use crate::{
    format::{json::JsonBookmark, plain::PlainBookmark, traits::BookmarkFormat},
    output::colorize::{Colorize, ColorizeBookmark},
};
use marksync::models::Bookmark;

pub mod json;
pub mod plain;
pub mod traits;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Colored,
}

impl OutputFormat {
    pub fn from_string(format: &str) -> Self {
        match format {
            "json" => OutputFormat::Json,
            _ => OutputFormat::Colored,
        }
    }

    pub fn render(self, bookmark: &Bookmark, no_color: bool) -> String {
        match self {
            OutputFormat::Json => JsonBookmark(bookmark).to_string(),
            OutputFormat::Colored if no_color => PlainBookmark(bookmark).to_string(),
            OutputFormat::Colored => ColorizeBookmark(bookmark).to_colored(),
        }
    }

    pub fn print_bookmarks(self, records: &[Bookmark], no_color: bool) {
        for b in records {
            println!("{}", self.render(b, no_color));
        }
    }
}
