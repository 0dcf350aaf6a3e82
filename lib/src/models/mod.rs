pub mod bookmark;
pub mod change;

pub use bookmark::{Bookmark, BookmarkInput, NewBookmark};
pub use change::{ChangeEvent, ChangeKind};
