use super::bookmark::Bookmark;
use std::fmt;

/// Kind of a row-level change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeKind::Insert => write!(f, "insert"),
            ChangeKind::Update => write!(f, "update"),
            ChangeKind::Delete => write!(f, "delete"),
        }
    }
}

/// One notification from the live change stream.
///
/// Insert and update carry the new row; delete carries only the old id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    Insert(Bookmark),
    Update(Bookmark),
    Delete { id: String },
}

impl ChangeEvent {
    pub fn kind(&self) -> ChangeKind {
        match self {
            ChangeEvent::Insert(_) => ChangeKind::Insert,
            ChangeEvent::Update(_) => ChangeKind::Update,
            ChangeEvent::Delete { .. } => ChangeKind::Delete,
        }
    }

    /// Id of the affected record
    pub fn id(&self) -> &str {
        match self {
            ChangeEvent::Insert(b) | ChangeEvent::Update(b) => &b.id,
            ChangeEvent::Delete { id } => id,
        }
    }

    /// The new row, for insert and update
    pub fn record(&self) -> Option<&Bookmark> {
        match self {
            ChangeEvent::Insert(b) | ChangeEvent::Update(b) => Some(b),
            ChangeEvent::Delete { .. } => None,
        }
    }
}
