use marksync::error::{Result, SyncError};
use marksync::models::Bookmark;
use std::io::{self, Write};

/// Find the bookmark whose id equals `arg` or is the only one starting with it
pub fn resolve_id<'a>(bookmarks: &'a [Bookmark], arg: &str) -> Result<&'a Bookmark> {
    if let Some(exact) = bookmarks.iter().find(|b| b.id == arg) {
        return Ok(exact);
    }

    let mut matches = bookmarks.iter().filter(|b| b.id.starts_with(arg));
    match (matches.next(), matches.next()) {
        (Some(found), None) if !arg.is_empty() => Ok(found),
        (Some(_), Some(_)) => Err(SyncError::Other(format!("Id prefix '{}' is ambiguous", arg))),
        _ => Err(SyncError::Other(format!("No bookmark with id '{}'", arg))),
    }
}

/// Ask a yes/no question on stdout; anything but y/yes is a no
pub fn confirm(prompt: &str) -> Result<bool> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut response = String::new();
    io::stdin().read_line(&mut response)?;
    let response = response.trim().to_lowercase();
    Ok(response == "y" || response == "yes")
}
