use crate::error::{Result, SyncError};
use crate::validate::validate_url;

/// Open a bookmark URL in the system browser
pub fn open_url(url: &str) -> Result<()> {
    let parsed = validate_url(url)?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(SyncError::Other(format!(
            "Refusing to open non-web URL '{}'",
            url
        )));
    }
    open::that(parsed.as_str())?;
    Ok(())
}
