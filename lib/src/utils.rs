use std::env;
use std::path::PathBuf;

const APP_DIR: &str = "marksync";

/// Where the local database lives; `MARKSYNC_DATA_DIR` is used as is
pub fn data_dir() -> PathBuf {
    data_dir_with(|name| env::var(name).ok())
}

pub fn config_dir() -> PathBuf {
    app_dir("XDG_CONFIG_HOME", ".config", |name| env::var(name).ok())
}

fn data_dir_with(lookup: impl Fn(&str) -> Option<String>) -> PathBuf {
    match lookup("MARKSYNC_DATA_DIR").filter(|p| !p.is_empty()) {
        Some(path) => PathBuf::from(path),
        None => app_dir("XDG_DATA_HOME", ".local/share", lookup),
    }
}

/// `$<xdg_var>/marksync`, else `~/<home_fallback>/marksync`, else `%APPDATA%\marksync`,
/// else the working directory
fn app_dir(xdg_var: &str, home_fallback: &str, lookup: impl Fn(&str) -> Option<String>) -> PathBuf {
    let set = |name: &str| lookup(name).filter(|v| !v.is_empty());

    let base = set(xdg_var)
        .map(PathBuf::from)
        .or_else(|| set("HOME").map(|home| PathBuf::from(home).join(home_fallback)))
        .or_else(|| set("APPDATA").map(PathBuf::from));
    match base {
        Some(base) => base.join(APP_DIR),
        None => env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}
