// macOS: config and data share ~/Library/Application Support/Tabloop.

use std::env;
use std::path::PathBuf;

pub fn app_support_dir() -> PathBuf {
    PathBuf::from(env::var("HOME").unwrap_or_else(|_| String::from("/tmp")))
        .join("Library")
        .join("Application Support")
        .join("Tabloop")
}
