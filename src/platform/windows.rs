// Windows: config and data share %APPDATA%/Tabloop.

use std::env;
use std::path::PathBuf;

pub fn app_data_dir() -> PathBuf {
    let appdata = env::var("APPDATA")
        .unwrap_or_else(|_| String::from("C:\\Users\\Default\\AppData\\Roaming"));
    PathBuf::from(appdata).join("Tabloop")
}
