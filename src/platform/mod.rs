// Tabloop platform paths
// Resolves where settings and the snapshot database live on each OS.

use std::path::PathBuf;

#[cfg(target_os = "linux")]
mod linux;

#[cfg(target_os = "macos")]
mod macos;

#[cfg(target_os = "windows")]
mod windows;

/// Directory holding `settings.json`.
///
/// - **Linux**: `$XDG_CONFIG_HOME/tabloop` or `~/.config/tabloop`
/// - **macOS**: `~/Library/Application Support/Tabloop`
/// - **Windows**: `%APPDATA%/Tabloop`
pub fn get_config_dir() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        linux::get_config_dir()
    }
    #[cfg(target_os = "macos")]
    {
        macos::app_support_dir()
    }
    #[cfg(target_os = "windows")]
    {
        windows::app_data_dir()
    }
}

/// Directory holding `tabloop.db`.
///
/// - **Linux**: `$XDG_DATA_HOME/tabloop` or `~/.local/share/tabloop`
/// - **macOS** and **Windows**: same as the config directory
pub fn get_data_dir() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        linux::get_data_dir()
    }
    #[cfg(target_os = "macos")]
    {
        macos::app_support_dir()
    }
    #[cfg(target_os = "windows")]
    {
        windows::app_data_dir()
    }
}
