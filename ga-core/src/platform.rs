//! Platform detection and OS-specific storage locations.

use std::path::PathBuf;
use crate::constants::APP_NAME;
use crate::error::{GaError, GaResult};

/// Detected operating system platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    MacOs,
    Linux,
}

impl Platform {
    /// Detect the current platform at compile time.
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else {
            Platform::Linux
        }
    }

    /// Get the platform-specific application data directory.
    ///
    /// This is the storage "origin": every database the local store creates
    /// lives directly under it unless the config overrides the directory.
    ///
    /// - Windows: `%APPDATA%/GaChat`
    /// - macOS: `~/Library/Application Support/GaChat`
    /// - Linux: `~/.local/share/GaChat`
    pub fn data_dir() -> GaResult<PathBuf> {
        let base = dirs::data_dir()
            .ok_or_else(|| GaError::Config("could not determine data directory".into()))?;
        Ok(base.join(APP_NAME))
    }

    /// Get a human-readable platform name.
    pub fn name(&self) -> &'static str {
        match self {
            Platform::Windows => "Windows",
            Platform::MacOs => "macOS",
            Platform::Linux => "Linux",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_display() {
        let p = Platform::current();
        assert_eq!(p.to_string(), p.name());
    }

    #[test]
    fn test_data_dir_ends_with_app_name() {
        if let Ok(dir) = Platform::data_dir() {
            assert!(dir.ends_with("GaChat"));
        }
    }
}
