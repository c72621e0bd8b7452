//! Transcoder discovery.
//!
//! The orchestrator does not care where the transcoder lives; it asks a
//! [`BinaryLocator`] and hands whatever it gets to the extraction service.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

/// Finds a local transcoder executable.
pub trait BinaryLocator: Send + Sync {
    fn locate(&self) -> Option<PathBuf>;
}

/// Always returns the same path, or nothing.
#[derive(Debug, Clone, Default)]
pub struct FixedLocator(Option<PathBuf>);

impl FixedLocator {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(Some(path.into()))
    }

    pub fn none() -> Self {
        Self(None)
    }
}

impl BinaryLocator for FixedLocator {
    fn locate(&self) -> Option<PathBuf> {
        self.0.clone()
    }
}

/// Searches an explicit path, then a bundled directory, then `PATH`, then
/// a few well-known install directories.
#[derive(Debug, Clone)]
pub struct SystemLocator {
    program: String,
    explicit: Option<PathBuf>,
    bundled_dir: Option<PathBuf>,
    search_path: Option<std::ffi::OsString>,
    fallback_dirs: Vec<PathBuf>,
}

impl SystemLocator {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            explicit: None,
            bundled_dir: None,
            search_path: None,
            fallback_dirs: vec![
                PathBuf::from("/opt/homebrew/bin"),
                PathBuf::from("/usr/local/bin"),
                PathBuf::from("/usr/bin"),
            ],
        }
    }

    /// Locator for `ffmpeg`.
    pub fn ffmpeg() -> Self {
        Self::new("ffmpeg")
    }

    pub fn with_explicit(mut self, path: Option<PathBuf>) -> Self {
        self.explicit = path;
        self
    }

    pub fn with_bundled_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.bundled_dir = dir;
        self
    }

    /// Overrides the `PATH` value to search (defaults to the process environment).
    pub fn with_search_path(mut self, path: impl Into<std::ffi::OsString>) -> Self {
        self.search_path = Some(path.into());
        self
    }

    pub fn with_fallback_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
        self.fallback_dirs = dirs;
        self
    }

    fn executable_name(&self) -> String {
        if cfg!(windows) && !self.program.ends_with(".exe") {
            format!("{}.exe", self.program)
        } else {
            self.program.clone()
        }
    }

    fn in_dir(&self, dir: &Path) -> Option<PathBuf> {
        let candidate = dir.join(self.executable_name());
        is_executable(&candidate).then_some(candidate)
    }
}

impl BinaryLocator for SystemLocator {
    fn locate(&self) -> Option<PathBuf> {
        if let Some(path) = self.explicit.as_ref().filter(|p| is_executable(p)) {
            debug!(path = %path.display(), "using configured transcoder");
            return Some(path.clone());
        }

        if let Some(found) = self.bundled_dir.as_deref().and_then(|d| self.in_dir(d)) {
            info!(path = %found.display(), "found bundled transcoder");
            return Some(found);
        }

        let search_path = self
            .search_path
            .clone()
            .or_else(|| std::env::var_os("PATH"));
        if let Some(paths) = search_path {
            if let Some(found) = std::env::split_paths(&paths).find_map(|d| self.in_dir(&d)) {
                info!(path = %found.display(), "found transcoder on PATH");
                return Some(found);
            }
        }

        let found = self.fallback_dirs.iter().find_map(|d| self.in_dir(d));
        if found.is_none() {
            debug!(program = %self.program, "transcoder not found");
        }
        found
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
