//! # Solver Environment
//!
//! A snapshot of the process environment relevant to backend selection.
//! Captured once per call context so resolution never reads the environment
//! twice with different results.

use crate::primitives::{SOLVER_ENV_VAR, SOLVER_PATH_ENV_VAR};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SolverEnvironment {
    preferred: Option<String>,
    forced_path: Option<PathBuf>,
    search_path: Vec<PathBuf>,
}

impl SolverEnvironment {
    /// An empty snapshot: no preference, no forced path, nothing on the search path.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `GRAPHCALC_SOLVER`, `GRAPHCALC_SOLVER_PATH` and `PATH`.
    ///
    /// Empty values count as unset.
    #[must_use]
    pub fn capture() -> Self {
        let preferred = std::env::var(SOLVER_ENV_VAR)
            .ok()
            .filter(|v| !v.trim().is_empty());
        let forced_path = std::env::var_os(SOLVER_PATH_ENV_VAR)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        let search_path = std::env::var_os("PATH")
            .map(|p| split_search_path(&p))
            .unwrap_or_default();
        Self {
            preferred,
            forced_path,
            search_path,
        }
    }

    #[must_use]
    pub fn with_preferred(mut self, name: impl Into<String>) -> Self {
        self.preferred = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_forced_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.forced_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_search_path<I, P>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.search_path = dirs.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn preferred(&self) -> Option<&str> {
        self.preferred.as_deref()
    }

    #[must_use]
    pub fn forced_path(&self) -> Option<&Path> {
        self.forced_path.as_deref()
    }

    #[must_use]
    pub fn search_path(&self) -> &[PathBuf] {
        &self.search_path
    }

    /// First `dir/name` on the search path that is a file.
    #[must_use]
    pub fn find_executable(&self, name: &str) -> Option<PathBuf> {
        let file_name = format!("{}{}", name, std::env::consts::EXE_SUFFIX);
        self.search_path
            .iter()
            .map(|dir| dir.join(&file_name))
            .find(|candidate| candidate.is_file())
    }

    /// Stable text form used in cache keys.
    #[must_use]
    pub fn cache_key(&self) -> String {
        format!(
            "preferred={};forced={};path={}",
            self.preferred.as_deref().unwrap_or(""),
            self.forced_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            self.search_path
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(":")
        )
    }
}

fn split_search_path(value: &OsString) -> Vec<PathBuf> {
    std::env::split_paths(value)
        .filter(|p| !p.as_os_str().is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_set_fields() {
        let env = SolverEnvironment::new()
            .with_preferred("cbc")
            .with_forced_path("/opt/cbc")
            .with_search_path(["/usr/bin", "/bin"]);
        assert_eq!(env.preferred(), Some("cbc"));
        assert_eq!(env.forced_path(), Some(Path::new("/opt/cbc")));
        assert_eq!(env.search_path().len(), 2);
    }

    #[test]
    fn find_executable_scans_in_order() {
        let first = tempfile::tempdir().expect("tempdir");
        let second = tempfile::tempdir().expect("tempdir");
        let name = format!("highs{}", std::env::consts::EXE_SUFFIX);
        std::fs::write(second.path().join(&name), b"").expect("write");

        let env = SolverEnvironment::new().with_search_path([first.path(), second.path()]);
        assert_eq!(env.find_executable("highs"), Some(second.path().join(&name)));
        assert_eq!(env.find_executable("cbc"), None);
    }

    #[test]
    fn cache_key_distinguishes_snapshots() {
        let a = SolverEnvironment::new().with_preferred("cbc");
        let b = SolverEnvironment::new().with_preferred("highs");
        assert_ne!(a.cache_key(), b.cache_key());
    }
}
