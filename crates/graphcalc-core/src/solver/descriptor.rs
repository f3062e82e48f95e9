//! # Solver Descriptors
//!
//! The per-call description of which backend to use and how to configure it.

use super::MilpBackend;
use crate::GraphCalcError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

// =============================================================================
// OPTIONS
// =============================================================================

/// A single backend option value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Int(i64),
    Bool(bool),
    Text(String),
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{}", v),
            Self::Bool(v) => write!(f, "{}", v),
            Self::Text(v) => write!(f, "{}", v),
        }
    }
}

impl From<i64> for OptionValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<bool> for OptionValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for OptionValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

/// Backend options, keyed by option name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SolverOptions(BTreeMap<String, OptionValue>);

impl SolverOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of `insert`.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<OptionValue>) {
        self.0.insert(key.into(), value.into());
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.0.get(key)
    }

    /// Read an integer option, failing if it is present with another type.
    pub fn get_int(&self, key: &str) -> Result<Option<i64>, GraphCalcError> {
        match self.0.get(key) {
            None => Ok(None),
            Some(OptionValue::Int(v)) => Ok(Some(*v)),
            Some(other) => Err(GraphCalcError::MalformedDescriptor(format!(
                "option '{}' must be an integer, got '{}'",
                key, other
            ))),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `self` with every entry of `over` written on top.
    #[must_use]
    pub fn overlay(&self, over: &SolverOptions) -> Self {
        let mut merged = self.clone();
        for (key, value) in &over.0 {
            merged.0.insert(key.clone(), value.clone());
        }
        merged
    }

    /// Stable text form used in cache keys.
    #[must_use]
    pub fn cache_key(&self) -> String {
        self.iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(",")
    }
}

// =============================================================================
// BACKEND CLASSES
// =============================================================================

/// The backend kinds the core knows how to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BackendClass {
    BranchAndBound,
    Cbc,
    Highs,
}

impl BackendClass {
    /// Auto-detection order.
    pub const ALL: [BackendClass; 3] = [Self::BranchAndBound, Self::Cbc, Self::Highs];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::BranchAndBound => "bnb",
            Self::Cbc => "cbc",
            Self::Highs => "highs",
        }
    }

    /// Executable looked up on the search path, if this is a command-line backend.
    #[must_use]
    pub const fn executable_name(self) -> Option<&'static str> {
        match self {
            Self::BranchAndBound => None,
            Self::Cbc => Some("cbc"),
            Self::Highs => Some("highs"),
        }
    }

    /// Map a name or alias to a class. Matching ignores case and surrounding space.
    pub fn from_name(name: &str) -> Result<Self, GraphCalcError> {
        let normalized = name.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "" => Err(GraphCalcError::MalformedDescriptor(
                "backend name is empty".to_string(),
            )),
            "bnb" | "branch_and_bound" | "builtin" => Ok(Self::BranchAndBound),
            "cbc" | "coin_cbc" | "pulp_cbc_cmd" => Ok(Self::Cbc),
            "highs" | "highs_cmd" => Ok(Self::Highs),
            _ => Err(GraphCalcError::UnknownBackend(name.to_string())),
        }
    }

    /// Infer the class from an executable's file name (`cbc*`, `highs*`).
    pub fn from_executable(path: &Path) -> Result<Self, GraphCalcError> {
        let stem = path
            .file_name()
            .map(|s| s.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        if stem.starts_with("cbc") {
            Ok(Self::Cbc)
        } else if stem.starts_with("highs") {
            Ok(Self::Highs)
        } else {
            Err(GraphCalcError::UnknownBackend(format!(
                "cannot infer backend from executable '{}'",
                path.display()
            )))
        }
    }
}

impl fmt::Display for BackendClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// DESCRIPTOR
// =============================================================================

type BuildFn = dyn Fn() -> Result<Arc<dyn MilpBackend>, GraphCalcError> + Send + Sync;

/// A zero-argument constructor for a ready-configured backend.
#[derive(Clone)]
pub struct BackendFactory(Arc<BuildFn>);

impl BackendFactory {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn MilpBackend>, GraphCalcError> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn build(&self) -> Result<Arc<dyn MilpBackend>, GraphCalcError> {
        (self.0)()
    }
}

impl fmt::Debug for BackendFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BackendFactory(..)")
    }
}

/// The caller's request for a backend.
#[derive(Debug, Clone, Default)]
pub enum SolverDescriptor {
    /// Defer to the environment and auto-detection.
    #[default]
    Absent,
    /// A backend name or alias.
    Name(String),
    /// A name plus options; per-call options are layered on top.
    NamedWithOptions { name: String, options: SolverOptions },
    /// A backend kind the core constructs.
    Class(BackendClass),
    /// A ready backend, used as-is.
    Instance(Arc<dyn MilpBackend>),
    /// A constructor invoked once per resolution.
    Factory(BackendFactory),
}

impl SolverDescriptor {
    #[must_use]
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    /// Cache key, or `None` for descriptors that must never be cached.
    #[must_use]
    pub fn cache_key(&self) -> Option<String> {
        match self {
            Self::Absent => Some("absent".to_string()),
            Self::Name(name) => Some(format!("name:{}", name.trim().to_ascii_lowercase())),
            Self::NamedWithOptions { name, options } => Some(format!(
                "named:{}:{}",
                name.trim().to_ascii_lowercase(),
                options.cache_key()
            )),
            Self::Class(class) => Some(format!("class:{}", class)),
            Self::Instance(_) | Self::Factory(_) => None,
        }
    }
}
