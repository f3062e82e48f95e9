//! # Solver Resolver
//!
//! Turns a descriptor, per-call options and an environment snapshot into a
//! concrete `SolverSpec`.
//!
//! ## Precedence
//!
//! 1. Explicit descriptor
//! 2. Forced backend name (`GRAPHCALC_SOLVER`)
//! 3. Forced executable path (`GRAPHCALC_SOLVER_PATH`), kind inferred from the file name
//! 4. Auto-detection: in-process first, then `cbc`, `highs` on the search path
//!
//! A backend that was asked for by name and is not usable is an error. The
//! resolver never falls back to a different backend.

use super::bnb::BranchAndBound;
use super::cli::CommandLineBackend;
use super::descriptor::{BackendClass, SolverDescriptor, SolverOptions};
use super::environment::SolverEnvironment;
use super::{BackendLocation, BackendSolution, MilpBackend, RunOptions};
use crate::GraphCalcError;
use crate::model::IlpModel;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

// =============================================================================
// SOLVER SPEC
// =============================================================================

#[derive(Debug)]
struct SpecInner {
    name: String,
    location: BackendLocation,
    options: SolverOptions,
    backend: Arc<dyn MilpBackend>,
}

/// A resolved, ready-to-use backend. Cloning shares the same backend.
#[derive(Debug, Clone)]
pub struct SolverSpec(Arc<SpecInner>);

impl SolverSpec {
    /// Wrap a backend together with the options it was configured with.
    pub fn new(backend: Arc<dyn MilpBackend>, options: SolverOptions) -> Self {
        Self(Arc::new(SpecInner {
            name: backend.name().to_string(),
            location: backend.location(),
            options,
            backend,
        }))
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.0.name
    }

    #[must_use]
    pub fn location(&self) -> &BackendLocation {
        &self.0.location
    }

    #[must_use]
    pub fn options(&self) -> &SolverOptions {
        &self.0.options
    }

    #[must_use]
    pub fn backend(&self) -> &Arc<dyn MilpBackend> {
        &self.0.backend
    }

    /// Whether two specs share the same backend handle.
    #[must_use]
    pub fn same_backend(&self, other: &SolverSpec) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn solve(
        &self,
        model: &IlpModel,
        run: &RunOptions,
    ) -> Result<BackendSolution, GraphCalcError> {
        self.0.backend.solve(model, run)
    }
}

impl fmt::Display for SolverSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.location())
    }
}

// =============================================================================
// CONSTRUCTION
// =============================================================================

/// Locate the executable for a command-line class.
///
/// The forced path wins when set, but only if its file name names the same
/// class; otherwise the search path is scanned.
fn locate(class: BackendClass, env: &SolverEnvironment) -> Result<PathBuf, String> {
    let Some(executable) = class.executable_name() else {
        return Err(format!("{} has no executable", class));
    };
    if let Some(forced) = env.forced_path() {
        match BackendClass::from_executable(forced) {
            Ok(inferred) if inferred == class => {}
            Ok(inferred) => {
                return Err(format!(
                    "forced path '{}' is a {} executable, not {}",
                    forced.display(),
                    inferred,
                    class
                ));
            }
            Err(_) => {
                return Err(format!(
                    "cannot tell which backend forced path '{}' is",
                    forced.display()
                ));
            }
        }
        return if forced.is_file() {
            Ok(forced.to_path_buf())
        } else {
            Err(format!("forced path '{}' is not a file", forced.display()))
        };
    }
    env.find_executable(executable)
        .ok_or_else(|| format!("'{}' not found on the search path", executable))
}

/// Check whether `class` can be constructed in `env`, returning its location.
fn probe(class: BackendClass, env: &SolverEnvironment) -> Result<BackendLocation, String> {
    match class {
        BackendClass::BranchAndBound => Ok(BackendLocation::InProcess),
        BackendClass::Cbc | BackendClass::Highs => {
            locate(class, env).map(BackendLocation::Executable)
        }
    }
}

fn instantiate(
    class: BackendClass,
    options: &SolverOptions,
    env: &SolverEnvironment,
) -> Result<SolverSpec, GraphCalcError> {
    let backend: Arc<dyn MilpBackend> = match class {
        BackendClass::BranchAndBound => Arc::new(BranchAndBound::from_options(options)?),
        BackendClass::Cbc | BackendClass::Highs => {
            let executable =
                locate(class, env).map_err(|reason| GraphCalcError::BackendUnavailable {
                    name: class.name().to_string(),
                    reason,
                })?;
            Arc::new(CommandLineBackend::new(class, executable, options.clone())?)
        }
    };
    Ok(SolverSpec::new(backend, options.clone()))
}

fn log_ignored_options(kind: &str, options: &SolverOptions) {
    if !options.is_empty() {
        debug!(
            descriptor = kind,
            options = %options.cache_key(),
            "options ignored for ready backend"
        );
    }
}

// =============================================================================
// RESOLUTION
// =============================================================================

/// Resolve a descriptor into a `SolverSpec`.
pub fn resolve(
    descriptor: &SolverDescriptor,
    options: &SolverOptions,
    env: &SolverEnvironment,
) -> Result<SolverSpec, GraphCalcError> {
    let spec = match descriptor {
        SolverDescriptor::Name(name) => {
            debug!(name = %name, "resolving named backend");
            instantiate(BackendClass::from_name(name)?, options, env)?
        }
        SolverDescriptor::NamedWithOptions {
            name,
            options: named,
        } => {
            debug!(name = %name, "resolving named backend with options");
            instantiate(BackendClass::from_name(name)?, &named.overlay(options), env)?
        }
        SolverDescriptor::Class(class) => instantiate(*class, options, env)?,
        SolverDescriptor::Instance(backend) => {
            log_ignored_options("instance", options);
            SolverSpec::new(Arc::clone(backend), SolverOptions::new())
        }
        SolverDescriptor::Factory(factory) => {
            log_ignored_options("factory", options);
            SolverSpec::new(factory.build()?, SolverOptions::new())
        }
        SolverDescriptor::Absent => resolve_from_environment(options, env)?,
    };
    info!(backend = %spec, "solver resolved");
    Ok(spec)
}

fn resolve_from_environment(
    options: &SolverOptions,
    env: &SolverEnvironment,
) -> Result<SolverSpec, GraphCalcError> {
    if let Some(name) = env.preferred() {
        debug!(name, "using forced backend name");
        return instantiate(BackendClass::from_name(name)?, options, env);
    }
    if let Some(path) = env.forced_path() {
        debug!(path = %path.display(), "inferring backend from forced path");
        return instantiate(BackendClass::from_executable(path)?, options, env);
    }

    for class in BackendClass::ALL {
        match probe(class, env) {
            Ok(location) => {
                debug!(backend = class.name(), %location, "auto-detected backend");
                return instantiate(class, options, env);
            }
            Err(reason) => debug!(backend = class.name(), reason = %reason, "backend not detected"),
        }
    }
    Err(GraphCalcError::BackendUnavailable {
        name: "auto".to_string(),
        reason: "no backend detected".to_string(),
    })
}

// =============================================================================
// DIAGNOSTICS
// =============================================================================

/// Outcome of probing one candidate backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateProbe {
    pub name: &'static str,
    pub result: Result<BackendLocation, String>,
}

/// What resolution would do in a given environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverReport {
    pub preferred: Option<String>,
    pub forced_path: Option<PathBuf>,
    pub candidates: Vec<CandidateProbe>,
    /// `name (location)` of the selection, or the selection error.
    pub selection: Result<String, String>,
}

/// Probe every known backend and report the auto-detected selection.
///
/// Pure introspection: nothing is cached and no model is solved.
#[must_use]
pub fn diagnose(env: &SolverEnvironment) -> SolverReport {
    let candidates = BackendClass::ALL
        .iter()
        .map(|class| CandidateProbe {
            name: class.name(),
            result: probe(*class, env),
        })
        .collect();
    let selection = resolve(&SolverDescriptor::Absent, &SolverOptions::new(), env)
        .map(|spec| spec.to_string())
        .map_err(|e| e.to_string());
    SolverReport {
        preferred: env.preferred().map(str::to_string),
        forced_path: env.forced_path().map(|p| p.to_path_buf()),
        candidates,
        selection,
    }
}

impl fmt::Display for SolverReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "preferred backend: {}",
            self.preferred.as_deref().unwrap_or("(none)")
        )?;
        writeln!(
            f,
            "forced executable: {}",
            self.forced_path
                .as_ref()
                .map_or_else(|| "(none)".to_string(), |p| p.display().to_string())
        )?;
        writeln!(f, "candidates:")?;
        for candidate in &self.candidates {
            match &candidate.result {
                Ok(location) => writeln!(f, "  {:<6} available ({})", candidate.name, location)?,
                Err(reason) => writeln!(f, "  {:<6} unavailable: {}", candidate.name, reason)?,
            }
        }
        match &self.selection {
            Ok(selected) => write!(f, "selected: {}", selected),
            Err(error) => write!(f, "selection failed: {}", error),
        }
    }
}

// =============================================================================
// CACHE
// =============================================================================

/// Caller-owned memo of resolved specs.
///
/// Keyed by (descriptor, options, environment snapshot). `Instance` and
/// `Factory` descriptors bypass it. Entries live until `invalidate`.
#[derive(Debug, Default)]
pub struct SolverCache {
    entries: Mutex<BTreeMap<String, SolverSpec>>,
}

impl SolverCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, SolverSpec>> {
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Return the cached spec for this key, resolving and storing it on a miss.
    pub fn resolve(
        &self,
        descriptor: &SolverDescriptor,
        options: &SolverOptions,
        env: &SolverEnvironment,
    ) -> Result<SolverSpec, GraphCalcError> {
        let Some(descriptor_key) = descriptor.cache_key() else {
            return resolve(descriptor, options, env);
        };
        let key = format!(
            "{}|{}|{}",
            descriptor_key,
            options.cache_key(),
            env.cache_key()
        );
        if let Some(spec) = self.entries().get(&key) {
            return Ok(spec.clone());
        }
        let spec = resolve(descriptor, options, env)?;
        self.entries().insert(key, spec.clone());
        Ok(spec)
    }

    pub fn invalidate(&self) {
        self.entries().clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::descriptor::BackendFactory;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fake_executable(dir: &std::path::Path, name: &str) -> PathBuf {
        let path = dir.join(format!("{}{}", name, std::env::consts::EXE_SUFFIX));
        std::fs::write(&path, b"").expect("write");
        path
    }

    #[test]
    fn auto_detection_prefers_in_process() {
        let dir = tempfile::tempdir().expect("tempdir");
        fake_executable(dir.path(), "cbc");
        let env = SolverEnvironment::new().with_search_path([dir.path()]);

        let spec = resolve(&SolverDescriptor::Absent, &SolverOptions::new(), &env).expect("spec");
        assert_eq!(spec.name(), "bnb");
        assert_eq!(spec.location(), &BackendLocation::InProcess);
    }

    #[test]
    fn explicit_name_found_on_search_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cbc = fake_executable(dir.path(), "cbc");
        let env = SolverEnvironment::new().with_search_path([dir.path()]);

        let spec = resolve(&SolverDescriptor::name("coin_cbc"), &SolverOptions::new(), &env)
            .expect("spec");
        assert_eq!(spec.name(), "cbc");
        assert_eq!(spec.location(), &BackendLocation::Executable(cbc));
    }

    #[test]
    fn explicit_name_unavailable_is_an_error() {
        let env = SolverEnvironment::new();
        let result = resolve(&SolverDescriptor::name("highs"), &SolverOptions::new(), &env);
        assert!(matches!(
            result,
            Err(GraphCalcError::BackendUnavailable { ref name, .. }) if name == "highs"
        ));
    }

    #[test]
    fn unknown_name_fails_at_resolution() {
        let env = SolverEnvironment::new();
        let result = resolve(&SolverDescriptor::name("gurobi"), &SolverOptions::new(), &env);
        assert!(matches!(result, Err(GraphCalcError::UnknownBackend(_))));
    }

    #[test]
    fn descriptor_beats_environment() {
        let env = SolverEnvironment::new().with_preferred("cbc");
        let spec = resolve(&SolverDescriptor::name("bnb"), &SolverOptions::new(), &env)
            .expect("spec");
        assert_eq!(spec.name(), "bnb");

        let forced = resolve(&SolverDescriptor::Absent, &SolverOptions::new(), &env);
        assert!(matches!(
            forced,
            Err(GraphCalcError::BackendUnavailable { .. })
        ));
    }

    #[test]
    fn forced_path_infers_backend() {
        let dir = tempfile::tempdir().expect("tempdir");
        let highs = fake_executable(dir.path(), "highs");
        let env = SolverEnvironment::new().with_forced_path(&highs);
        let spec = resolve(&SolverDescriptor::Absent, &SolverOptions::new(), &env).expect("spec");
        assert_eq!(spec.name(), "highs");
        assert_eq!(spec.location(), &BackendLocation::Executable(highs));

        let glpk = fake_executable(dir.path(), "glpsol");
        let env = SolverEnvironment::new().with_forced_path(glpk);
        let result = resolve(&SolverDescriptor::Absent, &SolverOptions::new(), &env);
        assert!(matches!(result, Err(GraphCalcError::UnknownBackend(_))));
    }

    #[test]
    fn forced_path_used_by_named_command_line_backend() {
        let dir = tempfile::tempdir().expect("tempdir");
        let custom = fake_executable(dir.path(), "cbc-custom");
        let env = SolverEnvironment::new().with_forced_path(&custom);
        let spec = resolve(&SolverDescriptor::name("cbc"), &SolverOptions::new(), &env)
            .expect("spec");
        assert_eq!(spec.location(), &BackendLocation::Executable(custom));
    }

    #[test]
    fn forced_path_of_another_backend_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let highs = fake_executable(dir.path(), "highs");
        fake_executable(dir.path(), "cbc");
        let env = SolverEnvironment::new()
            .with_forced_path(&highs)
            .with_search_path([dir.path()]);
        let result = resolve(&SolverDescriptor::name("cbc"), &SolverOptions::new(), &env);
        assert!(matches!(
            result,
            Err(GraphCalcError::BackendUnavailable { ref name, ref reason })
                if name == "cbc" && reason.contains("highs")
        ));

        let opaque = fake_executable(dir.path(), "solver-wrapper");
        let env = SolverEnvironment::new().with_forced_path(&opaque);
        let result = resolve(&SolverDescriptor::name("highs"), &SolverOptions::new(), &env);
        assert!(matches!(
            result,
            Err(GraphCalcError::BackendUnavailable { ref reason, .. }) if reason.contains("cannot tell")
        ));
    }

    #[test]
    fn named_options_are_overlaid() {
        let env = SolverEnvironment::new();
        let descriptor = SolverDescriptor::NamedWithOptions {
            name: "bnb".to_string(),
            options: SolverOptions::new().with("node_limit", 5),
        };
        let spec = resolve(
            &descriptor,
            &SolverOptions::new().with("node_limit", 9),
            &env,
        )
        .expect("spec");
        assert_eq!(
            spec.options().get_int("node_limit").expect("int"),
            Some(9)
        );
    }

    #[test]
    fn instance_ignores_options() {
        let backend: Arc<dyn MilpBackend> = Arc::new(BranchAndBound::new());
        let spec = resolve(
            &SolverDescriptor::Instance(backend),
            &SolverOptions::new().with("anything", true),
            &SolverEnvironment::new(),
        )
        .expect("spec");
        assert!(spec.options().is_empty());
    }

    #[test]
    fn cache_returns_same_spec_and_bypasses_factories() {
        let cache = SolverCache::new();
        let env = SolverEnvironment::new();
        let options = SolverOptions::new();

        let a = cache
            .resolve(&SolverDescriptor::Absent, &options, &env)
            .expect("spec");
        let b = cache
            .resolve(&SolverDescriptor::Absent, &options, &env)
            .expect("spec");
        assert!(a.same_backend(&b));
        assert_eq!(cache.len(), 1);

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let factory = BackendFactory::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(BranchAndBound::new()) as Arc<dyn MilpBackend>)
        });
        let descriptor = SolverDescriptor::Factory(factory);
        cache.resolve(&descriptor, &options, &env).expect("spec");
        cache.resolve(&descriptor, &options, &env).expect("spec");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 1);

        cache.invalidate();
        assert!(cache.is_empty());
    }

    #[test]
    fn report_lists_candidates_in_order() {
        let env = SolverEnvironment::new();
        let report = diagnose(&env);
        let names: Vec<_> = report.candidates.iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["bnb", "cbc", "highs"]);
        assert_eq!(report.selection, Ok("bnb (in-process)".to_string()));

        let text = report.to_string();
        assert!(text.starts_with("preferred backend: (none)\n"));
        assert!(text.contains("  cbc    unavailable: 'cbc' not found on the search path"));
        assert!(text.ends_with("selected: bnb (in-process)"));
    }

    #[test]
    fn report_shows_selection_error() {
        let env = SolverEnvironment::new().with_preferred("nonsense");
        let report = diagnose(&env);
        assert_eq!(report.preferred.as_deref(), Some("nonsense"));
        assert!(report.selection.is_err());
    }
}
