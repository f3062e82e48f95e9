//! # Engine Primitives
//!
//! Fixed constants shared by the resolver, the backends and the searches.
//! They are compiled in and never change at runtime.

/// Maximum distance between a backend-reported value and the nearest integer.
///
/// Objective and variable values further than this from an integer fail the
/// solve with `RoundingOutOfTolerance`.
pub const ROUNDING_TOLERANCE: f64 = 1e-6;

/// Number of branch-and-bound nodes between two time-limit checks.
pub const CHECK_INTERVAL: u64 = 10_000;

/// Environment variable naming a forced backend.
pub const SOLVER_ENV_VAR: &str = "GRAPHCALC_SOLVER";

/// Environment variable naming a forced solver executable.
pub const SOLVER_PATH_ENV_VAR: &str = "GRAPHCALC_SOLVER_PATH";

/// Executables probed on the search path during auto-detection, in order.
pub const PATH_SCAN_ORDER: [&str; 2] = ["cbc", "highs"];

// =============================================================================
// SEARCH LIMITS
// =============================================================================

/// Largest graph order accepted by the exhaustive subset searches.
///
/// Forcing and outer-connected domination enumerate vertex subsets; beyond
/// this order the call is rejected before any work is done.
pub const MAX_SUBSET_SEARCH_ORDER: usize = 64;

/// Maximum number of memoized prefix closures kept per seed size.
///
/// Past this many entries the search recomputes closures from scratch.
pub const MAX_MEMOIZED_CLOSURES: usize = 1 << 18;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_scan_order_is_cbc_then_highs() {
        assert_eq!(PATH_SCAN_ORDER, ["cbc", "highs"]);
    }

    #[test]
    fn check_interval_is_positive() {
        assert!(CHECK_INTERVAL > 0);
    }
}
