//! # Forcing Search
//!
//! Exact minimum seed sets for propagation processes, found by subset search.
//! None of these invariants touch the solver resolver.
//!
//! ## Rules
//!
//! - **k-forcing**: a filled vertex with between 1 and `k` unfilled neighbors
//!   fills all of them. Zero forcing is `k = 1`.
//! - **PSD forcing**: for each component of the unfilled subgraph, a filled
//!   vertex with exactly one unfilled neighbor in that component fills it.
//!
//! ## Search
//!
//! Seed sizes are tried in increasing order from a lower bound (`δ(G)` for
//! zero forcing) up to a greedy upper bound. Seeds of one size are enumerated
//! lexicographically; the closure of each seed's prefix was computed at the
//! previous size and is reused, because `cl(cl(P) ∪ {x}) = cl(P ∪ {x})` for a
//! monotone, idempotent closure.

use crate::graph::{Graph, GraphView};
use crate::orchestrator::{InvariantResult, Witness};
use crate::primitives::{MAX_MEMOIZED_CLOSURES, MAX_SUBSET_SEARCH_ORDER};
use crate::{GraphCalcError, Vertex};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use tracing::debug;

use super::require_positive;

// =============================================================================
// VERTEX MASKS
// =============================================================================

/// A set of vertex positions `0..n` packed into 64-bit words.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VertexMask(Vec<u64>);

impl VertexMask {
    #[must_use]
    pub fn empty(n: usize) -> Self {
        Self(vec![0; n.div_ceil(64)])
    }

    #[must_use]
    pub fn full(n: usize) -> Self {
        let mut mask = Self::empty(n);
        for i in 0..n {
            mask.insert(i);
        }
        mask
    }

    pub fn insert(&mut self, i: usize) -> bool {
        let (word, bit) = (i / 64, 1u64 << (i % 64));
        let fresh = self.0[word] & bit == 0;
        self.0[word] |= bit;
        fresh
    }

    #[must_use]
    pub fn contains(&self, i: usize) -> bool {
        self.0
            .get(i / 64)
            .is_some_and(|word| word & (1u64 << (i % 64)) != 0)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.iter().map(|w| w.count_ones() as usize).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|w| *w == 0)
    }

    pub fn union_with(&mut self, other: &VertexMask) {
        for (a, b) in self.0.iter_mut().zip(&other.0) {
            *a |= *b;
        }
    }

    /// Positions in increasing order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().enumerate().flat_map(|(w, word)| {
            (0..64).filter(move |b| word & (1u64 << b) != 0).map(move |b| w * 64 + b)
        })
    }
}

// =============================================================================
// INDEXED GRAPH
// =============================================================================

/// The graph re-labelled by position, with closed neighborhoods as masks.
#[derive(Debug, Clone)]
struct Indexed {
    labels: Vec<Vertex>,
    neighbors: Vec<Vec<usize>>,
    closed: Vec<VertexMask>,
}

impl Indexed {
    fn new(graph: &Graph) -> Result<Self, GraphCalcError> {
        let labels = graph.vertices();
        let position: BTreeMap<Vertex, usize> =
            labels.iter().enumerate().map(|(i, v)| (*v, i)).collect();
        let mut neighbors = Vec::with_capacity(labels.len());
        let mut closed = Vec::with_capacity(labels.len());
        for (i, v) in labels.iter().enumerate() {
            let adjacent: Vec<usize> = graph
                .neighbor_set(*v)?
                .iter()
                .filter_map(|u| position.get(u).copied())
                .collect();
            let mut mask = VertexMask::empty(labels.len());
            mask.insert(i);
            for &u in &adjacent {
                mask.insert(u);
            }
            neighbors.push(adjacent);
            closed.push(mask);
        }
        Ok(Self {
            labels,
            neighbors,
            closed,
        })
    }

    /// Index a graph small enough for exhaustive subset search.
    fn searchable(graph: &Graph) -> Result<Self, GraphCalcError> {
        if graph.order() > MAX_SUBSET_SEARCH_ORDER {
            return Err(GraphCalcError::InvalidParameter {
                name: "graph",
                reason: format!(
                    "order {} exceeds the subset search limit of {}",
                    graph.order(),
                    MAX_SUBSET_SEARCH_ORDER
                ),
            });
        }
        Self::new(graph)
    }

    fn order(&self) -> usize {
        self.labels.len()
    }

    fn to_vertices(&self, mask: &VertexMask) -> BTreeSet<Vertex> {
        mask.iter().map(|i| self.labels[i]).collect()
    }
}

// =============================================================================
// CLOSURES
// =============================================================================

/// A propagation rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForcingRule {
    /// Fill all unfilled neighbors when there are between 1 and `k` of them.
    KForcing(usize),
    /// Positive semidefinite forcing.
    Psd,
}

fn k_forcing_closure(ix: &Indexed, k: usize, mut filled: VertexMask) -> VertexMask {
    loop {
        let mut changed = false;
        for v in 0..ix.order() {
            if !filled.contains(v) {
                continue;
            }
            let unfilled: Vec<usize> = ix.neighbors[v]
                .iter()
                .copied()
                .filter(|u| !filled.contains(*u))
                .collect();
            if !unfilled.is_empty() && unfilled.len() <= k {
                for u in unfilled {
                    filled.insert(u);
                }
                changed = true;
            }
        }
        if !changed {
            return filled;
        }
    }
}

/// Component index of every unfilled vertex.
fn unfilled_components(ix: &Indexed, filled: &VertexMask) -> Vec<Option<usize>> {
    let mut component = vec![None; ix.order()];
    let mut next = 0;
    for start in 0..ix.order() {
        if filled.contains(start) || component[start].is_some() {
            continue;
        }
        component[start] = Some(next);
        let mut queue = VecDeque::from([start]);
        while let Some(v) = queue.pop_front() {
            for &u in &ix.neighbors[v] {
                if !filled.contains(u) && component[u].is_none() {
                    component[u] = Some(next);
                    queue.push_back(u);
                }
            }
        }
        next += 1;
    }
    component
}

fn psd_closure(ix: &Indexed, mut filled: VertexMask) -> VertexMask {
    loop {
        let component = unfilled_components(ix, &filled);
        let mut forced = Vec::new();
        for v in (0..ix.order()).filter(|v| filled.contains(*v)) {
            // component -> (unfilled neighbors in it, last one seen)
            let mut seen: BTreeMap<usize, (usize, usize)> = BTreeMap::new();
            for &u in &ix.neighbors[v] {
                if let Some(c) = component[u] {
                    let entry = seen.entry(c).or_insert((0, u));
                    entry.0 += 1;
                    entry.1 = u;
                }
            }
            forced.extend(seen.values().filter(|(count, _)| *count == 1).map(|(_, u)| *u));
        }
        let mut changed = false;
        for u in forced {
            changed |= filled.insert(u);
        }
        if !changed {
            return filled;
        }
    }
}

fn closure_of(ix: &Indexed, rule: ForcingRule, seed: VertexMask) -> VertexMask {
    match rule {
        ForcingRule::KForcing(k) => k_forcing_closure(ix, k, seed),
        ForcingRule::Psd => psd_closure(ix, seed),
    }
}

/// The set filled by `rule` starting from `seed`.
///
/// Fails with `VertexNotFound` if a seed vertex is not in the graph.
pub fn closure(
    graph: &Graph,
    rule: ForcingRule,
    seed: &BTreeSet<Vertex>,
) -> Result<BTreeSet<Vertex>, GraphCalcError> {
    if let ForcingRule::KForcing(k) = rule {
        require_positive("k", k)?;
    }
    let ix = Indexed::new(graph)?;
    let mut mask = VertexMask::empty(ix.order());
    for v in seed {
        let i = ix
            .labels
            .binary_search(v)
            .map_err(|_| GraphCalcError::VertexNotFound(*v))?;
        mask.insert(i);
    }
    Ok(ix.to_vertices(&closure_of(&ix, rule, mask)))
}

// =============================================================================
// SUBSET SEARCH
// =============================================================================

/// Lexicographic `size`-subsets of `0..n`.
struct Combinations {
    n: usize,
    current: Option<Vec<usize>>,
}

impl Combinations {
    fn new(n: usize, size: usize) -> Self {
        Self {
            n,
            current: (size <= n).then(|| (0..size).collect()),
        }
    }
}

impl Iterator for Combinations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        let current = self.current.take()?;
        let size = current.len();
        let mut following = current.clone();
        // Rightmost position that can still move right.
        let pivot = (0..size).rev().find(|&i| following[i] < self.n - size + i);
        if let Some(i) = pivot {
            following[i] += 1;
            for j in (i + 1)..size {
                following[j] = following[j - 1] + 1;
            }
            self.current = Some(following);
        }
        Some(current)
    }
}

/// How a seed is turned into the initially filled set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Seeding {
    Plain,
    ClosedNeighborhood,
}

/// Extra condition on the seed itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Admissible {
    Any,
    /// No seed vertex is isolated within the seed.
    Total,
    /// The seed induces a connected subgraph.
    Connected,
}

struct ForcingSearch<'a> {
    graph: &'a Graph,
    ix: Indexed,
    rule: ForcingRule,
    seeding: Seeding,
    admissible: Admissible,
}

impl<'a> ForcingSearch<'a> {
    fn new(
        graph: &'a Graph,
        rule: ForcingRule,
        seeding: Seeding,
        admissible: Admissible,
    ) -> Result<Self, GraphCalcError> {
        Ok(Self {
            graph,
            ix: Indexed::searchable(graph)?,
            rule,
            seeding,
            admissible,
        })
    }

    fn initial(&self, seed: &[usize]) -> VertexMask {
        let mut mask = VertexMask::empty(self.ix.order());
        for &i in seed {
            match self.seeding {
                Seeding::Plain => {
                    mask.insert(i);
                }
                Seeding::ClosedNeighborhood => mask.union_with(&self.ix.closed[i]),
            }
        }
        mask
    }

    fn is_admissible(&self, seed: &[usize]) -> bool {
        match self.admissible {
            Admissible::Any => true,
            Admissible::Total => seed
                .iter()
                .all(|v| self.ix.neighbors[*v].iter().any(|u| seed.contains(u))),
            Admissible::Connected => self
                .graph
                .induced_subgraph(seed.iter().map(|i| self.ix.labels[*i]))
                .is_connected(),
        }
    }

    /// Greedy seed: repeatedly add the vertex whose addition fills the most.
    fn greedy(&self) -> Vec<usize> {
        let n = self.ix.order();
        let mut seed = Vec::new();
        let mut filled = closure_of(&self.ix, self.rule, self.initial(&seed));
        while filled.len() < n {
            let mut best: Option<(usize, VertexMask)> = None;
            for v in (0..n).filter(|v| !seed.contains(v)) {
                let mut start = filled.clone();
                start.union_with(&self.initial(&[v]));
                let candidate = closure_of(&self.ix, self.rule, start);
                if best.as_ref().is_none_or(|(_, b)| candidate.len() > b.len()) {
                    best = Some((v, candidate));
                }
            }
            let Some((v, candidate)) = best else {
                break;
            };
            seed.push(v);
            filled = candidate;
        }
        seed.sort_unstable();
        seed
    }

    /// Smallest admissible seed that fills the graph, searching sizes `lower..`.
    fn run(&self, lower: usize) -> Option<Vec<usize>> {
        let n = self.ix.order();
        let full = VertexMask::full(n);

        let (upper, fallback) = if self.admissible == Admissible::Any {
            let greedy = self.greedy();
            (greedy.len(), Some(greedy))
        } else {
            (n, None)
        };
        let lower = lower.min(upper);
        debug!(n, lower, upper, rule = ?self.rule, "forcing search");

        let mut previous: BTreeMap<Vec<usize>, VertexMask> = BTreeMap::new();
        for size in lower..=upper {
            if Some(size) == fallback.as_ref().map(Vec::len) {
                // Every smaller size failed; the greedy seed is optimal.
                return fallback;
            }
            let mut current: BTreeMap<Vec<usize>, VertexMask> = BTreeMap::new();
            for seed in Combinations::new(n, size) {
                let filled = match seed.split_last() {
                    Some((&last, prefix)) => match previous.get(prefix) {
                        Some(prefix_closure) => {
                            let mut start = prefix_closure.clone();
                            start.union_with(&self.initial(&[last]));
                            closure_of(&self.ix, self.rule, start)
                        }
                        None => closure_of(&self.ix, self.rule, self.initial(&seed)),
                    },
                    None => closure_of(&self.ix, self.rule, self.initial(&seed)),
                };
                if filled == full && self.is_admissible(&seed) {
                    return Some(seed);
                }
                if current.len() < MAX_MEMOIZED_CLOSURES {
                    current.insert(seed, filled);
                }
            }
            previous = current;
        }
        fallback
    }

    fn result(&self, lower: usize) -> InvariantResult {
        match self.run(lower) {
            Some(seed) => InvariantResult::optimal(
                seed.len() as i64,
                Witness::VertexSet(seed.iter().map(|i| self.ix.labels[*i]).collect()),
            ),
            None => InvariantResult::infeasible(),
        }
    }
}

// =============================================================================
// INVARIANTS
// =============================================================================

fn forcing_lower_bound(graph: &Graph, k: usize) -> usize {
    if k == 1 {
        graph.minimum_degree()
    } else {
        1
    }
}

/// Minimum k-forcing set.
pub fn k_forcing(graph: &Graph, k: usize) -> Result<InvariantResult, GraphCalcError> {
    require_positive("k", k)?;
    let search = ForcingSearch::new(graph, ForcingRule::KForcing(k), Seeding::Plain, Admissible::Any)?;
    Ok(search.result(forcing_lower_bound(graph, k)))
}

/// Minimum zero forcing set.
pub fn zero_forcing(graph: &Graph) -> Result<InvariantResult, GraphCalcError> {
    k_forcing(graph, 1)
}

/// Minimum zero forcing set inducing no isolated vertex.
///
/// Infeasible when the graph has an isolated vertex.
pub fn total_zero_forcing(graph: &Graph) -> Result<InvariantResult, GraphCalcError> {
    let search =
        ForcingSearch::new(graph, ForcingRule::KForcing(1), Seeding::Plain, Admissible::Total)?;
    Ok(search.result(forcing_lower_bound(graph, 1).max(2)))
}

/// Minimum connected k-forcing set. Infeasible on disconnected graphs.
pub fn connected_k_forcing(graph: &Graph, k: usize) -> Result<InvariantResult, GraphCalcError> {
    require_positive("k", k)?;
    if !graph.is_connected() {
        return Ok(InvariantResult::infeasible());
    }
    let search = ForcingSearch::new(
        graph,
        ForcingRule::KForcing(k),
        Seeding::Plain,
        Admissible::Connected,
    )?;
    Ok(search.result(forcing_lower_bound(graph, k)))
}

/// Minimum connected zero forcing set.
pub fn connected_zero_forcing(graph: &Graph) -> Result<InvariantResult, GraphCalcError> {
    connected_k_forcing(graph, 1)
}

/// Minimum positive semidefinite zero forcing set.
pub fn psd_zero_forcing(graph: &Graph) -> Result<InvariantResult, GraphCalcError> {
    let search = ForcingSearch::new(graph, ForcingRule::Psd, Seeding::Plain, Admissible::Any)?;
    Ok(search.result(1))
}

/// Minimum k-power dominating set: `N[S]` k-forces the whole graph.
pub fn k_power_domination(graph: &Graph, k: usize) -> Result<InvariantResult, GraphCalcError> {
    require_positive("k", k)?;
    let search = ForcingSearch::new(
        graph,
        ForcingRule::KForcing(k),
        Seeding::ClosedNeighborhood,
        Admissible::Any,
    )?;
    Ok(search.result(1))
}

/// Minimum power dominating set.
pub fn power_domination(graph: &Graph) -> Result<InvariantResult, GraphCalcError> {
    k_power_domination(graph, 1)
}

/// Minimum dominating set whose complement induces a connected subgraph.
///
/// The whole vertex set always qualifies, since the empty graph is connected.
pub fn outer_connected_domination(graph: &Graph) -> Result<InvariantResult, GraphCalcError> {
    let ix = Indexed::searchable(graph)?;
    let n = ix.order();
    let full = VertexMask::full(n);
    for size in 0..=n {
        for seed in Combinations::new(n, size) {
            let mut dominated = VertexMask::empty(n);
            for &i in &seed {
                dominated.union_with(&ix.closed[i]);
            }
            if dominated != full {
                continue;
            }
            let outside = (0..n)
                .filter(|i| !seed.contains(i))
                .map(|i| ix.labels[i]);
            if graph.induced_subgraph(outside).is_connected() {
                return Ok(InvariantResult::optimal(
                    size as i64,
                    Witness::VertexSet(seed.iter().map(|i| ix.labels[*i]).collect()),
                ));
            }
        }
    }
    Ok(InvariantResult::infeasible())
}

// =============================================================================
// TESTS
// =============================================================================
