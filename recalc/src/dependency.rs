//! The dependency graph between grid cells.
//!
//! Nodes are coordinates; a forward edge `a -> b` means "a's formula
//! reads b". A graph instance is a single immutable snapshot: producing
//! a new instance is the only transition. The reverse index (who
//! depends on me) is derived data, built at most once per instance on
//! the first backward query and then shared by every reader of that
//! instance.

use crate::storage::{Coordinate, CoordinateSet};

use im::HashMap;
use std::collections::HashSet;
use std::sync::{Arc, OnceLock};

type BackwardsIndex = HashMap<Coordinate, CoordinateSet>;

#[derive(Clone, Debug, Default)]
pub struct DependencyGraph {
    forwards: HashMap<Coordinate, CoordinateSet>,
    // Write-once per instance. Guarded by OnceLock so concurrent first
    // readers never observe a partially-built index.
    backwards: Arc<OnceLock<BackwardsIndex>>,
}

impl PartialEq for DependencyGraph {
    fn eq(&self, other: &Self) -> bool {
        self.forwards == other.forwards
    }
}

impl Eq for DependencyGraph {}

impl DependencyGraph {
    fn with_forwards(forwards: HashMap<Coordinate, CoordinateSet>) -> DependencyGraph {
        DependencyGraph {
            forwards,
            backwards: Arc::new(OnceLock::new()),
        }
    }

    /// Builds a graph from `(node, dependencies)` pairs. A later pair
    /// for the same node overwrites an earlier one, and a pair with an
    /// empty set erases the node's entry: nodes without outgoing edges
    /// are never stored explicitly.
    pub fn from(pairs: impl IntoIterator<Item = (Coordinate, CoordinateSet)>) -> DependencyGraph {
        let mut forwards = HashMap::new();
        for (node, dependencies) in pairs {
            if dependencies.is_empty() {
                forwards.remove(&node);
            } else {
                forwards.insert(node, dependencies);
            }
        }

        DependencyGraph::with_forwards(forwards)
    }

    /// Returns a new graph with the node's dependency set replaced. An
    /// empty set removes the entry entirely. The new instance starts
    /// with a fresh (unbuilt) reverse index.
    pub fn set(&self, node: Coordinate, dependencies: CoordinateSet) -> DependencyGraph {
        let mut forwards = self.forwards.clone();
        if dependencies.is_empty() {
            forwards.remove(&node);
        } else {
            forwards.insert(node, dependencies);
        }

        DependencyGraph::with_forwards(forwards)
    }

    /// The node's forward dependency set. A node without an entry
    /// yields the canonical empty set, never an error.
    pub fn get(&self, node: &Coordinate) -> CoordinateSet {
        self.forwards.get(node).cloned().unwrap_or_default()
    }

    /// All nodes whose forward set contains `node`. The first call pays
    /// the O(edges) index build; subsequent calls are lookups.
    pub fn get_backwards(&self, node: &Coordinate) -> CoordinateSet {
        self.backwards_index()
            .get(node)
            .cloned()
            .unwrap_or_default()
    }

    fn backwards_index(&self) -> &BackwardsIndex {
        self.backwards.get_or_init(|| {
            let mut index: BackwardsIndex = HashMap::new();
            for (node, dependencies) in &self.forwards {
                for dependency in dependencies {
                    let dependents = index.get(dependency).cloned().unwrap_or_default();
                    index.insert(*dependency, dependents.add(*node));
                }
            }

            index
        })
    }

    /// The transitive closure of "depends on `node`, directly or
    /// indirectly". The explicit visited guard makes this terminate on
    /// convergent paths as well as cycles.
    pub fn get_backwards_recursive(&self, node: &Coordinate) -> CoordinateSet {
        let mut result = CoordinateSet::new();
        let mut frontier: Vec<Coordinate> = self.get_backwards(node).iter().copied().collect();

        while let Some(current) = frontier.pop() {
            if result.has(&current) {
                continue;
            }
            result = result.add(current);

            for dependent in &self.get_backwards(&current) {
                if !result.has(dependent) {
                    frontier.push(*dependent);
                }
            }
        }

        result
    }

    /// Whether following forward edges from `start` reaches a cycle.
    ///
    /// Tracking is path-local: a node is only reported as circular when
    /// it is re-entered while still on the current DFS path, so a
    /// diamond-shaped convergence (two non-cyclic paths meeting at the
    /// same node) is not a cycle.
    pub fn has_circular_dependency(&self, start: &Coordinate) -> bool {
        enum Step {
            Enter(Coordinate),
            Exit(Coordinate),
        }

        let mut on_path: HashSet<Coordinate> = HashSet::new();
        let mut finished: HashSet<Coordinate> = HashSet::new();
        let mut stack = vec![Step::Enter(*start)];

        while let Some(step) = stack.pop() {
            match step {
                Step::Enter(node) => {
                    if finished.contains(&node) {
                        continue;
                    }
                    if !on_path.insert(node) {
                        // Re-entered a node still on the current path.
                        return true;
                    }

                    stack.push(Step::Exit(node));
                    for dependency in &self.get(&node) {
                        if !finished.contains(dependency) {
                            stack.push(Step::Enter(*dependency));
                        }
                    }
                }
                Step::Exit(node) => {
                    on_path.remove(&node);
                    finished.insert(node);
                }
            }
        }

        false
    }

    /// Iterates every node the edges imply: each explicit forward
    /// entry, and each coordinate that only ever appears as a
    /// dependency target (yielded with the empty set).
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            forwards: &self.forwards,
            outer: self.forwards.iter(),
            targets: None,
            yielded_targets: HashSet::new(),
        }
    }

    /// The nodes in dependency order, leaves first: a node is yielded
    /// only after all of its forward dependencies have been yielded.
    /// Nodes on a pure cycle never satisfy that and are never yielded.
    pub fn traverse_bfs_backwards(&self) -> TraverseBfsBackwards<'_> {
        let mut queue = Vec::new();
        let mut visited = HashSet::new();

        for (node, dependencies) in self.iter() {
            if dependencies.is_empty() {
                visited.insert(node);
                queue.push(node);
            }
        }

        TraverseBfsBackwards {
            graph: self,
            queue,
            visited,
            next_index: 0,
        }
    }
}

impl<'a> IntoIterator for &'a DependencyGraph {
    type Item = (Coordinate, CoordinateSet);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct Iter<'a> {
    forwards: &'a HashMap<Coordinate, CoordinateSet>,
    outer: im::hashmap::Iter<'a, Coordinate, CoordinateSet>,
    targets: Option<im::hashset::Iter<'a, Coordinate>>,
    yielded_targets: HashSet<Coordinate>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (Coordinate, CoordinateSet);

    fn next(&mut self) -> Option<Self::Item> {
        // Drain the previous entry's dependency-only targets before
        // moving to the next explicit entry.
        while let Some(target) = self.targets.as_mut().and_then(Iterator::next) {
            if !self.forwards.contains_key(target) && self.yielded_targets.insert(*target) {
                return Some((*target, CoordinateSet::new()));
            }
        }

        let (node, dependencies) = self.outer.next()?;
        self.targets = Some(dependencies.iter());
        Some((*node, dependencies.clone()))
    }
}

/// Lazy leaves-first topological traversal (Kahn's algorithm seeded
/// from nodes with no forward dependencies, expanded along reverse
/// edges). The queue is index-based for O(1) dequeue.
pub struct TraverseBfsBackwards<'a> {
    graph: &'a DependencyGraph,
    queue: Vec<Coordinate>,
    visited: HashSet<Coordinate>,
    next_index: usize,
}

impl Iterator for TraverseBfsBackwards<'_> {
    type Item = Coordinate;

    fn next(&mut self) -> Option<Coordinate> {
        if self.next_index >= self.queue.len() {
            return None;
        }

        let node = self.queue[self.next_index];
        self.next_index += 1;

        for dependent in &self.graph.get_backwards(&node) {
            if self.visited.contains(dependent) {
                continue;
            }

            // Admit a dependent only once every one of its own
            // dependencies has already been visited.
            let dependencies = self.graph.get(dependent);
            if dependencies.iter().all(|dep| self.visited.contains(dep)) {
                self.visited.insert(*dependent);
                self.queue.push(*dependent);
            }
        }

        Some(node)
    }
}
