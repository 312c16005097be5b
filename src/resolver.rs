//! Topological ordering of package dependencies.
//!
//! [`DepResolver`] collects `(dependent, dependency)` edges over integer
//! vertices and produces an order in which every dependency appears before
//! the packages that need it, or reports a cycle. Vertices are plain indices
//! so callers can map them onto whatever records they track.

use indexmap::IndexMap;

use crate::error::{PortsToolkitError, Result};

/// Dependency resolver over integer vertices.
///
/// Edges are accumulated with [`DepResolver::add_dependency`] and evaluated
/// once with [`DepResolver::resolve`]. Duplicate edges are tolerated; a
/// self-edge registers a vertex without introducing a real predecessor,
/// which is how callers add packages that depend on nothing.
#[derive(Debug, Default)]
pub struct DepResolver {
    /// Recorded `(dependent, dependency)` pairs in call order.
    edges: Vec<(usize, usize)>,
}

impl DepResolver {
    /// Create an empty resolver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// What: Record that `dependent` depends on `dependency`.
    ///
    /// Inputs:
    /// - `dependent`: Vertex that needs the other one first.
    /// - `dependency`: Vertex that must be ordered earlier.
    ///
    /// Details:
    /// - Passing the same vertex for both sides registers it in the vertex
    ///   set without adding an edge.
    /// - Duplicate calls are harmless; they add parallel edges that cancel
    ///   out during resolution.
    pub fn add_dependency(&mut self, dependent: usize, dependency: usize) {
        self.edges.push((dependent, dependency));
    }

    /// What: Compute an install order for the recorded edges.
    ///
    /// Output:
    /// - Returns `Ok(order)` where `order` is a permutation of every
    ///   registered vertex and each dependency precedes its dependents.
    /// - Returns `Err(PortsToolkitError::CyclicDependencies)` when at least
    ///   one cycle prevents a complete ordering.
    ///
    /// Details:
    /// - Kahn's algorithm. Vertices enter the order in first-registration
    ///   order whenever several are ready at once, which keeps the result
    ///   reproducible across runs.
    ///
    /// # Errors
    ///
    /// Fails only on cyclic dependencies.
    ///
    /// # Example
    ///
    /// ```
    /// use ports_toolkit::resolver::DepResolver;
    ///
    /// let mut resolver = DepResolver::new();
    /// resolver.add_dependency(1, 2);
    /// resolver.add_dependency(1, 3);
    /// resolver.add_dependency(2, 3);
    /// assert_eq!(resolver.resolve().unwrap(), vec![3, 2, 1]);
    /// ```
    pub fn resolve(&self) -> Result<Vec<usize>> {
        // Vertex -> number of unmet dependencies, in first-seen order.
        let mut pending: IndexMap<usize, usize> = IndexMap::new();
        // Dependency -> vertices waiting on it, in edge order.
        let mut dependents: IndexMap<usize, Vec<usize>> = IndexMap::new();

        for &(dependent, dependency) in &self.edges {
            pending.entry(dependent).or_insert(0);
            pending.entry(dependency).or_insert(0);

            if dependent == dependency {
                continue;
            }

            if let Some(count) = pending.get_mut(&dependent) {
                *count += 1;
            }
            dependents.entry(dependency).or_default().push(dependent);
        }

        let vertex_count = pending.len();
        let mut order: Vec<usize> = pending
            .iter()
            .filter(|&(_, &count)| count == 0)
            .map(|(&vertex, _)| vertex)
            .collect();

        // The order grows while we walk it: releasing a vertex may ready
        // some of its dependents.
        let mut next = 0;
        while next < order.len() {
            let vertex = order[next];
            next += 1;

            let Some(waiting) = dependents.get(&vertex) else {
                continue;
            };
            for &dependent in waiting {
                if let Some(count) = pending.get_mut(&dependent) {
                    *count -= 1;
                    if *count == 0 {
                        order.push(dependent);
                    }
                }
            }
        }

        if order.len() == vertex_count {
            Ok(order)
        } else {
            Err(PortsToolkitError::CyclicDependencies)
        }
    }
}
