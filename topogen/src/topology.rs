// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Switch topologies: undirected multigraphs over switch indices

use crate::errors::GenerationError;
use std::collections::BTreeSet;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Topology {
    nodes: usize,
    /// Links with the lower index first; a pair may appear more than once
    edges: Vec<(usize, usize)>,
}

impl Topology {
    /// A topology of `nodes` switches and the given links
    ///
    /// # Errors
    ///
    /// Fails if a link refers to a switch index out of range or joins a switch to itself.
    pub fn from_edges(nodes: usize, edges: &[(usize, usize)]) -> Result<Self, GenerationError> {
        let mut canonical = Vec::with_capacity(edges.len());
        for &(u, v) in edges {
            if u >= nodes || v >= nodes {
                return Err(GenerationError::UnknownSwitch(u, v));
            }
            if u == v {
                return Err(GenerationError::SelfLoop(u));
            }
            canonical.push((u.min(v), u.max(v)));
        }
        Ok(Self {
            nodes,
            edges: canonical,
        })
    }

    #[must_use]
    pub fn path(nodes: usize) -> Self {
        Self {
            nodes,
            edges: (1..nodes).map(|i| (i - 1, i)).collect(),
        }
    }

    #[must_use]
    pub fn cycle(nodes: usize) -> Self {
        let mut topo = Self::path(nodes);
        if nodes > 2 {
            topo.edges.push((0, nodes - 1));
        }
        topo
    }

    #[must_use]
    pub fn complete(nodes: usize) -> Self {
        Self {
            nodes,
            edges: (0..nodes)
                .flat_map(|u| (u + 1..nodes).map(move |v| (u, v)))
                .collect(),
        }
    }

    /// Switch 0 linked to every other switch
    #[must_use]
    pub fn star(nodes: usize) -> Self {
        Self {
            nodes,
            edges: (1..nodes).map(|v| (0, v)).collect(),
        }
    }

    #[must_use]
    pub fn num_nodes(&self) -> usize {
        self.nodes
    }

    #[must_use]
    pub fn edges(&self) -> &[(usize, usize)] {
        &self.edges
    }

    /// The same topology with every link repeated `times` times
    #[must_use]
    pub fn multiplied(&self, times: usize) -> Self {
        let edges = (0..times).flat_map(|_| self.edges.iter().copied()).collect();
        Self {
            nodes: self.nodes,
            edges,
        }
    }

    #[must_use]
    pub fn degree(&self, node: usize) -> usize {
        self.edges
            .iter()
            .map(|&(u, v)| usize::from(u == node) + usize::from(v == node))
            .sum()
    }

    #[must_use]
    pub fn neighbors(&self, node: usize) -> BTreeSet<usize> {
        self.edges
            .iter()
            .filter_map(|&(u, v)| {
                if u == node {
                    Some(v)
                } else if v == node {
                    Some(u)
                } else {
                    None
                }
            })
            .collect()
    }

    /// Whether every switch reaches every other. A topology without switches is not connected.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        if self.nodes == 0 {
            return false;
        }
        let mut seen = BTreeSet::from([0]);
        let mut todo = vec![0];
        while let Some(node) = todo.pop() {
            for n in self.neighbors(node) {
                if seen.insert(n) {
                    todo.push(n);
                }
            }
        }
        seen.len() == self.nodes
    }
}
