// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Atlas of small graphs: every connected simple graph up to isomorphism, for a few nodes.

use crate::errors::GenerationError;
use crate::topology::Topology;
use std::collections::BTreeSet;

/// Largest number of nodes the atlas enumerates
pub const ATLAS_MAX_NODES: usize = 5;

/// All the node pairs of a complete graph, in a fixed order. Bit `i` of an edge mask is pair `i`.
fn pairs(nodes: usize) -> Vec<(usize, usize)> {
    (0..nodes)
        .flat_map(|u| (u + 1..nodes).map(move |v| (u, v)))
        .collect()
}

fn permutations(nodes: usize) -> Vec<Vec<usize>> {
    fn permute(rest: &mut Vec<usize>, current: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
        if rest.is_empty() {
            out.push(current.clone());
            return;
        }
        for i in 0..rest.len() {
            let node = rest.remove(i);
            current.push(node);
            permute(rest, current, out);
            current.pop();
            rest.insert(i, node);
        }
    }
    let mut out = vec![];
    permute(&mut (0..nodes).collect(), &mut vec![], &mut out);
    out
}

fn mask_edges(pairs: &[(usize, usize)], mask: u32) -> Vec<(usize, usize)> {
    pairs
        .iter()
        .enumerate()
        .filter(|(i, _)| mask & (1 << i) != 0)
        .map(|(_, p)| *p)
        .collect()
}

/// The smallest edge mask among all relabellings of the graph
fn canonical_mask(pairs: &[(usize, usize)], perms: &[Vec<usize>], edges: &[(usize, usize)]) -> u32 {
    perms
        .iter()
        .map(|perm| {
            edges
                .iter()
                .map(|&(u, v)| {
                    let (a, b) = (perm[u].min(perm[v]), perm[u].max(perm[v]));
                    pairs.iter().position(|p| *p == (a, b)).map_or(0, |i| 1u32 << i)
                })
                .fold(0, |acc, bit| acc | bit)
        })
        .min()
        .unwrap_or_default()
}

/// All connected graphs with 1 to `max_nodes` nodes, one per isomorphism class, ordered by node
/// count, then edge count, then degree sequence.
///
/// # Errors
///
/// Fails if `max_nodes` exceeds [`ATLAS_MAX_NODES`].
pub fn atlas(max_nodes: usize) -> Result<Vec<Topology>, GenerationError> {
    if max_nodes > ATLAS_MAX_NODES {
        return Err(GenerationError::AtlasTooLarge {
            requested: max_nodes,
            max: ATLAS_MAX_NODES,
        });
    }
    let mut graphs = vec![];
    for nodes in 1..=max_nodes {
        let pairs = pairs(nodes);
        let perms = permutations(nodes);
        let mut classes: BTreeSet<(usize, Vec<usize>, u32)> = BTreeSet::new();
        for mask in 0..(1u32 << pairs.len()) {
            let edges = mask_edges(&pairs, mask);
            let Ok(topo) = Topology::from_edges(nodes, &edges) else {
                continue;
            };
            if !topo.is_connected() {
                continue;
            }
            let mut degrees: Vec<usize> = (0..nodes).map(|n| topo.degree(n)).collect();
            degrees.sort_unstable();
            classes.insert((edges.len(), degrees, canonical_mask(&pairs, &perms, &edges)));
        }
        for (_, _, mask) in classes {
            graphs.push(Topology::from_edges(nodes, &mask_edges(&pairs, mask))?);
        }
    }
    Ok(graphs)
}
