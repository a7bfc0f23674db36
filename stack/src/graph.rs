// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Undirected multigraph of datapaths joined by stack links

use net::openflow::PortNo;
use serde::Serialize;
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::hash::{Hash, Hasher};

/// One end of a stack link
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct LinkEnd {
    pub dp: String,
    pub port: PortNo,
    pub port_name: String,
}

impl LinkEnd {
    #[must_use]
    pub fn new(dp: &str, port: PortNo, port_name: &str) -> Self {
        Self {
            dp: dp.to_owned(),
            port,
            port_name: port_name.to_owned(),
        }
    }
    fn is(&self, dp: &str, port: PortNo) -> bool {
        self.dp == dp && self.port == port
    }
}

/// A stack link. The ends are kept in canonical order so that a link declared from either side
/// yields the same link and the same key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StackLink {
    pub a: LinkEnd,
    pub z: LinkEnd,
}

impl StackLink {
    #[must_use]
    pub fn new(x: LinkEnd, y: LinkEnd) -> Self {
        if x <= y {
            Self { a: x, z: y }
        } else {
            Self { a: y, z: x }
        }
    }

    /// The link name, `a_dp:a_port-z_dp:z_port`
    #[must_use]
    pub fn key(&self) -> String {
        format!(
            "{}:{}-{}:{}",
            self.a.dp, self.a.port_name, self.z.dp, self.z.port_name
        )
    }

    /// The end of this link opposite to the given port, if the port is one of its ends
    #[must_use]
    pub fn peer_of(&self, dp: &str, port: PortNo) -> Option<&LinkEnd> {
        if self.a.is(dp, port) {
            Some(&self.z)
        } else if self.z.is(dp, port) {
            Some(&self.a)
        } else {
            None
        }
    }
}

/// An undirected multigraph: several links may join the same pair of datapaths.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StackGraph {
    nodes: BTreeSet<String>,
    links: BTreeMap<String, StackLink>,
}

impl StackGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, name: &str) {
        if !self.nodes.contains(name) {
            self.nodes.insert(name.to_owned());
        }
    }

    /// Add a link, and its end nodes. Returns false if the link was already there.
    pub fn add_link(&mut self, link: StackLink) -> bool {
        let key = link.key();
        if self.links.contains_key(&key) {
            return false;
        }
        self.add_node(&link.a.dp);
        self.add_node(&link.z.dp);
        self.links.insert(key, link);
        true
    }

    /// Remove a link by key. Nodes are kept.
    pub fn remove_link(&mut self, key: &str) -> Option<StackLink> {
        self.links.remove(key)
    }

    #[must_use]
    pub fn has_link(&self, key: &str) -> bool {
        self.links.contains_key(key)
    }

    #[must_use]
    pub fn has_node(&self, name: &str) -> bool {
        self.nodes.contains(name)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(String::as_str)
    }

    pub fn links(&self) -> impl Iterator<Item = &StackLink> {
        self.links.values()
    }

    #[must_use]
    pub fn num_links(&self) -> usize {
        self.links.len()
    }

    /// Number of link ends at a node
    #[must_use]
    pub fn degree(&self, node: &str) -> usize {
        self.links
            .values()
            .map(|l| usize::from(l.a.dp == node) + usize::from(l.z.dp == node))
            .sum()
    }

    fn adjacency(&self) -> BTreeMap<&str, BTreeSet<&str>> {
        let mut adj: BTreeMap<&str, BTreeSet<&str>> =
            self.nodes.iter().map(|n| (n.as_str(), BTreeSet::new())).collect();
        for link in self.links.values() {
            if link.a.dp == link.z.dp {
                continue;
            }
            if let Some(n) = adj.get_mut(link.a.dp.as_str()) {
                n.insert(link.z.dp.as_str());
            }
            if let Some(n) = adj.get_mut(link.z.dp.as_str()) {
                n.insert(link.a.dp.as_str());
            }
        }
        adj
    }

    #[must_use]
    pub fn neighbors(&self, node: &str) -> BTreeSet<&str> {
        self.adjacency().remove(node).unwrap_or_default()
    }

    /// Hop counts from every node that can reach `dst`
    fn distances_to<'a>(
        adj: &BTreeMap<&'a str, BTreeSet<&'a str>>,
        dst: &'a str,
    ) -> BTreeMap<&'a str, usize> {
        let mut dist = BTreeMap::from([(dst, 0usize)]);
        let mut queue = VecDeque::from([dst]);
        while let Some(node) = queue.pop_front() {
            let next = dist.get(node).copied().unwrap_or_default() + 1;
            for &n in adj.get(node).into_iter().flatten() {
                if !dist.contains_key(n) {
                    dist.insert(n, next);
                    queue.push_back(n);
                }
            }
        }
        dist
    }

    /// All the shortest paths from `src` to `dst`, in lexicographic order.
    #[must_use]
    pub fn all_shortest_paths(&self, src: &str, dst: &str) -> Vec<Vec<String>> {
        let adj = self.adjacency();
        let Some((&dst, _)) = adj.get_key_value(dst) else {
            return vec![];
        };
        let dist = Self::distances_to(&adj, dst);
        if !dist.contains_key(src) {
            return vec![];
        }
        let mut paths = vec![];
        let mut path = vec![src.to_owned()];
        Self::walk(&adj, &dist, src, &mut path, &mut paths);
        paths
    }

    fn walk(
        adj: &BTreeMap<&str, BTreeSet<&str>>,
        dist: &BTreeMap<&str, usize>,
        node: &str,
        path: &mut Vec<String>,
        paths: &mut Vec<Vec<String>>,
    ) {
        let here = dist.get(node).copied().unwrap_or_default();
        if here == 0 {
            paths.push(path.clone());
            return;
        }
        for &n in adj.get(node).into_iter().flatten() {
            if dist.get(n).is_some_and(|d| d + 1 == here) {
                path.push(n.to_owned());
                Self::walk(adj, dist, n, path, paths);
                path.pop();
            }
        }
    }

    /// The lexicographically first shortest path from `src` to `dst`, or an empty path if there
    /// is none.
    #[must_use]
    pub fn shortest_path(&self, src: &str, dst: &str) -> Vec<String> {
        let adj = self.adjacency();
        let Some((&dst, _)) = adj.get_key_value(dst) else {
            return vec![];
        };
        let dist = Self::distances_to(&adj, dst);
        let Some(mut here) = dist.get(src).copied() else {
            return vec![];
        };
        let mut node = src;
        let mut path = vec![src.to_owned()];
        // neighbors are visited in order, so the first one closer to dst is the smallest
        while here > 0 {
            let Some(&next) = adj
                .get(node)
                .into_iter()
                .flatten()
                .find(|n| dist.get(**n).is_some_and(|d| d + 1 == here))
            else {
                return vec![];
            };
            path.push(next.to_owned());
            node = next;
            here -= 1;
        }
        path
    }

    /// A hash of the sorted node degrees. It changes whenever a link comes or goes.
    #[must_use]
    pub fn topology_hash(&self) -> u64 {
        let degrees: Vec<(&str, usize)> = self.nodes().map(|n| (n, self.degree(n))).collect();
        let mut hasher = DefaultHasher::new();
        degrees.hash(&mut hasher);
        hasher.finish()
    }

    /// Serializable node-link form of the graph
    #[must_use]
    pub fn node_link_data(&self) -> NodeLinkData {
        NodeLinkData {
            directed: false,
            multigraph: true,
            nodes: self.nodes.iter().map(|id| Node { id: id.clone() }).collect(),
            links: self
                .links
                .iter()
                .map(|(key, link)| Link {
                    source: link.a.dp.clone(),
                    target: link.z.dp.clone(),
                    key: key.clone(),
                    port_map: PortMap {
                        dp_a: link.a.dp.clone(),
                        port_a: link.a.port_name.clone(),
                        dp_z: link.z.dp.clone(),
                        port_z: link.z.port_name.clone(),
                    },
                })
                .collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NodeLinkData {
    pub directed: bool,
    pub multigraph: bool,
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Node {
    pub id: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Link {
    pub source: String,
    pub target: String,
    pub key: String,
    pub port_map: PortMap,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PortMap {
    pub dp_a: String,
    pub port_a: String,
    pub dp_z: String,
    pub port_z: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn link(a: &str, pa: u32, z: &str, pz: u32) -> StackLink {
        let end = |dp: &str, p: u32| LinkEnd::new(dp, PortNo::new(p).unwrap(), &p.to_string());
        StackLink::new(end(a, pa), end(z, pz))
    }

    /// s1 - s2 - s4, s1 - s3 - s4, plus a parallel s1 - s2 link
    fn diamond() -> StackGraph {
        let mut graph = StackGraph::new();
        graph.add_link(link("s1", 1, "s2", 1));
        graph.add_link(link("s1", 2, "s2", 2));
        graph.add_link(link("s1", 3, "s3", 1));
        graph.add_link(link("s4", 1, "s2", 3));
        graph.add_link(link("s4", 2, "s3", 2));
        graph
    }

    #[test]
    fn test_link_keys_are_canonical() {
        let l = link("s2", 3, "s1", 1);
        assert_eq!(l.key(), "s1:1-s2:3");
        assert_eq!(l, link("s1", 1, "s2", 3));
        let peer = l.peer_of("s2", PortNo::new(3).unwrap()).unwrap();
        assert_eq!(peer.dp, "s1");
        assert!(l.peer_of("s2", PortNo::new(1).unwrap()).is_none());
    }

    #[test]
    fn test_multigraph() {
        let mut graph = diamond();
        assert_eq!(graph.num_links(), 5);
        assert!(!graph.add_link(link("s2", 1, "s1", 1)));
        assert_eq!(graph.degree("s1"), 3);
        assert_eq!(graph.neighbors("s1"), BTreeSet::from(["s2", "s3"]));
        let before = graph.topology_hash();
        assert!(graph.remove_link("s1:2-s2:2").is_some());
        assert_ne!(before, graph.topology_hash());
        assert!(graph.add_link(link("s1", 2, "s2", 2)));
        assert_eq!(before, graph.topology_hash());
    }

    #[test]
    fn test_shortest_paths() {
        let graph = diamond();
        let all = graph.all_shortest_paths("s4", "s1");
        assert_eq!(
            all,
            vec![
                vec!["s4".to_owned(), "s2".to_owned(), "s1".to_owned()],
                vec!["s4".to_owned(), "s3".to_owned(), "s1".to_owned()],
            ]
        );
        assert_eq!(graph.shortest_path("s4", "s1"), all[0]);
        assert_eq!(graph.shortest_path("s1", "s1"), vec!["s1".to_owned()]);
        assert!(graph.shortest_path("s1", "s9").is_empty());

        let mut cut = diamond();
        cut.remove_link("s1:3-s3:1");
        cut.remove_link("s3:2-s4:2");
        assert!(cut.shortest_path("s3", "s1").is_empty());
        assert!(cut.all_shortest_paths("s3", "s1").is_empty());
    }

    #[test]
    fn test_node_link_data() {
        let mut graph = StackGraph::new();
        graph.add_link(link("s1", 1, "s2", 1));
        graph.add_node("s3");
        let data = graph.node_link_data();
        assert!(data.multigraph);
        assert_eq!(data.nodes.len(), 3);
        assert_eq!(data.links[0].key, "s1:1-s2:1");
        let yaml = serde_yaml_ng::to_string(&data).unwrap();
        assert!(yaml.contains("port_map"));
    }
}
