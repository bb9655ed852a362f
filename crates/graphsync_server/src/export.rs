//! Export-set resolution.

use graphsync_store::{GraphStore, NodeRecord, RelationshipRecord};
use std::collections::HashSet;

/// The resolved set of entities to transfer for one pull.
///
/// List order is fixed at computation time; the indices handed to the
/// client are only valid against this snapshot. Concurrent mutation
/// of the underlying graph during a pull is undefined.
#[derive(Debug, Clone)]
pub struct ExportSet {
    /// Nodes in discovery order.
    pub nodes: Vec<NodeRecord>,
    /// Relationships in discovery order.
    pub rels: Vec<RelationshipRecord>,
}

impl ExportSet {
    /// Returns the number of nodes in the set.
    pub fn num_nodes(&self) -> u32 {
        self.nodes.len() as u32
    }

    /// Returns the number of relationships in the set.
    pub fn num_rels(&self) -> u32 {
        self.rels.len() as u32
    }
}

/// Resolves the export set for a root entity.
///
/// The root id is resolved against the node store first, then the
/// relationship store. A node root with `recursive = false` yields
/// the root and its immediate outgoing relationships;
/// `recursive = true` follows the transitive closure of outgoing
/// relationships, visiting each node and relationship once in
/// breadth-first discovery order. A relationship root yields the
/// relationship and its endpoint nodes. Returns `None` when the root
/// resolves to neither, and when the closure would exceed `max_nodes`.
pub fn resolve_export(
    graph: &dyn GraphStore,
    root_id: &str,
    recursive: bool,
    max_nodes: usize,
) -> Option<ExportSet> {
    if let Some(root) = graph.node(root_id) {
        return resolve_from_node(graph, root, recursive, max_nodes);
    }

    let rel = graph.relationship(root_id)?;
    let mut nodes = Vec::new();
    for id in [&rel.start_id, &rel.end_id] {
        if let Some(node) = graph.node(id) {
            if !nodes.iter().any(|n: &NodeRecord| n.id == node.id) {
                nodes.push(node);
            }
        }
    }
    Some(ExportSet {
        nodes,
        rels: vec![rel],
    })
}

fn resolve_from_node(
    graph: &dyn GraphStore,
    root: NodeRecord,
    recursive: bool,
    max_nodes: usize,
) -> Option<ExportSet> {
    if !recursive {
        let rels = graph.outgoing(&root.id);
        return Some(ExportSet {
            nodes: vec![root],
            rels,
        });
    }

    let mut seen_nodes = HashSet::new();
    let mut seen_rels = HashSet::new();
    let mut nodes = Vec::new();
    let mut rels = Vec::new();
    let mut queue = std::collections::VecDeque::new();

    seen_nodes.insert(root.id.clone());
    queue.push_back(root.id.clone());
    nodes.push(root);

    while let Some(node_id) = queue.pop_front() {
        for rel in graph.outgoing(&node_id) {
            if !seen_rels.insert(rel.id.clone()) {
                continue;
            }
            if seen_nodes.insert(rel.end_id.clone()) {
                if nodes.len() >= max_nodes {
                    return None;
                }
                if let Some(node) = graph.node(&rel.end_id) {
                    nodes.push(node);
                    queue.push_back(rel.end_id.clone());
                }
            }
            rels.push(rel);
        }
    }

    Some(ExportSet { nodes, rels })
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphsync_store::MemoryStore;

    /// a -> b -> c, a -> c, plus d detached.
    fn diamond() -> (MemoryStore, String, String, String) {
        let store = MemoryStore::new();
        let a = store.create_node("Page", "a");
        let b = store.create_node("Page", "b");
        let c = store.create_node("Page", "c");
        store.create_node("Page", "d");
        store.create_relationship(&a, &b, "LINKS_TO");
        store.create_relationship(&b, &c, "LINKS_TO");
        store.create_relationship(&a, &c, "LINKS_TO");
        (store, a, b, c)
    }

    #[test]
    fn non_recursive_yields_root_and_immediate_rels() {
        let (store, a, _, _) = diamond();
        let set = resolve_export(&store, &a, false, 1000).unwrap();

        assert_eq!(set.num_nodes(), 1);
        assert_eq!(set.nodes[0].id, a);
        assert_eq!(set.num_rels(), 2);
    }

    #[test]
    fn recursive_follows_the_closure() {
        let (store, a, _, _) = diamond();
        let set = resolve_export(&store, &a, true, 1000).unwrap();

        // d is unreachable
        assert_eq!(set.num_nodes(), 3);
        assert_eq!(set.num_rels(), 3);
        assert_eq!(set.nodes[0].id, a);
    }

    #[test]
    fn resolution_is_deterministic() {
        let (store, a, _, _) = diamond();
        let first = resolve_export(&store, &a, true, 1000).unwrap();
        let second = resolve_export(&store, &a, true, 1000).unwrap();

        let ids = |set: &ExportSet| -> Vec<String> {
            set.nodes
                .iter()
                .map(|n| n.id.clone())
                .chain(set.rels.iter().map(|r| r.id.clone()))
                .collect()
        };
        assert_eq!(ids(&first), ids(&second));
    }

    #[test]
    fn non_recursive_is_a_subset_of_recursive() {
        let (store, a, _, _) = diamond();
        let flat = resolve_export(&store, &a, false, 1000).unwrap();
        let deep = resolve_export(&store, &a, true, 1000).unwrap();

        assert!(flat.num_nodes() <= deep.num_nodes());
        assert!(flat.num_rels() <= deep.num_rels());
    }

    #[test]
    fn cycles_terminate() {
        let store = MemoryStore::new();
        let a = store.create_node("Page", "a");
        let b = store.create_node("Page", "b");
        store.create_relationship(&a, &b, "LINKS_TO");
        store.create_relationship(&b, &a, "LINKS_TO");

        let set = resolve_export(&store, &a, true, 1000).unwrap();
        assert_eq!(set.num_nodes(), 2);
        assert_eq!(set.num_rels(), 2);
    }

    #[test]
    fn relationship_root_yields_rel_and_endpoints() {
        let store = MemoryStore::new();
        let a = store.create_node("Page", "a");
        let b = store.create_node("Page", "b");
        let r = store.create_relationship(&a, &b, "LINKS_TO");

        let set = resolve_export(&store, &r, false, 1000).unwrap();
        assert_eq!(set.num_nodes(), 2);
        assert_eq!(set.num_rels(), 1);
        assert_eq!(set.rels[0].id, r);
    }

    #[test]
    fn unresolvable_root_yields_none() {
        let store = MemoryStore::new();
        assert!(resolve_export(&store, "nope", true, 1000).is_none());
    }

    #[test]
    fn oversized_closure_is_refused() {
        let (store, a, _, _) = diamond();
        assert!(resolve_export(&store, &a, true, 1).is_none());
    }
}
