//! Static placement of segments onto storage nodes.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlacementError {
    #[error("at least one storage node is required")]
    NoNodes,
}

/// Maps a segment identifier to the storage node that holds it.
///
/// Implementations must be pure: the same identifier always yields the same node
/// for a given node set.
pub trait NodeSelector: Send + Sync {
    fn select(&self, segment_id: &str) -> &str;
}

/// Additive checksum placement: sum of the identifier's code points modulo the
/// node count.
///
/// Any change to the node count reshuffles nearly every assignment.
#[derive(Debug, Clone)]
pub struct ChecksumSelector {
    nodes: Vec<String>,
}

impl ChecksumSelector {
    pub fn new(nodes: Vec<String>) -> Result<Self, PlacementError> {
        if nodes.is_empty() {
            return Err(PlacementError::NoNodes);
        }
        Ok(Self { nodes })
    }

    pub fn nodes(&self) -> &[String] {
        &self.nodes
    }
}

impl NodeSelector for ChecksumSelector {
    fn select(&self, segment_id: &str) -> &str {
        let sum = segment_id
            .chars()
            .fold(0u64, |acc, c| acc.wrapping_add(u64::from(c)));
        let index = (sum % self.nodes.len() as u64) as usize;
        &self.nodes[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn four_nodes() -> ChecksumSelector {
        ChecksumSelector::new(
            (1..=4).map(|i| format!("node-{}", i)).collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_empty_node_set_rejected() {
        assert_eq!(
            ChecksumSelector::new(Vec::new()).unwrap_err(),
            PlacementError::NoNodes
        );
    }

    #[test]
    fn test_checksum_value() {
        let selector = four_nodes();
        // 'a' + 'b' + 'c' = 97 + 98 + 99 = 294, 294 % 4 = 2
        assert_eq!(selector.select("abc"), "node-3");
        assert_eq!(selector.select(""), "node-1");
    }

    #[test]
    fn test_selection_is_deterministic() {
        let selector = four_nodes();
        for _ in 0..50 {
            let id = uuid::Uuid::new_v4().to_string();
            let first = selector.select(&id).to_string();
            for _ in 0..5 {
                assert_eq!(selector.select(&id), first);
            }
            assert_eq!(four_nodes().select(&id), first);
        }
    }

    #[test]
    fn test_order_of_characters_does_not_matter() {
        let selector = four_nodes();
        assert_eq!(selector.select("segment-xy"), selector.select("segment-yx"));
    }

    #[test]
    fn test_spreads_over_nodes() {
        let selector = four_nodes();
        let used: HashSet<&str> = (0..200)
            .map(|i| selector.select(&format!("seg-{}", i)))
            .collect();
        assert_eq!(used.len(), 4);
    }

    #[test]
    fn test_non_ascii_identifier() {
        let selector = ChecksumSelector::new(vec!["a".into(), "b".into()]).unwrap();
        // 'é' = 233, odd
        assert_eq!(selector.select("é"), "b");
    }
}
