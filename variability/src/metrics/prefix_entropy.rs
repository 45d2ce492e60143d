//! Prefix Entropy
//!
//! Entropy over the likelihood estimates of all prefixes occurring in a log.
//!
//! The prefixes of a variant of length `n` are its first `i` activities for `0 <= i < n`
//! (so the empty prefix is included and the full variant is not).
//! The likelihood estimate of a prefix is the number of variants starting with it
//! (a variant equal to the prefix counts as well) divided by the total length of all variants.
//! Frequencies of variants are not taken into account.

use std::collections::HashMap;

use crate::{EventLogActivityProjection, ProgressOptions};

/// Node of a [`PrefixTree`]; `variants` counts the variants passing through (or ending in) this node
#[derive(Debug, Default)]
struct PrefixNode {
    children: HashMap<usize, usize>,
    variants: usize,
}

/// Prefix tree over activity codes, with nodes stored in insertion order
#[derive(Debug)]
struct PrefixTree {
    nodes: Vec<PrefixNode>,
}

impl PrefixTree {
    fn new() -> Self {
        PrefixTree {
            nodes: vec![PrefixNode::default()],
        }
    }

    fn insert(&mut self, variant: &[usize]) {
        let mut node = 0;
        self.nodes[node].variants += 1;
        for act in variant {
            node = match self.nodes[node].children.get(act) {
                Some(child) => *child,
                None => {
                    let child = self.nodes.len();
                    self.nodes.push(PrefixNode::default());
                    self.nodes[node].children.insert(*act, child);
                    child
                }
            };
            self.nodes[node].variants += 1;
        }
    }

    /// Nodes that are a proper prefix of at least one variant (i.e., that have a child)
    fn prefixes(&self) -> impl Iterator<Item = &PrefixNode> + '_ {
        self.nodes.iter().filter(|n| !n.children.is_empty())
    }
}

///
/// Prefix entropy of a log: `-sum(P(p) * log10(P(p)))` over all distinct prefixes `p`
///
/// Returns `0.0` if the log contains no events.
///
pub fn compute_prefix_entropy(
    projection: &EventLogActivityProjection,
    progress: &ProgressOptions,
) -> f64 {
    let total_length: usize = projection.traces.iter().map(|(v, _)| v.len()).sum();
    if total_length == 0 {
        return 0.0;
    }

    let bar = progress.bar(projection.traces.len() as u64, "Prefix generation");
    let mut tree = PrefixTree::new();
    for (variant, _) in bar.wrap_iter(projection.traces.iter()) {
        tree.insert(variant);
    }
    bar.finish();

    let num_prefixes = tree.prefixes().count();
    log::debug!(
        "{} distinct prefixes over {} variants",
        num_prefixes,
        projection.traces.len()
    );

    let bar = progress.bar(num_prefixes as u64, "Prefix likelihood estimation");
    let entropy: f64 = bar
        .wrap_iter(tree.prefixes())
        .map(|node| {
            let p = node.variants as f64 / total_length as f64;
            p * p.log10()
        })
        .sum();
    bar.finish();

    -entropy
}

#[cfg(test)]
mod tests {
    use super::*;

    fn projection_of(variants: Vec<Vec<usize>>) -> EventLogActivityProjection {
        EventLogActivityProjection {
            traces: variants.into_iter().map(|v| (v, 1)).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_single_variant() {
        // Prefixes <>, <a>, <a,b> each with likelihood 1/3
        let projection = projection_of(vec![vec![0, 1, 2]]);
        let entropy = compute_prefix_entropy(&projection, &ProgressOptions::hidden());
        assert!((entropy - 3f64.log10()).abs() < 1e-12);
    }

    #[test]
    fn test_variant_equal_to_prefix_counts() {
        // Prefixes <> and <a>; both start (or are) <a> and <a,b>, so both have likelihood 2/3
        let projection = projection_of(vec![vec![0], vec![0, 1]]);
        let entropy = compute_prefix_entropy(&projection, &ProgressOptions::hidden());
        let p: f64 = 2.0 / 3.0;
        assert!((entropy - (-2.0 * p * p.log10())).abs() < 1e-12);
    }

    #[test]
    fn test_frequencies_are_ignored() {
        let mut projection = projection_of(vec![vec![0, 1], vec![1, 0]]);
        let progress = ProgressOptions::hidden();
        let before = compute_prefix_entropy(&projection, &progress);
        projection.traces[0].1 = 1000;
        assert_eq!(compute_prefix_entropy(&projection, &progress), before);
    }

    #[test]
    fn test_empty_logs() {
        let progress = ProgressOptions::hidden();
        assert_eq!(
            compute_prefix_entropy(&EventLogActivityProjection::default(), &progress),
            0.0
        );
        assert_eq!(
            compute_prefix_entropy(&projection_of(vec![vec![]]), &progress),
            0.0
        );
    }
}
