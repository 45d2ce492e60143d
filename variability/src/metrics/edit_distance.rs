//! Edit Distance Variability
//!
//! Compares the first variant of a log against every other variant using the
//! Levenshtein distance over activity codes, weighting each distance with the
//! frequencies of both variants.

use indicatif::ParallelProgressIterator;
use rayon::prelude::*;

use crate::{EventLogActivityProjection, ProgressOptions};

///
/// Levenshtein distance between two activity sequences
///
/// Insertions, deletions and substitutions all cost 1.
/// Only two rows of the distance matrix are kept, sized after the shorter sequence.
///
pub fn levenshtein_distance(a: &[usize], b: &[usize]) -> usize {
    let (short, long) = if a.len() > b.len() { (b, a) } else { (a, b) };

    let mut distances: Vec<usize> = (0..=short.len()).collect();
    let mut next: Vec<usize> = Vec::with_capacity(short.len() + 1);
    for (i2, c2) in long.iter().enumerate() {
        next.clear();
        next.push(i2 + 1);
        for (i1, c1) in short.iter().enumerate() {
            if c1 == c2 {
                next.push(distances[i1]);
            } else {
                let prev = next[i1];
                next.push(1 + distances[i1].min(distances[i1 + 1]).min(prev));
            }
        }
        std::mem::swap(&mut distances, &mut next);
    }
    distances[short.len()]
}

///
/// Edit distance variability of a log
///
/// The first variant is the reference. For every other variant `v`, `lev(reference, v) * freq(reference) * freq(v)`
/// is summed up; the result is this sum divided by the number of comparisons.
///
/// Returns `0.0` for logs with fewer than two variants.
///
pub fn compute_edit_distance_variability(
    projection: &EventLogActivityProjection,
    progress: &ProgressOptions,
) -> f64 {
    let Some((reference, reference_freq)) = projection.traces.first() else {
        return 0.0;
    };
    let others: Vec<&(Vec<usize>, u64)> = projection
        .traces
        .iter()
        .filter(|(variant, _)| variant != reference)
        .collect();
    if others.is_empty() {
        return 0.0;
    }

    let bar = progress.bar(others.len() as u64, "Edit distance computation");
    let distance: u128 = others
        .par_iter()
        .progress_with(bar.clone())
        .map(|(variant, freq)| {
            levenshtein_distance(reference, variant) as u128
                * u128::from(*reference_freq)
                * u128::from(*freq)
        })
        .sum();
    bar.finish();
    log::debug!(
        "Weighted edit distance {} over {} comparisons",
        distance,
        others.len()
    );

    distance as f64 / others.len() as f64
}
