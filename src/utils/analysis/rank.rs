use std::collections::HashMap;

use super::graph::DependencyGraph;

/// Scales dependent counts to 0..=100 relative to the most-imported file.
///
/// Files nothing imports are absent from the map; treat absence as rank 0.
pub fn calculate_import_ranks(graph: &DependencyGraph) -> HashMap<String, u32> {
    let reverse = graph.reverse_lookup();
    let max = reverse.values().map(|d| d.len()).max().unwrap_or(0);
    if max == 0 {
        return HashMap::new();
    }

    reverse
        .iter()
        .filter(|(_, dependents)| !dependents.is_empty())
        .map(|(path, dependents)| {
            // round(100 * n / max) in integer arithmetic, halves round up
            let rank = (200 * dependents.len() + max) / (2 * max);
            (path.clone(), rank as u32)
        })
        .collect()
}
