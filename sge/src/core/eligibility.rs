//! Eligibility evaluation over the layered AND/OR subtask circuit.

use crate::core::graph::GraphInstance;

/// Compute which subtasks are executable given `completion`.
///
/// Completion bits become bipolar literals `t = 2c - 1`. AND-gate `a` fires iff
/// `Σ w[a][i]·t[i] >= bias_and[a]`, i.e. every literal matches its polarity.
/// Subtask `o` is eligible iff `Σ w[o][a]·g[a] >= bias_or[o]`: base subtasks
/// (`bias_or = 0`) always, derived subtasks when at least one gate fires.
///
/// Pure: the result depends only on `completion` and `graph`. Attempt history
/// (the mask) is never consulted.
pub fn eligibility(completion: &[bool], graph: &GraphInstance) -> Vec<bool> {
    debug_assert_eq!(completion.len(), graph.len());

    let literals: Vec<i32> = completion.iter().map(|done| if *done { 1 } else { -1 }).collect();

    let gates: Vec<i32> = graph
        .and_mat()
        .iter()
        .zip(graph.bias_and())
        .map(|(row, bias)| i32::from(weighted_sum(row, &literals) >= *bias))
        .collect();

    graph
        .or_mat()
        .iter()
        .zip(graph.bias_or())
        .map(|(row, bias)| weighted_sum(row, &gates) >= *bias)
        .collect()
}

fn weighted_sum(weights: &[i8], inputs: &[i32]) -> i32 {
    weights
        .iter()
        .zip(inputs)
        .map(|(w, x)| i32::from(*w) * x)
        .sum()
}
