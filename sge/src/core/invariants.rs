//! Semantic invariants of graph records not expressible via JSON Schema.

use std::collections::HashSet;

use crate::core::graph::GraphRecord;

/// Check semantic invariants of a dataset record:
/// - Subtask ids are unique and inside `[0, nb_subtask_type)`
/// - Level counts partition the subtask and gate index spaces
/// - Matrix shapes agree with those counts, entries are in `{-1, 0, 1}`
/// - Gates only read subtasks of lower levels, OR-nodes only read gates of
///   the level directly below
/// - Base subtasks have no incoming gates
pub fn validate_record(record: &GraphRecord, nb_subtask_type: usize) -> Vec<String> {
    let mut errors = Vec::new();
    let nb_subtask = record.subtask_ids.len();

    if nb_subtask == 0 {
        errors.push("subtask_ids must not be empty".to_string());
    }
    let mut seen = HashSet::new();
    for id in &record.subtask_ids {
        if !seen.insert(*id) {
            errors.push(format!("duplicate subtask id {}", id));
        }
        if *id >= nb_subtask_type {
            errors.push(format!(
                "subtask id {} outside game subtask space [0, {})",
                id, nb_subtask_type
            ));
        }
    }

    if record.reward.len() != nb_subtask {
        errors.push(format!(
            "reward has {} entries, expected {}",
            record.reward.len(),
            nb_subtask
        ));
    }

    if record.num_or.len() != record.num_and.len() + 1 {
        errors.push(format!(
            "num_or has {} levels, expected num_and levels + 1 = {}",
            record.num_or.len(),
            record.num_and.len() + 1
        ));
        // Level checks below index num_or by gate level.
        return errors;
    }
    let or_total: usize = record.num_or.iter().sum();
    if or_total != nb_subtask {
        errors.push(format!(
            "num_or sums to {}, expected {} subtasks",
            or_total, nb_subtask
        ));
    }
    let nb_gate: usize = record.num_and.iter().sum();

    check_matrix("and_mat", &record.and_mat, nb_gate, nb_subtask, &mut errors);
    check_matrix("or_mat", &record.or_mat, nb_subtask, nb_gate, &mut errors);
    if !errors.is_empty() {
        return errors;
    }

    let or_starts = prefix_sums(&record.num_or);
    let and_starts = prefix_sums(&record.num_and);

    for (level, &count) in record.num_and.iter().enumerate() {
        let first_gate = and_starts[level];
        // Gates of level `l` may read OR-nodes of levels `0..=l`.
        let readable = or_starts[level + 1];
        for gate in first_gate..first_gate + count {
            for (ind, weight) in record.and_mat[gate].iter().enumerate() {
                if *weight != 0 && ind >= readable {
                    errors.push(format!(
                        "and_mat[{}] (level {}) reads subtask index {} of a later level",
                        gate, level, ind
                    ));
                }
            }
        }
    }

    for ind in 0..nb_subtask {
        let level = or_starts.partition_point(|start| *start <= ind) - 1;
        let allowed = if level == 0 {
            0..0
        } else {
            and_starts[level - 1]..and_starts[level]
        };
        for (gate, weight) in record.or_mat[ind].iter().enumerate() {
            if *weight == 0 {
                continue;
            }
            if level == 0 {
                errors.push(format!(
                    "or_mat[{}] is a base subtask but reads gate {}",
                    ind, gate
                ));
            } else if !allowed.contains(&gate) {
                errors.push(format!(
                    "or_mat[{}] (level {}) reads gate {} outside gate level {}",
                    ind,
                    level,
                    gate,
                    level - 1
                ));
            }
        }
    }

    errors
}

fn check_matrix(
    name: &str,
    mat: &[Vec<i8>],
    rows: usize,
    cols: usize,
    errors: &mut Vec<String>,
) {
    if mat.len() != rows {
        errors.push(format!("{} has {} rows, expected {}", name, mat.len(), rows));
    }
    for (r, row) in mat.iter().enumerate() {
        if row.len() != cols {
            errors.push(format!(
                "{}[{}] has {} columns, expected {}",
                name,
                r,
                row.len(),
                cols
            ));
        }
        if let Some(bad) = row.iter().find(|w| !matches!(**w, -1..=1)) {
            errors.push(format!("{}[{}] has entry {} outside {{-1, 0, 1}}", name, r, bad));
        }
    }
}

/// Start offset of every level plus the total, e.g. `[2, 1] -> [0, 2, 3]`.
fn prefix_sums(counts: &[usize]) -> Vec<usize> {
    let mut starts = Vec::with_capacity(counts.len() + 1);
    let mut acc = 0;
    starts.push(acc);
    for count in counts {
        acc += count;
        starts.push(acc);
    }
    starts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::worked_example_record;

    #[test]
    fn worked_example_is_valid() {
        assert!(validate_record(&worked_example_record(), 3).is_empty());
    }

    #[test]
    fn reports_duplicate_and_out_of_range_ids() {
        let mut record = worked_example_record();
        record.subtask_ids = vec![1, 1, 9];
        let errors = validate_record(&record, 4);
        assert!(errors.iter().any(|err| err.contains("duplicate subtask id 1")));
        assert!(errors.iter().any(|err| err.contains("subtask id 9 outside")));
    }

    #[test]
    fn reports_shape_and_literal_errors() {
        let mut record = worked_example_record();
        record.and_mat[0] = vec![1, 2];
        let errors = validate_record(&record, 3);
        assert!(errors.iter().any(|err| err.contains("and_mat[0] has 2 columns")));
        assert!(errors.iter().any(|err| err.contains("entry 2 outside")));
    }

    #[test]
    fn reports_level_count_mismatch() {
        let mut record = worked_example_record();
        record.num_or = vec![3];
        let errors = validate_record(&record, 3);
        assert!(errors.iter().any(|err| err.contains("num_or has 1 levels")));
    }

    /// A gate may not depend on the subtask it feeds (or anything later).
    #[test]
    fn reports_gate_reading_later_level() {
        let mut record = worked_example_record();
        record.and_mat[0] = vec![1, 1, 1];
        let errors = validate_record(&record, 3);
        assert!(
            errors
                .iter()
                .any(|err| err.contains("reads subtask index 2 of a later level"))
        );
    }

    #[test]
    fn reports_base_subtask_with_incoming_gate() {
        let mut record = worked_example_record();
        record.or_mat[0] = vec![1];
        let errors = validate_record(&record, 3);
        assert!(errors.iter().any(|err| err.contains("or_mat[0] is a base subtask")));
    }

    /// A derived subtask with no incoming gate is degenerate but valid.
    #[test]
    fn derived_subtask_without_gates_is_valid() {
        let mut record = worked_example_record();
        record.or_mat[2] = vec![0];
        assert!(validate_record(&record, 3).is_empty());
    }
}
