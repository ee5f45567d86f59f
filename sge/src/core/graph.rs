//! Subtask graph instances: the layered AND/OR circuit over subtask completion.

use std::collections::HashMap;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::core::invariants::validate_record;
use crate::core::types::SubtaskId;

/// One pre-generated graph as stored in a dataset file.
///
/// `and_mat` is `Σnum_and × nb_subtask`, `or_mat` is `nb_subtask × Σnum_and`.
/// Entries are `+1` (literal required true), `-1` (required false) or `0`
/// (not connected).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphRecord {
    /// Global subtask ids in index order; index `i` of every per-subtask
    /// vector refers to `subtask_ids[i]`.
    pub subtask_ids: Vec<SubtaskId>,
    /// OR-node (subtask) count per level, base level first.
    pub num_or: Vec<usize>,
    /// AND-gate count per level; gates of level `l` feed OR-nodes of level `l + 1`.
    pub num_and: Vec<usize>,
    pub and_mat: Vec<Vec<i8>>,
    pub or_mat: Vec<Vec<i8>>,
    /// Reward granted on successful execution, per subtask index.
    pub reward: Vec<f64>,
}

/// Validated, immutable graph bound to an episode.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphInstance {
    ind_to_id: Vec<SubtaskId>,
    id_to_ind: HashMap<SubtaskId, usize>,
    num_or: Vec<usize>,
    num_and: Vec<usize>,
    and_mat: Vec<Vec<i8>>,
    or_mat: Vec<Vec<i8>>,
    bias_and: Vec<i32>,
    bias_or: Vec<i32>,
    reward: Vec<f64>,
}

impl GraphInstance {
    /// Validate `record` against the game's subtask space and derive biases.
    ///
    /// `bias_and[g]` is the number of literals of gate `g`; `bias_or` is `0`
    /// for base subtasks and `1` for every other subtask.
    pub fn from_record(record: GraphRecord, nb_subtask_type: usize) -> Result<Self, Vec<String>> {
        let errors = validate_record(&record, nb_subtask_type);
        if !errors.is_empty() {
            return Err(errors);
        }

        let GraphRecord {
            subtask_ids,
            num_or,
            num_and,
            and_mat,
            or_mat,
            reward,
        } = record;

        let bias_and = and_mat
            .iter()
            .map(|row| row.iter().filter(|w| **w != 0).count() as i32)
            .collect();
        let bias_or = (0..subtask_ids.len())
            .map(|ind| if ind < num_or[0] { 0 } else { 1 })
            .collect();
        let id_to_ind = subtask_ids
            .iter()
            .enumerate()
            .map(|(ind, id)| (*id, ind))
            .collect();

        Ok(Self {
            ind_to_id: subtask_ids,
            id_to_ind,
            num_or,
            num_and,
            and_mat,
            or_mat,
            bias_and,
            bias_or,
            reward,
        })
    }

    /// Number of subtasks in this instance (`nb_subtask`).
    pub fn len(&self) -> usize {
        self.ind_to_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ind_to_id.is_empty()
    }

    /// Global ids in index order.
    pub fn subtask_ids(&self) -> &[SubtaskId] {
        &self.ind_to_id
    }

    pub fn id_of(&self, ind: usize) -> SubtaskId {
        self.ind_to_id[ind]
    }

    pub fn index_of(&self, id: SubtaskId) -> Option<usize> {
        self.id_to_ind.get(&id).copied()
    }

    pub fn contains(&self, id: SubtaskId) -> bool {
        self.id_to_ind.contains_key(&id)
    }

    pub fn num_levels(&self) -> usize {
        self.num_and.len()
    }

    pub fn num_or(&self) -> &[usize] {
        &self.num_or
    }

    pub fn num_and(&self) -> &[usize] {
        &self.num_and
    }

    /// Subtask index range of OR-level `level` (level 0 = base subtasks).
    pub fn or_level(&self, level: usize) -> Range<usize> {
        let start: usize = self.num_or[..level].iter().sum();
        start..start + self.num_or[level]
    }

    /// AND-gate index range of gate level `level`.
    pub fn and_level(&self, level: usize) -> Range<usize> {
        let start: usize = self.num_and[..level].iter().sum();
        start..start + self.num_and[level]
    }

    pub fn num_gates(&self) -> usize {
        self.and_mat.len()
    }

    pub fn and_mat(&self) -> &[Vec<i8>] {
        &self.and_mat
    }

    pub fn or_mat(&self) -> &[Vec<i8>] {
        &self.or_mat
    }

    pub fn bias_and(&self) -> &[i32] {
        &self.bias_and
    }

    pub fn bias_or(&self) -> &[i32] {
        &self.bias_or
    }

    pub fn reward(&self, ind: usize) -> f64 {
        self.reward[ind]
    }

    pub fn rewards(&self) -> &[f64] {
        &self.reward
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::worked_example_record;

    #[test]
    fn biases_follow_literal_counts_and_levels() {
        let graph = GraphInstance::from_record(worked_example_record(), 8).expect("graph");
        assert_eq!(graph.bias_and(), &[2]);
        assert_eq!(graph.bias_or(), &[0, 0, 1]);
        assert_eq!(graph.num_levels(), 1);
        assert_eq!(graph.or_level(0), 0..2);
        assert_eq!(graph.or_level(1), 2..3);
        assert_eq!(graph.and_level(0), 0..1);
    }

    #[test]
    fn index_and_id_tables_are_inverse() {
        let mut record = worked_example_record();
        record.subtask_ids = vec![7, 2, 5];
        let graph = GraphInstance::from_record(record, 8).expect("graph");
        for ind in 0..graph.len() {
            assert_eq!(graph.index_of(graph.id_of(ind)), Some(ind));
        }
        assert_eq!(graph.index_of(3), None);
        assert!(graph.contains(5));
        assert!(!graph.contains(0));
    }

    #[test]
    fn from_record_rejects_malformed_record() {
        let mut record = worked_example_record();
        record.reward.pop();
        let errors = GraphInstance::from_record(record, 8).expect_err("expected errors");
        assert!(errors.iter().any(|err| err.contains("reward")));
    }
}
