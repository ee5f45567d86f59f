//! Test-only builders for graphs, grids and on-disk datasets.

use std::collections::{HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::core::graph::{GraphInstance, GraphRecord};
use crate::core::grid::GridState;
use crate::core::types::{Action, Pos};
use crate::games::GameKind;

/// Two base subtasks `{0, 1}` and a derived subtask `2` gated on both.
pub fn worked_example_record() -> GraphRecord {
    GraphRecord {
        subtask_ids: vec![0, 1, 2],
        num_or: vec![2, 1],
        num_and: vec![1],
        and_mat: vec![vec![1, 1, 0]],
        or_mat: vec![vec![0], vec![0], vec![1]],
        reward: vec![0.1, 0.1, 1.0],
    }
}

pub fn worked_example_graph() -> GraphInstance {
    match GraphInstance::from_record(worked_example_record(), 3) {
        Ok(graph) => graph,
        Err(errors) => panic!("worked example graph is invalid: {errors:?}"),
    }
}

/// Flat graph where every listed subtask is a base subtask.
pub fn flat_record(subtask_ids: &[usize], reward: f64) -> GraphRecord {
    let n = subtask_ids.len();
    GraphRecord {
        subtask_ids: subtask_ids.to_vec(),
        num_or: vec![n],
        num_and: Vec::new(),
        and_mat: Vec::new(),
        or_mat: vec![Vec::new(); n],
        reward: vec![reward; n],
    }
}

/// Shortest sequence of moves taking the agent from its position to `target`.
///
/// Returns `None` when `target` is unreachable.
pub fn path_to(grid: &GridState, target: Pos) -> Option<Vec<Action>> {
    let start = grid.agent();
    let mut seen = HashSet::from([start]);
    let mut queue = VecDeque::from([(start, Vec::new())]);
    while let Some((pos, path)) = queue.pop_front() {
        if pos == target {
            return Some(path);
        }
        for action in Action::MOVES {
            let Some(next) = action.step_from(pos) else {
                continue;
            };
            if grid.is_passable(next) && seen.insert(next) {
                let mut next_path = path.clone();
                next_path.push(action);
                queue.push_back((next, next_path));
            }
        }
    }
    None
}

/// Temporary data root holding one dataset file.
pub struct TempDataset {
    pub dir: TempDir,
    pub path: PathBuf,
}

impl TempDataset {
    pub fn data_dir(&self) -> &Path {
        self.dir.path()
    }
}

/// Write `records` as `<game folder>/<prefix>_<param>.json` under a fresh
/// temporary data root.
pub fn write_dataset(game: GameKind, param: &str, records: &[GraphRecord]) -> TempDataset {
    let dir = tempfile::tempdir().expect("tempdir");
    let folder = dir.path().join(game.dataset_folder());
    fs::create_dir_all(&folder).expect("create dataset dir");
    let path = folder.join(format!("{}_{}.json", game.dataset_prefix(), param));
    let json = serde_json::to_string_pretty(records).expect("serialize records");
    fs::write(&path, json).expect("write dataset");
    TempDataset { dir, path }
}

/// Write raw `contents` as the dataset file for `game`/`param`.
pub fn write_raw_dataset(game: GameKind, param: &str, contents: &str) -> TempDataset {
    let dir = tempfile::tempdir().expect("tempdir");
    let folder = dir.path().join(game.dataset_folder());
    fs::create_dir_all(&folder).expect("create dataset dir");
    let path = folder.join(format!("{}_{}.json", game.dataset_prefix(), param));
    fs::write(&path, contents).expect("write dataset");
    TempDataset { dir, path }
}
