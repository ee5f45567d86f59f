//! Static per-game configuration tables.
//!
//! Each supported game produces an immutable [`GameConfig`]: object catalog,
//! operation catalog, subtask catalog, grid dimensions and generation budgets.
//! Configs are plain values; callers share them by `Arc`.

mod mining;
mod playground;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::types::{Action, ObjectKind, OperationKind, SubtaskId};

/// Supported game variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameKind {
    Playground,
    Mining,
}

impl GameKind {
    pub const ALL: [GameKind; 2] = [GameKind::Playground, GameKind::Mining];

    /// Build the game's static tables.
    pub fn config(self) -> GameConfig {
        match self {
            GameKind::Playground => playground::config(),
            GameKind::Mining => mining::config(),
        }
    }

    /// Directory under the data root holding this game's graph datasets.
    pub fn dataset_folder(self) -> &'static str {
        match self {
            GameKind::Playground => "subtask_graph_play",
            GameKind::Mining => "subtask_graph_mining",
        }
    }

    /// Dataset file name prefix (`<prefix>_<graph_param>.json`).
    pub fn dataset_prefix(self) -> &'static str {
        match self {
            GameKind::Playground => "play",
            GameKind::Mining => "mining",
        }
    }
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameKind::Playground => f.write_str("playground"),
            GameKind::Mining => f.write_str("mining"),
        }
    }
}

impl FromStr for GameKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GameKind::ALL
            .into_iter()
            .find(|kind| kind.to_string() == s)
            .ok_or_else(|| format!("unsupported game '{}' (expected playground or mining)", s))
    }
}

/// Object catalog entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectParam {
    pub name: &'static str,
    pub pickable: bool,
    pub transformable: bool,
    /// Kind spawned in place when transformed.
    pub outcome: Option<ObjectKind>,
    /// Placed at most once even when several subtasks require it.
    pub unique: bool,
    /// Per-step probability of drifting to an empty neighbour.
    pub speed: f64,
    /// Upper bound (inclusive) on filler instances per episode.
    pub max_filler: Option<usize>,
}

impl ObjectParam {
    /// Static object with no filler, no outcome, no movement.
    pub(crate) const fn new(name: &'static str, pickable: bool, transformable: bool) -> Self {
        Self {
            name,
            pickable,
            transformable,
            outcome: None,
            unique: false,
            speed: 0.0,
            max_filler: None,
        }
    }

    pub(crate) const fn outcome(mut self, kind: ObjectKind) -> Self {
        self.outcome = Some(kind);
        self
    }

    pub(crate) const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub(crate) const fn speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    pub(crate) const fn max_filler(mut self, max: usize) -> Self {
        self.max_filler = Some(max);
        self
    }

    pub fn is_mobile(&self) -> bool {
        self.speed > 0.0
    }
}

/// Operation catalog entry: how an interaction action treats items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub action: Action,
    pub name: &'static str,
    pub kind: OperationKind,
    /// Keyboard shortcut shown in status tables.
    pub key: char,
}

/// Subtask catalog entry; the subtask id is its position in the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtaskParam {
    pub name: String,
    pub action: Action,
    pub object: ObjectKind,
}

/// Immutable per-game tables consumed by the simulator and controller.
#[derive(Debug, Clone, PartialEq)]
pub struct GameConfig {
    pub kind: GameKind,
    pub width: usize,
    pub height: usize,
    /// Block count range `[min, max)`; no blocks when `min == max`.
    pub block_range: (usize, usize),
    /// Water count range `[min, max)`; no water when `min == max`.
    pub water_range: (usize, usize),
    pub objects: Vec<ObjectParam>,
    pub operations: Vec<Operation>,
    pub subtasks: Vec<SubtaskParam>,
    param_to_id: HashMap<(Action, ObjectKind), SubtaskId>,
}

impl GameConfig {
    pub(crate) fn new(
        kind: GameKind,
        (width, height): (usize, usize),
        block_range: (usize, usize),
        water_range: (usize, usize),
        objects: Vec<ObjectParam>,
        operations: Vec<Operation>,
        subtasks: Vec<SubtaskParam>,
    ) -> Self {
        let param_to_id = subtasks
            .iter()
            .enumerate()
            .map(|(id, sub)| ((sub.action, sub.object), id))
            .collect();
        Self {
            kind,
            width,
            height,
            block_range,
            water_range,
            objects,
            operations,
            subtasks,
            param_to_id,
        }
    }

    pub fn nb_subtask_type(&self) -> usize {
        self.subtasks.len()
    }

    pub fn nb_obj_type(&self) -> usize {
        self.objects.len()
    }

    /// Moves followed by the game's interaction actions.
    pub fn legal_actions(&self) -> Vec<Action> {
        Action::MOVES
            .into_iter()
            .chain(self.operations.iter().map(|op| op.action))
            .collect()
    }

    pub fn is_legal(&self, action: Action) -> bool {
        action.is_move() || self.operation(action).is_some()
    }

    pub fn operation(&self, action: Action) -> Option<&Operation> {
        self.operations.iter().find(|op| op.action == action)
    }

    pub fn object(&self, kind: ObjectKind) -> &ObjectParam {
        &self.objects[kind]
    }

    /// Subtask id triggered by applying `action` to an item of kind `object`.
    pub fn subtask_id(&self, action: Action, object: ObjectKind) -> Option<SubtaskId> {
        self.param_to_id.get(&(action, object)).copied()
    }

    pub fn subtask(&self, id: SubtaskId) -> &SubtaskParam {
        &self.subtasks[id]
    }
}
