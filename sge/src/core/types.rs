//! Shared deterministic types for the simulator core.
//!
//! These types define stable contracts between core components. They do not
//! depend on external state or I/O.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Global subtask kind id (index into a game's subtask catalog).
pub type SubtaskId = usize;

/// Object kind id (index into a game's object catalog).
pub type ObjectKind = usize;

/// Grid coordinate as `(x, y)`; `x` grows right, `y` grows down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Pos {
    pub x: usize,
    pub y: usize,
}

impl Pos {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Orthogonal neighbours in `right, left, down, up` order.
    ///
    /// Neighbours past the origin are skipped; the upper bound is the caller's
    /// concern.
    pub fn neighbours(self) -> impl Iterator<Item = Pos> {
        [Action::Right, Action::Left, Action::Down, Action::Up]
            .into_iter()
            .filter_map(move |action| action.step_from(self))
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Raw agent action.
///
/// Numeric codes are stable: `Up=0 .. Right=3`, `Pickup=4`, `Use1..Use5 = 5..9`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Up,
    Down,
    Left,
    Right,
    Pickup,
    Use1,
    Use2,
    Use3,
    Use4,
    Use5,
}

impl Action {
    /// Playground's single transform shares its code with `Use1`.
    pub const TRANSFORM: Action = Action::Use1;

    pub const ALL: [Action; 10] = [
        Action::Up,
        Action::Down,
        Action::Left,
        Action::Right,
        Action::Pickup,
        Action::Use1,
        Action::Use2,
        Action::Use3,
        Action::Use4,
        Action::Use5,
    ];

    pub const MOVES: [Action; 4] = [Action::Up, Action::Down, Action::Left, Action::Right];

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Action> {
        Action::ALL.get(usize::from(code)).copied()
    }

    pub fn is_move(self) -> bool {
        matches!(
            self,
            Action::Up | Action::Down | Action::Left | Action::Right
        )
    }

    /// Destination of a move action from `from`; `None` for interactions.
    pub fn step_from(self, from: Pos) -> Option<Pos> {
        match self {
            Action::Right => Some(Pos::new(from.x + 1, from.y)),
            Action::Left => Some(Pos::new(from.x.checked_sub(1)?, from.y)),
            Action::Down => Some(Pos::new(from.x, from.y + 1)),
            Action::Up => Some(Pos::new(from.x, from.y.checked_sub(1)?)),
            _ => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::Up => "UP",
            Action::Down => "DOWN",
            Action::Left => "LEFT",
            Action::Right => "RIGHT",
            Action::Pickup => "PICKUP",
            Action::Use1 => "USE_1",
            Action::Use2 => "USE_2",
            Action::Use3 => "USE_3",
            Action::Use4 => "USE_4",
            Action::Use5 => "USE_5",
        };
        f.write_str(name)
    }
}

/// How an interaction action affects the item under the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Pickup,
    Transform,
}
