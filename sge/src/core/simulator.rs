//! Grid-world state machine: generation on reset, action resolution and
//! mobile-object drift.

use std::sync::Arc;

use rand::Rng;
use rand::seq::SliceRandom;

use crate::core::generate::generate;
use crate::core::grid::{Cell, GridState};
use crate::core::types::{Action, ObjectKind, OperationKind, Pos, SubtaskId};
use crate::error::{EnvError, GenerationError};
use crate::games::GameConfig;

/// Single-episode grid simulator.
///
/// `Uninitialized` until the first [`GridWorld::reset`]; afterwards every
/// [`GridWorld::act`] mutates the generated grid in place. Only `reset`
/// regenerates.
#[derive(Debug, Clone)]
pub struct GridWorld {
    config: Arc<GameConfig>,
    grid: Option<GridState>,
}

impl GridWorld {
    pub fn new(config: Arc<GameConfig>) -> Self {
        Self { config, grid: None }
    }

    /// Simulator over a hand-built grid, skipping generation.
    pub fn from_grid(config: Arc<GameConfig>, grid: GridState) -> Self {
        Self {
            config,
            grid: Some(grid),
        }
    }

    /// Generate a fresh grid holding one item per required subtask.
    ///
    /// On error the previous grid is discarded; no partial grid is kept.
    pub fn reset<R: Rng + ?Sized>(
        &mut self,
        required: &[SubtaskId],
        rng: &mut R,
    ) -> Result<(), GenerationError> {
        self.grid = None;
        self.grid = Some(generate(&self.config, required, rng)?);
        Ok(())
    }

    /// Apply `action`, then let mobile objects drift.
    ///
    /// Returns the kind of the item under the agent for interaction actions,
    /// whether or not the operation applied to it. Moves always return `None`.
    pub fn act<R: Rng + ?Sized>(
        &mut self,
        action: Action,
        rng: &mut R,
    ) -> Result<Option<ObjectKind>, EnvError> {
        if !self.config.is_legal(action) {
            return Err(EnvError::IllegalAction { action });
        }
        let config = &self.config;
        let grid = self.grid.as_mut().ok_or(EnvError::NotReset)?;

        let acted_on = if action.is_move() {
            let agent = grid.agent();
            if let Some(dest) = action.step_from(agent).filter(|pos| grid.is_passable(*pos)) {
                grid.set_agent(dest);
            }
            None
        } else {
            let pos = grid.agent();
            let kind = grid.item_at(pos);
            if let (Some(kind), Some(op)) = (kind, config.operation(action)) {
                perform(grid, config, op.kind, kind, pos);
            }
            kind
        };

        drift(grid, config, rng);
        Ok(acted_on)
    }

    pub fn grid(&self) -> Option<&GridState> {
        self.grid.as_ref()
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }
}

fn perform(
    grid: &mut GridState,
    config: &GameConfig,
    op: OperationKind,
    kind: ObjectKind,
    pos: Pos,
) {
    let param = config.object(kind);
    match op {
        OperationKind::Pickup if param.pickable => {
            grid.remove_item_at(pos);
        }
        OperationKind::Transform if param.transformable => {
            grid.remove_item_at(pos);
            if let Some(outcome) = param.outcome {
                grid.add_item(outcome, pos);
            }
        }
        _ => {}
    }
}

/// Each mobile object moves with probability `speed` to a uniformly chosen
/// empty orthogonal neighbour. Objects never displace each other.
fn drift<R: Rng + ?Sized>(grid: &mut GridState, config: &GameConfig, rng: &mut R) {
    for idx in 0..grid.objects().len() {
        let obj = grid.objects()[idx];
        let speed = config.object(obj.kind).speed;
        if speed <= 0.0 || rng.gen_range(0.0..1.0) >= speed {
            continue;
        }
        let candidates: Vec<Pos> = obj
            .pos
            .neighbours()
            .filter(|pos| grid.cell(*pos) == Some(Cell::Empty))
            .collect();
        if let Some(dest) = candidates.choose(rng) {
            grid.move_object(idx, *dest);
        }
    }
}
