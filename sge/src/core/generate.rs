//! Procedural grid generation with a connectivity guarantee.

use std::collections::HashSet;

use rand::Rng;
use rand::seq::SliceRandom;

use crate::core::grid::{Cell, GridState};
use crate::core::types::{Pos, SubtaskId};
use crate::error::GenerationError;
use crate::games::GameConfig;

/// Generate a fresh grid for an episode whose graph requires `required`.
///
/// Order of random draws: block count, block candidates, water count, water
/// candidates, item cells, filler counts (catalog order). Given the same RNG
/// state the same grid is produced.
pub fn generate<R: Rng + ?Sized>(
    config: &GameConfig,
    required: &[SubtaskId],
    rng: &mut R,
) -> Result<GridState, GenerationError> {
    let mut grid = GridState::bordered(config.width, config.height);

    let requested = sample_count(config.block_range, rng);
    let placed = place_terrain(&mut grid, Cell::Wall, requested, rng);
    if placed != requested {
        return Err(GenerationError::BlockBudget { requested, placed });
    }

    let requested = sample_count(config.water_range, rng);
    let placed = place_terrain(&mut grid, Cell::Water, requested, rng);
    if placed != requested {
        return Err(GenerationError::WaterBudget { requested, placed });
    }

    place_items(&mut grid, config, required, rng)?;
    Ok(grid)
}

fn sample_count<R: Rng + ?Sized>((min, max): (usize, usize), rng: &mut R) -> usize {
    if min < max { rng.gen_range(min..max) } else { 0 }
}

/// Turn up to `count` random free cells into `terrain`, accepting a cell only
/// if the remaining free cells stay mutually reachable. Returns how many were
/// placed.
fn place_terrain<R: Rng + ?Sized>(
    grid: &mut GridState,
    terrain: Cell,
    count: usize,
    rng: &mut R,
) -> usize {
    if count == 0 {
        return 0;
    }
    let mut pool = grid.positions_of(Cell::Empty);
    pool.shuffle(rng);

    let mut placed = 0;
    for candidate in pool {
        if placed == count {
            break;
        }
        if grid.is_connected_without(Some(candidate)) {
            grid.set_terrain(candidate, terrain);
            placed += 1;
        }
    }
    placed
}

/// Required items (one per subtask, unique kinds once), then fillers, then the
/// agent, each on a distinct free cell.
fn place_items<R: Rng + ?Sized>(
    grid: &mut GridState,
    config: &GameConfig,
    required: &[SubtaskId],
    rng: &mut R,
) -> Result<(), GenerationError> {
    let mut pool = grid.positions_of(Cell::Empty);
    pool.shuffle(rng);
    let mut cells = FreeCells::new(pool);

    let mut placed_unique = HashSet::new();
    for id in required {
        let kind = config.subtask(*id).object;
        if config.object(kind).unique && !placed_unique.insert(kind) {
            continue;
        }
        let pos = cells.take()?;
        grid.add_item(kind, pos);
    }

    for (kind, param) in config.objects.iter().enumerate() {
        let Some(max) = param.max_filler else {
            continue;
        };
        let count = rng.gen_range(0..=max);
        for _ in 0..count {
            let pos = cells.take()?;
            grid.add_item(kind, pos);
        }
    }

    let pos = cells.take()?;
    grid.set_agent(pos);
    Ok(())
}

/// Shuffled free cells consumed front to back.
struct FreeCells {
    pool: Vec<Pos>,
    next: usize,
}

impl FreeCells {
    fn new(pool: Vec<Pos>) -> Self {
        Self { pool, next: 0 }
    }

    fn take(&mut self) -> Result<Pos, GenerationError> {
        let pos = self
            .pool
            .get(self.next)
            .copied()
            .ok_or(GenerationError::OutOfCells {
                needed: self.next + 1,
                available: self.pool.len(),
            })?;
        self.next += 1;
        Ok(pos)
    }
}
