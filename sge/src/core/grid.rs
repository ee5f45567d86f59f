//! Grid geometry, occupancy and the observation tensor.

use std::collections::VecDeque;

use serde::Serialize;

use crate::core::types::{ObjectKind, Pos};

/// Observation layer holding the agent.
pub const AGENT_LAYER: usize = 0;
/// Observation layer holding walls (boundary ring included).
pub const BLOCK_LAYER: usize = 1;
pub const WATER_LAYER: usize = 2;
/// Object kind `k` is drawn on layer `OBJ_LAYER_BIAS + k`.
pub const OBJ_LAYER_BIAS: usize = 3;

/// Static terrain or the item occupying a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Empty,
    Wall,
    Water,
    Item(ObjectKind),
}

/// An item instance on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GridObject {
    pub kind: ObjectKind,
    pub pos: Pos,
}

/// Episode-scoped grid. Terrain is fixed after generation; only item cells and
/// the agent position change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridState {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
    objects: Vec<GridObject>,
    agent: Pos,
}

impl GridState {
    /// Grid with a wall ring around an empty interior. The agent starts at
    /// `(1, 1)` until placed.
    pub fn bordered(width: usize, height: usize) -> Self {
        let mut cells = vec![Cell::Empty; width * height];
        for x in 0..width {
            for y in 0..height {
                if x == 0 || y == 0 || x + 1 == width || y + 1 == height {
                    cells[x * height + y] = Cell::Wall;
                }
            }
        }
        Self {
            width,
            height,
            cells,
            objects: Vec::new(),
            agent: Pos::new(1, 1),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn in_bounds(&self, pos: Pos) -> bool {
        pos.x < self.width && pos.y < self.height
    }

    /// Cell at `pos`, or `None` outside the grid.
    pub fn cell(&self, pos: Pos) -> Option<Cell> {
        self.in_bounds(pos)
            .then(|| self.cells[pos.x * self.height + pos.y])
    }

    /// Terrain setter used by generation; items go through [`Self::add_item`].
    pub fn set_terrain(&mut self, pos: Pos, cell: Cell) {
        debug_assert!(matches!(cell, Cell::Empty | Cell::Wall | Cell::Water));
        let idx = pos.x * self.height + pos.y;
        self.cells[idx] = cell;
    }

    /// Neither wall nor water. Items never block movement.
    pub fn is_passable(&self, pos: Pos) -> bool {
        matches!(self.cell(pos), Some(Cell::Empty | Cell::Item(_)))
    }

    pub fn item_at(&self, pos: Pos) -> Option<ObjectKind> {
        match self.cell(pos) {
            Some(Cell::Item(kind)) => Some(kind),
            _ => None,
        }
    }

    pub fn agent(&self) -> Pos {
        self.agent
    }

    pub fn set_agent(&mut self, pos: Pos) {
        debug_assert!(self.is_passable(pos));
        self.agent = pos;
    }

    pub fn objects(&self) -> &[GridObject] {
        &self.objects
    }

    /// Place an item on an empty cell.
    pub fn add_item(&mut self, kind: ObjectKind, pos: Pos) {
        debug_assert_eq!(self.cell(pos), Some(Cell::Empty));
        self.cells[pos.x * self.height + pos.y] = Cell::Item(kind);
        self.objects.push(GridObject { kind, pos });
    }

    /// Remove the item at `pos`, if any.
    pub fn remove_item_at(&mut self, pos: Pos) -> Option<GridObject> {
        let idx = self.objects.iter().position(|obj| obj.pos == pos)?;
        let removed = self.objects.remove(idx);
        self.cells[pos.x * self.height + pos.y] = Cell::Empty;
        Some(removed)
    }

    /// Move object `idx` onto the empty cell `dest`.
    pub fn move_object(&mut self, idx: usize, dest: Pos) {
        debug_assert_eq!(self.cell(dest), Some(Cell::Empty));
        let obj = &mut self.objects[idx];
        self.cells[obj.pos.x * self.height + obj.pos.y] = Cell::Empty;
        self.cells[dest.x * self.height + dest.y] = Cell::Item(obj.kind);
        obj.pos = dest;
    }

    /// All positions holding `cell`, in column-major order.
    pub fn positions_of(&self, cell: Cell) -> Vec<Pos> {
        self.positions()
            .filter(|pos| self.cells[pos.x * self.height + pos.y] == cell)
            .collect()
    }

    /// Passable cells (neither wall nor water) in column-major order.
    pub fn passable_cells(&self) -> Vec<Pos> {
        self.positions().filter(|pos| self.is_passable(*pos)).collect()
    }

    /// True when every passable cell reaches every other one.
    pub fn is_connected(&self) -> bool {
        self.is_connected_without(None)
    }

    /// Connectivity of the passable cells after also treating `blocked` as
    /// impassable. A set with no cells left counts as connected.
    pub fn is_connected_without(&self, blocked: Option<Pos>) -> bool {
        let open = |pos: Pos| Some(pos) != blocked && self.is_passable(pos);
        let total = self.positions().filter(|pos| open(*pos)).count();
        let Some(start) = self.positions().find(|pos| open(*pos)) else {
            return true;
        };

        let mut seen = vec![false; self.cells.len()];
        seen[start.x * self.height + start.y] = true;
        let mut queue = VecDeque::from([start]);
        let mut visited = 0;
        while let Some(pos) = queue.pop_front() {
            visited += 1;
            for next in pos.neighbours() {
                if !open(next) {
                    continue;
                }
                let idx = next.x * self.height + next.y;
                if !seen[idx] {
                    seen[idx] = true;
                    queue.push_back(next);
                }
            }
        }
        visited == total
    }

    /// Multi-layer occupancy tensor `[nb_obj_type + 3, width, height]`.
    pub fn observation(&self, nb_obj_type: usize) -> Observation {
        let mut obs = Observation::zeros(nb_obj_type + OBJ_LAYER_BIAS, self.width, self.height);
        for pos in self.positions() {
            match self.cells[pos.x * self.height + pos.y] {
                Cell::Wall => obs.set(BLOCK_LAYER, pos),
                Cell::Water => obs.set(WATER_LAYER, pos),
                Cell::Item(kind) => obs.set(OBJ_LAYER_BIAS + kind, pos),
                Cell::Empty => {}
            }
        }
        obs.set(AGENT_LAYER, self.agent);
        obs
    }

    fn positions(&self) -> impl Iterator<Item = Pos> + '_ {
        (0..self.width).flat_map(move |x| (0..self.height).map(move |y| Pos::new(x, y)))
    }
}

/// Dense `u8` occupancy tensor in `[layer][x][y]` order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Observation {
    layers: usize,
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl Observation {
    fn zeros(layers: usize, width: usize, height: usize) -> Self {
        Self {
            layers,
            width,
            height,
            data: vec![0; layers * width * height],
        }
    }

    fn set(&mut self, layer: usize, pos: Pos) {
        let idx = (layer * self.width + pos.x) * self.height + pos.y;
        self.data[idx] = 1;
    }

    pub fn get(&self, layer: usize, pos: Pos) -> u8 {
        self.data[(layer * self.width + pos.x) * self.height + pos.y]
    }

    pub fn shape(&self) -> [usize; 3] {
        [self.layers, self.width, self.height]
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }
}
