//! Dense row-major storage for per-tile planner state.
//! This module exists so ledgers, danger maps and sim layers share one bounds policy.
//! It does not own any knowledge of what the stored values mean.

use serde::{Deserialize, Serialize};

use crate::types::TileCoord;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid<T> {
    width: i32,
    height: i32,
    cells: Vec<T>,
}

impl<T: Clone> Grid<T> {
    pub fn new(width: i32, height: i32, value: T) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        Self { width, height, cells: vec![value; (width * height) as usize] }
    }

    pub fn fill(&mut self, value: T) {
        self.cells.fill(value);
    }
}

impl<T> Grid<T> {
    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn in_bounds(&self, at: TileCoord) -> bool {
        at.x >= 0 && at.y >= 0 && at.x < self.width && at.y < self.height
    }

    fn index(&self, at: TileCoord) -> Option<usize> {
        self.in_bounds(at).then(|| (at.y * self.width + at.x) as usize)
    }

    pub fn get(&self, at: TileCoord) -> Option<&T> {
        self.index(at).map(|idx| &self.cells[idx])
    }

    pub fn get_mut(&mut self, at: TileCoord) -> Option<&mut T> {
        self.index(at).map(|idx| &mut self.cells[idx])
    }

    /// Writes outside the grid are dropped.
    pub fn set(&mut self, at: TileCoord, value: T) {
        if let Some(cell) = self.get_mut(at) {
            *cell = value;
        }
    }

    /// Row-major coordinates, the scan order every planner sweep relies on.
    pub fn coords(&self) -> impl Iterator<Item = TileCoord> + use<T> {
        let (width, height) = (self.width, self.height);
        (0..height).flat_map(move |y| (0..width).map(move |x| TileCoord::new(x, y)))
    }

    pub fn cells(&self) -> &[T] {
        &self.cells
    }
}

impl<T: Copy + Default> Grid<T> {
    /// Out-of-bounds reads return the default value.
    pub fn at(&self, at: TileCoord) -> T {
        self.get(at).copied().unwrap_or_default()
    }
}
