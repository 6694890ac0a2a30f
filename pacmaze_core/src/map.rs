use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

use crate::Position;

/// What occupies a single maze cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CellKind {
    #[default]
    Wall,
    Open,
    /// An open cell still holding a collectible.
    Pickup,
}

impl CellKind {
    #[inline]
    pub fn is_wall(self) -> bool {
        self == CellKind::Wall
    }
}

/// A generic 2D grid stored row-major in a flat vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid<T> {
    width: usize,
    height: usize,
    cells: Vec<T>,
}

impl<T> Grid<T> {
    /// Creates a new grid with the specified dimensions, filled with default values.
    ///
    /// # Panics
    ///
    /// Panics if `width * height` overflows `usize`.
    pub fn new(width: usize, height: usize) -> Self
    where
        T: Default + Clone,
    {
        let size = width.checked_mul(height).expect("Grid size overflow");
        Grid {
            width,
            height,
            cells: vec![T::default(); size],
        }
    }

    /// Creates a grid whose cells are produced by `f(x, y)`, visited row by row.
    ///
    /// # Panics
    ///
    /// Panics if `width * height` overflows `usize`.
    pub fn from_generator<F>(width: usize, height: usize, mut f: F) -> Self
    where
        F: FnMut(usize, usize) -> T,
    {
        let size = width.checked_mul(height).expect("Grid size overflow");
        let mut cells = Vec::with_capacity(size);
        for y in 0..height {
            for x in 0..width {
                cells.push(f(x, y));
            }
        }
        Grid {
            width,
            height,
            cells,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn coords_to_index(&self, x: usize, y: usize) -> Option<usize> {
        if self.is_valid(x, y) {
            Some(y * self.width + x)
        } else {
            None
        }
    }

    /// Checks if the given coordinates are within the grid boundaries.
    #[inline]
    pub fn is_valid(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height
    }

    /// Gets an immutable reference to the cell at the given coordinates.
    pub fn get(&self, x: usize, y: usize) -> Option<&T> {
        self.coords_to_index(x, y).map(|index| &self.cells[index])
    }

    /// Gets a mutable reference to the cell at the given coordinates.
    pub fn get_mut(&mut self, x: usize, y: usize) -> Option<&mut T> {
        let index = self.coords_to_index(x, y)?;
        Some(&mut self.cells[index])
    }

    /// Returns an iterator that yields `((x, y), &T)` for each cell.
    pub fn enumerate(&self) -> impl Iterator<Item = ((usize, usize), &T)> {
        let width = self.width;
        self.cells
            .iter()
            .enumerate()
            .map(move |(index, cell)| ((index % width, index / width), cell))
    }

    /// Sets every cell on the outermost ring to `value`.
    pub fn fill_border(&mut self, value: T)
    where
        T: Clone,
    {
        let (width, height) = (self.width, self.height);
        if width == 0 || height == 0 {
            return;
        }
        for x in 0..width {
            self[(x, 0)] = value.clone();
            self[(x, height - 1)] = value.clone();
        }
        for y in 0..height {
            self[(0, y)] = value.clone();
            self[(width - 1, y)] = value.clone();
        }
    }
}

impl Grid<CellKind> {
    /// Kind of the cell at `(x, y)`; anything outside the grid reads as `Wall`.
    pub fn cell_kind_at(&self, x: usize, y: usize) -> CellKind {
        self.get(x, y).copied().unwrap_or(CellKind::Wall)
    }

    /// Kind of the cell `(dx, dy)` away from `position`, reading out-of-range as `Wall`.
    pub fn cell_kind_offset(&self, position: Position, dx: isize, dy: isize) -> CellKind {
        position
            .offset(dx, dy)
            .map_or(CellKind::Wall, |p| self.cell_kind_at(p.x, p.y))
    }

    /// Iterates the room cells (odd/odd coordinates) in row-major order.
    pub fn rooms(&self) -> impl Iterator<Item = Position> + '_ {
        (1..self.height)
            .step_by(2)
            .flat_map(move |y| (1..self.width).step_by(2).map(move |x| Position { x, y }))
    }

    /// True if `position` is a room cell lying inside the grid.
    pub fn is_room(&self, position: Position) -> bool {
        position.is_room() && self.is_valid(position.x, position.y)
    }

    /// Number of cells still holding a pickup.
    pub fn pickup_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c == CellKind::Pickup).count()
    }
}

impl<T> Index<(usize, usize)> for Grid<T> {
    type Output = T;

    #[inline]
    fn index(&self, (x, y): (usize, usize)) -> &Self::Output {
        match self.coords_to_index(x, y) {
            Some(idx) => &self.cells[idx],
            None => panic!(
                "Grid index ({}, {}) out of bounds for grid size ({}, {})",
                x, y, self.width, self.height
            ),
        }
    }
}

impl<T> IndexMut<(usize, usize)> for Grid<T> {
    #[inline]
    fn index_mut(&mut self, (x, y): (usize, usize)) -> &mut Self::Output {
        match self.coords_to_index(x, y) {
            Some(idx) => &mut self.cells[idx],
            None => panic!(
                "Grid index ({}, {}) out of bounds for grid size ({}, {})",
                x, y, self.width, self.height
            ),
        }
    }
}

impl<T> Index<Position> for Grid<T> {
    type Output = T;

    #[inline]
    fn index(&self, index: Position) -> &Self::Output {
        &self[(index.x, index.y)]
    }
}

impl<T> IndexMut<Position> for Grid<T> {
    #[inline]
    fn index_mut(&mut self, index: Position) -> &mut Self::Output {
        &mut self[(index.x, index.y)]
    }
}
