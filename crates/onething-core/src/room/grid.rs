//! Room placement grid.
//!
//! The cell matrix and the placed-item list always describe the same layout:
//! every occupied cell has exactly one placed item at that coordinate and
//! vice versa. Coordinates are `(x, y)` with `x` the column.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::clock::Clock;
use crate::error::Result;
use crate::storage::{Persisted, StateStore};

pub const ROOM_KEY: &str = "onething-room";
pub const GRID_ROWS: usize = 6;
pub const GRID_COLS: usize = 8;

const DEFAULT_WALL: &str = "#FFF8F0";
const DEFAULT_FLOOR: &str = "#F5F0E8";

/// Level thresholds: item count at which each level starts (levels 1..=6).
const LEVEL_THRESHOLDS: [usize; 6] = [0, 3, 6, 10, 15, 20];

/// Room level for a number of placed items.
pub fn room_level(item_count: usize) -> u8 {
    LEVEL_THRESHOLDS
        .iter()
        .rposition(|&min| item_count >= min)
        .map_or(1, |i| i as u8 + 1)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedItem {
    pub item_id: String,
    pub grid_x: u8,
    pub grid_y: u8,
    pub placed_at: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomState {
    /// `grid[y][x]`
    pub grid: Vec<Vec<Option<String>>>,
    pub placed_items: Vec<PlacedItem>,
    pub room_level: u8,
    pub wall_color: String,
    pub floor_color: String,
}

impl Default for RoomState {
    fn default() -> Self {
        Self {
            grid: vec![vec![None; GRID_COLS]; GRID_ROWS],
            placed_items: Vec::new(),
            room_level: 1,
            wall_color: DEFAULT_WALL.into(),
            floor_color: DEFAULT_FLOOR.into(),
        }
    }
}

impl RoomState {
    fn at(&self, x: usize, y: usize) -> Option<&String> {
        self.grid.get(y)?.get(x)?.as_ref()
    }

    fn set(&mut self, x: usize, y: usize, item: Option<String>) {
        if let Some(cell) = self.grid.get_mut(y).and_then(|row| row.get_mut(x)) {
            *cell = item;
        }
    }

    fn record_mut(&mut self, x: usize, y: usize) -> Option<&mut PlacedItem> {
        self.placed_items
            .iter_mut()
            .find(|p| p.grid_x as usize == x && p.grid_y as usize == y)
    }

    fn relevel(&mut self) {
        self.room_level = room_level(self.placed_items.len());
    }

    /// Rebuild the cell matrix from the placed-item list.
    fn rebuild_grid(&mut self) {
        self.grid = vec![vec![None; GRID_COLS]; GRID_ROWS];
        let mut kept = Vec::with_capacity(self.placed_items.len());
        for item in std::mem::take(&mut self.placed_items) {
            let (x, y) = (item.grid_x as usize, item.grid_y as usize);
            if x < GRID_COLS && y < GRID_ROWS && self.grid[y][x].is_none() {
                self.grid[y][x] = Some(item.item_id.clone());
                kept.push(item);
            }
        }
        self.placed_items = kept;
        self.relevel();
    }

    fn is_consistent(&self) -> bool {
        if self.grid.len() != GRID_ROWS || self.grid.iter().any(|r| r.len() != GRID_COLS) {
            return false;
        }
        let occupied = self.grid.iter().flatten().filter(|c| c.is_some()).count();
        occupied == self.placed_items.len()
            && self.placed_items.iter().all(|p| {
                self.at(p.grid_x as usize, p.grid_y as usize) == Some(&p.item_id)
            })
    }
}

/// What the remote mirror receives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomSnapshot {
    pub placed_items: Vec<PlacedItem>,
    pub wall_color: String,
    pub floor_color: String,
    pub room_level: u8,
    /// Clock time the snapshot was taken.
    pub updated_at: DateTime<FixedOffset>,
}

fn cell(x: i32, y: i32) -> Option<(usize, usize)> {
    let (x, y) = (usize::try_from(x).ok()?, usize::try_from(y).ok()?);
    (x < GRID_COLS && y < GRID_ROWS).then_some((x, y))
}

pub struct RoomGrid {
    state: Persisted<RoomState>,
    clock: Arc<dyn Clock>,
}

impl RoomGrid {
    pub fn new(backend: Arc<dyn StateStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Persisted::new(ROOM_KEY, backend),
            clock,
        }
    }

    /// Load the room; a record whose grid disagrees with its item list is
    /// rebuilt from the list.
    pub fn hydrate(&mut self) -> Result<()> {
        self.state.hydrate()?;
        if !self.state.get()?.is_consistent() {
            tracing::warn!("room record inconsistent; rebuilding grid from placed items");
            self.state.update(RoomState::rebuild_grid)?;
        }
        Ok(())
    }

    pub fn is_hydrated(&self) -> bool {
        self.state.is_hydrated()
    }

    pub fn state(&self) -> Result<&RoomState> {
        self.state.get()
    }

    pub fn level(&self) -> Result<u8> {
        Ok(self.state.get()?.room_level)
    }

    pub fn placed_items(&self) -> Result<&[PlacedItem]> {
        Ok(&self.state.get()?.placed_items)
    }

    /// Item at a cell, `None` for empty or out-of-bounds cells.
    pub fn item_at(&self, x: i32, y: i32) -> Result<Option<&str>> {
        let state = self.state.get()?;
        Ok(cell(x, y).and_then(|(x, y)| state.at(x, y)).map(String::as_str))
    }

    /// First empty cell in row-major order.
    pub fn first_free_cell(&self) -> Result<Option<(i32, i32)>> {
        let state = self.state.get()?;
        for y in 0..GRID_ROWS {
            for x in 0..GRID_COLS {
                if state.at(x, y).is_none() {
                    return Ok(Some((x as i32, y as i32)));
                }
            }
        }
        Ok(None)
    }

    pub fn snapshot(&self) -> Result<RoomSnapshot> {
        let s = self.state.get()?;
        Ok(RoomSnapshot {
            placed_items: s.placed_items.clone(),
            wall_color: s.wall_color.clone(),
            floor_color: s.floor_color.clone(),
            room_level: s.room_level,
            updated_at: self.clock.now(),
        })
    }

    /// Put an item into an empty in-bounds cell.
    pub fn place(&mut self, item_id: &str, x: i32, y: i32) -> Result<bool> {
        let Some((cx, cy)) = cell(x, y) else {
            return Ok(false);
        };
        if self.state.get()?.at(cx, cy).is_some() {
            return Ok(false);
        }
        let placed = PlacedItem {
            item_id: item_id.to_string(),
            grid_x: cx as u8,
            grid_y: cy as u8,
            placed_at: self.clock.now(),
        };
        self.state.update(|s| {
            s.set(cx, cy, Some(placed.item_id.clone()));
            s.placed_items.push(placed);
            s.relevel();
        })?;
        debug!(item_id, x, y, "item placed");
        Ok(true)
    }

    /// Clear a cell. Empty or out-of-bounds cells are left alone.
    pub fn remove(&mut self, x: i32, y: i32) -> Result<bool> {
        let Some((cx, cy)) = cell(x, y) else {
            return Ok(false);
        };
        if self.state.get()?.at(cx, cy).is_none() {
            return Ok(false);
        }
        self.state.update(|s| {
            s.set(cx, cy, None);
            s.placed_items
                .retain(|p| !(p.grid_x as usize == cx && p.grid_y as usize == cy));
            s.relevel();
        })?;
        debug!(x, y, "item removed");
        Ok(true)
    }

    /// Relocate an item to an empty cell, keeping its placement record.
    pub fn move_item(&mut self, from_x: i32, from_y: i32, to_x: i32, to_y: i32) -> Result<bool> {
        let (Some((fx, fy)), Some((tx, ty))) = (cell(from_x, from_y), cell(to_x, to_y)) else {
            return Ok(false);
        };
        let state = self.state.get()?;
        let Some(item) = state.at(fx, fy).cloned() else {
            return Ok(false);
        };
        if state.at(tx, ty).is_some() {
            return Ok(false);
        }
        self.state.update(|s| {
            s.set(fx, fy, None);
            s.set(tx, ty, Some(item));
            if let Some(record) = s.record_mut(fx, fy) {
                record.grid_x = tx as u8;
                record.grid_y = ty as u8;
            }
        })?;
        debug!(from_x, from_y, to_x, to_y, "item moved");
        Ok(true)
    }

    /// Exchange two cells; with an empty destination this is a move.
    pub fn swap(&mut self, from_x: i32, from_y: i32, to_x: i32, to_y: i32) -> Result<bool> {
        let (Some((fx, fy)), Some((tx, ty))) = (cell(from_x, from_y), cell(to_x, to_y)) else {
            return Ok(false);
        };
        let state = self.state.get()?;
        let Some(from_item) = state.at(fx, fy).cloned() else {
            return Ok(false);
        };
        if (fx, fy) == (tx, ty) {
            return Ok(true);
        }
        let to_item = state.at(tx, ty).cloned();
        self.state.update(|s| {
            s.set(fx, fy, to_item);
            s.set(tx, ty, Some(from_item));
            // Retarget by index so the second update can't catch the first.
            let from_idx = s
                .placed_items
                .iter()
                .position(|p| p.grid_x as usize == fx && p.grid_y as usize == fy);
            let to_idx = s
                .placed_items
                .iter()
                .position(|p| p.grid_x as usize == tx && p.grid_y as usize == ty);
            if let Some(i) = from_idx {
                s.placed_items[i].grid_x = tx as u8;
                s.placed_items[i].grid_y = ty as u8;
            }
            if let Some(i) = to_idx {
                s.placed_items[i].grid_x = fx as u8;
                s.placed_items[i].grid_y = fy as u8;
            }
        })?;
        debug!(from_x, from_y, to_x, to_y, "items swapped");
        Ok(true)
    }

    pub fn set_wall_color(&mut self, color: &str) -> Result<()> {
        self.state.update(|s| s.wall_color = color.to_string())
    }

    pub fn set_floor_color(&mut self, color: &str) -> Result<()> {
        self.state.update(|s| s.floor_color = color.to_string())
    }
}
