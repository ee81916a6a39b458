//! The decoratable room: a fixed grid of placed items.

mod grid;

pub use grid::{
    room_level, PlacedItem, RoomGrid, RoomSnapshot, RoomState, GRID_COLS, GRID_ROWS, ROOM_KEY,
};
