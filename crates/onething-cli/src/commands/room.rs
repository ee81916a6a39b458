//! Room layout commands.

use clap::Subcommand;
use onething_core::room::{RoomState, GRID_COLS, GRID_ROWS};
use onething_core::shop::shop_item;
use serde_json::json;

use super::{open_app, parse_cell, print_json, CliResult};

#[derive(Subcommand)]
pub enum RoomAction {
    /// Draw the room
    Show {
        /// Print the layout as JSON instead
        #[arg(long)]
        json: bool,
    },
    /// Place an owned item into an empty cell
    Place {
        /// Shop item ID
        item_id: String,
        /// Target cell as x,y
        #[arg(value_parser = parse_cell)]
        cell: (i32, i32),
    },
    /// Take the item out of a cell
    Remove {
        #[arg(value_parser = parse_cell)]
        cell: (i32, i32),
    },
    /// Move an item into an empty cell
    Move {
        #[arg(value_parser = parse_cell)]
        from: (i32, i32),
        #[arg(value_parser = parse_cell)]
        to: (i32, i32),
    },
    /// Swap the contents of two cells
    Swap {
        #[arg(value_parser = parse_cell)]
        a: (i32, i32),
        #[arg(value_parser = parse_cell)]
        b: (i32, i32),
    },
    /// Change wall and floor colours (#RRGGBB)
    Colors {
        #[arg(long)]
        wall: Option<String>,
        #[arg(long)]
        floor: Option<String>,
    },
}

/// One line per row; empty cells are dots.
fn render(state: &RoomState) -> String {
    let mut out = format!(
        "Room Lv.{}  wall {}  floor {}\n",
        state.room_level, state.wall_color, state.floor_color
    );
    out.push_str("   ");
    for x in 0..GRID_COLS {
        out.push_str(&format!("{x:<3}"));
    }
    out.push('\n');
    for y in 0..GRID_ROWS {
        out.push_str(&format!("{y:<3}"));
        for x in 0..GRID_COLS {
            let glyph = state.grid[y][x]
                .as_deref()
                .map(|id| shop_item(id).map_or("?", |item| item.emoji))
                .unwrap_or("·");
            out.push_str(&format!("{glyph:<3}"));
        }
        out.push('\n');
    }
    out
}

fn refused(what: &str) -> Box<dyn std::error::Error> {
    format!("{what} refused").into()
}

pub async fn run(action: RoomAction) -> CliResult {
    let mut app = open_app()?;

    match action {
        RoomAction::Show { json } => {
            let state = app.room().state()?;
            if json {
                print_json(state)?;
            } else {
                print!("{}", render(state));
            }
        }
        RoomAction::Place { item_id, cell } => {
            if !app.place_item(&item_id, cell.0, cell.1)? {
                return Err(refused("place"));
            }
            print_json(&json!({ "placed": item_id, "cell": cell }))?;
        }
        RoomAction::Remove { cell } => {
            let item = app.room().item_at(cell.0, cell.1)?.map(str::to_string);
            if !app.remove_item(cell.0, cell.1)? {
                return Err(refused("remove"));
            }
            print_json(&json!({ "removed": item, "cell": cell }))?;
        }
        RoomAction::Move { from, to } => {
            if !app.move_item(from, to)? {
                return Err(refused("move"));
            }
            print_json(&json!({ "from": from, "to": to }))?;
        }
        RoomAction::Swap { a, b } => {
            if !app.swap_items(a, b)? {
                return Err(refused("swap"));
            }
            print_json(&json!({ "swapped": [a, b] }))?;
        }
        RoomAction::Colors { wall, floor } => {
            app.set_room_colors(wall.as_deref(), floor.as_deref())?;
            let state = app.room().state()?;
            print_json(&json!({
                "wall_color": state.wall_color,
                "floor_color": state.floor_color,
            }))?;
        }
    }

    app.shutdown().await;
    Ok(())
}
