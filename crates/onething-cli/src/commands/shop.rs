use clap::Subcommand;
use onething_core::shop::{items_in_category, ItemCategory};
use onething_core::PurchaseOutcome;
use serde_json::json;

use super::{open_app, print_json, CliResult};

#[derive(Subcommand)]
pub enum ShopAction {
    /// List items with price and ownership
    List {
        /// furniture, plant, pet, deco, electronic or food
        #[arg(long)]
        category: Option<ItemCategory>,
    },
    /// Buy an item; it is placed in the first free cell
    Buy {
        /// Item ID
        id: String,
    },
}

pub async fn run(action: ShopAction) -> CliResult {
    let mut app = open_app()?;

    match action {
        ShopAction::List { category } => {
            let balance = app.ledger().balance()?;
            let mut rows = Vec::new();
            for item in items_in_category(category) {
                rows.push(json!({
                    "item": item,
                    "owned": app.shop().has_purchased(item.id)?,
                    "affordable": item.price <= balance,
                }));
            }
            print_json(&rows)?;
        }
        ShopAction::Buy { id } => {
            let outcome = app.purchase(&id)?;
            print_json(&outcome)?;
            if !matches!(outcome, PurchaseOutcome::Purchased { .. }) {
                app.shutdown().await;
                return Err(format!("purchase of {id} failed").into());
            }
        }
    }

    app.shutdown().await;
    Ok(())
}
