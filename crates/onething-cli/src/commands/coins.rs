use clap::Subcommand;
use serde_json::json;

use super::{open_app, print_json, CliResult};

#[derive(Subcommand)]
pub enum CoinsAction {
    /// Balance and totals
    Show,
    /// Recent transactions, newest first
    History {
        /// Maximum number of entries
        #[arg(long, default_value = "20")]
        limit: usize,
    },
}

pub async fn run(action: CoinsAction) -> CliResult {
    let app = open_app()?;
    let ledger = app.ledger();

    match action {
        CoinsAction::Show => {
            let state = ledger.state()?;
            print_json(&json!({
                "balance": state.balance,
                "total_earned": state.total_earned,
                "total_spent": state.total_spent,
                "today_earned": ledger.today_earned()?,
                "consecutive_completed": state.consecutive_completed,
            }))?;
        }
        CoinsAction::History { limit } => {
            let txs = ledger.transactions()?;
            print_json(&txs[..limit.min(txs.len())])?;
        }
    }

    app.shutdown().await;
    Ok(())
}
