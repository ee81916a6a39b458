//! Coin ledger.
//!
//! `balance == total_earned - total_spent` after every operation; both totals
//! only grow, and lifetime earnings stop at [`MAX_TOTAL_EARNED`]. The
//! transaction log keeps the newest [`MAX_TRANSACTIONS`] entries.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::Result;
use crate::storage::{Persisted, StateStore};

pub const COINS_KEY: &str = "onething-coins";
pub const MAX_TRANSACTIONS: usize = 100;
/// Ceiling on `total_earned`; every transaction amount then fits an `i64`.
pub const MAX_TOTAL_EARNED: u64 = i64::MAX as u64;

/// One ledger movement; negative amounts are spends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinTransaction {
    pub id: String,
    pub amount: i64,
    pub reason: String,
    pub timestamp: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerState {
    pub balance: u64,
    pub total_earned: u64,
    pub total_spent: u64,
    /// Newest first.
    pub transactions: Vec<CoinTransaction>,
    pub today_earned: u64,
    pub last_earn_date: Option<NaiveDate>,
    pub consecutive_completed: u32,
}

impl LedgerState {
    fn push(&mut self, tx: CoinTransaction) {
        self.transactions.insert(0, tx);
        self.transactions.truncate(MAX_TRANSACTIONS);
    }
}

pub struct CoinLedger {
    state: Persisted<LedgerState>,
    clock: Arc<dyn Clock>,
}

impl CoinLedger {
    pub fn new(backend: Arc<dyn StateStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Persisted::new(COINS_KEY, backend),
            clock,
        }
    }

    pub fn hydrate(&mut self) -> Result<()> {
        self.state.hydrate()
    }

    pub fn is_hydrated(&self) -> bool {
        self.state.is_hydrated()
    }

    pub fn state(&self) -> Result<&LedgerState> {
        self.state.get()
    }

    pub fn balance(&self) -> Result<u64> {
        Ok(self.state.get()?.balance)
    }

    pub fn transactions(&self) -> Result<&[CoinTransaction]> {
        Ok(&self.state.get()?.transactions)
    }

    /// Coins earned today; zero if the last earning was on another day.
    pub fn today_earned(&self) -> Result<u64> {
        let state = self.state.get()?;
        Ok(if state.last_earn_date == Some(self.clock.today()) {
            state.today_earned
        } else {
            0
        })
    }

    pub fn consecutive(&self) -> Result<u32> {
        Ok(self.state.get()?.consecutive_completed)
    }

    /// Credit coins. Always succeeds; credits past [`MAX_TOTAL_EARNED`] are
    /// dropped.
    pub fn earn(&mut self, amount: u64, reason: &str) -> Result<()> {
        let today = self.clock.today();
        let headroom = MAX_TOTAL_EARNED.saturating_sub(self.state.get()?.total_earned);
        let credit = amount.min(headroom);
        if credit < amount {
            warn!(amount, credit, reason, "earning capped at lifetime maximum");
        }
        let tx = self.transaction(signed(credit), reason);
        self.state.update(|s| {
            s.balance += credit;
            s.total_earned += credit;
            s.today_earned = if s.last_earn_date == Some(today) {
                s.today_earned + credit
            } else {
                credit
            };
            s.last_earn_date = Some(today);
            s.push(tx);
        })?;
        info!(amount, reason, "coins earned");
        Ok(())
    }

    /// Debit coins. Returns `false` without any change if the balance is short.
    pub fn spend(&mut self, amount: u64, reason: &str) -> Result<bool> {
        if amount > self.state.get()?.balance {
            debug!(amount, reason, "spend rejected: insufficient balance");
            return Ok(false);
        }
        let tx = self.transaction(-signed(amount), reason);
        self.state.update(|s| {
            s.balance -= amount;
            s.total_spent += amount;
            s.push(tx);
        })?;
        info!(amount, reason, "coins spent");
        Ok(true)
    }

    /// Increment the consecutive-completion counter and return the new value.
    pub fn bump_consecutive(&mut self) -> Result<u32> {
        self.state.update(|s| {
            s.consecutive_completed += 1;
            s.consecutive_completed
        })
    }

    pub fn reset_consecutive(&mut self) -> Result<()> {
        self.state.update(|s| s.consecutive_completed = 0)
    }

    fn transaction(&self, amount: i64, reason: &str) -> CoinTransaction {
        CoinTransaction {
            id: format!("tx_{}", Uuid::new_v4().simple()),
            amount,
            reason: reason.to_string(),
            timestamp: self.clock.now(),
        }
    }
}

/// Amounts are bounded by [`MAX_TOTAL_EARNED`], so this never clamps.
fn signed(amount: u64) -> i64 {
    i64::try_from(amount).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::storage::MemoryStore;
    use proptest::prelude::*;

    fn ledger(clock: &FixedClock) -> CoinLedger {
        let mut l = CoinLedger::new(Arc::new(MemoryStore::new()), Arc::new(clock.clone()));
        l.hydrate().unwrap();
        l
    }

    #[test]
    fn earn_and_spend_keep_totals_consistent() {
        let clock = FixedClock::at("2024-03-01T09:00:00+09:00");
        let mut l = ledger(&clock);
        l.earn(30, "task").unwrap();
        assert!(l.spend(12, "cactus").unwrap());
        let s = l.state().unwrap();
        assert_eq!(s.balance, 18);
        assert_eq!(s.total_earned, 30);
        assert_eq!(s.total_spent, 12);
        assert_eq!(s.transactions[0].amount, -12);
        assert_eq!(s.transactions[1].amount, 30);
    }

    #[test]
    fn overspend_changes_nothing() {
        let clock = FixedClock::at("2024-03-01T09:00:00+09:00");
        let mut l = ledger(&clock);
        l.earn(10, "task").unwrap();
        assert!(!l.spend(11, "unicorn").unwrap());
        let s = l.state().unwrap();
        assert_eq!(s.balance, 10);
        assert_eq!(s.total_spent, 0);
        assert_eq!(s.transactions.len(), 1);
    }

    #[test]
    fn today_earned_resets_on_new_day() {
        let clock = FixedClock::at("2024-03-01T09:00:00+09:00");
        let mut l = ledger(&clock);
        l.earn(5, "a").unwrap();
        l.earn(7, "b").unwrap();
        assert_eq!(l.today_earned().unwrap(), 12);

        clock.advance_days(1);
        assert_eq!(l.today_earned().unwrap(), 0);
        l.earn(3, "c").unwrap();
        assert_eq!(l.today_earned().unwrap(), 3);
    }

    #[test]
    fn log_is_capped_newest_first() {
        let clock = FixedClock::at("2024-03-01T09:00:00+09:00");
        let mut l = ledger(&clock);
        for i in 0..105u64 {
            l.earn(i, &format!("earn {i}")).unwrap();
        }
        let txs = l.transactions().unwrap();
        assert_eq!(txs.len(), MAX_TRANSACTIONS);
        assert_eq!(txs[0].reason, "earn 104");
        assert_eq!(txs[99].reason, "earn 5");
    }

    #[test]
    fn huge_credits_stop_at_the_lifetime_cap() {
        let clock = FixedClock::at("2024-03-01T09:00:00+09:00");
        let mut l = ledger(&clock);
        l.earn(u64::MAX, "jackpot").unwrap();
        l.earn(u64::MAX, "jackpot again").unwrap();

        let s = l.state().unwrap();
        assert_eq!(s.balance, MAX_TOTAL_EARNED);
        assert_eq!(s.total_earned, MAX_TOTAL_EARNED);
        assert_eq!(s.today_earned, MAX_TOTAL_EARNED);
        assert_eq!(s.transactions[1].amount, i64::MAX);
        assert_eq!(s.transactions[0].amount, 0);

        assert!(l.spend(MAX_TOTAL_EARNED, "everything").unwrap());
        let s = l.state().unwrap();
        assert_eq!(s.balance, 0);
        assert_eq!(s.transactions[0].amount, -i64::MAX);
        assert_eq!(s.balance, s.total_earned - s.total_spent);

        l.earn(10, "after the cap").unwrap();
        assert_eq!(l.balance().unwrap(), 0);
    }

    #[test]
    fn consecutive_counter() {
        let clock = FixedClock::at("2024-03-01T09:00:00+09:00");
        let mut l = ledger(&clock);
        assert_eq!(l.bump_consecutive().unwrap(), 1);
        assert_eq!(l.bump_consecutive().unwrap(), 2);
        l.reset_consecutive().unwrap();
        assert_eq!(l.consecutive().unwrap(), 0);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Earn(u64),
        Spend(u64),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u64..200).prop_map(Op::Earn),
            (0u64..300).prop_map(Op::Spend),
        ]
    }

    proptest! {
        #[test]
        fn balance_matches_totals(ops in proptest::collection::vec(op(), 0..60)) {
            let clock = FixedClock::at("2024-03-01T09:00:00+09:00");
            let mut l = ledger(&clock);
            for op in ops {
                let before = l.state().unwrap().clone();
                match op {
                    Op::Earn(n) => l.earn(n, "earn").unwrap(),
                    Op::Spend(n) => {
                        let ok = l.spend(n, "spend").unwrap();
                        prop_assert_eq!(ok, n <= before.balance);
                        if !ok {
                            let after = l.state().unwrap();
                            prop_assert_eq!(after.balance, before.balance);
                            prop_assert_eq!(after.total_spent, before.total_spent);
                            prop_assert_eq!(&after.transactions, &before.transactions);
                        }
                    }
                }
                let s = l.state().unwrap();
                prop_assert_eq!(s.balance, s.total_earned - s.total_spent);
                prop_assert!(s.total_earned >= before.total_earned);
                prop_assert!(s.total_spent >= before.total_spent);
            }
        }
    }
}
