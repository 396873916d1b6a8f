//! The balance-over-time dashboard.
//!
//! This module contains:
//! - Calendar bucketing for days, weeks and months
//! - The aggregation that turns transactions into a gap-filled running balance
//! - The query for the slim transaction rows the aggregation needs
//! - Route handlers for the JSON series and the HTML page

mod aggregation;
mod handlers;
mod period;
mod transaction;

pub use aggregation::{BalancePoint, aggregate, round_to_cents};
pub use handlers::{get_balance_series, get_dashboard_page};
pub use period::Granularity;
pub use transaction::{LedgerEntry, get_ledger_entries};
