//! Transaction management.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and `TransactionBuilder` for creating transactions
//! - Database functions for storing, querying, and managing transactions
//! - `TransactionPatch` for partial updates
//! - Route handlers for the transaction JSON API

mod core;
mod endpoints;
mod patch;

pub use core::{
    Kind, Transaction, TransactionBuilder, TransactionFilter, count_transactions,
    create_transaction, create_transaction_table, delete_transaction, get_transaction,
    list_transactions, list_transactions_created_after, update_transaction,
};
pub use endpoints::{
    create_transaction_endpoint, delete_transaction_endpoint, get_transaction_endpoint,
    list_transactions_endpoint, update_transaction_endpoint,
};
pub use patch::TransactionPatch;
