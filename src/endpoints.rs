//! The API endpoint URIs.
//!
//! For endpoints that take a parameter, e.g., '/transactions/{transaction_id}', tests fill in the ID with `format_endpoint`.

/// Liveness check.
pub const HEALTH: &str = "/health";
/// The HTML page that charts the balance series.
pub const DASHBOARD_VIEW: &str = "/dashboard";
/// The balance-over-time series as JSON.
pub const DASHBOARD_BALANCE: &str = "/dashboard/balance";

/// The open route for creating the very first user.
pub const USERS: &str = "/users";
/// The authenticated route for creating further users.
pub const CREATE_USER: &str = "/users/create";
/// The currently authenticated user.
pub const CURRENT_USER: &str = "/users/me";

/// The route to list and create categories.
pub const CATEGORIES: &str = "/categories";
/// The route to delete a category.
pub const CATEGORY: &str = "/categories/{category_id}";

/// The route to list and create transactions.
pub const TRANSACTIONS: &str = "/transactions";
/// The route to read, update and delete a single transaction.
pub const TRANSACTION: &str = "/transactions/{transaction_id}";

/// The route to upload CSV files for importing transactions.
pub const IMPORT_CSV: &str = "/io/import/csv";
/// The route to download all of a user's transactions as CSV.
pub const EXPORT_CSV: &str = "/io/export/csv";

/// The WebSocket feed of newly created transactions.
pub const TRANSACTION_FEED: &str = "/ws/transactions";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/categories/{category_id}', '{category_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
#[cfg(test)]
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_owned();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|offset| param_start + offset + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
