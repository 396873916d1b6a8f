//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Json, Router, middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use serde_json::json;

use crate::{
    AppState,
    auth::auth_guard,
    category::{create_category_endpoint, delete_category_endpoint, list_categories_endpoint},
    csv_io::{export_csv_endpoint, import_csv_endpoint},
    dashboard::{get_balance_series, get_dashboard_page},
    endpoints,
    feed::transaction_feed,
    not_found::get_404_not_found,
    register_user::{bootstrap_user, create_user_endpoint, get_current_user},
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, get_transaction_endpoint,
        list_transactions_endpoint, update_transaction_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    // The feed authenticates after the WebSocket upgrade so that browsers,
    // which cannot set headers on WebSocket requests, can pass the key as a
    // query parameter.
    let unprotected_routes = Router::new()
        .route(endpoints::HEALTH, get(get_health))
        .route(endpoints::USERS, post(bootstrap_user))
        .route(endpoints::DASHBOARD_VIEW, get(get_dashboard_page))
        .route(endpoints::TRANSACTION_FEED, get(transaction_feed));

    let protected_routes = Router::new()
        .route(endpoints::CREATE_USER, post(create_user_endpoint))
        .route(endpoints::CURRENT_USER, get(get_current_user))
        .route(
            endpoints::CATEGORIES,
            get(list_categories_endpoint).post(create_category_endpoint),
        )
        .route(endpoints::CATEGORY, delete(delete_category_endpoint))
        .route(
            endpoints::TRANSACTIONS,
            get(list_transactions_endpoint).post(create_transaction_endpoint),
        )
        .route(
            endpoints::TRANSACTION,
            get(get_transaction_endpoint)
                .patch(update_transaction_endpoint)
                .delete(delete_transaction_endpoint),
        )
        .route(endpoints::DASHBOARD_BALANCE, get(get_balance_series))
        .route(endpoints::IMPORT_CSV, post(import_csv_endpoint))
        .route(endpoints::EXPORT_CSV, get(export_csv_endpoint))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}

/// Report that the server is up.
async fn get_health() -> Response {
    Json(json!({"status": "ok"})).into_response()
}
