//! Dashboard HTTP handlers and view rendering.
//!
//! This module contains:
//! - The route handler for the balance-over-time JSON series
//! - The HTML page that fetches and tabulates that series

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use rusqlite::Connection;
use serde::Deserialize;
use time::Date;

use crate::{
    AppState, Error,
    extract::QueryParams,
    dashboard::{BalancePoint, Granularity, aggregate, get_ledger_entries},
    endpoints,
    user::UserID,
};

/// The state needed for the balance series.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The query string for the balance series.
#[derive(Debug, Default, Deserialize)]
pub struct BalanceQuery {
    /// The earliest occurrence date to include.
    pub start: Option<Date>,
    /// The latest occurrence date to include.
    pub end: Option<Date>,
    /// One of "day", "week" or "month", defaults to "day".
    pub group_by: Option<String>,
}

/// Get the user's balance over time, grouped into calendar buckets.
pub async fn get_balance_series(
    State(state): State<DashboardState>,
    Extension(user_id): Extension<UserID>,
    QueryParams(query): QueryParams<BalanceQuery>,
) -> Result<Json<Vec<BalancePoint>>, Error> {
    let granularity = match query.group_by.as_deref() {
        Some(tag) => tag.parse::<Granularity>()?,
        None => Granularity::default(),
    };

    let entries = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        get_ledger_entries(user_id, query.start, query.end, &connection)?
    };

    let points = aggregate(&entries, granularity);
    tracing::debug!(
        entries = entries.len(),
        points = points.len(),
        %granularity,
        "computed balance series"
    );

    Ok(Json(points))
}

/// Display a page that fetches and tabulates the balance series.
pub async fn get_dashboard_page() -> Response {
    dashboard_view().into_response()
}

const BALANCE_SCRIPT: &str = r##"
document.getElementById("balance-form").addEventListener("submit", async (event) => {
    event.preventDefault();
    const form = event.target;
    const params = new URLSearchParams();
    for (const name of ["start", "end", "group_by"]) {
        if (form.elements[name].value) params.set(name, form.elements[name].value);
    }
    const response = await fetch(form.action + "?" + params, {
        headers: { "X-API-Key": form.elements["api_key"].value },
    });
    const body = document.querySelector("#balance-table tbody");
    const status = document.getElementById("status");
    body.replaceChildren();
    if (!response.ok) {
        status.textContent = (await response.json()).detail;
        return;
    }
    status.textContent = "";
    for (const point of await response.json()) {
        const row = body.insertRow();
        row.insertCell().textContent = point.label;
        row.insertCell().textContent = point.balance.toFixed(2);
    }
});
"##;

fn dashboard_view() -> Markup {
    let granularities = [Granularity::Day, Granularity::Week, Granularity::Month];

    html! {
        (DOCTYPE)
        html lang="en"
        {
            head
            {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { "Dashboard - OFC" }
            }

            body
            {
                h1 { "Balance over time" }

                form id="balance-form" action=(endpoints::DASHBOARD_BALANCE) method="get"
                {
                    label for="api_key" { "API key" }
                    input id="api_key" name="api_key" type="password" required;

                    label for="start" { "From" }
                    input id="start" name="start" type="date";

                    label for="end" { "To" }
                    input id="end" name="end" type="date";

                    label for="group_by" { "Group by" }
                    select id="group_by" name="group_by"
                    {
                        @for granularity in granularities {
                            option
                                value=(granularity.as_query_value())
                                selected[granularity == Granularity::default()]
                            {
                                (granularity.as_query_value())
                            }
                        }
                    }

                    button type="submit" { "Show" }
                }

                p id="status" {}

                table id="balance-table"
                {
                    thead { tr { th { "Period" } th { "Balance" } } }
                    tbody {}
                }

                script { (PreEscaped(BALANCE_SCRIPT)) }
            }
        }
    }
}


#[cfg(test)]
mod dashboard_page_tests {
    use axum::{body::to_bytes, http::StatusCode};
    use scraper::{Html, Selector};

    use crate::{dashboard::get_dashboard_page, endpoints};

    #[tokio::test]
    async fn renders_form_pointing_at_balance_series() {
        let response = get_dashboard_page().await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get("content-type")
                .expect("content-type header missing"),
            "text/html; charset=utf-8"
        );

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let html = Html::parse_document(&String::from_utf8_lossy(&body));
        assert!(html.errors.is_empty(), "invalid HTML: {:?}", html.errors);

        let form_selector = Selector::parse("form#balance-form").unwrap();
        let form = html
            .select(&form_selector)
            .next()
            .expect("Could not find balance form");
        assert_eq!(form.value().attr("action"), Some(endpoints::DASHBOARD_BALANCE));

        let option_selector = Selector::parse("select#group_by option").unwrap();
        let options: Vec<_> = html
            .select(&option_selector)
            .filter_map(|option| option.value().attr("value"))
            .collect();
        assert_eq!(options, ["day", "week", "month"]);

        let selected_selector = Selector::parse("select#group_by option[selected]").unwrap();
        let selected: Vec<_> = html
            .select(&selected_selector)
            .filter_map(|option| option.value().attr("value"))
            .collect();
        assert_eq!(selected, ["day"]);
    }

    #[tokio::test]
    async fn script_fills_balance_table() {
        let response = get_dashboard_page().await;

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let html = Html::parse_document(&String::from_utf8_lossy(&body));
        let script_selector = Selector::parse("script").unwrap();
        let script = html
            .select(&script_selector)
            .next()
            .expect("Could not find script")
            .inner_html();

        assert!(script.contains(r##"document.querySelector("#balance-table tbody")"##));
        assert!(script.contains("point.balance.toFixed(2)"));
    }
}
