//! A WebSocket feed of newly recorded transactions.
//!
//! After connecting, a client receives its backlog of transactions, then a
//! `ready` message, then any transactions recorded while it stays connected.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    extract::{
        FromRef, State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade, close_code},
    },
    http::HeaderMap,
    response::Response,
};
use futures::{SinkExt, StreamExt, stream::SplitSink};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tokio::time::{MissedTickBehavior, interval};

use crate::{
    AppState, Error,
    extract::QueryParams,
    auth::{API_KEY_HEADER, authenticate},
    database_id::TransactionId,
    transaction::{Transaction, list_transactions_created_after},
    user::UserID,
};

/// Settings for the transaction feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedConfig {
    /// How long to wait between checks for new transactions.
    pub poll_interval: Duration,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
        }
    }
}

/// The state needed for the transaction feed.
#[derive(Debug, Clone)]
pub struct FeedState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// Feed settings.
    pub config: FeedConfig,
}

impl FromRef<AppState> for FeedState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            config: state.feed_config,
        }
    }
}

/// The query string accepted when opening the feed.
#[derive(Debug, Default, Deserialize)]
pub struct FeedParams {
    /// The API key, for clients that cannot set headers on a WebSocket request.
    pub api_key: Option<String>,
    /// Only send transactions recorded after this RFC 3339 timestamp.
    pub since: Option<String>,
}

/// A message sent to feed clients.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum FeedMessage<'a> {
    Transaction { data: &'a Transaction },
    Ready,
    Error { error: &'static str },
}

type FeedSender = SplitSink<WebSocket, Message>;

/// WebSocket upgrade handler for the transaction feed.
///
/// The API key is read from the `api_key` query parameter, falling back to
/// the `X-API-Key` header. Authentication happens after the upgrade so that
/// failures can be reported with a policy violation close frame.
pub async fn transaction_feed(
    ws: WebSocketUpgrade,
    State(state): State<FeedState>,
    QueryParams(params): QueryParams<FeedParams>,
    headers: HeaderMap,
) -> Response {
    let api_key = params.api_key.clone().or_else(|| {
        headers
            .get(API_KEY_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned)
    });

    ws.on_upgrade(move |socket| stream_transactions(socket, state, api_key, params.since))
}

async fn stream_transactions(
    socket: WebSocket,
    state: FeedState,
    api_key: Option<String>,
    since: Option<String>,
) {
    let (mut sender, mut receiver) = socket.split();

    let user_id = match authenticate_feed_client(api_key.as_deref(), &state.db_connection) {
        Ok(user_id) => user_id,
        Err(error) => {
            tracing::debug!("rejected transaction feed client: {error}");
            let close = Message::Close(Some(CloseFrame {
                code: close_code::POLICY,
                reason: error.to_string().into(),
            }));
            if let Err(error) = sender.send(close).await {
                tracing::debug!("could not close transaction feed: {error}");
            }
            return;
        }
    };

    tracing::info!(%user_id, "transaction feed connected");

    let since = match since.as_deref().map(parse_since) {
        Some(Ok(since)) => Some(since),
        Some(Err(_)) => {
            if send_message(&mut sender, &FeedMessage::Error { error: "invalid_since" })
                .await
                .is_err()
            {
                return;
            }
            None
        }
        None => None,
    };

    let mut last_sent_id: TransactionId = 0;

    if let Err(error) =
        send_new_transactions(&state, user_id, since, &mut last_sent_id, &mut sender).await
    {
        tracing::debug!("stopping transaction feed: {error}");
        return;
    }

    if send_message(&mut sender, &FeedMessage::Ready).await.is_err() {
        return;
    }

    let mut poll = interval(state.config.poll_interval);
    poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately and the backlog was just sent.
    poll.tick().await;

    loop {
        tokio::select! {
            message = receiver.next() => {
                match message {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(error)) => {
                        tracing::debug!("transaction feed receive error: {error}");
                        break;
                    }
                    Some(Ok(_)) => {}
                }
            }

            _ = poll.tick() => {
                if let Err(error) = send_new_transactions(
                    &state,
                    user_id,
                    since,
                    &mut last_sent_id,
                    &mut sender,
                )
                .await
                {
                    tracing::debug!("stopping transaction feed: {error}");
                    break;
                }
            }
        }
    }

    tracing::info!(%user_id, "transaction feed closed");
}

fn authenticate_feed_client(
    api_key: Option<&str>,
    db_connection: &Mutex<Connection>,
) -> Result<UserID, Error> {
    let connection = db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    authenticate(api_key, &connection).map(|user| user.id)
}

/// Parse the `since` query parameter as an RFC 3339 timestamp.
fn parse_since(raw: &str) -> Result<OffsetDateTime, Error> {
    OffsetDateTime::parse(raw.trim(), &Rfc3339)
        .map_err(|error| Error::InvalidArgument(format!("invalid since \"{raw}\": {error}")))
}

/// Fetch transactions the client has not seen yet. The lock is released
/// before anything is sent.
fn fetch_unsent_transactions(
    db_connection: &Mutex<Connection>,
    user_id: UserID,
    since: Option<OffsetDateTime>,
    last_sent_id: TransactionId,
) -> Result<Vec<Transaction>, Error> {
    let connection = db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    list_transactions_created_after(user_id, since, last_sent_id, &connection)
}

async fn send_new_transactions(
    state: &FeedState,
    user_id: UserID,
    since: Option<OffsetDateTime>,
    last_sent_id: &mut TransactionId,
    sender: &mut FeedSender,
) -> Result<(), String> {
    let transactions =
        fetch_unsent_transactions(&state.db_connection, user_id, since, *last_sent_id)
            .map_err(|error| error.to_string())?;

    for transaction in &transactions {
        send_message(sender, &FeedMessage::Transaction { data: transaction })
            .await
            .map_err(|error| error.to_string())?;
        *last_sent_id = (*last_sent_id).max(transaction.id);
    }

    Ok(())
}

async fn send_message(
    sender: &mut FeedSender,
    message: &FeedMessage<'_>,
) -> Result<(), axum::Error> {
    let text = serde_json::to_string(message).map_err(axum::Error::new)?;

    sender.send(Message::Text(text.into())).await
}

#[cfg(test)]
mod feed_message_tests {
    use serde_json::json;
    use time::{OffsetDateTime, macros::date};

    use crate::{
        feed::FeedMessage,
        transaction::{Kind, Transaction},
    };

    #[test]
    fn ready_and_error_messages_are_tagged() {
        assert_eq!(
            serde_json::to_value(FeedMessage::Ready).unwrap(),
            json!({"type": "ready"})
        );
        assert_eq!(
            serde_json::to_value(FeedMessage::Error {
                error: "invalid_since"
            })
            .unwrap(),
            json!({"type": "error", "error": "invalid_since"})
        );
    }

    #[test]
    fn transaction_message_wraps_transaction() {
        let transaction = Transaction {
            id: 7,
            amount: 12.5,
            kind: Kind::Debit,
            occurred_at: date!(2025 - 10 - 01),
            description: None,
            category_id: Some(2),
            created_at: OffsetDateTime::UNIX_EPOCH,
        };

        let got = serde_json::to_value(FeedMessage::Transaction { data: &transaction }).unwrap();

        assert_eq!(
            got,
            json!({
                "type": "transaction",
                "data": {
                    "id": 7,
                    "amount": 12.5,
                    "kind": "debit",
                    "occurred_at": "2025-10-01",
                    "description": null,
                    "category_id": 2,
                    "created_at": "1970-01-01T00:00:00Z",
                }
            })
        );
    }
}
