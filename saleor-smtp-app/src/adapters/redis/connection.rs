//! Lazy, de-duplicated connection management
//!
//! Nothing connects at construction. The first operation starts a connection
//! attempt; operations arriving while it is in flight await the same attempt
//! and observe the same outcome. A failed attempt leaves the manager
//! `Disconnected`, so the next operation tries again.

use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::Mutex;

use saleor_smtp_core::error::AplResult;

use super::transport::{KvConnection, KvConnector};

type ConnectAttempt<C> = Shared<BoxFuture<'static, AplResult<C>>>;

enum ConnectionState<C> {
    Disconnected,
    Connecting(ConnectAttempt<C>),
    Connected(C),
}

pub struct ConnectionManager<K: KvConnector> {
    connector: Arc<K>,
    state: Mutex<ConnectionState<K::Connection>>,
}

impl<K: KvConnector> ConnectionManager<K> {
    #[must_use]
    pub fn new(connector: K) -> Self {
        Self {
            connector: Arc::new(connector),
            state: Mutex::new(ConnectionState::Disconnected),
        }
    }

    /// Return the live connection, connecting first if needed.
    ///
    /// Safe to call concurrently: at most one connect attempt is in flight.
    pub async fn ensure_connected(&self) -> AplResult<K::Connection> {
        let attempt = {
            let mut state = self.state.lock().await;

            // An attempt can finish with every waiter gone before one recorded
            // the outcome; settle it here instead of replaying it.
            let settled = match &*state {
                ConnectionState::Connecting(attempt) => attempt
                    .peek()
                    .map(|outcome| outcome.as_ref().ok().cloned()),
                _ => None,
            };
            if let Some(outcome) = settled {
                *state = outcome.map_or(ConnectionState::Disconnected, ConnectionState::Connected);
            }

            if let ConnectionState::Connected(conn) = &*state {
                if conn.is_open() {
                    return Ok(conn.clone());
                }
                tracing::warn!("Redis connection closed, reconnecting");
            }

            if let ConnectionState::Connecting(attempt) = &*state {
                attempt.clone()
            } else {
                let attempt = self.start_attempt();
                *state = ConnectionState::Connecting(attempt.clone());
                attempt
            }
        };

        let result = attempt.clone().await;

        // Only the attempt still on record may move the state forward; a
        // waiter that wakes late must not clobber a newer attempt.
        let mut state = self.state.lock().await;
        let current = matches!(&*state, ConnectionState::Connecting(a) if a.ptr_eq(&attempt));
        if current {
            *state = match &result {
                Ok(conn) => ConnectionState::Connected(conn.clone()),
                Err(_) => ConnectionState::Disconnected,
            };
        }

        result
    }

    /// Whether an open connection is currently held
    pub async fn is_connected(&self) -> bool {
        matches!(&*self.state.lock().await, ConnectionState::Connected(conn) if conn.is_open())
    }

    fn start_attempt(&self) -> ConnectAttempt<K::Connection> {
        let connector = Arc::clone(&self.connector);
        async move {
            match connector.connect().await {
                Ok(conn) => {
                    tracing::info!("Redis connection established");
                    Ok(conn)
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to connect to Redis");
                    Err(e)
                }
            }
        }
        .boxed()
        .shared()
    }
}
