//! Shared test utilities: in-memory Redis transport and log capture

#![allow(dead_code)]

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use saleor_smtp_app::adapters::redis::{KvConnection, KvConnector};
use saleor_smtp_core::error::{AplError, AplResult};
use saleor_smtp_core::types::AuthData;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};

/// Skip the test when no Redis server is available
#[macro_export]
macro_rules! skip_if_no_redis {
    () => {
        match std::env::var("REDIS_TEST_URL") {
            Ok(url) => url,
            Err(_) => {
                eprintln!("skipping: REDIS_TEST_URL is not set");
                return;
            }
        }
    };
}

pub fn auth_data(host: &str) -> AuthData {
    AuthData::new(
        format!("https://{host}/graphql/"),
        format!("app-{host}"),
        format!("token-{host}"),
    )
}

// ===== In-memory Redis =====

#[derive(Default)]
struct Keyspace {
    strings: HashMap<String, Vec<u8>>,
    hashes: HashMap<String, HashMap<String, Vec<u8>>>,
}

/// Data shared by every connection of every connector created from it,
/// standing in for one Redis server.
#[derive(Clone, Default)]
pub struct MemoryServer {
    keyspace: Arc<Mutex<Keyspace>>,
}

impl MemoryServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a raw value, bypassing the APL
    pub fn put_raw(&self, key: &str, value: impl AsRef<[u8]>) {
        self.lock()
            .strings
            .insert(key.to_string(), value.as_ref().to_vec());
    }

    pub fn put_raw_field(&self, key: &str, field: &str, value: impl AsRef<[u8]>) {
        self.lock()
            .hashes
            .entry(key.to_string())
            .or_default()
            .insert(field.to_string(), value.as_ref().to_vec());
    }

    pub fn raw(&self, key: &str) -> Option<Vec<u8>> {
        self.lock().strings.get(key).cloned()
    }

    pub fn raw_field(&self, key: &str, field: &str) -> Option<Vec<u8>> {
        self.lock().hashes.get(key)?.get(field).cloned()
    }

    pub fn string_keys(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.lock().strings.keys().cloned().collect();
        keys.sort();
        keys
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Keyspace> {
        self.keyspace.lock().expect("keyspace lock poisoned")
    }
}

/// Connector over a [`MemoryServer`] that counts connect attempts and can be
/// told to refuse connections.
#[derive(Clone)]
pub struct MemoryConnector {
    server: MemoryServer,
    connects: Arc<AtomicUsize>,
    refuse: Arc<AtomicBool>,
    connect_delay: Duration,
    last_connection: Arc<Mutex<Option<MemoryConnection>>>,
}

impl MemoryConnector {
    pub fn new(server: MemoryServer) -> Self {
        Self {
            server,
            connects: Arc::new(AtomicUsize::new(0)),
            refuse: Arc::new(AtomicBool::new(false)),
            connect_delay: Duration::ZERO,
            last_connection: Arc::new(Mutex::new(None)),
        }
    }

    /// Make each connect attempt take `delay`, widening the race window
    pub fn with_connect_delay(mut self, delay: Duration) -> Self {
        self.connect_delay = delay;
        self
    }

    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn refuse_connections(&self, refuse: bool) {
        self.refuse.store(refuse, Ordering::SeqCst);
    }

    /// Simulate the server dropping the most recent connection
    pub fn drop_connection(&self) {
        if let Some(conn) = self.last_connection.lock().expect("lock poisoned").as_ref() {
            conn.open.store(false, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl KvConnector for MemoryConnector {
    type Connection = MemoryConnection;

    async fn connect(&self) -> AplResult<MemoryConnection> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if !self.connect_delay.is_zero() {
            tokio::time::sleep(self.connect_delay).await;
        }
        if self.refuse.load(Ordering::SeqCst) {
            return Err(AplError::Connection(
                "Connection refused (os error 111)".to_string(),
            ));
        }

        let conn = MemoryConnection {
            server: self.server.clone(),
            open: Arc::new(AtomicBool::new(true)),
        };
        *self.last_connection.lock().expect("lock poisoned") = Some(conn.clone());
        Ok(conn)
    }
}

#[derive(Clone)]
pub struct MemoryConnection {
    server: MemoryServer,
    open: Arc<AtomicBool>,
}

impl MemoryConnection {
    fn check(&self) -> AplResult<()> {
        if self.open.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(AplError::Storage("connection closed".to_string()))
        }
    }
}

/// Inverse of the escaping applied to `KEYS` patterns; only trailing `*` is supported
fn pattern_prefix(pattern: &str) -> String {
    let body = pattern
        .strip_suffix('*')
        .expect("only prefix patterns are supported");
    let mut prefix = String::new();
    let mut escaped = false;
    for c in body.chars() {
        if c == '\\' && !escaped {
            escaped = true;
            continue;
        }
        escaped = false;
        prefix.push(c);
    }
    prefix
}

#[async_trait]
impl KvConnection for MemoryConnection {
    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    async fn get(&self, key: &str) -> AplResult<Option<Vec<u8>>> {
        self.check()?;
        Ok(self.server.raw(key))
    }

    async fn set(&self, key: &str, value: &str) -> AplResult<()> {
        self.check()?;
        self.server.put_raw(key, value);
        Ok(())
    }

    async fn del(&self, key: &str) -> AplResult<()> {
        self.check()?;
        self.server.lock().strings.remove(key);
        Ok(())
    }

    async fn keys(&self, pattern: &str) -> AplResult<Vec<String>> {
        self.check()?;
        let prefix = pattern_prefix(pattern);
        Ok(self
            .server
            .lock()
            .strings
            .keys()
            .filter(|key| key.starts_with(&prefix))
            .cloned()
            .collect())
    }

    async fn mget(&self, keys: &[String]) -> AplResult<Vec<Option<Vec<u8>>>> {
        self.check()?;
        let keyspace = self.server.lock();
        Ok(keys.iter().map(|k| keyspace.strings.get(k).cloned()).collect())
    }

    async fn exists(&self, key: &str) -> AplResult<bool> {
        self.check()?;
        Ok(self.server.lock().strings.contains_key(key))
    }

    async fn hget(&self, key: &str, field: &str) -> AplResult<Option<Vec<u8>>> {
        self.check()?;
        Ok(self.server.raw_field(key, field))
    }

    async fn hset(&self, key: &str, field: &str, value: &str) -> AplResult<()> {
        self.check()?;
        self.server.put_raw_field(key, field, value);
        Ok(())
    }

    async fn hdel(&self, key: &str, field: &str) -> AplResult<()> {
        self.check()?;
        if let Some(hash) = self.server.lock().hashes.get_mut(key) {
            hash.remove(field);
        }
        Ok(())
    }

    async fn hexists(&self, key: &str, field: &str) -> AplResult<bool> {
        self.check()?;
        Ok(self.server.raw_field(key, field).is_some())
    }

    async fn hgetall(&self, key: &str) -> AplResult<Vec<(String, Vec<u8>)>> {
        self.check()?;
        Ok(self
            .server
            .lock()
            .hashes
            .get(key)
            .map(|hash| hash.iter().map(|(f, v)| (f.clone(), v.clone())).collect())
            .unwrap_or_default())
    }

    async fn ping(&self) -> AplResult<()> {
        self.check()
    }
}

// ===== Log capture =====

#[derive(Debug, Clone)]
pub struct CapturedEvent {
    pub level: Level,
    pub message: String,
}

/// Records every event emitted while installed as the default subscriber
#[derive(Clone, Default)]
pub struct LogCollector {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl LogCollector {
    /// Install for the current thread; events are recorded until the guard drops
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        tracing::subscriber::set_default(tracing_subscriber::registry().with(self.clone()))
    }

    pub fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().expect("lock poisoned").clone()
    }

    pub fn find(&self, message: &str) -> Option<CapturedEvent> {
        self.events().into_iter().find(|e| e.message == message)
    }

    pub fn at_level(&self, level: Level) -> Vec<CapturedEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.level == level)
            .collect()
    }
}

impl<S: Subscriber> tracing_subscriber::Layer<S> for LogCollector {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        self.events.lock().expect("lock poisoned").push(CapturedEvent {
            level: *event.metadata().level(),
            message: visitor.message,
        });
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        }
    }
}
