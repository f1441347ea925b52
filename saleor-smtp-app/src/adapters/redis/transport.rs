//! Key-value transport used by the Redis APL
//!
//! The APL only needs a handful of commands. Keeping them behind
//! [`KvConnector`] / [`KvConnection`] lets the lifecycle manager and the APL
//! be exercised against an in-process store.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{Client, Cmd, FromRedisValue, RedisError};

use saleor_smtp_core::error::{AplError, AplResult};

/// Opens connections to the backing store
#[async_trait]
pub trait KvConnector: Send + Sync + 'static {
    type Connection: KvConnection;

    /// Establish a new connection. Errors are `AplError::Connection`.
    async fn connect(&self) -> AplResult<Self::Connection>;
}

/// An established, shareable connection
///
/// Stored values travel as raw bytes. Decoding is left to the caller so one
/// malformed value cannot fail a whole multi-value reply.
#[async_trait]
pub trait KvConnection: Clone + Send + Sync + 'static {
    /// `false` once the connection is known to be unusable
    fn is_open(&self) -> bool;

    async fn get(&self, key: &str) -> AplResult<Option<Vec<u8>>>;
    async fn set(&self, key: &str, value: &str) -> AplResult<()>;
    async fn del(&self, key: &str) -> AplResult<()>;
    async fn keys(&self, pattern: &str) -> AplResult<Vec<String>>;
    async fn mget(&self, keys: &[String]) -> AplResult<Vec<Option<Vec<u8>>>>;
    async fn exists(&self, key: &str) -> AplResult<bool>;

    async fn hget(&self, key: &str, field: &str) -> AplResult<Option<Vec<u8>>>;
    async fn hset(&self, key: &str, field: &str, value: &str) -> AplResult<()>;
    async fn hdel(&self, key: &str, field: &str) -> AplResult<()>;
    async fn hexists(&self, key: &str, field: &str) -> AplResult<bool>;
    /// Every `(field, value)` pair of a hash
    async fn hgetall(&self, key: &str) -> AplResult<Vec<(String, Vec<u8>)>>;

    async fn ping(&self) -> AplResult<()>;
}

/// [`KvConnector`] backed by a `redis::Client`
///
/// Building the client performs no I/O; sockets are opened in `connect`.
#[derive(Clone)]
pub struct RedisConnector {
    client: Client,
}

impl RedisConnector {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl KvConnector for RedisConnector {
    type Connection = RedisConnection;

    async fn connect(&self) -> AplResult<RedisConnection> {
        let conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AplError::Connection(e.to_string()))?;

        Ok(RedisConnection {
            conn,
            open: Arc::new(AtomicBool::new(true)),
        })
    }
}

/// Multiplexed Redis connection shared by every APL operation
#[derive(Clone)]
pub struct RedisConnection {
    conn: MultiplexedConnection,
    open: Arc<AtomicBool>,
}

impl RedisConnection {
    async fn query<T: FromRedisValue>(&self, cmd: &Cmd) -> AplResult<T> {
        let mut conn = self.conn.clone();
        cmd.query_async(&mut conn)
            .await
            .map_err(|e| self.command_error(&e))
    }

    fn command_error(&self, e: &RedisError) -> AplError {
        let lost = e.is_connection_dropped() || e.is_connection_refusal() || e.is_io_error();
        if lost && self.open.swap(false, Ordering::SeqCst) {
            tracing::warn!(error = %e, "Redis connection lost");
        }
        AplError::Storage(e.to_string())
    }
}

#[async_trait]
impl KvConnection for RedisConnection {
    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    async fn get(&self, key: &str) -> AplResult<Option<Vec<u8>>> {
        self.query(redis::cmd("GET").arg(key)).await
    }

    async fn set(&self, key: &str, value: &str) -> AplResult<()> {
        self.query(redis::cmd("SET").arg(key).arg(value)).await
    }

    async fn del(&self, key: &str) -> AplResult<()> {
        self.query(redis::cmd("DEL").arg(key)).await
    }

    async fn keys(&self, pattern: &str) -> AplResult<Vec<String>> {
        self.query(redis::cmd("KEYS").arg(pattern)).await
    }

    async fn mget(&self, keys: &[String]) -> AplResult<Vec<Option<Vec<u8>>>> {
        self.query(redis::cmd("MGET").arg(keys)).await
    }

    async fn exists(&self, key: &str) -> AplResult<bool> {
        self.query(redis::cmd("EXISTS").arg(key)).await
    }

    async fn hget(&self, key: &str, field: &str) -> AplResult<Option<Vec<u8>>> {
        self.query(redis::cmd("HGET").arg(key).arg(field)).await
    }

    async fn hset(&self, key: &str, field: &str, value: &str) -> AplResult<()> {
        self.query(redis::cmd("HSET").arg(key).arg(field).arg(value))
            .await
    }

    async fn hdel(&self, key: &str, field: &str) -> AplResult<()> {
        self.query(redis::cmd("HDEL").arg(key).arg(field)).await
    }

    async fn hexists(&self, key: &str, field: &str) -> AplResult<bool> {
        self.query(redis::cmd("HEXISTS").arg(key).arg(field)).await
    }

    async fn hgetall(&self, key: &str) -> AplResult<Vec<(String, Vec<u8>)>> {
        self.query(redis::cmd("HGETALL").arg(key)).await
    }

    async fn ping(&self) -> AplResult<()> {
        let _: String = self.query(&redis::cmd("PING")).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use redis::{from_redis_value, Value};

    fn bulk(bytes: &[u8]) -> Value {
        Value::BulkString(bytes.to_vec())
    }

    #[test]
    fn mget_reply_with_non_utf8_value_decodes() {
        let reply = Value::Array(vec![bulk(br#"{"a":1}"#), bulk(b"\xff\xfe\x00"), Value::Nil]);

        let values: Vec<Option<Vec<u8>>> = from_redis_value(&reply).unwrap();

        assert_eq!(
            values,
            vec![
                Some(br#"{"a":1}"#.to_vec()),
                Some(b"\xff\xfe\x00".to_vec()),
                None
            ]
        );
        // A `String` decode rejects the whole reply
        assert!(from_redis_value::<Vec<Option<String>>>(&reply).is_err());
    }

    #[test]
    fn hgetall_reply_with_non_utf8_value_decodes() {
        let reply = Value::Array(vec![
            bulk(b"https://a/graphql/"),
            bulk(b"\xff\xfe\x00"),
            bulk(b"https://b/graphql/"),
            bulk(b"{}"),
        ]);

        let pairs: Vec<(String, Vec<u8>)> = from_redis_value(&reply).unwrap();

        assert_eq!(
            pairs,
            vec![
                ("https://a/graphql/".to_string(), b"\xff\xfe\x00".to_vec()),
                ("https://b/graphql/".to_string(), b"{}".to_vec()),
            ]
        );
    }

    #[test]
    fn get_reply_with_non_utf8_value_decodes() {
        let value: Option<Vec<u8>> = from_redis_value(&bulk(b"\xff")).unwrap();
        assert_eq!(value, Some(vec![0xff]));
        assert_eq!(from_redis_value::<Option<Vec<u8>>>(&Value::Nil).unwrap(), None);
    }
}
