use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use configs::StoreConfig;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, RedisError, Script};
use tracing::{info, warn};

use super::{CounterStore, StoreError};

/// Reads the key, rejects anything that is not plain decimal digits or would
/// overflow a signed 64-bit counter, rewrites leading zeros away (`INCR`
/// refuses `"007"`), then INCRs. Same acceptance rule as `parse_counter`.
/// Redis runs a script without interleaving other commands, which makes the
/// whole read-validate-write a single step for concurrent callers.
const INCREMENT_SCRIPT: &str = r#"
local current = redis.call('GET', KEYS[1])
if current and not string.match(current, '^%d+$') then
  return redis.error_reply('CORRUPT ' .. current)
end
if current then
  local canonical = (string.gsub(current, '^0+', ''))
  if canonical == '' then canonical = '0' end
  if #canonical > 19 or (#canonical == 19 and canonical >= '9223372036854775807') then
    return redis.error_reply('CORRUPT ' .. current)
  end
  if canonical ~= current then
    redis.call('SET', KEYS[1], canonical)
  end
end
local incremented = redis.pcall('INCR', KEYS[1])
if type(incremented) == 'table' and incremented.err and current then
  return redis.error_reply('CORRUPT ' .. current)
end
return incremented
"#;

const CORRUPT_CODE: &str = "CORRUPT";

/// Redis-backed counter store.
///
/// `ConnectionManager` multiplexes one connection across callers and
/// reconnects after failures, so the store is cloned freely per request.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
    increment: Script,
    response_timeout: Duration,
}

impl RedisStore {
    /// Open a managed connection and verify it with `PING`.
    pub async fn connect(cfg: &StoreConfig) -> Result<Self, StoreError> {
        let url = cfg.redis_url();
        let client = redis::Client::open(url.as_str()).map_err(unavailable)?;
        let conn = tokio::time::timeout(cfg.connect_timeout(), ConnectionManager::new(client))
            .await
            .map_err(|_| StoreError::Unavailable(format!("connecting to {} timed out", cfg.addr)))?
            .map_err(unavailable)?;

        let store = Self {
            conn,
            increment: Script::new(INCREMENT_SCRIPT),
            response_timeout: cfg.response_timeout(),
        };
        store.ping().await?;
        info!(addr = %cfg.addr, "connected to redis");
        Ok(store)
    }

    /// Run a command under the response timeout. The outer error is the
    /// timeout, the inner one is whatever Redis replied.
    async fn timed<T, F>(&self, op: &'static str, fut: F) -> Result<Result<T, RedisError>, StoreError>
    where
        F: Future<Output = Result<T, RedisError>>,
    {
        match tokio::time::timeout(self.response_timeout, fut).await {
            Ok(res) => Ok(res),
            Err(_) => {
                warn!(op, timeout_ms = self.response_timeout.as_millis() as u64, "redis command timed out");
                Err(StoreError::Unavailable(format!("redis {op} timed out")))
            }
        }
    }
}

fn unavailable(e: RedisError) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

#[async_trait]
impl CounterStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn.clone();
        self.timed("GET", async move { conn.get::<_, Option<String>>(key).await })
            .await?
            .map_err(unavailable)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        self.timed("SET", async move { conn.set::<_, _, ()>(key, value).await })
            .await?
            .map_err(unavailable)
    }

    async fn increment(&self, key: &str) -> Result<u64, StoreError> {
        let mut conn = self.conn.clone();
        let invocation = self.increment.key(key);
        let res: Result<i64, RedisError> =
            self.timed("INCR", async move { invocation.invoke_async(&mut conn).await }).await?;
        match res {
            Ok(n) => u64::try_from(n)
                .map_err(|_| StoreError::Corrupt { key: key.to_string(), value: n.to_string() }),
            Err(e) if e.code() == Some(CORRUPT_CODE) => Err(StoreError::Corrupt {
                key: key.to_string(),
                value: e.detail().unwrap_or_default().to_string(),
            }),
            Err(e) => Err(unavailable(e)),
        }
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let pong: String = self
            .timed("PING", async move { redis::cmd("PING").query_async(&mut conn).await })
            .await?
            .map_err(unavailable)?;
        if pong.eq_ignore_ascii_case("PONG") {
            Ok(())
        } else {
            Err(StoreError::Unavailable(format!("unexpected PING reply `{pong}`")))
        }
    }
}
