//! Short-lived balance cache used for the local pre-check before a deduction.
//!
//! Cache failures never fail a request: they are logged and treated as misses.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use tracing::warn;

const BALANCE_TTL_SECS: u64 = 300;

#[async_trait]
pub trait BalanceCache: Send + Sync {
    async fn get(&self, user_id: &str) -> Option<i32>;
    async fn put(&self, user_id: &str, balance: i32);
    async fn invalidate(&self, user_id: &str);
}

fn cache_key(user_id: &str) -> String {
    format!("credits:{user_id}")
}

#[derive(Clone)]
pub struct RedisBalanceCache {
    conn: MultiplexedConnection,
}

impl RedisBalanceCache {
    pub async fn connect(client: &redis::Client) -> redis::RedisResult<Self> {
        let conn = client.get_multiplexed_async_connection().await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl BalanceCache for RedisBalanceCache {
    async fn get(&self, user_id: &str) -> Option<i32> {
        let mut conn = self.conn.clone();
        match conn.get::<_, Option<i32>>(cache_key(user_id)).await {
            Ok(balance) => balance,
            Err(e) => {
                warn!("Balance cache read failed for {user_id}: {e}");
                None
            }
        }
    }

    async fn put(&self, user_id: &str, balance: i32) {
        let mut conn = self.conn.clone();
        if let Err(e) = conn
            .set_ex::<_, _, ()>(cache_key(user_id), balance, BALANCE_TTL_SECS)
            .await
        {
            warn!("Balance cache write failed for {user_id}: {e}");
        }
    }

    async fn invalidate(&self, user_id: &str) {
        let mut conn = self.conn.clone();
        if let Err(e) = conn.del::<_, ()>(cache_key(user_id)).await {
            warn!("Balance cache invalidation failed for {user_id}: {e}");
        }
    }
}
