//! 时效缓存
//!
//! 显式缓存对象，由服务构造时注入持有，不是进程级单例。
//! 过期条目永不返回：超过 TTL 的读取一律当作未命中，迫使调用方重取。
//! 刷新是幂等的：并发重算同一个值是安全的，最多浪费一次冗余请求，
//! 因此读写只用短持锁，绝不跨 await 持锁。

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

struct CacheEntry<V> {
    value: V,
    captured_at: Instant,
    ttl: Duration,
}

impl<V> CacheEntry<V> {
    fn is_fresh(&self) -> bool {
        self.captured_at.elapsed() < self.ttl
    }
}

/// 按键时效缓存
pub struct TtlCache<K, V> {
    entries: RwLock<HashMap<K, CacheEntry<V>>>,
    default_ttl: Duration,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            default_ttl,
        }
    }

    /// 读取；过期或不存在返回 None
    pub async fn get(&self, key: &K) -> Option<V> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| entry.is_fresh())
            .map(|entry| entry.value.clone())
    }

    pub async fn insert(&self, key: K, value: V) {
        let mut entries = self.entries.write().await;
        entries.insert(
            key,
            CacheEntry {
                value,
                captured_at: Instant::now(),
                ttl: self.default_ttl,
            },
        );
    }

    /// 显式失效全部条目
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    pub async fn remove(&self, key: &K) {
        self.entries.write().await.remove(key);
    }
}
