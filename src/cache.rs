// =============================================================================
// レスポンスキャッシュ
// =============================================================================
// 操作名＋引数をキーに、構築済みレコードを一定時間キャッシュしてAPIコールを削減
// 期限切れは読み取り時にだけ判定し、古いエントリは次回の取得で上書きされる
// 同じキーへの同時ミスはキーごとのロックで1回の取得にまとめる
// =============================================================================

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};

use crate::models::{PayoutInfo, Schedule, SelfRecord, UserRecord};

/// キャッシュエントリ
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    /// キャッシュされた値
    value: V,
    /// キャッシュ作成時刻
    stored_at: Instant,
}

impl<V> CacheEntry<V> {
    /// `now` 時点で指定TTLに対して有効かどうかを判定
    fn is_fresh(&self, ttl: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.stored_at) < ttl
    }
}

/// TTL付きキャッシュ
///
/// 無効化されている場合、`get` は常に `None` を返し `insert` は何もしない。
/// 「読んで無ければ取得して書く」は [`TtlCache::get_or_try_insert_with`] を使う。
#[derive(Debug)]
pub struct TtlCache<K, V> {
    entries: RwLock<HashMap<K, CacheEntry<V>>>,
    /// 取得中のキーごとのロック
    inflight: Mutex<HashMap<K, Arc<Mutex<()>>>>,
    ttl: Duration,
    enabled: bool,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
    V: Clone,
{
    /// 指定TTLで有効なキャッシュを作成
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            inflight: Mutex::new(HashMap::new()),
            ttl,
            enabled: true,
        }
    }

    /// 無効なキャッシュを作成（全ての呼び出しがAPIを叩く）
    pub fn disabled() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            inflight: Mutex::new(HashMap::new()),
            ttl: Duration::ZERO,
            enabled: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// キャッシュから値を取得
    ///
    /// エントリがない、または期限切れの場合はNoneを返す
    pub async fn get(&self, key: &K) -> Option<V> {
        self.get_at(key, Instant::now()).await
    }

    /// `now` 時点の有効期限でキャッシュから値を取得
    pub async fn get_at(&self, key: &K, now: Instant) -> Option<V> {
        if !self.enabled {
            return None;
        }

        let entries = self.entries.read().await;
        match entries.get(key) {
            Some(e) if e.is_fresh(self.ttl, now) => {
                log::debug!("Response cache hit: {:?}", key);
                Some(e.value.clone())
            }
            Some(_) => {
                log::debug!("Response cache expired: {:?}", key);
                None
            }
            None => {
                log::debug!("Response cache miss: {:?}", key);
                None
            }
        }
    }

    /// キャッシュに値を保存
    pub async fn insert(&self, key: K, value: V) {
        self.insert_at(key, value, Instant::now()).await;
    }

    /// `now` を作成時刻としてキャッシュに値を保存
    pub async fn insert_at(&self, key: K, value: V, now: Instant) {
        if !self.enabled {
            return;
        }

        let mut entries = self.entries.write().await;
        log::debug!("Response cached: {:?} (TTL: {:?})", key, self.ttl);
        entries.insert(
            key,
            CacheEntry {
                value,
                stored_at: now,
            },
        );
    }

    /// 有効なエントリがあれば返し、なければ `fetch` の結果を保存して返す
    ///
    /// 同じキーで同時にミスした呼び出しは先行する1回の `fetch` を待ち、その結果を受け取る。
    /// `fetch` が失敗した場合は何も保存せず、待っていた呼び出しは自分で取得し直す。
    /// 無効化されている場合は毎回 `fetch` を実行する。
    pub async fn get_or_try_insert_with<F, Fut, E>(&self, key: K, fetch: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if !self.enabled {
            return fetch().await;
        }

        if let Some(value) = self.get(&key).await {
            return Ok(value);
        }

        let gate = {
            let mut inflight = self.inflight.lock().await;
            Arc::clone(inflight.entry(key.clone()).or_default())
        };
        let _guard = gate.lock().await;

        // 待っている間に先行の取得が保存していればそれを使う
        if let Some(value) = self.get(&key).await {
            return Ok(value);
        }

        let value = fetch().await?;
        self.insert(key, value.clone()).await;
        Ok(value)
    }

    /// キャッシュをクリア
    pub async fn clear(&self) {
        let mut entries = self.entries.write().await;
        entries.clear();
        log::debug!("Response cache cleared");
    }

    /// 保持しているエントリ数（期限切れを含む）
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

/// キャッシュキー
///
/// バリアントが操作の名前空間、フィールドがその引数。
/// 異なる操作同士で同じ引数を使ってもキーは衝突しない。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    SearchUsers(String),
    UserInfo(u64),
    Me,
    Schedule,
    PayoutInfo,
}

/// キャッシュに保存する値
#[derive(Debug, Clone)]
pub enum CachedValue {
    Users(Vec<UserRecord>),
    User(UserRecord),
    Me(SelfRecord),
    Schedule(Schedule),
    PayoutInfo(PayoutInfo),
}

macro_rules! cached_value_conversions {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for CachedValue {
                fn from(value: $ty) -> Self {
                    CachedValue::$variant(value)
                }
            }

            impl TryFrom<CachedValue> for $ty {
                type Error = CachedValue;

                fn try_from(value: CachedValue) -> Result<Self, Self::Error> {
                    match value {
                        CachedValue::$variant(inner) => Ok(inner),
                        other => Err(other),
                    }
                }
            }
        )*
    };
}

cached_value_conversions! {
    Users => Vec<UserRecord>,
    User => UserRecord,
    Me => SelfRecord,
    Schedule => Schedule,
    PayoutInfo => PayoutInfo,
}

/// クライアントが保持するレスポンスキャッシュ
pub type ResponseCache = TtlCache<CacheKey, CachedValue>;
