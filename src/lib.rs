//! HQ trivia API client
//!
//! 認証済みセッション（[`HqClient`]）と認証前のアカウント操作（[`AccountClient`]）を提供する。
//!
//! レスポンスのキーは全てsnake_caseに正規化してから型付きレコードに変換する。
//! キャッシュは [`ClientConfig::caching`] で明示的に有効化した場合だけ使われる。

pub mod account;
pub mod cache;
pub mod client;
pub mod config;
pub mod errors;
pub mod messages;
pub mod models;
pub mod normalize;
pub mod resolver;
pub mod socket;
pub mod util; // doctestのためpubにする

pub use account::AccountClient;
pub use cache::{CacheKey, CachedValue, ResponseCache, TtlCache};
pub use client::HqClient;
pub use config::ClientConfig;
pub use errors::HqError;
pub use messages::SocketCommand;
pub use models::{
    BalanceRecord, Broadcast, BroadcastId, FriendAcceptance, FriendRequest, LeaderboardRecord,
    PayoutInfo, PayoutMetadata, PayoutRecord, RecordSource, Schedule, SelfRecord, UserRecord,
    WindowStats,
};
pub use resolver::UserRef;
pub use socket::{LiveSocket, SocketEvent};
