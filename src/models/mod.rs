//! 正規化済みペイロードから構築する型付きレコード

pub mod friend;
pub mod payload;
pub mod payout;
pub mod schedule;
pub mod user;

pub use friend::{FriendAcceptance, FriendRequest, FriendResponse};
pub use payload::{into_payload, FromPayload, Payload, RecordSource};
pub use payout::{BalanceRecord, PayoutInfo, PayoutMetadata, PayoutRecord};
pub use schedule::{Broadcast, BroadcastId, Schedule};
pub use user::{LeaderboardRecord, SelfRecord, UserRecord, WindowStats};
