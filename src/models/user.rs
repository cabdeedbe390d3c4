use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use super::payload::{
    opt_amount, opt_bool, opt_datetime, opt_i64, opt_map, opt_string, opt_u64, opt_u64_list,
    opt_value, FromPayload, Payload,
};
use crate::errors::HqError;

/// 集計期間ごとの成績（勝利数・獲得賞金・順位）
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WindowStats {
    pub wins: Option<u64>,
    /// 通貨表記の文字列（例: `"$12.50"`）
    pub total: Option<String>,
    pub rank: Option<u64>,
}

/// ユーザーのリーダーボード情報
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LeaderboardRecord {
    pub total_cents: Option<i64>,
    pub total: Option<String>,
    pub unclaimed: Option<String>,
    pub alltime: WindowStats,
    pub weekly: WindowStats,
}

impl WindowStats {
    /// 期間オブジェクトから各メトリクスを個別に抽出
    ///
    /// 1つのメトリクスが欠けていても他のメトリクスの抽出は継続する。
    fn extract(window: Option<&Payload>) -> Self {
        let Some(window) = window else {
            return Self::default();
        };
        Self {
            wins: opt_u64(window, "wins"),
            total: opt_amount(window, "total"),
            rank: opt_u64(window, "rank"),
        }
    }
}

impl FromPayload for LeaderboardRecord {
    fn from_payload(payload: &Payload) -> Result<Self, HqError> {
        Ok(Self {
            total_cents: opt_i64(payload, "total_cents"),
            total: opt_amount(payload, "total"),
            unclaimed: opt_amount(payload, "unclaimed"),
            alltime: WindowStats::extract(opt_map(payload, "alltime")),
            weekly: WindowStats::extract(opt_map(payload, "weekly")),
        })
    }
}

/// 公開プロフィール
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserRecord {
    pub user_id: Option<u64>,
    pub username: Option<String>,
    pub avatar_url: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub referral_url: Option<String>,
    pub high_score: Option<u64>,
    pub games_played: Option<u64>,
    /// リーダーボードの `alltime.wins` とは別に返される勝利数
    pub win_count: Option<u64>,
    pub featured: Option<bool>,
    pub blocked: Option<bool>,
    pub blocks_me: Option<bool>,
    pub leaderboard: Option<LeaderboardRecord>,
}

impl FromPayload for UserRecord {
    fn from_payload(payload: &Payload) -> Result<Self, HqError> {
        let leaderboard = opt_map(payload, "leaderboard")
            .map(LeaderboardRecord::from_payload)
            .transpose()?;

        Ok(Self {
            user_id: opt_u64(payload, "user_id"),
            username: opt_string(payload, "username"),
            avatar_url: opt_string(payload, "avatar_url"),
            // 通常は `createdTimestamp`、古いレスポンスは `created`
            created: opt_datetime(payload, "created_timestamp")
                .or_else(|| opt_datetime(payload, "created")),
            referral_url: opt_string(payload, "referral_url"),
            high_score: opt_u64(payload, "high_score"),
            games_played: opt_u64(payload, "games_played"),
            win_count: opt_u64(payload, "win_count"),
            featured: opt_bool(payload, "featured"),
            blocked: opt_bool(payload, "blocked"),
            blocks_me: opt_bool(payload, "blocks_me"),
            leaderboard,
        })
    }
}

/// 認証ユーザー本人のプロフィール
///
/// 公開プロフィールに本人だけが見られるフィールドを加えたもの。
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SelfRecord {
    pub profile: UserRecord,
    pub friend_ids: Option<Vec<u64>>,
    pub stk: Option<String>,
    pub voip: Option<Value>,
    pub device_tokens: Option<Value>,
    pub preferences: Option<Value>,
    pub lives: Option<u64>,
    pub phone_number: Option<String>,
    pub referred: Option<bool>,
}

impl FromPayload for SelfRecord {
    fn from_payload(payload: &Payload) -> Result<Self, HqError> {
        Ok(Self {
            profile: UserRecord::from_payload(payload)?,
            friend_ids: opt_u64_list(payload, "friend_ids"),
            stk: opt_string(payload, "stk"),
            voip: opt_value(payload, "voip"),
            device_tokens: opt_value(payload, "device_tokens"),
            preferences: opt_value(payload, "preferences"),
            lives: opt_u64(payload, "lives"),
            phone_number: opt_string(payload, "phone_number"),
            referred: opt_bool(payload, "referred"),
        })
    }
}
