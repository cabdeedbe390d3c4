use chrono::{DateTime, Utc};
use serde::Serialize;

use super::payload::{opt_datetime, opt_string, opt_u64, required_map, FromPayload, Payload};
use super::user::UserRecord;
use crate::errors::HqError;

/// フレンド操作レスポンスの生の内容
///
/// 双方のユーザーはIDだけが含まれる。プロフィールはクライアント側で別途取得する。
#[derive(Debug, Clone, PartialEq)]
pub struct FriendResponse {
    pub requested_user_id: u64,
    pub requesting_user_id: u64,
    pub status: Option<String>,
    pub created: Option<DateTime<Utc>>,
}

fn user_id_of(payload: &Payload, key: &str) -> Result<u64, HqError> {
    let user = required_map(payload, key, "friend response")?;
    opt_u64(user, "user_id").ok_or_else(|| {
        HqError::MalformedResponse(format!("friend response: `{}` has no user id", key))
    })
}

impl FromPayload for FriendResponse {
    fn from_payload(payload: &Payload) -> Result<Self, HqError> {
        Ok(Self {
            requested_user_id: user_id_of(payload, "requested_user")?,
            requesting_user_id: user_id_of(payload, "requesting_user")?,
            status: opt_string(payload, "status"),
            created: opt_datetime(payload, "created"),
        })
    }
}

/// フレンド申請の結果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FriendRequest {
    pub requested_user: UserRecord,
    pub requesting_user: UserRecord,
    pub status: Option<String>,
}

/// フレンド承認の結果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FriendAcceptance {
    pub request: FriendRequest,
    pub accepted_at: Option<DateTime<Utc>>,
}
