use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use super::payload::{opt_bool, opt_datetime, opt_map, opt_string, opt_u64, FromPayload, Payload};
use crate::errors::HqError;

/// ブロードキャストID
///
/// サーバーは数値で返すが、文字列で返されることもあるため受け取った型のまま保持する。
/// ソケットへ送信する際も同じ型で書き戻す。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum BroadcastId {
    Numeric(u64),
    Text(String),
}

impl BroadcastId {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_u64().map(BroadcastId::Numeric),
            Value::String(s) => Some(BroadcastId::Text(s.clone())),
            _ => None,
        }
    }
}

/// 配信中のブロードキャスト
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Broadcast {
    pub broadcast_id: Option<BroadcastId>,
    pub title: Option<String>,
    pub socket_url: Option<String>,
}

impl Broadcast {
    /// ソケット接続用のURL（`https` → `wss`, `http` → `ws`）
    pub fn websocket_url(&self) -> Option<String> {
        let url = self.socket_url.as_deref()?;
        let converted = if let Some(rest) = url.strip_prefix("https") {
            format!("wss{}", rest)
        } else if let Some(rest) = url.strip_prefix("http") {
            format!("ws{}", rest)
        } else {
            url.to_string()
        };
        Some(converted)
    }
}

impl FromPayload for Broadcast {
    fn from_payload(payload: &Payload) -> Result<Self, HqError> {
        Ok(Self {
            broadcast_id: payload.get("broadcast_id").and_then(BroadcastId::from_value),
            title: opt_string(payload, "title"),
            socket_url: opt_string(payload, "socket_url"),
        })
    }
}

/// 番組スケジュール（`/shows/now`）
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Schedule {
    pub active: Option<bool>,
    /// レスポンスに `active` キーがあったか（値がnullでも `true`）
    pub has_active: bool,
    pub show_id: Option<u64>,
    pub show_type: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub next_show_time: Option<DateTime<Utc>>,
    pub next_show_prize: Option<String>,
    pub broadcast: Option<Broadcast>,
}

impl Schedule {
    /// 配信中のブロードキャストとそのIDを返す
    ///
    /// ブロードキャストがない、またはIDがない場合は `NoActiveBroadcast`。
    pub fn live_broadcast(&self) -> Result<(&Broadcast, &BroadcastId), HqError> {
        let broadcast = self.broadcast.as_ref().ok_or(HqError::NoActiveBroadcast)?;
        let id = broadcast
            .broadcast_id
            .as_ref()
            .ok_or(HqError::NoActiveBroadcast)?;
        Ok((broadcast, id))
    }
}

impl FromPayload for Schedule {
    fn from_payload(payload: &Payload) -> Result<Self, HqError> {
        let broadcast = opt_map(payload, "broadcast")
            .map(Broadcast::from_payload)
            .transpose()?;

        Ok(Self {
            active: opt_bool(payload, "active"),
            has_active: payload.contains_key("active"),
            show_id: opt_u64(payload, "show_id"),
            show_type: opt_string(payload, "show_type"),
            start_time: opt_datetime(payload, "start_time"),
            next_show_time: opt_datetime(payload, "next_show_time"),
            next_show_prize: opt_string(payload, "next_show_prize"),
            broadcast,
        })
    }
}
