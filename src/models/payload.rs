//! 正規化済みペイロードからのフィールド抽出
//!
//! 全てのアクセサは「キーなし・null・型違い」を `None` として扱い、エラーにしない。
//! 必須のネストオブジェクトだけが [`required_map`] で `MalformedResponse` を返す。

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::errors::HqError;
use crate::normalize::normalize_value;

/// キーを正規化済みのJSONオブジェクト
pub type Payload = Map<String, Value>;

/// 正規化済みペイロードからレコードを構築する
pub trait FromPayload: Sized {
    fn from_payload(payload: &Payload) -> Result<Self, HqError>;
}

/// レコード構築の入力
///
/// 生のペイロードか、構築済みのレコードのどちらか。構築済みの場合は再構築しない。
#[derive(Debug, Clone)]
pub enum RecordSource<T> {
    Raw(Payload),
    Built(T),
}

impl<T: FromPayload> RecordSource<T> {
    pub fn build(self) -> Result<T, HqError> {
        match self {
            RecordSource::Raw(payload) => T::from_payload(&payload),
            RecordSource::Built(record) => Ok(record),
        }
    }
}

impl<T> From<Payload> for RecordSource<T> {
    fn from(payload: Payload) -> Self {
        RecordSource::Raw(payload)
    }
}

/// レスポンスボディをキー正規化済みのオブジェクトに変換
pub fn into_payload(body: Value) -> Result<Payload, HqError> {
    match normalize_value(body) {
        Value::Object(map) => Ok(map),
        other => Err(HqError::MalformedResponse(format!(
            "expected JSON object, got {}",
            kind_of(&other)
        ))),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

pub(crate) fn opt_string(payload: &Payload, key: &str) -> Option<String> {
    payload.get(key).and_then(Value::as_str).map(str::to_owned)
}

/// 金額フィールドを文字列として読む
///
/// 通常は通貨表記の文字列だが、数値で返された場合はその表記を文字列にする。
pub(crate) fn opt_amount(payload: &Payload, key: &str) -> Option<String> {
    match payload.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub(crate) fn opt_u64(payload: &Payload, key: &str) -> Option<u64> {
    payload.get(key).and_then(Value::as_u64)
}

pub(crate) fn opt_i64(payload: &Payload, key: &str) -> Option<i64> {
    payload.get(key).and_then(Value::as_i64)
}

pub(crate) fn opt_bool(payload: &Payload, key: &str) -> Option<bool> {
    payload.get(key).and_then(Value::as_bool)
}

pub(crate) fn opt_map<'a>(payload: &'a Payload, key: &str) -> Option<&'a Payload> {
    payload.get(key).and_then(Value::as_object)
}

/// null以外の値をそのまま取り出す（構造が不定のフィールド用）
pub(crate) fn opt_value(payload: &Payload, key: &str) -> Option<Value> {
    payload.get(key).filter(|v| !v.is_null()).cloned()
}

pub(crate) fn opt_u64_list(payload: &Payload, key: &str) -> Option<Vec<u64>> {
    payload
        .get(key)
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_u64).collect())
}

/// ISO-8601文字列、またはエポックミリ秒の数値を日時として読む
pub(crate) fn opt_datetime(payload: &Payload, key: &str) -> Option<DateTime<Utc>> {
    match payload.get(key)? {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

pub(crate) fn required_map<'a>(
    payload: &'a Payload,
    key: &str,
    record: &str,
) -> Result<&'a Payload, HqError> {
    opt_map(payload, key)
        .ok_or_else(|| HqError::MalformedResponse(format!("{}: missing `{}` object", record, key)))
}
