//! レスポンスキー正規化
//!
//! HQ APIはcamelCase（`userId`, `blocksMe` など）でフィールドを返すため、
//! レコード構築前に全てのキーをsnake_caseへ変換する。値は変換しない。

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

/// 大文字+小文字列の直前に区切りを入れる（`HTTPResponse` → `HTTP_Response`）
static FIRST_CAP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(.)([A-Z][a-z]+)").expect("Failed to compile first-cap regex"));

/// 小文字・数字から大文字への遷移に区切りを入れる（`userId` → `user_Id`）
static ALL_CAP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-z0-9])([A-Z])").expect("Failed to compile all-cap regex"));

/// 単一のキーをsnake_caseへ変換
///
/// 既にsnake_caseのキーはそのまま返る（冪等）。
pub fn to_snake(key: &str) -> String {
    let first = FIRST_CAP_RE.replace_all(key, "${1}_${2}");
    ALL_CAP_RE.replace_all(&first, "${1}_${2}").to_lowercase()
}

/// マップの全キーを再帰的に正規化
pub fn normalize_map(map: Map<String, Value>) -> Map<String, Value> {
    map.into_iter()
        .map(|(k, v)| (to_snake(&k), normalize_value(v)))
        .collect()
}

/// JSON値に含まれる全てのマップのキーを正規化
///
/// 配列内のオブジェクト（検索結果の `data` など）も対象。
pub fn normalize_value(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(normalize_map(map)),
        Value::Array(items) => Value::Array(items.into_iter().map(normalize_value).collect()),
        other => other,
    }
}
