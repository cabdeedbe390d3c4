//! ユーザー指定の解決
//!
//! ユーザー名・数値ID・構築済みレコードのいずれかを受け取り、数値IDに解決する。
//! リモート検索を行うのはユーザー名が渡された場合だけ。

use std::future::Future;

use crate::errors::HqError;
use crate::models::UserRecord;

/// ユーザーの指定方法
#[derive(Debug, Clone, PartialEq)]
pub enum UserRef {
    /// ユーザー名（検索して先頭の候補を採用）
    Handle(String),
    /// 数値ID
    Id(u64),
    /// 取得済みのプロフィール
    Record(UserRecord),
}

impl From<u64> for UserRef {
    fn from(id: u64) -> Self {
        UserRef::Id(id)
    }
}

impl From<&str> for UserRef {
    fn from(handle: &str) -> Self {
        UserRef::Handle(handle.to_string())
    }
}

impl From<String> for UserRef {
    fn from(handle: String) -> Self {
        UserRef::Handle(handle)
    }
}

impl From<UserRecord> for UserRef {
    fn from(record: UserRecord) -> Self {
        UserRef::Record(record)
    }
}

impl From<&UserRecord> for UserRef {
    fn from(record: &UserRecord) -> Self {
        UserRef::Record(record.clone())
    }
}

/// ユーザー指定を数値IDに解決
///
/// `search` はユーザー名検索を行う関数で、`UserRef::Handle` の場合だけ呼ばれる。
/// 検索結果が空なら `NotFound`、複数ならサーバーの返却順で先頭を採用する。
pub async fn resolve_user_id<F, Fut>(user: UserRef, search: F) -> Result<u64, HqError>
where
    F: FnOnce(String) -> Fut,
    Fut: Future<Output = Result<Vec<UserRecord>, HqError>>,
{
    match user {
        UserRef::Id(id) => Ok(id),
        UserRef::Record(record) => record.user_id.ok_or_else(|| {
            HqError::MalformedResponse("user record has no user id".to_string())
        }),
        UserRef::Handle(handle) => {
            log::debug!("Resolving user id for handle: {}", handle);
            let candidates = search(handle.clone()).await?;
            let first = candidates
                .into_iter()
                .next()
                .ok_or_else(|| HqError::NotFound(handle.clone()))?;
            first.user_id.ok_or_else(|| {
                HqError::MalformedResponse(format!("search result for {} has no user id", handle))
            })
        }
    }
}
