// =============================================================================
// 共通設定・定数モジュール
// =============================================================================
// クライアント全体で使用する共通の設定値・定数を定義
// =============================================================================

use std::time::Duration;

/// HQ APIのベースURL
pub const API_BASE: &str = "https://api-quiz.hype.space";

/// HTTPリクエストのデフォルトタイムアウト（秒）
///
/// REST API・トークン交換など全てのHTTPリクエストで使用。
pub const HTTP_TIMEOUT_SECS: u64 = 10;

/// `x-hq-client` ヘッダーのデフォルト値
pub const DEFAULT_CLIENT: &str = "Android/1.6.2";

/// `user-agent` ヘッダーのデフォルト値
pub const DEFAULT_USER_AGENT: &str = "okhttp/3.8.0";

/// レスポンスキャッシュのデフォルトTTL（秒）
pub const DEFAULT_CACHE_TTL_SECS: u64 = 15;

/// HTTPリクエストのデフォルトタイムアウト（Duration）
///
/// HTTPクライアント構築時に直接使用可能
pub fn http_timeout() -> Duration {
    Duration::from_secs(HTTP_TIMEOUT_SECS)
}

/// クライアント設定
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// APIのベースURL（テスト時はモックサーバーを指す）
    pub base_url: String,
    /// `x-hq-client` ヘッダー
    pub client: String,
    /// `user-agent` ヘッダー
    pub user_agent: String,
    /// レスポンスキャッシュを有効にするか（デフォルト: 無効）
    pub caching: bool,
    /// キャッシュのTTL
    pub cache_ttl: Duration,
}

impl ClientConfig {
    /// ベースURLだけを差し替えた設定を作成
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// キャッシュを有効化
    pub fn caching(mut self, ttl: Duration) -> Self {
        self.caching = true;
        self.cache_ttl = ttl;
        self
    }

    /// パスからリクエストURLを組み立てる
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: API_BASE.to_string(),
            client: DEFAULT_CLIENT.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            caching: false,
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
        }
    }
}
