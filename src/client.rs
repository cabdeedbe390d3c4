// =============================================================================
// HQ APIクライアント
// =============================================================================
// 認証済みセッションとして以下を提供する
//
// - プロフィール・検索・残高などのデータ取得（キー正規化 → レコード構築 → キャッシュ）
// - ユーザー名／ID／レコードによるフレンド操作
// - ライブソケットへのコマンド生成と送信
//
// アクセストークンは構築時に一度だけ取得し、自動更新はしない。
// 期限切れの場合は新しいクライアントを作り直す。
// =============================================================================

use std::future::Future;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::{json, Value};
use tokio::sync::{mpsc, Mutex};

use crate::cache::{CacheKey, CachedValue, ResponseCache};
use crate::config::{http_timeout, ClientConfig};
use crate::errors::HqError;
use crate::messages::SocketCommand;
use crate::models::{
    into_payload, FriendAcceptance, FriendRequest, FriendResponse, FromPayload, Payload,
    PayoutInfo, Schedule, SelfRecord, UserRecord,
};
use crate::resolver::{resolve_user_id, UserRef};
use crate::socket::{LiveSocket, SocketEvent};
use crate::util::mask_token;

/// 共通ヘッダー付きのHTTPクライアントを構築
pub(crate) fn build_http_client(
    config: &ClientConfig,
    bearer: Option<&str>,
) -> Result<Client, HqError> {
    let header = |value: &str| {
        HeaderValue::from_str(value).map_err(|e| HqError::InvalidHeader(e.to_string()))
    };

    let mut headers = HeaderMap::new();
    headers.insert("x-hq-client", header(&config.client)?);
    headers.insert(USER_AGENT, header(&config.user_agent)?);
    if let Some(token) = bearer {
        let mut value = header(&format!("Bearer {}", token))?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }

    Ok(Client::builder()
        .default_headers(headers)
        .timeout(http_timeout())
        .build()?)
}

/// ステータスコードを検査し、失敗時はエラーに変換
pub(crate) async fn check_status(response: Response) -> Result<Response, HqError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response.text().await.unwrap_or_default();
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            log::warn!("HQ API rejected credentials: {}", status);
            Err(HqError::AuthFailure {
                status: status.as_u16(),
                message,
            })
        }
        _ => {
            log::error!("HQ API error: {} - {}", status, message);
            Err(HqError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}

/// レスポンスボディを読み、キー正規化済みのペイロードにする
pub(crate) async fn read_payload(response: Response) -> Result<Payload, HqError> {
    let body: Value = response.json().await.map_err(|e| {
        if e.is_decode() {
            HqError::MalformedResponse(e.to_string())
        } else {
            HqError::Http(e)
        }
    })?;
    into_payload(body)
}

/// HQ APIの認証済みクライアント
pub struct HqClient {
    http: Client,
    config: ClientConfig,
    access_token: String,
    cache: ResponseCache,
    socket: Mutex<Option<LiveSocket>>,
}

impl HqClient {
    /// アクセストークンからクライアントを作成
    pub fn new(access_token: impl Into<String>, config: ClientConfig) -> Result<Self, HqError> {
        let access_token = access_token.into();
        let http = build_http_client(&config, Some(&access_token))?;
        let cache = if config.caching {
            ResponseCache::new(config.cache_ttl)
        } else {
            ResponseCache::disabled()
        };

        log::info!(
            "HQ client created (token: {}, caching: {})",
            mask_token(&access_token),
            config.caching
        );

        Ok(Self {
            http,
            config,
            access_token,
            cache,
            socket: Mutex::new(None),
        })
    }

    /// ログイントークンをアクセストークンに交換してクライアントを作成
    ///
    /// 交換に失敗した場合はステータスに関わらず `AuthFailure`。
    pub async fn login(login_token: &str, config: ClientConfig) -> Result<Self, HqError> {
        log::info!("Exchanging login token: {}", mask_token(login_token));

        let http = build_http_client(&config, None)?;
        let response = http
            .post(config.url("/tokens"))
            .json(&json!({ "token": login_token }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            log::warn!("Token exchange failed: {} - {}", status, message);
            return Err(HqError::AuthFailure {
                status: status.as_u16(),
                message,
            });
        }

        let payload = read_payload(response).await?;
        let access_token = payload
            .get("access_token")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                HqError::MalformedResponse("token response has no access token".to_string())
            })?
            .to_string();

        Self::new(access_token, config)
    }

    /// 現在のアクセストークン
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn request(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        self.http.request(method, self.config.url(path))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, HqError> {
        let response = request.send().await?;
        check_status(response).await
    }

    async fn fetch_payload(&self, request: RequestBuilder) -> Result<Payload, HqError> {
        let response = self.send(request).await?;
        read_payload(response).await
    }

    async fn fetch<T: FromPayload>(&self, request: RequestBuilder) -> Result<T, HqError> {
        let payload = self.fetch_payload(request).await?;
        T::from_payload(&payload)
    }

    /// キャッシュ優先で取得
    ///
    /// キャッシュが有効で期限内のエントリがあればそれを返し、なければ `fetch` を実行して保存する。
    /// 同じキーへの同時ミスは1回のリクエストにまとまる。
    async fn cached<T, F, Fut>(&self, key: CacheKey, fetch: F) -> Result<T, HqError>
    where
        T: Into<CachedValue> + TryFrom<CachedValue>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, HqError>>,
    {
        let value = self
            .cache
            .get_or_try_insert_with(key.clone(), move || async move {
                fetch().await.map(Into::<CachedValue>::into)
            })
            .await?;

        T::try_from(value).map_err(|_| {
            log::error!("Response cache type mismatch for {:?}", key);
            HqError::MalformedResponse(format!("cached value for {:?} has an unexpected type", key))
        })
    }

    /// キャッシュをクリア
    pub async fn clear_cache(&self) {
        self.cache.clear().await;
    }

    /// ユーザー指定を数値IDに解決
    pub async fn resolve_user_id(&self, user: impl Into<UserRef>) -> Result<u64, HqError> {
        resolve_user_id(user.into(), move |handle: String| async move {
            self.search_users(&handle).await
        })
        .await
    }

    // -------------------------------------------------------------------------
    // データ取得
    // -------------------------------------------------------------------------

    /// ユーザー名で検索（サーバーの返却順）
    pub async fn search_users(&self, query: &str) -> Result<Vec<UserRecord>, HqError> {
        self.cached(CacheKey::SearchUsers(query.to_string()), move || {
            self.fetch_search(query)
        })
        .await
    }

    async fn fetch_search(&self, query: &str) -> Result<Vec<UserRecord>, HqError> {
        log::debug!("Searching users: {}", query);
        let request = self
            .request(reqwest::Method::GET, "/users")
            .query(&[("q", query)]);
        let payload = self.fetch_payload(request).await?;

        let items = payload
            .get("data")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                HqError::MalformedResponse("search response has no `data` list".to_string())
            })?;

        items
            .iter()
            .map(|item| {
                item.as_object()
                    .ok_or_else(|| {
                        HqError::MalformedResponse("search result is not an object".to_string())
                    })
                    .and_then(UserRecord::from_payload)
            })
            .collect()
    }

    /// 公開プロフィールを取得
    pub async fn user_info(&self, user: impl Into<UserRef>) -> Result<UserRecord, HqError> {
        let user_id = self.resolve_user_id(user).await?;
        self.cached(CacheKey::UserInfo(user_id), move || {
            log::debug!("Fetching user info: {}", user_id);
            self.fetch::<UserRecord>(
                self.request(reqwest::Method::GET, &format!("/users/{}", user_id)),
            )
        })
        .await
    }

    /// 自分のプロフィールを取得
    pub async fn me(&self) -> Result<SelfRecord, HqError> {
        self.cached(CacheKey::Me, move || {
            self.fetch::<SelfRecord>(self.request(reqwest::Method::GET, "/users/me"))
        })
        .await
    }

    /// 現在の番組スケジュールを取得
    pub async fn schedule(&self) -> Result<Schedule, HqError> {
        self.cached(CacheKey::Schedule, move || {
            let request = self
                .request(reqwest::Method::GET, "/shows/now")
                .query(&[("type", "hq")]);
            self.fetch::<Schedule>(request)
        })
        .await
    }

    /// 残高と出金履歴を取得
    pub async fn payout_info(&self) -> Result<PayoutInfo, HqError> {
        self.cached(CacheKey::PayoutInfo, move || {
            self.fetch::<PayoutInfo>(self.request(reqwest::Method::GET, "/users/me/payouts"))
        })
        .await
    }

    /// トークンが有効か確認
    ///
    /// スケジュールに `active` キーがあれば（値がnullでも）有効。認証エラーは `false` として返す。
    pub async fn valid_auth(&self) -> Result<bool, HqError> {
        match self.schedule().await {
            Ok(schedule) => Ok(schedule.has_active),
            Err(HqError::AuthFailure { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// S3アップロード用の認証情報
    pub async fn aws_credentials(&self) -> Result<Payload, HqError> {
        self.fetch_payload(self.request(reqwest::Method::GET, "/credentials/s3"))
            .await
    }

    /// 出金申請（成功時のみ `true`）
    pub async fn cashout(&self, paypal_email: &str) -> Result<bool, HqError> {
        log::info!("Requesting cashout");
        let response = self
            .request(reqwest::Method::POST, "/users/me/payouts")
            .form(&[("email", paypal_email)])
            .send()
            .await?;
        Ok(response.status() == StatusCode::OK)
    }

    pub async fn make_it_rain(&self) -> Result<bool, HqError> {
        let response = self
            .request(reqwest::Method::POST, "/easter-eggs/makeItRain")
            .send()
            .await?;
        Ok(response.status() == StatusCode::OK)
    }

    /// アバターを削除し、既定アバターのURLを返す
    pub async fn delete_avatar(&self) -> Result<String, HqError> {
        let payload = self
            .fetch_payload(self.request(reqwest::Method::DELETE, "/users/me/avatarUrl"))
            .await?;
        payload
            .get("avatar_url")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| HqError::MalformedResponse("response has no avatar url".to_string()))
    }

    // -------------------------------------------------------------------------
    // フレンド
    // -------------------------------------------------------------------------

    async fn friend_request_from(&self, response: &FriendResponse) -> Result<FriendRequest, HqError> {
        Ok(FriendRequest {
            requested_user: self.user_info(response.requested_user_id).await?,
            requesting_user: self.user_info(response.requesting_user_id).await?,
            status: response.status.clone(),
        })
    }

    /// フレンド申請を送る
    pub async fn add_friend(&self, user: impl Into<UserRef>) -> Result<FriendRequest, HqError> {
        let user_id = self.resolve_user_id(user).await?;
        log::info!("Sending friend request to {}", user_id);

        let response: FriendResponse = self
            .fetch(self.request(
                reqwest::Method::POST,
                &format!("/friends/{}/requests", user_id),
            ))
            .await?;
        self.friend_request_from(&response).await
    }

    /// フレンド状態を取得
    pub async fn friend_status(&self, user: impl Into<UserRef>) -> Result<String, HqError> {
        let user_id = self.resolve_user_id(user).await?;
        let payload = self
            .fetch_payload(self.request(
                reqwest::Method::GET,
                &format!("/friends/{}/status", user_id),
            ))
            .await?;
        payload
            .get("status")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| HqError::MalformedResponse("friend status missing".to_string()))
    }

    /// フレンド申請を承認
    pub async fn accept_friend(
        &self,
        user: impl Into<UserRef>,
    ) -> Result<FriendAcceptance, HqError> {
        let user_id = self.resolve_user_id(user).await?;
        log::info!("Accepting friend request from {}", user_id);

        let request = self
            .request(reqwest::Method::PUT, &format!("/friends/{}/status", user_id))
            .form(&[("status", "ACCEPTED")]);
        let response: FriendResponse = self.fetch(request).await?;

        Ok(FriendAcceptance {
            request: self.friend_request_from(&response).await?,
            accepted_at: response.created,
        })
    }

    /// フレンドを解除
    pub async fn remove_friend(&self, user: impl Into<UserRef>) -> Result<bool, HqError> {
        let user_id = self.resolve_user_id(user).await?;
        log::info!("Removing friend {}", user_id);

        let payload = self
            .fetch_payload(self.request(reqwest::Method::DELETE, &format!("/friends/{}", user_id)))
            .await?;
        payload
            .get("result")
            .and_then(Value::as_bool)
            .ok_or_else(|| HqError::MalformedResponse("remove friend result missing".to_string()))
    }

    // -------------------------------------------------------------------------
    // ライブソケット
    // -------------------------------------------------------------------------

    /// 購読コマンドを生成
    pub async fn generate_subscribe(&self) -> Result<SocketCommand, HqError> {
        let schedule = self.schedule().await?;
        let (_, broadcast_id) = schedule.live_broadcast()?;
        Ok(SocketCommand::Subscribe {
            broadcast_id: broadcast_id.clone(),
        })
    }

    /// 回答コマンドを生成
    pub async fn generate_answer(
        &self,
        question_id: u64,
        answer_id: u64,
    ) -> Result<SocketCommand, HqError> {
        let schedule = self.schedule().await?;
        let (_, broadcast_id) = schedule.live_broadcast()?;
        Ok(SocketCommand::Answer {
            question_id,
            broadcast_id: broadcast_id.clone(),
            answer_id,
        })
    }

    /// エクストラライフ使用コマンドを生成
    pub async fn generate_extra_life(&self, question_id: u64) -> Result<SocketCommand, HqError> {
        let schedule = self.schedule().await?;
        let (_, broadcast_id) = schedule.live_broadcast()?;
        Ok(SocketCommand::UseExtraLife {
            broadcast_id: broadcast_id.clone(),
            question_id,
        })
    }

    /// 配信中のブロードキャストのソケットに接続
    ///
    /// 配信がない場合は `Ok(None)`。接続済みの場合は古い接続を閉じて張り直す。
    /// `subscribe` が `true` なら接続直後に購読コマンドを送る。
    pub async fn connect(
        &self,
        subscribe: bool,
    ) -> Result<Option<mpsc::UnboundedReceiver<SocketEvent>>, HqError> {
        let schedule = self.schedule().await?;
        let Some(url) = schedule
            .live_broadcast()
            .ok()
            .and_then(|(broadcast, _)| broadcast.websocket_url())
        else {
            log::info!("No live broadcast, not connecting");
            return Ok(None);
        };

        let (socket, events) = LiveSocket::open(&url, Some(&self.access_token)).await?;
        {
            let mut current = self.socket.lock().await;
            if let Some(old) = current.replace(socket) {
                if let Err(e) = old.close().await {
                    log::warn!("Failed to close previous live socket: {}", e);
                }
            }
        }

        if subscribe {
            self.subscribe().await?;
        }
        Ok(Some(events))
    }

    /// ソケットを切断
    pub async fn disconnect(&self) -> Result<(), HqError> {
        let socket = self.socket.lock().await.take();
        match socket {
            Some(socket) => socket.close().await,
            None => Ok(()),
        }
    }

    pub async fn is_connected(&self) -> bool {
        self.socket.lock().await.is_some()
    }

    async fn send_command(&self, command: &SocketCommand) -> Result<bool, HqError> {
        let socket = self.socket.lock().await;
        match socket.as_ref() {
            Some(socket) => {
                socket.send_command(command).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// 現在のブロードキャストを購読（未接続なら `false`）
    pub async fn subscribe(&self) -> Result<bool, HqError> {
        if !self.is_connected().await {
            return Ok(false);
        }
        let command = self.generate_subscribe().await?;
        self.send_command(&command).await
    }

    /// 回答を送信（未接続なら `false`）
    pub async fn answer(&self, question_id: u64, answer_id: u64) -> Result<bool, HqError> {
        if !self.is_connected().await {
            return Ok(false);
        }
        let command = self.generate_answer(question_id, answer_id).await?;
        self.send_command(&command).await
    }

    /// エクストラライフを使用（未接続なら `false`）
    pub async fn use_extra_life(&self, question_id: u64) -> Result<bool, HqError> {
        if !self.is_connected().await {
            return Ok(false);
        }
        let command = self.generate_extra_life(question_id).await?;
        self.send_command(&command).await
    }
}
