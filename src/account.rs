//! 認証前のアカウント操作
//!
//! SMS認証・ユーザー名の空き確認・アカウント作成。アクセストークンは使わない。
//! 各エンドポイントの判定基準（ステータスやキーの有無）はサーバー側の仕様に従う。

use reqwest::{Client, StatusCode};
use serde_json::Value;

use crate::client::{build_http_client, check_status, read_payload};
use crate::config::ClientConfig;
use crate::errors::HqError;
use crate::models::Payload;

/// アカウント作成時の固定言語
const SIGNUP_LANGUAGE: &str = "en";

/// 認証なしで呼べるAPIのクライアント
pub struct AccountClient {
    http: Client,
    config: ClientConfig,
}

impl AccountClient {
    pub fn new(config: ClientConfig) -> Result<Self, HqError> {
        Ok(Self {
            http: build_http_client(&config, None)?,
            config,
        })
    }

    /// SMS認証を開始し、認証IDを返す
    ///
    /// レスポンスに認証IDがなければ電話番号が不正とみなす。
    pub async fn verify(&self, phone: &str) -> Result<String, HqError> {
        log::info!("Requesting SMS verification");
        let response = self
            .http
            .post(self.config.url("/verifications"))
            .form(&[("method", "sms"), ("phone", phone)])
            .send()
            .await?;

        let payload = read_payload(response).await?;
        payload
            .get("verification_id")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or(HqError::InvalidPhoneNumber)
    }

    /// 認証コードを送信（404以外なら成功）
    pub async fn submit_code(&self, verification_id: &str, code: &str) -> Result<bool, HqError> {
        let response = self
            .http
            .post(self.config.url(&format!("/verifications/{}", verification_id)))
            .form(&[("code", code)])
            .send()
            .await?;
        Ok(response.status() != StatusCode::NOT_FOUND)
    }

    /// ユーザー名が使用可能か
    ///
    /// サーバーは使用可能なとき空でないオブジェクトを返す。
    pub async fn username_available(&self, username: &str) -> Result<bool, HqError> {
        let response = self
            .http
            .post(self.config.url("/usernames/available"))
            .form(&[("username", username)])
            .send()
            .await?;
        let payload = read_payload(response).await?;
        Ok(!payload.is_empty())
    }

    /// アカウントを作成
    ///
    /// レスポンスはキー正規化済みのまま返す（`auth_token` などを含む）。
    pub async fn create_user(
        &self,
        username: &str,
        verification_id: &str,
        referral: &str,
        region: &str,
    ) -> Result<Payload, HqError> {
        log::info!("Creating user: {}", username);
        let response = self
            .http
            .post(self.config.url("/users"))
            .form(&[
                ("country", region),
                ("language", SIGNUP_LANGUAGE),
                ("referringUsername", referral),
                ("username", username),
                ("verificationId", verification_id),
            ])
            .send()
            .await?;

        let response = check_status(response).await?;
        read_payload(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server, ServerGuard};
    use serde_json::json;

    fn account(server: &ServerGuard) -> AccountClient {
        AccountClient::new(ClientConfig::with_base_url(server.url())).unwrap()
    }

    #[tokio::test]
    async fn test_verify_returns_id() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/verifications")
            .match_header("x-hq-client", "Android/1.6.2")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("method".into(), "sms".into()),
                Matcher::UrlEncoded("phone".into(), "+15555550100".into()),
            ]))
            .with_status(200)
            .with_body(json!({ "verificationId": "v-123", "expires": "later" }).to_string())
            .create_async()
            .await;

        let id = account(&server).verify("+15555550100").await.unwrap();
        assert_eq!(id, "v-123");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_verify_invalid_phone() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/verifications")
            .with_status(400)
            .with_body(json!({ "error": "Invalid phone number" }).to_string())
            .create_async()
            .await;

        let result = account(&server).verify("123").await;
        assert!(matches!(result, Err(HqError::InvalidPhoneNumber)));
    }

    #[tokio::test]
    async fn test_submit_code() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/verifications/v-123")
            .match_body(Matcher::UrlEncoded("code".into(), "0000".into()))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;
        server
            .mock("POST", "/verifications/v-404")
            .with_status(404)
            .create_async()
            .await;

        let client = account(&server);
        assert!(client.submit_code("v-123", "0000").await.unwrap());
        assert!(!client.submit_code("v-404", "0000").await.unwrap());
    }

    #[tokio::test]
    async fn test_username_available() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/usernames/available")
            .match_body(Matcher::UrlEncoded("username".into(), "fresh".into()))
            .with_status(200)
            .with_body(json!({ "available": true }).to_string())
            .create_async()
            .await;
        server
            .mock("POST", "/usernames/available")
            .match_body(Matcher::UrlEncoded("username".into(), "taken".into()))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let client = account(&server);
        assert!(client.username_available("fresh").await.unwrap());
        assert!(!client.username_available("taken").await.unwrap());
    }

    #[tokio::test]
    async fn test_create_user() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/users")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("username".into(), "al".into()),
                Matcher::UrlEncoded("verificationId".into(), "v-123".into()),
                Matcher::UrlEncoded("referringUsername".into(), "".into()),
                Matcher::UrlEncoded("country".into(), "US".into()),
                Matcher::UrlEncoded("language".into(), "en".into()),
            ]))
            .with_status(200)
            .with_body(json!({ "userId": 5, "authToken": "login-abc" }).to_string())
            .create_async()
            .await;

        let created = account(&server)
            .create_user("al", "v-123", "", "US")
            .await
            .unwrap();
        assert_eq!(created.get("auth_token"), Some(&json!("login-abc")));
        mock.assert_async().await;
    }
}
