use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::errors::HqError;
use crate::messages::SocketCommand;

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// ライブソケットから届くイベント
#[derive(Debug, Clone, PartialEq)]
pub enum SocketEvent {
    /// テキストフレーム（JSONのまま渡す）
    Message(String),
    /// 受信エラー（この後に `Closed` が続く）
    Error(String),
    /// 接続終了
    Closed,
}

/// ライブ番組のWebSocket接続
///
/// 送信側はこの構造体が保持し、受信側はバックグラウンドタスクが
/// `SocketEvent` としてチャネルへ流す。
pub struct LiveSocket {
    sink: Mutex<WsSink>,
    reader: JoinHandle<()>,
}

impl LiveSocket {
    /// ソケットに接続
    ///
    /// # 引数
    /// - `url`: `ws://` または `wss://` のURL
    /// - `bearer`: アップグレード要求に付与するアクセストークン
    pub async fn open(
        url: &str,
        bearer: Option<&str>,
    ) -> Result<(Self, mpsc::UnboundedReceiver<SocketEvent>), HqError> {
        let mut request = url.into_client_request()?;
        if let Some(token) = bearer {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| HqError::InvalidHeader(e.to_string()))?;
            request.headers_mut().insert("authorization", value);
        }

        let (ws_stream, _) = connect_async(request).await?;
        log::info!("Live socket connected: {}", url);

        let (sink, mut stream) = ws_stream.split();
        let (tx, rx) = mpsc::unbounded_channel::<SocketEvent>();

        // 受信タスク: フレームをイベントとしてチャネルへ転送
        let reader = tokio::spawn(async move {
            while let Some(result) = stream.next().await {
                match result {
                    Ok(Message::Text(text)) => {
                        if tx.send(SocketEvent::Message(text)).is_err() {
                            log::debug!("Live socket receiver dropped");
                            break;
                        }
                    }
                    Ok(Message::Close(_)) => {
                        log::info!("Live socket received close frame");
                        break;
                    }
                    Ok(msg) => {
                        log::debug!("Ignoring live socket frame: {:?}", msg);
                    }
                    Err(e) => {
                        log::warn!("Live socket error: {}", e);
                        let _ = tx.send(SocketEvent::Error(e.to_string()));
                        break;
                    }
                }
            }
            let _ = tx.send(SocketEvent::Closed);
        });

        Ok((
            Self {
                sink: Mutex::new(sink),
                reader,
            },
            rx,
        ))
    }

    /// テキストフレームを送信
    pub async fn send_text(&self, text: String) -> Result<(), HqError> {
        log::debug!("Live socket send: {}", text);
        let mut sink = self.sink.lock().await;
        sink.send(Message::Text(text)).await?;
        Ok(())
    }

    /// コマンドをJSONにして送信
    pub async fn send_command(&self, command: &SocketCommand) -> Result<(), HqError> {
        self.send_text(command.to_text()?).await
    }

    /// クローズフレームを送って接続を閉じる
    pub async fn close(&self) -> Result<(), HqError> {
        let mut sink = self.sink.lock().await;
        sink.close().await?;
        log::info!("Live socket closed");
        Ok(())
    }
}

impl Drop for LiveSocket {
    fn drop(&mut self) {
        self.reader.abort();
    }
}
