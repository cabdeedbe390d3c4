use serde::Serialize;

use crate::models::BroadcastId;

/// ライブソケットへ送信するコマンド
///
/// フィールド名はサーバーの表記（camelCase）のまま送る。受信側と違って正規化しない。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum SocketCommand {
    /// ブロードキャストの購読
    #[serde(rename = "subscribe")]
    Subscribe {
        #[serde(rename = "broadcastId")]
        broadcast_id: BroadcastId,
    },

    /// 回答の送信
    #[serde(rename = "answer")]
    Answer {
        #[serde(rename = "questionId")]
        question_id: u64,
        #[serde(rename = "broadcastId")]
        broadcast_id: BroadcastId,
        #[serde(rename = "answerId")]
        answer_id: u64,
    },

    /// エクストラライフの使用
    #[serde(rename = "useExtraLife")]
    UseExtraLife {
        #[serde(rename = "broadcastId")]
        broadcast_id: BroadcastId,
        #[serde(rename = "questionId")]
        question_id: u64,
    },
}

impl SocketCommand {
    /// 送信用のJSON文字列
    pub fn to_text(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_answer_message_shape() {
        let command = SocketCommand::Answer {
            question_id: 3,
            broadcast_id: BroadcastId::Text("bc-99".to_string()),
            answer_id: 1,
        };
        assert_eq!(
            serde_json::to_value(&command).unwrap(),
            json!({ "type": "answer", "questionId": 3, "broadcastId": "bc-99", "answerId": 1 })
        );
    }

    #[test]
    fn test_subscribe_message_shape() {
        let command = SocketCommand::Subscribe {
            broadcast_id: BroadcastId::Numeric(38210),
        };
        assert_eq!(
            command.to_text().unwrap(),
            r#"{"type":"subscribe","broadcastId":38210}"#
        );
    }

    #[test]
    fn test_extra_life_message_shape() {
        let command = SocketCommand::UseExtraLife {
            broadcast_id: BroadcastId::Numeric(38210),
            question_id: 7,
        };
        assert_eq!(
            serde_json::to_value(&command).unwrap(),
            json!({ "type": "useExtraLife", "broadcastId": 38210, "questionId": 7 })
        );
    }
}
