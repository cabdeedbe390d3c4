use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use super::payload::{
    opt_amount, opt_bool, opt_datetime, opt_i64, opt_string, opt_u64, required_map, FromPayload,
    Payload,
};
use crate::errors::HqError;

/// 残高情報
///
/// 金額は通貨表記の文字列のまま保持する（`"$1,234.50"` など）。
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BalanceRecord {
    pub prize_total: Option<String>,
    pub paid: Option<String>,
    pub pending: Option<String>,
    pub unpaid: Option<String>,
    pub available: Option<String>,
    pub frozen: Option<String>,
    pub eligible_for_payout: Option<bool>,
    pub has_pending: Option<bool>,
    pub document_required: Option<bool>,
    pub document_status: Option<String>,
}

impl FromPayload for BalanceRecord {
    fn from_payload(payload: &Payload) -> Result<Self, HqError> {
        Ok(Self {
            prize_total: opt_amount(payload, "prize_total"),
            paid: opt_amount(payload, "paid"),
            pending: opt_amount(payload, "pending"),
            unpaid: opt_amount(payload, "unpaid"),
            available: opt_amount(payload, "available"),
            frozen: opt_amount(payload, "frozen"),
            eligible_for_payout: opt_bool(payload, "eligible_for_payout"),
            has_pending: opt_bool(payload, "has_pending"),
            document_required: opt_bool(payload, "document_required"),
            document_status: opt_string(payload, "document_status"),
        })
    }
}

/// 出金トランザクションのメタデータ
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PayoutMetadata {
    pub client: Option<String>,
    pub payouts_connected: Option<bool>,
}

impl FromPayload for PayoutMetadata {
    fn from_payload(payload: &Payload) -> Result<Self, HqError> {
        Ok(Self {
            client: opt_string(payload, "client"),
            payouts_connected: opt_bool(payload, "payouts_connected"),
        })
    }
}

/// 出金トランザクション1件
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayoutRecord {
    pub payout_id: Option<u64>,
    pub user_id: Option<u64>,
    pub amount: Option<String>,
    pub currency: Option<String>,
    pub target_user_id: Option<String>,
    pub target_email: Option<String>,
    pub target_phone: Option<String>,
    pub status: Option<i64>,
    pub metadata: PayoutMetadata,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
}

impl FromPayload for PayoutRecord {
    fn from_payload(payload: &Payload) -> Result<Self, HqError> {
        // サーバーは常にmetadataを返す前提。欠けている場合は既定値で埋めずに失敗させる
        let metadata = PayoutMetadata::from_payload(required_map(payload, "metadata", "payout")?)?;

        Ok(Self {
            payout_id: opt_u64(payload, "payout_id"),
            user_id: opt_u64(payload, "user_id"),
            amount: opt_amount(payload, "amount"),
            currency: opt_string(payload, "currency"),
            target_user_id: opt_string(payload, "target_user_id"),
            target_email: opt_string(payload, "target_email"),
            target_phone: opt_string(payload, "target_phone"),
            status: opt_i64(payload, "status"),
            metadata,
            created: opt_datetime(payload, "created"),
            modified: opt_datetime(payload, "modified"),
        })
    }
}

/// 残高と出金履歴（サーバーの返却順を維持）
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PayoutInfo {
    pub balance: BalanceRecord,
    pub payouts: Vec<PayoutRecord>,
}

impl FromPayload for PayoutInfo {
    fn from_payload(payload: &Payload) -> Result<Self, HqError> {
        let balance = match payload.get("balance").and_then(Value::as_object) {
            Some(balance) => BalanceRecord::from_payload(balance)?,
            None => BalanceRecord::default(),
        };

        let payouts = match payload.get("payouts").and_then(Value::as_array) {
            Some(items) => items
                .iter()
                .map(|item| {
                    item.as_object()
                        .ok_or_else(|| {
                            HqError::MalformedResponse("payout entry is not an object".to_string())
                        })
                        .and_then(PayoutRecord::from_payload)
                })
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };

        Ok(Self { balance, payouts })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::payload::into_payload;
    use serde_json::json;

    fn payout(id: u64) -> Value {
        json!({
            "payoutId": id,
            "userId": 5,
            "amount": "$25.00",
            "currency": "USD",
            "targetEmail": "al@example.com",
            "status": 3,
            "metadata": { "client": "Android/1.6.2", "payoutsConnected": true },
            "created": "2018-02-01T10:00:00.000Z",
            "modified": "2018-02-02T10:00:00.000Z"
        })
    }

    fn build(value: Value) -> Result<PayoutInfo, HqError> {
        PayoutInfo::from_payload(&into_payload(value).unwrap())
    }

    fn build_record<T: FromPayload>(value: Value) -> Result<T, HqError> {
        T::from_payload(&into_payload(value).unwrap())
    }

    fn full_balance() -> Value {
        json!({
            "prizeTotal": "$1,025.00",
            "paid": "$1,000.00",
            "pending": "$0",
            "unpaid": "$25.00",
            "available": "$25.00",
            "frozen": "$0",
            "eligibleForPayout": true,
            "hasPending": false,
            "documentRequired": false,
            "documentStatus": "none"
        })
    }

    fn full_payout() -> Value {
        let mut entry = payout(1);
        let obj = entry.as_object_mut().unwrap();
        obj.insert("targetUserId".into(), json!("paypal-77"));
        obj.insert("targetPhone".into(), json!("+15555550100"));
        entry
    }

    fn without(value: &Value, key: &str) -> Value {
        let mut partial = value.clone();
        partial.as_object_mut().unwrap().remove(key);
        partial
    }

    fn clear_balance_field(balance: &mut BalanceRecord, key: &str) {
        match key {
            "prizeTotal" => balance.prize_total = None,
            "paid" => balance.paid = None,
            "pending" => balance.pending = None,
            "unpaid" => balance.unpaid = None,
            "available" => balance.available = None,
            "frozen" => balance.frozen = None,
            "eligibleForPayout" => balance.eligible_for_payout = None,
            "hasPending" => balance.has_pending = None,
            "documentRequired" => balance.document_required = None,
            "documentStatus" => balance.document_status = None,
            other => panic!("unexpected balance key {}", other),
        }
    }

    fn clear_payout_field(record: &mut PayoutRecord, key: &str) {
        match key {
            "payoutId" => record.payout_id = None,
            "userId" => record.user_id = None,
            "amount" => record.amount = None,
            "currency" => record.currency = None,
            "targetUserId" => record.target_user_id = None,
            "targetEmail" => record.target_email = None,
            "targetPhone" => record.target_phone = None,
            "status" => record.status = None,
            "created" => record.created = None,
            "modified" => record.modified = None,
            other => panic!("unexpected payout key {}", other),
        }
    }

    #[test]
    fn test_payout_info_full() {
        let info = build(json!({
            "balance": {
                "prizeTotal": "$1,025.00",
                "paid": "$1,000.00",
                "pending": "$0",
                "unpaid": "$25.00",
                "eligibleForPayout": true,
                "hasPending": false,
                "documentRequired": false,
                "documentStatus": "none"
            },
            "payouts": [payout(2), payout(1)]
        }))
        .unwrap();

        // 通貨表記はそのまま
        assert_eq!(info.balance.prize_total.as_deref(), Some("$1,025.00"));
        assert_eq!(info.balance.eligible_for_payout, Some(true));
        assert_eq!(info.balance.available, None);

        // サーバーの返却順
        let ids: Vec<_> = info.payouts.iter().map(|p| p.payout_id).collect();
        assert_eq!(ids, vec![Some(2), Some(1)]);

        let first = &info.payouts[0];
        assert_eq!(first.amount.as_deref(), Some("$25.00"));
        assert_eq!(first.status, Some(3));
        assert_eq!(first.metadata.client.as_deref(), Some("Android/1.6.2"));
        assert_eq!(first.metadata.payouts_connected, Some(true));
        assert!(first.created.unwrap() < first.modified.unwrap());
    }

    #[test]
    fn test_payout_missing_metadata_fails() {
        let mut entry = payout(1);
        entry.as_object_mut().unwrap().remove("metadata");

        let result = build(json!({ "balance": {}, "payouts": [entry] }));
        assert!(matches!(result, Err(HqError::MalformedResponse(_))));
    }

    #[test]
    fn test_payout_empty_metadata_is_fine() {
        let mut entry = payout(1);
        entry
            .as_object_mut()
            .unwrap()
            .insert("metadata".into(), json!({}));

        let info = build(json!({ "payouts": [entry] })).unwrap();
        assert_eq!(info.payouts[0].metadata, PayoutMetadata::default());
    }

    #[test]
    fn test_payout_info_empty() {
        let info = build(json!({})).unwrap();
        assert_eq!(info, PayoutInfo::default());
    }

    #[test]
    fn test_each_balance_field_is_optional() {
        let full_payload = full_balance();
        let full: BalanceRecord = build_record(full_payload.clone()).unwrap();
        assert!(full.prize_total.is_some());
        assert!(full.paid.is_some());
        assert!(full.pending.is_some());
        assert!(full.unpaid.is_some());
        assert!(full.available.is_some());
        assert!(full.frozen.is_some());
        assert!(full.eligible_for_payout.is_some());
        assert!(full.has_pending.is_some());
        assert!(full.document_required.is_some());
        assert!(full.document_status.is_some());

        for key in full_payload.as_object().unwrap().keys() {
            let balance: BalanceRecord = build_record(without(&full_payload, key)).unwrap();

            let mut expected = full.clone();
            clear_balance_field(&mut expected, key);
            assert_eq!(balance, expected, "key {}", key);
        }
    }

    #[test]
    fn test_each_payout_field_is_optional() {
        let full_payload = full_payout();
        let full: PayoutRecord = build_record(full_payload.clone()).unwrap();
        assert!(full.payout_id.is_some());
        assert!(full.user_id.is_some());
        assert!(full.amount.is_some());
        assert!(full.currency.is_some());
        assert!(full.target_user_id.is_some());
        assert!(full.target_email.is_some());
        assert!(full.target_phone.is_some());
        assert!(full.status.is_some());
        assert!(full.created.is_some());
        assert!(full.modified.is_some());

        // metadataは必須なので対象外
        for key in full_payload.as_object().unwrap().keys() {
            if key == "metadata" {
                continue;
            }
            let record: PayoutRecord = build_record(without(&full_payload, key)).unwrap();

            let mut expected = full.clone();
            clear_payout_field(&mut expected, key);
            assert_eq!(record, expected, "key {}", key);
        }
    }

    #[test]
    fn test_balance_numeric_amounts() {
        let balance: BalanceRecord =
            build_record(json!({ "prizeTotal": 1025, "unpaid": "$25.00" })).unwrap();
        assert_eq!(balance.prize_total.as_deref(), Some("1025"));
        assert_eq!(balance.unpaid.as_deref(), Some("$25.00"));
    }
}
