//! Transaction types produced by the SMS pipeline

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One message element from a backup, exactly as the source delivered it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMessage {
    pub body: String,
    /// Epoch milliseconds, string-encoded
    pub timestamp_millis: String,
}

impl RawMessage {
    pub fn new(body: impl Into<String>, timestamp_millis: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            timestamp_millis: timestamp_millis.into(),
        }
    }

    /// Both fields must be present for the message to be considered at all.
    pub fn is_complete(&self) -> bool {
        !self.body.trim().is_empty() && !self.timestamp_millis.trim().is_empty()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Direction {
    #[serde(rename = "credit")]
    Credit,
    #[serde(rename = "debit")]
    Debit,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Credit => "credit",
            Direction::Debit => "debit",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Status {
    #[serde(rename = "success")]
    Success,
    #[serde(rename = "failed")]
    Failed,
}

/// Payment rail detected by the channel classifier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Channel {
    #[serde(rename = "UPI")]
    Upi,
    Card,
    Bank,
    Other,
}

impl Channel {
    /// Label stored in `Transaction::channel`
    pub fn label(&self) -> &'static str {
        match self {
            Channel::Upi => "UPI",
            Channel::Card => "Card",
            Channel::Bank => "Bank",
            Channel::Other => "Other",
        }
    }
}

/// A classified transaction.
///
/// Used both for the per-message output of classification and for the
/// merged records handed to persistence; the merge stage is the only
/// place that rewrites one after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Timestamp of the earliest message behind this record
    pub sms_id: String,
    pub date: DateTime<Utc>,
    /// Whitespace-collapsed body, original casing
    pub body: String,
    /// Always strictly positive
    pub amount: Decimal,
    pub direction: Direction,
    /// Classifier label or a user mapping name
    pub channel: String,
    /// Profile partition label supplied by the caller
    pub source: String,
    pub status: Status,
    /// Set only when a mapping rule renamed the channel
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> Transaction {
        Transaction {
            sms_id: "1700000000000".to_string(),
            date: Utc.timestamp_millis_opt(1_700_000_000_000).unwrap(),
            body: "Rs 250 debited from A/c XX1234".to_string(),
            amount: Decimal::new(25000, 2),
            direction: Direction::Debit,
            channel: "Bank".to_string(),
            source: "Mom".to_string(),
            status: Status::Success,
            account_type: None,
        }
    }

    #[test]
    fn test_raw_message_completeness() {
        assert!(RawMessage::new("hello", "1").is_complete());
        assert!(!RawMessage::new("", "1").is_complete());
        assert!(!RawMessage::new("   ", "1").is_complete());
        assert!(!RawMessage::new("hello", "").is_complete());
    }

    #[test]
    fn test_serializes_as_document() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["smsId"], "1700000000000");
        assert_eq!(json["direction"], "debit");
        assert_eq!(json["status"], "success");
        assert_eq!(json["amount"], "250.00");
        assert!(json.get("accountType").is_none());
    }

    #[test]
    fn test_channel_labels() {
        assert_eq!(Channel::Upi.label(), "UPI");
        assert_eq!(Channel::Other.label(), "Other");
    }
}
