//! User mapping rules and the write operations handed to persistence

use serde::{Deserialize, Serialize};

use crate::transaction::Transaction;

/// Id prefix of transactions the user entered by hand rather than synced.
pub const MANUAL_ID_PREFIX: &str = "manual-";

/// Renames a transaction's channel when one of `match_strings` occurs in its body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingRule {
    /// Checked in order; empty strings never match
    pub match_strings: Vec<String>,
    pub mapping_name: String,
    pub account_type: String,
}

impl MappingRule {
    pub fn new(
        mapping_name: impl Into<String>,
        account_type: impl Into<String>,
        match_strings: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        let mut seen: Vec<String> = Vec::new();
        for s in match_strings {
            let s = s.into();
            if !seen.contains(&s) {
                seen.push(s);
            }
        }
        Self {
            match_strings: seen,
            mapping_name: mapping_name.into(),
            account_type: account_type.into(),
        }
    }

    /// Case-insensitive substring test against a message body.
    pub fn matches(&self, body: &str) -> bool {
        let body = body.to_lowercase();
        self.match_strings
            .iter()
            .map(|s| s.trim().to_lowercase())
            .any(|s| !s.is_empty() && body.contains(&s))
    }
}

/// A transaction as the persistence collaborator holds it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedTransaction {
    pub user_id: String,
    #[serde(flatten)]
    pub transaction: Transaction,
}

impl PersistedTransaction {
    pub fn is_manual(&self) -> bool {
        self.transaction.sms_id.starts_with(MANUAL_ID_PREFIX)
    }
}

/// One write against the transaction collection, keyed by `(user_id, sms_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum UpdateOp {
    /// Insert or replace the whole document
    Upsert {
        user_id: String,
        sms_id: String,
        set: Transaction,
    },
    /// `$set` of channel and account type after a rule matched
    SetMapping {
        user_id: String,
        sms_id: String,
        channel: String,
        account_type: String,
    },
    /// `$set` channel back to the default and `$unset` account type
    ResetMapping {
        user_id: String,
        sms_id: String,
        channel: String,
    },
}

impl UpdateOp {
    pub fn key(&self) -> (&str, &str) {
        match self {
            UpdateOp::Upsert { user_id, sms_id, .. }
            | UpdateOp::SetMapping { user_id, sms_id, .. }
            | UpdateOp::ResetMapping { user_id, sms_id, .. } => (user_id, sms_id),
        }
    }
}
