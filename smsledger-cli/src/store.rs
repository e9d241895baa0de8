//! JSON document store standing in for the persistence collaborator.
//!
//! Transactions are keyed by `(user_id, sms_id)` and written only through `UpdateOp`s.

use serde::{Deserialize, Serialize};
use smsledger_core::{MappingRule, PersistedTransaction, SyncError, UpdateOp};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredRule {
    pub id: String,
    pub user_id: String,
    #[serde(flatten)]
    pub rule: MappingRule,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteSummary {
    pub upserted: usize,
    pub modified: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    #[serde(default)]
    pub transactions: Vec<PersistedTransaction>,
    #[serde(default)]
    pub rules: Vec<StoredRule>,
    #[serde(default)]
    next_rule_id: u64,
}

fn persistence_err(path: &Path, err: impl std::fmt::Display) -> SyncError {
    SyncError::Persistence(format!("{}: {err}", path.display()))
}

impl Store {
    pub fn load(path: &Path) -> Result<Self, SyncError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let s = fs::read_to_string(path).map_err(|e| persistence_err(path, e))?;
        serde_json::from_str(&s).map_err(|e| persistence_err(path, e))
    }

    /// Write to a temp file, then rename over `path`.
    pub fn save(&self, path: &Path) -> Result<(), SyncError> {
        let json = serde_json::to_string_pretty(self).map_err(|e| persistence_err(path, e))?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| persistence_err(&tmp, e))?;
        fs::rename(&tmp, path).map_err(|e| persistence_err(path, e))
    }

    pub fn transactions_for(&self, user_id: &str) -> Vec<PersistedTransaction> {
        self.transactions
            .iter()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect()
    }

    /// Rules for a user in creation order, which is also their match priority.
    pub fn rules_for(&self, user_id: &str) -> Vec<MappingRule> {
        self.rules
            .iter()
            .filter(|r| r.user_id == user_id)
            .map(|r| r.rule.clone())
            .collect()
    }

    pub fn add_rule(&mut self, user_id: &str, rule: MappingRule) -> &StoredRule {
        self.next_rule_id += 1;
        self.rules.push(StoredRule {
            id: format!("rule-{}", self.next_rule_id),
            user_id: user_id.to_string(),
            rule,
        });
        &self.rules[self.rules.len() - 1]
    }

    pub fn rule(&self, user_id: &str, id: &str) -> Option<&StoredRule> {
        self.rules.iter().find(|r| r.user_id == user_id && r.id == id)
    }

    /// Replace a rule in place, keeping its id and priority.
    pub fn update_rule(&mut self, user_id: &str, id: &str, rule: MappingRule) -> bool {
        match self.rules.iter_mut().find(|r| r.user_id == user_id && r.id == id) {
            Some(stored) => {
                stored.rule = rule;
                true
            }
            None => false,
        }
    }

    /// Returns false when no rule with that id belongs to the user.
    pub fn delete_rule(&mut self, user_id: &str, id: &str) -> bool {
        let before = self.rules.len();
        self.rules.retain(|r| !(r.user_id == user_id && r.id == id));
        self.rules.len() != before
    }

    fn find_mut(&mut self, user_id: &str, sms_id: &str) -> Option<&mut PersistedTransaction> {
        self.transactions
            .iter_mut()
            .find(|p| p.user_id == user_id && p.transaction.sms_id == sms_id)
    }

    pub fn apply(&mut self, ops: &[UpdateOp]) -> WriteSummary {
        let mut summary = WriteSummary::default();

        for op in ops {
            let (user_id, sms_id) = op.key();
            match op {
                UpdateOp::Upsert { set, .. } => match self.find_mut(user_id, sms_id) {
                    Some(doc) => {
                        if doc.transaction != *set {
                            doc.transaction = set.clone();
                            summary.modified += 1;
                        }
                    }
                    None => {
                        self.transactions.push(PersistedTransaction {
                            user_id: user_id.to_string(),
                            transaction: set.clone(),
                        });
                        summary.upserted += 1;
                    }
                },
                UpdateOp::SetMapping {
                    channel,
                    account_type,
                    ..
                } => {
                    if let Some(doc) = self.find_mut(user_id, sms_id) {
                        let txn = &mut doc.transaction;
                        if txn.channel != *channel || txn.account_type.as_ref() != Some(account_type) {
                            txn.channel = channel.clone();
                            txn.account_type = Some(account_type.clone());
                            summary.modified += 1;
                        }
                    }
                }
                UpdateOp::ResetMapping { channel, .. } => {
                    if let Some(doc) = self.find_mut(user_id, sms_id) {
                        let txn = &mut doc.transaction;
                        if txn.channel != *channel || txn.account_type.is_some() {
                            txn.channel = channel.clone();
                            txn.account_type = None;
                            summary.modified += 1;
                        }
                    }
                }
            }
        }

        tracing::debug!(
            ops = ops.len(),
            upserted = summary.upserted,
            modified = summary.modified,
            "applied writes"
        );
        summary
    }
}
