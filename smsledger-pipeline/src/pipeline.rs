//! classify -> merge -> apply_mapping, and the upserts that persist the result.

use smsledger_core::{MappingRule, RawMessage, Transaction, UpdateOp};

use crate::classifier::{classify, Classifier};
use crate::mapping::apply_mapping;
use crate::merge::merge_within;

/// Output of one sync run.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncBatch {
    pub transactions: Vec<Transaction>,
    /// Messages read from the source
    pub total_messages: usize,
    /// Messages that classified as transactions
    pub classified: usize,
    /// Classified messages folded into an earlier duplicate
    pub merged_away: usize,
}

pub struct Pipeline {
    classifier: Classifier,
}

impl Pipeline {
    pub fn new(classifier: Classifier) -> Self {
        Self { classifier }
    }

    pub fn run(&self, messages: &[RawMessage], source: &str, rules: &[MappingRule]) -> SyncBatch {
        let extracted = classify(&self.classifier, messages, source);
        let classified = extracted.len();
        let merged = merge_within(extracted, self.classifier.merge_window());
        let merged_away = classified - merged.len();
        let transactions = apply_mapping(merged, rules);

        tracing::info!(
            source,
            total = messages.len(),
            classified,
            merged_away,
            kept = transactions.len(),
            "pipeline run complete"
        );

        SyncBatch {
            transactions,
            total_messages: messages.len(),
            classified,
            merged_away,
        }
    }
}

/// One upsert per transaction, keyed by `(user_id, sms_id)`.
pub fn upserts(user_id: &str, txns: &[Transaction]) -> Vec<UpdateOp> {
    txns.iter()
        .map(|t| UpdateOp::Upsert {
            user_id: user_id.to_string(),
            sms_id: t.sms_id.clone(),
            set: t.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_counts() {
        let pipeline = Pipeline::new(Classifier::builtin().unwrap());
        let msgs = vec![
            RawMessage::new("Rs 250 debited from A/c XX11", "1700000000000"),
            RawMessage::new("Sent Rs 250 from A/c XX11 to cafe@okicici via UPI", "1700000030000"),
            RawMessage::new("Flat 20% discount on shoes", "1700000040000"),
        ];
        let rules = vec![MappingRule::new("Axis Salary", "savings", ["xx11"])];

        let batch = pipeline.run(&msgs, "Me", &rules);
        assert_eq!(batch.total_messages, 3);
        assert_eq!(batch.classified, 2);
        assert_eq!(batch.merged_away, 1);
        assert_eq!(batch.transactions.len(), 1);

        let t = &batch.transactions[0];
        assert_eq!(t.sms_id, "1700000000000");
        assert!(t.body.starts_with("Sent Rs 250"));
        assert_eq!(t.channel, "Axis Salary");
    }

    #[test]
    fn test_upserts_keyed_by_sms_id() {
        let pipeline = Pipeline::new(Classifier::builtin().unwrap());
        let batch = pipeline.run(&[RawMessage::new("Rs 9 credited to A/c XX1", "42")], "Me", &[]);
        let ops = upserts("u1", &batch.transactions);
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].key(), ("u1", "42"));
    }
}
