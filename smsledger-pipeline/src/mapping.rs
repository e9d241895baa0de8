//! Stage 8: user source-mapping rules, at sync time and as a batch remap.

use smsledger_core::{Channel, MappingRule, PersistedTransaction, Transaction, UpdateOp};

/// First rule (in caller order) with a match string contained in `body`.
pub fn resolve<'a>(body: &str, rules: &'a [MappingRule]) -> Option<&'a MappingRule> {
    rules.iter().find(|rule| rule.matches(body))
}

/// Rename channels of freshly merged transactions. `source` is never touched.
pub fn apply_mapping(mut txns: Vec<Transaction>, rules: &[MappingRule]) -> Vec<Transaction> {
    for txn in &mut txns {
        if let Some(rule) = resolve(&txn.body, rules) {
            txn.channel = rule.mapping_name.clone();
            txn.account_type = Some(rule.account_type.clone());
        }
    }
    txns
}

/// Plan the writes that bring stored transactions in line with `rules`.
///
/// - a matching rule sets channel and account type;
/// - a transaction that carries an account type but no longer matches anything
///   goes back to the default channel with the account type removed;
/// - manual entries are only ever touched by a matching rule.
///
/// Transactions already in the target state produce no op, so running this
/// twice with the same rules yields nothing the second time.
pub fn remap(all: &[PersistedTransaction], rules: &[MappingRule]) -> Vec<UpdateOp> {
    let default_channel = Channel::Other.label();
    let mut ops = Vec::new();

    for stored in all {
        let txn = &stored.transaction;
        match resolve(&txn.body, rules) {
            Some(rule) => {
                if txn.channel == rule.mapping_name
                    && txn.account_type.as_deref() == Some(rule.account_type.as_str())
                {
                    continue;
                }
                ops.push(UpdateOp::SetMapping {
                    user_id: stored.user_id.clone(),
                    sms_id: txn.sms_id.clone(),
                    channel: rule.mapping_name.clone(),
                    account_type: rule.account_type.clone(),
                });
            }
            None => {
                if stored.is_manual() || txn.account_type.is_none() {
                    continue;
                }
                ops.push(UpdateOp::ResetMapping {
                    user_id: stored.user_id.clone(),
                    sms_id: txn.sms_id.clone(),
                    channel: default_channel.to_string(),
                });
            }
        }
    }

    tracing::info!(transactions = all.len(), ops = ops.len(), "remap planned");
    ops
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;
    use smsledger_core::{Direction, Status};

    fn txn(sms_id: &str, body: &str, channel: &str, account_type: Option<&str>) -> Transaction {
        Transaction {
            sms_id: sms_id.to_string(),
            date: Utc.timestamp_millis_opt(1_700_000_000_000).unwrap(),
            body: body.to_string(),
            amount: Decimal::new(100, 0),
            direction: Direction::Debit,
            channel: channel.to_string(),
            source: "Mom".to_string(),
            status: Status::Success,
            account_type: account_type.map(str::to_string),
        }
    }

    fn stored(t: Transaction) -> PersistedTransaction {
        PersistedTransaction {
            user_id: "u1".to_string(),
            transaction: t,
        }
    }

    #[test]
    fn test_first_rule_wins() {
        let rules = vec![
            MappingRule::new("HDFC Card", "credit", ["hdfc"]),
            MappingRule::new("Any XX810", "debit", ["xx810"]),
        ];
        let out = apply_mapping(vec![txn("1", "HDFC card XX810 spent Rs 5", "Card", None)], &rules);
        assert_eq!(out[0].channel, "HDFC Card");
        assert_eq!(out[0].account_type.as_deref(), Some("credit"));
        assert_eq!(out[0].source, "Mom");
    }

    #[test]
    fn test_no_match_keeps_classifier_channel() {
        let rules = vec![MappingRule::new("Wallet", "wallet", ["paytm"])];
        let out = apply_mapping(vec![txn("1", "Rs 5 debited via UPI", "UPI", None)], &rules);
        assert_eq!(out[0].channel, "UPI");
        assert!(out[0].account_type.is_none());
    }

    #[test]
    fn test_remap_sets_and_skips_up_to_date() {
        let rules = vec![MappingRule::new("SBI Savings", "savings", ["a/c xx99"])];
        let all = vec![
            stored(txn("1", "Rs 5 debited from A/c XX99", "Bank", None)),
            stored(txn("2", "Rs 6 debited from A/c XX99", "SBI Savings", Some("savings"))),
        ];
        let ops = remap(&all, &rules);
        assert_eq!(
            ops,
            vec![UpdateOp::SetMapping {
                user_id: "u1".to_string(),
                sms_id: "1".to_string(),
                channel: "SBI Savings".to_string(),
                account_type: "savings".to_string(),
            }]
        );
    }

    #[test]
    fn test_remap_resets_previously_mapped_only() {
        let all = vec![
            stored(txn("1", "Rs 5 debited from A/c XX99", "SBI Savings", Some("savings"))),
            stored(txn("2", "Rs 5 via UPI", "UPI", None)),
            stored(txn("manual-3", "Cash for groceries", "Cash", Some("cash"))),
        ];
        let ops = remap(&all, &[]);
        assert_eq!(
            ops,
            vec![UpdateOp::ResetMapping {
                user_id: "u1".to_string(),
                sms_id: "1".to_string(),
                channel: "Other".to_string(),
            }]
        );
    }

    #[test]
    fn test_remap_maps_matching_manual_entries() {
        let rules = vec![MappingRule::new("Cash", "cash", ["groceries"])];
        let all = vec![stored(txn("manual-3", "Cash for groceries", "Other", None))];
        let ops = remap(&all, &rules);
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].key(), ("u1", "manual-3"));
    }
}
