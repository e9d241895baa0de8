//! Stage 7: collapse near-simultaneous duplicate notifications.
//!
//! A bank and a payment app often report the same payment seconds apart. After a
//! timestamp sort, each surviving record anchors a forward scan over the window;
//! later records with the same amount and direction are folded into it.
//!
//! The test is amount + direction only. Two genuinely distinct payments of the
//! same amount inside one window are merged as well.

use chrono::Duration;
use smsledger_core::Transaction;

pub const DEFAULT_MERGE_WINDOW_MINUTES: i64 = 10;

fn is_duplicate(a: &Transaction, b: &Transaction) -> bool {
    a.amount == b.amount && a.direction == b.direction
}

/// Fold `other` into `rep` if its body is longer, keeping rep's id, date and source.
fn absorb(rep: &mut Transaction, other: &Transaction) {
    if other.body.chars().count() <= rep.body.chars().count() {
        return;
    }
    let Transaction {
        sms_id,
        date,
        source,
        ..
    } = std::mem::replace(rep, other.clone());
    rep.sms_id = sms_id;
    rep.date = date;
    rep.source = source;
}

/// Merge with the default ten-minute window.
pub fn merge(txns: Vec<Transaction>) -> Vec<Transaction> {
    merge_within(txns, Duration::minutes(DEFAULT_MERGE_WINDOW_MINUTES))
}

pub fn merge_within(mut txns: Vec<Transaction>, window: Duration) -> Vec<Transaction> {
    if txns.len() <= 1 {
        return txns;
    }

    // sms_id breaks timestamp ties so equal-time input orders merge identically
    txns.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.sms_id.cmp(&b.sms_id)));

    let mut discarded = vec![false; txns.len()];
    let mut out = Vec::with_capacity(txns.len());

    for i in 0..txns.len() {
        if discarded[i] {
            continue;
        }
        let anchor = &txns[i];
        let mut rep = anchor.clone();

        for j in (i + 1)..txns.len() {
            if txns[j].date - anchor.date > window {
                break;
            }
            if discarded[j] || !is_duplicate(anchor, &txns[j]) {
                continue;
            }
            discarded[j] = true;
            absorb(&mut rep, &txns[j]);
        }

        out.push(rep);
    }

    let merged_away = txns.len() - out.len();
    if merged_away > 0 {
        tracing::debug!(merged_away, kept = out.len(), "merged duplicate notifications");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;
    use smsledger_core::{Direction, Status};

    const T0: i64 = 1_700_000_000_000;

    fn txn(offset_secs: i64, amount: i64, direction: Direction, body: &str) -> Transaction {
        let ms = T0 + offset_secs * 1000;
        Transaction {
            sms_id: ms.to_string(),
            date: Utc.timestamp_millis_opt(ms).unwrap(),
            body: body.to_string(),
            amount: Decimal::new(amount, 0),
            direction,
            channel: "Other".to_string(),
            source: "Me".to_string(),
            status: Status::Success,
            account_type: None,
        }
    }

    #[test]
    fn test_empty_and_single() {
        assert!(merge(vec![]).is_empty());
        let one = vec![txn(0, 5, Direction::Debit, "x")];
        assert_eq!(merge(one.clone()), one);
    }

    #[test]
    fn test_three_minutes_apart_merge_keeping_longer_body_and_earlier_id() {
        let short = txn(0, 500, Direction::Debit, "Rs 500 debited");
        let mut long = txn(180, 500, Direction::Debit, "Rs 500 debited from A/c XX12 via UPI to shop@ybl");
        long.channel = "UPI".to_string();

        let out = merge(vec![long.clone(), short.clone()]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].sms_id, short.sms_id);
        assert_eq!(out[0].date, short.date);
        assert_eq!(out[0].body, long.body);
        assert_eq!(out[0].channel, "UPI");
    }

    #[test]
    fn test_fifteen_minutes_apart_stay_separate() {
        let out = merge(vec![
            txn(0, 500, Direction::Debit, "a"),
            txn(15 * 60, 500, Direction::Debit, "b"),
        ]);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_window_edge_is_inclusive() {
        let out = merge(vec![
            txn(0, 500, Direction::Debit, "a"),
            txn(10 * 60, 500, Direction::Debit, "b"),
        ]);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_direction_and_amount_must_match() {
        let out = merge(vec![
            txn(0, 500, Direction::Debit, "a"),
            txn(10, 500, Direction::Credit, "b"),
            txn(20, 501, Direction::Debit, "c"),
        ]);
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn test_anchor_absorbs_several_and_window_is_from_anchor() {
        let out = merge(vec![
            txn(0, 100, Direction::Debit, "aa"),
            txn(300, 100, Direction::Debit, "bbbb"),
            txn(590, 100, Direction::Debit, "ccc"),
            // 11 minutes after the anchor: starts its own group
            txn(660, 100, Direction::Debit, "dddddd"),
        ]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].sms_id, T0.to_string());
        assert_eq!(out[0].body, "bbbb");
        assert_eq!(out[1].body, "dddddd");
    }

    #[test]
    fn test_interleaved_non_duplicates_survive() {
        let out = merge(vec![
            txn(0, 100, Direction::Debit, "a"),
            txn(30, 250, Direction::Credit, "salary"),
            txn(60, 100, Direction::Debit, "a longer one"),
        ]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].body, "a longer one");
        assert_eq!(out[1].body, "salary");
    }

    #[test]
    fn test_custom_window() {
        let input = vec![
            txn(0, 100, Direction::Debit, "a"),
            txn(120, 100, Direction::Debit, "b"),
        ];
        assert_eq!(merge_within(input.clone(), Duration::minutes(1)).len(), 2);
        assert_eq!(merge_within(input, Duration::minutes(2)).len(), 1);
    }
}
