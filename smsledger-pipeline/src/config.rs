//! Classifier tables as data.
//!
//! Everything the classifier matches on lives here and can be overridden from the
//! `[classifier]` table of the user's config file. Patterns run against the lowercase body.

use serde::{Deserialize, Serialize};

use crate::merge::DEFAULT_MERGE_WINDOW_MINUTES;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Substrings that mark a message as promotional
    pub denylist: Vec<String>,
    /// Checked before `credit_keywords`
    pub debit_keywords: Vec<String>,
    pub credit_keywords: Vec<String>,
    /// Checked last: a failure notice with no explicit credit is about a debit
    pub failure_debit_keywords: Vec<String>,
    /// Regex layers tried in order; group 1 captures the number
    pub amount_patterns: Vec<String>,
    pub upi_patterns: Vec<String>,
    pub card_patterns: Vec<String>,
    pub bank_patterns: Vec<String>,
    pub failure_pattern: String,
    pub merge_window_minutes: i64,
}

// Any fractional length is captured; more than two places is rejected at parse time
const NUMBER: &str = r"(\d[\d,]*(?:\.\d+)?)";

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            denylist: strings(&[
                "offer",
                "cashback",
                "statement",
                "dues",
                "reward",
                "congratulations",
                "discount",
            ]),
            debit_keywords: strings(&[
                "debited",
                "spent",
                "withdrawn",
                "paid",
                "sent",
                "deducted",
                "purchase",
                "payment of",
            ]),
            credit_keywords: strings(&[
                "credited",
                "received",
                "deposited",
                "added",
            ]),
            failure_debit_keywords: strings(&[
                "refunded",
                "reversed",
                "failed",
                "unsuccessful",
                "declined",
            ]),
            amount_patterns: vec![
                // Rs. 1,250.50 / INR 500 / ₹20
                format!(r"(?:\brs\.?|\binr|₹)\s*{NUMBER}"),
                // 1,250.50 Rs / 500 INR
                format!(r"\b{NUMBER}\s*(?:rs\b|inr\b|₹|rupees\b)"),
                format!(
                    r"\b(?:debited by|debited with|credited with|credited by|payment of|spent at|spent|withdrawn)\s*(?:rs\.?|inr|₹)?\s*{NUMBER}"
                ),
            ],
            upi_patterns: strings(&[
                r"\bupi\b",
                r"\b(?:gpay|google pay|phonepe|paytm|bhim)\b",
                r"\b[\w.\-]+@[a-z]{2,}(?:\.?\s|\.?$|[,;)])",
            ]),
            card_patterns: strings(&[
                r"\b(?:credit|debit)\s+card\b",
                r"\bcard\s*(?:no\.?\s*)?(?:ending\s*(?:with|in)?\s*)?[x*]+\d{4}\b",
                r"\bcard\s+ending\s*(?:with|in)?\s*\d{4}\b",
            ]),
            bank_patterns: strings(&[
                r"\ba/c\s*(?:no\.?\s*)?[x*]*\d+",
                r"\bacct?\s*(?:no\.?\s*)?[x*]+\d+",
                r"\baccount\s+(?:number|no\b)",
                r"\b(?:neft|imps|rtgs)\b",
            ]),
            failure_pattern: r"\b(?:failed|reversed|refund(?:ed)?|unsuccessful|declined)\b".to_string(),
            merge_window_minutes: DEFAULT_MERGE_WINDOW_MINUTES,
        }
    }
}
