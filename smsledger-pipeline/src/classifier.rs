//! Stages 2-6: noise filter, amount, direction, channel and status.
//!
//! A `Classifier` is compiled once from a [`ClassifierConfig`] and is immutable
//! afterwards, so one instance can serve any number of batches.

use chrono::Duration;
use regex::Regex;
use rust_decimal::Decimal;
use smsledger_core::time::millis_to_utc;
use smsledger_core::{Channel, Direction, RawMessage, Status, Transaction};
use std::str::FromStr;

use crate::config::ClassifierConfig;
use crate::error::PipelineError;
use crate::normalize::normalize;
use crate::rule_list::{compile, keyword_pattern, RuleList};

/// Why a message did not become a transaction. None of these are errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Body or timestamp missing
    Incomplete,
    BadTimestamp,
    Denylisted(String),
    NoAmount,
    NoDirection,
}

impl Rejection {
    pub fn reason(&self) -> &'static str {
        match self {
            Rejection::Incomplete => "incomplete",
            Rejection::BadTimestamp => "bad timestamp",
            Rejection::Denylisted(_) => "denylisted",
            Rejection::NoAmount => "no amount",
            Rejection::NoDirection => "no direction",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Classifier {
    denylist: Vec<String>,
    /// Value is the layer index, for logs
    amount: RuleList<usize>,
    direction: RuleList<Direction>,
    channel: RuleList<Channel>,
    failure: Regex,
    merge_window: Duration,
}

impl Classifier {
    pub fn from_config(cfg: &ClassifierConfig) -> Result<Self, PipelineError> {
        let amount = RuleList::compile(cfg.amount_patterns.iter().enumerate().map(|(i, p)| (p, i)))?;
        for (re, pattern) in amount.patterns().zip(&cfg.amount_patterns) {
            if re.captures_len() < 2 {
                return Err(PipelineError::MissingCapture(pattern.clone()));
            }
        }

        let direction = RuleList::compile(
            cfg.debit_keywords
                .iter()
                .map(|k| (keyword_pattern(k), Direction::Debit))
                .chain(cfg.credit_keywords.iter().map(|k| (keyword_pattern(k), Direction::Credit)))
                .chain(
                    cfg.failure_debit_keywords
                        .iter()
                        .map(|k| (keyword_pattern(k), Direction::Debit)),
                ),
        )?;

        let channel = RuleList::compile(
            cfg.upi_patterns
                .iter()
                .map(|p| (p.as_str(), Channel::Upi))
                .chain(cfg.card_patterns.iter().map(|p| (p.as_str(), Channel::Card)))
                .chain(cfg.bank_patterns.iter().map(|p| (p.as_str(), Channel::Bank))),
        )?;

        let merge_window = Duration::try_minutes(cfg.merge_window_minutes)
            .filter(|w| *w > Duration::zero())
            .ok_or(PipelineError::InvalidWindow(cfg.merge_window_minutes))?;

        Ok(Self {
            denylist: cfg
                .denylist
                .iter()
                .map(|t| t.trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
            amount,
            direction,
            channel,
            failure: compile(&cfg.failure_pattern)?,
            merge_window,
        })
    }

    /// Classifier with the built-in tables.
    pub fn builtin() -> Result<Self, PipelineError> {
        Self::from_config(&ClassifierConfig::default())
    }

    pub fn merge_window(&self) -> Duration {
        self.merge_window
    }

    /// First denylisted term contained in the lowercase body.
    pub fn noise_term(&self, lower: &str) -> Option<&str> {
        self.denylist
            .iter()
            .find(|term| lower.contains(term.as_str()))
            .map(|t| t.as_str())
    }

    /// First currency amount, trying each layer in order.
    ///
    /// Zero, more than two decimal places, or a number `Decimal` cannot hold all
    /// count as no amount.
    pub fn extract_amount(&self, lower: &str) -> Option<Decimal> {
        let (caps, layer) = self.amount.first_captures(lower)?;
        let raw = caps.get(1)?.as_str().replace(',', "");
        if raw.split_once('.').is_some_and(|(_, frac)| frac.len() > 2) {
            return None;
        }
        let amount = Decimal::from_str(&raw).ok()?;
        if amount <= Decimal::ZERO {
            return None;
        }
        tracing::trace!(layer, %amount, "amount matched");
        Some(amount)
    }

    pub fn direction(&self, lower: &str) -> Option<Direction> {
        self.direction.first_match(lower).copied()
    }

    pub fn channel(&self, lower: &str) -> Channel {
        self.channel.first_match(lower).copied().unwrap_or(Channel::Other)
    }

    pub fn status(&self, lower: &str) -> Status {
        if self.failure.is_match(lower) {
            Status::Failed
        } else {
            Status::Success
        }
    }

    /// Run one raw message through stages 1-6.
    pub fn classify_message(&self, msg: &RawMessage, source: &str) -> Result<Transaction, Rejection> {
        if !msg.is_complete() {
            return Err(Rejection::Incomplete);
        }
        let sms_id = msg.timestamp_millis.trim().to_string();
        let date = millis_to_utc(&sms_id).ok_or(Rejection::BadTimestamp)?;

        let norm = normalize(&msg.body);
        if let Some(term) = self.noise_term(&norm.lower) {
            return Err(Rejection::Denylisted(term.to_string()));
        }
        let amount = self.extract_amount(&norm.lower).ok_or(Rejection::NoAmount)?;
        let direction = self.direction(&norm.lower).ok_or(Rejection::NoDirection)?;

        Ok(Transaction {
            sms_id,
            date,
            amount,
            direction,
            channel: self.channel(&norm.lower).label().to_string(),
            source: source.to_string(),
            status: self.status(&norm.lower),
            account_type: None,
            body: norm.body,
        })
    }
}

/// Classify a batch. Messages that are not transactions are skipped silently.
pub fn classify(classifier: &Classifier, messages: &[RawMessage], source: &str) -> Vec<Transaction> {
    let mut out = Vec::new();
    for msg in messages {
        match classifier.classify_message(msg, source) {
            Ok(txn) => out.push(txn),
            Err(rejection) => {
                tracing::debug!(
                    sms_id = %msg.timestamp_millis,
                    reason = rejection.reason(),
                    "skipped message"
                );
            }
        }
    }
    out
}
