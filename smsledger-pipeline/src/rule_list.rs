//! Ordered `(pattern, result)` tables with first-match-wins evaluation.
//!
//! Every classifier stage is one of these; priority is list order and nothing else.

use regex::{Captures, Regex};

use crate::error::PipelineError;

#[derive(Debug, Clone)]
pub struct RuleList<T> {
    rules: Vec<(Regex, T)>,
}

pub(crate) fn compile(pattern: &str) -> Result<Regex, PipelineError> {
    Regex::new(pattern).map_err(|source| PipelineError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// Whole-word, literal keyword pattern
pub(crate) fn keyword_pattern(keyword: &str) -> String {
    format!(r"\b{}\b", regex::escape(keyword.trim()))
}

impl<T> RuleList<T> {
    /// Compile `(regex, result)` pairs, keeping their order.
    pub fn compile<I, S>(entries: I) -> Result<Self, PipelineError>
    where
        I: IntoIterator<Item = (S, T)>,
        S: AsRef<str>,
    {
        let rules = entries
            .into_iter()
            .map(|(pattern, result)| Ok((compile(pattern.as_ref())?, result)))
            .collect::<Result<Vec<_>, PipelineError>>()?;
        Ok(Self { rules })
    }

    pub fn patterns(&self) -> impl Iterator<Item = &Regex> {
        self.rules.iter().map(|(re, _)| re)
    }

    /// Result of the first rule whose pattern matches anywhere in `text`.
    pub fn first_match(&self, text: &str) -> Option<&T> {
        self.rules
            .iter()
            .find(|(re, _)| re.is_match(text))
            .map(|(_, result)| result)
    }

    /// Like [`first_match`](Self::first_match), also returning the leftmost captures.
    pub fn first_captures<'t>(&self, text: &'t str) -> Option<(Captures<'t>, &T)> {
        self.rules
            .iter()
            .find_map(|(re, result)| re.captures(text).map(|caps| (caps, result)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_rule_wins() {
        let list = RuleList::compile([(r"\bdebited\b", "debit"), (r"\bcredited\b", "credit")]).unwrap();
        assert_eq!(list.first_match("cashback credited, 500 debited"), Some(&"debit"));
        assert_eq!(list.first_match("500 credited"), Some(&"credit"));
        assert_eq!(list.first_match("hello"), None);
    }

    #[test]
    fn test_captures() {
        let list = RuleList::compile([(r"rs (\d+)", 1u8)]).unwrap();
        let (caps, layer) = list.first_captures("paid rs 42 today").unwrap();
        assert_eq!(&caps[1], "42");
        assert_eq!(*layer, 1);
    }

    #[test]
    fn test_invalid_pattern_names_itself() {
        let err = RuleList::compile([("(unclosed", ())]).unwrap_err();
        assert!(err.to_string().contains("(unclosed"));
    }

    #[test]
    fn test_keyword_pattern_is_literal_and_whole_word() {
        let list = RuleList::compile([(keyword_pattern("a/c"), ()), (keyword_pattern("paid"), ())]).unwrap();
        assert!(list.first_match("debited from a/c 12").is_some());
        assert!(list.first_match("prepaid recharge").is_none());
        assert_eq!(list.patterns().count(), 2);
    }
}
