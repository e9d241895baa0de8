/// A message body in the two forms the stages need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedMessage {
    /// Trimmed, whitespace collapsed, original casing (what gets stored)
    pub body: String,
    /// Lowercase copy used for every match
    pub lower: String,
}

pub fn normalize(body: &str) -> NormalizedMessage {
    let body = body.split_whitespace().collect::<Vec<_>>().join(" ");
    let lower = body.to_lowercase();
    NormalizedMessage { body, lower }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_whitespace_and_keeps_case() {
        let n = normalize("  Rs. 500\n\tDebited   from A/c  XX12 ");
        assert_eq!(n.body, "Rs. 500 Debited from A/c XX12");
        assert_eq!(n.lower, "rs. 500 debited from a/c xx12");
    }

    #[test]
    fn test_blank_body() {
        assert_eq!(normalize(" \n ").body, "");
    }
}
