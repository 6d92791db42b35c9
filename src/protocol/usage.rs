//! Token usage reported by the agent.

use serde::{Deserialize, Serialize};

/// Token counts carried by a `complete` event.
///
/// The agent always reports a total; input/output splits are present only
/// when the upstream provider exposes them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Usage {
    /// Input tokens consumed, when the provider reports the split.
    #[serde(skip_serializing_if = "is_zero")]
    pub input_tokens: u64,
    /// Output tokens generated, when the provider reports the split.
    #[serde(skip_serializing_if = "is_zero")]
    pub output_tokens: u64,
    /// Total tokens for the call.
    pub total_tokens: u64,
}

fn is_zero(n: &u64) -> bool {
    *n == 0
}

impl Usage {
    /// Create a new empty Usage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total tokens, falling back to `input + output` when the agent did not
    /// report an explicit total.
    pub fn total(&self) -> u64 {
        if self.total_tokens > 0 {
            self.total_tokens
        } else {
            self.input_tokens + self.output_tokens
        }
    }

    /// Accumulate counts from another Usage instance.
    pub fn accumulate(&mut self, other: &Usage) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
        self.total_tokens += other.total_tokens;
    }
}

impl std::ops::AddAssign for Usage {
    fn add_assign(&mut self, other: Usage) {
        self.accumulate(&other);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_total_only() {
        let usage: Usage = serde_json::from_str(r#"{"totalTokens": 42}"#).unwrap();
        assert_eq!(usage.total_tokens, 42);
        assert_eq!(usage.input_tokens, 0);
        assert_eq!(usage.total(), 42);
    }

    #[test]
    fn parse_full_split() {
        let json = r#"{"inputTokens": 100, "outputTokens": 50, "totalTokens": 150}"#;
        let usage: Usage = serde_json::from_str(json).unwrap();
        assert_eq!(usage.input_tokens, 100);
        assert_eq!(usage.output_tokens, 50);
        assert_eq!(usage.total(), 150);
    }

    #[test]
    fn parse_empty_object() {
        let usage: Usage = serde_json::from_str("{}").unwrap();
        assert_eq!(usage.total(), 0);
    }

    #[test]
    fn total_falls_back_to_split_sum() {
        let usage = Usage {
            input_tokens: 10,
            output_tokens: 5,
            total_tokens: 0,
        };
        assert_eq!(usage.total(), 15);
    }

    #[test]
    fn accumulate_adds_counts() {
        let mut usage = Usage {
            input_tokens: 1,
            output_tokens: 2,
            total_tokens: 3,
        };
        usage += Usage {
            input_tokens: 10,
            output_tokens: 20,
            total_tokens: 30,
        };
        assert_eq!(usage.input_tokens, 11);
        assert_eq!(usage.output_tokens, 22);
        assert_eq!(usage.total_tokens, 33);
    }

    #[test]
    fn zero_splits_are_not_serialized() {
        let usage = Usage {
            total_tokens: 7,
            ..Default::default()
        };
        let json = serde_json::to_string(&usage).unwrap();
        assert!(json.contains("totalTokens"));
        assert!(!json.contains("inputTokens"));
    }
}
