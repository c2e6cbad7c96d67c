use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

const MAX_PROTOCOL_ID_LEN: usize = 64;

/// Registry key for a protocol, normalized to lowercase (`uniswap-v2`, `ethereum`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProtocolId(String);

impl ProtocolId {
    /// Parse and normalize a protocol id to lowercase.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyProtocolId);
        }

        let normalized = trimmed.to_ascii_lowercase();
        let len = normalized.chars().count();
        if len > MAX_PROTOCOL_ID_LEN {
            return Err(ValidationError::ProtocolIdTooLong {
                len,
                max: MAX_PROTOCOL_ID_LEN,
            });
        }

        if let Some(first) = normalized.chars().next() {
            if !first.is_ascii_alphanumeric() {
                return Err(ValidationError::ProtocolIdInvalidStart { ch: first });
            }
        }

        for (index, ch) in normalized.chars().enumerate() {
            let valid = ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-' || ch == '_';
            if !valid {
                return Err(ValidationError::ProtocolIdInvalidChar { ch, index });
            }
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ProtocolId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProtocolId {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl TryFrom<String> for ProtocolId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl TryFrom<&str> for ProtocolId {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<ProtocolId> for String {
    fn from(value: ProtocolId) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_normalizes_protocol_id() {
        let parsed = ProtocolId::parse(" Uniswap-V2 ").expect("id should parse");
        assert_eq!(parsed.as_str(), "uniswap-v2");
    }

    #[test]
    fn rejects_invalid_start() {
        let err = ProtocolId::parse("-uniswap").expect_err("must fail");
        assert!(matches!(err, ValidationError::ProtocolIdInvalidStart { ch: '-' }));
    }

    #[test]
    fn rejects_invalid_chars() {
        let err = ProtocolId::parse("uni swap").expect_err("must fail");
        assert!(matches!(
            err,
            ValidationError::ProtocolIdInvalidChar { ch: ' ', index: 3 }
        ));
    }

    #[test]
    fn deserializes_through_validation() {
        let parsed: ProtocolId = serde_json::from_str("\"Balancer\"").expect("valid json id");
        assert_eq!(parsed.as_str(), "balancer");
        assert!(serde_json::from_str::<ProtocolId>("\"\"").is_err());
    }
}
