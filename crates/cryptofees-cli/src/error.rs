use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] cryptofees_core::ValidationError),

    #[error(transparent)]
    Core(#[from] cryptofees_core::CoreError),

    #[error(transparent)]
    Query(#[from] cryptofees_core::QueryError),

    #[error(transparent)]
    Cache(#[from] cryptofees_core::FeeCacheError),

    #[error("command error: {0}")]
    Command(String),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) | Self::Command(_) => 2,
            Self::Query(_) | Self::Cache(_) => 3,
            Self::Serialization(_) => 4,
            Self::Core(_) => 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cryptofees_core::{CoreError, FeeCacheError, ProtocolId, QueryError, RegistryError};

    #[test]
    fn exit_codes_separate_input_from_upstream_failures() {
        let unknown = QueryError::Registry(RegistryError::ProtocolNotFound {
            id: ProtocolId::parse("aave").expect("valid id"),
        });

        assert_eq!(CliError::Command(String::from("bad flag")).exit_code(), 2);
        assert_eq!(CliError::Query(unknown).exit_code(), 3);
        assert_eq!(CliError::Cache(FeeCacheError::Rejected).exit_code(), 3);
        assert_eq!(
            CliError::Core(CoreError::Registry(RegistryError::ProtocolNotFound {
                id: ProtocolId::parse("aave").expect("valid id"),
            }))
            .exit_code(),
            10
        );
    }
}
