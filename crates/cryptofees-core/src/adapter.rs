//! Adapter contract and adapter-level errors.
//!
//! Every protocol is served by one [`FeeAdapter`]: a single async query that
//! turns an attribute name and a UTC day into a USD figure. Only the `"fee"`
//! attribute exists today; anything else is rejected before any upstream
//! call is made.
//!
//! # Example
//!
//! ```rust,ignore
//! use cryptofees_core::{DateKey, FeeAdapter, FEE_ATTRIBUTE};
//!
//! async fn yesterday(adapter: &dyn FeeAdapter) -> Result<f64, cryptofees_core::SourceError> {
//!     let day = DateKey::today().previous().expect("calendar range");
//!     adapter.query(FEE_ATTRIBUTE, day).await
//! }
//! ```

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use crate::DateKey;

/// The only attribute adapters currently serve.
pub const FEE_ATTRIBUTE: &str = "fee";

/// Adapter-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    UnsupportedAttribute,
    UpstreamFetch,
    InvalidResponse,
    Internal,
}

/// Structured error returned by adapters and upstream clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
    retryable: bool,
}

impl SourceError {
    pub fn unsupported_attribute(attribute: &str) -> Self {
        Self {
            kind: SourceErrorKind::UnsupportedAttribute,
            message: format!("attribute '{attribute}' is not supported, expected '{FEE_ATTRIBUTE}'"),
            retryable: false,
        }
    }

    pub fn upstream_fetch(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::UpstreamFetch,
            message: message.into(),
            retryable: true,
        }
    }

    /// Upstream failure that will not go away on retry (4xx, malformed request).
    pub fn upstream_rejected(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::UpstreamFetch,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::InvalidResponse,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Internal,
            message: message.into(),
            retryable: false,
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::UnsupportedAttribute => "source.unsupported_attribute",
            SourceErrorKind::UpstreamFetch => "source.upstream_fetch",
            SourceErrorKind::InvalidResponse => "source.invalid_response",
            SourceErrorKind::Internal => "source.internal",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

/// Boxed future returned by [`FeeAdapter::query`].
pub type QueryFuture<'a> = Pin<Box<dyn Future<Output = Result<f64, SourceError>> + Send + 'a>>;

/// Per-protocol fee source.
///
/// Implementations translate whatever their upstream returns (daily volume,
/// cumulative counters, metrics API rows) into one non-negative USD value
/// for the requested day.
///
/// # Errors
///
/// - [`SourceErrorKind::UnsupportedAttribute`] for any attribute other than
///   [`FEE_ATTRIBUTE`], returned without touching the network
/// - [`SourceErrorKind::UpstreamFetch`] when the upstream call fails
/// - [`SourceErrorKind::InvalidResponse`] when the payload cannot be turned
///   into a fee
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; the registry shares them behind `Arc`.
pub trait FeeAdapter: Send + Sync {
    fn query<'a>(&'a self, attribute: &'a str, date: DateKey) -> QueryFuture<'a>;
}

/// Reject every attribute except `"fee"`.
pub fn require_fee_attribute(attribute: &str) -> Result<(), SourceError> {
    if attribute == FEE_ATTRIBUTE {
        Ok(())
    } else {
        Err(SourceError::unsupported_attribute(attribute))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_fee_attribute_is_accepted() {
        assert!(require_fee_attribute("fee").is_ok());

        let error = require_fee_attribute("volume").expect_err("volume is unsupported");
        assert_eq!(error.kind(), SourceErrorKind::UnsupportedAttribute);
        assert_eq!(error.code(), "source.unsupported_attribute");
        assert!(!error.retryable());
        assert!(error.message().contains("volume"));
    }

    #[test]
    fn upstream_errors_carry_retryability() {
        assert!(SourceError::upstream_fetch("timeout").retryable());
        let rejected = SourceError::upstream_rejected("status 400");
        assert_eq!(rejected.kind(), SourceErrorKind::UpstreamFetch);
        assert!(!rejected.retryable());
    }
}
