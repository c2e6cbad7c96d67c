//! # Domain Models
//!
//! Canonical types shared by the adapters, the query service and the cache.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ProtocolId`] | Validated registry key |
//! | [`DateKey`] | UTC calendar day (`YYYY-MM-DD`) |
//! | [`Window`] | Inclusive range of days |
//! | [`DaySequence`] | Lazy iterator over a day range |
//! | [`FeeRecord`] | Fee for one protocol on one day |
//! | [`SeriesPoint`] | Chart point with primary/secondary values |
//! | [`ProtocolMetadata`] | Display name, category and links |
//!
//! All constructors validate their invariants, so a `FeeRecord` never holds a
//! negative or non-finite fee and a `Window` never runs backwards.

mod date_key;
mod models;
mod protocol_id;
mod window;

pub use date_key::{DateKey, SECONDS_PER_DAY};
pub use models::{FeeRecord, ProtocolCategory, ProtocolMetadata, SeriesPoint};
pub(crate) use models::validate_non_negative;
pub use protocol_id::ProtocolId;
pub use window::{DaySequence, Window};
