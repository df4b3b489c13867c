//! Stat-name dispatch and rate derivation.
//!
//! The override and adjustment surfaces accept stat names as strings, so the
//! (position -> permitted stat set) and (stat -> cascade kind) tables are
//! encoded explicitly here rather than derived from the projection struct.

pub mod fields;
pub mod rates;

pub use fields::{permitted_stats, stat_kind, StatKind};
pub use rates::{check_identities, compute_shares, derive_rates, EPSILON};
