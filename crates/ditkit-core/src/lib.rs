//! # ditkit-core
//!
//! Core domain types for the ditkit directory database toolkit.
//!
//! This crate holds the value types shared by the storage layer and the
//! directory agent:
//!
//! - [`ids`] - Strongly-typed row and attribute identifiers (`DnTag`,
//!   `AttributeId`)
//! - [`error`] - The [`DirectoryError`] enum surfaced by every fallible
//!   operation
//! - [`sid`] - The [`SecurityIdentifier`] value type with its string, packed
//!   and index-key binary forms
//! - [`uac`] - The `userAccountControl` bitfield
//! - [`account_type`] - Decoded `sAMAccountType` code points
//! - [`dn`] - Distinguished names
//! - [`types`] - Database variant/state enums and the object identifier
//!   sum type
//! - [`clock`] - Injected time source used for replication metadata

pub mod account_type;
pub mod clock;
pub mod dn;
pub mod error;
pub mod ids;
pub mod sid;
pub mod types;
pub mod uac;

pub use account_type::SamAccountType;
pub use clock::{Clock, FixedClock, SystemClock};
pub use dn::Dn;
pub use error::{DirectoryError, DirectoryResult};
pub use ids::{AttributeId, DnTag};
pub use sid::SecurityIdentifier;
pub use types::{DatabaseVariant, DcState, ObjectIdentifier};
pub use uac::UserAccountControl;
