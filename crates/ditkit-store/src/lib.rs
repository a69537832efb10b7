//! # ditkit-store
//!
//! Storage layer of the ditkit directory database toolkit: the collaborator
//! contracts the directory agent drives, the cursor-bound object view, and a
//! reference in-memory engine.
//!
//! ## Crate Organization
//!
//! - [`value`] - The tagged attribute value model and typed conversions
//! - [`attributes`] - Catalogue of well-known attribute names and ids
//! - [`key`] - Index key composition (binary forms that sort correctly)
//! - [`schema`] - The schema catalogue contract and the built-in catalogue
//! - [`resolver`] - Distinguished-name resolution contract
//! - [`header`] - The mutable Domain Controller header record
//! - [`meta`] - Per-attribute replication metadata
//! - [`cursor`] - The shared data-table cursor contract
//! - [`transaction`] - The transaction contract
//! - [`database`] - The database handle contract
//! - [`object`] - The cursor-bound [`object::DirectoryObject`] view
//! - [`context`] - The per-session [`context::DirectoryContext`]
//! - [`memory`] - Reference in-memory engine and its seeding builder

pub mod attributes;
pub mod context;
pub mod cursor;
pub mod database;
pub mod header;
pub mod key;
pub mod memory;
pub mod meta;
pub mod object;
pub mod resolver;
pub mod schema;
pub mod transaction;
pub mod value;

pub use context::DirectoryContext;
pub use cursor::{CursorLocation, DataCursor, MatchKind};
pub use database::DirectoryDatabase;
pub use header::DcHeader;
pub use memory::{MemoryDirectory, MemoryDirectoryBuilder};
pub use meta::AttributeMeta;
pub use object::DirectoryObject;
pub use resolver::DnResolver;
pub use schema::{BuiltinSchema, DirectorySchema, KeySyntax};
pub use transaction::{Durability, StoreTransaction};
pub use value::{AttributeValue, DirectoryValue};
