//! Typed projections over directory objects
//!
//! Projections copy what they need out of a cursor-bound view before the
//! cursor moves on; encrypted fields keep their ciphertext and decrypt on
//! access through the decryptor captured at read time.

pub mod account;
pub mod backup_key;
pub mod kds;

pub use account::Account;
pub use backup_key::DpapiBackupKey;
pub use kds::KdsRootKey;
