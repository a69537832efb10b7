//! `userAccountControl` bitfield
//!
//! Account state is stored as a bitmask in the `userAccountControl`
//! attribute. This module provides the flag constants the agent and the
//! account projection consume, together with predicate and builder helpers.

use serde::{Deserialize, Serialize};

/// The account is disabled.
pub const ACCOUNTDISABLE: u32 = 0x0002;

/// The account is currently locked out.
pub const LOCKOUT: u32 = 0x0010;

/// No password is required.
pub const PASSWD_NOTREQD: u32 = 0x0020;

/// Default account type representing a typical user.
pub const NORMAL_ACCOUNT: u32 = 0x0200;

/// Computer account of a domain member workstation or server.
pub const WORKSTATION_TRUST_ACCOUNT: u32 = 0x1000;

/// Computer account of a domain controller.
pub const SERVER_TRUST_ACCOUNT: u32 = 0x2000;

/// The password never expires.
pub const DONT_EXPIRE_PASSWORD: u32 = 0x1_0000;

/// Logon requires a smart card.
pub const SMARTCARD_REQUIRED: u32 = 0x4_0000;

/// Kerberos pre-authentication is not required.
pub const DONT_REQUIRE_PREAUTH: u32 = 0x40_0000;

/// The password has expired.
pub const PASSWORD_EXPIRED: u32 = 0x80_0000;

/// Decoded `userAccountControl` value.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct UserAccountControl(u32);

impl UserAccountControl {
    /// Wrap a raw bitmask.
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// The raw bitmask.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Whether a specific flag is set.
    #[must_use]
    pub const fn contains(self, flag: u32) -> bool {
        self.0 & flag != 0
    }

    /// Set a flag.
    #[must_use]
    pub const fn insert(self, flag: u32) -> Self {
        Self(self.0 | flag)
    }

    /// Clear a flag.
    #[must_use]
    pub const fn remove(self, flag: u32) -> Self {
        Self(self.0 & !flag)
    }

    /// Whether the ACCOUNTDISABLE bit is set.
    #[must_use]
    pub const fn is_disabled(self) -> bool {
        self.contains(ACCOUNTDISABLE)
    }

    /// Whether the account can log on (ACCOUNTDISABLE clear).
    #[must_use]
    pub const fn is_enabled(self) -> bool {
        !self.is_disabled()
    }

    /// Whether the account is locked out.
    #[must_use]
    pub const fn is_locked(self) -> bool {
        self.contains(LOCKOUT)
    }

    /// Whether the password never expires.
    #[must_use]
    pub const fn password_never_expires(self) -> bool {
        self.contains(DONT_EXPIRE_PASSWORD)
    }

    /// Whether logon requires a smart card.
    #[must_use]
    pub const fn smartcard_required(self) -> bool {
        self.contains(SMARTCARD_REQUIRED)
    }

    /// Return the value with the ACCOUNTDISABLE bit set or cleared so that
    /// the account is enabled iff `enabled`.
    #[must_use]
    pub const fn with_enabled(self, enabled: bool) -> Self {
        if enabled {
            self.remove(ACCOUNTDISABLE)
        } else {
            self.insert(ACCOUNTDISABLE)
        }
    }
}

impl From<u32> for UserAccountControl {
    fn from(bits: u32) -> Self {
        Self(bits)
    }
}

impl From<UserAccountControl> for u32 {
    fn from(uac: UserAccountControl) -> Self {
        uac.0
    }
}

/// Conversion from the signed form the data table stores.
impl From<i32> for UserAccountControl {
    fn from(bits: i32) -> Self {
        Self(bits as u32)
    }
}

impl From<UserAccountControl> for i32 {
    fn from(uac: UserAccountControl) -> Self {
        uac.0 as i32
    }
}

impl std::fmt::Display for UserAccountControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:x}", self.0)?;
        let mut labels = Vec::new();
        if self.is_disabled() {
            labels.push("DISABLED");
        }
        if self.is_locked() {
            labels.push("LOCKED");
        }
        if self.contains(NORMAL_ACCOUNT) {
            labels.push("NORMAL");
        }
        if self.password_never_expires() {
            labels.push("DONT_EXPIRE_PASSWORD");
        }
        if self.smartcard_required() {
            labels.push("SMARTCARD_REQUIRED");
        }
        if !labels.is_empty() {
            write!(f, " ({})", labels.join("|"))?;
        }
        Ok(())
    }
}
