//! Per-attribute replication metadata

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The replication metadata tuple attached to one attribute of one object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeMeta {
    /// Write version, incremented on every originating write.
    pub version: u32,
    /// USN of the local write.
    pub local_usn: i64,
    /// USN assigned by the originating directory service agent.
    pub originating_usn: i64,
    /// Timestamp of the originating write.
    pub originating_time: DateTime<Utc>,
}

impl AttributeMeta {
    /// Metadata for the first originating write of an attribute.
    #[must_use]
    pub fn first_write(usn: i64, time: DateTime<Utc>) -> Self {
        Self {
            version: 1,
            local_usn: usn,
            originating_usn: usn,
            originating_time: time,
        }
    }

    /// Metadata after a subsequent originating write.
    #[must_use]
    pub fn originating_write(self, usn: i64, time: DateTime<Utc>) -> Self {
        Self {
            version: self.version + 1,
            local_usn: usn,
            originating_usn: usn,
            originating_time: time,
        }
    }
}
