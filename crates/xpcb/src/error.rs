//! Error types for snapshot operations.

use std::io;

/// Result type for snapshot operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while acquiring or opening a snapshot.
///
/// Decoding itself never fails: a malformed record header is the kernel's
/// end-of-list marker and terminates the stream, and questionable records
/// are skipped with a diagnostic (see
/// [`DecodeDiagnostics`](crate::pcblist::DecodeDiagnostics)).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// This host has no pcblist sysctl at all.
    #[error("pcblist sysctl is not available on this platform")]
    Unsupported,

    /// The kernel reports no data for this protocol (ENOENT).
    #[error("no pcblist data available for {mib}")]
    Unavailable {
        /// The MIB name that was queried.
        mib: &'static str,
    },

    /// A sysctl query failed.
    #[error("sysctl {mib}: {message} (errno {errno})")]
    Sysctl {
        /// The MIB name that was queried.
        mib: &'static str,
        /// The errno value from the kernel.
        errno: i32,
        /// Human-readable error message.
        message: String,
    },

    /// The returned buffer cannot hold even the generation header.
    #[error("empty or malformed snapshot: {len} bytes")]
    EmptySnapshot {
        /// Length of the degenerate buffer.
        len: usize,
    },
}

impl Error {
    /// Create a sysctl error from an errno value.
    pub fn sysctl(mib: &'static str, errno: i32) -> Self {
        let message = io::Error::from_raw_os_error(errno).to_string();
        Self::Sysctl {
            mib,
            errno,
            message,
        }
    }

    /// Check whether this error means "nothing to list" rather than a
    /// failure. [`Snapshot::open`](crate::Snapshot::open) turns these into
    /// an open, immediately-exhausted snapshot.
    pub fn is_empty_result(&self) -> bool {
        matches!(
            self,
            Self::Unsupported | Self::Unavailable { .. } | Self::EmptySnapshot { .. }
        )
    }

    /// Get the errno value if this is a sysctl error.
    pub fn errno(&self) -> Option<i32> {
        match self {
            Self::Sysctl { errno, .. } => Some(*errno),
            _ => None,
        }
    }
}
