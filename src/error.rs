//! Arena error types and the fatal-exit path.

use std::error::Error;
use std::fmt;

/// Failures the arena can report instead of terminating the process.
///
/// Only the `try_` family of operations returns these. The plain operations
/// treat every variant as unrecoverable and go through [`fatal`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArenaError {
    /// The operating system refused to reserve address space.
    Reserve {
        /// Bytes of address space requested.
        bytes: usize,
        /// Raw OS error code.
        os_code: i32,
    },
    /// The operating system refused to commit part of the reservation.
    Commit {
        /// Offset of the first page to commit, relative to the region base.
        offset: usize,
        /// Bytes requested.
        bytes: usize,
        /// Raw OS error code.
        os_code: i32,
    },
    /// The push would grow the arena past its reservation.
    CapacityExceeded {
        /// Cursor position the push needed to reach.
        requested: usize,
        /// Total reserved bytes.
        reserved: usize,
    },
    /// The arena configuration cannot be used.
    InvalidConfig {
        /// What was wrong.
        reason: String,
    },
}

impl ArenaError {
    /// Process exit code used when this error is fatal.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Reserve { os_code, .. } | Self::Commit { os_code, .. } if *os_code != 0 => {
                *os_code
            }
            Self::Reserve { .. } | Self::Commit { .. } | Self::CapacityExceeded { .. } => {
                crate::arena::region::OUT_OF_MEMORY_CODE
            }
            Self::InvalidConfig { .. } => 1,
        }
    }

    pub(crate) fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reserve { bytes, os_code } => {
                write!(f, "failed to reserve {bytes} bytes of address space (os error {os_code})")
            }
            Self::Commit {
                offset,
                bytes,
                os_code,
            } => {
                write!(
                    f,
                    "failed to commit {bytes} bytes at offset {offset} (os error {os_code})"
                )
            }
            Self::CapacityExceeded {
                requested,
                reserved,
            } => {
                write!(
                    f,
                    "arena reservation exhausted: need {requested} bytes, reserved {reserved} bytes"
                )
            }
            Self::InvalidConfig { reason } => {
                write!(f, "invalid arena configuration: {reason}")
            }
        }
    }
}

impl Error for ArenaError {}

/// Report an unrecoverable allocation failure and terminate the process.
///
/// The allocator cannot build recovery state for its own metadata, so the
/// plain arena API ends here on any [`ArenaError`].
#[cold]
pub fn fatal(error: &ArenaError) -> ! {
    let code = error.exit_code();
    tracing::error!(target: "pagearena::arena", %error, code, "fatal arena failure");
    eprintln!("pagearena: fatal: {error}");
    std::process::exit(code)
}
