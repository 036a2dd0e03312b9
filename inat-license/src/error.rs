//! Rejection reasons for license validation.
//!
//! Validation failures cross the subsystem boundary as values, never as
//! panics: the store turns them into `(accepted, message)` results for the
//! UI layer. `Display` output is English and intended for logs; the
//! user-facing German strings come from [`Rejection::user_message`].

use thiserror::Error;

/// Why a license token was not accepted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    /// Structurally invalid: wrong prefix, undecodable body, wrong field
    /// count, or an unparseable expiry date.
    #[error("malformed license token")]
    Malformed,

    /// The token decodes but its signature does not match the record.
    #[error("license token signature invalid")]
    InvalidSignature,

    /// Valid signature, but the license expired on the given date.
    #[error("license expired on {0}")]
    Expired(chrono::NaiveDate),

    /// Valid signature, but the license is bound to a different machine.
    #[error("license bound to a different machine")]
    WrongMachine,
}

impl Rejection {
    /// The localized message shown to the end user.
    ///
    /// Malformed tokens and bad signatures intentionally share one generic
    /// message so the dialog gives no oracle for forging attempts.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Malformed | Self::InvalidSignature => {
                "Ungültiger Lizenzschlüssel.".to_string()
            }
            Self::Expired(date) => format!(
                "Der Lizenzschlüssel ist am {} abgelaufen.",
                date.format("%d.%m.%Y")
            ),
            Self::WrongMachine => {
                "Dieser Lizenzschlüssel ist an einen anderen Computer gebunden.".to_string()
            }
        }
    }
}
