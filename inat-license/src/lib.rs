//! License key protocol and activation state for the Inat suite.
//!
//! This crate handles:
//! - Token encoding and truncated HMAC-SHA256 signing (generation side)
//! - Token verification with constant-time signature comparison
//! - Machine fingerprinting for hardware-bound licenses
//! - Trial bookkeeping and persisted activation state
//!
//! # Design Principles
//!
//! - **Offline verification**: tokens verify against a secret embedded in
//!   the binary; no server round-trip, ever. This is security by
//!   obscurity — anyone with the binary can forge tokens — and accepted
//!   as such for this product.
//! - **Fail open**: licensing I/O errors never prevent the application
//!   from starting; they restart the trial instead.
//! - **No globals**: the store is constructed explicitly with its state
//!   file path and clock, so expiry logic is deterministic under test.
//!
//! # Token Format
//!
//! `INAT-XXXX-XXXX-...`: Base32 of `TYPE|name|YYYYMMDD|hardware` followed
//! by a 32-character truncated Base32 HMAC-SHA256 signature, grouped in
//! 4-character blocks. Tokens are matched case-insensitively.

mod base32;
mod device;
mod error;
mod key;
mod store;

pub use device::MachineFingerprint;
pub use error::Rejection;
pub use key::{
    ANY_MACHINE, LicenseRecord, LicenseType, MAX_NAME_LEN, TOKEN_PREFIX, decode_and_verify,
    encode, superuser_bypass,
};
pub use store::{
    Activation, Clock, LicenseStatus, LicenseStore, SystemClock, TRIAL_PERIOD_DAYS,
};
