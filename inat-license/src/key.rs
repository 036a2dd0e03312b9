//! License token encoding, signing, and verification.
//!
//! Tokens are offline-verifiable: `INAT-XXXX-XXXX-...` where the body is
//! the Base32 encoding of a pipe-delimited record followed by the first 32
//! characters of the Base32-encoded `HMAC-SHA256(secret, record)`.
//!
//! The record is `<TypeCode>|<customer_name>|<valid_until>|<hardware_id>`,
//! e.g. `PR|Acme AG|20260101|*`. Superuser grants serialize as
//! `SU|<name>|FOREVER|*`.
//!
//! The signing secret is embedded in the binary, so verification needs no
//! server round-trip — and, by the same token, anyone holding the binary
//! can forge keys. That trade-off is deliberate: the scheme keeps honest
//! customers honest, it does not resist a determined attacker.

use crate::base32;
use crate::error::Rejection;
use chrono::NaiveDate;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::warn;

/// Product prefix every token starts with.
pub const TOKEN_PREFIX: &str = "INAT";

/// Shared signing secret. Swap here, nowhere else.
const SIGNING_SECRET: &[u8] = b"inat-kasse-2019-salzgitter-bleibt-offline";

/// Length of the truncated signature in token characters.
const SIGNATURE_LEN: usize = 32;

/// Minimum token body: 8 characters of record data plus the signature.
const MIN_BODY_LEN: usize = SIGNATURE_LEN + 8;

/// Token bodies are grouped into hyphen-separated blocks of this width.
const GROUP_LEN: usize = 4;

/// Customer names are truncated to this many characters on encoding.
pub const MAX_NAME_LEN: usize = 20;

/// Serialized form of "never expires".
const FOREVER: &str = "FOREVER";

/// Wildcard hardware id accepted on any machine.
pub const ANY_MACHINE: &str = "*";

/// Literal passphrases that bypass token validation entirely and activate
/// a superuser license. Administrative backdoor, matched case-insensitively.
const SUPERUSER_PASSPHRASES: [&str; 3] = ["superuser", "inat-superuser", "inat-zentrale"];

type HmacSha256 = Hmac<Sha256>;

/// The kind of license a token grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LicenseType {
    /// Time-limited evaluation.
    Trial,
    /// Standard paid license.
    Professional,
    /// Multi-seat license.
    Enterprise,
    /// Internal license: never expires, any machine.
    Superuser,
}

impl LicenseType {
    /// Two-letter serialization code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Trial => "TR",
            Self::Professional => "PR",
            Self::Enterprise => "EN",
            Self::Superuser => "SU",
        }
    }

    /// Maps a serialization code back to a type.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "TR" => Some(Self::Trial),
            "PR" => Some(Self::Professional),
            "EN" => Some(Self::Enterprise),
            "SU" => Some(Self::Superuser),
            _ => None,
        }
    }

    /// German display name used in user-facing messages.
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Trial => "Testversion",
            Self::Professional => "Professional",
            Self::Enterprise => "Enterprise",
            Self::Superuser => "Superuser",
        }
    }
}

/// A license grant, immutable once verified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseRecord {
    /// Kind of license.
    pub license_type: LicenseType,
    /// Customer the license was issued to (≤ 20 characters).
    pub customer_name: String,
    /// Last day the license is valid, or `None` for "never expires".
    pub valid_until: Option<NaiveDate>,
    /// Machine fingerprint the license is bound to, or `*` for any.
    pub hardware_id: String,
}

impl LicenseRecord {
    /// Builds a record, applying the lossy encoding normalizations up
    /// front: the name is stripped of the `|` separator, trimmed, and
    /// truncated to [`MAX_NAME_LEN`]; superuser grants are forced to the
    /// unbounded wildcard form.
    #[must_use]
    pub fn new(
        license_type: LicenseType,
        customer_name: &str,
        valid_until: Option<NaiveDate>,
        hardware_id: &str,
    ) -> Self {
        let mut name: String = customer_name
            .chars()
            .filter(|c| *c != '|')
            .collect::<String>()
            .trim()
            .to_string();
        if let Some((idx, _)) = name.char_indices().nth(MAX_NAME_LEN) {
            name.truncate(idx);
        }
        // Truncation may expose a trailing space; the wire form carries
        // the name verbatim, so normalize it away before signing.
        name.truncate(name.trim_end().len());
        let (valid_until, hardware_id) = if license_type == LicenseType::Superuser {
            (None, ANY_MACHINE.to_string())
        } else {
            (valid_until, hardware_id.to_string())
        };
        Self {
            license_type,
            customer_name: name,
            valid_until,
            hardware_id,
        }
    }

    /// An unbounded superuser grant.
    #[must_use]
    pub fn superuser(customer_name: &str) -> Self {
        Self::new(LicenseType::Superuser, customer_name, None, ANY_MACHINE)
    }

    /// True if the license may run on a machine with the given fingerprint.
    #[must_use]
    pub fn binds_to(&self, fingerprint: &str) -> bool {
        self.hardware_id == ANY_MACHINE || self.hardware_id == fingerprint
    }

    /// True if the license is expired as of `today`.
    ///
    /// `valid_until` is inclusive: a license valid until today still works.
    #[must_use]
    pub fn is_expired_at(&self, today: NaiveDate) -> bool {
        match self.valid_until {
            Some(until) => today > until,
            None => false,
        }
    }

    /// Pipe-delimited wire form, e.g. `PR|Acme AG|20260101|*`.
    fn serialize(&self) -> String {
        let until = match self.valid_until {
            Some(date) => date.format("%Y%m%d").to_string(),
            None => FOREVER.to_string(),
        };
        format!(
            "{}|{}|{}|{}",
            self.license_type.code(),
            self.customer_name,
            until,
            self.hardware_id
        )
    }

    /// Parses the pipe-delimited wire form.
    fn deserialize(serialized: &str) -> Result<Self, Rejection> {
        let fields: Vec<&str> = serialized.split('|').collect();
        let [code, name, until, hardware] = fields.as_slice() else {
            return Err(Rejection::Malformed);
        };

        let license_type = LicenseType::from_code(code).unwrap_or_else(|| {
            // Documented fallback: unknown codes downgrade to a trial
            // license. Observable so silent downgrades show up in logs.
            warn!(code = %code, "unknown license type code, falling back to trial");
            LicenseType::Trial
        });

        let valid_until = if *until == FOREVER {
            None
        } else {
            Some(NaiveDate::parse_from_str(until, "%Y%m%d").map_err(|_| Rejection::Malformed)?)
        };

        Ok(Self::new(license_type, name, valid_until, hardware))
    }
}

/// Truncated Base32 HMAC-SHA256 over the serialized record.
fn sign(serialized: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(SIGNING_SECRET).expect("HMAC accepts any key length");
    mac.update(serialized.as_bytes());
    let tag = mac.finalize().into_bytes();
    let mut signature = base32::encode(&tag);
    signature.truncate(SIGNATURE_LEN);
    signature
}

/// Encodes a record into a signed, human-transcribable token.
#[must_use]
pub fn encode(record: &LicenseRecord) -> String {
    let serialized = record.serialize();
    let mut body = base32::encode(serialized.as_bytes());
    body.push_str(&sign(&serialized));

    let groups: Vec<&str> = body
        .as_bytes()
        .chunks(GROUP_LEN)
        .map(|chunk| std::str::from_utf8(chunk).expect("body is ASCII"))
        .collect();
    format!("{}-{}", TOKEN_PREFIX, groups.join("-"))
}

/// If the input is one of the fixed superuser passphrases, returns the
/// hard-coded superuser record, bypassing token validation entirely.
#[must_use]
pub fn superuser_bypass(input: &str) -> Option<LicenseRecord> {
    let input = input.trim();
    SUPERUSER_PASSPHRASES
        .iter()
        .any(|p| input.eq_ignore_ascii_case(p))
        .then(|| LicenseRecord::superuser("Superuser"))
}

/// Decodes a token and verifies its signature.
///
/// Tokens are matched case-insensitively. Expiry and hardware binding are
/// *not* checked here; they are activation-time policy (see
/// [`crate::LicenseStore::activate`]).
///
/// # Errors
///
/// [`Rejection::Malformed`] for structural failures (prefix, body length,
/// Base32, field count, date), [`Rejection::InvalidSignature`] when the
/// record decodes but the signature does not match.
pub fn decode_and_verify(token: &str) -> Result<LicenseRecord, Rejection> {
    if let Some(record) = superuser_bypass(token) {
        return Ok(record);
    }

    let normalized = token.trim().to_ascii_uppercase();
    let rest = normalized
        .strip_prefix(TOKEN_PREFIX)
        .and_then(|r| r.strip_prefix('-'))
        .ok_or(Rejection::Malformed)?;

    let body: String = rest.chars().filter(|c| *c != '-').collect();
    if body.len() < MIN_BODY_LEN {
        return Err(Rejection::Malformed);
    }

    // Fixed split: the last 32 characters are always the signature.
    let (data, supplied_signature) = body.split_at(body.len() - SIGNATURE_LEN);

    let decoded = base32::decode(data).ok_or(Rejection::Malformed)?;
    let serialized = String::from_utf8(decoded).map_err(|_| Rejection::Malformed)?;

    let expected = sign(&serialized);
    let matches: bool = expected
        .as_bytes()
        .ct_eq(supplied_signature.as_bytes())
        .into();
    if !matches {
        return Err(Rejection::InvalidSignature);
    }

    LicenseRecord::deserialize(&serialized)
}
