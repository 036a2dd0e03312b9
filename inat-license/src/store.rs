//! Activation state: trial bookkeeping and the installed license.
//!
//! The store is the single source of truth for "may the application run".
//! It combines the persisted state file with wall-clock time into a
//! [`LicenseStatus`] that is recomputed on every query, never cached.
//!
//! All file I/O failures are swallowed and treated as "no persisted state":
//! the application must never refuse to start because of a licensing I/O
//! error. The flip side — a corrupted state file silently restarts the
//! trial — is accepted.

use crate::device::MachineFingerprint;
use crate::error::Rejection;
use crate::key::{self, LicenseType};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

/// Length of the free trial.
pub const TRIAL_PERIOD_DAYS: i64 = 30;

/// Wall-clock source, injected so expiry logic is testable.
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> DateTime<Utc>;

    /// Current calendar date.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// The real system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// On-disk activation state. Exactly one of the two forms is present.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum PersistedState {
    Activated {
        license_key: String,
        license_type: LicenseType,
        customer_name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        valid_until: Option<NaiveDate>,
        activated_at: DateTime<Utc>,
    },
    Trial {
        trial_start: DateTime<Utc>,
    },
}

/// Snapshot of the current licensing situation, recomputed per query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicenseStatus {
    /// Whether the application may run.
    pub is_valid: bool,
    /// Kind of license in effect (trial until activated).
    pub license_type: LicenseType,
    /// Days until expiry; `None` for licenses that never expire.
    pub days_remaining: Option<u32>,
    /// Customer the license was issued to; empty during the trial.
    pub customer_name: String,
    /// Localized status line for the UI.
    pub message: String,
}

/// Result of an activation attempt, handed to the UI layer as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activation {
    /// Whether the token was accepted and persisted.
    pub accepted: bool,
    /// Localized message describing the outcome.
    pub message: String,
}

/// Persistent license store bound to a state file and a clock.
pub struct LicenseStore {
    path: PathBuf,
    clock: Box<dyn Clock>,
}

impl LicenseStore {
    /// Opens a store over the given state file, using the system clock.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_clock(path, Box::new(SystemClock))
    }

    /// Opens a store with an injected clock (deterministic tests).
    pub fn with_clock(path: impl Into<PathBuf>, clock: Box<dyn Clock>) -> Self {
        Self {
            path: path.into(),
            clock,
        }
    }

    /// The platform-default location of the state file.
    #[must_use]
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("inat")
            .join("license.json")
    }

    /// Computes the current licensing status.
    ///
    /// Pure read except for one documented side effect: the very first
    /// query with no persisted state starts the trial.
    pub fn get_status(&self) -> LicenseStatus {
        match self.load() {
            Some(PersistedState::Activated {
                license_type,
                customer_name,
                valid_until,
                ..
            }) => self.activated_status(license_type, &customer_name, valid_until),
            Some(PersistedState::Trial { trial_start }) => self.trial_status(trial_start),
            None => {
                let now = self.clock.now();
                self.save(&PersistedState::Trial { trial_start: now });
                info!("no license state found, starting trial");
                self.trial_status(now)
            }
        }
    }

    /// Validates a token and, on success, persists it as the active license.
    ///
    /// Checks run in order: superuser bypass, token signature, hardware
    /// binding, expiry. Hardware mismatch and expiry are distinct failure
    /// modes with their own messages; they are not signature failures.
    pub fn activate(&self, token: &str) -> Activation {
        self.activate_with_fingerprint(token, MachineFingerprint::current().id())
    }

    /// [`Self::activate`] with an explicit machine fingerprint.
    pub fn activate_with_fingerprint(&self, token: &str, fingerprint: &str) -> Activation {
        let record = if let Some(record) = key::superuser_bypass(token) {
            record
        } else {
            match key::decode_and_verify(token) {
                Ok(record) => record,
                Err(rejection) => {
                    warn!(%rejection, "license activation rejected");
                    return Activation {
                        accepted: false,
                        message: rejection.user_message(),
                    };
                }
            }
        };

        if !record.binds_to(fingerprint) {
            warn!("license activation rejected: bound to a different machine");
            return Activation {
                accepted: false,
                message: Rejection::WrongMachine.user_message(),
            };
        }

        if let Some(until) = record.valid_until {
            if record.is_expired_at(self.clock.today()) {
                warn!(%until, "license activation rejected: expired");
                return Activation {
                    accepted: false,
                    message: Rejection::Expired(until).user_message(),
                };
            }
        }

        self.save(&PersistedState::Activated {
            license_key: token.trim().to_string(),
            license_type: record.license_type,
            customer_name: record.customer_name.clone(),
            valid_until: record.valid_until,
            activated_at: self.clock.now(),
        });
        info!(license_type = ?record.license_type, "license activated");

        Activation {
            accepted: true,
            message: format!(
                "{}-Lizenz für {} aktiviert. Vielen Dank!",
                record.license_type.display_name(),
                record.customer_name
            ),
        }
    }

    /// Deletes the persisted state; the next status query restarts the trial.
    pub fn reset(&self) {
        if let Err(e) = fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %self.path.display(), error = %e, "could not remove license state");
            }
        }
    }

    // ── Status computation ───────────────────────────────────────

    fn trial_status(&self, trial_start: DateTime<Utc>) -> LicenseStatus {
        let elapsed_days = (self.clock.now() - trial_start).num_days();
        let remaining = (TRIAL_PERIOD_DAYS - elapsed_days).max(0);
        let is_valid = elapsed_days <= TRIAL_PERIOD_DAYS;

        let message = if is_valid {
            format!("Testversion: noch {remaining} Tage.")
        } else {
            "Der Testzeitraum ist abgelaufen.".to_string()
        };

        LicenseStatus {
            is_valid,
            license_type: LicenseType::Trial,
            days_remaining: Some(remaining as u32),
            customer_name: String::new(),
            message,
        }
    }

    fn activated_status(
        &self,
        license_type: LicenseType,
        customer_name: &str,
        valid_until: Option<NaiveDate>,
    ) -> LicenseStatus {
        let Some(until) = valid_until else {
            return LicenseStatus {
                is_valid: true,
                license_type,
                days_remaining: None,
                customer_name: customer_name.to_string(),
                message: format!("{}-Lizenz für {customer_name}.", license_type.display_name()),
            };
        };

        let remaining = (until - self.clock.today()).num_days();
        if remaining < 0 {
            LicenseStatus {
                is_valid: false,
                license_type,
                days_remaining: Some(0),
                customer_name: customer_name.to_string(),
                message: Rejection::Expired(until).user_message(),
            }
        } else {
            LicenseStatus {
                is_valid: true,
                license_type,
                days_remaining: Some(remaining as u32),
                customer_name: customer_name.to_string(),
                message: format!(
                    "{}-Lizenz für {customer_name}, gültig bis {}.",
                    license_type.display_name(),
                    until.format("%d.%m.%Y")
                ),
            }
        }
    }

    // ── Persistence (fail-open) ──────────────────────────────────

    fn load(&self) -> Option<PersistedState> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %self.path.display(), error = %e, "could not read license state");
                }
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(state) => Some(state),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "license state corrupt, ignoring");
                None
            }
        }
    }

    fn save(&self, state: &PersistedState) {
        if let Some(parent) = self.path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                warn!(path = %parent.display(), error = %e, "could not create config directory");
                return;
            }
        }
        let json = match serde_json::to_string_pretty(state) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "could not serialize license state");
                return;
            }
        };
        if let Err(e) = fs::write(&self.path, json) {
            warn!(path = %self.path.display(), error = %e, "could not write license state");
        }
    }
}

impl std::fmt::Debug for LicenseStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LicenseStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}
