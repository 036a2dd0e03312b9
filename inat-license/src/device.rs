//! Machine fingerprinting for hardware-bound licenses.
//!
//! The fingerprint must be stable across reboots and reinstalls of the
//! application, but differ between two machines in the same office. It is
//! derived from the hostname, the CPU architecture, and a platform machine
//! identifier, hashed and truncated.

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use sha2::{Digest, Sha256};
use std::env;

/// Number of hash bytes kept in the fingerprint (16 Base64 characters).
const FINGERPRINT_BYTES: usize = 12;

/// A stable identifier for the current machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineFingerprint {
    id: String,
}

impl MachineFingerprint {
    /// Computes the fingerprint of the machine the process runs on.
    #[must_use]
    pub fn current() -> Self {
        let mut components = vec![get_hostname(), env::consts::ARCH.to_string()];
        if let Some(machine_id) = get_machine_id() {
            components.push(machine_id);
        }

        let mut hasher = Sha256::new();
        hasher.update(components.join("\n").as_bytes());
        let hash = hasher.finalize();

        Self {
            id: BASE64.encode(&hash[..FINGERPRINT_BYTES]),
        }
    }

    /// The fingerprint string embedded in hardware-bound tokens.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl std::fmt::Display for MachineFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.id)
    }
}

fn get_hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Platform machine identifier: survives hostname changes where available.
fn get_machine_id() -> Option<String> {
    #[cfg(target_os = "linux")]
    {
        std::fs::read_to_string("/etc/machine-id")
            .or_else(|_| std::fs::read_to_string("/var/lib/dbus/machine-id"))
            .ok()
            .map(|s| s.trim().to_string())
    }

    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("ioreg")
            .args(["-rd1", "-c", "IOPlatformExpertDevice"])
            .output()
            .ok()
            .and_then(|o| String::from_utf8(o.stdout).ok())
            .and_then(|output| {
                output
                    .lines()
                    .find(|l| l.contains("IOPlatformUUID"))
                    .and_then(|l| l.split('"').nth(3))
                    .map(String::from)
            })
    }

    #[cfg(target_os = "windows")]
    {
        // MachineGuid is the stable identifier on Windows.
        std::process::Command::new("reg")
            .args([
                "query",
                r"HKLM\SOFTWARE\Microsoft\Cryptography",
                "/v",
                "MachineGuid",
            ])
            .output()
            .ok()
            .and_then(|o| String::from_utf8(o.stdout).ok())
            .and_then(|output| {
                output
                    .split_whitespace()
                    .last()
                    .map(|guid| guid.to_string())
            })
    }

    #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
    {
        None
    }
}
