mod common;

use common::{date, enterprise_bound, professional, token_body, token_from_body};
use inat_license::{
    ANY_MACHINE, LicenseRecord, LicenseType, MAX_NAME_LEN, Rejection, decode_and_verify, encode,
    superuser_bypass,
};

// ── Round-trips ──────────────────────────────────────────────────

#[test]
fn roundtrip_professional() {
    let record = professional("Acme AG", date(2026, 1, 1));
    let recovered = decode_and_verify(&encode(&record)).unwrap();

    assert_eq!(recovered.license_type, LicenseType::Professional);
    assert_eq!(recovered.customer_name, "Acme AG");
    assert_eq!(recovered.valid_until, Some(date(2026, 1, 1)));
    assert_eq!(recovered.hardware_id, ANY_MACHINE);
    assert_eq!(recovered, record);
}

#[test]
fn roundtrip_enterprise_hardware_bound() {
    let record = enterprise_bound("Müller GmbH", date(2027, 12, 31), "q5JX0aa/HgFPbW1c");
    assert_eq!(decode_and_verify(&encode(&record)).unwrap(), record);
}

#[test]
fn roundtrip_never_expiring() {
    let record = LicenseRecord::new(LicenseType::Professional, "Acme AG", None, ANY_MACHINE);
    let recovered = decode_and_verify(&encode(&record)).unwrap();
    assert_eq!(recovered.valid_until, None);
}

#[test]
fn roundtrip_superuser() {
    let record = LicenseRecord::superuser("Zentrale");
    let recovered = decode_and_verify(&encode(&record)).unwrap();
    assert_eq!(recovered.license_type, LicenseType::Superuser);
    assert_eq!(recovered.valid_until, None);
    assert_eq!(recovered.hardware_id, ANY_MACHINE);
}

// ── Token shape ──────────────────────────────────────────────────

#[test]
fn token_is_prefixed_grouped_uppercase() {
    let token = encode(&professional("Acme AG", date(2026, 1, 1)));

    assert!(token.starts_with("INAT-"));
    for group in token.split('-').skip(1) {
        assert!(group.len() <= 4 && !group.is_empty());
        assert!(
            group
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        );
    }
}

#[test]
fn token_accepted_case_insensitively() {
    let record = professional("Acme AG", date(2026, 1, 1));
    let token = encode(&record);

    assert_eq!(decode_and_verify(&token.to_lowercase()).unwrap(), record);
    assert_eq!(
        decode_and_verify(&format!("  {token}  ")).unwrap(),
        record,
        "surrounding whitespace must be tolerated"
    );
}

// ── Encoding normalizations ──────────────────────────────────────

#[test]
fn long_names_are_truncated() {
    let record = LicenseRecord::new(
        LicenseType::Professional,
        "Ganz Lange Firmenbezeichnung GmbH & Co. KG",
        Some(date(2026, 1, 1)),
        ANY_MACHINE,
    );
    assert_eq!(record.customer_name.chars().count(), MAX_NAME_LEN);

    let recovered = decode_and_verify(&encode(&record)).unwrap();
    assert_eq!(recovered.customer_name, record.customer_name);
}

#[test]
fn separator_is_stripped_from_names() {
    let record = LicenseRecord::new(
        LicenseType::Professional,
        "Acme|AG",
        Some(date(2026, 1, 1)),
        ANY_MACHINE,
    );
    assert_eq!(record.customer_name, "AcmeAG");
    assert!(decode_and_verify(&encode(&record)).is_ok());
}

// ── Rejections ───────────────────────────────────────────────────

#[test]
fn rejects_wrong_prefix() {
    let token = encode(&professional("Acme AG", date(2026, 1, 1)));
    let wrong = token.replacen("INAT-", "ACME-", 1);
    assert_eq!(decode_and_verify(&wrong), Err(Rejection::Malformed));
    assert_eq!(decode_and_verify("no token at all"), Err(Rejection::Malformed));
}

#[test]
fn rejects_short_body() {
    assert_eq!(decode_and_verify("INAT-AAAA-BBBB"), Err(Rejection::Malformed));
    assert_eq!(decode_and_verify("INAT-"), Err(Rejection::Malformed));
}

#[test]
fn rejects_undecodable_body() {
    // '0', '1', '8', '9' are outside the Base32 alphabet.
    let body = "0189".repeat(12);
    assert_eq!(
        decode_and_verify(&token_from_body(&body)),
        Err(Rejection::Malformed)
    );
}

#[test]
fn tampered_signature_is_detected() {
    let token = encode(&professional("Acme AG", date(2026, 1, 1)));
    let body = token_body(&token);
    let data_len = body.len() - 32;

    // Flipping any single character of the signature must be caught.
    for pos in data_len..body.len() {
        let mut tampered: Vec<u8> = body.bytes().collect();
        tampered[pos] = if tampered[pos] == b'A' { b'B' } else { b'A' };
        let tampered = String::from_utf8(tampered).unwrap();

        assert_eq!(
            decode_and_verify(&token_from_body(&tampered)),
            Err(Rejection::InvalidSignature),
            "flip at signature position {pos} went undetected"
        );
    }
}

#[test]
fn tampered_data_is_rejected() {
    let token = encode(&professional("Acme AG", date(2026, 1, 1)));
    let body = token_body(&token);
    let data_len = body.len() - 32;

    for pos in 0..data_len {
        let mut tampered: Vec<u8> = body.bytes().collect();
        tampered[pos] = if tampered[pos] == b'C' { b'D' } else { b'C' };
        let tampered = String::from_utf8(tampered).unwrap();

        assert!(
            decode_and_verify(&token_from_body(&tampered)).is_err(),
            "flip at data position {pos} went undetected"
        );
    }
}

#[test]
fn truncated_token_is_rejected() {
    let token = encode(&professional("Acme AG", date(2026, 1, 1)));
    let body = token_body(&token);
    let shortened = &body[..body.len() - 1];
    assert!(decode_and_verify(&token_from_body(shortened)).is_err());
}

// ── Superuser bypass ─────────────────────────────────────────────

#[test]
fn bypass_passphrases_yield_superuser() {
    for phrase in ["superuser", "SUPERUSER", "Inat-Superuser", "inat-zentrale"] {
        let record = superuser_bypass(phrase).expect(phrase);
        assert_eq!(record.license_type, LicenseType::Superuser);
        assert_eq!(record.valid_until, None);
        assert_eq!(record.hardware_id, ANY_MACHINE);

        // The bypass short-circuits full validation as well.
        assert_eq!(decode_and_verify(phrase).unwrap(), record);
    }
}

#[test]
fn bypass_requires_exact_match() {
    assert!(superuser_bypass("superuser2").is_none());
    assert!(superuser_bypass("super user").is_none());
    assert!(superuser_bypass("").is_none());
}

// ── Record policy helpers ────────────────────────────────────────

#[test]
fn expiry_is_inclusive() {
    let record = professional("Acme AG", date(2026, 1, 1));
    assert!(!record.is_expired_at(date(2025, 12, 31)));
    assert!(!record.is_expired_at(date(2026, 1, 1)));
    assert!(record.is_expired_at(date(2026, 1, 2)));
}

#[test]
fn wildcard_binds_anywhere() {
    let record = professional("Acme AG", date(2026, 1, 1));
    assert!(record.binds_to("anything"));

    let bound = enterprise_bound("Acme AG", date(2026, 1, 1), "fp-one");
    assert!(bound.binds_to("fp-one"));
    assert!(!bound.binds_to("fp-two"));
}
