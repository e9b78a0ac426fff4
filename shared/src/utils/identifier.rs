//! Identifier utilities
//!
//! An identifier is the destination a code is delivered to: a phone number in
//! E.164 form or an email address.

use once_cell::sync::Lazy;
use regex::Regex;

// International phone number regex (E.164 format)
static E164_PHONE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\+[1-9]\d{6,14}$").unwrap()
});

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]{1,64}@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$").unwrap()
});

/// Maximum accepted email length (RFC 5321 path limit)
const MAX_EMAIL_LENGTH: usize = 254;

/// Kind of destination an identifier addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentifierKind {
    Phone,
    Email,
}

/// Normalize a phone number by removing common formatting characters
pub fn normalize_phone_number(phone: &str) -> String {
    phone
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect()
}

/// Check if a phone number is valid (international E.164 format)
pub fn is_valid_phone(phone: &str) -> bool {
    E164_PHONE_REGEX.is_match(&normalize_phone_number(phone))
}

/// Check if an email address is valid
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    email.len() <= MAX_EMAIL_LENGTH && EMAIL_REGEX.is_match(email)
}

/// Classify and normalize a raw identifier
///
/// Phone numbers are stripped of formatting; emails are trimmed and lowercased.
/// Returns `None` when the input is neither.
pub fn normalize_identifier(raw: &str) -> Option<(IdentifierKind, String)> {
    let trimmed = raw.trim();
    if trimmed.contains('@') {
        if is_valid_email(trimmed) {
            return Some((IdentifierKind::Email, trimmed.to_lowercase()));
        }
        return None;
    }

    // Reject letters outright; normalization would otherwise drop them silently
    if trimmed.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }

    let phone = normalize_phone_number(trimmed);
    if E164_PHONE_REGEX.is_match(&phone) {
        Some((IdentifierKind::Phone, phone))
    } else {
        None
    }
}

/// Mask a phone number for display (e.g., +97****5678)
pub fn mask_phone_number(phone: &str) -> String {
    let normalized = normalize_phone_number(phone);
    if normalized.len() >= 7 {
        format!(
            "{}****{}",
            &normalized[0..3],
            &normalized[normalized.len() - 4..]
        )
    } else {
        "****".to_string()
    }
}

/// Mask an email address for display (e.g., j***@example.com)
pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() => {
            let first: String = local.chars().take(1).collect();
            format!("{}***@{}", first, domain)
        }
        _ => "***".to_string(),
    }
}

/// Mask any identifier for logs
pub fn mask_identifier(identifier: &str) -> String {
    if identifier.contains('@') {
        mask_email(identifier)
    } else {
        mask_phone_number(identifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_phone_number() {
        assert_eq!(normalize_phone_number("+976 1234-5678"), "+97612345678");
        assert_eq!(normalize_phone_number("(+1) 415 555 2671"), "+14155552671");
    }

    #[test]
    fn test_is_valid_phone() {
        assert!(is_valid_phone("+97612345678"));
        assert!(is_valid_phone("+14155552671"));
        assert!(!is_valid_phone("97612345678")); // Missing +
        assert!(!is_valid_phone("+0123456789")); // Invalid country code
        assert!(!is_valid_phone("+12345")); // Too short
    }

    #[test]
    fn test_is_valid_email() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("first.last+tag@mail.example.org"));
        assert!(!is_valid_email("user@localhost"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("user example@example.com"));
    }

    #[test]
    fn test_normalize_identifier() {
        assert_eq!(
            normalize_identifier(" +976 1234 5678 "),
            Some((IdentifierKind::Phone, "+97612345678".to_string()))
        );
        assert_eq!(
            normalize_identifier("User@Example.COM"),
            Some((IdentifierKind::Email, "user@example.com".to_string()))
        );
        assert_eq!(normalize_identifier("+1415abc5552671"), None);
        assert_eq!(normalize_identifier(""), None);
        assert_eq!(normalize_identifier("not-an-identifier"), None);
    }

    #[test]
    fn test_mask_identifier() {
        assert_eq!(mask_identifier("+97612345678"), "+97****5678");
        assert_eq!(mask_identifier("jane@example.com"), "j***@example.com");
        assert_eq!(mask_identifier("12345"), "****");
    }
}
