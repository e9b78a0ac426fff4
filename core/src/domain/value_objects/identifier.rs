//! Validated delivery destination

use std::fmt;

use og_shared::utils::identifier::{mask_identifier, normalize_identifier, IdentifierKind};

use crate::errors::OtpError;

/// A normalized phone number (E.164) or email address
///
/// `Display` renders the masked form so an identifier can go straight into a
/// log field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier {
    kind: IdentifierKind,
    value: String,
}

impl Identifier {
    /// Validate and normalize raw caller input
    pub fn parse(raw: &str) -> Result<Self, OtpError> {
        normalize_identifier(raw)
            .map(|(kind, value)| Self { kind, value })
            .ok_or(OtpError::InvalidIdentifier)
    }

    pub fn kind(&self) -> IdentifierKind {
        self.kind
    }

    /// The normalized value
    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn into_inner(self) -> String {
        self.value
    }

    /// Masked form for logs and responses
    pub fn masked(&self) -> String {
        mask_identifier(&self.value)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.masked())
    }
}
