//! Field patterns for personal details entered on the family-member form.
//!
//! Optional fields are only checked when present. Masking helpers keep full
//! ID card and phone numbers off list screens.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Error, Result};

/// A compiled pattern for one form field.
#[derive(Debug)]
pub struct FieldPattern {
    /// Field name as reported in validation errors.
    pub field: &'static str,

    /// What a valid value looks like, for the error message.
    pub description: &'static str,

    regex: Regex,
}

impl FieldPattern {
    /// Create a new field pattern.
    ///
    /// # Panics
    ///
    /// Panics if the regex pattern is invalid.
    #[must_use]
    pub fn new(field: &'static str, description: &'static str, pattern: &str) -> Self {
        Self {
            field,
            description,
            regex: Regex::new(pattern).expect("Invalid regex pattern"),
        }
    }

    /// Check if the value matches this pattern.
    #[must_use]
    pub fn matches(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }

    /// Validate an optional value; `None` and blank strings pass.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if a non-blank value does not match.
    pub fn check(&self, value: Option<&str>) -> Result<()> {
        match value.map(str::trim) {
            Some(v) if !v.is_empty() && !self.matches(v) => {
                Err(Error::validation(self.field, self.description))
            }
            _ => Ok(()),
        }
    }
}

/// Phone numbers: optional leading `+`, then digits, spaces or dashes.
#[must_use]
pub fn phone() -> &'static FieldPattern {
    static PATTERN: OnceLock<FieldPattern> = OnceLock::new();
    PATTERN.get_or_init(|| {
        FieldPattern::new(
            "phone",
            "expected 6 to 20 digits, spaces or dashes",
            r"^\+?[0-9][0-9 -]{5,19}$",
        )
    })
}

/// Resident ID card numbers: 17 digits and a digit or `X` check character.
#[must_use]
pub fn id_card() -> &'static FieldPattern {
    static PATTERN: OnceLock<FieldPattern> = OnceLock::new();
    PATTERN.get_or_init(|| {
        FieldPattern::new(
            "idCard",
            "expected 18 characters: 17 digits and a digit or X",
            r"^[0-9]{17}[0-9Xx]$",
        )
    })
}

/// Medical card numbers as printed by the hospital.
#[must_use]
pub fn medical_card_no() -> &'static FieldPattern {
    static PATTERN: OnceLock<FieldPattern> = OnceLock::new();
    PATTERN.get_or_init(|| {
        FieldPattern::new(
            "medicalCardNo",
            "expected 4 to 32 letters, digits or dashes",
            r"^[A-Za-z0-9-]{4,32}$",
        )
    })
}

/// Keep the first `head` and last `tail` characters, star out the rest.
fn mask(value: &str, head: usize, tail: usize) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= head + tail {
        return value.to_string();
    }
    let hidden = chars.len() - head - tail;
    chars[..head]
        .iter()
        .chain(std::iter::repeat(&'*').take(hidden))
        .chain(chars[chars.len() - tail..].iter())
        .collect()
}

/// Mask an ID card number for display, e.g. `1101************34`.
#[must_use]
pub fn mask_id_card(value: &str) -> String {
    mask(value, 4, 2)
}

/// Mask a phone number for display, e.g. `138****5678`.
#[must_use]
pub fn mask_phone(value: &str) -> String {
    mask(value, 3, 4)
}
