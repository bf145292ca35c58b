//! Shared types used across deskenum.
//!
//! This module defines the newtypes and enums passed between the client,
//! scanner and CLI crates.

use crate::error::DeskEnumError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Which session cookie carries the credential.
///
/// Customer portal accounts and tenant (agent) accounts are issued different
/// cookie names by the platform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionCookie {
    /// `customer.account.session.token`
    #[default]
    Customer,
    /// `tenant.session.token`
    Tenant,
}

impl SessionCookie {
    /// Cookie name sent on the wire.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Customer => "customer.account.session.token",
            Self::Tenant => "tenant.session.token",
        }
    }

    /// Pick the cookie kind from a `--tenant-session` style switch.
    #[must_use]
    pub fn from_tenant_flag(tenant: bool) -> Self {
        if tenant {
            Self::Tenant
        } else {
            Self::Customer
        }
    }
}

impl fmt::Display for SessionCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Newtype for service desk identifiers.
///
/// Service desk IDs are numeric strings as returned by the service desk API.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeskId(String);

impl DeskId {
    /// Create a new `DeskId` from a string.
    ///
    /// # Errors
    /// Returns error if the ID is not a non-empty run of ASCII digits.
    pub fn new(id: impl Into<String>) -> Result<Self, DeskEnumError> {
        let id = id.into();
        Self::validate(&id)?;
        Ok(Self(id))
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(id: &str) -> Result<(), DeskEnumError> {
        static DESK_REGEX: OnceLock<Regex> = OnceLock::new();
        let regex = DESK_REGEX.get_or_init(|| Regex::new(r"^[0-9]{1,20}$").expect("valid regex"));

        if regex.is_match(id) {
            Ok(())
        } else {
            Err(DeskEnumError::Validation(format!(
                "invalid service desk ID: must be numeric, got '{id}'"
            )))
        }
    }
}

impl fmt::Display for DeskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Tenant cloud identifier, required before any document search can run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CloudId(String);

impl CloudId {
    /// Create a new `CloudId`.
    ///
    /// # Errors
    /// Returns error if the value is empty or whitespace.
    pub fn new(id: impl Into<String>) -> Result<Self, DeskEnumError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(DeskEnumError::Validation(
                "cloud ID must not be empty".to_string(),
            ));
        }
        Ok(Self(id))
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CloudId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ordered set of characters appended to a query when it branches.
///
/// Duplicate characters are dropped (first occurrence kept) so that a
/// branching step never issues the same child query twice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alphabet(Vec<char>);

impl Alphabet {
    /// Build an alphabet from its characters.
    ///
    /// # Errors
    /// Returns error if no characters remain.
    pub fn new(chars: &str) -> Result<Self, DeskEnumError> {
        let mut seen = Vec::with_capacity(chars.len());
        for c in chars.chars() {
            if !seen.contains(&c) {
                seen.push(c);
            }
        }

        if seen.is_empty() {
            return Err(DeskEnumError::Validation(
                "alphabet must contain at least one character".to_string(),
            ));
        }
        Ok(Self(seen))
    }

    /// Characters in branching order.
    #[must_use]
    pub fn chars(&self) -> &[char] {
        &self.0
    }

    /// Number of children a branching step produces.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false for a constructed alphabet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Alphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in &self.0 {
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

/// The two alphabets used for branching: `layer1` at depth 0, `layer2` below.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlphabetPair {
    layer1: Alphabet,
    layer2: Alphabet,
}

impl AlphabetPair {
    /// Build both alphabets.
    pub fn new(layer1: &str, layer2: &str) -> Result<Self, DeskEnumError> {
        Ok(Self {
            layer1: Alphabet::new(layer1)?,
            layer2: Alphabet::new(layer2)?,
        })
    }

    /// Alphabet used to branch a result found at `depth`.
    #[must_use]
    pub fn for_depth(&self, depth: u32) -> &Alphabet {
        if depth == 0 {
            &self.layer1
        } else {
            &self.layer2
        }
    }
}

/// Identifier attached to one enumeration run for log correlation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RunId(String);

impl RunId {
    /// Create a new random `RunId` using UUID v4.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
