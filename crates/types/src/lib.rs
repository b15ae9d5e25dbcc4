//! # Folio Types
//!
//! Validated domain types shared by the Folio crates.
//!
//! - [`Subdomain`]: the public identifier routing to a user's portfolio, including the
//!   system-generated temporary placeholder assigned at registration.
//! - [`LanguageMode`]: which of Arabic/English/both a portfolio shows publicly.

use rand::Rng;
use std::str::FromStr;

/// Shortest subdomain accepted.
pub const SUBDOMAIN_MIN_LEN: usize = 3;

/// Longest subdomain accepted. Temporary subdomains are truncated to this length.
pub const SUBDOMAIN_MAX_LEN: usize = 48;

/// Longest seed fragment kept when building a temporary subdomain.
const SEED_MAX_LEN: usize = 24;

const BASE36_DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Errors that can occur when creating validated domain types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypesError {
    /// The subdomain is shorter than [`SUBDOMAIN_MIN_LEN`]
    #[error("subdomain must be at least {SUBDOMAIN_MIN_LEN} characters")]
    SubdomainTooShort,
    /// The subdomain is longer than [`SUBDOMAIN_MAX_LEN`]
    #[error("subdomain must be at most {SUBDOMAIN_MAX_LEN} characters")]
    SubdomainTooLong,
    /// The subdomain contains characters outside `a-z`, `0-9` and `-`
    #[error("subdomain may only contain lowercase letters, digits and '-'")]
    SubdomainInvalidCharacters,
    /// The subdomain starts or ends with a hyphen
    #[error("subdomain cannot start or end with '-'")]
    SubdomainHyphenBoundary,
    /// The language mode is not one of `ar`, `en` or `both`
    #[error("unknown language mode: {0}")]
    UnknownLanguageMode(String),
}

/// A validated portfolio subdomain.
///
/// Input is trimmed and lowercased before validation, matching how the dashboard normalizes
/// what the user types before asking the server about availability.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Subdomain(String);

impl Subdomain {
    /// Parses and validates a user-supplied subdomain.
    ///
    /// # Errors
    ///
    /// Returns a [`TypesError`] describing the first rule the normalized input breaks.
    pub fn parse(input: impl AsRef<str>) -> Result<Self, TypesError> {
        let normalized = input.as_ref().trim().to_lowercase();

        if normalized.chars().count() < SUBDOMAIN_MIN_LEN {
            return Err(TypesError::SubdomainTooShort);
        }
        if normalized.chars().count() > SUBDOMAIN_MAX_LEN {
            return Err(TypesError::SubdomainTooLong);
        }
        if !normalized
            .bytes()
            .all(|b| matches!(b, b'a'..=b'z' | b'0'..=b'9' | b'-'))
        {
            return Err(TypesError::SubdomainInvalidCharacters);
        }
        if normalized.starts_with('-') || normalized.ends_with('-') {
            return Err(TypesError::SubdomainHyphenBoundary);
        }

        Ok(Self(normalized))
    }

    /// Generates a temporary subdomain from a seed such as the user's name or email.
    ///
    /// The result has the shape `temp-{seed}-{nonce}` where the nonce combines the current
    /// time in base36 with five random base36 characters.
    pub fn temporary(seed: &str) -> Self {
        let millis = u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0);
        let mut rng = rand::thread_rng();
        let random: String = (0..5)
            .map(|_| BASE36_DIGITS[rng.gen_range(0..BASE36_DIGITS.len())] as char)
            .collect();
        Self::temporary_with(seed, millis, &random)
    }

    /// Deterministic core of [`Subdomain::temporary`].
    pub fn temporary_with(seed: &str, millis: u64, random: &str) -> Self {
        let mut safe_seed = sanitize_subdomain_part(seed);
        if safe_seed.is_empty() {
            safe_seed = "user".to_string();
        }

        let mut value = format!("temp-{safe_seed}-{}-{random}", to_base36(millis));
        value.truncate(SUBDOMAIN_MAX_LEN);
        let value = value.trim_end_matches('-').to_string();

        Self(value)
    }

    /// Returns `true` for system-generated placeholders awaiting user confirmation.
    pub fn is_temporary(&self) -> bool {
        self.0.starts_with("temp-")
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Subdomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Subdomain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for Subdomain {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for Subdomain {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Subdomain::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Reduces arbitrary text to a fragment usable inside a subdomain.
///
/// Lowercases, drops everything outside `a-z0-9-`, trims hyphens from both ends and keeps at
/// most 24 characters.
pub fn sanitize_subdomain_part(value: &str) -> String {
    let filtered: String = value
        .to_lowercase()
        .chars()
        .filter(|c| matches!(c, 'a'..='z' | '0'..='9' | '-'))
        .collect();

    filtered
        .trim_matches('-')
        .chars()
        .take(SEED_MAX_LEN)
        .collect()
}

fn to_base36(mut n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while n > 0 {
        digits.push(BASE36_DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}

/// Portfolio-wide setting selecting which language is shown publicly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageMode {
    Ar,
    En,
    Both,
}

impl LanguageMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LanguageMode::Ar => "ar",
            LanguageMode::En => "en",
            LanguageMode::Both => "both",
        }
    }
}

impl FromStr for LanguageMode {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ar" => Ok(LanguageMode::Ar),
            "en" => Ok(LanguageMode::En),
            "both" => Ok(LanguageMode::Both),
            other => Err(TypesError::UnknownLanguageMode(other.to_string())),
        }
    }
}

impl std::fmt::Display for LanguageMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
