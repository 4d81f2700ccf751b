//! Grading companies, raw conditions, and grade-key normalization.
//!
//! Upstream feeds are sloppy about grade naming: the same grade arrives as
//! `"PSA 10"`, `"psa-10"`, or `"PSA_10"` depending on the endpoint. Every
//! map keyed by grade in this codebase uses [`normalize_grade_key`] so that
//! cosmetic differences never create duplicate buckets.

use crate::error::CoreError;

/// Grade key used for ungraded cards in price maps and alerts.
pub const RAW_GRADE_KEY: &str = "raw";

// ---------------------------------------------------------------------------
// GradingCompany
// ---------------------------------------------------------------------------

/// The grading company an alert or collection item refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradingCompany {
    Psa,
    Bgs,
    Cgc,
    Sgc,
    /// Ungraded; priced by physical condition instead of a grade.
    Raw,
}

impl GradingCompany {
    /// String representation for database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            GradingCompany::Psa => "psa",
            GradingCompany::Bgs => "bgs",
            GradingCompany::Cgc => "cgc",
            GradingCompany::Sgc => "sgc",
            GradingCompany::Raw => "raw",
        }
    }

    /// Parse from a stored string, defaulting to `Raw` for unknown values.
    pub fn from_str(s: &str) -> Self {
        match s {
            "psa" => GradingCompany::Psa,
            "bgs" => GradingCompany::Bgs,
            "cgc" => GradingCompany::Cgc,
            "sgc" => GradingCompany::Sgc,
            _ => GradingCompany::Raw,
        }
    }
}

// ---------------------------------------------------------------------------
// Condition
// ---------------------------------------------------------------------------

/// Physical condition buckets for raw (ungraded) cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    NearMint,
    LightlyPlayed,
    ModeratelyPlayed,
    HeavilyPlayed,
}

impl Condition {
    /// String representation for database storage and cache keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::NearMint => "near_mint",
            Condition::LightlyPlayed => "lightly_played",
            Condition::ModeratelyPlayed => "moderately_played",
            Condition::HeavilyPlayed => "heavily_played",
        }
    }
}

// ---------------------------------------------------------------------------
// Grade-key normalization
// ---------------------------------------------------------------------------

/// Normalize an upstream grade key for use as a map key.
///
/// Lowercases and strips whitespace and separator punctuation (`-`, `_`,
/// `.`), so `"PSA 10"`, `"psa-10"`, and `"PSA_10"` all yield `"psa10"`.
/// Applying it twice is a no-op.
pub fn normalize_grade_key(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '-' | '_' | '.'))
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// Normalize a grade key, rejecting keys that are empty once stripped.
pub fn validate_grade_key(raw: &str) -> Result<String, CoreError> {
    let key = normalize_grade_key(raw);
    if key.is_empty() {
        return Err(CoreError::InvalidGradeKey(raw.to_string()));
    }
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    // -----------------------------------------------------------------------
    // Normalization
    // -----------------------------------------------------------------------

    #[test]
    fn cosmetic_variants_collapse() {
        assert_eq!(normalize_grade_key("PSA 10"), "psa10");
        assert_eq!(normalize_grade_key("psa-10"), "psa10");
        assert_eq!(normalize_grade_key("PSA_10"), "psa10");
    }

    #[test]
    fn half_grades_keep_their_digits() {
        assert_eq!(normalize_grade_key("BGS 9.5"), "bgs95");
    }

    #[test]
    fn normalization_is_idempotent() {
        for raw in ["PSA 10", "bgs-9.5", "CGC_8", "raw"] {
            let once = normalize_grade_key(raw);
            assert_eq!(normalize_grade_key(&once), once);
        }
    }

    #[test]
    fn empty_key_is_rejected() {
        assert_eq!(
            validate_grade_key(" - "),
            Err(CoreError::InvalidGradeKey(" - ".to_string()))
        );
    }

    // -----------------------------------------------------------------------
    // Enum round-trips
    // -----------------------------------------------------------------------

    #[test]
    fn grading_company_round_trip() {
        for company in [
            GradingCompany::Psa,
            GradingCompany::Bgs,
            GradingCompany::Cgc,
            GradingCompany::Sgc,
            GradingCompany::Raw,
        ] {
            assert_eq!(GradingCompany::from_str(company.as_str()), company);
        }
    }

    #[test]
    fn unknown_company_defaults_to_raw() {
        assert_eq!(GradingCompany::from_str("tag"), GradingCompany::Raw);
    }
}
