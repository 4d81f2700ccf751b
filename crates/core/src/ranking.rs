//! Deterministic import-priority ranking for sets.
//!
//! Import order decides which sets spend metered upstream credits first.
//! High-value vintage sets rank above modern chase sets, which rank above
//! everything else in recency order. The score is a pure function of
//! (name, recency index) so re-running an import plan always produces the
//! same order.

// ---------------------------------------------------------------------------
// Name lists
// ---------------------------------------------------------------------------

/// Vintage sets with the deepest graded markets. Matched as lowercase
/// substrings of the set name.
pub const HIGH_VALUE_VINTAGE: &[&str] = &[
    "base set",
    "jungle",
    "fossil",
    "team rocket",
    "gym heroes",
    "gym challenge",
    "neo genesis",
    "neo discovery",
];

/// Modern sets with active chase-card demand.
pub const MODERN_CHASE: &[&str] = &[
    "evolving skies",
    "hidden fates",
    "shining fates",
    "celebrations",
    "crown zenith",
    "151",
];

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// Tier bonus dominating any recency contribution.
const TIER_SPAN: i64 = 1_000_000;

/// Priority score for a set; higher imports first.
///
/// `recency_index` is the set's position in the upstream listing, newest
/// first. Within a tier, newer sets outrank older ones.
pub fn import_priority(name: &str, recency_index: usize) -> i64 {
    let lowered = name.to_lowercase();
    let tier: i64 = if HIGH_VALUE_VINTAGE.iter().any(|v| lowered.contains(v)) {
        2
    } else if MODERN_CHASE.iter().any(|c| lowered.contains(c)) {
        1
    } else {
        0
    };
    let recency = TIER_SPAN - 1 - (recency_index as i64).min(TIER_SPAN - 1);
    tier * TIER_SPAN + recency
}

/// Sort set names (paired with their recency index) into import order.
///
/// Ties are broken by the original index, so the order is total and stable.
pub fn rank_for_import<T>(sets: &mut [(T, String, usize)]) {
    sets.sort_by_key(|(_, name, idx)| (std::cmp::Reverse(import_priority(name, *idx)), *idx));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vintage_outranks_chase_outranks_rest() {
        let vintage = import_priority("Base Set", 50);
        let chase = import_priority("Evolving Skies", 3);
        let rest = import_priority("Temporal Forces", 0);
        assert!(vintage > chase, "vintage must outrank chase");
        assert!(chase > rest, "chase must outrank the remainder");
    }

    #[test]
    fn within_tier_newer_wins() {
        assert!(import_priority("Temporal Forces", 0) > import_priority("Lost Origin", 9));
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert_eq!(
            import_priority("BASE SET", 4),
            import_priority("base set", 4)
        );
    }

    #[test]
    fn ranking_is_deterministic() {
        let build = || {
            vec![
                (1, "Temporal Forces".to_string(), 0),
                (2, "Evolving Skies".to_string(), 12),
                (3, "Fossil".to_string(), 80),
                (4, "Lost Origin".to_string(), 9),
            ]
        };
        let mut a = build();
        let mut b = build();
        rank_for_import(&mut a);
        rank_for_import(&mut b);
        assert_eq!(a, b);
        let order: Vec<i32> = a.iter().map(|(id, _, _)| *id).collect();
        assert_eq!(order, vec![3, 2, 1, 4]);
    }
}
