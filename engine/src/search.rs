//! Skill level to search limit policy.
//!
//! Weak settings search for a short, fixed time so the engine stays fast and
//! fallible. Strong settings search to a fixed depth, capped so a single
//! search never runs unbounded on a slow device.

use std::fmt;

pub const MIN_SKILL: u8 = 0;
pub const MAX_SKILL: u8 = 20;

/// Highest skill that is still bounded by time rather than depth.
const MAX_TIMED_SKILL: u8 = 5;
const BASE_MOVETIME_MS: u64 = 200;
const MOVETIME_STEP_MS: u64 = 140;
const BASE_DEPTH: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchLimit {
    /// Search for exactly this many milliseconds.
    MoveTime(u64),
    /// Search to this many plies.
    Depth(u8),
}

impl fmt::Display for SearchLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchLimit::MoveTime(ms) => write!(f, "movetime {}ms", ms),
            SearchLimit::Depth(plies) => write!(f, "depth {}", plies),
        }
    }
}

/// Everything the engine is told for one search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchParameters {
    /// Value for the engine's skill option, always within 0..=20.
    pub skill: u8,
    pub limit: SearchLimit,
}

impl SearchParameters {
    pub fn from_skill(level: i32) -> Self {
        let skill = clamp_skill(level);
        let s = u64::from(skill);
        let limit = if skill <= MAX_TIMED_SKILL {
            SearchLimit::MoveTime(BASE_MOVETIME_MS + MOVETIME_STEP_MS * s)
        } else {
            // floor(0.7 * s) without floating point
            SearchLimit::Depth(BASE_DEPTH + skill * 7 / 10)
        };
        Self { skill, limit }
    }
}

pub fn clamp_skill(level: i32) -> u8 {
    // The clamp keeps the value inside u8 range.
    level.clamp(i32::from(MIN_SKILL), i32::from(MAX_SKILL)) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_boundary_parameters() {
        assert_eq!(
            SearchParameters::from_skill(0).limit,
            SearchLimit::MoveTime(200)
        );
        assert_eq!(
            SearchParameters::from_skill(5).limit,
            SearchLimit::MoveTime(900)
        );
        assert_eq!(SearchParameters::from_skill(6).limit, SearchLimit::Depth(6));
        assert_eq!(SearchParameters::from_skill(20).limit, SearchLimit::Depth(16));
    }

    #[test]
    fn test_out_of_range_levels_clamp() {
        assert_eq!(SearchParameters::from_skill(-5), SearchParameters::from_skill(0));
        assert_eq!(SearchParameters::from_skill(99), SearchParameters::from_skill(20));
        assert_eq!(SearchParameters::from_skill(i32::MIN).skill, 0);
        assert_eq!(SearchParameters::from_skill(i32::MAX).skill, 20);
    }

    proptest! {
        #[test]
        fn prop_limits_stay_in_range(level in any::<i32>()) {
            let params = SearchParameters::from_skill(level);
            prop_assert!(params.skill <= MAX_SKILL);
            match params.limit {
                SearchLimit::MoveTime(ms) => {
                    prop_assert!(params.skill <= 5);
                    prop_assert!((200..=900).contains(&ms));
                }
                SearchLimit::Depth(plies) => {
                    prop_assert!(params.skill > 5);
                    prop_assert!((6..=16).contains(&plies));
                }
            }
        }

        #[test]
        fn prop_depth_never_decreases_with_skill(a in 6i32..=20, b in 6i32..=20) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let depth = |level| match SearchParameters::from_skill(level).limit {
                SearchLimit::Depth(d) => d,
                SearchLimit::MoveTime(_) => 0,
            };
            prop_assert!(depth(lo) <= depth(hi));
        }
    }
}
