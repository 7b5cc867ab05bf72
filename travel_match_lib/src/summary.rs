use serde::Serialize;

use crate::profile::TravelerProfile;
use crate::vibe::{DIMENSIONS, DIMENSION_COUNT};

/// A dimension average at or above this yields the dimension's tag.
pub const TAG_THRESHOLD: f64 = 3.8;

/// Average budget_max under this yields the "budget travelers" tag.
pub const BUDGET_TAG_CEILING: f64 = 800.0;

pub const YOUNG_AVERAGE_AGE: f64 = 25.0;
pub const SEASONED_AVERAGE_AGE: f64 = 40.0;

pub const TOP_INTEREST_COUNT: usize = 3;

/// The budget window every member of the group can live with. When the
/// members' ranges no longer leave a window, only the binding lower bound
/// is reported.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum SharedBudget {
    Window { low: i64, high: i64 },
    TightBudget { bound: i64 },
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct GroupStats {
    pub age_range: (i64, i64),
    pub shared_budget: SharedBudget,
    pub top_interests: Vec<String>,
}

fn dimension_averages(profiles: &[TravelerProfile]) -> [f64; DIMENSION_COUNT] {
    let mut sums = [0.0; DIMENSION_COUNT];
    for profile in profiles {
        for (sum, value) in sums.iter_mut().zip(profile.vibes.values()) {
            *sum += value as f64;
        }
    }
    sums.map(|sum| sum / profiles.len() as f64)
}

/// Descriptive tags for a group, derived from its members' profiles.
/// Empty input yields no tags; a group that triggers nothing specific is
/// tagged "balanced group".
pub fn vibe_tags(profiles: &[TravelerProfile]) -> Vec<String> {
    if profiles.is_empty() {
        return Vec::new();
    }

    let mut tags = Vec::new();
    let averages = dimension_averages(profiles);
    for (dimension, average) in DIMENSIONS.iter().zip(averages) {
        if average >= TAG_THRESHOLD {
            tags.push(dimension.tag.to_string());
        }
    }

    let count = profiles.len() as f64;
    let average_budget_max = profiles.iter().map(|p| p.budget_max as f64).sum::<f64>() / count;
    if average_budget_max < BUDGET_TAG_CEILING {
        tags.push("budget travelers".to_string());
    }

    let average_age = profiles.iter().map(|p| p.age as f64).sum::<f64>() / count;
    if average_age < YOUNG_AVERAGE_AGE {
        tags.push("young crowd".to_string());
    } else if average_age > SEASONED_AVERAGE_AGE {
        tags.push("seasoned travelers".to_string());
    }

    if tags.is_empty() {
        tags.push("balanced group".to_string());
    }
    tags
}

/// Aggregate numbers for a group: age span, the budget window shared by all
/// members, and the three dimensions the group scores highest on in total.
/// `None` for an empty group.
pub fn group_stats(profiles: &[TravelerProfile]) -> Option<GroupStats> {
    if profiles.is_empty() {
        return None;
    }

    let youngest = profiles.iter().map(|p| p.age).min()?;
    let oldest = profiles.iter().map(|p| p.age).max()?;

    let low = profiles.iter().map(|p| p.budget_min).max()?;
    let high = profiles.iter().map(|p| p.budget_max).min()?;
    let shared_budget = if low > high {
        SharedBudget::TightBudget { bound: low }
    } else {
        SharedBudget::Window { low, high }
    };

    let mut sums = [0u64; DIMENSION_COUNT];
    for profile in profiles {
        for (sum, value) in sums.iter_mut().zip(profile.vibes.values()) {
            *sum += value as u64;
        }
    }
    let mut ranked: Vec<(usize, u64)> = sums.iter().copied().enumerate().collect();
    // Stable sort keeps dimension order on ties.
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    let top_interests = ranked
        .iter()
        .take(TOP_INTEREST_COUNT)
        .map(|(index, _)| DIMENSIONS[*index].name.to_string())
        .collect();

    Some(GroupStats {
        age_range: (youngest, oldest),
        shared_budget,
        top_interests,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vibe::VibeScores;
    use chrono::Utc;

    fn profile(user_id: i64, age: i64, budget_min: i64, budget_max: i64) -> TravelerProfile {
        TravelerProfile::new(
            user_id,
            Utc::now(),
            age,
            budget_min,
            budget_max,
            vec!["Summer".to_string()],
            VibeScores::neutral(),
            None,
        )
    }

    #[test]
    fn empty_group_has_no_tags_and_no_stats() {
        assert!(vibe_tags(&[]).is_empty());
        assert!(group_stats(&[]).is_none());
    }

    #[test]
    fn neutral_group_is_balanced() {
        let profiles = vec![profile(1, 30, 500, 1500), profile(2, 32, 500, 1500)];
        assert_eq!(vibe_tags(&profiles), vec!["balanced group"]);
    }

    #[test]
    fn high_party_average_earns_a_tag() {
        let mut a = profile(1, 30, 500, 1500);
        let mut b = profile(2, 32, 500, 1500);
        a.vibes.party = 4;
        b.vibes.party = 4;
        assert_eq!(vibe_tags(&[a, b]), vec!["party animals"]);
    }

    #[test]
    fn average_just_below_threshold_earns_nothing() {
        let mut a = profile(1, 30, 500, 1500);
        let mut b = profile(2, 32, 500, 1500);
        a.vibes.party = 4;
        b.vibes.party = 3;
        // Average 3.5 stays under the 3.8 threshold.
        assert_eq!(vibe_tags(&[a, b]), vec!["balanced group"]);
    }

    #[test]
    fn low_budgets_tag_budget_travelers() {
        let profiles = vec![profile(1, 30, 200, 600), profile(2, 32, 300, 700)];
        assert_eq!(vibe_tags(&profiles), vec!["budget travelers"]);
    }

    #[test]
    fn age_cohort_tags() {
        let young = vec![profile(1, 20, 500, 1500), profile(2, 22, 500, 1500)];
        assert_eq!(vibe_tags(&young), vec!["young crowd"]);

        let seasoned = vec![profile(1, 45, 500, 1500), profile(2, 50, 500, 1500)];
        assert_eq!(vibe_tags(&seasoned), vec!["seasoned travelers"]);
    }

    #[test]
    fn tags_combine() {
        let mut a = profile(1, 20, 200, 600);
        let mut b = profile(2, 22, 300, 700);
        a.vibes.nature = 5;
        b.vibes.nature = 4;
        assert_eq!(
            vibe_tags(&[a, b]),
            vec!["nature lovers", "budget travelers", "young crowd"]
        );
    }

    #[test]
    fn stats_report_age_and_shared_budget() {
        let profiles = vec![profile(1, 24, 400, 1200), profile(2, 31, 600, 1800)];
        let stats = group_stats(&profiles).unwrap();
        assert_eq!(stats.age_range, (24, 31));
        assert_eq!(stats.shared_budget, SharedBudget::Window { low: 600, high: 1200 });
    }

    #[test]
    fn inverted_window_reports_tight_budget() {
        // Pairwise-overlapping ranges whose mutual window is empty.
        let profiles = vec![
            profile(1, 24, 0, 1000),
            profile(2, 25, 900, 2000),
            profile(3, 26, 0, 800),
        ];
        let stats = group_stats(&profiles).unwrap();
        assert_eq!(stats.shared_budget, SharedBudget::TightBudget { bound: 900 });
    }

    #[test]
    fn top_interests_rank_by_summed_score() {
        let mut a = profile(1, 30, 500, 1500);
        let mut b = profile(2, 32, 500, 1500);
        a.vibes.foodie = 5;
        b.vibes.foodie = 5;
        a.vibes.culture = 5;
        b.vibes.culture = 4;
        a.vibes.beach = 4;
        b.vibes.beach = 4;
        let stats = group_stats(&[a, b]).unwrap();
        assert_eq!(stats.top_interests, vec!["foodie", "culture", "beach"]);
    }
}
