use crate::profile::{periods_overlap, TravelerProfile};
use crate::vibe::DIMENSIONS;

/// Hard filter: more than this many years apart is never a match.
pub const MAX_AGE_GAP: i64 = 10;

pub const LOGISTICS_POINTS_MAX: u8 = 30;
pub const VIBE_POINTS_MAX: u8 = 70;

/// Result of scoring two travelers against each other. `Incompatible` is a
/// sentinel, not an error: callers skip the pair and move on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compatibility {
    Incompatible,
    Score(u8),
}

impl Compatibility {
    pub fn score(self) -> Option<u8> {
        match self {
            Compatibility::Incompatible => None,
            Compatibility::Score(value) => Some(value),
        }
    }
}

/// Scores two profiles on a 0-100 scale: up to 30 logistics points (age gap,
/// budget overlap, travel period) and up to 70 vibe points (weighted average
/// similarity over all vibe dimensions). Pure and symmetric.
pub fn score(a: &TravelerProfile, b: &TravelerProfile) -> Compatibility {
    let age_gap = (a.age - b.age).abs();
    if age_gap > MAX_AGE_GAP {
        return Compatibility::Incompatible;
    }
    if a.budget_max < b.budget_min || b.budget_max < a.budget_min {
        return Compatibility::Incompatible;
    }

    let logistics = age_points(age_gap) + 10 + period_points(a, b);

    let total = logistics as f64 + vibe_points(a, b);
    Compatibility::Score(total.floor() as u8)
}

fn age_points(age_gap: i64) -> u8 {
    match age_gap {
        0..=3 => 10,
        4..=5 => 7,
        6..=8 => 4,
        _ => 0,
    }
}

fn period_points(a: &TravelerProfile, b: &TravelerProfile) -> u8 {
    if periods_overlap(a, b) {
        10
    } else {
        0
    }
}

fn vibe_points(a: &TravelerProfile, b: &TravelerProfile) -> f64 {
    let a_values = a.vibes.values();
    let b_values = b.vibes.values();

    let mut weighted_similarity = 0.0;
    let mut total_weight = 0.0;
    for (dimension, (&va, &vb)) in DIMENSIONS.iter().zip(a_values.iter().zip(b_values.iter())) {
        // Answers are in [1,5], so the largest possible difference is 4.
        let similarity = 1.0 - (va as f64 - vb as f64).abs() / 4.0;
        weighted_similarity += dimension.weight() * similarity;
        total_weight += dimension.weight();
    }

    weighted_similarity / total_weight * VIBE_POINTS_MAX as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vibe::{VibeAnswers, VibeScores};
    use chrono::Utc;

    fn profile(user_id: i64, age: i64, budget_min: i64, budget_max: i64, periods: &[&str]) -> TravelerProfile {
        TravelerProfile::new(
            user_id,
            Utc::now(),
            age,
            budget_min,
            budget_max,
            periods.iter().map(|p| p.to_string()).collect(),
            VibeScores::neutral(),
            None,
        )
    }

    #[test]
    fn identical_profiles_score_one_hundred() {
        let a = profile(1, 25, 500, 1000, &["Summer"]);
        let b = profile(2, 25, 500, 1000, &["Summer"]);
        assert_eq!(score(&a, &b), Compatibility::Score(100));
    }

    #[test]
    fn age_gap_over_ten_is_incompatible() {
        let a = profile(1, 25, 500, 1000, &["Summer"]);
        let b = profile(2, 40, 500, 1000, &["Summer"]);
        assert_eq!(score(&a, &b), Compatibility::Incompatible);
        assert_eq!(score(&b, &a), Compatibility::Incompatible);
    }

    #[test]
    fn age_gap_of_exactly_ten_still_scores() {
        let a = profile(1, 25, 500, 1000, &["Summer"]);
        let b = profile(2, 35, 500, 1000, &["Summer"]);
        assert!(matches!(score(&a, &b), Compatibility::Score(_)));
    }

    #[test]
    fn disjoint_budgets_are_incompatible() {
        let a = profile(1, 25, 200, 400, &["Summer"]);
        let b = profile(2, 25, 500, 1000, &["Summer"]);
        assert_eq!(score(&a, &b), Compatibility::Incompatible);
        assert_eq!(score(&b, &a), Compatibility::Incompatible);
    }

    #[test]
    fn touching_budgets_overlap() {
        let a = profile(1, 25, 200, 500, &["Summer"]);
        let b = profile(2, 25, 500, 1000, &["Summer"]);
        assert!(matches!(score(&a, &b), Compatibility::Score(_)));
    }

    #[test]
    fn scores_stay_in_range() {
        // Worst still-compatible case: age gap 10, no shared period,
        // maximally different vibes.
        let mut a = profile(1, 25, 500, 1000, &["Summer"]);
        let mut b = profile(2, 35, 500, 1000, &["Winter"]);
        a.vibes = VibeScores::from_answers(VibeAnswers {
            adventure: Some(1),
            beach: Some(1),
            culture: Some(1),
            party: Some(1),
            nature: Some(1),
            comfort: Some(1),
            morning_person: Some(1),
            planning: Some(1),
            foodie: Some(1),
            activity: Some(1),
            chaos_tolerance: Some(1),
            city_trip: Some(1),
            road_trip: Some(1),
            backpacking: Some(1),
            local_contact: Some(1),
            digital_detox: Some(1),
            social_battery: Some(1),
            leader_role: Some(1),
            talkative: Some(1),
            sustainability: Some(1),
        });
        b.vibes = VibeScores::from_answers(VibeAnswers {
            adventure: Some(5),
            beach: Some(5),
            culture: Some(5),
            party: Some(5),
            nature: Some(5),
            comfort: Some(5),
            morning_person: Some(5),
            planning: Some(5),
            foodie: Some(5),
            activity: Some(5),
            chaos_tolerance: Some(5),
            city_trip: Some(5),
            road_trip: Some(5),
            backpacking: Some(5),
            local_contact: Some(5),
            digital_detox: Some(5),
            social_battery: Some(5),
            leader_role: Some(5),
            talkative: Some(5),
            sustainability: Some(5),
        });
        // Only the flat budget overlap points remain.
        assert_eq!(score(&a, &b), Compatibility::Score(10));
    }

    #[test]
    fn scoring_is_symmetric() {
        let mut a = profile(1, 22, 300, 900, &["Summer", "Autumn"]);
        let mut b = profile(2, 29, 700, 2000, &["Autumn"]);
        a.vibes = VibeScores::from_answers(VibeAnswers {
            adventure: Some(5),
            party: Some(2),
            foodie: Some(4),
            ..Default::default()
        });
        b.vibes = VibeScores::from_answers(VibeAnswers {
            adventure: Some(2),
            nature: Some(5),
            city_trip: Some(1),
            ..Default::default()
        });
        assert_eq!(score(&a, &b), score(&b, &a));
    }

    #[test]
    fn important_dimensions_weigh_more() {
        let base = profile(1, 25, 500, 1000, &["Summer"]);

        // Same total distance from the base profile, once on an important
        // dimension and once on a regular one.
        let mut important_mismatch = base.clone();
        important_mismatch.user_id = 2;
        important_mismatch.vibes.adventure = 5;

        let mut regular_mismatch = base.clone();
        regular_mismatch.user_id = 3;
        regular_mismatch.vibes.beach = 5;

        let important = score(&base, &important_mismatch).score().unwrap();
        let regular = score(&base, &regular_mismatch).score().unwrap();
        assert!(important <= regular);
    }

    #[test]
    fn flexible_period_earns_period_points() {
        let a = profile(1, 25, 500, 1000, &["Flexible"]);
        let b = profile(2, 25, 500, 1000, &["Winter"]);
        assert_eq!(score(&a, &b), Compatibility::Score(100));
    }

    #[test]
    fn mid_tier_age_gaps_lose_points() {
        let a = profile(1, 25, 500, 1000, &["Summer"]);
        let close = profile(2, 28, 500, 1000, &["Summer"]);
        let medium = profile(3, 30, 500, 1000, &["Summer"]);
        let far = profile(4, 33, 500, 1000, &["Summer"]);
        let edge = profile(5, 35, 500, 1000, &["Summer"]);

        assert_eq!(score(&a, &close), Compatibility::Score(100));
        assert_eq!(score(&a, &medium), Compatibility::Score(97));
        assert_eq!(score(&a, &far), Compatibility::Score(94));
        assert_eq!(score(&a, &edge), Compatibility::Score(90));
    }
}
