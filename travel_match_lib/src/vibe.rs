use serde::{Deserialize, Serialize};

pub const DIMENSION_COUNT: usize = 20;

/// Neutral midpoint on the 1-5 answer scale, used for unanswered questions.
pub const NEUTRAL_SCORE: u8 = 3;

/// Static metadata for one vibe dimension: the name used in statistics,
/// the tag a group gets when its average on this dimension is high, and
/// whether the dimension carries extra weight in compatibility scoring.
pub struct Dimension {
    pub name: &'static str,
    pub tag: &'static str,
    pub important: bool,
}

impl Dimension {
    pub fn weight(&self) -> f64 {
        if self.important {
            1.5
        } else {
            1.0
        }
    }
}

/// Same order as `VibeScores::values`.
pub const DIMENSIONS: [Dimension; DIMENSION_COUNT] = [
    Dimension { name: "adventure",       tag: "adventure seekers",    important: true },
    Dimension { name: "beach",           tag: "beach lovers",         important: false },
    Dimension { name: "culture",         tag: "culture enthusiasts",  important: true },
    Dimension { name: "party",           tag: "party animals",        important: false },
    Dimension { name: "nature",          tag: "nature lovers",        important: true },
    Dimension { name: "comfort",         tag: "comfort seekers",      important: true },
    Dimension { name: "morning person",  tag: "early birds",          important: false },
    Dimension { name: "planning",        tag: "meticulous planners",  important: false },
    Dimension { name: "foodie",          tag: "foodies",              important: false },
    Dimension { name: "activity",        tag: "sporty travelers",     important: false },
    Dimension { name: "chaos tolerance", tag: "go-with-the-flow",     important: false },
    Dimension { name: "city trips",      tag: "city trippers",        important: false },
    Dimension { name: "road trips",      tag: "road trippers",        important: false },
    Dimension { name: "backpacking",     tag: "backpackers",          important: false },
    Dimension { name: "local contact",   tag: "local explorers",      important: false },
    Dimension { name: "digital detox",   tag: "offline adventurers",  important: false },
    Dimension { name: "social battery",  tag: "social butterflies",   important: false },
    Dimension { name: "leader role",     tag: "natural leaders",      important: false },
    Dimension { name: "talkative",       tag: "chatterboxes",         important: false },
    Dimension { name: "sustainability",  tag: "eco-conscious",        important: false },
];

/// The answers to the twenty 1-5 vibe check questions of one traveler.
/// Always fully populated: unanswered questions are normalized to the
/// neutral midpoint when a profile is ingested, never later.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct VibeScores {
    pub adventure: u8,
    pub beach: u8,
    pub culture: u8,
    pub party: u8,
    pub nature: u8,
    pub comfort: u8,
    pub morning_person: u8,
    pub planning: u8,
    pub foodie: u8,
    pub activity: u8,
    pub chaos_tolerance: u8,
    pub city_trip: u8,
    pub road_trip: u8,
    pub backpacking: u8,
    pub local_contact: u8,
    pub digital_detox: u8,
    pub social_battery: u8,
    pub leader_role: u8,
    pub talkative: u8,
    pub sustainability: u8,
}

/// Raw intake form answers. Every question may be left blank.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default)]
pub struct VibeAnswers {
    pub adventure: Option<i64>,
    pub beach: Option<i64>,
    pub culture: Option<i64>,
    pub party: Option<i64>,
    pub nature: Option<i64>,
    pub comfort: Option<i64>,
    pub morning_person: Option<i64>,
    pub planning: Option<i64>,
    pub foodie: Option<i64>,
    pub activity: Option<i64>,
    pub chaos_tolerance: Option<i64>,
    pub city_trip: Option<i64>,
    pub road_trip: Option<i64>,
    pub backpacking: Option<i64>,
    pub local_contact: Option<i64>,
    pub digital_detox: Option<i64>,
    pub social_battery: Option<i64>,
    pub leader_role: Option<i64>,
    pub talkative: Option<i64>,
    pub sustainability: Option<i64>,
}

fn normalize(answer: Option<i64>) -> u8 {
    match answer {
        Some(value) => value.clamp(1, 5) as u8,
        None => NEUTRAL_SCORE,
    }
}

impl VibeScores {
    pub fn neutral() -> Self {
        Self::from_answers(VibeAnswers::default())
    }

    /// Single normalization point: blank answers become the neutral midpoint,
    /// out-of-range answers are clamped into [1,5].
    pub fn from_answers(answers: VibeAnswers) -> Self {
        Self {
            adventure: normalize(answers.adventure),
            beach: normalize(answers.beach),
            culture: normalize(answers.culture),
            party: normalize(answers.party),
            nature: normalize(answers.nature),
            comfort: normalize(answers.comfort),
            morning_person: normalize(answers.morning_person),
            planning: normalize(answers.planning),
            foodie: normalize(answers.foodie),
            activity: normalize(answers.activity),
            chaos_tolerance: normalize(answers.chaos_tolerance),
            city_trip: normalize(answers.city_trip),
            road_trip: normalize(answers.road_trip),
            backpacking: normalize(answers.backpacking),
            local_contact: normalize(answers.local_contact),
            digital_detox: normalize(answers.digital_detox),
            social_battery: normalize(answers.social_battery),
            leader_role: normalize(answers.leader_role),
            talkative: normalize(answers.talkative),
            sustainability: normalize(answers.sustainability),
        }
    }

    /// Scores in `DIMENSIONS` order.
    pub fn values(&self) -> [u8; DIMENSION_COUNT] {
        [
            self.adventure,
            self.beach,
            self.culture,
            self.party,
            self.nature,
            self.comfort,
            self.morning_person,
            self.planning,
            self.foodie,
            self.activity,
            self.chaos_tolerance,
            self.city_trip,
            self.road_trip,
            self.backpacking,
            self.local_contact,
            self.digital_detox,
            self.social_battery,
            self.leader_role,
            self.talkative,
            self.sustainability,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_answers_normalize_to_neutral() {
        let scores = VibeScores::from_answers(VibeAnswers::default());
        assert!(scores.values().iter().all(|&v| v == NEUTRAL_SCORE));
    }

    #[test]
    fn out_of_range_answers_are_clamped() {
        let answers = VibeAnswers {
            adventure: Some(9),
            beach: Some(0),
            culture: Some(-2),
            ..Default::default()
        };
        let scores = VibeScores::from_answers(answers);
        assert_eq!(scores.adventure, 5);
        assert_eq!(scores.beach, 1);
        assert_eq!(scores.culture, 1);
    }

    #[test]
    fn values_follow_dimension_order() {
        let answers = VibeAnswers {
            adventure: Some(1),
            sustainability: Some(5),
            ..Default::default()
        };
        let values = VibeScores::from_answers(answers).values();
        assert_eq!(values[0], 1);
        assert_eq!(values[DIMENSION_COUNT - 1], 5);
        assert_eq!(DIMENSIONS[0].name, "adventure");
        assert_eq!(DIMENSIONS[DIMENSION_COUNT - 1].name, "sustainability");
    }
}
