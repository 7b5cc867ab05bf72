use serde::{Deserialize, Serialize};

use crate::compatibility::{score, Compatibility};
use crate::profile::{periods_overlap, TravelerProfile};

pub const GROUP_SIZE_CAP: usize = 20;

/// Minimum seed-to-candidate score for a candidate to be accepted.
pub const MIN_MATCH_SCORE: u8 = 50;

/// Minimum width of the running budget window after adding a member. Keeps
/// every finished group on at least this much mutual budget overlap.
pub const MIN_BUDGET_OVERLAP: i64 = 500;

/// Running intersection of all current members' budget ranges.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct BudgetWindow {
    pub low: i64,
    pub high: i64,
}

impl BudgetWindow {
    pub fn of(profile: &TravelerProfile) -> Self {
        Self {
            low: profile.budget_min,
            high: profile.budget_max,
        }
    }

    pub fn intersect(&self, profile: &TravelerProfile) -> Self {
        Self {
            low: self.low.max(profile.budget_min),
            high: self.high.min(profile.budget_max),
        }
    }

    /// Negative when the window is empty.
    pub fn width(&self) -> i64 {
        self.high - self.low
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct FormedGroup {
    pub group_id: i64,
    pub members: Vec<TravelerProfile>,
    pub budget_window: BudgetWindow,
}

/// Decides which pool member anchors the next group. The default pops the
/// front of the pool, which keeps formation runs reproducible; production
/// callers may plug in a randomized strategy for variety.
pub trait SeedStrategy: Send {
    /// Index into a non-empty pool.
    fn pick(&mut self, pool: &[TravelerProfile]) -> usize;
}

pub struct FirstAvailable;

impl SeedStrategy for FirstAvailable {
    fn pick(&mut self, _pool: &[TravelerProfile]) -> usize {
        0
    }
}

/// Greedily builds one group around a seed picked from `pool`, removing every
/// placed profile from the pool. Members are accepted best-score-first
/// (ties: pool order) as long as they share the seed's travel period and
/// keep the running budget window at least `MIN_BUDGET_OVERLAP` wide; a
/// member's linked buddy is pulled in alongside them under the same budget
/// rule, skipping the score check entirely.
///
/// Best-effort: a seed with no acceptable candidate still forms a group of
/// one. Returns `None` only on an empty pool.
pub fn form_group(
    group_id: i64,
    pool: &mut Vec<TravelerProfile>,
    seed_strategy: &mut dyn SeedStrategy,
) -> Option<FormedGroup> {
    if pool.is_empty() {
        return None;
    }

    let seed_index = seed_strategy.pick(pool);
    let seed = pool.remove(seed_index);
    let mut window = BudgetWindow::of(&seed);
    let mut members = vec![seed.clone()];

    try_add_buddy(&seed, pool, &mut window, &mut members);

    while members.len() < GROUP_SIZE_CAP && !pool.is_empty() {
        let mut best: Option<(usize, u8, BudgetWindow)> = None;
        for (index, candidate) in pool.iter().enumerate() {
            if !periods_overlap(&seed, candidate) {
                continue;
            }
            let narrowed = window.intersect(candidate);
            if narrowed.width() < MIN_BUDGET_OVERLAP {
                continue;
            }
            let Compatibility::Score(candidate_score) = score(&seed, candidate) else {
                continue;
            };
            // Strict comparison keeps the first candidate on ties.
            if best.map_or(true, |(_, best_score, _)| candidate_score > best_score) {
                best = Some((index, candidate_score, narrowed));
            }
        }

        let Some((index, best_score, narrowed)) = best else {
            break;
        };
        if best_score < MIN_MATCH_SCORE {
            break;
        }

        let member = pool.remove(index);
        window = narrowed;
        members.push(member.clone());

        if members.len() < GROUP_SIZE_CAP {
            try_add_buddy(&member, pool, &mut window, &mut members);
        }
    }

    Some(FormedGroup {
        group_id,
        members,
        budget_window: window,
    })
}

/// Pulls `member`'s linked buddy out of the pool if the buddy keeps the
/// budget window wide enough. On failure the buddy stays in the pool.
fn try_add_buddy(
    member: &TravelerProfile,
    pool: &mut Vec<TravelerProfile>,
    window: &mut BudgetWindow,
    members: &mut Vec<TravelerProfile>,
) {
    let Some(buddy_id) = member.linked_buddy_id else {
        return;
    };
    let Some(index) = pool.iter().position(|p| p.user_id == buddy_id) else {
        return;
    };

    let narrowed = window.intersect(&pool[index]);
    if narrowed.width() < MIN_BUDGET_OVERLAP {
        return;
    }

    *window = narrowed;
    members.push(pool.remove(index));
}
