//! Spawn selector
//!
//! Decides, once per beat, how many slots light up and what each one holds.
//! Every probability comes from [`SpawnTuning`] rule tables, and every random
//! draw goes through [`RandomSource`] so tests can script or seed it.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::state::TargetKind;
use crate::consts::SLOT_COUNT;
use crate::tuning::{SpawnTuning, chance_for};

/// Random draws the selector needs
pub trait RandomSource {
    /// Uniform value in `[0, 1)`
    fn unit(&mut self) -> f64;
    /// Uniform index in `[0, len)`; `len` is never 0
    fn index(&mut self, len: usize) -> usize;
}

impl<R: Rng + ?Sized> RandomSource for R {
    fn unit(&mut self) -> f64 {
        self.random::<f64>()
    }

    fn index(&mut self, len: usize) -> usize {
        self.random_range(0..len)
    }
}

/// One planned target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnEntry {
    pub slot: u8,
    pub kind: TargetKind,
    /// Starts unsafe and flips safe partway through the beat
    pub deferred_safety: bool,
}

/// Targets for one beat, in pick order
pub type SpawnPlan = Vec<SpawnEntry>;

/// How many targets this beat shows (1, 2 or 3)
pub fn target_count(score: u64, tuning: &SpawnTuning, rng: &mut impl RandomSource) -> usize {
    let triple = chance_for(&tuning.triple, score);
    if rng.unit() < triple {
        return 3;
    }
    let double = tuning.double.at(score).min(tuning.double.high_chance);
    if rng.unit() < double { 2 } else { 1 }
}

/// Pick `count` distinct slots uniformly without replacement
pub fn pick_slots(count: usize, rng: &mut impl RandomSource) -> Vec<u8> {
    let mut available: Vec<u8> = (0..SLOT_COUNT as u8).collect();
    let mut picks = Vec::with_capacity(count);
    while picks.len() < count && !available.is_empty() {
        let idx = rng.index(available.len());
        picks.push(available.remove(idx));
    }
    picks
}

/// Special kind for this beat, if any (one shared roll over cumulative bands)
pub fn roll_special(
    score: u64,
    tuning: &SpawnTuning,
    rng: &mut impl RandomSource,
) -> Option<TargetKind> {
    if score < tuning.special_unlock_score {
        return None;
    }
    let roll = rng.unit();
    let mut ceiling = 0.0;
    for band in &tuning.special_bands {
        ceiling += chance_for(&band.chances, score);
        if roll < ceiling {
            return Some(band.kind);
        }
    }
    None
}

/// Build the full spawn plan for a beat
pub fn select_spawn(score: u64, tuning: &SpawnTuning, rng: &mut impl RandomSource) -> SpawnPlan {
    let count = target_count(score, tuning, rng);
    let slots = pick_slots(count, rng);

    let mut kinds = vec![TargetKind::Normal; slots.len()];

    let special_index = match roll_special(score, tuning, rng) {
        Some(kind) if !slots.is_empty() => {
            let idx = rng.index(slots.len());
            kinds[idx] = kind;
            Some(idx)
        }
        _ => None,
    };

    if score >= tuning.decoy_unlock_score {
        let eligible: Vec<usize> = (0..slots.len())
            .filter(|&i| Some(i) != special_index)
            .collect();
        if rng.unit() < chance_for(&tuning.decoy, score) && !eligible.is_empty() {
            let idx = eligible[rng.index(eligible.len())];
            kinds[idx] = TargetKind::Decoy;
        }
    }

    slots
        .into_iter()
        .zip(kinds)
        .map(|(slot, kind)| SpawnEntry {
            slot,
            kind,
            deferred_safety: kind == TargetKind::Decoy,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;
    use std::collections::VecDeque;

    /// Replays fixed draws; indices are reduced modulo `len`
    struct Scripted {
        units: VecDeque<f64>,
        indices: VecDeque<usize>,
    }

    impl Scripted {
        fn new(units: &[f64], indices: &[usize]) -> Self {
            Self {
                units: units.iter().copied().collect(),
                indices: indices.iter().copied().collect(),
            }
        }
    }

    impl RandomSource for Scripted {
        fn unit(&mut self) -> f64 {
            self.units.pop_front().unwrap_or(0.99)
        }

        fn index(&mut self, len: usize) -> usize {
            self.indices.pop_front().unwrap_or(0) % len
        }
    }

    fn count_kind(plan: &SpawnPlan, kind: TargetKind) -> usize {
        plan.iter().filter(|e| e.kind == kind).count()
    }

    #[test]
    fn test_low_score_is_single_normal() {
        let tuning = SpawnTuning::default();
        let mut rng = Scripted::new(&[0.0, 0.0, 0.0, 0.0], &[7]);
        let plan = select_spawn(0, &tuning, &mut rng);
        assert_eq!(
            plan,
            vec![SpawnEntry {
                slot: 7,
                kind: TargetKind::Normal,
                deferred_safety: false,
            }]
        );
    }

    #[test]
    fn test_triple_with_heal_and_decoy() {
        let tuning = SpawnTuning::default();
        // triple roll, special roll (heal), decoy roll
        let mut rng = Scripted::new(&[0.1, 0.05, 0.1], &[0, 0, 0, 1, 0]);
        let plan = select_spawn(150, &tuning, &mut rng);

        let slots: Vec<u8> = plan.iter().map(|e| e.slot).collect();
        assert_eq!(slots, vec![0, 1, 2]);
        assert_eq!(plan[1].kind, TargetKind::Heal);
        assert_eq!(plan[0].kind, TargetKind::Decoy);
        assert!(plan[0].deferred_safety);
        assert_eq!(plan[2].kind, TargetKind::Normal);
        assert!(!plan[1].deferred_safety);
    }

    #[test]
    fn test_special_bands_are_cumulative() {
        let tuning = SpawnTuning::default();
        let heal = roll_special(60, &tuning, &mut Scripted::new(&[0.09], &[]));
        let harm = roll_special(60, &tuning, &mut Scripted::new(&[0.35], &[]));
        let none = roll_special(60, &tuning, &mut Scripted::new(&[0.45], &[]));
        assert_eq!(heal, Some(TargetKind::Heal));
        assert_eq!(harm, Some(TargetKind::Harm));
        assert_eq!(none, None);

        // Heal chance drops at very high score, so the same roll becomes harm
        let reduced = roll_special(400, &tuning, &mut Scripted::new(&[0.09], &[]));
        assert_eq!(reduced, Some(TargetKind::Harm));
    }

    #[test]
    fn test_single_special_leaves_no_room_for_decoy() {
        let tuning = SpawnTuning::default();
        // single target, harm roll, decoy roll would hit
        let mut rng = Scripted::new(&[0.99, 0.99, 0.2, 0.0], &[4, 0]);
        let plan = select_spawn(60, &tuning, &mut rng);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].kind, TargetKind::Harm);
    }

    #[test]
    fn test_double_chance_gates_pair() {
        let tuning = SpawnTuning::default();
        assert_eq!(target_count(9, &tuning, &mut Scripted::new(&[0.9, 0.0], &[])), 1);
        assert_eq!(target_count(10, &tuning, &mut Scripted::new(&[0.9, 0.59], &[])), 2);
        assert_eq!(target_count(10, &tuning, &mut Scripted::new(&[0.9, 0.61], &[])), 1);
        assert_eq!(target_count(30, &tuning, &mut Scripted::new(&[0.9, 0.79], &[])), 2);
    }

    #[test]
    fn test_decoy_rate_roughly_matches_tuning() {
        let tuning = SpawnTuning::default();
        let mut rng = Pcg32::seed_from_u64(7);
        let beats = 4000;
        let with_decoy = (0..beats)
            .filter(|_| count_kind(&select_spawn(20, &tuning, &mut rng), TargetKind::Decoy) == 1)
            .count();
        let rate = with_decoy as f64 / beats as f64;
        assert!((rate - 0.35).abs() < 0.05, "decoy rate {rate}");
    }

    proptest! {
        #[test]
        fn plans_are_well_formed(seed in any::<u64>(), score in 0u64..1000) {
            let tuning = SpawnTuning::default();
            let mut rng = Pcg32::seed_from_u64(seed);
            let plan = select_spawn(score, &tuning, &mut rng);

            prop_assert!((1..=3).contains(&plan.len()));
            let mut slots: Vec<u8> = plan.iter().map(|e| e.slot).collect();
            prop_assert!(slots.iter().all(|&s| (s as usize) < SLOT_COUNT));
            slots.sort_unstable();
            slots.dedup();
            prop_assert_eq!(slots.len(), plan.len());

            prop_assert!(count_kind(&plan, TargetKind::Decoy) <= 1);
            let specials = plan.iter().filter(|e| e.kind.is_special()).count();
            prop_assert!(specials <= 1);
            for entry in &plan {
                prop_assert_eq!(entry.deferred_safety, entry.kind == TargetKind::Decoy);
            }
        }

        #[test]
        fn locked_kinds_never_spawn(seed in any::<u64>(), score in 0u64..15) {
            let tuning = SpawnTuning::default();
            let mut rng = Pcg32::seed_from_u64(seed);
            let plan = select_spawn(score, &tuning, &mut rng);
            prop_assert!(plan.iter().all(|e| e.kind == TargetKind::Normal));
        }

        #[test]
        fn no_specials_before_unlock(seed in any::<u64>(), score in 15u64..50) {
            let tuning = SpawnTuning::default();
            let mut rng = Pcg32::seed_from_u64(seed);
            let plan = select_spawn(score, &tuning, &mut rng);
            prop_assert!(plan.iter().all(|e| !e.kind.is_special()));
        }
    }
}
