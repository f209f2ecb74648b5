//! Data-driven game balance
//!
//! Every number that shapes a run (tempo table, spawn odds, caps, ad cadence)
//! lives in [`Tuning`]. Defaults reproduce the shipped balance; hosts can load
//! overrides from JSON.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::TargetKind;

/// One step of the tempo table: scores in `[min_score, max_score]` play at `beat_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeatStep {
    pub min_score: u64,
    /// Inclusive upper bound; `None` means unbounded
    pub max_score: Option<u64>,
    pub beat_ms: u32,
}

impl BeatStep {
    pub fn contains(&self, score: u64) -> bool {
        score >= self.min_score && self.max_score.is_none_or(|max| score <= max)
    }
}

/// A score-gated chance. Tables of these are evaluated top-down: the first rule
/// whose `min_score` the score has reached wins.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChanceRule {
    pub min_score: u64,
    pub chance: f64,
}

/// Look up the chance for `score` in a rule table (0 when no rule applies)
pub fn chance_for(rules: &[ChanceRule], score: u64) -> f64 {
    rules
        .iter()
        .find(|rule| score >= rule.min_score)
        .map(|rule| rule.chance)
        .unwrap_or(0.0)
}

/// `chance_for` takes the first reached rule, so thresholds must fall
fn check_rule_order(rules: &[ChanceRule], table: &'static str) -> Result<(), TuningError> {
    if rules.windows(2).all(|w| w[0].min_score > w[1].min_score) {
        Ok(())
    } else {
        Err(TuningError::RuleOrder { table })
    }
}

/// Piecewise-linear double-spawn chance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DoubleChance {
    pub low_score: u64,
    pub low_chance: f64,
    pub high_score: u64,
    pub high_chance: f64,
}

impl DoubleChance {
    pub fn at(&self, score: u64) -> f64 {
        if score < self.low_score {
            return 0.0;
        }
        if score >= self.high_score {
            return self.high_chance;
        }
        let range = (self.high_score - self.low_score) as f64;
        let progress = (score - self.low_score) as f64 / range;
        self.low_chance + progress * (self.high_chance - self.low_chance)
    }
}

/// A special (Heal/Harm) band. Bands share one roll and stack cumulatively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialBand {
    pub kind: TargetKind,
    pub chances: Vec<ChanceRule>,
}

/// Spawn selector odds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnTuning {
    pub double: DoubleChance,
    pub triple: Vec<ChanceRule>,
    pub special_unlock_score: u64,
    pub special_bands: Vec<SpecialBand>,
    pub decoy_unlock_score: u64,
    pub decoy: Vec<ChanceRule>,
}

impl Default for SpawnTuning {
    fn default() -> Self {
        Self {
            double: DoubleChance {
                low_score: 10,
                low_chance: 0.6,
                high_score: 25,
                high_chance: 0.8,
            },
            triple: vec![ChanceRule {
                min_score: 150,
                chance: 0.5,
            }],
            special_unlock_score: 50,
            special_bands: vec![
                SpecialBand {
                    kind: TargetKind::Heal,
                    chances: vec![
                        ChanceRule {
                            min_score: 400,
                            chance: 0.03,
                        },
                        ChanceRule {
                            min_score: 0,
                            chance: 0.1,
                        },
                    ],
                },
                SpecialBand {
                    kind: TargetKind::Harm,
                    chances: vec![ChanceRule {
                        min_score: 0,
                        chance: 0.3,
                    }],
                },
            ],
            decoy_unlock_score: 15,
            decoy: vec![
                ChanceRule {
                    min_score: 200,
                    chance: 0.45,
                },
                ChanceRule {
                    min_score: 0,
                    chance: 0.35,
                },
            ],
        }
    }
}

/// Complete balance configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub starting_lives: u8,
    pub combo_max: u32,
    /// Combo hits for the 2x multiplier
    pub combo_tier_1: u32,
    /// Combo hits for the 3x multiplier
    pub combo_tier_2: u32,
    /// Fraction of the beat a decoy stays unsafe
    pub safe_phase_ratio: f64,
    pub beat_schedule: Vec<BeatStep>,
    pub spawn: SpawnTuning,
    pub games_between_interstitials: u32,
    pub interstitial_delay_ms: u64,
    pub max_continues: u32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            starting_lives: 5,
            combo_max: 10,
            combo_tier_1: 5,
            combo_tier_2: 10,
            safe_phase_ratio: 0.6,
            beat_schedule: vec![
                BeatStep {
                    min_score: 0,
                    max_score: Some(14),
                    beat_ms: 1100,
                },
                BeatStep {
                    min_score: 15,
                    max_score: Some(24),
                    beat_ms: 1000,
                },
                BeatStep {
                    min_score: 25,
                    max_score: Some(49),
                    beat_ms: 900,
                },
                BeatStep {
                    min_score: 50,
                    max_score: Some(149),
                    beat_ms: 800,
                },
                BeatStep {
                    min_score: 150,
                    max_score: None,
                    beat_ms: 700,
                },
            ],
            spawn: SpawnTuning::default(),
            games_between_interstitials: 3,
            interstitial_delay_ms: 500,
            max_continues: 3,
        }
    }
}

/// Reasons a tuning set is rejected
#[derive(Debug, Error, PartialEq)]
pub enum TuningError {
    #[error("starting lives must be at least 1")]
    NoLives,
    #[error("combo tiers must satisfy 0 < tier1 <= tier2 and combo_max > 0")]
    ComboTiers,
    #[error("safe phase ratio {0} must lie in (0, 1)")]
    SafePhaseRatio(f64),
    #[error("beat schedule is empty")]
    EmptySchedule,
    #[error("beat schedule step {index} does not continue from the previous step")]
    ScheduleGap { index: usize },
    #[error("beat schedule step {index} is slower than the step before it")]
    ScheduleSlowsDown { index: usize },
    #[error("beat schedule must end with an unbounded step")]
    ScheduleBounded,
    #[error("beat duration must be positive")]
    ZeroBeat,
    #[error("chance {0} is outside [0, 1]")]
    Chance(f64),
    #[error("special bands may only spawn heal or harm targets, got {0:?}")]
    SpecialKind(TargetKind),
    #[error("special band chances add up to {0}, above 1")]
    SpecialOverflow(f64),
    #[error("{table} rules must be listed by strictly descending min_score")]
    RuleOrder { table: &'static str },
    #[error("games between interstitials must be at least 1")]
    InterstitialCadence,
    #[error("invalid tuning JSON: {0}")]
    Json(String),
}

impl Tuning {
    /// Parse a tuning file and validate it
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning =
            serde_json::from_str(json).map_err(|e| TuningError::Json(e.to_string()))?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Check the invariants the simulation relies on
    pub fn validate(&self) -> Result<(), TuningError> {
        if self.starting_lives == 0 {
            return Err(TuningError::NoLives);
        }
        if self.combo_max == 0
            || self.combo_tier_1 == 0
            || self.combo_tier_1 > self.combo_tier_2
        {
            return Err(TuningError::ComboTiers);
        }
        // Safe flip must land strictly inside the beat
        if !(self.safe_phase_ratio > 0.0 && self.safe_phase_ratio < 1.0) {
            return Err(TuningError::SafePhaseRatio(self.safe_phase_ratio));
        }
        self.validate_schedule()?;

        let spawn = &self.spawn;
        let chances = [spawn.double.low_chance, spawn.double.high_chance]
            .into_iter()
            .chain(spawn.triple.iter().map(|r| r.chance))
            .chain(spawn.decoy.iter().map(|r| r.chance))
            .chain(
                spawn
                    .special_bands
                    .iter()
                    .flat_map(|b| b.chances.iter().map(|r| r.chance)),
            );
        for chance in chances {
            if !(0.0..=1.0).contains(&chance) {
                return Err(TuningError::Chance(chance));
            }
        }
        check_rule_order(&spawn.triple, "triple")?;
        check_rule_order(&spawn.decoy, "decoy")?;
        for band in &spawn.special_bands {
            check_rule_order(&band.chances, "special band")?;
        }
        for band in &spawn.special_bands {
            if !matches!(band.kind, TargetKind::Heal | TargetKind::Harm) {
                return Err(TuningError::SpecialKind(band.kind));
            }
        }
        // Worst case: every band at its largest chance
        let worst: f64 = spawn
            .special_bands
            .iter()
            .map(|b| b.chances.iter().map(|r| r.chance).fold(0.0, f64::max))
            .sum();
        if worst > 1.0 {
            return Err(TuningError::SpecialOverflow(worst));
        }

        if self.games_between_interstitials == 0 {
            return Err(TuningError::InterstitialCadence);
        }
        Ok(())
    }

    fn validate_schedule(&self) -> Result<(), TuningError> {
        let steps = &self.beat_schedule;
        let Some(last) = steps.last() else {
            return Err(TuningError::EmptySchedule);
        };
        if last.max_score.is_some() {
            return Err(TuningError::ScheduleBounded);
        }
        let mut expected_min = 0u64;
        let mut previous_ms = u32::MAX;
        for (index, step) in steps.iter().enumerate() {
            if step.beat_ms == 0 {
                return Err(TuningError::ZeroBeat);
            }
            if step.min_score != expected_min {
                return Err(TuningError::ScheduleGap { index });
            }
            if step.beat_ms > previous_ms {
                return Err(TuningError::ScheduleSlowsDown { index });
            }
            previous_ms = step.beat_ms;
            match step.max_score {
                Some(max) if max >= step.min_score => expected_min = max + 1,
                Some(_) => return Err(TuningError::ScheduleGap { index }),
                None if index + 1 != steps.len() => {
                    return Err(TuningError::ScheduleGap { index: index + 1 });
                }
                None => {}
            }
        }
        Ok(())
    }

    /// Score multiplier for the given combo count
    pub fn combo_multiplier(&self, hits: u32) -> u64 {
        if hits >= self.combo_tier_2 {
            3
        } else if hits >= self.combo_tier_1 {
            2
        } else {
            1
        }
    }
}
