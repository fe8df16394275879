//! Roll-up of enriched attempts into per-round statistics.

use crate::db::models::{EnrichedAttempt, FeatureMap, RoundCounts, RoundFeatures};
use crate::features::stats::{mean, median, population_std};

/// Attempt-level values that get aggregated per round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureKey {
    ReactionTime,
    MovementTime,
    InterTap,
    ErrorDist,
    PathLength,
    DirectDist,
    Straightness,
    MeanSpeed,
    PeakSpeed,
    SpeedVar,
    MeanAccel,
    PeakAccel,
    JerkRms,
    Submovements,
    Overshoots,
    IndexOfDifficulty,
    Throughput,
}

/// Aggregated over every attempt, with a median.
pub const TIMING_KEYS: [FeatureKey; 3] = [
    FeatureKey::ReactionTime,
    FeatureKey::MovementTime,
    FeatureKey::InterTap,
];

/// Aggregated over hits only.
pub const HIT_KEYS: [FeatureKey; 14] = [
    FeatureKey::ErrorDist,
    FeatureKey::PathLength,
    FeatureKey::DirectDist,
    FeatureKey::Straightness,
    FeatureKey::MeanSpeed,
    FeatureKey::PeakSpeed,
    FeatureKey::SpeedVar,
    FeatureKey::MeanAccel,
    FeatureKey::PeakAccel,
    FeatureKey::JerkRms,
    FeatureKey::Submovements,
    FeatureKey::Overshoots,
    FeatureKey::IndexOfDifficulty,
    FeatureKey::Throughput,
];

impl FeatureKey {
    pub fn name(self) -> &'static str {
        match self {
            FeatureKey::ReactionTime => "reactionTimeMs",
            FeatureKey::MovementTime => "movementTimeMs",
            FeatureKey::InterTap => "interTapMs",
            FeatureKey::ErrorDist => "errorDistNorm",
            FeatureKey::PathLength => "pathLengthNorm",
            FeatureKey::DirectDist => "directDistNorm",
            FeatureKey::Straightness => "straightness",
            FeatureKey::MeanSpeed => "meanSpeed",
            FeatureKey::PeakSpeed => "peakSpeed",
            FeatureKey::SpeedVar => "speedVar",
            FeatureKey::MeanAccel => "meanAccel",
            FeatureKey::PeakAccel => "peakAccel",
            FeatureKey::JerkRms => "jerkRMS",
            FeatureKey::Submovements => "submovementCount",
            FeatureKey::Overshoots => "overshootCount",
            FeatureKey::IndexOfDifficulty => "ID",
            FeatureKey::Throughput => "throughput",
        }
    }

    pub fn value(self, attempt: &EnrichedAttempt) -> Option<f64> {
        let timing = attempt.features.timing();
        match self {
            FeatureKey::ReactionTime => return timing.reaction_time_ms,
            FeatureKey::MovementTime => return timing.movement_time_ms,
            FeatureKey::InterTap => return timing.inter_tap_ms,
            _ => {}
        }

        let set = attempt.features.full()?;
        match self {
            FeatureKey::ErrorDist => set.spatial.error_dist_norm,
            FeatureKey::PathLength => set.spatial.path_length_norm,
            FeatureKey::DirectDist => set.spatial.direct_dist_norm,
            FeatureKey::Straightness => set.spatial.straightness,
            FeatureKey::MeanSpeed => set.kinematics.mean_speed,
            FeatureKey::PeakSpeed => set.kinematics.peak_speed,
            FeatureKey::SpeedVar => set.kinematics.speed_var,
            FeatureKey::MeanAccel => set.kinematics.mean_accel,
            FeatureKey::PeakAccel => set.kinematics.peak_accel,
            FeatureKey::JerkRms => set.kinematics.jerk_rms,
            FeatureKey::Submovements => set.kinematics.submovement_count.map(f64::from),
            FeatureKey::Overshoots => set.kinematics.overshoot_count.map(f64::from),
            FeatureKey::IndexOfDifficulty => set.fitts.index_of_difficulty,
            FeatureKey::Throughput => set.fitts.throughput,
            FeatureKey::ReactionTime | FeatureKey::MovementTime | FeatureKey::InterTap => None,
        }
    }
}

fn collect(key: FeatureKey, attempts: &[&EnrichedAttempt]) -> Vec<f64> {
    attempts.iter().filter_map(|a| key.value(a)).collect()
}

/// Statistics for one round, or `None` when the round has no attempts.
pub fn round_features(attempts: &[EnrichedAttempt]) -> Option<RoundFeatures> {
    if attempts.is_empty() {
        return None;
    }

    let all: Vec<&EnrichedAttempt> = attempts.iter().collect();
    let hits: Vec<&EnrichedAttempt> = attempts.iter().filter(|a| a.is_hit()).collect();

    let n_targets = all.len() as u32;
    let n_hits = hits.len() as u32;
    let counts = RoundCounts {
        n_targets,
        n_hits,
        n_misses: n_targets - n_hits,
        hit_rate: if n_targets > 0 {
            f64::from(n_hits) / f64::from(n_targets)
        } else {
            0.0
        },
    };

    let mut features = FeatureMap::new();
    features.insert("nAttempts".into(), Some(f64::from(counts.n_targets)));
    features.insert("nHits".into(), Some(f64::from(counts.n_hits)));
    features.insert("nMisses".into(), Some(f64::from(counts.n_misses)));
    features.insert("hitRate".into(), Some(counts.hit_rate));

    for key in TIMING_KEYS {
        let values = collect(key, &all);
        features.insert(format!("{}_mean", key.name()), mean(&values));
        features.insert(format!("{}_std", key.name()), population_std(&values));
        features.insert(format!("{}_median", key.name()), median(&values));
    }

    for key in HIT_KEYS {
        let values = collect(key, &hits);
        features.insert(format!("{}_mean", key.name()), mean(&values));
        features.insert(format!("{}_std", key.name()), population_std(&values));
    }

    Some(RoundFeatures { counts, features })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{
        Attempt, AttemptFeatures, BasicFeatures, Click, FeatureSet, Fitts, Round, Target, Timing,
    };

    fn attempt(id: usize, hit: bool, rt: f64, throughput: Option<f64>) -> EnrichedAttempt {
        let timing = Timing {
            reaction_time_ms: Some(rt),
            movement_time_ms: Some(rt - 100.0),
            inter_tap_ms: None,
        };
        let features = match throughput {
            Some(tp) => AttemptFeatures::Full(FeatureSet {
                timing,
                fitts: Fitts {
                    throughput: Some(tp),
                    ..Fitts::default()
                },
                ..FeatureSet::default()
            }),
            None => AttemptFeatures::Basic(BasicFeatures { timing }),
        };
        EnrichedAttempt {
            attempt: Attempt {
                round: Round::FIRST,
                attempt_id: format!("a{id}"),
                bubble_id: None,
                spawn_t_ms: id as f64 * 1000.0,
                target: Target {
                    x: 0.5,
                    y: 0.5,
                    radius: 0.05,
                },
                click: Click {
                    clicked: true,
                    hit,
                    ..Click::default()
                },
            },
            features,
        }
    }

    #[test]
    fn test_empty_round_is_none() {
        assert!(round_features(&[]).is_none());
    }

    #[test]
    fn test_counts_six_of_ten() {
        let attempts: Vec<_> = (0..10)
            .map(|i| attempt(i, i < 6, 400.0, Some(4.0)))
            .collect();
        let round = round_features(&attempts).unwrap();

        assert_eq!(
            round.counts,
            RoundCounts {
                n_targets: 10,
                n_hits: 6,
                n_misses: 4,
                hit_rate: 0.6,
            }
        );
        assert_eq!(round.features["nAttempts"], Some(10.0));
        assert_eq!(round.features["hitRate"], Some(0.6));
    }

    #[test]
    fn test_timing_uses_all_attempts_and_hits_drive_spatial() {
        let attempts = vec![
            attempt(0, true, 300.0, Some(2.0)),
            attempt(1, true, 500.0, Some(4.0)),
            attempt(2, false, 700.0, Some(100.0)),
        ];
        let round = round_features(&attempts).unwrap();

        assert_eq!(round.features["reactionTimeMs_mean"], Some(500.0));
        assert_eq!(round.features["reactionTimeMs_median"], Some(500.0));
        assert_eq!(round.features["throughput_mean"], Some(3.0));
        assert_eq!(round.features["throughput_std"], Some(1.0));
    }

    #[test]
    fn test_single_value_has_no_std() {
        let attempts = vec![attempt(0, true, 300.0, Some(2.0))];
        let round = round_features(&attempts).unwrap();
        assert_eq!(round.features["reactionTimeMs_std"], None);
        assert_eq!(round.features["throughput_std"], None);
    }

    #[test]
    fn test_basic_attempts_contribute_timing_only() {
        let attempts = vec![
            attempt(0, true, 300.0, None),
            attempt(1, true, 500.0, None),
        ];
        let round = round_features(&attempts).unwrap();
        assert_eq!(round.features["reactionTimeMs_mean"], Some(400.0));
        assert_eq!(round.features["throughput_mean"], None);
        assert_eq!(round.features["straightness_mean"], None);
    }

    #[test]
    fn test_recompute_is_identical() {
        let attempts: Vec<_> = (0..5)
            .map(|i| attempt(i, i % 2 == 0, 250.0 + i as f64 * 30.0, Some(i as f64)))
            .collect();
        assert_eq!(round_features(&attempts), round_features(&attempts));
    }
}
