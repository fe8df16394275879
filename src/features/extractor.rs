//! Per-attempt feature extraction: timing, path geometry, kinematics and
//! Fitts'-law throughput from the pointer trace between spawn and click.

use thiserror::Error;

use crate::db::models::{FeatureSet, Fitts, Kinematics, PointerSample, Spatial, Target, Timing};

use super::{
    config::ExtractionConfig,
    kinematics::{count_submovements, motion_profile},
    overshoot::count_overshoots,
    stats::{finite, max, mean, population_variance, ratio, rms},
};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ExtractionError {
    #[error("non-finite value in {field}")]
    NonFiniteInput { field: &'static str },
    #[error("click at {click_t_ms}ms precedes spawn at {spawn_t_ms}ms")]
    InvertedWindow { spawn_t_ms: f64, click_t_ms: f64 },
}

/// The spawn/click window of one attempt and the context it needs.
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptWindow {
    pub spawn_t_ms: f64,
    pub click_t_ms: f64,
    pub target: Target,
    pub prev_click_t_ms: Option<f64>,
}

impl AttemptWindow {
    fn validate(&self) -> Result<(), ExtractionError> {
        let checks = [
            ("spawn_t_ms", self.spawn_t_ms),
            ("click_t_ms", self.click_t_ms),
            ("target.x", self.target.x),
            ("target.y", self.target.y),
            ("target.radius", self.target.radius),
        ];
        for (field, value) in checks {
            if !value.is_finite() {
                return Err(ExtractionError::NonFiniteInput { field });
            }
        }
        if self.click_t_ms < self.spawn_t_ms {
            return Err(ExtractionError::InvertedWindow {
                spawn_t_ms: self.spawn_t_ms,
                click_t_ms: self.click_t_ms,
            });
        }
        Ok(())
    }

    fn timing(&self) -> Timing {
        Timing {
            reaction_time_ms: finite(self.click_t_ms - self.spawn_t_ms),
            movement_time_ms: None,
            inter_tap_ms: self
                .prev_click_t_ms
                .and_then(|prev| finite(self.click_t_ms - prev)),
        }
    }
}

/// Stateless feature extractor. Same inputs always produce the same output.
#[derive(Debug, Clone, Default)]
pub struct FeatureExtractor {
    pub config: ExtractionConfig,
}

impl FeatureExtractor {
    pub fn new(config: ExtractionConfig) -> Self {
        Self { config }
    }

    pub fn extract(
        &self,
        samples: &[PointerSample],
        window: &AttemptWindow,
    ) -> Result<FeatureSet, ExtractionError> {
        window.validate()?;

        let segment = select_segment(samples, window.spawn_t_ms, window.click_t_ms)?;
        let mut timing = window.timing();

        if segment.len() < self.config.min_segment_samples {
            return Ok(FeatureSet {
                timing,
                ..FeatureSet::default()
            });
        }

        let start = movement_start(&segment, self.config.movement_start_threshold);
        let moving = &segment[start..];
        // `moving` is never empty: `start` indexes into `segment`.
        let first = &moving[0];
        let last = &moving[moving.len() - 1];

        timing.movement_time_ms = finite(last.t_ms - first.t_ms);

        let path_length: f64 = moving
            .windows(2)
            .map(|pair| pair[0].distance_to_sample(&pair[1]))
            .sum();
        let target = &window.target;
        let direct = first.distance_to(target.x, target.y);

        let spatial = Spatial {
            error_dist_norm: ratio(last.distance_to(target.x, target.y), target.radius),
            path_length_norm: finite(path_length),
            direct_dist_norm: finite(direct),
            straightness: ratio(direct, path_length),
        };

        let profile = motion_profile(moving);
        let peak_speed = max(&profile.speeds);
        let kinematics = Kinematics {
            mean_speed: mean(&profile.speeds),
            peak_speed,
            speed_var: population_variance(&profile.speeds),
            mean_accel: mean(&profile.accelerations),
            peak_accel: max(&profile.accelerations),
            jerk_rms: rms(&profile.jerks),
            submovement_count: Some(count_submovements(&profile.speeds, peak_speed, &self.config)),
            overshoot_count: Some(count_overshoots(moving, target, &self.config)),
        };

        let fitts = self.fitts(direct, target.radius, timing.movement_time_ms);

        Ok(FeatureSet {
            timing,
            spatial,
            kinematics,
            fitts,
        })
    }

    fn fitts(&self, distance: f64, radius: f64, movement_time_ms: Option<f64>) -> Fitts {
        let width = 2.0 * radius;
        let index_of_difficulty = if width > 0.0 {
            finite((distance / width + 1.0).log2())
        } else {
            None
        };
        let movement_time_secs = movement_time_ms
            .map(|ms| (ms / 1000.0).max(self.config.min_movement_time_secs));
        let throughput = match (index_of_difficulty, movement_time_secs) {
            (Some(id), Some(secs)) => ratio(id, secs),
            _ => None,
        };

        Fitts {
            distance: finite(distance),
            width: finite(width),
            index_of_difficulty,
            throughput,
        }
    }
}

/// Samples within `[spawn, click]`, ordered by timestamp.
fn select_segment(
    samples: &[PointerSample],
    spawn_t_ms: f64,
    click_t_ms: f64,
) -> Result<Vec<PointerSample>, ExtractionError> {
    let mut segment: Vec<PointerSample> = samples
        .iter()
        .filter(|s| s.t_ms >= spawn_t_ms && s.t_ms <= click_t_ms)
        .cloned()
        .collect();

    if segment.iter().any(|s| !s.is_finite()) {
        return Err(ExtractionError::NonFiniteInput { field: "sample" });
    }

    // Batches may land out of order; the sort is stable for equal stamps.
    segment.sort_by(|a, b| a.t_ms.total_cmp(&b.t_ms));
    Ok(segment)
}

/// Index of the sample just before the pointer first leaves a small radius
/// around where it started; 0 when it never does.
fn movement_start(segment: &[PointerSample], threshold: f64) -> usize {
    let Some(origin) = segment.first() else {
        return 0;
    };
    segment
        .iter()
        .position(|s| s.distance_to_sample(origin) > threshold)
        .map(|crossing| crossing.saturating_sub(1))
        .unwrap_or(0)
}
