//! Velocity, acceleration and jerk profiles of a pointer path.

use crate::db::models::PointerSample;

use super::config::ExtractionConfig;

/// A 2-D quantity stamped with the time (seconds) of the later of the two
/// inputs it was derived from.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Stamped {
    t: f64,
    x: f64,
    y: f64,
}

impl Stamped {
    fn magnitude(&self) -> f64 {
        self.x.hypot(self.y)
    }
}

/// Magnitudes of the first three time derivatives of position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MotionProfile {
    /// Normalized units per second
    pub speeds: Vec<f64>,
    /// Normalized units per second squared
    pub accelerations: Vec<f64>,
    /// Normalized units per second cubed
    pub jerks: Vec<f64>,
}

/// Finite differences between consecutive entries. Steps whose elapsed time
/// is not positive are skipped.
fn differentiate(series: &[Stamped]) -> Vec<Stamped> {
    series
        .windows(2)
        .filter_map(|pair| {
            let dt = pair[1].t - pair[0].t;
            if dt <= 0.0 {
                return None;
            }
            Some(Stamped {
                t: pair[1].t,
                x: (pair[1].x - pair[0].x) / dt,
                y: (pair[1].y - pair[0].y) / dt,
            })
        })
        .collect()
}

pub fn motion_profile(samples: &[PointerSample]) -> MotionProfile {
    let positions: Vec<Stamped> = samples
        .iter()
        .map(|s| Stamped {
            t: s.t_ms / 1000.0,
            x: s.x,
            y: s.y,
        })
        .collect();

    let velocity = differentiate(&positions);
    let acceleration = differentiate(&velocity);
    let jerk = differentiate(&acceleration);

    MotionProfile {
        speeds: velocity.iter().map(Stamped::magnitude).collect(),
        accelerations: acceleration.iter().map(Stamped::magnitude).collect(),
        jerks: jerk.iter().map(Stamped::magnitude).collect(),
    }
}

/// Centered moving average; the window shrinks at both edges.
pub fn smooth(values: &[f64], window: usize) -> Vec<f64> {
    let half = window.max(1) / 2;
    (0..values.len())
        .map(|i| {
            let lo = i.saturating_sub(half);
            let hi = (i + half).min(values.len() - 1);
            let slice = &values[lo..=hi];
            slice.iter().sum::<f64>() / slice.len() as f64
        })
        .collect()
}

/// Strict local maxima of the smoothed speed profile that reach
/// `submovement_peak_ratio * peak_speed`.
pub fn count_submovements(
    speeds: &[f64],
    peak_speed: Option<f64>,
    config: &ExtractionConfig,
) -> u32 {
    let Some(peak) = peak_speed else {
        return 0;
    };

    let smoothed = smooth(speeds, config.smoothing_window);
    let floor = config.submovement_peak_ratio * peak;

    smoothed
        .windows(3)
        .filter(|w| w[1] > w[0] && w[1] > w[2] && w[1] >= floor)
        .count() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::Round;

    fn sample(t_ms: f64, x: f64, y: f64) -> PointerSample {
        PointerSample {
            round: Round::FIRST,
            t_ms,
            x,
            y,
            is_down: false,
            pointer_type: "mouse".into(),
        }
    }

    #[test]
    fn test_constant_velocity_profile() {
        let samples: Vec<_> = (0..5)
            .map(|i| sample(i as f64 * 25.0, i as f64 * 0.025, 0.0))
            .collect();
        let profile = motion_profile(&samples);

        assert_eq!(profile.speeds.len(), 4);
        assert_eq!(profile.accelerations.len(), 3);
        assert_eq!(profile.jerks.len(), 2);
        for speed in &profile.speeds {
            assert!((speed - 1.0).abs() < 1e-9);
        }
        for accel in &profile.accelerations {
            assert!(accel.abs() < 1e-9);
        }
    }

    #[test]
    fn test_zero_dt_steps_are_skipped() {
        let samples = vec![
            sample(0.0, 0.0, 0.0),
            sample(0.0, 0.5, 0.0),
            sample(100.0, 0.6, 0.0),
        ];
        let profile = motion_profile(&samples);
        assert_eq!(profile.speeds.len(), 1);
        assert!((profile.speeds[0] - 1.0).abs() < 1e-9);
        assert!(profile.accelerations.is_empty());
        assert!(profile.jerks.is_empty());
    }

    #[test]
    fn test_smooth_truncates_edges() {
        let smoothed = smooth(&[1.0, 2.0, 3.0, 4.0, 5.0], 5);
        assert!((smoothed[0] - 2.0).abs() < 1e-12);
        assert!((smoothed[2] - 3.0).abs() < 1e-12);
        assert!((smoothed[4] - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_smooth_empty() {
        assert!(smooth(&[], 5).is_empty());
    }

    #[test]
    fn test_two_peaks_counted() {
        let config = ExtractionConfig {
            smoothing_window: 1,
            ..ExtractionConfig::default()
        };
        let speeds = [0.0, 1.0, 0.2, 0.8, 0.0];
        assert_eq!(count_submovements(&speeds, Some(1.0), &config), 2);
    }

    #[test]
    fn test_small_peaks_ignored() {
        let config = ExtractionConfig {
            smoothing_window: 1,
            ..ExtractionConfig::default()
        };
        let speeds = [0.0, 1.0, 0.0, 0.1, 0.0];
        assert_eq!(count_submovements(&speeds, Some(1.0), &config), 1);
    }

    #[test]
    fn test_no_peak_speed_means_no_submovements() {
        let config = ExtractionConfig::default();
        assert_eq!(count_submovements(&[], None, &config), 0);
    }
}
