//! Composition of round statistics into session-level features.

use crate::db::models::{FeatureMap, Round, RoundFeatures};

/// Prefixes each present round's features with `r{round}_` and adds
/// first-to-last trends for hit rate and mean throughput.
///
/// Trends compare the earliest and latest rounds that have a value, so a
/// missing middle round (or a round with no throughput) is skipped over.
pub fn session_features(rounds: &[(Round, Option<RoundFeatures>)]) -> FeatureMap {
    let mut ordered: Vec<(Round, &RoundFeatures)> = rounds
        .iter()
        .filter_map(|(round, features)| features.as_ref().map(|f| (*round, f)))
        .collect();
    ordered.sort_by_key(|(round, _)| *round);

    let mut session = FeatureMap::new();
    for (round, features) in &ordered {
        for (name, value) in &features.features {
            session.insert(format!("r{round}_{name}"), *value);
        }
    }

    let hit_rates: Vec<f64> = ordered
        .iter()
        .map(|(_, features)| features.counts.hit_rate)
        .collect();
    if let Some(trend) = trend(&hit_rates) {
        session.insert("hitRate_trend".into(), Some(trend));
    }

    let throughputs: Vec<f64> = ordered
        .iter()
        .filter_map(|(_, features)| features.features.get("throughput_mean").copied().flatten())
        .collect();
    if let Some(trend) = trend(&throughputs) {
        session.insert("throughput_trend".into(), Some(trend));
    }

    session
}

fn trend(values: &[f64]) -> Option<f64> {
    match values {
        [first, .., last] => Some(last - first),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::RoundCounts;

    fn round(n: u8) -> Round {
        Round::try_from(n).unwrap()
    }

    fn features(hit_rate: f64, throughput: Option<f64>) -> RoundFeatures {
        let mut map = FeatureMap::new();
        map.insert("hitRate".into(), Some(hit_rate));
        map.insert("throughput_mean".into(), throughput);
        RoundFeatures {
            counts: RoundCounts {
                n_targets: 10,
                n_hits: (hit_rate * 10.0).round() as u32,
                n_misses: 10 - (hit_rate * 10.0).round() as u32,
                hit_rate,
            },
            features: map,
        }
    }

    #[test]
    fn test_missing_middle_round() {
        let session = session_features(&[
            (round(1), Some(features(0.5, Some(2.0)))),
            (round(2), None),
            (round(3), Some(features(0.8, Some(3.5)))),
        ]);

        assert!((session["hitRate_trend"].unwrap() - 0.3).abs() < 1e-12);
        assert!((session["throughput_trend"].unwrap() - 1.5).abs() < 1e-12);
        assert_eq!(session["r1_hitRate"], Some(0.5));
        assert!(session.keys().all(|key| !key.starts_with("r2_")));
    }

    #[test]
    fn test_single_round_has_no_trend() {
        let session = session_features(&[(round(2), Some(features(0.5, Some(2.0))))]);
        assert!(!session.contains_key("hitRate_trend"));
        assert!(!session.contains_key("throughput_trend"));
        assert_eq!(session["r2_throughput_mean"], Some(2.0));
    }

    #[test]
    fn test_throughput_trend_skips_null_rounds() {
        let session = session_features(&[
            (round(1), Some(features(0.4, None))),
            (round(2), Some(features(0.6, Some(2.0)))),
            (round(3), Some(features(0.7, Some(3.0)))),
        ]);
        assert!((session["throughput_trend"].unwrap() - 1.0).abs() < 1e-12);
        assert!((session["hitRate_trend"].unwrap() - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_no_rounds_yields_empty_map() {
        let session = session_features(&[(round(1), None), (round(2), None), (round(3), None)]);
        assert!(session.is_empty());
    }
}
