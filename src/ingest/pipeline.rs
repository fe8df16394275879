//! Attempt enrichment: run the extractor over each attempt of a batch and
//! degrade to timing-only features when there is nothing to analyse.

use std::fmt;

use anyhow::{bail, Result};

use crate::db::{
    models::{Attempt, AttemptFeatures, BasicFeatures, EnrichedAttempt, PointerSample, Timing},
    AppendOutcome, Database, UnknownSession,
};
use crate::features::{
    stats::finite, AttemptWindow, ExtractionError, FeatureExtractor,
};
use crate::{log_debug, log_warn};

const ENABLE_LOGS: bool = true;

/// Why an attempt received basic rather than full features.
#[derive(Debug, Clone, PartialEq)]
pub enum FallbackReason {
    NotClicked,
    NoSamples,
    Extraction(ExtractionError),
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackReason::NotClicked => write!(f, "no clicked outcome"),
            FallbackReason::NoSamples => write!(f, "no pointer samples"),
            FallbackReason::Extraction(err) => write!(f, "extraction failed: {err}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EnrichmentReport {
    pub enriched: Vec<EnrichedAttempt>,
    pub full: usize,
    pub basic: usize,
    pub append: Option<AppendOutcome>,
}

/// Timing from the attempt's own record: the client-reported reaction time
/// when present, otherwise click minus spawn. A negative reaction time is
/// dropped rather than stored.
pub fn basic_features(attempt: &Attempt, prev_click_t_ms: Option<f64>) -> BasicFeatures {
    let click_t_ms = attempt.click_time();
    let reaction_time_ms = attempt
        .click
        .rt_ms
        .and_then(finite)
        .or_else(|| click_t_ms.and_then(|click| finite(click - attempt.spawn_t_ms)))
        .filter(|rt| *rt >= 0.0);
    let inter_tap_ms = match (click_t_ms, prev_click_t_ms) {
        (Some(click), Some(prev)) => finite(click - prev),
        _ => None,
    };

    BasicFeatures {
        timing: Timing {
            reaction_time_ms,
            movement_time_ms: None,
            inter_tap_ms,
        },
    }
}

fn try_full(
    extractor: &FeatureExtractor,
    samples: &[PointerSample],
    attempt: &Attempt,
    prev_click_t_ms: Option<f64>,
) -> Result<AttemptFeatures, FallbackReason> {
    let click_t_ms = attempt.click_time().ok_or(FallbackReason::NotClicked)?;
    if samples.is_empty() {
        return Err(FallbackReason::NoSamples);
    }

    let window = AttemptWindow {
        spawn_t_ms: attempt.spawn_t_ms,
        click_t_ms,
        target: attempt.target,
        prev_click_t_ms,
    };
    extractor
        .extract(samples, &window)
        .map(AttemptFeatures::Full)
        .map_err(FallbackReason::Extraction)
}

/// Enrich one attempt. Never fails: anything the extractor cannot handle
/// yields basic features.
pub fn enrich_one(
    extractor: &FeatureExtractor,
    samples: &[PointerSample],
    attempt: Attempt,
    prev_click_t_ms: Option<f64>,
) -> EnrichedAttempt {
    let features = match try_full(extractor, samples, &attempt, prev_click_t_ms) {
        Ok(features) => features,
        Err(reason) => {
            match &reason {
                FallbackReason::Extraction(_) => log_warn!(
                    "attempt {} falls back to basic features: {reason}",
                    attempt.attempt_id
                ),
                _ => log_debug!(
                    "attempt {} falls back to basic features: {reason}",
                    attempt.attempt_id
                ),
            }
            AttemptFeatures::Basic(basic_features(&attempt, prev_click_t_ms))
        }
    };

    EnrichedAttempt { attempt, features }
}

/// Enrich a batch in arrival order, threading each attempt's click time into
/// the next one as its previous click.
pub fn enrich_batch(
    extractor: &FeatureExtractor,
    samples: &[PointerSample],
    attempts: Vec<Attempt>,
) -> Vec<EnrichedAttempt> {
    let mut prev_click_t_ms = None;
    attempts
        .into_iter()
        .map(|attempt| {
            let click_t_ms = attempt.click_time();
            let enriched = enrich_one(extractor, samples, attempt, prev_click_t_ms);
            prev_click_t_ms = click_t_ms;
            enriched
        })
        .collect()
}

/// Enrich a batch against the session's stored samples and append the result.
pub async fn enrich(
    db: &Database,
    extractor: &FeatureExtractor,
    session_id: &str,
    attempts: Vec<Attempt>,
    bucket_capacity: usize,
) -> Result<EnrichmentReport> {
    if !db.session_exists(session_id).await? {
        bail!(UnknownSession(session_id.to_string()));
    }

    let samples = db.get_samples(session_id, None).await?;
    let enriched = enrich_batch(extractor, &samples, attempts);
    let full = enriched.iter().filter(|a| a.features.is_full()).count();
    let basic = enriched.len() - full;

    let append = if enriched.is_empty() {
        None
    } else {
        Some(
            db.append_attempts(session_id, enriched.clone(), bucket_capacity)
                .await?,
        )
    };

    Ok(EnrichmentReport {
        enriched,
        full,
        basic,
        append,
    })
}
