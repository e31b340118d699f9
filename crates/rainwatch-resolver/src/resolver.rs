//! Location resolver: fan out to every source, then rank what came back.

use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rainwatch_core::ResolverConfig;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::instrument;

use crate::decay::{effective_confidence, is_stale};
use crate::error::ResolveError;
use crate::overnight;
use crate::sources::LocationSource;
use crate::types::{LocationObservation, RankedEstimate, ResolutionResult, SourceOutcome, SourceReport};

pub struct Resolver {
    sources: Vec<Arc<dyn LocationSource>>,
    adapter_timeout: Duration,
    overall_budget: Duration,
}

impl Resolver {
    pub fn new(adapter_timeout: Duration, overall_budget: Duration) -> Self {
        Self {
            sources: Vec::new(),
            adapter_timeout,
            overall_budget,
        }
    }

    pub fn from_config(config: &ResolverConfig) -> Self {
        Self::new(config.adapter_timeout(), config.overall_budget())
    }

    pub fn with_source(mut self, source: Arc<dyn LocationSource>) -> Self {
        self.sources.push(source);
        self
    }

    pub fn add_source(&mut self, source: Arc<dyn LocationSource>) {
        self.sources.push(source);
    }

    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Resolve the best current location estimate at `now`.
    #[instrument(skip(self), level = "info")]
    pub async fn resolve(&self, now: DateTime<Utc>) -> Result<ResolutionResult, ResolveError> {
        let (mut observations, reports) = self.gather(now).await;

        if !reports.is_empty() && !reports.iter().any(SourceReport::answered) {
            tracing::warn!("All {} location sources failed", reports.len());
            return Err(ResolveError::SourceUnavailable);
        }

        if let Some(inferred) = overnight::infer(&observations, now) {
            observations.push(inferred);
        }

        let (candidates, stale) = rank(observations, now);
        let best = candidates.first().cloned().ok_or_else(|| {
            tracing::info!("No usable location observations");
            ResolveError::NoLocationAvailable
        })?;

        tracing::info!(
            "Resolved to {} via {} (confidence {:.1}{})",
            best.place_name().unwrap_or("unnamed point"),
            best.source(),
            best.effective_confidence,
            if stale { ", stale" } else { "" }
        );

        Ok(ResolutionResult {
            best,
            candidates,
            is_stale: stale,
            sources: reports,
            resolved_at: now,
        })
    }

    /// Run every source concurrently. Each gets its own timeout and the whole
    /// fan-out is cut off at the overall budget; sources that have not
    /// answered by then are aborted and reported as timed out.
    async fn gather(&self, now: DateTime<Utc>) -> (Vec<LocationObservation>, Vec<SourceReport>) {
        let mut outcomes: Vec<Option<SourceOutcome>> = vec![None; self.sources.len()];
        let mut observations = Vec::new();
        let mut tasks = JoinSet::new();

        for (index, source) in self.sources.iter().enumerate() {
            let source = Arc::clone(source);
            let timeout = self.adapter_timeout;
            tasks.spawn(async move {
                let result = tokio::time::timeout(timeout, source.fetch(now)).await;
                (index, result)
            });
        }

        let deadline = Instant::now() + self.overall_budget;
        let mut budget_exceeded = false;

        loop {
            match tokio::time::timeout_at(deadline, tasks.join_next()).await {
                Ok(Some(Ok((index, result)))) => {
                    let name = self.sources[index].name();
                    let outcome = match result {
                        Ok(Ok(found)) => {
                            tracing::debug!("{}: {} observations", name, found.len());
                            let count = found.len();
                            observations.extend(found);
                            SourceOutcome::Returned { count }
                        }
                        Ok(Err(e)) => {
                            tracing::warn!("{} failed: {}", name, e);
                            SourceOutcome::Failed {
                                reason: e.to_string(),
                            }
                        }
                        Err(_) => {
                            tracing::warn!("{} timed out after {:?}", name, self.adapter_timeout);
                            SourceOutcome::TimedOut
                        }
                    };
                    outcomes[index] = Some(outcome);
                }
                Ok(Some(Err(e))) => tracing::warn!("Source task failed: {}", e),
                Ok(None) => break,
                Err(_) => {
                    tracing::warn!(
                        "Resolution budget of {:?} exhausted; abandoning {} sources",
                        self.overall_budget,
                        tasks.len()
                    );
                    budget_exceeded = true;
                    tasks.abort_all();
                    break;
                }
            }
        }

        let reports = self
            .sources
            .iter()
            .zip(outcomes)
            .map(|(source, outcome)| SourceReport {
                name: source.name().to_string(),
                outcome: outcome.unwrap_or_else(|| {
                    if budget_exceeded {
                        SourceOutcome::TimedOut
                    } else {
                        SourceOutcome::Failed {
                            reason: "source task aborted".to_string(),
                        }
                    }
                }),
            })
            .collect();

        (observations, reports)
    }
}

/// Order two candidates, best first: higher effective confidence, then more
/// recent observation, then source priority.
pub fn compare_candidates(a: &RankedEstimate, b: &RankedEstimate) -> Ordering {
    b.effective_confidence
        .total_cmp(&a.effective_confidence)
        .then_with(|| b.observed_at().cmp(&a.observed_at()))
        .then_with(|| b.source().priority().cmp(&a.source().priority()))
}

/// Filter, decay and sort observations. Returns the ranked candidates and
/// whether they all come from beyond the staleness window.
///
/// Observations dated after `now` are schedule hints and never candidates.
/// Stale observations are used only when nothing fresher exists.
pub fn rank(observations: Vec<LocationObservation>, now: DateTime<Utc>) -> (Vec<RankedEstimate>, bool) {
    let (stale, fresh): (Vec<_>, Vec<_>) = observations
        .into_iter()
        .filter(|o| o.observed_at <= now && o.coordinates.is_valid())
        .partition(|o| is_stale(o.observed_at, now));

    let (pool, is_stale) = if fresh.is_empty() {
        (stale, true)
    } else {
        (fresh, false)
    };

    let mut candidates: Vec<RankedEstimate> = pool
        .into_iter()
        .map(|observation| RankedEstimate {
            effective_confidence: effective_confidence(&observation, now),
            age_at_resolution: observation.age(now),
            observation,
        })
        .collect();
    candidates.sort_by(compare_candidates);

    let stale = is_stale && !candidates.is_empty();
    (candidates, stale)
}
