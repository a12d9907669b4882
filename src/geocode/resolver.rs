//! Address resolver: request → best candidate → confidence policy → projection.
//!
//! The service ranks candidates best-first and that ranking is taken as a
//! contract: only candidate 0 is ever considered. A later candidate with a
//! higher score is reported as a contract breach, not re-ranked.

use super::config::{ConfigError, ResolverConfig};
use super::policy::Verdict;
use super::projection::{Proj4Projector, ProjectionError, Projector};
use super::request::CandidateRequest;
use super::transport::{GeocodeTransport, UreqTransport};
use super::types::{
    AddressQuery, CandidateSet, MatchWarning, ResolutionOutcome, ResolvedLocation,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Events a caller can observe while a query is resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    Request { url: String },
    CandidateSelected { x: f64, y: f64, score: f64 },
    Projected { longitude: f64, latitude: f64 },
    /// A candidate after index 0 scored higher than the one used.
    RankingViolation { index: usize, score: f64, selected_score: f64 },
    UnexpectedSpatialReference { expected: u32, reported: u32 },
}

pub type DiagnosticSink = Arc<dyn Fn(&Diagnostic) + Send + Sync>;

#[derive(Debug, Error)]
pub enum ResolverError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Projection(#[from] ProjectionError),
}

pub struct AddressResolver {
    config: ResolverConfig,
    transport: Arc<dyn GeocodeTransport>,
    projector: Arc<dyn Projector>,
    diagnostics: Option<DiagnosticSink>,
}

impl AddressResolver {
    /// Resolver backed by `ureq` and `proj4rs`.
    pub fn new(config: ResolverConfig) -> Result<Self, ResolverError> {
        let transport = UreqTransport::new(config.timeout(), config.user_agent.clone());
        let projector = Proj4Projector::new(&config.source_crs, &config.target_crs)?;
        Self::with_parts(config, Arc::new(transport), Arc::new(projector))
    }

    pub fn with_parts(
        config: ResolverConfig,
        transport: Arc<dyn GeocodeTransport>,
        projector: Arc<dyn Projector>,
    ) -> Result<Self, ResolverError> {
        config.validate()?;
        Ok(Self {
            config,
            transport,
            projector,
            diagnostics: None,
        })
    }

    pub fn with_diagnostics(mut self, sink: DiagnosticSink) -> Self {
        self.diagnostics = Some(sink);
        self
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve one address. Issues exactly one request and never retries.
    pub async fn resolve(&self, query: &AddressQuery) -> ResolutionOutcome {
        let request = CandidateRequest::new(&self.config.endpoint, query);
        debug!(url = request.url(), "submitting geocode request");
        self.emit(Diagnostic::Request {
            url: request.url().to_string(),
        });

        match self.transport.fetch_candidates(request.url()).await {
            Ok(set) => self.decide(set),
            Err(e) => {
                warn!(error = %e, "geocode request failed");
                ResolutionOutcome::TransportFailure {
                    status: e.status(),
                    message: e.to_string(),
                }
            }
        }
    }

    fn decide(&self, set: CandidateSet) -> ResolutionOutcome {
        if let (Some(expected), Some(reported)) = (self.config.expected_wkid, set.wkid) {
            if expected != reported {
                warn!(expected, reported, "service answered in an unexpected spatial reference");
                self.emit(Diagnostic::UnexpectedSpatialReference { expected, reported });
            }
        }

        let Some(best) = set.candidates.first() else {
            return ResolutionOutcome::NoCandidates;
        };
        self.check_ranking(&set);

        debug!(x = best.x, y = best.y, score = best.score, "best candidate");
        self.emit(Diagnostic::CandidateSelected {
            x: best.x,
            y: best.y,
            score: best.score,
        });

        let warning = match self.config.policy.evaluate(best.score) {
            Verdict::Reject => return ResolutionOutcome::LowConfidence { score: best.score },
            Verdict::AcceptWithWarning => Some(MatchWarning::LowConfidence { score: best.score }),
            Verdict::Accept => None,
        };

        let (longitude, latitude) = match self.projector.forward(best.x, best.y) {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "projection failed");
                return ResolutionOutcome::ProjectionFailed {
                    message: e.to_string(),
                };
            }
        };
        debug!(longitude, latitude, "projected coordinates");
        self.emit(Diagnostic::Projected { longitude, latitude });

        ResolutionOutcome::Resolved {
            location: ResolvedLocation {
                longitude,
                latitude,
                score: best.score,
                matched_address: best.address.clone(),
            },
            warning,
        }
    }

    fn check_ranking(&self, set: &CandidateSet) {
        let selected_score = set.candidates[0].score;
        let better = set
            .candidates
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(_, c)| c.score > selected_score)
            .max_by(|a, b| a.1.score.total_cmp(&b.1.score));
        if let Some((index, c)) = better {
            warn!(
                index,
                score = c.score,
                selected_score,
                "service ranking contract violated; keeping candidate 0"
            );
            self.emit(Diagnostic::RankingViolation {
                index,
                score: c.score,
                selected_score,
            });
        }
    }

    fn emit(&self, event: Diagnostic) {
        if let Some(sink) = &self.diagnostics {
            sink(&event);
        }
    }
}
