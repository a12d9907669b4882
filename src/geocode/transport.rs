//! Transport to the geocoding service and interpretation of its payload.

use super::types::{Candidate, CandidateSet};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Why a candidate search produced no usable payload.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },
    /// ArcGIS reports failures inside a 200 response body.
    #[error("service error {code}: {message}")]
    Service { code: i64, message: String },
    #[error("network error: {0}")]
    Network(String),
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl TransportError {
    /// HTTP-ish status associated with the failure, when one is known.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Service { code, .. } => u16::try_from(*code)
                .ok()
                .filter(|c| (100..=599).contains(c)),
            Self::Network(_) | Self::Malformed(_) => None,
        }
    }
}

/// Issues one candidate search against the service.
#[async_trait]
pub trait GeocodeTransport: Send + Sync {
    async fn fetch_candidates(&self, url: &str) -> Result<CandidateSet, TransportError>;
}

// ─── Payload ────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FindCandidatesBody {
    #[serde(default)]
    spatial_reference: Option<SpatialReference>,
    /// Kept raw so a broken entry past index 0 cannot fail the whole body.
    #[serde(default)]
    candidates: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    error: Option<ServiceFault>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpatialReference {
    #[serde(default)]
    wkid: Option<u32>,
    #[serde(default)]
    latest_wkid: Option<u32>,
}

#[derive(Deserialize)]
struct RawCandidate {
    #[serde(default)]
    address: Option<String>,
    location: Option<RawPoint>,
    score: Option<f64>,
}

#[derive(Deserialize)]
struct RawPoint {
    x: Option<f64>,
    y: Option<f64>,
}

#[derive(Deserialize)]
struct ServiceFault {
    code: i64,
    #[serde(default)]
    message: String,
    #[serde(default)]
    details: Vec<String>,
}

fn to_candidate(value: serde_json::Value) -> Result<Candidate, String> {
    let c: RawCandidate = serde_json::from_value(value).map_err(|e| e.to_string())?;
    let (x, y) = match c.location {
        Some(RawPoint { x: Some(x), y: Some(y) }) => (x, y),
        _ => return Err("has no location".into()),
    };
    let score = c.score.ok_or("has no score")?;
    if !(x.is_finite() && y.is_finite() && score.is_finite()) {
        return Err("has non-finite values".into());
    }
    Ok(Candidate {
        x,
        y,
        score,
        address: c.address,
    })
}

/// Interpret a findAddressCandidates JSON body.
///
/// A `candidates` array wins over an `error` envelope. Only candidate 0 must
/// be well formed; later entries that do not parse are dropped, since they
/// never decide the outcome.
pub fn parse_candidates(body: &str) -> Result<CandidateSet, TransportError> {
    let parsed: FindCandidatesBody =
        serde_json::from_str(body).map_err(|e| TransportError::Malformed(e.to_string()))?;

    let raw = match (parsed.candidates, parsed.error) {
        (Some(raw), _) => raw,
        (None, Some(fault)) => {
            let mut message = fault.message;
            if !fault.details.is_empty() {
                message = format!("{} ({})", message, fault.details.join("; "));
            }
            return Err(TransportError::Service {
                code: fault.code,
                message,
            });
        }
        (None, None) => return Err(TransportError::Malformed("no candidates array".into())),
    };

    let mut candidates = Vec::with_capacity(raw.len());
    for (i, value) in raw.into_iter().enumerate() {
        match to_candidate(value) {
            Ok(c) => candidates.push(c),
            Err(reason) if i == 0 => {
                return Err(TransportError::Malformed(format!("candidate 0 {}", reason)))
            }
            Err(reason) => debug!(index = i, reason = %reason, "skipping unusable candidate"),
        }
    }

    let wkid = parsed
        .spatial_reference
        .and_then(|sr| sr.latest_wkid.or(sr.wkid));

    Ok(CandidateSet { candidates, wkid })
}

// ─── ureq transport ─────────────────────────────────────────────

/// Blocking `ureq` GET, run on the tokio blocking pool.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    timeout: Duration,
    user_agent: String,
}

impl UreqTransport {
    pub fn new(timeout: Duration, user_agent: impl Into<String>) -> Self {
        Self {
            timeout,
            user_agent: user_agent.into(),
        }
    }

    fn get_blocking(&self, url: &str) -> Result<CandidateSet, TransportError> {
        let response = ureq::get(url)
            .set("User-Agent", &self.user_agent)
            .set("Accept", "application/json")
            .timeout(self.timeout)
            .call()
            .map_err(|e| match e {
                ureq::Error::Status(status, resp) => {
                    let text = resp.status_text().to_string();
                    let body = resp.into_string().unwrap_or_default();
                    let message = if body.trim().is_empty() {
                        text
                    } else {
                        format!("{}: {}", text, truncate(&body, 200))
                    };
                    TransportError::Status { status, message }
                }
                ureq::Error::Transport(t) => TransportError::Network(t.to_string()),
            })?;

        let body = response
            .into_string()
            .map_err(|e| TransportError::Malformed(e.to_string()))?;

        parse_candidates(&body)
    }
}

#[async_trait]
impl GeocodeTransport for UreqTransport {
    async fn fetch_candidates(&self, url: &str) -> Result<CandidateSet, TransportError> {
        let this = self.clone();
        let url = url.to_string();
        tokio::task::spawn_blocking(move || this.get_blocking(&url))
            .await
            .map_err(|e| TransportError::Network(format!("request task failed: {}", e)))?
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_candidates() {
        let body = r#"{
            "spatialReference": {"wkid": 26986, "latestWkid": 26986},
            "candidates": [
                {"address": "1 BEACON ST, BOSTON, MA, 02108",
                 "location": {"x": 236000.0, "y": 899000.0},
                 "score": 97, "attributes": {}},
                {"location": {"x": 1.0, "y": 2.0}, "score": 40.5}
            ]
        }"#;
        let set = parse_candidates(body).unwrap();
        assert_eq!(set.wkid, Some(26986));
        assert_eq!(set.candidates.len(), 2);
        assert_eq!(set.candidates[0].score, 97.0);
        assert_eq!(
            set.candidates[0].address.as_deref(),
            Some("1 BEACON ST, BOSTON, MA, 02108")
        );
        assert!(set.candidates[1].address.is_none());
    }

    #[test]
    fn test_parse_empty_candidates() {
        let set = parse_candidates(r#"{"candidates": []}"#).unwrap();
        assert!(set.candidates.is_empty());
        assert_eq!(set.wkid, None);
    }

    #[test]
    fn test_parse_service_fault() {
        let body = r#"{"error": {"code": 400, "message": "Unable to complete operation.",
                       "details": ["Street is required"]}}"#;
        let err = parse_candidates(body).unwrap_err();
        assert_eq!(err.status(), Some(400));
        assert!(err.to_string().contains("Street is required"));
    }

    #[test]
    fn test_service_fault_with_odd_code_has_no_status() {
        let err = parse_candidates(r#"{"error": {"code": -1, "message": "?"}}"#).unwrap_err();
        assert!(matches!(err, TransportError::Service { .. }));
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_parse_missing_candidates_is_malformed() {
        let err = parse_candidates(r#"{"spatialReference": {"wkid": 26986}}"#).unwrap_err();
        assert!(matches!(err, TransportError::Malformed(_)));
    }

    #[test]
    fn test_parse_garbage_is_malformed() {
        assert!(matches!(
            parse_candidates("<html>502 Bad Gateway</html>"),
            Err(TransportError::Malformed(_))
        ));
    }

    #[test]
    fn test_parse_candidate_without_location() {
        let err = parse_candidates(r#"{"candidates": [{"score": 99}]}"#).unwrap_err();
        assert!(err.to_string().contains("candidate 0"));
    }

    #[test]
    fn test_broken_later_candidates_are_dropped() {
        let body = r#"{"candidates": [
            {"location": {"x": 236000, "y": 899000}, "score": 95},
            {"score": 10},
            {"location": {"x": 1.0}, "score": 50},
            {"location": {"x": "bad", "y": 2.0}, "score": 40},
            {"location": {"x": 3.0, "y": 4.0}}
        ]}"#;
        let set = parse_candidates(body).unwrap();
        assert_eq!(set.candidates.len(), 1);
        assert_eq!(set.candidates[0].score, 95.0);
    }

    #[test]
    fn test_broken_first_candidate_is_malformed() {
        let body = r#"{"candidates": [{"score": 95}, {"location": {"x": 1, "y": 2}, "score": 99}]}"#;
        let err = parse_candidates(body).unwrap_err();
        assert!(matches!(err, TransportError::Malformed(_)));
        assert!(err.to_string().contains("candidate 0 has no location"));
    }

    #[test]
    fn test_candidates_array_wins_over_error_envelope() {
        let body = r#"{"candidates": [], "error": {"code": 500, "message": "x"}}"#;
        let set = parse_candidates(body).unwrap();
        assert!(set.candidates.is_empty());
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "hé");
        assert_eq!(truncate("abc", 10), "abc");
    }
}
