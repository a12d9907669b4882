//! Core types for the address resolution pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Free-text address fields as typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressQuery {
    pub street: String,
    pub city: String,
    pub postal_code: String,
}

impl AddressQuery {
    pub fn new(
        street: impl Into<String>,
        city: impl Into<String>,
        postal_code: impl Into<String>,
    ) -> Self {
        Self {
            street: street.into(),
            city: city.into(),
            postal_code: postal_code.into(),
        }
    }
}

impl fmt::Display for AddressQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {} {}", self.street, self.city, self.postal_code)
    }
}

/// One match returned by the geocoding service, in the service's native CRS.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub x: f64,
    pub y: f64,
    /// Match quality, 0 to 100.
    pub score: f64,
    /// Address string the service matched (e.g. "1 BEACON ST, BOSTON, MA, 02108")
    #[serde(default)]
    pub address: Option<String>,
}

/// The parsed body of a candidate search, candidates in service order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateSet {
    pub candidates: Vec<Candidate>,
    /// Well-known ID of the spatial reference the service reported, if any.
    pub wkid: Option<u32>,
}

/// A candidate transformed into geographic coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedLocation {
    pub longitude: f64,
    pub latitude: f64,
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_address: Option<String>,
}

/// Caveat attached to a location the caller must surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchWarning {
    LowConfidence { score: f64 },
}

impl fmt::Display for MatchWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LowConfidence { score } => {
                write!(f, "low-confidence match (geocoding score was {})", score)
            }
        }
    }
}

/// Result of one `resolve` call. Every call produces exactly one of these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ResolutionOutcome {
    /// The service found zero matches.
    NoCandidates,
    /// The best candidate scored below the usable threshold and was discarded.
    LowConfidence { score: f64 },
    Resolved {
        location: ResolvedLocation,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        warning: Option<MatchWarning>,
    },
    /// The request failed at the network or service layer.
    TransportFailure {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        status: Option<u16>,
        message: String,
    },
    /// The projection collaborator rejected the candidate's coordinates.
    ProjectionFailed { message: String },
}

impl ResolutionOutcome {
    pub fn location(&self) -> Option<&ResolvedLocation> {
        match self {
            Self::Resolved { location, .. } => Some(location),
            _ => None,
        }
    }

    pub fn warning(&self) -> Option<&MatchWarning> {
        match self {
            Self::Resolved { warning, .. } => warning.as_ref(),
            _ => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved { .. })
    }

    /// One-line summary for terminals and logs.
    pub fn summary(&self) -> String {
        match self {
            Self::NoCandidates => {
                "Geocoding request found no candidates. Check the address and try again.".into()
            }
            Self::LowConfidence { score } => format!(
                "Geocoding service returned a score of {}. Ignoring result; try again.",
                score
            ),
            Self::Resolved { location, warning } => {
                let mut line = format!(
                    "{:.6}, {:.6} (score {})",
                    location.latitude, location.longitude, location.score
                );
                if let Some(addr) = &location.matched_address {
                    line = format!("{} - {}", addr, line);
                }
                if let Some(w) = warning {
                    line.push_str(&format!("\n  Warning: {}", w));
                }
                line
            }
            Self::TransportFailure { status, message } => match status {
                Some(code) => format!("Geocoding request failed (status {}): {}", code, message),
                None => format!("Geocoding request failed: {}", message),
            },
            Self::ProjectionFailed { message } => {
                format!("Could not reproject geocoded point: {}", message)
            }
        }
    }
}
