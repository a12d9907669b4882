//! Address resolution against the MassGIS geocoding service.
//!
//! Builds the candidate search, applies the confidence policy to the
//! best-ranked candidate and reprojects it into WGS84 longitude/latitude.

pub mod config;
pub mod policy;
pub mod projection;
pub mod request;
pub mod resolver;
pub mod transport;
pub mod types;

pub use config::{ConfigError, ResolverConfig};
pub use policy::{ConfidencePolicy, Verdict, WarningBand};
pub use projection::{Proj4Projector, ProjectionError, Projector};
pub use resolver::{AddressResolver, Diagnostic, DiagnosticSink, ResolverError};
pub use transport::{GeocodeTransport, TransportError, UreqTransport};
pub use types::{
    AddressQuery, Candidate, CandidateSet, MatchWarning, ResolutionOutcome, ResolvedLocation,
};
