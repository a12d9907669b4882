//! Confidence policy applied to the best-ranked candidate.
//!
//! Scores below `reject_below` are discarded, scores below `warn_below` are
//! accepted with a warning (or rejected, with `WarningBand::Reject`), and
//! everything else is accepted as-is.

use serde::{Deserialize, Serialize};

pub const DEFAULT_REJECT_BELOW: f64 = 75.0;
pub const DEFAULT_WARN_BELOW: f64 = 90.0;

/// What to do with a score inside the cautionary band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningBand {
    /// Produce the location and flag it.
    #[default]
    Proceed,
    /// Treat the cautionary band like a rejection.
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Reject,
    AcceptWithWarning,
    Accept,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidencePolicy {
    pub reject_below: f64,
    pub warn_below: f64,
    pub warning_band: WarningBand,
}

impl Default for ConfidencePolicy {
    fn default() -> Self {
        Self {
            reject_below: DEFAULT_REJECT_BELOW,
            warn_below: DEFAULT_WARN_BELOW,
            warning_band: WarningBand::Proceed,
        }
    }
}

impl ConfidencePolicy {
    /// The stricter variant: anything below `warn_below` is rejected.
    pub fn strict() -> Self {
        Self {
            warning_band: WarningBand::Reject,
            ..Self::default()
        }
    }

    pub fn evaluate(&self, score: f64) -> Verdict {
        // NaN fails every comparison and lands in Reject.
        if !(score >= self.reject_below) {
            return Verdict::Reject;
        }
        if score < self.warn_below {
            return match self.warning_band {
                WarningBand::Proceed => Verdict::AcceptWithWarning,
                WarningBand::Reject => Verdict::Reject,
            };
        }
        Verdict::Accept
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.reject_below.is_finite() || !self.warn_below.is_finite() {
            return Err("confidence thresholds must be finite".into());
        }
        if self.reject_below > self.warn_below {
            return Err(format!(
                "reject_below ({}) must not exceed warn_below ({})",
                self.reject_below, self.warn_below
            ));
        }
        Ok(())
    }
}
