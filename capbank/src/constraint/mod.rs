//! Optimization requests and the validated constraints derived from them.

pub mod validator;

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use validator::ConstraintValidator;

/// Raw `/optimize` request body, exactly as a client sends it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizeRequest {
    /// Target capacitance in farads
    pub target_cap: f64,
    /// Allowed deviation as a fraction of the target
    pub tolerance: f64,
    /// DC-bias capacitance loss as a fraction in [0, 1)
    pub dc_bias: f64,
    pub max_count: i64,
    pub min_rated_volt: f64,
    pub min_temp: f64,
    /// Connection type code, see [`ConnectionType`]
    pub conn_type: i64,
    pub packages: Vec<String>,
    /// Upper bound on network ESR in ohms
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_esr: Option<f64>,
}

/// Which network shapes a request allows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConnectionType {
    Any,
    SeriesOnly,
    ParallelOnly,
    /// Two or more parallel banks stacked in series
    SeriesOfParallel,
    /// Two or more series strings connected in parallel
    ParallelOfSeries,
}

impl ConnectionType {
    pub const ALL: [ConnectionType; 5] = [
        ConnectionType::Any,
        ConnectionType::SeriesOnly,
        ConnectionType::ParallelOnly,
        ConnectionType::SeriesOfParallel,
        ConnectionType::ParallelOfSeries,
    ];

    /// Wire code used by the `conn_type` request field.
    pub fn code(self) -> i64 {
        match self {
            ConnectionType::Any => 0,
            ConnectionType::SeriesOnly => 1,
            ConnectionType::ParallelOnly => 2,
            ConnectionType::SeriesOfParallel => 3,
            ConnectionType::ParallelOfSeries => 4,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ConnectionType::Any => "any",
            ConnectionType::SeriesOnly => "series",
            ConnectionType::ParallelOnly => "parallel",
            ConnectionType::SeriesOfParallel => "series-of-parallel",
            ConnectionType::ParallelOfSeries => "parallel-of-series",
        }
    }
}

impl TryFrom<i64> for ConnectionType {
    type Error = ConstraintError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        ConnectionType::ALL
            .into_iter()
            .find(|c| c.code() == code)
            .ok_or(ConstraintError::UnknownConnectionType(code))
    }
}

impl FromStr for ConnectionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        ConnectionType::ALL
            .into_iter()
            .find(|c| c.name() == lower || c.code().to_string() == lower)
            .ok_or_else(|| format!("unknown connection type '{}'", s))
    }
}

impl fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Why a request was rejected before any search ran.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConstraintError {
    #[error("{0} must be a finite number")]
    NotFinite(&'static str),
    #[error("target capacitance must be positive, got {0}")]
    NonPositiveTarget(f64),
    #[error("tolerance must be positive, got {0}")]
    NonPositiveTolerance(f64),
    #[error("max_count must be at least 1, got {0}")]
    MaxCountTooSmall(i64),
    #[error("max_count {0} is out of range")]
    MaxCountTooLarge(i64),
    #[error("unknown connection type code {0}")]
    UnknownConnectionType(i64),
    #[error("dc_bias must be in [0, 1), got {0}")]
    DcBiasOutOfRange(f64),
    #[error("max_esr must be positive, got {0}")]
    NonPositiveEsr(f64),
    #[error("none of the requested packages exist in the catalog")]
    NoUsablePackages,
}

/// A request that passed validation. Built only by [`ConstraintValidator`].
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub target_cap: f64,
    pub tolerance: f64,
    pub dc_bias: f64,
    pub max_count: u32,
    pub min_rated_volt: f64,
    pub min_temp: f64,
    pub conn_type: ConnectionType,
    /// Requested packages intersected with the catalog
    pub packages: BTreeSet<String>,
    pub max_esr: Option<f64>,
}

impl Constraint {
    /// Inclusive capacitance window `[target·(1−tol), target·(1+tol)]`.
    pub fn window(&self) -> (f64, f64) {
        (
            self.target_cap * (1.0 - self.tolerance),
            self.target_cap * (1.0 + self.tolerance),
        )
    }

    pub fn in_band(&self, capacitance: f64) -> bool {
        let (lo, hi) = self.window();
        capacitance >= lo && capacitance <= hi
    }
}
