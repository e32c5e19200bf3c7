use serde::{Deserialize, Serialize};

/// Why a figure could not be computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UndefinedReason {
    /// Latest or anchor price is missing.
    MissingPrice,
    /// No FX rate could be fetched for the pair.
    MissingFxRate,
    /// The denominator was zero.
    ZeroDenominator,
    /// Fewer data points than the statistic needs.
    InsufficientData,
    /// The derivation was not selected in the settings.
    NotRequested,
}

impl std::fmt::Display for UndefinedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UndefinedReason::MissingPrice => write!(f, "price unavailable"),
            UndefinedReason::MissingFxRate => write!(f, "FX rate unavailable"),
            UndefinedReason::ZeroDenominator => write!(f, "division by zero"),
            UndefinedReason::InsufficientData => write!(f, "insufficient data"),
            UndefinedReason::NotRequested => write!(f, "not requested"),
        }
    }
}

/// A derived figure that is either a finite number or explicitly undefined.
///
/// Never holds NaN or infinity: `Metric::from_f64` maps those to
/// `Undefined(ZeroDenominator)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Metric {
    Available(f64),
    Undefined(UndefinedReason),
}

impl Metric {
    pub fn from_f64(value: f64) -> Self {
        if value.is_finite() {
            Metric::Available(value)
        } else {
            Metric::Undefined(UndefinedReason::ZeroDenominator)
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Metric::Available(v) => Some(*v),
            Metric::Undefined(_) => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Metric::Available(_))
    }

    /// The value, or 0.0 when undefined (for totals that must still render).
    pub fn or_zero(&self) -> f64 {
        self.value().unwrap_or(0.0)
    }

    pub fn map(self, f: impl FnOnce(f64) -> f64) -> Self {
        match self {
            Metric::Available(v) => Metric::from_f64(f(v)),
            undefined => undefined,
        }
    }

    /// Combine two metrics; the first undefined operand wins.
    pub fn zip_with(self, other: Metric, f: impl FnOnce(f64, f64) -> f64) -> Self {
        match (self, other) {
            (Metric::Available(a), Metric::Available(b)) => Metric::from_f64(f(a, b)),
            (Metric::Undefined(r), _) | (_, Metric::Undefined(r)) => Metric::Undefined(r),
        }
    }
}

impl From<Option<f64>> for Metric {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Metric::Undefined(UndefinedReason::MissingPrice), Metric::from_f64)
    }
}
