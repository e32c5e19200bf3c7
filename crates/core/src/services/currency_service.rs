use crate::models::metric::{Metric, UndefinedReason};
use crate::models::price::FxRate;

/// Converts asset-currency amounts into the home currency.
///
/// One FX rate per evaluation, applied as a point estimate: the latest
/// quote converts every figure, including historical ones.
pub struct CurrencyService;

impl CurrencyService {
    pub fn new() -> Self {
        Self
    }

    /// Convert a known amount. Undefined when no FX rate is available.
    pub fn to_home(&self, amount_foreign: f64, fx: Option<&FxRate>) -> Metric {
        self.metric_to_home(Metric::from_f64(amount_foreign), fx)
    }

    /// Convert an amount that may itself be undefined.
    ///
    /// An undefined input keeps its own reason; a missing rate is only
    /// reported when the amount was computable.
    pub fn metric_to_home(&self, amount_foreign: Metric, fx: Option<&FxRate>) -> Metric {
        match (amount_foreign, fx) {
            (Metric::Undefined(r), _) => Metric::Undefined(r),
            (Metric::Available(_), None) => Metric::Undefined(UndefinedReason::MissingFxRate),
            (Metric::Available(v), Some(fx)) => Metric::from_f64(v * fx.rate),
        }
    }
}

impl Default for CurrencyService {
    fn default() -> Self {
        Self::new()
    }
}
