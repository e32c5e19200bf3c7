use chrono::NaiveDate;
use log::debug;

use crate::models::metric::{Metric, UndefinedReason};
use crate::models::price::{FxRate, PriceLookup, PriceSeries};
use crate::models::valuation::ValuationResult;
use super::currency_service::CurrencyService;

/// Trading days per year, for de-annualising the risk-free rate.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Below this a standard deviation is treated as zero.
const STD_DEV_EPSILON: f64 = 1e-12;

/// Computes value, profit and risk figures for the tracked fund position.
///
/// Pure computation, no I/O. Every ratio with a possibly-zero or missing
/// denominator yields `Metric::Undefined` instead of NaN or infinity.
pub struct ValuationService {
    currency_service: CurrencyService,
}

impl ValuationService {
    pub fn new() -> Self {
        Self {
            currency_service: CurrencyService::new(),
        }
    }

    /// share_count × latest × fx
    pub fn holding_value_home(
        &self,
        share_count: u32,
        latest: PriceLookup,
        fx: Option<&FxRate>,
    ) -> Metric {
        let value_foreign = Metric::from(latest.price()).map(|p| f64::from(share_count) * p);
        self.currency_service.metric_to_home(value_foreign, fx)
    }

    /// (latest − anchor) × share_count × fx. Needs both prices.
    pub fn profit_home(
        &self,
        share_count: u32,
        anchor: PriceLookup,
        latest: PriceLookup,
        fx: Option<&FxRate>,
    ) -> Metric {
        let profit_foreign = Metric::from(latest.price())
            .zip_with(Metric::from(anchor.price()), |l, a| (l - a) * f64::from(share_count));
        self.currency_service.metric_to_home(profit_foreign, fx)
    }

    /// (latest / anchor − 1) × 100. Undefined for a missing or zero anchor.
    pub fn profit_percent(anchor: PriceLookup, latest: PriceLookup) -> Metric {
        match (anchor.price(), latest.price()) {
            (Some(a), Some(_)) if a == 0.0 => Metric::Undefined(UndefinedReason::ZeroDenominator),
            (Some(a), Some(l)) => Metric::from_f64((l / a - 1.0) * 100.0),
            _ => Metric::Undefined(UndefinedReason::MissingPrice),
        }
    }

    /// r[i] = p[i] / p[i−1] − 1. Pairs with a zero previous price are skipped.
    pub fn daily_returns(prices: &[f64]) -> Vec<f64> {
        prices
            .windows(2)
            .filter_map(|w| (w[0] != 0.0).then(|| w[1] / w[0] - 1.0))
            .filter(|r| r.is_finite())
            .collect()
    }

    /// Sample standard deviation of daily returns, in percent.
    pub fn volatility_percent(returns: &[f64]) -> Metric {
        match sample_std_dev(returns) {
            Some(sd) => Metric::from_f64(sd * 100.0),
            None => Metric::Undefined(UndefinedReason::InsufficientData),
        }
    }

    /// (mean(r) − rf_annual / 252) / stddev(r), daily and not annualised.
    pub fn sharpe_ratio(returns: &[f64], risk_free_rate_annual: f64) -> Metric {
        let Some(sd) = sample_std_dev(returns) else {
            return Metric::Undefined(UndefinedReason::InsufficientData);
        };
        if sd < STD_DEV_EPSILON {
            return Metric::Undefined(UndefinedReason::ZeroDenominator);
        }
        let rf_daily = risk_free_rate_annual / TRADING_DAYS_PER_YEAR;
        let excess = mean(returns) - rf_daily;
        Metric::from_f64(excess / sd)
    }

    /// Full valuation of the position.
    ///
    /// `include_risk` off leaves volatility and Sharpe as `NotRequested`.
    pub fn evaluate(
        &self,
        share_count: u32,
        series: &PriceSeries,
        start_date: NaiveDate,
        fx: Option<&FxRate>,
        risk_free_rate_annual: f64,
        include_risk: bool,
    ) -> ValuationResult {
        let anchor = series.find_anchor_price(start_date);
        let latest = series.latest_price();

        let (volatility_percent, sharpe_ratio) = if include_risk {
            let returns = Self::daily_returns(&series.prices());
            (
                Self::volatility_percent(&returns),
                Self::sharpe_ratio(&returns, risk_free_rate_annual),
            )
        } else {
            (
                Metric::Undefined(UndefinedReason::NotRequested),
                Metric::Undefined(UndefinedReason::NotRequested),
            )
        };

        let result = ValuationResult {
            share_count,
            anchor,
            latest,
            fx_rate: fx.map(|f| f.rate),
            holding_value_home: self.holding_value_home(share_count, latest, fx),
            profit_home: self.profit_home(share_count, anchor, latest, fx),
            profit_percent: Self::profit_percent(anchor, latest),
            volatility_percent,
            sharpe_ratio,
        };
        debug!("Valuation: {result:?}");
        result
    }
}

impl Default for ValuationService {
    fn default() -> Self {
        Self::new()
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Divides by N−1; `None` for fewer than two values.
fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values);
    let variance =
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() as f64 - 1.0);
    Some(variance.sqrt())
}
