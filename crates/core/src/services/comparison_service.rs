use chrono::NaiveDate;
use log::debug;

use crate::models::comparison::{ComparisonResult, RebasedPoint};
use crate::models::metric::{Metric, UndefinedReason};
use crate::models::price::{FxRate, PriceLookup, PriceSeries};
use super::currency_service::CurrencyService;

/// Start value of every rebased series.
pub const REBASE_START: f64 = 100.0;

/// "What if the money had gone into the comparison asset instead".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Counterfactual {
    pub initial_investment_home: Metric,
    pub value_home: Metric,
    pub profit_home: Metric,
}

/// Compares the tracked fund against a second instrument.
///
/// Both instruments are converted with the same FX rate; a comparison
/// asset quoted in a third currency is not handled separately.
pub struct ComparisonService {
    currency_service: CurrencyService,
}

impl ComparisonService {
    pub fn new() -> Self {
        Self {
            currency_service: CurrencyService::new(),
        }
    }

    /// Scale `series` so that its own first point is exactly 100.
    ///
    /// Empty when the series is empty or starts at a zero price.
    pub fn rebase(series: &PriceSeries) -> Vec<RebasedPoint> {
        let points = series.points();
        let Some(first) = points.first() else {
            return Vec::new();
        };
        if first.price == 0.0 {
            return Vec::new();
        }
        points
            .iter()
            .enumerate()
            .map(|(i, p)| RebasedPoint {
                date: p.date,
                value: if i == 0 {
                    REBASE_START
                } else {
                    p.price / first.price * REBASE_START
                },
            })
            .collect()
    }

    /// Value today of the fund's initial investment, had it bought B instead.
    ///
    /// The initial investment is `share_count × anchor_a × fx` in the home
    /// currency; it buys `initial_home / anchor_b` units of B, worth
    /// `units × latest_b × fx` today. B's prices are read in the fund's
    /// trading currency and share its single FX rate.
    pub fn counterfactual(
        &self,
        share_count: u32,
        anchor_a: PriceLookup,
        anchor_b: PriceLookup,
        latest_b: PriceLookup,
        fx: Option<&FxRate>,
    ) -> Counterfactual {
        let initial_foreign = Metric::from(anchor_a.price()).map(|a| f64::from(share_count) * a);
        let initial_investment_home = self.currency_service.metric_to_home(initial_foreign, fx);

        let alt_units = match anchor_b.price() {
            Some(b) if b == 0.0 => Metric::Undefined(UndefinedReason::ZeroDenominator),
            Some(b) => initial_investment_home.map(|i| i / b),
            None => Metric::Undefined(UndefinedReason::MissingPrice),
        };
        let alt_value = alt_units.zip_with(Metric::from(latest_b.price()), |u, l| u * l);
        let value_home = self.currency_service.metric_to_home(alt_value, fx);
        let profit_home = value_home.zip_with(initial_investment_home, |v, i| v - i);

        Counterfactual {
            initial_investment_home,
            value_home,
            profit_home,
        }
    }

    /// Rebased series plus counterfactual for fund A against asset B.
    #[allow(clippy::too_many_arguments)]
    pub fn compare(
        &self,
        label: &str,
        ticker: &str,
        series_a: &PriceSeries,
        series_b: &PriceSeries,
        share_count: u32,
        start_date: NaiveDate,
        fx: Option<&FxRate>,
    ) -> ComparisonResult {
        let rebased_series_a = Self::rebase(series_a);
        let rebased_series_b = Self::rebase(series_b);
        let common_start = match (rebased_series_a.first(), rebased_series_b.first()) {
            (Some(a), Some(b)) => a.date == b.date,
            _ => false,
        };
        if !common_start {
            debug!("Comparison {ticker}: series start on different dates");
        }

        let cf = self.counterfactual(
            share_count,
            series_a.find_anchor_price(start_date),
            series_b.find_anchor_price(start_date),
            series_b.latest_price(),
            fx,
        );

        ComparisonResult {
            label: label.to_string(),
            ticker: ticker.to_string(),
            rebased_series_a,
            rebased_series_b,
            common_start,
            initial_investment_home: cf.initial_investment_home,
            counterfactual_value_home: cf.value_home,
            counterfactual_profit_home: cf.profit_home,
        }
    }
}

impl Default for ComparisonService {
    fn default() -> Self {
        Self::new()
    }
}
