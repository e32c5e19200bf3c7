use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// A single closing price (date → price), in the instrument's trading currency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, price: f64) -> Self {
        Self { date, price }
    }
}

/// Result of looking up a price in a series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PriceLookup {
    Found(PricePoint),
    NotFound,
}

impl PriceLookup {
    pub fn point(&self) -> Option<PricePoint> {
        match self {
            PriceLookup::Found(p) => Some(*p),
            PriceLookup::NotFound => None,
        }
    }

    pub fn price(&self) -> Option<f64> {
        self.point().map(|p| p.price)
    }

    pub fn is_found(&self) -> bool {
        matches!(self, PriceLookup::Found(_))
    }
}

/// Snapshot of daily closing prices, strictly increasing by date.
///
/// The constructor enforces the ordering, so lookups can binary search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Build a series from raw provider output.
    ///
    /// Sorts by date, keeps the last quote seen for a duplicated date and
    /// drops non-finite or negative prices.
    pub fn new(mut points: Vec<PricePoint>) -> Self {
        points.retain(|p| p.price.is_finite() && p.price >= 0.0);
        // Stable sort keeps provider order within a date; the later quote wins below.
        points.sort_by_key(|p| p.date);
        let mut deduped: Vec<PricePoint> = Vec::with_capacity(points.len());
        for point in points {
            match deduped.last_mut() {
                Some(last) if last.date == point.date => *last = point,
                _ => deduped.push(point),
            }
        }
        Self { points: deduped }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn prices(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.price).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> PriceLookup {
        self.points.first().copied().map_or(PriceLookup::NotFound, PriceLookup::Found)
    }

    /// Anchor (cost-basis) price for `target`.
    ///
    /// Exact date if present, otherwise the earliest later point. Never
    /// looks backwards: a price before the purchase date was not available
    /// at purchase time.
    pub fn find_anchor_price(&self, target: NaiveDate) -> PriceLookup {
        let idx = match self.points.binary_search_by_key(&target, |p| p.date) {
            Ok(idx) => idx,
            Err(pos) => pos,
        };
        self.points.get(idx).copied().map_or(PriceLookup::NotFound, PriceLookup::Found)
    }

    /// The last point in the series.
    pub fn latest_price(&self) -> PriceLookup {
        self.points.last().copied().map_or(PriceLookup::NotFound, PriceLookup::Found)
    }

    /// Points with `from <= date <= to`.
    pub fn range(&self, from: NaiveDate, to: NaiveDate) -> &[PricePoint] {
        let start = self
            .points
            .binary_search_by_key(&from, |p| p.date)
            .unwrap_or_else(|pos| pos);
        let end = self
            .points
            .binary_search_by_key(&to, |p| p.date)
            .map(|pos| pos + 1)
            .unwrap_or_else(|pos| pos);
        if start >= end {
            return &[];
        }
        &self.points[start..end]
    }
}

/// A currency pair, e.g. USD/CHF: how many `quote` units one `base` unit buys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FxPair {
    /// The instrument's trading currency (e.g., "USD")
    pub base: String,
    /// The home currency (e.g., "CHF")
    pub quote: String,
}

impl FxPair {
    pub fn new(base: impl Into<String>, quote: impl Into<String>) -> Self {
        Self {
            base: base.into().trim().to_uppercase(),
            quote: quote.into().trim().to_uppercase(),
        }
    }

    /// Parse "USD/CHF", "USD-CHF" or "USDCHF".
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        let cleaned: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '/' | '-' | ' '))
            .collect();
        if cleaned.len() != 6 || !cleaned.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(CoreError::InvalidConfig(format!(
                "Invalid currency pair '{s}': expected two 3-letter codes, e.g. USD/CHF"
            )));
        }
        Ok(Self::new(&cleaned[..3], &cleaned[3..]))
    }

    pub fn is_identity(&self) -> bool {
        self.base == self.quote
    }
}

impl std::fmt::Display for FxPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

/// A point estimate of the latest exchange rate for a pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FxRate {
    pub pair: FxPair,
    pub rate: f64,
}

impl FxRate {
    /// Rates must be finite and strictly positive.
    pub fn new(pair: FxPair, rate: f64) -> Result<Self, CoreError> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(CoreError::ValidationError(format!(
                "FX rate for {pair} must be finite and positive, got {rate}"
            )));
        }
        Ok(Self { pair, rate })
    }

    pub fn identity(currency: &str) -> Self {
        Self {
            pair: FxPair::new(currency, currency),
            rate: 1.0,
        }
    }
}
