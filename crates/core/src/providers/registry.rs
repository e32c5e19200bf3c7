use log::warn;

use super::frankfurter::FrankfurterProvider;
use super::traits::{DataKind, MarketDataProvider};
use super::yahoo_finance::YahooFinanceProvider;

/// Registry of all available market-data providers.
///
/// Routes requests by `DataKind`. Registration order is fallback order.
pub struct MarketDataRegistry {
    providers: Vec<Box<dyn MarketDataProvider>>,
}

impl MarketDataRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    /// Create a registry with the default providers.
    pub fn new_with_defaults() -> Self {
        let mut registry = Self::new();

        // Yahoo Finance — fund history and FX, no API key needed (primary)
        match YahooFinanceProvider::new() {
            Ok(yahoo) => registry.register(Box::new(yahoo)),
            Err(e) => warn!("Yahoo Finance unavailable: {e}"),
        }

        // Frankfurter — ECB FX rates, no API key needed (fallback)
        registry.register(Box::new(FrankfurterProvider::new()));

        registry
    }

    /// Register a new provider at the lowest priority.
    pub fn register(&mut self, provider: Box<dyn MarketDataProvider>) {
        self.providers.push(provider);
    }

    /// First provider that serves `kind`.
    pub fn get_provider_for(&self, kind: DataKind) -> Option<&dyn MarketDataProvider> {
        self.providers
            .iter()
            .find(|p| p.supported_data().contains(&kind))
            .map(|p| p.as_ref())
    }

    /// All providers that serve `kind`, in priority order.
    pub fn get_providers_for(&self, kind: DataKind) -> Vec<&dyn MarketDataProvider> {
        self.providers
            .iter()
            .filter(|p| p.supported_data().contains(&kind))
            .map(|p| p.as_ref())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl Default for MarketDataRegistry {
    fn default() -> Self {
        Self::new()
    }
}
