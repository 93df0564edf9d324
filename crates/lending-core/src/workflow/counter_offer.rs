use crate::comparison::market::{
    compare_market, counter_offer, CompetitorQuote, CounterOffer, MarketComparison,
};
use crate::config::EngineConfig;
use crate::types::Money;
use crate::workflow::MarketDataSource;
use crate::{LendingError, LendingResult};

/// Prices counter-offers from a live market snapshot.
pub struct CounterOfferDesk<M: MarketDataSource> {
    market: M,
    config: EngineConfig,
}

impl<M: MarketDataSource> CounterOfferDesk<M> {
    pub fn new(market: M, config: EngineConfig) -> Self {
        Self { market, config }
    }

    /// Own standard offer against every registered competitor.
    pub fn compare(&self, principal: Money, term_months: u32) -> LendingResult<MarketComparison> {
        let tpm = self.market.central_bank_rate()?;
        let competitors = self.market.competitors()?;
        compare_market(
            principal,
            term_months,
            tpm,
            self.config.rates.standard_annual_rate_percent,
            &competitors,
            &self.config,
        )
    }

    /// Counter-offer against a named competitor (case-insensitive).
    pub fn counter_offer(
        &self,
        principal: Money,
        term_months: u32,
        competitor_name: &str,
    ) -> LendingResult<CounterOffer> {
        let tpm = self.market.central_bank_rate()?;
        let competitor = self.find_competitor(competitor_name)?;
        counter_offer(principal, term_months, tpm, &competitor, &self.config)
    }

    /// Counter-offer against whichever competitor quotes the lowest installment.
    pub fn counter_cheapest(
        &self,
        principal: Money,
        term_months: u32,
    ) -> LendingResult<CounterOffer> {
        let comparison = self.compare(principal, term_months)?;
        let name = comparison
            .cheapest_competitor
            .ok_or_else(|| LendingError::MarketData("competitor registry is empty".into()))?;
        self.counter_offer(principal, term_months, &name)
    }

    fn find_competitor(&self, name: &str) -> LendingResult<CompetitorQuote> {
        self.market
            .competitors()?
            .into_iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| LendingError::MarketData(format!("unknown competitor '{name}'")))
    }
}
