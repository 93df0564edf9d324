use chrono::NaiveDate;
use lending_core::comparison::market::{CompetitorQuote, CounterOfferStrategy};
use lending_core::comparison::scenarios::generate_scenarios;
use lending_core::config::EngineConfig;
use lending_core::risk::affordability::{assess_affordability, DEFAULT_MAX_DEBT_RATIO_PERCENT};
use lending_core::risk::knockout::CreditApplication;
use lending_core::workflow::counter_offer::CounterOfferDesk;
use lending_core::workflow::memory::{InMemoryLoanRepository, StaticMarketData};
use lending_core::workflow::origination::{LoanOriginator, OriginationOutcome};
use lending_core::workflow::LoanRepository;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// Affordability
// ===========================================================================

#[test]
fn test_affordability_breakdown_for_rejection() {
    let verdict =
        assess_affordability(dec!(300_000), dec!(1_000_000), dec!(200_000), dec!(40)).unwrap();
    assert!(!verdict.approved);
    assert_eq!(verdict.total_capacity, dec!(400_000));
    assert_eq!(verdict.available_capacity, dec!(200_000));
    assert_eq!(verdict.committed_ratio_percent, dec!(20));
    assert_eq!(verdict.shortfall, dec!(100_000));
}

proptest! {
    #[test]
    fn prop_more_commitments_never_approve(
        proposed in 0i64..=2_000_000,
        income in 1i64..=5_000_000,
        committed in 0i64..=2_000_000,
        extra in 0i64..=2_000_000,
    ) {
        let before = assess_affordability(
            Decimal::from(proposed),
            Decimal::from(income),
            Decimal::from(committed),
            DEFAULT_MAX_DEBT_RATIO_PERCENT,
        ).unwrap();
        let after = assess_affordability(
            Decimal::from(proposed),
            Decimal::from(income),
            Decimal::from(committed + extra),
            DEFAULT_MAX_DEBT_RATIO_PERCENT,
        ).unwrap();
        prop_assert!(before.approved || !after.approved);
    }

    #[test]
    fn prop_scenario_terms_are_distinct(
        base in 1u32..=360,
        rate in (0i64..=5_000i64).prop_map(|bp| Decimal::new(bp, 2)),
    ) {
        let set = generate_scenarios(dec!(100_000), dec!(2_000_000), base, rate).unwrap();
        let [c, b, r] = set.terms();
        prop_assert!(c != b && b != r && c != r);
        prop_assert_eq!(b, base);
    }
}

// ===========================================================================
// Workflows
// ===========================================================================

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_origination_uses_external_commitments() {
    let repo = InMemoryLoanRepository::new().with_external_commitment("marta", dec!(500_000));
    let mut originator = LoanOriginator::new(repo, EngineConfig::default());
    let application = CreditApplication {
        customer_id: "marta".into(),
        principal: dec!(5_000_000),
        annual_rate_percent: dec!(18),
        term_months: 24,
        monthly_income: dec!(1_500_000),
        disbursement_date: Some(date(2024, 1, 31)),
    };

    let outcome = originator.originate(&application, date(2024, 1, 20)).unwrap();
    match outcome {
        OriginationOutcome::Rejected { decision } => {
            let verdict = decision.verdict.unwrap();
            assert_eq!(verdict.available_capacity, dec!(100_000));
            assert_eq!(decision.reasons.len(), 1);
        }
        other => panic!("Expected rejection, got {other:?}"),
    }
    assert_eq!(
        originator.repository().committed_installments("marta").unwrap(),
        dec!(500_000)
    );

    let mut relaxed = EngineConfig::default();
    relaxed.max_debt_ratio_percent = dec!(55);
    let mut originator = LoanOriginator::new(originator.into_repository(), relaxed);
    match originator.originate(&application, date(2024, 1, 20)).unwrap() {
        OriginationOutcome::Approved { schedule, .. } => {
            assert_eq!(schedule[0].due_date, date(2024, 2, 29));
            assert_eq!(schedule[1].due_date, date(2024, 3, 31));
        }
        other => panic!("Expected approval, got {other:?}"),
    }
}

#[test]
fn test_counter_offer_desk_against_registry() {
    let market = StaticMarketData {
        central_bank_rate_percent: dec!(5.75),
        competitors: vec![
            CompetitorQuote { name: "BancoEstado".into(), spread_points: dec!(9.5) },
            CompetitorQuote { name: "Banco Sur".into(), spread_points: dec!(14) },
        ],
    };
    let desk = CounterOfferDesk::new(market, EngineConfig::default());

    let comparison = desk.compare(dec!(3_000_000), 36).unwrap();
    assert_eq!(comparison.cheapest_competitor.as_deref(), Some("BancoEstado"));

    let offer = desk.counter_offer(dec!(3_000_000), 36, "BancoEstado").unwrap();
    assert_eq!(offer.strategy, CounterOfferStrategy::Aggressive);
    assert_eq!(offer.applied_rate_percent, dec!(7.75));
    assert!(offer.beats_competitor);
    assert_eq!(offer.scenarios.terms(), [21, 36, 54]);

    let offer = desk.counter_offer(dec!(3_000_000), 36, "Banco Sur").unwrap();
    // 19.75% > 18% standard
    assert_eq!(offer.strategy, CounterOfferStrategy::Standard);
    assert_eq!(offer.applied_rate_percent, dec!(18));
}
