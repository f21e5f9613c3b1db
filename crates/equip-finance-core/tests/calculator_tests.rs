use chrono::NaiveDate;
use equip_finance_core::calculator::{loan_amount, payment, rate};
use equip_finance_core::policy::LendingPolicy;
use equip_finance_core::rate_bands::{DefaultRateBands, RateBand, RateBandSource, StaticBands};
use equip_finance_core::EquipFinanceError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// Fixtures
// ===========================================================================

struct FailingSource;

impl RateBandSource for FailingSource {
    fn bands_as_of(
        &self,
        _as_of: NaiveDate,
    ) -> Result<Vec<RateBand>, EquipFinanceError> {
        Err(EquipFinanceError::BandSourceUnavailable(
            "rates service timed out".to_string(),
        ))
    }
}

fn flat_band(annual_rate: Decimal) -> StaticBands {
    StaticBands(vec![RateBand {
        min_amount: dec!(5000),
        max_amount: dec!(500000),
        annual_rate,
        is_active: true,
        effective_from: None,
        effective_to: None,
    }])
}

fn quote_input(invoice: Decimal, term: u32) -> payment::PaymentInput {
    payment::PaymentInput {
        invoice_amount: invoice,
        term_months: term,
        application_fee: None,
        balloon_amount: None,
    }
}

// ===========================================================================
// Roundtrip properties
// ===========================================================================

#[test]
fn test_quoted_payment_implies_the_quoting_rate() {
    let policy = LendingPolicy::standard();
    let quote = payment::calculate_payment(&quote_input(dec!(50000), 36), &DefaultRateBands, &policy)
        .unwrap();
    assert_eq!(quote.result.monthly_payment, dec!(1652.68));

    let implied = rate::calculate_rate(
        &rate::RateInput {
            invoice_amount: dec!(50000),
            desired_payment: quote.result.monthly_payment,
            term_months: 36,
            application_fee: None,
            balloon_amount: None,
        },
        &DefaultRateBands,
        &policy,
    )
    .unwrap();

    assert!(implied.result.converged);
    assert_eq!(implied.result.effective_annual_rate, dec!(0.1165));
    assert_eq!(implied.result.rate_difference, Decimal::ZERO);
}

#[test]
fn test_quoted_payment_sizes_back_to_the_invoice() {
    let policy = LendingPolicy::standard();
    let quote = payment::calculate_payment(&quote_input(dec!(50000), 36), &DefaultRateBands, &policy)
        .unwrap();

    let sized = loan_amount::calculate_loan_amount(
        &loan_amount::LoanAmountInput {
            desired_payment: quote.result.monthly_payment,
            term_months: 36,
            annual_rate: None,
            application_fee: None,
            balloon_amount: None,
        },
        &DefaultRateBands,
        &policy,
    )
    .unwrap();

    // Cent rounding on the payment costs ten cents of sized principal
    assert_eq!(sized.result.max_invoice_amount, dec!(49999.90));
    assert_eq!(sized.result.annual_rate, dec!(0.1165));
    assert!((sized.result.max_invoice_amount - dec!(50000)).abs() < dec!(1));
}

#[test]
fn test_sized_invoice_quotes_back_the_desired_payment() {
    let policy = LendingPolicy::standard();
    let sized = loan_amount::calculate_loan_amount(
        &loan_amount::LoanAmountInput {
            desired_payment: dec!(2600),
            term_months: 36,
            annual_rate: Some(dec!(0.1070)),
            application_fee: None,
            balloon_amount: None,
        },
        &DefaultRateBands,
        &policy,
    )
    .unwrap();
    assert_eq!(sized.result.max_invoice_amount, dec!(79978.57));

    // The sized amount lands in the 10.70% band, so a fresh quote prices
    // at the same rate and returns the original payment
    let quote = payment::calculate_payment(
        &quote_input(sized.result.max_invoice_amount, 36),
        &DefaultRateBands,
        &policy,
    )
    .unwrap();

    assert_eq!(quote.result.annual_rate, dec!(0.1070));
    assert_eq!(quote.result.monthly_payment, dec!(2600.00));
}

// ===========================================================================
// Monotonicity
// ===========================================================================

#[test]
fn test_payment_rises_with_invoice_within_a_band() {
    let policy = LendingPolicy::standard();
    let mut previous = Decimal::ZERO;
    for invoice in [dec!(30000), dec!(50000), dec!(74000)] {
        let quote =
            payment::calculate_payment(&quote_input(invoice, 36), &DefaultRateBands, &policy)
                .unwrap();
        assert_eq!(quote.result.annual_rate, dec!(0.1165));
        assert!(quote.result.monthly_payment > previous);
        previous = quote.result.monthly_payment;
    }
}

#[test]
fn test_payment_falls_as_the_term_lengthens() {
    let policy = LendingPolicy::standard();
    let mut previous = Decimal::MAX;
    for term in [24, 36, 48, 60] {
        let quote =
            payment::calculate_payment(&quote_input(dec!(50000), term), &DefaultRateBands, &policy)
                .unwrap();
        assert!(quote.result.monthly_payment < previous);
        previous = quote.result.monthly_payment;
    }
}

// ===========================================================================
// Band sources
// ===========================================================================

#[test]
fn test_unavailable_source_falls_back_to_default_bands() {
    let policy = LendingPolicy::standard();
    let quote =
        payment::calculate_payment(&quote_input(dec!(50000), 36), &FailingSource, &policy).unwrap();

    // Same pricing as the built-in table, plus a warning about the source
    assert_eq!(quote.result.annual_rate, dec!(0.1165));
    assert_eq!(quote.result.monthly_payment, dec!(1652.68));
    assert_eq!(quote.warnings.len(), 1);
    assert!(quote.warnings[0].contains("built-in defaults"));
}

#[test]
fn test_custom_bands_price_the_quote() {
    let policy = LendingPolicy::standard();
    let source = flat_band(dec!(0.08));
    let quote = payment::calculate_payment(&quote_input(dec!(50000), 36), &source, &policy).unwrap();

    assert_eq!(quote.result.annual_rate, dec!(0.08));
    assert!(quote.warnings.is_empty());
    // Cheaper money than any default band
    assert!(quote.result.monthly_payment < dec!(1652.68));
}

#[test]
fn test_amount_uncovered_by_custom_bands_is_an_error() {
    let policy = LendingPolicy::standard();
    let source = StaticBands(vec![RateBand {
        min_amount: dec!(5000),
        max_amount: dec!(40000),
        annual_rate: dec!(0.12),
        is_active: true,
        effective_from: None,
        effective_to: None,
    }]);

    let err = payment::calculate_payment(&quote_input(dec!(50000), 36), &source, &policy)
        .unwrap_err();
    match err {
        EquipFinanceError::AmountOutsideBands { amount, lower, upper } => {
            assert_eq!(amount, dec!(50000));
            assert_eq!(lower, dec!(5000));
            assert_eq!(upper, dec!(40000));
        }
        other => panic!("Expected AmountOutsideBands, got {other:?}"),
    }
}

// ===========================================================================
// Envelope
// ===========================================================================

#[test]
fn test_output_envelope_carries_methodology_and_metadata() {
    let policy = LendingPolicy::standard();
    let quote = payment::calculate_payment(&quote_input(dec!(50000), 36), &DefaultRateBands, &policy)
        .unwrap();

    assert!(quote.methodology.contains("advance"));
    assert_eq!(quote.metadata.version, env!("CARGO_PKG_VERSION"));
    assert_eq!(quote.metadata.precision, "rust_decimal_128bit");

    let json = serde_json::to_string(&quote).unwrap();
    assert!(json.contains("\"monthly_payment\":\"1652.68\""));
    assert!(json.contains("\"methodology\""));
}
