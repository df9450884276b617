//! Billing tests
//!
//! Cost aggregation arithmetic, invoice numbering, and the payment
//! rules the billing service enforces: frozen totals, no over-payment,
//! settlement exactly at the frozen figure.

use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::{format_invoice_number, validate_amount, InvoiceState};
use std::str::FromStr;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// Parts cost as the aggregator computes it: unreversed consumption
/// quantities priced at the part's sale price
fn parts_cost(consumptions: &[(i32, Decimal, bool)]) -> Decimal {
    consumptions
        .iter()
        .filter(|(_, _, reversed)| !reversed)
        .map(|(qty, price, _)| Decimal::from(*qty) * *price)
        .sum()
}

/// Labor cost: hours times the mechanic's hourly rate
fn labor_cost(entries: &[(Decimal, Decimal)]) -> Decimal {
    entries.iter().map(|(hours, rate)| *hours * *rate).sum()
}

/// Payment admission rule: accept only while it fits in the outstanding
/// balance, flip to pagada exactly at the total
fn apply_payment(total: Decimal, paid: Decimal, amount: Decimal) -> Result<(Decimal, InvoiceState), ()> {
    if amount > total - paid {
        return Err(());
    }
    let new_paid = paid + amount;
    let state = if new_paid == total {
        InvoiceState::Pagada
    } else {
        InvoiceState::Pendiente
    };
    Ok((new_paid, state))
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Parts plus labor, returned parts excluded
    #[test]
    fn cost_breakdown_arithmetic() {
        let consumptions = [
            (2, dec("120.00"), false),
            (1, dec("450.00"), false),
            (4, dec("35.00"), true), // returned, must not count
        ];
        let labor = [
            (dec("3.5"), dec("200.00")),
            (dec("1.0"), dec("250.00")),
        ];

        let parts = parts_cost(&consumptions);
        let hours = labor_cost(&labor);

        assert_eq!(parts, dec("690.00"));
        assert_eq!(hours, dec("950.00"));
        assert_eq!(parts + hours, dec("1640.00"));
    }

    #[test]
    fn empty_order_costs_zero() {
        assert_eq!(parts_cost(&[]), Decimal::ZERO);
        assert_eq!(labor_cost(&[]), Decimal::ZERO);
    }

    /// Numbering restarts per year and pads to four digits
    #[test]
    fn invoice_numbering_per_year() {
        assert_eq!(format_invoice_number(2026, 1), "F20260001");
        assert_eq!(format_invoice_number(2026, 2), "F20260002");
        assert_eq!(format_invoice_number(2027, 1), "F20270001");
    }

    /// Partial payments accumulate; the last one settles the invoice
    #[test]
    fn partial_payments_settle_at_total() {
        let total = dec("1500.00");
        let (paid, state) = apply_payment(total, Decimal::ZERO, dec("500.00")).unwrap();
        assert_eq!(state, InvoiceState::Pendiente);

        let (paid, state) = apply_payment(total, paid, dec("700.00")).unwrap();
        assert_eq!(state, InvoiceState::Pendiente);
        assert_eq!(paid, dec("1200.00"));

        let (paid, state) = apply_payment(total, paid, dec("300.00")).unwrap();
        assert_eq!(paid, total);
        assert_eq!(state, InvoiceState::Pagada);
    }

    /// One cent over the outstanding balance is refused
    #[test]
    fn over_payment_refused_at_boundary() {
        let total = dec("1000.00");
        assert!(apply_payment(total, dec("400.00"), dec("600.00")).is_ok());
        assert!(apply_payment(total, dec("400.00"), dec("600.01")).is_err());
    }

    /// An exact single payment settles immediately
    #[test]
    fn exact_payment_settles() {
        let (paid, state) = apply_payment(dec("875.50"), Decimal::ZERO, dec("875.50")).unwrap();
        assert_eq!(paid, dec("875.50"));
        assert_eq!(state, InvoiceState::Pagada);
    }

    #[test]
    fn payment_amounts_must_be_positive() {
        assert!(validate_amount(dec("0.01")).is_ok());
        assert!(validate_amount(Decimal::ZERO).is_err());
        assert!(validate_amount(dec("-10")).is_err());
    }

    /// The frozen total is immune to later order changes: recomputing
    /// the live cost diverges, the invoice figure does not
    #[test]
    fn frozen_total_survives_order_changes() {
        let mut consumptions = vec![(2, dec("120.00"), false)];
        let frozen_total = parts_cost(&consumptions);

        // Order keeps changing after the invoice was issued
        consumptions.push((1, dec("450.00"), false));
        let live_cost = parts_cost(&consumptions);

        assert_eq!(frozen_total, dec("240.00"));
        assert_eq!(live_cost, dec("690.00"));
        assert_ne!(frozen_total, live_cost);
    }
}

// ============================================================================
// Property Tests
// ============================================================================

fn money_strategy() -> impl Strategy<Value = Decimal> {
    (1..100_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

proptest! {
    /// Accepted payments never push paid past the total, and the state
    /// is pagada exactly when paid equals the total
    #[test]
    fn payments_never_exceed_total(total in money_strategy(), amounts in prop::collection::vec(money_strategy(), 0..20)) {
        let mut paid = Decimal::ZERO;
        let mut state = InvoiceState::Pendiente;

        for amount in amounts {
            if let Ok((new_paid, new_state)) = apply_payment(total, paid, amount) {
                paid = new_paid;
                state = new_state;
            }
            prop_assert!(paid <= total);
            prop_assert_eq!(state == InvoiceState::Pagada, paid == total);
        }
    }

    /// Returning a consumption removes exactly its contribution from
    /// the parts cost
    #[test]
    fn return_removes_exact_contribution(
        qty in 1..50i32,
        price in money_strategy(),
        others in prop::collection::vec((1..50i32, money_strategy()), 0..10),
    ) {
        let mut consumptions: Vec<(i32, Decimal, bool)> =
            others.iter().map(|(q, p)| (*q, *p, false)).collect();
        consumptions.push((qty, price, false));

        let before = parts_cost(&consumptions);
        let last = consumptions.len() - 1;
        consumptions[last].2 = true;
        let after = parts_cost(&consumptions);

        prop_assert_eq!(before - after, Decimal::from(qty) * price);
    }

    /// Invoice numbers within one year are unique and ordered
    #[test]
    fn invoice_numbers_unique_per_year(year in 2020..2100i32, count in 1..200i64) {
        let numbers: Vec<String> = (1..=count)
            .map(|seq| format_invoice_number(year, seq))
            .collect();

        let mut sorted = numbers.clone();
        sorted.dedup();
        prop_assert_eq!(sorted.len(), numbers.len());
        let prefix = format!("F{}", year);
        prop_assert!(numbers.iter().all(|n| n.starts_with(&prefix)));
    }

    /// Cost totals are order-independent: shuffling the ledger rows
    /// never changes the aggregate
    #[test]
    fn cost_is_order_independent(mut consumptions in prop::collection::vec((1..50i32, money_strategy(), any::<bool>()), 0..15)) {
        let original = parts_cost(&consumptions);
        consumptions.reverse();
        prop_assert_eq!(parts_cost(&consumptions), original);
    }
}
