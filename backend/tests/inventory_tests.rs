//! Inventory ledger tests
//!
//! Pure-logic checks of the ledger arithmetic the inventory service
//! enforces in SQL: conditional decrements, compensating returns,
//! adjustment deltas, and stock reconciliation.

use proptest::prelude::*;
use shared::{validate_quantity, MovementCategory, MovementType};

/// A ledger row reduced to the fields reconciliation cares about
#[derive(Debug, Clone)]
struct LedgerRow {
    movement_type: MovementType,
    category: MovementCategory,
    quantity: i32,
}

/// Stock implied by a ledger, mirroring the reconciliation query:
/// entrada adds, salida subtracts, ajuste rows are documentation only
fn ledger_balance(rows: &[LedgerRow]) -> i64 {
    rows.iter()
        .filter(|r| r.category != MovementCategory::Ajuste)
        .map(|r| match r.movement_type {
            MovementType::Entrada => i64::from(r.quantity),
            MovementType::Salida => -i64::from(r.quantity),
        })
        .sum()
}

/// The conditional decrement: succeeds only when stock covers the request
fn try_consume(stock: i32, quantity: i32) -> Result<i32, i32> {
    if stock >= quantity {
        Ok(stock - quantity)
    } else {
        Err(stock)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn consume_respects_available_stock() {
        assert_eq!(try_consume(10, 4), Ok(6));
        assert_eq!(try_consume(4, 4), Ok(0));
        // Failure reports what was actually available
        assert_eq!(try_consume(3, 4), Err(3));
    }

    #[test]
    fn consume_then_return_round_trips() {
        let mut rows = vec![LedgerRow {
            movement_type: MovementType::Entrada,
            category: MovementCategory::Compra,
            quantity: 10,
        }];

        rows.push(LedgerRow {
            movement_type: MovementType::Salida,
            category: MovementCategory::Consumo,
            quantity: 4,
        });
        assert_eq!(ledger_balance(&rows), 6);

        // Return: compensating entrada, original stays in the ledger
        rows.push(LedgerRow {
            movement_type: MovementType::Entrada,
            category: MovementCategory::Devolucion,
            quantity: 4,
        });
        assert_eq!(ledger_balance(&rows), 10);
        assert_eq!(rows.len(), 3);
    }

    /// Upward adjustment consumes the delta; the edited row carries the
    /// new quantity and the ajuste row is excluded from the balance
    #[test]
    fn adjustment_up_applies_delta_once() {
        let mut rows = vec![
            LedgerRow {
                movement_type: MovementType::Entrada,
                category: MovementCategory::Compra,
                quantity: 10,
            },
            LedgerRow {
                movement_type: MovementType::Salida,
                category: MovementCategory::Consumo,
                quantity: 2,
            },
        ];

        // 2 -> 5: the consumo row is rewritten, an ajuste row documents it
        rows[1].quantity = 5;
        rows.push(LedgerRow {
            movement_type: MovementType::Salida,
            category: MovementCategory::Ajuste,
            quantity: 3,
        });

        assert_eq!(ledger_balance(&rows), 5);
    }

    #[test]
    fn adjustment_down_restores_delta() {
        let mut rows = vec![
            LedgerRow {
                movement_type: MovementType::Entrada,
                category: MovementCategory::Compra,
                quantity: 10,
            },
            LedgerRow {
                movement_type: MovementType::Salida,
                category: MovementCategory::Consumo,
                quantity: 5,
            },
        ];

        // 5 -> 2
        rows[1].quantity = 2;
        rows.push(LedgerRow {
            movement_type: MovementType::Entrada,
            category: MovementCategory::Ajuste,
            quantity: 3,
        });

        assert_eq!(ledger_balance(&rows), 8);
    }

    #[test]
    fn movement_quantities_are_strictly_positive() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-5).is_err());
    }
}

// ============================================================================
// Property Tests
// ============================================================================

fn quantity_strategy() -> impl Strategy<Value = i32> {
    1..500i32
}

proptest! {
    /// The conditional decrement can never produce negative stock
    #[test]
    fn stock_never_negative(stock in 0..1000i32, requests in prop::collection::vec(quantity_strategy(), 0..30)) {
        let mut current = stock;
        for quantity in requests {
            if let Ok(next) = try_consume(current, quantity) {
                current = next;
            }
            prop_assert!(current >= 0);
        }
    }

    /// Replaying any sequence of purchases and (covered) consumptions,
    /// the tracked stock equals the ledger balance
    #[test]
    fn stock_matches_ledger(ops in prop::collection::vec((any::<bool>(), quantity_strategy()), 0..40)) {
        let mut stock: i64 = 0;
        let mut rows = Vec::new();

        for (is_purchase, quantity) in ops {
            if is_purchase {
                stock += i64::from(quantity);
                rows.push(LedgerRow {
                    movement_type: MovementType::Entrada,
                    category: MovementCategory::Compra,
                    quantity,
                });
            } else if stock >= i64::from(quantity) {
                stock -= i64::from(quantity);
                rows.push(LedgerRow {
                    movement_type: MovementType::Salida,
                    category: MovementCategory::Consumo,
                    quantity,
                });
            }
        }

        prop_assert_eq!(stock, ledger_balance(&rows));
    }

    /// Returning every consumption restores the initial balance and
    /// grows the ledger instead of shrinking it
    #[test]
    fn full_return_restores_balance(initial in 1..500i32, consumptions in prop::collection::vec(quantity_strategy(), 1..10)) {
        let mut rows = vec![LedgerRow {
            movement_type: MovementType::Entrada,
            category: MovementCategory::Compra,
            quantity: initial,
        }];
        let mut stock = i64::from(initial);

        let mut consumed = Vec::new();
        for quantity in consumptions {
            if stock >= i64::from(quantity) {
                stock -= i64::from(quantity);
                rows.push(LedgerRow {
                    movement_type: MovementType::Salida,
                    category: MovementCategory::Consumo,
                    quantity,
                });
                consumed.push(quantity);
            }
        }

        let rows_before_returns = rows.len();
        for quantity in consumed {
            rows.push(LedgerRow {
                movement_type: MovementType::Entrada,
                category: MovementCategory::Devolucion,
                quantity,
            });
        }

        prop_assert_eq!(ledger_balance(&rows), i64::from(initial));
        prop_assert!(rows.len() >= rows_before_returns);
    }

    /// An adjustment from old to new quantity leaves the ledger balance
    /// equal to a ledger that consumed the new quantity directly
    #[test]
    fn adjustment_equals_direct_consumption(initial in 500..1000i32, old_qty in quantity_strategy(), new_qty in quantity_strategy()) {
        // Adjusted ledger: consume old, then edit to new with an ajuste row
        let delta = new_qty - old_qty;
        let mut adjusted = vec![
            LedgerRow {
                movement_type: MovementType::Entrada,
                category: MovementCategory::Compra,
                quantity: initial,
            },
            LedgerRow {
                movement_type: MovementType::Salida,
                category: MovementCategory::Consumo,
                quantity: new_qty,
            },
        ];
        if delta != 0 {
            adjusted.push(LedgerRow {
                movement_type: if delta > 0 { MovementType::Salida } else { MovementType::Entrada },
                category: MovementCategory::Ajuste,
                quantity: delta.abs(),
            });
        }

        let direct = vec![
            LedgerRow {
                movement_type: MovementType::Entrada,
                category: MovementCategory::Compra,
                quantity: initial,
            },
            LedgerRow {
                movement_type: MovementType::Salida,
                category: MovementCategory::Consumo,
                quantity: new_qty,
            },
        ];

        prop_assert_eq!(ledger_balance(&adjusted), ledger_balance(&direct));
    }
}
