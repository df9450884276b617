//! Work order lifecycle tests
//!
//! Exercises the state machine the services enforce: legal paths through
//! the repair pipeline, rejection of everything outside the adjacency
//! list, and the audit-trail bookkeeping rules.

use proptest::prelude::*;
use shared::{OrderState, StateHistoryEntry};

fn any_state() -> impl Strategy<Value = OrderState> {
    prop::sample::select(OrderState::ALL.to_vec())
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// The straight-through service path: intake to invoice-ready
    #[test]
    fn full_repair_pipeline_is_legal() {
        let path = [
            OrderState::Pendiente,
            OrderState::Diagnostico,
            OrderState::Aprobado,
            OrderState::EnProgreso,
            OrderState::Completado,
        ];

        for pair in path.windows(2) {
            assert!(
                pair[0].can_transition_to(pair[1]),
                "{} -> {} should be legal",
                pair[0],
                pair[1]
            );
        }
    }

    /// A pause-and-resume detour returns to the same pipeline
    #[test]
    fn pause_resume_detour() {
        assert!(OrderState::EnProgreso.can_transition_to(OrderState::Pausado));
        assert!(OrderState::Pausado.can_transition_to(OrderState::EnProgreso));
        assert!(OrderState::Pausado.can_transition_to(OrderState::Completado));
    }

    /// Finished work can only be reopened along two arcs
    #[test]
    fn completed_reopen_arcs() {
        assert!(OrderState::Completado.can_transition_to(OrderState::EnProgreso));
        assert!(OrderState::Completado.can_transition_to(OrderState::Diagnostico));
        assert!(!OrderState::Completado.can_transition_to(OrderState::Pendiente));
        assert!(!OrderState::Completado.can_transition_to(OrderState::Cancelado));
        assert!(!OrderState::Completado.can_transition_to(OrderState::Pausado));
    }

    /// A cancelled order can only be revived to pendiente
    #[test]
    fn cancelled_only_revives_to_pendiente() {
        assert_eq!(
            OrderState::Cancelado.allowed_transitions(),
            &[OrderState::Pendiente]
        );
    }

    /// Skipping diagnosis entirely is allowed, skipping to done is not
    #[test]
    fn pendiente_shortcuts() {
        assert!(OrderState::Pendiente.can_transition_to(OrderState::EnProgreso));
        assert!(!OrderState::Pendiente.can_transition_to(OrderState::Completado));
    }

    /// Aprobado is a gate: work or cancellation, nothing else
    #[test]
    fn aprobado_is_narrow() {
        let allowed = OrderState::Aprobado.allowed_transitions();
        assert_eq!(allowed.len(), 2);
        assert!(allowed.contains(&OrderState::EnProgreso));
        assert!(allowed.contains(&OrderState::Cancelado));
    }

    /// An illegal transition reports exactly the legal alternatives
    #[test]
    fn illegal_transition_reports_alternatives() {
        let err = OrderState::Pausado
            .validate_transition(OrderState::Diagnostico)
            .unwrap_err();
        assert_eq!(err.from, OrderState::Pausado);
        assert_eq!(err.to, OrderState::Diagnostico);
        assert_eq!(err.allowed, OrderState::Pausado.allowed_transitions().to_vec());
    }

    /// One history entry per successful transition, chained correctly
    #[test]
    fn history_chains_across_transitions() {
        use chrono::Utc;
        use uuid::Uuid;

        let order_id = Uuid::new_v4();
        let actor = Uuid::new_v4();
        let path = [
            OrderState::Pendiente,
            OrderState::Diagnostico,
            OrderState::EnProgreso,
            OrderState::Completado,
        ];

        let history: Vec<StateHistoryEntry> = path
            .windows(2)
            .map(|pair| StateHistoryEntry {
                id: Uuid::new_v4(),
                work_order_id: order_id,
                previous_state: pair[0],
                new_state: pair[1],
                comment: None,
                changed_by: actor,
                changed_at: Utc::now(),
            })
            .collect();

        assert_eq!(history.len(), path.len() - 1);
        for pair in history.windows(2) {
            assert_eq!(pair[0].new_state, pair[1].previous_state);
        }
    }
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// No state may transition to itself
    #[test]
    fn no_self_loops(state in any_state()) {
        prop_assert!(!state.can_transition_to(state));
        prop_assert!(state.validate_transition(state).is_err());
    }

    /// validate_transition and can_transition_to always agree
    #[test]
    fn validate_matches_adjacency(from in any_state(), to in any_state()) {
        let validated = from.validate_transition(to).is_ok();
        prop_assert_eq!(validated, from.can_transition_to(to));
    }

    /// A rejected transition carries the full allowed list, and the
    /// rejected target is never in it
    #[test]
    fn rejection_is_self_consistent(from in any_state(), to in any_state()) {
        if let Err(err) = from.validate_transition(to) {
            prop_assert_eq!(&err.allowed, &from.allowed_transitions().to_vec());
            prop_assert!(!err.allowed.contains(&to));
        }
    }

    /// Any chain of random transitions, applying only the legal ones,
    /// stays inside the seven known states and every applied step was
    /// in the adjacency list at the time
    #[test]
    fn random_walks_stay_closed(targets in prop::collection::vec(any_state(), 1..40)) {
        let mut current = OrderState::Pendiente;
        for target in targets {
            match current.validate_transition(target) {
                Ok(()) => {
                    prop_assert!(current.allowed_transitions().contains(&target));
                    current = target;
                }
                Err(err) => {
                    prop_assert_eq!(err.from, current);
                }
            }
            prop_assert!(OrderState::ALL.contains(&current));
        }
    }

    /// Every state is reachable from pendiente (the graph has no
    /// orphaned vertices)
    #[test]
    fn all_states_reachable(_seed in 0u8..1) {
        let mut reached = vec![OrderState::Pendiente];
        let mut frontier = vec![OrderState::Pendiente];
        while let Some(state) = frontier.pop() {
            for next in state.allowed_transitions() {
                if !reached.contains(next) {
                    reached.push(*next);
                    frontier.push(*next);
                }
            }
        }
        prop_assert_eq!(reached.len(), OrderState::ALL.len());
    }
}
