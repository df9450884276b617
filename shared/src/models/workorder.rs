//! Work order models and the repair lifecycle state machine

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// State of a work order in the repair lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderState {
    Pendiente,
    Diagnostico,
    Aprobado,
    EnProgreso,
    Pausado,
    Completado,
    Cancelado,
}

/// Error returned when a transition is not in the adjacency list
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot move from {from} to {to}; allowed: {allowed:?}")]
pub struct IllegalTransition {
    pub from: OrderState,
    pub to: OrderState,
    pub allowed: Vec<OrderState>,
}

impl OrderState {
    pub const ALL: [OrderState; 7] = [
        OrderState::Pendiente,
        OrderState::Diagnostico,
        OrderState::Aprobado,
        OrderState::EnProgreso,
        OrderState::Pausado,
        OrderState::Completado,
        OrderState::Cancelado,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderState::Pendiente => "pendiente",
            OrderState::Diagnostico => "diagnostico",
            OrderState::Aprobado => "aprobado",
            OrderState::EnProgreso => "en_progreso",
            OrderState::Pausado => "pausado",
            OrderState::Completado => "completado",
            OrderState::Cancelado => "cancelado",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pendiente" => Some(OrderState::Pendiente),
            "diagnostico" => Some(OrderState::Diagnostico),
            "aprobado" => Some(OrderState::Aprobado),
            "en_progreso" => Some(OrderState::EnProgreso),
            "pausado" => Some(OrderState::Pausado),
            "completado" => Some(OrderState::Completado),
            "cancelado" => Some(OrderState::Cancelado),
            _ => None,
        }
    }

    /// States reachable from this one. Asymmetric and directional: a
    /// completed or cancelled order can be reopened, but only along the
    /// arcs listed here.
    pub fn allowed_transitions(&self) -> &'static [OrderState] {
        match self {
            OrderState::Pendiente => &[
                OrderState::Diagnostico,
                OrderState::EnProgreso,
                OrderState::Cancelado,
            ],
            OrderState::Diagnostico => &[
                OrderState::Aprobado,
                OrderState::EnProgreso,
                OrderState::Pendiente,
                OrderState::Completado,
                OrderState::Cancelado,
            ],
            OrderState::Aprobado => &[OrderState::EnProgreso, OrderState::Cancelado],
            OrderState::EnProgreso => &[
                OrderState::Pausado,
                OrderState::Completado,
                OrderState::Cancelado,
                OrderState::Diagnostico,
            ],
            OrderState::Pausado => &[
                OrderState::EnProgreso,
                OrderState::Completado,
                OrderState::Cancelado,
            ],
            OrderState::Completado => &[OrderState::EnProgreso, OrderState::Diagnostico],
            OrderState::Cancelado => &[OrderState::Pendiente],
        }
    }

    pub fn can_transition_to(&self, target: OrderState) -> bool {
        self.allowed_transitions().contains(&target)
    }

    /// Validate a transition, reporting the allowed targets on failure
    pub fn validate_transition(&self, target: OrderState) -> Result<(), IllegalTransition> {
        if self.can_transition_to(target) {
            Ok(())
        } else {
            Err(IllegalTransition {
                from: *self,
                to: target,
                allowed: self.allowed_transitions().to_vec(),
            })
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderState::Completado | OrderState::Cancelado)
    }
}

impl std::fmt::Display for OrderState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Work order priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderPriority {
    Baja,
    #[default]
    Media,
    Alta,
    Urgente,
}

impl OrderPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderPriority::Baja => "baja",
            OrderPriority::Media => "media",
            OrderPriority::Alta => "alta",
            OrderPriority::Urgente => "urgente",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "baja" => Some(OrderPriority::Baja),
            "media" => Some(OrderPriority::Media),
            "alta" => Some(OrderPriority::Alta),
            "urgente" => Some(OrderPriority::Urgente),
            _ => None,
        }
    }
}

/// A work order (servicio) tracked from intake to completion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkOrder {
    pub id: Uuid,
    pub description: String,
    pub estado: OrderState,
    pub priority: OrderPriority,
    pub vehicle_id: Uuid,
    pub client_id: Option<Uuid>,
    pub mechanic_id: Option<Uuid>,
    pub created_by: Uuid,
    pub diagnosis: Option<String>,
    pub recommendations: Option<String>,
    pub estimated_cost: Option<Decimal>,
    pub odometer_in: Option<i32>,
    pub odometer_out: Option<i32>,
    pub fuel_level_in: Option<i16>,
    pub fuel_level_out: Option<i16>,
    pub fecha_inicio: DateTime<Utc>,
    /// Set if and only if the order is in `completado`
    pub fecha_fin: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Append-only audit entry for one state transition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateHistoryEntry {
    pub id: Uuid,
    pub work_order_id: Uuid,
    pub previous_state: OrderState,
    pub new_state: OrderState,
    pub comment: Option<String>,
    pub changed_by: Uuid,
    pub changed_at: DateTime<Utc>,
}

/// A logged block of mechanic time billed against a work order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaborEntry {
    pub id: Uuid,
    pub work_order_id: Uuid,
    pub mechanic_id: Uuid,
    pub work_date: NaiveDate,
    pub hours: Decimal,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_round_trip() {
        for state in OrderState::ALL {
            assert_eq!(OrderState::from_str(state.as_str()), Some(state));
        }
        assert_eq!(OrderState::from_str("terminado"), None);
    }

    #[test]
    fn new_order_states_start_pendiente_paths() {
        assert!(OrderState::Pendiente.can_transition_to(OrderState::Diagnostico));
        assert!(OrderState::Pendiente.can_transition_to(OrderState::EnProgreso));
        assert!(OrderState::Pendiente.can_transition_to(OrderState::Cancelado));
        assert!(!OrderState::Pendiente.can_transition_to(OrderState::Completado));
        assert!(!OrderState::Pendiente.can_transition_to(OrderState::Pausado));
    }

    #[test]
    fn transitions_are_directional() {
        // pausado reaches en_progreso but not the reverse of every arc
        assert!(OrderState::EnProgreso.can_transition_to(OrderState::Pausado));
        assert!(OrderState::Pausado.can_transition_to(OrderState::EnProgreso));
        assert!(!OrderState::Pausado.can_transition_to(OrderState::Diagnostico));
        assert!(!OrderState::Completado.can_transition_to(OrderState::Pendiente));
        assert!(!OrderState::Cancelado.can_transition_to(OrderState::EnProgreso));
    }

    #[test]
    fn self_transition_rejected() {
        for state in OrderState::ALL {
            assert!(!state.can_transition_to(state));
        }
    }

    #[test]
    fn validate_transition_reports_allowed() {
        let err = OrderState::Pendiente
            .validate_transition(OrderState::Completado)
            .unwrap_err();
        assert_eq!(err.from, OrderState::Pendiente);
        assert_eq!(err.to, OrderState::Completado);
        assert_eq!(
            err.allowed,
            vec![
                OrderState::Diagnostico,
                OrderState::EnProgreso,
                OrderState::Cancelado
            ]
        );
    }

    #[test]
    fn terminal_states_can_reopen() {
        assert!(OrderState::Completado.is_terminal());
        assert!(OrderState::Cancelado.is_terminal());
        assert!(OrderState::Completado.can_transition_to(OrderState::EnProgreso));
        assert!(OrderState::Cancelado.can_transition_to(OrderState::Pendiente));
    }
}
