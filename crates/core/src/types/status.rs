//! Order lifecycle states.
//!
//! ```text
//! in_progress ──► in_queue ──► in_delivery ──► delivered
//!      │              │
//!      └──────────────┴──► canceled
//! ```
//!
//! `in_progress` is the cart. Leaving it means the order was placed, which is
//! when `completed_at` gets stamped.

use serde::{Deserialize, Serialize};

/// Error returned when parsing an unknown order state.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid order state: {0}")]
pub struct OrderStateError(pub String);

/// State of an order.
///
/// Stored in the `storefront.order_state` enum column. Queries read it as
/// text and parse it with [`str::parse`], so an unknown label surfaces as an
/// [`OrderStateError`] rather than a driver decode failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderState {
    /// The user's cart; still being edited.
    #[default]
    InProgress,
    /// Placed and waiting to be shipped.
    InQueue,
    /// Handed to the carrier.
    InDelivery,
    /// Received by the customer.
    Delivered,
    /// Abandoned before delivery.
    Canceled,
}

impl OrderState {
    /// Every state, in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::InProgress,
        Self::InQueue,
        Self::InDelivery,
        Self::Delivered,
        Self::Canceled,
    ];

    /// The snake_case name stored in the database.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::InQueue => "in_queue",
            Self::InDelivery => "in_delivery",
            Self::Delivered => "delivered",
            Self::Canceled => "canceled",
        }
    }

    /// Human-readable label for pages.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::InProgress => "In progress",
            Self::InQueue => "In queue",
            Self::InDelivery => "In delivery",
            Self::Delivered => "Delivered",
            Self::Canceled => "Canceled",
        }
    }

    /// Whether no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Canceled)
    }

    /// Whether an order in this state may move to `next`.
    #[must_use]
    pub const fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::InProgress, Self::InQueue | Self::Canceled)
                | (Self::InQueue, Self::InDelivery | Self::Canceled)
                | (Self::InDelivery, Self::Delivered)
        )
    }
}

impl std::fmt::Display for OrderState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderState {
    type Err = OrderStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| OrderStateError(s.to_owned()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_all_states() {
        for state in OrderState::ALL {
            assert_eq!(state.as_str().parse::<OrderState>().unwrap(), state);
        }
    }

    #[test]
    fn test_parse_rejects_unknown_state() {
        for bad in ["", "pending", "In_Progress", "cancelled", "shipped"] {
            assert_eq!(
                bad.parse::<OrderState>(),
                Err(OrderStateError(bad.to_owned()))
            );
        }
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&OrderState::InDelivery).unwrap();
        assert_eq!(json, "\"in_delivery\"");
        assert!(serde_json::from_str::<OrderState>("\"unknown\"").is_err());
    }

    #[test]
    fn test_forward_transitions() {
        assert!(OrderState::InProgress.can_transition_to(OrderState::InQueue));
        assert!(OrderState::InQueue.can_transition_to(OrderState::InDelivery));
        assert!(OrderState::InDelivery.can_transition_to(OrderState::Delivered));
    }

    #[test]
    fn test_cancel_only_before_delivery() {
        assert!(OrderState::InProgress.can_transition_to(OrderState::Canceled));
        assert!(OrderState::InQueue.can_transition_to(OrderState::Canceled));
        assert!(!OrderState::InDelivery.can_transition_to(OrderState::Canceled));
    }

    #[test]
    fn test_terminal_states_are_final() {
        for terminal in [OrderState::Delivered, OrderState::Canceled] {
            assert!(terminal.is_terminal());
            for next in OrderState::ALL {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_no_skipping_or_going_back() {
        assert!(!OrderState::InProgress.can_transition_to(OrderState::Delivered));
        assert!(!OrderState::InQueue.can_transition_to(OrderState::InProgress));
        assert!(!OrderState::InProgress.can_transition_to(OrderState::InProgress));
    }
}
