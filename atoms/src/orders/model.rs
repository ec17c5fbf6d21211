use serde::{Deserialize, Serialize};

/// One line of an order, denormalized so the order survives later
/// product edits.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OrderItem {
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: f64,
}

/// Order placed by a buyer against one representative's catalog.
/// Items are stored as a JSON document attribute on the row.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Order {
    pub order_id: String,
    pub user_id: String,
    pub client_name: String,
    pub client_email: Option<String>,
    pub client_phone: Option<String>,
    pub status: String, // "pending" | "confirmed" | "shipped" | "cancelled"
    pub total: f64,
    pub items: Vec<OrderItem>,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderItemPayload {
    pub product_id: String,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderPayload {
    pub client_name: String,
    pub client_email: Option<String>,
    pub client_phone: Option<String>,
    pub items: Vec<CreateOrderItemPayload>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateOrderPayload {
    pub status: Option<String>,
    pub notes: Option<String>,
}

/// pending -> confirmed -> shipped, with cancellation allowed until shipped
pub fn is_valid_transition(from: &str, to: &str) -> bool {
    matches!(
        (from, to),
        ("pending", "confirmed")
            | ("confirmed", "shipped")
            | ("pending", "cancelled")
            | ("confirmed", "cancelled")
    )
}

#[cfg(test)]
mod tests {
    use super::is_valid_transition;

    #[test]
    fn forward_transitions_are_allowed() {
        assert!(is_valid_transition("pending", "confirmed"));
        assert!(is_valid_transition("confirmed", "shipped"));
    }

    #[test]
    fn cancellation_only_before_shipping() {
        assert!(is_valid_transition("pending", "cancelled"));
        assert!(is_valid_transition("confirmed", "cancelled"));
        assert!(!is_valid_transition("shipped", "cancelled"));
    }

    #[test]
    fn no_backwards_or_skipped_transitions() {
        assert!(!is_valid_transition("shipped", "pending"));
        assert!(!is_valid_transition("pending", "shipped"));
        assert!(!is_valid_transition("cancelled", "confirmed"));
    }
}
