use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{CoreError, CoreResult};

pub type OrderId = i64;

/// Order status in the lifecycle.
///
/// The named variants are the ones the backend reasons about; any other
/// caller-supplied status is carried verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum OrderStatus {
    Pending,
    Shipped,
    Delivered,
    Cancelled,
    Other(String),
}

impl OrderStatus {
    pub fn as_str(&self) -> &str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
            OrderStatus::Other(s) => s,
        }
    }

    /// True for the statuses with a named variant.
    pub fn is_known(&self) -> bool {
        !matches!(self, OrderStatus::Other(_))
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let status = match s {
            "" => return Err(CoreError::validation("status must not be empty")),
            "Pending" => OrderStatus::Pending,
            "Shipped" => OrderStatus::Shipped,
            "Delivered" => OrderStatus::Delivered,
            "Cancelled" => OrderStatus::Cancelled,
            other => OrderStatus::Other(other.to_string()),
        };
        Ok(status)
    }
}

impl From<OrderStatus> for String {
    fn from(status: OrderStatus) -> Self {
        match status {
            OrderStatus::Other(s) => s,
            named => named.as_str().to_string(),
        }
    }
}

impl TryFrom<String> for OrderStatus {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A customer purchase request for a product and quantity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: OrderId,
    pub client: String,
    pub product: String,
    pub quantity: i32,
    pub supplier: String,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

/// Payload for a new order. The status is not part of it: new orders are
/// always `Pending`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewOrder {
    pub client: String,
    pub product: String,
    pub quantity: i32,
    #[serde(default)]
    pub supplier: Option<String>,
}

impl NewOrder {
    /// Trims the text fields and rejects empty names or a non-positive quantity.
    pub fn validated(self) -> CoreResult<NewOrder> {
        let client = self.client.trim().to_string();
        let product = self.product.trim().to_string();
        if client.is_empty() {
            return Err(CoreError::validation("client must not be empty"));
        }
        if product.is_empty() {
            return Err(CoreError::validation("product must not be empty"));
        }
        if self.quantity <= 0 {
            return Err(CoreError::validation(format!(
                "quantity must be positive, got {}",
                self.quantity
            )));
        }
        Ok(NewOrder {
            client,
            product,
            quantity: self.quantity,
            supplier: self.supplier.map(|s| s.trim().to_string()),
        })
    }

    pub fn supplier_or_empty(&self) -> &str {
        self.supplier.as_deref().unwrap_or("")
    }
}

/// Current on-hand quantity of a product
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InventoryItem {
    pub product: String,
    pub quantity: i32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    Inbound,
    Outbound,
}

impl MovementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementKind::Inbound => "inbound",
            MovementKind::Outbound => "outbound",
        }
    }
}

impl FromStr for MovementKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inbound" => Ok(MovementKind::Inbound),
            "outbound" => Ok(MovementKind::Outbound),
            other => Err(CoreError::store(format!("unknown movement kind: {}", other))),
        }
    }
}

/// Immutable ledger entry for a single inventory change
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovementRecord {
    pub id: i64,
    pub product: String,
    pub quantity: i32,
    pub kind: MovementKind,
    pub reference: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMovement {
    pub product: String,
    pub quantity: i32,
    pub kind: MovementKind,
    pub reference: String,
}

impl NewMovement {
    pub fn outbound_for(order: &Order) -> Self {
        Self {
            product: order.product.clone(),
            quantity: order.quantity,
            kind: MovementKind::Outbound,
            reference: format!("Order #{}", order.id),
        }
    }

    pub fn inbound(product: impl Into<String>, quantity: i32, reference: impl Into<String>) -> Self {
        Self {
            product: product.into(),
            quantity,
            kind: MovementKind::Inbound,
            reference: reference.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parsing() {
        assert_eq!("Pending".parse::<OrderStatus>().unwrap(), OrderStatus::Pending);
        assert_eq!(" Shipped ".parse::<OrderStatus>().unwrap(), OrderStatus::Shipped);
        assert_eq!(
            "On hold".parse::<OrderStatus>().unwrap(),
            OrderStatus::Other("On hold".to_string())
        );
        assert!("   ".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_status_serializes_as_plain_string() {
        let json = serde_json::to_string(&OrderStatus::Shipped).unwrap();
        assert_eq!(json, "\"Shipped\"");

        let custom: OrderStatus = serde_json::from_str("\"Returned\"").unwrap();
        assert_eq!(custom, OrderStatus::Other("Returned".to_string()));
        assert!(!custom.is_known());
        assert_eq!(serde_json::to_string(&custom).unwrap(), "\"Returned\"");
    }

    #[test]
    fn test_new_order_validation() {
        let order = NewOrder {
            client: "  Juan ".to_string(),
            product: "Broca".to_string(),
            quantity: 5,
            supplier: Some(" XYZ ".to_string()),
        }
        .validated()
        .unwrap();
        assert_eq!(order.client, "Juan");
        assert_eq!(order.supplier_or_empty(), "XYZ");

        let missing_client = NewOrder {
            product: "Broca".to_string(),
            quantity: 5,
            ..Default::default()
        };
        assert!(matches!(
            missing_client.validated(),
            Err(CoreError::ValidationError(_))
        ));

        let zero_quantity = NewOrder {
            client: "Juan".to_string(),
            product: "Broca".to_string(),
            quantity: 0,
            supplier: None,
        };
        assert!(matches!(
            zero_quantity.validated(),
            Err(CoreError::ValidationError(_))
        ));
    }

    #[test]
    fn test_outbound_movement_references_order() {
        let order = Order {
            id: 1,
            client: "Juan".to_string(),
            product: "Broca".to_string(),
            quantity: 5,
            supplier: "XYZ".to_string(),
            status: OrderStatus::Pending,
            created_at: Utc::now(),
        };
        let movement = NewMovement::outbound_for(&order);
        assert_eq!(movement.kind, MovementKind::Outbound);
        assert_eq!(movement.reference, "Order #1");
        assert_eq!(movement.quantity, 5);
    }
}
