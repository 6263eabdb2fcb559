//! Computed properties — customer attributes derived on read.
//!
//! `totalSpend` is not stored on the customer record; it is rolled up from
//! order history each time snapshots are built.

use campaign_core::types::{Customer, CustomerSnapshot, Order, OrderStatus};
use std::collections::HashMap;

/// Per-customer spend totals over completed orders.
#[derive(Debug, Clone, Default)]
pub struct SpendRollup {
    totals: HashMap<String, f64>,
}

impl SpendRollup {
    pub fn from_orders<'a>(orders: impl IntoIterator<Item = &'a Order>) -> Self {
        let mut totals: HashMap<String, f64> = HashMap::new();
        for order in orders {
            if order.status == OrderStatus::Completed {
                *totals.entry(order.customer_id.clone()).or_default() += order.amount;
            }
        }
        Self { totals }
    }

    pub fn total_for(&self, customer_id: &str) -> f64 {
        self.totals.get(customer_id).copied().unwrap_or(0.0)
    }

    pub fn snapshot(&self, customer: &Customer) -> CustomerSnapshot {
        customer.snapshot(self.total_for(&customer.customer_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn order(customer_id: &str, amount: f64, status: OrderStatus) -> Order {
        Order {
            order_id: format!("ORD-{customer_id}-{amount}"),
            customer_id: customer_id.to_string(),
            customer_name: "Test".to_string(),
            amount,
            status,
            order_date: Utc::now(),
            description: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_only_completed_orders_count() {
        let orders = vec![
            order("CUST-1", 1200.0, OrderStatus::Completed),
            order("CUST-1", 300.0, OrderStatus::Completed),
            order("CUST-1", 999.0, OrderStatus::Cancelled),
            order("CUST-2", 50.0, OrderStatus::Pending),
        ];
        let rollup = SpendRollup::from_orders(&orders);
        assert_eq!(rollup.total_for("CUST-1"), 1500.0);
        assert_eq!(rollup.total_for("CUST-2"), 0.0);
        assert_eq!(rollup.total_for("CUST-9"), 0.0);
        assert_eq!(rollup.totals.len(), 1);
    }

    #[test]
    fn test_snapshot_carries_rollup() {
        let now = Utc::now();
        let customer = Customer {
            customer_id: "CUST-1".to_string(),
            name: "Lena".to_string(),
            email: "lena@example.com".to_string(),
            phone: String::new(),
            visit_count: 4,
            last_active: now,
            created_at: now,
            updated_at: now,
        };
        let rollup = SpendRollup::from_orders(&[order("CUST-1", 75.5, OrderStatus::Completed)]);
        let snapshot = rollup.snapshot(&customer);
        assert_eq!(snapshot.total_spend, 75.5);
        assert_eq!(snapshot.visit_count, 4);
    }
}
