//! Admin dashboard aggregates.
//!
//! The backend has no reporting endpoints, so the summary is computed here
//! from the full order, user and product lists.

use std::collections::HashMap;

use ironhouse_core::{CurrencyCode, OrderStatus, Price, ProductId, UserRole};
use serde::Serialize;
use tracing::instrument;

use crate::backend::{AccessToken, BackendError, GymApiClient, Order, Product, User};

/// Products at or below this stock level are flagged.
pub const LOW_STOCK_THRESHOLD: u32 = 5;
const TOP_PRODUCTS: usize = 5;
const RECENT_ORDERS: usize = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OrderCounts {
    pub total: usize,
    pub created: usize,
    pub paid: usize,
    pub failed: usize,
    pub cancelled: usize,
    pub refunded: usize,
}

impl OrderCounts {
    fn record(&mut self, status: OrderStatus) {
        self.total += 1;
        let slot = match status {
            OrderStatus::Created => &mut self.created,
            OrderStatus::Paid => &mut self.paid,
            OrderStatus::Failed => &mut self.failed,
            OrderStatus::Cancelled => &mut self.cancelled,
            OrderStatus::Refunded => &mut self.refunded,
        };
        *slot += 1;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LowStockProduct {
    pub id: ProductId,
    pub name: String,
    pub stock: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopProduct {
    pub id: ProductId,
    pub name: String,
    pub units_sold: u64,
}

/// Everything the admin dashboard shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardSummary {
    /// Sum of paid orders.
    pub revenue: Price,
    pub orders: OrderCounts,
    pub members: usize,
    pub low_stock: Vec<LowStockProduct>,
    pub top_products: Vec<TopProduct>,
    pub recent_orders: Vec<Order>,
}

/// Build the dashboard summary from raw backend lists.
#[must_use]
pub fn summarize(
    orders: &[Order],
    users: &[User],
    products: &[Product],
    currency: CurrencyCode,
) -> DashboardSummary {
    let mut counts = OrderCounts::default();
    let mut revenue = rust_decimal::Decimal::ZERO;
    let mut units: HashMap<&ProductId, (&str, u64)> = HashMap::new();

    for order in orders {
        counts.record(order.status);
        if !order.status.is_revenue() {
            continue;
        }
        revenue += order.amount;
        for item in &order.items {
            let entry = units
                .entry(&item.product_id)
                .or_insert((item.name.as_str(), 0));
            entry.1 += u64::from(item.quantity);
        }
    }

    let mut top_products: Vec<TopProduct> = units
        .into_iter()
        .map(|(id, (name, units_sold))| TopProduct {
            id: id.clone(),
            name: name.to_string(),
            units_sold,
        })
        .collect();
    top_products.sort_by(|a, b| b.units_sold.cmp(&a.units_sold).then_with(|| a.id.cmp(&b.id)));
    top_products.truncate(TOP_PRODUCTS);

    let mut low_stock: Vec<LowStockProduct> = products
        .iter()
        .filter(|p| p.is_active && p.stock <= LOW_STOCK_THRESHOLD)
        .map(|p| LowStockProduct {
            id: p.id.clone(),
            name: p.name.clone(),
            stock: p.stock,
        })
        .collect();
    low_stock.sort_by(|a, b| a.stock.cmp(&b.stock).then_with(|| a.name.cmp(&b.name)));

    let mut recent_orders = orders.to_vec();
    recent_orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    recent_orders.truncate(RECENT_ORDERS);

    DashboardSummary {
        revenue: Price::new(revenue, currency).round_to_cents(),
        orders: counts,
        members: users.iter().filter(|u| u.role == UserRole::Member).count(),
        low_stock,
        top_products,
        recent_orders,
    }
}

pub struct DashboardService<'a> {
    backend: &'a GymApiClient,
    currency: CurrencyCode,
}

impl<'a> DashboardService<'a> {
    #[must_use]
    pub const fn new(backend: &'a GymApiClient, currency: CurrencyCode) -> Self {
        Self { backend, currency }
    }

    /// Fetch orders, users and products concurrently and summarize them.
    ///
    /// # Errors
    ///
    /// Returns the first backend error.
    #[instrument(skip(self, token))]
    pub async fn summary(&self, token: &AccessToken) -> Result<DashboardSummary, BackendError> {
        let (orders, users, products) = tokio::try_join!(
            self.backend.get_all_orders(token),
            self.backend.get_users(token),
            self.backend.get_products(),
        )?;
        Ok(summarize(&orders, &users, &products, self.currency))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use ironhouse_core::{OrderId, UserId};
    use rust_decimal::Decimal;

    use super::*;
    use crate::backend::OrderItem;

    fn order(n: i64, status: OrderStatus, amount: i64, items: &[(&str, u32)]) -> Order {
        Order {
            id: OrderId::new(format!("o{n}")),
            user_id: UserId::new("u1"),
            items: items
                .iter()
                .map(|(id, quantity)| OrderItem {
                    product_id: ProductId::new(*id),
                    name: format!("Product {id}"),
                    quantity: *quantity,
                    price: Decimal::new(100, 0),
                })
                .collect(),
            amount: Decimal::new(amount, 0),
            status,
            payment_id: None,
            discount_code: None,
            created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap() + Duration::hours(n),
        }
    }

    fn product(id: &str, stock: u32, active: bool) -> Product {
        Product {
            id: ProductId::new(id),
            name: id.to_uppercase(),
            description: String::new(),
            price: Decimal::new(500, 0),
            category: None,
            stock,
            image_url: None,
            is_active: active,
            created_at: None,
        }
    }

    fn user(id: &str, role: UserRole) -> User {
        User {
            id: UserId::new(id),
            name: id.to_string(),
            email: format!("{id}@example.com"),
            phone: None,
            role,
            created_at: None,
        }
    }

    #[test]
    fn test_revenue_counts_paid_orders_only() {
        let orders = vec![
            order(1, OrderStatus::Paid, 1000, &[("whey", 2)]),
            order(2, OrderStatus::Created, 700, &[("whey", 5)]),
            order(3, OrderStatus::Paid, 250, &[("band", 1)]),
            order(4, OrderStatus::Refunded, 400, &[("band", 9)]),
        ];
        let summary = summarize(&orders, &[], &[], CurrencyCode::INR);

        assert_eq!(summary.revenue.amount, Decimal::new(1250, 0));
        assert_eq!(summary.orders.total, 4);
        assert_eq!(summary.orders.paid, 2);
        assert_eq!(summary.orders.created, 1);
        assert_eq!(summary.orders.refunded, 1);

        // Units only count for paid orders.
        assert_eq!(summary.top_products[0].id, ProductId::new("whey"));
        assert_eq!(summary.top_products[0].units_sold, 2);
        assert_eq!(summary.top_products[1].units_sold, 1);
    }

    #[test]
    fn test_top_products_capped_at_five() {
        let orders: Vec<Order> = (0..8)
            .map(|i| {
                let id = format!("p{i}");
                let qty = u32::try_from(i + 1).unwrap();
                order(i, OrderStatus::Paid, 10, &[(id.as_str(), qty)])
            })
            .collect();
        let summary = summarize(&orders, &[], &[], CurrencyCode::INR);

        assert_eq!(summary.top_products.len(), 5);
        assert_eq!(summary.top_products[0].id, ProductId::new("p7"));
        assert_eq!(summary.top_products[0].units_sold, 8);
    }

    #[test]
    fn test_recent_orders_newest_first() {
        let orders: Vec<Order> = (0..12)
            .map(|i| order(i, OrderStatus::Paid, 10, &[]))
            .collect();
        let summary = summarize(&orders, &[], &[], CurrencyCode::INR);

        assert_eq!(summary.recent_orders.len(), 10);
        assert_eq!(summary.recent_orders[0].id, OrderId::new("o11"));
        assert_eq!(summary.recent_orders[9].id, OrderId::new("o2"));
    }

    #[test]
    fn test_low_stock_and_members() {
        let products = vec![
            product("mat", 5, true),
            product("rope", 0, true),
            product("bench", 6, true),
            product("old", 1, false),
        ];
        let users = vec![
            user("a", UserRole::Member),
            user("b", UserRole::Admin),
            user("c", UserRole::Member),
            user("d", UserRole::Trainer),
        ];
        let summary = summarize(&[], &users, &products, CurrencyCode::INR);

        let low: Vec<&str> = summary.low_stock.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(low, vec!["rope", "mat"]);
        assert_eq!(summary.members, 2);
        assert!(summary.revenue.is_zero());
    }
}
