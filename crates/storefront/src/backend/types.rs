//! Wire types for the gym REST backend.
//!
//! The backend speaks camelCase JSON and its documents carry either `id` or
//! `_id`. Anything that needs business rules is converted into
//! `ironhouse_core` types before use.

use chrono::{DateTime, Utc};
use ironhouse_core::booking::{Availability, BookingSlot, ExistingBooking};
use ironhouse_core::cart::{Cart, CartLine};
use ironhouse_core::discount::{DiscountCode, DiscountError, DiscountKind, DiscountRule};
use ironhouse_core::membership::MembershipPeriod;
use ironhouse_core::{
    BookingId, BookingStatus, CurrencyCode, DiscountId, LockId, OrderId, OrderStatus,
    PaymentOrderId, PlanId, Price, ProductId, ResourceId, ResourceKind, TrainerId, UserId,
    UserRole,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

const fn default_true() -> bool {
    true
}

// =============================================================================
// Catalog
// =============================================================================

/// A shop product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(alias = "_id")]
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub stock: u32,
    #[serde(default, alias = "image")]
    pub image_url: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Product {
    #[must_use]
    pub const fn unit_price(&self, currency: CurrencyCode) -> Price {
        Price::new(self.price, currency)
    }

    /// Whether the product can be put in a cart at all.
    #[must_use]
    pub const fn is_purchasable(&self) -> bool {
        self.is_active && self.stock > 0
    }

    /// A cart line for `quantity` units at the current price and stock.
    #[must_use]
    pub fn cart_line(&self, quantity: u32, currency: CurrencyCode) -> CartLine {
        CartLine {
            product_id: self.id.clone(),
            name: self.name.clone(),
            unit_price: self.unit_price(currency),
            quantity,
            max_stock: Some(self.stock),
            image_url: self.image_url.clone(),
        }
    }
}

/// A membership tariff plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipPlan {
    #[serde(alias = "_id")]
    pub id: PlanId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    pub duration_days: u32,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// A membership a user holds or has held.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    #[serde(alias = "_id")]
    pub id: String,
    pub user_id: UserId,
    pub plan_id: PlanId,
    #[serde(default)]
    pub plan_name: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    #[serde(default)]
    pub payment_id: Option<String>,
}

impl Membership {
    #[must_use]
    pub const fn period(&self) -> MembershipPeriod {
        MembershipPeriod {
            starts_at: self.starts_at,
            ends_at: self.ends_at,
        }
    }
}

/// Trainer working hours as sent by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkingHours {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl From<WorkingHours> for Availability {
    fn from(hours: WorkingHours) -> Self {
        Self {
            start_hour: hours.start_hour,
            end_hour: hours.end_hour,
        }
    }
}

/// A personal trainer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trainer {
    #[serde(alias = "_id")]
    pub id: TrainerId,
    pub name: String,
    #[serde(default)]
    pub specialty: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default, alias = "image")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub hourly_rate: Option<Decimal>,
    #[serde(default)]
    pub availability: Option<WorkingHours>,
}

/// A personal-training booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    #[serde(alias = "_id")]
    pub id: BookingId,
    pub trainer_id: TrainerId,
    #[serde(default)]
    pub trainer_name: Option<String>,
    pub user_id: UserId,
    pub starts_at: DateTime<Utc>,
    pub duration_minutes: u32,
    #[serde(default)]
    pub status: BookingStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Booking {
    #[must_use]
    pub const fn slot(&self) -> BookingSlot {
        BookingSlot {
            starts_at: self.starts_at,
            duration_minutes: self.duration_minutes,
        }
    }

    #[must_use]
    pub fn to_existing(&self) -> ExistingBooking {
        ExistingBooking {
            id: self.id.clone(),
            slot: self.slot(),
            status: self.status,
        }
    }
}

/// Admin-managed content record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    #[serde(alias = "_id")]
    pub id: ResourceId,
    pub title: String,
    #[serde(rename = "type", alias = "kind", default)]
    pub kind: ResourceKind,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub event_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub position: Option<i32>,
}

// =============================================================================
// Discounts
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    Percentage,
    Fixed,
}

/// A discount code record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Discount {
    #[serde(alias = "_id")]
    pub id: DiscountId,
    pub code: String,
    pub discount_type: DiscountType,
    pub value: Decimal,
    #[serde(default)]
    pub min_order_amount: Option<Decimal>,
    #[serde(default)]
    pub max_discount_amount: Option<Decimal>,
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub usage_limit: Option<u32>,
    #[serde(default)]
    pub used_count: u32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl Discount {
    /// Convert into a rule priced in `currency`.
    ///
    /// # Errors
    ///
    /// Returns `DiscountError::InvalidCode` if the stored code is malformed.
    pub fn to_rule(&self, currency: CurrencyCode) -> Result<DiscountRule, DiscountError> {
        let kind = match self.discount_type {
            DiscountType::Percentage => DiscountKind::Percentage {
                percent: self.value,
            },
            DiscountType::Fixed => DiscountKind::Fixed {
                amount: Price::new(self.value, currency),
            },
        };
        Ok(DiscountRule {
            code: DiscountCode::parse(&self.code)?,
            kind,
            min_order: self.min_order_amount.map(|a| Price::new(a, currency)),
            max_discount: self.max_discount_amount.map(|a| Price::new(a, currency)),
            starts_at: self.starts_at,
            ends_at: self.expires_at,
            usage_limit: self.usage_limit,
            usage_count: self.used_count,
            active: self.is_active,
        })
    }
}

// =============================================================================
// Cart and stock locks
// =============================================================================

/// The backend's copy of a user's cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendCart {
    #[serde(default)]
    pub items: Vec<BackendCartItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendCartItem {
    pub product_id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub quantity: u32,
    #[serde(default, alias = "image")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub stock: Option<u32>,
}

impl BackendCart {
    #[must_use]
    pub fn to_cart(&self, currency: CurrencyCode) -> Cart {
        self.items
            .iter()
            .map(|item| CartLine {
                product_id: item.product_id.clone(),
                name: item.name.clone(),
                unit_price: Price::new(item.price, currency),
                quantity: item.quantity,
                max_stock: item.stock,
                image_url: item.image_url.clone(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuantityRequest {
    pub quantity: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LockRequest<'a> {
    pub user_id: &'a UserId,
    pub quantity: u32,
}

/// Response to a stock lock.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockLock {
    #[serde(default)]
    pub lock_id: Option<LockId>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Payments and orders
// =============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineRequest<'a> {
    pub product_id: &'a ProductId,
    pub quantity: u32,
}

/// Create a payment order for the cart contents.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest<'a> {
    pub user_id: &'a UserId,
    pub items: Vec<OrderLineRequest<'a>>,
    /// Minor units.
    pub amount: i64,
    pub currency: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_code: Option<&'a str>,
}

/// Create a payment order for a membership plan.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanOrderRequest<'a> {
    pub user_id: &'a UserId,
    pub plan_id: &'a PlanId,
    pub amount: i64,
    pub currency: &'static str,
}

/// A payment-gateway order created by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOrder {
    #[serde(alias = "id")]
    pub order_id: PaymentOrderId,
    pub amount: i64,
    pub currency: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentRequest<'a> {
    pub user_id: &'a UserId,
    pub order_id: &'a PaymentOrderId,
    pub payment_id: &'a str,
    pub signature: &'a str,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentVerification {
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub order_id: Option<OrderId>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: u32,
    pub price: Decimal,
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(alias = "_id")]
    pub id: OrderId,
    pub user_id: UserId,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    pub amount: Decimal,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub payment_id: Option<String>,
    #[serde(default)]
    pub discount_code: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeRequest<'a> {
    pub user_id: &'a UserId,
    pub plan_id: &'a PlanId,
    pub payment_id: &'a str,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookRequest<'a> {
    pub user_id: &'a UserId,
    pub starts_at: DateTime<Utc>,
    pub duration_minutes: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<&'a str>,
}

// =============================================================================
// Users and auth
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(alias = "_id")]
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Bearer token issued by the backend on login.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken([REDACTED])")
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: AccessToken,
    pub user: User,
}

/// Generic `{ "message": ... }` acknowledgement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOtpRequest<'a> {
    pub email: &'a str,
    pub otp: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailRequest<'a> {
    pub email: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest<'a> {
    pub email: &'a str,
    pub otp: &'a str,
    pub new_password: &'a str,
}

// =============================================================================
// Admin inputs
// =============================================================================
//
// Accepted from the admin UI in snake_case and forwarded in camelCase.

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct ProductInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    pub category: Option<String>,
    pub stock: u32,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct PlanInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    pub duration_days: u32,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct ResourceInput {
    pub title: String,
    #[serde(rename(serialize = "type"))]
    pub kind: ResourceKind,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub event_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub position: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct DiscountInput {
    pub code: String,
    pub discount_type: DiscountType,
    pub value: Decimal,
    #[serde(default)]
    pub min_order_amount: Option<Decimal>,
    #[serde(default)]
    pub max_discount_amount: Option<Decimal>,
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub usage_limit: Option<u32>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_product_accepts_mongo_style_ids_and_numbers() {
        let product: Product = serde_json::from_value(json!({
            "_id": "665f1c",
            "name": "Whey Protein 1kg",
            "price": 2499.5,
            "stock": 12,
            "image": "https://cdn.example.in/whey.jpg"
        }))
        .unwrap();

        assert_eq!(product.id.as_str(), "665f1c");
        assert_eq!(product.price, Decimal::new(24995, 1));
        assert!(product.is_active);
        assert!(product.is_purchasable());
        assert_eq!(
            product.image_url.as_deref(),
            Some("https://cdn.example.in/whey.jpg")
        );
    }

    #[test]
    fn test_discount_to_rule() {
        let discount: Discount = serde_json::from_value(json!({
            "id": "d1",
            "code": "fit10",
            "discountType": "percentage",
            "value": 10,
            "minOrderAmount": 999,
            "usageLimit": 50,
            "usedCount": 3
        }))
        .unwrap();

        let rule = discount.to_rule(CurrencyCode::INR).unwrap();
        assert_eq!(rule.code.as_str(), "FIT10");
        assert_eq!(
            rule.min_order,
            Some(Price::new(Decimal::new(999, 0), CurrencyCode::INR))
        );
        assert_eq!(rule.usage_count, 3);
        assert!(rule.active);
    }

    #[test]
    fn test_resource_kind_from_type_field() {
        let resource: Resource = serde_json::from_value(json!({
            "id": "r1",
            "title": "logo",
            "type": "logo",
            "url": "https://cdn.example.in/logo.svg"
        }))
        .unwrap();
        assert_eq!(resource.kind, ResourceKind::Logo);
    }

    #[test]
    fn test_admin_input_forwarded_in_camel_case() {
        let input: ProductInput = serde_json::from_value(json!({
            "name": "Lifting Belt",
            "price": "1899.00",
            "stock": 7,
            "image_url": "https://cdn.example.in/belt.jpg"
        }))
        .unwrap();

        let wire = serde_json::to_value(&input).unwrap();
        assert_eq!(wire["imageUrl"], "https://cdn.example.in/belt.jpg");
        assert_eq!(wire["isActive"], true);
    }

    #[test]
    fn test_backend_cart_to_core_cart() {
        let cart: BackendCart = serde_json::from_value(json!({
            "items": [
                { "productId": "p1", "name": "Shaker", "price": 349, "quantity": 2 },
                { "productId": "p2", "name": "Chalk", "price": 199, "quantity": 1, "stock": 4 }
            ]
        }))
        .unwrap();

        let core = cart.to_cart(CurrencyCode::INR);
        assert_eq!(core.item_count(), 3);
        assert_eq!(
            core.subtotal(CurrencyCode::INR).unwrap().amount,
            Decimal::new(897, 0)
        );
    }

    #[test]
    fn test_access_token_debug_is_redacted() {
        let token = AccessToken::new("eyJhbGciOi.secret.sig");
        assert!(!format!("{token:?}").contains("secret"));
    }
}
