//! In-memory stand-in for the gym REST backend.
//!
//! Serves the endpoints the storefront calls, with seeded products, accounts,
//! a discount code, membership plans and a trainer. Stock lock traffic is
//! recorded so tests can check that nothing stays reserved after a failed
//! checkout, and a few switches on [`StubData`] make payment and membership
//! calls fail on demand.

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    Json, Router,
    extract::{Path, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use chrono::{DateTime, Duration, Utc};
use ironhouse_core::{
    BookingId, BookingStatus, DiscountId, LockId, OrderId, PaymentOrderId, PlanId, ProductId,
    TrainerId, UserId, UserRole,
};
use ironhouse_storefront::backend::{
    BackendCart, BackendCartItem, Booking, Discount, DiscountType, Membership, MembershipPlan,
    Order, PaymentOrder, PaymentVerification, Product, StockLock, Trainer, User, WorkingHours,
};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use url::Url;

pub const API_KEY: &str = "gk_test_7Hq2mVx9Lp4Rz8Wc";
pub const PASSWORD: &str = "Ir0nhouse!Lift9";
pub const VALID_OTP: &str = "424242";
pub const VALID_SIGNATURE: &str = "sig_valid";

pub const MEMBER_ID: &str = "u-member";
pub const MONTHLY_PLAN_ID: &str = "plan-monthly";
pub const RETIRED_PLAN_ID: &str = "plan-founders";
pub const TRAINER_ID: &str = "t-kiran";
pub const MEMBER_EMAIL: &str = "member@ironhouse.test";
pub const ADMIN_EMAIL: &str = "admin@ironhouse.test";

/// A stock lock or release seen by the stub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockEvent {
    Locked { product_id: String, quantity: u32 },
    Released { product_id: String, quantity: u32 },
}

/// Everything the stub backend knows.
#[derive(Debug, Default)]
pub struct StubData {
    pub products: Vec<Product>,
    pub users: Vec<User>,
    pub carts: HashMap<String, Vec<BackendCartItem>>,
    pub discounts: Vec<Discount>,
    pub orders: Vec<Order>,
    pub lock_events: Vec<LockEvent>,
    /// Products whose stock locks are refused with 409.
    pub refuse_locks: HashSet<String>,
    pub payment_orders: Vec<String>,
    /// Emails that signed up but have not verified their OTP yet.
    pub pending_signups: HashMap<String, String>,
    pub plans: Vec<MembershipPlan>,
    pub memberships: Vec<Membership>,
    pub trainers: Vec<Trainer>,
    pub bookings: Vec<Booking>,
    /// Answer payment order creation with 500.
    pub fail_payment_orders: bool,
    /// Amount put on created payment orders instead of the requested one.
    pub payment_order_amount: Option<i64>,
    /// Answer membership listing with 503.
    pub fail_membership_reads: bool,
    /// How many upcoming subscribe calls answer 503.
    pub failing_subscriptions: u32,
    pub verify_calls: u32,
    pub subscribe_calls: u32,
}

type Shared = Arc<Mutex<StubData>>;

/// Handle to a running stub backend.
#[derive(Clone)]
pub struct StubBackend {
    addr: SocketAddr,
    data: Shared,
}

impl StubBackend {
    /// Seed the data and start serving on an ephemeral port.
    pub async fn start() -> Self {
        let data: Shared = Arc::new(Mutex::new(seed()));
        let addr = crate::serve(router(Arc::clone(&data))).await;
        Self { addr, data }
    }

    /// # Panics
    ///
    /// Panics if the address does not form a URL, which cannot happen.
    #[must_use]
    pub fn base_url(&self) -> Url {
        Url::parse(&format!("http://{}", self.addr)).expect("Stub address is a valid URL")
    }

    /// Lock the stub data for inspection or setup.
    ///
    /// # Panics
    ///
    /// Panics if a stub handler panicked while holding the lock.
    pub fn data(&self) -> MutexGuard<'_, StubData> {
        self.data.lock().expect("Stub data poisoned")
    }

    #[must_use]
    pub fn lock_events(&self) -> Vec<LockEvent> {
        self.data().lock_events.clone()
    }

    /// Units of `product_id` in a member's backend cart.
    #[must_use]
    pub fn cart_quantity(&self, user_id: &str, product_id: &str) -> u32 {
        self.data()
            .carts
            .get(user_id)
            .and_then(|items| items.iter().find(|i| i.product_id.as_str() == product_id))
            .map_or(0, |i| i.quantity)
    }

    /// Add an in-stock product to the catalogue.
    pub fn add_product(&self, id: &str, name: &str, price: i64, stock: u32) {
        self.data().products.push(product(id, name, price, stock, "gear"));
    }

    /// Put items straight into a member's backend cart.
    pub fn seed_cart(&self, user_id: &str, items: &[(&str, u32)]) {
        let mut data = self.data();
        let lines = items
            .iter()
            .filter_map(|(id, qty)| {
                data.products
                    .iter()
                    .find(|p| p.id.as_str() == *id)
                    .map(|p| cart_item(p, *qty))
            })
            .collect();
        data.carts.insert(user_id.to_string(), lines);
    }
}

// =============================================================================
// Seed data
// =============================================================================

fn product(id: &str, name: &str, price: i64, stock: u32, category: &str) -> Product {
    Product {
        id: ProductId::new(id),
        name: name.to_string(),
        description: String::new(),
        price: Decimal::new(price, 0),
        category: Some(category.to_string()),
        stock,
        image_url: None,
        is_active: true,
        created_at: None,
    }
}

fn user(id: &str, name: &str, email: &str, role: UserRole) -> User {
    User {
        id: UserId::new(id),
        name: name.to_string(),
        email: email.to_string(),
        phone: None,
        role,
        created_at: None,
    }
}

fn plan(id: &str, name: &str, price: i64, duration_days: u32, is_active: bool) -> MembershipPlan {
    MembershipPlan {
        id: PlanId::new(id),
        name: name.to_string(),
        description: String::new(),
        price: Decimal::new(price, 0),
        duration_days,
        features: vec!["Open gym".to_string()],
        is_active,
    }
}

/// Whole seconds, so timestamps survive a JSON round trip unchanged.
fn seconds_from_now(seconds: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(Utc::now().timestamp() + seconds, 0).expect("Timestamp in range")
}

fn seed() -> StubData {
    let mut retired = product("p-tee", "Founders Tee", 799, 5, "apparel");
    retired.is_active = false;
    let day = Duration::days(1).num_seconds();

    StubData {
        products: vec![
            product("p-whey", "Whey Protein 1kg", 2499, 10, "supplements"),
            product("p-belt", "Lifting Belt", 1899, 3, "gear"),
            product("p-chalk", "Liquid Chalk", 299, 0, "gear"),
            retired,
        ],
        users: vec![
            user(MEMBER_ID, "Asha Rao", MEMBER_EMAIL, UserRole::Member),
            user("u-admin", "Front Desk", ADMIN_EMAIL, UserRole::Admin),
        ],
        discounts: vec![Discount {
            id: DiscountId::new("d-fit10"),
            code: "FIT10".to_string(),
            discount_type: DiscountType::Percentage,
            value: Decimal::new(10, 0),
            min_order_amount: None,
            max_discount_amount: None,
            starts_at: None,
            expires_at: None,
            usage_limit: None,
            used_count: 0,
            is_active: true,
        }],
        plans: vec![
            plan(MONTHLY_PLAN_ID, "Monthly Strength", 1499, 30, true),
            plan(RETIRED_PLAN_ID, "Founders Annual", 9999, 365, false),
        ],
        memberships: vec![Membership {
            id: "m-1".to_string(),
            user_id: UserId::new(MEMBER_ID),
            plan_id: PlanId::new(MONTHLY_PLAN_ID),
            plan_name: Some("Monthly Strength".to_string()),
            starts_at: seconds_from_now(-20 * day),
            ends_at: seconds_from_now(10 * day),
            payment_id: Some("pay_seeded".to_string()),
        }],
        trainers: vec![Trainer {
            id: TrainerId::new(TRAINER_ID),
            name: "Kiran Mehta".to_string(),
            specialty: Some("Powerlifting".to_string()),
            bio: None,
            image_url: None,
            hourly_rate: Some(Decimal::new(1200, 0)),
            availability: Some(WorkingHours {
                start_hour: 6,
                end_hour: 21,
            }),
        }],
        ..StubData::default()
    }
}

fn cart_item(product: &Product, quantity: u32) -> BackendCartItem {
    BackendCartItem {
        product_id: product.id.clone(),
        name: product.name.clone(),
        price: product.price,
        quantity,
        image_url: product.image_url.clone(),
        stock: Some(product.stock),
    }
}

fn token_for(user: &User) -> String {
    format!("token-{}", user.id)
}

// =============================================================================
// Router
// =============================================================================

fn router(data: Shared) -> Router {
    Router::new()
        .route("/api/auth/signup", post(signup))
        .route("/api/auth/verify-otp", post(verify_otp))
        .route("/api/auth/resend-otp", post(acknowledge))
        .route("/api/auth/login", post(login))
        .route("/api/auth/forgot-password", post(forgot_password))
        .route("/api/auth/reset-password", post(reset_password))
        .route("/api/products/AllProducts", get(all_products))
        .route("/api/products/{id}", get(product_by_id))
        .route("/api/products/LockStock/{id}", post(lock_stock))
        .route("/api/products/ReleaseLock/{id}", post(release_lock))
        .route("/api/Cart/{user_id}", get(get_cart))
        .route("/api/Cart/AddToCart/{user_id}/{product_id}", post(add_to_cart))
        .route(
            "/api/Cart/UpdateQuantity/{user_id}/{product_id}",
            put(update_quantity),
        )
        .route(
            "/api/Cart/RemoveFromCart/{user_id}/{product_id}",
            delete(remove_from_cart),
        )
        .route("/api/Cart/ClearCart/{user_id}", delete(clear_cart))
        .route("/api/Discounts/code/{code}", get(discount_by_code))
        .route("/api/Payment/create-order-multiple", post(create_order))
        .route("/api/Payment/create-order-plan", post(create_order))
        .route("/api/Payment/verify-payment", post(verify_payment))
        .route("/api/MembershipPlans", get(all_plans))
        .route("/api/MembershipPlans/{id}", get(plan_by_id))
        .route("/api/Membership/user/{user_id}", get(user_memberships))
        .route("/api/Membership/subscribe", post(subscribe))
        .route("/api/Trainers", get(all_trainers))
        .route("/api/Trainers/{id}", get(trainer_by_id))
        .route("/api/Trainers/{id}/book", post(book_trainer))
        .route("/api/Bookings/user/{user_id}", get(user_bookings))
        .route("/api/Bookings/{id}", delete(cancel_booking))
        .route("/api/Orders", get(all_orders))
        .route("/api/users", get(all_users))
        .route("/api/Resources", get(no_resources))
        .layer(axum::middleware::from_fn(require_api_key))
        .with_state(data)
}

async fn require_api_key(request: Request, next: Next) -> Response {
    let key = request
        .headers()
        .get("x-api-key")
        .and_then(|v| v.to_str().ok());
    if key != Some(API_KEY) {
        return error(StatusCode::UNAUTHORIZED, "invalid api key");
    }
    next.run(request).await
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

fn lock(data: &Shared) -> MutexGuard<'_, StubData> {
    data.lock().expect("Stub data poisoned")
}

/// The account a bearer token belongs to.
fn bearer_user(headers: &HeaderMap, data: &StubData) -> Option<User> {
    let token = headers
        .get("authorization")?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")?;
    data.users.iter().find(|u| token_for(u) == token).cloned()
}

/// Require the bearer to be `user_id` itself.
fn require_owner(headers: &HeaderMap, data: &StubData, user_id: &str) -> Result<(), Response> {
    match bearer_user(headers, data) {
        Some(user) if user.id.as_str() == user_id => Ok(()),
        Some(_) => Err(error(StatusCode::FORBIDDEN, "not your account")),
        None => Err(error(StatusCode::UNAUTHORIZED, "invalid token")),
    }
}

fn require_admin(headers: &HeaderMap, data: &StubData) -> Result<(), Response> {
    match bearer_user(headers, data) {
        Some(user) if user.role == UserRole::Admin => Ok(()),
        Some(_) => Err(error(StatusCode::FORBIDDEN, "admin only")),
        None => Err(error(StatusCode::UNAUTHORIZED, "invalid token")),
    }
}

fn time_field(body: &Value, field: &str) -> Option<DateTime<Utc>> {
    body.get(field)
        .cloned()
        .and_then(|v| serde_json::from_value(v).ok())
}

fn str_field<'a>(body: &'a Value, field: &str) -> &'a str {
    body.get(field).and_then(Value::as_str).unwrap_or_default()
}

fn quantity(body: &Value) -> u32 {
    quantity_field(body, "quantity")
}

fn quantity_field(body: &Value, field: &str) -> u32 {
    body.get(field)
        .and_then(Value::as_u64)
        .and_then(|q| u32::try_from(q).ok())
        .unwrap_or(0)
}

fn auth_response(user: &User) -> Response {
    Json(json!({ "token": token_for(user), "user": user })).into_response()
}

// =============================================================================
// Auth
// =============================================================================

async fn signup(State(data): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut data = lock(&data);
    let email = str_field(&body, "email").to_lowercase();
    if data.users.iter().any(|u| u.email == email) {
        return error(StatusCode::CONFLICT, "Email already registered");
    }
    let name = str_field(&body, "name").to_string();
    data.pending_signups.insert(email, name);
    Json(json!({ "message": "OTP sent" })).into_response()
}

async fn verify_otp(State(data): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut data = lock(&data);
    if str_field(&body, "otp") != VALID_OTP {
        return error(StatusCode::BAD_REQUEST, "Invalid OTP");
    }
    let email = str_field(&body, "email").to_lowercase();
    let Some(name) = data.pending_signups.remove(&email) else {
        return error(StatusCode::NOT_FOUND, "No pending signup");
    };
    let id = format!("u-{}", data.users.len() + 1);
    let created = user(&id, &name, &email, UserRole::Member);
    data.users.push(created.clone());
    auth_response(&created)
}

async fn acknowledge() -> Response {
    Json(json!({ "message": "OK" })).into_response()
}

async fn login(State(data): State<Shared>, Json(body): Json<Value>) -> Response {
    let data = lock(&data);
    let email = str_field(&body, "email").to_lowercase();
    match data.users.iter().find(|u| u.email == email) {
        Some(user) if str_field(&body, "password") == PASSWORD => auth_response(user),
        _ => error(StatusCode::UNAUTHORIZED, "Invalid email or password"),
    }
}

async fn forgot_password(State(data): State<Shared>, Json(body): Json<Value>) -> Response {
    let data = lock(&data);
    let email = str_field(&body, "email").to_lowercase();
    if data.users.iter().any(|u| u.email == email) {
        Json(json!({ "message": "Reset code sent" })).into_response()
    } else {
        error(StatusCode::NOT_FOUND, "User not found")
    }
}

async fn reset_password(Json(body): Json<Value>) -> Response {
    if str_field(&body, "otp") == VALID_OTP {
        Json(json!({ "message": "Password updated" })).into_response()
    } else {
        error(StatusCode::BAD_REQUEST, "Invalid OTP")
    }
}

// =============================================================================
// Products and stock locks
// =============================================================================

async fn all_products(State(data): State<Shared>) -> Json<Vec<Product>> {
    Json(lock(&data).products.clone())
}

async fn product_by_id(State(data): State<Shared>, Path(id): Path<String>) -> Response {
    match lock(&data).products.iter().find(|p| p.id.as_str() == id) {
        Some(product) => Json(product.clone()).into_response(),
        None => error(StatusCode::NOT_FOUND, "Product not found"),
    }
}

async fn lock_stock(
    State(data): State<Shared>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let mut data = lock(&data);
    if data.refuse_locks.contains(&id) {
        return error(StatusCode::CONFLICT, "Stock already locked");
    }
    data.lock_events.push(LockEvent::Locked {
        product_id: id,
        quantity: quantity(&body),
    });
    let lock_id = LockId::new(format!("lock-{}", data.lock_events.len()));
    Json(StockLock {
        lock_id: Some(lock_id),
        expires_at: None,
    })
    .into_response()
}

async fn release_lock(
    State(data): State<Shared>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> StatusCode {
    lock(&data).lock_events.push(LockEvent::Released {
        product_id: id,
        quantity: quantity(&body),
    });
    StatusCode::NO_CONTENT
}

// =============================================================================
// Carts
// =============================================================================

async fn get_cart(
    State(data): State<Shared>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
) -> Response {
    let data = lock(&data);
    if let Err(rejection) = require_owner(&headers, &data, &user_id) {
        return rejection;
    }
    let items = data.carts.get(&user_id).cloned().unwrap_or_default();
    Json(BackendCart { items }).into_response()
}

async fn add_to_cart(
    State(data): State<Shared>,
    headers: HeaderMap,
    Path((user_id, product_id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Response {
    let mut data = lock(&data);
    if let Err(rejection) = require_owner(&headers, &data, &user_id) {
        return rejection;
    }
    let Some(product) = data
        .products
        .iter()
        .find(|p| p.id.as_str() == product_id)
        .cloned()
    else {
        return error(StatusCode::NOT_FOUND, "Product not found");
    };

    let added = quantity(&body);
    let items = data.carts.entry(user_id).or_default();
    match items.iter_mut().find(|i| i.product_id == product.id) {
        Some(item) => item.quantity += added,
        None => items.push(cart_item(&product, added)),
    }
    StatusCode::OK.into_response()
}

async fn update_quantity(
    State(data): State<Shared>,
    headers: HeaderMap,
    Path((user_id, product_id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Response {
    let mut data = lock(&data);
    if let Err(rejection) = require_owner(&headers, &data, &user_id) {
        return rejection;
    }
    let new_quantity = quantity(&body);
    match data
        .carts
        .get_mut(&user_id)
        .and_then(|items| items.iter_mut().find(|i| i.product_id.as_str() == product_id))
    {
        Some(item) => {
            item.quantity = new_quantity;
            StatusCode::OK.into_response()
        }
        None => error(StatusCode::NOT_FOUND, "Item not in cart"),
    }
}

async fn remove_from_cart(
    State(data): State<Shared>,
    headers: HeaderMap,
    Path((user_id, product_id)): Path<(String, String)>,
) -> Response {
    let mut data = lock(&data);
    if let Err(rejection) = require_owner(&headers, &data, &user_id) {
        return rejection;
    }
    if let Some(items) = data.carts.get_mut(&user_id) {
        items.retain(|i| i.product_id.as_str() != product_id);
    }
    StatusCode::OK.into_response()
}

async fn clear_cart(
    State(data): State<Shared>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
) -> Response {
    let mut data = lock(&data);
    if let Err(rejection) = require_owner(&headers, &data, &user_id) {
        return rejection;
    }
    data.carts.remove(&user_id);
    StatusCode::OK.into_response()
}

// =============================================================================
// Discounts, payments and admin lists
// =============================================================================

async fn discount_by_code(State(data): State<Shared>, Path(code): Path<String>) -> Response {
    match lock(&data)
        .discounts
        .iter()
        .find(|d| d.code.eq_ignore_ascii_case(&code))
    {
        Some(discount) => Json(discount.clone()).into_response(),
        None => error(StatusCode::NOT_FOUND, "Discount not found"),
    }
}

async fn create_order(State(data): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut data = lock(&data);
    if data.fail_payment_orders {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "Payment gateway unavailable");
    }
    let requested = body.get("amount").and_then(Value::as_i64).unwrap_or(0);
    let order_id = format!("order_{}", data.payment_orders.len() + 1);
    data.payment_orders.push(order_id.clone());
    Json(PaymentOrder {
        order_id: PaymentOrderId::new(order_id),
        amount: data.payment_order_amount.unwrap_or(requested),
        currency: str_field(&body, "currency").to_string(),
    })
    .into_response()
}

async fn verify_payment(State(data): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut data = lock(&data);
    data.verify_calls += 1;
    let known = data
        .payment_orders
        .iter()
        .any(|id| id == str_field(&body, "orderId"));
    if !known || str_field(&body, "signature") != VALID_SIGNATURE {
        return error(StatusCode::BAD_REQUEST, "Signature mismatch");
    }
    Json(PaymentVerification {
        verified: true,
        order_id: Some(OrderId::new(format!("ord-{}", data.payment_orders.len()))),
        message: None,
    })
    .into_response()
}

async fn all_orders(State(data): State<Shared>, headers: HeaderMap) -> Response {
    let data = lock(&data);
    match require_admin(&headers, &data) {
        Ok(()) => Json(data.orders.clone()).into_response(),
        Err(rejection) => rejection,
    }
}

async fn all_users(State(data): State<Shared>, headers: HeaderMap) -> Response {
    let data = lock(&data);
    match require_admin(&headers, &data) {
        Ok(()) => Json(data.users.clone()).into_response(),
        Err(rejection) => rejection,
    }
}

async fn no_resources() -> Json<Vec<Value>> {
    Json(Vec::new())
}

// =============================================================================
// Memberships
// =============================================================================

async fn all_plans(State(data): State<Shared>) -> Json<Vec<MembershipPlan>> {
    Json(lock(&data).plans.clone())
}

async fn plan_by_id(State(data): State<Shared>, Path(id): Path<String>) -> Response {
    match lock(&data).plans.iter().find(|p| p.id.as_str() == id) {
        Some(plan) => Json(plan.clone()).into_response(),
        None => error(StatusCode::NOT_FOUND, "Plan not found"),
    }
}

async fn user_memberships(
    State(data): State<Shared>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
) -> Response {
    let data = lock(&data);
    if let Err(rejection) = require_owner(&headers, &data, &user_id) {
        return rejection;
    }
    if data.fail_membership_reads {
        return error(StatusCode::SERVICE_UNAVAILABLE, "Membership service down");
    }
    let memberships: Vec<Membership> = data
        .memberships
        .iter()
        .filter(|m| m.user_id.as_str() == user_id)
        .cloned()
        .collect();
    Json(memberships).into_response()
}

async fn subscribe(
    State(data): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut data = lock(&data);
    data.subscribe_calls += 1;
    let user_id = str_field(&body, "userId").to_string();
    if let Err(rejection) = require_owner(&headers, &data, &user_id) {
        return rejection;
    }
    if data.failing_subscriptions > 0 {
        data.failing_subscriptions -= 1;
        return error(StatusCode::SERVICE_UNAVAILABLE, "Membership service down");
    }
    let plan_id = str_field(&body, "planId");
    let Some(plan) = data.plans.iter().find(|p| p.id.as_str() == plan_id).cloned() else {
        return error(StatusCode::NOT_FOUND, "Plan not found");
    };
    let (Some(starts_at), Some(ends_at)) = (time_field(&body, "startsAt"), time_field(&body, "endsAt"))
    else {
        return error(StatusCode::BAD_REQUEST, "startsAt and endsAt are required");
    };

    let membership = Membership {
        id: format!("m-{}", data.memberships.len() + 1),
        user_id: UserId::new(user_id),
        plan_id: plan.id,
        plan_name: Some(plan.name),
        starts_at,
        ends_at,
        payment_id: Some(str_field(&body, "paymentId").to_string()),
    };
    data.memberships.push(membership.clone());
    (StatusCode::CREATED, Json(membership)).into_response()
}

// =============================================================================
// Trainers and bookings
// =============================================================================

async fn all_trainers(State(data): State<Shared>) -> Json<Vec<Trainer>> {
    Json(lock(&data).trainers.clone())
}

async fn trainer_by_id(State(data): State<Shared>, Path(id): Path<String>) -> Response {
    match lock(&data).trainers.iter().find(|t| t.id.as_str() == id) {
        Some(trainer) => Json(trainer.clone()).into_response(),
        None => error(StatusCode::NOT_FOUND, "Trainer not found"),
    }
}

async fn book_trainer(
    State(data): State<Shared>,
    headers: HeaderMap,
    Path(trainer_id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let mut data = lock(&data);
    let user_id = str_field(&body, "userId").to_string();
    if let Err(rejection) = require_owner(&headers, &data, &user_id) {
        return rejection;
    }
    let Some(trainer) = data
        .trainers
        .iter()
        .find(|t| t.id.as_str() == trainer_id)
        .cloned()
    else {
        return error(StatusCode::NOT_FOUND, "Trainer not found");
    };
    let Some(starts_at) = time_field(&body, "startsAt") else {
        return error(StatusCode::BAD_REQUEST, "startsAt is required");
    };

    let booking = Booking {
        id: BookingId::new(format!("b-{}", data.bookings.len() + 1)),
        trainer_id: trainer.id,
        trainer_name: Some(trainer.name),
        user_id: UserId::new(user_id),
        starts_at,
        duration_minutes: quantity_field(&body, "durationMinutes"),
        status: BookingStatus::Confirmed,
        notes: body.get("notes").and_then(Value::as_str).map(str::to_string),
    };
    data.bookings.push(booking.clone());
    (StatusCode::CREATED, Json(booking)).into_response()
}

async fn user_bookings(
    State(data): State<Shared>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
) -> Response {
    let data = lock(&data);
    if let Err(rejection) = require_owner(&headers, &data, &user_id) {
        return rejection;
    }
    let bookings: Vec<Booking> = data
        .bookings
        .iter()
        .filter(|b| b.user_id.as_str() == user_id)
        .cloned()
        .collect();
    Json(bookings).into_response()
}

async fn cancel_booking(
    State(data): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let mut data = lock(&data);
    let Some(owner) = data
        .bookings
        .iter()
        .find(|b| b.id.as_str() == id)
        .map(|b| b.user_id.to_string())
    else {
        return error(StatusCode::NOT_FOUND, "Booking not found");
    };
    if let Err(rejection) = require_owner(&headers, &data, &owner) {
        return rejection;
    }
    if let Some(booking) = data.bookings.iter_mut().find(|b| b.id.as_str() == id) {
        booking.status = BookingStatus::Cancelled;
    }
    StatusCode::NO_CONTENT.into_response()
}
