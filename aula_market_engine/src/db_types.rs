use std::{fmt::Display, str::FromStr};

pub use am_common::{Cents, Locale};
use chrono::{DateTime, Utc};
use log::error;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatusType {
    /// The order has been created. No payment attempt has been made yet.
    Pending,
    /// A payment intent is attached and the provider is processing the payment.
    PaymentPending,
    /// The payment has been received in full. The order is awaiting fulfillment.
    Paid,
    /// The order has been fulfilled.
    Completed,
    /// The order was called off before payment completed, by the user, an admin, or the expiry sweep.
    Cancelled,
    /// The order was refunded after payment, reversing any fulfillment.
    Refunded,
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Pending => write!(f, "pending"),
            OrderStatusType::PaymentPending => write!(f, "payment_pending"),
            OrderStatusType::Paid => write!(f, "paid"),
            OrderStatusType::Completed => write!(f, "completed"),
            OrderStatusType::Cancelled => write!(f, "cancelled"),
            OrderStatusType::Refunded => write!(f, "refunded"),
        }
    }
}

impl From<String> for OrderStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to Pending");
            OrderStatusType::Pending
        })
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid conversion: {0}")]
pub struct ConversionError(pub String);

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "payment_pending" => Ok(Self::PaymentPending),
            "paid" => Ok(Self::Paid),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            "refunded" => Ok(Self::Refunded),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

//--------------------------------------      ItemType         ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Course,
    Product,
    Event,
}

impl Display for ItemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemType::Course => write!(f, "course"),
            ItemType::Product => write!(f, "product"),
            ItemType::Event => write!(f, "event"),
        }
    }
}

impl FromStr for ItemType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "course" => Ok(Self::Course),
            "product" => Ok(Self::Product),
            "event" => Ok(Self::Event),
            s => Err(ConversionError(format!("Invalid item type: {s}"))),
        }
    }
}

//--------------------------------------    BookingStatus      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    /// Seats are held for an order that has not been fulfilled yet.
    Pending,
    /// The order was fulfilled and the seats are locked in.
    Confirmed,
    /// The hold was released. The seats have been returned to the event.
    Cancelled,
}

impl Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BookingStatus::Pending => write!(f, "pending"),
            BookingStatus::Confirmed => write!(f, "confirmed"),
            BookingStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for BookingStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid booking status: {s}"))),
        }
    }
}

//--------------------------------------         Role          ---------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Customer,
    Admin,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Customer => write!(f, "customer"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

impl FromStr for Role {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Self::Customer),
            "admin" => Ok(Self::Admin),
            s => Err(ConversionError(format!("Invalid role: {s}"))),
        }
    }
}

//--------------------------------------         User          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub preferred_language: Locale,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin)
    }
}

//--------------------------------------       NewUser         ---------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub role: Role,
    pub preferred_language: Locale,
}

impl NewUser {
    /// A new customer account with the default (`en`) language preference.
    pub fn new<S: Into<String>>(email: S, name: S) -> Self {
        Self { email: email.into(), name: name.into(), role: Role::default(), preferred_language: Locale::default() }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    pub fn with_language(mut self, language: Locale) -> Self {
        self.preferred_language = language;
        self
    }
}

//--------------------------------------        Course         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Course {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub description: Option<String>,
    pub price: Cents,
    pub currency: String,
    pub enrollment_count: i64,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------        Product        ---------------------------------------------------------
/// A digital download. `download_count` tracks how many copies have been delivered.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub description: Option<String>,
    pub price: Cents,
    pub currency: String,
    pub download_count: i64,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------     EventListing      ---------------------------------------------------------
/// A bookable event with a fixed number of seats. `available_spots` never exceeds `capacity` and
/// never drops below zero.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct EventListing {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub description: Option<String>,
    pub price: Cents,
    pub currency: String,
    pub starts_at: DateTime<Utc>,
    pub capacity: i64,
    pub available_spots: i64,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------      NewCourse        ---------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCourse {
    pub title: String,
    /// Generated from the title when omitted.
    pub slug: Option<String>,
    pub description: Option<String>,
    pub price: Cents,
    pub currency: String,
    pub published: bool,
}

impl NewCourse {
    pub fn new<S: Into<String>>(title: S, price: Cents) -> Self {
        Self {
            title: title.into(),
            slug: None,
            description: None,
            price,
            currency: "USD".to_string(),
            published: true,
        }
    }

    pub fn with_slug<S: Into<String>>(mut self, slug: S) -> Self {
        self.slug = Some(slug.into());
        self
    }

    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_currency<S: Into<String>>(mut self, currency: S) -> Self {
        self.currency = currency.into();
        self
    }

    pub fn unpublished(mut self) -> Self {
        self.published = false;
        self
    }
}

//--------------------------------------      NewProduct       ---------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub title: String,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub price: Cents,
    pub currency: String,
    pub published: bool,
}

impl NewProduct {
    pub fn new<S: Into<String>>(title: S, price: Cents) -> Self {
        Self {
            title: title.into(),
            slug: None,
            description: None,
            price,
            currency: "USD".to_string(),
            published: true,
        }
    }

    pub fn with_slug<S: Into<String>>(mut self, slug: S) -> Self {
        self.slug = Some(slug.into());
        self
    }

    pub fn with_currency<S: Into<String>>(mut self, currency: S) -> Self {
        self.currency = currency.into();
        self
    }

    pub fn unpublished(mut self) -> Self {
        self.published = false;
        self
    }
}

//--------------------------------------   NewEventListing     ---------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEventListing {
    pub title: String,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub price: Cents,
    pub currency: String,
    /// When the event takes place.
    pub starts_at: DateTime<Utc>,
    /// Total number of seats. `available_spots` starts equal to this.
    pub capacity: i64,
    pub published: bool,
}

impl NewEventListing {
    pub fn new<S: Into<String>>(title: S, price: Cents, starts_at: DateTime<Utc>, capacity: i64) -> Self {
        Self {
            title: title.into(),
            slug: None,
            description: None,
            price,
            currency: "USD".to_string(),
            starts_at,
            capacity,
            published: true,
        }
    }

    pub fn with_slug<S: Into<String>>(mut self, slug: S) -> Self {
        self.slug = Some(slug.into());
        self
    }

    pub fn with_currency<S: Into<String>>(mut self, currency: S) -> Self {
        self.currency = currency.into();
        self
    }

    pub fn unpublished(mut self) -> Self {
        self.published = false;
        self
    }
}

//--------------------------------------        Order          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    pub status: OrderStatusType,
    pub currency: String,
    pub subtotal: Cents,
    pub tax: Cents,
    pub total: Cents,
    /// Set when the payment provider's intent is attached. Unique across orders.
    pub payment_intent_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Stamped when the order is fulfilled.
    pub completed_at: Option<DateTime<Utc>>,
}

//--------------------------------------       NewOrder        ---------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    /// The user placing the order.
    pub user_id: i64,
    /// What is being bought. Prices and titles are not part of the request. They are snapshotted
    /// from the catalog when the order is created.
    pub items: Vec<NewOrderItem>,
}

impl NewOrder {
    pub fn new(user_id: i64) -> Self {
        Self { user_id, items: Vec::new() }
    }

    pub fn with_item(mut self, item: NewOrderItem) -> Self {
        self.items.push(item);
        self
    }

    pub fn with_course(self, course_id: i64) -> Self {
        self.with_item(NewOrderItem::new(ItemType::Course, course_id, 1))
    }

    pub fn with_product(self, product_id: i64, quantity: i64) -> Self {
        self.with_item(NewOrderItem::new(ItemType::Product, product_id, quantity))
    }

    pub fn with_event(self, event_id: i64, seats: i64) -> Self {
        self.with_item(NewOrderItem::new(ItemType::Event, event_id, seats))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrderItem {
    pub item_type: ItemType,
    pub item_id: i64,
    pub quantity: i64,
}

impl NewOrderItem {
    pub fn new(item_type: ItemType, item_id: i64, quantity: i64) -> Self {
        Self { item_type, item_id, quantity }
    }
}

//--------------------------------------      OrderItem        ---------------------------------------------------------
/// A line in an order. Title and unit price are snapshots taken from the catalog at order time
/// and never change afterwards, even if the listing does.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub item_type: ItemType,
    pub item_id: i64,
    pub title: String,
    pub price: Cents,
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
}

impl OrderItem {
    pub fn line_total(&self) -> Cents {
        self.price * self.quantity
    }
}

//--------------------------------------       Booking         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Booking {
    pub id: i64,
    pub event_id: i64,
    pub user_id: i64,
    pub order_id: i64,
    pub seats: i64,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------    CourseProgress     ---------------------------------------------------------
/// One row per (user, course) enrollment. Created at fulfillment with zero progress.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct CourseProgress {
    pub id: i64,
    pub user_id: i64,
    pub course_id: i64,
    pub progress_percent: f64,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------      AuditEvent       ---------------------------------------------------------
/// The lifecycle actions recorded in the order audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEvent {
    OrderCreated,
    PaymentAttached,
    PaymentConfirmed,
    OrderCompleted,
    OrderCancelled,
    OrderRefunded,
    OrderExpired,
}

impl Display for AuditEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuditEvent::OrderCreated => write!(f, "order_created"),
            AuditEvent::PaymentAttached => write!(f, "payment_attached"),
            AuditEvent::PaymentConfirmed => write!(f, "payment_confirmed"),
            AuditEvent::OrderCompleted => write!(f, "order_completed"),
            AuditEvent::OrderCancelled => write!(f, "order_cancelled"),
            AuditEvent::OrderRefunded => write!(f, "order_refunded"),
            AuditEvent::OrderExpired => write!(f, "order_expired"),
        }
    }
}

//--------------------------------------      AuditEntry       ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: i64,
    pub order_id: i64,
    pub event: String,
    /// JSON payload with the details of the action.
    pub detail: String,
    pub created_at: DateTime<Utc>,
}
