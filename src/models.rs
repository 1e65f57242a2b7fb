// src/models.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

pub const ROLE_ADMIN: &str = "ADMIN";
pub const ROLE_USER: &str = "USER";

/// Tasa respecto a USD: 1 USD = `rate` unidades de la moneda.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyRate {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub rate: f64,
    pub is_active: bool,
    pub updated_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: i64,
    pub service_id: String,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub is_active: bool,
    pub is_featured: bool,
    /// Valores estáticos de catálogo; la vista pública los une con el
    /// inventario disponible sin persistir el resultado.
    pub streaming_prices: Vec<f64>,
    pub streaming_plans: Vec<String>,
    pub streaming_durations: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: i64,
    pub service_id: String,
    pub email: String,
    pub password: String,
    pub pin: Option<String>,
    pub profile_name: Option<String>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub plan: Option<String>,
    pub price: Option<f64>,
    pub duration: Option<String>,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const ORDER_PENDING: &str = "PENDING";
pub const ORDER_COMPLETED: &str = "COMPLETED";
pub const ORDER_CANCELLED: &str = "CANCELLED";
pub const ORDER_REFUNDED: &str = "REFUNDED";

pub const ORDER_STATUSES: [&str; 4] = [
    ORDER_PENDING,
    ORDER_COMPLETED,
    ORDER_CANCELLED,
    ORDER_REFUNDED,
];

/// amount_usd y exchange_rate se congelan al crear la orden y nunca se
/// recalculan aunque la tasa cambie después.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: i64,
    pub order_id: String,
    pub user_id: i64,
    pub user_email: String,
    pub user_name: String,
    pub product_id: String,
    pub product_name: String,
    pub category: Option<String>,
    pub amount: f64,
    pub currency: String,
    pub amount_usd: f64,
    pub exchange_rate: f64,
    pub status: String,
    pub payment_method: String,
    pub streaming_plan: Option<String>,
    pub streaming_duration: Option<String>,
    #[schema(value_type = Object)]
    pub method_details: Option<serde_json::Value>,
    pub inventory_id: Option<i64>,
    pub admin_notes: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub display_name: Option<String>,
    pub phone_number: Option<String>,
    pub role: String,
    pub is_active: bool,
    pub total_purchases: i32,
    /// Gasto acumulado en la moneda original de cada orden.
    pub total_spent: f64,
    pub favorite_services: Vec<String>,
    pub last_active_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
