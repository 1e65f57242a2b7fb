// src/catalog.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::currency::round2;
use crate::models::{InventoryItem, Service};

/// Etiqueta genérica cuando el inventario no trae plan con nombre; se
/// repite una vez por cuenta para que la UI muestre "X Cuentas".
pub const PLACEHOLDER_PLAN: &str = "Cuenta";
pub const PLACEHOLDER_DURATION: &str = "1 Mes";

/// Vista de un servicio con sus campos de catálogo ya unidos al
/// inventario disponible. Nunca se persiste.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceView {
    pub id: i64,
    pub service_id: String,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub is_active: bool,
    pub is_featured: bool,
    pub streaming_prices: Vec<f64>,
    pub streaming_plans: Vec<String>,
    pub streaming_durations: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn dedup_union<T: PartialEq + Clone>(base: &[T], extra: &[T]) -> Vec<T> {
    let mut out: Vec<T> = Vec::new();
    for value in base.iter().chain(extra.iter()) {
        if !out.contains(value) {
            out.push(value.clone());
        }
    }
    out
}

/// Une los campos estáticos del servicio con el inventario disponible.
/// Lectura idempotente: mismas filas, misma vista.
pub fn merge_service_view(service: Service, items: &[InventoryItem]) -> ServiceView {
    let mut prices = service.streaming_prices;
    let mut plans = service.streaming_plans;
    let mut durations = service.streaming_durations;

    if !items.is_empty() {
        let inventory_prices: Vec<f64> = items.iter().filter_map(|i| i.price).collect();
        if !inventory_prices.is_empty() {
            prices = dedup_union(&prices, &inventory_prices);
        }

        let inventory_plans: Vec<String> = items.iter().filter_map(|i| i.plan.clone()).collect();
        if !inventory_plans.is_empty() {
            plans = dedup_union(&plans, &inventory_plans);
        } else if plans.is_empty() {
            plans = vec![PLACEHOLDER_PLAN.to_string(); items.len()];
        }

        let inventory_durations: Vec<String> =
            items.iter().filter_map(|i| i.duration.clone()).collect();
        if !inventory_durations.is_empty() {
            durations = dedup_union(&durations, &inventory_durations);
        } else if durations.is_empty() {
            durations = vec![PLACEHOLDER_DURATION.to_string(); items.len()];
        }
    }

    ServiceView {
        id: service.id,
        service_id: service.service_id,
        name: service.name,
        description: service.description,
        category: service.category,
        is_active: service.is_active,
        is_featured: service.is_featured,
        streaming_prices: prices,
        streaming_plans: plans,
        streaming_durations: durations,
        created_at: service.created_at,
        updated_at: service.updated_at,
    }
}

/// Reexpresa los precios derivados (en USD) en otra moneda, con la tasa
/// activa "1 USD = rate". Redondeo solo sobre la salida.
pub fn convert_view_prices(view: &mut ServiceView, rate: f64) {
    for price in &mut view.streaming_prices {
        *price = round2(*price * rate);
    }
}
