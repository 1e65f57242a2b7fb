// src/api/inventory.rs

use actix_web::{HttpResponse, delete, get, post, put, web};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

use crate::api::auth::{AuthUser, require_admin};
use crate::error::ShopError;
use crate::models::{InventoryItem, ROLE_ADMIN};
use crate::{AppState, db};

/// Copia sin credenciales para usuarios no administradores.
fn masked(mut item: InventoryItem) -> InventoryItem {
    item.email = "***".to_string();
    item.password = "***".to_string();
    item.pin = item.pin.map(|_| "***".to_string());
    item
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct InventoryQuery {
    pub service_id: Option<String>,
    pub is_available: Option<bool>,
    pub limit: Option<i64>,
    pub skip: Option<i64>,
}

#[get("/inventory")]
pub async fn list_inventory(
    state: web::Data<AppState>,
    user: web::ReqData<AuthUser>,
    query: web::Query<InventoryQuery>,
) -> Result<HttpResponse, ShopError> {
    let query = query.into_inner();
    let is_admin = user.role == ROLE_ADMIN;

    // Usuarios normales solo ven disponibilidad, nunca credenciales.
    let is_available = if is_admin { query.is_available } else { Some(true) };
    let limit = query.limit.unwrap_or(50).clamp(1, 200);
    let skip = query.skip.unwrap_or(0).max(0);

    log::info!(
        "fetching inventory service_id={:?} is_available={:?} is_admin={}",
        query.service_id,
        is_available,
        is_admin
    );

    let (items, total) = db::list_inventory(
        &state.pool,
        query.service_id.as_deref(),
        is_available,
        limit,
        skip,
    )
    .await?;

    let items: Vec<InventoryItem> = if is_admin {
        items
    } else {
        items.into_iter().map(masked).collect()
    };

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "inventory": items,
        "total": total,
    })))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddInventoryRequest {
    pub service_id: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub pin: Option<String>,
    pub profile_name: Option<String>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub plan: Option<String>,
    pub price: Option<f64>,
    pub duration: Option<String>,
}

#[post("/admin/inventory")]
pub async fn add_inventory(
    state: web::Data<AppState>,
    user: web::ReqData<AuthUser>,
    payload: web::Json<AddInventoryRequest>,
) -> Result<HttpResponse, ShopError> {
    require_admin(&user)?;

    let payload = payload.into_inner();
    let service_id = payload.service_id.unwrap_or_default().trim().to_string();
    let email = payload.email.unwrap_or_default().trim().to_string();
    let password = payload.password.unwrap_or_default();

    if service_id.is_empty() || email.is_empty() || password.is_empty() {
        return Err(ShopError::Validation(
            "Campos requeridos: serviceId, email, password".to_string(),
        ));
    }

    log::info!("admin adding inventory service_id={service_id} admin={}", user.email);

    let item = sqlx::query_as::<_, InventoryItem>(
        r#"INSERT INTO inventory
               (service_id, email, password, pin, profile_name, expiry_date,
                plan, price, duration, is_available)
           VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, TRUE)
           RETURNING *"#,
    )
    .bind(&service_id)
    .bind(&email)
    .bind(&password)
    .bind(&payload.pin)
    .bind(&payload.profile_name)
    .bind(payload.expiry_date)
    .bind(&payload.plan)
    .bind(payload.price)
    .bind(&payload.duration)
    .fetch_one(&state.pool)
    .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Inventario agregado correctamente",
        "item": item,
    })))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInventoryRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub pin: Option<String>,
    pub profile_name: Option<String>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub plan: Option<String>,
    pub price: Option<f64>,
    pub duration: Option<String>,
    pub is_available: Option<bool>,
}

#[put("/admin/inventory/{id}")]
pub async fn update_inventory(
    state: web::Data<AppState>,
    user: web::ReqData<AuthUser>,
    path: web::Path<i64>,
    payload: web::Json<UpdateInventoryRequest>,
) -> Result<HttpResponse, ShopError> {
    require_admin(&user)?;

    let id = path.into_inner();
    let payload = payload.into_inner();

    let updated = sqlx::query_as::<_, InventoryItem>(
        r#"UPDATE inventory
           SET email = COALESCE($2, email),
               password = COALESCE($3, password),
               pin = COALESCE($4, pin),
               profile_name = COALESCE($5, profile_name),
               expiry_date = COALESCE($6, expiry_date),
               plan = COALESCE($7, plan),
               price = COALESCE($8, price),
               duration = COALESCE($9, duration),
               is_available = COALESCE($10, is_available),
               updated_at = NOW()
           WHERE id = $1
           RETURNING *"#,
    )
    .bind(id)
    .bind(&payload.email)
    .bind(&payload.password)
    .bind(&payload.pin)
    .bind(&payload.profile_name)
    .bind(payload.expiry_date)
    .bind(&payload.plan)
    .bind(payload.price)
    .bind(&payload.duration)
    .bind(payload.is_available)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| ShopError::NotFound("Item de inventario no encontrado".to_string()))?;

    log::info!("admin updated inventory id={id} admin={}", user.email);

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Inventario actualizado correctamente",
        "item": updated,
    })))
}

#[delete("/admin/inventory/{id}")]
pub async fn delete_inventory(
    state: web::Data<AppState>,
    user: web::ReqData<AuthUser>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ShopError> {
    require_admin(&user)?;

    let id = path.into_inner();

    let deleted = sqlx::query(r#"DELETE FROM inventory WHERE id = $1"#)
        .bind(id)
        .execute(&state.pool)
        .await?;

    if deleted.rows_affected() == 0 {
        return Err(ShopError::NotFound("Item de inventario no encontrado".to_string()));
    }

    log::info!("admin deleted inventory id={id} admin={}", user.email);

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Item eliminado correctamente",
    })))
}
