// src/api/orders.rs

use actix_web::{HttpResponse, get, patch, post, web};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::api::auth::{AuthUser, require_admin};
use crate::currency::{self, BASE_CURRENCY};
use crate::error::ShopError;
use crate::models::{ORDER_COMPLETED, ORDER_PENDING, ORDER_STATUSES, Order};
use crate::{AppState, db};

/// `ORDER-<millis>-<sufijo>`: referencia externa única de la orden.
fn generate_order_id() -> String {
    let entropy = Uuid::new_v4().simple().to_string();
    format!(
        "ORDER-{}-{}",
        Utc::now().timestamp_millis(),
        entropy[..9].to_uppercase()
    )
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub product_id: Option<String>,
    pub amount: Option<f64>,
    /// Moneda declarada de la compra (default USD).
    pub currency: Option<String>,
    pub payment_method: Option<String>,
    pub category: Option<String>,
    pub streaming_plan: Option<String>,
    pub streaming_duration: Option<String>,
    #[schema(value_type = Object)]
    pub method_details: Option<serde_json::Value>,
}

#[utoipa::path(
    context_path = "/api",
    request_body = CreateOrderRequest,
    responses(
        (status = 200, description = "Orden creada con snapshot congelado", body = Order),
        (status = 404, description = "Servicio o divisa no encontrada")
    ),
    tag = "orders"
)]
#[post("/orders")]
pub async fn create_order(
    state: web::Data<AppState>,
    user: web::ReqData<AuthUser>,
    payload: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, ShopError> {
    let payload = payload.into_inner();
    let product_id = payload.product_id.unwrap_or_default().trim().to_string();
    let amount = payload.amount.unwrap_or_default();
    let payment_method = payload.payment_method.unwrap_or_default().trim().to_string();

    if product_id.is_empty() || amount <= 0.0 || payment_method.is_empty() {
        return Err(ShopError::Validation(
            "Campos requeridos: productId, amount, paymentMethod".to_string(),
        ));
    }

    let currency_code = payload
        .currency
        .map(|c| c.trim().to_uppercase())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| BASE_CURRENCY.to_string());

    let service = db::find_service(&state.pool, &product_id)
        .await?
        .ok_or_else(|| ShopError::NotFound("Servicio no encontrado".to_string()))?;

    // Tasa congelada, reserva de stock e inserción comparten una misma
    // transacción: el exchange_rate guardado es el que se aplicó.
    let mut tx = state.pool.begin().await?;

    let rate = if currency_code == BASE_CURRENCY {
        None
    } else {
        db::find_active_rate(&mut *tx, &currency_code).await?
    };
    let snapshot = currency::usd_snapshot_with(amount, &currency_code, |_| rate)?;

    let inventory_id = db::reserve_available_item(&mut *tx, &service.service_id).await?;

    let order_id = generate_order_id();

    let order = sqlx::query_as::<_, Order>(
        r#"INSERT INTO orders
               (order_id, user_id, user_email, user_name, product_id, product_name,
                category, amount, currency, amount_usd, exchange_rate, status,
                payment_method, streaming_plan, streaming_duration, method_details,
                inventory_id)
           VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
           RETURNING *"#,
    )
    .bind(&order_id)
    .bind(user.id)
    .bind(&user.email)
    .bind(user.snapshot_name())
    .bind(&service.service_id)
    .bind(&service.name)
    .bind(&payload.category)
    .bind(amount)
    .bind(&currency_code)
    .bind(snapshot.amount_usd)
    .bind(snapshot.exchange_rate)
    .bind(ORDER_PENDING)
    .bind(&payment_method)
    .bind(&payload.streaming_plan)
    .bind(&payload.streaming_duration)
    .bind(&payload.method_details)
    .bind(inventory_id)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        r#"UPDATE users
           SET total_purchases = total_purchases + 1,
               last_active_time = NOW(),
               updated_at = NOW()
           WHERE id = $1"#,
    )
    .bind(user.id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    log::info!(
        "order created order_id={} user_id={} amount={} currency={} inventory_id={:?}",
        order.order_id,
        user.id,
        amount,
        currency_code,
        inventory_id
    );

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Orden creada exitosamente",
        "order": order,
    })))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct MyOrdersQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub skip: Option<i64>,
}

#[utoipa::path(
    context_path = "/api",
    params(MyOrdersQuery),
    responses((status = 200, description = "Órdenes del usuario autenticado")),
    tag = "orders"
)]
#[get("/orders/my")]
pub async fn my_orders(
    state: web::Data<AppState>,
    user: web::ReqData<AuthUser>,
    query: web::Query<MyOrdersQuery>,
) -> Result<HttpResponse, ShopError> {
    let query = query.into_inner();

    let status = query
        .status
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty());
    if let Some(s) = status.as_deref() {
        if !ORDER_STATUSES.contains(&s) {
            return Err(ShopError::Validation(format!("Estado de orden inválido: {s}")));
        }
    }

    let limit = query.limit.unwrap_or(20).clamp(1, 100);
    let skip = query.skip.unwrap_or(0).max(0);

    log::info!("fetching orders user_id={} status={:?}", user.id, status);

    let (orders, total) =
        db::list_user_orders(&state.pool, user.id, status.as_deref(), limit, skip).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "orders": orders,
        "total": total,
    })))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderRequest {
    pub status: Option<String>,
    pub admin_notes: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    #[schema(value_type = Object)]
    pub method_details: Option<serde_json::Value>,
}

#[patch("/orders/{order_id}")]
pub async fn update_order(
    state: web::Data<AppState>,
    user: web::ReqData<AuthUser>,
    path: web::Path<String>,
    payload: web::Json<UpdateOrderRequest>,
) -> Result<HttpResponse, ShopError> {
    require_admin(&user)?;

    let order_id = path.into_inner();
    let payload = payload.into_inner();

    let status = payload
        .status
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty());
    if let Some(s) = status.as_deref() {
        if !ORDER_STATUSES.contains(&s) {
            return Err(ShopError::Validation(format!("Estado de orden inválido: {s}")));
        }
    }

    log::info!("updating order order_id={order_id} admin={}", user.email);

    let mut tx = state.pool.begin().await?;

    let existing =
        sqlx::query_as::<_, Order>(r#"SELECT * FROM orders WHERE order_id = $1 FOR UPDATE"#)
            .bind(&order_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| ShopError::NotFound("Orden no encontrada".to_string()))?;

    // El abono a total_spent ocurre solo al entrar a COMPLETED; repetir
    // el estado no vuelve a sumar.
    let completing =
        status.as_deref() == Some(ORDER_COMPLETED) && existing.status != ORDER_COMPLETED;

    let completed_at = payload
        .completed_at
        .or_else(|| (completing && existing.completed_at.is_none()).then(Utc::now));

    let updated = sqlx::query_as::<_, Order>(
        r#"UPDATE orders
           SET status = COALESCE($2, status),
               admin_notes = COALESCE($3, admin_notes),
               method_details = COALESCE($4, method_details),
               completed_at = COALESCE($5, completed_at),
               updated_at = NOW()
           WHERE id = $1
           RETURNING *"#,
    )
    .bind(existing.id)
    .bind(&status)
    .bind(&payload.admin_notes)
    .bind(&payload.method_details)
    .bind(completed_at)
    .fetch_one(&mut *tx)
    .await?;

    if completing {
        // Se abona el monto en la moneda original de la compra, no amount_usd.
        sqlx::query(
            r#"UPDATE users
               SET total_spent = total_spent + $2, updated_at = NOW()
               WHERE email = $1"#,
        )
        .bind(&existing.user_email)
        .bind(existing.amount)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Orden actualizada exitosamente",
        "order": updated,
    })))
}
