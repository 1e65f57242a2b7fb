// src/api/services.rs

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::Deserialize;
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

use crate::api::auth::{AuthUser, require_admin};
use crate::catalog::{self, ServiceView};
use crate::currency::BASE_CURRENCY;
use crate::error::ShopError;
use crate::models::Service;
use crate::{AppState, db};

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ServicesQuery {
    pub category: Option<String>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
    pub limit: Option<i64>,
    pub skip: Option<i64>,
}

#[utoipa::path(
    context_path = "/api/services",
    params(ServicesQuery),
    responses((status = 200, description = "Servicios con stock agregado del inventario")),
    tag = "services"
)]
#[get("")]
pub async fn list_services(
    state: web::Data<AppState>,
    query: web::Query<ServicesQuery>,
) -> Result<HttpResponse, ShopError> {
    let query = query.into_inner();
    let filter = db::ServiceFilter {
        category: query.category,
        is_active: query.is_active,
        is_featured: query.is_featured,
        limit: query.limit.unwrap_or(20).clamp(1, 100),
        skip: query.skip.unwrap_or(0).max(0),
    };

    let (services, total) = db::list_services(&state.pool, &filter).await?;

    let mut views: Vec<ServiceView> = Vec::with_capacity(services.len());
    for service in services {
        let items = db::available_items(&state.pool, &service.service_id).await?;
        views.push(catalog::merge_service_view(service, &items));
    }

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "services": views,
        "total": total,
    })))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ServiceQuery {
    /// Moneda de despliegue para los precios derivados (default USD).
    pub currency: Option<String>,
}

#[utoipa::path(
    context_path = "/api/services",
    params(
        ("service_id" = String, Path, description = "Código público del servicio"),
        ServiceQuery
    ),
    responses(
        (status = 200, description = "Vista agregada del servicio", body = ServiceView),
        (status = 404, description = "Servicio no encontrado")
    ),
    tag = "services"
)]
#[get("/{service_id}")]
pub async fn get_service(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<ServiceQuery>,
) -> Result<HttpResponse, ShopError> {
    let service_id = path.into_inner();
    log::info!("fetching service service_id={service_id}");

    let service = db::find_service(&state.pool, &service_id)
        .await?
        .filter(|s| s.is_active)
        .ok_or_else(|| ShopError::NotFound("Servicio no encontrado".to_string()))?;

    let items = db::available_items(&state.pool, &service.service_id).await?;
    let mut view = catalog::merge_service_view(service, &items);

    let display_currency = query
        .into_inner()
        .currency
        .map(|c| c.trim().to_uppercase())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| BASE_CURRENCY.to_string());

    if display_currency != BASE_CURRENCY {
        let rate = db::find_active_rate(&state.pool, &display_currency)
            .await?
            .ok_or_else(|| {
                ShopError::NotFound(format!("Divisa {display_currency} no encontrada"))
            })?;
        catalog::convert_view_prices(&mut view, rate);
    }

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "currency": display_currency,
        "service": view,
    })))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateServiceRequest {
    pub service_id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
    pub streaming_prices: Option<Vec<f64>>,
    pub streaming_plans: Option<Vec<String>>,
    pub streaming_durations: Option<Vec<String>>,
}

#[post("/admin/services")]
pub async fn create_service(
    state: web::Data<AppState>,
    user: web::ReqData<AuthUser>,
    payload: web::Json<CreateServiceRequest>,
) -> Result<HttpResponse, ShopError> {
    require_admin(&user)?;

    let payload = payload.into_inner();
    let service_id = payload.service_id.unwrap_or_default().trim().to_string();
    let name = payload.name.unwrap_or_default().trim().to_string();
    let category = payload.category.unwrap_or_default().trim().to_string();

    if service_id.is_empty() || name.is_empty() || category.is_empty() {
        return Err(ShopError::Validation(
            "Campos requeridos: serviceId, name, category".to_string(),
        ));
    }

    log::info!("admin creating service service_id={service_id} admin={}", user.email);

    let created = match sqlx::query_as::<_, Service>(
        r#"INSERT INTO services
               (service_id, name, description, category, is_active, is_featured,
                streaming_prices, streaming_plans, streaming_durations)
           VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
           RETURNING *"#,
    )
    .bind(&service_id)
    .bind(&name)
    .bind(&payload.description)
    .bind(&category)
    .bind(payload.is_active.unwrap_or(true))
    .bind(payload.is_featured.unwrap_or(false))
    .bind(payload.streaming_prices.unwrap_or_default())
    .bind(payload.streaming_plans.unwrap_or_default())
    .bind(payload.streaming_durations.unwrap_or_default())
    .fetch_one(&state.pool)
    .await
    {
        Ok(s) => s,
        Err(e) if db::is_unique_violation(&e) => {
            return Err(ShopError::Conflict(format!("El servicio {service_id} ya existe")));
        }
        Err(e) => return Err(e.into()),
    };

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Servicio creado exitosamente",
        "service": created,
    })))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateServiceRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
    pub streaming_prices: Option<Vec<f64>>,
    pub streaming_plans: Option<Vec<String>>,
    pub streaming_durations: Option<Vec<String>>,
}

#[put("/admin/services/{service_id}")]
pub async fn update_service(
    state: web::Data<AppState>,
    user: web::ReqData<AuthUser>,
    path: web::Path<String>,
    payload: web::Json<UpdateServiceRequest>,
) -> Result<HttpResponse, ShopError> {
    require_admin(&user)?;

    let service_id = path.into_inner();
    log::info!("admin updating service service_id={service_id} admin={}", user.email);

    let service = db::find_service(&state.pool, &service_id)
        .await?
        .ok_or_else(|| ShopError::NotFound("Servicio no encontrado".to_string()))?;

    let payload = payload.into_inner();

    // Patch parcial: los campos ausentes conservan su valor.
    let updated = sqlx::query_as::<_, Service>(
        r#"UPDATE services
           SET name = COALESCE($2, name),
               description = COALESCE($3, description),
               category = COALESCE($4, category),
               is_active = COALESCE($5, is_active),
               is_featured = COALESCE($6, is_featured),
               streaming_prices = COALESCE($7, streaming_prices),
               streaming_plans = COALESCE($8, streaming_plans),
               streaming_durations = COALESCE($9, streaming_durations),
               updated_at = NOW()
           WHERE id = $1
           RETURNING *"#,
    )
    .bind(service.id)
    .bind(&payload.name)
    .bind(&payload.description)
    .bind(&payload.category)
    .bind(payload.is_active)
    .bind(payload.is_featured)
    .bind(&payload.streaming_prices)
    .bind(&payload.streaming_plans)
    .bind(&payload.streaming_durations)
    .fetch_one(&state.pool)
    .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Servicio actualizado exitosamente",
        "service": updated,
    })))
}

#[delete("/admin/services/{service_id}")]
pub async fn delete_service(
    state: web::Data<AppState>,
    user: web::ReqData<AuthUser>,
    path: web::Path<String>,
) -> Result<HttpResponse, ShopError> {
    require_admin(&user)?;

    let service_id = path.into_inner();
    log::info!("admin deleting service service_id={service_id} admin={}", user.email);

    let service = db::find_service(&state.pool, &service_id)
        .await?
        .ok_or_else(|| ShopError::NotFound("Servicio no encontrado".to_string()))?;

    sqlx::query(r#"DELETE FROM services WHERE id = $1"#)
        .bind(service.id)
        .execute(&state.pool)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Servicio eliminado exitosamente",
    })))
}
