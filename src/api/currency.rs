// src/api/currency.rs

use actix_web::{HttpResponse, get, post, put, web};
use serde::Deserialize;
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

use crate::api::auth::{AuthUser, require_admin};
use crate::error::ShopError;
use crate::{AppState, currency, db};

#[utoipa::path(
    context_path = "/api/currency",
    responses((status = 200, description = "Tasas activas ordenadas por código")),
    tag = "currency"
)]
#[get("/rates")]
pub async fn currency_rates(state: web::Data<AppState>) -> Result<HttpResponse, ShopError> {
    let rates = db::list_active_rates(&state.pool).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "rates": rates,
    })))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ConvertQuery {
    pub amount: f64,
    pub from: String,
    pub to: String,
}

#[utoipa::path(
    context_path = "/api/currency",
    params(ConvertQuery),
    responses(
        (status = 200, description = "Conversión con tasa efectiva", body = currency::Conversion),
        (status = 404, description = "Divisa no encontrada o desactivada")
    ),
    tag = "currency"
)]
#[get("/convert")]
pub async fn convert_currency(
    state: web::Data<AppState>,
    query: web::Query<ConvertQuery>,
) -> Result<HttpResponse, ShopError> {
    let query = query.into_inner();
    let conversion = currency::convert(&state.pool, query.amount, &query.from, &query.to).await?;

    log::info!(
        "currency conversion amount={} from={} to={} converted={} rate={}",
        conversion.amount,
        conversion.from,
        conversion.to,
        conversion.converted_amount,
        conversion.rate
    );

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "conversion": conversion,
    })))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddCurrencyRequest {
    pub code: Option<String>,
    pub name: Option<String>,
    pub rate: Option<f64>,
}

#[post("/admin/currency")]
pub async fn add_currency(
    state: web::Data<AppState>,
    user: web::ReqData<AuthUser>,
    payload: web::Json<AddCurrencyRequest>,
) -> Result<HttpResponse, ShopError> {
    require_admin(&user)?;

    let payload = payload.into_inner();
    let code = payload.code.unwrap_or_default().trim().to_uppercase();
    let name = payload.name.unwrap_or_default().trim().to_string();
    let rate = payload.rate.unwrap_or_default();

    if code.is_empty() || name.is_empty() {
        return Err(ShopError::Validation("Todos los campos son requeridos".to_string()));
    }
    if rate <= 0.0 {
        return Err(ShopError::Validation("La tasa debe ser mayor que 0".to_string()));
    }

    if db::find_rate(&state.pool, &code).await?.is_some() {
        return Err(ShopError::Conflict(format!("La divisa {code} ya existe")));
    }

    log::info!("adding currency code={code} rate={rate} admin={}", user.email);
    let created = db::insert_rate(&state.pool, &code, &name, rate, &user.email).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": format!("Divisa {code} agregada exitosamente"),
        "rate": created,
    })))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRateRequest {
    pub rate: Option<f64>,
}

#[put("/admin/currency/{code}/rate")]
pub async fn update_currency_rate(
    state: web::Data<AppState>,
    user: web::ReqData<AuthUser>,
    path: web::Path<String>,
    payload: web::Json<UpdateRateRequest>,
) -> Result<HttpResponse, ShopError> {
    require_admin(&user)?;

    let code = path.into_inner().to_uppercase();
    let rate = payload.rate.unwrap_or_default();

    if rate <= 0.0 {
        return Err(ShopError::Validation("La tasa debe ser mayor que 0".to_string()));
    }

    log::info!("updating currency rate code={code} rate={rate} admin={}", user.email);

    // Las órdenes históricas conservan su exchange_rate congelado.
    let updated = db::update_rate(&state.pool, &code, rate, &user.email)
        .await?
        .ok_or_else(|| ShopError::NotFound(format!("Divisa {code} no encontrada")))?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": format!("Tasa de {code} actualizada a {rate}"),
        "rate": updated,
    })))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ToggleCurrencyRequest {
    pub is_active: Option<bool>,
}

#[put("/admin/currency/{code}/active")]
pub async fn toggle_currency_active(
    state: web::Data<AppState>,
    user: web::ReqData<AuthUser>,
    path: web::Path<String>,
    payload: web::Json<ToggleCurrencyRequest>,
) -> Result<HttpResponse, ShopError> {
    require_admin(&user)?;

    let code = path.into_inner().to_uppercase();
    let Some(is_active) = payload.is_active else {
        return Err(ShopError::Validation("isActive es requerido".to_string()));
    };

    let updated = db::set_rate_active(&state.pool, &code, is_active, &user.email)
        .await?
        .ok_or_else(|| ShopError::NotFound(format!("Divisa {code} no encontrada")))?;

    log::info!("toggled currency code={code} is_active={is_active} admin={}", user.email);

    let estado = if is_active { "activada" } else { "desactivada" };
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": format!("Divisa {code} {estado}"),
        "rate": updated,
    })))
}
