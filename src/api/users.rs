// src/api/users.rs

use actix_web::{HttpResponse, post, web};
use bcrypt::{DEFAULT_COST, hash, verify};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;

use crate::api::auth::AuthUser;
use crate::error::ShopError;
use crate::{AppState, db};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordRequest {
    pub old_password: Option<String>,
    pub new_password: Option<String>,
}

#[post("/users/password")]
pub async fn update_password(
    state: web::Data<AppState>,
    user: web::ReqData<AuthUser>,
    payload: web::Json<UpdatePasswordRequest>,
) -> Result<HttpResponse, ShopError> {
    let payload = payload.into_inner();
    let old_password = payload.old_password.unwrap_or_default();
    let new_password = payload.new_password.unwrap_or_default();

    if old_password.is_empty() || new_password.is_empty() {
        return Err(ShopError::Validation(
            "Contraseña actual y nueva son requeridas".to_string(),
        ));
    }
    if new_password.len() < 6 {
        return Err(ShopError::Validation(
            "La nueva contraseña debe tener al menos 6 caracteres".to_string(),
        ));
    }

    log::info!("updating password user_id={}", user.id);

    let account = db::find_user_by_email(&state.pool, &user.email)
        .await?
        .ok_or_else(|| ShopError::NotFound("Usuario no encontrado".to_string()))?;

    let Some(stored_hash) = account.password_hash.as_deref() else {
        return Err(ShopError::Validation(
            "Usuario registrado con método externo, no tiene contraseña".to_string(),
        ));
    };

    if !verify(&old_password, stored_hash)? {
        return Err(ShopError::Unauthorized(
            "La contraseña actual es incorrecta".to_string(),
        ));
    }

    let new_hash = hash(&new_password, DEFAULT_COST)?;
    db::set_password(&state.pool, account.id, &new_hash).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Contraseña actualizada exitosamente",
    })))
}
