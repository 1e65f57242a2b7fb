// src/api/auth.rs

use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{Error, HttpMessage, HttpResponse, post, web};
use bcrypt::{DEFAULT_COST, hash, verify};
use chrono::{Duration, Utc};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::task::{Context, Poll};
use utoipa::ToSchema;

use crate::error::ShopError;
use crate::models::{ROLE_ADMIN, User};
use crate::{AppState, db};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub id: i64,
    pub email: String,
    pub role: String,
    pub display_name: Option<String>,
    pub exp: usize,
}

/// Identidad autenticada del request, insertada por `JwtMiddleware`.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
    pub role: String,
    pub display_name: Option<String>,
}

impl AuthUser {
    /// Nombre para snapshots de órdenes: displayName o, en su defecto, email.
    pub fn snapshot_name(&self) -> String {
        self.display_name
            .clone()
            .unwrap_or_else(|| self.email.clone())
    }
}

pub fn require_admin(user: &AuthUser) -> Result<(), ShopError> {
    if user.role != ROLE_ADMIN {
        return Err(ShopError::Forbidden(
            "Requiere permisos de administrador".to_string(),
        ));
    }
    Ok(())
}

pub fn generate_jwt(user: &User, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::days(7))
        .expect("valid timestamp")
        .timestamp() as usize;

    let claims = Claims {
        id: user.id,
        email: user.email.clone(),
        role: user.role.clone(),
        display_name: user.display_name.clone(),
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[utoipa::path(
    context_path = "/api/auth",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Usuario registrado, devuelve token JWT"),
        (status = 409, description = "El correo ya está registrado")
    ),
    tag = "auth"
)]
#[post("/register")]
pub async fn register(
    state: web::Data<AppState>,
    payload: web::Json<RegisterRequest>,
) -> Result<HttpResponse, ShopError> {
    let payload = payload.into_inner();
    let email = payload.email.unwrap_or_default().trim().to_lowercase();
    let password = payload.password.unwrap_or_default();

    if email.is_empty() || password.is_empty() {
        return Err(ShopError::Validation(
            "Email y contraseña son requeridos".to_string(),
        ));
    }
    if !email.contains('@') {
        return Err(ShopError::Validation("Email inválido".to_string()));
    }

    let password_hash = hash(&password, DEFAULT_COST)?;

    let user = match db::insert_user(
        &state.pool,
        &email,
        &password_hash,
        payload.display_name.as_deref(),
    )
    .await
    {
        Ok(u) => u,
        Err(e) if db::is_unique_violation(&e) => {
            return Err(ShopError::Conflict("El correo ya está registrado".to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    let token = generate_jwt(&user, &state.jwt_secret)?;
    log::info!("user registered id={} email={}", user.id, user.email);

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Usuario registrado exitosamente",
        "token": token,
        "user": user,
    })))
}

#[utoipa::path(
    context_path = "/api/auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login exitoso, devuelve token JWT"),
        (status = 401, description = "Credenciales inválidas")
    ),
    tag = "auth"
)]
#[post("/login")]
pub async fn login(
    state: web::Data<AppState>,
    payload: web::Json<LoginRequest>,
) -> Result<HttpResponse, ShopError> {
    let payload = payload.into_inner();
    let email = payload.email.unwrap_or_default().trim().to_lowercase();
    let password = payload.password.unwrap_or_default();

    if email.is_empty() || password.is_empty() {
        return Err(ShopError::Validation(
            "Email y contraseña son requeridos".to_string(),
        ));
    }

    let Some(user) = db::find_user_by_email(&state.pool, &email).await? else {
        log::warn!("login failed, user not found email={email}");
        return Err(ShopError::Unauthorized(
            "Usuario o contraseña incorrectos".to_string(),
        ));
    };

    if !user.is_active {
        log::warn!("login failed, user inactive email={email}");
        return Err(ShopError::Unauthorized("Usuario desactivado".to_string()));
    }

    // Usuarios de alta externa no tienen hash local.
    let Some(password_hash) = user.password_hash.as_deref() else {
        return Err(ShopError::Unauthorized(
            "Usuario registrado con método externo".to_string(),
        ));
    };

    if !verify(&password, password_hash)? {
        log::warn!("login failed, invalid password email={email}");
        return Err(ShopError::Unauthorized(
            "Usuario o contraseña incorrectos".to_string(),
        ));
    }

    db::touch_last_active(&state.pool, user.id).await?;
    let token = generate_jwt(&user, &state.jwt_secret)?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Login exitoso",
        "token": token,
        "user": user,
    })))
}

/// Middleware que:
/// - toma `Authorization: Bearer <jwt>`
/// - valida el JWT con el secreto de `AppState`
/// - inserta `AuthUser` en `req.extensions_mut()`
pub struct JwtMiddleware;

impl<S, B> Transform<S, ServiceRequest> for JwtMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = JwtMiddlewareInner<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtMiddlewareInner { service }))
    }
}

pub struct JwtMiddlewareInner<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for JwtMiddlewareInner<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let secret = match req.app_data::<web::Data<AppState>>() {
            Some(state) => state.jwt_secret.clone(),
            None => {
                return Box::pin(async move {
                    Err(actix_web::error::ErrorInternalServerError(
                        "app state not configured",
                    ))
                });
            }
        };

        let auth_header = req
            .headers()
            .get(actix_web::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .unwrap_or("");

        if let Some(token) = auth_header.strip_prefix("Bearer ") {
            match decode::<Claims>(
                token,
                &DecodingKey::from_secret(secret.as_ref()),
                &Validation::default(),
            ) {
                Ok(token_data) => {
                    let claims = token_data.claims;
                    req.extensions_mut().insert(AuthUser {
                        id: claims.id,
                        email: claims.email,
                        role: claims.role,
                        display_name: claims.display_name,
                    });
                    let fut = self.service.call(req);
                    return Box::pin(async move { fut.await });
                }
                Err(_) => {
                    return Box::pin(async move {
                        Err(ShopError::Unauthorized("Token inválido o expirado".to_string()).into())
                    });
                }
            }
        }

        Box::pin(async move { Err(ShopError::Unauthorized("No autenticado".to_string()).into()) })
    }
}
