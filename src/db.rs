// src/db.rs

use sqlx::{PgExecutor, PgPool, Row};

use crate::models::{CurrencyRate, InventoryItem, Order, Service, User};

pub fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

// ---------- currency_rates ----------

pub async fn list_active_rates(pool: &PgPool) -> Result<Vec<CurrencyRate>, sqlx::Error> {
    sqlx::query_as::<_, CurrencyRate>(
        r#"SELECT * FROM currency_rates WHERE is_active = TRUE ORDER BY code ASC"#,
    )
    .fetch_all(pool)
    .await
}

/// Busca la tasa sin importar si está activa (para detectar duplicados).
pub async fn find_rate(pool: &PgPool, code: &str) -> Result<Option<CurrencyRate>, sqlx::Error> {
    sqlx::query_as::<_, CurrencyRate>(r#"SELECT * FROM currency_rates WHERE code = $1"#)
        .bind(code)
        .fetch_optional(pool)
        .await
}

/// Tasa activa de una moneda ("1 USD = rate"). Acepta pool o conexión
/// de transacción para que la lectura participe de la misma frontera de
/// consistencia que la escritura de la orden.
pub async fn find_active_rate<'e>(
    db: impl PgExecutor<'e>,
    code: &str,
) -> Result<Option<f64>, sqlx::Error> {
    let row = sqlx::query(r#"SELECT rate FROM currency_rates WHERE code = $1 AND is_active = TRUE"#)
        .bind(code)
        .fetch_optional(db)
        .await?;

    Ok(row.map(|r| r.get("rate")))
}

pub async fn insert_rate(
    pool: &PgPool,
    code: &str,
    name: &str,
    rate: f64,
    updated_by: &str,
) -> Result<CurrencyRate, sqlx::Error> {
    sqlx::query_as::<_, CurrencyRate>(
        r#"INSERT INTO currency_rates (code, name, rate, is_active, updated_by)
           VALUES ($1, $2, $3, TRUE, $4)
           RETURNING *"#,
    )
    .bind(code)
    .bind(name)
    .bind(rate)
    .bind(updated_by)
    .fetch_one(pool)
    .await
}

pub async fn update_rate(
    pool: &PgPool,
    code: &str,
    rate: f64,
    updated_by: &str,
) -> Result<Option<CurrencyRate>, sqlx::Error> {
    sqlx::query_as::<_, CurrencyRate>(
        r#"UPDATE currency_rates
           SET rate = $2, updated_by = $3, updated_at = NOW()
           WHERE code = $1
           RETURNING *"#,
    )
    .bind(code)
    .bind(rate)
    .bind(updated_by)
    .fetch_optional(pool)
    .await
}

pub async fn set_rate_active(
    pool: &PgPool,
    code: &str,
    is_active: bool,
    updated_by: &str,
) -> Result<Option<CurrencyRate>, sqlx::Error> {
    sqlx::query_as::<_, CurrencyRate>(
        r#"UPDATE currency_rates
           SET is_active = $2, updated_by = $3, updated_at = NOW()
           WHERE code = $1
           RETURNING *"#,
    )
    .bind(code)
    .bind(is_active)
    .bind(updated_by)
    .fetch_optional(pool)
    .await
}

// ---------- services ----------

#[derive(Debug, Default)]
pub struct ServiceFilter {
    pub category: Option<String>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
    pub limit: i64,
    pub skip: i64,
}

pub async fn list_services(
    pool: &PgPool,
    filter: &ServiceFilter,
) -> Result<(Vec<Service>, i64), sqlx::Error> {
    let services = sqlx::query_as::<_, Service>(
        r#"SELECT * FROM services
           WHERE ($1::text IS NULL OR category = $1)
             AND ($2::boolean IS NULL OR is_active = $2)
             AND ($3::boolean IS NULL OR is_featured = $3)
           ORDER BY is_featured DESC, created_at DESC
           LIMIT $4 OFFSET $5"#,
    )
    .bind(&filter.category)
    .bind(filter.is_active)
    .bind(filter.is_featured)
    .bind(filter.limit)
    .bind(filter.skip)
    .fetch_all(pool)
    .await?;

    let total: i64 = sqlx::query(
        r#"SELECT COUNT(*) AS total FROM services
           WHERE ($1::text IS NULL OR category = $1)
             AND ($2::boolean IS NULL OR is_active = $2)
             AND ($3::boolean IS NULL OR is_featured = $3)"#,
    )
    .bind(&filter.category)
    .bind(filter.is_active)
    .bind(filter.is_featured)
    .fetch_one(pool)
    .await?
    .get("total");

    Ok((services, total))
}

/// Busca por el código público; si no aparece y el identificador parsea
/// como clave primaria, reintenta por id (uso histórico mixto de ids).
pub async fn find_service(pool: &PgPool, service_id: &str) -> Result<Option<Service>, sqlx::Error> {
    let found = sqlx::query_as::<_, Service>(r#"SELECT * FROM services WHERE service_id = $1"#)
        .bind(service_id)
        .fetch_optional(pool)
        .await?;

    if found.is_none() {
        if let Ok(pk) = service_id.parse::<i64>() {
            return sqlx::query_as::<_, Service>(r#"SELECT * FROM services WHERE id = $1"#)
                .bind(pk)
                .fetch_optional(pool)
                .await;
        }
    }

    Ok(found)
}

// ---------- inventory ----------

pub async fn available_items(
    pool: &PgPool,
    service_id: &str,
) -> Result<Vec<InventoryItem>, sqlx::Error> {
    sqlx::query_as::<_, InventoryItem>(
        r#"SELECT * FROM inventory
           WHERE service_id = $1 AND is_available = TRUE
           ORDER BY created_at"#,
    )
    .bind(service_id)
    .fetch_all(pool)
    .await
}

pub async fn list_inventory(
    pool: &PgPool,
    service_id: Option<&str>,
    is_available: Option<bool>,
    limit: i64,
    skip: i64,
) -> Result<(Vec<InventoryItem>, i64), sqlx::Error> {
    let items = sqlx::query_as::<_, InventoryItem>(
        r#"SELECT * FROM inventory
           WHERE ($1::text IS NULL OR service_id = $1)
             AND ($2::boolean IS NULL OR is_available = $2)
           ORDER BY created_at DESC
           LIMIT $3 OFFSET $4"#,
    )
    .bind(service_id)
    .bind(is_available)
    .bind(limit)
    .bind(skip)
    .fetch_all(pool)
    .await?;

    let total: i64 = sqlx::query(
        r#"SELECT COUNT(*) AS total FROM inventory
           WHERE ($1::text IS NULL OR service_id = $1)
             AND ($2::boolean IS NULL OR is_available = $2)"#,
    )
    .bind(service_id)
    .bind(is_available)
    .fetch_one(pool)
    .await?
    .get("total");

    Ok((items, total))
}

/// Reserva atómica de stock: marca no-disponible el item libre más
/// antiguo del servicio y devuelve su id. `FOR UPDATE SKIP LOCKED`
/// garantiza que dos compras concurrentes no tomen la misma cuenta.
pub async fn reserve_available_item<'e>(
    db: impl PgExecutor<'e>,
    service_id: &str,
) -> Result<Option<i64>, sqlx::Error> {
    let row = sqlx::query(
        r#"UPDATE inventory
           SET is_available = FALSE, updated_at = NOW()
           WHERE id = (
               SELECT id FROM inventory
               WHERE service_id = $1 AND is_available = TRUE
               ORDER BY created_at
               LIMIT 1
               FOR UPDATE SKIP LOCKED
           )
           RETURNING id"#,
    )
    .bind(service_id)
    .fetch_optional(db)
    .await?;

    Ok(row.map(|r| r.get("id")))
}

// ---------- orders ----------

pub async fn list_user_orders(
    pool: &PgPool,
    user_id: i64,
    status: Option<&str>,
    limit: i64,
    skip: i64,
) -> Result<(Vec<Order>, i64), sqlx::Error> {
    let orders = sqlx::query_as::<_, Order>(
        r#"SELECT * FROM orders
           WHERE user_id = $1 AND ($2::text IS NULL OR status = $2)
           ORDER BY created_at DESC
           LIMIT $3 OFFSET $4"#,
    )
    .bind(user_id)
    .bind(status)
    .bind(limit)
    .bind(skip)
    .fetch_all(pool)
    .await?;

    let total: i64 = sqlx::query(
        r#"SELECT COUNT(*) AS total FROM orders
           WHERE user_id = $1 AND ($2::text IS NULL OR status = $2)"#,
    )
    .bind(user_id)
    .bind(status)
    .fetch_one(pool)
    .await?
    .get("total");

    Ok((orders, total))
}

// ---------- users ----------

pub async fn find_user_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(r#"SELECT * FROM users WHERE email = $1"#)
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub async fn insert_user(
    pool: &PgPool,
    email: &str,
    password_hash: &str,
    display_name: Option<&str>,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"INSERT INTO users (email, password_hash, display_name)
           VALUES ($1, $2, $3)
           RETURNING *"#,
    )
    .bind(email)
    .bind(password_hash)
    .bind(display_name)
    .fetch_one(pool)
    .await
}

pub async fn touch_last_active(pool: &PgPool, user_id: i64) -> Result<(), sqlx::Error> {
    sqlx::query(r#"UPDATE users SET last_active_time = NOW(), updated_at = NOW() WHERE id = $1"#)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn set_password(pool: &PgPool, user_id: i64, password_hash: &str) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"UPDATE users
           SET password_hash = $2, last_active_time = NOW(), updated_at = NOW()
           WHERE id = $1"#,
    )
    .bind(user_id)
    .bind(password_hash)
    .execute(pool)
    .await?;

    Ok(())
}
