// src/currency.rs

use serde::Serialize;
use sqlx::PgPool;
use utoipa::ToSchema;

use crate::db;
use crate::error::ShopError;

/// Moneda de referencia: todas las tasas almacenadas son "1 USD = rate".
pub const BASE_CURRENCY: &str = "USD";

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Conversion {
    pub amount: f64,
    pub converted_amount: f64,
    pub from: String,
    pub to: String,
    pub rate: f64,
}

/// Redondeo a 2 decimales, solo sobre valores devueltos al cliente.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Redondeo a 4 decimales para tasas reportadas.
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Tasa efectiva entre dos monedas no-base, pasando por USD.
pub fn cross_rate(from_rate: f64, to_rate: f64) -> f64 {
    to_rate / from_rate
}

/// Conversión sobre una tabla de tasas en memoria. `active_rate` debe
/// devolver la tasa activa ("1 USD = rate") o `None` si la moneda no
/// existe o está desactivada.
pub fn convert_with<F>(amount: f64, from: &str, to: &str, active_rate: F) -> Result<Conversion, ShopError>
where
    F: Fn(&str) -> Option<f64>,
{
    if amount <= 0.0 {
        return Err(ShopError::Validation("El monto debe ser mayor que 0".to_string()));
    }

    let from_code = from.to_uppercase();
    let to_code = to.to_uppercase();

    // Monedas iguales: identidad, sin tocar la tabla.
    if from_code == to_code {
        return Ok(Conversion {
            amount,
            converted_amount: amount,
            from: from_code,
            to: to_code,
            rate: 1.0,
        });
    }

    let lookup = |code: &str| {
        active_rate(code).ok_or_else(|| ShopError::NotFound(format!("Divisa {code} no encontrada")))
    };

    let (converted, rate) = if from_code == BASE_CURRENCY {
        let to_rate = lookup(&to_code)?;
        (amount * to_rate, to_rate)
    } else if to_code == BASE_CURRENCY {
        let from_rate = lookup(&from_code)?;
        (amount / from_rate, 1.0 / from_rate)
    } else {
        // Cruce entre dos monedas no-base: primero a USD, luego al destino.
        let from_rate = lookup(&from_code)?;
        let to_rate = lookup(&to_code)?;
        ((amount / from_rate) * to_rate, cross_rate(from_rate, to_rate))
    };

    Ok(Conversion {
        amount,
        converted_amount: round2(converted),
        from: from_code,
        to: to_code,
        rate: round4(rate),
    })
}

/// Conversión contra la tabla `currency_rates`. Lectura pura: no hay
/// efectos secundarios sobre tasas ni órdenes.
pub async fn convert(pool: &PgPool, amount: f64, from: &str, to: &str) -> Result<Conversion, ShopError> {
    let from_code = from.to_uppercase();
    let to_code = to.to_uppercase();

    // Precarga de las tasas necesarias (a lo sumo dos consultas).
    let mut table: Vec<(String, f64)> = Vec::new();
    if amount > 0.0 && from_code != to_code {
        for code in [from_code.as_str(), to_code.as_str()] {
            if code != BASE_CURRENCY && !table.iter().any(|(c, _)| c == code) {
                if let Some(rate) = db::find_active_rate(pool, code).await? {
                    table.push((code.to_string(), rate));
                }
            }
        }
    }

    convert_with(amount, &from_code, &to_code, |code| {
        table.iter().find(|(c, _)| c == code).map(|(_, r)| *r)
    })
}

/// Valores congelados en una orden: tasa almacenada de la moneda y el
/// monto normalizado a USD.
#[derive(Debug, Clone, Copy)]
pub struct UsdSnapshot {
    pub amount_usd: f64,
    pub exchange_rate: f64,
}

/// Normaliza un monto a USD con la tasa activa de `currency`.
pub fn usd_snapshot_with<F>(amount: f64, currency: &str, active_rate: F) -> Result<UsdSnapshot, ShopError>
where
    F: Fn(&str) -> Option<f64>,
{
    let code = currency.to_uppercase();
    if code == BASE_CURRENCY {
        return Ok(UsdSnapshot {
            amount_usd: amount,
            exchange_rate: 1.0,
        });
    }

    let rate = active_rate(&code)
        .ok_or_else(|| ShopError::NotFound(format!("Divisa {code} no encontrada")))?;

    Ok(UsdSnapshot {
        amount_usd: round2(amount / rate),
        exchange_rate: rate,
    })
}
