use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::auth::register,
        crate::api::auth::login,
        crate::api::currency::currency_rates,
        crate::api::currency::convert_currency,
        crate::api::services::list_services,
        crate::api::services::get_service,
        crate::api::orders::create_order,
        crate::api::orders::my_orders
    ),
    components(
        schemas(
            crate::api::auth::RegisterRequest,
            crate::api::auth::LoginRequest,
            crate::api::orders::CreateOrderRequest,
            crate::currency::Conversion,
            crate::catalog::ServiceView,
            crate::models::CurrencyRate,
            crate::models::Service,
            crate::models::Order
        )
    ),
    tags(
        (name = "auth", description = "Autenticación"),
        (name = "currency", description = "Tasas de cambio y conversión"),
        (name = "services", description = "Catálogo de servicios"),
        (name = "orders", description = "Órdenes de compra")
    )
)]
pub struct ApiDoc;
