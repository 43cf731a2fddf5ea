pub mod api;
pub mod config;
pub mod entities;
pub mod infrastructure;
pub mod models;
pub mod repositories;
pub mod services;
pub mod utils;

use crate::config::Settings;
use crate::services::auth_service::AuthUseCase;
use crate::services::certificate_service::CertificateUseCase;
use crate::services::storage::FileStorage;
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware::from_fn_with_state,
    routing::{get, post},
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::auth::login,
        api::handlers::auth::register,
        api::handlers::auth::request_password_recovery,
        api::handlers::auth::reset_password,
        api::handlers::certificates::create_certificate,
        api::handlers::certificates::list_certificates,
        api::handlers::certificates::get_certificate,
        api::handlers::certificates::edit_certificate,
        api::handlers::certificates::delete_certificate,
        api::handlers::health::health_check,
    ),
    components(
        schemas(
            api::handlers::auth::PasswordRecoveryRequest,
            api::handlers::health::HealthResponse,
            models::Address,
            models::User,
            models::UserType,
            models::EntityStatus,
            models::Certificate,
            models::CertificateInput,
            models::CertificateList,
            models::LoginCredentials,
            models::AuthSession,
            models::RegisterUser,
            models::ResetPassword,
            models::SuccessfulRequest,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Login, registration and password recovery"),
        (name = "certificates", description = "Certificate management"),
        (name = "system", description = "Service status")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "jwt",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub settings: Settings,
    pub storage: Arc<dyn FileStorage>,
    pub auth: Arc<dyn AuthUseCase>,
    pub certificates: Arc<dyn CertificateUseCase>,
}

fn cors_layer(settings: &Settings) -> CorsLayer {
    let origins: Vec<HeaderValue> = settings
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
}

pub fn create_app(state: AppState) -> Router {
    let certificates = Router::new()
        .route(
            "/certificates",
            post(api::handlers::certificates::create_certificate)
                .get(api::handlers::certificates::list_certificates),
        )
        .route(
            "/certificates/:id",
            get(api::handlers::certificates::get_certificate)
                .put(api::handlers::certificates::edit_certificate)
                .delete(api::handlers::certificates::delete_certificate),
        )
        .layer(from_fn_with_state(
            state.clone(),
            api::middleware::auth::auth_middleware,
        ));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(api::handlers::health::health_check))
        .route("/login", post(api::handlers::auth::login))
        .route("/register", post(api::handlers::auth::register))
        .route(
            "/password/recovery",
            post(api::handlers::auth::request_password_recovery),
        )
        .route("/password/reset", post(api::handlers::auth::reset_password))
        .merge(certificates)
        .layer(cors_layer(&state.settings))
        .layer(axum::extract::DefaultBodyLimit::max(
            state.settings.max_body_size,
        ))
        .with_state(state)
}
