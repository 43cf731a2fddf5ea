use crate::AppState;
use crate::api::error::AppError;
use crate::api::middleware::auth::CurrentUser;
use crate::models::{
    Certificate, CertificateInput, CertificateList, GeneralFilter, SuccessfulRequest,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use utoipa::IntoParams;
use validator::Validate;

#[derive(Debug, Default, Deserialize, IntoParams, Validate)]
#[serde(rename_all = "camelCase", default)]
#[into_params(parameter_in = Query)]
pub struct CertificateListQuery {
    /// Sort column; `name` or the last change date
    #[validate(length(max = 64))]
    pub order_by: Option<String>,
    pub ordination_asc: Option<bool>,
    /// 1-based page, only meaningful with a limit
    pub page: Option<u64>,
    /// Page size; 0 or absent lists everything
    #[validate(range(max = 1000))]
    pub limit: Option<u64>,
    #[validate(length(max = 200))]
    pub search: Option<String>,
    pub status: Option<i32>,
    pub active: Option<bool>,
}

impl From<CertificateListQuery> for GeneralFilter {
    fn from(query: CertificateListQuery) -> Self {
        let limit = query.limit.unwrap_or(0);
        let default_page = if limit > 0 { 1 } else { 0 };

        GeneralFilter {
            column: query.order_by.unwrap_or_default(),
            ordination_asc: query.ordination_asc.unwrap_or(false),
            limit,
            page: query.page.unwrap_or(default_page),
            search: query.search.unwrap_or_default(),
            status: query.status,
            active: query.active,
        }
    }
}

#[utoipa::path(
    post,
    path = "/certificates",
    request_body = CertificateInput,
    responses(
        (status = 201, description = "Certificate created", body = Certificate),
        (status = 400, description = "Invalid certificate data or image"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "certificates"
)]
pub async fn create_certificate(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(payload): Json<CertificateInput>,
) -> Result<(StatusCode, Json<Certificate>), AppError> {
    let certificate = state.certificates.create(&user, payload).await?;
    Ok((StatusCode::CREATED, Json(certificate)))
}

#[utoipa::path(
    get,
    path = "/certificates",
    params(CertificateListQuery),
    responses(
        (status = 200, description = "Certificates of the current user", body = CertificateList),
        (status = 400, description = "Invalid filter"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "certificates"
)]
pub async fn list_certificates(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(query): Query<CertificateListQuery>,
) -> Result<Json<CertificateList>, AppError> {
    query
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let list = state.certificates.list(&user, query.into()).await?;
    Ok(Json(list))
}

#[utoipa::path(
    get,
    path = "/certificates/{id}",
    params(
        ("id" = i64, Path, description = "Certificate id")
    ),
    responses(
        (status = 200, description = "Certificate found", body = Certificate),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Certificate not found")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "certificates"
)]
pub async fn get_certificate(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<Certificate>, AppError> {
    let certificate = state.certificates.get_by_id(&user, id).await?;
    Ok(Json(certificate))
}

#[utoipa::path(
    put,
    path = "/certificates/{id}",
    params(
        ("id" = i64, Path, description = "Certificate id")
    ),
    request_body = CertificateInput,
    responses(
        (status = 200, description = "Certificate updated", body = Certificate),
        (status = 400, description = "Invalid certificate data or image"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Certificate not found")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "certificates"
)]
pub async fn edit_certificate(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(payload): Json<CertificateInput>,
) -> Result<Json<Certificate>, AppError> {
    let certificate = state.certificates.edit(&user, id, payload).await?;
    Ok(Json(certificate))
}

#[utoipa::path(
    delete,
    path = "/certificates/{id}",
    params(
        ("id" = i64, Path, description = "Certificate id")
    ),
    responses(
        (status = 200, description = "Certificate deleted", body = SuccessfulRequest),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Certificate not found")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "certificates"
)]
pub async fn delete_certificate(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<SuccessfulRequest>, AppError> {
    state.certificates.delete(&user, id).await?;
    Ok(Json(SuccessfulRequest::new()))
}
