use actix_web::{HttpRequest, HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use utoipa::ToSchema;

use crate::{
    api::context,
    api::helpers::{self, SuccessResponse},
    api::validation,
    app_state::AppState,
    database::models::{QuoteStatus, quote_items, quotes},
    database::repository::quotes as repo,
    errors::AppError,
    services::totals::{LineItemInput, validate_items},
};

// --- DTOs ---

#[derive(Deserialize, ToSchema, Clone)]
#[serde(deny_unknown_fields)]
pub struct CreateQuoteDto {
    pub customer_id: String,
    pub title: String,
    pub expires_at: Option<String>,
    pub items: Option<Vec<LineItemInput>>,
}

#[derive(Deserialize, ToSchema, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct UpdateQuoteDto {
    pub title: Option<String>,
    pub status: Option<QuoteStatus>,
    pub expires_at: Option<String>,
    pub items: Option<Vec<LineItemInput>>,
}

fn validate_title(title: &str) -> Result<(), AppError> {
    if !validation::ensure_min_len(title, 2) || !validation::ensure_max_len(title, 200) {
        return Err(AppError::Validation(
            "Quote title must be 2..200 characters".to_string(),
        ));
    }
    Ok(())
}

// --- API Response Structures ---

#[derive(Serialize, ToSchema)]
pub struct QuoteResponse {
    pub quote: quotes::Model,
}

#[derive(Serialize, ToSchema)]
pub struct QuoteListResponse {
    pub quotes: Vec<quotes::Model>,
}

#[derive(Serialize, ToSchema)]
pub struct QuoteDetailsResponse {
    pub quote: quotes::Model,
    pub items: Vec<quote_items::Model>,
}

// --- Route Handlers ---

#[utoipa::path(
    get,
    path = "/api/quotes",
    tag = "Quotes",
    responses(
        (status = 200, description = "Non-deleted quotes of the caller's company, newest first", body = QuoteListResponse),
        (status = 401, description = "Not authenticated"),
        (status = 400, description = "Profile missing")
    )
)]
#[get("")]
pub async fn get_quotes(
    req: HttpRequest,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let ctx = context::resolve_tenant_context(&req, &app_state).await?;
    let quotes = repo::list(&app_state.db, ctx.company_id).await?;
    Ok(HttpResponse::Ok().json(QuoteListResponse { quotes }))
}

#[utoipa::path(
    post,
    path = "/api/quotes",
    tag = "Quotes",
    request_body = CreateQuoteDto,
    responses(
        (status = 201, description = "Quote created in draft with derived totals", body = QuoteResponse),
        (status = 401, description = "Not authenticated"),
        (status = 400, description = "Invalid payload")
    )
)]
#[post("")]
pub async fn create_quote(
    req: HttpRequest,
    app_state: web::Data<AppState>,
    body: web::Json<JsonValue>,
) -> Result<HttpResponse, AppError> {
    let ctx = context::resolve_tenant_context(&req, &app_state).await?;

    let dto: CreateQuoteDto = validation::parse_payload(body.into_inner(), "quote")?;
    validate_title(&dto.title)?;
    let customer_id = helpers::parse_uuid(&dto.customer_id, "customer_id")?;
    let expires_at = helpers::parse_datetime_opt(dto.expires_at.as_ref(), "expires_at")?;
    let items = dto.items.unwrap_or_default();
    validate_items(&items)?;

    let quote = repo::create(
        &app_state.db,
        ctx.company_id,
        repo::NewQuote {
            customer_id,
            title: dto.title,
            expires_at,
            items,
            created_by: ctx.profile_id,
        },
    )
    .await?;

    Ok(HttpResponse::Created().json(QuoteResponse { quote }))
}

#[utoipa::path(
    get,
    path = "/api/quotes/{id}",
    tag = "Quotes",
    params(("id" = String, Path, description = "Quote UUID")),
    responses(
        (status = 200, description = "Quote with its line items", body = QuoteDetailsResponse),
        (status = 401, description = "Not authenticated"),
        (status = 400, description = "Unknown id for this tenant")
    )
)]
#[get("/{id}")]
pub async fn get_quote(
    req: HttpRequest,
    app_state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let ctx = context::resolve_tenant_context(&req, &app_state).await?;
    let id = helpers::parse_uuid(&path.into_inner(), "id")?;
    let (quote, items) = repo::get_with_items(&app_state.db, ctx.company_id, id).await?;
    Ok(HttpResponse::Ok().json(QuoteDetailsResponse { quote, items }))
}

#[utoipa::path(
    put,
    path = "/api/quotes/{id}",
    tag = "Quotes",
    params(("id" = String, Path, description = "Quote UUID")),
    request_body = UpdateQuoteDto,
    responses(
        (status = 200, description = "Quote updated; a submitted item set fully replaces the old one", body = QuoteResponse),
        (status = 401, description = "Not authenticated"),
        (status = 400, description = "Invalid payload or unknown id for this tenant")
    )
)]
#[put("/{id}")]
pub async fn update_quote(
    req: HttpRequest,
    app_state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<JsonValue>,
) -> Result<HttpResponse, AppError> {
    let ctx = context::resolve_tenant_context(&req, &app_state).await?;
    let id = helpers::parse_uuid(&path.into_inner(), "id")?;

    let dto: UpdateQuoteDto = validation::parse_payload(body.into_inner(), "quote")?;
    if let Some(title) = &dto.title {
        validate_title(title)?;
    }
    let expires_at = helpers::parse_datetime_opt(dto.expires_at.as_ref(), "expires_at")?;
    if let Some(items) = &dto.items {
        validate_items(items)?;
    }

    let quote = repo::update(
        &app_state.db,
        ctx.company_id,
        id,
        repo::QuotePatch {
            title: dto.title,
            status: dto.status,
            expires_at,
            items: dto.items,
        },
    )
    .await?;

    Ok(HttpResponse::Ok().json(QuoteResponse { quote }))
}

#[utoipa::path(
    delete,
    path = "/api/quotes/{id}",
    tag = "Quotes",
    params(("id" = String, Path, description = "Quote UUID")),
    responses(
        (status = 200, description = "Quote soft-deleted", body = SuccessResponse),
        (status = 401, description = "Not authenticated")
    )
)]
#[delete("/{id}")]
pub async fn delete_quote(
    req: HttpRequest,
    app_state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let ctx = context::resolve_tenant_context(&req, &app_state).await?;
    let id = helpers::parse_uuid(&path.into_inner(), "id")?;
    repo::soft_delete(&app_state.db, ctx.company_id, id).await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::ok()))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/quotes")
            .service(get_quotes)
            .service(create_quote)
            .service(get_quote)
            .service(update_quote)
            .service(delete_quote),
    );
}
