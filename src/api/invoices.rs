use actix_web::{HttpRequest, HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use utoipa::ToSchema;

use crate::{
    api::context,
    api::helpers::{self, SuccessResponse},
    api::validation,
    app_state::AppState,
    database::models::{InvoiceStatus, invoice_items, invoices},
    database::repository::invoices as repo,
    errors::AppError,
    services::totals::{LineItemInput, validate_items},
};

// --- DTOs ---

#[derive(Deserialize, ToSchema, Clone)]
#[serde(deny_unknown_fields)]
pub struct CreateInvoiceDto {
    pub customer_id: String,
    pub job_id: Option<String>,
    pub due_date: Option<String>,
    pub status: Option<InvoiceStatus>,
    pub items: Option<Vec<LineItemInput>>,
}

#[derive(Deserialize, ToSchema, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct UpdateInvoiceDto {
    pub status: Option<InvoiceStatus>,
    pub due_date: Option<String>,
    pub items: Option<Vec<LineItemInput>>,
}

// --- API Response Structures ---

#[derive(Serialize, ToSchema)]
pub struct InvoiceResponse {
    pub invoice: invoices::Model,
}

#[derive(Serialize, ToSchema)]
pub struct InvoiceListResponse {
    pub invoices: Vec<invoices::Model>,
}

#[derive(Serialize, ToSchema)]
pub struct InvoiceDetailsResponse {
    pub invoice: invoices::Model,
    pub items: Vec<invoice_items::Model>,
}

// --- Route Handlers ---

#[utoipa::path(
    get,
    path = "/api/invoices",
    tag = "Invoices",
    responses(
        (status = 200, description = "Non-deleted invoices of the caller's company, newest first", body = InvoiceListResponse),
        (status = 401, description = "Not authenticated"),
        (status = 400, description = "Profile missing")
    )
)]
#[get("")]
pub async fn get_invoices(
    req: HttpRequest,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let ctx = context::resolve_tenant_context(&req, &app_state).await?;
    let invoices = repo::list(&app_state.db, ctx.company_id).await?;
    Ok(HttpResponse::Ok().json(InvoiceListResponse { invoices }))
}

#[utoipa::path(
    post,
    path = "/api/invoices",
    tag = "Invoices",
    request_body = CreateInvoiceDto,
    responses(
        (status = 201, description = "Invoice created; balance_due starts at the derived total", body = InvoiceResponse),
        (status = 401, description = "Not authenticated"),
        (status = 400, description = "Invalid payload")
    )
)]
#[post("")]
pub async fn create_invoice(
    req: HttpRequest,
    app_state: web::Data<AppState>,
    body: web::Json<JsonValue>,
) -> Result<HttpResponse, AppError> {
    let ctx = context::resolve_tenant_context(&req, &app_state).await?;

    let dto: CreateInvoiceDto = validation::parse_payload(body.into_inner(), "invoice")?;
    let customer_id = helpers::parse_uuid(&dto.customer_id, "customer_id")?;
    let job_id = dto
        .job_id
        .as_deref()
        .map(|v| helpers::parse_uuid(v, "job_id"))
        .transpose()?;
    let due_date = helpers::parse_datetime_opt(dto.due_date.as_ref(), "due_date")?;
    let items = dto.items.unwrap_or_default();
    validate_items(&items)?;

    let invoice = repo::create(
        &app_state.db,
        ctx.company_id,
        repo::NewInvoice {
            customer_id,
            job_id,
            status: dto.status.unwrap_or_default(),
            due_date,
            items,
        },
    )
    .await?;

    Ok(HttpResponse::Created().json(InvoiceResponse { invoice }))
}

#[utoipa::path(
    get,
    path = "/api/invoices/{id}",
    tag = "Invoices",
    params(("id" = String, Path, description = "Invoice UUID")),
    responses(
        (status = 200, description = "Invoice with its line items", body = InvoiceDetailsResponse),
        (status = 401, description = "Not authenticated"),
        (status = 400, description = "Unknown id for this tenant")
    )
)]
#[get("/{id}")]
pub async fn get_invoice(
    req: HttpRequest,
    app_state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let ctx = context::resolve_tenant_context(&req, &app_state).await?;
    let id = helpers::parse_uuid(&path.into_inner(), "id")?;
    let (invoice, items) = repo::get_with_items(&app_state.db, ctx.company_id, id).await?;
    Ok(HttpResponse::Ok().json(InvoiceDetailsResponse { invoice, items }))
}

#[utoipa::path(
    put,
    path = "/api/invoices/{id}",
    tag = "Invoices",
    params(("id" = String, Path, description = "Invoice UUID")),
    request_body = UpdateInvoiceDto,
    responses(
        (status = 200, description = "Invoice updated; a submitted item set fully replaces the old one", body = InvoiceResponse),
        (status = 401, description = "Not authenticated"),
        (status = 400, description = "Invalid payload or unknown id for this tenant")
    )
)]
#[put("/{id}")]
pub async fn update_invoice(
    req: HttpRequest,
    app_state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<JsonValue>,
) -> Result<HttpResponse, AppError> {
    let ctx = context::resolve_tenant_context(&req, &app_state).await?;
    let id = helpers::parse_uuid(&path.into_inner(), "id")?;

    let dto: UpdateInvoiceDto = validation::parse_payload(body.into_inner(), "invoice")?;
    let due_date = helpers::parse_datetime_opt(dto.due_date.as_ref(), "due_date")?;
    if let Some(items) = &dto.items {
        validate_items(items)?;
    }

    let invoice = repo::update(
        &app_state.db,
        ctx.company_id,
        id,
        repo::InvoicePatch {
            status: dto.status,
            due_date,
            items: dto.items,
        },
    )
    .await?;

    Ok(HttpResponse::Ok().json(InvoiceResponse { invoice }))
}

#[utoipa::path(
    delete,
    path = "/api/invoices/{id}",
    tag = "Invoices",
    params(("id" = String, Path, description = "Invoice UUID")),
    responses(
        (status = 200, description = "Invoice soft-deleted", body = SuccessResponse),
        (status = 401, description = "Not authenticated")
    )
)]
#[delete("/{id}")]
pub async fn delete_invoice(
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
        web::scope("/invoices")
            .service(get_invoices)
            .service(create_invoice)
            .service(get_invoice)
            .service(update_invoice)
            .service(delete_invoice),
    );
}
