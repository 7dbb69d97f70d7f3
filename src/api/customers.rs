use actix_web::{HttpRequest, HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use utoipa::ToSchema;

use crate::{
    api::context,
    api::helpers::{self, SuccessResponse},
    api::validation,
    app_state::AppState,
    database::models::customers,
    database::repository::customers as repo,
    errors::AppError,
};

// --- DTOs ---

#[derive(Deserialize, ToSchema, Clone)]
#[serde(deny_unknown_fields)]
pub struct CreateCustomerDto {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl CreateCustomerDto {
    fn validate(&self) -> Result<(), AppError> {
        validate_customer_fields(
            Some(&self.name),
            self.email.as_deref(),
            self.phone.as_deref(),
            self.address.as_deref(),
        )
    }
}

#[derive(Deserialize, ToSchema, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct UpdateCustomerDto {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "validation::double_option")]
    #[schema(value_type = Option<String>)]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "validation::double_option")]
    #[schema(value_type = Option<String>)]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "validation::double_option")]
    #[schema(value_type = Option<String>)]
    pub address: Option<Option<String>>,
}

impl UpdateCustomerDto {
    fn validate(&self) -> Result<(), AppError> {
        validate_customer_fields(
            self.name.as_deref(),
            self.email.as_ref().and_then(|e| e.as_deref()),
            self.phone.as_ref().and_then(|p| p.as_deref()),
            self.address.as_ref().and_then(|a| a.as_deref()),
        )
    }
}

fn validate_customer_fields(
    name: Option<&str>,
    email: Option<&str>,
    phone: Option<&str>,
    address: Option<&str>,
) -> Result<(), AppError> {
    if let Some(name) = name {
        if !validation::ensure_min_len(name, 2) || !validation::ensure_max_len(name, 200) {
            return Err(AppError::Validation(
                "Customer name must be 2..200 characters".to_string(),
            ));
        }
    }
    if let Some(email) = email {
        if !validation::validate_email_opt(email) {
            return Err(AppError::Validation("Invalid customer email".to_string()));
        }
    }
    if let Some(phone) = phone {
        if !validation::ensure_max_len(phone, 50) {
            return Err(AppError::Validation("Customer phone too long".to_string()));
        }
    }
    if let Some(address) = address {
        if !validation::ensure_max_len(address, 500) {
            return Err(AppError::Validation("Customer address too long".to_string()));
        }
    }
    Ok(())
}

// --- API Response Structures ---

#[derive(Serialize, ToSchema)]
pub struct CustomerResponse {
    pub customer: customers::Model,
}

#[derive(Serialize, ToSchema)]
pub struct CustomerListResponse {
    pub customers: Vec<customers::Model>,
}

// --- Route Handlers ---

#[utoipa::path(
    get,
    path = "/api/customers",
    tag = "Customers",
    responses(
        (status = 200, description = "Non-deleted customers of the caller's company", body = CustomerListResponse),
        (status = 401, description = "Not authenticated"),
        (status = 400, description = "Profile missing")
    )
)]
#[get("")]
pub async fn get_customers(
    req: HttpRequest,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let ctx = context::resolve_tenant_context(&req, &app_state).await?;
    let customers = repo::list(&app_state.db, ctx.company_id).await?;
    Ok(HttpResponse::Ok().json(CustomerListResponse { customers }))
}

#[utoipa::path(
    post,
    path = "/api/customers",
    tag = "Customers",
    request_body = CreateCustomerDto,
    responses(
        (status = 201, description = "Customer created", body = CustomerResponse),
        (status = 401, description = "Not authenticated"),
        (status = 400, description = "Invalid payload")
    )
)]
#[post("")]
pub async fn create_customer(
    req: HttpRequest,
    app_state: web::Data<AppState>,
    body: web::Json<JsonValue>,
) -> Result<HttpResponse, AppError> {
    // The one write path that may bootstrap a tenant for a fresh session.
    let ctx = context::ensure_tenant_context(&req, &app_state).await?;

    let dto: CreateCustomerDto = validation::parse_payload(body.into_inner(), "customer")?;
    dto.validate()?;

    let customer = repo::create(
        &app_state.db,
        ctx.company_id,
        repo::NewCustomer {
            name: dto.name,
            email: dto.email,
            phone: dto.phone,
            address: dto.address,
            tags: Vec::new(),
        },
    )
    .await?;

    Ok(HttpResponse::Created().json(CustomerResponse { customer }))
}

#[utoipa::path(
    get,
    path = "/api/customers/{id}",
    tag = "Customers",
    params(("id" = String, Path, description = "Customer UUID")),
    responses(
        (status = 200, description = "Customer details", body = CustomerResponse),
        (status = 401, description = "Not authenticated"),
        (status = 400, description = "Unknown id for this tenant")
    )
)]
#[get("/{id}")]
pub async fn get_customer(
    req: HttpRequest,
    app_state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let ctx = context::resolve_tenant_context(&req, &app_state).await?;
    let id = helpers::parse_uuid(&path.into_inner(), "id")?;
    let customer = repo::get(&app_state.db, ctx.company_id, id).await?;
    Ok(HttpResponse::Ok().json(CustomerResponse { customer }))
}

#[utoipa::path(
    put,
    path = "/api/customers/{id}",
    tag = "Customers",
    params(("id" = String, Path, description = "Customer UUID")),
    request_body = UpdateCustomerDto,
    responses(
        (status = 200, description = "Customer updated", body = CustomerResponse),
        (status = 401, description = "Not authenticated"),
        (status = 400, description = "Invalid payload or unknown id for this tenant")
    )
)]
#[put("/{id}")]
pub async fn update_customer(
    req: HttpRequest,
    app_state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<JsonValue>,
) -> Result<HttpResponse, AppError> {
    let ctx = context::resolve_tenant_context(&req, &app_state).await?;
    let id = helpers::parse_uuid(&path.into_inner(), "id")?;

    let dto: UpdateCustomerDto = validation::parse_payload(body.into_inner(), "customer")?;
    dto.validate()?;

    let customer = repo::update(
        &app_state.db,
        ctx.company_id,
        id,
        repo::CustomerPatch {
            name: dto.name,
            email: dto.email,
            phone: dto.phone,
            address: dto.address,
        },
    )
    .await?;

    Ok(HttpResponse::Ok().json(CustomerResponse { customer }))
}

#[utoipa::path(
    delete,
    path = "/api/customers/{id}",
    tag = "Customers",
    params(("id" = String, Path, description = "Customer UUID")),
    responses(
        (status = 200, description = "Customer soft-deleted", body = SuccessResponse),
        (status = 401, description = "Not authenticated")
    )
)]
#[delete("/{id}")]
pub async fn delete_customer(
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
        web::scope("/customers")
            .service(get_customers)
            .service(create_customer)
            .service(get_customer)
            .service(update_customer)
            .service(delete_customer),
    );
}
