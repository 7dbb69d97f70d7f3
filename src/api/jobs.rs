use actix_web::{HttpRequest, HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use utoipa::ToSchema;

use crate::{
    api::context,
    api::helpers::{self, SuccessResponse},
    api::validation,
    app_state::AppState,
    database::models::{JobStatus, jobs},
    database::repository::jobs as repo,
    errors::AppError,
};

// --- DTOs ---

#[derive(Deserialize, ToSchema, Clone)]
#[serde(deny_unknown_fields)]
pub struct CreateJobDto {
    pub customer_id: String,
    pub title: String,
    pub scheduled_at: Option<String>,
    pub status: Option<JobStatus>,
    pub notes: Option<String>,
}

#[derive(Deserialize, ToSchema, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct UpdateJobDto {
    pub title: Option<String>,
    pub status: Option<JobStatus>,
    pub scheduled_at: Option<String>,
    pub notes: Option<String>,
}

fn validate_title(title: &str) -> Result<(), AppError> {
    if !validation::ensure_min_len(title, 2) || !validation::ensure_max_len(title, 200) {
        return Err(AppError::Validation(
            "Job title must be 2..200 characters".to_string(),
        ));
    }
    Ok(())
}

// --- API Response Structures ---

#[derive(Serialize, ToSchema)]
pub struct JobResponse {
    pub job: jobs::Model,
}

#[derive(Serialize, ToSchema)]
pub struct JobListResponse {
    pub jobs: Vec<jobs::Model>,
}

// --- Route Handlers ---

#[utoipa::path(
    get,
    path = "/api/jobs",
    tag = "Jobs",
    responses(
        (status = 200, description = "Non-deleted jobs of the caller's company, soonest first", body = JobListResponse),
        (status = 401, description = "Not authenticated"),
        (status = 400, description = "Profile missing")
    )
)]
#[get("")]
pub async fn get_jobs(
    req: HttpRequest,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let ctx = context::resolve_tenant_context(&req, &app_state).await?;
    let jobs = repo::list(&app_state.db, ctx.company_id).await?;
    Ok(HttpResponse::Ok().json(JobListResponse { jobs }))
}

#[utoipa::path(
    post,
    path = "/api/jobs",
    tag = "Jobs",
    request_body = CreateJobDto,
    responses(
        (status = 201, description = "Job created", body = JobResponse),
        (status = 401, description = "Not authenticated"),
        (status = 400, description = "Invalid payload")
    )
)]
#[post("")]
pub async fn create_job(
    req: HttpRequest,
    app_state: web::Data<AppState>,
    body: web::Json<JsonValue>,
) -> Result<HttpResponse, AppError> {
    let ctx = context::resolve_tenant_context(&req, &app_state).await?;

    let dto: CreateJobDto = validation::parse_payload(body.into_inner(), "job")?;
    validate_title(&dto.title)?;
    let customer_id = helpers::parse_uuid(&dto.customer_id, "customer_id")?;
    let scheduled_at = helpers::parse_datetime_opt(dto.scheduled_at.as_ref(), "scheduled_at")?;

    let job = repo::create(
        &app_state.db,
        ctx.company_id,
        repo::NewJob {
            customer_id,
            title: dto.title,
            status: dto.status.unwrap_or_default(),
            scheduled_at,
            notes: dto.notes,
        },
    )
    .await?;

    Ok(HttpResponse::Created().json(JobResponse { job }))
}

#[utoipa::path(
    get,
    path = "/api/jobs/{id}",
    tag = "Jobs",
    params(("id" = String, Path, description = "Job UUID")),
    responses(
        (status = 200, description = "Job details", body = JobResponse),
        (status = 401, description = "Not authenticated"),
        (status = 400, description = "Unknown id for this tenant")
    )
)]
#[get("/{id}")]
pub async fn get_job(
    req: HttpRequest,
    app_state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let ctx = context::resolve_tenant_context(&req, &app_state).await?;
    let id = helpers::parse_uuid(&path.into_inner(), "id")?;
    let job = repo::get(&app_state.db, ctx.company_id, id).await?;
    Ok(HttpResponse::Ok().json(JobResponse { job }))
}

#[utoipa::path(
    put,
    path = "/api/jobs/{id}",
    tag = "Jobs",
    params(("id" = String, Path, description = "Job UUID")),
    request_body = UpdateJobDto,
    responses(
        (status = 200, description = "Job updated", body = JobResponse),
        (status = 401, description = "Not authenticated"),
        (status = 400, description = "Invalid payload or unknown id for this tenant")
    )
)]
#[put("/{id}")]
pub async fn update_job(
    req: HttpRequest,
    app_state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<JsonValue>,
) -> Result<HttpResponse, AppError> {
    let ctx = context::resolve_tenant_context(&req, &app_state).await?;
    let id = helpers::parse_uuid(&path.into_inner(), "id")?;

    let dto: UpdateJobDto = validation::parse_payload(body.into_inner(), "job")?;
    if let Some(title) = &dto.title {
        validate_title(title)?;
    }
    let scheduled_at = helpers::parse_datetime_opt(dto.scheduled_at.as_ref(), "scheduled_at")?;

    let job = repo::update(
        &app_state.db,
        ctx.company_id,
        id,
        repo::JobPatch {
            title: dto.title,
            status: dto.status,
            scheduled_at,
            notes: dto.notes,
        },
    )
    .await?;

    Ok(HttpResponse::Ok().json(JobResponse { job }))
}

#[utoipa::path(
    delete,
    path = "/api/jobs/{id}",
    tag = "Jobs",
    params(("id" = String, Path, description = "Job UUID")),
    responses(
        (status = 200, description = "Job soft-deleted", body = SuccessResponse),
        (status = 401, description = "Not authenticated")
    )
)]
#[delete("/{id}")]
pub async fn delete_job(
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
        web::scope("/jobs")
            .service(get_jobs)
            .service(create_job)
            .service(get_job)
            .service(update_job)
            .service(delete_job),
    );
}
