use actix_web::{HttpResponse, post, web};
use sea_orm::{ActiveModelTrait, Set, TransactionTrait};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    api::context,
    api::helpers::SuccessResponse,
    api::validation,
    app_state::AppState,
    database::models::{profiles, users},
    errors::AppError,
};

// --- DTOs ---

#[derive(Deserialize, ToSchema, Clone)]
#[serde(deny_unknown_fields)]
pub struct SignUpDto {
    pub email: String,
    pub password: String,
    pub company: String,
}

impl SignUpDto {
    fn validate(&self) -> Result<(), AppError> {
        if !validation::validate_email_opt(&self.email) {
            return Err(AppError::Validation("Invalid sign-up payload".to_string()));
        }
        if self.password.len() < 6 {
            return Err(AppError::Validation(
                "Password must be at least 6 characters".to_string(),
            ));
        }
        if self.company.trim().is_empty() || !validation::ensure_max_len(&self.company, 200) {
            return Err(AppError::Validation("Invalid company name".to_string()));
        }
        Ok(())
    }
}

// --- Route Handlers ---

#[utoipa::path(
    post,
    path = "/api/auth/sign-up",
    tag = "Auth",
    request_body = SignUpDto,
    responses(
        (status = 201, description = "User, company and profile created", body = SuccessResponse),
        (status = 400, description = "Invalid payload or creation failure")
    )
)]
#[post("/sign-up")]
pub async fn sign_up(
    data: web::Data<AppState>,
    body: web::Json<JsonValue>,
) -> Result<HttpResponse, AppError> {
    let dto: SignUpDto = validation::parse_payload(body.into_inner(), "sign-up")?;
    dto.validate()?;

    let password_hash = bcrypt::hash(&dto.password, bcrypt::DEFAULT_COST)
        .map_err(|e| AppError::Validation(format!("Unable to create user: {}", e)))?;

    // User, company and profile land together or not at all.
    let txn = data.db.begin().await?;

    let user = users::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(dto.email.clone()),
        password_hash: Set(password_hash),
        company_hint: Set(Some(dto.company.clone())),
        created_at: Set(chrono::Utc::now()),
    }
    .insert(&txn)
    .await?;

    let company = context::create_company_with_unique_slug(&txn, &dto.company).await?;

    profiles::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.id),
        company_id: Set(company.id),
        email: Set(Some(dto.email.clone())),
        full_name: Set(Some(dto.email.clone())),
        created_at: Set(chrono::Utc::now()),
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    log::info!("signed up {} into company {}", user.email, company.slug);

    Ok(HttpResponse::Created().json(SuccessResponse::ok()))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/auth").service(sign_up));
}
