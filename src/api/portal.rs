//! Public client portal, keyed by an opaque access token minted with the
//! admin CLI. Read-only; the token row supplies the tenant scope, so every
//! lookup below still runs through the company-filtered repositories.

use actix_web::{HttpResponse, get, web};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    app_state::AppState,
    database::models::{
        companies, customers, invoice_items, invoices, portal_tokens, quote_items, quotes,
    },
    database::repository::{customers as customers_repo, invoices as invoices_repo,
        quotes as quotes_repo},
    errors::AppError,
};

// --- API Response Structures ---

#[derive(Serialize, ToSchema)]
pub struct PortalQuote {
    pub quote: quotes::Model,
    pub items: Vec<quote_items::Model>,
}

#[derive(Serialize, ToSchema)]
pub struct PortalInvoice {
    pub invoice: invoices::Model,
    pub items: Vec<invoice_items::Model>,
}

#[derive(Serialize, ToSchema)]
pub struct PortalViewResponse {
    pub company: String,
    pub customer: customers::Model,
    pub quotes: Vec<PortalQuote>,
    pub invoices: Vec<PortalInvoice>,
}

// --- Route Handlers ---

#[utoipa::path(
    get,
    path = "/api/portal/{token}",
    tag = "Portal",
    params(("token" = String, Path, description = "Opaque portal access token")),
    responses(
        (status = 200, description = "Customer view: their quotes and invoices with items", body = PortalViewResponse),
        (status = 400, description = "Unknown or expired token")
    )
)]
#[get("/{token}")]
pub async fn get_portal_view(
    app_state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let token = path.into_inner();

    let token_row = portal_tokens::Entity::find()
        .filter(portal_tokens::Column::Token.eq(token))
        .one(&app_state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Portal token".to_string()))?;

    if let Some(expires_at) = token_row.expires_at {
        if expires_at < chrono::Utc::now() {
            log::debug!("expired portal token {}", token_row.id);
            return Err(AppError::NotFound("Portal token".to_string()));
        }
    }

    let company_id = token_row.company_id;
    let customer_id = token_row.customer_id;

    let customer = customers_repo::get(&app_state.db, company_id, customer_id).await?;

    let company_name = companies::Entity::find_by_id(company_id)
        .one(&app_state.db)
        .await?
        .map(|c| c.name)
        .unwrap_or_default();

    let mut portal_quotes = Vec::new();
    for quote in quotes_repo::list_for_customer(&app_state.db, company_id, customer_id).await? {
        let items = quotes_repo::items_for(&app_state.db, company_id, quote.id).await?;
        portal_quotes.push(PortalQuote { quote, items });
    }

    let mut portal_invoices = Vec::new();
    for invoice in invoices_repo::list_for_customer(&app_state.db, company_id, customer_id).await? {
        let items = invoices_repo::items_for(&app_state.db, company_id, invoice.id).await?;
        portal_invoices.push(PortalInvoice { invoice, items });
    }

    Ok(HttpResponse::Ok().json(PortalViewResponse {
        company: company_name,
        customer,
        quotes: portal_quotes,
        invoices: portal_invoices,
    }))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/portal").service(get_portal_view));
}
