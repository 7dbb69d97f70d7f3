//! Identity resolution: maps an authenticated session to its tenant.
//!
//! Session issuance belongs to the external identity provider; this module
//! only consumes the resulting cookies and turns them into an explicit
//! [`TenantContext`] that is passed as a parameter through every call.

use actix_web::{HttpRequest, web};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    api::validation,
    app_state::AppState,
    database::models::{companies, profiles, users},
    errors::AppError,
};

/// Resolved caller identity: which external user, which profile, which tenant.
#[derive(Clone, Copy, Debug)]
pub struct TenantContext {
    pub user_id: Uuid,
    pub profile_id: Uuid,
    pub company_id: Uuid,
}

fn parse_uuid_cookie(req: &HttpRequest, name: &str) -> Result<Uuid, AppError> {
    let cookie = req
        .cookie(name)
        .ok_or_else(|| AppError::Unauthenticated(format!("Missing `{}` cookie", name)))?;

    Uuid::parse_str(cookie.value())
        .map_err(|_| AppError::Unauthenticated(format!("Invalid `{}` cookie", name)))
}

/// Session -> `(profile, company)` or an error; never creates anything.
pub async fn resolve_tenant_context(
    req: &HttpRequest,
    app_state: &web::Data<AppState>,
) -> Result<TenantContext, AppError> {
    let _session_cookie = req
        .cookie("session_id")
        .ok_or_else(|| AppError::Unauthenticated("Missing `session_id` cookie".to_string()))?;

    let user_id = parse_uuid_cookie(req, "user_id")?;

    let profile = profiles::Entity::find()
        .filter(profiles::Column::UserId.eq(user_id))
        .one(&app_state.db)
        .await?
        .ok_or(AppError::ProfileMissing)?;

    Ok(TenantContext {
        user_id,
        profile_id: profile.id,
        company_id: profile.company_id,
    })
}

/// Like [`resolve_tenant_context`] but bootstraps a company and profile when
/// the session has none yet. Invoked from the customer-creation boundary only;
/// read paths never create tenants.
pub async fn ensure_tenant_context(
    req: &HttpRequest,
    app_state: &web::Data<AppState>,
) -> Result<TenantContext, AppError> {
    match resolve_tenant_context(req, app_state).await {
        Err(AppError::ProfileMissing) => {
            let user_id = parse_uuid_cookie(req, "user_id")?;
            bootstrap_tenant(&app_state.db, user_id).await
        }
        other => other,
    }
}

/// Creates at most one company and exactly one profile for the session user.
/// Company slug collisions are retried once with a random suffix; the whole
/// sequence runs in a single transaction.
async fn bootstrap_tenant(
    db: &DatabaseConnection,
    user_id: Uuid,
) -> Result<TenantContext, AppError> {
    let user = users::Entity::find_by_id(user_id).one(db).await?;

    let hint = user
        .as_ref()
        .and_then(|u| u.company_hint.clone())
        .filter(|h| !h.trim().is_empty());
    let email = user.as_ref().map(|u| u.email.clone());
    let desired_name = hint
        .clone()
        .or_else(|| email.clone())
        .unwrap_or_else(|| "Default Company".to_string());

    let txn = db.begin().await?;

    // With a sign-up hint the company is looked up by that slug verbatim.
    // Without one the earliest company wins; that fallback is tenant-ambiguous
    // by construction and only exists for sessions predating slug capture.
    let existing = match &hint {
        Some(slug) => {
            companies::Entity::find()
                .filter(companies::Column::Slug.eq(slug.clone()))
                .one(&txn)
                .await?
        }
        None => {
            companies::Entity::find()
                .order_by_asc(companies::Column::CreatedAt)
                .one(&txn)
                .await?
        }
    };

    let company = match existing {
        Some(company) => company,
        None => create_company_with_unique_slug(&txn, &desired_name)
            .await
            .map_err(|e| {
                AppError::TenantResolution(format!("no company available: {}", e))
            })?,
    };

    let profile = profiles::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        company_id: Set(company.id),
        email: Set(email.clone()),
        full_name: Set(email),
        created_at: Set(chrono::Utc::now()),
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    log::info!(
        "bootstrapped tenant: user={} profile={} company={} ({})",
        user_id,
        profile.id,
        company.id,
        company.slug
    );

    Ok(TenantContext {
        user_id,
        profile_id: profile.id,
        company_id: company.id,
    })
}

/// Inserts a company whose slug derives from `name`; a taken slug gets one
/// 4-character random suffix. Shared by sign-up and tenant bootstrap.
pub async fn create_company_with_unique_slug<C: ConnectionTrait>(
    db: &C,
    name: &str,
) -> Result<companies::Model, AppError> {
    let base = validation::slugify(name);

    let taken = companies::Entity::find()
        .filter(companies::Column::Slug.eq(base.clone()))
        .one(db)
        .await?
        .is_some();

    let slug = if taken {
        format!("{}-{}", base, validation::slug_suffix())
    } else {
        base
    };

    let company = companies::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        slug: Set(slug),
        created_at: Set(chrono::Utc::now()),
        updated_at: Set(None),
    }
    .insert(db)
    .await?;

    Ok(company)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn company_row(slug: &str) -> companies::Model {
        companies::Model {
            id: Uuid::new_v4(),
            name: "Acme".to_string(),
            slug: slug.to_string(),
            created_at: chrono::Utc::now(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn fresh_slug_is_used_verbatim() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<companies::Model>::new()])
            .append_query_results([vec![company_row("acme-plumbing")]])
            .into_connection();

        create_company_with_unique_slug(&db, "Acme Plumbing")
            .await
            .unwrap();

        let sql = format!("{:?}", db.into_transaction_log()).replace("\\\"", "\"");
        assert!(sql.contains(r#"String(Some("acme-plumbing"))"#), "{}", sql);
    }

    #[tokio::test]
    async fn taken_slug_gets_a_suffix() {
        // Slug lookup hits an existing row, so the insert must carry a
        // suffixed slug instead of failing on the unique constraint.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![company_row("acme")]])
            .append_query_results([vec![company_row("acme-x1y2")]])
            .into_connection();

        create_company_with_unique_slug(&db, "Acme").await.unwrap();

        let sql = format!("{:?}", db.into_transaction_log()).replace("\\\"", "\"");
        assert!(sql.contains(r#"String(Some("acme-"#), "{}", sql);
    }
}
