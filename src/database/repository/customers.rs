use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use crate::{database::models::customers, errors::AppError};

pub struct NewCustomer {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub tags: Vec<String>,
}

/// Partial update; the outer `Option` distinguishes "leave alone" from
/// "set" and the inner one allows clearing a field with an explicit null.
#[derive(Default)]
pub struct CustomerPatch {
    pub name: Option<String>,
    pub email: Option<Option<String>>,
    pub phone: Option<Option<String>>,
    pub address: Option<Option<String>>,
}

pub async fn list<C: ConnectionTrait>(
    db: &C,
    company_id: Uuid,
) -> Result<Vec<customers::Model>, AppError> {
    let rows = customers::Entity::find()
        .filter(customers::Column::CompanyId.eq(company_id))
        .filter(customers::Column::DeletedAt.is_null())
        .order_by_desc(customers::Column::CreatedAt)
        .all(db)
        .await?;
    Ok(rows)
}

pub async fn find_scoped<C: ConnectionTrait>(
    db: &C,
    company_id: Uuid,
    id: Uuid,
) -> Result<Option<customers::Model>, AppError> {
    let row = customers::Entity::find()
        .filter(customers::Column::Id.eq(id))
        .filter(customers::Column::CompanyId.eq(company_id))
        .filter(customers::Column::DeletedAt.is_null())
        .one(db)
        .await?;
    Ok(row)
}

pub async fn get<C: ConnectionTrait>(
    db: &C,
    company_id: Uuid,
    id: Uuid,
) -> Result<customers::Model, AppError> {
    find_scoped(db, company_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Customer".to_string()))
}

pub async fn create<C: ConnectionTrait>(
    db: &C,
    company_id: Uuid,
    input: NewCustomer,
) -> Result<customers::Model, AppError> {
    let row = customers::ActiveModel {
        id: Set(Uuid::new_v4()),
        company_id: Set(company_id),
        name: Set(input.name),
        email: Set(input.email),
        phone: Set(input.phone),
        address: Set(input.address),
        tags: Set(serde_json::json!(input.tags)),
        created_at: Set(chrono::Utc::now()),
        updated_at: Set(None),
        deleted_at: Set(None),
    };
    Ok(row.insert(db).await?)
}

pub async fn update<C: ConnectionTrait>(
    db: &C,
    company_id: Uuid,
    id: Uuid,
    patch: CustomerPatch,
) -> Result<customers::Model, AppError> {
    let existing = get(db, company_id, id).await?;
    let mut row = existing.into_active_model();

    if let Some(name) = patch.name {
        row.name = Set(name);
    }
    if let Some(email) = patch.email {
        row.email = Set(email);
    }
    if let Some(phone) = patch.phone {
        row.phone = Set(phone);
    }
    if let Some(address) = patch.address {
        row.address = Set(address);
    }
    row.updated_at = Set(Some(chrono::Utc::now()));

    Ok(row.update(db).await?)
}

/// Idempotent: a second delete matches zero rows and is still a success.
pub async fn soft_delete<C: ConnectionTrait>(
    db: &C,
    company_id: Uuid,
    id: Uuid,
) -> Result<(), AppError> {
    customers::Entity::update_many()
        .col_expr(customers::Column::DeletedAt, Expr::value(chrono::Utc::now()))
        .filter(customers::Column::Id.eq(id))
        .filter(customers::Column::CompanyId.eq(company_id))
        .filter(customers::Column::DeletedAt.is_null())
        .exec(db)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    #[tokio::test]
    async fn list_filters_by_tenant_and_deletion() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<customers::Model>::new()])
            .into_connection();

        list(&db, Uuid::new_v4()).await.unwrap();

        let sql = format!("{:?}", db.into_transaction_log()).replace("\\\"", "\"");
        assert!(sql.contains(r#""customers"."company_id" = $1"#), "{}", sql);
        assert!(sql.contains(r#""customers"."deleted_at" IS NULL"#), "{}", sql);
        assert!(sql.contains(r#"ORDER BY "customers"."created_at" DESC"#), "{}", sql);
    }

    #[tokio::test]
    async fn update_of_unmatched_row_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<customers::Model>::new()])
            .into_connection();

        let err = update(&db, Uuid::new_v4(), Uuid::new_v4(), CustomerPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn soft_delete_of_missing_row_is_a_noop() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        soft_delete(&db, Uuid::new_v4(), Uuid::new_v4()).await.unwrap();
    }
}
