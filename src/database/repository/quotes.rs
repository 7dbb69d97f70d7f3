use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use sea_orm::prelude::DateTimeUtc;
use uuid::Uuid;

use crate::{
    database::models::{QuoteStatus, quote_items, quotes},
    errors::AppError,
    services::totals,
};

pub struct NewQuote {
    pub customer_id: Uuid,
    pub title: String,
    pub expires_at: Option<DateTimeUtc>,
    pub items: Vec<totals::LineItemInput>,
    pub created_by: Uuid,
}

#[derive(Default)]
pub struct QuotePatch {
    pub title: Option<String>,
    pub status: Option<QuoteStatus>,
    pub expires_at: Option<DateTimeUtc>,
    pub items: Option<Vec<totals::LineItemInput>>,
}

pub async fn list<C: ConnectionTrait>(
    db: &C,
    company_id: Uuid,
) -> Result<Vec<quotes::Model>, AppError> {
    let rows = quotes::Entity::find()
        .filter(quotes::Column::CompanyId.eq(company_id))
        .filter(quotes::Column::DeletedAt.is_null())
        .order_by_desc(quotes::Column::CreatedAt)
        .all(db)
        .await?;
    Ok(rows)
}

pub async fn list_for_customer<C: ConnectionTrait>(
    db: &C,
    company_id: Uuid,
    customer_id: Uuid,
) -> Result<Vec<quotes::Model>, AppError> {
    let rows = quotes::Entity::find()
        .filter(quotes::Column::CompanyId.eq(company_id))
        .filter(quotes::Column::CustomerId.eq(customer_id))
        .filter(quotes::Column::DeletedAt.is_null())
        .order_by_desc(quotes::Column::CreatedAt)
        .all(db)
        .await?;
    Ok(rows)
}

pub async fn get<C: ConnectionTrait>(
    db: &C,
    company_id: Uuid,
    id: Uuid,
) -> Result<quotes::Model, AppError> {
    quotes::Entity::find()
        .filter(quotes::Column::Id.eq(id))
        .filter(quotes::Column::CompanyId.eq(company_id))
        .filter(quotes::Column::DeletedAt.is_null())
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Quote".to_string()))
}

pub async fn items_for<C: ConnectionTrait>(
    db: &C,
    company_id: Uuid,
    quote_id: Uuid,
) -> Result<Vec<quote_items::Model>, AppError> {
    let rows = quote_items::Entity::find()
        .filter(quote_items::Column::QuoteId.eq(quote_id))
        .filter(quote_items::Column::CompanyId.eq(company_id))
        .all(db)
        .await?;
    Ok(rows)
}

pub async fn get_with_items<C: ConnectionTrait>(
    db: &C,
    company_id: Uuid,
    id: Uuid,
) -> Result<(quotes::Model, Vec<quote_items::Model>), AppError> {
    let quote = get(db, company_id, id).await?;
    let items = items_for(db, company_id, id).await?;
    Ok((quote, items))
}

/// New quotes always start in draft; totals are derived from the submitted
/// items before anything is written. Parent and items land in one transaction.
pub async fn create(
    db: &DatabaseConnection,
    company_id: Uuid,
    input: NewQuote,
) -> Result<quotes::Model, AppError> {
    let computed = totals::compute_totals(&input.items);

    let txn = db.begin().await?;

    let quote = quotes::ActiveModel {
        id: Set(Uuid::new_v4()),
        company_id: Set(company_id),
        customer_id: Set(input.customer_id),
        title: Set(input.title),
        status: Set(QuoteStatus::Draft),
        expires_at: Set(input.expires_at),
        subtotal: Set(computed.subtotal),
        tax: Set(computed.tax),
        total: Set(computed.total),
        created_by: Set(input.created_by),
        created_at: Set(chrono::Utc::now()),
        updated_at: Set(None),
        deleted_at: Set(None),
    }
    .insert(&txn)
    .await?;

    insert_items(&txn, company_id, quote.id, &input.items).await?;

    txn.commit().await?;
    Ok(quote)
}

/// Partial update. When `items` is present the old set is deleted and the new
/// set inserted with freshly computed totals, all inside one transaction, so a
/// half-replaced item list is never observable.
pub async fn update(
    db: &DatabaseConnection,
    company_id: Uuid,
    id: Uuid,
    patch: QuotePatch,
) -> Result<quotes::Model, AppError> {
    let txn = db.begin().await?;

    let existing = get(&txn, company_id, id).await?;
    let mut row = existing.into_active_model();

    if let Some(title) = patch.title {
        row.title = Set(title);
    }
    if let Some(status) = patch.status {
        row.status = Set(status);
    }
    if let Some(expires_at) = patch.expires_at {
        row.expires_at = Set(Some(expires_at));
    }
    if let Some(items) = &patch.items {
        let computed = totals::compute_totals(items);
        row.subtotal = Set(computed.subtotal);
        row.tax = Set(computed.tax);
        row.total = Set(computed.total);
    }
    row.updated_at = Set(Some(chrono::Utc::now()));

    let updated = row.update(&txn).await?;

    if let Some(items) = &patch.items {
        quote_items::Entity::delete_many()
            .filter(quote_items::Column::QuoteId.eq(id))
            .filter(quote_items::Column::CompanyId.eq(company_id))
            .exec(&txn)
            .await?;
        insert_items(&txn, company_id, id, items).await?;
    }

    txn.commit().await?;
    Ok(updated)
}

pub async fn soft_delete<C: ConnectionTrait>(
    db: &C,
    company_id: Uuid,
    id: Uuid,
) -> Result<(), AppError> {
    quotes::Entity::update_many()
        .col_expr(quotes::Column::DeletedAt, Expr::value(chrono::Utc::now()))
        .filter(quotes::Column::Id.eq(id))
        .filter(quotes::Column::CompanyId.eq(company_id))
        .filter(quotes::Column::DeletedAt.is_null())
        .exec(db)
        .await?;
    Ok(())
}

async fn insert_items<C: ConnectionTrait>(
    db: &C,
    company_id: Uuid,
    quote_id: Uuid,
    items: &[totals::LineItemInput],
) -> Result<(), AppError> {
    if items.is_empty() {
        return Ok(());
    }
    let rows = items.iter().map(|item| quote_items::ActiveModel {
        id: Set(Uuid::new_v4()),
        company_id: Set(company_id),
        quote_id: Set(quote_id),
        description: Set(item.description.clone()),
        quantity: Set(item.quantity),
        unit_price: Set(item.unit_price),
        tax_rate: Set(item.tax_rate),
    });
    quote_items::Entity::insert_many(rows).exec(db).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn list_filters_by_tenant_and_deletion() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<quotes::Model>::new()])
            .into_connection();

        list(&db, Uuid::new_v4()).await.unwrap();

        let sql = format!("{:?}", db.into_transaction_log()).replace("\\\"", "\"");
        assert!(sql.contains(r#""quotes"."company_id" = $1"#), "{}", sql);
        assert!(sql.contains(r#""quotes"."deleted_at" IS NULL"#), "{}", sql);
    }

    #[tokio::test]
    async fn item_lookups_are_tenant_scoped() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<quote_items::Model>::new()])
            .into_connection();

        items_for(&db, Uuid::new_v4(), Uuid::new_v4()).await.unwrap();

        let sql = format!("{:?}", db.into_transaction_log()).replace("\\\"", "\"");
        assert!(sql.contains(r#""quote_items"."company_id" = $2"#), "{}", sql);
    }
}
