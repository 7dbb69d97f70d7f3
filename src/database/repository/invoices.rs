use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use sea_orm::prelude::DateTimeUtc;
use uuid::Uuid;

use crate::{
    database::models::{InvoiceStatus, invoice_items, invoices},
    errors::AppError,
    services::totals,
};

pub struct NewInvoice {
    pub customer_id: Uuid,
    pub job_id: Option<Uuid>,
    pub status: InvoiceStatus,
    pub due_date: Option<DateTimeUtc>,
    pub items: Vec<totals::LineItemInput>,
}

#[derive(Default)]
pub struct InvoicePatch {
    pub status: Option<InvoiceStatus>,
    pub due_date: Option<DateTimeUtc>,
    pub items: Option<Vec<totals::LineItemInput>>,
}

pub async fn list<C: ConnectionTrait>(
    db: &C,
    company_id: Uuid,
) -> Result<Vec<invoices::Model>, AppError> {
    let rows = invoices::Entity::find()
        .filter(invoices::Column::CompanyId.eq(company_id))
        .filter(invoices::Column::DeletedAt.is_null())
        .order_by_desc(invoices::Column::CreatedAt)
        .all(db)
        .await?;
    Ok(rows)
}

pub async fn list_for_customer<C: ConnectionTrait>(
    db: &C,
    company_id: Uuid,
    customer_id: Uuid,
) -> Result<Vec<invoices::Model>, AppError> {
    let rows = invoices::Entity::find()
        .filter(invoices::Column::CompanyId.eq(company_id))
        .filter(invoices::Column::CustomerId.eq(customer_id))
        .filter(invoices::Column::DeletedAt.is_null())
        .order_by_desc(invoices::Column::CreatedAt)
        .all(db)
        .await?;
    Ok(rows)
}

pub async fn get<C: ConnectionTrait>(
    db: &C,
    company_id: Uuid,
    id: Uuid,
) -> Result<invoices::Model, AppError> {
    invoices::Entity::find()
        .filter(invoices::Column::Id.eq(id))
        .filter(invoices::Column::CompanyId.eq(company_id))
        .filter(invoices::Column::DeletedAt.is_null())
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Invoice".to_string()))
}

pub async fn items_for<C: ConnectionTrait>(
    db: &C,
    company_id: Uuid,
    invoice_id: Uuid,
) -> Result<Vec<invoice_items::Model>, AppError> {
    let rows = invoice_items::Entity::find()
        .filter(invoice_items::Column::InvoiceId.eq(invoice_id))
        .filter(invoice_items::Column::CompanyId.eq(company_id))
        .all(db)
        .await?;
    Ok(rows)
}

pub async fn get_with_items<C: ConnectionTrait>(
    db: &C,
    company_id: Uuid,
    id: Uuid,
) -> Result<(invoices::Model, Vec<invoice_items::Model>), AppError> {
    let invoice = get(db, company_id, id).await?;
    let items = items_for(db, company_id, id).await?;
    Ok((invoice, items))
}

/// `balance_due` starts at the computed total; parent and items land in one
/// transaction.
pub async fn create(
    db: &DatabaseConnection,
    company_id: Uuid,
    input: NewInvoice,
) -> Result<invoices::Model, AppError> {
    let computed = totals::compute_totals(&input.items);

    let txn = db.begin().await?;

    let invoice = invoices::ActiveModel {
        id: Set(Uuid::new_v4()),
        company_id: Set(company_id),
        customer_id: Set(input.customer_id),
        job_id: Set(input.job_id),
        status: Set(input.status),
        due_date: Set(input.due_date),
        subtotal: Set(computed.subtotal),
        tax: Set(computed.tax),
        total: Set(computed.total),
        balance_due: Set(computed.total),
        created_at: Set(chrono::Utc::now()),
        updated_at: Set(None),
        deleted_at: Set(None),
    }
    .insert(&txn)
    .await?;

    insert_items(&txn, company_id, invoice.id, &input.items).await?;

    txn.commit().await?;
    Ok(invoice)
}

/// Replacing the items recomputes the totals and resets `balance_due` to the
/// new total, the same way the record was born. One transaction end to end, so
/// a half-replaced item list is never observable.
pub async fn update(
    db: &DatabaseConnection,
    company_id: Uuid,
    id: Uuid,
    patch: InvoicePatch,
) -> Result<invoices::Model, AppError> {
    let txn = db.begin().await?;

    let existing = get(&txn, company_id, id).await?;
    let mut row = existing.into_active_model();

    if let Some(status) = patch.status {
        row.status = Set(status);
    }
    if let Some(due_date) = patch.due_date {
        row.due_date = Set(Some(due_date));
    }
    if let Some(items) = &patch.items {
        let computed = totals::compute_totals(items);
        row.subtotal = Set(computed.subtotal);
        row.tax = Set(computed.tax);
        row.total = Set(computed.total);
        row.balance_due = Set(computed.total);
    }
    row.updated_at = Set(Some(chrono::Utc::now()));

    let updated = row.update(&txn).await?;

    if let Some(items) = &patch.items {
        invoice_items::Entity::delete_many()
            .filter(invoice_items::Column::InvoiceId.eq(id))
            .filter(invoice_items::Column::CompanyId.eq(company_id))
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
    invoices::Entity::update_many()
        .col_expr(invoices::Column::DeletedAt, Expr::value(chrono::Utc::now()))
        .filter(invoices::Column::Id.eq(id))
        .filter(invoices::Column::CompanyId.eq(company_id))
        .filter(invoices::Column::DeletedAt.is_null())
        .exec(db)
        .await?;
    Ok(())
}

async fn insert_items<C: ConnectionTrait>(
    db: &C,
    company_id: Uuid,
    invoice_id: Uuid,
    items: &[totals::LineItemInput],
) -> Result<(), AppError> {
    if items.is_empty() {
        return Ok(());
    }
    let rows = items.iter().map(|item| invoice_items::ActiveModel {
        id: Set(Uuid::new_v4()),
        company_id: Set(company_id),
        invoice_id: Set(invoice_id),
        description: Set(item.description.clone()),
        quantity: Set(item.quantity),
        unit_price: Set(item.unit_price),
        tax_rate: Set(item.tax_rate),
    });
    invoice_items::Entity::insert_many(rows).exec(db).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn list_filters_by_tenant_and_deletion() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<invoices::Model>::new()])
            .into_connection();

        list(&db, Uuid::new_v4()).await.unwrap();

        let sql = format!("{:?}", db.into_transaction_log()).replace("\\\"", "\"");
        assert!(sql.contains(r#""invoices"."company_id" = $1"#), "{}", sql);
        assert!(sql.contains(r#""invoices"."deleted_at" IS NULL"#), "{}", sql);
    }
}
