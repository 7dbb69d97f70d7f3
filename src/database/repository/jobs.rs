use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set,
};
use sea_orm::prelude::DateTimeUtc;
use uuid::Uuid;

use crate::{
    database::models::{JobStatus, jobs},
    errors::AppError,
};

pub struct NewJob {
    pub customer_id: Uuid,
    pub title: String,
    pub status: JobStatus,
    pub scheduled_at: Option<DateTimeUtc>,
    pub notes: Option<String>,
}

#[derive(Default)]
pub struct JobPatch {
    pub title: Option<String>,
    pub status: Option<JobStatus>,
    pub scheduled_at: Option<DateTimeUtc>,
    pub notes: Option<String>,
}

/// Jobs are listed in schedule order, soonest first.
pub async fn list<C: ConnectionTrait>(db: &C, company_id: Uuid) -> Result<Vec<jobs::Model>, AppError> {
    let rows = jobs::Entity::find()
        .filter(jobs::Column::CompanyId.eq(company_id))
        .filter(jobs::Column::DeletedAt.is_null())
        .order_by_asc(jobs::Column::ScheduledAt)
        .all(db)
        .await?;
    Ok(rows)
}

pub async fn get<C: ConnectionTrait>(
    db: &C,
    company_id: Uuid,
    id: Uuid,
) -> Result<jobs::Model, AppError> {
    jobs::Entity::find()
        .filter(jobs::Column::Id.eq(id))
        .filter(jobs::Column::CompanyId.eq(company_id))
        .filter(jobs::Column::DeletedAt.is_null())
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Job".to_string()))
}

pub async fn create<C: ConnectionTrait>(
    db: &C,
    company_id: Uuid,
    input: NewJob,
) -> Result<jobs::Model, AppError> {
    let row = jobs::ActiveModel {
        id: Set(Uuid::new_v4()),
        company_id: Set(company_id),
        customer_id: Set(input.customer_id),
        title: Set(input.title),
        status: Set(input.status),
        scheduled_at: Set(input.scheduled_at),
        notes: Set(input.notes),
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
    patch: JobPatch,
) -> Result<jobs::Model, AppError> {
    let existing = get(db, company_id, id).await?;
    let mut row = existing.into_active_model();

    if let Some(title) = patch.title {
        row.title = Set(title);
    }
    if let Some(status) = patch.status {
        row.status = Set(status);
    }
    if let Some(scheduled_at) = patch.scheduled_at {
        row.scheduled_at = Set(Some(scheduled_at));
    }
    if let Some(notes) = patch.notes {
        row.notes = Set(Some(notes));
    }
    row.updated_at = Set(Some(chrono::Utc::now()));

    Ok(row.update(db).await?)
}

pub async fn soft_delete<C: ConnectionTrait>(
    db: &C,
    company_id: Uuid,
    id: Uuid,
) -> Result<(), AppError> {
    jobs::Entity::update_many()
        .col_expr(jobs::Column::DeletedAt, Expr::value(chrono::Utc::now()))
        .filter(jobs::Column::Id.eq(id))
        .filter(jobs::Column::CompanyId.eq(company_id))
        .filter(jobs::Column::DeletedAt.is_null())
        .exec(db)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn list_orders_by_schedule_ascending() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<jobs::Model>::new()])
            .into_connection();

        list(&db, Uuid::new_v4()).await.unwrap();

        let sql = format!("{:?}", db.into_transaction_log()).replace("\\\"", "\"");
        assert!(sql.contains(r#""jobs"."company_id" = $1"#), "{}", sql);
        assert!(sql.contains(r#"ORDER BY "jobs"."scheduled_at" ASC"#), "{}", sql);
    }
}
