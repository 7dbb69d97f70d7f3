use sea_orm::entity::prelude::*;
use sea_orm::sea_query::StringLen;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// --- Status enums ---
//
// Set membership is enforced at the serde boundary; no transition graph is
// applied on top, any status may overwrite any other.

#[derive(Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    #[sea_orm(string_value = "scheduled")]
    Scheduled,
    #[sea_orm(string_value = "in_progress")]
    InProgress,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl Default for JobStatus {
    fn default() -> Self {
        JobStatus::Scheduled
    }
}

#[derive(Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum QuoteStatus {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "sent")]
    Sent,
    #[sea_orm(string_value = "accepted")]
    Accepted,
    #[sea_orm(string_value = "expired")]
    Expired,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

impl Default for QuoteStatus {
    fn default() -> Self {
        QuoteStatus::Draft
    }
}

#[derive(Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "sent")]
    Sent,
    #[sea_orm(string_value = "partial")]
    Partial,
    #[sea_orm(string_value = "paid")]
    Paid,
    #[sea_orm(string_value = "overdue")]
    Overdue,
}

impl Default for InvoiceStatus {
    fn default() -> Self {
        InvoiceStatus::Draft
    }
}

// --- Users ---
//
// Stand-in identity store; session issuance itself stays with the external
// identity provider. `company_hint` is the desired company slug captured at
// sign-up and consumed by tenant bootstrap.
pub mod users {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
    #[sea_orm(table_name = "users")]
    #[schema(as = User)]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        #[schema(value_type = String)]
        pub id: Uuid,
        #[sea_orm(unique)]
        pub email: String,
        #[serde(skip_serializing)]
        pub password_hash: String,
        pub company_hint: Option<String>,
        #[schema(value_type = String, format = DateTime)]
        pub created_at: DateTimeUtc,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(has_one = "super::profiles::Entity")]
        Profile,
    }

    impl Related<super::profiles::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Profile.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

// --- Companies ---
pub mod companies {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
    #[sea_orm(table_name = "companies")]
    #[schema(as = Company)]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        #[schema(value_type = String)]
        pub id: Uuid,
        pub name: String,
        // Immutable after creation; only the name may change.
        #[sea_orm(unique)]
        pub slug: String,
        #[schema(value_type = String, format = DateTime)]
        pub created_at: DateTimeUtc,
        #[schema(value_type = Option<String>, format = DateTime)]
        pub updated_at: Option<DateTimeUtc>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(has_many = "super::profiles::Entity")]
        Profile,
        #[sea_orm(has_many = "super::customers::Entity")]
        Customer,
    }

    impl Related<super::profiles::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Profile.def()
        }
    }

    impl Related<super::customers::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Customer.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

// --- Profiles ---
//
// One profile binds one external identity to exactly one company.
pub mod profiles {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
    #[sea_orm(table_name = "profiles")]
    #[schema(as = Profile)]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        #[schema(value_type = String)]
        pub id: Uuid,
        #[sea_orm(unique)]
        #[schema(value_type = String)]
        pub user_id: Uuid,
        #[schema(value_type = String)]
        pub company_id: Uuid,
        pub email: Option<String>,
        pub full_name: Option<String>,
        #[schema(value_type = String, format = DateTime)]
        pub created_at: DateTimeUtc,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::companies::Entity",
            from = "Column::CompanyId",
            to = "super::companies::Column::Id"
        )]
        Company,
        #[sea_orm(
            belongs_to = "super::users::Entity",
            from = "Column::UserId",
            to = "super::users::Column::Id"
        )]
        User,
    }

    impl Related<super::companies::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Company.def()
        }
    }

    impl Related<super::users::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::User.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

// --- Customers ---
pub mod customers {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
    #[sea_orm(table_name = "customers")]
    #[schema(as = Customer)]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        #[schema(value_type = String)]
        pub id: Uuid,
        #[schema(value_type = String)]
        pub company_id: Uuid,
        pub name: String,
        pub email: Option<String>,
        pub phone: Option<String>,
        pub address: Option<String>,
        #[schema(value_type = Vec<String>)]
        pub tags: Json,
        #[schema(value_type = String, format = DateTime)]
        pub created_at: DateTimeUtc,
        #[schema(value_type = Option<String>, format = DateTime)]
        pub updated_at: Option<DateTimeUtc>,
        #[schema(value_type = Option<String>, format = DateTime)]
        pub deleted_at: Option<DateTimeUtc>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::companies::Entity",
            from = "Column::CompanyId",
            to = "super::companies::Column::Id"
        )]
        Company,
        #[sea_orm(has_many = "super::jobs::Entity")]
        Job,
        #[sea_orm(has_many = "super::quotes::Entity")]
        Quote,
        #[sea_orm(has_many = "super::invoices::Entity")]
        Invoice,
    }

    impl Related<super::companies::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Company.def()
        }
    }

    impl Related<super::jobs::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Job.def()
        }
    }

    impl Related<super::quotes::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Quote.def()
        }
    }

    impl Related<super::invoices::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Invoice.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

// --- Jobs ---
pub mod jobs {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
    #[sea_orm(table_name = "jobs")]
    #[schema(as = Job)]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        #[schema(value_type = String)]
        pub id: Uuid,
        #[schema(value_type = String)]
        pub company_id: Uuid,
        #[schema(value_type = String)]
        pub customer_id: Uuid,
        pub title: String,
        pub status: JobStatus,
        #[schema(value_type = Option<String>, format = DateTime)]
        pub scheduled_at: Option<DateTimeUtc>,
        pub notes: Option<String>,
        #[schema(value_type = String, format = DateTime)]
        pub created_at: DateTimeUtc,
        #[schema(value_type = Option<String>, format = DateTime)]
        pub updated_at: Option<DateTimeUtc>,
        #[schema(value_type = Option<String>, format = DateTime)]
        pub deleted_at: Option<DateTimeUtc>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::customers::Entity",
            from = "Column::CustomerId",
            to = "super::customers::Column::Id"
        )]
        Customer,
    }

    impl Related<super::customers::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Customer.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

// --- Quotes ---
pub mod quotes {
    use super::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
    #[sea_orm(table_name = "quotes")]
    #[schema(as = Quote)]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        #[schema(value_type = String)]
        pub id: Uuid,
        #[schema(value_type = String)]
        pub company_id: Uuid,
        #[schema(value_type = String)]
        pub customer_id: Uuid,
        pub title: String,
        pub status: QuoteStatus,
        #[schema(value_type = Option<String>, format = DateTime)]
        pub expires_at: Option<DateTimeUtc>,
        pub subtotal: f64,
        pub tax: f64,
        pub total: f64,
        #[schema(value_type = String)]
        pub created_by: Uuid,
        #[schema(value_type = String, format = DateTime)]
        pub created_at: DateTimeUtc,
        #[schema(value_type = Option<String>, format = DateTime)]
        pub updated_at: Option<DateTimeUtc>,
        #[schema(value_type = Option<String>, format = DateTime)]
        pub deleted_at: Option<DateTimeUtc>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::customers::Entity",
            from = "Column::CustomerId",
            to = "super::customers::Column::Id"
        )]
        Customer,
        #[sea_orm(has_many = "super::quote_items::Entity")]
        Item,
    }

    impl Related<super::customers::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Customer.def()
        }
    }

    impl Related<super::quote_items::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Item.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

// --- Quote items ---
pub mod quote_items {
    use super::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
    #[sea_orm(table_name = "quote_items")]
    #[schema(as = QuoteItem)]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        #[schema(value_type = String)]
        pub id: Uuid,
        #[schema(value_type = String)]
        pub company_id: Uuid,
        #[schema(value_type = String)]
        pub quote_id: Uuid,
        pub description: String,
        pub quantity: f64,
        pub unit_price: f64,
        pub tax_rate: f64,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::quotes::Entity",
            from = "Column::QuoteId",
            to = "super::quotes::Column::Id"
        )]
        Quote,
    }

    impl Related<super::quotes::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Quote.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

// --- Invoices ---
pub mod invoices {
    use super::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
    #[sea_orm(table_name = "invoices")]
    #[schema(as = Invoice)]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        #[schema(value_type = String)]
        pub id: Uuid,
        #[schema(value_type = String)]
        pub company_id: Uuid,
        #[schema(value_type = String)]
        pub customer_id: Uuid,
        #[schema(value_type = Option<String>)]
        pub job_id: Option<Uuid>,
        pub status: InvoiceStatus,
        #[schema(value_type = Option<String>, format = DateTime)]
        pub due_date: Option<DateTimeUtc>,
        pub subtotal: f64,
        pub tax: f64,
        pub total: f64,
        pub balance_due: f64,
        #[schema(value_type = String, format = DateTime)]
        pub created_at: DateTimeUtc,
        #[schema(value_type = Option<String>, format = DateTime)]
        pub updated_at: Option<DateTimeUtc>,
        #[schema(value_type = Option<String>, format = DateTime)]
        pub deleted_at: Option<DateTimeUtc>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::customers::Entity",
            from = "Column::CustomerId",
            to = "super::customers::Column::Id"
        )]
        Customer,
        #[sea_orm(
            belongs_to = "super::jobs::Entity",
            from = "Column::JobId",
            to = "super::jobs::Column::Id"
        )]
        Job,
        #[sea_orm(has_many = "super::invoice_items::Entity")]
        Item,
    }

    impl Related<super::customers::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Customer.def()
        }
    }

    impl Related<super::jobs::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Job.def()
        }
    }

    impl Related<super::invoice_items::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Item.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

// --- Invoice items ---
pub mod invoice_items {
    use super::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
    #[sea_orm(table_name = "invoice_items")]
    #[schema(as = InvoiceItem)]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        #[schema(value_type = String)]
        pub id: Uuid,
        #[schema(value_type = String)]
        pub company_id: Uuid,
        #[schema(value_type = String)]
        pub invoice_id: Uuid,
        pub description: String,
        pub quantity: f64,
        pub unit_price: f64,
        pub tax_rate: f64,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::invoices::Entity",
            from = "Column::InvoiceId",
            to = "super::invoices::Column::Id"
        )]
        Invoice,
    }

    impl Related<super::invoices::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Invoice.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

// --- Portal tokens ---
//
// Opaque access tokens for the public client portal. A token without
// `expires_at` never expires.
pub mod portal_tokens {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
    #[sea_orm(table_name = "portal_tokens")]
    #[schema(as = PortalToken)]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        #[schema(value_type = String)]
        pub id: Uuid,
        #[schema(value_type = String)]
        pub company_id: Uuid,
        #[schema(value_type = String)]
        pub customer_id: Uuid,
        #[sea_orm(unique)]
        pub token: String,
        #[schema(value_type = String, format = DateTime)]
        pub created_at: DateTimeUtc,
        #[schema(value_type = Option<String>, format = DateTime)]
        pub expires_at: Option<DateTimeUtc>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::customers::Entity",
            from = "Column::CustomerId",
            to = "super::customers::Column::Id"
        )]
        Customer,
    }

    impl Related<super::customers::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Customer.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_serialize_snake_case() {
        assert_eq!(
            serde_json::to_value(JobStatus::InProgress).unwrap(),
            serde_json::json!("in_progress")
        );
        assert_eq!(
            serde_json::to_value(InvoiceStatus::Overdue).unwrap(),
            serde_json::json!("overdue")
        );
    }

    #[test]
    fn status_outside_the_set_is_rejected() {
        assert!(serde_json::from_value::<QuoteStatus>(serde_json::json!("approved")).is_err());
        assert!(serde_json::from_value::<JobStatus>(serde_json::json!("done")).is_err());
    }

    #[test]
    fn new_records_default_to_the_entry_status() {
        assert_eq!(JobStatus::default(), JobStatus::Scheduled);
        assert_eq!(QuoteStatus::default(), QuoteStatus::Draft);
        assert_eq!(InvoiceStatus::default(), InvoiceStatus::Draft);
    }
}
