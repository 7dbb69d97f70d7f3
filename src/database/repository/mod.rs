//! Tenant-scoped persistence operations.
//!
//! Every query in this module filters by `company_id`; handlers never talk to
//! the entities directly. Functions are generic over [`sea_orm::ConnectionTrait`]
//! where possible so they run unchanged on the pool or inside a transaction.

pub mod customers;
pub mod invoices;
pub mod jobs;
pub mod quotes;
