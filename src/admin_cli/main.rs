use clap::{Parser, Subcommand};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    Statement,
};
use sea_orm::ConnectionTrait;
use std::fs;
use uuid::Uuid;

use fieldops::config::Config;
use fieldops::database;
use fieldops::database::models::{companies, customers, portal_tokens};

/// Operator command line for fieldops.
/// Applies the schema, inspects tenants and mints client portal tokens.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, verbatim_doc_comment)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Database maintenance.
    Db {
        #[command(subcommand)]
        db_command: DbCommand,
    },
    /// Tenant inspection.
    Company {
        #[command(subcommand)]
        company_command: CompanyCommand,
    },
    /// Mint a client portal access token for a customer.
    PortalToken {
        /// Customer UUID the token grants access to.
        #[arg(short, long)]
        customer_id: String,

        /// Token lifetime in days; omit for a token that never expires.
        #[arg(short, long)]
        expires_in_days: Option<i64>,
    },
}

#[derive(Subcommand, Debug)]
enum DbCommand {
    /// Applies dump/schema.sql to create the schema.
    Seed,
    /// Drops ALL tables in the public schema. Use with care!
    Wipe,
}

#[derive(Subcommand, Debug)]
enum CompanyCommand {
    /// Lists every company with its slug.
    List,
}

async fn execute_sql_file(
    db: &DatabaseConnection,
    file_path: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("Applying script: {}", file_path);
    let sql = fs::read_to_string(file_path)?;
    for query in sql.split(';').filter(|s| !s.trim().is_empty()) {
        let trimmed_query = query.trim();

        match db
            .execute(Statement::from_string(
                db.get_database_backend(),
                trimmed_query.to_string(),
            ))
            .await
        {
            Ok(_) => {}
            Err(e) => {
                let error_str = e.to_string();
                // "already exists" is fine on re-seed
                if error_str.contains("already exists") || error_str.contains("42P07") {
                    println!(
                        "Object already exists, skipping: {}",
                        trimmed_query
                            .split_whitespace()
                            .take(3)
                            .collect::<Vec<_>>()
                            .join(" ")
                    );
                    continue;
                } else {
                    return Err(e.into());
                }
            }
        }
    }
    println!("Script applied.");
    Ok(())
}

fn generate_token() -> String {
    (0..40).map(|_| fastrand::alphanumeric()).collect()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let config = Config::from_env().expect("Failed to load configuration");
    let cli = Cli::parse();

    let db = database::connect().await?;

    match &cli.command {
        Commands::Db { db_command } => match db_command {
            DbCommand::Seed => {
                execute_sql_file(&db, "dump/schema.sql").await?;
                println!("Seed complete.");
            }
            DbCommand::Wipe => {
                let tables_query = match db.get_database_backend() {
                    sea_orm::DatabaseBackend::Postgres => {
                        "SELECT tablename FROM pg_tables WHERE schemaname = 'public'"
                    }
                    _ => unimplemented!("Wipe is only implemented for Postgres"),
                };

                let tables: Vec<String> = db
                    .query_all(Statement::from_string(
                        db.get_database_backend(),
                        tables_query.to_string(),
                    ))
                    .await?
                    .into_iter()
                    .filter_map(|row| row.try_get::<String>("", "tablename").ok())
                    .collect();

                if tables.is_empty() {
                    println!("No tables found. Database is already empty.");
                } else {
                    for table in tables {
                        let drop_query = format!("DROP TABLE IF EXISTS \"{}\" CASCADE;", table);
                        db.execute(Statement::from_string(
                            db.get_database_backend(),
                            drop_query,
                        ))
                        .await?;
                        println!("Dropped table: {}", table);
                    }
                    println!("Database wiped.");
                }
            }
        },
        Commands::Company { company_command } => match company_command {
            CompanyCommand::List => {
                let rows = companies::Entity::find()
                    .order_by_asc(companies::Column::CreatedAt)
                    .all(&db)
                    .await?;
                if rows.is_empty() {
                    println!("No companies.");
                }
                for company in rows {
                    println!("{}  {}  {}", company.id, company.slug, company.name);
                }
            }
        },
        Commands::PortalToken {
            customer_id,
            expires_in_days,
        } => {
            let customer_id = Uuid::parse_str(customer_id)
                .map_err(|_| "customer_id must be a valid UUID")?;

            let customer = customers::Entity::find_by_id(customer_id)
                .filter(customers::Column::DeletedAt.is_null())
                .one(&db)
                .await?
                .ok_or("Customer not found")?;

            let expires_at = expires_in_days
                .map(|days| chrono::Utc::now() + chrono::Duration::days(days));

            let token = portal_tokens::ActiveModel {
                id: Set(Uuid::new_v4()),
                company_id: Set(customer.company_id),
                customer_id: Set(customer.id),
                token: Set(generate_token()),
                created_at: Set(chrono::Utc::now()),
                expires_at: Set(expires_at),
            }
            .insert(&db)
            .await?;

            println!(
                "Portal token for {} ({}):",
                customer.name, customer.id
            );
            println!(
                "{}/api/portal/{}",
                config.effective_public_url(),
                token.token
            );
            match token.expires_at {
                Some(expires_at) => println!("Expires: {}", expires_at),
                None => println!("Expires: never"),
            }
        }
    }

    Ok(())
}
