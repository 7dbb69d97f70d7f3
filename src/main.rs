use actix_cors::Cors;
use actix_web::{App, HttpResponse, HttpServer, middleware, web};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use fieldops::api::helpers::SuccessResponse;
use fieldops::api::middleware::RequestId;
use fieldops::api::{auth, customers, invoices, jobs, portal, quotes};
use fieldops::app_state::AppState;
use fieldops::config::Config;
use fieldops::database::{self, models};
use fieldops::errors::ErrorResponse;
use fieldops::services::totals;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::from_env().expect("Failed to load configuration");
    let db = database::connect().await?;

    #[derive(OpenApi)]
    #[openapi(
        paths(
            // Auth
            auth::sign_up,
            // Customers
            customers::get_customers,
            customers::create_customer,
            customers::get_customer,
            customers::update_customer,
            customers::delete_customer,
            // Jobs
            jobs::get_jobs,
            jobs::create_job,
            jobs::get_job,
            jobs::update_job,
            jobs::delete_job,
            // Quotes
            quotes::get_quotes,
            quotes::create_quote,
            quotes::get_quote,
            quotes::update_quote,
            quotes::delete_quote,
            // Invoices
            invoices::get_invoices,
            invoices::create_invoice,
            invoices::get_invoice,
            invoices::update_invoice,
            invoices::delete_invoice,
            // Portal (public)
            portal::get_portal_view,
        ),
        components(
            schemas(
                // --- Models ---
                models::customers::Model,
                models::jobs::Model,
                models::quotes::Model,
                models::quote_items::Model,
                models::invoices::Model,
                models::invoice_items::Model,
                models::JobStatus,
                models::QuoteStatus,
                models::InvoiceStatus,
                totals::LineItemInput,

                // --- DTOs & API Structs ---
                SuccessResponse,
                auth::SignUpDto,
                customers::CreateCustomerDto,
                customers::UpdateCustomerDto,
                customers::CustomerResponse,
                customers::CustomerListResponse,
                jobs::CreateJobDto,
                jobs::UpdateJobDto,
                jobs::JobResponse,
                jobs::JobListResponse,
                quotes::CreateQuoteDto,
                quotes::UpdateQuoteDto,
                quotes::QuoteResponse,
                quotes::QuoteListResponse,
                quotes::QuoteDetailsResponse,
                invoices::CreateInvoiceDto,
                invoices::UpdateInvoiceDto,
                invoices::InvoiceResponse,
                invoices::InvoiceListResponse,
                invoices::InvoiceDetailsResponse,
                portal::PortalQuote,
                portal::PortalInvoice,
                portal::PortalViewResponse,
            )
        ),
        tags(
            (name = "Auth", description = "Sign-up: user, company and profile creation"),
            (name = "Customers", description = "Tenant-scoped customer management"),
            (name = "Jobs", description = "Tenant-scoped job management"),
            (name = "Quotes", description = "Tenant-scoped quotes with derived totals"),
            (name = "Invoices", description = "Tenant-scoped invoices with derived totals and balance due"),
            (name = "Portal", description = "Public, token-keyed client portal")
        )
    )]
    struct ApiDoc;

    let host = config.host.clone();
    let port = config.port;
    let body_limit = config.effective_max_body_bytes();
    // CORS is pinned to the public origin when one is configured.
    let cors_origin = config
        .public_url
        .as_ref()
        .and_then(|u| url::Url::parse(u).ok())
        .map(|u| u.origin().ascii_serialization());

    log::info!("Starting server at http://{}:{}", host, port);
    log::info!("Swagger UI available at http://{}:{}/swagger-ui/", host, port);

    HttpServer::new(move || {
        let cors = match &cors_origin {
            Some(origin) => Cors::default()
                .allowed_origin(origin)
                .allow_any_method()
                .allow_any_header(),
            None => Cors::permissive(),
        };

        App::new()
            .wrap(middleware::NormalizePath::new(middleware::TrailingSlash::Always))
            .wrap(cors)
            .wrap(RequestId)
            .app_data(web::JsonConfig::default().limit(body_limit).error_handler(
                |err, _req| {
                    // Malformed JSON gets the same structured body as every
                    // other validation failure.
                    let body = ErrorResponse {
                        code: "VALIDATION_FAILED",
                        message: err.to_string(),
                        details: None,
                        trace_id: None,
                    };
                    actix_web::error::InternalError::from_response(
                        err,
                        HttpResponse::BadRequest().json(body),
                    )
                    .into()
                },
            ))
            .app_data(web::Data::new(AppState {
                db: db.clone(),
                config: config.clone(),
            }))
            .service(
                web::scope("/api")
                    .configure(auth::init_routes)
                    .configure(customers::init_routes)
                    .configure(jobs::init_routes)
                    .configure(quotes::init_routes)
                    .configure(invoices::init_routes)
                    .configure(portal::init_routes),
            )
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
            )
    })
    .workers(num_cpus::get())
    .bind((host, port))?
    .run()
    .await
}
