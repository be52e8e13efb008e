use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use api::{
    app::AppData,
    config::Config,
    routes::{analyze, cats, geocode, ipfs, likes, users, ErrorBody},
};
use tracing_actix_web::TracingLogger;
use utoipa::OpenApi;
use utoipa_swagger_ui::{SwaggerUi, Url};

/// Image payloads arrive base64-encoded in JSON or as multipart parts.
const MAX_PAYLOAD_BYTES: usize = 8 * 1024 * 1024;

#[actix_web::main]
async fn main() -> Result<()> {
    #[derive(OpenApi)]
    #[openapi(
        paths(
            analyze::analyze,
            ipfs::upload,
            cats::cats,
            cats::index_cat,
            likes::likes,
            likes::toggle_like,
            users::profile,
            users::set_username,
            geocode::reverse_geocode,
        ),
        components(schemas(
            analyze::AnalyzeRequest,
            analyze::AnalyzeResponse,
            analyze::Gps,
            analyze::CropHint,
            analyze::CatAnalysis,
            analyze::prompt::WelfareCheck,
            cats::CatItem,
            cats::CatList,
            cats::IndexCatRequest,
            likes::ToggleRequest,
            likes::ToggleResponse,
            likes::LikesSummary,
            users::Profile,
            users::ProfileStats,
            users::UsernameRequest,
            geocode::Locality,
            ipfs::UploadResponse,
            ErrorBody,
        ))
    )]
    struct ApiDoc;

    dotenvy::dotenv().ok();
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(
            std::env::var("RUST_LOGS")
                .unwrap_or_else(|_| "info,api=debug,actix_web=warn".into()),
        )
        .with_ansi(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let config = Config::from_env()?;
    let bind_address = config.bind_address.clone();
    let data = web::Data::new(AppData::new(config).await?);
    tracing::info!("serving on {bind_address}");
    HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .app_data(data.clone())
            .app_data(web::PayloadConfig::new(MAX_PAYLOAD_BYTES))
            .app_data(web::JsonConfig::default().limit(MAX_PAYLOAD_BYTES))
            .service(SwaggerUi::new("/swagger-ui/{_:.*}").urls(vec![(
                Url::new("catlas", "/api-docs/catlas.json"),
                ApiDoc::openapi(),
            )]))
            .service(analyze::analyze)
            .service(ipfs::upload)
            .service(cats::cats)
            .service(cats::index_cat)
            .service(likes::likes)
            .service(likes::toggle_like)
            .service(users::profile)
            .service(users::set_username)
            .service(geocode::reverse_geocode)
    })
    .bind(&bind_address)
    .with_context(|| format!("binding {bind_address}"))?
    .run()
    .await
    .context("server run")
}
