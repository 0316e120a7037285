use std::sync::Arc;

use outfit_api::{
    config::{CandidateSourceKind, Config},
    routes::{create_router, AppState},
    services::{
        providers::{CandidateSource, CatalogSource, SupabaseSource},
        OutfitService,
    },
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("outfit_api=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;

    let source = create_candidate_source(&config)?;
    tracing::info!(source = source.name(), "Candidate source ready");

    let service = OutfitService::new(source, config.assembly_settings());
    let app = create_router(Arc::new(AppState::new(service)));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server running");
    axum::serve(listener, app).await?;

    Ok(())
}

fn create_candidate_source(config: &Config) -> anyhow::Result<Arc<dyn CandidateSource>> {
    match config.candidate_source {
        CandidateSourceKind::Catalog => {
            let catalog = match &config.catalog_path {
                Some(path) => CatalogSource::from_json_file(path)?,
                None => {
                    tracing::warn!("CATALOG_PATH not set, starting with an empty catalog");
                    CatalogSource::default()
                }
            };
            Ok(Arc::new(catalog))
        }
        CandidateSourceKind::Supabase => {
            let (Some(url), Some(key)) = (&config.supabase_url, &config.supabase_key) else {
                anyhow::bail!("SUPABASE_URL and SUPABASE_KEY must be set for the supabase source");
            };
            Ok(Arc::new(SupabaseSource::new(
                url.clone(),
                key.clone(),
                config.source_max_retries,
            )))
        }
    }
}
