#[cfg(feature = "http_api")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::sync::Arc;

    use course_roster::config::{AppConfig, CONFIG_ENV};
    use course_roster::http_api::{self, AppState};
    use course_roster::{Catalog, CatalogStore, FlatFileStore, logging};

    let config = match std::env::var(CONFIG_ENV) {
        Ok(path) => AppConfig::load(path)?,
        Err(_) => AppConfig::default(),
    }
    .apply_env();
    logging::init_logger(&config.log_filter, false);

    let addr = config.socket_addr()?;
    let store = FlatFileStore::from_config(&config);
    let catalog = store.load_catalog()?.unwrap_or_else(|| {
        tracing::warn!(path = %store.course_path().display(), "no course file, starting empty");
        Catalog::new()
    });

    println!("course-roster HTTP API listening on http://{addr}");
    let state = AppState::new(catalog).with_store(Arc::new(store));
    http_api::serve(addr, state).await?;
    Ok(())
}

#[cfg(not(feature = "http_api"))]
fn main() {
    eprintln!("Rebuild with the `http_api` feature to enable the HTTP server.");
}
