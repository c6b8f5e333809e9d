use dotenvy::dotenv;
use std::sync::Arc;
use storefront_core::config::{database, storefront};
use storefront_core::core::documents::{CatalogRecord, DocumentStore, SeaOrmDocumentStore};
use storefront_core::core::notify::TracingNotifier;
use storefront_core::core::persistence::{Collection, KeyValueStore, SqliteKeyValueStore};
use storefront_core::core::report;
use storefront_core::core::store::Storefront;
use storefront_core::errors::Result;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();

    // 3. Load storefront configuration and the seed catalog
    let config = storefront::load_default_config()
        .inspect_err(|e| error!("Failed to load storefront configuration: {}", e))?;
    let seed = config.seed_snapshot(chrono::Utc::now())?;
    info!(
        "Seed catalog: {} products, {} deals, sync debounce {:?}",
        seed.products.len(),
        seed.deals.len(),
        config.sync.debounce()
    );

    // 4. Connect to the database and make sure the tables exist
    std::fs::create_dir_all("data")?;
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db).await?;

    // 5. Open the storefront, writing the seed through on first run
    let local = SqliteKeyValueStore::new(db.clone());
    let first_run = local.get(Collection::Products.key()).await?.is_none();
    let store = Storefront::open(local, seed, Arc::new(TracingNotifier)).await;

    if first_run {
        store.persist_all().await?;
        let documents = SeaOrmDocumentStore::new(db);
        let state = store.state();
        let catalog = state
            .products()
            .iter()
            .cloned()
            .map(CatalogRecord::from)
            .chain(state.deals().iter().cloned().map(CatalogRecord::from));
        for record in catalog {
            documents.put_product(&record).await?;
        }
        info!("Seeded local state and remote product documents");
    }

    // 6. Summarize
    let summary = report::summarize(store.state(), chrono::Utc::now());
    info!("Storefront ready:\n{}", summary);

    Ok(())
}
