use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use spice::config::{AppConfig, DatabaseConfig, StorageBackend};
use spice::core::{ConnectionManager, DataService};
use spice::entities::{MenuItem, Order};
use spice::maintenance::{find_missing, fix_missing, seed_menu};
use spice::server::{ServerBuilder, keep_alive};
use spice::storage::{
    CloudinaryMediaStore, InMemoryConnector, InMemoryDataService, LocalUploads, MongoConnector,
    MongoDataService,
};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Replace the menu with the default dishes
    Seed,
    /// Report menu items whose uploaded image file is missing
    CheckUploads {
        /// Point missing images at the placeholder
        #[arg(long)]
        fix: bool,
    },
}

struct Backend {
    menu: Arc<dyn DataService<MenuItem>>,
    orders: Arc<dyn DataService<Order>>,
    connection: ConnectionManager,
}

impl Backend {
    fn open(config: &DatabaseConfig) -> Self {
        match config.backend {
            StorageBackend::Mongodb => {
                let connector = Arc::new(MongoConnector::new(config.uri.clone()));
                Self {
                    menu: Arc::new(MongoDataService::<MenuItem>::new(connector.clone())),
                    orders: Arc::new(MongoDataService::<Order>::new(connector.clone())),
                    connection: ConnectionManager::new(connector),
                }
            }
            StorageBackend::Memory => Self {
                menu: Arc::new(InMemoryDataService::<MenuItem>::new()),
                orders: Arc::new(InMemoryDataService::<Order>::new()),
                connection: ConnectionManager::new(Arc::new(InMemoryConnector)),
            },
        }
    }

    /// Connect or give up; maintenance jobs have nothing to do offline
    async fn require_connection(&self) -> Result<()> {
        if !self.connection.connect().await {
            bail!(
                "Failed to connect to the database: {}",
                self.connection.last_error().unwrap_or_default()
            );
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = AppConfig::load()?;
    let backend = Backend::open(&config.database);

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config, backend).await,
        Command::Seed => {
            backend.require_connection().await?;
            seed_menu(backend.menu.as_ref()).await?;
            Ok(())
        }
        Command::CheckUploads { fix } => check_uploads(config, backend, fix).await,
    }
}

async fn serve(config: AppConfig, backend: Backend) -> Result<()> {
    let addr = config.bind_addr()?;
    let uploads = LocalUploads::new(&config.uploads_dir);
    uploads.ensure_dir().await?;

    // A failed connect is recorded and reported by /health; the server still starts
    backend.connection.connect().await;

    if let Some(url) = config.keep_alive_target() {
        keep_alive::spawn(url, config.keep_alive.interval());
    }

    let mut builder = ServerBuilder::new()
        .with_shared_services(backend.menu, backend.orders)
        .with_connection(backend.connection)
        .with_uploads(uploads);

    if let Some(media) = config.media {
        tracing::info!(cloud = %media.cloud_name, folder = %media.folder, "media uploads enabled");
        builder = builder.with_media_store(CloudinaryMediaStore::new(media));
    }

    builder.serve(&addr.to_string()).await
}

async fn check_uploads(config: AppConfig, backend: Backend, fix: bool) -> Result<()> {
    backend.require_connection().await?;
    let uploads = LocalUploads::new(&config.uploads_dir);

    let missing = find_missing(backend.menu.as_ref(), &uploads).await?;
    if missing.is_empty() {
        println!("All upload-backed images exist on disk.");
        return Ok(());
    }

    println!(
        "Found {} menu items referencing missing upload files:",
        missing.len()
    );
    for entry in &missing {
        println!(
            " - id={} name=\"{}\" image=\"{}\" expectedPath=\"{}\"",
            entry.id,
            entry.name,
            entry.image,
            entry.expected_path.display()
        );
    }

    if fix {
        let fixed = fix_missing(backend.menu.as_ref(), &uploads, &missing).await;
        println!(
            "Updated {} of {} items to {}",
            fixed,
            missing.len(),
            uploads.default_image()
        );
    } else {
        println!(
            "\nRun with --fix to replace missing images with {}",
            uploads.default_image()
        );
    }

    Ok(())
}
