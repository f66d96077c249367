//! CLI command implementations

use std::path::PathBuf;
#[cfg(feature = "http")]
use std::sync::Arc;

use crate::auth::{ApiKey, CanonicalMessage, HmacType, sign};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::output;

/// A request signed on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedQuery {
    /// The canonical message that was signed
    pub message: String,
    /// Hex signature
    pub signature: String,
    /// Query string carrying the parameters, `sig` and `hmac`
    pub query: String,
}

/// Sign `pub` followed by `NAME=VALUE` parameters, in the given order
pub fn signed_query(
    public_key: &str,
    secret: &str,
    algorithm: HmacType,
    params: &[String],
) -> Result<SignedQuery> {
    let mut message = CanonicalMessage::new().param("pub", public_key);
    for param in params {
        let (name, value) = param.split_once('=').ok_or_else(|| {
            Error::InvalidArgument(format!("expected NAME=VALUE, got {}", param))
        })?;
        message.push(name, value);
    }

    let message = message.render();
    let signature = sign(secret, &message, algorithm);
    let query = format!("{}&sig={}&hmac={}", message, signature, algorithm);

    Ok(SignedQuery {
        message,
        signature,
        query,
    })
}

/// Print a signed query string
pub fn sign_request(
    public_key: &str,
    secret: &str,
    algorithm: HmacType,
    params: &[String],
) -> Result<()> {
    let signed = signed_query(public_key, secret, algorithm, params)?;

    output::heading("Signed request");
    output::field("message", &signed.message);
    output::field("hmac", algorithm.as_str());
    output::field("signature", &signed.signature);
    println!("\n{}", signed.query);

    Ok(())
}

/// Print a freshly generated key pair
pub fn generate_key() -> Result<()> {
    let key = ApiKey::generate();

    output::heading("New API key");
    output::field("public", &key.public_key);
    output::field("private", &key.private_key);
    println!();
    output::warning("Store the private key now; it is not recoverable.");
    println!(
        "\nkeys:\n  - public_key: {}\n    private_key: {}",
        key.public_key, key.private_key
    );

    Ok(())
}

/// Print the effective configuration with private keys masked
pub fn config_show(config: &Config) -> Result<()> {
    let yaml =
        serde_yaml::to_string(&config.redacted()).map_err(|e| Error::Config(e.to_string()))?;
    println!("{}", yaml);
    Ok(())
}

/// Write a default configuration file
pub fn config_init(output_path: Option<PathBuf>) -> Result<()> {
    let path = output_path.unwrap_or_else(default_config_path);

    if path.exists() {
        return Err(Error::Config(format!(
            "{} already exists",
            path.display()
        )));
    }

    Config::default().save(&path)?;
    output::success(&format!("Wrote {}", path.display()));
    Ok(())
}

fn default_config_path() -> PathBuf {
    directories::ProjectDirs::from("", "", "atoll")
        .map(|d| d.config_dir().join("config.yaml"))
        .unwrap_or_else(|| PathBuf::from("atoll.yaml"))
}

/// Run the administration API and the deletion worker until Ctrl-C
#[cfg(feature = "http")]
pub async fn serve(config: &Config) -> Result<()> {
    use tokio::time::Duration;
    use tracing::info;

    use crate::api::RepositoryAdminService;
    use crate::api::http::start_server;
    use crate::auth::SignedRequestVerifier;
    use crate::queue::UniqueWorkQueue;
    use crate::repository::{MemoryCatalog, RepositoryCatalog};
    use crate::scheduler::IndexScheduler;
    use crate::worker::DeletionWorker;

    let catalog = match &config.catalog_path {
        Some(path) => MemoryCatalog::open(path)?,
        None => MemoryCatalog::new(),
    };
    info!("Loaded {} repositories", catalog.len().await);
    let catalog: Arc<dyn RepositoryCatalog> = Arc::new(catalog);

    let index_queue = Arc::new(UniqueWorkQueue::new());
    let delete_queue = Arc::new(UniqueWorkQueue::new());
    let scheduler = Arc::new(IndexScheduler::new(catalog.clone(), index_queue.clone()));
    let verifier = SignedRequestVerifier::new(Arc::new(config.key_store()));

    if !config.api.enabled {
        output::warning("API is disabled; every call will be refused (set ATOLL_API_ENABLED=true)");
    } else if config.api.auth_required && config.keys.is_empty() {
        output::warning("Authentication is required but no API keys are configured");
    }

    let service = Arc::new(RepositoryAdminService::new(
        config.api,
        verifier,
        catalog.clone(),
        scheduler,
        delete_queue.clone(),
    ));

    let worker = Arc::new(DeletionWorker::new(catalog, delete_queue, index_queue));
    let worker_task = {
        let worker = worker.clone();
        let every = Duration::from_secs(config.deletion_interval_secs.max(1));
        tokio::spawn(async move { worker.run(every).await })
    };

    let addr = tokio::net::lookup_host((config.server.host.as_str(), config.server.port))
        .await?
        .next()
        .ok_or_else(|| {
            Error::Config(format!(
                "cannot resolve {}:{}",
                config.server.host, config.server.port
            ))
        })?;

    output::info(&format!("Serving on http://{}, press Ctrl-C to stop", addr));

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
        }
        info!("Shutting down");
    };

    let served = start_server(addr, service, shutdown).await;

    worker.stop().await;
    worker_task.abort();
    // Flush deletions queued right before shutdown
    worker.run_once().await;

    served?;
    Ok(())
}
