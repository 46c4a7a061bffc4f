//! PageMark Backend Server
//!
//! Serves page raster metadata and stores annotations in memory.
//!
//! ## Environment
//!
//! - `PAGEMARK_ADDR`: bind address (default `0.0.0.0:3030`)
//! - `PAGEMARK_DOCUMENTS`: JSON file with the documents to register
//! - `PAGEMARK_DPI`: resolution pages are rendered at (default 150)

mod routes;
mod state;

use anyhow::Context;
use pagemark_core::document::DEFAULT_DPI;
use state::{AppState, NewDocument};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

const DEFAULT_ADDR: &str = "0.0.0.0:3030";

/// Server settings read from the environment.
#[derive(Debug, Clone, PartialEq)]
struct ServerConfig {
    addr: SocketAddr,
    documents: Option<PathBuf>,
    dpi: u32,
}

impl ServerConfig {
    fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let addr = lookup("PAGEMARK_ADDR").unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let addr: SocketAddr = addr
            .parse()
            .with_context(|| format!("Invalid PAGEMARK_ADDR {:?}", addr))?;
        let dpi = match lookup("PAGEMARK_DPI") {
            Some(value) => value
                .parse::<u32>()
                .ok()
                .filter(|dpi| *dpi > 0)
                .with_context(|| format!("Invalid PAGEMARK_DPI {:?}", value))?,
            None => DEFAULT_DPI,
        };
        Ok(Self {
            addr,
            documents: lookup("PAGEMARK_DOCUMENTS").map(PathBuf::from),
            dpi,
        })
    }
}

/// Documents served when no registry file is configured.
fn sample_documents() -> Vec<NewDocument> {
    vec![NewDocument {
        filename: "sample.pdf".to_string(),
        page_count: 3,
        page_width: 612.0,
        page_height: 792.0,
    }]
}

fn read_documents(path: &Path) -> anyhow::Result<Vec<NewDocument>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read document registry {}", path.display()))?;
    serde_json::from_str(&json)
        .with_context(|| format!("Invalid document registry {}", path.display()))
}

fn build_state(config: &ServerConfig) -> anyhow::Result<AppState> {
    let state = AppState::new(config.dpi);
    let documents = match &config.documents {
        Some(path) => read_documents(path)?,
        None => {
            warn!("PAGEMARK_DOCUMENTS not set, serving a sample document");
            sample_documents()
        }
    };
    for document in documents {
        state
            .register_document(document)
            .map_err(|e| anyhow::anyhow!("Invalid document in registry: {}", e))?;
    }
    Ok(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pagemark_server=info,tower_http=info".into()),
        )
        .init();

    let config = ServerConfig::from_env()?;
    let state = Arc::new(build_state(&config)?);
    let app = routes::router(state.clone());

    info!(
        "PageMark backend listening on {} ({} documents, {} dpi)",
        config.addr,
        state.documents().len(),
        state.dpi()
    );

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.addr))?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> anyhow::Result<ServerConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.addr, "0.0.0.0:3030".parse::<SocketAddr>().unwrap());
        assert_eq!(config.dpi, DEFAULT_DPI);
        assert!(config.documents.is_none());
    }

    #[test]
    fn test_invalid_values() {
        assert!(config(&[("PAGEMARK_ADDR", "nowhere")]).is_err());
        assert!(config(&[("PAGEMARK_DPI", "0")]).is_err());
        assert_eq!(config(&[("PAGEMARK_DPI", "300")]).unwrap().dpi, 300);
    }

    #[test]
    fn test_registry_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("documents.json");
        std::fs::write(
            &path,
            r#"[{"filename":"a.pdf","page_count":2,"page_width":595.0,"page_height":842.0},
                {"filename":"b.pdf","page_count":1,"page_width":612.0,"page_height":792.0}]"#,
        )
        .unwrap();
        let config = ServerConfig {
            addr: DEFAULT_ADDR.parse().unwrap(),
            documents: Some(path),
            dpi: 72,
        };
        let state = build_state(&config).unwrap();
        let documents = state.documents();
        assert_eq!(documents.len(), 2);
        assert_eq!(documents[1].filename, "b.pdf");
        assert_eq!(state.page_info(1, 1).unwrap().image_width, 595);
    }
}
