//! Terraform registry metadata client.

use crate::config::Config;
use crate::error::{Result, SchemaError};
use crate::types::ModuleReference;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// The fields of a registry module version this tool cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ModuleMetadata {
    /// Repository the module was published from
    #[serde(default)]
    pub source: Option<String>,

    /// Short description of the module
    #[serde(default)]
    pub description: Option<String>,
}

/// HTTP client for `GET {base_url}/{source}/{version}`.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    client: Client,
    base_url: String,
}

impl RegistryClient {
    /// Create a registry client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.registry.timeout_secs))
            .user_agent(concat!("tfmodule-schema/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| crate::err!(Http {
                message: format!("Failed to create HTTP client: {e}"),
                status_code: None,
            }))?;

        Ok(Self {
            client,
            base_url: config.registry.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Metadata URL for a module reference. The version segment is left
    /// off when no version was given, which asks for the latest release.
    #[must_use]
    pub fn metadata_url(&self, module: &ModuleReference) -> String {
        let source = module.source.trim_matches('/');
        if module.has_version() {
            format!("{}/{}/{}", self.base_url, source, module.version)
        } else {
            format!("{}/{}", self.base_url, source)
        }
    }

    /// Fetch module metadata.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failures, non-success statuses, or an
    /// undecodable body.
    pub async fn metadata(&self, module: &ModuleReference) -> Result<ModuleMetadata> {
        let url = self.metadata_url(module);
        tracing::info!(url = %url, "Fetching module metadata");

        let response = self.client.get(&url).send().await.map_err(|e| crate::err!(Http {
            message: format!("Request to {url} failed: {e}"),
            status_code: None,
        }))?;

        let status = response.status();
        if !status.is_success() {
            return Err(crate::err!(Http {
                message: format!("Failed to fetch module metadata from {url}: {status}"),
                status_code: Some(status.as_u16()),
            }));
        }

        response.json::<ModuleMetadata>().await.map_err(|e| {
            SchemaError::Http {
                message: format!("Invalid module metadata from {url}: {e}"),
                status_code: Some(status.as_u16()),
                src_path: file!(),
                src_line: line!(),
            }
        })
    }
}
