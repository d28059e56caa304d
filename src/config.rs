//! Configuration module for tfmodule-schema.
//!
//! This module handles loading configuration from:
//! - YAML configuration files (`tfschema.yaml`)
//! - Environment variables
//! - CLI arguments
//!
//! # Configuration File Format
//!
//! ```yaml
//! # tfschema.yaml
//!
//! inference:
//!   model: gpt-4o
//!   api_base_url: https://api.openai.com/v1
//!   api_key_env: OPENAI_KEY
//!
//! registry:
//!   base_url: https://registry.terraform.io/v1/modules
//!
//! scan:
//!   exclude_patterns:
//!     - ".terraform"
//!   max_depth: 100
//!
//! git:
//!   keep_clone: false
//!
//! output:
//!   pretty: true
//! ```

use crate::error::{Result, SchemaError};
use serde::{Deserialize, Serialize};

/// Language model options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceOptions {
    /// Chat model used for inference.
    pub model: String,

    /// Base URL of the chat completions API.
    pub api_base_url: String,

    /// Environment variable holding the API key.
    pub api_key_env: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// Name attached to the strict JSON schema response format.
    pub schema_name: String,
}

impl Default for InferenceOptions {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            api_base_url: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_KEY".to_string(),
            timeout_secs: 600,
            schema_name: "output_schema".to_string(),
        }
    }
}

/// Module registry options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryOptions {
    /// Base URL of the module registry API.
    pub base_url: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            base_url: "https://registry.terraform.io/v1/modules".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Directory scanning options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanOptions {
    /// File or directory names to skip (glob patterns).
    pub exclude_patterns: Vec<String>,

    /// Maximum depth for recursive directory scanning.
    pub max_depth: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            exclude_patterns: vec![".terraform".to_string(), ".terragrunt-cache".to_string()],
            max_depth: default_max_depth(),
        }
    }
}

/// Git options.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GitOptions {
    /// Leave the temporary clone on disk after the run.
    pub keep_clone: bool,
}

/// Output options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputOptions {
    /// Pretty-print the schema document.
    pub pretty: bool,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self { pretty: true }
    }
}

/// Main configuration structure with nested sections.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Language model options
    pub inference: InferenceOptions,

    /// Module registry options
    pub registry: RegistryOptions,

    /// Scanning options
    pub scan: ScanOptions,

    /// Git options
    pub git: GitOptions,

    /// Output options
    pub output: OutputOptions,
}

fn default_max_depth() -> usize {
    100
}

impl Config {
    /// Load configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid.
    pub fn from_yaml(content: &str) -> Result<Self> {
        tracing::debug!("Parsing configuration from YAML");
        let expanded = expand_env_vars(content);

        // An all-comment file deserializes to null
        if expanded.lines().all(|l| l.trim().is_empty() || l.trim_start().starts_with('#')) {
            return Ok(Self::default());
        }

        let config: Self = serde_yaml::from_str(&expanded)
            .map_err(|e| SchemaError::config_parse(e.to_string(), file!(), line!()))?;

        tracing::debug!(
            model = %config.inference.model,
            registry = %config.registry.base_url,
            keep_clone = config.git.keep_clone,
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    /// Read the inference API key from the environment variable named by
    /// `inference.api_key_env`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigMissing` if the variable is unset or empty.
    pub fn api_key(&self) -> Result<String> {
        let var = &self.inference.api_key_env;
        std::env::var(var)
            .ok()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                crate::err!(ConfigMissing {
                    key: var.clone(),
                })
            })
    }

    /// Merge CLI arguments into the configuration.
    pub fn merge_cli_args(&mut self, cli: &crate::cli::Cli) {
        if let Some(ref model) = cli.model {
            self.inference.model.clone_from(model);
        }
        if cli.keep_clone {
            self.git.keep_clone = true;
        }
    }

    /// Generate an example YAML configuration.
    #[must_use]
    pub fn example_yaml() -> String {
        r#"# tfmodule-schema configuration file

# Language model options
inference:
  # Chat model used to infer output types
  model: gpt-4o

  # Chat completions endpoint base
  api_base_url: https://api.openai.com/v1

  # Environment variable holding the API key
  api_key_env: OPENAI_KEY

  # Request timeout in seconds
  timeout_secs: 600

  # Name of the strict response schema
  schema_name: output_schema

# Terraform registry options
registry:
  base_url: https://registry.terraform.io/v1/modules
  timeout_secs: 30

# Scanning options
scan:
  # File or directory names to skip (glob patterns)
  exclude_patterns:
    - ".terraform"
    - ".terragrunt-cache"

  # Maximum depth for recursive directory scanning
  max_depth: 100

# Git options (for registry modules)
git:
  # Leave the temporary clone on disk after the run
  keep_clone: false

# Output options
output:
  # Indent the schema document
  pretty: true
"#
        .to_string()
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax. Unknown variables are left as-is.
fn expand_env_vars(content: &str) -> String {
    let mut result = content.to_string();

    let braced = regex::Regex::new(r"\$\{([^}]+)\}").expect("valid regex");
    for cap in braced.captures_iter(content) {
        if let Ok(value) = std::env::var(&cap[1]) {
            result = result.replace(&cap[0], &value);
        }
    }

    let bare = regex::Regex::new(r"\$([A-Za-z_][A-Za-z0-9_]*)").expect("valid regex");
    for cap in bare.captures_iter(content) {
        if let Ok(value) = std::env::var(&cap[1]) {
            result = result.replace(&cap[0], &value);
        }
    }

    result
}
