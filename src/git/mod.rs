//! Git support for registry modules.
//!
//! Registry metadata names the repository a module version was published
//! from. This module turns that into a clonable URL and performs a
//! shallow clone into a temporary directory.
//!
//! # Example
//!
//! ```rust,no_run
//! use tfmodule_schema::git::GitClient;
//! use tfmodule_schema::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = GitClient::new(&Config::default());
//!     let checkout = client
//!         .shallow_clone("https://github.com/terraform-aws-modules/terraform-aws-vpc")
//!         .await?;
//!     println!("Cloned to: {}", checkout.path().display());
//!     Ok(())
//! }
//! ```

mod client;

pub use client::{CloneDir, GitClient};

/// Turn a repository URL into a clonable one by appending `.git`.
#[must_use]
pub fn normalize_clone_url(url: &str) -> String {
    let url = url.trim();
    if url.ends_with(".git") {
        url.to_string()
    } else {
        format!("{url}.git")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_clone_url() {
        assert_eq!(
            normalize_clone_url("https://github.com/terraform-aws-modules/terraform-aws-vpc"),
            "https://github.com/terraform-aws-modules/terraform-aws-vpc.git"
        );
        assert_eq!(
            normalize_clone_url("https://github.com/org/repo.git"),
            "https://github.com/org/repo.git"
        );
        assert_eq!(
            normalize_clone_url(" https://gitlab.com/org/repo "),
            "https://gitlab.com/org/repo.git"
        );
    }
}
