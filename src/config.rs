use anyhow::{Context, Result};
use reqwest::Url;

use crate::upload::{AuthScheme, Credential};

pub const DEFAULT_TITLE: &str = "Import Products CSV";

/// Configuration for CSV imports
#[derive(Debug, Clone)]
pub struct Config {
    pub endpoint: Url,
    pub credential: Option<Credential>,
    pub title: String,
}

impl Config {
    /// Load configuration through `lookup`, which maps a variable name to its value
    ///
    /// # Errors
    ///
    /// Returns an error if required variables are missing or invalid
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let endpoint = lookup("CSV_IMPORT_URL")
            .context("CSV_IMPORT_URL not found in environment. Please set it in .env file or pass --url")?;
        let endpoint = Self::validate_endpoint(&endpoint)?;

        let credential = Self::credential_from(&lookup)?;

        let title = lookup("CSV_IMPORT_TITLE")
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_TITLE.to_string());

        Ok(Self {
            endpoint,
            credential,
            title,
        })
    }

    /// Validate the signed URL endpoint
    fn validate_endpoint(endpoint: &str) -> Result<Url> {
        let endpoint = endpoint.trim();
        if endpoint.is_empty() {
            anyhow::bail!("CSV_IMPORT_URL cannot be empty");
        }

        let url = Url::parse(endpoint).with_context(|| {
            format!(
                "CSV_IMPORT_URL '{}' is not a valid URL (e.g., https://api.example.com/import)",
                endpoint
            )
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            anyhow::bail!(
                "CSV_IMPORT_URL '{}' must use http or https (got '{}')",
                endpoint,
                url.scheme()
            );
        }

        if url.fragment().is_some() {
            anyhow::bail!("CSV_IMPORT_URL '{}' cannot contain a fragment", endpoint);
        }

        Ok(url)
    }

    /// Build the credential from either a token or a username/password pair
    fn credential_from<F>(lookup: &F) -> Result<Option<Credential>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let scheme = match non_empty("CSV_IMPORT_AUTH_SCHEME") {
            Some(s) => s.parse::<AuthScheme>().context("Invalid CSV_IMPORT_AUTH_SCHEME")?,
            None => AuthScheme::default(),
        };

        let token = non_empty("CSV_IMPORT_TOKEN");
        let username = non_empty("CSV_IMPORT_USERNAME");
        let password = lookup("CSV_IMPORT_PASSWORD");

        match (token, username) {
            (Some(_), Some(_)) => anyhow::bail!(
                "Set either CSV_IMPORT_TOKEN or CSV_IMPORT_USERNAME/CSV_IMPORT_PASSWORD, not both"
            ),
            (Some(token), None) => {
                let credential = Credential::new(scheme, token.trim())
                    .context("Invalid CSV_IMPORT_TOKEN")?;
                Ok(Some(credential))
            }
            (None, Some(username)) => {
                if scheme != AuthScheme::Basic {
                    anyhow::bail!("CSV_IMPORT_USERNAME requires CSV_IMPORT_AUTH_SCHEME=basic");
                }
                let password = password.context(
                    "CSV_IMPORT_PASSWORD not found in environment (required with CSV_IMPORT_USERNAME)",
                )?;
                let credential = Credential::basic_login(username.trim(), &password)
                    .context("Invalid CSV_IMPORT_USERNAME")?;
                Ok(Some(credential))
            }
            (None, None) => Ok(None),
        }
    }
}
