use base64::{Engine as _, engine::general_purpose::STANDARD};
use std::fmt;
use std::str::FromStr;

/// Authorization scheme understood by the signed URL endpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthScheme {
    #[default]
    Basic,
    Bearer,
}

impl AuthScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "Basic",
            Self::Bearer => "Bearer",
        }
    }
}

impl FromStr for AuthScheme {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(Self::Basic),
            "bearer" => Ok(Self::Bearer),
            other => anyhow::bail!(
                "Unknown auth scheme '{}' (expected 'basic' or 'bearer')",
                other
            ),
        }
    }
}

/// Credential material sent with the signed URL request
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    scheme: AuthScheme,
    token: String,
}

impl Credential {
    /// Use an already-encoded token as is
    pub fn new(scheme: AuthScheme, token: impl Into<String>) -> anyhow::Result<Self> {
        let token = token.into();
        Self::validate_token(&token)?;
        Ok(Self { scheme, token })
    }

    /// Build a Basic credential from a username and password
    pub fn basic_login(username: &str, password: &str) -> anyhow::Result<Self> {
        if username.is_empty() {
            anyhow::bail!("Username cannot be empty");
        }
        if username.contains(':') {
            anyhow::bail!("Username '{}' cannot contain ':'", username);
        }

        let token = STANDARD.encode(format!("{}:{}", username, password));
        Ok(Self {
            scheme: AuthScheme::Basic,
            token,
        })
    }

    pub fn scheme(&self) -> AuthScheme {
        self.scheme
    }

    /// Value for the `Authorization` header
    pub fn header_value(&self) -> String {
        format!("{} {}", self.scheme.as_str(), self.token)
    }

    fn validate_token(token: &str) -> anyhow::Result<()> {
        if token.is_empty() {
            anyhow::bail!("Credential token cannot be empty");
        }

        if let Some(c) = token
            .chars()
            .find(|c| c.is_whitespace() || c.is_control() || !c.is_ascii())
        {
            anyhow::bail!(
                "Credential token contains invalid character {:?}. Tokens must be printable ASCII without spaces",
                c
            );
        }

        Ok(())
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("scheme", &self.scheme)
            .field("token", &"<redacted>")
            .finish()
    }
}
