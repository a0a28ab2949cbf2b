use url::Url;

/// Environment variable naming the gatekeeper endpoint
pub const GATEKEEPER_URL_ENV: &str = "CODEDROP_GATEKEEPER_URL";
/// Environment variable naming the object-store cloud/tenant
pub const CLOUD_NAME_ENV: &str = "CODEDROP_CLOUD_NAME";
/// Optional override for the object-store API base
pub const OBJECT_STORE_URL_ENV: &str = "CODEDROP_OBJECT_STORE_URL";
/// Optional folder to request for uploaded objects
pub const UPLOAD_FOLDER_ENV: &str = "CODEDROP_UPLOAD_FOLDER";

const DEFAULT_OBJECT_STORE_URL: &str = "https://api.cloudinary.com";

#[derive(Debug, Clone)]
pub struct Config {
    /// Endpoint of the gatekeeping authority
    pub gatekeeper_url: Url,
    /// Cloud/tenant name, a path segment of every signed upload
    pub cloud_name: String,
    /// Base URL of the object-store API
    pub object_store_base: Url,
    /// Folder the negotiator may override, passed through on upload
    pub upload_folder: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("invalid URL in {0}: {1}")]
    InvalidUrl(&'static str, #[source] url::ParseError),
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// A missing required variable is fatal; the calling operation is never
    /// attempted.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let gatekeeper_raw =
            get(GATEKEEPER_URL_ENV).ok_or(ConfigError::Missing(GATEKEEPER_URL_ENV))?;
        let gatekeeper_url = Url::parse(&gatekeeper_raw)
            .map_err(|e| ConfigError::InvalidUrl(GATEKEEPER_URL_ENV, e))?;

        let cloud_name = get(CLOUD_NAME_ENV).ok_or(ConfigError::Missing(CLOUD_NAME_ENV))?;

        let object_store_raw =
            get(OBJECT_STORE_URL_ENV).unwrap_or_else(|| DEFAULT_OBJECT_STORE_URL.to_string());
        let object_store_base = Url::parse(&object_store_raw)
            .map_err(|e| ConfigError::InvalidUrl(OBJECT_STORE_URL_ENV, e))?;

        Ok(Self {
            gatekeeper_url,
            cloud_name,
            object_store_base,
            upload_folder: get(UPLOAD_FOLDER_ENV),
        })
    }
}
