//! Default values shared across the crate.

pub mod http {
    use std::time::Duration;

    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
}

pub mod auth {
    /// Full Cloud Platform scope, required by Vertex AI.
    pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";
    pub const TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
    pub const METADATA_HOST: &str = "169.254.169.254";
    /// Seconds before expiry at which a cached token stops being served.
    pub const EXPIRY_SAFETY_WINDOW_SECS: i64 = 300;
    /// Lifetime assumed for tokens handed in without expiry information.
    pub const ENV_TOKEN_LIFETIME_SECS: i64 = 600;
    pub const JWT_LIFETIME_SECS: i64 = 3600;
}

pub mod vertex {
    pub const DEFAULT_LOCATION: &str = "us-central1";
    pub const DEFAULT_IMAGE_MODEL: &str = "imagegeneration";
    pub const GOOGLE_PUBLISHER: &str = "google";
    pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";
}
