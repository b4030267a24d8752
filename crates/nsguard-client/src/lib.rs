// nsguard-client: Portal HTTP providers for the namespace deletion guard

pub mod config;
pub mod constants;
pub mod error;
pub mod http;
pub mod model;
pub mod provider;

pub use config::PortalClientConfig;
pub use error::PortalError;
pub use http::PortalHttpClient;
pub use provider::PortalProviders;
