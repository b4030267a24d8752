//! NsGuard Common - Shared types and constants
//!
//! This crate provides the foundational types used across all NsGuard components:
//! - Error types and error codes
//! - Event names shared by the event bus and its subscribers
//! - Common defaults

pub mod error;

// Re-exports for convenience
pub use error::{ErrorCode, GuardError};

/// Delay between a successful delete and the reload of the calling view
pub const DEFAULT_RELOAD_DELAY_MS: u64 = 1000;

/// Default capacity of the guard event bus
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Notification title used for every failed deletion attempt
pub const DELETE_FAILED_TITLE: &str = "Delete failed";

/// Event names carried on the guard event bus
pub mod event_name {
    pub const PRE_DELETE_NAMESPACE: &str = "pre_delete_namespace";
    pub const PIPELINE_STARTED: &str = "pipeline_started";
    pub const DELETE_NAMESPACE_FAILED: &str = "delete_namespace_failed";
    pub const PIPELINE_ERRORED: &str = "pipeline_errored";
    pub const NAMESPACE_DELETED: &str = "namespace_deleted";
}

/// Environment of a namespace
///
/// Accepts LOCAL, DEV, FWS/FAT, UAT, LPT, PRO/PROD and TOOLS, in any case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Env {
    Local,
    #[default]
    Dev,
    Fat,
    Uat,
    Lpt,
    Pro,
    Tools,
}

impl Env {
    pub const ALL: [Env; 7] = [
        Env::Local,
        Env::Dev,
        Env::Fat,
        Env::Uat,
        Env::Lpt,
        Env::Pro,
        Env::Tools,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Env::Local => "LOCAL",
            Env::Dev => "DEV",
            Env::Fat => "FAT",
            Env::Uat => "UAT",
            Env::Lpt => "LPT",
            Env::Pro => "PRO",
            Env::Tools => "TOOLS",
        }
    }
}

impl std::fmt::Display for Env {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Env {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "LOCAL" => Ok(Env::Local),
            "DEV" => Ok(Env::Dev),
            "FAT" | "FWS" => Ok(Env::Fat),
            "UAT" => Ok(Env::Uat),
            "LPT" => Ok(Env::Lpt),
            "PRO" | "PROD" => Ok(Env::Pro),
            "TOOLS" => Ok(Env::Tools),
            _ => Err(format!(
                "Invalid env: {}, expected one of LOCAL, DEV, FAT (FWS), UAT, LPT, PRO (PROD), TOOLS",
                s
            )),
        }
    }
}

impl serde::Serialize for Env {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> serde::Deserialize<'de> for Env {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env() {
        assert_eq!(Env::default(), Env::Dev);
        assert_eq!(Env::Pro.as_str(), "PRO");
        assert_eq!("dev".parse::<Env>().unwrap(), Env::Dev);
        assert_eq!("PROD".parse::<Env>().unwrap(), Env::Pro);
        assert_eq!("fws".parse::<Env>().unwrap(), Env::Fat);
        assert!("staging".parse::<Env>().is_err());
    }

    #[test]
    fn test_every_env_parses_from_its_name() {
        for env in Env::ALL {
            assert_eq!(env.as_str().parse::<Env>().unwrap(), env);
        }
        assert_eq!("tools".parse::<Env>().unwrap(), Env::Tools);

        let err = "staging".parse::<Env>().unwrap_err();
        assert!(err.contains("TOOLS"));
    }

    #[test]
    fn test_env_serde() {
        let json = serde_json::to_string(&Env::Uat).unwrap();
        assert_eq!(json, "\"UAT\"");
        let env: Env = serde_json::from_str("\"lpt\"").unwrap();
        assert_eq!(env, Env::Lpt);
        assert!(serde_json::from_str::<Env>("\"moon\"").is_err());
    }
}
