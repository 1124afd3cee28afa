// Configuration structs

use std::path::PathBuf;

use crate::tools::catalog::DEFAULT_TIME_ZONE;

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory the file tools are scoped to
    pub working_dir: PathBuf,

    /// Persisted OAuth token for the Google-backed providers
    pub token_path: PathBuf,

    /// Timezone applied to event times and new calendars
    pub time_zone: String,
}

impl Config {
    pub fn new(working_dir: PathBuf) -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));

        Self {
            working_dir,
            token_path: home.join(".attache/token.json"),
            time_zone: DEFAULT_TIME_ZONE.to_string(),
        }
    }
}
