use std::env;
use std::path::PathBuf;

const DEFAULT_MODEL_DIR: &str = "model";
const DEFAULT_LOG_FILTER: &str = "edustat_risk=info";

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the classifier and encoder artifacts
    pub model_dir: PathBuf,

    /// tracing filter directive
    pub log_filter: String,
}

impl Config {
    /// Reads `EDUSTAT_MODEL_DIR` and `RUST_LOG`, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            model_dir: lookup("EDUSTAT_MODEL_DIR")
                .filter(|dir| !dir.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_DIR)),
            log_filter: lookup("RUST_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
        }
    }

    pub fn with_model_dir(mut self, model_dir: Option<PathBuf>) -> Self {
        if let Some(dir) = model_dir {
            self.model_dir = dir;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_unset() {
        let config = Config::from_lookup(|_| None);
        assert_eq!(config.model_dir, PathBuf::from("model"));
        assert_eq!(config.log_filter, "edustat_risk=info");
    }

    #[test]
    fn reads_values_and_ignores_blank_dir() {
        let config = Config::from_lookup(|key| match key {
            "EDUSTAT_MODEL_DIR" => Some("/srv/edustat".to_string()),
            "RUST_LOG" => Some("debug".to_string()),
            _ => None,
        });
        assert_eq!(config.model_dir, PathBuf::from("/srv/edustat"));
        assert_eq!(config.log_filter, "debug");

        let blank = Config::from_lookup(|key| (key == "EDUSTAT_MODEL_DIR").then(|| " ".to_string()));
        assert_eq!(blank.model_dir, PathBuf::from("model"));
    }

    #[test]
    fn flag_overrides_env() {
        let config = Config::from_lookup(|_| None).with_model_dir(Some(PathBuf::from("alt")));
        assert_eq!(config.model_dir, PathBuf::from("alt"));
        let config = config.with_model_dir(None);
        assert_eq!(config.model_dir, PathBuf::from("alt"));
    }
}
