use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    pub base_url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Settings {
    pub fn new(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut s = Config::builder();

        // An explicitly requested config file must exist; the default
        // 'config' file in the current directory is optional.
        if let Some(path) = config_path {
            if Path::new(path).exists() {
                s = s.add_source(File::with_name(path));
            } else {
                s = s.add_source(File::with_name(path).required(true));
            }
        } else {
            s = s.add_source(File::with_name("config").required(false));
        }

        // Environment variables: FUSION_BASE_URL, FUSION_USERNAME, FUSION_PASSWORD
        s = s.add_source(Environment::with_prefix("FUSION"));

        s.build()?.try_deserialize()
    }

    /// Everything is optional (the Fusion API defaults to localhost and
    /// needs no credentials), but present values must not be empty.
    pub fn validate(&self) -> Result<(), String> {
        if matches!(self.base_url.as_deref(), Some("")) {
            return Err("base_url must not be empty".to_string());
        }
        if matches!(self.username.as_deref(), Some("")) {
            return Err("username must not be empty".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_load_from_file() {
        let mut file = Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "base_url = 'http://127.0.0.1:8697'\nusername = 'testuser'\npassword = 'pw'"
        )
        .unwrap();

        let path = file.path().to_str().unwrap();
        let settings = Settings::new(Some(path)).unwrap();

        assert_eq!(settings.base_url, Some("http://127.0.0.1:8697".to_string()));
        assert_eq!(settings.username, Some("testuser".to_string()));
        assert_eq!(settings.password, Some("pw".to_string()));
    }

    #[test]
    fn test_missing_file_fails() {
        assert!(Settings::new(Some("/nonexistent/fusion.toml")).is_err());
    }

    #[test]
    fn test_validation() {
        let s = Settings {
            base_url: Some("".into()),
            username: None,
            password: None,
        };
        assert!(s.validate().is_err());

        let s = Settings::default();
        assert!(s.validate().is_ok());
    }
}
