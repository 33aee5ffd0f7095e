use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::optimizer::Scenario;

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CompareConfig {
    pub arrival_rate: f64,
    pub service_rate: f64,
    pub scenarios: Vec<Scenario>,
}

pub fn load_config(path: &Path) -> Result<CompareConfig> {
    let contents = fs::read_to_string(path).map_err(|err| {
        Error::ConfigIo(format!(
            "failed to read config '{}': {}",
            path.display(),
            err
        ))
    })?;
    let ext = path
        .extension()
        .and_then(|value| value.to_str())
        .unwrap_or("");

    match ext {
        "toml" => toml::from_str(&contents)
            .map_err(|err| Error::ConfigParse(format!("failed to parse TOML: {}", err))),
        "json" => serde_json::from_str(&contents)
            .map_err(|err| Error::ConfigParse(format!("failed to parse JSON: {}", err))),
        "" => Err(Error::UnsupportedConfigFormat("unknown".to_string())),
        _ => Err(Error::UnsupportedConfigFormat(ext.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn write_temp(name: &str, ext: &str, contents: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock after epoch")
            .as_nanos();
        let path = std::env::temp_dir().join(format!("queue-opt-{}-{}.{}", name, nanos, ext));
        fs::write(&path, contents).expect("writable temp file");
        path
    }

    #[test]
    fn loads_toml_config() {
        let path = write_temp(
            "compare",
            "toml",
            r#"
arrival_rate = 120.0
service_rate = 30.0

[[scenarios]]
name = "cheap servers"
server_cost = 10.0
waiting_cost = 100.0

[[scenarios]]
name = "expensive servers"
server_cost = 100.0
waiting_cost = 10.0
"#,
        );
        let config = load_config(&path).expect("valid toml");
        fs::remove_file(&path).expect("removable temp file");

        assert_eq!(config.arrival_rate, 120.0);
        assert_eq!(config.scenarios.len(), 2);
        assert_eq!(config.scenarios[0].name, "cheap servers");
        assert_eq!(config.scenarios[1].server_cost, 100.0);
    }

    #[test]
    fn loads_json_config() {
        let path = write_temp(
            "compare",
            "json",
            r#"{
  "arrival_rate": 60.0,
  "service_rate": 20.0,
  "scenarios": [
    { "name": "baseline", "server_cost": 50.0, "waiting_cost": 20.0 }
  ]
}"#,
        );
        let config = load_config(&path).expect("valid json");
        fs::remove_file(&path).expect("removable temp file");

        assert_eq!(config.service_rate, 20.0);
        assert_eq!(config.scenarios.len(), 1);
        assert_eq!(config.scenarios[0].name, "baseline");
    }

    #[test]
    fn rejects_unknown_extension() {
        let path = write_temp("compare", "yaml", "arrival_rate: 1.0");
        let outcome = load_config(&path);
        fs::remove_file(&path).expect("removable temp file");
        assert!(matches!(
            outcome,
            Err(Error::UnsupportedConfigFormat(ext)) if ext == "yaml"
        ));
    }

    #[test]
    fn reports_parse_failures() {
        let path = write_temp("compare", "toml", "arrival_rate = ");
        let outcome = load_config(&path);
        fs::remove_file(&path).expect("removable temp file");
        assert!(matches!(outcome, Err(Error::ConfigParse(_))));
    }

    #[test]
    fn reports_missing_file() {
        let path = std::env::temp_dir().join("queue-opt-no-such-config.toml");
        assert!(matches!(load_config(&path), Err(Error::ConfigIo(_))));
    }
}
