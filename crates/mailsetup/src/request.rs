//! Reading provisioning requests from the command line.

use std::path::Path;

use anyhow::{Context, bail};
use serde_json::{Map, Value};

/// Reads a JSON object of options from `path`, or stdin when `path` is `-`.
pub async fn read_options_file(path: &Path) -> anyhow::Result<Map<String, Value>> {
    let contents = if path == Path::new("-") {
        tokio::task::spawn_blocking(|| std::io::read_to_string(std::io::stdin()))
            .await?
            .context("Failed to read request from stdin")?
    } else {
        tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read request file {}", path.display()))?
    };

    match serde_json::from_str(&contents).context("Request is not valid JSON")? {
        Value::Object(map) => Ok(map),
        other => bail!("Request must be a JSON object, got {other}"),
    }
}

/// Merges `key=value` pairs over `options`. Values are kept as strings.
pub fn apply_pairs(options: &mut Map<String, Value>, pairs: &[String]) -> anyhow::Result<()> {
    for pair in pairs {
        let Some((key, value)) = pair.split_once('=') else {
            bail!("Expected key=value, got {pair:?}");
        };
        let key = key.trim();
        if key.is_empty() {
            bail!("Empty option name in {pair:?}");
        }
        options.insert(key.to_string(), Value::String(value.to_string()));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn pairs_override_file_values() {
        let mut options = Map::new();
        options.insert("version".to_string(), Value::from("2.0"));

        apply_pairs(
            &mut options,
            &["version=1.0".to_string(), "inPort=993".to_string()],
        )
        .unwrap();

        assert_eq!(options["version"], "1.0");
        assert_eq!(options["inPort"], "993");
    }

    #[test]
    fn value_may_contain_equals() {
        let mut options = Map::new();
        apply_pairs(&mut options, &["password=a=b".to_string()]).unwrap();
        assert_eq!(options["password"], "a=b");
    }

    #[test]
    fn rejects_malformed_pairs() {
        let mut options = Map::new();
        assert!(apply_pairs(&mut options, &["version".to_string()]).is_err());
        assert!(apply_pairs(&mut options, &["=1.0".to_string()]).is_err());
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        assert!(
            read_options_file(Path::new("/nonexistent/request.json"))
                .await
                .is_err()
        );
    }
}
