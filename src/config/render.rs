//! Host module rendering
//!
//! Writes loaded settings back out in the shape the dashboard host reads:
//! an AMD module that hands the settings object to the host's `Settings`
//! constructor. Credentials are written as-is because the host needs them.

use crate::config::settings::Settings;
use crate::error::Result;
use serde_json::Value;

/// The settings module shipped alongside the load-test dashboards
pub const SAMPLE_MODULE: &str = r#"define(['settings'],
function (Settings) {
  return new Settings({
    datasources: {
      influxdb: {
        type: 'influxdb',
        url: "http://localhost:8086/db/locust",
        username: 'admin',
        password: 'admin',
        default: true
      },
      grafana: {
        type: 'influxdb',
        url: "http://localhost:8086/db/grafana",
        username: 'admin',
        password: 'admin',
        grafanaDB: true
      },
    },
    search: {
      max_results: 20
    },
    default_route: '/dashboard/file/locust.json',
    unsaved_changes_warning: true,
    playlist_timespan: "1m",
    admin: {
      password: ''
    },
    window_title_prefix: 'Grafana - ',
    plugins: {
      panels: [],
      dependencies: [],
    }
  });
});
"#;

/// Settings as a document using the host's field names
pub fn to_document(settings: &Settings) -> Result<Value> {
    Ok(serde_json::to_value(settings)?)
}

pub fn render_json(settings: &Settings) -> Result<String> {
    Ok(serde_json::to_string_pretty(settings)?)
}

/// Settings wrapped as the host's `config.js` module
pub fn render_js_module(settings: &Settings) -> Result<String> {
    let body = render_json(settings)?;
    let indented = indent(&body, "  ");

    Ok(format!(
        "define(['settings'],\nfunction (Settings) {{\n  return new Settings({});\n}});\n",
        indented.trim_start()
    ))
}

fn indent(text: &str, prefix: &str) -> String {
    text.lines()
        .map(|line| format!("{}{}", prefix, line))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::loader::{extract_settings_literal, load, load_str, DocumentFormat};
    use serde_json::json;

    fn document() -> Value {
        json!({
            "datasources": {
                "graphite": {
                    "type": "graphite",
                    "url": "http://graphite.example.com:8080",
                    "default": true
                },
                "elastic": {
                    "type": "elasticsearch",
                    "url": "http://es.example.com:9200",
                    "index": "grafana-dash",
                    "grafanaDB": true
                }
            },
            "admin": { "password": "root" },
            "plugins": { "panels": ["histogram"], "dependencies": [] }
        })
    }

    #[test]
    fn test_document_round_trip() {
        let settings = load(&document()).unwrap();
        let rendered = to_document(&settings).unwrap();
        assert_eq!(load(&rendered).unwrap(), settings);
    }

    #[test]
    fn test_document_uses_host_names_and_defaults() {
        let settings = load(&document()).unwrap();
        let rendered = to_document(&settings).unwrap();

        assert_eq!(rendered["datasources"]["elastic"]["grafanaDB"], true);
        assert_eq!(rendered["datasources"]["graphite"]["type"], "graphite");
        assert_eq!(rendered["search"]["max_results"], 20);
        assert_eq!(rendered["playlist_timespan"], "1m");
        assert_eq!(rendered["admin"]["password"], "root");
    }

    #[test]
    fn test_urls_are_written_as_spelled() {
        let mut doc = document();
        doc["datasources"]["elastic"]["url"] = json!("http://ES.example.com:9200");

        let settings = load(&doc).unwrap();
        let rendered = to_document(&settings).unwrap();
        assert_eq!(rendered["datasources"]["elastic"]["url"], "http://ES.example.com:9200");
        assert_eq!(
            rendered["datasources"]["graphite"]["url"],
            "http://graphite.example.com:8080"
        );

        let module = render_js_module(&settings).unwrap();
        assert!(module.contains("\"url\": \"http://ES.example.com:9200\","));
        assert!(!module.contains("es.example.com:9200/"));
    }

    #[test]
    fn test_js_module_reloads() {
        let settings = load(&document()).unwrap();
        let module = render_js_module(&settings).unwrap();

        assert!(module.starts_with("define(['settings'],"));
        assert!(extract_settings_literal(&module).is_ok());
        assert_eq!(load_str(&module, Some(DocumentFormat::Js)).unwrap(), settings);
    }
}
