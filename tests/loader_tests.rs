//! Settings loader tests
//!
//! Tests for document validation, defaults and the host module form,
//! using the settings module shipped with the load-test dashboards.

use dashconf::config::loader::{load, load_file, load_str, parse_document, DocumentFormat};
use dashconf::config::render::{render_js_module, to_document, SAMPLE_MODULE};
use dashconf::config::DataSourceType;
use dashconf::DashconfError;
use serde_json::{json, Value};
use std::path::Path;

const FIXTURE: &str = include_str!("fixtures/grafana-config.js");

fn sample_document() -> Value {
    json!({
        "datasources": {
            "influxdb": {
                "type": "influxdb",
                "url": "http://localhost:8086/db/locust",
                "username": "admin",
                "password": "admin",
                "default": true
            },
            "grafana": {
                "type": "influxdb",
                "url": "http://localhost:8086/db/grafana",
                "username": "admin",
                "password": "admin",
                "grafanaDB": true
            }
        },
        "search": { "max_results": 20 },
        "default_route": "/dashboard/file/locust.json",
        "unsaved_changes_warning": true,
        "playlist_timespan": "1m",
        "admin": { "password": "" },
        "window_title_prefix": "Grafana - ",
        "plugins": { "panels": [], "dependencies": [] }
    })
}

#[cfg(test)]
mod sample_document_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sample_document_loads() {
        let settings = load(&sample_document()).unwrap();

        assert_eq!(settings.datasource_names(), vec!["influxdb", "grafana"]);
        assert_eq!(settings.search.max_results, 20);
        assert_eq!(settings.default_route, "/dashboard/file/locust.json");
        assert!(settings.plugins.panels.is_empty());
        assert!(settings.plugins.dependencies.is_empty());
        assert_eq!(settings.window_title_prefix, "Grafana - ");
        assert_eq!(
            settings.playlist_timespan.duration(),
            std::time::Duration::from_secs(60)
        );

        let influxdb = settings.datasource("influxdb").unwrap();
        assert_eq!(influxdb.kind, DataSourceType::Influxdb);
        assert!(influxdb.is_default);
        assert!(!influxdb.grafana_db);
        assert_eq!(influxdb.username.as_deref(), Some("admin"));
        assert_eq!(influxdb.password.as_ref().unwrap().expose(), "admin");

        let grafana = settings.datasource("grafana").unwrap();
        assert!(grafana.grafana_db);
        assert!(!grafana.is_default);
        assert_eq!(grafana.url.as_str(), "http://localhost:8086/db/grafana");

        assert_eq!(settings.default_datasource().unwrap().name, "influxdb");
        assert_eq!(settings.metadata_store().unwrap().name, "grafana");
    }

    #[test]
    fn test_load_is_idempotent() {
        let document = sample_document();
        assert_eq!(load(&document).unwrap(), load(&document).unwrap());
    }

    #[test]
    fn test_original_module_matches_document() {
        let from_module = load_str(FIXTURE, Some(DocumentFormat::Js)).unwrap();
        let from_document = load(&sample_document()).unwrap();
        assert_eq!(from_module, from_document);
    }

    #[test]
    fn test_module_is_detected_without_format() {
        let settings = load_str(FIXTURE, None).unwrap();
        assert_eq!(settings.datasources.len(), 2);
    }

    #[test]
    fn test_bundled_sample_matches_fixture() {
        assert_eq!(
            load_str(SAMPLE_MODULE, None).unwrap(),
            load_str(FIXTURE, None).unwrap()
        );
    }

    #[test]
    fn test_module_keeps_datasource_order() {
        let document = parse_document(FIXTURE, DocumentFormat::Js).unwrap();
        let keys: Vec<&String> = document["datasources"].as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["influxdb", "grafana"]);
    }
}

#[cfg(test)]
mod validation_tests {
    use super::*;

    #[test]
    fn test_two_defaults_rejected() {
        let mut document = sample_document();
        document["datasources"]["grafana"]["default"] = json!(true);

        match load(&document).unwrap_err() {
            DashconfError::MultipleDefaultDataSources { names } => {
                assert_eq!(names, vec!["influxdb", "grafana"]);
            }
            other => panic!("expected MultipleDefaultDataSources, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_url_rejected() {
        let mut document = sample_document();
        document["datasources"]["grafana"]
            .as_object_mut()
            .unwrap()
            .remove("url");

        match load(&document).unwrap_err() {
            DashconfError::MissingField { field } => {
                assert_eq!(field, "datasources.grafana.url");
            }
            other => panic!("expected MissingField, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let mut document = sample_document();
        document["datasources"]["influxdb"]["type"] = json!("unknown-backend");

        match load(&document).unwrap_err() {
            DashconfError::UnknownDataSourceType { name, kind } => {
                assert_eq!(name, "influxdb");
                assert_eq!(kind, "unknown-backend");
            }
            other => panic!("expected UnknownDataSourceType, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_url_rejected() {
        let mut document = sample_document();
        document["datasources"]["influxdb"]["url"] = json!("http//localhost:8086");

        assert!(matches!(
            load(&document).unwrap_err(),
            DashconfError::InvalidUrl { .. }
        ));
    }

    #[test]
    fn test_non_positive_max_results_rejected() {
        for value in [json!(0), json!(-1), json!("20"), json!(1.5)] {
            let mut document = sample_document();
            document["search"]["max_results"] = value.clone();

            match load(&document).unwrap_err() {
                DashconfError::InvalidFieldValue { field, .. } => {
                    assert_eq!(field, "search.max_results")
                }
                other => panic!("max_results {}: unexpected {:?}", value, other),
            }
        }
    }

    #[test]
    fn test_missing_or_empty_datasources_rejected() {
        let mut document = sample_document();
        document.as_object_mut().unwrap().remove("datasources");
        assert!(matches!(
            load(&document).unwrap_err(),
            DashconfError::MissingField { .. }
        ));

        document["datasources"] = json!({});
        assert!(matches!(
            load(&document).unwrap_err(),
            DashconfError::InvalidFieldValue { .. }
        ));
    }

    #[test]
    fn test_plugins_default_to_empty() {
        let mut document = sample_document();
        document.as_object_mut().unwrap().remove("plugins");

        let settings = load(&document).unwrap();
        assert!(settings.plugins.panels.is_empty());
        assert!(settings.plugins.dependencies.is_empty());
    }

    #[test]
    fn test_optional_fields_default() {
        let document = json!({
            "datasources": {
                "graphite": { "type": "graphite", "url": "http://graphite:8080" }
            }
        });

        let settings = load(&document).unwrap();
        assert!(settings.unsaved_changes_warning);
        assert_eq!(settings.search.max_results, 20);
        assert_eq!(settings.playlist_timespan.as_str(), "1m");
        assert_eq!(settings.default_datasource().unwrap().name, "graphite");
        assert!(settings.metadata_store().is_none());
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let mut document = sample_document();
        document["theme"] = json!("dark");
        document["datasources"]["influxdb"]["timezone"] = json!("utc");

        assert!(load(&document).is_ok());
    }
}

#[cfg(test)]
mod secret_tests {
    use super::*;

    #[test]
    fn test_debug_output_hides_passwords() {
        let mut document = sample_document();
        document["admin"]["password"] = json!("topsecret");

        let settings = load(&document).unwrap();
        let debug = format!("{:?}", settings);
        assert!(!debug.contains("topsecret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_rendered_module_keeps_passwords() {
        let settings = load(&sample_document()).unwrap();
        let module = render_js_module(&settings).unwrap();
        assert!(module.contains("\"password\": \"admin\""));

        let document = to_document(&settings).unwrap();
        assert_eq!(load(&document).unwrap(), settings);
    }
}

#[cfg(test)]
mod file_tests {
    use super::*;

    #[tokio::test]
    async fn test_load_fixture_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("fixtures")
            .join("grafana-config.js");

        let settings = load_file(&path).await.unwrap();
        assert_eq!(settings, load(&sample_document()).unwrap());
    }

    #[tokio::test]
    async fn test_load_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.yaml");
        tokio::fs::write(
            &path,
            "datasources:\n  es:\n    type: elasticsearch\n    url: http://es:9200\n    index: grafana-dash\n    grafanaDB: true\nplaylist_timespan: 5m\n",
        )
        .await
        .unwrap();

        let settings = load_file(&path).await.unwrap();
        let es = settings.datasource("es").unwrap();
        assert_eq!(es.kind, DataSourceType::Elasticsearch);
        assert_eq!(es.index.as_deref(), Some("grafana-dash"));
        assert_eq!(settings.playlist_timespan.as_str(), "5m");
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_file(&dir.path().join("absent.json")).await.unwrap_err();
        assert!(matches!(err, DashconfError::IoError(_)));
    }

    #[tokio::test]
    async fn test_broken_json_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        tokio::fs::write(&path, "{ \"datasources\": ").await.unwrap();

        let err = load_file(&path).await.unwrap_err();
        assert!(matches!(err, DashconfError::DocumentParse { .. }));
        assert!(!err.is_validation_error());
    }
}
