use std::sync::Mutex;

use tempfile::NamedTempFile;

use aisle_finder::config::FinderConfig;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "FINDER_CONFIG",
        "FINDER_HTTP_ADDR",
        "FINDER_MAX_UPLOAD_BYTES",
        "FINDER_DB_PATH",
        "FINDER_CATALOG_CSV",
        "FINDER_REQUEST_LOG",
        "FINDER_FONT_PATH",
        "FINDER_BACKEND",
        "FINDER_MODEL_PATH",
        "FINDER_LABELS_PATH",
        "FINDER_TOP_K",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn defaults_apply_without_file_or_env() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = FinderConfig::load().expect("load config");

    assert_eq!(cfg.http_addr, "127.0.0.1:8000");
    assert_eq!(cfg.max_upload_bytes, 10 * 1024 * 1024);
    assert_eq!(cfg.db_path, "products.db");
    assert_eq!(cfg.catalog_csv.to_string_lossy(), "data/products.csv");
    assert_eq!(cfg.request_log.to_string_lossy(), "data/requests.log");
    assert!(cfg.font_path.is_none());
    assert_eq!(cfg.classifier.backend, "stub");
    assert!(cfg.classifier.model_path.is_none());
    assert_eq!(cfg.classifier.top_k, 5);

    clear_env();
}

#[test]
fn loads_config_from_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{
        "db_path": "store.db",
        "catalog_csv": "fixtures/catalog.csv",
        "request_log": "logs/requests.log",
        "http": {
            "addr": "0.0.0.0:9000",
            "max_upload_bytes": 2097152
        },
        "classifier": {
            "backend": "Tract ",
            "model_path": "models/classifier.onnx",
            "labels_path": "models/labels.txt",
            "top_k": 3
        }
    }"#;
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");

    std::env::set_var("FINDER_CONFIG", file.path());
    std::env::set_var("FINDER_DB_PATH", "override.db");
    std::env::set_var("FINDER_TOP_K", "7");

    let cfg = FinderConfig::load().expect("load config");

    assert_eq!(cfg.http_addr, "0.0.0.0:9000");
    assert_eq!(cfg.max_upload_bytes, 2 * 1024 * 1024);
    assert_eq!(cfg.db_path, "override.db");
    assert_eq!(cfg.catalog_csv.to_string_lossy(), "fixtures/catalog.csv");
    assert_eq!(cfg.request_log.to_string_lossy(), "logs/requests.log");
    // Backend names are trimmed and lowercased during validation.
    assert_eq!(cfg.classifier.backend, "tract");
    assert_eq!(
        cfg.classifier.model_path.as_ref().unwrap().to_string_lossy(),
        "models/classifier.onnx"
    );
    assert_eq!(cfg.classifier.top_k, 7);

    clear_env();
}

#[test]
fn rejects_unparsable_numeric_env_values() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("FINDER_MAX_UPLOAD_BYTES", "ten megabytes");
    assert!(FinderConfig::load().is_err());
    clear_env();

    std::env::set_var("FINDER_TOP_K", "many");
    assert!(FinderConfig::load().is_err());

    clear_env();
}

#[test]
fn rejects_zero_limits() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("FINDER_MAX_UPLOAD_BYTES", "0");
    assert!(FinderConfig::load().is_err());
    clear_env();

    std::env::set_var("FINDER_TOP_K", "0");
    assert!(FinderConfig::load().is_err());

    clear_env();
}

#[test]
fn missing_config_file_is_an_error() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("FINDER_CONFIG", "/nonexistent/finder.json");
    assert!(FinderConfig::load().is_err());

    clear_env();
}
