use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_HTTP_ADDR: &str = "127.0.0.1:8000";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
const DEFAULT_DB_PATH: &str = "products.db";
const DEFAULT_CATALOG_CSV: &str = "data/products.csv";
const DEFAULT_REQUEST_LOG: &str = "data/requests.log";
const DEFAULT_BACKEND: &str = "stub";
const DEFAULT_TOP_K: usize = 5;

#[derive(Debug, Deserialize, Default)]
struct FinderConfigFile {
    db_path: Option<String>,
    catalog_csv: Option<PathBuf>,
    request_log: Option<PathBuf>,
    font_path: Option<PathBuf>,
    http: Option<HttpConfigFile>,
    classifier: Option<ClassifierConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct HttpConfigFile {
    addr: Option<String>,
    max_upload_bytes: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
struct ClassifierConfigFile {
    backend: Option<String>,
    model_path: Option<PathBuf>,
    labels_path: Option<PathBuf>,
    top_k: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct FinderConfig {
    pub http_addr: String,
    pub max_upload_bytes: usize,
    pub db_path: String,
    pub catalog_csv: PathBuf,
    pub request_log: PathBuf,
    pub font_path: Option<PathBuf>,
    pub classifier: ClassifierSettings,
}

#[derive(Debug, Clone)]
pub struct ClassifierSettings {
    /// Backend name to use as the default ("stub" or "tract").
    pub backend: String,
    pub model_path: Option<PathBuf>,
    pub labels_path: Option<PathBuf>,
    pub top_k: usize,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            backend: DEFAULT_BACKEND.to_string(),
            model_path: None,
            labels_path: None,
            top_k: DEFAULT_TOP_K,
        }
    }
}

impl FinderConfig {
    /// Load configuration: optional JSON file named by `FINDER_CONFIG`,
    /// then `FINDER_*` environment overrides, then validation.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("FINDER_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: FinderConfigFile) -> Self {
        let http_addr = file
            .http
            .as_ref()
            .and_then(|http| http.addr.clone())
            .unwrap_or_else(|| DEFAULT_HTTP_ADDR.to_string());
        let max_upload_bytes = file
            .http
            .as_ref()
            .and_then(|http| http.max_upload_bytes)
            .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES);
        let classifier = ClassifierSettings {
            backend: file
                .classifier
                .as_ref()
                .and_then(|c| c.backend.clone())
                .unwrap_or_else(|| DEFAULT_BACKEND.to_string()),
            model_path: file.classifier.as_ref().and_then(|c| c.model_path.clone()),
            labels_path: file.classifier.as_ref().and_then(|c| c.labels_path.clone()),
            top_k: file
                .classifier
                .as_ref()
                .and_then(|c| c.top_k)
                .unwrap_or(DEFAULT_TOP_K),
        };
        Self {
            http_addr,
            max_upload_bytes,
            db_path: file.db_path.unwrap_or_else(|| DEFAULT_DB_PATH.to_string()),
            catalog_csv: file
                .catalog_csv
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CATALOG_CSV)),
            request_log: file
                .request_log
                .unwrap_or_else(|| PathBuf::from(DEFAULT_REQUEST_LOG)),
            font_path: file.font_path,
            classifier,
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(addr) = std::env::var("FINDER_HTTP_ADDR") {
            if !addr.trim().is_empty() {
                self.http_addr = addr;
            }
        }
        if let Ok(bytes) = std::env::var("FINDER_MAX_UPLOAD_BYTES") {
            let parsed: usize = bytes
                .parse()
                .map_err(|_| anyhow!("FINDER_MAX_UPLOAD_BYTES must be an integer byte count"))?;
            self.max_upload_bytes = parsed;
        }
        if let Ok(path) = std::env::var("FINDER_DB_PATH") {
            if !path.trim().is_empty() {
                self.db_path = path;
            }
        }
        if let Ok(path) = std::env::var("FINDER_CATALOG_CSV") {
            if !path.trim().is_empty() {
                self.catalog_csv = PathBuf::from(path);
            }
        }
        if let Ok(path) = std::env::var("FINDER_REQUEST_LOG") {
            if !path.trim().is_empty() {
                self.request_log = PathBuf::from(path);
            }
        }
        if let Ok(path) = std::env::var("FINDER_FONT_PATH") {
            if !path.trim().is_empty() {
                self.font_path = Some(PathBuf::from(path));
            }
        }
        if let Ok(backend) = std::env::var("FINDER_BACKEND") {
            if !backend.trim().is_empty() {
                self.classifier.backend = backend;
            }
        }
        if let Ok(path) = std::env::var("FINDER_MODEL_PATH") {
            if !path.trim().is_empty() {
                self.classifier.model_path = Some(PathBuf::from(path));
            }
        }
        if let Ok(path) = std::env::var("FINDER_LABELS_PATH") {
            if !path.trim().is_empty() {
                self.classifier.labels_path = Some(PathBuf::from(path));
            }
        }
        if let Ok(top_k) = std::env::var("FINDER_TOP_K") {
            let parsed: usize = top_k
                .parse()
                .map_err(|_| anyhow!("FINDER_TOP_K must be a positive integer"))?;
            self.classifier.top_k = parsed;
        }
        Ok(())
    }

    fn validate(&mut self) -> Result<()> {
        if self.max_upload_bytes == 0 {
            return Err(anyhow!("max_upload_bytes must be greater than zero"));
        }
        if self.classifier.top_k == 0 {
            return Err(anyhow!("classifier top_k must be at least 1"));
        }
        self.classifier.backend = self.classifier.backend.trim().to_lowercase();
        if self.classifier.backend.is_empty() {
            return Err(anyhow!("classifier backend must not be empty"));
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<FinderConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}
