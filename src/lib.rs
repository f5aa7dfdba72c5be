//! Grocery Aisle Product Finder
//!
//! A small web service that answers one question: "where in the store is the
//! thing in this photo?"
//!
//! # Pipeline
//!
//! 1. An image is uploaded via multipart form (browser UI or JSON API).
//! 2. A classifier backend produces top-k fine-grained labels, which are
//!    collapsed to a coarse label: banana, apple, or neither.
//! 3. The coarse label is looked up in the product catalog (SQLite) for
//!    aisle, section, category, price, and stock.
//! 4. The result is rendered as an HTML card or a JSON payload.
//!
//! A secondary endpoint simulates multi-object detection: randomized boxes
//! are drawn onto the uploaded image to illustrate a detection UI without a
//! real detector behind it.
//!
//! # Module Structure
//!
//! - `classify`: classifier backends (stub, tract-onnx) and coarse labels
//! - `catalog`: product location store (SQLite + in-memory) and CSV seeding
//! - `sim`: simulated multi-object detection
//! - `annotate`: image decoding, box drawing, JPEG/data-URL helpers
//! - `http`: hand-rolled HTTP server, routing, multipart parsing
//! - `pages`: HTML rendering
//! - `schemas`: JSON response types
//! - `reqlog`: append-only prediction log
//! - `config`: file + environment configuration

pub mod annotate;
pub mod catalog;
pub mod classify;
pub mod config;
pub mod http;
pub mod pages;
pub mod reqlog;
pub mod schemas;
pub mod sim;

pub use catalog::{
    normalize_product_name, validate_product_name, InMemoryProductStore, ProductLocation,
    ProductStore, SqliteProductStore,
};
#[cfg(feature = "backend-tract")]
pub use classify::TractBackend;
pub use classify::{
    BackendRegistry, Classification, ClassifierBackend, CoarseLabel, ScoredClass, StubBackend,
};
pub use config::{ClassifierSettings, FinderConfig};
pub use http::{FinderServer, ServerConfig, ServerHandle};
pub use schemas::{
    BasePrediction, DetectResponse, DetectedProduct, LocateResponse, LocationInfo, PredictResponse,
    ProductMeta,
};
pub use sim::{simulate_detections, SimulatedDetection};
