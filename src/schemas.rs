//! Wire types for the JSON endpoints.
//!
//! Field names and nullability follow the browser-facing contract: the predict
//! payload omits `message` entirely on a hit but carries explicit nulls for
//! `location` and `meta` on a miss.

use serde::{Deserialize, Serialize};

use crate::catalog::ProductLocation;
use crate::sim::SimulatedDetection;

/// Aisle and section for a located product.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LocationInfo {
    pub aisle: String,
    pub section: String,
}

/// Secondary catalog fields shown alongside the location.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductMeta {
    pub category: String,
    pub price: f64,
    pub in_stock: bool,
}

/// Response body for `/api/predict` (and the data behind the HTML result).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PredictResponse {
    pub predicted_label: String,
    pub confidence: f32,
    pub found_in_database: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub location: Option<LocationInfo>,
    pub meta: Option<ProductMeta>,
}

impl PredictResponse {
    pub fn found(label: &str, confidence: f32, product: &ProductLocation) -> Self {
        Self {
            predicted_label: label.to_string(),
            confidence,
            found_in_database: true,
            message: None,
            location: Some(LocationInfo {
                aisle: product.aisle.clone(),
                section: product.section.clone(),
            }),
            meta: Some(ProductMeta {
                category: product.category.clone(),
                price: product.price,
                in_stock: product.in_stock,
            }),
        }
    }

    pub fn not_found(label: &str, confidence: f32) -> Self {
        Self {
            predicted_label: label.to_string(),
            confidence,
            found_in_database: false,
            message: Some(format!("No location info found for '{}'.", label)),
            location: None,
            meta: None,
        }
    }
}

/// The coarse prediction reported by `/products/basic`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectedProduct {
    pub name: String,
    pub confidence: f32,
}

/// Response body for `/products/basic`. The catalog is not consulted on this
/// endpoint, so `location` is always null.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LocateResponse {
    pub detected_product: DetectedProduct,
    pub location: Option<ProductLocation>,
    pub message: String,
}

impl LocateResponse {
    pub fn from_label(label: &str, confidence: f32) -> Self {
        let message = if label == "neither" {
            "No banana or apple detected.".to_string()
        } else {
            format!("Detected {}.", label)
        };
        Self {
            detected_product: DetectedProduct {
                name: label.to_string(),
                confidence,
            },
            location: None,
            message,
        }
    }
}

/// The single-label prediction reported alongside simulated detections.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BasePrediction {
    pub label: String,
    pub confidence: f32,
}

/// Response body for `/api/detect`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DetectResponse {
    pub base_prediction: BasePrediction,
    pub detections: Vec<SimulatedDetection>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product() -> ProductLocation {
        ProductLocation {
            product_name: "banana".to_string(),
            category: "Fruit".to_string(),
            aisle: "7".to_string(),
            section: "A1".to_string(),
            price: 0.25,
            in_stock: true,
        }
    }

    #[test]
    fn found_response_omits_message() {
        let response = PredictResponse::found("banana", 0.95, &product());
        let value = serde_json::to_value(&response).expect("serialize");
        let object = value.as_object().expect("object");

        assert!(!object.contains_key("message"));
        assert_eq!(value["found_in_database"], true);
        assert_eq!(value["location"]["aisle"], "7");
        assert_eq!(value["meta"]["category"], "Fruit");
    }

    #[test]
    fn not_found_response_carries_message_and_nulls() {
        let response = PredictResponse::not_found("neither", 0.41);
        let value = serde_json::to_value(&response).expect("serialize");

        assert_eq!(value["found_in_database"], false);
        assert_eq!(value["message"], "No location info found for 'neither'.");
        assert!(value["location"].is_null());
        assert!(value["meta"].is_null());
    }

    #[test]
    fn locate_response_messages() {
        let hit = LocateResponse::from_label("banana", 0.95);
        assert_eq!(hit.message, "Detected banana.");
        assert_eq!(hit.detected_product.name, "banana");
        assert!(hit.location.is_none());

        let miss = LocateResponse::from_label("neither", 0.2);
        assert_eq!(miss.message, "No banana or apple detected.");
    }

    #[test]
    fn detect_response_shape() {
        let response = DetectResponse {
            base_prediction: BasePrediction {
                label: "banana".to_string(),
                confidence: 0.95,
            },
            detections: vec![SimulatedDetection {
                label: "banana".to_string(),
                confidence: 0.8,
                bbox: [1, 2, 3, 4],
            }],
        };
        let value = serde_json::to_value(&response).expect("serialize");
        assert_eq!(value["base_prediction"]["label"], "banana");
        assert_eq!(value["detections"][0]["bbox"][2], 3);
    }
}
