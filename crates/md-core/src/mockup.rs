//! Product mockup catalog, static data supplied by the host application.
//!
//! `productType -> color -> ProductVariant`. All `DesignArea` fields are
//! fractions of the mockup canvas dimensions.

use crate::error::DocumentError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One camera angle of a product photo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductImage {
    pub angle: String,
    pub label: String,
    pub src: String,
}

/// Fractional region of the mockup where design layers are composited.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DesignArea {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Default for DesignArea {
    fn default() -> Self {
        Self {
            x: 0.3,
            y: 0.25,
            width: 0.4,
            height: 0.4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductVariant {
    pub name: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub images: Vec<ProductImage>,
    #[serde(default)]
    pub design_area: DesignArea,
}

impl ProductVariant {
    /// The image shot from `angle`, or the first image when that angle is missing.
    pub fn image_for_angle(&self, angle: &str) -> Option<&ProductImage> {
        self.images
            .iter()
            .find(|img| img.angle == angle)
            .or_else(|| self.images.first())
    }

    pub fn angles(&self) -> impl Iterator<Item = &str> {
        self.images.iter().map(|img| img.angle.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductCatalog {
    pub products: BTreeMap<String, BTreeMap<String, ProductVariant>>,
}

impl ProductCatalog {
    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn variant(&self, product: &str, color: &str) -> Option<&ProductVariant> {
        self.products.get(product)?.get(color)
    }

    pub fn require_variant(
        &self,
        product: &str,
        color: &str,
    ) -> Result<&ProductVariant, DocumentError> {
        self.variant(product, color)
            .ok_or_else(|| DocumentError::UnknownVariant {
                product: product.to_string(),
                color: color.to_string(),
            })
    }

    /// Color names offered for `product`, in catalog order.
    pub fn colors(&self, product: &str) -> Vec<&str> {
        self.products
            .get(product)
            .map(|colors| colors.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }
}

/// Returned alongside exported PNG bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportMetadata {
    pub product_type: String,
    pub color: String,
    pub angle: String,
    pub timestamp: DateTime<Utc>,
}

impl ExportMetadata {
    pub fn now(product_type: &str, color: &str, angle: &str) -> Self {
        Self {
            product_type: product_type.to_string(),
            color: color.to_string(),
            angle: angle.to_string(),
            timestamp: Utc::now(),
        }
    }
}
