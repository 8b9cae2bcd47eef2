//! Decoded tile content handed from a `TileSource` to the styles.
//!
//! Coordinates are tile-local: the tile spans `[-0.5, 0.5]` on both axes, with
//! y pointing north.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum FeatureGeometry {
    Point([f32; 2]),
    Line(Vec<[f32; 2]>),
    /// Outer ring first, then holes
    Polygon(Vec<Vec<[f32; 2]>>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub geometry: FeatureGeometry,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl Feature {
    pub fn new(geometry: FeatureGeometry) -> Self {
        Self {
            geometry,
            properties: Map::new(),
        }
    }

    pub fn with_property(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }

    /// Numeric property, if present and a number.
    pub fn number(&self, key: &str) -> Option<f32> {
        self.properties.get(key)?.as_f64().map(|v| v as f32)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Layer {
    pub name: String,
    pub features: Vec<Feature>,
}

impl Layer {
    pub fn new(name: impl Into<String>, features: Vec<Feature>) -> Self {
        Self {
            name: name.into(),
            features,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TileData {
    pub layers: Vec<Layer>,
}

impl TileData {
    pub fn new(layers: Vec<Layer>) -> Self {
        Self { layers }
    }

    pub fn layer(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find(|layer| layer.name == name)
    }

    pub fn feature_count(&self) -> usize {
        self.layers.iter().map(|layer| layer.features.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_from_json() {
        let json = r#"{
            "layers": [{
                "name": "buildings",
                "features": [{
                    "geometry": { "type": "Polygon", "coordinates": [[[0,0],[0.1,0],[0.1,0.1]]] },
                    "properties": { "height": 12.5, "kind": "house" }
                }]
            }]
        }"#;
        let data: TileData = serde_json::from_str(json).unwrap();
        let feature = &data.layer("buildings").unwrap().features[0];
        assert_eq!(feature.number("height"), Some(12.5));
        assert_eq!(feature.number("kind"), None);
        assert_eq!(data.feature_count(), 1);
        assert!(data.layer("roads").is_none());
    }
}
