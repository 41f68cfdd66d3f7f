use serde::{Deserialize, Serialize};

/// Chart configuration as supplied by the host, with the upstream defaults.
///
/// All fields are optional in the encoded form; missing values fall back to
/// the documented defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChartSettings {
    pub map: MapSettings,
    pub opacity: OpacitySettings,
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            map: MapSettings::default(),
            opacity: OpacitySettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MapSettings {
    /// Catalog name of the cartographic projection.
    pub projection: String,
    /// `[delta_lambda, delta_phi]` globe rotation, degrees.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotate: Option<[f64; 2]>,
    /// User-facing zoom multiplier, >= 0.
    pub scale: f64,
    /// Fractional paddings beyond the fitted map bounds. Fractions of the
    /// map dimensions, not pixels; negative values crop into the map.
    pub offset: OffsetSettings,
    /// Crop (true) instead of stretching to fill (false).
    pub preserve_aspect_ratio: bool,
    pub topology: TopologySettings,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            projection: "geoAitoff".to_string(),
            rotate: None,
            scale: 1.1,
            offset: OffsetSettings {
                top: 0.05,
                right: 0.0,
                bottom: -0.2,
                left: -0.15,
            },
            preserve_aspect_ratio: false,
            topology: TopologySettings::default(),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OffsetSettings {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TopologySettings {
    /// Asset path of the base map document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub objects: TopologyObjectNames,
    /// Feature property carrying the shape's geo id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geo_id_property: Option<String>,
}

impl Default for TopologySettings {
    fn default() -> Self {
        Self {
            path: None,
            objects: TopologyObjectNames::default(),
            geo_id_property: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopologyObjectNames {
    /// Landmass layer used for bounding-box computation.
    pub geo: String,
    /// Administrative polygons layer.
    pub boundaries: String,
}

impl Default for TopologyObjectNames {
    fn default() -> Self {
        Self {
            geo: "land".to_string(),
            boundaries: "countries".to_string(),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OpacitySettings {
    pub regular: f64,
    pub highlight_dim: f64,
    pub select_dim: f64,
}

impl Default for OpacitySettings {
    fn default() -> Self {
        Self {
            regular: 0.5,
            highlight_dim: 0.1,
            select_dim: 0.3,
        }
    }
}
