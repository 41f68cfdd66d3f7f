use std::collections::BTreeMap;

use serde_json::{Map, Value};

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GeoPoint {
    pub lon_deg: f64,
    pub lat_deg: f64,
}

impl GeoPoint {
    pub fn new(lon_deg: f64, lat_deg: f64) -> Self {
        Self { lon_deg, lat_deg }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ShapeGeometry {
    Point(GeoPoint),
    MultiPoint(Vec<GeoPoint>),
    LineString(Vec<GeoPoint>),
    MultiLineString(Vec<Vec<GeoPoint>>),
    Polygon(Vec<Vec<GeoPoint>>),
    MultiPolygon(Vec<Vec<Vec<GeoPoint>>>),
}

impl ShapeGeometry {
    /// Every coordinate of the geometry, in encounter order.
    ///
    /// Used for bounding-box computation over a whole object layer.
    pub fn positions(&self) -> Vec<GeoPoint> {
        match self {
            ShapeGeometry::Point(p) => vec![*p],
            ShapeGeometry::MultiPoint(ps) | ShapeGeometry::LineString(ps) => ps.clone(),
            ShapeGeometry::MultiLineString(lines) | ShapeGeometry::Polygon(lines) => {
                lines.iter().flatten().copied().collect()
            }
            ShapeGeometry::MultiPolygon(polys) => {
                polys.iter().flatten().flatten().copied().collect()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShapeFeature {
    pub id: Option<String>,
    pub properties: Map<String, Value>,
    pub geometry: ShapeGeometry,
}

impl ShapeFeature {
    /// String value of a property, with numbers rendered as text.
    pub fn property_text(&self, key: &str) -> Option<String> {
        match self.properties.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShapeCollection {
    pub features: Vec<ShapeFeature>,
}

/// The decoded base-map document: named object layers, each a collection of
/// GeoJSON-like features.
///
/// The chart expects at least a landmass layer (for bounding-box
/// computation) and an administrative-boundaries layer; which names map to
/// which role is configuration, not format.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TopologyDocument {
    pub objects: BTreeMap<String, ShapeCollection>,
    /// Content hash of the encoded payload; stable across re-fetches of the
    /// same asset.
    pub content_id: String,
}

#[derive(Debug)]
pub enum TopologyError {
    NotATopology,
    InvalidObject {
        name: String,
        reason: String,
    },
    InvalidFeature {
        object: String,
        index: usize,
        reason: String,
    },
}

impl std::fmt::Display for TopologyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TopologyError::NotATopology => {
                write!(f, "expected a topology document with named objects")
            }
            TopologyError::InvalidObject { name, reason } => {
                write!(f, "invalid object layer {name}: {reason}")
            }
            TopologyError::InvalidFeature {
                object,
                index,
                reason,
            } => {
                write!(f, "invalid feature at index {index} of {object}: {reason}")
            }
        }
    }
}

impl std::error::Error for TopologyError {}

impl TopologyDocument {
    pub fn from_json_str(payload: &str) -> Result<Self, TopologyError> {
        let value: Value =
            serde_json::from_str(payload).map_err(|e| TopologyError::InvalidObject {
                name: "<document>".to_string(),
                reason: format!("JSON parse error: {e}"),
            })?;
        let mut doc = Self::from_json_value(value)?;
        doc.content_id = content_id(payload.as_bytes());
        Ok(doc)
    }

    pub fn from_json_value(value: Value) -> Result<Self, TopologyError> {
        let obj = value.as_object().ok_or(TopologyError::NotATopology)?;
        let objects_val = obj
            .get("objects")
            .and_then(|v| v.as_object())
            .ok_or(TopologyError::NotATopology)?;

        let mut objects = BTreeMap::new();
        for (name, collection_val) in objects_val {
            let collection = parse_collection(name, collection_val)?;
            objects.insert(name.clone(), collection);
        }

        Ok(Self {
            objects,
            content_id: String::new(),
        })
    }

    pub fn object(&self, name: &str) -> Option<&ShapeCollection> {
        self.objects.get(name)
    }
}

/// Content identity for cached topology payloads.
pub fn content_id(payload: &[u8]) -> String {
    blake3::hash(payload).to_hex().to_string()
}

fn parse_collection(name: &str, value: &Value) -> Result<ShapeCollection, TopologyError> {
    let obj = value.as_object().ok_or_else(|| TopologyError::InvalidObject {
        name: name.to_string(),
        reason: "object layer must be a JSON object".to_string(),
    })?;

    let ty = obj
        .get("type")
        .and_then(|v| v.as_str())
        .ok_or_else(|| TopologyError::InvalidObject {
            name: name.to_string(),
            reason: "object layer missing type".to_string(),
        })?;
    if ty != "FeatureCollection" {
        return Err(TopologyError::InvalidObject {
            name: name.to_string(),
            reason: format!("unexpected layer type: {ty}"),
        });
    }

    let features_val = obj
        .get("features")
        .and_then(|v| v.as_array())
        .ok_or_else(|| TopologyError::InvalidObject {
            name: name.to_string(),
            reason: "object layer missing features".to_string(),
        })?;

    let mut features = Vec::with_capacity(features_val.len());
    for (index, feat_val) in features_val.iter().enumerate() {
        features.push(parse_feature(name, index, feat_val)?);
    }

    Ok(ShapeCollection { features })
}

fn parse_feature(object: &str, index: usize, value: &Value) -> Result<ShapeFeature, TopologyError> {
    let invalid = |reason: String| TopologyError::InvalidFeature {
        object: object.to_string(),
        index,
        reason,
    };

    let feat_obj = value
        .as_object()
        .ok_or_else(|| invalid("feature must be an object".to_string()))?;

    let feat_type = feat_obj
        .get("type")
        .and_then(|v| v.as_str())
        .ok_or_else(|| invalid("feature missing type".to_string()))?;
    if feat_type != "Feature" {
        return Err(invalid(format!("unexpected feature type: {feat_type}")));
    }

    let id = match feat_obj.get("id") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };

    let properties = feat_obj
        .get("properties")
        .and_then(|v| v.as_object())
        .cloned()
        .unwrap_or_default();

    let geometry_val = feat_obj
        .get("geometry")
        .ok_or_else(|| invalid("feature missing geometry".to_string()))?;
    let geometry = parse_geometry(geometry_val).map_err(invalid)?;

    Ok(ShapeFeature {
        id,
        properties,
        geometry,
    })
}

fn parse_geometry(value: &Value) -> Result<ShapeGeometry, String> {
    let obj = value
        .as_object()
        .ok_or("geometry must be an object".to_string())?;
    let ty = obj
        .get("type")
        .and_then(|v| v.as_str())
        .ok_or("geometry missing type".to_string())?;

    let coords = obj
        .get("coordinates")
        .ok_or("geometry missing coordinates".to_string())?;

    match ty {
        "Point" => Ok(ShapeGeometry::Point(parse_point(coords)?)),
        "MultiPoint" => Ok(ShapeGeometry::MultiPoint(parse_points(coords)?)),
        "LineString" => Ok(ShapeGeometry::LineString(parse_points(coords)?)),
        "MultiLineString" => Ok(ShapeGeometry::MultiLineString(parse_lines(coords)?)),
        "Polygon" => Ok(ShapeGeometry::Polygon(parse_polygon(coords)?)),
        "MultiPolygon" => Ok(ShapeGeometry::MultiPolygon(parse_multi_polygon(coords)?)),
        other => Err(format!("unsupported geometry type: {other}")),
    }
}

fn parse_point(coords: &Value) -> Result<GeoPoint, String> {
    let arr = coords
        .as_array()
        .ok_or("Point coordinates must be an array".to_string())?;
    if arr.len() < 2 {
        return Err("Point coordinates must have [lon, lat]".to_string());
    }
    let lon = arr[0]
        .as_f64()
        .ok_or("Point lon must be a number".to_string())?;
    let lat = arr[1]
        .as_f64()
        .ok_or("Point lat must be a number".to_string())?;
    Ok(GeoPoint::new(lon, lat))
}

fn parse_points(coords: &Value) -> Result<Vec<GeoPoint>, String> {
    let arr = coords
        .as_array()
        .ok_or("coordinates must be an array".to_string())?;
    let mut out = Vec::with_capacity(arr.len());
    for item in arr {
        out.push(parse_point(item)?);
    }
    Ok(out)
}

fn parse_lines(coords: &Value) -> Result<Vec<Vec<GeoPoint>>, String> {
    let arr = coords
        .as_array()
        .ok_or("MultiLineString coordinates must be an array".to_string())?;
    let mut out = Vec::with_capacity(arr.len());
    for line in arr {
        out.push(parse_points(line)?);
    }
    Ok(out)
}

fn parse_polygon(coords: &Value) -> Result<Vec<Vec<GeoPoint>>, String> {
    let rings = coords
        .as_array()
        .ok_or("Polygon coordinates must be an array of rings".to_string())?;
    let mut out = Vec::with_capacity(rings.len());
    for ring in rings {
        out.push(parse_points(ring)?);
    }
    Ok(out)
}

fn parse_multi_polygon(coords: &Value) -> Result<Vec<Vec<Vec<GeoPoint>>>, String> {
    let polys = coords
        .as_array()
        .ok_or("MultiPolygon coordinates must be an array of polygons".to_string())?;
    let mut out = Vec::with_capacity(polys.len());
    for poly in polys {
        out.push(parse_polygon(poly)?);
    }
    Ok(out)
}
