use foundation::bounds::Aabb2;
use foundation::math::{ProjectionKind, RawProjection};
use formats::settings::MapSettings;
use formats::topology::{ShapeGeometry, TopologyDocument};

use crate::layer::{Layer, LayerId};

#[derive(Debug, Clone, PartialEq)]
pub enum MapError {
    /// The configured projection is not in the catalog. Reported as a
    /// warning upstream; the chart does not draw.
    UnknownProjection(String),
    /// The landmass layer is required for bounding-box computation.
    MissingObject { name: String },
    /// The landmass layer had no finite coordinates to compute bounds from.
    EmptyGeometry,
}

impl std::fmt::Display for MapError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MapError::UnknownProjection(name) => {
                write!(f, "projection {name} is not available in the catalog")
            }
            MapError::MissingObject { name } => {
                write!(f, "topology document has no object layer {name}")
            }
            MapError::EmptyGeometry => write!(f, "landmass layer has no usable coordinates"),
        }
    }
}

impl std::error::Error for MapError {}

/// One base-map shape ready for rendering. Geometry stays geographic; the
/// renderer projects it through the current viewport fit.
#[derive(Debug, Clone, PartialEq)]
pub struct MapShape {
    /// Lowercased geo id, when the configured property (or feature id) is
    /// present.
    pub id: Option<String>,
    pub geometry: ShapeGeometry,
}

/// The decoded base map: projection, projected bounding box, and the shape
/// layers.
#[derive(Debug, Clone, PartialEq)]
pub struct MapLayerSnapshot {
    pub projection: RawProjection,
    /// Projected, pre-scale bounds of the landmass layer. Recomputed only
    /// when the map geometry changes.
    pub bounds: Aabb2,
    pub land: Vec<MapShape>,
    pub boundaries: Vec<MapShape>,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MapLayer {
    id: LayerId,
}

impl MapLayer {
    pub fn new(id: u64) -> Self {
        Self { id: LayerId(id) }
    }

    /// Builds the base map from a decoded topology document.
    ///
    /// A missing boundaries layer degrades to an empty layer; a missing
    /// landmass layer is an error because the bounding box depends on it.
    pub fn build(
        &self,
        topology: &TopologyDocument,
        settings: &MapSettings,
    ) -> Result<MapLayerSnapshot, MapError> {
        let kind = ProjectionKind::by_name(&settings.projection)
            .ok_or_else(|| MapError::UnknownProjection(settings.projection.clone()))?;
        let projection = match settings.rotate {
            Some(rotate) => RawProjection::with_rotate(kind, rotate),
            None => RawProjection::new(kind),
        };

        let geo_name = settings.topology.objects.geo.as_str();
        let land_collection = topology
            .object(geo_name)
            .ok_or_else(|| MapError::MissingObject {
                name: geo_name.to_string(),
            })?;

        let bounds = Aabb2::from_points(
            land_collection
                .features
                .iter()
                .flat_map(|feature| feature.geometry.positions())
                .map(|p| projection.forward(p.lon_deg, p.lat_deg)),
        )
        .ok_or(MapError::EmptyGeometry)?;

        let id_property = settings.topology.geo_id_property.as_deref();
        let land = land_collection
            .features
            .iter()
            .map(|feature| MapShape {
                id: shape_id(feature, id_property),
                geometry: feature.geometry.clone(),
            })
            .collect();

        let boundaries = topology
            .object(settings.topology.objects.boundaries.as_str())
            .map(|collection| {
                collection
                    .features
                    .iter()
                    .map(|feature| MapShape {
                        id: shape_id(feature, id_property),
                        geometry: feature.geometry.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(MapLayerSnapshot {
            projection,
            bounds,
            land,
            boundaries,
        })
    }
}

impl Layer for MapLayer {
    fn id(&self) -> LayerId {
        self.id
    }
}

fn shape_id(
    feature: &formats::topology::ShapeFeature,
    id_property: Option<&str>,
) -> Option<String> {
    let raw = match id_property {
        Some(key) => feature.property_text(key),
        None => feature.id.clone(),
    };
    raw.map(|s| s.to_lowercase())
}
