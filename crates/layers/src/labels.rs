use foundation::math::Vec2;
use scene::dataset::FrameDataset;
use scene::entity::{Entity, EntityKey, Measure};
use scene::selection::SelectionSet;

use crate::bubbles::BubblesLayer;
use crate::layer::{Layer, LayerId};

/// Strategy for turning an entity into display text.
///
/// Chart variants inject their own formatter instead of subclassing the
/// chart: the paired click-map, for example, appends its color measure.
pub trait LabelFormatter {
    fn format(&self, entity: &Entity) -> String;
}

/// Joins the entity's label dimension values with spaces.
#[derive(Debug, Default, Copy, Clone)]
pub struct PlainLabelFormatter;

impl LabelFormatter for PlainLabelFormatter {
    fn format(&self, entity: &Entity) -> String {
        entity.label_text()
    }
}

/// Appends the color measure and a fixed suffix to the plain label.
#[derive(Debug, Clone)]
pub struct MeasureSuffixFormatter {
    pub suffix: String,
}

impl LabelFormatter for MeasureSuffixFormatter {
    fn format(&self, entity: &Entity) -> String {
        let base = entity.label_text();
        let value = match &entity.color {
            Some(Measure::Number(v)) => v.to_string(),
            Some(Measure::Category(c)) => c.clone(),
            None => return base,
        };
        format!("{base}: {value}{}", self.suffix)
    }
}

/// A tooltip anchored to a bubble.
///
/// Anchors are fractions of the container so the host's label component can
/// lay out in its own coordinate space.
#[derive(Debug, Clone, PartialEq)]
pub struct TooltipSpec {
    pub key: EntityKey,
    pub text: String,
    pub anchor: Vec2,
    /// Pointer clearance: the bubble radius in pixels.
    pub offset_px: f64,
}

/// Persistent label for one selected entity.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelAnchor {
    pub key: EntityKey,
    pub text: String,
    pub anchor: Vec2,
    pub radius_px: f64,
    pub color: String,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct LabelsLayerSnapshot {
    pub labels: Vec<LabelAnchor>,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LabelsLayer {
    id: LayerId,
}

impl LabelsLayer {
    pub fn new(id: u64) -> Self {
        Self { id: LayerId(id) }
    }

    /// Tooltip for a hovered entity.
    pub fn tooltip(
        &self,
        entity: &Entity,
        bubbles: &BubblesLayer,
        formatter: &dyn LabelFormatter,
        container_width: f64,
        container_height: f64,
    ) -> Option<TooltipSpec> {
        let state = bubbles.state(&entity.key)?;
        Some(TooltipSpec {
            key: entity.key.clone(),
            text: formatter.format(entity),
            anchor: Vec2::new(
                state.center.x / container_width,
                state.center.y / container_height,
            ),
            offset_px: state.radius,
        })
    }

    /// Labels are maintained only for selected entities.
    ///
    /// Ordering contract: ascending key order (selection iteration order).
    pub fn extract(
        &self,
        dataset: &FrameDataset,
        bubbles: &BubblesLayer,
        selected: &SelectionSet,
        formatter: &dyn LabelFormatter,
        container_width: f64,
        container_height: f64,
    ) -> LabelsLayerSnapshot {
        let mut labels = Vec::new();
        for key in selected.iter() {
            let Some(entity) = dataset.get(key) else {
                continue;
            };
            let Some(state) = bubbles.state(key) else {
                continue;
            };
            labels.push(LabelAnchor {
                key: key.clone(),
                text: formatter.format(entity),
                anchor: Vec2::new(
                    state.center.x / container_width,
                    state.center.y / container_height,
                ),
                radius_px: state.radius,
                color: state.color.clone(),
            });
        }
        LabelsLayerSnapshot { labels }
    }
}

impl Layer for LabelsLayer {
    fn id(&self) -> LayerId {
        self.id
    }
}
