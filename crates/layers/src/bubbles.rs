use std::collections::BTreeMap;

use foundation::math::{RawProjection, Vec2};
use scene::dataset::FrameDataset;
use scene::entity::EntityKey;

use crate::layer::{Layer, LayerId};
use crate::scales::{ColorScale, SizeScale, area_to_radius};
use crate::viewport::ViewportFit;

/// Easing applied to animated attribute changes. Linear is the baseline for
/// this engine.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Easing {
    #[default]
    Linear,
}

/// Renderable state of one bubble for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct BubbleState {
    pub key: EntityKey,
    /// Hidden bubbles stay in the keyed set so they can reappear without
    /// identity loss.
    pub hidden: bool,
    pub center: Vec2,
    pub radius: f64,
    pub color: String,
}

/// A continuing bubble with its animation endpoints.
///
/// Position and radius ease over the plan duration. Color never eases:
/// it is applied as an immediate step even mid-animation.
#[derive(Debug, Clone, PartialEq)]
pub struct BubbleUpdate {
    pub from: BubbleState,
    pub to: BubbleState,
    /// False when the hidden flag flipped (show/hide is instantaneous) or
    /// the plan has no duration.
    pub animate: bool,
}

/// The minimal diff against the previous frame's rendered set.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPlan {
    pub duration_ms: f64,
    pub easing: Easing,
    /// New keys, created without transition.
    pub enters: Vec<BubbleState>,
    /// Continuing keys.
    pub updates: Vec<BubbleUpdate>,
    /// Keys no longer present, in ascending key order. Consumers may fade
    /// them out over the plan duration.
    pub exits: Vec<EntityKey>,
    /// Complete draw order for the frame: size descending, so small
    /// bubbles end up on top.
    pub order: Vec<EntityKey>,
}

/// The entity reconciliation engine.
///
/// Holds the previous frame's rendered set and diffs each new frame against
/// it by stable key, minimizing visual churn.
#[derive(Debug, Clone, PartialEq)]
pub struct BubblesLayer {
    id: LayerId,
    current: BTreeMap<EntityKey, BubbleState>,
    draw_order: Vec<EntityKey>,
}

impl BubblesLayer {
    pub fn new(id: u64) -> Self {
        Self {
            id: LayerId(id),
            current: BTreeMap::new(),
            draw_order: Vec::new(),
        }
    }

    pub fn state(&self, key: &EntityKey) -> Option<&BubbleState> {
        self.current.get(key)
    }

    pub fn states(&self) -> impl Iterator<Item = &BubbleState> {
        self.current.values()
    }

    /// Reconciles a frame dataset into a render plan.
    ///
    /// Validity rule: an entity needs size AND lon AND lat to be shown;
    /// anything else is hidden (size zero is valid). The rule is total, with
    /// no exceptions.
    pub fn compute_frame(
        &mut self,
        dataset: &FrameDataset,
        fit: &ViewportFit,
        projection: &RawProjection,
        size_scale: &SizeScale,
        color_scale: &ColorScale,
        duration_ms: f64,
    ) -> RenderPlan {
        let mut next: BTreeMap<EntityKey, BubbleState> = BTreeMap::new();
        let mut enters = Vec::new();
        let mut updates = Vec::new();
        let mut order = Vec::new();

        for entity in dataset.sorted_for_draw() {
            let hidden = !entity.is_renderable();

            let scaled = match entity.size {
                Some(size) => size_scale.scaled(size),
                None => 0.0,
            };
            let radius = area_to_radius(scaled.max(0.0));
            let center = fit.project(
                projection,
                entity.lon.unwrap_or(0.0),
                entity.lat.unwrap_or(0.0),
            );

            let state = BubbleState {
                key: entity.key.clone(),
                hidden,
                center,
                radius,
                color: color_scale.color(entity.color.as_ref()),
            };

            match self.current.get(&entity.key) {
                Some(previous) => {
                    let animate = duration_ms > 0.0 && previous.hidden == state.hidden;
                    updates.push(BubbleUpdate {
                        from: previous.clone(),
                        to: state.clone(),
                        animate,
                    });
                }
                None => enters.push(state.clone()),
            }

            order.push(entity.key.clone());
            next.insert(entity.key.clone(), state);
        }

        let exits: Vec<EntityKey> = self
            .current
            .keys()
            .filter(|key| !next.contains_key(*key))
            .cloned()
            .collect();

        self.current = next;
        self.draw_order = order.clone();

        RenderPlan {
            duration_ms,
            easing: Easing::Linear,
            enters,
            updates,
            exits,
            order,
        }
    }

    /// Topmost visible bubble under `point`.
    ///
    /// Ordering contract:
    /// - Bubbles are drawn size descending, so the topmost hit is the one
    ///   latest in draw order.
    /// - Hidden bubbles are never hit.
    pub fn hit_test(&self, point: Vec2) -> Option<&EntityKey> {
        self.draw_order.iter().rev().find(|key| {
            self.current.get(*key).is_some_and(|state| {
                if state.hidden {
                    return false;
                }
                let d = point - state.center;
                d.x * d.x + d.y * d.y <= state.radius * state.radius
            })
        })
    }
}

impl Layer for BubblesLayer {
    fn id(&self) -> LayerId {
        self.id
    }
}
