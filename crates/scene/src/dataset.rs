use foundation::math::stable_total_cmp_f64;

use crate::entity::{Entity, EntityKey};

/// The complete entity collection for one tick of the time dimension.
///
/// Input order is irrelevant; draw order is recomputed deterministically.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameDataset {
    entities: Vec<Entity>,
}

impl FrameDataset {
    pub fn new(entities: Vec<Entity>) -> Self {
        Self { entities }
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn get(&self, key: &EntityKey) -> Option<&Entity> {
        self.entities.iter().find(|e| &e.key == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    /// Entities in draw order: size descending, so large bubbles are drawn
    /// first and small ones stay on top (and reachable by the pointer).
    ///
    /// Ordering contract:
    /// - Absent sizes sort after every present size.
    /// - Ties break by ascending key, so equal inputs give equal output.
    pub fn sorted_for_draw(&self) -> Vec<&Entity> {
        let mut out: Vec<&Entity> = self.entities.iter().collect();
        out.sort_by(|a, b| match (a.size, b.size) {
            (Some(sa), Some(sb)) => {
                stable_total_cmp_f64(sb, sa).then_with(|| a.key.cmp(&b.key))
            }
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.key.cmp(&b.key),
        });
        out
    }
}
