use std::collections::BTreeMap;

use foundation::math::stable_total_cmp_f64;
use foundation::time::{Time, TimeSpan};
use runtime::frame::FrameCursor;
use scene::entity::EntityKey;
use scene::selection::SelectionSet;

/// Key prefix for rolled-up geo nodes, distinguishing them from bilateral
/// flow rows.
pub const GEO_KEY_PREFIX: &str = "geo-";

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FlowSide {
    Origin,
    Destination,
}

impl FlowSide {
    pub fn opposite(self) -> Self {
        match self {
            FlowSide::Origin => FlowSide::Destination,
            FlowSide::Destination => FlowSide::Origin,
        }
    }
}

/// One row of the raw migration flow table.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowRow {
    pub origin: String,
    pub destination: String,
    pub frame: Time,
    pub measure: f64,
}

/// An aggregated (or filtered bilateral) row ready to become a bubble.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowAggregate {
    pub key: EntityKey,
    /// The geo node this bubble is positioned at.
    pub geo: String,
    pub measure: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlowTable {
    rows: Vec<FlowRow>,
}

impl FlowTable {
    pub fn new(rows: Vec<FlowRow>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Group-by-sum rollup over one side's geo column for one frame.
    ///
    /// This is what both maps show when no cross-filter driver is active:
    /// per-geo totals, sorted by measure descending (stable tie-break by
    /// geo name).
    pub fn rollup(&self, side: FlowSide, frame: Time) -> Vec<FlowAggregate> {
        let mut sums: BTreeMap<&str, f64> = BTreeMap::new();
        for row in self.rows.iter().filter(|r| r.frame == frame) {
            let geo = match side {
                FlowSide::Origin => row.origin.as_str(),
                FlowSide::Destination => row.destination.as_str(),
            };
            *sums.entry(geo).or_insert(0.0) += row.measure;
        }

        let mut out: Vec<FlowAggregate> = sums
            .into_iter()
            .map(|(geo, measure)| FlowAggregate {
                key: EntityKey::new(format!("{GEO_KEY_PREFIX}{geo}")),
                geo: geo.to_string(),
                measure,
            })
            .collect();
        sort_by_measure_desc(&mut out);
        out
    }

    /// Disaggregated bilateral rows with `fixed` pinned to `geo`, keyed by
    /// the opposite side's geo node.
    pub fn bilateral(&self, fixed: FlowSide, geo: &str, frame: Time) -> Vec<FlowAggregate> {
        let mut sums: BTreeMap<&str, f64> = BTreeMap::new();
        for row in self.rows.iter().filter(|r| r.frame == frame) {
            let (own, other) = match fixed {
                FlowSide::Origin => (row.origin.as_str(), row.destination.as_str()),
                FlowSide::Destination => (row.destination.as_str(), row.origin.as_str()),
            };
            if own != geo {
                continue;
            }
            *sums.entry(other).or_insert(0.0) += row.measure;
        }

        let mut out: Vec<FlowAggregate> = sums
            .into_iter()
            .map(|(other, measure)| FlowAggregate {
                key: EntityKey::new(other),
                geo: other.to_string(),
                measure,
            })
            .collect();
        sort_by_measure_desc(&mut out);
        out
    }

    /// Distinct frame values present in the table, ascending.
    pub fn frame_span(&self) -> Option<TimeSpan> {
        let mut iter = self.rows.iter().map(|r| r.frame.0);
        let first = iter.next()?;
        let (min, max) = iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));
        Some(TimeSpan::new(Time(min), Time(max)))
    }
}

fn sort_by_measure_desc(rows: &mut [FlowAggregate]) {
    rows.sort_by(|a, b| {
        stable_total_cmp_f64(b.measure, a.measure).then_with(|| a.geo.cmp(&b.geo))
    });
}

/// What one map of the pair should show.
#[derive(Debug, Clone, PartialEq)]
pub enum DataSpace {
    /// Per-geo rollup over this map's own direction column.
    Rollup,
    /// Bilateral flows with the opposite map's driver pinned.
    Bilateral { fixed: FlowSide, geo: String },
}

/// Cross-filter coordinator for a paired origin/destination view.
///
/// At most one entity drives the filter at a time; selecting a second
/// driver clears the first, and re-selecting the driver clears the filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrossFilter {
    driver: Option<(FlowSide, EntityKey)>,
}

impl CrossFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn driver(&self) -> Option<(FlowSide, &EntityKey)> {
        self.driver.as_ref().map(|(side, key)| (*side, key))
    }

    /// Handles an activation on one side of the pair.
    ///
    /// Both selection sets are rebuilt: single-selection discipline means
    /// the driver is the only selected entity anywhere.
    pub fn select(
        &mut self,
        side: FlowSide,
        key: EntityKey,
        origin_selected: &mut SelectionSet,
        destination_selected: &mut SelectionSet,
    ) {
        let already_set = self
            .driver
            .as_ref()
            .is_some_and(|(s, k)| *s == side && *k == key);

        origin_selected.clear();
        destination_selected.clear();

        if already_set {
            self.driver = None;
            return;
        }

        self.driver = Some((side, key.clone()));
        match side {
            FlowSide::Origin => origin_selected.insert(key),
            FlowSide::Destination => destination_selected.insert(key),
        };
    }

    /// Re-establishes the single-driver invariant from whatever state the
    /// selection sets are in.
    ///
    /// Runs on every update cycle, not just on click, so any means of
    /// mutating the sets (dialogs, host API calls) is tolerated. The
    /// current driver wins; otherwise the first selected key (origin side
    /// first, ascending key) is adopted.
    pub fn enforce_single_driver(
        &mut self,
        origin_selected: &mut SelectionSet,
        destination_selected: &mut SelectionSet,
    ) {
        let keep = self
            .driver
            .as_ref()
            .filter(|(side, key)| match side {
                FlowSide::Origin => origin_selected.contains(key),
                FlowSide::Destination => destination_selected.contains(key),
            })
            .cloned();

        let adopted = keep.or_else(|| {
            origin_selected
                .iter()
                .next()
                .map(|k| (FlowSide::Origin, k.clone()))
                .or_else(|| {
                    destination_selected
                        .iter()
                        .next()
                        .map(|k| (FlowSide::Destination, k.clone()))
                })
        });

        origin_selected.clear();
        destination_selected.clear();
        if let Some((side, key)) = &adopted {
            match side {
                FlowSide::Origin => origin_selected.insert(key.clone()),
                FlowSide::Destination => destination_selected.insert(key.clone()),
            };
        }
        self.driver = adopted;
    }

    /// What `side`'s map should show under the current driver.
    pub fn data_space(&self, side: FlowSide) -> DataSpace {
        match &self.driver {
            Some((driver_side, key)) if *driver_side != side => DataSpace::Bilateral {
                fixed: *driver_side,
                geo: key
                    .as_str()
                    .strip_prefix(GEO_KEY_PREFIX)
                    .unwrap_or(key.as_str())
                    .to_string(),
            },
            _ => DataSpace::Rollup,
        }
    }

    /// Rows for one side's map at one frame.
    pub fn frame_view(
        &self,
        table: &FlowTable,
        side: FlowSide,
        frame: Time,
    ) -> Vec<FlowAggregate> {
        match self.data_space(side) {
            DataSpace::Rollup => table.rollup(side, frame),
            DataSpace::Bilateral { fixed, geo } => table.bilateral(fixed, &geo, frame),
        }
    }
}

/// Keeps the paired maps on the same frame: the origin cursor follows the
/// destination cursor.
pub fn sync_frames(origin: &mut FrameCursor, destination: &FrameCursor) {
    if let Some(value) = destination.value() {
        origin.advance(value);
    }
}

/// Clamps a cursor into the span the table actually covers.
pub fn validate_time(cursor: &mut FrameCursor, span: TimeSpan) {
    if let Some(value) = cursor.value() {
        let clamped = span.clamp(value);
        if clamped != value {
            cursor.advance(clamped);
        }
    }
}
