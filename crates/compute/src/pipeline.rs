use std::collections::BTreeMap;

use assets::store::{AssetStore, FetchDecision};
use formats::settings::ChartSettings;
use layers::bubbles::{BubblesLayer, RenderPlan};
use layers::map::{MapLayer, MapLayerSnapshot};
use layers::profiles::LayoutProfile;
use layers::scales::{ColorScale, RadiusLimits, SizeScale};
use layers::symbology::opacity_for;
use layers::viewport::{ViewportConfig, ViewportFit};
use runtime::event_bus::EventBus;
use runtime::frame::FrameCursor;
use runtime::scheduler::{CycleSummary, Pass, PassOutcome, Scheduler};
use scene::dataset::FrameDataset;
use scene::entity::EntityKey;
use scene::selection::SelectionSet;

/// Everything one chart instance owns.
///
/// Shared mutable state lives here exclusively; the draw cycle mutates it
/// in a fixed order (resize, rescale, reconcile, style) and nothing else
/// touches the derived fields.
pub struct ChartState {
    pub settings: ChartSettings,
    pub profile: LayoutProfile,
    pub container_width: f64,
    pub container_height: f64,
    /// Normalized `[0, 1]` sub-range narrowing the radius range.
    pub extent: [f64; 2],
    pub cursor: FrameCursor,
    pub dataset: FrameDataset,
    pub selected: SelectionSet,
    pub highlighted: SelectionSet,
    pub size_scale: SizeScale,
    pub color_scale: ColorScale,
    pub bubbles: BubblesLayer,
    map: Option<MapLayerSnapshot>,
    fit: Option<ViewportFit>,
    plan: Option<RenderPlan>,
    radius_limits: Option<RadiusLimits>,
    opacities: BTreeMap<EntityKey, f64>,
}

impl ChartState {
    pub fn new(
        settings: ChartSettings,
        profile: LayoutProfile,
        size_scale: SizeScale,
        color_scale: ColorScale,
    ) -> Self {
        Self {
            settings,
            profile,
            container_width: 0.0,
            container_height: 0.0,
            extent: [0.0, 1.0],
            cursor: FrameCursor::default(),
            dataset: FrameDataset::default(),
            selected: SelectionSet::new(),
            highlighted: SelectionSet::new(),
            size_scale,
            color_scale,
            bubbles: BubblesLayer::new(1),
            map: None,
            fit: None,
            plan: None,
            radius_limits: None,
            opacities: BTreeMap::new(),
        }
    }

    pub fn map(&self) -> Option<&MapLayerSnapshot> {
        self.map.as_ref()
    }

    /// The current fit. Always recomputed by the rescale pass before it is
    /// applied; never read across a resize.
    pub fn fit(&self) -> Option<&ViewportFit> {
        self.fit.as_ref()
    }

    pub fn plan(&self) -> Option<&RenderPlan> {
        self.plan.as_ref()
    }

    pub fn radius_limits(&self) -> Option<RadiusLimits> {
        self.radius_limits
    }

    /// Per-key opacity computed by the style pass.
    pub fn opacities(&self) -> &BTreeMap<EntityKey, f64> {
        &self.opacities
    }
}

/// Outcome of one topology preload poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreloadStatus {
    /// The host must fetch this path and report back through the store.
    NeedsFetch(String),
    Pending,
    Ready,
    /// No topology path configured; the chart cannot draw a base map.
    Missing,
    /// The fetch or decode failed. Sticky: the chart stays blank.
    Failed,
}

/// Polls the topology asset and builds the base map once it is resident.
///
/// The map is built once and kept until the settings change; repeated calls
/// short-circuit.
pub fn preload(
    state: &mut ChartState,
    store: &mut AssetStore,
    bus: &mut EventBus,
) -> PreloadStatus {
    if state.map.is_some() {
        return PreloadStatus::Ready;
    }

    let Some(path) = state.settings.map.topology.path.clone() else {
        bus.warn("preload", "map topology path is not configured");
        return PreloadStatus::Missing;
    };

    match store.request(&path) {
        FetchDecision::Start => PreloadStatus::NeedsFetch(path),
        FetchDecision::Pending => PreloadStatus::Pending,
        FetchDecision::Failed(message) => {
            bus.warn("preload", format!("map asset {path} failed: {message}"));
            PreloadStatus::Failed
        }
        FetchDecision::Resident(doc) => match MapLayer::new(1).build(doc, &state.settings.map) {
            Ok(snapshot) => {
                state.map = Some(snapshot);
                PreloadStatus::Ready
            }
            Err(err) => {
                bus.warn("preload", err.to_string());
                PreloadStatus::Failed
            }
        },
    }
}

/// The chart draw cycle.
///
/// Encodes the ordering invariant as scheduler priorities: layout is
/// resolved before the map is rescaled, rescale precedes reconciliation,
/// reconciliation precedes opacity styling. A failed pass aborts the cycle
/// with a warning and the next trigger retries from the top.
pub struct ChartPipeline {
    scheduler: Scheduler<ChartState>,
}

impl Default for ChartPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl ChartPipeline {
    pub fn new() -> Self {
        let mut scheduler = Scheduler::new();

        scheduler.add_pass(Pass::new("resize", 0, |state: &mut ChartState, bus| {
            if state.container_width > 0.0 && state.container_height > 0.0 {
                PassOutcome::Continue
            } else {
                bus.warn("resize", "container is too little or has no size");
                PassOutcome::Abort
            }
        }));

        scheduler.add_pass(Pass::new("rescale", 1, |state: &mut ChartState, bus| {
            let Some(map) = state.map.as_ref() else {
                bus.warn("rescale", "bubble map is missing the map data");
                return PassOutcome::Abort;
            };

            let config = ViewportConfig {
                width: state.container_width,
                height: state.container_height,
                margin: state.profile.constants().margin,
                offset: state.settings.map.offset,
                scale: state.settings.map.scale,
                preserve_aspect_ratio: state.settings.map.preserve_aspect_ratio,
            };

            match ViewportFit::fit(map.bounds, &config) {
                Ok(fit) => {
                    state.fit = Some(fit);
                    PassOutcome::Continue
                }
                Err(err) => {
                    bus.warn("rescale", err.to_string());
                    state.fit = None;
                    PassOutcome::Abort
                }
            }
        }));

        scheduler.add_pass(Pass::new("reconcile", 2, |state: &mut ChartState, _bus| {
            let constants = state.profile.constants();
            state.radius_limits = Some(state.size_scale.update_size_limits(
                &constants,
                state.container_width,
                state.container_height,
                state.extent,
            ));

            let (fit, projection) = match (state.fit.as_ref(), state.map.as_ref()) {
                (Some(fit), Some(map)) => (fit, &map.projection),
                // The rescale pass aborts before this can happen.
                _ => return PassOutcome::Abort,
            };

            state.plan = Some(state.bubbles.compute_frame(
                &state.dataset,
                fit,
                projection,
                &state.size_scale,
                &state.color_scale,
                state.cursor.duration_ms(),
            ));
            PassOutcome::Continue
        }));

        scheduler.add_pass(Pass::new("style", 3, |state: &mut ChartState, _bus| {
            state.opacities = state
                .bubbles
                .states()
                .map(|bubble| {
                    (
                        bubble.key.clone(),
                        opacity_for(
                            &bubble.key,
                            &state.highlighted,
                            &state.selected,
                            &state.settings.opacity,
                        ),
                    )
                })
                .collect();
            PassOutcome::Continue
        }));

        Self { scheduler }
    }

    pub fn draw(&mut self, state: &mut ChartState, bus: &mut EventBus) -> CycleSummary {
        self.scheduler.run_cycle(state, bus)
    }
}

#[cfg(test)]
mod tests {
    use super::{ChartPipeline, ChartState, PreloadStatus, preload};
    use assets::store::AssetStore;
    use foundation::time::Time;
    use formats::settings::ChartSettings;
    use layers::profiles::LayoutProfile;
    use layers::scales::{ColorScale, ScaleKind, SizeScale};
    use runtime::event_bus::EventBus;
    use scene::dataset::FrameDataset;
    use scene::entity::Entity;
    use std::collections::BTreeMap;

    const WORLD: &str = r#"{
        "objects": {
            "land": {
                "type": "FeatureCollection",
                "features": [{
                    "type": "Feature",
                    "geometry": {
                        "type": "Polygon",
                        "coordinates": [[[ -170.0, -56.0 ], [ 170.0, -56.0 ], [ 170.0, 78.0 ], [ -170.0, 78.0 ]]]
                    }
                }]
            },
            "countries": { "type": "FeatureCollection", "features": [] }
        }
    }"#;

    fn state() -> ChartState {
        let mut settings = ChartSettings::default();
        settings.map.topology.path = Some("assets/world-50m.json".to_string());
        ChartState::new(
            settings,
            LayoutProfile::Medium,
            SizeScale::new(ScaleKind::Linear, vec![0.0, 100.0]),
            ColorScale::Ordinal(BTreeMap::new()),
        )
    }

    fn loaded_state() -> ChartState {
        let mut state = state();
        let mut store = AssetStore::new();
        let mut bus = EventBus::new();

        match preload(&mut state, &mut store, &mut bus) {
            PreloadStatus::NeedsFetch(path) => {
                store.fulfill(&path, WORLD).expect("decode");
            }
            other => panic!("expected fetch, got {other:?}"),
        }
        assert_eq!(preload(&mut state, &mut store, &mut bus), PreloadStatus::Ready);
        state
    }

    fn entity(key: &str, size: f64, lon: f64, lat: f64) -> Entity {
        let mut e = Entity::new(key);
        e.size = Some(size);
        e.lon = Some(lon);
        e.lat = Some(lat);
        e
    }

    #[test]
    fn full_draw_cycle_produces_a_plan_and_styles() {
        let mut state = loaded_state();
        state.container_width = 800.0;
        state.container_height = 400.0;
        state.dataset = FrameDataset::new(vec![
            entity("swe", 10.0, 18.0, 59.3),
            entity("usa", 90.0, -98.0, 39.5),
        ]);
        state.cursor.advance(Time(2000.0));
        state.selected.insert("swe".into());

        let mut pipeline = ChartPipeline::new();
        let mut bus = EventBus::new();
        let summary = pipeline.draw(&mut state, &mut bus);

        assert!(!summary.aborted);
        assert_eq!(summary.ran_passes, 4);

        let plan = state.plan().expect("plan");
        assert_eq!(plan.enters.len(), 2);
        assert!(plan.enters.iter().all(|b| !b.hidden));
        assert!(state.fit().is_some());
        assert!(state.radius_limits().is_some());

        // Selected entity at regular opacity, bystander dimmed.
        let swe = scene::entity::EntityKey::new("swe");
        let usa = scene::entity::EntityKey::new("usa");
        let opacities = state.opacities();
        assert_eq!(opacities[&swe], state.settings.opacity.regular);
        assert_eq!(opacities[&usa], state.settings.opacity.select_dim);
    }

    #[test]
    fn zero_container_aborts_with_a_warning_and_recovers() {
        let mut state = loaded_state();
        state.dataset = FrameDataset::new(vec![entity("swe", 10.0, 18.0, 59.3)]);

        let mut pipeline = ChartPipeline::new();
        let mut bus = EventBus::new();
        let summary = pipeline.draw(&mut state, &mut bus);

        assert!(summary.aborted);
        assert!(state.plan().is_none());
        assert_eq!(bus.warnings().count(), 1);

        // Self-healing: the next resize triggers a full cycle.
        state.container_width = 800.0;
        state.container_height = 400.0;
        let summary = pipeline.draw(&mut state, &mut bus);
        assert!(!summary.aborted);
        assert!(state.plan().is_some());
    }

    #[test]
    fn missing_map_aborts_after_resize() {
        let mut state = state();
        state.container_width = 800.0;
        state.container_height = 400.0;

        let mut pipeline = ChartPipeline::new();
        let mut bus = EventBus::new();
        let summary = pipeline.draw(&mut state, &mut bus);

        assert!(summary.aborted);
        assert_eq!(summary.ran_passes, 2);
        assert!(bus.warnings().any(|e| e.message.contains("map data")));
    }

    #[test]
    fn unknown_projection_keeps_the_chart_blank() {
        let mut state = state();
        state.settings.map.projection = "geoPatterson".to_string();

        let mut store = AssetStore::new();
        let mut bus = EventBus::new();
        if let PreloadStatus::NeedsFetch(path) = preload(&mut state, &mut store, &mut bus) {
            store.fulfill(&path, WORLD).expect("decode");
        }

        assert_eq!(
            preload(&mut state, &mut store, &mut bus),
            PreloadStatus::Failed
        );
        assert!(bus.warnings().any(|e| e.message.contains("geoPatterson")));
        assert!(state.map().is_none());
    }

    #[test]
    fn missing_topology_path_is_a_configuration_warning() {
        let mut state = ChartState::new(
            ChartSettings::default(),
            LayoutProfile::Medium,
            SizeScale::new(ScaleKind::Linear, vec![0.0, 100.0]),
            ColorScale::Ordinal(BTreeMap::new()),
        );
        let mut store = AssetStore::new();
        let mut bus = EventBus::new();

        assert_eq!(
            preload(&mut state, &mut store, &mut bus),
            PreloadStatus::Missing
        );
        assert_eq!(bus.warnings().count(), 1);
    }

    #[test]
    fn failed_fetch_is_sticky() {
        let mut state = state();
        let mut store = AssetStore::new();
        let mut bus = EventBus::new();

        if let PreloadStatus::NeedsFetch(path) = preload(&mut state, &mut store, &mut bus) {
            store.fail(&path, "404 not found");
        }

        assert_eq!(
            preload(&mut state, &mut store, &mut bus),
            PreloadStatus::Failed
        );
        assert_eq!(
            preload(&mut state, &mut store, &mut bus),
            PreloadStatus::Failed
        );
    }
}
