//! # linedot-state
//!
//! Reactive state for the line-dot visual.
//! The [`Visual`] pipeline does the work; [`VisualStore`] mirrors its output
//! into Leptos signals so the chart re-renders only what changed.

pub mod host;
pub mod selection;
pub mod visual;

pub use host::*;
pub use selection::*;
pub use visual::*;

use linedot_charts::{AnimationPlan, ChartScene};
use linedot_core::{DataView, FormattingCard, Settings, Viewport};
use leptos::prelude::*;

// ============================================================================
// VISUAL STORE
// ============================================================================

/// Reactive handle to one visual instance
#[derive(Clone, Copy)]
pub struct VisualStore {
    /// The pipeline itself; holds host services, so it stays on this thread
    visual: StoredValue<Visual, LocalStorage>,
    /// Scene currently on screen
    pub scene: RwSignal<Option<ChartScene>>,
    /// Tween plan of the live generation
    pub plan: RwSignal<Option<AnimationPlan>>,
    /// Settings resolved by the last update
    pub settings: RwSignal<Settings>,
    pub viewport: RwSignal<Viewport>,
}

impl VisualStore {
    pub fn new(host: HostServices) -> Self {
        let store = Self {
            visual: StoredValue::new_local(Visual::new(host.clone())),
            scene: RwSignal::new(None),
            plan: RwSignal::new(None),
            settings: RwSignal::new(Settings::default()),
            viewport: RwSignal::new(Viewport::default()),
        };

        host.selection.register_on_select(Box::new(move |_| {
            store.visual.update_value(Visual::sync_selection);
            store.publish_scene();
        }));

        store
    }

    // ========================================================================
    // Pipeline
    // ========================================================================

    pub fn update(&self, view: &DataView, viewport: Viewport) {
        self.viewport.set(viewport);
        self.visual.update_value(|v| v.update(view, viewport));
        self.publish();
    }

    pub fn clear(&self) {
        self.visual.update_value(Visual::clear);
        self.publish();
    }

    pub fn toggle_play(&self) {
        self.visual.update_value(Visual::toggle_play);
        self.publish();
    }

    /// Move the live animation to `ms`; true when it has settled
    pub fn advance(&self, generation: u64, ms: f64) -> bool {
        let finished = self
            .visual
            .try_update_value(|v| v.advance(generation, ms))
            .unwrap_or(true);
        self.publish_scene();
        finished
    }

    pub fn generation(&self) -> u64 {
        self.visual.with_value(Visual::generation)
    }

    pub fn tooltip_items(&self, index: usize) -> Vec<TooltipItem> {
        self.visual.with_value(|v| v.tooltip_items(index))
    }

    pub fn formatting_model(&self) -> Vec<FormattingCard> {
        self.visual.with_value(Visual::formatting_model)
    }

    // ========================================================================
    // Interaction
    // ========================================================================

    pub fn click(&self, index: usize, multi_select: bool) {
        self.visual.update_value(|v| v.click(index, multi_select));
        self.publish_scene();
    }

    pub fn clear_selection(&self) {
        self.visual.update_value(Visual::clear_selection);
        self.publish_scene();
    }

    pub fn context_menu(&self, index: Option<usize>, position: Position) {
        self.visual.with_value(|v| v.context_menu(index, position));
    }

    pub fn keyboard(&self, index: usize, key: &str, multi_select: bool, bounds: Position) {
        self.visual
            .update_value(|v| v.keyboard(index, key, multi_select, bounds));
        self.publish_scene();
    }

    pub fn hover(&self, target: Option<(usize, Position)>) {
        self.visual.with_value(|v| v.hover(target));
    }

    // ========================================================================
    // Signal sync
    // ========================================================================

    fn publish(&self) {
        let (plan, settings) = self
            .visual
            .with_value(|v| (v.plan().cloned(), v.settings().clone()));
        self.plan.set(plan);
        self.settings.set(settings);
        self.publish_scene();
    }

    fn publish_scene(&self) {
        let scene = self.visual.with_value(|v| v.scene().cloned());
        self.scene.set(scene);
    }
}

// ============================================================================
// CONTEXT HELPERS
// ============================================================================

/// Provide a visual store to the component tree
pub fn provide_visual_store(host: HostServices) -> VisualStore {
    let store = VisualStore::new(host);
    provide_context(store);
    store
}

/// Use the visual store from context
pub fn use_visual_store() -> VisualStore {
    expect_context::<VisualStore>()
}
