//! The render pipeline behind every host entry point
//!
//! One update runs: settings → view model → selection sync → axes →
//! animation plan → scene. Failures are reported to the host and never
//! propagate out of [`Visual::update`].

use crate::{
    host::{HostServices, PersistUpdate, Position, TooltipArgs, TooltipItem},
    selection::{SelectionEngine, annotate},
};
use linedot_charts::{AnimationDirector, AnimationPlan, AxisCalculator, ChartScene};
use linedot_core::{
    DataView, FormattingCard, Result, Settings, ViewModel, ViewModelBuilder, Viewport,
};
use serde_json::{Value, json};

pub struct Visual {
    host: HostServices,
    selection: SelectionEngine,
    director: AnimationDirector,
    settings: Settings,
    data_view: Option<DataView>,
    viewport: Viewport,
    model: Option<ViewModel>,
    plan: Option<AnimationPlan>,
    scene: Option<ChartScene>,
}

impl Visual {
    pub fn new(host: HostServices) -> Self {
        let selection = SelectionEngine::new(host.selection.clone(), host.tooltip.clone());
        Self {
            host,
            selection,
            director: AnimationDirector::new(),
            settings: Settings::default(),
            data_view: None,
            viewport: Viewport::default(),
            model: None,
            plan: None,
            scene: None,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn host(&self) -> &HostServices {
        &self.host
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn model(&self) -> Option<&ViewModel> {
        self.model.as_ref()
    }

    pub fn plan(&self) -> Option<&AnimationPlan> {
        self.plan.as_ref()
    }

    pub fn scene(&self) -> Option<&ChartScene> {
        self.scene.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.director.generation()
    }

    // ========================================================================
    // Render cycle
    // ========================================================================

    pub fn update(&mut self, view: &DataView, viewport: Viewport) {
        self.data_view = Some(view.clone());
        self.viewport = viewport;
        self.run_cycle();
    }

    /// Drop everything drawn and stop any running animation
    pub fn clear(&mut self) {
        self.director.begin_cycle();
        self.settings.misc.is_animated = false;
        self.model = None;
        self.plan = None;
        self.scene = None;
        tracing::info!("chart cleared");
    }

    fn run_cycle(&mut self) {
        self.host.events.rendering_started();
        self.director.begin_cycle();

        match self.render() {
            Ok(true) => self.host.events.rendering_finished(),
            Ok(false) => {
                self.clear();
                self.host.events.rendering_finished();
            }
            Err(err) => {
                tracing::error!(%err, "render failed");
                self.host.events.rendering_failed(&err.to_string());
            }
        }
    }

    /// `Ok(false)` when the data view has nothing to draw
    fn render(&mut self) -> Result<bool> {
        let Some(view) = self.data_view.as_ref() else {
            return Ok(false);
        };

        self.settings = Settings::from_data_view(view, &*self.host.palette, &*self.host.localizer);
        let model =
            ViewModelBuilder::build(view, &self.settings, &*self.host.ids, &*self.host.formatters)?;

        let Some(mut model) = model else {
            tracing::debug!("data view has no date or value column");
            return Ok(false);
        };

        self.selection.sync(&mut model.dot_points);

        let axes = AxisCalculator::compute(&model, &self.settings, self.viewport);
        let plan = self.director.plan(&model, &self.settings, &axes);
        let opacities = annotate(&model.dot_points);
        let scene = ChartScene::compose(&model, &self.settings, axes, &plan.frame_at(0.0), &opacities);

        tracing::debug!(
            generation = plan.generation,
            state = ?plan.state,
            points = model.len(),
            "scene composed"
        );

        self.model = Some(model);
        self.plan = Some(plan);
        self.scene = Some(scene);
        Ok(true)
    }

    /// Sample the live plan; returns true once nothing moves any more
    pub fn advance(&mut self, generation: u64, ms: f64) -> bool {
        if !self.director.is_live(generation) {
            return true;
        }
        let (Some(plan), Some(scene)) = (self.plan.as_ref(), self.scene.as_mut()) else {
            return true;
        };

        let frame = plan.frame_at(ms);
        scene.apply_frame(&frame);
        frame.finished
    }

    // ========================================================================
    // Playback
    // ========================================================================

    /// Flip play/pause, persist it and restart the reveal from scratch
    pub fn toggle_play(&mut self) {
        let stopped = !self.settings.misc.is_stopped;
        self.host.persister.persist(PersistUpdate::is_stopped(stopped));
        tracing::info!(stopped, "playback toggled");

        match self.data_view.as_mut() {
            Some(view) => {
                set_stopped(view, stopped);
                self.run_cycle();
            }
            None => self.settings.misc.is_stopped = stopped,
        }
    }

    // ========================================================================
    // Host queries
    // ========================================================================

    /// Category and value of one point, formatted for the tooltip
    pub fn tooltip_items(&self, index: usize) -> Vec<TooltipItem> {
        let Some(model) = self.model.as_ref() else {
            return Vec::new();
        };
        let (Some(point), Some(cell)) = (model.dot_points.get(index), model.category_cell(index))
        else {
            return Vec::new();
        };

        vec![
            TooltipItem::new(
                model.column_names.category.clone(),
                model.date_column_formatter.format(&cell),
            ),
            TooltipItem::new(
                model.column_names.values.clone(),
                model.data_value_formatter.format_number(point.value),
            ),
        ]
    }

    pub fn tooltip_args(&self, index: usize, coordinates: Position) -> Option<TooltipArgs> {
        let items = self.tooltip_items(index);
        if items.is_empty() {
            return None;
        }
        let identity = self.model.as_ref()?.dot_points.get(index)?.identity.clone();
        Some(TooltipArgs {
            data_items: items,
            coordinates,
            identities: vec![identity],
        })
    }

    pub fn formatting_model(&self) -> Vec<FormattingCard> {
        self.settings.formatting_model()
    }

    // ========================================================================
    // Interaction
    // ========================================================================

    pub fn click(&mut self, index: usize, multi_select: bool) {
        if let Some(model) = self.model.as_mut() {
            self.selection.click(&mut model.dot_points, index, multi_select);
        }
        self.refresh_opacities();
    }

    pub fn clear_selection(&mut self) {
        if let Some(model) = self.model.as_mut() {
            self.selection.clear(&mut model.dot_points);
        }
        self.refresh_opacities();
    }

    /// Re-read the host selection, e.g. after another visual changed it
    pub fn sync_selection(&mut self) {
        if let Some(model) = self.model.as_mut() {
            self.selection.sync(&mut model.dot_points);
        }
        self.refresh_opacities();
    }

    pub fn context_menu(&self, index: Option<usize>, position: Position) {
        let point = index.and_then(|i| self.model.as_ref()?.dot_points.get(i));
        self.selection.context_menu(point, position);
    }

    pub fn keyboard(&mut self, index: usize, key: &str, multi_select: bool, bounds: Position) {
        let args = self.tooltip_args(index, bounds);
        if let Some(model) = self.model.as_mut() {
            self.selection
                .keyboard(&mut model.dot_points, index, key, multi_select, |_| args);
        }
        self.refresh_opacities();
    }

    /// Show the tooltip for a hovered dot, or hide it
    pub fn hover(&self, target: Option<(usize, Position)>) {
        match target.and_then(|(index, at)| self.tooltip_args(index, at)) {
            Some(args) => self.host.tooltip.show(args),
            None => self.host.tooltip.hide(),
        }
    }

    fn refresh_opacities(&mut self) {
        let (Some(model), Some(scene)) = (self.model.as_ref(), self.scene.as_mut()) else {
            return;
        };
        let selected: Vec<bool> = model.dot_points.iter().map(|p| p.selected).collect();
        scene.apply_opacities(&annotate(&model.dot_points), &selected);
    }
}

/// Write `misc.isStopped` into the objects the next cycle reads
fn set_stopped(view: &mut DataView, stopped: bool) {
    let objects = view.metadata.objects.get_or_insert_with(|| json!({}));
    if !objects.is_object() {
        *objects = json!({});
    }
    if let Value::Object(cards) = objects {
        let misc = cards.entry("misc").or_insert_with(|| json!({}));
        if !misc.is_object() {
            *misc = json!({});
        }
        if let Value::Object(fields) = misc {
            fields.insert("isStopped".to_string(), json!(stopped));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linedot_core::{ColumnMetadata, DataColumn, PrimitiveValue, Role};

    fn view(objects: Value) -> DataView {
        DataView::categorical(
            vec![DataColumn::new(
                ColumnMetadata::new("Step", Role::Date),
                vec![PrimitiveValue::Number(1.0), PrimitiveValue::Number(2.0)],
            )],
            vec![DataColumn::new(
                ColumnMetadata::new("Value", Role::Values),
                vec![PrimitiveValue::Number(10.0), PrimitiveValue::Number(20.0)],
            )],
        )
        .with_objects(objects)
    }

    #[test]
    fn test_set_stopped_creates_card() {
        let mut data = DataView::default();
        set_stopped(&mut data, false);
        assert_eq!(data.metadata.objects, Some(json!({ "misc": { "isStopped": false } })));

        let mut data = view(json!({ "misc": { "duration": 3 } }));
        set_stopped(&mut data, true);
        assert_eq!(
            data.metadata.objects,
            Some(json!({ "misc": { "duration": 3, "isStopped": true } }))
        );
    }

    #[test]
    fn test_update_builds_scene() {
        let mut visual = Visual::new(HostServices::local());
        visual.update(&view(json!({ "misc": { "isAnimated": false } })), Viewport::new(500.0, 300.0));

        let scene = visual.scene().unwrap();
        assert_eq!(scene.dots.len(), 2);
        assert!(scene.line.is_some());
        assert_eq!(visual.generation(), 1);
    }

    #[test]
    fn test_stale_generation_is_ignored() {
        let mut visual = Visual::new(HostServices::local());
        let data = view(json!({ "misc": { "isStopped": false, "duration": 1 } }));
        visual.update(&data, Viewport::new(500.0, 300.0));
        let first = visual.generation();
        visual.update(&data, Viewport::new(500.0, 300.0));

        assert!(visual.advance(first, 10_000.0));
        assert!(!visual.advance(visual.generation(), 100.0));
    }

    #[test]
    fn test_selection_dims_other_dots() {
        let mut visual = Visual::new(HostServices::local());
        visual.update(&view(json!({ "misc": { "isAnimated": false } })), Viewport::new(500.0, 300.0));

        visual.click(0, false);
        let opacities: Vec<f64> = visual.scene().unwrap().dots.iter().map(|d| d.opacity).collect();
        assert_eq!(opacities, vec![1.0, 0.6]);

        visual.clear_selection();
        let opacities: Vec<f64> = visual.scene().unwrap().dots.iter().map(|d| d.opacity).collect();
        assert_eq!(opacities, vec![1.0, 1.0]);
    }

    #[test]
    fn test_failed_render_still_adopts_settings() {
        let persister = std::rc::Rc::new(crate::RecordingPersister::default());
        let mut visual = Visual::new(HostServices::local().with_persister(persister.clone()));
        visual.update(&view(json!({})), Viewport::new(500.0, 300.0));
        assert!(visual.settings().misc.is_stopped);

        let mut broken = view(json!({ "misc": { "isStopped": false } }));
        let date = &mut broken.categorical.as_mut().unwrap().categories[0];
        date.source.value_type = Some(linedot_core::ValueType::DateTime);
        date.values[1] = PrimitiveValue::text("later");
        visual.update(&broken, Viewport::new(500.0, 300.0));
        assert!(!visual.settings().misc.is_stopped);

        visual.toggle_play();
        assert_eq!(persister.updates()[0].properties["isStopped"], json!(true));
    }
}
