//! Services supplied by the host application
//!
//! The chart never talks to the host directly: selection, tooltips,
//! persistence and render telemetry all go through these traits. The
//! in-memory implementations back the tests and standalone pages.

use linedot_core::{
    BuiltinLocalizer, CategoryIdFactory, ColorPalette, DefaultFormatterFactory, DefaultPalette,
    FormatterFactory, Localizer, SelectionId, SelectionIdFactory,
};
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::{cell::RefCell, rc::Rc};

/// Page coordinates of a pointer or element
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// One row of tooltip content
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TooltipItem {
    pub display_name: String,
    pub value: String,
}

impl TooltipItem {
    pub fn new(display_name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TooltipArgs {
    pub data_items: Vec<TooltipItem>,
    pub coordinates: Position,
    pub identities: Vec<SelectionId>,
}

/// Partial settings write-back, merged into one card
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistUpdate {
    pub object_name: String,
    pub properties: Map<String, Value>,
}

impl PersistUpdate {
    pub fn merge(object_name: impl Into<String>) -> Self {
        Self {
            object_name: object_name.into(),
            properties: Map::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    /// The only property the chart ever writes back
    pub fn is_stopped(stopped: bool) -> Self {
        Self::merge("misc").with("isStopped", json!(stopped))
    }
}

// ============================================================================
// SERVICE TRAITS
// ============================================================================

pub type SelectCallback = Box<dyn Fn(&[SelectionId])>;

pub trait SelectionService {
    fn selection_ids(&self) -> Vec<SelectionId>;
    /// Replace the selection, or add to it when `multi_select`
    fn select(&self, ids: &[SelectionId], multi_select: bool);
    fn clear(&self);
    fn show_context_menu(&self, id: Option<&SelectionId>, position: Position);
    /// Called whenever the selection changes outside the chart
    fn register_on_select(&self, callback: SelectCallback);
}

pub trait TooltipService {
    fn show(&self, args: TooltipArgs);
    fn hide(&self);
}

pub trait PropertyPersister {
    fn persist(&self, update: PersistUpdate);
}

pub trait EventService {
    fn rendering_started(&self);
    fn rendering_finished(&self);
    fn rendering_failed(&self, reason: &str);
}

// ============================================================================
// IN-MEMORY SERVICES
// ============================================================================

/// Selection manager kept entirely in the page
#[derive(Default)]
pub struct LocalSelectionService {
    ids: RefCell<Vec<SelectionId>>,
    listeners: RefCell<Vec<SelectCallback>>,
    menus: RefCell<Vec<(Option<SelectionId>, Position)>>,
}

impl LocalSelectionService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context menus requested so far
    pub fn context_menus(&self) -> Vec<(Option<SelectionId>, Position)> {
        self.menus.borrow().clone()
    }

    /// Simulate a selection made by another visual on the page
    pub fn select_externally(&self, ids: &[SelectionId]) {
        *self.ids.borrow_mut() = ids.to_vec();
        let current = self.ids.borrow().clone();
        for listener in self.listeners.borrow().iter() {
            listener(&current);
        }
    }
}

impl SelectionService for LocalSelectionService {
    fn selection_ids(&self) -> Vec<SelectionId> {
        self.ids.borrow().clone()
    }

    fn select(&self, ids: &[SelectionId], multi_select: bool) {
        let mut current = self.ids.borrow_mut();
        if !multi_select {
            current.clear();
        }
        for id in ids {
            if !current.contains(id) {
                current.push(id.clone());
            }
        }
    }

    fn clear(&self) {
        self.ids.borrow_mut().clear();
    }

    fn show_context_menu(&self, id: Option<&SelectionId>, position: Position) {
        self.menus.borrow_mut().push((id.cloned(), position));
    }

    fn register_on_select(&self, callback: SelectCallback) {
        self.listeners.borrow_mut().push(callback);
    }
}

/// Remembers the tooltip currently on screen
#[derive(Debug, Default)]
pub struct RecordingTooltip {
    current: RefCell<Option<TooltipArgs>>,
}

impl RecordingTooltip {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<TooltipArgs> {
        self.current.borrow().clone()
    }
}

impl TooltipService for RecordingTooltip {
    fn show(&self, args: TooltipArgs) {
        *self.current.borrow_mut() = Some(args);
    }

    fn hide(&self) {
        *self.current.borrow_mut() = None;
    }
}

#[derive(Debug, Default)]
pub struct NoopPersister;

impl PropertyPersister for NoopPersister {
    fn persist(&self, update: PersistUpdate) {
        tracing::debug!(object = %update.object_name, "persist dropped, no host");
    }
}

/// Keeps every write-back in memory
#[derive(Debug, Default)]
pub struct RecordingPersister {
    updates: RefCell<Vec<PersistUpdate>>,
}

impl RecordingPersister {
    pub fn updates(&self) -> Vec<PersistUpdate> {
        self.updates.borrow().clone()
    }
}

impl PropertyPersister for RecordingPersister {
    fn persist(&self, update: PersistUpdate) {
        self.updates.borrow_mut().push(update);
    }
}

#[derive(Debug, Default)]
pub struct NoopEvents;

impl EventService for NoopEvents {
    fn rendering_started(&self) {}
    fn rendering_finished(&self) {}
    fn rendering_failed(&self, _reason: &str) {}
}

/// Render lifecycle as seen by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderEvent {
    Started,
    Finished,
    Failed(String),
}

#[derive(Debug, Default)]
pub struct RecordingEvents {
    events: RefCell<Vec<RenderEvent>>,
}

impl RecordingEvents {
    pub fn events(&self) -> Vec<RenderEvent> {
        self.events.borrow().clone()
    }
}

impl EventService for RecordingEvents {
    fn rendering_started(&self) {
        self.events.borrow_mut().push(RenderEvent::Started);
    }

    fn rendering_finished(&self) {
        self.events.borrow_mut().push(RenderEvent::Finished);
    }

    fn rendering_failed(&self, reason: &str) {
        self.events.borrow_mut().push(RenderEvent::Failed(reason.to_string()));
    }
}

// ============================================================================
// SERVICE BUNDLE
// ============================================================================

/// Everything the visual consumes from its host
#[derive(Clone)]
pub struct HostServices {
    pub selection: Rc<dyn SelectionService>,
    pub tooltip: Rc<dyn TooltipService>,
    pub persister: Rc<dyn PropertyPersister>,
    pub events: Rc<dyn EventService>,
    pub palette: Rc<dyn ColorPalette>,
    pub localizer: Rc<dyn Localizer>,
    pub ids: Rc<dyn SelectionIdFactory>,
    pub formatters: Rc<dyn FormatterFactory>,
}

impl HostServices {
    /// In-memory services with the built-in palette, strings and formats
    pub fn local() -> Self {
        Self {
            selection: Rc::new(LocalSelectionService::new()),
            tooltip: Rc::new(RecordingTooltip::new()),
            persister: Rc::new(NoopPersister),
            events: Rc::new(NoopEvents),
            palette: Rc::new(DefaultPalette),
            localizer: Rc::new(BuiltinLocalizer),
            ids: Rc::new(CategoryIdFactory),
            formatters: Rc::new(DefaultFormatterFactory),
        }
    }

    pub fn with_selection(mut self, selection: Rc<dyn SelectionService>) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_tooltip(mut self, tooltip: Rc<dyn TooltipService>) -> Self {
        self.tooltip = tooltip;
        self
    }

    pub fn with_persister(mut self, persister: Rc<dyn PropertyPersister>) -> Self {
        self.persister = persister;
        self
    }

    pub fn with_events(mut self, events: Rc<dyn EventService>) -> Self {
        self.events = events;
        self
    }

    pub fn with_palette(mut self, palette: Rc<dyn ColorPalette>) -> Self {
        self.palette = palette;
        self
    }

    pub fn with_localizer(mut self, localizer: Rc<dyn Localizer>) -> Self {
        self.localizer = localizer;
        self
    }
}

impl Default for HostServices {
    fn default() -> Self {
        Self::local()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_selection_replace_and_add() {
        let service = LocalSelectionService::new();
        let a = SelectionId::new("Date", 0);
        let b = SelectionId::new("Date", 1);

        service.select(&[a.clone()], false);
        service.select(&[b.clone()], true);
        assert_eq!(service.selection_ids(), vec![a.clone(), b.clone()]);

        service.select(&[b.clone()], false);
        assert_eq!(service.selection_ids(), vec![b]);

        service.clear();
        assert!(service.selection_ids().is_empty());
    }

    #[test]
    fn test_external_selection_notifies_listeners() {
        let service = LocalSelectionService::new();
        let seen = Rc::new(RefCell::new(0usize));
        let counter = seen.clone();
        service.register_on_select(Box::new(move |ids| *counter.borrow_mut() += ids.len()));

        service.select_externally(&[SelectionId::new("Date", 3)]);
        assert_eq!(*seen.borrow(), 1);
    }

    #[test]
    fn test_persist_update_shape() {
        let update = PersistUpdate::is_stopped(true);
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({ "objectName": "misc", "properties": { "isStopped": true } })
        );
    }
}
