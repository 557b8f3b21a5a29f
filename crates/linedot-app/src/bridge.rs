//! Host services backed by a plain JavaScript object
//!
//! The host passes an object whose optional methods receive JSON strings:
//! `select(idsJson, multi)`, `clear()`, `showContextMenu(idJson, x, y)`,
//! `showTooltip(argsJson)`, `hideTooltip()`, `persist(updateJson)`,
//! `renderingStarted()`, `renderingFinished()`, `renderingFailed(reason)`.
//! Missing methods are skipped. Callbacks run synchronously, so the host
//! must not call back into the handle from inside one.

use js_sys::{Array, Function, Object, Reflect};
use linedot_core::{
    BuiltinLocalizer, ColorPalette, DefaultPalette, HighContrastPalette, Localizer, SelectionId,
};
use linedot_state::{
    EventService, PersistUpdate, Position, PropertyPersister, SelectCallback, SelectionService,
    TooltipArgs, TooltipService,
};
use serde::{Deserialize, Serialize};
use std::{cell::RefCell, collections::HashMap, rc::Rc};
use wasm_bindgen::{JsCast, JsValue};

// ============================================================================
// OPTIONS
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HostOptions {
    pub high_contrast: Option<HighContrastOptions>,
    /// Localized strings keyed by resource name
    pub strings: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HighContrastOptions {
    pub foreground: String,
    pub background: String,
}

impl HostOptions {
    pub fn from_json(json: Option<&str>) -> Result<Self, serde_json::Error> {
        match json.map(str::trim).filter(|s| !s.is_empty()) {
            Some(json) => serde_json::from_str(json),
            None => Ok(Self::default()),
        }
    }

    pub fn palette(&self) -> Rc<dyn ColorPalette> {
        match &self.high_contrast {
            Some(hc) => Rc::new(HighContrastPalette {
                foreground: hc.foreground.clone(),
                background: hc.background.clone(),
            }),
            None => Rc::new(DefaultPalette),
        }
    }

    pub fn localizer(&self) -> Rc<dyn Localizer> {
        Rc::new(TableLocalizer {
            strings: self.strings.clone(),
        })
    }
}

/// Host-supplied strings with the built-in English fallback
#[derive(Debug, Clone, Default)]
pub struct TableLocalizer {
    strings: HashMap<String, String>,
}

impl Localizer for TableLocalizer {
    fn display_name(&self, key: &str) -> String {
        self.strings
            .get(key)
            .cloned()
            .unwrap_or_else(|| BuiltinLocalizer.display_name(key))
    }
}

/// Selection ids sent by the host as a JSON array
pub fn parse_selection_ids(json: &str) -> Result<Vec<SelectionId>, serde_json::Error> {
    serde_json::from_str(json)
}

// ============================================================================
// JS OBJECT
// ============================================================================

#[derive(Clone)]
pub struct JsHost {
    object: Object,
}

impl JsHost {
    pub fn new(object: Object) -> Self {
        Self { object }
    }

    fn call(&self, method: &str, args: &[JsValue]) {
        let Ok(value) = Reflect::get(&self.object, &JsValue::from_str(method)) else {
            return;
        };
        let Ok(function) = value.dyn_into::<Function>() else {
            return;
        };
        let args: Array = args.iter().collect();
        if let Err(err) = function.apply(&self.object, &args) {
            tracing::warn!(method, ?err, "host callback threw");
        }
    }

    fn call_json<T: Serialize>(&self, method: &str, value: &T, extra: &[JsValue]) {
        match serde_json::to_string(value) {
            Ok(json) => {
                let mut args = vec![JsValue::from_str(&json)];
                args.extend_from_slice(extra);
                self.call(method, &args);
            }
            Err(err) => tracing::warn!(method, %err, "could not encode host payload"),
        }
    }
}

// ============================================================================
// SERVICES
// ============================================================================

/// Keeps the selection locally and mirrors every change to the host
pub struct JsSelectionService {
    host: JsHost,
    ids: RefCell<Vec<SelectionId>>,
    listeners: RefCell<Vec<SelectCallback>>,
}

impl JsSelectionService {
    pub fn new(host: JsHost) -> Self {
        Self {
            host,
            ids: RefCell::new(Vec::new()),
            listeners: RefCell::new(Vec::new()),
        }
    }

    /// Selection changed by the host; notifies the registered listeners
    pub fn apply_external(&self, ids: Vec<SelectionId>) {
        *self.ids.borrow_mut() = ids;
        let current = self.ids.borrow().clone();
        for listener in self.listeners.borrow().iter() {
            listener(&current);
        }
    }
}

impl SelectionService for JsSelectionService {
    fn selection_ids(&self) -> Vec<SelectionId> {
        self.ids.borrow().clone()
    }

    fn select(&self, ids: &[SelectionId], multi_select: bool) {
        {
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
        self.host.call_json("select", &ids, &[JsValue::from_bool(multi_select)]);
    }

    fn clear(&self) {
        self.ids.borrow_mut().clear();
        self.host.call("clear", &[]);
    }

    fn show_context_menu(&self, id: Option<&SelectionId>, position: Position) {
        self.host.call_json(
            "showContextMenu",
            &id,
            &[JsValue::from_f64(position.x), JsValue::from_f64(position.y)],
        );
    }

    fn register_on_select(&self, callback: SelectCallback) {
        self.listeners.borrow_mut().push(callback);
    }
}

pub struct JsTooltipService(pub JsHost);

impl TooltipService for JsTooltipService {
    fn show(&self, args: TooltipArgs) {
        self.0.call_json("showTooltip", &args, &[]);
    }

    fn hide(&self) {
        self.0.call("hideTooltip", &[]);
    }
}

pub struct JsPersister(pub JsHost);

impl PropertyPersister for JsPersister {
    fn persist(&self, update: PersistUpdate) {
        self.0.call_json("persist", &update, &[]);
    }
}

pub struct JsEvents(pub JsHost);

impl EventService for JsEvents {
    fn rendering_started(&self) {
        self.0.call("renderingStarted", &[]);
    }

    fn rendering_finished(&self) {
        self.0.call("renderingFinished", &[]);
    }

    fn rendering_failed(&self, reason: &str) {
        self.0.call("renderingFailed", &[JsValue::from_str(reason)]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_default_when_absent() {
        assert_eq!(HostOptions::from_json(None).unwrap(), HostOptions::default());
        assert_eq!(HostOptions::from_json(Some("  ")).unwrap(), HostOptions::default());
        assert!(!HostOptions::default().palette().is_high_contrast());
    }

    #[test]
    fn test_options_parse_high_contrast_and_strings() {
        let options = HostOptions::from_json(Some(
            r##"{
                "highContrast": { "foreground": "#ffff00", "background": "#000000" },
                "strings": { "Visual_CounterTitle": "Zähler: " }
            }"##,
        ))
        .unwrap();

        let palette = options.palette();
        assert!(palette.is_high_contrast());
        assert_eq!(palette.foreground(), "#ffff00");

        let localizer = options.localizer();
        assert_eq!(localizer.display_name("Visual_CounterTitle"), "Zähler: ");
        assert_eq!(localizer.display_name("Visual_Line"), "Visual_Line");
    }

    #[test]
    fn test_selection_ids_from_host_json() {
        let ids = vec![SelectionId::new("Date", 0), SelectionId::new("Date", 3)];
        let json = serde_json::to_string(&ids).unwrap();
        assert_eq!(parse_selection_ids(&json).unwrap(), ids);
        assert!(parse_selection_ids("[]").unwrap().is_empty());
        assert!(parse_selection_ids("{}").is_err());
    }

    #[test]
    fn test_malformed_options_are_an_error() {
        assert!(HostOptions::from_json(Some("{ nope")).is_err());
    }
}
