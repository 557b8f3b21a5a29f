//! # linedot-app
//!
//! WASM entry point. Installs the panic hook and the `tracing` subscriber,
//! then exposes [`LineDotVisualHandle`] so a JavaScript host can mount the
//! chart and drive it with JSON payloads.

pub mod bridge;

use bridge::{
    HostOptions, JsEvents, JsHost, JsPersister, JsSelectionService, JsTooltipService,
    parse_selection_ids,
};
use leptos::prelude::*;
use linedot_components::LineDotVisual;
use linedot_core::{DataView, Viewport};
use linedot_state::{EventService, HostServices, Position, VisualStore, provide_visual_store};
use std::{cell::Cell, rc::Rc};
use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    tracing_wasm::set_as_global_default();
    tracing::info!("line-dot visual loaded");
}

fn to_js(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// One mounted visual
#[wasm_bindgen]
pub struct LineDotVisualHandle {
    store: VisualStore,
    selection: Rc<JsSelectionService>,
    events: Rc<JsEvents>,
}

#[wasm_bindgen]
impl LineDotVisualHandle {
    /// Mount into `element`; `host` carries the callbacks listed in [`bridge`]
    #[wasm_bindgen(constructor)]
    pub fn new(
        element: web_sys::HtmlElement,
        host: js_sys::Object,
        options_json: Option<String>,
    ) -> Result<LineDotVisualHandle, JsValue> {
        let options = HostOptions::from_json(options_json.as_deref()).map_err(to_js)?;
        let host = JsHost::new(host);

        let selection = Rc::new(JsSelectionService::new(host.clone()));
        let events = Rc::new(JsEvents(host.clone()));

        let services = HostServices::local()
            .with_selection(selection.clone())
            .with_tooltip(Rc::new(JsTooltipService(host.clone())))
            .with_persister(Rc::new(JsPersister(host)))
            .with_events(events.clone())
            .with_palette(options.palette())
            .with_localizer(options.localizer());

        let slot = Rc::new(Cell::new(None::<VisualStore>));
        let mounted = slot.clone();
        leptos::mount::mount_to(element, move || {
            mounted.set(Some(provide_visual_store(services)));
            view! { <LineDotVisual /> }
        })
        .forget();

        let store = slot
            .get()
            .ok_or_else(|| JsValue::from_str("visual did not mount"))?;

        tracing::info!("visual mounted");
        Ok(Self {
            store,
            selection,
            events,
        })
    }

    /// Render a data view; malformed JSON is reported as a failed render
    pub fn update(&self, data_view_json: &str, width: f64, height: f64) {
        match DataView::from_json(data_view_json) {
            Ok(view) => self.store.update(&view, Viewport::new(width, height)),
            Err(err) => {
                tracing::error!(%err, "data view rejected");
                self.events.rendering_failed(&err.to_string());
            }
        }
    }

    pub fn clear(&self) {
        self.store.clear();
    }

    #[wasm_bindgen(js_name = togglePlay)]
    pub fn toggle_play(&self) {
        self.store.toggle_play();
    }

    /// JSON array of `{ displayName, value }`
    #[wasm_bindgen(js_name = tooltipItems)]
    pub fn tooltip_items(&self, index: usize) -> Result<String, JsValue> {
        serde_json::to_string(&self.store.tooltip_items(index)).map_err(to_js)
    }

    /// JSON array of formatting cards for the property pane
    #[wasm_bindgen(js_name = formattingModel)]
    pub fn formatting_model(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.store.formatting_model()).map_err(to_js)
    }

    pub fn click(&self, index: usize, multi_select: bool) {
        self.store.click(index, multi_select);
    }

    #[wasm_bindgen(js_name = clearSelection)]
    pub fn clear_selection(&self) {
        self.store.clear_selection();
    }

    #[wasm_bindgen(js_name = contextMenu)]
    pub fn context_menu(&self, index: Option<usize>, x: f64, y: f64) {
        self.store.context_menu(index, Position::new(x, y));
    }

    pub fn keyboard(&self, index: usize, key: &str, multi_select: bool, x: f64, y: f64) {
        self.store.keyboard(index, key, multi_select, Position::new(x, y));
    }

    /// Selection changed elsewhere on the page; `ids_json` is an array of ids
    #[wasm_bindgen(js_name = setSelection)]
    pub fn set_selection(&self, ids_json: &str) -> Result<(), JsValue> {
        let ids = parse_selection_ids(ids_json).map_err(to_js)?;
        self.selection.apply_external(ids);
        Ok(())
    }
}
