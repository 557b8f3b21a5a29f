//! Selection and highlight state for plot points
//!
//! The host owns the set of selected identities. Points only mirror it:
//! after every selection event the flags are re-read with [`sync_points`]
//! and opacities are recomputed with [`annotate`].

use crate::host::{Position, SelectionService, TooltipArgs, TooltipService};
use linedot_core::{LineDotPoint, Selectable, SelectionId};
use std::rc::Rc;

/// Floor for a dimmed dot
pub const MIN_OPACITY: f64 = 0.1;
/// Amount taken off a dot that is neither selected nor highlighted
pub const DIMMED_OPACITY: f64 = 0.4;

/// Opacity of one dot given the two series-wide aggregates
pub fn point_opacity(
    opacity: f64,
    selected: bool,
    highlight: bool,
    has_selection: bool,
    has_partial_highlights: bool,
) -> f64 {
    if (has_partial_highlights && !highlight) || (has_selection && !selected) {
        (opacity - DIMMED_OPACITY).max(MIN_OPACITY)
    } else {
        opacity
    }
}

/// Any point selected
pub fn has_selection<P: Selectable>(points: &[P]) -> bool {
    points.iter().any(Selectable::is_selected)
}

/// Highlighted and non-highlighted points both present
pub fn has_partial_highlights(points: &[LineDotPoint]) -> bool {
    let highlighted = points.iter().filter(|p| p.highlight).count();
    highlighted > 0 && highlighted < points.len()
}

/// Per-point opacity after selection and highlight dimming
pub fn annotate(points: &[LineDotPoint]) -> Vec<f64> {
    let selection = has_selection(points);
    let partial = has_partial_highlights(points);
    points
        .iter()
        .map(|p| point_opacity(p.opacity, p.selected, p.highlight, selection, partial))
        .collect()
}

/// Mirror the host selection onto the points
pub fn sync_points<P: Selectable>(points: &mut [P], ids: &[SelectionId]) {
    for point in points.iter_mut() {
        let selected = ids.contains(point.identity());
        point.set_selected(selected);
    }
}

/// What a key press on a focused dot does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Select,
    HideTooltip,
}

impl KeyAction {
    pub fn from_key(key: &str) -> Self {
        match key {
            "Enter" | " " | "Spacebar" => Self::Select,
            _ => Self::HideTooltip,
        }
    }
}

// ============================================================================
// ENGINE
// ============================================================================

/// Applies pointer and keyboard selection gestures through the host
#[derive(Clone)]
pub struct SelectionEngine {
    service: Rc<dyn SelectionService>,
    tooltip: Rc<dyn TooltipService>,
}

impl SelectionEngine {
    pub fn new(service: Rc<dyn SelectionService>, tooltip: Rc<dyn TooltipService>) -> Self {
        Self { service, tooltip }
    }

    pub fn sync(&self, points: &mut [LineDotPoint]) {
        sync_points(points, &self.service.selection_ids());
    }

    pub fn click(&self, points: &mut [LineDotPoint], index: usize, multi_select: bool) {
        let Some(point) = points.get(index) else {
            tracing::warn!(index, "click on unknown point");
            return;
        };
        let id = point.identity.clone();

        match (point.selected, multi_select) {
            (false, _) => self.service.select(&[id], multi_select),
            (true, true) => {
                let remainder: Vec<SelectionId> = self
                    .service
                    .selection_ids()
                    .into_iter()
                    .filter(|other| *other != id)
                    .collect();
                if remainder.is_empty() {
                    self.service.clear();
                } else {
                    self.service.select(&remainder, false);
                }
            }
            (true, false) => self.service.clear(),
        }

        self.sync(points);
        tracing::debug!(index, multi_select, "point clicked");
    }

    pub fn clear(&self, points: &mut [LineDotPoint]) {
        self.service.clear();
        self.sync(points);
    }

    /// Selection is left untouched
    pub fn context_menu(&self, point: Option<&LineDotPoint>, position: Position) {
        self.service
            .show_context_menu(point.map(|p| &p.identity), position);
    }

    /// Enter and Space click the point and pin its tooltip; other keys hide it
    pub fn keyboard(
        &self,
        points: &mut [LineDotPoint],
        index: usize,
        key: &str,
        multi_select: bool,
        tooltip: impl FnOnce(&[LineDotPoint]) -> Option<TooltipArgs>,
    ) -> KeyAction {
        let action = KeyAction::from_key(key);
        match action {
            KeyAction::Select => {
                self.click(points, index, multi_select);
                if let Some(args) = tooltip(points) {
                    self.tooltip.show(args);
                }
            }
            KeyAction::HideTooltip => self.tooltip.hide(),
        }
        action
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{LocalSelectionService, RecordingTooltip, TooltipItem};
    use linedot_core::DateValue;
    use proptest::prelude::*;

    fn point(row: usize) -> LineDotPoint {
        LineDotPoint {
            date_value: DateValue::new(row.to_string(), row as f64),
            value: row as f64,
            dot: 0.0,
            sum: 0.0,
            selected: false,
            highlight: false,
            opacity: 1.0,
            counter: None,
            identity: SelectionId::new("Date", row),
        }
    }

    fn engine() -> (SelectionEngine, Rc<LocalSelectionService>, Rc<RecordingTooltip>) {
        let service = Rc::new(LocalSelectionService::new());
        let tooltip = Rc::new(RecordingTooltip::new());
        (
            SelectionEngine::new(service.clone(), tooltip.clone()),
            service,
            tooltip,
        )
    }

    fn selected(points: &[LineDotPoint]) -> Vec<bool> {
        points.iter().map(|p| p.selected).collect()
    }

    #[test]
    fn test_opacity_rule() {
        assert_eq!(point_opacity(0.3, false, false, true, false), 0.1);
        assert_eq!(point_opacity(1.0, false, false, true, false), 0.6);
        assert_eq!(point_opacity(1.0, true, false, true, false), 1.0);
        assert_eq!(point_opacity(1.0, true, false, true, true), 0.6);
        assert_eq!(point_opacity(0.8, true, true, true, true), 0.8);
        assert_eq!(point_opacity(0.8, false, false, false, false), 0.8);
    }

    #[test]
    fn test_click_toggles_selection() {
        let (engine, service, _) = engine();
        let mut points: Vec<_> = (0..3).map(point).collect();

        engine.click(&mut points, 0, false);
        assert_eq!(selected(&points), vec![true, false, false]);

        engine.click(&mut points, 1, false);
        assert_eq!(selected(&points), vec![false, true, false]);

        engine.click(&mut points, 2, true);
        assert_eq!(selected(&points), vec![false, true, true]);

        engine.click(&mut points, 1, true);
        assert_eq!(selected(&points), vec![false, false, true]);

        engine.click(&mut points, 2, true);
        assert!(service.selection_ids().is_empty());
        assert_eq!(selected(&points), vec![false, false, false]);
    }

    #[test]
    fn test_click_selected_without_modifier_clears() {
        let (engine, _, _) = engine();
        let mut points: Vec<_> = (0..3).map(point).collect();

        engine.click(&mut points, 0, false);
        engine.click(&mut points, 1, true);
        engine.click(&mut points, 1, false);
        assert_eq!(selected(&points), vec![false, false, false]);
    }

    #[test]
    fn test_annotate_dims_unselected() {
        let (engine, _, _) = engine();
        let mut points: Vec<_> = (0..2).map(point).collect();
        engine.click(&mut points, 1, false);

        assert_eq!(annotate(&points), vec![0.6, 1.0]);
    }

    #[test]
    fn test_partial_highlights() {
        let mut points: Vec<_> = (0..2).map(point).collect();
        assert!(!has_partial_highlights(&points));
        points[0].highlight = true;
        assert!(has_partial_highlights(&points));
        assert_eq!(annotate(&points), vec![1.0, 0.6]);
        points[1].highlight = true;
        assert!(!has_partial_highlights(&points));
    }

    #[test]
    fn test_context_menu_keeps_selection() {
        let (engine, service, _) = engine();
        let mut points: Vec<_> = (0..2).map(point).collect();
        engine.click(&mut points, 0, false);

        engine.context_menu(Some(&points[1]), Position::new(5.0, 6.0));
        engine.context_menu(None, Position::new(1.0, 2.0));

        let menus = service.context_menus();
        assert_eq!(menus[0], (Some(SelectionId::new("Date", 1)), Position::new(5.0, 6.0)));
        assert_eq!(menus[1].0, None);
        assert_eq!(selected(&points), vec![true, false]);
    }

    #[test]
    fn test_keyboard_enter_selects_and_shows_tooltip() {
        let (engine, _, tooltip) = engine();
        let mut points: Vec<_> = (0..2).map(point).collect();

        let action = engine.keyboard(&mut points, 1, "Enter", false, |points| {
            Some(TooltipArgs {
                data_items: vec![TooltipItem::new("Value", points[1].value.to_string())],
                coordinates: Position::new(10.0, 20.0),
                identities: vec![points[1].identity.clone()],
            })
        });

        assert_eq!(action, KeyAction::Select);
        assert!(points[1].selected);
        assert_eq!(tooltip.current().unwrap().data_items[0].value, "1");

        let action = engine.keyboard(&mut points, 1, "a", false, |_| None);
        assert_eq!(action, KeyAction::HideTooltip);
        assert!(tooltip.current().is_none());
        assert!(points[1].selected);
    }

    #[test]
    fn test_space_with_modifier_adds() {
        let (engine, _, _) = engine();
        let mut points: Vec<_> = (0..2).map(point).collect();
        engine.keyboard(&mut points, 0, " ", false, |_| None);
        engine.keyboard(&mut points, 1, " ", true, |_| None);
        assert_eq!(selected(&points), vec![true, true]);
    }

    proptest! {
        #[test]
        fn prop_opacity_never_exceeds_base_or_drops_below_floor(
            opacity in 0.0f64..=1.0,
            selected in any::<bool>(),
            highlight in any::<bool>(),
            any_selected in any::<bool>(),
            partial in any::<bool>(),
        ) {
            let result = point_opacity(opacity, selected, highlight, any_selected, partial);
            prop_assert!(result <= opacity.max(MIN_OPACITY));
            prop_assert!(result >= opacity.min(MIN_OPACITY));
            if !any_selected && !partial {
                prop_assert_eq!(result, opacity);
            }
        }
    }
}
