//! Typed visual settings
//!
//! The host persists settings as a JSON object keyed by card name
//! (`lineoptions`, `dotoptions`, `xAxis`, ...). Every field has a default,
//! so partial objects deserialize cleanly. [`Settings::validate`] clamps the
//! numeric fields into their allowed ranges once per update.

use crate::{ChartError, DataView, colors};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Value, json};

pub const COUNTER_TITLE_KEY: &str = "Visual_CounterTitle";

pub const MIN_DOT_SIZE: f64 = 0.0;
pub const MAX_DOT_SIZE: f64 = 50.0;
pub const MIN_LINE_THICKNESS: f64 = 0.0;
pub const MAX_LINE_THICKNESS: f64 = 50.0;
pub const MIN_DURATION: f64 = 0.0;
pub const MAX_DURATION: f64 = 1000.0;

// ============================================================================
// HOST THEME & LOCALIZATION
// ============================================================================

/// Host color theme
pub trait ColorPalette {
    fn is_high_contrast(&self) -> bool;
    fn foreground(&self) -> String;
    fn background(&self) -> String;
}

/// Resolves display-name keys to user-facing strings
pub trait Localizer {
    fn display_name(&self, key: &str) -> String;
}

/// Regular (non high-contrast) theme
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPalette;

impl ColorPalette for DefaultPalette {
    fn is_high_contrast(&self) -> bool {
        false
    }

    fn foreground(&self) -> String {
        "#000000".to_string()
    }

    fn background(&self) -> String {
        "#ffffff".to_string()
    }
}

/// High-contrast theme with explicit colors
#[derive(Debug, Clone, PartialEq)]
pub struct HighContrastPalette {
    pub foreground: String,
    pub background: String,
}

impl ColorPalette for HighContrastPalette {
    fn is_high_contrast(&self) -> bool {
        true
    }

    fn foreground(&self) -> String {
        self.foreground.clone()
    }

    fn background(&self) -> String {
        self.background.clone()
    }
}

/// English fallback; unknown keys come back unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinLocalizer;

impl Localizer for BuiltinLocalizer {
    fn display_name(&self, key: &str) -> String {
        match key {
            COUNTER_TITLE_KEY => "Counter: ".to_string(),
            other => other.to_string(),
        }
    }
}

// ============================================================================
// SETTINGS CARDS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LineSettings {
    #[serde(deserialize_with = "fill::color")]
    pub fill: String,
    pub line_thickness: f64,
}

impl Default for LineSettings {
    fn default() -> Self {
        Self {
            fill: colors::LINE.to_string(),
            line_thickness: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DotSettings {
    #[serde(deserialize_with = "fill::color")]
    pub color: String,
    pub dot_size_min: f64,
    pub dot_size_max: f64,
    /// Base dot opacity as a percentage
    #[serde(alias = "opacity")]
    pub percentile: f64,
    #[serde(deserialize_with = "fill::optional_color")]
    pub stroke: Option<String>,
    pub stroke_opacity: Option<f64>,
    pub stroke_width: Option<f64>,
}

impl Default for DotSettings {
    fn default() -> Self {
        Self {
            color: colors::DOT.to_string(),
            dot_size_min: 4.0,
            dot_size_max: 38.0,
            percentile: 100.0,
            stroke: None,
            stroke_opacity: None,
            stroke_width: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct XAxisSettings {
    pub show: bool,
    #[serde(deserialize_with = "fill::color")]
    pub color: String,
    pub text_size: f64,
}

impl Default for XAxisSettings {
    fn default() -> Self {
        Self {
            show: true,
            color: colors::AXIS.to_string(),
            text_size: 9.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct YAxisSettings {
    pub show: bool,
    #[serde(deserialize_with = "fill::color")]
    pub color: String,
    pub text_size: f64,
    pub is_duplicated: bool,
}

impl Default for YAxisSettings {
    fn default() -> Self {
        Self {
            show: true,
            color: colors::AXIS.to_string(),
            text_size: 9.0,
            is_duplicated: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CounterSettings {
    pub show: bool,
    pub counter_title: String,
    #[serde(deserialize_with = "fill::color")]
    pub color: String,
    pub text_size: f64,
}

impl Default for CounterSettings {
    fn default() -> Self {
        Self {
            show: true,
            counter_title: String::new(),
            color: colors::COUNTER.to_string(),
            text_size: 24.0,
        }
    }
}

impl CounterSettings {
    /// Title shown in front of the counter value, empty when hidden
    pub fn title_text(&self) -> &str {
        if self.show { &self.counter_title } else { "" }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MiscSettings {
    pub is_animated: bool,
    pub is_stopped: bool,
    /// Reveal duration in seconds
    pub duration: f64,
}

impl Default for MiscSettings {
    fn default() -> Self {
        Self {
            is_animated: true,
            is_stopped: true,
            duration: 20.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlayButtonSettings {
    pub show: bool,
    #[serde(deserialize_with = "fill::color")]
    pub fill: String,
    #[serde(deserialize_with = "fill::color")]
    pub stroke: String,
    #[serde(deserialize_with = "fill::color")]
    pub inner_color: String,
    pub stroke_width: f64,
    pub opacity: f64,
}

impl Default for PlayButtonSettings {
    fn default() -> Self {
        Self {
            show: true,
            fill: colors::PLAY_FILL.to_string(),
            stroke: colors::PLAY_STROKE.to_string(),
            inner_color: colors::PLAY_INNER.to_string(),
            stroke_width: 0.5,
            opacity: 100.0,
        }
    }
}

/// All cards of the visual
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    #[serde(rename = "lineoptions")]
    pub line: LineSettings,
    #[serde(rename = "dotoptions")]
    pub dot: DotSettings,
    pub x_axis: XAxisSettings,
    pub y_axis: YAxisSettings,
    #[serde(rename = "counteroptions")]
    pub counter: CounterSettings,
    pub misc: MiscSettings,
    pub play_button: PlayButtonSettings,
}

impl Settings {
    /// Deserialize raw card objects without validating
    pub fn parse(objects: &Value) -> Result<Self, ChartError> {
        Ok(Self::deserialize(objects)?)
    }

    /// Settings for one update: parsed, validated, localized and themed
    pub fn from_data_view(
        view: &DataView,
        palette: &dyn ColorPalette,
        localizer: &dyn Localizer,
    ) -> Self {
        let mut settings = match view.metadata.objects.as_ref() {
            Some(objects) => Self::parse(objects).unwrap_or_else(|err| {
                tracing::warn!(%err, "malformed settings objects, using defaults");
                Self::default()
            }),
            None => Self::default(),
        };

        settings.validate();

        if settings.counter.counter_title.is_empty() {
            settings.counter.counter_title = localizer.display_name(COUNTER_TITLE_KEY);
        }

        if palette.is_high_contrast() {
            settings.apply_high_contrast(palette);
        }

        settings
    }

    /// Clamp every numeric field into its allowed range
    pub fn validate(&mut self) {
        self.dot.dot_size_min = valid(self.dot.dot_size_min, MIN_DOT_SIZE, MAX_DOT_SIZE);
        self.dot.dot_size_max = valid(self.dot.dot_size_max, self.dot.dot_size_min, MAX_DOT_SIZE);
        self.dot.percentile = valid(self.dot.percentile, 0.0, 100.0);
        self.dot.stroke_width = self.dot.stroke_width.map(non_negative);
        self.dot.stroke_opacity = self.dot.stroke_opacity.map(|o| valid(o, 0.0, 1.0));

        self.line.line_thickness =
            valid(self.line.line_thickness, MIN_LINE_THICKNESS, MAX_LINE_THICKNESS);
        self.misc.duration = valid(self.misc.duration, MIN_DURATION, MAX_DURATION);

        self.x_axis.text_size = non_negative(self.x_axis.text_size);
        self.y_axis.text_size = non_negative(self.y_axis.text_size);
        self.counter.text_size = non_negative(self.counter.text_size);

        self.play_button.stroke_width = non_negative(self.play_button.stroke_width);
        self.play_button.opacity = valid(self.play_button.opacity, 0.0, 100.0);
    }

    pub fn apply_high_contrast(&mut self, palette: &dyn ColorPalette) {
        let fg = palette.foreground();
        let bg = palette.background();

        self.line.fill = fg.clone();
        self.line.line_thickness = 2.0;

        self.dot.color = bg.clone();
        self.dot.stroke = Some(fg.clone());
        self.dot.stroke_width = Some(2.0);
        self.dot.stroke_opacity = None;

        self.counter.color = fg.clone();
        self.x_axis.color = fg.clone();
        self.y_axis.color = fg.clone();

        self.play_button.fill = bg;
        self.play_button.stroke = fg.clone();
        self.play_button.stroke_width = 1.0;
        self.play_button.inner_color = fg;
        self.play_button.opacity = 100.0;
    }

    /// Card and slice listing for the host property pane
    pub fn formatting_model(&self) -> Vec<FormattingCard> {
        vec![
            FormattingCard::new("lineoptions", "Line", "Visual_Line")
                .slice("fill", "Fill", "Visual_Fill", json!(self.line.fill))
                .slice("lineThickness", "Thickness", "Visual_Thickness", json!(self.line.line_thickness)),
            FormattingCard::new("dotoptions", "Dot", "Visual_Dot")
                .slice("color", "Fill", "Visual_Fill", json!(self.dot.color))
                .slice("dotSizeMin", "Min Size", "Visual_MinSize", json!(self.dot.dot_size_min))
                .slice("dotSizeMax", "Max Size", "Visual_MaxSize", json!(self.dot.dot_size_max))
                .slice("percentile", "Opacity", "Visual_Opacity", json!(self.dot.percentile)),
            FormattingCard::new("xAxis", "X-axis", "Visual_XAxis")
                .toggle(self.x_axis.show)
                .slice("color", "Color", "Visual_Color", json!(self.x_axis.color))
                .slice("textSize", "Text Size", "Visual_TextSize", json!(self.x_axis.text_size)),
            FormattingCard::new("yAxis", "Y-axis", "Visual_YAxis")
                .toggle(self.y_axis.show)
                .slice("color", "Color", "Visual_Color", json!(self.y_axis.color))
                .slice("textSize", "Text Size", "Visual_TextSize", json!(self.y_axis.text_size))
                .slice("isDuplicated", "Duplicated", "Visual_Duplicated", json!(self.y_axis.is_duplicated)),
            FormattingCard::new("counteroptions", "Counter", "Visual_Counter")
                .toggle(self.counter.show)
                .slice("counterTitle", "Title", "Visual_Title", json!(self.counter.counter_title))
                .slice("color", "Fill", "Visual_Fill", json!(self.counter.color))
                .slice("textSize", "Text Size", "Visual_TextSize", json!(self.counter.text_size)),
            FormattingCard::new("misc", "Animation", "Visual_Animation")
                .slice("isAnimated", "Animated", "Visual_Animated", json!(self.misc.is_animated))
                .slice("isStopped", "Stop on load", "Visual_StopOnLoad", json!(self.misc.is_stopped))
                .slice("duration", "Time", "Visual_Time", json!(self.misc.duration)),
            FormattingCard::new("playButton", "Play button", "Visual_PlayButton")
                .toggle(self.play_button.show)
                .slice("fill", "Fill", "Visual_Fill", json!(self.play_button.fill))
                .slice("stroke", "Stroke", "Visual_Stroke", json!(self.play_button.stroke))
                .slice("innerColor", "Inner color", "Visual_InnerColor", json!(self.play_button.inner_color))
                .slice("strokeWidth", "Stroke width", "Visual_StrokeWidth", json!(self.play_button.stroke_width))
                .slice("opacity", "Opacity", "Visual_Opacity", json!(self.play_button.opacity)),
        ]
    }
}

fn valid(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() || value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

fn non_negative(value: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value.max(0.0) }
}

// ============================================================================
// FORMATTING MODEL
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormattingSlice {
    pub name: &'static str,
    pub display_name: &'static str,
    pub display_name_key: &'static str,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormattingCard {
    pub name: &'static str,
    pub display_name: &'static str,
    pub display_name_key: &'static str,
    /// Value of the card-level "show" toggle, when the card has one
    pub top_level_toggle: Option<bool>,
    pub slices: Vec<FormattingSlice>,
}

impl FormattingCard {
    fn new(name: &'static str, display_name: &'static str, key: &'static str) -> Self {
        Self {
            name,
            display_name,
            display_name_key: key,
            top_level_toggle: None,
            slices: Vec::new(),
        }
    }

    fn toggle(mut self, show: bool) -> Self {
        self.top_level_toggle = Some(show);
        self
    }

    fn slice(
        mut self,
        name: &'static str,
        display_name: &'static str,
        key: &'static str,
        value: Value,
    ) -> Self {
        self.slices.push(FormattingSlice {
            name,
            display_name,
            display_name_key: key,
            value,
        });
        self
    }
}

/// Colors arrive either as plain strings or as `{ "solid": { "color": .. } }`
mod fill {
    use super::*;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawColor {
        Plain(String),
        Solid { solid: Solid },
    }

    #[derive(Deserialize)]
    struct Solid {
        color: String,
    }

    impl From<RawColor> for String {
        fn from(raw: RawColor) -> Self {
            match raw {
                RawColor::Plain(color) => color,
                RawColor::Solid { solid } => solid.color,
            }
        }
    }

    pub fn color<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
        RawColor::deserialize(de).map(String::from)
    }

    pub fn optional_color<'de, D: Deserializer<'de>>(de: D) -> Result<Option<String>, D::Error> {
        Option::<RawColor>::deserialize(de).map(|raw| raw.map(String::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn settings_from(objects: Value) -> Settings {
        let view = DataView::default().with_objects(objects);
        Settings::from_data_view(&view, &DefaultPalette, &BuiltinLocalizer)
    }

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.line.fill, "#66d4cc");
        assert_eq!(s.line.line_thickness, 1.0);
        assert_eq!(s.dot.dot_size_min, 4.0);
        assert_eq!(s.dot.dot_size_max, 38.0);
        assert!(s.misc.is_animated && s.misc.is_stopped);
        assert_eq!(s.misc.duration, 20.0);
        assert_eq!(s.play_button.stroke_width, 0.5);
        assert!(s.y_axis.is_duplicated);
    }

    #[test]
    fn test_partial_objects_keep_defaults() {
        let s = settings_from(json!({
            "dotoptions": { "dotSizeMax": 20 },
            "lineoptions": { "fill": { "solid": { "color": "#ff0000" } } },
            "misc": { "isStopped": false }
        }));
        assert_eq!(s.dot.dot_size_max, 20.0);
        assert_eq!(s.dot.dot_size_min, 4.0);
        assert_eq!(s.line.fill, "#ff0000");
        assert!(!s.misc.is_stopped);
        assert!(s.misc.is_animated);
    }

    #[test]
    fn test_dot_sizes_are_clamped() {
        let s = settings_from(json!({ "dotoptions": { "dotSizeMin": -6, "dotSizeMax": 678 } }));
        assert_eq!(s.dot.dot_size_min, 0.0);
        assert_eq!(s.dot.dot_size_max, 50.0);
    }

    #[test]
    fn test_max_never_below_min() {
        let s = settings_from(json!({ "dotoptions": { "dotSizeMin": 30, "dotSizeMax": 10 } }));
        assert_eq!(s.dot.dot_size_min, 30.0);
        assert_eq!(s.dot.dot_size_max, 30.0);
    }

    #[test]
    fn test_duration_and_thickness_clamped() {
        let s = settings_from(json!({
            "misc": { "duration": 5000 },
            "lineoptions": { "lineThickness": -3 }
        }));
        assert_eq!(s.misc.duration, 1000.0);
        assert_eq!(s.line.line_thickness, 0.0);
    }

    #[test]
    fn test_malformed_objects_fall_back_to_defaults() {
        let s = settings_from(json!({ "misc": { "duration": "fast" } }));
        assert_eq!(s.misc.duration, 20.0);
    }

    #[test]
    fn test_counter_title_localized_when_empty() {
        let s = settings_from(json!({}));
        assert_eq!(s.counter.counter_title, "Counter: ");

        let s = settings_from(json!({ "counteroptions": { "counterTitle": "Year " } }));
        assert_eq!(s.counter.counter_title, "Year ");
    }

    #[test]
    fn test_hidden_counter_has_no_title_text() {
        let mut counter = CounterSettings::default();
        counter.counter_title = "Year".into();
        assert_eq!(counter.title_text(), "Year");
        counter.show = false;
        assert_eq!(counter.title_text(), "");
    }

    #[test]
    fn test_high_contrast() {
        let palette = HighContrastPalette {
            foreground: "#ffff00".into(),
            background: "#000000".into(),
        };
        let s = Settings::from_data_view(&DataView::default(), &palette, &BuiltinLocalizer);
        assert_eq!(s.line.fill, "#ffff00");
        assert_eq!(s.line.line_thickness, 2.0);
        assert_eq!(s.dot.color, "#000000");
        assert_eq!(s.dot.stroke.as_deref(), Some("#ffff00"));
        assert_eq!(s.dot.stroke_width, Some(2.0));
        assert_eq!(s.x_axis.color, "#ffff00");
        assert_eq!(s.play_button.fill, "#000000");
        assert_eq!(s.play_button.inner_color, "#ffff00");
        assert_eq!(s.play_button.stroke_width, 1.0);
    }

    #[test]
    fn test_formatting_model_lists_all_cards() {
        let model = Settings::default().formatting_model();
        let names: Vec<_> = model.iter().map(|c| c.name).collect();
        assert_eq!(
            names,
            ["lineoptions", "dotoptions", "xAxis", "yAxis", "counteroptions", "misc", "playButton"]
        );
        assert!(model.iter().all(|c| c.display_name_key.starts_with("Visual_")));
        assert!(model.iter().flat_map(|c| &c.slices).all(|s| s.display_name_key.starts_with("Visual_")));
    }

    proptest! {
        #[test]
        fn prop_validated_sizes_are_ordered(
            min in -1000.0f64..1000.0,
            max in -1000.0f64..1000.0,
            thickness in -1000.0f64..1000.0,
            duration in -5000.0f64..5000.0,
        ) {
            let mut s = Settings::default();
            s.dot.dot_size_min = min;
            s.dot.dot_size_max = max;
            s.line.line_thickness = thickness;
            s.misc.duration = duration;
            s.validate();

            prop_assert!(0.0 <= s.dot.dot_size_min);
            prop_assert!(s.dot.dot_size_min <= s.dot.dot_size_max);
            prop_assert!(s.dot.dot_size_max <= 50.0);
            prop_assert!((0.0..=50.0).contains(&s.line.line_thickness));
            prop_assert!((0.0..=1000.0).contains(&s.misc.duration));
        }
    }
}
