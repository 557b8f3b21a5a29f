//! Line-dot chart component
//!
//! Draws a [`ChartScene`]: the three axes, the clipped line, the dots, the
//! counter text and the play button. All behaviour lives in the scene and
//! in the callbacks; the component only binds attributes and events.
//!
//! Nodes are rebuilt only when the [`SceneShape`](crate::SceneShape)
//! changes. Animation frames and selection changes patch dot transforms and
//! opacities, the clip width and the counter text in place, so a focused dot
//! keeps focus while playing.

use crate::{
    AxisModel, ChartAxes, ChartScene, CounterScene, DotScene, LineScene, PLAY_GLYPH_PATH,
    PlayButtonScene,
    chartkit::{px, translate},
};
use leptos::prelude::*;
use wasm_bindgen::JsCast;

const TICK_LENGTH: f64 = 5.0;
const LABEL_GAP: f64 = 8.0;

/// Click on a dot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DotEvent {
    pub index: usize,
    pub multi_select: bool,
}

/// Key pressed while a dot has focus; `x`/`y` is the centre of the dot's
/// bounding box in client coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct DotKeyEvent {
    pub index: usize,
    pub key: String,
    pub multi_select: bool,
    pub x: f64,
    pub y: f64,
}

/// Pointer position over the chart, with the dot under it if any
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub index: Option<usize>,
    pub x: f64,
    pub y: f64,
}

fn multi_select(ctrl: bool, meta: bool, shift: bool) -> bool {
    ctrl || meta || shift
}

fn rect_centre(left: f64, top: f64, width: f64, height: f64) -> (f64, f64) {
    (left + width / 2.0, top + height / 2.0)
}

/// Line-dot chart component
#[component]
pub fn LineDotChart(
    #[prop(into)] scene: Signal<Option<ChartScene>>,
    /// Prefix for element ids; must be unique on the page
    #[prop(optional, into)]
    id: Option<String>,
    #[prop(optional, into)] on_dot_click: Option<Callback<DotEvent>>,
    #[prop(optional, into)] on_dot_key: Option<Callback<DotKeyEvent>>,
    #[prop(optional, into)] on_context_menu: Option<Callback<PointerEvent>>,
    #[prop(optional, into)] on_hover: Option<Callback<Option<PointerEvent>>>,
    #[prop(optional, into)] on_background_click: Option<Callback<()>>,
    #[prop(optional, into)] on_play: Option<Callback<()>>,
) -> impl IntoView {
    let clip_id = format!("{}-clip", id.unwrap_or_else(|| "lineDotChart".to_string()));
    let shape = Memo::new(move |_| scene.with(|s| s.as_ref().map(ChartScene::shape)));

    let background_click = move |_: leptos::ev::MouseEvent| {
        if let Some(cb) = on_background_click {
            cb.run(());
        }
    };

    let background_menu = move |ev: leptos::ev::MouseEvent| {
        ev.prevent_default();
        if let Some(cb) = on_context_menu {
            cb.run(PointerEvent {
                index: None,
                x: ev.client_x() as f64,
                y: ev.client_y() as f64,
            });
        }
    };

    view! {
        {move || {
            let clip_id = clip_id.clone();
            shape.get().and_then(|shape| {
                // nodes come from the scene that introduced this shape
                let initial = scene.get_untracked()?;
                let dims = shape.axes.layout.dims;
                let handlers = DotHandlers {
                    on_click: on_dot_click,
                    on_key: on_dot_key,
                    on_context_menu,
                    on_hover,
                };

                Some(view! {
                    <svg
                        class="lineDotChart"
                        width=dims.width
                        height=dims.height
                        viewBox=dims.viewbox()
                        on:click=background_click
                        on:contextmenu=background_menu
                    >
                        <g class="axes" transform=dims.inner_transform()>
                            {render_axes(&shape.axes)}
                        </g>

                        <g class="line" transform=dims.inner_transform()>
                            {initial.line.map(|line| render_line(line, scene, clip_id))}
                        </g>

                        <g class="dots" transform=dims.inner_transform()>
                            {initial.dots.into_iter().map(|dot| {
                                render_dot(dot, scene, handlers)
                            }).collect_view()}
                        </g>

                        <g class="counter" transform=dims.inner_transform()>
                            {initial.counter.map(|counter| render_counter(counter, scene))}
                        </g>

                        {shape.play_button.map(|button| render_play_button(button, on_play))}
                    </svg>
                })
            })
        }}
    }
}

// ============================================================================
// LIVE ATTRIBUTES
// ============================================================================

fn live_dot<T, F>(
    scene: Signal<Option<ChartScene>>,
    index: usize,
    read: F,
) -> impl Fn() -> Option<T> + Copy + Send + Sync + 'static
where
    T: 'static,
    F: Fn(&DotScene) -> T + Copy + Send + Sync + 'static,
{
    move || scene.with(|s| s.as_ref().and_then(|s| s.dots.get(index)).map(read))
}

// ============================================================================
// PARTS
// ============================================================================

fn render_axes(axes: &ChartAxes) -> impl IntoView + use<> {
    let plot_width = axes.layout.plot_width();
    let plot_height = axes.layout.plot_height();

    let x_axis = axes.x.visible.then(|| {
        let model = axes.x.clone();
        view! {
            <g class="x axis" transform=translate(0.0, plot_height)>
                <line x1="0" y1="0" x2=plot_width y2="0" stroke=model.color.clone() />
                {model.ticks.iter().map(|tick| view! {
                    <g class="tick" transform=translate(tick.offset, 0.0)>
                        <line y2=TICK_LENGTH stroke=model.color.clone() />
                        <text
                            y={TICK_LENGTH + LABEL_GAP}
                            dy="0.71em"
                            text-anchor="middle"
                            fill=model.color.clone()
                            font-size=px(model.font_px)
                        >
                            {tick.label.clone()}
                        </text>
                    </g>
                }).collect_view()}
            </g>
        }
    });

    view! {
        {x_axis}
        {render_value_axis(&axes.y, "y axis", 0.0, -1.0, plot_height)}
        {render_value_axis(&axes.y2, "y2 axis", plot_width, 1.0, plot_height)}
    }
}

/// `side` is -1 for labels left of the axis line and 1 for labels right of it
fn render_value_axis(
    model: &AxisModel,
    class: &'static str,
    x: f64,
    side: f64,
    plot_height: f64,
) -> Option<impl IntoView + use<>> {
    if !model.visible {
        return None;
    }

    let anchor = if side < 0.0 { "end" } else { "start" };
    let model = model.clone();

    Some(view! {
        <g class=class transform=translate(x, 0.0)>
            <line x1="0" y1="0" x2="0" y2=plot_height stroke=model.color.clone() />
            {model.ticks.iter().map(|tick| view! {
                <g class="tick" transform=translate(0.0, tick.offset)>
                    <line x2={side * TICK_LENGTH} stroke=model.color.clone() />
                    <text
                        x={side * LABEL_GAP}
                        dy="0.32em"
                        text-anchor=anchor
                        fill=model.color.clone()
                        font-size=px(model.font_px)
                    >
                        {tick.label.clone()}
                    </text>
                </g>
            }).collect_view()}
        </g>
    })
}

fn render_line(
    line: LineScene,
    scene: Signal<Option<ChartScene>>,
    clip_id: String,
) -> impl IntoView {
    let clip_ref = line.clip.map(|_| format!("url(#{clip_id})"));
    let clip_width = move || {
        scene.with(|s| {
            s.as_ref()
                .and_then(|s| s.line.as_ref())
                .and_then(|l| l.clip)
                .map(|c| c.width)
        })
    };

    view! {
        {line.clip.map(|clip| view! {
            <defs>
                <clipPath id=clip_id.clone()>
                    <rect x=clip.x y="0" width=clip_width height=clip.height />
                </clipPath>
            </defs>
        })}
        <path
            class="line"
            d=line.path
            fill="none"
            stroke=line.stroke
            stroke-width=px(line.stroke_width)
            clip-path=clip_ref
        />
    }
}

#[derive(Clone, Copy)]
struct DotHandlers {
    on_click: Option<Callback<DotEvent>>,
    on_key: Option<Callback<DotKeyEvent>>,
    on_context_menu: Option<Callback<PointerEvent>>,
    on_hover: Option<Callback<Option<PointerEvent>>>,
}

fn render_dot(
    dot: DotScene,
    scene: Signal<Option<ChartScene>>,
    handlers: DotHandlers,
) -> impl IntoView {
    let index = dot.index;
    let transform = live_dot(scene, index, DotScene::transform);
    let opacity = live_dot(scene, index, |d: &DotScene| d.opacity);
    let selected = live_dot(scene, index, |d: &DotScene| d.selected);

    view! {
        <circle
            class="point"
            class:selected=move || selected().unwrap_or(false)
            tabindex="0"
            r=dot.radius
            transform=transform
            fill=dot.fill.clone()
            stroke=dot.stroke.clone()
            stroke-opacity=dot.stroke_opacity
            stroke-width=dot.stroke_width.map(px)
            opacity=opacity
            on:click=move |ev: leptos::ev::MouseEvent| {
                ev.stop_propagation();
                if let Some(cb) = handlers.on_click {
                    cb.run(DotEvent {
                        index,
                        multi_select: multi_select(ev.ctrl_key(), ev.meta_key(), ev.shift_key()),
                    });
                }
            }
            on:contextmenu=move |ev: leptos::ev::MouseEvent| {
                ev.prevent_default();
                ev.stop_propagation();
                if let Some(cb) = handlers.on_context_menu {
                    cb.run(PointerEvent {
                        index: Some(index),
                        x: ev.client_x() as f64,
                        y: ev.client_y() as f64,
                    });
                }
            }
            on:keydown=move |ev: leptos::ev::KeyboardEvent| {
                let Some(cb) = handlers.on_key else {
                    return;
                };
                let Some(element) = ev
                    .current_target()
                    .and_then(|t| t.dyn_into::<web_sys::Element>().ok())
                else {
                    return;
                };
                let rect = element.get_bounding_client_rect();
                let (x, y) = rect_centre(rect.left(), rect.top(), rect.width(), rect.height());
                cb.run(DotKeyEvent {
                    index,
                    key: ev.key(),
                    multi_select: multi_select(ev.ctrl_key(), ev.meta_key(), ev.shift_key()),
                    x,
                    y,
                });
            }
            on:mousemove=move |ev: leptos::ev::MouseEvent| {
                if let Some(cb) = handlers.on_hover {
                    cb.run(Some(PointerEvent {
                        index: Some(index),
                        x: ev.client_x() as f64,
                        y: ev.client_y() as f64,
                    }));
                }
            }
            on:mouseleave=move |_| {
                if let Some(cb) = handlers.on_hover {
                    cb.run(None);
                }
            }
        />
    }
}

fn render_counter(counter: CounterScene, scene: Signal<Option<ChartScene>>) -> impl IntoView {
    let text = move || {
        scene.with(|s| {
            s.as_ref()
                .and_then(|s| s.counter.as_ref())
                .map(|c| c.text.clone())
                .unwrap_or_default()
        })
    };

    view! {
        <text
            class="text"
            x=counter.x
            y=counter.y
            text-anchor="end"
            fill=counter.color
            font-size=px(counter.font_px)
        >
            {text}
        </text>
    }
}

fn render_play_button(button: PlayButtonScene, on_play: Option<Callback<()>>) -> impl IntoView {
    let circle_opacity = if button.circle_visible { 1.0 } else { 0.0 };
    let play_opacity = if button.play_visible { 1.0 } else { 0.0 };
    let transform = button.transform();
    let inner = button.inner_color.clone();

    view! {
        <g class="playButton" transform=transform opacity=button.opacity>
            <circle
                r=button.radius
                fill=button.fill
                stroke=button.stroke
                stroke-width=px(button.stroke_width)
                opacity=circle_opacity
                on:click=move |ev: leptos::ev::MouseEvent| {
                    ev.stop_propagation();
                    if let Some(cb) = on_play {
                        cb.run(());
                    }
                }
            />
            <path
                class="play"
                d=PLAY_GLYPH_PATH
                transform=translate(-4.0, -8.0)
                fill=inner.clone()
                pointer-events="none"
                opacity=play_opacity
            />
            {button.stop_visible.then(|| view! {
                <g class="stop" pointer-events="none">
                    <path
                        d=PLAY_GLYPH_PATH
                        transform="translate(6, 8) rotate(180)"
                        fill=inner.clone()
                    />
                    <rect
                        width="2"
                        height="12"
                        transform=translate(-7.0, -6.0)
                        fill=inner.clone()
                    />
                </g>
            })}
        </g>
    }
}
