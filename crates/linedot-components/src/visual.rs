//! The complete line-dot visual: chart, counter, play button and tooltips

use crate::AnimationPlayer;
use linedot_charts::{DotEvent, DotKeyEvent, LineDotChart, PointerEvent};
use linedot_state::{Position, use_visual_store};
use leptos::prelude::*;

#[component]
pub fn LineDotVisual(
    /// Prefix for element ids inside the chart
    #[prop(optional, into)]
    id: Option<String>,
) -> impl IntoView {
    let store = use_visual_store();
    let player = StoredValue::new_local(None::<AnimationPlayer>);

    // Every new plan replaces the player; the old interval dies with it
    Effect::new(move |_| {
        let next = store
            .plan
            .get()
            .filter(|plan| plan.state.is_playing())
            .map(|plan| AnimationPlayer::start(store, plan.generation));
        player.set_value(next);
    });

    on_cleanup(move || player.set_value(None));

    let on_dot_click = Callback::new(move |ev: DotEvent| store.click(ev.index, ev.multi_select));

    let on_dot_key = Callback::new(move |ev: DotKeyEvent| {
        store.keyboard(ev.index, &ev.key, ev.multi_select, Position::new(ev.x, ev.y));
    });

    let on_context_menu = Callback::new(move |ev: PointerEvent| {
        store.context_menu(ev.index, Position::new(ev.x, ev.y));
    });

    let on_hover = Callback::new(move |ev: Option<PointerEvent>| {
        store.hover(ev.and_then(|e| e.index.map(|i| (i, Position::new(e.x, e.y)))));
    });

    let on_background_click = Callback::new(move |_: ()| store.clear_selection());
    let on_play = Callback::new(move |_: ()| store.toggle_play());

    view! {
        <div class="lineDotVisual">
            <LineDotChart
                scene=store.scene
                id=id.unwrap_or_else(|| "lineDotChart".to_string())
                on_dot_click=on_dot_click
                on_dot_key=on_dot_key
                on_context_menu=on_context_menu
                on_hover=on_hover
                on_background_click=on_background_click
                on_play=on_play
            />
        </div>
    }
}
