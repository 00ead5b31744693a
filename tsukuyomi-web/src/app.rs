//! Main application component.
//!
//! The UI is a pure consumer of the controller's projections: the lower
//! verse of the current card, the upper verse of the next card, and the
//! selection editor. All drill state lives in the [`DrillController`]; the
//! components only hold form inputs and a render revision counter.

use crate::dom;
use crate::storage::BrowserStore;
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;
use tsukuyomi_game::{
    Confirm, DigitPlace, DrillController, Indicator, PlayableCard, SelectionError, TopUpOutcome,
};
use web_sys::HtmlInputElement;
use yew::prelude::*;

/// Confirmation gate backed by `window.confirm`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowConfirm;

impl Confirm for WindowConfirm {
    fn confirm(&self, message: &str) -> bool {
        dom::confirm(message)
    }
}

type SharedController = Rc<RefCell<DrillController<BrowserStore>>>;

fn indicator_badge(card: &PlayableCard) -> Html {
    match card.indicator {
        Indicator::None => html! {},
        Indicator::Single => html! { <span class="badge badge-single">{"一字"}</span> },
        Indicator::NoSameSound => {
            html! { <span class="badge badge-blank">{"同音なし"}</span> }
        }
    }
}

fn verse(card: &PlayableCard, upper: bool) -> Html {
    let text = if upper {
        card.kaminoku.clone()
    } else {
        card.shimonoku.clone()
    };
    html! {
        <>
            if let Some(n) = card.ordinal {
                <span class="num">{ n }</span>
            }
            { text }
            { indicator_badge(card) }
        </>
    }
}

fn parse_digits(raw: &str) -> BTreeSet<u8> {
    raw.chars()
        .filter_map(|c| c.to_digit(10))
        .map(|d| d as u8)
        .collect()
}

fn input_value(node: &NodeRef) -> String {
    node.cast::<HtmlInputElement>()
        .map(|input| input.value())
        .unwrap_or_default()
}

#[function_component(App)]
pub fn app() -> Html {
    let controller: SharedController = use_mut_ref(|| DrillController::new(BrowserStore));
    let revision = use_state(|| 0_u32);
    let notice = use_state(|| Option::<String>::None);
    let show_timer = use_state(|| false);

    let bump = {
        let revision = revision.clone();
        Callback::from(move |()| revision.set(revision.wrapping_add(1)))
    };

    let on_advance = {
        let controller = controller.clone();
        let show_timer = show_timer.clone();
        let bump = bump.clone();
        Callback::from(move |_: MouseEvent| {
            if controller.borrow_mut().advance() {
                show_timer.set(true);
            }
            bump.emit(());
        })
    };
    let on_retreat = {
        let controller = controller.clone();
        let show_timer = show_timer.clone();
        let bump = bump.clone();
        Callback::from(move |_: MouseEvent| {
            if controller.borrow_mut().retreat() {
                show_timer.set(true);
            }
            bump.emit(());
        })
    };
    let on_reshuffle = {
        let controller = controller.clone();
        let show_timer = show_timer.clone();
        let notice = notice.clone();
        let bump = bump.clone();
        Callback::from(move |_: MouseEvent| {
            if controller.borrow_mut().reshuffle(&WindowConfirm) {
                show_timer.set(false);
                notice.set(None);
            }
            bump.emit(());
        })
    };
    let on_open_editor = {
        let controller = controller.clone();
        let notice = notice.clone();
        let bump = bump.clone();
        Callback::from(move |_: MouseEvent| {
            controller.borrow_mut().open_editor();
            notice.set(None);
            bump.emit(());
        })
    };

    let ctl = controller.borrow();
    let current = ctl.current_card().clone();
    let next = ctl.next_card().clone();
    let editor_open = ctl.draft().is_some();
    let selected_count = ctl.selected_count();
    drop(ctl);

    html! {
        <main class="drill">
            <section class="kaminoku" onclick={on_advance}>
                { verse(&next, true) }
            </section>
            <section class="shimonoku" onclick={on_retreat}>
                { verse(&current, false) }
            </section>
            if *show_timer {
                <div id="middle-button" class="float-button">
                    <div class="main-circle"></div>
                    <div class="quarter-circle"></div>
                </div>
            }
            <footer class="toolbar">
                <span class="count">{ format!("選択中 {selected_count} 枚") }</span>
                <button onclick={on_reshuffle}>{"シャッフル"}</button>
                <button onclick={on_open_editor}>{"札をえらぶ"}</button>
            </footer>
            if let Some(message) = notice.as_ref() {
                <p class="notice" role="alert">{ message.clone() }</p>
            }
            if editor_open {
                { editor(&controller, &notice, &bump) }
            }
        </main>
    }
}

fn editor(
    controller: &SharedController,
    notice: &UseStateHandle<Option<String>>,
    bump: &Callback<()>,
) -> Html {
    let ctl = controller.borrow();
    let draft = ctl.draft().cloned().unwrap_or_default();
    let catalog = ctl.catalog();
    drop(ctl);

    let ones_ref = NodeRef::default();
    let tens_ref = NodeRef::default();
    let initials_ref = NodeRef::default();
    let count_ref = NodeRef::default();

    let report = |notice: &UseStateHandle<Option<String>>,
                  outcome: Result<usize, SelectionError>| {
        match outcome {
            Ok(added) => notice.set(Some(format!("{added} 枚を追加しました"))),
            Err(err) => notice.set(Some(err.to_string())),
        }
    };

    let on_toggle = |no: u8| {
        let controller = controller.clone();
        let bump = bump.clone();
        Callback::from(move |_: MouseEvent| {
            let _ = controller.borrow_mut().toggle_card(no);
            bump.emit(());
        })
    };

    let on_select_all = {
        let controller = controller.clone();
        let bump = bump.clone();
        Callback::from(move |_: MouseEvent| {
            let _ = controller.borrow_mut().select_all();
            bump.emit(());
        })
    };
    let on_select_none = {
        let controller = controller.clone();
        let bump = bump.clone();
        Callback::from(move |_: MouseEvent| {
            let _ = controller.borrow_mut().select_none();
            bump.emit(());
        })
    };
    let on_blank_mode = {
        let controller = controller.clone();
        let bump = bump.clone();
        Callback::from(move |event: Event| {
            if let Some(input) = event.target_dyn_into::<HtmlInputElement>() {
                let _ = controller.borrow_mut().set_blank_mode(input.checked());
            }
            bump.emit(());
        })
    };
    let on_digit_filter = |place: DigitPlace, node: NodeRef| {
        let controller = controller.clone();
        let notice = notice.clone();
        let bump = bump.clone();
        Callback::from(move |event: SubmitEvent| {
            event.prevent_default();
            let digits = parse_digits(&input_value(&node));
            let outcome = controller.borrow_mut().filter_digits(&digits, place);
            report(&notice, outcome);
            bump.emit(());
        })
    };
    let on_initial_filter = {
        let controller = controller.clone();
        let notice = notice.clone();
        let bump = bump.clone();
        let node = initials_ref.clone();
        Callback::from(move |event: SubmitEvent| {
            event.prevent_default();
            let initials: BTreeSet<char> = input_value(&node)
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect();
            let outcome = controller.borrow_mut().filter_initials(&initials);
            report(&notice, outcome);
            bump.emit(());
        })
    };
    let on_top_up = {
        let controller = controller.clone();
        let notice = notice.clone();
        let bump = bump.clone();
        let node = count_ref.clone();
        Callback::from(move |event: SubmitEvent| {
            event.prevent_default();
            let count = input_value(&node).trim().parse::<usize>().unwrap_or(0);
            match controller.borrow_mut().top_up(count) {
                Ok(TopUpOutcome::Added(n)) => {
                    notice.set(Some(format!("{n} 枚を追加しました")));
                }
                Ok(TopUpOutcome::Partial(n)) => {
                    notice.set(Some(format!("残りが足りず {n} 枚だけ追加しました")));
                }
                Err(err) => notice.set(Some(err.to_string())),
            }
            bump.emit(());
        })
    };
    let on_commit = {
        let controller = controller.clone();
        let notice = notice.clone();
        let bump = bump.clone();
        Callback::from(move |_: MouseEvent| {
            match controller.borrow_mut().commit_draft(&WindowConfirm) {
                Ok(true) => notice.set(None),
                Ok(false) => {}
                Err(err) => notice.set(Some(err.to_string())),
            }
            bump.emit(());
        })
    };
    let on_cancel = {
        let controller = controller.clone();
        let notice = notice.clone();
        let bump = bump.clone();
        Callback::from(move |_: MouseEvent| {
            controller.borrow_mut().cancel_draft();
            notice.set(None);
            bump.emit(());
        })
    };

    let grid = catalog
        .base_cards()
        .iter()
        .map(|card| {
            let class = if draft.is_manual(card.no) {
                "card manual"
            } else if draft.is_selected(card.no) {
                "card selected"
            } else {
                "card"
            };
            html! {
                <button key={card.no.to_string()} class={class} onclick={on_toggle(card.no)}>
                    { card.no }
                    <span class="initial">{ card.initial }</span>
                </button>
            }
        })
        .collect::<Html>();

    html! {
        <dialog open={true} class="editor">
            <header>
                <h2>{"読み札をえらぶ"}</h2>
                <span>{ format!("{} 枚", draft.selected().len()) }</span>
            </header>
            <div class="bulk">
                <button onclick={on_select_all}>{"すべて選ぶ"}</button>
                <button onclick={on_select_none}>{"すべて外す"}</button>
                <label>
                    <input type="checkbox" checked={draft.blank_mode()} onchange={on_blank_mode} />
                    {"空札としてついか"}
                </label>
            </div>
            <form onsubmit={on_digit_filter(DigitPlace::Ones, ones_ref.clone())}>
                <input ref={ones_ref} placeholder="一の位を5つ (例 12345)" />
                <button type="submit">{"一の位でえらぶ"}</button>
            </form>
            <form onsubmit={on_digit_filter(DigitPlace::Tens, tens_ref.clone())}>
                <input ref={tens_ref} placeholder="十の位を5つ (例 06789)" />
                <button type="submit">{"十の位でえらぶ"}</button>
            </form>
            <form onsubmit={on_initial_filter}>
                <input ref={initials_ref} placeholder="はじめの音 (例 あさか)" />
                <button type="submit">{"きまり字でえらぶ"}</button>
            </form>
            <form onsubmit={on_top_up}>
                <input ref={count_ref} type="number" min="1" placeholder="枚数" />
                <button type="submit">{"ランダムについか"}</button>
            </form>
            <div class="grid">{ grid }</div>
            <footer>
                <button class="primary" onclick={on_commit}>{"この札ではじめる"}</button>
                <button onclick={on_cancel}>{"やめる"}</button>
            </footer>
        </dialog>
    }
}

#[cfg(test)]
mod tests {
    use super::parse_digits;

    #[test]
    fn parse_digits_keeps_distinct_digits_only() {
        let digits = parse_digits("1 2 3 4 5");
        assert_eq!(digits.len(), 5);
        assert_eq!(parse_digits("112233").len(), 3);
        assert!(parse_digits("あいう").is_empty());
    }
}
