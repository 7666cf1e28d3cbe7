use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::layout::Rect;

use super::notifications::NotificationId;
use super::toasts::ToastId;
use super::widget::Command;

/// Input as the controller sees it, already stripped of terminal details.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiEvent {
    Key { code: KeyCode, modifiers: KeyModifiers },
    Click { column: u16, row: u16 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Widget(Command),
    MoveSelection(i32),
    ToggleHelp,
    Quit,
}

/// Screen regions from the last drawn frame.
#[derive(Debug, Default, Clone)]
pub struct HitMap {
    pub bell: Option<Rect>,
    pub dropdown: Option<Rect>,
    pub mark_all: Option<Rect>,
    pub items: Vec<(Rect, NotificationId)>,
    pub toasts: Vec<(Rect, ToastId)>,
    pub toast_close: Vec<(Rect, ToastId)>,
}

/// The bits of UI state the dispatch table needs to resolve an event.
#[derive(Debug, Clone)]
pub struct DispatchContext<'a> {
    pub hits: &'a HitMap,
    pub dropdown_open: bool,
    pub selected: Option<NotificationId>,
    pub newest_toast: Option<ToastId>,
}

impl<'a> DispatchContext<'a> {
    #[cfg(test)]
    pub fn new(hits: &'a HitMap) -> Self {
        Self { hits, dropdown_open: false, selected: None, newest_toast: None }
    }
}

fn within(r: Rect, column: u16, row: u16) -> bool {
    column >= r.x && column < r.x.saturating_add(r.width) && row >= r.y && row < r.y.saturating_add(r.height)
}

fn hit<T: Copy>(regions: &[(Rect, T)], column: u16, row: u16) -> Option<T> {
    regions.iter().find(|(r, _)| within(*r, column, row)).map(|(_, v)| *v)
}

pub fn dispatch(event: UiEvent, ctx: &DispatchContext<'_>) -> Option<Action> {
    match event {
        UiEvent::Key { code, modifiers } => dispatch_key(code, modifiers, ctx),
        UiEvent::Click { column, row } => dispatch_click(column, row, ctx),
    }
}

/// True when `event` is a click that lands outside the open dropdown and
/// outside the bell. Such a click closes the dropdown whatever else it hits.
pub fn click_leaves_dropdown(event: UiEvent, ctx: &DispatchContext<'_>) -> bool {
    let UiEvent::Click { column, row } = event else {
        return false;
    };
    let inside = |r: Option<Rect>| r.is_some_and(|r| within(r, column, row));
    ctx.dropdown_open && !inside(ctx.hits.dropdown) && !inside(ctx.hits.bell)
}

fn dispatch_key(code: KeyCode, modifiers: KeyModifiers, ctx: &DispatchContext<'_>) -> Option<Action> {
    let action = match code {
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => Action::Quit,
        KeyCode::Char('q') => Action::Quit,
        KeyCode::Char('?') => Action::ToggleHelp,
        KeyCode::Char('b') => Action::Widget(Command::ToggleDropdown),
        KeyCode::Esc if ctx.dropdown_open => Action::Widget(Command::CloseDropdown),
        KeyCode::Down | KeyCode::Char('j') if ctx.dropdown_open => Action::MoveSelection(1),
        KeyCode::Up | KeyCode::Char('k') if ctx.dropdown_open => Action::MoveSelection(-1),
        KeyCode::Enter if ctx.dropdown_open => Action::Widget(Command::MarkRead(ctx.selected?)),
        KeyCode::Char('a') => Action::Widget(Command::MarkAllRead),
        KeyCode::Char('t') => Action::Widget(Command::OpenToast(ctx.newest_toast?)),
        KeyCode::Char('x') => Action::Widget(Command::DismissToast(ctx.newest_toast?)),
        KeyCode::Char('r') => Action::Widget(Command::PollNow),
        _ => return None,
    };
    Some(action)
}

fn dispatch_click(column: u16, row: u16, ctx: &DispatchContext<'_>) -> Option<Action> {
    let hits = ctx.hits;
    if let Some(toast) = hit(&hits.toast_close, column, row) {
        return Some(Action::Widget(Command::DismissToast(toast)));
    }
    if let Some(toast) = hit(&hits.toasts, column, row) {
        return Some(Action::Widget(Command::OpenToast(toast)));
    }
    if hits.bell.is_some_and(|r| within(r, column, row)) {
        return Some(Action::Widget(Command::ToggleDropdown));
    }
    if !ctx.dropdown_open {
        return None;
    }
    if hits.dropdown.is_some_and(|r| within(r, column, row)) {
        if hits.mark_all.is_some_and(|r| within(r, column, row)) {
            return Some(Action::Widget(Command::MarkAllRead));
        }
        return hit(&hits.items, column, row).map(|id| Action::Widget(Command::MarkRead(id)));
    }
    Some(Action::Widget(Command::CloseDropdown))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> UiEvent {
        UiEvent::Key { code, modifiers: KeyModifiers::NONE }
    }

    fn click(column: u16, row: u16) -> UiEvent {
        UiEvent::Click { column, row }
    }

    fn layout() -> HitMap {
        HitMap {
            bell: Some(Rect::new(70, 0, 10, 3)),
            dropdown: Some(Rect::new(40, 3, 40, 12)),
            mark_all: Some(Rect::new(41, 13, 16, 1)),
            items: vec![(Rect::new(41, 4, 38, 1), NotificationId(11)), (Rect::new(41, 5, 38, 1), NotificationId(12))],
            toasts: vec![(Rect::new(40, 16, 40, 4), ToastId(1))],
            toast_close: vec![(Rect::new(76, 16, 3, 1), ToastId(1))],
        }
    }

    fn open(hits: &HitMap) -> DispatchContext<'_> {
        DispatchContext { hits, dropdown_open: true, selected: Some(NotificationId(12)), newest_toast: Some(ToastId(1)) }
    }

    #[test]
    fn bell_toggles() {
        let hits = layout();
        let closed = DispatchContext::new(&hits);
        assert_eq!(dispatch(click(72, 1), &closed), Some(Action::Widget(Command::ToggleDropdown)));
        assert_eq!(dispatch(key(KeyCode::Char('b')), &closed), Some(Action::Widget(Command::ToggleDropdown)));
    }

    #[test]
    fn outside_click_closes_inside_click_does_not() {
        let hits = layout();
        let ctx = open(&hits);
        assert_eq!(dispatch(click(2, 10), &ctx), Some(Action::Widget(Command::CloseDropdown)));
        assert_eq!(dispatch(click(60, 9), &ctx), None);
        let closed = DispatchContext { dropdown_open: false, ..ctx };
        assert_eq!(dispatch(click(2, 10), &closed), None);
    }

    #[test]
    fn dropdown_actions() {
        let hits = layout();
        let ctx = open(&hits);
        assert_eq!(dispatch(click(45, 5), &ctx), Some(Action::Widget(Command::MarkRead(NotificationId(12)))));
        assert_eq!(dispatch(click(45, 13), &ctx), Some(Action::Widget(Command::MarkAllRead)));
        assert_eq!(dispatch(key(KeyCode::Enter), &ctx), Some(Action::Widget(Command::MarkRead(NotificationId(12)))));
        assert_eq!(dispatch(key(KeyCode::Char('j')), &ctx), Some(Action::MoveSelection(1)));
        assert_eq!(dispatch(key(KeyCode::Esc), &ctx), Some(Action::Widget(Command::CloseDropdown)));
    }

    #[test]
    fn toast_body_and_close_differ() {
        let hits = layout();
        let ctx = open(&hits);
        assert_eq!(dispatch(click(50, 17), &ctx), Some(Action::Widget(Command::OpenToast(ToastId(1)))));
        assert_eq!(dispatch(click(77, 16), &ctx), Some(Action::Widget(Command::DismissToast(ToastId(1)))));
        assert_eq!(dispatch(key(KeyCode::Char('x')), &ctx), Some(Action::Widget(Command::DismissToast(ToastId(1)))));
    }

    #[test]
    fn toast_click_also_leaves_dropdown() {
        let hits = layout();
        let ctx = open(&hits);
        assert!(click_leaves_dropdown(click(50, 17), &ctx));
        assert!(click_leaves_dropdown(click(2, 10), &ctx));
        assert!(!click_leaves_dropdown(click(60, 9), &ctx));
        assert!(!click_leaves_dropdown(click(72, 1), &ctx));
        assert!(!click_leaves_dropdown(key(KeyCode::Char('t')), &ctx));
        let closed = DispatchContext { dropdown_open: false, ..ctx };
        assert!(!click_leaves_dropdown(click(50, 17), &closed));
    }

    #[test]
    fn keys_without_target_are_ignored() {
        let hits = HitMap::default();
        let ctx = DispatchContext::new(&hits);
        assert_eq!(dispatch(key(KeyCode::Char('t')), &ctx), None);
        assert_eq!(dispatch(key(KeyCode::Enter), &ctx), None);
        assert_eq!(dispatch(key(KeyCode::Char('q')), &ctx), Some(Action::Quit));
        let ctrl_c = UiEvent::Key { code: KeyCode::Char('c'), modifiers: KeyModifiers::CONTROL };
        assert_eq!(dispatch(ctrl_c, &ctx), Some(Action::Quit));
    }
}
