use chrono::Local;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::App;
use crate::modules::controller::HitMap;
use crate::modules::render::{icon_for, project_list, sanitize_terminal, ListView, EMPTY_ICON, EMPTY_PLACEHOLDER};
use crate::modules::toasts::ToastPhase;

const DROPDOWN_WIDTH: u16 = 60;
const TOAST_WIDTH: u16 = 44;
const TOAST_HEIGHT: u16 = 4;
const ITEM_HEIGHT: u16 = 2;
const MARK_ALL_LABEL: &str = "[ Mark all as read ]";

/// Draws one frame and returns the clickable regions it produced.
pub fn draw(f: &mut Frame, app: &App) -> HitMap {
    let mut hits = HitMap::default();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(4),
        ])
        .split(f.area());

    draw_title(f, chunks[0], app, &mut hits);
    draw_body(f, chunks[1]);
    if app.widget.dropdown_open() {
        draw_dropdown(f, chunks[1], app, &mut hits);
    }
    draw_toasts(f, chunks[1], app, &mut hits);
    draw_status(f, app, chunks[2]);

    if app.show_help {
        draw_help_popup(f);
    }
    hits
}

fn draw_title(f: &mut Frame, area: Rect, app: &App, hits: &mut HitMap) {
    let parts = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(12)])
        .split(area);

    let time_str = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let state = if app.widget.is_polling() { "live" } else { "stopped" };
    let title = Paragraph::new(format!("notibell | {} | {} | {}", app.base_url, state, time_str))
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, parts[0]);

    let mut spans = vec![Span::raw("🔔")];
    if let Some(badge) = app.widget.badge() {
        spans.push(Span::raw(" "));
        spans.push(Span::styled(badge, Style::default().fg(Color::White).bg(Color::Red).add_modifier(Modifier::BOLD)));
    }
    let bell_style = if app.widget.dropdown_open() { Style::default().fg(Color::Yellow) } else { Style::default() };
    let bell = Paragraph::new(Line::from(spans))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).border_style(bell_style));
    f.render_widget(bell, parts[1]);
    hits.bell = Some(parts[1]);
}

fn draw_body(f: &mut Frame, area: Rect) {
    let hint = Paragraph::new("Notifications appear here as they arrive.\nClick the bell or press 'b' to see them all.")
        .style(Style::default().fg(Color::DarkGray))
        .wrap(Wrap { trim: true });
    f.render_widget(hint, Rect { x: area.x + 1, y: area.y + 1, width: area.width.saturating_sub(2), height: area.height.saturating_sub(1) });
}

fn draw_dropdown(f: &mut Frame, body: Rect, app: &App, hits: &mut HitMap) {
    let width = DROPDOWN_WIDTH.min(body.width);
    let area = Rect { x: body.x + body.width - width, y: body.y, width, height: body.height };
    hits.dropdown = Some(area);

    f.render_widget(Clear, area);
    let title = match app.widget.unread_count() {
        0 => "Notifications".to_string(),
        n => format!("Notifications ({} unread)", n),
    };
    f.render_widget(
        Block::default().title(title).borders(Borders::ALL).border_style(Style::default().fg(Color::Yellow)),
        area,
    );

    let inner = Rect {
        x: area.x + 1,
        y: area.y + 1,
        width: area.width.saturating_sub(2),
        height: area.height.saturating_sub(2),
    };
    if inner.height < 2 {
        return;
    }
    let list_area = Rect { height: inner.height - 1, ..inner };
    let footer = Rect { y: inner.y + inner.height - 1, height: 1, ..inner };

    let mark_all = Rect { width: (MARK_ALL_LABEL.len() as u16).min(footer.width), ..footer };
    f.render_widget(Paragraph::new(MARK_ALL_LABEL).style(Style::default().fg(Color::Cyan)), mark_all);
    hits.mark_all = Some(mark_all);

    if !app.widget.list_loaded() {
        f.render_widget(Paragraph::new("Loading..."), list_area);
        return;
    }

    let items = match project_list(app.widget.list(), Local::now()) {
        ListView::Empty => {
            let empty = Paragraph::new(format!("{} {}", EMPTY_ICON, EMPTY_PLACEHOLDER)).alignment(Alignment::Center);
            f.render_widget(empty, list_area);
            return;
        }
        ListView::Items(items) => items,
    };

    // Windowed list, keeping the selection in view.
    let visible = (list_area.height / ITEM_HEIGHT) as usize;
    let start = app.selected_index.saturating_sub(visible / 2);
    let end = usize::min(start + visible, items.len());

    for (row, (i, item)) in items.iter().enumerate().skip(start).take(end.saturating_sub(start)).enumerate() {
        let rect = Rect {
            y: list_area.y + row as u16 * ITEM_HEIGHT,
            height: ITEM_HEIGHT,
            ..list_area
        };
        let mut title_style = if item.unread { Style::default().add_modifier(Modifier::BOLD) } else { Style::default().fg(Color::Gray) };
        if i == app.selected_index {
            title_style = title_style.fg(Color::Yellow);
        }
        let marker = if item.unread { "● " } else { "  " };
        let mut detail = format!("   {} · {}", item.message, item.when);
        if let Some(order) = &item.order_number {
            detail = format!("   [{}] {} · {}", order, item.message, item.when);
        }
        let lines = vec![
            Line::from(vec![Span::raw(marker), Span::raw(format!("{} ", item.icon)), Span::styled(item.title.clone(), title_style)]),
            Line::from(Span::styled(detail, Style::default().fg(Color::DarkGray))),
        ];
        f.render_widget(Paragraph::new(lines), rect);
        hits.items.push((rect, item.id));
    }
}

fn draw_toasts(f: &mut Frame, body: Rect, app: &App, hits: &mut HitMap) {
    let toasts: Vec<_> = app.widget.toasts().iter().collect();
    let width = TOAST_WIDTH.min(body.width);
    let bottom = body.y + body.height;

    // Newest at the bottom, older ones stacked above it.
    for (slot, toast) in toasts.iter().rev().enumerate() {
        let offset = (slot as u16 + 1) * TOAST_HEIGHT;
        if offset > body.height {
            break;
        }
        let area = Rect { x: body.x + body.width - width, y: bottom - offset, width, height: TOAST_HEIGHT };
        let n = &toast.notification;
        let color = match toast.phase {
            ToastPhase::Visible => Color::Green,
            ToastPhase::Fading => Color::DarkGray,
        };

        f.render_widget(Clear, area);
        let block = Block::default()
            .title(format!("{} {}", icon_for(n.kind), sanitize_terminal(&n.title)))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(color));
        let body_text = Paragraph::new(sanitize_terminal(&n.message))
            .style(Style::default().fg(if toast.phase == ToastPhase::Fading { Color::DarkGray } else { Color::White }))
            .wrap(Wrap { trim: true })
            .block(block);
        f.render_widget(body_text, area);

        let close = Rect { x: area.x + area.width.saturating_sub(4), y: area.y, width: 3u16.min(area.width), height: 1 };
        f.render_widget(Paragraph::new("[x]").style(Style::default().fg(color)), close);

        hits.toast_close.push((close, toast.id));
        hits.toasts.push((area, toast.id));
    }
}

fn draw_status(f: &mut Frame, app: &App, area: Rect) {
    let help_text = if app.widget.dropdown_open() {
        "q: Quit | b/Esc: Close | ↑↓/jk: Navigate | Enter: Mark read | a: Mark all read | r: Refresh"
    } else {
        "q: Quit | b: Notifications | t: Open toast | x: Close toast | a: Mark all read | r: Refresh | ?: Help"
    };

    let status = Paragraph::new(vec![
        Line::from(sanitize_terminal(&app.status_message)),
        Line::from(help_text),
    ])
    .block(Block::default().borders(Borders::ALL));

    f.render_widget(status, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

fn draw_help_popup(f: &mut Frame) {
    let area = centered_rect(60, 60, f.area());
    let help = "notibell Help\n\nKeys:\n  b: Open/close notifications\n  j/k or ↑/↓: Navigate list\n  Enter: Mark selected as read\n  a: Mark all as read\n  t: Open newest toast (marks it read)\n  x: Close newest toast\n  r: Check now\n  Esc: Close list\n  ?: Toggle this help\n  q: Quit\n\nMouse:\n  Click the bell to toggle, click outside to close,\n  click an item or toast to mark it read.";

    let paragraph = Paragraph::new(help)
        .block(
            Block::default()
                .title("Help")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .wrap(Wrap { trim: false });

    f.render_widget(Clear, area);
    f.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::notifications::sample;
    use crate::modules::widget::testing::{settle, widget, FakeApi};
    use crate::modules::widget::Command;
    use ratatui::{backend::TestBackend, Terminal};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn frame_exposes_bell_items_and_toasts() {
        let api = Arc::new(FakeApi::default());
        api.push_unread(120, vec![sample(1)]);
        api.push_list(vec![sample(1), sample(2)]);
        let mut app = App::with_widget(widget(&api), "http://test".into());
        app.widget.execute(Command::PollNow);
        app.widget.execute(Command::ToggleDropdown);
        settle(&mut app.widget).await;

        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        let mut hits = HitMap::default();
        terminal.draw(|f| hits = draw(f, &app)).unwrap();

        assert!(hits.bell.is_some());
        assert!(hits.dropdown.is_some());
        assert!(hits.mark_all.is_some());
        assert_eq!(hits.items.len(), 2);
        assert_eq!(hits.toasts.len(), 1);
        assert_eq!(hits.toast_close.len(), 1);

        let screen: String = terminal.backend().buffer().content().iter().map(|c| c.symbol()).collect();
        assert!(screen.contains("99+"));
    }

    #[tokio::test(start_paused = true)]
    async fn server_text_cannot_emit_escape_sequences() {
        let mut hostile = sample(1);
        hostile.title = "evil\x1b]0;pwned\x07\x1b[2Jtitle".to_string();
        hostile.message = "msg\x1b[31mred".to_string();
        hostile.order_number = Some("\x1b[H7".to_string());
        let api = Arc::new(FakeApi::default());
        api.push_unread(1, vec![hostile.clone()]);
        api.push_list(vec![hostile]);
        let mut app = App::with_widget(widget(&api), "http://test".into());
        app.widget.execute(Command::PollNow);
        app.widget.execute(Command::ToggleDropdown);
        settle(&mut app.widget).await;
        assert_eq!(app.widget.toasts().len(), 1);

        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        terminal.draw(|f| { draw(f, &app); }).unwrap();

        let screen: String = terminal.backend().buffer().content().iter().map(|c| c.symbol()).collect();
        assert_eq!(screen.chars().filter(|c| c.is_control()).count(), 0);
        assert!(screen.contains("evil]0;pwned[2Jtitle"));
    }
}
