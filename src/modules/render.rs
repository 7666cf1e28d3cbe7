//! Pure projections of notification data into what the user sees.
//!
//! Nothing here touches widget state. The terminal UI consumes [`ListView`]
//! directly; the `*_html` functions produce fragments for embedding in a page,
//! with every user-supplied string escaped.

use chrono::{DateTime, Local};

use super::notifications::{Notification, NotificationId, NotificationKind};

pub const EMPTY_PLACEHOLDER: &str = "No notifications";
pub const EMPTY_ICON: &str = "🔕";
pub const DEFAULT_ICON: &str = "🔔";

const BADGE_CAP: u32 = 99;

const ICONS: &[(NotificationKind, &str)] = &[
    (NotificationKind::OrderNew, "🛒"),
    (NotificationKind::OrderConfirmed, "✅"),
    (NotificationKind::OrderPreparing, "👨‍🍳"),
    (NotificationKind::OrderReady, "✅"),
    (NotificationKind::OrderOnTheWay, "🚚"),
    (NotificationKind::OrderCompleted, "🎉"),
    (NotificationKind::OrderCancelled, "❌"),
    (NotificationKind::LowStock, "⚠️"),
    (NotificationKind::System, "🔔"),
];

/// `None` means the badge is hidden.
pub fn badge_text(count: u32) -> Option<String> {
    match count {
        0 => None,
        n if n > BADGE_CAP => Some(format!("{BADGE_CAP}+")),
        n => Some(n.to_string()),
    }
}

pub fn icon_for(kind: NotificationKind) -> &'static str {
    ICONS
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, icon)| *icon)
        .unwrap_or(DEFAULT_ICON)
}

pub fn relative_time(then: DateTime<Local>, now: DateTime<Local>) -> String {
    let secs = (now - then).num_seconds();
    let minutes = secs / 60;
    let hours = secs / 3_600;
    let days = secs / 86_400;

    if minutes < 1 {
        "now".to_string()
    } else if minutes < 60 {
        format!("{minutes} min ago")
    } else if hours < 24 {
        format!("{hours} hour{} ago", plural(hours))
    } else if days < 7 {
        format!("{days} day{} ago", plural(days))
    } else {
        then.format("%d/%m/%Y %H:%M").to_string()
    }
}

fn plural(n: i64) -> &'static str {
    if n > 1 { "s" } else { "" }
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Strips control characters so server text cannot reach the terminal as
/// escape sequences. Line breaks and tabs become spaces.
pub fn sanitize_terminal(text: &str) -> String {
    text.chars()
        .filter_map(|c| match c {
            '\n' | '\r' | '\t' => Some(' '),
            c if c.is_control() => None,
            c => Some(c),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListItemView {
    pub id: NotificationId,
    pub icon: &'static str,
    pub title: String,
    pub message: String,
    pub when: String,
    pub order_number: Option<String>,
    pub unread: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ListView {
    Empty,
    Items(Vec<ListItemView>),
}

pub fn project_list(notifications: &[Notification], now: DateTime<Local>) -> ListView {
    if notifications.is_empty() {
        return ListView::Empty;
    }
    ListView::Items(
        notifications
            .iter()
            .map(|n| ListItemView {
                id: n.id,
                icon: icon_for(n.kind),
                title: sanitize_terminal(&n.title),
                message: sanitize_terminal(&n.message),
                when: relative_time(n.created_at, now),
                order_number: n.order_number.as_deref().map(sanitize_terminal),
                unread: !n.is_read,
            })
            .collect(),
    )
}

pub fn render_badge_html(count: u32) -> String {
    match badge_text(count) {
        Some(text) => format!(r#"<span class="notifications-badge">{text}</span>"#),
        None => r#"<span class="notifications-badge" hidden></span>"#.to_string(),
    }
}

pub fn render_list_html(view: &ListView) -> String {
    match view {
        ListView::Empty => format!(
            r#"<div class="notifications-empty"><div class="notifications-empty-icon">{EMPTY_ICON}</div><p>{EMPTY_PLACEHOLDER}</p></div>"#
        ),
        ListView::Items(items) => items.iter().map(render_item_html).collect::<Vec<_>>().join("\n"),
    }
}

fn render_item_html(item: &ListItemView) -> String {
    let class = if item.unread { "notification-item unread" } else { "notification-item" };
    let order = item
        .order_number
        .as_deref()
        .map(|o| format!(r#"<div class="notification-order">{}</div>"#, escape_html(o)))
        .unwrap_or_default();
    format!(
        r#"<div class="{class}" data-id="{id}"><div class="notification-icon">{icon}</div><div class="notification-content"><div class="notification-title">{title}</div><div class="notification-message">{message}</div>{order}<div class="notification-date">{when}</div></div></div>"#,
        id = item.id,
        icon = item.icon,
        title = escape_html(&item.title),
        message = escape_html(&item.message),
        when = escape_html(&item.when),
    )
}

pub fn render_toast_html(n: &Notification) -> String {
    format!(
        r#"<div class="notification-toast kind-{kind}"><div class="toast-header"><span class="toast-icon">{icon}</span><strong>{title}</strong><button class="toast-close">×</button></div><div class="toast-body">{message}</div></div>"#,
        kind = kind_slug(n.kind),
        icon = icon_for(n.kind),
        title = escape_html(&n.title),
        message = escape_html(&n.message),
    )
}

fn kind_slug(kind: NotificationKind) -> &'static str {
    match kind {
        NotificationKind::OrderNew => "order_new",
        NotificationKind::OrderConfirmed => "order_confirmed",
        NotificationKind::OrderPreparing => "order_preparing",
        NotificationKind::OrderReady => "order_ready",
        NotificationKind::OrderOnTheWay => "order_on_the_way",
        NotificationKind::OrderCompleted => "order_completed",
        NotificationKind::OrderCancelled => "order_cancelled",
        NotificationKind::LowStock => "low_stock",
        NotificationKind::System => "system",
        NotificationKind::Unknown => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::notifications::sample;
    use chrono::{Duration, TimeZone};

    #[test]
    fn badge_caps_and_hides() {
        assert_eq!(badge_text(0), None);
        assert_eq!(badge_text(1).as_deref(), Some("1"));
        assert_eq!(badge_text(99).as_deref(), Some("99"));
        assert_eq!(badge_text(100).as_deref(), Some("99+"));
        assert_eq!(badge_text(4_000).as_deref(), Some("99+"));
        assert!(render_badge_html(0).contains("hidden"));
    }

    #[test]
    fn relative_time_boundaries() {
        let now = Local.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap();
        let ago = |secs: i64| relative_time(now - Duration::seconds(secs), now);
        assert_eq!(ago(0), "now");
        assert_eq!(ago(59), "now");
        assert_eq!(ago(60), "1 min ago");
        assert_eq!(ago(3_599), "59 min ago");
        assert_eq!(ago(3_600), "1 hour ago");
        assert_eq!(ago(7_200), "2 hours ago");
        assert_eq!(ago(86_399), "23 hours ago");
        assert_eq!(ago(86_400), "1 day ago");
        assert_eq!(ago(604_799), "6 days ago");
        assert_eq!(ago(604_800), "08/06/2025 12:00");
    }

    #[test]
    fn future_timestamps_read_as_now() {
        let now = Local::now();
        assert_eq!(relative_time(now + Duration::minutes(5), now), "now");
    }

    #[test]
    fn script_titles_are_inert() {
        let mut n = sample(1);
        n.title = "<script>alert('x')</script>".to_string();
        n.message = "Tom & \"Jerry\"".to_string();
        n.order_number = Some("<b>7</b>".to_string());

        let list = render_list_html(&project_list(&[n.clone()], Local::now()));
        assert!(!list.contains("<script>"));
        assert!(list.contains("&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;"));
        assert!(list.contains("Tom &amp; &quot;Jerry&quot;"));
        assert!(list.contains("&lt;b&gt;7&lt;/b&gt;"));

        let toast = render_toast_html(&n);
        assert!(!toast.contains("<script>"));
    }

    #[test]
    fn control_characters_are_stripped() {
        assert_eq!(sanitize_terminal("evil\x1b]0;pwned\x07\x1b[2Jtitle"), "evil]0;pwned[2Jtitle");
        assert_eq!(sanitize_terminal("two\nlines\tand\u{9b}csi"), "two lines andcsi");
        assert_eq!(sanitize_terminal("Pedido #7 🛒"), "Pedido #7 🛒");

        let mut n = sample(3);
        n.order_number = Some("A\x1b[31m1".to_string());
        let ListView::Items(items) = project_list(&[n], Local::now()) else {
            panic!("expected items");
        };
        assert_eq!(items[0].order_number.as_deref(), Some("A[31m1"));
    }

    #[test]
    fn unknown_kind_gets_default_icon() {
        assert_eq!(icon_for(NotificationKind::Unknown), DEFAULT_ICON);
        assert_eq!(icon_for(NotificationKind::OrderOnTheWay), "🚚");
    }

    #[test]
    fn empty_list_shows_placeholder() {
        assert_eq!(project_list(&[], Local::now()), ListView::Empty);
        assert!(render_list_html(&ListView::Empty).contains(EMPTY_PLACEHOLDER));
    }

    #[test]
    fn read_items_are_not_flagged_unread() {
        let mut read = sample(2);
        read.is_read = true;
        let ListView::Items(items) = project_list(&[sample(1), read], Local::now()) else {
            panic!("expected items");
        };
        assert!(items[0].unread);
        assert!(!items[1].unread);
        let html = render_list_html(&ListView::Items(items));
        assert_eq!(html.matches("notification-item unread").count(), 1);
    }
}
