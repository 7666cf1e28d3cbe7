use anyhow::Result;
use std::sync::Arc;

use crate::config::Config;
use crate::modules::api::HttpNotificationApi;
use crate::modules::controller::{click_leaves_dropdown, dispatch, Action, DispatchContext, HitMap, UiEvent};
use crate::modules::notifications::NotificationId;
use crate::modules::widget::{Command, NotificationWidget, WidgetSettings};

const IDLE_STATUS: &str = "Press 'b' to open notifications, '?' for help";

pub struct App {
    pub widget: NotificationWidget,
    pub base_url: String,
    pub selected_index: usize,
    pub show_help: bool,
    pub status_message: String,
    pub hits: HitMap,
}

impl App {
    pub fn new(config: &Config) -> Result<Self> {
        let api = Arc::new(HttpNotificationApi::new(config)?);
        let widget = NotificationWidget::new(api, WidgetSettings::from_config(config));
        Ok(Self::with_widget(widget, config.base_url.clone()))
    }

    pub fn with_widget(widget: NotificationWidget, base_url: String) -> Self {
        Self {
            widget,
            base_url,
            selected_index: 0,
            show_help: false,
            status_message: IDLE_STATUS.to_string(),
            hits: HitMap::default(),
        }
    }

    pub fn start(&mut self) {
        self.widget.start();
    }

    pub fn teardown(&mut self) {
        self.widget.teardown();
    }

    pub fn selected(&self) -> Option<NotificationId> {
        self.widget.list().get(self.selected_index).map(|n| n.id)
    }

    /// Applies finished work and keeps the selection inside the list.
    pub fn tick(&mut self) {
        self.widget.drain();
        let len = self.widget.list().len();
        if self.selected_index >= len {
            self.selected_index = len.saturating_sub(1);
        }
        if let Some(failure) = self.widget.last_failure() {
            self.status_message = failure.to_string();
        }
    }

    /// Returns true when the user asked to quit.
    pub fn handle_event(&mut self, event: UiEvent) -> bool {
        let ctx = DispatchContext {
            hits: &self.hits,
            dropdown_open: self.widget.dropdown_open(),
            selected: self.selected(),
            newest_toast: self.widget.toasts().newest().map(|t| t.id),
        };
        let leaves_dropdown = click_leaves_dropdown(event, &ctx);
        let Some(action) = dispatch(event, &ctx) else {
            return false;
        };

        match action {
            Action::Quit => return true,
            Action::ToggleHelp => self.show_help = !self.show_help,
            Action::MoveSelection(delta) => self.move_selection(delta),
            Action::Widget(command) => {
                self.status_message = match command {
                    Command::MarkRead(id) => format!("Marking notification {} as read", id),
                    Command::OpenToast(_) => "Opening notification".to_string(),
                    Command::MarkAllRead => "Marking all notifications as read".to_string(),
                    Command::PollNow => "Checking for notifications".to_string(),
                    Command::ToggleDropdown | Command::CloseDropdown | Command::DismissToast(_) => IDLE_STATUS.to_string(),
                };
                if command == Command::ToggleDropdown && !self.widget.dropdown_open() {
                    self.selected_index = 0;
                }
                self.widget.execute(command);
                if leaves_dropdown && self.widget.dropdown_open() {
                    self.widget.execute(Command::CloseDropdown);
                }
            }
        }
        false
    }

    fn move_selection(&mut self, delta: i32) {
        let max = self.widget.list().len();
        if max == 0 { return; }
        self.selected_index = if delta < 0 {
            if self.selected_index == 0 { max - 1 } else { self.selected_index - 1 }
        } else {
            (self.selected_index + 1) % max
        };
    }
}
