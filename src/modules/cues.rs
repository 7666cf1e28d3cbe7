use std::io::{IsTerminal, Write};

use super::notifications::Notification;
use super::render::icon_for;
use crate::error::PlaybackUnavailable;

/// Side effects that accompany a new toast: a short audio cue and,
/// optionally, a desktop notification. Both are best effort.
#[derive(Debug, Clone, Copy, Default)]
pub struct Cues {
    pub sound: bool,
    pub desktop: bool,
}

impl Cues {
    pub fn announce(&self, notification: &Notification) {
        if self.sound {
            if let Err(e) = play_bell() {
                tracing::debug!(error = %e, "skipping audio cue");
            }
        }
        if self.desktop {
            let summary = format!("{} {}", icon_for(notification.kind), notification.title);
            let body = notification.message.clone();
            tokio::task::spawn_blocking(move || {
                if let Err(e) = notify_rust::Notification::new()
                    .appname("notibell")
                    .summary(&summary)
                    .body(&body)
                    .show()
                {
                    tracing::debug!(error = %e, "desktop notification failed");
                }
            });
        }
    }
}

fn play_bell() -> Result<(), PlaybackUnavailable> {
    let mut out = std::io::stdout();
    if !out.is_terminal() {
        return Err(PlaybackUnavailable("stdout is not a terminal".to_string()));
    }
    out.write_all(b"\x07")
        .and_then(|_| out.flush())
        .map_err(|e| PlaybackUnavailable(e.to_string()))
}
