pub mod api;
pub mod controller;
pub mod cues;
pub mod notifications;
pub mod poller;
pub mod reconcile;
pub mod render;
pub mod seen;
pub mod toasts;
pub mod widget;
