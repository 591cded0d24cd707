pub mod resolver;

use crate::error::ResolveError;
use crossterm::event::KeyEvent;
use ratatui::{layout::Rect, Frame};
use tokio::sync::mpsc::UnboundedSender;

/// Completion of a background task, routed back to the widget that started it.
#[derive(Debug, Clone)]
pub struct WidgetMessage {
    pub widget_id: String,
    pub event: WidgetEvent,
}

#[derive(Debug, Clone)]
pub enum WidgetEvent {
    DebounceElapsed {
        generation: u64,
    },
    ResolveFinished {
        seq: u64,
        identifier: String,
        result: Result<String, ResolveError>,
    },
}

/// What the host should do after a key was offered to a component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    Handled,
    Ignored,
    /// Handled, with a message for the status bar.
    Notice(String),
}

/// A dashboard component. The host mounts it with a channel for its background
/// tasks, forwards keys while it is focused and routes its messages back.
/// Focus is owned by the host and passed to `render`.
pub trait Component {
    fn id(&self) -> String;
    fn title(&self) -> &str;
    fn position(&self) -> (usize, usize);
    fn render(&self, frame: &mut Frame, area: Rect, selected: bool);
    fn on_mount(&mut self, tx: UnboundedSender<WidgetMessage>);
    fn on_unmount(&mut self);
    fn handle_key(&mut self, key: KeyEvent) -> KeyOutcome;
    fn handle_message(&mut self, event: WidgetEvent);
}
