use crate::config::Config;
use crate::navigator::Navigator;
use crate::ui;
use crate::ui::widgets::resolver::ResolverWidget;
use crate::ui::widgets::{Component, KeyOutcome, WidgetMessage};
use anyhow::Result;
use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use ratatui::DefaultTerminal;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

pub struct App {
    widgets: Vec<Box<dyn Component>>,
    selected: usize,
    status: Option<String>,
    should_quit: bool,
    tx: UnboundedSender<WidgetMessage>,
    rx: UnboundedReceiver<WidgetMessage>,
}

enum Step {
    Terminal(Option<std::io::Result<Event>>),
    Widget(WidgetMessage),
}

impl App {
    pub fn new(config: Config, navigator: Arc<dyn Navigator>) -> Self {
        let mut resolvers = config.resolvers;
        resolvers.sort_by_key(|r| (r.position.row, r.position.col));

        let widgets = resolvers
            .into_iter()
            .map(|resolver| {
                Box::new(ResolverWidget::from_config(
                    resolver,
                    &config.general,
                    Arc::clone(&navigator),
                )) as Box<dyn Component>
            })
            .collect();

        Self::with_widgets(widgets)
    }

    pub fn with_widgets(widgets: Vec<Box<dyn Component>>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut app = Self {
            widgets,
            selected: 0,
            status: None,
            should_quit: false,
            tx,
            rx,
        };
        for widget in app.widgets.iter_mut() {
            widget.on_mount(app.tx.clone());
        }
        app
    }

    pub fn widgets(&self) -> &[Box<dyn Component>] {
        &self.widgets
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub async fn run(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        let mut events = EventStream::new();
        tracing::info!(widgets = self.widgets.len(), "dashboard started");

        while !self.should_quit {
            terminal.draw(|frame| ui::draw(frame, self))?;

            let step = tokio::select! {
                event = events.next() => Step::Terminal(event),
                Some(message) = self.rx.recv() => Step::Widget(message),
            };

            match step {
                Step::Terminal(Some(Ok(Event::Key(key)))) => self.handle_key(key),
                Step::Terminal(Some(Ok(_))) => {}
                Step::Terminal(Some(Err(e))) => {
                    self.shutdown();
                    return Err(e.into());
                }
                Step::Terminal(None) => break,
                Step::Widget(message) => self.route(message),
            }
        }

        self.shutdown();
        Ok(())
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true
            }
            KeyCode::Tab => self.select(self.selected + 1),
            KeyCode::BackTab => self.select(self.selected + self.widgets.len().max(1) - 1),
            _ => {
                let Some(widget) = self.widgets.get_mut(self.selected) else {
                    return;
                };
                match widget.handle_key(key) {
                    KeyOutcome::Notice(message) => self.status = Some(message),
                    KeyOutcome::Handled => self.status = None,
                    KeyOutcome::Ignored => {}
                }
            }
        }
    }

    fn select(&mut self, index: usize) {
        if self.widgets.is_empty() {
            return;
        }
        self.selected = index % self.widgets.len();
    }

    pub fn route(&mut self, message: WidgetMessage) {
        match self
            .widgets
            .iter_mut()
            .find(|w| w.id() == message.widget_id)
        {
            Some(widget) => widget.handle_message(message.event),
            None => tracing::warn!(widget = %message.widget_id, "message for unknown widget"),
        }
    }

    fn shutdown(&mut self) {
        for widget in self.widgets.iter_mut() {
            widget.on_unmount();
        }
        tracing::info!("dashboard stopped");
    }
}
