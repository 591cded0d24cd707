use crate::config::{FollowMode, GeneralConfig, Normalize, ResolverConfig};
use crate::error::ResolveError;
use crate::navigator::Navigator;
use crate::resolver::http::HttpResolver;
use crate::resolver::identifier::{clean_igsn, is_resolvable};
use crate::resolver::{Resolution, Resolver};
use crate::ui::widgets::{Component, KeyOutcome, WidgetEvent, WidgetMessage};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

const PLACEHOLDER: &str = "AU1243";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetPhase {
    Idle,
    PendingDebounce,
    Loading,
    Resolved,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Empty,
    Loading,
    Text(String),
    Error(String),
}

impl Output {
    pub fn as_text(&self) -> String {
        match self {
            Output::Empty => String::new(),
            Output::Loading => "Loading...".to_string(),
            Output::Text(text) => text.clone(),
            Output::Error(e) => format!("Error: {}", e),
        }
    }
}

struct PendingTimer {
    generation: u64,
    handle: JoinHandle<()>,
}

/// Resolves the typed identifier once input has been stable for the debounce
/// delay and shows the first record the service returns.
pub struct ResolverWidget {
    id: String,
    title: String,
    position: (usize, usize),
    follow_mode: FollowMode,
    normalize: Normalize,
    debounce: Duration,
    request_timeout: Duration,
    resolver: Arc<dyn Resolver>,
    navigator: Arc<dyn Navigator>,
    tx: Option<UnboundedSender<WidgetMessage>>,
    identifier: String,
    last_target: Option<String>,
    summary: Option<String>,
    output: Output,
    resolved: bool,
    timer_generation: u64,
    pending_timer: Option<PendingTimer>,
    request_seq: u64,
    in_flight: Option<JoinHandle<()>>,
    scroll: u16,
}

impl ResolverWidget {
    pub fn new(
        config: ResolverConfig,
        general: &GeneralConfig,
        resolver: Arc<dyn Resolver>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            id: format!("resolver-{}-{}", config.position.row, config.position.col),
            title: config.title,
            position: (config.position.row, config.position.col),
            follow_mode: config.follow_mode,
            normalize: config.normalize,
            debounce: general.debounce(),
            request_timeout: general.request_timeout(),
            resolver,
            navigator,
            tx: None,
            identifier: String::new(),
            last_target: None,
            summary: None,
            output: Output::Empty,
            resolved: false,
            timer_generation: 0,
            pending_timer: None,
            request_seq: 0,
            in_flight: None,
            scroll: 0,
        }
    }

    /// Widget backed by the HTTP resolver at the configured service base URL.
    pub fn from_config(
        config: ResolverConfig,
        general: &GeneralConfig,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let resolver = Arc::new(HttpResolver::new(
            config.service_base_url.clone(),
            general.request_timeout(),
        ));
        Self::new(config, general, resolver, navigator)
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn last_target(&self) -> Option<&str> {
        self.last_target.as_deref()
    }

    pub fn output(&self) -> &Output {
        &self.output
    }

    pub fn phase(&self) -> WidgetPhase {
        if self.pending_timer.is_some() {
            WidgetPhase::PendingDebounce
        } else if self.in_flight.is_some() {
            WidgetPhase::Loading
        } else if self.resolved {
            WidgetPhase::Resolved
        } else {
            WidgetPhase::Idle
        }
    }

    /// Stores the new text and restarts the debounce timer. The lookup reads
    /// the identifier again when the timer fires.
    pub fn on_input_changed(&mut self, text: &str) {
        self.identifier = text.to_string();
        self.cancel_timer();

        let Some(tx) = self.tx.clone() else {
            tracing::warn!(widget = %self.id, "input change on an unmounted widget");
            return;
        };

        self.timer_generation += 1;
        let generation = self.timer_generation;
        let widget_id = self.id.clone();
        let delay = self.debounce;

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(WidgetMessage {
                widget_id,
                event: WidgetEvent::DebounceElapsed { generation },
            });
        });
        self.pending_timer = Some(PendingTimer { generation, handle });
    }

    fn lookup_identifier(&self) -> String {
        match self.normalize {
            Normalize::None => self.identifier.clone(),
            Normalize::Igsn => clean_igsn(&self.identifier),
        }
    }

    /// Starts a lookup of `identifier`, superseding any lookup in flight.
    pub fn resolve(&mut self, identifier: &str) {
        self.request_seq += 1;
        if let Some(handle) = self.in_flight.take() {
            handle.abort();
        }
        self.scroll = 0;

        if !is_resolvable(identifier) {
            self.output = Output::Empty;
            self.summary = None;
            self.resolved = false;
            return;
        }

        let Some(tx) = self.tx.clone() else {
            tracing::warn!(widget = %self.id, "resolve on an unmounted widget");
            return;
        };

        self.output = Output::Loading;

        let seq = self.request_seq;
        let widget_id = self.id.clone();
        let identifier = identifier.to_string();
        let resolver = Arc::clone(&self.resolver);
        let timeout = self.request_timeout;

        let handle = tokio::spawn(async move {
            let result = match tokio::time::timeout(timeout, resolver.resolve(&identifier)).await
            {
                Ok(result) => result,
                Err(_) => Err(ResolveError::Timeout(timeout)),
            };
            let _ = tx.send(WidgetMessage {
                widget_id,
                event: WidgetEvent::ResolveFinished {
                    seq,
                    identifier,
                    result,
                },
            });
        });
        self.in_flight = Some(handle);
    }

    fn finish_resolve(&mut self, seq: u64, identifier: &str, result: Result<String, ResolveError>) {
        if seq != self.request_seq {
            tracing::debug!(
                widget = %self.id,
                seq,
                current = self.request_seq,
                "discarding stale response"
            );
            return;
        }
        self.in_flight = None;
        self.resolved = true;
        self.scroll = 0;

        match result {
            Ok(body) => {
                let resolution = Resolution::from_body(&body);
                self.last_target = resolution.target().map(str::to_string);
                self.summary = resolution
                    .info()
                    .map(|info| info.summary())
                    .filter(|s| !s.is_empty());
                self.output = Output::Text(resolution.display_text(identifier));
                tracing::info!(
                    widget = %self.id,
                    identifier,
                    target = ?self.last_target,
                    can_follow = self.last_target.is_some(),
                    "identifier resolved"
                );
            }
            Err(e) => {
                tracing::warn!(widget = %self.id, identifier, error = %e, "resolve failed");
                self.last_target = None;
                self.summary = None;
                self.output = Output::Error(e.to_string());
            }
        }
    }

    /// Opens the last resolved target. Returns whether there was one.
    pub fn follow(&self) -> anyhow::Result<bool> {
        match self.last_target {
            Some(ref target) => {
                self.navigator.open(target, self.follow_mode)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.pending_timer.take() {
            timer.handle.abort();
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.tx.is_some()
    }

    fn max_scroll(&self) -> u16 {
        let lines = self.output.as_text().lines().count();
        u16::try_from(lines.saturating_sub(1)).unwrap_or(u16::MAX)
    }

    fn phase_label(&self) -> Option<&'static str> {
        match self.phase() {
            WidgetPhase::PendingDebounce => Some("typing"),
            WidgetPhase::Loading => Some("loading"),
            WidgetPhase::Idle | WidgetPhase::Resolved => None,
        }
    }
}

impl Component for ResolverWidget {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn position(&self) -> (usize, usize) {
        self.position
    }

    fn render(&self, frame: &mut Frame, area: Rect, selected: bool) {
        let border_style = if selected {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::White)
        };

        let title = match self.phase_label() {
            Some(label) => format!(" {} [{}] ", self.title, label),
            None => format!(" {} ", self.title),
        };

        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(border_style);

        let inner = block.inner(area);
        frame.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(1),
            ])
            .split(inner);

        let input_line = if self.identifier.is_empty() {
            Line::from(vec![
                Span::styled("> ", Style::default().fg(Color::Cyan)),
                Span::styled(PLACEHOLDER, Style::default().fg(Color::DarkGray)),
            ])
        } else {
            let mut spans = vec![
                Span::styled("> ", Style::default().fg(Color::Cyan)),
                Span::styled(
                    self.identifier.as_str(),
                    Style::default()
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD),
                ),
            ];
            if selected {
                spans.push(Span::styled("_", Style::default().fg(Color::Yellow)));
            }
            Line::from(spans)
        };
        frame.render_widget(Paragraph::new(input_line), chunks[0]);

        let follow_line = match self.last_target {
            Some(ref target) => Line::from(vec![
                Span::styled("[Enter ↗] ", Style::default().fg(Color::Green)),
                Span::styled(target.as_str(), Style::default().fg(Color::Cyan)),
            ]),
            None => Line::from(Span::styled(
                "[Enter ↗] no target",
                Style::default().fg(Color::DarkGray),
            )),
        };
        frame.render_widget(Paragraph::new(follow_line), chunks[1]);

        if let Some(ref summary) = self.summary {
            let summary_line = Line::from(Span::styled(
                summary.as_str(),
                Style::default().fg(Color::DarkGray),
            ));
            frame.render_widget(Paragraph::new(summary_line), chunks[2]);
        }

        let output_style = match self.output {
            Output::Error(_) => Style::default().fg(Color::Red),
            Output::Loading => Style::default().fg(Color::Yellow),
            _ => Style::default().fg(Color::White),
        };
        let output = Paragraph::new(self.output.as_text())
            .style(output_style)
            .wrap(Wrap { trim: false })
            .scroll((self.scroll, 0));
        frame.render_widget(output, chunks[3]);
    }

    fn on_mount(&mut self, tx: UnboundedSender<WidgetMessage>) {
        tracing::debug!(widget = %self.id, "mounted");
        self.tx = Some(tx);
    }

    fn on_unmount(&mut self) {
        let Some(_tx) = self.tx.take() else {
            return;
        };
        self.cancel_timer();
        if let Some(handle) = self.in_flight.take() {
            handle.abort();
        }
        tracing::debug!(widget = %self.id, "unmounted");
    }

    fn handle_key(&mut self, key: KeyEvent) -> KeyOutcome {
        match key.code {
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.on_input_changed("");
                KeyOutcome::Handled
            }
            KeyCode::Char(c)
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                let mut text = self.identifier.clone();
                text.push(c);
                self.on_input_changed(&text);
                KeyOutcome::Handled
            }
            KeyCode::Backspace => {
                let mut text = self.identifier.clone();
                text.pop();
                self.on_input_changed(&text);
                KeyOutcome::Handled
            }
            KeyCode::Enter => match self.follow() {
                Ok(true) => KeyOutcome::Notice(format!(
                    "Opened {}",
                    self.last_target.as_deref().unwrap_or_default()
                )),
                Ok(false) => KeyOutcome::Handled,
                Err(e) => {
                    tracing::error!(widget = %self.id, error = %e, "follow failed");
                    KeyOutcome::Notice(format!("Error: {:#}", e))
                }
            },
            KeyCode::Up => {
                self.scroll = self.scroll.saturating_sub(1);
                KeyOutcome::Handled
            }
            KeyCode::Down => {
                if self.scroll < self.max_scroll() {
                    self.scroll += 1;
                }
                KeyOutcome::Handled
            }
            _ => KeyOutcome::Ignored,
        }
    }

    fn handle_message(&mut self, event: WidgetEvent) {
        match event {
            WidgetEvent::DebounceElapsed { generation } => {
                let current = self
                    .pending_timer
                    .as_ref()
                    .is_some_and(|timer| timer.generation == generation);
                if !current {
                    return;
                }
                self.pending_timer = None;
                let identifier = self.lookup_identifier();
                self.resolve(&identifier);
            }
            WidgetEvent::ResolveFinished {
                seq,
                identifier,
                result,
            } => self.finish_resolve(seq, &identifier, result),
        }
    }
}

impl Drop for ResolverWidget {
    fn drop(&mut self) {
        self.on_unmount();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Position;
    use crate::navigator::testing::RecordingNavigator;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    /// Answers from a canned table, after an optional delay.
    #[derive(Default)]
    struct FakeResolver {
        responses: HashMap<String, (Duration, Result<String, ResolveError>)>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeResolver {
        fn respond(mut self, identifier: &str, body: &str) -> Self {
            self.responses
                .insert(identifier.to_string(), (Duration::ZERO, Ok(body.to_string())));
            self
        }

        fn respond_after(mut self, identifier: &str, delay: Duration, body: &str) -> Self {
            self.responses
                .insert(identifier.to_string(), (delay, Ok(body.to_string())));
            self
        }

        fn fail(mut self, identifier: &str, error: ResolveError) -> Self {
            self.responses
                .insert(identifier.to_string(), (Duration::ZERO, Err(error)));
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Resolver for FakeResolver {
        async fn resolve(&self, identifier: &str) -> Result<String, ResolveError> {
            self.calls.lock().unwrap().push(identifier.to_string());
            let (delay, result) = self
                .responses
                .get(identifier)
                .cloned()
                .unwrap_or((Duration::ZERO, Ok("[]".to_string())));
            tokio::time::sleep(delay).await;
            result
        }
    }

    fn make_config(follow_mode: FollowMode, normalize: Normalize) -> ResolverConfig {
        ResolverConfig {
            title: "IGSN".to_string(),
            service_base_url: "https://resolver.example.org/".to_string(),
            follow_mode,
            normalize,
            position: Position { row: 0, col: 1 },
        }
    }

    struct Harness {
        widget: ResolverWidget,
        resolver: Arc<FakeResolver>,
        navigator: RecordingNavigator,
        rx: UnboundedReceiver<WidgetMessage>,
    }

    fn mount_with(resolver: FakeResolver, config: ResolverConfig) -> Harness {
        let resolver = Arc::new(resolver);
        let navigator = RecordingNavigator::default();
        let mut widget = ResolverWidget::new(
            config,
            &GeneralConfig::default(),
            resolver.clone(),
            Arc::new(navigator.clone()),
        );
        let (tx, rx) = mpsc::unbounded_channel();
        widget.on_mount(tx);
        Harness {
            widget,
            resolver,
            navigator,
            rx,
        }
    }

    fn mount(resolver: FakeResolver) -> Harness {
        mount_with(resolver, make_config(FollowMode::NewTab, Normalize::None))
    }

    impl Harness {
        /// Delivers the next background message to the widget.
        async fn pump(&mut self) -> WidgetEvent {
            let message = self.rx.recv().await.unwrap();
            assert_eq!(message.widget_id, "resolver-0-1");
            self.widget.handle_message(message.event.clone());
            message.event
        }

        /// Types `text`, waits out the debounce and, for resolvable input,
        /// the lookup.
        async fn settle(&mut self, text: &str) {
            self.widget.on_input_changed(text);
            let event = self.pump().await;
            assert!(matches!(event, WidgetEvent::DebounceElapsed { .. }));
            if self.widget.phase() == WidgetPhase::Loading {
                let event = self.pump().await;
                assert!(matches!(event, WidgetEvent::ResolveFinished { .. }));
            }
        }

        async fn assert_quiet(&mut self) {
            tokio::time::sleep(Duration::from_secs(30)).await;
            assert!(self.rx.try_recv().is_err());
        }
    }

    #[test]
    fn test_widget_id_and_initial_state() {
        let widget = ResolverWidget::new(
            make_config(FollowMode::NewTab, Normalize::None),
            &GeneralConfig::default(),
            Arc::new(FakeResolver::default()),
            Arc::new(RecordingNavigator::default()),
        );
        assert_eq!(widget.id(), "resolver-0-1");
        assert_eq!(widget.title(), "IGSN");
        assert_eq!(widget.position(), (0, 1));
        assert_eq!(widget.phase(), WidgetPhase::Idle);
        assert_eq!(widget.output(), &Output::Empty);
        assert!(widget.last_target().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_identifier_issues_no_request() {
        let mut h = mount(FakeResolver::default());
        h.settle("AU1").await;

        assert!(h.resolver.calls().is_empty());
        assert_eq!(h.widget.output(), &Output::Empty);
        assert_eq!(h.widget.phase(), WidgetPhase::Idle);
        h.assert_quiet().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_identifier_keeps_last_target() {
        let mut h = mount(
            FakeResolver::default().respond("AU1243", r#"[{"target":"https://example.org/x"}]"#),
        );
        h.settle("AU1243").await;
        h.settle("AU").await;

        assert_eq!(h.widget.output(), &Output::Empty);
        assert_eq!(h.widget.last_target(), Some("https://example.org/x"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_input_resolves_once_with_final_value() {
        let mut h = mount(FakeResolver::default());
        for text in ["A", "AU", "AU1", "AU12", "AU124", "AU1243"] {
            h.widget.on_input_changed(text);
        }
        assert_eq!(h.widget.phase(), WidgetPhase::PendingDebounce);

        h.pump().await;
        assert_eq!(h.widget.output(), &Output::Loading);
        assert_eq!(h.widget.phase(), WidgetPhase::Loading);
        h.pump().await;

        assert_eq!(h.resolver.calls(), vec!["AU1243".to_string()]);
        h.assert_quiet().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_restarts_within_debounce_window() {
        let mut h = mount(FakeResolver::default());
        h.widget.on_input_changed("AU12");
        tokio::time::sleep(Duration::from_millis(200)).await;
        h.widget.on_input_changed("AU123");
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert!(h.rx.try_recv().is_err());
        assert!(h.resolver.calls().is_empty());

        h.pump().await;
        h.pump().await;
        assert_eq!(h.resolver.calls(), vec!["AU123".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_debounce_expiry_is_ignored() {
        let mut h = mount(FakeResolver::default());
        h.widget.on_input_changed("AU1243");
        h.widget.handle_message(WidgetEvent::DebounceElapsed { generation: 0 });

        assert_eq!(h.widget.phase(), WidgetPhase::PendingDebounce);
        assert!(h.resolver.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_target_is_followed() {
        let mut h = mount(
            FakeResolver::default().respond("AU1243", r#"[{"target":"https://example.org/x"}]"#),
        );
        h.settle("AU1243").await;

        assert_eq!(h.widget.phase(), WidgetPhase::Resolved);
        assert_eq!(h.widget.last_target(), Some("https://example.org/x"));
        assert_eq!(
            h.widget.output().as_text(),
            "{\n  \"target\": \"https://example.org/x\"\n}"
        );

        assert!(h.widget.follow().unwrap());
        assert_eq!(
            h.navigator.opened(),
            vec![("https://example.org/x".to_string(), FollowMode::NewTab)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_tab_follow_mode() {
        let mut h = mount_with(
            FakeResolver::default().respond("AU1243", r#"[{"target":"https://example.org/x"}]"#),
            make_config(FollowMode::SameTab, Normalize::None),
        );
        h.settle("AU1243").await;

        let outcome = h.widget.handle_key(KeyEvent::from(KeyCode::Enter));
        assert_eq!(
            outcome,
            KeyOutcome::Notice("Opened https://example.org/x".to_string())
        );
        assert_eq!(
            h.navigator.opened(),
            vec![("https://example.org/x".to_string(), FollowMode::SameTab)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_record_without_target_is_not_followed() {
        let mut h = mount(
            FakeResolver::default()
                .respond("AU1243", r#"[{"target":"https://example.org/x"}]"#)
                .respond("AU9999", "[{}]"),
        );
        h.settle("AU1243").await;
        h.settle("AU9999").await;

        assert!(h.widget.last_target().is_none());
        assert_eq!(h.widget.output().as_text(), "{}");
        assert!(!h.widget.follow().unwrap());
        assert!(h.navigator.opened().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_result_shows_notice() {
        let mut h = mount(FakeResolver::default().respond("AU1243", "[]"));
        h.settle("AU1243").await;

        assert!(h.widget.last_target().is_none());
        assert_eq!(h.widget.output().as_text(), "No result for AU1243");
        assert!(!h.widget.follow().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_network_failure_shows_error() {
        let mut h = mount(
            FakeResolver::default()
                .respond("AU1243", r#"[{"target":"https://example.org/x"}]"#)
                .fail("AU9999", ResolveError::Network("connection refused".to_string())),
        );
        h.settle("AU1243").await;
        h.settle("AU9999").await;

        assert_eq!(
            h.widget.output(),
            &Output::Error("request failed: connection refused".to_string())
        );
        assert!(h.widget.last_target().is_none());
        assert_eq!(h.widget.phase(), WidgetPhase::Resolved);
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_body_clears_target() {
        let mut h = mount(FakeResolver::default().respond("AU1243", "<html>oops</html>"));
        h.settle("AU1243").await;

        assert!(h.widget.last_target().is_none());
        assert!(h
            .widget
            .output()
            .as_text()
            .starts_with("Malformed response:"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_request_times_out() {
        let mut h = mount(FakeResolver::default().respond_after(
            "AU1243",
            Duration::from_secs(600),
            "[]",
        ));
        h.settle("AU1243").await;

        assert_eq!(
            h.widget.output(),
            &Output::Error("no response after 10s".to_string())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_newer_request_wins() {
        let mut h = mount(
            FakeResolver::default()
                .respond_after(
                    "AU1111",
                    Duration::from_secs(5),
                    r#"[{"target":"https://example.org/old"}]"#,
                )
                .respond("AU2222", r#"[{"target":"https://example.org/new"}]"#),
        );

        h.widget.on_input_changed("AU1111");
        h.pump().await;
        assert_eq!(h.widget.phase(), WidgetPhase::Loading);

        h.settle("AU2222").await;
        assert_eq!(h.widget.last_target(), Some("https://example.org/new"));

        // a response to the superseded lookup that was already queued
        h.widget.handle_message(WidgetEvent::ResolveFinished {
            seq: 1,
            identifier: "AU1111".to_string(),
            result: Ok(r#"[{"target":"https://example.org/old"}]"#.to_string()),
        });
        assert_eq!(h.widget.last_target(), Some("https://example.org/new"));
        assert!(h.widget.output().as_text().contains("example.org/new"));

        h.assert_quiet().await;
        assert_eq!(
            h.resolver.calls(),
            vec!["AU1111".to_string(), "AU2222".to_string()]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_result_survives_typing() {
        let mut h = mount(FakeResolver::default().respond_after(
            "AU1243",
            Duration::from_millis(100),
            r#"[{"target":"https://example.org/x"}]"#,
        ));
        h.widget.on_input_changed("AU1243");
        h.pump().await;
        h.widget.on_input_changed("AU124");

        let event = h.pump().await;
        assert!(matches!(event, WidgetEvent::ResolveFinished { .. }));
        assert_eq!(h.widget.last_target(), Some("https://example.org/x"));
        assert_eq!(h.widget.phase(), WidgetPhase::PendingDebounce);
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_input_discards_in_flight_lookup() {
        let mut h = mount(FakeResolver::default().respond_after(
            "AU1243",
            Duration::from_secs(1),
            r#"[{"target":"https://example.org/x"}]"#,
        ));
        h.widget.on_input_changed("AU1243");
        h.pump().await;
        h.settle("AU").await;

        assert_eq!(h.widget.output(), &Output::Empty);
        h.assert_quiet().await;
        assert_eq!(h.widget.output(), &Output::Empty);
        assert!(h.widget.last_target().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unmount_cancels_timer_and_request() {
        let mut h = mount(FakeResolver::default());
        h.widget.on_input_changed("AU1243");
        h.widget.on_unmount();
        h.assert_quiet().await;
        assert!(h.resolver.calls().is_empty());

        let mut h = mount(FakeResolver::default().respond_after(
            "AU1243",
            Duration::from_secs(1),
            "[]",
        ));
        h.widget.on_input_changed("AU1243");
        h.pump().await;
        h.widget.on_unmount();
        h.assert_quiet().await;
        assert_eq!(h.widget.output(), &Output::Loading);
    }

    #[tokio::test(start_paused = true)]
    async fn test_igsn_normalization() {
        let mut h = mount_with(
            FakeResolver::default(),
            make_config(FollowMode::NewTab, Normalize::Igsn),
        );
        h.settle("igsn: au1243").await;
        assert_eq!(h.resolver.calls(), vec!["AU1243".to_string()]);
        assert_eq!(h.widget.identifier(), "igsn: au1243");
    }

    #[tokio::test(start_paused = true)]
    async fn test_key_editing() {
        let mut h = mount(FakeResolver::default());
        for c in ['A', 'U', '1', '2'] {
            assert_eq!(
                h.widget.handle_key(KeyEvent::from(KeyCode::Char(c))),
                KeyOutcome::Handled
            );
        }
        assert_eq!(h.widget.identifier(), "AU12");

        h.widget.handle_key(KeyEvent::from(KeyCode::Backspace));
        assert_eq!(h.widget.identifier(), "AU1");

        h.widget
            .handle_key(KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL));
        assert_eq!(h.widget.identifier(), "");

        assert_eq!(
            h.widget.handle_key(KeyEvent::from(KeyCode::Enter)),
            KeyOutcome::Handled
        );
        assert!(h.navigator.opened().is_empty());
        assert_eq!(
            h.widget.handle_key(KeyEvent::from(KeyCode::Tab)),
            KeyOutcome::Ignored
        );
    }

    #[tokio::test]
    async fn test_scroll_is_bounded_by_output() {
        let mut h = mount(FakeResolver::default());
        h.widget.output = Output::Text("a\nb\nc".to_string());
        for _ in 0..5 {
            h.widget.handle_key(KeyEvent::from(KeyCode::Down));
        }
        assert_eq!(h.widget.scroll, 2);

        h.widget.output = Output::Text("line\n".repeat(70_000));
        assert_eq!(h.widget.max_scroll(), u16::MAX);
        h.widget.scroll = u16::MAX - 1;
        h.widget.handle_key(KeyEvent::from(KeyCode::Down));
        assert_eq!(h.widget.scroll, u16::MAX);
        h.widget.handle_key(KeyEvent::from(KeyCode::Down));
        assert_eq!(h.widget.scroll, u16::MAX);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unmount_is_idempotent() {
        let mut h = mount(FakeResolver::default());
        assert!(h.widget.is_mounted());
        h.widget.on_input_changed("AU1243");
        h.widget.on_unmount();
        assert!(!h.widget.is_mounted());
        assert_eq!(h.widget.phase(), WidgetPhase::Idle);

        // a second unmount, as from drop after shutdown, finds nothing to do
        h.widget.on_unmount();
        assert!(!h.widget.is_mounted());
        h.assert_quiet().await;
    }
}
