//! Per-session transcripts and the banner/prompt protocol.
//!
//! The surface owns an append-only sequence of display lines per session
//! plus one mutable live input line. Sealed lines are never touched again;
//! typing, erasing, and history replacement only ever mutate the live
//! line. Viewport geometry is supplied by the resize coordinator and only
//! affects how lines re-flow, never what they contain.

use std::collections::HashMap;

use crate::resize::ViewportSize;
use crate::session::SessionId;

/// Decorative prompt marker.
const PROMPT_MARKER: &str = "➜";

/// Welcome banner written once per session, on first activation.
const BANNER: &[&str] = &[
    "╭──────────────────────────────────────────────╮",
    "│               WebMux Terminal                │",
    "╰──────────────────────────────────────────────╯",
    "",
    "Welcome to your remote development environment!",
    "Type \"help\" for available commands",
    "",
];

/// One immutable unit of rendered output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayLine {
    /// A line of the welcome banner.
    Banner(String),
    /// A sealed prompt line: the prompt marker plus whatever input was
    /// committed with it.
    Prompt { input: String },
    /// A line of command output.
    Output(String),
    /// An error line.
    Error(String),
}

#[derive(Debug, Default)]
struct SessionView {
    lines: Vec<DisplayLine>,
    /// The open input line, if a prompt is currently showing. Holds only
    /// the typed text; the prompt marker is composed at render time.
    live: Option<String>,
    greeted: bool,
    /// Lines sealed since the transcript was last cleared; keeps counting
    /// past the scrollback limit so renderers can tell new lines apart
    /// from retained ones.
    total_sealed: u64,
}

impl SessionView {
    fn push(&mut self, line: DisplayLine, scrollback: usize) {
        if self.lines.len() >= scrollback {
            self.lines.remove(0);
        }
        self.lines.push(line);
        self.total_sealed += 1;
    }
}

/// Append-only display state for all sessions.
pub struct DisplaySurface {
    views: HashMap<SessionId, SessionView>,
    viewport: ViewportSize,
    prompt_cwd: String,
    scrollback: usize,
}

impl DisplaySurface {
    /// Creates a surface with the given prompt working-directory label,
    /// initial viewport, and per-session scrollback limit.
    pub fn new(prompt_cwd: impl Into<String>, viewport: ViewportSize, scrollback: usize) -> Self {
        Self {
            views: HashMap::new(),
            viewport,
            prompt_cwd: prompt_cwd.into(),
            scrollback: scrollback.max(1),
        }
    }

    /// The fixed prompt text: marker, working-directory placeholder,
    /// dollar terminator.
    pub fn prompt_text(&self) -> String {
        format!("{PROMPT_MARKER} {} $ ", self.prompt_cwd)
    }

    /// Marks a session as the one actively rendered.
    ///
    /// Writes the welcome banner exactly once per session, then shows the
    /// first prompt; on later activations it only re-opens a prompt if the
    /// session has none.
    pub fn activate(&mut self, id: &SessionId) {
        let scrollback = self.scrollback;
        let view = self.views.entry(id.clone()).or_default();
        if !view.greeted {
            for line in BANNER {
                view.push(DisplayLine::Banner((*line).to_string()), scrollback);
            }
            view.greeted = true;
        }
        if view.live.is_none() {
            view.live = Some(String::new());
        }
    }

    /// Re-shows the prompt by opening a fresh live input line. Idempotent
    /// while a prompt is already open.
    pub fn show_prompt(&mut self, id: &SessionId) {
        let view = self.views.entry(id.clone()).or_default();
        if view.live.is_none() {
            view.live = Some(String::new());
        }
    }

    /// Echoes a typed character onto the live line.
    pub fn echo_char(&mut self, id: &SessionId, c: char) {
        let view = self.views.entry(id.clone()).or_default();
        view.live.get_or_insert_with(String::new).push(c);
    }

    /// Erases the last visible character of the live line.
    pub fn erase_char(&mut self, id: &SessionId) {
        if let Some(view) = self.views.get_mut(id) {
            if let Some(live) = view.live.as_mut() {
                live.pop();
            }
        }
    }

    /// Replaces the live line with `text` in one batch; no intermediate
    /// state is observable.
    pub fn replace_line(&mut self, id: &SessionId, text: String) {
        let view = self.views.entry(id.clone()).or_default();
        view.live = Some(text);
    }

    /// Seals the live line into the transcript (the newline echo of a
    /// submission). The prompt stays closed until [`show_prompt`] or a
    /// completed submission re-opens it.
    ///
    /// [`show_prompt`]: DisplaySurface::show_prompt
    pub fn seal_line(&mut self, id: &SessionId) {
        let scrollback = self.scrollback;
        let view = self.views.entry(id.clone()).or_default();
        let input = view.live.take().unwrap_or_default();
        view.push(DisplayLine::Prompt { input }, scrollback);
    }

    /// Appends one line of command output.
    pub fn write_output(&mut self, id: &SessionId, text: &str) {
        let scrollback = self.scrollback;
        let view = self.views.entry(id.clone()).or_default();
        view.push(DisplayLine::Output(text.to_string()), scrollback);
    }

    /// Appends one error line.
    pub fn write_error(&mut self, id: &SessionId, text: &str) {
        let scrollback = self.scrollback;
        let view = self.views.entry(id.clone()).or_default();
        view.push(DisplayLine::Error(text.to_string()), scrollback);
    }

    /// Wipes the session's visible transcript. The banner is not
    /// re-written afterwards; the session was already greeted.
    pub fn clear(&mut self, id: &SessionId) {
        if let Some(view) = self.views.get_mut(id) {
            view.lines.clear();
            view.total_sealed = 0;
        }
    }

    /// Discards all display state for a closed session.
    pub fn remove(&mut self, id: &SessionId) {
        self.views.remove(id);
    }

    /// Returns the sealed transcript of a session, oldest first.
    pub fn transcript(&self, id: &SessionId) -> &[DisplayLine] {
        self.views.get(id).map(|v| v.lines.as_slice()).unwrap_or(&[])
    }

    /// Lines sealed since the transcript was last cleared, counting past
    /// the scrollback limit.
    pub fn sealed_total(&self, id: &SessionId) -> u64 {
        self.views.get(id).map(|v| v.total_sealed).unwrap_or(0)
    }

    /// Returns the typed text on the open live line, if a prompt is
    /// showing.
    pub fn live_input(&self, id: &SessionId) -> Option<&str> {
        self.views.get(id).and_then(|v| v.live.as_deref())
    }

    /// Returns the composed live line (prompt plus typed text), if a
    /// prompt is showing.
    pub fn live_line(&self, id: &SessionId) -> Option<String> {
        self.live_input(id)
            .map(|input| format!("{}{input}", self.prompt_text()))
    }

    /// Returns the full composed textual transcript, one string per
    /// sealed line.
    pub fn render_lines(&self, id: &SessionId) -> Vec<String> {
        self.transcript(id)
            .iter()
            .map(|line| self.compose(line))
            .collect()
    }

    fn compose(&self, line: &DisplayLine) -> String {
        match line {
            DisplayLine::Banner(text) | DisplayLine::Output(text) | DisplayLine::Error(text) => {
                text.clone()
            }
            DisplayLine::Prompt { input } => format!("{}{input}", self.prompt_text()),
        }
    }

    /// Returns the current viewport geometry.
    pub fn viewport(&self) -> ViewportSize {
        self.viewport
    }

    /// Applies a new viewport geometry. Content is untouched; only the
    /// re-flow computation changes. Safe to call redundantly.
    pub fn fit(&mut self, viewport: ViewportSize) {
        self.viewport = viewport;
    }

    /// Number of display rows the session occupies at the current width,
    /// counting soft-wrapped continuation rows.
    pub fn wrapped_rows(&self, id: &SessionId) -> usize {
        let cols = usize::from(self.viewport.cols).max(1);
        let rows_of = |text: &str| {
            let width = text.chars().count();
            width.div_ceil(cols).max(1)
        };
        let mut rows: usize = self
            .render_lines(id)
            .iter()
            .map(|line| rows_of(line))
            .sum();
        if let Some(live) = self.live_line(id) {
            rows += rows_of(&live);
        }
        rows
    }
}
