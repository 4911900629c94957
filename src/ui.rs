use crate::markdown::{DisplayBlock, Inline, RelatedKind};
use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{
        Block, Borders, Clear, List, ListItem, Paragraph, Scrollbar, ScrollbarOrientation,
        ScrollbarState, Wrap,
    },
    Frame, Terminal,
};
use std::io::{self, Stdout};
use textwrap::{fill, wrap};

pub struct UI {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    scroll_position: u16,
    selected_target: usize,
    targets_scroll: usize,
    max_scroll: u16,
}

#[derive(Debug, Clone)]
pub enum UIState {
    WordInput {
        input: String,
    },
    Loading {
        word: String,
    },
    Definition {
        word: String,
        blocks: Vec<DisplayBlock>,
        targets: Vec<String>,
        status: String,
    },
    History {
        entries: Vec<HistoryRow>,
        current_index: Option<usize>,
        selected_index: usize,
    },
    Recent {
        words: Vec<String>,
        selected_index: usize,
    },
    Login {
        input: String,
        searches: u32,
        pending: Option<String>,
        error: Option<String>,
    },
    Message {
        message: String,
    },
}

#[derive(Debug, Clone)]
pub struct HistoryRow {
    pub word: String,
    pub when: String,
}

#[derive(Debug)]
pub enum UserAction {
    Quit,
    EnterWord,
    ConfirmInput(String),
    CancelInput,
    InputChar(char),
    Backspace,
    ScrollUp,
    ScrollDown,
    SelectPrevTarget,
    SelectNextTarget,
    SearchSelectedTarget,
    SearchTarget(usize),
    GoBack,
    GoForward,
    ShowHistory,
    ShowRecent,
    SelectPrev,
    SelectNext,
    ConfirmSelection,
    Refresh,
    Login,
    Logout,
    DismissMessage,
}

const TARGET_STYLE: Style = Style::new().fg(Color::Black).bg(Color::Cyan);

impl UI {
    pub fn new() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(Self {
            terminal,
            scroll_position: 0,
            selected_target: 0,
            targets_scroll: 0,
            max_scroll: 0,
        })
    }

    pub fn cleanup(&mut self) -> Result<()> {
        disable_raw_mode()?;
        execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        self.terminal.show_cursor()?;
        Ok(())
    }

    pub fn render(&mut self, state: &UIState) -> Result<()> {
        let (scroll_pos, selected_target, targets_scroll) =
            (self.scroll_position, self.selected_target, self.targets_scroll);

        match state {
            UIState::WordInput { input } => {
                self.terminal.draw(|f| Self::render_word_input(f, input))?;
            }
            UIState::Loading { word } => {
                self.terminal.draw(|f| Self::render_loading(f, word))?;
            }
            UIState::Definition {
                word,
                blocks,
                targets,
                status,
            } => {
                let lines = blocks_to_lines(blocks, Some(selected_target));
                self.terminal.draw(|f| {
                    Self::render_definition(
                        f,
                        word,
                        &lines,
                        targets,
                        status,
                        scroll_pos,
                        selected_target,
                        targets_scroll,
                    );
                })?;

                let size = self.terminal.size()?;
                let width = content_width(size.width);
                let visible_height = size.height.saturating_sub(8) as usize;
                self.max_scroll = wrapped_height(&lines, width).saturating_sub(visible_height) as u16;
                self.update_targets_scroll_with_height(visible_height);
            }
            UIState::History {
                entries,
                current_index,
                selected_index,
            } => {
                self.terminal
                    .draw(|f| Self::render_history(f, entries, *current_index, *selected_index))?;
            }
            UIState::Recent {
                words,
                selected_index,
            } => {
                self.terminal
                    .draw(|f| Self::render_recent(f, words, *selected_index))?;
            }
            UIState::Login {
                input,
                searches,
                pending,
                error,
            } => {
                self.terminal.draw(|f| {
                    Self::render_login(f, input, *searches, pending.as_deref(), error.as_deref())
                })?;
            }
            UIState::Message { message } => {
                self.terminal.draw(|f| Self::render_message(f, message))?;
            }
        }
        Ok(())
    }

    fn render_word_input(f: &mut Frame, input: &str) {
        let area = f.size();
        let popup_area = centered(area, area.width / 2, 4);

        f.render_widget(Clear, popup_area);
        f.render_widget(
            Paragraph::new(format!("🔎 {}", input))
                .style(Style::default().fg(Color::White))
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title("Look up an English word"),
                ),
            popup_area,
        );
    }

    fn render_loading(f: &mut Frame, word: &str) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(2)
            .constraints([Constraint::Length(3), Constraint::Length(3)])
            .split(f.size());

        f.render_widget(
            Paragraph::new("📖 Looking it up...")
                .style(
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                )
                .block(Block::default().borders(Borders::ALL).title("Junior English Dictionary")),
            chunks[0],
        );

        f.render_widget(
            Paragraph::new(word.to_string())
                .style(Style::default().fg(Color::Yellow))
                .block(Block::default().borders(Borders::ALL).title("Word")),
            chunks[1],
        );
    }

    #[allow(clippy::too_many_arguments)]
    fn render_definition(
        f: &mut Frame,
        word: &str,
        lines: &[Line<'static>],
        targets: &[String],
        status: &str,
        scroll_pos: u16,
        selected_target: usize,
        targets_scroll: usize,
    ) {
        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(10),
                Constraint::Length(4),
            ])
            .split(f.size());

        f.render_widget(
            Paragraph::new(format!("📖 {}", word))
                .style(
                    Style::default()
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD),
                )
                .block(Block::default().borders(Borders::ALL).title(status.to_string())),
            main_chunks[0],
        );

        let content_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(75), Constraint::Percentage(25)])
            .split(main_chunks[1]);

        Self::render_meaning(f, content_chunks[0], lines, scroll_pos);
        Self::render_targets(f, content_chunks[1], targets, selected_target, targets_scroll);
        Self::render_help(f, main_chunks[2]);
    }

    fn render_meaning(f: &mut Frame, area: Rect, lines: &[Line<'static>], scroll_pos: u16) {
        let width = area.width.saturating_sub(2) as usize;
        let total = wrapped_height(lines, width);
        let visible_height = area.height.saturating_sub(2) as usize;

        f.render_widget(
            Paragraph::new(lines.to_vec())
                .wrap(Wrap { trim: false })
                .block(Block::default().borders(Borders::ALL).title("📄 Meaning"))
                .scroll((scroll_pos, 0)),
            area,
        );

        if total > visible_height {
            let scrollbar = Scrollbar::default()
                .orientation(ScrollbarOrientation::VerticalRight)
                .begin_symbol(None)
                .end_symbol(None);
            let mut scrollbar_state = ScrollbarState::default()
                .content_length(total)
                .position(scroll_pos as usize);
            f.render_stateful_widget(scrollbar, area, &mut scrollbar_state);
        }
    }

    fn render_targets(
        f: &mut Frame,
        area: Rect,
        targets: &[String],
        selected_target: usize,
        targets_scroll: usize,
    ) {
        if targets.is_empty() {
            f.render_widget(
                Paragraph::new("No words to explore")
                    .style(Style::default().fg(Color::Gray))
                    .block(Block::default().borders(Borders::ALL).title("🔗 Words")),
                area,
            );
            return;
        }

        let visible_height = area.height.saturating_sub(2) as usize;
        let start_index = targets_scroll.min(targets.len() - 1);
        let end_index = (start_index + visible_height).min(targets.len());

        let items: Vec<ListItem> = targets[start_index..end_index]
            .iter()
            .enumerate()
            .map(|(i, target)| {
                let absolute_index = start_index + i;
                let style = if absolute_index == selected_target {
                    TARGET_STYLE.add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::White)
                };

                let content = format!("[{}] {}", absolute_index + 1, target);
                ListItem::new(fill(&content, area.width.saturating_sub(4) as usize)).style(style)
            })
            .collect();

        f.render_widget(
            List::new(items).block(Block::default().borders(Borders::ALL).title("🔗 Words")),
            area,
        );

        if targets.len() > visible_height {
            let scrollbar = Scrollbar::default()
                .orientation(ScrollbarOrientation::VerticalRight)
                .begin_symbol(None)
                .end_symbol(None);
            let mut scrollbar_state = ScrollbarState::default()
                .content_length(targets.len())
                .position(targets_scroll);
            f.render_stateful_widget(scrollbar, area, &mut scrollbar_state);
        }
    }

    fn render_help(f: &mut Frame, area: Rect) {
        let help_text = vec![
            Line::from(vec![
                key("↑↓"),
                Span::raw(" Scroll  "),
                key("Tab"),
                Span::raw(" Select word  "),
                key("Enter"),
                Span::raw(" Look up  "),
                key("b/f"),
                Span::raw(" Back/Forward  "),
                key("/"),
                Span::raw(" Search  "),
            ]),
            Line::from(vec![
                key("h"),
                Span::raw(" History  "),
                key("r"),
                Span::raw(" Recent  "),
                key("R"),
                Span::raw(" Refresh  "),
                key("l/o"),
                Span::raw(" Login/Logout  "),
                key("q"),
                Span::raw(" Quit"),
            ]),
        ];

        f.render_widget(
            Paragraph::new(help_text)
                .block(Block::default().borders(Borders::ALL).title("⌨️ Controls")),
            area,
        );
    }

    fn render_history(
        f: &mut Frame,
        entries: &[HistoryRow],
        current_index: Option<usize>,
        selected_index: usize,
    ) {
        let area = f.size();

        let items: Vec<ListItem> = if entries.is_empty() {
            vec![ListItem::new("No searches yet").style(Style::default().fg(Color::Gray))]
        } else {
            entries
                .iter()
                .enumerate()
                .map(|(i, entry)| {
                    let marker = if Some(i) == current_index { "➤ " } else { "  " };
                    let style = if i == selected_index {
                        TARGET_STYLE.add_modifier(Modifier::BOLD)
                    } else if Some(i) == current_index {
                        Style::default()
                            .fg(Color::Yellow)
                            .add_modifier(Modifier::BOLD)
                    } else {
                        Style::default().fg(Color::White)
                    };
                    ListItem::new(format!("{}{} - {}", marker, entry.word, entry.when)).style(style)
                })
                .collect()
        };

        Self::render_list_screen(f, area, items, "📚 History", "↑↓ Select • Enter Open • Esc Back");
    }

    fn render_recent(f: &mut Frame, words: &[String], selected_index: usize) {
        let area = f.size();

        let items: Vec<ListItem> = if words.is_empty() {
            vec![ListItem::new("No recent searches").style(Style::default().fg(Color::Gray))]
        } else {
            words
                .iter()
                .enumerate()
                .map(|(i, word)| {
                    let style = if i == selected_index {
                        TARGET_STYLE.add_modifier(Modifier::BOLD)
                    } else {
                        Style::default().fg(Color::White)
                    };
                    ListItem::new(word.clone()).style(style)
                })
                .collect()
        };

        Self::render_list_screen(
            f,
            area,
            items,
            "🕘 Recent searches",
            "↑↓ Select • Enter Search • Esc Back",
        );
    }

    fn render_list_screen(f: &mut Frame, area: Rect, items: Vec<ListItem>, title: &str, help: &str) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(3)])
            .split(area);

        f.render_widget(
            List::new(items)
                .block(Block::default().borders(Borders::ALL).title(title.to_string()))
                .style(Style::default().fg(Color::White)),
            chunks[0],
        );

        f.render_widget(
            Paragraph::new(help.to_string())
                .style(Style::default().fg(Color::Gray))
                .block(Block::default().borders(Borders::ALL)),
            chunks[1],
        );
    }

    fn render_login(
        f: &mut Frame,
        input: &str,
        searches: u32,
        pending: Option<&str>,
        error: Option<&str>,
    ) {
        let area = f.size();
        let popup_area = centered(area, area.width * 3 / 4, 10);

        let title = match pending {
            Some(word) => format!("Sign in to look up \"{}\"", word),
            None => "Sign in to keep searching".to_string(),
        };
        let mut lines = vec![
            Line::from(Span::styled(
                title,
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(format!("You have already searched {} times as a guest.", searches)),
            Line::from("Signed-in users search without limits and keep their history."),
            Line::from(""),
            Line::from(vec![Span::raw("Account: "), Span::styled(input.to_string(), Style::default().fg(Color::White))]),
        ];
        if let Some(error) = error {
            lines.push(Line::from(Span::styled(
                error.to_string(),
                Style::default().fg(Color::Red),
            )));
        }
        lines.push(Line::from(Span::styled(
            "Enter Sign in • Esc Later",
            Style::default().fg(Color::Gray),
        )));

        f.render_widget(Clear, popup_area);
        f.render_widget(
            Paragraph::new(lines)
                .wrap(Wrap { trim: true })
                .block(Block::default().borders(Borders::ALL).title("🔒 Login")),
            popup_area,
        );
    }

    fn render_message(f: &mut Frame, message: &str) {
        let area = f.size();
        let popup_area = centered(area, area.width * 3 / 4, 6);

        f.render_widget(Clear, popup_area);
        f.render_widget(
            Paragraph::new(format!("{}\n\nPress any key to dismiss", message))
                .style(Style::default().fg(Color::Red).add_modifier(Modifier::BOLD))
                .wrap(Wrap { trim: true })
                .block(Block::default().borders(Borders::ALL).title("❗ Notice")),
            popup_area,
        );
    }

    pub fn get_user_input(&mut self, state: &UIState) -> Result<UserAction> {
        loop {
            let Event::Key(key) = event::read()? else {
                continue;
            };
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                return Ok(UserAction::Quit);
            }

            match state {
                UIState::WordInput { input } | UIState::Login { input, .. } => match key.code {
                    KeyCode::Esc => return Ok(UserAction::CancelInput),
                    KeyCode::Enter => return Ok(UserAction::ConfirmInput(input.clone())),
                    KeyCode::Backspace => return Ok(UserAction::Backspace),
                    KeyCode::Char(c) => return Ok(UserAction::InputChar(c)),
                    _ => continue,
                },
                UIState::History { .. } | UIState::Recent { .. } => match key.code {
                    KeyCode::Esc => return Ok(UserAction::CancelInput),
                    KeyCode::Char('q') => return Ok(UserAction::Quit),
                    KeyCode::Up => return Ok(UserAction::SelectPrev),
                    KeyCode::Down => return Ok(UserAction::SelectNext),
                    KeyCode::Enter => return Ok(UserAction::ConfirmSelection),
                    _ => continue,
                },
                UIState::Message { .. } => return Ok(UserAction::DismissMessage),
                UIState::Loading { .. } => continue,
                UIState::Definition { .. } => match key.code {
                    KeyCode::Char('q') => return Ok(UserAction::Quit),
                    KeyCode::Char('b') => return Ok(UserAction::GoBack),
                    KeyCode::Char('f') => return Ok(UserAction::GoForward),
                    KeyCode::Char('h') => return Ok(UserAction::ShowHistory),
                    KeyCode::Char('r') => return Ok(UserAction::ShowRecent),
                    KeyCode::Char('R') => return Ok(UserAction::Refresh),
                    KeyCode::Char('l') => return Ok(UserAction::Login),
                    KeyCode::Char('o') => return Ok(UserAction::Logout),
                    KeyCode::Char('/') | KeyCode::Char('s') => return Ok(UserAction::EnterWord),
                    KeyCode::Tab => return Ok(UserAction::SelectNextTarget),
                    KeyCode::BackTab => return Ok(UserAction::SelectPrevTarget),
                    KeyCode::Up if key.modifiers.contains(KeyModifiers::SHIFT) => {
                        return Ok(UserAction::SelectPrevTarget)
                    }
                    KeyCode::Down if key.modifiers.contains(KeyModifiers::SHIFT) => {
                        return Ok(UserAction::SelectNextTarget)
                    }
                    KeyCode::Up => return Ok(UserAction::ScrollUp),
                    KeyCode::Down => return Ok(UserAction::ScrollDown),
                    KeyCode::Enter => return Ok(UserAction::SearchSelectedTarget),
                    KeyCode::Char(c) => {
                        if let Some(digit) = c.to_digit(10).filter(|d| *d > 0) {
                            return Ok(UserAction::SearchTarget(digit as usize));
                        }
                    }
                    _ => continue,
                },
            }
        }
    }

    pub fn scroll_up(&mut self) {
        self.scroll_position = self.scroll_position.saturating_sub(1);
    }

    pub fn scroll_down(&mut self) {
        if self.scroll_position < self.max_scroll {
            self.scroll_position += 1;
        }
    }

    pub fn select_prev_target(&mut self, targets_len: usize) {
        if targets_len > 0 && self.selected_target > 0 {
            self.selected_target -= 1;
            self.update_targets_scroll();
        }
    }

    pub fn select_next_target(&mut self, targets_len: usize) {
        if targets_len > 0 && self.selected_target < targets_len - 1 {
            self.selected_target += 1;
            self.update_targets_scroll();
        }
    }

    fn update_targets_scroll(&mut self) {
        self.update_targets_scroll_with_height(10);
    }

    fn update_targets_scroll_with_height(&mut self, visible_height: usize) {
        self.targets_scroll =
            keep_visible(self.selected_target, self.targets_scroll, visible_height);
    }

    pub fn get_selected_target(&self) -> usize {
        self.selected_target
    }

    pub fn reset_scroll(&mut self) {
        self.scroll_position = 0;
        self.selected_target = 0;
        self.targets_scroll = 0;
    }
}

fn key(label: &str) -> Span<'static> {
    Span::styled(
        label.to_string(),
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

/// Scroll offset that keeps `selected` inside a window of `visible_height` rows.
fn keep_visible(selected: usize, current_scroll: usize, visible_height: usize) -> usize {
    if visible_height == 0 {
        return current_scroll;
    }

    if selected < current_scroll {
        selected
    } else if selected >= current_scroll + visible_height {
        selected + 1 - visible_height
    } else {
        current_scroll
    }
}

/// Inner width of the meaning panel for a terminal `total_width` columns wide.
fn content_width(total_width: u16) -> usize {
    (total_width as usize * 75 / 100).saturating_sub(2)
}

/// Number of terminal rows the lines occupy once wrapped to `width`.
fn wrapped_height(lines: &[Line<'_>], width: usize) -> usize {
    let width = width.max(1);
    lines
        .iter()
        .map(|line| {
            let plain: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
            wrap(&plain, width).len().max(1)
        })
        .sum()
}

/// Styles display blocks. Search targets are numbered in display order and
/// the one at `selected` is highlighted.
pub fn blocks_to_lines(blocks: &[DisplayBlock], selected: Option<usize>) -> Vec<Line<'static>> {
    let mut lines = Vec::with_capacity(blocks.len());
    let mut next_target = 0usize;

    for block in blocks {
        match block {
            DisplayBlock::Spacing => lines.push(Line::from("")),
            DisplayBlock::Header {
                word,
                pronunciation,
                part_of_speech,
            } => {
                let mut spans = vec![Span::styled(
                    word.clone(),
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                )];
                if let Some(pronunciation) = pronunciation {
                    spans.push(Span::styled(
                        format!(" /{}/", pronunciation),
                        Style::default().fg(Color::Cyan),
                    ));
                }
                spans.push(Span::styled(
                    format!(" ({})", part_of_speech),
                    Style::default()
                        .fg(Color::Green)
                        .add_modifier(Modifier::ITALIC),
                ));
                lines.push(Line::from(spans));
            }
            DisplayBlock::DefinitionLabel => lines.push(label_line("Definition")),
            DisplayBlock::ExamplesLabel => lines.push(label_line("Examples")),
            DisplayBlock::RelatedWords {
                kind,
                category,
                words,
            } => {
                let mut spans = vec![Span::styled(
                    format!("{}: ", category),
                    Style::default()
                        .fg(related_color(*kind))
                        .add_modifier(Modifier::BOLD),
                )];
                for (i, word) in words.iter().enumerate() {
                    if i > 0 {
                        spans.push(Span::raw(", "));
                    }
                    spans.push(target_span(word, Style::default().fg(related_color(*kind)), next_target, selected));
                    next_target += 1;
                }
                lines.push(Line::from(spans));
            }
            DisplayBlock::ListItem(inlines) => {
                let mut spans = vec![Span::raw("• ")];
                push_inlines(&mut spans, inlines, Style::default(), &mut next_target, selected);
                lines.push(Line::from(spans));
            }
            DisplayBlock::Paragraph(inlines) => {
                let mut spans = Vec::new();
                push_inlines(&mut spans, inlines, Style::default(), &mut next_target, selected);
                lines.push(Line::from(spans));
            }
        }
    }

    lines
}

fn label_line(text: &str) -> Line<'static> {
    Line::from(Span::styled(
        text.to_string(),
        Style::default()
            .fg(Color::Magenta)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
    ))
}

fn related_color(kind: RelatedKind) -> Color {
    match kind {
        RelatedKind::Synonyms => Color::Green,
        RelatedKind::Antonyms => Color::Red,
        RelatedKind::Similar => Color::Blue,
        RelatedKind::Other => Color::Gray,
    }
}

fn target_span(text: &str, base: Style, index: usize, selected: Option<usize>) -> Span<'static> {
    let style = if selected == Some(index) {
        base.patch(TARGET_STYLE)
    } else {
        base.add_modifier(Modifier::UNDERLINED)
    };
    Span::styled(text.to_string(), style)
}

fn push_inlines(
    spans: &mut Vec<Span<'static>>,
    inlines: &[Inline],
    base: Style,
    next_target: &mut usize,
    selected: Option<usize>,
) {
    for inline in inlines {
        match inline {
            Inline::Text(text) => spans.push(Span::styled(text.clone(), base)),
            Inline::Token(word) => {
                spans.push(target_span(word, base, *next_target, selected));
                *next_target += 1;
            }
            Inline::Bold(children) => push_inlines(
                spans,
                children,
                base.add_modifier(Modifier::BOLD),
                next_target,
                selected,
            ),
        }
    }
}
