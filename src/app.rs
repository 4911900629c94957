use anyhow::Result;
use chrono::{DateTime, Local};
use tracing::debug;

use crate::{
    config::Config,
    gate::GateState,
    history::SearchEntry,
    markdown,
    openai::OpenAIClient,
    session::{Notice, Session},
    store::Store,
    ui::{HistoryRow, UIState, UserAction, UI},
};

pub struct App {
    openai: OpenAIClient,
    session: Session,
    ui: UI,
    current_state: UIState,
    input: String,
}

impl App {
    pub fn new(config: &Config) -> Result<Self> {
        let store = match &config.data_dir {
            Some(dir) => Store::persistent(dir),
            None => Store::ephemeral(),
        };

        Ok(Self {
            openai: OpenAIClient::new(config.openai.clone())?,
            session: Session::new(store, config.limits),
            ui: UI::new()?,
            current_state: UIState::WordInput {
                input: String::new(),
            },
            input: String::new(),
        })
    }

    /// Looks up `raw`. Untracked lookups refresh the screen without adding a
    /// history entry.
    pub async fn search(&mut self, raw: &str, track: bool) -> Result<()> {
        match self.session.request_search(raw, track) {
            Notice::Search { word, track } => {
                self.current_state = UIState::Loading {
                    word: word.to_string(),
                };
                self.ui.render(&self.current_state)?;
                self.ui.reset_scroll();

                let outcome = self.openai.define(word.as_str()).await;
                self.session.complete_search(&word, outcome, track);
                self.show_current()
            }
            Notice::LoginRequired { searches } => self.show_login(searches, None),
            Notice::Busy => self.show_message("Still looking up the previous word"),
            _ => self.show_current(),
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let result = self.main_loop().await;
        self.ui.cleanup()?;
        result
    }

    async fn main_loop(&mut self) -> Result<()> {
        if self.session.displayed().is_none() && !matches!(self.current_state, UIState::Login { .. })
        {
            self.enter_word_mode()?;
        }

        loop {
            match self.ui.get_user_input(&self.current_state)? {
                UserAction::Quit => break,
                UserAction::EnterWord => self.enter_word_mode()?,
                UserAction::ConfirmInput(input) => self.confirm_input(&input).await?,
                UserAction::CancelInput
                    if self.session.displayed().is_none()
                        && matches!(self.current_state, UIState::WordInput { .. }) =>
                {
                    break
                }
                UserAction::CancelInput => self.cancel_input()?,
                UserAction::InputChar(c) => self.handle_input_char(c)?,
                UserAction::Backspace => self.handle_backspace()?,
                UserAction::ScrollUp => self.scroll_up()?,
                UserAction::ScrollDown => self.scroll_down()?,
                UserAction::SelectPrevTarget => self.select_prev_target()?,
                UserAction::SelectNextTarget => self.select_next_target()?,
                UserAction::SearchSelectedTarget => {
                    let index = self.ui.get_selected_target();
                    self.search_target(index).await?
                }
                UserAction::SearchTarget(number) => self.search_target(number - 1).await?,
                UserAction::GoBack => {
                    let notice = self.session.back();
                    self.after_navigation(notice)?
                }
                UserAction::GoForward => {
                    let notice = self.session.forward();
                    self.after_navigation(notice)?
                }
                UserAction::ShowHistory => self.show_history()?,
                UserAction::ShowRecent => self.show_recent()?,
                UserAction::SelectPrev => self.move_selection(false)?,
                UserAction::SelectNext => self.move_selection(true)?,
                UserAction::ConfirmSelection => self.confirm_selection().await?,
                UserAction::Refresh => self.handle_refresh().await?,
                UserAction::Login => {
                    let searches = self.session.gate().guest_count();
                    self.show_login(searches, None)?
                }
                UserAction::Logout => {
                    self.session.sign_out();
                    self.show_current()?
                }
                UserAction::DismissMessage => self.show_current()?,
            }
        }

        Ok(())
    }

    async fn confirm_input(&mut self, input: &str) -> Result<()> {
        if matches!(self.current_state, UIState::Login { .. }) {
            return self.sign_in(input).await;
        }
        if input.trim().is_empty() {
            return Ok(());
        }
        self.search(input, true).await
    }

    async fn sign_in(&mut self, handle: &str) -> Result<()> {
        match self.session.sign_in(handle) {
            Ok(Some(pending)) => self.search(pending.as_str(), true).await,
            Ok(None) => self.show_current(),
            Err(e) => {
                let searches = self.session.gate().guest_count();
                self.show_login(searches, Some(e.to_string()))
            }
        }
    }

    fn cancel_input(&mut self) -> Result<()> {
        if matches!(self.current_state, UIState::Login { .. }) {
            self.session.dismiss_login();
        }
        self.show_current()
    }

    async fn search_target(&mut self, index: usize) -> Result<()> {
        let target = match &self.current_state {
            UIState::Definition { targets, .. } => targets.get(index).cloned(),
            _ => None,
        };
        if let Some(target) = target {
            self.search(&target, true).await?;
        }
        Ok(())
    }

    fn after_navigation(&mut self, notice: Notice) -> Result<()> {
        match notice {
            Notice::Redraw => {
                self.ui.reset_scroll();
                self.show_current()
            }
            _ => Ok(()),
        }
    }

    async fn handle_refresh(&mut self) -> Result<()> {
        if let Some(word) = self.session.displayed().map(|d| d.word.clone()) {
            self.search(&word, false).await?;
        }
        Ok(())
    }

    fn show_history(&mut self) -> Result<()> {
        let history = self.session.history();
        let entries: Vec<HistoryRow> = history.entries().iter().map(history_row).collect();
        let current_index = history.current_index();

        self.current_state = UIState::History {
            entries,
            current_index,
            selected_index: current_index.unwrap_or(0),
        };
        self.ui.render(&self.current_state)
    }

    fn show_recent(&mut self) -> Result<()> {
        self.current_state = UIState::Recent {
            words: self.session.recent().words().to_vec(),
            selected_index: 0,
        };
        self.ui.render(&self.current_state)
    }

    fn move_selection(&mut self, down: bool) -> Result<()> {
        let (len, selected_index) = match &mut self.current_state {
            UIState::History {
                entries,
                selected_index,
                ..
            } => (entries.len(), selected_index),
            UIState::Recent {
                words,
                selected_index,
            } => (words.len(), selected_index),
            _ => return Ok(()),
        };
        if len == 0 {
            return Ok(());
        }

        *selected_index = if down {
            (*selected_index + 1) % len
        } else if *selected_index > 0 {
            *selected_index - 1
        } else {
            len - 1
        };
        self.ui.render(&self.current_state)
    }

    async fn confirm_selection(&mut self) -> Result<()> {
        match &self.current_state {
            UIState::History { selected_index, .. } => {
                let notice = self.session.jump_to(*selected_index);
                match notice {
                    Notice::Redraw => self.after_navigation(notice),
                    _ => self.show_current(),
                }
            }
            UIState::Recent {
                words,
                selected_index,
            } => match words.get(*selected_index).cloned() {
                Some(word) => self.search(&word, true).await,
                None => self.show_current(),
            },
            _ => Ok(()),
        }
    }

    fn enter_word_mode(&mut self) -> Result<()> {
        self.input.clear();
        self.current_state = UIState::WordInput {
            input: String::new(),
        };
        self.ui.render(&self.current_state)
    }

    fn show_login(&mut self, searches: u32, error: Option<String>) -> Result<()> {
        if !matches!(self.current_state, UIState::Login { .. }) {
            self.input.clear();
        }
        self.current_state = UIState::Login {
            input: self.input.clone(),
            searches,
            pending: self.session.gate().pending().map(|w| w.to_string()),
            error,
        };
        self.ui.render(&self.current_state)
    }

    fn show_message(&mut self, message: &str) -> Result<()> {
        self.current_state = UIState::Message {
            message: message.to_string(),
        };
        self.ui.render(&self.current_state)
    }

    /// Shows the displayed definition, or the word prompt when nothing is
    /// on screen yet.
    fn show_current(&mut self) -> Result<()> {
        let Some(displayed) = self.session.displayed() else {
            return self.enter_word_mode();
        };

        let blocks = markdown::render(&displayed.result);
        let targets: Vec<String> = blocks
            .iter()
            .flat_map(|b| b.search_targets())
            .map(str::to_string)
            .collect();
        debug!(word = %displayed.word, targets = targets.len(), "Showing definition");

        self.current_state = UIState::Definition {
            word: displayed.word.clone(),
            blocks,
            targets,
            status: self.status_line(),
        };
        self.ui.render(&self.current_state)
    }

    fn status_line(&self) -> String {
        let history = self.session.history();
        let position = match history.current_index() {
            Some(i) if !history.is_empty() => format!("{}/{}", i + 1, history.len()),
            _ => "-".to_string(),
        };
        let account = match self.session.identity() {
            Some(identity) => format!("Signed in as {}", identity.user_id()),
            None if self.session.gate().state() == GateState::Blocked => {
                "Guest (sign in to keep searching)".to_string()
            }
            None => {
                let gate = self.session.gate();
                format!(
                    "Guest ({}/{} searches)",
                    gate.guest_count().min(gate.threshold()),
                    gate.threshold()
                )
            }
        };
        format!(
            "{} • {}{} {}",
            account,
            if history.can_go_back() { "◀" } else { " " },
            if history.can_go_forward() { "▶" } else { " " },
            position
        )
    }

    fn scroll_up(&mut self) -> Result<()> {
        self.ui.scroll_up();
        self.ui.render(&self.current_state)
    }

    fn scroll_down(&mut self) -> Result<()> {
        self.ui.scroll_down();
        self.ui.render(&self.current_state)
    }

    fn select_prev_target(&mut self) -> Result<()> {
        self.ui.select_prev_target(self.targets_len());
        self.ui.render(&self.current_state)
    }

    fn select_next_target(&mut self) -> Result<()> {
        self.ui.select_next_target(self.targets_len());
        self.ui.render(&self.current_state)
    }

    fn targets_len(&self) -> usize {
        match &self.current_state {
            UIState::Definition { targets, .. } => targets.len(),
            _ => 0,
        }
    }

    fn handle_input_char(&mut self, c: char) -> Result<()> {
        self.input.push(c);
        self.refresh_input()
    }

    fn handle_backspace(&mut self) -> Result<()> {
        self.input.pop();
        self.refresh_input()
    }

    fn refresh_input(&mut self) -> Result<()> {
        match &mut self.current_state {
            UIState::WordInput { input } | UIState::Login { input, .. } => {
                *input = self.input.clone();
            }
            _ => return Ok(()),
        }
        self.ui.render(&self.current_state)
    }
}

fn history_row(entry: &SearchEntry) -> HistoryRow {
    let when = DateTime::from_timestamp_millis(entry.timestamp)
        .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default();
    HistoryRow {
        word: entry.word.clone(),
        when,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_row_formats_timestamp() {
        let entry = SearchEntry {
            word: "cat".to_string(),
            result: "A pet.".to_string(),
            timestamp: 0,
        };
        let row = history_row(&entry);
        assert_eq!(row.word, "cat");
        assert!(row.when.starts_with("19"));
    }

    #[test]
    fn history_row_tolerates_bad_timestamp() {
        let entry = SearchEntry {
            word: "cat".to_string(),
            result: String::new(),
            timestamp: i64::MAX,
        };
        assert_eq!(history_row(&entry).when, "");
    }
}
