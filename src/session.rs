//! Search session state.
//!
//! `Session` owns every piece of lookup state and changes it only through the
//! transition methods below. Each transition returns a [`Notice`] telling the
//! front end what to do next; the front end performs the network call itself
//! and reports back with [`Session::complete_search`].

use crate::config::Limits;
use crate::error::{DefineError, FALLBACK_MESSAGE};
use crate::gate::{AccessGate, Admission};
use crate::history::{NavigationHistory, SearchEntry};
use crate::identity::{Identity, IdentityError};
use crate::prompt::Word;
use crate::recent::RecentSearches;
use crate::store::{user_key, PersistedUserState, Store, GUEST_COUNT_KEY};
use chrono::Utc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Blank input, nothing to do.
    Ignored,
    /// Another lookup is still running.
    Busy,
    /// Run this lookup, then call `complete_search`.
    Search { word: Word, track: bool },
    LoginRequired { searches: u32 },
    Redraw,
    Unchanged,
}

/// The word and text currently on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Displayed {
    pub word: String,
    pub result: String,
}

impl From<&SearchEntry> for Displayed {
    fn from(entry: &SearchEntry) -> Self {
        Self {
            word: entry.word.clone(),
            result: entry.result.clone(),
        }
    }
}

pub struct Session {
    history: NavigationHistory,
    recent: RecentSearches,
    gate: AccessGate,
    identity: Option<Identity>,
    displayed: Option<Displayed>,
    in_flight: Option<Word>,
    store: Store,
}

impl Session {
    pub fn new(mut store: Store, limits: Limits) -> Self {
        let mut gate = AccessGate::new(limits.guest_searches);
        match store.get::<u32>(GUEST_COUNT_KEY) {
            Ok(Some(count)) => gate.restore_count(count),
            Ok(None) => {}
            Err(e) => {
                warn!("Ignoring stored guest search count: {}", e);
                if let Err(e) = store.remove(GUEST_COUNT_KEY) {
                    warn!("Failed to remove guest search count: {}", e);
                }
            }
        }

        Self {
            history: NavigationHistory::new(),
            recent: RecentSearches::with_capacity(limits.recent_searches),
            gate,
            identity: None,
            displayed: None,
            in_flight: None,
            store,
        }
    }

    /// Starts a lookup for `raw`. With `track`, the finished lookup becomes a
    /// new history entry.
    pub fn request_search(&mut self, raw: &str, track: bool) -> Notice {
        let Ok(word) = Word::parse(raw) else {
            return Notice::Ignored;
        };
        if let Some(current) = &self.in_flight {
            debug!(word = %word, in_flight = %current, "Search refused while loading");
            return Notice::Busy;
        }

        let authenticated = self.is_authenticated();
        match self.gate.admit(word, authenticated) {
            Admission::Proceed(word) => {
                info!(word = %word, track, "Starting search");
                self.in_flight = Some(word.clone());
                Notice::Search { word, track }
            }
            Admission::Blocked { searches } => {
                info!(searches, "Guest search limit reached");
                Notice::LoginRequired { searches }
            }
        }
    }

    /// Finishes the running lookup. Failures are logged and shown as the
    /// fallback message.
    pub fn complete_search(&mut self, word: &Word, outcome: Result<String, DefineError>, track: bool) {
        self.in_flight = None;

        let result = match outcome {
            Ok(text) => {
                info!(word = %word, "Search finished");
                text
            }
            Err(e) => {
                warn!(word = %word, status = e.status(), local = e.is_local(), "Search failed: {}", e);
                FALLBACK_MESSAGE.to_string()
            }
        };

        self.history.record_result(word.as_str(), &result, track);
        self.recent.record(word.as_str());
        self.displayed = Some(Displayed {
            word: word.to_string(),
            result,
        });

        let authenticated = self.is_authenticated();
        self.gate.record_completion(authenticated);
        if authenticated {
            self.save_user_state();
        } else {
            self.save_guest_count();
        }
    }

    pub fn back(&mut self) -> Notice {
        let displayed = self.history.back().map(Displayed::from);
        self.show_replayed(displayed)
    }

    pub fn forward(&mut self) -> Notice {
        let displayed = self.history.forward().map(Displayed::from);
        self.show_replayed(displayed)
    }

    pub fn jump_to(&mut self, index: usize) -> Notice {
        let displayed = self.history.jump_to(index).map(Displayed::from);
        self.show_replayed(displayed)
    }

    fn show_replayed(&mut self, displayed: Option<Displayed>) -> Notice {
        match displayed {
            Some(displayed) => {
                debug!(word = %displayed.word, index = ?self.history.current_index(), "Replaying entry");
                self.displayed = Some(displayed);
                if self.is_authenticated() {
                    self.save_user_state();
                }
                Notice::Redraw
            }
            None => Notice::Unchanged,
        }
    }

    /// Establishes an identity and loads that user's stored state. Returns the
    /// search held back by the gate, if any; it is handed out only once.
    pub fn sign_in(&mut self, handle: &str) -> Result<Option<Word>, IdentityError> {
        let identity = Identity::sign_in(handle)?;
        if self
            .identity
            .as_ref()
            .is_some_and(|current| current != &identity)
        {
            // Only a guest session is adopted by a new account.
            self.sign_out();
        }
        info!(user = identity.user_id(), "Signed in");

        match self
            .store
            .get::<PersistedUserState>(&user_key(identity.user_id()))
        {
            Ok(Some(state)) => self.apply_user_state(state),
            // First sign-in keeps what the guest session already has.
            Ok(None) => {}
            Err(e) => {
                warn!(user = identity.user_id(), "Discarding stored history: {}", e);
                self.history.clear();
                self.recent.clear();
                self.displayed = None;
            }
        }

        self.identity = Some(identity);
        let pending = self.gate.establish_identity();
        self.save_guest_count();
        self.save_user_state();
        Ok(pending)
    }

    pub fn sign_out(&mut self) {
        if let Some(identity) = self.identity.take() {
            info!(user = identity.user_id(), "Signed out");
        }
        self.history.clear();
        self.recent.clear();
        self.displayed = None;
    }

    pub fn dismiss_login(&mut self) {
        self.gate.dismiss();
    }

    fn apply_user_state(&mut self, state: PersistedUserState) {
        let index = usize::try_from(state.current_index).ok();
        self.history.restore(state.navigation_history, index);
        self.recent.restore(state.search_history);
        self.displayed = self.history.current().map(Displayed::from);
    }

    fn save_user_state(&mut self) {
        let Some(identity) = &self.identity else {
            return;
        };
        let state = PersistedUserState {
            search_history: self.recent.words().to_vec(),
            navigation_history: self.history.entries().to_vec(),
            current_index: self.history.current_index().map_or(-1, |i| i as i64),
            last_updated: Utc::now().timestamp_millis(),
        };
        let key = user_key(identity.user_id());
        if let Err(e) = self.store.set(&key, &state) {
            warn!("Failed to save {}: {}", key, e);
        }
    }

    fn save_guest_count(&mut self) {
        if let Err(e) = self.store.set(GUEST_COUNT_KEY, &self.gate.guest_count()) {
            warn!("Failed to save guest search count: {}", e);
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn displayed(&self) -> Option<&Displayed> {
        self.displayed.as_ref()
    }

    pub fn history(&self) -> &NavigationHistory {
        &self.history
    }

    pub fn recent(&self) -> &RecentSearches {
        &self.recent
    }

    pub fn gate(&self) -> &AccessGate {
        &self.gate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::GateState;

    fn session() -> Session {
        Session::new(Store::ephemeral(), Limits::default())
    }

    /// Runs a search to completion with a canned outcome.
    fn search(session: &mut Session, raw: &str) -> Notice {
        let notice = session.request_search(raw, true);
        if let Notice::Search { word, track } = &notice {
            let text = format!("{} means something", word);
            session.complete_search(word, Ok(text), *track);
        }
        notice
    }

    fn stored_user(session: &Session, user: &str) -> PersistedUserState {
        session.store.get(&user_key(user)).unwrap().unwrap()
    }

    #[test]
    fn blank_input_is_ignored() {
        let mut session = session();
        assert_eq!(session.request_search("   ", true), Notice::Ignored);
        assert!(session.in_flight.is_none());
    }

    #[test]
    fn second_search_is_refused_while_loading() {
        let mut session = session();
        assert!(matches!(session.request_search("cat", true), Notice::Search { .. }));
        assert_eq!(session.request_search("dog", true), Notice::Busy);
    }

    #[test]
    fn completed_search_updates_history_and_recent() {
        let mut session = session();
        search(&mut session, " cat ");
        search(&mut session, "dog");

        assert_eq!(session.history().len(), 2);
        assert_eq!(session.recent().words(), &["dog", "cat"]);
        assert_eq!(session.displayed().unwrap().word, "dog");
        assert!(session.in_flight.is_none());
    }

    #[test]
    fn failure_is_recorded_as_fallback_text() {
        let mut session = session();
        let Notice::Search { word, .. } = session.request_search("cat", true) else {
            panic!("expected search");
        };
        session.complete_search(&word, Err(DefineError::EmptyResponse), true);

        assert_eq!(session.history().current().unwrap().result, FALLBACK_MESSAGE);
        assert_eq!(session.displayed().unwrap().result, FALLBACK_MESSAGE);
        assert_eq!(session.gate().guest_count(), 1);
    }

    #[test]
    fn untracked_search_leaves_history_alone() {
        let mut session = session();
        search(&mut session, "cat");
        let Notice::Search { word, track } = session.request_search("cat", false) else {
            panic!("expected search");
        };
        session.complete_search(&word, Ok("fresh text".to_string()), track);

        assert_eq!(session.history().len(), 1);
        assert_eq!(session.displayed().unwrap().result, "fresh text");
    }

    #[test]
    fn third_guest_search_requires_login() {
        let mut session = session();
        assert!(matches!(search(&mut session, "cat"), Notice::Search { .. }));
        assert!(matches!(search(&mut session, "dog"), Notice::Search { .. }));
        assert_eq!(
            search(&mut session, "bird"),
            Notice::LoginRequired { searches: 2 }
        );
        assert_eq!(session.gate().state(), GateState::Blocked);
        assert_eq!(session.history().len(), 2);
    }

    #[test]
    fn sign_in_replays_blocked_word_once_and_resets_count() {
        let mut session = session();
        search(&mut session, "cat");
        search(&mut session, "dog");
        search(&mut session, "bird");

        let pending = session.sign_in("kenji@example.com").unwrap();
        assert_eq!(pending, Some(Word::parse("bird").unwrap()));
        assert_eq!(session.gate().guest_count(), 0);
        assert_eq!(session.store.get::<u32>(GUEST_COUNT_KEY).unwrap(), Some(0));

        assert!(matches!(search(&mut session, "bird"), Notice::Search { .. }));
        assert_eq!(session.sign_in("kenji@example.com").unwrap(), None);
    }

    #[test]
    fn signed_in_searches_are_unlimited_and_persisted() {
        let mut session = session();
        session.sign_in("kenji").unwrap();
        for word in ["a", "b", "c", "d"] {
            assert!(matches!(search(&mut session, word), Notice::Search { .. }));
        }

        let stored = stored_user(&session, "kenji");
        assert_eq!(stored.navigation_history.len(), 4);
        assert_eq!(stored.current_index, 3);
        assert_eq!(stored.search_history[0], "d");
    }

    #[test]
    fn guest_count_is_persisted_and_restored() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut session = Session::new(Store::persistent(dir.path()), Limits::default());
            search(&mut session, "cat");
            search(&mut session, "dog");
        }
        let mut session = Session::new(Store::persistent(dir.path()), Limits::default());
        assert_eq!(session.gate().guest_count(), 2);
        assert!(matches!(
            session.request_search("bird", true),
            Notice::LoginRequired { .. }
        ));
    }

    #[test]
    fn first_sign_in_adopts_guest_history() {
        let mut session = session();
        search(&mut session, "cat");
        session.sign_in("kenji").unwrap();

        assert_eq!(session.history().len(), 1);
        assert_eq!(stored_user(&session, "kenji").navigation_history[0].word, "cat");
    }

    #[test]
    fn sign_in_loads_stored_history() {
        let mut store = Store::ephemeral();
        store
            .set(
                &user_key("kenji"),
                &PersistedUserState {
                    search_history: vec!["dog".to_string(), "cat".to_string()],
                    navigation_history: vec![
                        SearchEntry::new("cat", "A pet."),
                        SearchEntry::new("dog", "Another pet."),
                    ],
                    current_index: 0,
                    last_updated: 0,
                },
            )
            .unwrap();

        let mut session = Session::new(store, Limits::default());
        search(&mut session, "bird");
        session.sign_in("kenji").unwrap();

        assert_eq!(session.history().len(), 2);
        assert_eq!(session.history().current_index(), Some(0));
        assert_eq!(session.displayed().unwrap().word, "cat");
        assert_eq!(session.recent().words(), &["dog", "cat"]);
    }

    #[test]
    fn malformed_user_state_starts_empty() {
        let mut store = Store::ephemeral();
        store.set_raw(&user_key("kenji"), "[1, 2");
        let mut session = Session::new(store, Limits::default());
        search(&mut session, "cat");

        session.sign_in("kenji").unwrap();
        assert!(session.history().is_empty());
        assert!(session.displayed().is_none());
        assert!(stored_user(&session, "kenji").navigation_history.is_empty());
    }

    #[test]
    fn malformed_guest_count_starts_at_zero() {
        let mut store = Store::ephemeral();
        store.set_raw(GUEST_COUNT_KEY, "\"two\"");
        let session = Session::new(store, Limits::default());
        assert_eq!(session.gate().guest_count(), 0);
        assert_eq!(session.store.get::<u32>(GUEST_COUNT_KEY).unwrap(), None);
    }

    #[test]
    fn navigation_replays_without_searching() {
        let mut session = session();
        session.sign_in("kenji").unwrap();
        search(&mut session, "cat");
        search(&mut session, "dog");
        search(&mut session, "bird");

        assert_eq!(session.back(), Notice::Redraw);
        assert_eq!(session.displayed().unwrap().word, "dog");
        assert_eq!(session.jump_to(0), Notice::Redraw);
        assert_eq!(session.displayed().unwrap().word, "cat");
        assert_eq!(session.back(), Notice::Unchanged);
        assert_eq!(session.forward(), Notice::Redraw);
        assert_eq!(session.displayed().unwrap().word, "dog");
        assert_eq!(session.history().len(), 3);
        assert!(session.in_flight.is_none());
        assert_eq!(stored_user(&session, "kenji").current_index, 1);
    }

    #[test]
    fn sign_out_clears_view_state() {
        let mut session = session();
        session.sign_in("kenji").unwrap();
        search(&mut session, "cat");
        session.sign_out();

        assert!(!session.is_authenticated());
        assert!(session.history().is_empty());
        assert!(session.displayed().is_none());
        assert_eq!(stored_user(&session, "kenji").navigation_history.len(), 1);
    }

    #[test]
    fn switching_accounts_does_not_carry_history_over() {
        let mut session = session();
        session.sign_in("alice").unwrap();
        search(&mut session, "secret");

        session.sign_in("bob").unwrap();
        assert!(session.history().is_empty());
        assert!(session.recent().words().is_empty());
        assert!(session.displayed().is_none());

        let bob = stored_user(&session, "bob");
        assert!(bob.navigation_history.is_empty());
        assert!(bob.search_history.is_empty());
        assert_eq!(stored_user(&session, "alice").navigation_history[0].word, "secret");

        session.sign_in("alice").unwrap();
        assert_eq!(session.displayed().unwrap().word, "secret");
    }

    #[test]
    fn signing_in_again_as_same_user_keeps_state() {
        let mut session = session();
        session.sign_in("alice").unwrap();
        search(&mut session, "cat");

        session.sign_in("Alice").unwrap();
        assert_eq!(session.history().len(), 1);
        assert_eq!(session.displayed().unwrap().word, "cat");
    }

    #[test]
    fn invalid_handle_keeps_gate_blocked() {
        let mut session = session();
        search(&mut session, "cat");
        search(&mut session, "dog");
        search(&mut session, "bird");

        assert!(session.sign_in("not valid!").is_err());
        assert_eq!(session.gate().state(), GateState::Blocked);
        assert!(session.gate().pending().is_some());
    }
}
