use crate::config::DEFAULT_GUEST_LIMIT;
use crate::prompt::Word;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Open,
    Blocked,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    Proceed(Word),
    /// The word was held back; sign-in is required.
    Blocked { searches: u32 },
}

/// Limits anonymous lookups until an identity is established.
#[derive(Debug, Clone)]
pub struct AccessGate {
    state: GateState,
    guest_count: u32,
    threshold: u32,
    pending: Option<Word>,
}

impl Default for AccessGate {
    fn default() -> Self {
        Self::new(DEFAULT_GUEST_LIMIT)
    }
}

impl AccessGate {
    pub fn new(threshold: u32) -> Self {
        Self {
            state: GateState::Open,
            guest_count: 0,
            threshold,
            pending: None,
        }
    }

    pub fn admit(&mut self, word: Word, authenticated: bool) -> Admission {
        if authenticated {
            return Admission::Proceed(word);
        }

        if self.state == GateState::Blocked || self.guest_count >= self.threshold {
            debug!(word = %word, count = self.guest_count, "Guest limit reached, holding search");
            self.state = GateState::Blocked;
            self.pending = Some(word);
            return Admission::Blocked {
                searches: self.guest_count,
            };
        }

        Admission::Proceed(word)
    }

    /// Counts a finished anonymous lookup, successful or not.
    pub fn record_completion(&mut self, authenticated: bool) {
        if !authenticated && self.state == GateState::Open {
            self.guest_count += 1;
        }
    }

    /// Reopens the gate and hands back the held word, once.
    pub fn establish_identity(&mut self) -> Option<Word> {
        self.state = GateState::Open;
        self.guest_count = 0;
        self.pending.take()
    }

    /// Login prompt closed without signing in.
    ///
    /// Nothing is reset: the gate stays blocked and keeps the held word until
    /// an identity is established or another blocked search replaces it.
    pub fn dismiss(&mut self) {
        debug!(pending = ?self.pending, "Login dismissed");
    }

    /// Restores a stored anonymous count.
    pub fn restore_count(&mut self, count: u32) {
        self.guest_count = count;
        self.state = GateState::Open;
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    pub fn guest_count(&self) -> u32 {
        self.guest_count
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn pending(&self) -> Option<&Word> {
        self.pending.as_ref()
    }
}
