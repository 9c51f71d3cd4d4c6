use std::fmt;

/// Lifecycle of the authenticated scraping session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Unauthenticated,
    Authenticated,
    Expired,
    Reauthenticating,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SessionState::Unauthenticated => "unauthenticated",
            SessionState::Authenticated => "authenticated",
            SessionState::Expired => "expired",
            SessionState::Reauthenticating => "reauthenticating",
        };
        f.write_str(label)
    }
}

/// Pure transition table for [`SessionState`].
///
/// The IO side drives it: `begin_authentication` before calling the
/// authenticator, then exactly one of `authentication_succeeded` or
/// `authentication_failed`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionMachine {
    state: SessionState,
    consecutive_failures: u32,
}

impl SessionMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_valid(&self) -> bool {
        self.state == SessionState::Authenticated
    }

    /// Failed authentication attempts since the last success.
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Moves to `Reauthenticating` if a new session is needed.
    /// Returns false when the session is already valid.
    pub fn begin_authentication(&mut self) -> bool {
        match self.state {
            SessionState::Authenticated => false,
            SessionState::Unauthenticated
            | SessionState::Expired
            | SessionState::Reauthenticating => {
                self.state = SessionState::Reauthenticating;
                true
            }
        }
    }

    pub fn authentication_succeeded(&mut self) {
        self.state = SessionState::Authenticated;
        self.consecutive_failures = 0;
    }

    pub fn authentication_failed(&mut self) {
        self.state = SessionState::Expired;
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
    }

    /// A fetch reported the session as invalid. Idempotent from any state.
    pub fn invalidate(&mut self) {
        self.state = SessionState::Expired;
    }
}
