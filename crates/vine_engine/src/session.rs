use std::sync::Arc;

use engine_logging::{engine_info, engine_warn};
use vine_core::{SessionMachine, SessionState};

use crate::auth::{AuthError, Authenticator};
use crate::fetch::Session;

#[derive(Debug, thiserror::Error)]
#[error("session unavailable: {0}")]
pub struct SessionError(#[from] pub AuthError);

/// Owns the authenticated session and its state machine.
pub struct SessionController {
    machine: SessionMachine,
    authenticator: Arc<dyn Authenticator>,
    session: Option<Session>,
}

impl SessionController {
    pub fn new(authenticator: Arc<dyn Authenticator>) -> Self {
        Self {
            machine: SessionMachine::new(),
            authenticator,
            session: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.machine.state()
    }

    /// Returns the current session, authenticating first unless it is valid.
    pub async fn ensure_valid(&mut self) -> Result<Session, SessionError> {
        if !self.machine.begin_authentication() {
            if let Some(session) = &self.session {
                return Ok(session.clone());
            }
            // Authenticated without a session object cannot happen through
            // this type; recover by authenticating again.
            self.machine.invalidate();
            self.machine.begin_authentication();
        }

        match self.authenticator.authenticate().await {
            Ok(session) => {
                self.machine.authentication_succeeded();
                self.session = Some(session.clone());
                Ok(session)
            }
            Err(err) => {
                self.machine.authentication_failed();
                self.session = None;
                Err(SessionError(err))
            }
        }
    }

    /// A fetch saw the sign-in page. Drops the session until the next `ensure_valid`.
    pub fn invalidate(&mut self, reason: &str) {
        if self.machine.is_valid() {
            engine_warn!("Session expired: {}", reason);
            engine_info!("Attempting to re-establish session on the next cycle.");
        }
        self.machine.invalidate();
        self.session = None;
    }
}
