//! Login results and states.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Successful end of a login attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthOutcome {
    /// The session was already signed in; nothing was submitted
    AlreadyAuthenticated,

    /// Credentials were submitted and the signed-in marker appeared
    Verified {
        /// Whether a challenge token was solved and injected
        challenge_solved: bool,
    },
}

/// Step of the login state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginState {
    /// Nothing done yet
    Start,
    /// Signed-in marker found on the home page
    AlreadyAuthenticated,
    /// Sign-in modal opened
    ModalOpened,
    /// Challenge widget found
    ChallengeDetected,
    /// Waiting on the solver
    ChallengeSolving,
    /// Credentials typed
    FormFilled,
    /// Form submitted
    Submitted,
    /// Signed-in marker found after submitting
    Verified,
    /// Terminal failure
    Failed,
}

impl LoginState {
    /// Move to `next`, logging the transition.
    pub fn advance(&mut self, next: Self) {
        tracing::debug!(from = %self, to = %next, "Login state transition");
        *self = next;
    }
}

impl fmt::Display for LoginState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::AlreadyAuthenticated => "already_authenticated",
            Self::ModalOpened => "modal_opened",
            Self::ChallengeDetected => "challenge_detected",
            Self::ChallengeSolving => "challenge_solving",
            Self::FormFilled => "form_filled",
            Self::Submitted => "submitted",
            Self::Verified => "verified",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance() {
        let mut state = LoginState::Start;

        state.advance(LoginState::ModalOpened);
        assert_eq!(state, LoginState::ModalOpened);
        assert_eq!(state.to_string(), "modal_opened");

        state.advance(LoginState::Failed);
        assert_eq!(state.to_string(), "failed");
    }
}
