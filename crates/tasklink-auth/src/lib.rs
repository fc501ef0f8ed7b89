//! Login orchestration for the task marketplace.
//!
//! [`LoginOrchestrator`] drives a [`tasklink_browser::BrowserSession`] through
//! the sign-in modal, solving the reCAPTCHA widget with a
//! [`tasklink_captcha::CaptchaSolver`] when one is present. It runs once and
//! never retries; the caller decides whether a failed run is repeated.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod error;
pub mod orchestrator;
pub mod outcome;
pub mod selectors;

pub use error::{AuthError, Result};
pub use orchestrator::{LoginOrchestrator, LoginTimings};
pub use outcome::{AuthOutcome, LoginState};
pub use selectors::LoginSelectors;
