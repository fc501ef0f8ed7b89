//! reCAPTCHA solving through the Anti-Captcha asynchronous job API.
//!
//! [`AntiCaptchaClient`] speaks the provider's wire protocol and implements
//! [`CaptchaApi`]. [`PollingSolver`] drives any [`CaptchaApi`] through the
//! submit/poll protocol under explicit retry and poll policies, exposed to
//! callers as the [`CaptchaSolver`] capability.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod api;
pub mod error;
pub mod solver;

pub use api::{AntiCaptchaClient, ApiStatus, CaptchaApi, CreateTaskResponse, Solution, TaskResultResponse};
pub use error::{CaptchaError, Result, TransportError};
pub use solver::{CaptchaSolver, PollingSolver, SolveRequest, SolveStatus};
