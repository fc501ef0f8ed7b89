//! Browser session capability for Tasklink.
//!
//! The rest of the workspace only sees the [`BrowserSession`] and
//! [`PageElement`] traits. Two adapters implement them:
//!
//! - [`ChromeSession`] drives a headless Chrome over CDP (chromiumoxide)
//! - [`SnapshotSession`] serves captured HTML pages for fixtures and dry runs

pub mod engine;
pub mod error;
pub mod fingerprint;
pub mod session;
pub mod snapshot;

pub use engine::ChromeSession;
pub use error::{BrowserError, Result};
pub use fingerprint::LaunchProfile;
pub use session::{BrowserSession, PageElement, WaitCondition};
pub use snapshot::{SnapshotAction, SnapshotSession};
