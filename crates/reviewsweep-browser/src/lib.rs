//! ReviewSweep Browser: review extraction through a browser-automation handle.
//!
//! The automation product stays behind [`AutomationHandle`]. On top of it:
//! the [`ExtractionScroller`] state machine, the multi-pass
//! [`ReviewPipeline`], saved account sessions ([`CookieJarStore`]) and the
//! per-session [`ReportSession`] context.

pub mod config;
pub mod credentials;
pub mod error;
pub mod handle;
pub mod pipeline;
pub mod scroller;
pub mod session;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod types;

pub use config::{PageTiming, ReviewSelectors, ScraperConfig, ScrollConfig};
pub use credentials::{CookieJarStore, CredentialStore, COOKIE_EXPIRY_MINUTES};
pub use error::{BrowserError, BrowserResult};
pub use handle::{AutomationHandle, ElementRef, Selector};
pub use pipeline::ReviewPipeline;
pub use scroller::ExtractionScroller;
pub use session::ReportSession;
pub use types::*;
