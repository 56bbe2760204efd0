//! Explicit per-session context passed into pipeline runs.

use tokio_util::sync::CancellationToken;

use crate::types::CookieJar;

/// Who is reporting, and whether the user asked to stop.
#[derive(Debug, Clone, Default)]
pub struct ReportSession {
    reporter: Option<String>,
    cancel: CancellationToken,
}

impl ReportSession {
    pub fn new(reporter: Option<String>) -> Self {
        Self {
            reporter,
            cancel: CancellationToken::new(),
        }
    }

    /// Session without a reporting account (scrape only).
    pub fn anonymous() -> Self {
        Self::new(None)
    }

    /// Session reporting as the owner of `jar`.
    pub fn for_jar(jar: &CookieJar) -> Self {
        Self::new(Some(jar.reporter_key().to_string()))
    }

    /// Key under which this session's reports are recorded.
    pub fn reporter(&self) -> Option<&str> {
        self.reporter.as_deref()
    }

    /// Token shared with long-running loops; cancelling it stops them at
    /// their next iteration.
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_reporter_prefers_email() {
        let jar = CookieJar {
            account: "acct1".into(),
            email: Some("ann@example.com".into()),
            cookies: vec![],
            saved_at: Utc::now(),
        };
        assert_eq!(ReportSession::for_jar(&jar).reporter(), Some("ann@example.com"));

        let jar = CookieJar { email: None, ..jar };
        assert_eq!(ReportSession::for_jar(&jar).reporter(), Some("acct1"));
        assert_eq!(ReportSession::anonymous().reporter(), None);
    }

    #[test]
    fn test_clones_share_cancellation() {
        let session = ReportSession::new(Some("r".into()));
        let worker_view = session.clone();
        assert!(!worker_view.is_cancelled());
        session.cancel();
        assert!(worker_view.is_cancelled());
        assert!(worker_view.cancel_token().is_cancelled());
    }
}
