//! Failure logging with opt-in escalation.
//!
//! Every failed allocation is logged locally with a fixed prefix naming this
//! crate and the host site. Failures that request escalation are additionally
//! handed to a [`LogForwarder`], but only when escalation is enabled in
//! [`ReportingConfig`] and an address is configured. Escalation is off by
//! default so routine failures do not flood whoever receives forwarded logs.

use std::sync::Arc;

use tracing::{error, warn};

use crate::config::ReportingConfig;
use crate::error::AllocationError;

/// Delivers an escalated log line to an external address.
pub trait LogForwarder: Send + Sync {
    fn forward(&self, address: &str, line: &str);
}

/// Forwards by emitting an event on the `reserve::escalation` target, for a
/// subscriber layer to route.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingForwarder;

impl LogForwarder for TracingForwarder {
    fn forward(&self, address: &str, line: &str) {
        error!(target: "reserve::escalation", address, "{}", line);
    }
}

#[derive(Clone)]
pub struct ErrorReporter {
    config: ReportingConfig,
    forwarder: Arc<dyn LogForwarder>,
}

impl ErrorReporter {
    pub fn new(config: ReportingConfig) -> Self {
        Self {
            config,
            forwarder: Arc::new(TracingForwarder),
        }
    }

    pub fn with_forwarder(mut self, forwarder: Arc<dyn LogForwarder>) -> Self {
        self.forwarder = forwarder;
        self
    }

    pub fn prefix(&self) -> String {
        format!("(reserve | {}) => ", self.config.site_url)
    }

    /// Logs `message` and, if requested and enabled, forwards it.
    ///
    /// Returns whether the line was forwarded.
    pub fn log(&self, message: &str, escalate: bool) -> bool {
        let line = format!("{}{}", self.prefix(), message);
        error!("{}", line);

        if !(escalate && self.config.escalate) {
            return false;
        }
        match &self.config.logs_address {
            Some(address) => {
                self.forwarder.forward(address, &line);
                true
            }
            None => false,
        }
    }

    /// Logs a failed allocation. Returns whether it was forwarded.
    pub(crate) fn report_failure(&self, target_id: u64, err: &AllocationError) -> bool {
        match err {
            AllocationError::InvalidTarget(reason) => {
                warn!(
                    target_id,
                    %reason,
                    "{}It is not possible to set the desired id.",
                    self.prefix()
                );
                false
            }
            AllocationError::StoreRejected(msg) => self.log(
                &format!("Store rejected allocation of id {}: {}", target_id, msg),
                err.is_escalatable(),
            ),
        }
    }
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new(ReportingConfig::default())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::error::InvalidTargetReason;

    /// Captures forwarded lines.
    #[derive(Default)]
    pub(crate) struct RecordingForwarder {
        pub(crate) lines: Mutex<Vec<(String, String)>>,
    }

    impl LogForwarder for RecordingForwarder {
        fn forward(&self, address: &str, line: &str) {
            self.lines
                .lock()
                .unwrap()
                .push((address.to_string(), line.to_string()));
        }
    }

    fn reporter(escalate: bool, address: Option<&str>) -> (ErrorReporter, Arc<RecordingForwarder>) {
        let forwarder = Arc::new(RecordingForwarder::default());
        let config = ReportingConfig {
            site_url: "https://example.com".to_string(),
            escalate,
            logs_address: address.map(str::to_string),
        };
        let reporter = ErrorReporter::new(config).with_forwarder(forwarder.clone());
        (reporter, forwarder)
    }

    #[test]
    fn should_prefix_with_crate_and_site() {
        let (reporter, _) = reporter(false, None);

        assert_eq!(reporter.prefix(), "(reserve | https://example.com) => ");
    }

    #[test]
    fn should_not_forward_when_escalation_disabled() {
        // given
        let (reporter, forwarder) = reporter(false, Some("dev@example.com"));

        // when
        let forwarded = reporter.log("disk on fire", true);

        // then
        assert!(!forwarded);
        assert!(forwarder.lines.lock().unwrap().is_empty());
    }

    #[test]
    fn should_forward_prefixed_line_when_enabled_and_requested() {
        // given
        let (reporter, forwarder) = reporter(true, Some("dev@example.com"));

        // when
        let forwarded = reporter.log("disk on fire", true);

        // then
        assert!(forwarded);
        let lines = forwarder.lines.lock().unwrap();
        assert_eq!(
            lines.as_slice(),
            &[(
                "dev@example.com".to_string(),
                "(reserve | https://example.com) => disk on fire".to_string()
            )]
        );
    }

    #[test]
    fn should_not_forward_unrequested_line() {
        let (reporter, forwarder) = reporter(true, Some("dev@example.com"));

        assert!(!reporter.log("routine", false));
        assert!(forwarder.lines.lock().unwrap().is_empty());
    }

    #[test]
    fn should_not_forward_without_address() {
        let (reporter, _) = reporter(true, None);

        assert!(!reporter.log("disk on fire", true));
    }

    #[test]
    fn should_never_escalate_invalid_target() {
        // given
        let (reporter, forwarder) = reporter(true, Some("dev@example.com"));
        let err = AllocationError::InvalidTarget(InvalidTargetReason::GuardRejected);

        // when
        let forwarded = reporter.report_failure(20, &err);

        // then
        assert!(!forwarded);
        assert!(forwarder.lines.lock().unwrap().is_empty());
    }

    #[test]
    fn should_escalate_store_rejection_when_enabled() {
        let (reporter, forwarder) = reporter(true, Some("dev@example.com"));
        let err = AllocationError::StoreRejected("write failed".to_string());

        assert!(reporter.report_failure(20, &err));
        assert_eq!(forwarder.lines.lock().unwrap().len(), 1);
    }
}
