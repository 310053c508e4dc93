//! Access event logging.
//!
//! [`EventLogger`] is the single place where view, download and login
//! events are emitted. Recording never fails the caller: a backend error is
//! logged at WARN and dropped.

use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::{AccessEvent, EventKind};
use crate::traits::EventRecorder;

/// Fire-and-forget wrapper around an [`EventRecorder`].
#[derive(Clone)]
pub struct EventLogger {
    recorder: Arc<dyn EventRecorder>,
}

impl EventLogger {
    pub fn new(recorder: Arc<dyn EventRecorder>) -> Self {
        Self { recorder }
    }

    /// Record an event. Returns whether the backend accepted it; callers are
    /// free to ignore the result.
    pub async fn record(&self, kind: EventKind, user_id: Uuid, document_id: Option<Uuid>) -> bool {
        let event = AccessEvent::new(kind, user_id, document_id);
        match self.recorder.record_event(&event).await {
            Ok(()) => {
                debug!(
                    event = kind.as_str(),
                    user_id = %user_id,
                    document_id = ?document_id,
                    "Access event recorded"
                );
                true
            }
            Err(e) => {
                warn!(
                    event = kind.as_str(),
                    user_id = %user_id,
                    document_id = ?document_id,
                    error = %e,
                    "Failed to record access event"
                );
                false
            }
        }
    }
}

impl std::fmt::Debug for EventLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLogger").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Collecting {
        events: Mutex<Vec<AccessEvent>>,
        fail: bool,
    }

    #[async_trait]
    impl EventRecorder for Collecting {
        async fn record_event(&self, event: &AccessEvent) -> Result<()> {
            if self.fail {
                return Err(Error::Remote {
                    status: 503,
                    message: "unavailable".into(),
                });
            }
            self.events.lock().unwrap().push(event.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_record_forwards_event() {
        let sink = Arc::new(Collecting::default());
        let logger = EventLogger::new(sink.clone());
        let user = Uuid::new_v4();
        let doc = Uuid::new_v4();

        assert!(logger.record(EventKind::View, user, Some(doc)).await);

        let events = sink.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::View);
        assert_eq!(events[0].user_id, user);
        assert_eq!(events[0].document_id, Some(doc));
    }

    #[tokio::test]
    async fn test_record_failure_is_swallowed() {
        let sink = Arc::new(Collecting {
            fail: true,
            ..Default::default()
        });
        let logger = EventLogger::new(sink);
        assert!(!logger.record(EventKind::Login, Uuid::new_v4(), None).await);
    }
}
