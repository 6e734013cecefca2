//! Progress notification sinks
//!
//! Long-running stages (tiled inference, clustering) broadcast short status
//! messages to every registered sink. Sinks are notified synchronously and can
//! not influence the computation: they return nothing and errors inside a sink
//! stay inside the sink.

use std::fmt;
use std::sync::Arc;
use tracing::info;

/// Receiver of progress and status messages
pub trait NotificationSink: Send + Sync {
    fn notify(&self, message: &str);
}

impl<F> NotificationSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn notify(&self, message: &str) {
        self(message);
    }
}

/// Sink forwarding every message to `tracing` at info level
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, message: &str) {
        info!("{message}");
    }
}

/// Broadcasts messages to a list of registered sinks
///
/// The default notifier carries a [`TracingSink`]; use [`Notifier::silent`]
/// to start from an empty list.
#[derive(Clone)]
pub struct Notifier {
    sinks: Vec<Arc<dyn NotificationSink>>,
}

impl Notifier {
    /// Notifier without any sink
    #[must_use]
    pub fn silent() -> Self {
        Self { sinks: Vec::new() }
    }

    /// Register an additional sink
    pub fn register(&mut self, sink: Arc<dyn NotificationSink>) {
        self.sinks.push(sink);
    }

    /// Builder-style variant of [`Notifier::register`]
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.register(sink);
        self
    }

    /// Number of registered sinks
    #[must_use]
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Send `message` to all sinks in registration order
    pub fn notify(&self, message: &str) {
        for sink in &self.sinks {
            sink.notify(message);
        }
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self {
            sinks: vec![Arc::new(TracingSink)],
        }
    }
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_default_has_tracing_sink() {
        let notifier = Notifier::default();
        assert_eq!(notifier.len(), 1);
        assert!(Notifier::silent().is_empty());
    }

    #[test]
    fn test_broadcast_to_all_sinks() {
        let first = Arc::new(Mutex::new(Vec::<String>::new()));
        let second = Arc::new(Mutex::new(Vec::<String>::new()));

        let sink_a = Arc::clone(&first);
        let sink_b = Arc::clone(&second);
        let notifier = Notifier::silent()
            .with_sink(Arc::new(move |msg: &str| {
                sink_a.lock().unwrap().push(msg.to_string());
            }))
            .with_sink(Arc::new(move |msg: &str| {
                sink_b.lock().unwrap().push(msg.to_uppercase());
            }));

        notifier.notify("segmenting patch 1 / 8 ...");
        notifier.notify("done");

        assert_eq!(
            *first.lock().unwrap(),
            vec!["segmenting patch 1 / 8 ...", "done"]
        );
        assert_eq!(
            *second.lock().unwrap(),
            vec!["SEGMENTING PATCH 1 / 8 ...", "DONE"]
        );
    }

    #[test]
    fn test_clone_shares_sinks() {
        let count = Arc::new(Mutex::new(0usize));
        let counter = Arc::clone(&count);
        let notifier = Notifier::silent().with_sink(Arc::new(move |_: &str| {
            *counter.lock().unwrap() += 1;
        }));

        let cloned = notifier.clone();
        notifier.notify("a");
        cloned.notify("b");

        assert_eq!(*count.lock().unwrap(), 2);
    }
}
