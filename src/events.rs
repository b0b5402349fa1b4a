//! Event hooks for flow lifecycle.
//!
//! Provides an optional, non-intrusive way to observe flow execution.
//! Flows emit events when they start, when the backend is called, when a
//! canned result replaces a bad reply, and when they finish. Implement
//! [`EventHandler`] to receive them for progress indicators or audit logs.

use std::sync::Arc;

/// Events emitted while a flow runs.
#[derive(Debug, Clone)]
pub enum Event {
    /// A flow has started. The request has not been validated yet.
    FlowStart {
        /// Operation name (e.g. `"suggestRecipientMatches"`).
        operation: &'static str,
        /// Name of the configured backend.
        backend: &'static str,
    },
    /// The rendered prompt is about to be sent.
    BackendCall {
        operation: &'static str,
        model: String,
        prompt_chars: usize,
    },
    /// The reply was empty or invalid and the canned result was used.
    Fallback {
        operation: &'static str,
        /// The content error that was absorbed.
        reason: String,
    },
    /// A flow has finished.
    FlowEnd {
        operation: &'static str,
        /// Whether a result was returned.
        ok: bool,
        /// Whether that result was the canned fallback.
        degraded: bool,
    },
}

/// Handler for flow lifecycle events.
///
/// This is entirely optional. Flows work without an event handler.
///
/// # Example
///
/// ```
/// use pantrylink::events::{Event, EventHandler};
///
/// struct PrintHandler;
///
/// impl EventHandler for PrintHandler {
///     fn on_event(&self, event: Event) {
///         match event {
///             Event::FlowStart { operation, .. } => println!("[start] {}", operation),
///             Event::Fallback { reason, .. } => println!("[fallback] {}", reason),
///             Event::FlowEnd { operation, ok, .. } => println!("[end] {} ok={}", operation, ok),
///             _ => {}
///         }
///     }
/// }
/// ```
pub trait EventHandler: Send + Sync {
    fn on_event(&self, event: Event);
}

/// Emit an event if a handler is present. No-op otherwise.
pub(crate) fn emit(handler: &Option<Arc<dyn EventHandler>>, event: Event) {
    if let Some(ref h) = handler {
        h.on_event(event);
    }
}

/// An [`EventHandler`] backed by a closure.
///
/// ```
/// use pantrylink::events::{Event, FnEventHandler};
/// use std::sync::Arc;
///
/// let handler = Arc::new(FnEventHandler(|event: Event| {
///     if let Event::Fallback { operation, .. } = event {
///         eprintln!("{} degraded", operation);
///     }
/// }));
/// ```
pub struct FnEventHandler<F: Fn(Event) + Send + Sync>(pub F);

impl<F: Fn(Event) + Send + Sync> EventHandler for FnEventHandler<F> {
    fn on_event(&self, event: Event) {
        (self.0)(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn emit_without_handler_is_noop() {
        emit(
            &None,
            Event::FlowEnd {
                operation: "x",
                ok: true,
                degraded: false,
            },
        );
    }

    #[test]
    fn fn_handler_receives_events() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let handler: Option<Arc<dyn EventHandler>> = Some(Arc::new(FnEventHandler(move |e: Event| {
            if let Event::FlowStart { operation, .. } = e {
                sink.lock().unwrap().push(operation);
            }
        })));
        emit(
            &handler,
            Event::FlowStart {
                operation: "assessRecipientNeeds",
                backend: "mock",
            },
        );
        assert_eq!(*seen.lock().unwrap(), vec!["assessRecipientNeeds"]);
    }
}
