//! Recording layer for capturing spans and events in tests.

use std::{
    collections::BTreeMap,
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use tracing::{
    Event, Level, Subscriber,
    field::{Field, Visit},
    span::{Attributes, Id, Record},
};
use tracing_subscriber::{
    Layer,
    layer::{Context, SubscriberExt},
    registry::LookupSpan,
};

/// Structured fields keyed by name, rendered as strings.
pub type Fields = BTreeMap<String, String>;

/// Layer that keeps every closed span and every event for later assertions.
///
/// Clones share the same storage, so a clone can be installed in a
/// subscriber while the original is queried afterwards.
///
/// # Examples
/// ```
/// use ophac_test_support::tracing::RecordingLayer;
///
/// let ((), layer) = RecordingLayer::capture(|| {
///     let _span = tracing::info_span!("outer", answer = 42).entered();
///     tracing::info!("inside");
/// });
/// assert_eq!(layer.span("outer").as_ref().and_then(|span| span.field("answer")), Some("42"));
/// assert_eq!(layer.events_with_message("inside")[0].span.as_deref(), Some("outer"));
/// ```
#[derive(Clone, Default)]
pub struct RecordingLayer {
    store: Arc<Mutex<Store>>,
}

#[derive(Default)]
struct Store {
    spans: Vec<SpanRecord>,
    events: Vec<EventRecord>,
}

impl RecordingLayer {
    /// Runs `body` under a fresh registry carrying a new recording layer and
    /// returns its result together with the layer.
    #[must_use]
    pub fn capture<T>(body: impl FnOnce() -> T) -> (T, Self) {
        let layer = Self::default();
        let subscriber = tracing_subscriber::registry().with(layer.clone());
        let output = tracing::subscriber::with_default(subscriber, body);
        (output, layer)
    }

    /// Returns the closed spans in completion order.
    #[must_use]
    pub fn spans(&self) -> Vec<SpanRecord> {
        self.lock().spans.clone()
    }

    /// Returns the first closed span called `name`.
    #[must_use]
    pub fn span(&self, name: &str) -> Option<SpanRecord> {
        self.lock().spans.iter().find(|span| span.name == name).cloned()
    }

    /// Returns the events in emission order.
    #[must_use]
    pub fn events(&self) -> Vec<EventRecord> {
        self.lock().events.clone()
    }

    /// Returns the events whose message equals `message`.
    #[must_use]
    pub fn events_with_message(&self, message: &str) -> Vec<EventRecord> {
        self.lock()
            .events
            .iter()
            .filter(|event| event.message() == Some(message))
            .cloned()
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A closed span with the fields recorded over its lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanRecord {
    /// Span name from its metadata.
    pub name: String,
    /// Fields recorded at creation or later through `Span::record`.
    pub fields: Fields,
}

impl SpanRecord {
    /// Returns the rendered value of field `name`.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// An emitted event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    /// Event level.
    pub level: Level,
    /// Name of the innermost span the event was emitted in, if any.
    pub span: Option<String>,
    /// Event fields, the message included under `message`.
    pub fields: Fields,
}

impl EventRecord {
    /// Returns the event's message.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.field("message")
    }

    /// Returns the rendered value of field `name`.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// Pending fields of a span that has not closed yet.
struct OpenSpan(Fields);

impl<S> Layer<S> for RecordingLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        let mut fields = Fields::new();
        attrs.record(&mut Collector(&mut fields));
        span.extensions_mut().insert(OpenSpan(fields));
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        if let Some(OpenSpan(fields)) = span.extensions_mut().get_mut::<OpenSpan>() {
            values.record(&mut Collector(fields));
        }
    }

    fn on_close(&self, id: Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(&id) else {
            return;
        };
        let fields = span
            .extensions_mut()
            .remove::<OpenSpan>()
            .map(|OpenSpan(fields)| fields)
            .unwrap_or_default();
        self.lock().spans.push(SpanRecord {
            name: span.name().to_owned(),
            fields,
        });
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let mut fields = Fields::new();
        event.record(&mut Collector(&mut fields));
        let span = ctx.event_span(event).map(|span| span.name().to_owned());
        self.lock().events.push(EventRecord {
            level: *event.metadata().level(),
            span,
            fields,
        });
    }
}

struct Collector<'a>(&'a mut Fields);

impl Collector<'_> {
    fn put(&mut self, field: &Field, value: &dyn fmt::Display) {
        self.0.insert(field.name().to_owned(), value.to_string());
    }
}

impl Visit for Collector<'_> {
    fn record_f64(&mut self, field: &Field, value: f64) {
        self.put(field, &value);
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.put(field, &value);
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.put(field, &value);
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.put(field, &value);
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.put(field, &value);
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.put(field, &value);
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.put(field, &format_args!("{value:?}"));
    }
}

#[cfg(test)]
#[expect(
    clippy::expect_used,
    clippy::indexing_slicing,
    reason = "tests require contextual panics"
)]
mod tests {
    use super::*;

    #[test]
    fn span_fields_include_late_records() {
        let ((), layer) = RecordingLayer::capture(|| {
            let span = tracing::info_span!("work", items = 3_u64, done = tracing::field::Empty);
            span.record("done", true);
        });
        let span = layer.span("work").expect("span must be recorded");
        assert_eq!(span.field("items"), Some("3"));
        assert_eq!(span.field("done"), Some("true"));
    }

    #[test]
    fn events_outside_spans_have_no_parent() {
        let ((), layer) = RecordingLayer::capture(|| tracing::warn!(code = "X", "detached"));
        let events = layer.events_with_message("detached");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].level, Level::WARN);
        assert_eq!(events[0].span, None);
        assert_eq!(events[0].field("code"), Some("X"));
    }

    #[test]
    fn clones_share_storage() {
        let layer = RecordingLayer::default();
        let clone = layer.clone();
        let subscriber = tracing_subscriber::registry().with(clone);
        tracing::subscriber::with_default(subscriber, || tracing::info!("shared"));
        assert_eq!(layer.events().len(), 1);
    }
}
