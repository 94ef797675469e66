//! Context decoration.
//!
//! [`ContextDecorator`] is created once, when a handler is composed, with a
//! fixed [`LogLevel`]. Every invocation then calls
//! [`ContextDecorator::decorate`] to build its [`Context`]: a copy of the
//! raw platform fields plus a logger pre-populated with the function name,
//! platform request ID, function version, and a fresh invocation ID.

use crate::context::{Context, InvocationId, LambdaContext};
use crate::logger::{ContextLogger, LogLevel, ParseLevelError};
use serde_json::{Map, Value};

const INVOCATION_ID_KEY: &str = "invocationId";

/// Builds decorated contexts with a fixed log level.
///
/// # Example
///
/// ```
/// use lamina_core::{ContextDecorator, LambdaContext, LogLevel};
///
/// let decorator = ContextDecorator::new(LogLevel::Debug);
/// let raw = LambdaContext::new("testFunction", "00112233445566778899", "$LATEST");
/// let ctx = decorator.decorate(&raw);
///
/// assert_eq!(ctx.log().name(), "testFunction");
/// assert_eq!(ctx.log().fields()["awsRequestId"], "00112233445566778899");
/// assert_eq!(ctx.log().fields()["functionVersion"], "$LATEST");
/// assert_eq!(ctx.log().level(), LogLevel::Debug);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ContextDecorator {
    level: LogLevel,
}

impl ContextDecorator {
    /// Creates a decorator whose loggers emit at `level` and above.
    #[must_use]
    pub const fn new(level: LogLevel) -> Self {
        Self { level }
    }

    /// Creates a decorator from the `LOG_LEVEL` environment variable.
    ///
    /// The variable is read exactly once, here. An unset variable yields
    /// the default `info` level.
    pub fn from_env() -> Result<Self, ParseLevelError> {
        Ok(Self::new(LogLevel::from_env()?.unwrap_or_default()))
    }

    /// Returns the level used for new loggers.
    #[must_use]
    pub const fn level(&self) -> LogLevel {
        self.level
    }

    /// Decorates a raw platform context.
    ///
    /// The raw context is not modified.
    #[must_use]
    pub fn decorate(&self, raw: &LambdaContext) -> Context {
        self.decorate_fields(raw.to_fields())
    }

    /// Decorates an already-flattened field map with a new invocation ID.
    ///
    /// To re-level a context within the same invocation, use
    /// [`redecorate`](Self::redecorate).
    #[must_use]
    pub fn decorate_fields(&self, fields: Map<String, Value>) -> Context {
        self.decorate_with_id(fields, Value::String(InvocationId::new().to_string()))
    }

    /// Rebuilds the logger of an already decorated context at this
    /// decorator's level.
    ///
    /// The context's `invocationId` is carried over, so records from before
    /// and after the rebuild correlate. A context without one gets a fresh ID.
    #[must_use]
    pub fn redecorate(&self, context: &Context) -> Context {
        match context.log().fields().get(INVOCATION_ID_KEY) {
            Some(id) => self.decorate_with_id(context.fields().clone(), id.clone()),
            None => self.decorate_fields(context.fields().clone()),
        }
    }

    fn decorate_with_id(&self, fields: Map<String, Value>, invocation_id: Value) -> Context {
        let name = fields
            .get("functionName")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let mut log = ContextLogger::new(name, self.level);
        for key in ["awsRequestId", "functionVersion"] {
            if let Some(value) = fields.get(key) {
                log = log.with_field(key, value.clone());
            }
        }
        log = log.with_field(INVOCATION_ID_KEY, invocation_id);

        Context::new(fields, log)
    }
}
