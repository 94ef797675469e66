//! Invocation context types.
//!
//! The platform hands every invocation a [`LambdaContext`] describing the
//! function being run. The [`ContextDecorator`](crate::ContextDecorator)
//! turns that into a [`Context`]: the same fields plus a structured logger.
//! Handlers and middleware only ever see the decorated form.

use crate::logger::ContextLogger;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use uuid::Uuid;

/// A unique identifier for each invocation, using UUID v7.
///
/// This is distinct from the platform's request ID: it is generated locally
/// on every decoration, so retried platform requests still get distinct
/// invocation IDs in the logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvocationId(Uuid);

impl InvocationId {
    /// Creates a new time-ordered invocation ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for InvocationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for InvocationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Raw platform context for one invocation.
///
/// Field names follow the platform's camelCase JSON. Any additional fields
/// are preserved in [`LambdaContext::extra`].
///
/// # Example
///
/// ```
/// use lamina_core::LambdaContext;
///
/// let ctx: LambdaContext = serde_json::from_str(r#"{
///     "functionName": "testFunction",
///     "awsRequestId": "00112233445566778899",
///     "functionVersion": "$LATEST",
///     "memoryLimitInMB": "128"
/// }"#).unwrap();
///
/// assert_eq!(ctx.function_name, "testFunction");
/// assert_eq!(ctx.extra["memoryLimitInMB"], "128");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LambdaContext {
    /// Name of the function being invoked.
    #[serde(default)]
    pub function_name: String,

    /// Platform request ID.
    #[serde(default)]
    pub aws_request_id: String,

    /// Deployed function version.
    #[serde(default)]
    pub function_version: String,

    /// All other platform-supplied fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LambdaContext {
    /// Creates a raw context with the three identifying fields.
    #[must_use]
    pub fn new(
        function_name: impl Into<String>,
        aws_request_id: impl Into<String>,
        function_version: impl Into<String>,
    ) -> Self {
        Self {
            function_name: function_name.into(),
            aws_request_id: aws_request_id.into(),
            function_version: function_version.into(),
            extra: Map::new(),
        }
    }

    /// Returns the context with an additional platform field.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Flattens the context into a JSON field map.
    #[must_use]
    pub fn to_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert(
            "functionName".to_string(),
            Value::String(self.function_name.clone()),
        );
        fields.insert(
            "awsRequestId".to_string(),
            Value::String(self.aws_request_id.clone()),
        );
        fields.insert(
            "functionVersion".to_string(),
            Value::String(self.function_version.clone()),
        );
        fields.extend(self.extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        fields
    }
}

/// Decorated per-invocation context.
///
/// A `Context` is a plain field map plus a [`ContextLogger`]. It is cheap
/// to clone and every derivation (`child`, `with_field`) produces a new
/// value, so a middleware that replaces the context downstream never
/// changes what it is itself holding.
///
/// Serializing a `Context` yields only its fields; the logger is never
/// part of the output.
#[derive(Debug, Clone, PartialEq)]
pub struct Context {
    fields: Map<String, Value>,
    log: ContextLogger,
}

impl Context {
    /// Creates a context from fields and a logger.
    #[must_use]
    pub fn new(fields: Map<String, Value>, log: ContextLogger) -> Self {
        Self { fields, log }
    }

    /// Returns the context fields.
    #[must_use]
    pub const fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Returns a single field.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Returns a string field, if present and a string.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    /// Returns the function name.
    #[must_use]
    pub fn function_name(&self) -> Option<&str> {
        self.get_str("functionName")
    }

    /// Returns the platform request ID.
    #[must_use]
    pub fn aws_request_id(&self) -> Option<&str> {
        self.get_str("awsRequestId")
    }

    /// Returns the function version.
    #[must_use]
    pub fn function_version(&self) -> Option<&str> {
        self.get_str("functionVersion")
    }

    /// Returns the context logger.
    #[must_use]
    pub const fn log(&self) -> &ContextLogger {
        &self.log
    }

    /// Sets a field in place.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Returns the context with an additional field.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Derives a context whose logger carries `extra` fields.
    ///
    /// The receiver is left untouched.
    ///
    /// # Example
    ///
    /// ```
    /// use lamina_core::{ContextDecorator, LambdaContext, LogLevel};
    /// use serde_json::json;
    ///
    /// let raw = LambdaContext::new("fn", "req-1", "$LATEST");
    /// let ctx = ContextDecorator::new(LogLevel::Info).decorate(&raw);
    /// let child = ctx.child([("userId", json!(7))]);
    ///
    /// assert_eq!(child.log().fields()["userId"], 7);
    /// assert!(ctx.log().fields().get("userId").is_none());
    /// ```
    #[must_use]
    pub fn child<I, K>(&self, extra: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self {
            fields: self.fields.clone(),
            log: self.log.child(extra),
        }
    }

    /// Returns the context with its logger replaced.
    #[must_use]
    pub fn with_logger(mut self, log: ContextLogger) -> Self {
        self.log = log;
        self
    }
}

impl Serialize for Context {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}
