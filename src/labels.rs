//! Label value coercion
//!
//! Application code attaches arbitrarily-typed values to log records and
//! metric instances. This module defines the closed set of scalar kinds the
//! facade accepts ([`LabelValue`]) and the two coercions consumers need:
//!
//! - [`to_loggable_labels`]: typed labels for the logging backend
//!   (string / float / bool, with graceful degradation for everything else)
//! - [`to_metric_label_values`]: plain strings, which is what metrics
//!   backends conventionally require for label values
//!
//! Coercion never fails. An unsupported value degrades to a diagnostic
//! string label so the field stays visible in logs instead of disappearing.

use std::collections::BTreeMap;
use std::fmt;

/// A dynamically-typed label value.
///
/// This is a closed union over the scalar kinds the facade supports. `From`
/// impls exist for every integer width, both float widths, strings, booleans,
/// and `Option<T>` (where `None` maps to [`LabelValue::Null`]).
#[derive(Debug, Clone, PartialEq)]
pub enum LabelValue {
    /// Any signed integer width
    Signed(i64),
    /// Any unsigned integer width
    Unsigned(u64),
    /// Any float width
    Float(f64),
    /// A string value
    Text(String),
    /// A boolean value
    Bool(bool),
    /// An absent value
    Null,
    /// A value of a kind the facade does not support; carries the type name
    /// for diagnostics
    Unsupported(&'static str),
}

impl LabelValue {
    /// Mark a value of type `T` as unsupported, preserving its type name for
    /// the diagnostic placeholder label.
    pub fn unsupported<T>() -> Self {
        Self::Unsupported(std::any::type_name::<T>())
    }
}

impl fmt::Display for LabelValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Signed(v) => write!(f, "{v}"),
            Self::Unsigned(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Null => f.write_str("<null>"),
            Self::Unsupported(ty) => write!(f, "<'{ty}' value not supported>"),
        }
    }
}

macro_rules! label_value_from {
    ($variant:ident: $($ty:ty),+) => {
        $(impl From<$ty> for LabelValue {
            fn from(value: $ty) -> Self {
                Self::$variant(value.into())
            }
        })+
    };
}

label_value_from!(Signed: i8, i16, i32, i64);
label_value_from!(Unsigned: u8, u16, u32, u64);
label_value_from!(Float: f32, f64);
label_value_from!(Text: &str, String);
label_value_from!(Bool: bool);

impl<T: Into<LabelValue>> From<Option<T>> for LabelValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Self::Null)
    }
}

/// A set of named label values, ordered deterministically by key.
pub type LabelMap = BTreeMap<String, LabelValue>;

/// Build a [`LabelMap`] from mixed scalar values.
///
/// # Example
///
/// ```
/// use beacon::labels;
///
/// let labels = labels! {
///     "of" => "payments-api",
///     "attempt" => 3u32,
///     "cached" => false,
/// };
/// assert_eq!(labels.len(), 3);
/// ```
#[macro_export]
macro_rules! labels {
    () => { $crate::LabelMap::new() };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::LabelMap::new();
        $(map.insert(String::from($key), $crate::LabelValue::from($value));)+
        map
    }};
}

/// A typed label ready to be attached to a log record.
///
/// The logging backend accepts an ordered sequence of these. The value side is
/// a tagged union over string, float and bool; null and unsupported inputs are
/// rendered as string labels by [`to_loggable_labels`].
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    key: String,
    value: LogValue,
}

/// The value side of a log [`Label`].
#[derive(Debug, Clone, PartialEq)]
pub enum LogValue {
    String(String),
    Float(f64),
    Bool(bool),
}

impl Label {
    /// A string-valued log label.
    pub fn string(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self { key: key.into(), value: LogValue::String(value.into()) }
    }

    /// A float-valued log label.
    pub fn float(key: impl Into<String>, value: f64) -> Self {
        Self { key: key.into(), value: LogValue::Float(value) }
    }

    /// A bool-valued log label.
    pub fn bool(key: impl Into<String>, value: bool) -> Self {
        Self { key: key.into(), value: LogValue::Bool(value) }
    }

    /// The label key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The label value.
    pub fn value(&self) -> &LogValue {
        &self.value
    }
}

/// Convert a label map into an ordered sequence of typed log labels.
///
/// Conversion rules, by value kind: integers and floats become float labels,
/// strings become string labels, booleans become bool labels, null becomes the
/// string label `<null>`, and unsupported values become a diagnostic string
/// label. This function never fails.
pub fn to_loggable_labels(labels: &LabelMap) -> Vec<Label> {
    labels
        .iter()
        .map(|(key, value)| match value {
            LabelValue::Signed(v) => Label::float(key, *v as f64),
            LabelValue::Unsigned(v) => Label::float(key, *v as f64),
            LabelValue::Float(v) => Label::float(key, *v),
            LabelValue::Text(v) => Label::string(key, v),
            LabelValue::Bool(v) => Label::bool(key, *v),
            LabelValue::Null | LabelValue::Unsupported(_) => {
                Label::string(key, value.to_string())
            }
        })
        .collect()
}

/// Stringify every value in a label map.
///
/// Metrics backends conventionally require string label values, so each value
/// gets its default human-readable rendering.
pub fn to_metric_label_values(labels: &LabelMap) -> BTreeMap<String, String> {
    labels
        .iter()
        .map(|(key, value)| (key.clone(), value.to_string()))
        .collect()
}
