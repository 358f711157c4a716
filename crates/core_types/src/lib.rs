use std::fmt;
use std::sync::Arc;

/// Host clock time in milliseconds. Only differences are meaningful.
pub type Millis = u64;

/// A value from the host's input data sequence.
#[derive(Clone, Debug, PartialEq)]
pub enum Datum {
    Bool(bool),
    Number(f64),
    Text(Arc<str>),
    Record(Arc<[(Arc<str>, Datum)]>),
}

impl Datum {
    pub fn text(value: &str) -> Self {
        Datum::Text(Arc::from(value))
    }

    pub fn record<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, Datum)>,
        K: Into<Arc<str>>,
    {
        Datum::Record(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v))
                .collect::<Vec<_>>()
                .into(),
        )
    }

    /// Looks up a field of a `Record`; `None` for other variants.
    pub fn field(&self, name: &str) -> Option<&Datum> {
        match self {
            Datum::Record(fields) => fields
                .iter()
                .find(|(k, _)| k.as_ref() == name)
                .map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Datum::Number(n) => Some(*n),
            Datum::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Datum::Text(s) => s.trim().parse().ok(),
            Datum::Record(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Datum::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Datum::Bool(b) => write!(f, "{b}"),
            Datum::Number(n) => f.write_str(&format_number(*n)),
            Datum::Text(s) => f.write_str(s),
            Datum::Record(fields) => {
                f.write_str("{")?;
                for (i, (k, v)) in fields.iter().enumerate() {
                    if i != 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<f64> for Datum {
    fn from(value: f64) -> Self {
        Datum::Number(value)
    }
}

impl From<i32> for Datum {
    fn from(value: i32) -> Self {
        Datum::Number(f64::from(value))
    }
}

impl From<bool> for Datum {
    fn from(value: bool) -> Self {
        Datum::Bool(value)
    }
}

impl From<&str> for Datum {
    fn from(value: &str) -> Self {
        Datum::text(value)
    }
}

impl From<String> for Datum {
    fn from(value: String) -> Self {
        Datum::Text(Arc::from(value))
    }
}

/// Join identity of a datum or a bound node within one group.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    /// Slot index; what the positional join compares.
    Position(usize),
    Named(Arc<str>),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Position(i) => write!(f, "#{i}"),
            Key::Named(name) => f.write_str(name),
        }
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Key::Named(Arc::from(value))
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Key::Named(Arc::from(value))
    }
}

impl From<&Datum> for Key {
    fn from(value: &Datum) -> Self {
        match value {
            Datum::Text(s) => Key::Named(Arc::clone(s)),
            other => Key::Named(Arc::from(other.to_string())),
        }
    }
}

/// Value written to a node attribute.
#[derive(Clone, Debug, PartialEq)]
pub enum AttrValue {
    Number(f64),
    Text(String),
}

impl AttrValue {
    /// Serialized form stored in the tree.
    pub fn render(&self) -> String {
        match self {
            AttrValue::Number(n) => format_number(*n),
            AttrValue::Text(s) => s.clone(),
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Number(n) => f.write_str(&format_number(*n)),
            AttrValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        AttrValue::Number(value)
    }
}

impl From<i32> for AttrValue {
    fn from(value: i32) -> Self {
        AttrValue::Number(f64::from(value))
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Text(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Text(value)
    }
}

/// Shortest decimal form; integral values print without a fraction and
/// `-0` prints as `0`.
pub fn format_number(n: f64) -> String {
    if n == 0.0 {
        return "0".to_string();
    }
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        return format!("{}", n as i64);
    }
    format!("{n}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_render_without_trailing_fraction() {
        assert_eq!(format_number(10.0), "10");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(AttrValue::from(3).render(), "3");
    }

    #[test]
    fn record_fields_resolve_by_name() {
        let d = Datum::record([("id", Datum::text("a")), ("value", Datum::from(4))]);
        assert_eq!(d.field("id"), Some(&Datum::text("a")));
        assert_eq!(d.field("value").and_then(Datum::as_number), Some(4.0));
        assert_eq!(d.field("missing"), None);
        assert_eq!(d.to_string(), "{id: a, value: 4}");
    }

    #[test]
    fn datum_keys_use_display_form() {
        assert_eq!(Key::from(&Datum::text("k")), Key::from("k"));
        assert_eq!(Key::from(&Datum::from(7)), Key::from("7"));
    }
}
