use core_types::{AttrValue, Datum};

/// Attribute or text value: a constant, or computed per `(datum, index)`.
///
/// Nodes without a bound datum pass `None` to the function.
#[derive(Clone)]
pub enum ValueSource<'a> {
    Constant(AttrValue),
    PerDatum(&'a dyn Fn(Option<&Datum>, usize) -> AttrValue),
}

impl<'a> ValueSource<'a> {
    pub fn by_datum(f: &'a dyn Fn(Option<&Datum>, usize) -> AttrValue) -> Self {
        ValueSource::PerDatum(f)
    }

    pub fn resolve(&self, datum: Option<&Datum>, index: usize) -> AttrValue {
        match self {
            ValueSource::Constant(value) => value.clone(),
            ValueSource::PerDatum(f) => f(datum, index),
        }
    }
}

impl From<AttrValue> for ValueSource<'_> {
    fn from(value: AttrValue) -> Self {
        ValueSource::Constant(value)
    }
}

impl From<f64> for ValueSource<'_> {
    fn from(value: f64) -> Self {
        ValueSource::Constant(AttrValue::Number(value))
    }
}

impl From<i32> for ValueSource<'_> {
    fn from(value: i32) -> Self {
        ValueSource::Constant(AttrValue::from(value))
    }
}

impl From<&str> for ValueSource<'_> {
    fn from(value: &str) -> Self {
        ValueSource::Constant(AttrValue::from(value))
    }
}

impl From<String> for ValueSource<'_> {
    fn from(value: String) -> Self {
        ValueSource::Constant(AttrValue::Text(value))
    }
}

impl<'a> From<&'a dyn Fn(Option<&Datum>, usize) -> AttrValue> for ValueSource<'a> {
    fn from(f: &'a dyn Fn(Option<&Datum>, usize) -> AttrValue) -> Self {
        ValueSource::PerDatum(f)
    }
}

impl std::fmt::Debug for ValueSource<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueSource::Constant(value) => write!(f, "Constant({value})"),
            ValueSource::PerDatum(_) => f.write_str("PerDatum(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_datum_sees_missing_binding_as_none() {
        let f = |d: Option<&Datum>, i: usize| match d {
            Some(d) => AttrValue::Number(d.as_number().unwrap_or(0.0) * 10.0),
            None => AttrValue::Text(format!("unbound-{i}")),
        };
        let source = ValueSource::by_datum(&f);
        assert_eq!(source.resolve(Some(&Datum::from(2)), 0), AttrValue::Number(20.0));
        assert_eq!(source.resolve(None, 3), AttrValue::from("unbound-3"));
        assert_eq!(ValueSource::from(5).resolve(None, 0), AttrValue::Number(5.0));
    }
}
