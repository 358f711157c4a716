//! Attribute interpolators.
//!
//! - number → number: linear.
//! - strings with embedded numbers: the end string is the template; its k-th
//!   number tweens from the start string's k-th number, extra numbers stay
//!   constant.
//! - anything else snaps to the end value on completion.

use core_types::{AttrValue, format_number};
use std::ops::Range;

#[derive(Clone, Debug, PartialEq)]
pub enum Interpolator {
    Number { from: f64, to: f64 },
    Text { segments: Vec<Segment>, to: String },
    Snap { to: AttrValue },
}

#[derive(Clone, Debug, PartialEq)]
pub enum Segment {
    Literal(String),
    Tween { from: f64, to: f64 },
}

impl Interpolator {
    /// Builds the interpolator from the attribute's current value. An absent
    /// start reads as `0` for numeric targets.
    pub fn new(start: Option<&str>, end: &AttrValue) -> Self {
        let start_number = start.and_then(parse_number);
        match end {
            AttrValue::Number(to) => Interpolator::Number {
                from: start_number.unwrap_or(0.0),
                to: *to,
            },
            AttrValue::Text(to) => match (start, parse_number(to)) {
                (None, Some(to)) => Interpolator::Number { from: 0.0, to },
                (Some(_), Some(to)) if start_number.is_some() => Interpolator::Number {
                    from: start_number.unwrap_or(0.0),
                    to,
                },
                (Some(start), _) => string_interpolator(start, to),
                (None, None) => Interpolator::Snap { to: end.clone() },
            },
        }
    }

    /// Value at eased time `t`; `None` while a snapping value has nothing to
    /// write yet.
    pub fn value_at(&self, t: f64) -> Option<AttrValue> {
        match self {
            Interpolator::Number { from, to } => Some(AttrValue::Number(if t >= 1.0 {
                *to
            } else {
                lerp(*from, *to, t)
            })),
            Interpolator::Text { segments, to } => {
                if t >= 1.0 {
                    return Some(AttrValue::Text(to.clone()));
                }
                let mut out = String::new();
                for segment in segments {
                    match segment {
                        Segment::Literal(text) => out.push_str(text),
                        Segment::Tween { from, to } => out.push_str(&format_number(lerp(*from, *to, t))),
                    }
                }
                Some(AttrValue::Text(out))
            }
            Interpolator::Snap { to } => (t >= 1.0).then(|| to.clone()),
        }
    }
}

fn lerp(from: f64, to: f64, t: f64) -> f64 {
    from + (to - from) * t
}

fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    let spans = scan_numbers(trimmed);
    match spans.as_slice() {
        [(range, value)] if *range == (0..trimmed.len()) => Some(*value),
        _ => None,
    }
}

fn string_interpolator(start: &str, end: &str) -> Interpolator {
    let from = scan_numbers(start);
    let to = scan_numbers(end);
    if to.is_empty() {
        return Interpolator::Snap {
            to: AttrValue::Text(end.to_string()),
        };
    }
    let mut segments = Vec::with_capacity(to.len() * 2 + 1);
    let mut cursor = 0;
    for (k, (range, value)) in to.iter().enumerate() {
        if range.start > cursor {
            segments.push(Segment::Literal(end[cursor..range.start].to_string()));
        }
        segments.push(match from.get(k) {
            Some((_, start)) => Segment::Tween {
                from: *start,
                to: *value,
            },
            None => Segment::Literal(end[range.clone()].to_string()),
        });
        cursor = range.end;
    }
    if cursor < end.len() {
        segments.push(Segment::Literal(end[cursor..].to_string()));
    }
    Interpolator::Text {
        segments,
        to: end.to_string(),
    }
}

/// Byte spans and values of the decimal numbers in `text`, in order.
/// Accepts an optional sign, a fraction and an exponent.
fn scan_numbers(text: &str) -> Vec<(Range<usize>, f64)> {
    let bytes = text.as_bytes();
    let mut out = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let start = i;
        let mut j = i;
        if matches!(bytes[j], b'+' | b'-') {
            j += 1;
        }
        let int_start = j;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        let mut digits = j - int_start;
        if j < bytes.len() && bytes[j] == b'.' {
            let frac_start = j + 1;
            let mut k = frac_start;
            while k < bytes.len() && bytes[k].is_ascii_digit() {
                k += 1;
            }
            if digits > 0 || k > frac_start {
                digits += k - frac_start;
                j = k;
            }
        }
        if digits == 0 {
            i = start + 1;
            continue;
        }
        if j < bytes.len() && matches!(bytes[j], b'e' | b'E') {
            let mut k = j + 1;
            if k < bytes.len() && matches!(bytes[k], b'+' | b'-') {
                k += 1;
            }
            let exp_start = k;
            while k < bytes.len() && bytes[k].is_ascii_digit() {
                k += 1;
            }
            if k > exp_start {
                j = k;
            }
        }
        if let Ok(value) = text[start..j].parse::<f64>() {
            out.push((start..j, value));
        }
        i = j;
    }
    out
}
