//! Selector subset used by `select_all`.
//!
//! Supported: `*`, type, `#id`, `.class`, `[attr]`, `[attr=value]` compounds,
//! descendant (whitespace) and child (`>`) combinators, and `,` lists.
//! Anything else makes the whole list unparseable, which callers treat as
//! "matches nothing".

use memchr::memchr;

/// Read-only view over element slots, indexed by arena position.
pub(crate) trait SelectorSubject {
    fn element_name(&self, index: u32) -> Option<&str>;
    fn element_attribute(&self, index: u32, name: &str) -> Option<&str>;
    fn parent_index(&self, index: u32) -> Option<u32>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectorList {
    selectors: Vec<ComplexSelector>,
}

impl SelectorList {
    pub(crate) fn matches<S: SelectorSubject>(&self, subject: &S, index: u32) -> bool {
        subject.element_name(index).is_some()
            && self.selectors.iter().any(|s| s.matches(subject, index))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

// `combinators[i]` joins `compounds[i]` and `compounds[i + 1]`.
#[derive(Clone, Debug, PartialEq, Eq)]
struct ComplexSelector {
    compounds: Vec<Compound>,
    combinators: Vec<Combinator>,
}

impl ComplexSelector {
    fn matches<S: SelectorSubject>(&self, subject: &S, index: u32) -> bool {
        self.matches_from(subject, self.compounds.len() - 1, index)
    }

    fn matches_from<S: SelectorSubject>(&self, subject: &S, k: usize, index: u32) -> bool {
        if !self.compounds[k].matches(subject, index) {
            return false;
        }
        if k == 0 {
            return true;
        }
        match self.combinators[k - 1] {
            Combinator::Child => subject
                .parent_index(index)
                .is_some_and(|parent| self.matches_from(subject, k - 1, parent)),
            Combinator::Descendant => {
                let mut cursor = subject.parent_index(index);
                while let Some(ancestor) = cursor {
                    if self.matches_from(subject, k - 1, ancestor) {
                        return true;
                    }
                    cursor = subject.parent_index(ancestor);
                }
                false
            }
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attributes: Vec<AttrMatch>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum AttrMatch {
    Exists(String),
    Equals(String, String),
}

impl Compound {
    fn matches<S: SelectorSubject>(&self, subject: &S, index: u32) -> bool {
        let Some(name) = subject.element_name(index) else {
            return false;
        };
        if let Some(tag) = &self.tag {
            if !name.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if let Some(want) = &self.id {
            if subject.element_attribute(index, "id") != Some(want.as_str()) {
                return false;
            }
        }
        if !self.classes.is_empty() {
            let Some(classlist) = subject.element_attribute(index, "class") else {
                return false;
            };
            if !self
                .classes
                .iter()
                .all(|want| classlist.split_whitespace().any(|c| c == want))
            {
                return false;
            }
        }
        self.attributes.iter().all(|attr| match attr {
            AttrMatch::Exists(name) => subject.element_attribute(index, name).is_some(),
            AttrMatch::Equals(name, value) => {
                subject.element_attribute(index, name) == Some(value.as_str())
            }
        })
    }
}

// input: "g.bars > rect, circle[r]"
// output: Some(list of two complex selectors); None if any part is malformed
pub fn parse_selector_list(input: &str) -> Option<SelectorList> {
    let mut selectors = Vec::new();
    for part in split_top_level(input) {
        selectors.push(parse_complex(part)?);
    }
    if selectors.is_empty() {
        return None;
    }
    Some(SelectorList { selectors })
}

fn split_top_level(input: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, b) in input.bytes().enumerate() {
        match b {
            b'[' => depth += 1,
            b']' => depth = depth.saturating_sub(1),
            b',' if depth == 0 => {
                parts.push(&input[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&input[start..]);
    parts
}

fn parse_complex(input: &str) -> Option<ComplexSelector> {
    let bytes = input.as_bytes();
    let mut compounds = Vec::new();
    let mut combinators = Vec::new();
    let mut pending: Option<Combinator> = None;
    let mut i = 0usize;
    while i < bytes.len() {
        let b = bytes[i];
        if b.is_ascii_whitespace() {
            if !compounds.is_empty() && pending.is_none() {
                pending = Some(Combinator::Descendant);
            }
            i += 1;
            continue;
        }
        if b == b'>' {
            if compounds.is_empty() || pending == Some(Combinator::Child) {
                return None;
            }
            pending = Some(Combinator::Child);
            i += 1;
            continue;
        }
        let (compound, next) = parse_compound(input, i)?;
        if !compounds.is_empty() {
            combinators.push(pending.take()?);
        }
        compounds.push(compound);
        i = next;
    }
    if compounds.is_empty() || pending == Some(Combinator::Child) {
        return None;
    }
    Some(ComplexSelector {
        compounds,
        combinators,
    })
}

fn parse_compound(input: &str, start: usize) -> Option<(Compound, usize)> {
    let bytes = input.as_bytes();
    let mut compound = Compound::default();
    let mut i = start;
    let mut any = false;
    if bytes[i] == b'*' {
        i += 1;
        any = true;
    } else if is_name_byte(bytes[i]) {
        let end = scan_name(bytes, i);
        compound.tag = Some(input[i..end].to_ascii_lowercase());
        i = end;
        any = true;
    }
    while i < bytes.len() {
        match bytes[i] {
            b'#' => {
                let end = scan_name(bytes, i + 1);
                if end == i + 1 {
                    return None;
                }
                compound.id = Some(input[i + 1..end].to_string());
                i = end;
            }
            b'.' => {
                let end = scan_name(bytes, i + 1);
                if end == i + 1 {
                    return None;
                }
                compound.classes.push(input[i + 1..end].to_string());
                i = end;
            }
            b'[' => {
                let close = i + 1 + memchr(b']', &bytes[i + 1..])?;
                compound
                    .attributes
                    .push(parse_attribute(input[i + 1..close].trim())?);
                i = close + 1;
            }
            _ => break,
        }
        any = true;
    }
    if !any {
        return None;
    }
    Some((compound, i))
}

fn parse_attribute(inner: &str) -> Option<AttrMatch> {
    let Some(eq) = memchr(b'=', inner.as_bytes()) else {
        return valid_name(inner).then(|| AttrMatch::Exists(inner.to_ascii_lowercase()));
    };
    let name = inner[..eq].trim();
    if !valid_name(name) {
        return None;
    }
    let raw = inner[eq + 1..].trim();
    let value = strip_quotes(raw)?;
    Some(AttrMatch::Equals(name.to_ascii_lowercase(), value.to_string()))
}

fn strip_quotes(raw: &str) -> Option<&str> {
    for quote in ['"', '\''] {
        if let Some(rest) = raw.strip_prefix(quote) {
            return rest.strip_suffix(quote);
        }
    }
    if raw.is_empty() || !raw.bytes().all(is_name_byte) {
        return None;
    }
    Some(raw)
}

fn valid_name(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(is_name_byte)
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b >= 0x80
}

fn scan_name(bytes: &[u8], start: usize) -> usize {
    let mut end = start;
    while end < bytes.len() && is_name_byte(bytes[end]) {
        end += 1;
    }
    end
}
