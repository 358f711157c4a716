use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

pub const JOIN_CORPUS_FORMAT_V1: &str = "weaver-join-cases-v1";

#[derive(Clone, Debug, Deserialize)]
struct JoinCorpus {
    format: String,
    cases: Vec<JoinCase>,
}

/// One join scenario: existing children, new data, the expected partition and
/// the expected child order after enter-append plus exit-remove.
///
/// Keys double as the `id` attribute of the existing and the appended nodes.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct JoinCase {
    pub id: String,
    #[serde(default)]
    pub key: KeyMode,
    /// Keys bound to the existing children, in child order.
    pub existing: Vec<String>,
    /// Extra children without a bound datum, appended after `existing`.
    #[serde(default)]
    pub unbound: usize,
    pub data: Vec<String>,
    pub enter: Vec<String>,
    pub update: Vec<String>,
    pub exit: Vec<String>,
    /// Child ids after the enter+exit pass; unbound children show as `?`.
    pub result: Vec<String>,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum KeyMode {
    #[default]
    Identity,
    Positional,
}

pub fn load_join_corpus(path: &Path) -> Vec<JoinCase> {
    let content = fs::read_to_string(path)
        .unwrap_or_else(|err| panic!("failed to read join corpus {path:?}: {err}"));
    let corpus: JoinCorpus = toml::from_str(&content)
        .unwrap_or_else(|err| panic!("failed to parse join corpus {path:?}: {err}"));
    assert_eq!(
        corpus.format, JOIN_CORPUS_FORMAT_V1,
        "unsupported join corpus format in {path:?}"
    );

    let mut seen = BTreeSet::new();
    for case in &corpus.cases {
        assert!(
            seen.insert(case.id.as_str()),
            "duplicate join case id in {path:?}: {}",
            case.id
        );
        assert_eq!(
            case.enter.len() + case.update.len(),
            case.data.len(),
            "case '{}' in {path:?}: enter + update must cover every datum",
            case.id
        );
        assert_eq!(
            case.update.len() + case.exit.len(),
            case.existing.len() + case.unbound,
            "case '{}' in {path:?}: update + exit must cover every existing node",
            case.id
        );
    }
    corpus.cases
}
