//! Fixture loading and diff helpers shared by the workspace's tests.

pub mod join_corpus;
pub mod records;

pub use join_corpus::{JOIN_CORPUS_FORMAT_V1, JoinCase, KeyMode, load_join_corpus};
pub use records::{datum_from_json, load_records};

use std::path::{Path, PathBuf};

/// Absolute path of a fixture shipped with the calling crate.
pub fn fixture_path(manifest_dir: &str, relative: &str) -> PathBuf {
    Path::new(manifest_dir).join("tests").join("fixtures").join(relative)
}

/// Human-readable report of the first differing line, with two lines of
/// context on either side.
pub fn diff_lines(expected: &[String], actual: &[String]) -> String {
    use std::fmt::Write;
    let max = expected.len().max(actual.len());
    fn line(lines: &[String], i: usize) -> &str {
        let missing = "<missing>";
        lines.get(i).map(String::as_str).unwrap_or(missing)
    }
    let mut out = String::new();

    let mismatch = (0..max).find(|&i| line(expected, i) != line(actual, i));
    if let Some(i) = mismatch {
        let start = i.saturating_sub(2);
        let end = (i + 3).min(max);
        let _ = writeln!(
            &mut out,
            "first mismatch at line {} (showing {}..={}):",
            i + 1,
            start + 1,
            end
        );
        for idx in start..end {
            let marker = if idx == i { ">" } else { " " };
            let _ = writeln!(&mut out, "{marker} {:>4}  expected: {}", idx + 1, line(expected, idx));
            let _ = writeln!(&mut out, "{marker} {:>4}    actual: {}", idx + 1, line(actual, idx));
        }
    }
    let _ = writeln!(
        &mut out,
        "expected {} lines, actual {} lines",
        expected.len(),
        actual.len()
    );
    out
}
