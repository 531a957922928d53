//! Greedy line diff and its text renderings.
//!
//! [`diff_lines`] is a heuristic alignment, not a minimal edit script: at each
//! mismatch it resynchronizes on the nearest point where a line from one side
//! reappears on the other. Ties favor the new side (an insertion run).

use std::fmt::Write as _;

use keel_types::text::expand_tabs;
use keel_types::{DiffLine, DiffResult};
use similar::TextDiff;

/// Align `old` and `new` line by line.
///
/// Both inputs are CRLF-normalized and split on `\n`, so a trailing newline
/// produces a final empty line on that side.
#[must_use]
pub fn diff_lines(old: &str, new: &str) -> DiffResult {
    let old = old.replace("\r\n", "\n");
    let new = new.replace("\r\n", "\n");
    let old_lines: Vec<&str> = old.split('\n').collect();
    let new_lines: Vec<&str> = new.split('\n').collect();

    let mut lines = Vec::with_capacity(old_lines.len().max(new_lines.len()));
    let (mut i, mut j) = (0, 0);

    while i < old_lines.len() || j < new_lines.len() {
        if i >= old_lines.len() {
            lines.push(add(j, new_lines[j]));
            j += 1;
            continue;
        }
        if j >= new_lines.len() {
            lines.push(remove(i, old_lines[i]));
            i += 1;
            continue;
        }

        let old_line = old_lines[i];
        let new_line = new_lines[j];
        if old_line == new_line {
            lines.push(same(i, j, old_line));
            i += 1;
            j += 1;
            continue;
        }

        let next_old = find_from(&new_lines, old_line, j + 1);
        let next_new = find_from(&old_lines, new_line, i + 1);

        if next_old == Some(j + 1) {
            lines.push(add(j, new_line));
            j += 1;
        } else if next_new == Some(i + 1) {
            lines.push(remove(i, old_line));
            i += 1;
        } else if let Some(sync) =
            next_old.filter(|&k| next_new.is_none_or(|n| k - j <= n - i))
        {
            lines.extend((j..sync).map(|k| add(k, new_lines[k])));
            lines.push(same(i, sync, old_line));
            i += 1;
            j = sync + 1;
        } else if let Some(sync) = next_new {
            lines.extend((i..sync).map(|k| remove(k, old_lines[k])));
            lines.push(same(sync, j, new_line));
            i = sync + 1;
            j += 1;
        } else {
            lines.push(DiffLine::Change {
                old_line: i + 1,
                new_line: j + 1,
                old_content: old_line.to_string(),
                content: new_line.to_string(),
            });
            i += 1;
            j += 1;
        }
    }

    DiffResult::new(lines)
}

fn find_from(haystack: &[&str], needle: &str, start: usize) -> Option<usize> {
    haystack
        .get(start..)?
        .iter()
        .position(|line| *line == needle)
        .map(|pos| pos + start)
}

fn same(i: usize, j: usize, content: &str) -> DiffLine {
    DiffLine::Same {
        old_line: i + 1,
        new_line: j + 1,
        content: content.to_string(),
    }
}

fn add(j: usize, content: &str) -> DiffLine {
    DiffLine::Add {
        new_line: j + 1,
        content: content.to_string(),
    }
}

fn remove(i: usize, content: &str) -> DiffLine {
    DiffLine::Remove {
        old_line: i + 1,
        content: content.to_string(),
    }
}

/// Render a diff as `<sign> <line> | <content>` rows followed by a summary.
///
/// A `change` record renders as its old line then its new line.
#[must_use]
pub fn render_diff(result: &DiffResult, header: Option<&str>) -> String {
    let mut out = String::new();
    if let Some(header) = header.filter(|h| !h.is_empty()) {
        let _ = writeln!(out, "--- {header}");
    }
    out.push('\n');

    for line in &result.lines {
        match line {
            DiffLine::Change {
                old_line,
                new_line,
                old_content,
                content,
            } => {
                push_row(&mut out, '-', *old_line, old_content);
                push_row(&mut out, '+', *new_line, content);
            }
            DiffLine::Same {
                old_line, content, ..
            } => push_row(&mut out, ' ', *old_line, content),
            DiffLine::Add { new_line, content } => push_row(&mut out, '+', *new_line, content),
            DiffLine::Remove { old_line, content } => push_row(&mut out, '-', *old_line, content),
        }
    }

    let summary = &result.summary;
    let _ = write!(
        out,
        "\nSummary: +{} -{} ~{}",
        summary.added, summary.removed, summary.changed
    );
    out
}

fn push_row(out: &mut String, sign: char, number: usize, content: &str) {
    let _ = writeln!(out, "{sign} {number} | {}", expand_tabs(content));
}

/// Conventional unified diff with `context` lines around each hunk.
#[must_use]
pub fn render_unified(
    old: &str,
    new: &str,
    old_label: &str,
    new_label: &str,
    context: usize,
) -> String {
    TextDiff::from_lines(old, new)
        .unified_diff()
        .context_radius(context)
        .header(old_label, new_label)
        .to_string()
}

#[cfg(test)]
mod tests {
    use keel_types::{DiffLine, DiffSummary};

    use super::{diff_lines, render_diff, render_unified};

    #[test]
    fn identical_texts_are_all_same() {
        let text = "fn main() {\n    println!(\"hi\");\n}\n";
        let result = diff_lines(text, text);
        assert!(
            result
                .lines
                .iter()
                .all(|line| matches!(line, DiffLine::Same { .. }))
        );
        assert_eq!(result.summary.same, 4);
        assert!(!result.summary.has_changes());
    }

    #[test]
    fn single_line_edit_is_a_change_record() {
        let result = diff_lines("a\nb\nc\n", "a\nx\nc\n");
        assert_eq!(
            result.lines[1],
            DiffLine::Change {
                old_line: 2,
                new_line: 2,
                old_content: "b".to_string(),
                content: "x".to_string(),
            }
        );
        assert_eq!(
            result.summary,
            DiffSummary {
                added: 0,
                removed: 0,
                changed: 1,
                same: 3,
            }
        );
    }

    #[test]
    fn single_insertion_is_an_add() {
        let result = diff_lines("a\nc", "a\nb\nc");
        assert_eq!(
            result.lines,
            vec![
                DiffLine::Same {
                    old_line: 1,
                    new_line: 1,
                    content: "a".to_string()
                },
                DiffLine::Add {
                    new_line: 2,
                    content: "b".to_string()
                },
                DiffLine::Same {
                    old_line: 2,
                    new_line: 3,
                    content: "c".to_string()
                },
            ]
        );
    }

    #[test]
    fn single_deletion_is_a_remove() {
        let result = diff_lines("a\nb\nc", "a\nc");
        assert_eq!(result.summary.removed, 1);
        assert_eq!(
            result.lines[1],
            DiffLine::Remove {
                old_line: 2,
                content: "b".to_string()
            }
        );
    }

    #[test]
    fn resyncs_on_new_side_after_insertion_run() {
        let result = diff_lines("a\nz", "x\ny\na\nz");
        assert_eq!(result.summary.added, 2);
        assert_eq!(result.summary.same, 2);
        assert_eq!(
            result.lines[2],
            DiffLine::Same {
                old_line: 1,
                new_line: 3,
                content: "a".to_string()
            }
        );
    }

    #[test]
    fn resyncs_on_old_side_after_deletion_run() {
        let result = diff_lines("x\ny\na\nz", "a\nz");
        assert_eq!(result.summary.removed, 2);
        assert_eq!(result.summary.same, 2);
    }

    #[test]
    fn crlf_is_normalized() {
        let result = diff_lines("a\r\nb", "a\nb");
        assert!(!result.summary.has_changes());
    }

    #[test]
    fn sides_reconstruct_their_inputs() {
        let cases = [
            ("", ""),
            ("", "a\nb"),
            ("a\nb\n", ""),
            ("a\nb\nc\nd", "d\nc\nb\na"),
            ("x\na\ny\nb\nz", "a\nq\nb\nr\n"),
            ("same\n\n\nlines", "\nsame\nlines\n\n"),
        ];
        for (old, new) in cases {
            let result = diff_lines(old, new);
            assert_eq!(result.old_text(), old, "old side of {old:?} -> {new:?}");
            assert_eq!(result.new_text(), new, "new side of {old:?} -> {new:?}");
        }
    }

    #[test]
    fn empty_texts_yield_one_same_line() {
        let result = diff_lines("", "");
        assert_eq!(result.lines.len(), 1);
        assert_eq!(result.summary.same, 1);
    }

    #[test]
    fn render_shows_change_as_remove_then_add() {
        let result = diff_lines("a\nb\nc", "a\nx\nc");
        insta::assert_snapshot!(render_diff(&result, Some("src/a.js")), @r"
        --- src/a.js

          1 | a
        - 2 | b
        + 2 | x
          3 | c

        Summary: +0 -0 ~1
        ");
    }

    #[test]
    fn render_expands_tabs_and_omits_missing_header() {
        let result = diff_lines("", "\tx");
        let rendered = render_diff(&result, None);
        assert!(rendered.starts_with('\n'));
        assert!(rendered.contains("+ 1 |   x"));
        assert!(rendered.ends_with("Summary: +0 -0 ~1"));
    }

    #[test]
    fn unified_has_headers_and_hunks() {
        let out = render_unified("a\nb\n", "a\nc\n", "old/a.txt", "new/a.txt", 3);
        assert!(out.starts_with("--- old/a.txt\n+++ new/a.txt\n"));
        assert!(out.contains("-b\n"));
        assert!(out.contains("+c\n"));
    }
}
