//! Unified line diffs of printed schemas.

use colored::Colorize;
use similar::{ChangeTag, TextDiff};

const CONTEXT_RADIUS: usize = 3;

/// Plain unified diff of `old` against `new`, headed by the two labels.
pub fn unified_diff(old: &str, new: &str, labels: [&str; 2]) -> String {
    render(old, new, labels, false)
}

/// Same as [`unified_diff`] with ANSI colors: removals red, additions green,
/// hunk headers cyan.
pub fn unified_diff_colored(old: &str, new: &str, labels: [&str; 2]) -> String {
    render(old, new, labels, true)
}

fn render(old: &str, new: &str, [old_label, new_label]: [&str; 2], color: bool) -> String {
    let diff = TextDiff::from_lines(old, new);
    let mut out = String::new();

    let header = [format!("--- {old_label}\tremoved"), format!("+++ {new_label}\tadded")];
    for (i, line) in header.iter().enumerate() {
        let line = match (color, i) {
            (false, _) => line.clone(),
            (true, 0) => line.red().bold().to_string(),
            (true, _) => line.green().bold().to_string(),
        };
        out.push_str(&line);
        out.push('\n');
    }

    let mut unified = diff.unified_diff();
    unified.context_radius(CONTEXT_RADIUS);
    for hunk in unified.iter_hunks() {
        let hunk_header = hunk.header().to_string();
        if color {
            out.push_str(&hunk_header.cyan().to_string());
        } else {
            out.push_str(&hunk_header);
        }
        out.push('\n');

        for change in hunk.iter_changes() {
            let sign = match change.tag() {
                ChangeTag::Delete => '-',
                ChangeTag::Insert => '+',
                ChangeTag::Equal => ' ',
            };
            let line = format!("{sign}{}", change.value().trim_end_matches('\n'));
            let line = match (color, change.tag()) {
                (true, ChangeTag::Delete) => line.red().to_string(),
                (true, ChangeTag::Insert) => line.green().to_string(),
                _ => line,
            };
            out.push_str(&line);
            out.push('\n');
            if change.missing_newline() {
                out.push_str("\\ No newline at end of file\n");
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const OLD: &str = "enum TestEnum {\n  FIRST_VALUE\n}\n";
    const NEW: &str = "enum TestEnum {\n  FIRST_VALUE\n  SECOND_VALUE\n}\n";

    #[test]
    fn test_plain_diff() {
        let diff = unified_diff(OLD, NEW, ["left.graphql", "right.graphql"]);
        assert_eq!(
            diff,
            "--- left.graphql\tremoved\n+++ right.graphql\tadded\n@@ -1,3 +1,4 @@\n enum TestEnum {\n   FIRST_VALUE\n+  SECOND_VALUE\n }\n"
        );
    }

    #[test]
    fn test_colored_diff_keeps_content() {
        colored::control::set_override(true);
        let diff = unified_diff_colored(OLD, NEW, ["a", "b"]);
        assert!(diff.contains("+  SECOND_VALUE"));
        assert!(diff.contains("\u{1b}["));
    }

    #[test]
    fn test_identical_inputs_have_no_hunks() {
        let diff = unified_diff(OLD, OLD, ["a", "b"]);
        assert_eq!(diff, "--- a\tremoved\n+++ b\tadded\n");
    }
}
