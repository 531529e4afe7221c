//! `list-issues` records and branch-name suggestions for issue sessions.

use serde::Serialize;

/// One `<id>|<title>` record emitted by `sessions.sh list-issues`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub number: String,
    pub title: String,
}

/// Parse newline-separated `<id>|<title>` records.
///
/// Lines without `|` or with an empty id are skipped; the title keeps any
/// further `|` characters.
pub fn parse_issues(output: &str) -> Vec<Issue> {
    output
        .lines()
        .filter_map(|line| {
            let (number, title) = line.split_once('|')?;
            let number = number.trim();
            if number.is_empty() {
                return None;
            }
            Some(Issue {
                number: number.to_string(),
                title: title.trim().to_string(),
            })
        })
        .collect()
}

/// Suggest `<prefix>/<number>-<slug>` for an issue.
///
/// The slug is the lower-cased title with spaces replaced by `-`, cut to
/// `slug_max_chars` characters.
pub fn suggest_branch_name(issue: &Issue, prefix: &str, slug_max_chars: usize) -> String {
    let slug: String = issue
        .title
        .trim()
        .to_lowercase()
        .replace(' ', "-")
        .chars()
        .take(slug_max_chars)
        .collect();
    format!("{prefix}/{}-{slug}", issue.number)
}
