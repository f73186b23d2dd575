//! Parsing of conventional commit messages.

use once_cell::sync::Lazy;
use regex::Regex;

static HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<type>\w+)(?:\((?P<scope>[^)]*)\))?(?P<breaking>!)?: (?P<subject>.+)$")
        .expect("valid regex")
});

static BREAKING_NOTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^BREAKING[ -]CHANGE:\s*(?P<note>.*)$").expect("valid regex"));

/// A commit message in `type(scope)!: subject` form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConventionalCommit {
    pub kind: String,
    pub scope: Option<String>,
    pub subject: String,
    /// Text of the breaking-change note, or the subject for `!` headers.
    pub breaking: Option<String>,
}

/// Parses a commit message; returns `None` if the header is not conventional.
pub fn parse(message: &str) -> Option<ConventionalCommit> {
    let header = message.lines().next()?.trim();
    let caps = HEADER.captures(header)?;

    let subject = caps["subject"].trim().to_string();
    let note = BREAKING_NOTE
        .captures(message)
        .map(|c| c["note"].trim().to_string());
    let breaking = match (note, caps.name("breaking")) {
        (Some(note), _) if !note.is_empty() => Some(note),
        (Some(_), _) | (None, Some(_)) => Some(subject.clone()),
        (None, None) => None,
    };

    Some(ConventionalCommit {
        kind: caps["type"].to_lowercase(),
        scope: caps
            .name("scope")
            .map(|m| m.as_str().to_string())
            .filter(|s| !s.is_empty()),
        subject,
        breaking,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_header_with_scope() {
        let commit = parse("feat(parser): support arrays\n\nbody").unwrap();
        assert_eq!(commit.kind, "feat");
        assert_eq!(commit.scope.as_deref(), Some("parser"));
        assert_eq!(commit.subject, "support arrays");
        assert_eq!(commit.breaking, None);
    }

    #[test]
    fn test_breaking_note_in_footer() {
        let commit = parse("fix: drop node 10\n\nBREAKING CHANGE: node 10 is no longer supported")
            .unwrap();
        assert_eq!(
            commit.breaking.as_deref(),
            Some("node 10 is no longer supported")
        );
    }

    #[test]
    fn test_bang_marks_breaking() {
        let commit = parse("refactor!: rename config keys").unwrap();
        assert_eq!(commit.breaking.as_deref(), Some("rename config keys"));
    }

    #[test]
    fn test_non_conventional() {
        assert!(parse("Update README").is_none());
        assert!(parse("").is_none());
    }
}
