use crate::domain::CommandRecord;

/// Closed vocabulary used for autocompletion and local dispatch.
pub const COMMAND_VOCABULARY: &[&str] = &[
    "/home", "/back", "/post", "/read", "/news", "/who", "/ascii", "/help",
];

/// Splits a submitted line on runs of whitespace. Returns `None` for blank input.
pub fn parse_command_line(raw: &str) -> Option<CommandRecord> {
    let mut tokens = raw.split_whitespace();
    let name = tokens.next()?.to_string();
    let args = tokens.map(str::to_string).collect();
    Some(CommandRecord {
        raw: raw.to_string(),
        name,
        args,
    })
}

/// Vocabulary entries that case-insensitively start with `draft`.
///
/// Completion only applies once the draft is a slash followed by at least one character.
pub fn complete_command(draft: &str) -> Vec<&'static str> {
    if !draft.starts_with('/') || draft.chars().count() < 2 {
        return Vec::new();
    }

    let needle = draft.to_lowercase();
    COMMAND_VOCABULARY
        .iter()
        .copied()
        .filter(|command| command.to_lowercase().starts_with(&needle))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_splits_on_whitespace_runs() {
        let parsed = parse_command_line("  /read   42\t extra ").expect("parsed");
        assert_eq!(parsed.name, "/read");
        assert_eq!(parsed.args, vec!["42".to_string(), "extra".to_string()]);
        assert_eq!(parsed.raw, "  /read   42\t extra ");
    }

    #[test]
    fn parse_rejects_blank_lines() {
        assert!(parse_command_line("").is_none());
        assert!(parse_command_line("   \t ").is_none());
    }

    #[test]
    fn completion_matches_prefix_case_insensitively() {
        assert_eq!(complete_command("/h"), vec!["/home", "/help"]);
        assert_eq!(complete_command("/H"), vec!["/home", "/help"]);
        assert_eq!(complete_command("/HEL"), vec!["/help"]);
    }

    #[test]
    fn completion_is_empty_for_unknown_or_short_drafts() {
        assert!(complete_command("/xyz").is_empty());
        assert!(complete_command("/").is_empty());
        assert!(complete_command("help").is_empty());
        assert!(complete_command("").is_empty());
    }
}
