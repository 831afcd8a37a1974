//! Helpers for reading the tool's textual reports.

/// Last revision number mentioned in an update/checkout/commit report
/// (`At revision 15.`, `Checked out revision 15.`, `Committed revision 16.`).
pub fn parse_revision(output: &str) -> Option<u64> {
    output
        .lines()
        .rev()
        .find_map(|line| {
            let (_, tail) = line.rsplit_once("revision ")?;
            let digits: String = tail.chars().take_while(char::is_ascii_digit).collect();
            digits.parse().ok()
        })
}

/// First non-empty line, which is the version for `svn --version --quiet`.
pub fn parse_version(output: &str) -> Option<&str> {
    output.lines().map(str::trim).find(|line| !line.is_empty())
}

/// Whether a failed `svn info` means the target is absent rather than
/// unreachable.
pub fn is_missing_target(message: &str) -> bool {
    ["W170000", "E170000", "E200009", "E155007"]
        .iter()
        .any(|code| message.contains(code))
        || message.contains("non-existent")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revision_from_reports() {
        assert_eq!(parse_revision("Checked out revision 15.\n"), Some(15));
        assert_eq!(
            parse_revision("Updating '.':\nU    a.txt\nUpdated to revision 21.\n"),
            Some(21)
        );
        assert_eq!(
            parse_revision("Sending        a\nTransmitting file data .done\nCommitting transaction...\nCommitted revision 16.\n"),
            Some(16)
        );
        assert_eq!(parse_revision("nothing to see\n"), None);
    }

    #[test]
    fn multi_target_update_uses_last_revision() {
        let out = "Updating 'a':\nAt revision 3.\nUpdating 'b':\nAt revision 4.\nSummary of updates:\n";
        assert_eq!(parse_revision(out), Some(4));
    }

    #[test]
    fn version_line() {
        assert_eq!(parse_version("\n1.14.2\n"), Some("1.14.2"));
        assert_eq!(parse_version(""), None);
    }

    #[test]
    fn missing_versus_unreachable() {
        assert!(is_missing_target(
            "svn: warning: W170000: URL 'https://svn.example.com/repo/x' non-existent in revision 9\n\
             svn: E200009: Could not display info for all targets because some targets don't exist"
        ));
        assert!(!is_missing_target(
            "svn: E170013: Unable to connect to a repository at URL 'http://127.0.0.1/path/1'"
        ));
    }
}
