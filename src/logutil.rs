//! Keeps user-entered titles readable in single-line log output.

const MAX_LOGGED_CHARS: usize = 80;

/// Collapse whitespace runs (including newlines and tabs) to one space, drop other
/// control characters, and cap the result at 80 characters with an ellipsis.
pub fn loggable(s: &str) -> String {
    let mut out = String::with_capacity(s.len().min(MAX_LOGGED_CHARS) + 4);
    let mut kept = 0usize;
    let mut pending_space = false;
    for ch in s.trim().chars() {
        if ch.is_whitespace() {
            pending_space = true;
            continue;
        }
        if ch.is_control() {
            continue;
        }
        if kept >= MAX_LOGGED_CHARS {
            out.push('…');
            return out;
        }
        if pending_space && !out.is_empty() {
            out.push(' ');
            kept += 1;
        }
        pending_space = false;
        out.push(ch);
        kept += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::loggable;

    #[test]
    fn flattens_multiline_titles() {
        assert_eq!(loggable("  Write\n\tblog   post \r\n"), "Write blog post");
    }

    #[test]
    fn drops_control_chars_and_truncates() {
        assert_eq!(loggable("a\u{7}b"), "ab");
        let long = "q".repeat(200);
        let out = loggable(&long);
        assert!(out.ends_with('…'));
        assert_eq!(out.chars().count(), 81);
    }
}
