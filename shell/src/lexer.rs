//! Splitting raw command lines into words.
//!
//! There is no quoting or escaping: every delimiter splits, so `echo "a b"` yields the
//! three words `echo`, `"a` and `b"`.

/// The character separating words on a command line.
pub const DELIMITER: char = ' ';

/// Marker that, as the last word of a line, runs the command in the background.
pub const BACKGROUND: &str = "&";

/// Splits `line` into at most `max_tokens` words separated by `delimiter`.
///
/// The words borrow from `line`. A trailing `\n` or `\r\n` never becomes part of the
/// last word, runs of delimiters produce no empty words, and words beyond
/// `max_tokens` are dropped without error.
pub fn split_into_tokens(line: &str, delimiter: char, max_tokens: usize) -> Vec<&str> {
    line.trim_end_matches(|c| c == '\n' || c == '\r')
        .split(delimiter)
        .filter(|word| !word.is_empty())
        .take(max_tokens)
        .collect()
}

/// Removes a trailing [`BACKGROUND`] marker and reports whether there was one.
///
/// The marker only counts when it follows at least one other word; a line
/// consisting of `&` alone is an ordinary command named `&`.
pub fn strip_background_marker(words: &mut Vec<&str>) -> bool {
    if words.len() > 1 && words.last() == Some(&BACKGROUND) {
        words.pop();
        true
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_split_simple_command() {
        let words = split_into_tokens("echo a b c", DELIMITER, 64);
        assert_eq!(words, vec!["echo", "a", "b", "c"]);
    }

    #[test]
    fn test_split_strips_line_terminator() {
        assert_eq!(split_into_tokens("ls -l\n", DELIMITER, 64), vec!["ls", "-l"]);
        assert_eq!(split_into_tokens("ls -l\r\n", DELIMITER, 64), vec!["ls", "-l"]);
    }

    #[test]
    fn test_split_collapses_repeated_delimiters() {
        let words = split_into_tokens("  sleep   5  & ", DELIMITER, 64);
        assert_eq!(words, vec!["sleep", "5", "&"]);
    }

    #[test]
    fn test_split_empty_and_blank_lines() {
        assert!(split_into_tokens("", DELIMITER, 64).is_empty());
        assert!(split_into_tokens("   \n", DELIMITER, 64).is_empty());
    }

    #[test]
    fn test_split_drops_words_past_limit() {
        let words = split_into_tokens("a b c d e", DELIMITER, 3);
        assert_eq!(words, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_split_has_no_quoting() {
        let words = split_into_tokens("echo \"a b\"", DELIMITER, 64);
        assert_eq!(words, vec!["echo", "\"a", "b\""]);
    }

    #[test]
    fn test_background_marker_is_removed() {
        let mut words = vec!["sleep", "5", "&"];
        assert!(strip_background_marker(&mut words));
        assert_eq!(words, vec!["sleep", "5"]);
    }

    #[test]
    fn test_lone_ampersand_is_a_word() {
        let mut words = vec!["&"];
        assert!(!strip_background_marker(&mut words));
        assert_eq!(words, vec!["&"]);
    }

    #[test]
    fn test_ampersand_in_the_middle_is_a_word() {
        let mut words = vec!["echo", "&", "x"];
        assert!(!strip_background_marker(&mut words));
        assert_eq!(words.len(), 3);
    }
}
