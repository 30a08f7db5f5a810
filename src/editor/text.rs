//! Char-offset string helpers.
//!
//! Every offset the editor deals in counts characters, so these convert to
//! byte indices at the last moment.

/// Byte index of the `chars`-th character, clamped to the end.
pub fn byte_index(s: &str, chars: usize) -> usize {
    s.char_indices().nth(chars).map_or(s.len(), |(i, _)| i)
}

pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Split at a char offset.
pub fn split_at_char(s: &str, at: usize) -> (&str, &str) {
    s.split_at(byte_index(s, at))
}

/// Replace the char range `start..end` with `insert`.
pub fn splice(s: &str, start: usize, end: usize, insert: &str) -> String {
    let start_byte = byte_index(s, start);
    let end_byte = byte_index(s, end.max(start));
    let mut out = String::with_capacity(s.len() + insert.len());
    out.push_str(&s[..start_byte]);
    out.push_str(insert);
    out.push_str(&s[end_byte..]);
    out
}

/// Text in the char range `start..end`.
pub fn slice(s: &str, start: usize, end: usize) -> &str {
    &s[byte_index(s, start)..byte_index(s, end.max(start))]
}

/// Length of the run of `c` ending just before `at`.
pub fn run_before(s: &str, at: usize, c: char) -> usize {
    s.chars().take(at).collect::<Vec<_>>().iter().rev().take_while(|&&x| x == c).count()
}

/// Length of the run of `c` starting at `at`.
pub fn run_after(s: &str, at: usize, c: char) -> usize {
    s.chars().skip(at).take_while(|&x| x == c).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_index_clamps() {
        assert_eq!(byte_index("héllo", 2), 3);
        assert_eq!(byte_index("ab", 9), 2);
    }

    #[test]
    fn test_splice_replaces_range() {
        assert_eq!(splice("hello world", 6, 11, "there"), "hello there");
        assert_eq!(splice("ab", 1, 1, "X"), "aXb");
    }

    #[test]
    fn test_split_and_slice_multibyte() {
        assert_eq!(split_at_char("añb", 2), ("añ", "b"));
        assert_eq!(slice("añbc", 1, 3), "ñb");
    }

    #[test]
    fn test_runs() {
        assert_eq!(run_before("a**b", 3, '*'), 2);
        assert_eq!(run_after("a***", 1, '*'), 3);
        assert_eq!(run_before("**", 0, '*'), 0);
    }
}
