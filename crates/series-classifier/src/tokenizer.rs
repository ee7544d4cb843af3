//! Splits free text into terms.
//!
//! Series descriptions look like `"AX T1 FS_POST(ART)"` or
//! `"(t2/haste, cor)"`. Manual rules test membership of a token in the
//! split description rather than substring containment, so that `"ax"` does
//! not match inside `"relax"`.

/// Separator characters used by default.
pub const DEFAULT_SEPARATORS: &[char] = &[' ', '_', '/'];

/// Tokenizer configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizerOptions {
    /// Characters that end a token.
    pub separators: Vec<char>,
    /// Remove one enclosing pair of parentheses before splitting.
    pub strip_brackets: bool,
    /// Remove a single trailing comma from each token.
    pub strip_trailing_comma: bool,
}

impl Default for TokenizerOptions {
    fn default() -> Self {
        Self {
            separators: DEFAULT_SEPARATORS.to_vec(),
            strip_brackets: true,
            strip_trailing_comma: true,
        }
    }
}

/// Tokenizes with the default options.
///
/// # Examples
///
/// ```
/// use series_classifier::tokenizer::tokenize;
///
/// assert_eq!(tokenize("(a/b_c)"), vec!["a", "b", "c"]);
/// assert_eq!(tokenize("value,"), vec!["value"]);
/// assert!(tokenize("").is_empty());
/// ```
pub fn tokenize(text: &str) -> Vec<String> {
    tokenize_with(text, &TokenizerOptions::default())
}

/// Splits `text` at the earliest separator, repeatedly, and returns the
/// non-empty pieces in order.
pub fn tokenize_with(text: &str, options: &TokenizerOptions) -> Vec<String> {
    let mut line = text;
    if options.strip_brackets && line.len() >= 2 && line.starts_with('(') && line.ends_with(')') {
        line = &line[1..line.len() - 1];
    }

    let mut pieces = Vec::new();
    while let Some((index, sep)) = earliest_separator(line, &options.separators) {
        pieces.push(&line[..index]);
        line = &line[index + sep.len_utf8()..];
    }
    pieces.push(line);

    pieces
        .into_iter()
        .map(|piece| {
            if options.strip_trailing_comma {
                piece.strip_suffix(',').unwrap_or(piece)
            } else {
                piece
            }
        })
        .filter(|piece| !piece.is_empty())
        .map(str::to_string)
        .collect()
}

/// Byte index and character of the first separator occurring in `line`.
/// Ties go to the separator listed first.
fn earliest_separator(line: &str, separators: &[char]) -> Option<(usize, char)> {
    let mut best: Option<(usize, char)> = None;
    for &sep in separators {
        if let Some(index) = line.find(sep) {
            if best.map_or(true, |(current, _)| index < current) {
                best = Some((index, sep));
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brackets_and_separators() {
        assert_eq!(tokenize("(a/b_c)"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_trailing_comma() {
        assert_eq!(tokenize("value,"), vec!["value"]);
        assert_eq!(tokenize("t2, haste"), vec!["t2", "haste"]);
    }

    #[test]
    fn test_empty() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("()").is_empty());
        assert!(tokenize("  __ ").is_empty());
    }

    #[test]
    fn test_consecutive_separators() {
        assert_eq!(tokenize("ax  t1__fs"), vec!["ax", "t1", "fs"]);
    }

    #[test]
    fn test_inner_brackets_stay_in_token() {
        assert_eq!(tokenize("t1 fs_post(art)"), vec!["t1", "fs", "post(art)"]);
        assert_eq!(tokenize("(t2/haste) cor"), vec!["(t2", "haste)", "cor"]);
    }

    #[test]
    fn test_single_open_bracket_not_stripped() {
        assert_eq!(tokenize("(ax"), vec!["(ax"]);
    }

    #[test]
    fn test_custom_options() {
        let options = TokenizerOptions {
            separators: vec!['-'],
            strip_brackets: false,
            strip_trailing_comma: false,
        };
        assert_eq!(tokenize_with("(a-b,)", &options), vec!["(a", "b,)"]);
    }

    #[test]
    fn test_multibyte_text() {
        assert_eq!(tokenize("größe t2"), vec!["größe", "t2"]);
    }
}
