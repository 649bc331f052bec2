use once_cell::sync::OnceCell;
use regex::{Matches, Regex};

use crate::errors::{MailTallyError, Result};

/// Email-like token pattern: local part, `@`, host labels, then a 2-6 letter
/// alphabetic suffix. Letters are listed in both cases, so no case flag is
/// needed and matching stays ASCII-only.
pub const EMAIL_TOKEN_PATTERN: &str = r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,6}";

static TOKEN_REGEX: OnceCell<Regex> = OnceCell::new();

/// Compile-once handle over the process-wide token pattern.
///
/// Every extractor shares the same compiled `Regex`; constructing one after
/// the first is a pointer copy. Compilation failure surfaces from
/// [`TokenExtractor::init`] and is meant to abort the run at startup.
#[derive(Debug, Clone, Copy)]
pub struct TokenExtractor {
    regex: &'static Regex,
}

impl TokenExtractor {
    /// Compile (first call) or fetch (later calls) the shared pattern.
    pub fn init() -> Result<Self> {
        let regex = TOKEN_REGEX.get_or_try_init(|| {
            Regex::new(EMAIL_TOKEN_PATTERN)
                .map_err(|e| MailTallyError::pattern_compile(EMAIL_TOKEN_PATTERN, e.to_string()))
        })?;
        Ok(Self { regex })
    }

    /// Lazy, left-to-right, non-overlapping token matches in `body`.
    ///
    /// The iterator borrows `body`; calling `tokens` again restarts the scan.
    pub fn tokens<'b>(&self, body: &'b str) -> Tokens<'b> {
        Tokens {
            inner: self.regex.find_iter(body),
        }
    }

    /// The pattern source this extractor was built from.
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }
}

/// Iterator returned by [`TokenExtractor::tokens`].
#[derive(Debug)]
pub struct Tokens<'b> {
    inner: Matches<'static, 'b>,
}

impl<'b> Iterator for Tokens<'b> {
    type Item = &'b str;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|m| m.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(body: &str) -> Vec<String> {
        let ex = TokenExtractor::init().unwrap();
        ex.tokens(body).map(str::to_string).collect()
    }

    #[test]
    fn test_repeated_token_yields_each_match() {
        let v = collect("Contact: foo@bar.com or foo@bar.com again");
        assert_eq!(v, vec!["foo@bar.com", "foo@bar.com"]);
    }

    #[test]
    fn test_mixed_case_and_symbols() {
        let v = collect("<a href=\"mailto:John.Doe+news@Mail.Example.ORG\">mail</a>");
        assert_eq!(v, vec!["John.Doe+news@Mail.Example.ORG"]);
    }

    #[test]
    fn test_no_match() {
        assert!(collect("no addresses here, just @ signs and dots.").is_empty());
        assert!(collect("").is_empty());
        assert!(collect("user@localhost").is_empty());
    }

    #[test]
    fn test_suffix_limits() {
        // Suffix shorter than two letters does not match.
        assert!(collect("a@b.c").is_empty());
        // Greedy host labels backtrack to the last dot that leaves 2-6 letters.
        assert_eq!(collect("x@sub.example.museum"), vec!["x@sub.example.museum"]);
        // A 7-letter run still matches on its 6-letter prefix.
        assert_eq!(collect("x@ex.abcdefg"), vec!["x@ex.abcdef"]);
    }

    #[test]
    fn test_restartable_scan() {
        let ex = TokenExtractor::init().unwrap();
        let body = "a@one.com b@two.net";
        let first: Vec<_> = ex.tokens(body).collect();
        let second: Vec<_> = ex.tokens(body).collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn test_shared_compilation() {
        let a = TokenExtractor::init().unwrap();
        let b = TokenExtractor::init().unwrap();
        assert!(std::ptr::eq(a.regex, b.regex));
        assert_eq!(a.pattern(), EMAIL_TOKEN_PATTERN);
    }
}
