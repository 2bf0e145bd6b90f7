//! Wildcard pattern matching for resources
//!
//! Patterns are matched against a whole literal, component by component,
//! where components are separated by `/`.
//!
//! ```text
//! *        any run of characters within one component (may be empty)
//! **       as a whole component: any number of components, including none
//! ?        exactly one character within a component
//! [a-z]    character class; [^a-z] negates it
//! {a,b}    alternation, each alternative is itself a pattern
//! \c       the character c, literally
//! ```
//!
//! Patterns are stateless values: a parsed [`Pattern`] can be shared between
//! threads and matched concurrently.

use crate::error::PatternError;

const SEPARATOR: char = '/';

/// A parsed wildcard pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    source: String,
    kind: Kind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Kind {
    /// `**`: matches everything, including the empty literal
    Anything,
    /// `*`: matches any literal without a separator
    SingleComponent,
    Components(Vec<Component>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Component {
    DoubleStar,
    Tokens(Vec<Token>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Literal(char),
    Star,
    AnyChar,
    Class { negated: bool, ranges: Vec<(char, char)> },
    Group(Vec<Vec<Token>>),
}

impl Pattern {
    /// Parse a pattern, rejecting malformed syntax
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        let kind = match pattern {
            "**" => Kind::Anything,
            "*" => Kind::SingleComponent,
            _ => Kind::Components(
                split_components(pattern)
                    .into_iter()
                    .map(|component| parse_component(&component, pattern))
                    .collect::<Result<_, _>>()?,
            ),
        };

        Ok(Self {
            source: pattern.to_string(),
            kind,
        })
    }

    /// The pattern as it was written
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Check whether the whole literal matches this pattern
    pub fn matches(&self, literal: &str) -> bool {
        match &self.kind {
            Kind::Anything => true,
            Kind::SingleComponent => !literal.contains(SEPARATOR),
            Kind::Components(components) => {
                let names: Vec<&str> = literal.split(SEPARATOR).collect();
                match_components(components, &names)
            }
        }
    }
}

/// Test one pattern against one literal.
///
/// Fails only when the pattern is malformed; a well-formed pattern always
/// yields a verdict.
pub fn match_pattern(pattern: &str, literal: &str) -> Result<bool, PatternError> {
    match pattern {
        "**" => Ok(true),
        "*" => Ok(!literal.contains(SEPARATOR)),
        _ => Ok(Pattern::parse(pattern)?.matches(literal)),
    }
}

/// Check that a pattern parses without matching it against anything
pub fn check_syntax(pattern: &str) -> Result<(), PatternError> {
    Pattern::parse(pattern).map(|_| ())
}

/// Whether the pattern starts with a wildcard, leaving no literal prefix
pub fn has_wildcard_prefix(pattern: &str) -> bool {
    matches!(pattern.chars().next(), Some('?' | '*' | '[' | '{'))
}

/// The unescaped text before the first wildcard, and whether a wildcard was found.
///
/// A pattern without wildcards yields its whole unescaped text.
pub fn literal_prefix(pattern: &str) -> (String, bool) {
    let mut prefix = String::with_capacity(pattern.len());
    let mut chars = pattern.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(escaped) => prefix.push(escaped),
                None => break,
            },
            '?' | '*' | '[' | '{' => return (prefix, true),
            _ => prefix.push(c),
        }
    }

    (prefix, false)
}

/// Split on separators that are not escaped
fn split_components(pattern: &str) -> Vec<String> {
    let mut components = Vec::new();
    let mut current = String::new();
    let mut chars = pattern.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                current.push(c);
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                }
            }
            SEPARATOR => components.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    components.push(current);

    components
}

fn parse_component(component: &str, pattern: &str) -> Result<Component, PatternError> {
    if component == "**" {
        return Ok(Component::DoubleStar);
    }

    let chars: Vec<char> = component.chars().collect();
    let mut parser = Parser {
        chars: &chars,
        pos: 0,
        pattern,
    };
    let tokens = parser.sequence(false)?;
    Ok(Component::Tokens(tokens))
}

struct Parser<'a> {
    chars: &'a [char],
    pos: usize,
    pattern: &'a str,
}

impl Parser<'_> {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    /// Parse tokens until the end, or until `,`/`}` when inside a group
    fn sequence(&mut self, in_group: bool) -> Result<Vec<Token>, PatternError> {
        let mut tokens = Vec::new();

        while let Some(c) = self.peek() {
            if in_group && (c == ',' || c == '}') {
                break;
            }
            self.pos += 1;

            let token = match c {
                '\\' => Token::Literal(self.escaped()?),
                '*' => {
                    if tokens.last() == Some(&Token::Star) {
                        continue;
                    }
                    Token::Star
                }
                '?' => Token::AnyChar,
                '[' => self.class()?,
                '{' => self.group()?,
                _ => Token::Literal(c),
            };
            tokens.push(token);
        }

        Ok(tokens)
    }

    fn escaped(&mut self) -> Result<char, PatternError> {
        self.bump().ok_or_else(|| PatternError::DanglingEscape {
            pattern: self.pattern.to_string(),
        })
    }

    fn class(&mut self) -> Result<Token, PatternError> {
        let pattern = self.pattern;
        let unterminated = || PatternError::UnterminatedClass {
            pattern: pattern.to_string(),
        };

        let negated = self.peek() == Some('^');
        if negated {
            self.pos += 1;
        }

        let mut ranges = Vec::new();
        loop {
            let lo = match self.bump().ok_or_else(unterminated)? {
                ']' => break,
                '\\' => self.escaped()?,
                c => c,
            };

            // `-` right before `]` is a literal dash
            let hi = if self.peek() == Some('-') && self.chars.get(self.pos + 1) != Some(&']') {
                self.pos += 1;
                match self.bump().ok_or_else(unterminated)? {
                    '\\' => self.escaped()?,
                    c => c,
                }
            } else {
                lo
            };
            ranges.push((lo, hi));
        }

        if ranges.is_empty() {
            return Err(PatternError::EmptyClass {
                pattern: self.pattern.to_string(),
            });
        }

        Ok(Token::Class { negated, ranges })
    }

    fn group(&mut self) -> Result<Token, PatternError> {
        let mut alternatives = Vec::new();
        loop {
            alternatives.push(self.sequence(true)?);
            match self.bump() {
                Some(',') => continue,
                Some('}') => break,
                _ => {
                    return Err(PatternError::UnterminatedGroup {
                        pattern: self.pattern.to_string(),
                    });
                }
            }
        }
        Ok(Token::Group(alternatives))
    }
}

fn match_components(pattern: &[Component], names: &[&str]) -> bool {
    let (mut p, mut n) = (0, 0);

    while p < pattern.len() && n < names.len() {
        match &pattern[p] {
            Component::DoubleStar => {
                if p + 1 == pattern.len() {
                    return true;
                }
                return (n..names.len())
                    .any(|skip| match_components(&pattern[p + 1..], &names[skip..]));
            }
            Component::Tokens(tokens) => {
                if !match_tokens(tokens, names[n]) {
                    return false;
                }
            }
        }
        p += 1;
        n += 1;
    }

    p == pattern.len() && n == names.len()
}

fn match_tokens(tokens: &[Token], text: &str) -> bool {
    match_sequence(tokens, text, &|remaining: &str| remaining.is_empty())
}

/// Match `tokens` against a prefix of `text` and hand the rest to `then`
fn match_sequence(tokens: &[Token], text: &str, then: &dyn Fn(&str) -> bool) -> bool {
    let Some((token, rest)) = tokens.split_first() else {
        return then(text);
    };

    match token {
        Token::Literal(c) => text
            .strip_prefix(*c)
            .is_some_and(|remaining| match_sequence(rest, remaining, then)),
        Token::AnyChar => {
            let mut chars = text.chars();
            chars.next().is_some() && match_sequence(rest, chars.as_str(), then)
        }
        Token::Class { negated, ranges } => {
            let mut chars = text.chars();
            match chars.next() {
                Some(c) => {
                    let in_class = ranges.iter().any(|&(lo, hi)| lo <= c && c <= hi);
                    in_class != *negated && match_sequence(rest, chars.as_str(), then)
                }
                None => false,
            }
        }
        Token::Star => text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .any(|i| match_sequence(rest, &text[i..], then)),
        Token::Group(alternatives) => alternatives.iter().any(|alternative| {
            match_sequence(alternative, text, &|after: &str| {
                match_sequence(rest, after, then)
            })
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("*", "", true)]
    #[case("*", "/", false)]
    #[case("*", "/a", false)]
    #[case("/*", "//", false)]
    #[case("*/", "debug/", true)]
    #[case("/*", "/debug", true)]
    #[case("/*", "/debug/", false)]
    #[case("/*", "/debug/pprof", false)]
    #[case("/*/", "/debug/", true)]
    #[case("/*/*", "/debug/pprof", true)]
    #[case("debug/*/", "debug/test/", true)]
    #[case("aa/*", "aa/", true)]
    #[case("**", "", true)]
    #[case("**", "/a/b/c", true)]
    #[case("**", "/config", true)]
    #[case("/**", "/debug", true)]
    #[case("/**", "/debug/pprof/profile", true)]
    #[case("/**", "/debug/pprof/profile/", true)]
    #[case("/in[d]ex", "/index", true)]
    #[case("/in[d]ex", "/inex", false)]
    #[case(r"/in\[d\]ex", "/in[d]ex", true)]
    #[case("/**/profile", "/debug/pprof/profile/", false)]
    #[case("/**/profile", "/debug/pprof/profile", true)]
    #[case("/**/profile", "/profile", true)]
    #[case("/*/*/profile", "/debug/pprof/profile", true)]
    #[case("/**/*", "/debug/pprof/profile", true)]
    #[case("/**/pprof/*", "/debug/pprof/profile", true)]
    #[case("/**/pprof/*/", "/debug/pprof/profile/", true)]
    #[case("/*/[pz]rofile/", "/debug/profile/", true)]
    #[case("/{debug,test}/profile", "/debug/profile", true)]
    #[case("/{debug,test}/profile", "/debug/profile/", false)]
    #[case(r"\**", "*GET", true)]
    #[case(r"\\[0-9]", r"\8", true)]
    #[case(r"\\\[0-9]", r"\[0-9]", true)]
    #[case(r"\\A", r"\A", true)]
    #[case(r"\A", "A", true)]
    #[case("[^visitor]*", "va", false)]
    #[case("[^visitor]*", "za", true)]
    #[case("dashboard*.xxxx.com", "dashboard.xxxx.com", true)]
    #[case("dashboard{-sit,-prod}.domain.com", "dashboard-sit.domain.com", true)]
    #[case("dashboard{-sit,-prod}.domain.com", "dashboard-si.domain.com", false)]
    #[case("api-?.domain.com", "api-1.domain.com", true)]
    #[case("api-?.domain.com", "api-12.domain.com", false)]
    #[case("{GET,{PUT,PATCH}}", "PATCH", true)]
    #[case("{a,ab}c", "abc", true)]
    #[case("{a,ab}{c,bc}", "abc", true)]
    #[case("{a*,b}z", "aqqz", true)]
    #[case("{a*,b}z", "bqz", false)]
    #[case("x{a,b}?", "xa", false)]
    #[case("[a-c-]x", "-x", true)]
    #[case("GET", "GET", true)]
    #[case("GET", "POST", false)]
    fn test_match_pattern(#[case] pattern: &str, #[case] literal: &str, #[case] expected: bool) {
        assert_eq!(
            match_pattern(pattern, literal),
            Ok(expected),
            "pattern {:?} against {:?}",
            pattern,
            literal
        );
    }

    #[rstest]
    #[case("/{config/*,instance}")]
    #[case("/[abc")]
    #[case("/[]")]
    #[case("{a,b")]
    #[case(r"abc\")]
    fn test_malformed_patterns(#[case] pattern: &str) {
        assert!(match_pattern(pattern, "/config/delete").is_err());
        assert!(check_syntax(pattern).is_err());
    }

    #[test]
    fn test_malformed_error_kinds() {
        assert!(matches!(
            check_syntax("[abc"),
            Err(PatternError::UnterminatedClass { .. })
        ));
        assert!(matches!(
            check_syntax("[]"),
            Err(PatternError::EmptyClass { .. })
        ));
        assert!(matches!(
            check_syntax("{a,b"),
            Err(PatternError::UnterminatedGroup { .. })
        ));
        assert!(matches!(
            check_syntax(r"a\"),
            Err(PatternError::DanglingEscape { .. })
        ));
    }

    #[test]
    fn test_repeated_matching_is_stable() {
        let pattern = Pattern::parse("api-{prod,sit}.domain.com").unwrap();
        for _ in 0..3 {
            assert!(pattern.matches("api-prod.domain.com"));
            assert!(!pattern.matches("api-dev.domain.com"));
        }
        assert_eq!(pattern.as_str(), "api-{prod,sit}.domain.com");
    }

    #[rstest]
    #[case("*", true)]
    #[case("jack*", false)]
    #[case(r"\*tom", false)]
    #[case("/test", false)]
    #[case("[t]est", true)]
    #[case("{t,j}est", true)]
    #[case("", false)]
    fn test_has_wildcard_prefix(#[case] pattern: &str, #[case] expected: bool) {
        assert_eq!(has_wildcard_prefix(pattern), expected);
    }

    #[rstest]
    #[case("*test", "", true)]
    #[case("test*", "test", true)]
    #[case("te*st", "te", true)]
    #[case("test", "test", false)]
    #[case(r"test\[]", "test[]", false)]
    #[case("api-{prod,sit}.domain.com", "api-", true)]
    fn test_literal_prefix(#[case] pattern: &str, #[case] prefix: &str, #[case] wildcard: bool) {
        assert_eq!(literal_prefix(pattern), (prefix.to_string(), wildcard));
    }
}
