//! Glob matching shared by field values and by `all of`/`1 of` search name
//! selection. `*` matches any sequence, `?` exactly one character and a
//! backslash escapes the next wildcard character.
//! See: https://github.com/SigmaHQ/sigma-specification/blob/main/specification/sigma-rules-specification.md#escaping

#[derive(Debug, Clone, Copy, PartialEq)]
enum WildcardToken {
    Star,
    QuestionMark,
    Char(char),
}

/// A pattern compiled once and matched against many haystacks.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct WildcardPattern {
    tokens: Vec<WildcardToken>,
    lowercase: bool,
    has_wildcards: bool,
}

impl WildcardPattern {
    pub(crate) fn new(pattern: &str, lowercase: bool) -> Self {
        Self::from_tokens(tokenize(pattern, lowercase), lowercase)
    }

    /// Like [`WildcardPattern::new`], with a star added before and/or after
    /// the pattern. The stars are added after escape handling, so a pattern
    /// ending in a backslash keeps its trailing star.
    pub(crate) fn surrounded(pattern: &str, lowercase: bool, leading: bool, trailing: bool) -> Self {
        let mut tokens = tokenize(pattern, lowercase);
        if leading && tokens.first() != Some(&WildcardToken::Star) {
            tokens.insert(0, WildcardToken::Star);
        }
        if trailing && tokens.last() != Some(&WildcardToken::Star) {
            tokens.push(WildcardToken::Star);
        }
        Self::from_tokens(tokens, lowercase)
    }

    fn from_tokens(tokens: Vec<WildcardToken>, lowercase: bool) -> Self {
        let has_wildcards = tokens.iter().any(|t| !matches!(t, WildcardToken::Char(_)));
        Self {
            tokens,
            lowercase,
            has_wildcards,
        }
    }

    pub(crate) fn is_match(&self, haystack: &str) -> bool {
        let haystack: Vec<char> = if self.lowercase {
            haystack.chars().flat_map(char::to_lowercase).collect()
        } else {
            haystack.chars().collect()
        };

        if !self.has_wildcards {
            return haystack.len() == self.tokens.len()
                && haystack
                    .iter()
                    .zip(&self.tokens)
                    .all(|(c, t)| *t == WildcardToken::Char(*c));
        }

        match_tokens(&self.tokens, &haystack)
    }
}

fn tokenize(s: &str, lowercase: bool) -> Vec<WildcardToken> {
    let mut result = vec![];
    let mut escape_mode = false;

    let push_char = |result: &mut Vec<WildcardToken>, c: char| {
        if lowercase {
            result.extend(c.to_lowercase().map(WildcardToken::Char));
        } else {
            result.push(WildcardToken::Char(c));
        }
    };

    for c in s.chars() {
        match c {
            '*' | '?' if escape_mode => {
                push_char(&mut result, c);
                escape_mode = false;
            }
            '*' => {
                // Consecutive stars are equivalent to one
                if result.last() != Some(&WildcardToken::Star) {
                    result.push(WildcardToken::Star);
                }
            }
            '?' => result.push(WildcardToken::QuestionMark),
            '\\' if escape_mode => {
                push_char(&mut result, '\\');
                escape_mode = false;
            }
            '\\' => escape_mode = true,
            _ => {
                if escape_mode {
                    // A backslash not followed by a wildcard or backslash is literal
                    push_char(&mut result, '\\');
                    escape_mode = false;
                }
                push_char(&mut result, c);
            }
        }
    }
    if escape_mode {
        push_char(&mut result, '\\');
    }

    result
}

/// Iterative matcher that backtracks to the most recent star only.
fn match_tokens(tokens: &[WildcardToken], haystack: &[char]) -> bool {
    let (mut t, mut h) = (0, 0);
    let mut last_star: Option<(usize, usize)> = None;

    while h < haystack.len() {
        match tokens.get(t) {
            Some(WildcardToken::Star) => {
                last_star = Some((t, h));
                t += 1;
            }
            Some(WildcardToken::QuestionMark) => {
                t += 1;
                h += 1;
            }
            Some(WildcardToken::Char(c)) if *c == haystack[h] => {
                t += 1;
                h += 1;
            }
            _ => match last_star {
                Some((star_t, star_h)) => {
                    t = star_t + 1;
                    h = star_h + 1;
                    last_star = Some((star_t, star_h + 1));
                }
                None => return false,
            },
        }
    }

    tokens[t..].iter().all(|token| *token == WildcardToken::Star)
}
