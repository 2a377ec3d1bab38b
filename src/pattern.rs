//! Glob matching for KEYS.
//!
//! Only two wildcards are understood:
//! - `*` matches any run of characters, including an empty one
//! - `?` matches exactly one character
//!
//! Every other character, including `[` and `\`, is a literal.

#[derive(Debug, Clone)]
pub struct Pattern {
    tokens: Vec<Token>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Star,
    Question,
    Literal(char),
}

impl Pattern {
    pub fn new(pattern: &str) -> Self {
        let mut tokens = Vec::with_capacity(pattern.len());
        for c in pattern.chars() {
            match c {
                // consecutive stars are equivalent to one
                '*' if tokens.last() == Some(&Token::Star) => {}
                '*' => tokens.push(Token::Star),
                '?' => tokens.push(Token::Question),
                c => tokens.push(Token::Literal(c)),
            }
        }
        Self { tokens }
    }

    pub fn matches(&self, key: &str) -> bool {
        let input: Vec<char> = key.chars().collect();
        let tokens = &self.tokens;

        let mut ti = 0;
        let mut ii = 0;
        // most recent star and the input position it was tried at
        let mut backtrack: Option<(usize, usize)> = None;

        while ii < input.len() {
            match tokens.get(ti) {
                Some(Token::Star) => {
                    backtrack = Some((ti, ii));
                    ti += 1;
                }
                Some(Token::Question) => {
                    ti += 1;
                    ii += 1;
                }
                Some(Token::Literal(c)) if *c == input[ii] => {
                    ti += 1;
                    ii += 1;
                }
                _ => match backtrack {
                    // let the last star swallow one more character
                    Some((star_ti, star_ii)) => {
                        backtrack = Some((star_ti, star_ii + 1));
                        ti = star_ti + 1;
                        ii = star_ii + 1;
                    }
                    None => return false,
                },
            }
        }

        // input exhausted: only trailing stars may remain
        tokens[ti..].iter().all(|t| *t == Token::Star)
    }
}
