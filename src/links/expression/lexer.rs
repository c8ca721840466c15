//! Tokenizer for the expression subset

use super::ParseError;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// `$`
    Context,
    /// `$$`
    Root,
    /// `$name`, stored without the dollar
    Variable(String),
    /// Field name or keyword
    Name(String),
    Str(String),
    Number(f64),
    Regex { pattern: String, flags: String },
    Star,
    Dot,
    Comma,
    Colon,
    Question,
    Minus,
    LBracket,
    RBracket,
    LParen,
    RParen,
    LBrace,
    RBrace,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    /// `~>`
    Chain,
    /// `&`
    Amp,
}

/// A token and the byte offset it starts at
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub offset: usize,
}

pub fn tokenize(input: &str) -> Result<Vec<Spanned>, ParseError> {
    let chars: Vec<(usize, char)> = input.char_indices().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    let peek = |i: usize| chars.get(i).map(|(_, c)| *c);

    while i < chars.len() {
        let (offset, c) = chars[i];

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        let push = |tokens: &mut Vec<Spanned>, token: Token| tokens.push(Spanned { token, offset });

        match c {
            '/' if peek(i + 1) == Some('*') => {
                i += 2;
                loop {
                    match (peek(i), peek(i + 1)) {
                        (Some('*'), Some('/')) => {
                            i += 2;
                            break;
                        }
                        (Some(_), _) => i += 1,
                        (None, _) => return Err(ParseError::new(offset, "unterminated comment")),
                    }
                }
            }
            '/' => {
                // Without arithmetic, a slash always opens a regex literal
                i += 1;
                let mut pattern = String::new();
                loop {
                    match peek(i) {
                        Some('\\') => {
                            pattern.push('\\');
                            if let Some(next) = peek(i + 1) {
                                pattern.push(next);
                            }
                            i += 2;
                        }
                        Some('/') => {
                            i += 1;
                            break;
                        }
                        Some(ch) => {
                            pattern.push(ch);
                            i += 1;
                        }
                        None => return Err(ParseError::new(offset, "unterminated regex")),
                    }
                }
                if pattern.is_empty() {
                    return Err(ParseError::new(offset, "empty regex"));
                }
                let mut flags = String::new();
                while let Some(ch) = peek(i).filter(|ch| ch.is_ascii_alphabetic()) {
                    flags.push(ch);
                    i += 1;
                }
                push(&mut tokens, Token::Regex { pattern, flags });
            }
            '$' => {
                if peek(i + 1) == Some('$') {
                    push(&mut tokens, Token::Root);
                    i += 2;
                } else if peek(i + 1).is_some_and(is_ident_start) {
                    let mut name = String::new();
                    i += 1;
                    while let Some(ch) = peek(i).filter(|ch| is_ident_char(*ch)) {
                        name.push(ch);
                        i += 1;
                    }
                    push(&mut tokens, Token::Variable(name));
                } else {
                    push(&mut tokens, Token::Context);
                    i += 1;
                }
            }
            '`' => {
                let mut name = String::new();
                i += 1;
                loop {
                    match peek(i) {
                        Some('`') => {
                            i += 1;
                            break;
                        }
                        Some(ch) => {
                            name.push(ch);
                            i += 1;
                        }
                        None => return Err(ParseError::new(offset, "unterminated quoted name")),
                    }
                }
                push(&mut tokens, Token::Name(name));
            }
            '\'' | '"' => {
                let quote = c;
                let mut value = String::new();
                i += 1;
                loop {
                    match peek(i) {
                        Some('\\') => {
                            let escaped = match peek(i + 1) {
                                Some('n') => '\n',
                                Some('t') => '\t',
                                Some('r') => '\r',
                                Some('b') => '\u{8}',
                                Some('f') => '\u{c}',
                                Some('u') => {
                                    let hex: String =
                                        (i + 2..i + 6).filter_map(|j| peek(j)).collect();
                                    let code = u32::from_str_radix(&hex, 16)
                                        .ok()
                                        .and_then(char::from_u32)
                                        .ok_or_else(|| {
                                            ParseError::new(offset, "invalid unicode escape")
                                        })?;
                                    i += 4;
                                    code
                                }
                                Some(other) => other,
                                None => {
                                    return Err(ParseError::new(offset, "unterminated string"));
                                }
                            };
                            value.push(escaped);
                            i += 2;
                        }
                        Some(ch) if ch == quote => {
                            i += 1;
                            break;
                        }
                        Some(ch) => {
                            value.push(ch);
                            i += 1;
                        }
                        None => return Err(ParseError::new(offset, "unterminated string")),
                    }
                }
                push(&mut tokens, Token::Str(value));
            }
            c if c.is_ascii_digit() => {
                let start = i;
                while peek(i).is_some_and(|ch| ch.is_ascii_digit()) {
                    i += 1;
                }
                if peek(i) == Some('.') && peek(i + 1).is_some_and(|ch| ch.is_ascii_digit()) {
                    i += 1;
                    while peek(i).is_some_and(|ch| ch.is_ascii_digit()) {
                        i += 1;
                    }
                }
                if matches!(peek(i), Some('e') | Some('E')) {
                    let mut j = i + 1;
                    if matches!(peek(j), Some('+') | Some('-')) {
                        j += 1;
                    }
                    if peek(j).is_some_and(|ch| ch.is_ascii_digit()) {
                        i = j;
                        while peek(i).is_some_and(|ch| ch.is_ascii_digit()) {
                            i += 1;
                        }
                    }
                }
                let text: String = chars[start..i].iter().map(|(_, ch)| *ch).collect();
                let number = text
                    .parse::<f64>()
                    .map_err(|_| ParseError::new(offset, format!("invalid number '{}'", text)))?;
                push(&mut tokens, Token::Number(number));
            }
            c if is_ident_start(c) => {
                let mut name = String::new();
                while let Some(ch) = peek(i).filter(|ch| is_ident_char(*ch)) {
                    name.push(ch);
                    i += 1;
                }
                push(&mut tokens, Token::Name(name));
            }
            '~' => {
                if peek(i + 1) != Some('>') {
                    return Err(ParseError::new(offset, "expected '~>'"));
                }
                push(&mut tokens, Token::Chain);
                i += 2;
            }
            '!' => {
                if peek(i + 1) != Some('=') {
                    return Err(ParseError::new(offset, "expected '!='"));
                }
                push(&mut tokens, Token::NotEq);
                i += 2;
            }
            '<' | '>' => {
                let or_equal = peek(i + 1) == Some('=');
                let token = match (c, or_equal) {
                    ('<', true) => Token::LtEq,
                    ('<', false) => Token::Lt,
                    (_, true) => Token::GtEq,
                    (_, false) => Token::Gt,
                };
                push(&mut tokens, token);
                i += if or_equal { 2 } else { 1 };
            }
            _ => {
                let token = match c {
                    '*' => Token::Star,
                    '.' => Token::Dot,
                    ',' => Token::Comma,
                    ':' => Token::Colon,
                    '?' => Token::Question,
                    '-' => Token::Minus,
                    '[' => Token::LBracket,
                    ']' => Token::RBracket,
                    '(' => Token::LParen,
                    ')' => Token::RParen,
                    '{' => Token::LBrace,
                    '}' => Token::RBrace,
                    '=' => Token::Eq,
                    '&' => Token::Amp,
                    other => {
                        return Err(ParseError::new(
                            offset,
                            format!("unexpected character '{}'", other),
                        ));
                    }
                };
                push(&mut tokens, token);
                i += 1;
            }
        }
    }

    Ok(tokens)
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
