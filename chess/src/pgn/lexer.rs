//! Tokenizer for PGN text: tag pairs, move text, comments, NAGs and
//! variation brackets.

use super::parser::GameResult;
use super::PgnError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Tag { name: String, value: String },
    Comment(String),
    Nag(u8),
    MoveNumber { number: u32, black: bool },
    San(String),
    OpenVariation,
    CloseVariation,
    Result(GameResult),
}

/// Split PGN text into tokens.
///
/// Annotation glyphs written directly after a move (`e4!?`) come out as a
/// separate [`Token::Nag`]. `12.e4` yields a move number followed by the move.
pub fn tokenize(input: &str) -> Result<Vec<Token>, PgnError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '{' => {
                chars.next();
                let mut text = String::new();
                let mut closed = false;
                for (_, ch) in chars.by_ref() {
                    if ch == '}' {
                        closed = true;
                        break;
                    }
                    text.push(ch);
                }
                if !closed {
                    return Err(PgnError::UnterminatedComment(start));
                }
                tokens.push(Token::Comment(text.trim().to_string()));
            }
            ';' => {
                chars.next();
                let text: String = chars
                    .by_ref()
                    .map(|(_, ch)| ch)
                    .take_while(|&ch| ch != '\n')
                    .collect();
                tokens.push(Token::Comment(text.trim().to_string()));
            }
            '%' if start == 0 || input[..start].ends_with('\n') => {
                // escape line
                for (_, ch) in chars.by_ref() {
                    if ch == '\n' {
                        break;
                    }
                }
            }
            '[' => {
                chars.next();
                let mut body = String::new();
                let mut closed = false;
                let mut in_quotes = false;
                let mut escaped = false;
                for (_, ch) in chars.by_ref() {
                    if escaped {
                        body.push(ch);
                        escaped = false;
                        continue;
                    }
                    match ch {
                        '\\' if in_quotes => escaped = true,
                        '"' => {
                            in_quotes = !in_quotes;
                            body.push(ch);
                        }
                        ']' if !in_quotes => {
                            closed = true;
                            break;
                        }
                        _ => body.push(ch),
                    }
                }
                if !closed {
                    return Err(PgnError::UnterminatedTag(start));
                }
                tokens.push(parse_tag(&body)?);
            }
            '(' => {
                chars.next();
                tokens.push(Token::OpenVariation);
            }
            ')' => {
                chars.next();
                tokens.push(Token::CloseVariation);
            }
            _ => {
                let mut word = String::new();
                while let Some(&(_, ch)) = chars.peek() {
                    if ch.is_whitespace() || matches!(ch, '{' | '}' | '(' | ')' | '[' | ']' | ';') {
                        break;
                    }
                    word.push(ch);
                    chars.next();
                }
                if word.is_empty() {
                    // stray closing brace or bracket
                    return Err(PgnError::UnexpectedCharacter(c, start));
                }
                push_word(&word, &mut tokens)?;
            }
        }
    }

    Ok(tokens)
}

fn parse_tag(body: &str) -> Result<Token, PgnError> {
    let body = body.trim();
    let (name, rest) = body
        .split_once(char::is_whitespace)
        .ok_or_else(|| PgnError::InvalidTag(body.to_string()))?;
    let value = rest
        .trim()
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .ok_or_else(|| PgnError::InvalidTag(body.to_string()))?;
    Ok(Token::Tag {
        name: name.to_string(),
        value: value.to_string(),
    })
}

fn push_word(word: &str, tokens: &mut Vec<Token>) -> Result<(), PgnError> {
    if let Some(result) = GameResult::from_pgn(word) {
        tokens.push(Token::Result(result));
        return Ok(());
    }

    if let Some(nag) = word.strip_prefix('$') {
        let value = nag
            .parse()
            .map_err(|_| PgnError::InvalidNag(word.to_string()))?;
        tokens.push(Token::Nag(value));
        return Ok(());
    }

    if word.chars().all(|c| c == '.') {
        return Ok(());
    }

    let mut rest = word;
    if !word.starts_with("0-0") {
        let digits = word.chars().take_while(char::is_ascii_digit).count();
        if digits > 0 {
            let dots = word[digits..].chars().take_while(|&c| c == '.').count();
            let number = word[..digits]
                .parse()
                .map_err(|_| PgnError::InvalidMoveNumber(word.to_string()))?;
            tokens.push(Token::MoveNumber {
                number,
                black: dots >= 3,
            });
            rest = &word[digits + dots..];
            if rest.is_empty() {
                return Ok(());
            }
        }
    }

    let glyph_start = rest
        .find(|c| c == '!' || c == '?')
        .unwrap_or(rest.len());
    let (san, glyph) = rest.split_at(glyph_start);
    if !san.is_empty() {
        tokens.push(Token::San(san.to_string()));
    }
    if let Some(nag) = glyph_to_nag(glyph) {
        tokens.push(Token::Nag(nag));
    }
    Ok(())
}

fn glyph_to_nag(glyph: &str) -> Option<u8> {
    match glyph {
        "!" => Some(1),
        "?" => Some(2),
        "!!" => Some(3),
        "??" => Some(4),
        "!?" => Some(5),
        "?!" => Some(6),
        _ => None,
    }
}
