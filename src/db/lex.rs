use logos::{self, Logos};
use std::fmt;

//===========================================================================//

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum LexerError {
    #[default]
    InvalidToken,
    NumberTooLarge,
}

//===========================================================================//

fn number_callback(
    lexer: &mut logos::Lexer<Token>,
) -> Result<u32, LexerError> {
    let digits = lexer.slice().trim_start_matches('$');
    u32::from_str_radix(digits, 16).map_err(|_| LexerError::NumberTooLarge)
}

fn word_callback(lexer: &mut logos::Lexer<Token>) -> String {
    lexer.slice().to_string()
}

/// A single lexical token of a debugger script line.
#[derive(Clone, Debug, Eq, Logos, PartialEq)]
#[logos(error = LexerError)]
#[logos(skip r"[ \t\r]+")] // whitespace
#[logos(skip r"#[^\n]*")] // comments
pub enum Token {
    /// A "`=`" symbol.
    #[token("=")]
    Equals,
    /// A hex literal that starts with a digit or a `$`.
    #[regex(r"\$[0-9A-Fa-f]+", number_callback)]
    #[regex(r"[0-9][0-9A-Fa-f]*", number_callback)]
    Number(u32),
    /// A keyword, register name, or hex literal that starts with a letter.
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", word_callback)]
    Word(String),
}

impl Token {
    /// Returns the value of this token read as a hex number, if it can be
    /// read as one.  Words made only of hex digits count, so that `ff` and
    /// `$ff` mean the same thing.
    pub fn hex_value(&self) -> Option<u32> {
        match self {
            Token::Number(value) => Some(*value),
            Token::Word(word)
                if word.chars().all(|chr| chr.is_ascii_hexdigit()) =>
            {
                u32::from_str_radix(word, 16).ok()
            }
            _ => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Token::Equals => f.write_str("'='"),
            Token::Number(value) => write!(f, "${value:x}"),
            Token::Word(word) => write!(f, "'{word}'"),
        }
    }
}

//===========================================================================//

/// Splits one line of a debugger script into tokens, dropping any comment.
pub fn tokenize(line: &str) -> Result<Vec<Token>, String> {
    let mut lexer = Token::lexer(line);
    let mut tokens = Vec::new();
    while let Some(result) = lexer.next() {
        match result {
            Ok(token) => tokens.push(token),
            Err(LexerError::InvalidToken) => {
                return Err(format!(
                    "invalid character: {}",
                    lexer.slice().escape_default()
                ));
            }
            Err(LexerError::NumberTooLarge) => {
                return Err(format!("number {} is too large", lexer.slice()));
            }
        }
    }
    Ok(tokens)
}

//===========================================================================//

#[cfg(test)]
mod tests {
    use super::{Token, tokenize};

    fn word(text: &str) -> Token {
        Token::Word(text.to_string())
    }

    #[test]
    fn empty_line() {
        assert_eq!(tokenize(""), Ok(vec![]));
        assert_eq!(tokenize("   \t"), Ok(vec![]));
    }

    #[test]
    fn comment() {
        assert_eq!(tokenize("# step cpu 4"), Ok(vec![]));
        assert_eq!(tokenize("regs # show all"), Ok(vec![word("regs")]));
    }

    #[test]
    fn numbers_are_hex() {
        assert_eq!(
            tokenize("break cpu 00801a $ff"),
            Ok(vec![
                word("break"),
                word("cpu"),
                Token::Number(0x801a),
                Token::Number(0xff),
            ])
        );
    }

    #[test]
    fn assignment() {
        assert_eq!(
            tokenize("set spc A=3f"),
            Ok(vec![
                word("set"),
                word("spc"),
                word("A"),
                Token::Equals,
                Token::Number(0x3f),
            ])
        );
    }

    #[test]
    fn hex_words() {
        assert_eq!(word("ff").hex_value(), Some(0xff));
        assert_eq!(word("A").hex_value(), Some(0xa));
        assert_eq!(word("cpu").hex_value(), None);
        assert_eq!(Token::Number(12).hex_value(), Some(12));
        assert_eq!(Token::Equals.hex_value(), None);
    }

    #[test]
    fn invalid_character() {
        assert_eq!(
            tokenize("write cpu 7e0000 <- 1"),
            Err("invalid character: <".to_string())
        );
    }

    #[test]
    fn number_too_large() {
        assert_eq!(
            tokenize("run 123456789"),
            Err("number 123456789 is too large".to_string())
        );
    }
}

//===========================================================================//
