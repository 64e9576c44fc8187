use std::fmt;

/// Tokens of a filter expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// `-` at the start of a token
    Not,
    /// `|`
    Or,
    LParen,
    RParen,
    /// A term with its quote characters removed
    Word {
        text: String,
        /// Byte offset in `text` where the first quoted run began
        quoted_from: Option<usize>,
    },
}

impl Token {
    pub fn word(text: &str) -> Self {
        Token::Word { text: text.to_string(), quoted_from: None }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Not => write!(f, "-"),
            Token::Or => write!(f, "|"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Word { text, .. } => write!(f, "{}", text),
        }
    }
}

pub struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
        }
    }

    /// Tokenize the entire input
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        while let Some(tok) = self.next_token() {
            tokens.push(tok);
        }
        tokens
    }

    fn skip_whitespace(&mut self) {
        while let Some(&c) = self.chars.peek() {
            if c.is_whitespace() {
                self.chars.next();
            } else {
                break;
            }
        }
    }

    /// Next token, or `None` at end of input
    pub fn next_token(&mut self) -> Option<Token> {
        self.skip_whitespace();

        let token = match self.chars.peek()? {
            '-' => Token::Not,
            '|' => Token::Or,
            '(' => Token::LParen,
            ')' => Token::RParen,
            _ => return Some(self.read_word()),
        };
        self.chars.next();
        Some(token)
    }

    // A word runs until whitespace, a paren or a pipe outside quotes.
    // An unterminated quote swallows the rest of the input.
    fn read_word(&mut self) -> Token {
        let mut text = String::new();
        let mut quoted_from = None;
        let mut in_quote = false;

        while let Some(&ch) = self.chars.peek() {
            if ch == '"' {
                in_quote = !in_quote;
                if in_quote && quoted_from.is_none() {
                    quoted_from = Some(text.len());
                }
                self.chars.next();
                continue;
            }
            if !in_quote && (ch.is_whitespace() || matches!(ch, '(' | ')' | '|')) {
                break;
            }
            text.push(ch);
            self.chars.next();
        }

        Token::Word { text, quoted_from }
    }
}
