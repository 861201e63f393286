use std::iter::Peekable;
use std::str::CharIndices;

use super::tokens::{Token, Span, TokenKind, BinOpToken, Literal};
use super::{Error, Position};
use TokenKind::*;
use BinOpToken::*;

pub struct Lexer<'a> {
    text: &'a str,
    it: Peekable<CharIndices<'a>>,
    line: usize, // current source line, used for error reporting by Tokens
    col: usize,  // current source column, used for error reporting by Tokens
}

impl<'a> Lexer<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            it: text.char_indices().peekable(),
            line: 1,
            col: 1,
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token<'a>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let (offset, c) = loop {
            let (offset, c) = self.next_char()?;
            if !c.is_whitespace() {
                break (offset, c);
            }
            self.col += 1;
        };
        let new_token = match c {
            '(' => Ok(Token { span: Span::new(self.line, self.col, 1), kind: OpenParenthesis }),
            ')' => Ok(Token { span: Span::new(self.line, self.col, 1), kind: CloseParenthesis }),
            ':' => Ok(Token { span: Span::new(self.line, self.col, 1), kind: Colon }),
            '?' => Ok(Token { span: Span::new(self.line, self.col, 1), kind: QuestionMark }),
            '-' => Ok(Token { span: Span::new(self.line, self.col, 1), kind: BinOp(Minus) }),
            '=' => Ok(Token { span: Span::new(self.line, self.col, 1), kind: BinOp(Equals) }),
            c if c.is_alphabetic() || c == '_' => self.identifier(offset),
            c if c.is_ascii_digit() => self.number(offset),
            _ => Err(Error::new(Position::Span(Span::new(self.line, self.col, 1)), "Unexpected character.")),
        };
        match &new_token {
            Ok(t) => self.col += t.span.len,
            Err(_) => self.col += 1,
        }
        Some(new_token)
    }
}

impl<'a> Lexer<'a> {
    fn next_char(&mut self) -> Option<(usize, char)> {
        loop {
            match self.it.next()? {
                (_, '\n') => {
                    self.col = 1;
                    self.line += 1;
                }
                (_, ';') => while self.it.next_if(|(_, c)| *c != '\n').is_some() {},
                c => return Some(c),
            }
        }
    }

    fn slice_from(&mut self, offset: usize) -> &'a str {
        if let Some((end, _)) = self.it.peek() {
            &self.text[offset..*end]
        } else {
            &self.text[offset..]
        }
    }

    fn number(&mut self, offset: usize) -> Result<Token<'a>, Error> {
        let mut contains_dot = false;
        let mut len = 1;
        while let Some((_, c)) = self.it.next_if(|(_, c)| c.is_ascii_digit() || *c == '.') {
            len += 1;
            if c == '.' {
                contains_dot = true;
            }
        }
        let slice = self.slice_from(offset);
        let span = Span::new(self.line, self.col, len);
        if contains_dot {
            slice.parse::<f64>()
                .map(|literal| Token { span, kind: Literal(Literal::F(literal)) })
                .map_err(|_| Error::new(Position::Span(span), "Unable to parse float."))
        } else {
            slice.parse::<i64>()
                .map(|literal| Token { span, kind: Literal(Literal::I(literal)) })
                .map_err(|_| Error::new(Position::Span(span), "Unable to parse integer."))
        }
    }

    fn identifier(&mut self, offset: usize) -> Result<Token<'a>, Error> {
        let mut len = 1;
        while self.it.next_if(|(_, c)| c.is_alphanumeric() || *c == '_' || *c == '-').is_some() {
            len += 1;
        }
        let slice = self.slice_from(offset);
        let span = Span::new(self.line, self.col, len);
        let kind = if slice.eq_ignore_ascii_case("and") {
            BinOp(And)
        } else if slice.eq_ignore_ascii_case("or") {
            BinOp(Or)
        } else if slice.eq_ignore_ascii_case("not") {
            BinOp(Not)
        } else {
            Identifier(slice)
        };
        Ok(Token { span, kind })
    }
}
