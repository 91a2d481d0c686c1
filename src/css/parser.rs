//! Recursive descent CSS parser.
//!
//! Parses CSS text into a [`ParsedSheet`]: rule sets plus the `@keyframes`,
//! `@decorator` and `@spritesheet` at-rules. Uses the logos-based tokenizer
//! from [`crate::css::tokenizer`].

use logos::Logos;

use crate::css::model::*;
use crate::css::tokenizer::Token;

/// Errors from CSS parsing.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("unexpected token at line {line} (token {position}): {message}")]
    UnexpectedToken {
        position: usize,
        line: u32,
        message: String,
    },
    #[error("unexpected end of input: {0}")]
    UnexpectedEof(String),
}

/// A positioned token with byte-level span information for whitespace detection.
#[derive(Debug, Clone)]
struct PToken {
    token: Token,
    text: String,
    /// Index in the token stream (for error reporting).
    pos: usize,
    /// 1-based source line.
    line: u32,
    /// Byte offset where this token starts in the source.
    byte_start: usize,
    /// Byte offset where this token ends in the source.
    byte_end: usize,
}

/// Strip CSS block comments (`/* ... */`) from the input, replacing each
/// comment with a single space followed by the newlines it contained, so
/// line numbers survive.
fn strip_comments(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("/*") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let (comment, remainder) = match after.find("*/") {
            Some(end) => (&after[..end], &after[end + 2..]),
            // Unterminated comment: consume the rest of the input.
            None => (after, ""),
        };
        result.push(' ');
        result.extend(comment.chars().filter(|&c| c == '\n'));
        rest = remainder;
    }
    result.push_str(rest);

    result
}

/// Tokenize input using logos with span and line information preserved.
fn tokenize_with_spans(input: &str) -> Vec<PToken> {
    let line_starts: Vec<usize> = std::iter::once(0)
        .chain(input.match_indices('\n').map(|(i, _)| i + 1))
        .collect();
    let line_of = |offset: usize| line_starts.partition_point(|&start| start <= offset) as u32;

    let lexer = Token::lexer(input);
    let mut tokens = Vec::new();

    for (result, span) in lexer.spanned() {
        if let Ok(token) = result {
            tokens.push(PToken {
                text: input[span.clone()].to_string(),
                token,
                pos: tokens.len(),
                line: line_of(span.start),
                byte_start: span.start,
                byte_end: span.end,
            });
        }
    }

    tokens
}

/// Parse a CSS string into a [`ParsedSheet`].
pub fn parse_css(input: &str) -> Result<ParsedSheet, ParseError> {
    let cleaned = strip_comments(input);
    let tokens = tokenize_with_spans(&cleaned);

    let mut parser = Parser {
        source: &cleaned,
        tokens,
        cursor: 0,
    };

    let mut sheet = ParsedSheet::new();
    while !parser.is_eof() {
        if parser.peek().is_some_and(|t| t.token == Token::AtKeyword) {
            parser.parse_at_rule(&mut sheet)?;
        } else {
            sheet.rules.push(parser.parse_rule()?);
        }
    }

    Ok(sheet)
}

/// Parse a bare value list such as `1px solid #f00` (no property name, no
/// terminator). Used for instancer properties stored as raw text.
pub fn parse_values(input: &str) -> Result<Vec<DeclarationValue>, ParseError> {
    let cleaned = strip_comments(input);
    let tokens = tokenize_with_spans(&cleaned);

    let mut parser = Parser {
        source: &cleaned,
        tokens,
        cursor: 0,
    };

    let mut values = Vec::new();
    while !parser.is_eof() {
        values.push(parser.parse_declaration_value()?);
    }
    Ok(values)
}

/// Recursive descent parser state.
struct Parser<'a> {
    source: &'a str,
    tokens: Vec<PToken>,
    cursor: usize,
}

impl Parser<'_> {
    fn is_eof(&self) -> bool {
        self.cursor >= self.tokens.len()
    }

    fn peek(&self) -> Option<&PToken> {
        self.tokens.get(self.cursor)
    }

    fn peek_is(&self, token: &Token) -> bool {
        self.peek().is_some_and(|t| &t.token == token)
    }

    fn advance(&mut self) -> Option<&PToken> {
        if self.cursor < self.tokens.len() {
            let tok = &self.tokens[self.cursor];
            self.cursor += 1;
            Some(tok)
        } else {
            None
        }
    }

    fn expect(&mut self, expected: &Token) -> Result<PToken, ParseError> {
        match self.advance() {
            Some(tok) if &tok.token == expected => Ok(tok.clone()),
            Some(tok) => Err(unexpected(
                tok,
                format!("expected {:?}, got {:?} '{}'", expected, tok.token, tok.text),
            )),
            None => Err(ParseError::UnexpectedEof(format!("expected {:?}", expected))),
        }
    }

    fn expect_ident(&mut self, what: &str) -> Result<PToken, ParseError> {
        match self.advance() {
            Some(tok) if tok.token == Token::Ident => Ok(tok.clone()),
            Some(tok) => Err(unexpected(
                tok,
                format!("expected {what}, got {:?} '{}'", tok.token, tok.text),
            )),
            None => Err(ParseError::UnexpectedEof(format!("expected {what}"))),
        }
    }

    fn error_here(&self, message: impl Into<String>) -> ParseError {
        match self.peek() {
            Some(tok) => unexpected(tok, message.into()),
            None => ParseError::UnexpectedEof(message.into()),
        }
    }

    fn current_line(&self) -> u32 {
        self.peek()
            .or_else(|| self.tokens.last())
            .map(|t| t.line)
            .unwrap_or(1)
    }

    /// Returns `true` if the current token is immediately adjacent (no whitespace)
    /// to the previous token.
    fn is_adjacent(&self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        let prev = &self.tokens[self.cursor - 1];
        match self.peek() {
            Some(curr) => curr.byte_start == prev.byte_end,
            None => false,
        }
    }

    // ── Rule sets ────────────────────────────────────────────────────

    /// Parse a single CSS rule: selector(s) `{` declarations `}`.
    fn parse_rule(&mut self) -> Result<RuleSet, ParseError> {
        let line = self.current_line();
        let selectors = self.parse_selector_list()?;
        let declarations = self.parse_block()?;

        Ok(RuleSet {
            selectors,
            declarations,
            line,
        })
    }

    /// Parse `{` declarations `}`.
    fn parse_block(&mut self) -> Result<Vec<Declaration>, ParseError> {
        self.expect(&Token::BraceOpen)?;
        let declarations = self.parse_declarations()?;
        self.expect(&Token::BraceClose)?;
        Ok(declarations)
    }

    /// Parse a comma-separated list of selectors (before `{`).
    fn parse_selector_list(&mut self) -> Result<Vec<Selector>, ParseError> {
        let mut selectors = vec![self.parse_selector()?];

        while self.peek_is(&Token::Comma) {
            self.advance();
            selectors.push(self.parse_selector()?);
        }

        Ok(selectors)
    }

    /// Parse a single selector: a sequence of compound selectors with combinators.
    ///
    /// A selector like `div > p.note:hover` becomes parts:
    /// - SelectorPart::Compound([Type("div")])
    /// - SelectorPart::Combinator(Child)
    /// - SelectorPart::Compound([Type("p"), Class("note"), PseudoClass("hover")])
    fn parse_selector(&mut self) -> Result<Selector, ParseError> {
        let mut parts = vec![SelectorPart::Compound(self.parse_compound_selector()?)];

        loop {
            let explicit = match self.peek().map(|t| &t.token) {
                Some(Token::GreaterThan) => Some(Combinator::Child),
                Some(Token::Plus) => Some(Combinator::AdjacentSibling),
                Some(Token::Tilde) => Some(Combinator::GeneralSibling),
                _ => None,
            };

            if let Some(combinator) = explicit {
                self.advance();
                parts.push(SelectorPart::Combinator(combinator));
                parts.push(SelectorPart::Compound(self.parse_compound_selector()?));
                continue;
            }

            // A selector-starting token that was not swallowed by the previous
            // compound must be separated by whitespace: descendant combinator.
            match self.peek() {
                Some(t)
                    if matches!(
                        t.token,
                        Token::Ident
                            | Token::Hash
                            | Token::HexColor
                            | Token::Dot
                            | Token::Star
                            | Token::PseudoClass
                    ) =>
                {
                    parts.push(SelectorPart::Combinator(Combinator::Descendant));
                    parts.push(SelectorPart::Compound(self.parse_compound_selector()?));
                }
                _ => break,
            }
        }

        Ok(Selector { parts })
    }

    /// Parse a compound selector: a sequence of simple selector components with
    /// no whitespace between them, e.g. `button.primary:hover`.
    ///
    /// `.class`, `#id`, and `:pseudo` are only appended to the current compound
    /// if they appear immediately after the previous token (no whitespace gap).
    fn parse_compound_selector(&mut self) -> Result<CompoundSelector, ParseError> {
        let mut components = Vec::new();

        match self.peek().map(|t| t.token.clone()) {
            Some(Token::Ident) => {
                let name = self.advance().map(|t| t.text.clone()).unwrap_or_default();
                components.push(SelectorComponent::Type(name));
            }
            Some(Token::Star) => {
                self.advance();
                components.push(SelectorComponent::Universal);
            }
            Some(_) => match self.parse_qualifier_component()? {
                Some(component) => components.push(component),
                None => return Err(self.error_here("expected selector part")),
            },
            None => return Err(self.error_here("expected selector part")),
        }

        while self.is_adjacent() {
            match self.parse_qualifier_component()? {
                Some(component) => components.push(component),
                None => break,
            }
        }

        Ok(CompoundSelector { components })
    }

    /// Parse one `.class`, `#id` or `:pseudo` component, or return `None`
    /// without consuming anything if the next token starts none of those.
    fn parse_qualifier_component(&mut self) -> Result<Option<SelectorComponent>, ParseError> {
        let Some(tok) = self.peek().cloned() else {
            return Ok(None);
        };

        let component = match tok.token {
            Token::Dot => {
                self.advance();
                let name = self.expect_ident("class name after '.'")?;
                SelectorComponent::Class(name.text)
            }
            Token::Hash => {
                self.advance();
                let name = self.expect_ident("id name after '#'")?;
                SelectorComponent::Id(name.text)
            }
            // `#add`, `#cafe`: an id that happens to be valid hex.
            Token::HexColor => {
                self.advance();
                SelectorComponent::Id(tok.text[1..].to_string())
            }
            Token::PseudoClass => {
                self.advance();
                SelectorComponent::PseudoClass(tok.text[1..].to_string())
            }
            _ => return Ok(None),
        };

        Ok(Some(component))
    }

    // ── Declarations ─────────────────────────────────────────────────

    /// Parse declarations up to (not including) the closing `}`.
    fn parse_declarations(&mut self) -> Result<Vec<Declaration>, ParseError> {
        let mut declarations = Vec::new();

        while self.peek().is_some_and(|t| t.token != Token::BraceClose) {
            if self.peek_is(&Token::Semicolon) {
                self.advance();
                continue;
            }
            declarations.push(self.parse_declaration()?);
        }

        Ok(declarations)
    }

    /// Parse a single declaration: `property: value1 value2 [!important];`
    fn parse_declaration(&mut self) -> Result<Declaration, ParseError> {
        let prop_tok = self.expect_ident("property name")?;
        let property = prop_tok.text.clone();

        let mut values = Vec::new();
        let mut raw_start = None;
        let mut raw_end = 0;

        // `color:red` lexes as Ident + PseudoClass; treat it as colon + ident.
        match self.peek().cloned() {
            Some(tok) if tok.token == Token::PseudoClass && tok.byte_start == prop_tok.byte_end => {
                self.advance();
                values.push(DeclarationValue::Ident(tok.text[1..].to_string()));
                raw_start = Some(tok.byte_start + 1);
                raw_end = tok.byte_end;
            }
            _ => {
                self.expect(&Token::Colon)?;
            }
        }

        let mut important = false;

        loop {
            match self.peek().map(|t| &t.token) {
                None | Some(Token::Semicolon) | Some(Token::BraceClose) => break,
                Some(Token::Important) => {
                    self.advance();
                    important = true;
                    break;
                }
                Some(_) => {
                    let start = self.peek().map(|t| t.byte_start).unwrap_or(0);
                    raw_start.get_or_insert(start);
                    values.push(self.parse_declaration_value()?);
                    raw_end = self.tokens[self.cursor - 1].byte_end;
                }
            }
        }

        if self.peek_is(&Token::Semicolon) {
            self.advance();
        }

        let raw = match raw_start {
            Some(start) if raw_end > start => self.source[start..raw_end].trim().to_string(),
            _ => String::new(),
        };

        Ok(Declaration {
            property,
            values,
            raw,
            important,
            line: prop_tok.line,
        })
    }

    /// Parse a single declaration value token into a [`DeclarationValue`].
    fn parse_declaration_value(&mut self) -> Result<DeclarationValue, ParseError> {
        let tok = self
            .advance()
            .cloned()
            .ok_or_else(|| ParseError::UnexpectedEof("expected declaration value".into()))?;

        match &tok.token {
            Token::Number => {
                let n: f32 = tok
                    .text
                    .parse()
                    .map_err(|_| unexpected(&tok, format!("invalid number: {}", tok.text)))?;
                Ok(DeclarationValue::Number(n))
            }
            Token::Dimension => {
                let (num_str, unit_str) = split_dimension(&tok.text)
                    .ok_or_else(|| unexpected(&tok, format!("invalid dimension: {}", tok.text)))?;
                let n: f32 = num_str.parse().map_err(|_| {
                    unexpected(&tok, format!("invalid number in dimension: {num_str}"))
                })?;
                Ok(DeclarationValue::Dimension(n, unit_str.to_string()))
            }
            Token::Ident => {
                if self.peek_is(&Token::ParenOpen) && self.is_adjacent() {
                    self.advance();
                    let args = self.parse_function_arguments()?;
                    Ok(DeclarationValue::Function(tok.text.clone(), args))
                } else {
                    Ok(DeclarationValue::Ident(tok.text.clone()))
                }
            }
            Token::HexColor => {
                let hex = tok.text.strip_prefix('#').unwrap_or(&tok.text);
                Ok(DeclarationValue::Color(hex.to_string()))
            }
            Token::StringLiteral | Token::StringLiteralSingle => {
                let inner = &tok.text[1..tok.text.len() - 1];
                Ok(DeclarationValue::String(inner.to_string()))
            }
            Token::Comma => Ok(DeclarationValue::Comma),
            Token::Dot
            | Token::Hash
            | Token::Star
            | Token::GreaterThan
            | Token::Plus
            | Token::Tilde
            | Token::Slash
            | Token::Colon
            | Token::PseudoClass
            | Token::ParenOpen
            | Token::ParenClose => Ok(DeclarationValue::Delim(tok.text.clone())),
            other => Err(unexpected(
                &tok,
                format!("unexpected token in declaration value: {:?} '{}'", other, tok.text),
            )),
        }
    }

    /// Parse arguments after `name(` up to and including the closing `)`.
    fn parse_function_arguments(&mut self) -> Result<Vec<DeclarationValue>, ParseError> {
        let mut args = Vec::new();
        loop {
            match self.peek().map(|t| &t.token) {
                Some(Token::ParenClose) => {
                    self.advance();
                    return Ok(args);
                }
                None | Some(Token::Semicolon) | Some(Token::BraceClose) => {
                    return Err(self.error_here("unterminated function arguments"));
                }
                Some(_) => args.push(self.parse_declaration_value()?),
            }
        }
    }

    // ── At-rules ─────────────────────────────────────────────────────

    fn parse_at_rule(&mut self, sheet: &mut ParsedSheet) -> Result<(), ParseError> {
        let keyword = self.expect(&Token::AtKeyword)?;

        match &keyword.text[1..] {
            "keyframes" => {
                let rule = self.parse_keyframes(keyword.line)?;
                sheet.keyframes.push(rule);
            }
            "decorator" => {
                let rule = self.parse_decorator(keyword.line)?;
                sheet.decorators.push(rule);
            }
            "spritesheet" => {
                let name = self.expect_ident("spritesheet name")?;
                let declarations = self.parse_block()?;
                sheet.spritesheets.push(SpritesheetRule {
                    name: name.text,
                    declarations,
                    line: keyword.line,
                });
            }
            other => {
                tracing::warn!(
                    "skipping unsupported at-rule '@{}' at line {}",
                    other,
                    keyword.line
                );
                self.skip_at_rule()?;
            }
        }

        Ok(())
    }

    /// `@keyframes name { from { ... } 50%, 75% { ... } to { ... } }`
    fn parse_keyframes(&mut self, line: u32) -> Result<KeyframesRule, ParseError> {
        let name = self.expect_ident("keyframes name")?;
        self.expect(&Token::BraceOpen)?;

        let mut blocks = Vec::new();
        while !self.peek_is(&Token::BraceClose) {
            let block_line = self.current_line();
            let mut times = vec![self.parse_keyframe_time()?];
            while self.peek_is(&Token::Comma) {
                self.advance();
                times.push(self.parse_keyframe_time()?);
            }
            let declarations = self.parse_block()?;
            blocks.push(KeyframeRuleBlock {
                times,
                declarations,
                line: block_line,
            });
        }
        self.expect(&Token::BraceClose)?;

        Ok(KeyframesRule {
            name: name.text,
            blocks,
            line,
        })
    }

    fn parse_keyframe_time(&mut self) -> Result<f32, ParseError> {
        let tok = self
            .advance()
            .cloned()
            .ok_or_else(|| ParseError::UnexpectedEof("expected keyframe selector".into()))?;

        let time = match tok.token {
            Token::Ident if tok.text == "from" => Some(0.0),
            Token::Ident if tok.text == "to" => Some(1.0),
            Token::Dimension => split_dimension(&tok.text)
                .filter(|(_, unit)| *unit == "%")
                .and_then(|(n, _)| n.parse::<f32>().ok())
                .map(|percent| percent / 100.0),
            Token::Number => tok.text.parse::<f32>().ok().filter(|n| *n == 0.0),
            _ => None,
        };

        match time {
            Some(t) if (0.0..=1.0).contains(&t) => Ok(t),
            _ => Err(unexpected(
                &tok,
                format!("invalid keyframe selector '{}'", tok.text),
            )),
        }
    }

    /// `@decorator name : type { ... }`
    fn parse_decorator(&mut self, line: u32) -> Result<DecoratorRule, ParseError> {
        let name = self.expect_ident("decorator name")?;

        let decorator_type = match self.peek().cloned() {
            // `name:type` without spaces lexes as a pseudo-class.
            Some(tok) if tok.token == Token::PseudoClass => {
                self.advance();
                tok.text[1..].to_string()
            }
            _ => {
                self.expect(&Token::Colon)?;
                self.expect_ident("decorator type")?.text
            }
        };

        let declarations = self.parse_block()?;

        Ok(DecoratorRule {
            name: name.text,
            decorator_type,
            declarations,
            line,
        })
    }

    /// Skip an unknown at-rule: everything up to a top-level `;` or through a
    /// balanced `{ ... }` block.
    fn skip_at_rule(&mut self) -> Result<(), ParseError> {
        let mut depth = 0usize;
        while let Some(tok) = self.advance() {
            match tok.token {
                Token::Semicolon if depth == 0 => return Ok(()),
                Token::BraceOpen => depth += 1,
                Token::BraceClose => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return Ok(());
                    }
                }
                _ => {}
            }
        }
        Err(ParseError::UnexpectedEof("unterminated at-rule".into()))
    }
}

fn unexpected(tok: &PToken, message: String) -> ParseError {
    ParseError::UnexpectedToken {
        position: tok.pos,
        line: tok.line,
        message,
    }
}

/// Split a dimension string like "50%" or "10px" into (number_part, unit_part).
pub(crate) fn split_dimension(s: &str) -> Option<(&str, &str)> {
    let unit_start = s
        .char_indices()
        .find(|(i, c)| !c.is_ascii_digit() && *c != '.' && !(*c == '-' && *i == 0))
        .map(|(i, _)| i)?;

    if unit_start == 0 || unit_start >= s.len() {
        return None;
    }

    Some((&s[..unit_start], &s[unit_start..]))
}
