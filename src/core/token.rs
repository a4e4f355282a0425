use crate::core::number::parse_radix_digits;
use crate::unicode::push_code_point;
use crate::{JSError, raise_syntax_error};

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    StringLit(Vec<u16>),
    /// Template chunk. `cooked` is `None` when the chunk holds an invalid escape
    /// (only legal in tagged templates). `tail` is false when the chunk ends with `${`.
    Template {
        cooked: Option<Vec<u16>>,
        raw: String,
        tail: bool,
    },
    /// Regex literal with pattern and flags (e.g. /pattern/flags)
    Regex(String, String),
    Identifier(String),
    Plus,
    Minus,
    Multiply,
    /// Exponentiation operator `**`
    Exponent,
    Divide,
    Mod,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Colon,
    Dot,
    Comma,
    Semicolon,
    Var,
    Const,
    Class,
    Extends,
    Super,
    This,
    New,
    InstanceOf,
    TypeOf,
    In,
    Delete,
    Void,
    Function,
    Return,
    If,
    Else,
    For,
    While,
    Do,
    Switch,
    Case,
    Default,
    Break,
    Continue,
    Try,
    Catch,
    Finally,
    Throw,
    With,
    Debugger,
    Null,
    True,
    False,
    Enum,
    Export,
    Import,
    Assign,
    Equal,
    StrictEqual,
    NotEqual,
    StrictNotEqual,
    LessThan,
    GreaterThan,
    LessEqual,
    GreaterEqual,
    Arrow,
    Spread,
    OptionalChain,
    QuestionMark,
    NullishCoalescing,
    LogicalNot,
    LogicalAnd,
    LogicalOr,
    BitAnd,
    BitOr,
    BitXor,
    BitNot,
    LeftShift,
    RightShift,
    UnsignedRightShift,
    LogicalAndAssign,
    LogicalOrAssign,
    NullishAssign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
    /// Exponentiation assignment (`**=`)
    PowAssign,
    BitAndAssign,
    BitOrAssign,
    BitXorAssign,
    LeftShiftAssign,
    RightShiftAssign,
    UnsignedRightShiftAssign,
    Increment,
    Decrement,
    EOF,
}

impl Token {
    /// Get the string representation of a token that can be used as a property name.
    pub fn as_identifier_string(&self) -> Option<String> {
        let s = match self {
            Token::Identifier(s) => return Some(s.clone()),
            Token::Var => "var",
            Token::Const => "const",
            Token::Class => "class",
            Token::Extends => "extends",
            Token::Super => "super",
            Token::This => "this",
            Token::New => "new",
            Token::InstanceOf => "instanceof",
            Token::TypeOf => "typeof",
            Token::In => "in",
            Token::Delete => "delete",
            Token::Void => "void",
            Token::Function => "function",
            Token::Return => "return",
            Token::If => "if",
            Token::Else => "else",
            Token::For => "for",
            Token::While => "while",
            Token::Do => "do",
            Token::Switch => "switch",
            Token::Case => "case",
            Token::Default => "default",
            Token::Break => "break",
            Token::Continue => "continue",
            Token::Try => "try",
            Token::Catch => "catch",
            Token::Finally => "finally",
            Token::Throw => "throw",
            Token::With => "with",
            Token::Debugger => "debugger",
            Token::Null => "null",
            Token::True => "true",
            Token::False => "false",
            Token::Enum => "enum",
            Token::Export => "export",
            Token::Import => "import",
            _ => return None,
        };
        Some(s.to_string())
    }

    pub fn is_assignment_operator(&self) -> bool {
        matches!(
            self,
            Token::Assign
                | Token::AddAssign
                | Token::SubAssign
                | Token::MulAssign
                | Token::DivAssign
                | Token::ModAssign
                | Token::PowAssign
                | Token::BitAndAssign
                | Token::BitOrAssign
                | Token::BitXorAssign
                | Token::LeftShiftAssign
                | Token::RightShiftAssign
                | Token::UnsignedRightShiftAssign
                | Token::LogicalAndAssign
                | Token::LogicalOrAssign
                | Token::NullishAssign
        )
    }
}

fn keyword(word: &str) -> Option<Token> {
    Some(match word {
        "var" => Token::Var,
        "const" => Token::Const,
        "class" => Token::Class,
        "extends" => Token::Extends,
        "super" => Token::Super,
        "this" => Token::This,
        "new" => Token::New,
        "instanceof" => Token::InstanceOf,
        "typeof" => Token::TypeOf,
        "in" => Token::In,
        "delete" => Token::Delete,
        "void" => Token::Void,
        "function" => Token::Function,
        "return" => Token::Return,
        "if" => Token::If,
        "else" => Token::Else,
        "for" => Token::For,
        "while" => Token::While,
        "do" => Token::Do,
        "switch" => Token::Switch,
        "case" => Token::Case,
        "default" => Token::Default,
        "break" => Token::Break,
        "continue" => Token::Continue,
        "try" => Token::Try,
        "catch" => Token::Catch,
        "finally" => Token::Finally,
        "throw" => Token::Throw,
        "with" => Token::With,
        "debugger" => Token::Debugger,
        "null" => Token::Null,
        "true" => Token::True,
        "false" => Token::False,
        "enum" => Token::Enum,
        "export" => Token::Export,
        "import" => Token::Import,
        _ => return None,
    })
}

/// A token with its source position.
#[derive(Debug, Clone)]
pub struct TokenData {
    pub token: Token,
    pub line: usize,
    pub column: usize,
    /// Char offsets of the token in the source.
    pub start: usize,
    pub end: usize,
    /// A line terminator appeared between the previous token and this one.
    pub newline_before: bool,
    /// String or number literal used a legacy octal form (`"\07"`, `017`).
    pub legacy_octal: bool,
    /// Identifier was written with a `\u` escape.
    pub escaped: bool,
}

/// On-demand tokenizer. The parser pulls tokens with [`Lexer::next_token`] and asks
/// for a rescan where a `/` or `}` means something else in its context.
#[derive(Clone)]
pub struct Lexer<'a> {
    chars: std::rc::Rc<Vec<char>>,
    source: &'a str,
    pos: usize,
    line: usize,
    col: usize,
}

fn is_id_start(c: char) -> bool {
    c == '$' || c == '_' || unicode_ident::is_xid_start(c)
}

fn is_id_continue(c: char) -> bool {
    c == '$' || c == '_' || c == '\u{200C}' || c == '\u{200D}' || unicode_ident::is_xid_continue(c)
}

fn is_whitespace(c: char) -> bool {
    matches!(c, '\t' | '\u{0B}' | '\u{0C}' | ' ' | '\u{A0}' | '\u{FEFF}') || (c as u32 > 0x7f && c.is_whitespace() && !is_newline(c))
}

fn is_newline(c: char) -> bool {
    crate::unicode::is_line_terminator(c)
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Lexer {
            chars: std::rc::Rc::new(source.chars().collect()),
            source,
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    /// Source text between two char offsets.
    pub fn slice(&self, start: usize, end: usize) -> String {
        let end = end.min(self.chars.len());
        if start >= end {
            return String::new();
        }
        self.chars[start..end].iter().collect()
    }

    fn peek_char(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.chars.get(self.pos + n).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.chars.get(self.pos).copied()?;
        self.pos += 1;
        if c == '\n' || c == '\u{2028}' || c == '\u{2029}' || (c == '\r' && self.peek_char() != Some('\n')) {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    fn error(&self, msg: &str) -> JSError {
        let mut e = raise_syntax_error!(msg);
        e.set_js_location(self.line, self.col);
        e
    }

    /// Skips whitespace and comments, reporting whether a line terminator was crossed.
    fn skip_trivia(&mut self) -> Result<bool, JSError> {
        let mut newline = false;
        loop {
            match self.peek_char() {
                Some(c) if is_newline(c) => {
                    newline = true;
                    self.advance();
                }
                Some(c) if is_whitespace(c) => {
                    self.advance();
                }
                Some('/') if self.peek_at(1) == Some('/') => {
                    while let Some(c) = self.peek_char() {
                        if is_newline(c) {
                            break;
                        }
                        self.advance();
                    }
                }
                Some('/') if self.peek_at(1) == Some('*') => {
                    self.advance();
                    self.advance();
                    loop {
                        match self.advance() {
                            Some('*') if self.peek_char() == Some('/') => {
                                self.advance();
                                break;
                            }
                            Some(c) if is_newline(c) => newline = true,
                            Some(_) => {}
                            None => return Err(self.error("Unterminated comment")),
                        }
                    }
                }
                Some('#') if self.pos == 0 && self.peek_at(1) == Some('!') => {
                    while let Some(c) = self.peek_char() {
                        if is_newline(c) {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => return Ok(newline),
            }
        }
    }

    /// Produces the next token; `/` is always lexed as a divide punctuator here.
    pub fn next_token(&mut self) -> Result<TokenData, JSError> {
        let newline_before = self.skip_trivia()?;
        let (line, column, start) = (self.line, self.col, self.pos);
        let mut legacy_octal = false;
        let mut escaped = false;
        let token = match self.peek_char() {
            None => Token::EOF,
            Some(c) if c.is_ascii_digit() || (c == '.' && self.peek_at(1).is_some_and(|d| d.is_ascii_digit())) => {
                let (n, octal) = self.scan_number()?;
                legacy_octal = octal;
                Token::Number(n)
            }
            Some(q @ ('"' | '\'')) => {
                self.advance();
                let (s, octal) = self.scan_string(q)?;
                legacy_octal = octal;
                Token::StringLit(s)
            }
            Some('`') => {
                self.advance();
                self.scan_template_chunk()?
            }
            Some(c) if is_id_start(c) || c == '\\' => {
                let (word, had_escape) = self.scan_identifier_name()?;
                escaped = had_escape;
                match keyword(&word) {
                    Some(kw) if !had_escape => kw,
                    _ => Token::Identifier(word),
                }
            }
            Some(_) => self.scan_punctuator()?,
        };
        log::trace!("token {:?} at {}:{}", token, line, column);
        Ok(TokenData {
            token,
            line,
            column,
            start,
            end: self.pos,
            newline_before,
            legacy_octal,
            escaped,
        })
    }

    fn scan_identifier_name(&mut self) -> Result<(String, bool), JSError> {
        let mut word = String::new();
        let mut had_escape = false;
        let mut first = true;
        while let Some(c) = self.peek_char() {
            let ch = if c == '\\' {
                self.advance();
                if self.advance() != Some('u') {
                    return Err(self.error("Invalid Unicode escape sequence in identifier"));
                }
                had_escape = true;
                let cp = self.scan_unicode_escape_body()?;
                char::from_u32(cp).ok_or_else(|| self.error("Invalid Unicode escape sequence in identifier"))?
            } else {
                c
            };
            let ok = if first { is_id_start(ch) } else { is_id_continue(ch) };
            if !ok {
                if c == '\\' {
                    return Err(self.error("Invalid identifier character"));
                }
                break;
            }
            if c != '\\' {
                self.advance();
            }
            word.push(ch);
            first = false;
        }
        Ok((word, had_escape))
    }

    /// Parses the part of `\u` escape after the `u`: `XXXX` or `{X...}`.
    fn scan_unicode_escape_body(&mut self) -> Result<u32, JSError> {
        if self.peek_char() == Some('{') {
            self.advance();
            let mut value: u32 = 0;
            let mut digits = 0;
            loop {
                match self.advance() {
                    Some('}') if digits > 0 => break,
                    Some(c) if c.is_ascii_hexdigit() => {
                        value = value.saturating_mul(16).saturating_add(c.to_digit(16).unwrap_or(0));
                        digits += 1;
                        if value > 0x10FFFF {
                            return Err(self.error("Undefined Unicode code-point"));
                        }
                    }
                    _ => return Err(self.error("Invalid Unicode escape sequence")),
                }
            }
            Ok(value)
        } else {
            let mut value = 0;
            for _ in 0..4 {
                match self.advance() {
                    Some(c) if c.is_ascii_hexdigit() => value = value * 16 + c.to_digit(16).unwrap_or(0),
                    _ => return Err(self.error("Invalid Unicode escape sequence")),
                }
            }
            Ok(value)
        }
    }

    fn scan_number(&mut self) -> Result<(f64, bool), JSError> {
        let first = self.peek_char();
        let second = self.peek_at(1).map(|c| c.to_ascii_lowercase());
        if first == Some('0') && matches!(second, Some('x') | Some('o') | Some('b')) {
            self.advance();
            self.advance();
            let radix = match second {
                Some('x') => 16,
                Some('o') => 8,
                _ => 2,
            };
            let digits = self.scan_digits(radix)?;
            if digits.is_empty() {
                return Err(self.error("Invalid or unexpected token"));
            }
            self.check_after_number()?;
            return Ok((parse_radix_digits(&digits, radix), false));
        }
        if first == Some('0') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            // Legacy octal (017) or NonOctalDecimalIntegerLiteral (089).
            let mut text = String::new();
            while let Some(c) = self.peek_char() {
                if c.is_ascii_digit() {
                    text.push(c);
                    self.advance();
                } else {
                    break;
                }
            }
            if text.chars().all(|c| c < '8') {
                self.check_after_number()?;
                return Ok((parse_radix_digits(&text[1..], 8), true));
            }
            if self.peek_char() == Some('.') {
                self.advance();
                text.push('.');
                text.push_str(&self.scan_digits(10)?);
            }
            self.check_after_number()?;
            return Ok((text.parse::<f64>().unwrap_or(f64::NAN), true));
        }
        let mut text = self.scan_digits(10)?;
        if self.peek_char() == Some('.') {
            self.advance();
            text.push('.');
            text.push_str(&self.scan_digits(10)?);
        }
        if matches!(self.peek_char(), Some('e') | Some('E')) {
            let save = (self.pos, self.line, self.col);
            self.advance();
            let mut exp = String::from("e");
            if let Some(sign @ ('+' | '-')) = self.peek_char() {
                self.advance();
                exp.push(sign);
            }
            let digits = self.scan_digits(10)?;
            if digits.is_empty() {
                (self.pos, self.line, self.col) = save;
                return Err(self.error("Invalid or unexpected token"));
            }
            exp.push_str(&digits);
            text.push_str(&exp);
        }
        self.check_after_number()?;
        if text.starts_with('.') {
            text.insert(0, '0');
        }
        if text.ends_with('.') {
            text.push('0');
        }
        text.parse::<f64>().map(|n| (n, false)).map_err(|_| self.error("Invalid number literal"))
    }

    /// Digits of the given radix, with numeric separators removed.
    fn scan_digits(&mut self, radix: u32) -> Result<String, JSError> {
        let mut out = String::new();
        let mut last_sep = false;
        while let Some(c) = self.peek_char() {
            if c == '_' {
                if out.is_empty() || last_sep || !self.peek_at(1).is_some_and(|d| d.is_digit(radix)) {
                    return Err(self.error("Numeric separators are not allowed here"));
                }
                last_sep = true;
                self.advance();
            } else if c.is_digit(radix) {
                out.push(c);
                last_sep = false;
                self.advance();
            } else {
                break;
            }
        }
        Ok(out)
    }

    fn check_after_number(&self) -> Result<(), JSError> {
        match self.peek_char() {
            Some(c) if is_id_start(c) || c.is_ascii_digit() || c == '\\' => Err(self.error("Invalid or unexpected token")),
            _ => Ok(()),
        }
    }

    fn scan_string(&mut self, quote: char) -> Result<(Vec<u16>, bool), JSError> {
        let mut out = Vec::new();
        let mut legacy_octal = false;
        loop {
            match self.advance() {
                None => return Err(self.error("Invalid or unexpected token: unterminated string literal")),
                Some(c) if c == quote => break,
                Some('\n') | Some('\r') => return Err(self.error("Invalid or unexpected token: unterminated string literal")),
                Some('\\') => {
                    if let Some(octal) = self.scan_escape(&mut out, false)? {
                        legacy_octal |= octal;
                    }
                }
                Some(c) => push_code_point(&mut out, c as u32),
            }
        }
        Ok((out, legacy_octal))
    }

    /// Decodes one escape sequence after `\`. Returns `Some(true)` for legacy octal escapes.
    /// In templates, an invalid escape yields `Err` and the caller marks the chunk uncooked.
    fn scan_escape(&mut self, out: &mut Vec<u16>, template: bool) -> Result<Option<bool>, JSError> {
        let c = self.advance().ok_or_else(|| self.error("Invalid or unexpected token"))?;
        match c {
            'n' => out.push(0x0A),
            't' => out.push(0x09),
            'r' => out.push(0x0D),
            'b' => out.push(0x08),
            'f' => out.push(0x0C),
            'v' => out.push(0x0B),
            '\r' => {
                if self.peek_char() == Some('\n') {
                    self.advance();
                }
            }
            '\n' | '\u{2028}' | '\u{2029}' => {}
            'x' => {
                let mut v = 0u32;
                for _ in 0..2 {
                    match self.advance() {
                        Some(h) if h.is_ascii_hexdigit() => v = v * 16 + h.to_digit(16).unwrap_or(0),
                        _ => return Err(self.error("Invalid hexadecimal escape sequence")),
                    }
                }
                out.push(v as u16);
            }
            'u' => {
                let cp = self.scan_unicode_escape_body()?;
                push_code_point(out, cp);
            }
            '0' if !self.peek_char().is_some_and(|d| d.is_ascii_digit()) => out.push(0),
            '0'..='7' => {
                if template {
                    return Err(self.error("Octal escape sequences are not allowed in template strings"));
                }
                let mut v = c.to_digit(8).unwrap_or(0);
                let max_len = if c <= '3' { 3 } else { 2 };
                let mut len = 1;
                while len < max_len {
                    match self.peek_char() {
                        Some(d @ '0'..='7') => {
                            v = v * 8 + d.to_digit(8).unwrap_or(0);
                            self.advance();
                            len += 1;
                        }
                        _ => break,
                    }
                }
                out.push(v as u16);
                return Ok(Some(true));
            }
            '8' | '9' => {
                if template {
                    return Err(self.error("\\8 and \\9 are not allowed in template strings"));
                }
                out.push(c as u16);
                return Ok(Some(true));
            }
            other => push_code_point(out, other as u32),
        }
        Ok(Some(false))
    }

    /// Scans a template chunk starting right after "`" or the `}` closing a substitution.
    fn scan_template_chunk(&mut self) -> Result<Token, JSError> {
        let mut cooked = Some(Vec::new());
        let mut raw = String::new();
        loop {
            match self.advance() {
                None => return Err(self.error("Unterminated template literal")),
                Some('`') => return Ok(Token::Template { cooked, raw, tail: true }),
                Some('$') if self.peek_char() == Some('{') => {
                    self.advance();
                    return Ok(Token::Template { cooked, raw, tail: false });
                }
                Some('\\') => {
                    let esc_start = self.pos;
                    let mut buf = Vec::new();
                    match self.scan_escape(&mut buf, true) {
                        Ok(_) => {
                            if let Some(c) = cooked.as_mut() {
                                c.extend(buf);
                            }
                        }
                        Err(_) => {
                            cooked = None;
                            // Resynchronize: skip the offending escape character.
                            if self.pos == esc_start {
                                self.advance();
                            }
                        }
                    }
                    raw.push('\\');
                    let text = self.slice(esc_start, self.pos).replace("\r\n", "\n").replace('\r', "\n");
                    raw.push_str(&text);
                }
                Some('\r') => {
                    if self.peek_char() == Some('\n') {
                        self.advance();
                    }
                    raw.push('\n');
                    if let Some(c) = cooked.as_mut() {
                        c.push(0x0A);
                    }
                }
                Some(ch) => {
                    raw.push(ch);
                    if let Some(c) = cooked.as_mut() {
                        push_code_point(c, ch as u32);
                    }
                }
            }
        }
    }

    /// Re-lexes the `}` token `rbrace` as the continuation of a template literal.
    pub fn rescan_template_continuation(&mut self, rbrace: &TokenData) -> Result<TokenData, JSError> {
        self.reset_to(rbrace);
        self.advance();
        let token = self.scan_template_chunk()?;
        Ok(TokenData {
            token,
            line: rbrace.line,
            column: rbrace.column,
            start: rbrace.start,
            end: self.pos,
            newline_before: rbrace.newline_before,
            legacy_octal: false,
            escaped: false,
        })
    }

    /// Re-lexes a `/` or `/=` token as a regular expression literal.
    pub fn rescan_regex(&mut self, slash: &TokenData) -> Result<TokenData, JSError> {
        self.reset_to(slash);
        self.advance();
        let mut pattern = String::new();
        let mut in_class = false;
        loop {
            match self.advance() {
                None => return Err(self.error("Invalid regular expression: missing /")),
                Some(c) if is_newline(c) => return Err(self.error("Invalid regular expression: missing /")),
                Some('\\') => {
                    pattern.push('\\');
                    match self.advance() {
                        Some(c) if !is_newline(c) => pattern.push(c),
                        _ => return Err(self.error("Invalid regular expression: missing /")),
                    }
                }
                Some('[') => {
                    in_class = true;
                    pattern.push('[');
                }
                Some(']') => {
                    in_class = false;
                    pattern.push(']');
                }
                Some('/') if !in_class => break,
                Some(c) => pattern.push(c),
            }
        }
        let mut flags = String::new();
        while let Some(c) = self.peek_char() {
            if is_id_continue(c) {
                if !"dgimsuyv".contains(c) || flags.contains(c) {
                    return Err(self.error(&format!("Invalid regular expression flags '{flags}{c}'")));
                }
                flags.push(c);
                self.advance();
            } else {
                break;
            }
        }
        Ok(TokenData {
            token: Token::Regex(pattern, flags),
            line: slash.line,
            column: slash.column,
            start: slash.start,
            end: self.pos,
            newline_before: slash.newline_before,
            legacy_octal: false,
            escaped: false,
        })
    }

    fn reset_to(&mut self, tok: &TokenData) {
        self.pos = tok.start;
        self.line = tok.line;
        self.col = tok.column;
    }

    fn scan_punctuator(&mut self) -> Result<Token, JSError> {
        let c = self.advance().ok_or_else(|| self.error("Unexpected end of input"))?;
        let next = self.peek_char();
        let tok = match c {
            '{' => Token::LBrace,
            '}' => Token::RBrace,
            '(' => Token::LParen,
            ')' => Token::RParen,
            '[' => Token::LBracket,
            ']' => Token::RBracket,
            ';' => Token::Semicolon,
            ',' => Token::Comma,
            ':' => Token::Colon,
            '~' => Token::BitNot,
            '.' => {
                if next == Some('.') && self.peek_at(1) == Some('.') {
                    self.advance();
                    self.advance();
                    Token::Spread
                } else {
                    Token::Dot
                }
            }
            '?' => {
                if next == Some('?') {
                    self.advance();
                    if self.peek_char() == Some('=') {
                        self.advance();
                        Token::NullishAssign
                    } else {
                        Token::NullishCoalescing
                    }
                } else if next == Some('.') && !self.peek_at(1).is_some_and(|d| d.is_ascii_digit()) {
                    self.advance();
                    Token::OptionalChain
                } else {
                    Token::QuestionMark
                }
            }
            '=' => {
                if next == Some('=') {
                    self.advance();
                    if self.peek_char() == Some('=') {
                        self.advance();
                        Token::StrictEqual
                    } else {
                        Token::Equal
                    }
                } else if next == Some('>') {
                    self.advance();
                    Token::Arrow
                } else {
                    Token::Assign
                }
            }
            '!' => {
                if next == Some('=') {
                    self.advance();
                    if self.peek_char() == Some('=') {
                        self.advance();
                        Token::StrictNotEqual
                    } else {
                        Token::NotEqual
                    }
                } else {
                    Token::LogicalNot
                }
            }
            '+' => match next {
                Some('+') => {
                    self.advance();
                    Token::Increment
                }
                Some('=') => {
                    self.advance();
                    Token::AddAssign
                }
                _ => Token::Plus,
            },
            '-' => match next {
                Some('-') => {
                    self.advance();
                    Token::Decrement
                }
                Some('=') => {
                    self.advance();
                    Token::SubAssign
                }
                _ => Token::Minus,
            },
            '*' => match next {
                Some('*') => {
                    self.advance();
                    if self.peek_char() == Some('=') {
                        self.advance();
                        Token::PowAssign
                    } else {
                        Token::Exponent
                    }
                }
                Some('=') => {
                    self.advance();
                    Token::MulAssign
                }
                _ => Token::Multiply,
            },
            '/' => {
                if next == Some('=') {
                    self.advance();
                    Token::DivAssign
                } else {
                    Token::Divide
                }
            }
            '%' => {
                if next == Some('=') {
                    self.advance();
                    Token::ModAssign
                } else {
                    Token::Mod
                }
            }
            '<' => match next {
                Some('<') => {
                    self.advance();
                    if self.peek_char() == Some('=') {
                        self.advance();
                        Token::LeftShiftAssign
                    } else {
                        Token::LeftShift
                    }
                }
                Some('=') => {
                    self.advance();
                    Token::LessEqual
                }
                _ => Token::LessThan,
            },
            '>' => match next {
                Some('>') => {
                    self.advance();
                    match self.peek_char() {
                        Some('>') => {
                            self.advance();
                            if self.peek_char() == Some('=') {
                                self.advance();
                                Token::UnsignedRightShiftAssign
                            } else {
                                Token::UnsignedRightShift
                            }
                        }
                        Some('=') => {
                            self.advance();
                            Token::RightShiftAssign
                        }
                        _ => Token::RightShift,
                    }
                }
                Some('=') => {
                    self.advance();
                    Token::GreaterEqual
                }
                _ => Token::GreaterThan,
            },
            '&' => match next {
                Some('&') => {
                    self.advance();
                    if self.peek_char() == Some('=') {
                        self.advance();
                        Token::LogicalAndAssign
                    } else {
                        Token::LogicalAnd
                    }
                }
                Some('=') => {
                    self.advance();
                    Token::BitAndAssign
                }
                _ => Token::BitAnd,
            },
            '|' => match next {
                Some('|') => {
                    self.advance();
                    if self.peek_char() == Some('=') {
                        self.advance();
                        Token::LogicalOrAssign
                    } else {
                        Token::LogicalOr
                    }
                }
                Some('=') => {
                    self.advance();
                    Token::BitOrAssign
                }
                _ => Token::BitOr,
            },
            '^' => {
                if next == Some('=') {
                    self.advance();
                    Token::BitXorAssign
                } else {
                    Token::BitXor
                }
            }
            other => return Err(self.error(&format!("Invalid or unexpected token '{other}'"))),
        };
        Ok(tok)
    }
}

/// Tokenizes a whole source text; regex literals are not recognized by this helper.
pub fn tokenize(source: &str) -> Result<Vec<TokenData>, JSError> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    loop {
        let t = lexer.next_token()?;
        let done = t.token == Token::EOF;
        tokens.push(t);
        if done {
            break;
        }
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<Token> {
        tokenize(src).unwrap().into_iter().map(|t| t.token).collect()
    }

    #[test]
    fn numeric_literal_forms() {
        assert_eq!(
            kinds("0x1F 0o17 0b101 017 1_000 .5 1e3 08"),
            vec![
                Token::Number(31.0),
                Token::Number(15.0),
                Token::Number(5.0),
                Token::Number(15.0),
                Token::Number(1000.0),
                Token::Number(0.5),
                Token::Number(1000.0),
                Token::Number(8.0),
                Token::EOF
            ]
        );
    }

    #[test]
    fn number_followed_by_identifier_is_an_error() {
        assert!(tokenize("3in x").is_err());
    }

    #[test]
    fn string_escapes_decode_eagerly() {
        let toks = kinds(r#""a\n\x41B\u{1F600}\
c""#);
        let mut expected = crate::unicode::utf8_to_utf16("a\nAB\u{1F600}c");
        expected.shrink_to_fit();
        assert_eq!(toks[0], Token::StringLit(expected));
    }

    #[test]
    fn unterminated_string_reports_position() {
        let err = tokenize("\n  'abc").unwrap_err();
        assert_eq!(err.js_line(), Some(2));
    }

    #[test]
    fn newline_before_is_tracked() {
        let toks = tokenize("a /* x\n */ b\nc").unwrap();
        assert!(!toks[0].newline_before);
        assert!(toks[1].newline_before);
        assert!(toks[2].newline_before);
    }

    #[test]
    fn regex_rescan_from_divide() {
        let mut lexer = Lexer::new("/a[/]b/gi.test");
        let slash = lexer.next_token().unwrap();
        assert_eq!(slash.token, Token::Divide);
        let re = lexer.rescan_regex(&slash).unwrap();
        assert_eq!(re.token, Token::Regex("a[/]b".to_string(), "gi".to_string()));
        assert_eq!(lexer.next_token().unwrap().token, Token::Dot);
    }

    #[test]
    fn template_chunks() {
        let mut lexer = Lexer::new("`a${x}b`");
        let head = lexer.next_token().unwrap();
        assert!(matches!(head.token, Token::Template { tail: false, .. }));
        assert_eq!(lexer.next_token().unwrap().token, Token::Identifier("x".into()));
        let rbrace = lexer.next_token().unwrap();
        let tail = lexer.rescan_template_continuation(&rbrace).unwrap();
        assert!(matches!(tail.token, Token::Template { tail: true, ref raw, .. } if raw == "b"));
    }

    #[test]
    fn escaped_keyword_is_identifier() {
        let toks = tokenize("\\u0076ar").unwrap();
        assert_eq!(toks[0].token, Token::Identifier("var".into()));
        assert!(toks[0].escaped);
    }
}
