//! Content stream tokenizer.
//!
//! Splits content stream bytes into operands and operators. Arrays and
//! dictionaries are assembled into single operands; `n g R` inside them
//! becomes an indirect reference. Inline image data between `ID` and `EI`
//! is skipped.

use crate::error::{PdfError, Result};
use crate::model::objects::{PDFObjRef, PDFObject};
use bytes::Bytes;
use std::collections::HashMap;

/// Token types produced by [`ContentLexer`].
#[derive(Debug, Clone, PartialEq)]
pub enum ContentToken {
    /// An operand (number, string, name, array, dict)
    Operand(PDFObject),
    /// An operator (m, re, SCN, etc.)
    Operator(String),
}

/// Context frame for tracking array/dict construction
#[derive(Debug)]
enum Frame {
    Array(usize, Vec<PDFObject>),
    Dict(usize, Vec<PDFObject>),
}

enum Raw {
    Object(PDFObject),
    Keyword(String),
    ArrayStart,
    ArrayEnd,
    DictStart,
    DictEnd,
}

/// Tokenizer over one content stream.
#[derive(Debug)]
pub struct ContentLexer {
    data: Bytes,
    pos: usize,
    stack: Vec<Frame>,
    failed: bool,
}

impl ContentLexer {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            pos: 0,
            stack: Vec::new(),
            failed: false,
        }
    }

    /// Byte offset of the next unread byte.
    pub const fn tell(&self) -> usize {
        self.pos
    }

    fn peek(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.data.get(self.pos + offset).copied()
    }

    fn advance_one(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }

    fn syntax_error(&self, pos: usize, msg: impl Into<String>) -> PdfError {
        PdfError::SyntaxError {
            pos,
            msg: msg.into(),
        }
    }

    /// Next operand or operator.
    ///
    /// After the first error the lexer yields nothing more.
    pub fn next_token(&mut self) -> Option<Result<ContentToken>> {
        if self.failed {
            return None;
        }
        let result = self.next_token_inner();
        if matches!(result, Some(Err(_))) {
            self.failed = true;
        }
        result
    }

    fn next_token_inner(&mut self) -> Option<Result<ContentToken>> {
        loop {
            self.skip_whitespace();
            let start = self.pos;
            let raw = match self.next_raw() {
                Some(Ok(raw)) => raw,
                Some(Err(e)) => return Some(Err(e)),
                None => {
                    return match self.stack.last() {
                        Some(Frame::Array(pos, _)) | Some(Frame::Dict(pos, _)) => {
                            Some(Err(self.syntax_error(*pos, "unterminated array or dictionary")))
                        }
                        None => None,
                    };
                }
            };
            let obj = match raw {
                Raw::Object(obj) => obj,
                Raw::Keyword(kw) if self.stack.is_empty() => {
                    if kw == "ID" {
                        self.skip_inline_data();
                    }
                    return Some(Ok(ContentToken::Operator(kw)));
                }
                Raw::Keyword(kw) if kw == "R" => match self.fold_reference(start) {
                    Ok(()) => continue,
                    Err(e) => return Some(Err(e)),
                },
                Raw::Keyword(kw) => {
                    return Some(Err(
                        self.syntax_error(start, format!("operator {kw} inside array or dictionary"))
                    ));
                }
                Raw::ArrayStart => {
                    self.stack.push(Frame::Array(start, Vec::new()));
                    continue;
                }
                Raw::DictStart => {
                    self.stack.push(Frame::Dict(start, Vec::new()));
                    continue;
                }
                Raw::ArrayEnd => match self.stack.pop() {
                    Some(Frame::Array(_, items)) => PDFObject::Array(items),
                    _ => return Some(Err(self.syntax_error(start, "unbalanced ']'"))),
                },
                Raw::DictEnd => match self.stack.pop() {
                    Some(Frame::Dict(pos, items)) => match Self::build_dict(items) {
                        Some(dict) => PDFObject::Dict(dict),
                        None => {
                            return Some(Err(self.syntax_error(pos, "malformed dictionary")));
                        }
                    },
                    _ => return Some(Err(self.syntax_error(start, "unbalanced '>>'"))),
                },
            };
            match self.stack.last_mut() {
                Some(Frame::Array(_, items)) | Some(Frame::Dict(_, items)) => items.push(obj),
                None => return Some(Ok(ContentToken::Operand(obj))),
            }
        }
    }

    /// Replace the trailing `objid genno` of the open frame with a reference.
    fn fold_reference(&mut self, pos: usize) -> Result<()> {
        let items = match self.stack.last_mut() {
            Some(Frame::Array(_, items)) | Some(Frame::Dict(_, items)) => items,
            None => return Err(self.syntax_error(pos, "stray R")),
        };
        match items.as_slice() {
            [.., PDFObject::Int(objid), PDFObject::Int(genno)] if *objid >= 0 && *genno >= 0 => {
                let objref = PDFObjRef::new(*objid as u32, *genno as u32);
                items.truncate(items.len() - 2);
                items.push(PDFObject::Ref(objref));
                Ok(())
            }
            _ => Err(self.syntax_error(pos, "R without object and generation numbers")),
        }
    }

    fn build_dict(items: Vec<PDFObject>) -> Option<HashMap<String, PDFObject>> {
        if items.len() % 2 != 0 {
            return None;
        }
        let mut dict = HashMap::with_capacity(items.len() / 2);
        let mut iter = items.into_iter();
        while let (Some(key), Some(value)) = (iter.next(), iter.next()) {
            match key {
                PDFObject::Name(name) => {
                    dict.insert(name, value);
                }
                _ => return None,
            }
        }
        Some(dict)
    }

    fn next_raw(&mut self) -> Option<Result<Raw>> {
        self.skip_whitespace();
        let token_pos = self.pos;
        let b = self.peek()?;

        let result = match b {
            b'/' => Ok(Raw::Object(self.parse_name())),
            b'(' => self.parse_string().map(Raw::Object),
            b'<' => {
                if self.peek_at(1) == Some(b'<') {
                    self.pos += 2;
                    Ok(Raw::DictStart)
                } else {
                    self.parse_hex_string().map(Raw::Object)
                }
            }
            b'>' => {
                if self.peek_at(1) == Some(b'>') {
                    self.pos += 2;
                    Ok(Raw::DictEnd)
                } else {
                    Err(self.syntax_error(token_pos, "stray '>'"))
                }
            }
            b'[' => {
                self.pos += 1;
                Ok(Raw::ArrayStart)
            }
            b']' => {
                self.pos += 1;
                Ok(Raw::ArrayEnd)
            }
            b'{' | b'}' | b')' => Err(self.syntax_error(token_pos, format!("unexpected '{}'", b as char))),
            b'+' | b'-' | b'.' => {
                if matches!(self.peek_at(1), Some(c) if c.is_ascii_digit() || c == b'.') {
                    self.parse_number(token_pos).map(Raw::Object)
                } else {
                    Ok(self.parse_keyword())
                }
            }
            c if c.is_ascii_digit() => self.parse_number(token_pos).map(Raw::Object),
            _ => Ok(self.parse_keyword()),
        };
        Some(result)
    }

    fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek() {
            if b == b'%' {
                while let Some(c) = self.advance_one() {
                    if c == b'\n' || c == b'\r' {
                        break;
                    }
                }
            } else if is_whitespace(b) {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn parse_name(&mut self) -> PDFObject {
        self.pos += 1; // skip '/'
        let mut name = Vec::with_capacity(16);

        while let Some(b) = self.peek() {
            if is_whitespace(b) || is_delimiter(b) {
                break;
            }
            if b == b'#' {
                let h1 = self.peek_at(1).and_then(hex_value);
                let h2 = self.peek_at(2).and_then(hex_value);
                if let (Some(h1), Some(h2)) = (h1, h2) {
                    self.pos += 3;
                    name.push((h1 << 4) | h2);
                    continue;
                }
            }
            name.push(b);
            self.pos += 1;
        }

        PDFObject::Name(String::from_utf8_lossy(&name).into_owned())
    }

    fn parse_number(&mut self, start_pos: usize) -> Result<PDFObject> {
        if matches!(self.peek(), Some(b'-' | b'+')) {
            self.pos += 1;
        }
        let mut digits = 0;
        let mut has_dot = false;
        while let Some(b) = self.peek() {
            match b {
                b'0'..=b'9' => digits += 1,
                b'.' if !has_dot => has_dot = true,
                _ => break,
            }
            self.pos += 1;
        }
        if digits == 0 {
            return Err(self.syntax_error(start_pos, "invalid number"));
        }

        let text = std::str::from_utf8(&self.data[start_pos..self.pos])
            .map_err(|_| self.syntax_error(start_pos, "invalid number"))?;
        if !has_dot {
            if let Ok(value) = text.parse::<i64>() {
                return Ok(PDFObject::Int(value));
            }
        }
        text.parse::<f64>()
            .map(PDFObject::Real)
            .map_err(|_| self.syntax_error(start_pos, format!("invalid number {text}")))
    }

    fn parse_string(&mut self) -> Result<PDFObject> {
        let start = self.pos;
        self.pos += 1; // skip '('
        let mut result = Vec::with_capacity(32);
        let mut depth = 1;

        while depth > 0 {
            match self.advance_one() {
                Some(b'(') => {
                    depth += 1;
                    result.push(b'(');
                }
                Some(b')') => {
                    depth -= 1;
                    if depth > 0 {
                        result.push(b')');
                    }
                }
                Some(b'\\') => match self.advance_one() {
                    Some(b'n') => result.push(b'\n'),
                    Some(b'r') => result.push(b'\r'),
                    Some(b't') => result.push(b'\t'),
                    Some(b'b') => result.push(0x08),
                    Some(b'f') => result.push(0x0c),
                    Some(b'\r') => {
                        if self.peek() == Some(b'\n') {
                            self.pos += 1;
                        }
                    }
                    Some(b'\n') => {}
                    Some(c @ b'0'..=b'7') => {
                        let mut octal = u32::from(c - b'0');
                        for _ in 0..2 {
                            match self.peek() {
                                Some(d @ b'0'..=b'7') => {
                                    self.pos += 1;
                                    octal = octal * 8 + u32::from(d - b'0');
                                }
                                _ => break,
                            }
                        }
                        result.push((octal & 0xFF) as u8);
                    }
                    Some(c) => result.push(c),
                    None => return Err(self.syntax_error(start, "unterminated string")),
                },
                Some(c) => result.push(c),
                None => return Err(self.syntax_error(start, "unterminated string")),
            }
        }

        Ok(PDFObject::String(result))
    }

    fn parse_hex_string(&mut self) -> Result<PDFObject> {
        let start = self.pos;
        self.pos += 1; // skip '<'
        let mut result = Vec::new();
        let mut pending: Option<u8> = None;

        loop {
            match self.advance_one() {
                Some(b'>') => break,
                Some(c) if is_whitespace(c) => {}
                Some(c) => {
                    let nibble = hex_value(c)
                        .ok_or_else(|| self.syntax_error(self.pos - 1, "invalid hex digit"))?;
                    match pending.take() {
                        Some(high) => result.push((high << 4) | nibble),
                        None => pending = Some(nibble),
                    }
                }
                None => return Err(self.syntax_error(start, "unterminated hex string")),
            }
        }

        if let Some(high) = pending {
            result.push(high << 4);
        }

        Ok(PDFObject::String(result))
    }

    fn parse_keyword(&mut self) -> Raw {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if is_whitespace(b) || is_delimiter(b) {
                break;
            }
            self.pos += 1;
        }
        match &self.data[start..self.pos] {
            b"true" => Raw::Object(PDFObject::Bool(true)),
            b"false" => Raw::Object(PDFObject::Bool(false)),
            b"null" => Raw::Object(PDFObject::Null),
            bytes => Raw::Keyword(String::from_utf8_lossy(bytes).into_owned()),
        }
    }

    /// Skip inline image data up to and including the `EI` operator.
    fn skip_inline_data(&mut self) {
        // one whitespace byte separates ID from the data
        if self.peek().is_some_and(is_whitespace) {
            self.pos += 1;
        }
        while self.pos < self.data.len() {
            let at_ei = self.data[self.pos..].starts_with(b"EI")
                && self.pos > 0
                && is_whitespace(self.data[self.pos - 1])
                && self.peek_at(2).is_none_or(|b| is_whitespace(b) || is_delimiter(b));
            if at_ei {
                return;
            }
            self.pos += 1;
        }
    }
}

impl Iterator for ContentLexer {
    type Item = Result<ContentToken>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}

/// Parse a single object, such as a resource dictionary, from PDF syntax.
///
/// Top-level `n g R` sequences are folded into references as well.
pub fn parse_object(data: &[u8]) -> Result<PDFObject> {
    let mut operands: Vec<PDFObject> = Vec::new();
    for token in ContentLexer::new(Bytes::copy_from_slice(data)) {
        match token? {
            ContentToken::Operand(obj) => operands.push(obj),
            ContentToken::Operator(op) if op == "R" => match operands.as_slice() {
                [.., PDFObject::Int(objid), PDFObject::Int(genno)] => {
                    let objref = PDFObjRef::new(*objid as u32, *genno as u32);
                    operands.truncate(operands.len() - 2);
                    operands.push(PDFObject::Ref(objref));
                }
                _ => {
                    return Err(PdfError::SyntaxError {
                        pos: 0,
                        msg: "R without object and generation numbers".into(),
                    });
                }
            },
            ContentToken::Operator(op) => {
                return Err(PdfError::SyntaxError {
                    pos: 0,
                    msg: format!("unexpected operator {op}"),
                });
            }
        }
    }
    match operands.len() {
        1 => operands.pop().ok_or(PdfError::SyntaxError {
            pos: 0,
            msg: "empty input".into(),
        }),
        n => Err(PdfError::SyntaxError {
            pos: 0,
            msg: format!("expected one object, found {n}"),
        }),
    }
}

/// Check if byte is PDF whitespace.
const fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n' | b'\x00' | b'\x0c')
}

const fn is_delimiter(b: u8) -> bool {
    matches!(
        b,
        b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
    )
}

const fn hex_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(src: &[u8]) -> Vec<ContentToken> {
        ContentLexer::new(src.to_vec())
            .collect::<Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn numbers_and_operators() {
        assert_eq!(
            tokens(b"1 -2.5 .5 re"),
            vec![
                ContentToken::Operand(PDFObject::Int(1)),
                ContentToken::Operand(PDFObject::Real(-2.5)),
                ContentToken::Operand(PDFObject::Real(0.5)),
                ContentToken::Operator("re".into()),
            ]
        );
    }

    #[test]
    fn star_operators_stay_whole() {
        assert_eq!(
            tokens(b"f* B*"),
            vec![
                ContentToken::Operator("f*".into()),
                ContentToken::Operator("B*".into()),
            ]
        );
    }

    #[test]
    fn names_decode_hex_escapes() {
        assert_eq!(
            tokens(b"/Spot#20Red"),
            vec![ContentToken::Operand(PDFObject::name("Spot Red"))]
        );
    }

    #[test]
    fn arrays_and_refs() {
        assert_eq!(
            tokens(b"[/Separation /Red 5 0 R]"),
            vec![ContentToken::Operand(PDFObject::Array(vec![
                PDFObject::name("Separation"),
                PDFObject::name("Red"),
                PDFObject::Ref(PDFObjRef::new(5, 0)),
            ]))]
        );
    }

    #[test]
    fn strings_with_escapes() {
        assert_eq!(
            tokens(b"(a\\(b\\)\\101) <48 69>"),
            vec![
                ContentToken::Operand(PDFObject::String(b"a(b)A".to_vec())),
                ContentToken::Operand(PDFObject::String(b"Hi".to_vec())),
            ]
        );
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(
            tokens(b"% comment\nn"),
            vec![ContentToken::Operator("n".into())]
        );
    }

    #[test]
    fn unbalanced_array_is_a_syntax_error() {
        let mut lexer = ContentLexer::new(b"1 ]".to_vec());
        assert!(matches!(lexer.next(), Some(Ok(_))));
        assert!(matches!(lexer.next(), Some(Err(PdfError::SyntaxError { pos: 2, .. }))));
        assert!(lexer.next().is_none());
    }

    #[test]
    fn inline_image_data_is_skipped() {
        let ops: Vec<_> = tokens(b"BI /W 1 /H 1 ID \xff\x00] EI q")
            .into_iter()
            .filter_map(|t| match t {
                ContentToken::Operator(op) => Some(op),
                _ => None,
            })
            .collect();
        assert_eq!(ops, vec!["BI", "ID", "EI", "q"]);
    }

    #[test]
    fn parse_object_reads_dicts() {
        let obj = parse_object(b"<< /CS0 [/ICCBased 4 0 R] /CS1 /DeviceRGB >>").unwrap();
        assert_eq!(obj.dict_get("CS1"), Some(&PDFObject::name("DeviceRGB")));
        assert_eq!(
            obj.dict_get("CS0").unwrap().get(1).unwrap(),
            &PDFObject::Ref(PDFObjRef::new(4, 0))
        );
    }
}
