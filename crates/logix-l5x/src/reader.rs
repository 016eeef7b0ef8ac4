//! Hand-written markup reader.
//!
//! Handles the subset found in L5X exports: an XML declaration, processing
//! instructions, comments, a DOCTYPE (skipped), elements with quoted
//! attributes, CDATA sections and the predefined and numeric character
//! references. Namespaces are not interpreted.

use crate::document::{Document, Element, Node};
use crate::error::{L5xError, Result};

/// Deepest element nesting accepted.
pub const MAX_DEPTH: usize = 256;

/// Parse a complete document.
pub fn parse(source: &str) -> Result<Document> {
    let mut reader = Reader::new(source);
    reader.eat("\u{feff}");
    let mut prolog = Vec::new();
    loop {
        reader.skip_whitespace();
        if reader.eat("<?") {
            reader.skip_past("?>")?;
        } else if reader.eat("<!--") {
            prolog.push(reader.take_until("-->")?.to_string());
        } else if reader.rest().starts_with("<!DOCTYPE") {
            reader.skip_doctype()?;
        } else if reader.rest().starts_with('<') {
            break;
        } else if reader.at_end() {
            return Err(reader.error("document has no root element"));
        } else {
            return Err(reader.error("unexpected content before root element"));
        }
    }
    let root = reader.element()?;
    loop {
        reader.skip_whitespace();
        if reader.at_end() {
            break;
        }
        if reader.eat("<!--") {
            reader.take_until("-->")?;
        } else if reader.eat("<?") {
            reader.skip_past("?>")?;
        } else {
            return Err(reader.error("unexpected content after root element"));
        }
    }
    Ok(Document { prolog, root })
}

struct Reader<'a> {
    source: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> Reader<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: 0,
            depth: 0,
        }
    }

    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn eat(&mut self, token: &str) -> bool {
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &str) -> Result<()> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{token}'")))
        }
    }

    fn skip_whitespace(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.source.len() - trimmed.len();
    }

    /// Consume up to and including `end`, returning what came before it.
    fn take_until(&mut self, end: &str) -> Result<&'a str> {
        match self.rest().find(end) {
            Some(offset) => {
                let taken = &self.rest()[..offset];
                self.pos += offset + end.len();
                Ok(taken)
            }
            None => Err(self.error(format!("unterminated construct, expected '{end}'"))),
        }
    }

    fn skip_past(&mut self, end: &str) -> Result<()> {
        self.take_until(end).map(|_| ())
    }

    fn skip_doctype(&mut self) -> Result<()> {
        let mut depth = 0usize;
        for (offset, c) in self.rest().char_indices() {
            match c {
                '[' => depth += 1,
                ']' => depth = depth.saturating_sub(1),
                '>' if depth == 0 => {
                    self.pos += offset + 1;
                    return Ok(());
                }
                _ => {}
            }
        }
        Err(self.error("unterminated DOCTYPE"))
    }

    fn name(&mut self) -> Result<&'a str> {
        let rest = self.rest();
        let end = rest
            .find(|c: char| c.is_whitespace() || matches!(c, '/' | '>' | '=' | '<'))
            .unwrap_or(rest.len());
        if end == 0 {
            return Err(self.error("expected a name"));
        }
        self.pos += end;
        Ok(&rest[..end])
    }

    fn element(&mut self) -> Result<Element> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error(format!("elements nested deeper than {MAX_DEPTH}")));
        }
        self.depth += 1;
        let element = self.element_body();
        self.depth -= 1;
        element
    }

    fn element_body(&mut self) -> Result<Element> {
        self.expect("<")?;
        let mut element = Element::new(self.name()?);
        loop {
            self.skip_whitespace();
            if self.eat("/>") {
                return Ok(element);
            }
            if self.eat(">") {
                break;
            }
            let key = self.name()?;
            self.skip_whitespace();
            self.expect("=")?;
            self.skip_whitespace();
            let quote = match self.peek() {
                Some(q @ ('"' | '\'')) => q,
                _ => return Err(self.error("expected a quoted attribute value")),
            };
            self.pos += 1;
            let start = self.pos;
            let raw = self.take_until(if quote == '"' { "\"" } else { "'" })?;
            let value = unescape(raw).ok_or_else(|| self.error_at(start, "invalid character reference"))?;
            element.attributes.push((key.to_string(), value));
        }
        self.content(&mut element)?;
        Ok(element)
    }

    fn content(&mut self, element: &mut Element) -> Result<()> {
        loop {
            if self.at_end() {
                return Err(self.error(format!("unexpected end of input, expected </{}>", element.name)));
            }
            if self.eat("</") {
                let start = self.pos;
                let name = self.name()?;
                if name != element.name {
                    return Err(self.error_at(
                        start,
                        format!("mismatched closing tag </{name}>, expected </{}>", element.name),
                    ));
                }
                self.skip_whitespace();
                self.expect(">")?;
                return Ok(());
            }
            if self.eat("<!--") {
                let text = self.take_until("-->")?;
                element.children.push(Node::Comment(text.to_string()));
            } else if self.eat("<![CDATA[") {
                let text = self.take_until("]]>")?;
                element.children.push(Node::CData(text.to_string()));
            } else if self.eat("<?") {
                self.skip_past("?>")?;
            } else if self.rest().starts_with('<') {
                let child = self.element()?;
                element.children.push(Node::Element(child));
            } else {
                let start = self.pos;
                let raw = match self.rest().find('<') {
                    Some(offset) => &self.rest()[..offset],
                    None => self.rest(),
                };
                self.pos += raw.len();
                if !raw.trim().is_empty() {
                    let text = unescape(raw).ok_or_else(|| self.error_at(start, "invalid character reference"))?;
                    element.children.push(Node::Text(text));
                }
            }
        }
    }

    fn error(&self, message: impl Into<String>) -> L5xError {
        self.error_at(self.pos, message)
    }

    fn error_at(&self, pos: usize, message: impl Into<String>) -> L5xError {
        let consumed = &self.source[..pos.min(self.source.len())];
        let line = consumed.matches('\n').count() + 1;
        let column = consumed
            .rsplit('\n')
            .next()
            .map_or(0, |l| l.chars().count())
            + 1;
        L5xError::Syntax {
            line,
            column,
            message: message.into(),
        }
    }
}

/// Resolve character references; `None` on a malformed one.
fn unescape(raw: &str) -> Option<String> {
    if !raw.contains('&') {
        return Some(raw.to_string());
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        let semi = after.find(';')?;
        let entity = &after[..semi];
        let c = match entity {
            "lt" => '<',
            "gt" => '>',
            "amp" => '&',
            "quot" => '"',
            "apos" => '\'',
            _ => {
                let code = if let Some(hex) = entity.strip_prefix("#x").or_else(|| entity.strip_prefix("#X")) {
                    u32::from_str_radix(hex, 16).ok()?
                } else {
                    entity.strip_prefix('#')?.parse().ok()?
                };
                char::from_u32(code)?
            }
        };
        out.push(c);
        rest = &after[semi + 1..];
    }
    out.push_str(rest);
    Some(out)
}
