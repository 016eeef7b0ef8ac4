//! Markup writer.
//!
//! Elements holding other elements are laid out one node per line; elements
//! holding only text or CDATA are written inline.

use std::fmt::Write as _;

use crate::document::{Document, Element, Node};

/// Declaration written at the top of every document.
pub const DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// Serialize `document`, indenting each nesting level with `indent`.
pub fn write(document: &Document, indent: &str) -> String {
    let mut out = String::new();
    out.push_str(DECLARATION);
    out.push('\n');
    for comment in &document.prolog {
        let _ = writeln!(out, "<!--{}-->", escape_comment(comment));
    }
    write_element(&mut out, &document.root, indent, 0);
    out
}

fn pad(out: &mut String, indent: &str, depth: usize) {
    for _ in 0..depth {
        out.push_str(indent);
    }
}

fn write_element(out: &mut String, element: &Element, indent: &str, depth: usize) {
    pad(out, indent, depth);
    out.push('<');
    out.push_str(&element.name);
    for (key, value) in &element.attributes {
        let _ = write!(out, " {key}=\"{}\"", escape_attribute(value));
    }
    if element.children.is_empty() {
        out.push_str("/>\n");
        return;
    }
    out.push('>');

    let block = element.children.iter().any(|n| matches!(n, Node::Element(_)));
    if block {
        out.push('\n');
        for child in &element.children {
            match child {
                Node::Element(e) => write_element(out, e, indent, depth + 1),
                other => {
                    pad(out, indent, depth + 1);
                    write_inline(out, other);
                    out.push('\n');
                }
            }
        }
        pad(out, indent, depth);
    } else {
        for child in &element.children {
            write_inline(out, child);
        }
    }
    let _ = writeln!(out, "</{}>", element.name);
}

fn write_inline(out: &mut String, node: &Node) {
    match node {
        Node::Text(text) => out.push_str(&escape_text(text)),
        Node::CData(text) => {
            out.push_str("<![CDATA[");
            out.push_str(&text.replace("]]>", "]]]]><![CDATA[>"));
            out.push_str("]]>");
        }
        Node::Comment(text) => {
            let _ = write!(out, "<!--{}-->", escape_comment(text));
        }
        Node::Element(_) => {}
    }
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn escape_attribute(value: &str) -> String {
    escape_text(value)
        .replace('"', "&quot;")
        .replace('\n', "&#10;")
        .replace('\r', "&#13;")
        .replace('\t', "&#9;")
}

fn escape_comment(text: &str) -> String {
    text.replace("--", "- -")
}
