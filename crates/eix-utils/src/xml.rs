//! Namespace-aware document model built with quick-xml.
//!
//! Only what cover resolution needs is kept: elements in document order,
//! their namespaces, the in-scope prefix map and the attributes. Text is
//! dropped.

use std::collections::HashMap;
use std::sync::Arc;

use quick_xml::events::attributes::Attribute as RawAttribute;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use eix_core::error::{CoverError, Result};

use crate::encoding::decode_document;
use crate::mime;

/// The XLink namespace, used by SVG covers for `xlink:href`.
pub const XLINK_NS: &str = "http://www.w3.org/1999/xlink";

/// The XML namespace, bound to the `xml` prefix without declaration.
pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// Elements that never have content in HTML.
const HTML_VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// How forgiving the parser should be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkupSyntax {
    /// Tolerates unclosed and mismatched tags, void elements and HTML-style
    /// attributes. A tokenizer error ends the parse with what was read.
    Html,
    /// Well-formed XML only.
    Xml,
}

impl MarkupSyntax {
    /// `.xml` files are parsed strictly, everything else as HTML.
    pub fn from_path(path: &str) -> Self {
        match mime::extension(path).as_deref() {
            Some("xml") => Self::Xml,
            _ => Self::Html,
        }
    }
}

/// A namespace-qualified attribute key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttrKey<'a> {
    pub namespace: Option<&'a str>,
    pub name: &'a str,
}

impl<'a> AttrKey<'a> {
    pub fn plain(name: &'a str) -> Self {
        Self {
            namespace: None,
            name,
        }
    }

    pub fn qualified(namespace: &'a str, name: &'a str) -> Self {
        Self {
            namespace: Some(namespace),
            name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub namespace: Option<String>,
    pub name: String,
    pub value: String,
}

/// One element of a parsed document.
#[derive(Debug, Clone)]
pub struct Element {
    local_name: String,
    namespace: Option<String>,
    namespaces: Arc<HashMap<String, String>>,
    attributes: Vec<Attribute>,
}

impl Element {
    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Prefixes in scope at this element, mapped to their namespace URIs.
    /// The default namespace is stored under the empty prefix.
    pub fn namespaces(&self) -> &HashMap<String, String> {
        &self.namespaces
    }

    pub fn get(&self, key: AttrKey<'_>) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == key.name && a.namespace.as_deref() == key.namespace)
            .map(|a| a.value.as_str())
    }

    /// Unqualified attribute lookup.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.get(AttrKey::plain(name))
    }
}

/// A parsed manifest, container or markup file.
#[derive(Debug, Clone, Default)]
pub struct ParsedDocument {
    elements: Vec<Element>,
}

impl ParsedDocument {
    /// Decode `bytes` and parse them. `path` is only used in error messages.
    pub fn from_bytes(bytes: &[u8], path: &str, syntax: MarkupSyntax) -> Result<Self> {
        let text = decode_document(bytes);
        Self::parse(&text, syntax).map_err(|message| CoverError::Xml {
            path: path.to_string(),
            message,
        })
    }

    pub fn parse(text: &str, syntax: MarkupSyntax) -> std::result::Result<Self, String> {
        TreeBuilder::new(syntax).build(text)
    }

    /// All elements in document order.
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Elements with the given local name, in any namespace.
    pub fn elements_named<'a>(&'a self, local_name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.elements
            .iter()
            .filter(move |e| e.local_name == local_name)
    }

    pub fn first_named(&self, local_name: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.local_name == local_name)
    }
}

struct OpenElement {
    qname: String,
    scope: Arc<HashMap<String, String>>,
}

struct TreeBuilder {
    syntax: MarkupSyntax,
    root_scope: Arc<HashMap<String, String>>,
    open: Vec<OpenElement>,
    elements: Vec<Element>,
}

impl TreeBuilder {
    fn new(syntax: MarkupSyntax) -> Self {
        let mut root = HashMap::new();
        root.insert("xml".to_string(), XML_NS.to_string());
        Self {
            syntax,
            root_scope: Arc::new(root),
            open: Vec::new(),
            elements: Vec::new(),
        }
    }

    fn build(mut self, text: &str) -> std::result::Result<ParsedDocument, String> {
        let mut reader = Reader::from_str(text);
        if self.syntax == MarkupSyntax::Html {
            let config = reader.config_mut();
            config.check_end_names = false;
            config.allow_unmatched_ends = true;
        }

        loop {
            match reader.read_event() {
                Ok(Event::Start(ref e)) => {
                    let void = self.syntax == MarkupSyntax::Html
                        && HTML_VOID_ELEMENTS.contains(&self.name(e.local_name().as_ref()).as_str());
                    self.open_element(e, !void)?;
                }
                Ok(Event::Empty(ref e)) => self.open_element(e, false)?,
                Ok(Event::End(ref e)) => self.close_element(e.name().as_ref()),
                Ok(Event::Eof) => break,
                Err(e) => match self.syntax {
                    MarkupSyntax::Xml => {
                        return Err(format!("{} at position {}", e, reader.error_position()))
                    }
                    MarkupSyntax::Html => {
                        log::debug!("Stopping tolerant parse at {}: {}", reader.error_position(), e);
                        break;
                    }
                },
                _ => {}
            }
        }

        if self.syntax == MarkupSyntax::Xml && self.elements.is_empty() {
            return Err("document is empty".to_string());
        }

        Ok(ParsedDocument {
            elements: self.elements,
        })
    }

    /// Tag and attribute names are case-insensitive in HTML.
    fn name(&self, raw: &[u8]) -> String {
        let name = String::from_utf8_lossy(raw);
        match self.syntax {
            MarkupSyntax::Html => name.to_lowercase(),
            MarkupSyntax::Xml => name.into_owned(),
        }
    }

    fn open_element(&mut self, e: &BytesStart, has_content: bool) -> std::result::Result<(), String> {
        let parent_scope = self
            .open
            .last()
            .map(|o| Arc::clone(&o.scope))
            .unwrap_or_else(|| Arc::clone(&self.root_scope));

        let mut raw_attributes = Vec::new();
        let mut declarations = Vec::new();
        let attributes = match self.syntax {
            MarkupSyntax::Html => e.html_attributes(),
            MarkupSyntax::Xml => e.attributes(),
        };
        for attr in attributes {
            let attr = match attr {
                Ok(attr) => attr,
                Err(err) if self.syntax == MarkupSyntax::Xml => return Err(err.to_string()),
                Err(_) => break,
            };
            let qname = self.name(attr.key.as_ref());
            let value = attribute_value(&attr);
            if qname == "xmlns" {
                declarations.push((String::new(), value));
            } else if let Some(prefix) = qname.strip_prefix("xmlns:") {
                declarations.push((prefix.to_string(), value));
            } else {
                raw_attributes.push((qname, value));
            }
        }

        let scope = if declarations.is_empty() {
            parent_scope
        } else {
            let mut scope = (*parent_scope).clone();
            scope.extend(declarations);
            Arc::new(scope)
        };

        let qname = self.name(e.name().as_ref());
        let (prefix, local_name) = split_qname(&qname);
        let namespace = scope.get(prefix.unwrap_or("")).cloned();

        let attributes = raw_attributes
            .into_iter()
            .map(|(qname, value)| match split_qname(&qname) {
                (Some(prefix), local) => match scope.get(prefix) {
                    Some(ns) => Attribute {
                        namespace: Some(ns.clone()),
                        name: local.to_string(),
                        value,
                    },
                    // Undeclared prefix: keep the name as written.
                    None => Attribute {
                        namespace: None,
                        name: qname.clone(),
                        value,
                    },
                },
                (None, local) => Attribute {
                    namespace: None,
                    name: local.to_string(),
                    value,
                },
            })
            .collect();

        self.elements.push(Element {
            local_name: local_name.to_string(),
            namespace,
            namespaces: Arc::clone(&scope),
            attributes,
        });

        if has_content {
            self.open.push(OpenElement { qname, scope });
        }
        Ok(())
    }

    fn close_element(&mut self, raw: &[u8]) {
        let qname = self.name(raw);
        // Closing an outer element also closes anything left open inside it;
        // an end tag that matches nothing is ignored.
        if let Some(pos) = self.open.iter().rposition(|o| o.qname == qname) {
            self.open.truncate(pos);
        }
    }
}

fn split_qname(qname: &str) -> (Option<&str>, &str) {
    match qname.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, qname),
    }
}

fn attribute_value(attr: &RawAttribute) -> String {
    let raw = String::from_utf8_lossy(&attr.value);
    match quick_xml::escape::unescape(&raw) {
        Ok(value) => value.into_owned(),
        Err(_) => raw.into_owned(),
    }
}
