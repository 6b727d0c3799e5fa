//! # TagParser - forward-only scanner for table documents
//!
//! Table documents are produced by this workspace and have a rigid shape,
//! so they are read with a cursor that searches for literal tags instead of
//! a full XML parser. The cursor only moves forward: every successful
//! lookup consumes the text up to and including the closing marker, which
//! makes repeated [`TagParser::element_content`] calls a single-pass
//! iterator over sibling elements.
//!
//! ```rust
//! use tagparser::TagParser;
//!
//! let doc = "<T><row>a</row><row>b</row></T>";
//! let mut p = TagParser::new(doc);
//! assert!(p.is_prefix("<T>"));
//! assert_eq!(p.element_content("<row>", "</row>").unwrap(), Some("a"));
//! assert_eq!(p.element_content("<row>", "</row>").unwrap(), Some("b"));
//! assert_eq!(p.element_content("<row>", "</row>").unwrap(), None);
//! assert!(p.is_prefix("</T>"));
//! ```
//!
//! Character data and attribute values are escaped with the five predefined
//! XML entities (see [`escape`] / [`unescape`]).

use std::borrow::Cow;

use thiserror::Error;

/// Errors raised while scanning a document.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TagError {
    /// The document does not have the expected shape at `offset`.
    #[error("malformed document at offset {offset}: {message}")]
    Malformed { offset: usize, message: String },

    /// A character or entity reference that cannot be decoded.
    #[error("invalid escape sequence: {0}")]
    Escape(String),
}

/// Cursor over a borrowed document. Returned spans borrow from the document.
#[derive(Debug, Clone)]
pub struct TagParser<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> TagParser<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    /// Byte offset of the cursor.
    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// The unconsumed remainder of the document.
    #[must_use]
    pub fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    /// Skips whitespace, `<?...?>` declarations and `<!--...-->` comments.
    pub fn skip_prolog(&mut self) {
        loop {
            let rest = self.rest();
            let trimmed = rest.trim_start();
            self.pos += rest.len() - trimmed.len();

            let end = if trimmed.starts_with("<?") {
                trimmed.find("?>").map(|i| i + 2)
            } else if trimmed.starts_with("<!--") {
                trimmed.find("-->").map(|i| i + 3)
            } else {
                None
            };
            match end {
                Some(n) => self.pos += n,
                None => return,
            }
        }
    }

    /// Tests for `literal` at the cursor, after skipping the prolog. On
    /// success the literal is consumed; on failure the cursor stays put.
    pub fn is_prefix(&mut self, literal: &str) -> bool {
        let saved = self.pos;
        self.skip_prolog();
        if self.rest().starts_with(literal) {
            self.pos += literal.len();
            true
        } else {
            self.pos = saved;
            false
        }
    }

    /// Returns the text up to `marker` and moves past it.
    pub fn take_until(&mut self, marker: &str) -> Result<&'a str, TagError> {
        let rest = self.rest();
        match rest.find(marker) {
            Some(i) => {
                self.pos += i + marker.len();
                Ok(&rest[..i])
            }
            None => Err(self.malformed(format!("expected '{marker}'"))),
        }
    }

    /// Finds the next `open_tag` and returns the text between it and the
    /// first following `close_marker`, e.g. the attribute list of
    /// `<Entity .../>` with `("<Entity", "/>")`.
    ///
    /// Returns `Ok(None)` when no further `open_tag` exists. An `open_tag`
    /// without its `close_marker` is malformed.
    pub fn element_attribute_block(
        &mut self,
        open_tag: &str,
        close_marker: &str,
    ) -> Result<Option<&'a str>, TagError> {
        let Some(start) = self.find_tag(open_tag) else {
            return Ok(None);
        };
        self.pos = start + open_tag.len();
        let block = self.take_until(close_marker).map_err(|_| TagError::Malformed {
            offset: start,
            message: format!("'{open_tag}' is not closed by '{close_marker}'"),
        })?;
        Ok(Some(block))
    }

    /// Returns the text strictly between the next `open_tag`/`close_tag`
    /// pair, or `Ok(None)` once no further `open_tag` exists.
    pub fn element_content(
        &mut self,
        open_tag: &str,
        close_tag: &str,
    ) -> Result<Option<&'a str>, TagError> {
        self.element_attribute_block(open_tag, close_tag)
    }

    /// Position of the next `tag` that is not a prefix of a longer name.
    fn find_tag(&self, tag: &str) -> Option<usize> {
        let name_char = |c: char| c.is_alphanumeric() || c == '_' || c == '-' || c == ':';
        let ends_in_name = tag.chars().last().is_some_and(name_char);
        let mut from = self.pos;
        while let Some(i) = self.text[from..].find(tag) {
            let at = from + i;
            let next = self.text[at + tag.len()..].chars().next();
            let continues_name = ends_in_name && next.is_some_and(name_char);
            if !continues_name {
                return Some(at);
            }
            from = at + tag.len();
        }
        None
    }

    fn malformed(&self, message: String) -> TagError {
        TagError::Malformed {
            offset: self.pos,
            message,
        }
    }
}

/// Parses `name='value'` / `name="value"` pairs, unescaping values.
pub fn attributes(block: &str) -> Result<Vec<(&str, String)>, TagError> {
    let mut out = Vec::new();
    let mut rest = block;
    let mut offset = 0;
    loop {
        let trimmed = rest.trim_start();
        offset += rest.len() - trimmed.len();
        rest = trimmed;
        if rest.is_empty() || rest.starts_with('/') || rest.starts_with('>') {
            return Ok(out);
        }

        let eq = rest.find('=').ok_or_else(|| TagError::Malformed {
            offset,
            message: format!("attribute without value in '{block}'"),
        })?;
        let name = rest[..eq].trim();
        let after = rest[eq + 1..].trim_start();
        let skipped = rest.len() - after.len();

        let quote = after
            .chars()
            .next()
            .filter(|c| *c == '\'' || *c == '"')
            .ok_or_else(|| TagError::Malformed {
                offset: offset + skipped,
                message: format!("unquoted value for attribute '{name}'"),
            })?;
        let body = &after[1..];
        let close = body.find(quote).ok_or_else(|| TagError::Malformed {
            offset: offset + skipped,
            message: format!("unterminated value for attribute '{name}'"),
        })?;

        out.push((name, unescape(&body[..close])?.into_owned()));
        let consumed = skipped + 1 + close + 1;
        offset += consumed;
        rest = &rest[consumed..];
    }
}

/// Looks up one attribute in an attribute block.
pub fn attribute(block: &str, name: &str) -> Result<Option<String>, TagError> {
    Ok(attributes(block)?
        .into_iter()
        .find(|(n, _)| *n == name)
        .map(|(_, v)| v))
}

/// Unescaped text of the first `<name>...</name>` child of `fragment`.
pub fn child_text(fragment: &str, name: &str) -> Result<Option<String>, TagError> {
    let open = format!("<{name}>");
    let close = format!("</{name}>");
    let mut p = TagParser::new(fragment);
    match p.element_content(&open, &close)? {
        Some(raw) => Ok(Some(unescape(raw)?.into_owned())),
        None => Ok(None),
    }
}

/// Names of the empty elements (`<name/>`) listed in `content`, in order.
pub fn empty_element_names(content: &str) -> Result<Vec<&str>, TagError> {
    let mut p = TagParser::new(content);
    let mut names = Vec::new();
    while let Some(name) = p.element_attribute_block("<", "/>")? {
        let name = name.trim();
        if name.is_empty() || name.contains(['<', '>']) {
            return Err(TagError::Malformed {
                offset: p.position(),
                message: format!("invalid empty element '<{name}/>'"),
            });
        }
        names.push(name);
    }
    Ok(names)
}

/// Escapes `<`, `>`, `&`, `'` and `"`.
pub fn escape(text: &str) -> Cow<'_, str> {
    quick_xml::escape::escape(text)
}

pub fn unescape(text: &str) -> Result<Cow<'_, str>, TagError> {
    quick_xml::escape::unescape(text).map_err(|e| TagError::Escape(e.to_string()))
}
