//! Pull-style XML token reader
//!
//! Wraps the `xml-rs` event reader into a finite, forward-only sequence of
//! [`Token`]s and adds the few navigation primitives the format readers are
//! written against: descend to the next child element, collect an element's
//! text, and skip an element with everything inside it.

use super::ParseError;
use std::io::Read;
use xml::reader::{ErrorKind, EventReader, ParserConfig, XmlEvent};

/// An opening tag with its attributes; names are namespace-local
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartTag {
    pub name: String,
    attributes: Vec<(String, String)>,
}

impl StartTag {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Start(StartTag),
    End(String),
    Text(String),
}

pub struct XmlTokens<R: Read> {
    events: EventReader<R>,
    peeked: Option<Token>,
    seen_element: bool,
    finished: bool,
}

impl<R: Read> XmlTokens<R> {
    pub fn new(source: R) -> Self {
        let config = ParserConfig::new()
            .trim_whitespace(false)
            .whitespace_to_characters(false)
            .cdata_to_characters(true)
            .ignore_comments(true);
        Self {
            events: EventReader::new_with_config(source, config),
            peeked: None,
            seen_element: false,
            finished: false,
        }
    }

    fn pull(&mut self) -> Result<Option<Token>, ParseError> {
        if self.finished {
            return Ok(None);
        }
        loop {
            match self.events.next() {
                Ok(XmlEvent::StartElement {
                    name, attributes, ..
                }) => {
                    self.seen_element = true;
                    let attributes = attributes
                        .into_iter()
                        .map(|attribute| (attribute.name.local_name, attribute.value))
                        .collect();
                    return Ok(Some(Token::Start(StartTag {
                        name: name.local_name,
                        attributes,
                    })));
                }
                Ok(XmlEvent::EndElement { name }) => return Ok(Some(Token::End(name.local_name))),
                Ok(XmlEvent::Characters(text)) | Ok(XmlEvent::CData(text)) => {
                    return Ok(Some(Token::Text(text)));
                }
                Ok(XmlEvent::EndDocument) => {
                    self.finished = true;
                    return Ok(None);
                }
                // Declarations, processing instructions and ignorable whitespace
                Ok(_) => continue,
                Err(err) => {
                    self.finished = true;
                    return Err(self.map_error(err));
                }
            }
        }
    }

    fn map_error(&self, err: xml::reader::Error) -> ParseError {
        match err.kind() {
            ErrorKind::Io(io) => ParseError::Io(std::io::Error::new(io.kind(), io.to_string())),
            _ if !self.seen_element => {
                ParseError::UnexpectedStructure(format!("no root element: {err}"))
            }
            _ => ParseError::Syntax(err.to_string()),
        }
    }

    pub fn next_token(&mut self) -> Result<Option<Token>, ParseError> {
        match self.peeked.take() {
            Some(token) => Ok(Some(token)),
            None => self.pull(),
        }
    }

    pub fn peek(&mut self) -> Result<Option<&Token>, ParseError> {
        if self.peeked.is_none() {
            self.peeked = self.pull()?;
        }
        Ok(self.peeked.as_ref())
    }

    /// Name of the document root without consuming it
    pub fn peek_root(&mut self) -> Result<Option<&str>, ParseError> {
        loop {
            let is_start = match self.peek()? {
                None => return Ok(None),
                Some(token) => matches!(token, Token::Start(_)),
            };
            if is_start {
                break;
            }
            self.peeked = None;
        }
        match &self.peeked {
            Some(Token::Start(tag)) => Ok(Some(tag.name.as_str())),
            _ => Ok(None),
        }
    }

    /// Advance to the next child element of the currently open element.
    ///
    /// Returns `None` once the enclosing end tag has been consumed (or the
    /// document ended). At the top level the first call yields the root.
    pub fn next_child(&mut self) -> Result<Option<StartTag>, ParseError> {
        while let Some(token) = self.next_token()? {
            match token {
                Token::Start(tag) => return Ok(Some(tag)),
                Token::End(_) => return Ok(None),
                Token::Text(_) => {}
            }
        }
        Ok(None)
    }

    /// Collect the text of the element just opened, consuming its end tag.
    /// Nested elements are skipped.
    pub fn read_text(&mut self) -> Result<String, ParseError> {
        let mut text = String::new();
        while let Some(token) = self.next_token()? {
            match token {
                Token::Text(chunk) => text.push_str(&chunk),
                Token::Start(_) => self.skip_element()?,
                Token::End(_) => break,
            }
        }
        Ok(text)
    }

    /// Discard the element just opened and everything inside it
    pub fn skip_element(&mut self) -> Result<(), ParseError> {
        let mut depth = 1usize;
        while let Some(token) = self.next_token()? {
            match token {
                Token::Start(_) => depth += 1,
                Token::End(_) => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                Token::Text(_) => {}
            }
        }
        Ok(())
    }
}

impl<R: Read> Iterator for XmlTokens<R> {
    type Item = Result<Token, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token().transpose()
    }
}
