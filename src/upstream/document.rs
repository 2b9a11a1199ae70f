//! Loosely-typed model of the Icecast `/admin/stats` XML document.
//!
//! Only what the extractor needs is kept: the `source` elements directly
//! under the root, keyed by their `mount` attribute, with each direct
//! child element's text content. Typing and validation of those values
//! happens later, per mountpoint.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use thiserror::Error;

/// Errors that make a stats body unusable as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    #[error("xml syntax error at byte {position}: {message}")]
    Syntax { position: u64, message: String },
    #[error("document has no root element")]
    NoRootElement,
    #[error("document has more than one root element")]
    MultipleRootElements,
    #[error("document ended with unclosed elements")]
    Truncated,
}

/// One `<source mount="...">` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceNode {
    mount: String,
    fields: HashMap<String, String>,
}

impl SourceNode {
    pub fn new(mount: impl Into<String>) -> Self {
        Self {
            mount: mount.into(),
            fields: HashMap::new(),
        }
    }

    /// Adds a child field. Builder-style, mostly useful in tests.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// The mount identifier, e.g. `/live`.
    pub fn mount(&self) -> &str {
        &self.mount
    }

    /// Trimmed text of the named child element, if present.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// Parsed stats document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsDocument {
    sources: Vec<SourceNode>,
}

impl StatsDocument {
    pub fn new(sources: Vec<SourceNode>) -> Self {
        Self { sources }
    }

    /// All sources in document order.
    pub fn sources(&self) -> &[SourceNode] {
        &self.sources
    }

    /// First source whose `mount` attribute equals `mount`.
    pub fn source(&self, mount: &str) -> Option<&SourceNode> {
        self.sources.iter().find(|s| s.mount == mount)
    }

    /// Parses an `/admin/stats` response body.
    pub fn parse(xml: &str) -> Result<Self, DocumentError> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut sources = Vec::new();
        let mut depth = 0usize;
        let mut saw_root = false;
        // Open `<source>` at depth 2 and open field at depth 3.
        let mut current: Option<SourceNode> = None;
        let mut field: Option<(String, String)> = None;

        loop {
            let event = reader.read_event().map_err(|e| DocumentError::Syntax {
                position: reader.error_position() as u64,
                message: e.to_string(),
            })?;

            match event {
                Event::Start(e) => {
                    depth += 1;
                    match depth {
                        1 => {
                            if saw_root {
                                return Err(DocumentError::MultipleRootElements);
                            }
                            saw_root = true;
                        }
                        2 if e.name().as_ref() == b"source" => {
                            current = mount_of(&e, &reader)?.map(SourceNode::new);
                        }
                        3 if current.is_some() => {
                            field = Some((element_name(&e), String::new()));
                        }
                        _ => {}
                    }
                }
                Event::Empty(e) => match depth {
                    0 => {
                        if saw_root {
                            return Err(DocumentError::MultipleRootElements);
                        }
                        saw_root = true;
                    }
                    1 if e.name().as_ref() == b"source" => {
                        if let Some(mount) = mount_of(&e, &reader)? {
                            sources.push(SourceNode::new(mount));
                        }
                    }
                    2 => {
                        if let Some(source) = current.as_mut() {
                            source.fields.insert(element_name(&e), String::new());
                        }
                    }
                    _ => {}
                },
                Event::Text(t) if depth == 3 => {
                    if let Some((_, value)) = field.as_mut() {
                        let text = t.unescape().map_err(|e| DocumentError::Syntax {
                            position: reader.buffer_position() as u64,
                            message: e.to_string(),
                        })?;
                        value.push_str(&text);
                    }
                }
                Event::CData(c) if depth == 3 => {
                    if let Some((_, value)) = field.as_mut() {
                        value.push_str(String::from_utf8_lossy(&c).trim());
                    }
                }
                Event::End(_) => {
                    match depth {
                        3 => {
                            if let (Some((name, value)), Some(source)) =
                                (field.take(), current.as_mut())
                            {
                                source.fields.insert(name, value);
                            }
                        }
                        2 => {
                            if let Some(source) = current.take() {
                                sources.push(source);
                            }
                        }
                        _ => {}
                    }
                    depth = depth.saturating_sub(1);
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !saw_root {
            return Err(DocumentError::NoRootElement);
        }
        if depth != 0 {
            return Err(DocumentError::Truncated);
        }

        tracing::trace!(sources = sources.len(), "Parsed stats document");
        Ok(Self { sources })
    }
}

fn element_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

/// Reads the `mount` attribute; a source without one cannot be matched.
fn mount_of(e: &BytesStart<'_>, reader: &Reader<&[u8]>) -> Result<Option<String>, DocumentError> {
    let syntax = |message: String| DocumentError::Syntax {
        position: reader.buffer_position() as u64,
        message,
    };

    let attr = e
        .try_get_attribute("mount")
        .map_err(|err| syntax(err.to_string()))?;
    match attr {
        Some(attr) => {
            let value = attr.unescape_value().map_err(|err| syntax(err.to_string()))?;
            Ok(Some(value.into_owned()))
        }
        None => {
            tracing::debug!("Ignoring source element without a mount attribute");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATS: &str = r#"<?xml version="1.0"?>
<icestats>
  <admin>icemaster@localhost</admin>
  <sources>2</sources>
  <source mount="/live">
    <listeners>12</listeners>
    <listener_peak>40</listener_peak>
    <server_name>Live &amp; Loud</server_name>
    <total_bytes_read>123456</total_bytes_read>
    <total_bytes_sent>987654</total_bytes_sent>
    <genre/>
  </source>
  <source mount="/fallback">
    <listeners><![CDATA[ 3 ]]></listeners>
  </source>
</icestats>"#;

    #[test]
    fn test_parses_sources_and_fields() {
        let doc = StatsDocument::parse(STATS).unwrap();
        assert_eq!(doc.sources().len(), 2);

        let live = doc.source("/live").unwrap();
        assert_eq!(live.field("listeners"), Some("12"));
        assert_eq!(live.field("total_bytes_sent"), Some("987654"));
        assert_eq!(live.field("server_name"), Some("Live & Loud"));
        assert_eq!(live.field("genre"), Some(""));
        assert_eq!(live.field("missing"), None);

        let fallback = doc.source("/fallback").unwrap();
        assert_eq!(fallback.field("listeners"), Some("3"));
    }

    #[test]
    fn test_root_level_fields_are_not_sources() {
        let doc = StatsDocument::parse(STATS).unwrap();
        assert!(doc.source("icemaster@localhost").is_none());
        assert!(doc.sources().iter().all(|s| s.field("admin").is_none()));
    }

    #[test]
    fn test_nested_source_elements_ignored() {
        let doc = StatsDocument::parse(
            r#"<icestats><group><source mount="/deep"><listeners>1</listeners></source></group></icestats>"#,
        )
        .unwrap();
        assert!(doc.source("/deep").is_none());
    }

    #[test]
    fn test_source_without_mount_skipped() {
        let doc = StatsDocument::parse(
            r#"<icestats><source><listeners>1</listeners></source><source mount="/a"/></icestats>"#,
        )
        .unwrap();
        assert_eq!(doc.sources().len(), 1);
        assert_eq!(doc.sources()[0].mount(), "/a");
    }

    #[test]
    fn test_first_duplicate_mount_wins() {
        let doc = StatsDocument::parse(
            r#"<icestats>
                <source mount="/a"><listeners>1</listeners></source>
                <source mount="/a"><listeners>2</listeners></source>
            </icestats>"#,
        )
        .unwrap();
        assert_eq!(doc.source("/a").unwrap().field("listeners"), Some("1"));
    }

    #[test]
    fn test_empty_root_is_valid() {
        let doc = StatsDocument::parse("<icestats/>").unwrap();
        assert!(doc.sources().is_empty());
    }

    #[test]
    fn test_non_xml_rejected() {
        assert_eq!(
            StatsDocument::parse("Unauthorized"),
            Err(DocumentError::NoRootElement)
        );
        assert_eq!(StatsDocument::parse(""), Err(DocumentError::NoRootElement));
    }

    #[test]
    fn test_mismatched_tags_rejected() {
        assert!(matches!(
            StatsDocument::parse("<icestats><source mount=\"/a\"></icestats>"),
            Err(DocumentError::Syntax { .. })
        ));
    }

    #[test]
    fn test_truncated_document_rejected() {
        assert!(matches!(
            StatsDocument::parse("<icestats><source mount=\"/a\"><listeners>1</listeners>"),
            Err(DocumentError::Truncated) | Err(DocumentError::Syntax { .. })
        ));
    }

    #[test]
    fn test_multiple_roots_rejected() {
        assert_eq!(
            StatsDocument::parse("<a/><b/>"),
            Err(DocumentError::MultipleRootElements)
        );
    }
}
