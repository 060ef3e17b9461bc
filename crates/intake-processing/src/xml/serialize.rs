//! Event-driven parse and re-serialization of a document
//!
//! Whitespace-only text is dropped, CDATA sections become escaped text and
//! entity references are substituted. The DOCTYPE is consumed for its entity
//! declarations and not written back.

use super::entities::{expand, scan_declarations, Abort, Budget, EntityDef};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;
use std::collections::HashMap;

const DECLARATION: &str = "<?xml version=\"1.0\"?>\n";

pub(crate) fn render(text: &str, declarations: &Regex, budget: &mut Budget) -> Result<String, Abort> {
    let mut reader = Reader::from_str(text);
    let mut entities: HashMap<String, EntityDef> = HashMap::new();
    let mut open: Vec<String> = Vec::new();
    let mut seen_root = false;
    let mut out = String::from(DECLARATION);

    loop {
        budget.tick()?;
        let event = reader
            .read_event()
            .map_err(|e| malformed(&reader, e.to_string()))?;

        match event {
            Event::Decl(_) => {}
            Event::DocType(e) => {
                if seen_root {
                    return Err(malformed(&reader, "DOCTYPE after root element"));
                }
                entities = scan_declarations(declarations, utf8(&reader, &e)?);
            }
            Event::Start(e) => {
                if open.is_empty() && seen_root {
                    return Err(malformed(&reader, "Extra content at the end of the document"));
                }
                seen_root = true;
                let name = write_start(&reader, &e, &entities, budget, &mut out)?;
                out.push('>');
                open.push(name);
            }
            Event::Empty(e) => {
                if open.is_empty() && seen_root {
                    return Err(malformed(&reader, "Extra content at the end of the document"));
                }
                seen_root = true;
                write_start(&reader, &e, &entities, budget, &mut out)?;
                out.push_str("/>");
            }
            Event::End(e) => {
                let name = utf8(&reader, e.name().into_inner())?;
                out.push_str("</");
                out.push_str(name);
                out.push('>');
                open.pop();
            }
            Event::Text(e) => {
                let raw = utf8(&reader, &e)?;
                let mut value = String::new();
                expand(raw, &entities, budget, 0, &mut value)?;
                if value.trim().is_empty() {
                    continue;
                }
                if open.is_empty() {
                    return Err(malformed(&reader, "Content outside the root element"));
                }
                escape_text(&value, &mut out);
            }
            Event::CData(e) => {
                if open.is_empty() {
                    return Err(malformed(&reader, "CDATA outside the root element"));
                }
                let value = utf8(&reader, &e)?;
                budget.produce(value.len())?;
                escape_text(value, &mut out);
            }
            Event::Comment(e) => {
                out.push_str("<!--");
                out.push_str(utf8(&reader, &e)?);
                out.push_str("-->");
            }
            Event::PI(e) => {
                out.push_str("<?");
                out.push_str(utf8(&reader, &e)?);
                out.push_str("?>");
            }
            Event::Eof => break,
        }
    }

    if !seen_root {
        return Err(Abort::Malformed("Document is empty".to_string()));
    }
    if let Some(name) = open.last() {
        return Err(Abort::Malformed(format!(
            "Premature end of data in tag {}",
            name
        )));
    }

    Ok(out)
}

fn write_start(
    reader: &Reader<&[u8]>,
    e: &BytesStart<'_>,
    entities: &HashMap<String, EntityDef>,
    budget: &mut Budget,
    out: &mut String,
) -> Result<String, Abort> {
    let name = utf8(reader, e.name().into_inner())?.to_string();
    out.push('<');
    out.push_str(&name);

    for attr in e.attributes() {
        let attr = attr.map_err(|err| malformed(reader, err.to_string()))?;
        let key = utf8(reader, attr.key.as_ref())?;
        let raw = utf8(reader, &attr.value)?;
        let mut value = String::new();
        expand(raw, entities, budget, 0, &mut value)?;

        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        escape_attr(&value, out);
        out.push('"');
    }

    Ok(name)
}

fn utf8<'a>(reader: &Reader<&[u8]>, bytes: &'a [u8]) -> Result<&'a str, Abort> {
    std::str::from_utf8(bytes).map_err(|_| malformed(reader, "Input is not proper UTF-8"))
}

fn malformed(reader: &Reader<&[u8]>, message: impl AsRef<str>) -> Abort {
    Abort::Malformed(format!(
        "{} at position {}",
        message.as_ref(),
        reader.buffer_position()
    ))
}

fn escape_text(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

fn escape_attr(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::entities::ENTITY_DECLARATION_PATTERN;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    fn render_str(text: &str) -> Result<String, Abort> {
        let pattern = Regex::new(ENTITY_DECLARATION_PATTERN).unwrap();
        let mut budget = Budget::new(
            Instant::now() + Duration::from_secs(5),
            Arc::new(AtomicBool::new(false)),
            16,
            1024 * 1024,
        );
        render(text, &pattern, &mut budget)
    }

    #[test]
    fn test_blank_nodes_dropped_and_cdata_escaped() {
        let xml = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<complaint>\n  <message><![CDATA[a < b]]></message>\n  <!-- note -->\n</complaint>";
        assert_eq!(
            render_str(xml).unwrap(),
            "<?xml version=\"1.0\"?>\n<complaint><message>a &lt; b</message><!-- note --></complaint>"
        );
    }

    #[test]
    fn test_entities_substituted_in_text_and_attributes() {
        let xml = r#"<!DOCTYPE c [<!ENTITY who "Bjoern">]><c by="&who;">Hi &who;</c>"#;
        assert_eq!(
            render_str(xml).unwrap(),
            "<?xml version=\"1.0\"?>\n<c by=\"Bjoern\">Hi Bjoern</c>"
        );
    }

    #[test]
    fn test_empty_elements_kept() {
        assert_eq!(
            render_str("<a><b x='1'/></a>").unwrap(),
            "<?xml version=\"1.0\"?>\n<a><b x=\"1\"/></a>"
        );
    }

    #[test]
    fn test_malformed_documents() {
        for xml in ["", "<a><b></a>", "<a>", "<a/><b/>", "text only", "<a>&undefined;</a>"] {
            assert!(
                matches!(render_str(xml), Err(Abort::Malformed(_))),
                "{xml:?} should be malformed"
            );
        }
    }
}
