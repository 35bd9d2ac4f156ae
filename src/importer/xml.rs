use std::path::Path;

use anyhow::{Context, Result};
use quick_xml::events::Event;
use quick_xml::Reader;

use super::{collect_records, ImportOutcome, Importer, RawRecord, Source};

/// Imports an XML dependency report:
///
/// ```xml
/// <dependencies>
///   <dependency>
///     <group>npm</group>
///     <name>react</name>
///     <version>18.2.0</version>
///     <licenses><license>MIT</license></licenses>
///   </dependency>
/// </dependencies>
/// ```
///
/// `groupId`/`artifactId` are accepted for `group`/`name`, and POM-style
/// `<license><name>…</name></license>` for the license text.
pub struct XmlImporter {
    source: Source,
}

impl XmlImporter {
    pub fn new(name: &str, path: &Path) -> Self {
        XmlImporter {
            source: Source::new(name, path),
        }
    }
}

impl Importer for XmlImporter {
    fn name(&self) -> &str {
        &self.source.name
    }

    fn path(&self) -> &Path {
        &self.source.path
    }

    fn import(&self) -> Result<ImportOutcome> {
        let content = std::fs::read_to_string(&self.source.path)
            .with_context(|| format!("Failed to read import file {}", self.source.path.display()))?;
        let records = parse_records(&content)
            .with_context(|| format!("Failed to parse import file {}", self.source.path.display()))?;
        Ok(collect_records(records, &self.source.name, &self.source.path))
    }
}

/// Parse `<dependency>` elements using the quick-xml event API.
fn parse_records(xml: &str) -> Result<Vec<RawRecord>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut records = Vec::new();
    let mut buf = Vec::new();
    // Open element names, innermost last.
    let mut stack: Vec<String> = Vec::new();
    let mut current: Option<RawRecord> = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => {
                let tag = String::from_utf8_lossy(e.name().local_name().as_ref()).into_owned();
                if tag == "dependency" {
                    current = Some(RawRecord::default());
                }
                stack.push(tag);
            }
            Event::End(ref e) => {
                let tag = String::from_utf8_lossy(e.name().local_name().as_ref()).into_owned();
                if tag == "dependency" {
                    if let Some(record) = current.take() {
                        records.push(record);
                    }
                }
                stack.pop();
            }
            Event::Text(ref e) => {
                if let Some(record) = current.as_mut() {
                    let text = e.unescape()?.to_string();
                    assign_text(record, &stack, text);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(records)
}

fn assign_text(record: &mut RawRecord, stack: &[String], text: String) {
    let tag = stack.last().map(String::as_str);
    let parent = stack.len().checked_sub(2).map(|i| stack[i].as_str());

    match (parent, tag) {
        (Some("dependency"), Some("group" | "groupId")) => record.group = Some(text),
        (Some("dependency"), Some("name" | "artifactId")) => record.name = Some(text),
        (Some("dependency"), Some("version")) => record.version = Some(text),
        (_, Some("license")) => record.licenses.push(text),
        (Some("license"), Some("name")) => record.licenses.push(text),
        _ => {}
    }
}
