use crate::core::normalize::csv::DEFAULT_TABLE_NAME;
use crate::core::serialize::xml::{ROOT_ELEMENT, TABLE_ELEMENT};
use crate::domain::format::Format;
use crate::domain::model::{Dataset, DatasetCollection, Value};
use crate::utils::error::{ConvertError, Result};
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashSet;

/// Minimal element tree; enough to decide which elements are rows and which are columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(bytes);
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            let event = reader.read_event_into(&mut buf).map_err(|e| {
                ConvertError::parse(
                    Format::Xml,
                    format!("error at position {}: {}", reader.buffer_position(), e),
                )
            })?;

            match event {
                Event::Start(start) => stack.push(element_from(&start)?),
                Event::Empty(start) => {
                    let element = element_from(&start)?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| ConvertError::parse(Format::Xml, "unexpected closing tag"))?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::Text(text) => {
                    let text = text
                        .unescape()
                        .map_err(|e| ConvertError::parse(Format::Xml, e.to_string()))?;
                    if let Some(current) = stack.last_mut() {
                        push_text(&mut current.text, &text);
                    }
                }
                Event::CData(data) => {
                    if let Some(current) = stack.last_mut() {
                        push_text(&mut current.text, &String::from_utf8_lossy(&data.into_inner()));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        if let Some(open) = stack.last() {
            return Err(ConvertError::parse(
                Format::Xml,
                format!("element <{}> is never closed", open.name),
            ));
        }
        root.ok_or_else(|| ConvertError::parse(Format::Xml, "document has no root element"))
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Carries at least one column: a child element or an attribute.
    pub fn is_record(&self) -> bool {
        !self.children.is_empty() || !self.attributes.is_empty()
    }

    /// Markup of this element's content, used for structure too deep to become columns.
    pub fn inner_xml(&self) -> String {
        let mut out = escape(self.text.as_str()).into_owned();
        for child in &self.children {
            child.write_xml(&mut out);
        }
        out
    }

    fn write_xml(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (key, value) in &self.attributes {
            out.push_str(&format!(" {}=\"{}\"", key, escape(value.as_str())));
        }
        out.push('>');
        out.push_str(&self.inner_xml());
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }

    fn descendants<'a>(&'a self, out: &mut Vec<&'a XmlElement>) {
        out.push(self);
        for child in &self.children {
            child.descendants(out);
        }
    }
}

/// Text split by child elements is joined with a single space.
fn push_text(text: &mut String, piece: &str) {
    if piece.is_empty() {
        return;
    }
    if !text.is_empty() {
        text.push(' ');
    }
    text.push_str(piece);
}

fn element_from(start: &BytesStart) -> Result<XmlElement> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut attributes = Vec::new();

    for attr in start.attributes() {
        let attr = attr.map_err(|e| ConvertError::parse(Format::Xml, e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        if key == "xmlns" || key.starts_with("xmlns:") {
            continue;
        }
        let value = attr
            .unescape_value()
            .map_err(|e| ConvertError::parse(Format::Xml, e.to_string()))?
            .into_owned();
        attributes.push((key, value));
    }

    Ok(XmlElement {
        name,
        attributes,
        ..Default::default()
    })
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> Result<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        Ok(())
    } else if root.is_none() {
        *root = Some(element);
        Ok(())
    } else {
        Err(ConvertError::parse(Format::Xml, "document has more than one root element"))
    }
}

/// Turns an element tree into named tables. Implementations are heuristics and may
/// be swapped without touching the rest of the pipeline.
pub trait XmlFlattener: Send + Sync {
    fn flatten(&self, root: &XmlElement) -> Vec<(String, Dataset)>;
}

/// Repeated children of the root are rows; their attributes and child elements are columns.
///
/// When every child of the root is itself a container of records and the containers are
/// distinguishable (a `name` attribute each, or distinct tags), each container becomes its
/// own table. A root without child elements degrades to a listing of elements.
#[derive(Debug, Clone, Copy, Default)]
pub struct SiblingRecordFlattener;

impl XmlFlattener for SiblingRecordFlattener {
    fn flatten(&self, root: &XmlElement) -> Vec<(String, Dataset)> {
        if is_table_group(root) {
            return root
                .children
                .iter()
                .map(|table| {
                    let name = table.attribute("name").unwrap_or(&table.name).to_string();
                    (name, rows_to_dataset(&table.children))
                })
                .collect();
        }

        if root.children.is_empty() {
            return vec![(DEFAULT_TABLE_NAME.to_string(), element_listing(root))];
        }

        // 子元素皆為葉節點時，根元素本身就是唯一的一列
        let dataset = if root.children.iter().all(|c| !c.is_record()) {
            Dataset::from_records(vec![record_of(root)])
        } else {
            rows_to_dataset(&root.children)
        };
        vec![(DEFAULT_TABLE_NAME.to_string(), dataset)]
    }
}

/// The serializer's own `<dataset><sheet name="…">` layout, recognized even when a
/// sheet has no rows.
fn is_sheet_document(root: &XmlElement) -> bool {
    root.name == ROOT_ELEMENT
        && !root.children.is_empty()
        && root
            .children
            .iter()
            .all(|sheet| sheet.name == TABLE_ELEMENT && sheet.attribute("name").is_some())
}

fn is_table_group(root: &XmlElement) -> bool {
    if is_sheet_document(root) {
        return true;
    }

    let containers_of_records = root
        .children
        .iter()
        .all(|table| table.children.iter().all(XmlElement::is_record));
    let has_rows = root.children.iter().any(|table| !table.children.is_empty());

    let all_named = root.children.iter().all(|t| t.attribute("name").is_some());
    let mut tags = HashSet::new();
    // 只有一個容器時無從比較標籤，視為一般資料列
    let distinct_tags =
        root.children.len() > 1 && root.children.iter().all(|t| tags.insert(t.name.as_str()));

    !root.children.is_empty() && containers_of_records && has_rows && (all_named || distinct_tags)
}

fn rows_to_dataset(rows: &[XmlElement]) -> Dataset {
    Dataset::from_records(rows.iter().map(record_of).collect())
}

fn record_of(element: &XmlElement) -> Vec<(String, Value)> {
    if !element.is_record() {
        return vec![(element.name.clone(), Value::text(element.text.trim()))];
    }

    let mut record: Vec<(String, Value)> = Vec::new();
    let mut push = |key: String, value: Value| {
        let mut name = key.clone();
        let mut n = 1;
        while record.iter().any(|(k, _)| *k == name) {
            name = format!("{}.{}", key, n);
            n += 1;
        }
        record.push((name, value));
    };

    for (key, value) in &element.attributes {
        push(key.clone(), Value::text(value.as_str()));
    }
    for child in &element.children {
        if child.is_leaf() {
            push(child.name.clone(), Value::text(child.text.trim()));
            for (key, value) in &child.attributes {
                push(format!("{}.{}", child.name, key), Value::text(value.as_str()));
            }
        } else {
            push(child.name.clone(), Value::text(child.inner_xml()));
        }
    }
    record
}

fn element_listing(root: &XmlElement) -> Dataset {
    let mut elements = Vec::new();
    root.descendants(&mut elements);

    let records = elements
        .into_iter()
        .map(|el| {
            let mut record = vec![
                ("tag".to_string(), Value::text(el.name.as_str())),
                ("text".to_string(), Value::text(el.text.trim())),
            ];
            record.extend(
                el.attributes
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::text(v.as_str()))),
            );
            record
        })
        .collect();
    Dataset::from_records(records)
}

pub fn read_xml(bytes: &[u8], flattener: &dyn XmlFlattener) -> Result<DatasetCollection> {
    let root = XmlElement::parse(bytes)?;
    let tables = flattener.flatten(&root);
    DatasetCollection::from_tables(tables)
        .map_err(|_| ConvertError::parse(Format::Xml, "no tabular structure found"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(xml: &str) -> DatasetCollection {
        read_xml(xml.as_bytes(), &SiblingRecordFlattener).unwrap()
    }

    #[test]
    fn test_repeated_siblings_become_rows() {
        let collection = read(
            r#"<?xml version="1.0"?>
            <library>
              <book id="1"><title>Dune</title><year>1965</year></book>
              <book id="2"><title>Emma</title></book>
            </library>"#,
        );

        assert_eq!(collection.names(), vec!["Sheet1"]);
        let (_, ds) = collection.first();
        assert_eq!(ds.column_names(), vec!["id", "title", "year"]);
        assert_eq!(ds.row_count(), 2);
        assert!(ds.column("year").unwrap().values[1].is_null());
    }

    #[test]
    fn test_deep_structure_is_serialized_as_text() {
        let collection = read(
            "<orders><order><id>7</id><items><item>pen</item><item>ink</item></items></order></orders>",
        );
        let (_, ds) = collection.first();
        assert_eq!(
            ds.column("items").unwrap().values[0],
            Value::text("<item>pen</item><item>ink</item>")
        );
    }

    #[test]
    fn test_named_sheets_become_tables() {
        let collection = read(
            r#"<dataset>
                 <sheet name="people"><row><name>Ann</name></row><row><name>Bo</name></row></sheet>
                 <sheet name="pets"><row><kind>cat</kind></row></sheet>
               </dataset>"#,
        );

        assert_eq!(collection.names(), vec!["people", "pets"]);
        assert_eq!(collection.get("people").unwrap().row_count(), 2);
        assert_eq!(collection.get("pets").unwrap().column_names(), vec!["kind"]);
    }

    #[test]
    fn test_unnamed_repeated_containers_stay_rows() {
        let collection = read(
            "<people><person><address><city>Oslo</city></address></person><person><address><city>Rome</city></address></person></people>",
        );
        assert_eq!(collection.len(), 1);
        assert_eq!(collection.first().1.row_count(), 2);
    }

    #[test]
    fn test_leaf_children_form_a_single_record() {
        let collection = read("<config><host>db</host><port>5432</port></config>");
        let (_, ds) = collection.first();
        assert_eq!(ds.row_count(), 1);
        assert_eq!(ds.column_names(), vec!["host", "port"]);
    }

    #[test]
    fn test_entities_and_cdata() {
        let collection = read("<r><x><a>Tom &amp; Jerry</a><b><![CDATA[<raw>]]></b></x></r>");
        let (_, ds) = collection.first();
        assert_eq!(ds.column("a").unwrap().values[0], Value::text("Tom & Jerry"));
        assert_eq!(ds.column("b").unwrap().values[0], Value::text("<raw>"));
    }

    #[test]
    fn test_childless_root_falls_back_to_listing() {
        let collection = read(r#"<note lang="en">hello</note>"#);
        let (_, ds) = collection.first();
        assert_eq!(ds.column_names(), vec!["tag", "text", "lang"]);
        assert_eq!(ds.column("text").unwrap().values[0], Value::text("hello"));
    }

    #[test]
    fn test_record_count_does_not_change_columns() {
        let one = read("<people><person><address><city>Oslo</city></address></person></people>");
        let two = read(
            "<people><person><address><city>Oslo</city></address></person><person><address><city>Rome</city></address></person></people>",
        );

        assert_eq!(one.names(), vec!["Sheet1"]);
        assert_eq!(one.names(), two.names());
        assert_eq!(one.first().1.column_names(), vec!["address"]);
        assert_eq!(one.first().1.column_names(), two.first().1.column_names());
        assert_eq!(
            one.first().1.column("address").unwrap().values[0],
            Value::text("<city>Oslo</city>")
        );
    }

    #[test]
    fn test_empty_sheet_stays_an_empty_table() {
        let collection = read(
            r#"<dataset><sheet name="empty"></sheet><sheet name="full"><row><a>1</a></row></sheet></dataset>"#,
        );

        assert_eq!(collection.names(), vec!["empty", "full"]);
        assert_eq!(collection.get("empty").unwrap().row_count(), 0);
        assert!(collection.get("empty").unwrap().column("name").is_none());

        let single = read(r#"<dataset><sheet name="Sheet1"/></dataset>"#);
        assert_eq!(single.names(), vec!["Sheet1"]);
        assert_eq!(single.first().1.row_count(), 0);
    }

    #[test]
    fn test_mixed_content_keeps_word_breaks() {
        let root = XmlElement::parse(b"<a>Hello <b>x</b> world</a>").unwrap();
        assert_eq!(root.text, "Hello world");
        assert_eq!(root.children[0].text, "x");
    }

    #[test]
    fn test_malformed_xml_is_parse_error() {
        let err = read_xml(b"<a><b></a>", &SiblingRecordFlattener).unwrap_err();
        assert!(matches!(err, ConvertError::Parse { format: Format::Xml, .. }));

        let err = read_xml(b"<a>", &SiblingRecordFlattener).unwrap_err();
        assert!(matches!(err, ConvertError::Parse { .. }));
    }
}
