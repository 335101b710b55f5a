use crate::domain::format::Format;
use crate::domain::model::{Dataset, DatasetCollection};
use crate::utils::error::{ConvertError, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use regex::Regex;
use std::collections::HashSet;
use std::io::Cursor;

pub const ROOT_ELEMENT: &str = "dataset";
pub const TABLE_ELEMENT: &str = "sheet";
pub const ROW_ELEMENT: &str = "row";
const FALLBACK_ELEMENT: &str = "field";

type XmlWriter = Writer<Cursor<Vec<u8>>>;

/// `<dataset><sheet name="..."><row><column>value</column>...</row></sheet></dataset>`
pub fn write_xml(collection: &DatasetCollection) -> Result<Vec<u8>> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

    emit(&mut writer, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    emit(&mut writer, Event::Start(BytesStart::new(ROOT_ELEMENT)))?;

    for (name, dataset) in collection.iter() {
        let mut sheet = BytesStart::new(TABLE_ELEMENT);
        sheet.push_attribute(("name", name));
        emit(&mut writer, Event::Start(sheet))?;
        write_rows(&mut writer, dataset)?;
        emit(&mut writer, Event::End(BytesEnd::new(TABLE_ELEMENT)))?;
    }

    emit(&mut writer, Event::End(BytesEnd::new(ROOT_ELEMENT)))?;
    Ok(writer.into_inner().into_inner())
}

fn emit(writer: &mut XmlWriter, event: Event<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| ConvertError::export(Format::Xml, e.to_string()))
}

fn write_rows(writer: &mut XmlWriter, dataset: &Dataset) -> Result<()> {
    let tags = element_names(&dataset.column_names());

    for row in dataset.rows() {
        emit(writer, Event::Start(BytesStart::new(ROW_ELEMENT)))?;
        for (tag, value) in tags.iter().zip(row) {
            if value.is_null() {
                emit(writer, Event::Empty(BytesStart::new(tag.as_str())))?;
            } else {
                let text = value.to_string();
                emit(writer, Event::Start(BytesStart::new(tag.as_str())))?;
                emit(writer, Event::Text(BytesText::new(&text)))?;
                emit(writer, Event::End(BytesEnd::new(tag.as_str())))?;
            }
        }
        emit(writer, Event::End(BytesEnd::new(ROW_ELEMENT)))?;
    }
    Ok(())
}

/// Column names as valid, distinct XML element names.
pub fn element_names(columns: &[&str]) -> Vec<String> {
    let invalid = Regex::new(r"[^\w.\-]").expect("element name pattern is valid");
    let mut used = HashSet::new();

    columns
        .iter()
        .map(|column| {
            let mut tag = invalid.replace_all(column.trim(), "_").into_owned();
            let starts_ok = tag
                .chars()
                .next()
                .is_some_and(|c| c.is_alphabetic() || c == '_');
            if tag.is_empty() || tag.chars().all(|c| c == '_') {
                tag = FALLBACK_ELEMENT.to_string();
            } else if !starts_ok || tag.to_ascii_lowercase().starts_with("xml") {
                tag = format!("_{}", tag);
            }

            let base = tag.clone();
            let mut n = 2;
            while !used.insert(tag.clone()) {
                tag = format!("{}_{}", base, n);
                n += 1;
            }
            tag
        })
        .collect()
}
