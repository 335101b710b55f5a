use crate::domain::format::Format;
use crate::utils::error::{ConvertError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// One cell.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

impl Value {
    /// Text cell, with empty strings collapsed to Null.
    pub fn text(s: impl Into<String>) -> Self {
        let s = s.into();
        if s.is_empty() {
            Value::Null
        } else {
            Value::Text(s)
        }
    }

    pub fn from_f64(n: f64) -> Self {
        serde_json::Number::from_f64(n)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => serde_json::Value::Number(n.clone()),
            Value::Text(s) => serde_json::Value::String(s.clone()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n.into())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::from_f64(n)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// A single table: named columns of equal length.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    columns: Vec<Column>,
    row_count: usize,
}

impl Dataset {
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let row_count = columns.first().map(|c| c.values.len()).unwrap_or(0);
        let mut seen = HashSet::new();

        for column in &columns {
            if column.values.len() != row_count {
                return Err(ConvertError::InvalidDataset {
                    message: format!(
                        "column '{}' has {} rows, expected {}",
                        column.name,
                        column.values.len(),
                        row_count
                    ),
                });
            }
            if !seen.insert(column.name.as_str()) {
                return Err(ConvertError::InvalidDataset {
                    message: format!("duplicate column name '{}'", column.name),
                });
            }
        }

        Ok(Self { columns, row_count })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a table from a header row and data rows.
    ///
    /// Blank headers become `Unnamed: {i}`, repeated headers get `.1`, `.2` suffixes,
    /// short rows are padded with Null and long rows grow extra unnamed columns.
    pub fn from_rows(header: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        let width = rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(header.len()))
            .max()
            .unwrap_or(0);

        let names = unique_column_names(header, width);
        let mut columns: Vec<Column> = names
            .into_iter()
            .map(|name| Column::new(name, Vec::with_capacity(rows.len())))
            .collect();

        let row_count = rows.len();
        for row in rows {
            let mut cells = row.into_iter();
            for column in columns.iter_mut() {
                column.values.push(cells.next().unwrap_or(Value::Null));
            }
        }

        Self { columns, row_count }
    }

    /// Builds a table from rows of (column, value) pairs; columns are the union of
    /// keys in first-seen order and missing keys become Null.
    pub fn from_records(records: Vec<Vec<(String, Value)>>) -> Self {
        let mut names: Vec<String> = Vec::new();
        let mut index = std::collections::HashMap::new();
        for record in &records {
            for (key, _) in record {
                if !index.contains_key(key) {
                    index.insert(key.clone(), names.len());
                    names.push(key.clone());
                }
            }
        }

        let row_count = records.len();
        let mut columns: Vec<Column> = names
            .into_iter()
            .map(|name| Column::new(name, vec![Value::Null; row_count]))
            .collect();

        for (row, record) in records.into_iter().enumerate() {
            for (key, value) in record {
                columns[index[&key]].values[row] = value;
            }
        }

        Self { columns, row_count }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn row(&self, index: usize) -> Option<Vec<&Value>> {
        if index >= self.row_count {
            return None;
        }
        Some(self.columns.iter().map(|c| &c.values[index]).collect())
    }

    pub fn rows(&self) -> impl Iterator<Item = Vec<&Value>> + '_ {
        (0..self.row_count).map(move |i| self.columns.iter().map(|c| &c.values[i]).collect())
    }
}

fn unique_column_names(header: Vec<String>, width: usize) -> Vec<String> {
    let mut names = Vec::with_capacity(width);
    let mut used: HashSet<String> = HashSet::new();

    for i in 0..width {
        let base = header
            .get(i)
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| format!("Unnamed: {}", i));

        let mut name = base.clone();
        let mut n = 1;
        while used.contains(&name) {
            name = format!("{}.{}", base, n);
            n += 1;
        }
        used.insert(name.clone());
        names.push(name);
    }

    names
}

/// Named tables in insertion order. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetCollection {
    tables: Vec<(String, Dataset)>,
}

impl DatasetCollection {
    pub fn single(name: impl Into<String>, dataset: Dataset) -> Self {
        Self {
            tables: vec![(name.into(), dataset)],
        }
    }

    pub fn from_tables(tables: Vec<(String, Dataset)>) -> Result<Self> {
        let mut iter = tables.into_iter();
        let (name, first) = iter.next().ok_or_else(|| ConvertError::InvalidDataset {
            message: "a collection needs at least one table".to_string(),
        })?;

        let mut collection = Self::single(name, first);
        for (name, dataset) in iter {
            collection.push(name, dataset);
        }
        Ok(collection)
    }

    /// Adds a table, suffixing `_2`, `_3`, ... when the name is taken. Returns the name used.
    pub fn push(&mut self, name: impl Into<String>, dataset: Dataset) -> String {
        let base = name.into();
        let mut name = base.clone();
        let mut n = 2;
        while self.get(&name).is_some() {
            name = format!("{}_{}", base, n);
            n += 1;
        }
        self.tables.push((name.clone(), dataset));
        name
    }

    pub fn get(&self, name: &str) -> Option<&Dataset> {
        self.tables.iter().find(|(n, _)| n == name).map(|(_, d)| d)
    }

    pub fn first(&self) -> (&str, &Dataset) {
        let (name, dataset) = &self.tables[0];
        (name, dataset)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn names(&self) -> Vec<&str> {
        self.tables.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Dataset)> {
        self.tables.iter().map(|(n, d)| (n.as_str(), d))
    }

    pub fn preview(&self, max_rows: usize) -> Preview {
        let (name, dataset) = self.first();
        Preview {
            table_name: name.to_string(),
            columns: dataset.column_names().iter().map(|c| c.to_string()).collect(),
            rows: dataset
                .rows()
                .take(max_rows)
                .map(|row| row.iter().map(|v| v.to_string()).collect())
                .collect(),
            total_rows: dataset.row_count(),
            table_count: self.len(),
        }
    }
}

/// First rows of the first table, as display strings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Preview {
    pub table_name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub total_rows: usize,
    pub table_count: usize,
}

const PREVIEW_CELL_WIDTH: usize = 24;

impl fmt::Display for Preview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let clip = |s: &str| -> String {
            let flat = s.replace(['\n', '\r'], " ");
            if flat.chars().count() > PREVIEW_CELL_WIDTH {
                let cut: String = flat.chars().take(PREVIEW_CELL_WIDTH - 1).collect();
                format!("{}…", cut)
            } else {
                flat
            }
        };

        let header: Vec<String> = self.columns.iter().map(|c| clip(c.as_str())).collect();
        let body: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| row.iter().map(|c| clip(c.as_str())).collect())
            .collect();

        let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
        for row in &body {
            for (i, cell) in row.iter().enumerate() {
                if let Some(w) = widths.get_mut(i) {
                    *w = (*w).max(cell.chars().count());
                }
            }
        }

        let line = |cells: &[String]| -> String {
            cells
                .iter()
                .zip(&widths)
                .map(|(c, w)| format!("{:<width$}", c, width = *w))
                .collect::<Vec<_>>()
                .join(" | ")
        };

        if self.table_count > 1 {
            writeln!(f, "{} (1 of {} tables)", self.table_name, self.table_count)?;
        } else {
            writeln!(f, "{}", self.table_name)?;
        }
        writeln!(f, "{}", line(&header))?;
        writeln!(
            f,
            "{}",
            widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("-+-")
        )?;
        for row in &body {
            writeln!(f, "{}", line(row))?;
        }
        write!(f, "({} of {} rows shown)", self.rows.len(), self.total_rows)
    }
}

/// Non-fatal problems found while producing output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ConversionWarning {
    /// The target holds a single table, so only `kept` was written.
    LossyExport {
        format: Format,
        kept: String,
        dropped: Vec<String>,
    },
}

impl fmt::Display for ConversionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversionWarning::LossyExport {
                format,
                kept,
                dropped,
            } => write!(
                f,
                "{} holds a single table: exported '{}' and left out {} other table(s) ({}). Choose Excel, JSON or XML to keep every table",
                format,
                kept,
                dropped.len(),
                dropped.join(", ")
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SerializedOutput {
    pub format: Format,
    pub bytes: Vec<u8>,
    pub warnings: Vec<ConversionWarning>,
}

impl SerializedOutput {
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    pub fn extension(&self) -> &'static str {
        self.format.extension()
    }
}

/// Output of the transform phase.
#[derive(Debug, Clone)]
pub struct TransformResult {
    pub preview: Option<Preview>,
    pub table_names: Vec<String>,
    pub outputs: Vec<NamedOutput>,
    pub warnings: Vec<ConversionWarning>,
}

/// Bytes destined for one file.
#[derive(Debug, Clone)]
pub struct NamedOutput {
    pub file_name: String,
    pub bytes: Vec<u8>,
}
