//! # Corpus
//! Corpora of schematized text records. Each record consists of several named fields
//! containing string values, and every record in a [`RecordSet`] shares the same ordered
//! field schema.
//!
//! Record sets persist to two file encodings selected by extension: tab-delimited rows
//! with a header line (`.tsv`), or a YAML sequence of mappings (`.yaml`) where
//! multi-line values use a block literal. Loading and saving are exact inverses for
//! values free of the encoding's reserved characters.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};

use crate::corpus::errors::{RowCountMismatch, SchemaConflictError, SchemaMismatchError};
use crate::template::FieldValues;

/// A single schematized record: an immutable mapping from field name to string value.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    field_values: HashMap<String, String>,
}

impl Record {
    pub fn new(field_values: HashMap<String, String>) -> Self {
        Self { field_values }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.field_values.get(field).map(String::as_str)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.field_values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.field_values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.field_values.is_empty()
    }

    /// Concatenate two records with disjoint field sets into one record holding the
    /// union of their fields.
    pub fn concat(&self, other: &Record) -> Result<Record, SchemaConflictError> {
        let overlapping: Vec<String> = self
            .field_values
            .keys()
            .filter(|field| other.field_values.contains_key(*field))
            .cloned()
            .collect();
        if !overlapping.is_empty() {
            return Err(SchemaConflictError::new(overlapping, "record concatenation"));
        }
        let mut field_values = self.field_values.clone();
        field_values.extend(
            other
                .field_values
                .iter()
                .map(|(field, value)| (field.clone(), value.clone())),
        );
        Ok(Record::new(field_values))
    }
}

impl FieldValues for Record {
    fn value_of(&self, key: &str) -> Option<&str> {
        self.get(key)
    }
}

impl From<HashMap<String, String>> for Record {
    fn from(field_values: HashMap<String, String>) -> Self {
        Record::new(field_values)
    }
}

/// An ordered corpus of records sharing one field schema.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSet {
    fields: Vec<String>,
    records: Vec<Record>,
}

impl RecordSet {
    /// Build a record set, validating that the field names are distinct and that every
    /// record's field set equals the schema.
    pub fn new(fields: Vec<String>, records: Vec<Record>) -> Result<Self, SchemaMismatchError> {
        let field_set: HashSet<&str> = fields.iter().map(String::as_str).collect();
        if field_set.len() != fields.len() {
            return Err(SchemaMismatchError::duplicate_fields(&fields));
        }
        for (row, record) in records.iter().enumerate() {
            if record.len() != fields.len()
                || !record.fields().all(|field| field_set.contains(field))
            {
                return Err(SchemaMismatchError::row(&fields, record, row));
            }
        }
        Ok(Self { fields, records })
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.iter()
    }

    /// Row-wise join of two record sets with disjoint field schemas and equal record
    /// counts. The result has the concatenated field list and row-paired record
    /// concatenation.
    pub fn join(&self, other: &RecordSet) -> Result<RecordSet> {
        let overlapping: Vec<String> = self
            .fields
            .iter()
            .filter(|field| other.fields.contains(field))
            .cloned()
            .collect();
        if !overlapping.is_empty() {
            return Err(SchemaConflictError::new(overlapping, "record set join").into());
        }
        if self.len() != other.len() {
            return Err(RowCountMismatch::new(self.len(), other.len()).into());
        }

        let fields: Vec<String> = self.fields.iter().chain(other.fields.iter()).cloned().collect();
        let records = self
            .records
            .iter()
            .zip(other.records.iter())
            .map(|(left, right)| left.concat(right))
            .collect::<Result<Vec<Record>, SchemaConflictError>>()?;
        Ok(RecordSet::new(fields, records)?)
    }

    /// Load a record set from a `.tsv` or `.yaml` file; any other extension is rejected.
    pub fn load(path: impl AsRef<Path>) -> Result<RecordSet> {
        let path = path.as_ref();
        match extension_of(path).as_deref() {
            Some("tsv") => Self::load_tsv(path),
            Some("yaml") => Self::load_yaml(path),
            _ => bail!(
                "record set file '{}' must have a .tsv or .yaml extension",
                path.display()
            ),
        }
    }

    /// Save the record set to a `.tsv` or `.yaml` file; any other extension is rejected.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        match extension_of(path).as_deref() {
            Some("tsv") => self.save_tsv(path),
            Some("yaml") => self.save_yaml(path),
            _ => bail!(
                "record set file '{}' must have a .tsv or .yaml extension",
                path.display()
            ),
        }
    }

    fn load_tsv(path: &Path) -> Result<RecordSet> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .quoting(false)
            .from_path(path)
            .with_context(|| format!("opening record set file '{}'", path.display()))?;
        let fields: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let mut records = Vec::new();
        for row in reader.records() {
            let row = row.with_context(|| format!("reading record set file '{}'", path.display()))?;
            let field_values: HashMap<String, String> = fields
                .iter()
                .cloned()
                .zip(row.iter().map(str::to_string))
                .collect();
            records.push(Record::new(field_values));
        }
        Ok(RecordSet::new(fields, records)?)
    }

    fn save_tsv(&self, path: &Path) -> Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .quote_style(csv::QuoteStyle::Never)
            .from_path(path)
            .with_context(|| format!("creating record set file '{}'", path.display()))?;
        writer.write_record(&self.fields)?;
        for record in &self.records {
            writer.write_record(self.fields.iter().map(|field| record.get(field).unwrap_or_default()))?;
        }
        writer.flush()?;
        Ok(())
    }

    fn load_yaml(path: &Path) -> Result<RecordSet> {
        let file = fs::File::open(path)
            .with_context(|| format!("opening record set file '{}'", path.display()))?;
        let rows: Vec<serde_yaml::Mapping> = serde_yaml::from_reader(file)
            .with_context(|| format!("reading record set file '{}'", path.display()))?;
        let first = rows
            .first()
            .ok_or_else(|| anyhow!("record set file '{}' contains no rows", path.display()))?;
        let fields = first
            .keys()
            .map(yaml_string)
            .collect::<Result<Vec<String>>>()?;
        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            let field_values = fields
                .iter()
                .map(|field| {
                    let value = row.get(field.as_str()).ok_or_else(|| {
                        anyhow!(
                            "record set file '{}' is missing field '{}' in a row",
                            path.display(),
                            field
                        )
                    })?;
                    Ok((field.clone(), yaml_string(value)?))
                })
                .collect::<Result<HashMap<String, String>>>()?;
            records.push(Record::new(field_values));
        }
        Ok(RecordSet::new(fields, records)?)
    }

    fn save_yaml(&self, path: &Path) -> Result<()> {
        let mut out = String::new();
        for record in &self.records {
            out.push_str("-\n");
            for field in &self.fields {
                let value = record.get(field).unwrap_or_default();
                if value.contains('\n') {
                    out.push_str(&format!("  {}: |2-\n", field));
                    for line in value.split('\n') {
                        out.push_str(&format!("    {}\n", line));
                    }
                } else {
                    out.push_str(&format!("  {}: '{}'\n", field, value));
                }
            }
        }
        fs::write(path, out)
            .with_context(|| format!("writing record set file '{}'", path.display()))?;
        Ok(())
    }
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|extension| extension.to_str())
        .map(str::to_lowercase)
}

fn yaml_string(value: &serde_yaml::Value) -> Result<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| anyhow!("expected a string value in record set row, got {:?}", value))
}

pub mod errors {
    use std::error::Error;
    use std::fmt;
    use std::fmt::Formatter;

    use super::Record;

    /// Error when two schemas that must be disjoint share field names.
    #[derive(Debug, Clone)]
    pub struct SchemaConflictError {
        pub overlapping: Vec<String>,
        pub operation: String,
    }

    impl SchemaConflictError {
        pub(crate) fn new(overlapping: Vec<String>, operation: impl Into<String>) -> Self {
            Self {
                overlapping,
                operation: operation.into(),
            }
        }
    }

    impl fmt::Display for SchemaConflictError {
        fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
            write!(
                f,
                "SchemaConflictError: fields {:?} occur on both sides of {}",
                self.overlapping, self.operation
            )
        }
    }

    impl Error for SchemaConflictError {}

    /// Error when joining two record sets with different record counts.
    #[derive(Debug, Clone)]
    pub struct RowCountMismatch {
        pub left: usize,
        pub right: usize,
    }

    impl RowCountMismatch {
        pub(crate) fn new(left: usize, right: usize) -> Self {
            Self { left, right }
        }
    }

    impl fmt::Display for RowCountMismatch {
        fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
            write!(
                f,
                "RowCountMismatch: joined record sets must contain the same number of rows, got {} and {}",
                self.left, self.right
            )
        }
    }

    impl Error for RowCountMismatch {}

    /// Error when a record set is constructed with duplicate field names or a record
    /// whose field set does not equal the schema.
    #[derive(Debug, Clone)]
    pub struct SchemaMismatchError {
        pub fields: Vec<String>,
        pub detail: String,
    }

    impl SchemaMismatchError {
        pub(crate) fn duplicate_fields(fields: &[String]) -> Self {
            Self {
                fields: fields.to_vec(),
                detail: "field names must be distinct".to_string(),
            }
        }

        pub(crate) fn row(fields: &[String], record: &Record, row: usize) -> Self {
            Self {
                fields: fields.to_vec(),
                detail: format!(
                    "record at row {} has fields {:?}",
                    row,
                    record.fields().collect::<Vec<_>>()
                ),
            }
        }
    }

    impl fmt::Display for SchemaMismatchError {
        fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
            write!(
                f,
                "SchemaMismatchError: record set with fields {:?}: {}",
                self.fields, self.detail
            )
        }
    }

    impl Error for SchemaMismatchError {}
}
