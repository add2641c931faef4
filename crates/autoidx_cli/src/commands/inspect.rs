//! Inspect command implementation.

use super::{read_dir_state, CommandError, CommandResult, DirState};
use crate::Format;
use autoidx_core::{FieldStorage, IndexDefinition, IndexField, IndexId};
use serde::Serialize;
use std::path::Path;

/// Definition view of one index.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Index identifier.
    pub id: u64,
    /// Index directory.
    pub path: String,
    /// Stored name.
    pub name: String,
    /// Index kind.
    pub kind: String,
    /// Lock mode.
    pub lock_mode: String,
    /// Source collections.
    pub collections: Vec<String>,
    /// Indexed fields.
    pub fields: Vec<FieldView>,
    /// Map sources of an authored index.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub maps: Vec<String>,
    /// Reduce source of a map-reduce index.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reduce: Option<String>,
    /// Output limit per document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_outputs_per_document: Option<u32>,
}

/// A field as shown by `inspect`.
#[derive(Debug, Serialize)]
pub struct FieldView {
    /// Field path.
    pub name: String,
    /// Sort option.
    pub sort: String,
    /// Whether the field is highlighted.
    pub highlighted: bool,
    /// Whether the raw value is stored.
    pub stored: bool,
}

impl From<&IndexField> for FieldView {
    fn from(field: &IndexField) -> Self {
        Self {
            name: field.name.clone(),
            sort: format!("{:?}", field.sort_option),
            highlighted: field.highlighted,
            stored: field.storage == FieldStorage::Yes,
        }
    }
}

/// Reads the definition stored for `id` under `root`.
pub fn collect(root: &Path, id: IndexId) -> CommandResult<InspectResult> {
    let dir = root.join(id.dir_name());
    if !dir.is_dir() {
        return Err(CommandError::MissingIndex(id));
    }
    let definition = match read_dir_state(&dir) {
        DirState::Ready(definition) => definition,
        DirState::Incomplete => return Err(CommandError::MissingIndex(id)),
        DirState::Failed(e) => return Err(e.into()),
    };

    let (maps, reduce, max_outputs_per_document) = match &definition {
        IndexDefinition::Static(def) => (
            def.maps().to_vec(),
            def.reduce().map(str::to_string),
            def.max_outputs_per_document(),
        ),
        IndexDefinition::Auto(_) => (Vec::new(), None, None),
    };

    Ok(InspectResult {
        id: id.as_u64(),
        path: dir.display().to_string(),
        name: definition.name().to_string(),
        kind: definition.kind().to_string(),
        lock_mode: format!("{:?}", definition.lock_mode()),
        collections: definition.collections().to_vec(),
        fields: definition.fields().iter().map(FieldView::from).collect(),
        maps,
        reduce,
        max_outputs_per_document,
    })
}

/// Runs the inspect command.
pub fn run(root: &Path, id: IndexId, format: Format) -> CommandResult<()> {
    let result = collect(root, id)?;
    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        Format::Text => print_text_output(&result),
    }
    Ok(())
}

fn print_text_output(result: &InspectResult) {
    println!("Index {}", result.id);
    println!("========");
    println!();
    println!("Name:        {}", result.name);
    println!("Kind:        {}", result.kind);
    println!("Lock mode:   {}", result.lock_mode);
    println!("Collections: {}", result.collections.join(", "));
    println!("Path:        {}", result.path);

    if !result.fields.is_empty() {
        println!();
        println!("Fields:");
        for field in &result.fields {
            let mut flags = Vec::new();
            if field.sort != "None" {
                flags.push(format!("sort={}", field.sort));
            }
            if field.highlighted {
                flags.push("highlighted".to_string());
            }
            if field.stored {
                flags.push("stored".to_string());
            }
            println!("  {} {}", field.name, flags.join(" "));
        }
    }

    for (i, map) in result.maps.iter().enumerate() {
        println!();
        println!("Map #{}:", i + 1);
        println!("  {map}");
    }
    if let Some(reduce) = &result.reduce {
        println!();
        println!("Reduce:");
        println!("  {reduce}");
    }
    if let Some(limit) = result.max_outputs_per_document {
        println!();
        println!("Max outputs per document: {limit}");
    }
}
