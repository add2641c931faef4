//! List command implementation.

use super::{directory_size, format_size, read_dir_state, scan_root, CommandResult, DirState};
use crate::Format;
use serde::Serialize;
use std::path::Path;

/// One row of the listing.
#[derive(Debug, Serialize)]
pub struct IndexEntry {
    /// Index identifier.
    pub id: u64,
    /// `ready`, `incomplete` or `failed`.
    pub status: &'static str,
    /// Stored name, when readable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Index kind, when readable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Size of the directory's files in bytes.
    pub size: u64,
    /// Read error, for failed directories.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Listing of an index storage root.
#[derive(Debug, Serialize)]
pub struct ListResult {
    /// Root path.
    pub path: String,
    /// Index directories in id order.
    pub indexes: Vec<IndexEntry>,
    /// Sub-directories whose names are not identifiers.
    pub foreign: Vec<String>,
}

/// Builds the listing for `root`.
pub fn collect(root: &Path) -> CommandResult<ListResult> {
    let (ids, foreign) = scan_root(root)?;
    let indexes = ids
        .into_iter()
        .map(|id| {
            let dir = root.join(id.dir_name());
            let size = directory_size(&dir);
            let mut entry = IndexEntry {
                id: id.as_u64(),
                status: "ready",
                name: None,
                kind: None,
                size,
                error: None,
            };
            match read_dir_state(&dir) {
                DirState::Ready(definition) => {
                    entry.name = Some(definition.name().to_string());
                    entry.kind = Some(definition.kind().to_string());
                }
                DirState::Incomplete => entry.status = "incomplete",
                DirState::Failed(e) => {
                    entry.status = "failed";
                    entry.error = Some(e.to_string());
                }
            }
            entry
        })
        .collect();

    Ok(ListResult {
        path: root.display().to_string(),
        indexes,
        foreign,
    })
}

/// Runs the list command.
pub fn run(root: &Path, format: Format) -> CommandResult<()> {
    let result = collect(root)?;
    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        Format::Text => print_text_output(&result),
    }
    Ok(())
}

fn print_text_output(result: &ListResult) {
    println!("Index storage root: {}", result.path);
    println!();
    if result.indexes.is_empty() {
        println!("No index directories");
    }
    for entry in &result.indexes {
        match (&entry.name, &entry.kind) {
            (Some(name), Some(kind)) => println!(
                "  {:>6}  {:<10} {:<48} {}",
                entry.id,
                kind,
                name,
                format_size(entry.size)
            ),
            _ => println!(
                "  {:>6}  <{}> {}",
                entry.id,
                entry.status,
                entry.error.as_deref().unwrap_or("")
            ),
        }
    }
    if !result.foreign.is_empty() {
        println!();
        println!("Ignored entries: {}", result.foreign.join(", "));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::write_index;
    use autoidx_core::{AutoIndexDefinition, IndexField, StaticIndexDefinition};
    use tempfile::TempDir;

    #[test]
    fn lists_every_directory_with_status() {
        let temp = TempDir::new().unwrap();
        let auto = AutoIndexDefinition::new("Users", vec![IndexField::new("Name")]).unwrap();
        let totals = StaticIndexDefinition::builder("Orders/Totals")
            .collection("Orders")
            .map("from o in docs.Orders select new { o.Company, Count = 1 }")
            .reduce("from r in results group r by r.Company")
            .build()
            .unwrap();
        write_index(temp.path(), 4, &auto.into());
        write_index(temp.path(), 9, &totals.into());
        std::fs::create_dir_all(temp.path().join("6")).unwrap();
        std::fs::create_dir_all(temp.path().join("backup")).unwrap();

        let result = collect(temp.path()).unwrap();
        let rows: Vec<_> = result
            .indexes
            .iter()
            .map(|e| (e.id, e.status, e.kind.as_deref()))
            .collect();
        assert_eq!(
            rows,
            vec![
                (4, "ready", Some("AutoMap")),
                (6, "incomplete", None),
                (9, "ready", Some("MapReduce")),
            ]
        );
        assert!(result.indexes[0].size > 0);
        assert_eq!(result.foreign, vec!["backup".to_string()]);
    }

    #[test]
    fn json_output_omits_empty_fields() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("1")).unwrap();

        let result = collect(temp.path()).unwrap();
        let json = serde_json::to_value(&result).unwrap();
        let entry = &json["indexes"][0];
        assert_eq!(entry["status"], "incomplete");
        assert!(entry.get("name").is_none());
        assert!(entry.get("error").is_none());
    }
}
