//! Benchmark utilities.

use autoidx_core::{
    AutoIndexDefinition, Index, IndexCatalog, IndexDefinition, IndexField, IndexId, SortOption,
    StaticIndexDefinition,
};
use std::sync::Arc;

/// Generates `count` fields with a mix of sort and highlight options.
pub fn generate_fields(count: usize) -> Vec<IndexField> {
    (0..count)
        .map(|i| {
            let field = IndexField::new(format!("Field{i:03}.Value"));
            match i % 3 {
                0 => field,
                1 => field.sorted(SortOption::Numeric),
                _ => field.highlighted(),
            }
        })
        .collect()
}

/// Generates an auto definition over `Users` with `field_count` fields.
pub fn auto_definition(field_count: usize) -> AutoIndexDefinition {
    AutoIndexDefinition::new("Users", generate_fields(field_count))
        .expect("generated fields are valid")
}

/// Generates a map-reduce definition with `field_count` fields.
pub fn static_definition(field_count: usize) -> StaticIndexDefinition {
    let mut builder = StaticIndexDefinition::builder("Orders/Totals")
        .collection("Orders")
        .map("from order in docs.Orders select new { order.Company, Count = 1, Total = order.Total }")
        .reduce("from result in results group result by result.Company into g select new { Company = g.Key, Count = g.Sum(x => x.Count) }")
        .max_outputs_per_document(16);
    for field in generate_fields(field_count) {
        builder = builder.field(field);
    }
    builder.build().expect("generated definition is valid")
}

/// Builds a catalog holding `count` in-memory auto indexes, one field each.
pub fn populated_catalog(count: usize) -> IndexCatalog {
    let catalog = IndexCatalog::new();
    for i in 0..count {
        let definition: IndexDefinition = AutoIndexDefinition::new(
            format!("Collection{}", i % 16),
            vec![IndexField::new(format!("Field{i}"))],
        )
        .expect("generated definition is valid")
        .into();
        let index = Index::create(catalog.next_id(), definition, None)
            .expect("in-memory index always opens");
        catalog
            .add(Arc::new(index))
            .expect("generated names are unique");
    }
    catalog
}

/// Returns the name of the `i`-th index of [`populated_catalog`].
pub fn catalog_name(i: usize) -> String {
    format!("Auto/Collection{}/ByField{i}", i % 16)
}

/// Returns the id of the `i`-th index of [`populated_catalog`].
pub fn catalog_id(i: usize) -> IndexId {
    IndexId::new(i as u64 + 1)
}
