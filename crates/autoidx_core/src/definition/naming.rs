//! Canonical index names.
//!
//! Auto-index names are derived from the collection and the field set:
//!
//! ```text
//! Auto/<collection>/By<A>And<B>[SortBy<..>][Highlight<..>]
//! ```
//!
//! Field tokens are sorted, so the same logical field set always produces
//! the same name. The name is the catalog's uniqueness key.

use crate::definition::field::IndexField;
use crate::error::{CoreError, CoreResult};

/// Prefix reserved for automatically generated index names.
pub const AUTO_INDEX_PREFIX: &str = "Auto/";

const FIELD_JOINER: &str = "And";
const SORT_SEGMENT: &str = "SortBy";
const HIGHLIGHT_SEGMENT: &str = "Highlight";
const INVALID_CHAR_PLACEHOLDER: char = '_';

/// Derives the canonical auto-index name for `collection` and `fields`.
///
/// # Errors
///
/// Returns [`CoreError::InvalidDefinition`] if the collection is blank or
/// there are no fields.
///
/// # Example
///
/// ```rust
/// use autoidx_core::{derive_auto_index_name, IndexField, SortOption};
///
/// let name = derive_auto_index_name(
///     "Users",
///     &[IndexField::new("Name").sorted(SortOption::String), IndexField::new("Age")],
/// )
/// .unwrap();
/// assert_eq!(name, "Auto/Users/ByAgeAndNameSortByName");
/// ```
pub fn derive_auto_index_name(collection: &str, fields: &[IndexField]) -> CoreResult<String> {
    if collection.trim().is_empty() {
        return Err(CoreError::invalid_definition("collection must not be empty"));
    }
    if fields.is_empty() {
        return Err(CoreError::invalid_definition(
            "an auto index needs at least one field",
        ));
    }

    let mut combined = sorted_tokens(fields.iter()).join(FIELD_JOINER);

    let sorted: Vec<_> = fields.iter().filter(|f| f.has_custom_sort()).collect();
    if !sorted.is_empty() {
        combined.push_str(SORT_SEGMENT);
        combined.push_str(&sorted_tokens(sorted.into_iter()).concat());
    }

    let highlighted: Vec<_> = fields.iter().filter(|f| f.highlighted).collect();
    if !highlighted.is_empty() {
        combined.push_str(HIGHLIGHT_SEGMENT);
        combined.push_str(&sorted_tokens(highlighted.into_iter()).concat());
    }

    Ok(format!("{AUTO_INDEX_PREFIX}{collection}/By{combined}"))
}

fn sorted_tokens<'a>(fields: impl Iterator<Item = &'a IndexField>) -> Vec<String> {
    let mut tokens: Vec<String> = fields.map(|f| field_display_token(&f.name)).collect();
    tokens.sort();
    tokens
}

/// Replaces characters that may not appear in an index name.
///
/// Letters, digits and `_` are kept; everything else (`.`, `,`, whitespace,
/// brackets, ...) becomes `_`, so `Address.City` reads `Address_City`.
#[must_use]
pub fn field_display_token(field_name: &str) -> String {
    field_name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' {
                c
            } else {
                INVALID_CHAR_PLACEHOLDER
            }
        })
        .collect()
}

/// Returns the case-insensitive identity key of an index name.
#[must_use]
pub fn name_key(name: &str) -> String {
    name.to_lowercase()
}

/// Returns true if `name` lives in the reserved auto-index namespace.
#[must_use]
pub fn is_auto_index_name(name: &str) -> bool {
    name.len() >= AUTO_INDEX_PREFIX.len()
        && name.is_char_boundary(AUTO_INDEX_PREFIX.len())
        && name[..AUTO_INDEX_PREFIX.len()].eq_ignore_ascii_case(AUTO_INDEX_PREFIX)
}

/// Validates an explicitly assigned index name.
///
/// # Errors
///
/// Returns [`CoreError::InvalidDefinition`] for blank names, names with
/// surrounding whitespace or control characters, and names using the
/// reserved `Auto/` prefix.
pub fn validate_index_name(name: &str) -> CoreResult<()> {
    if name.trim().is_empty() {
        return Err(CoreError::invalid_definition("index name must not be empty"));
    }
    if name.trim() != name {
        return Err(CoreError::invalid_definition(format!(
            "index name '{name}' has leading or trailing whitespace"
        )));
    }
    if name.chars().any(char::is_control) {
        return Err(CoreError::invalid_definition(format!(
            "index name '{}' contains control characters",
            name.escape_debug()
        )));
    }
    if is_auto_index_name(name) {
        return Err(CoreError::invalid_definition(format!(
            "index name '{name}' uses the reserved '{AUTO_INDEX_PREFIX}' prefix"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::field::SortOption;
    use proptest::prelude::*;

    #[test]
    fn single_field() {
        let name = derive_auto_index_name("Users", &[IndexField::new("Name")]).unwrap();
        assert_eq!(name, "Auto/Users/ByName");
    }

    #[test]
    fn sort_segment() {
        let fields = [IndexField::new("Name").sorted(SortOption::String)];
        let name = derive_auto_index_name("Users", &fields).unwrap();
        assert_eq!(name, "Auto/Users/ByNameSortByName");
    }

    #[test]
    fn sort_segment_precedes_highlight_segment() {
        let fields = [IndexField::new("Name")
            .sorted(SortOption::String)
            .highlighted()];
        let name = derive_auto_index_name("Users", &fields).unwrap();
        assert_eq!(name, "Auto/Users/ByNameSortByNameHighlightName");
    }

    #[test]
    fn segments_list_only_flagged_fields() {
        let fields = [
            IndexField::new("Zip").highlighted(),
            IndexField::new("Age").sorted(SortOption::Numeric),
            IndexField::new("City").highlighted(),
            IndexField::new("Name"),
        ];
        let name = derive_auto_index_name("Users", &fields).unwrap();
        assert_eq!(
            name,
            "Auto/Users/ByAgeAndCityAndNameAndZipSortByAgeHighlightCityZip"
        );
    }

    #[test]
    fn invalid_characters_replaced() {
        let fields = [IndexField::new("Address.City"), IndexField::new("Tags[]")];
        let name = derive_auto_index_name("Orders", &fields).unwrap();
        assert_eq!(name, "Auto/Orders/ByAddress_CityAndTags__");
    }

    #[test]
    fn empty_inputs_rejected() {
        assert!(matches!(
            derive_auto_index_name("", &[IndexField::new("Name")]),
            Err(CoreError::InvalidDefinition { .. })
        ));
        assert!(matches!(
            derive_auto_index_name("Users", &[]),
            Err(CoreError::InvalidDefinition { .. })
        ));
    }

    #[test]
    fn auto_prefix_detection() {
        assert!(is_auto_index_name("Auto/Users/ByName"));
        assert!(is_auto_index_name("auto/users/byname"));
        assert!(!is_auto_index_name("Automatic"));
        assert!(!is_auto_index_name("Users/ByName"));
    }

    #[test]
    fn explicit_names() {
        assert!(validate_index_name("Users/Search").is_ok());
        assert!(validate_index_name("").is_err());
        assert!(validate_index_name(" Users").is_err());
        assert!(validate_index_name("Users\n").is_err());
        assert!(validate_index_name("Auto/Users/ByName").is_err());
    }

    #[test]
    fn name_key_is_case_insensitive() {
        assert_eq!(name_key("Auto/Users/ByName"), name_key("AUTO/USERS/BYNAME"));
    }

    fn field_strategy() -> impl Strategy<Value = IndexField> {
        (
            "[A-Za-z][A-Za-z0-9_.]{0,12}",
            prop_oneof![
                Just(SortOption::None),
                Just(SortOption::String),
                Just(SortOption::Numeric)
            ],
            any::<bool>(),
        )
            .prop_map(|(name, sort, highlighted)| {
                let field = IndexField::new(name).sorted(sort);
                if highlighted {
                    field.highlighted()
                } else {
                    field
                }
            })
    }

    proptest! {
        #[test]
        fn derivation_is_order_independent(
            fields in prop::collection::vec(field_strategy(), 1..6),
            seed in any::<u64>(),
        ) {
            let mut shuffled = fields.clone();
            // deterministic rotation + reversal stands in for a shuffle
            let len = shuffled.len();
            shuffled.rotate_left((seed as usize) % len);
            if seed % 2 == 0 {
                shuffled.reverse();
            }

            let a = derive_auto_index_name("Users", &fields).unwrap();
            let b = derive_auto_index_name("Users", &shuffled).unwrap();
            prop_assert_eq!(a, b);
        }
    }
}
