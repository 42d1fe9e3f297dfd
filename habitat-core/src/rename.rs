//! Attribute renaming from verbose source names to short canonical names.

use std::collections::BTreeMap;

use crate::feature::AttributeValue;

/// Renames applied to VRI attributes, in application order.
pub const VRI_ATTRIBUTE_RENAMES: [(&str, &str); 21] = [
    ("BCLCS_LEVEL_1", "BCLCS_LV_1"),
    ("BCLCS_LEVEL_2", "BCLCS_LV_2"),
    ("BCLCS_LEVEL_3", "BCLCS_LV_3"),
    ("BCLCS_LEVEL_4", "BCLCS_LV_4"),
    ("BCLCS_LEVEL_5", "BCLCS_LV_5"),
    ("SPECIES_CD_1", "SPEC_CD_1"),
    ("SPECIES_CD_2", "SPEC_CD_2"),
    ("SPECIES_CD_3", "SPEC_CD_3"),
    ("SPECIES_CD_4", "SPEC_CD_4"),
    ("SPECIES_CD_5", "SPEC_CD_5"),
    ("SPECIES_CD_6", "SPEC_CD_6"),
    ("SPECIES_PCT_1", "SPEC_PCT_1"),
    ("SPECIES_PCT_2", "SPEC_PCT_2"),
    ("SPECIES_PCT_3", "SPEC_PCT_3"),
    ("SPECIES_PCT_4", "SPEC_PCT_4"),
    ("SPECIES_PCT_5", "SPEC_PCT_5"),
    ("SPECIES_PCT_6", "SPEC_PCT_6"),
    ("PROJ_HEIGHT_1", "PROJ_HT_1"),
    ("CROWN_CLOSURE", "CR_CLOSURE"),
    ("HARVEST_DATE", "HRVSTDT"),
    ("LINE_7B_DISTURBANCE_HISTORY", "LINE7B_DH"),
];

/// Rename attribute keys in place using `(source, canonical)` pairs.
///
/// Pairs whose source key is absent are skipped. When the canonical key is
/// already present the existing value wins and the source key is dropped,
/// so renaming an already canonical map is a no-op.
///
/// Returns the number of keys that were renamed.
///
/// # Examples
/// ```
/// use std::collections::BTreeMap;
/// use habitat_core::{AttributeValue, rename_attributes};
///
/// let mut attributes = BTreeMap::from([
///     ("CROWN_CLOSURE".to_owned(), AttributeValue::Integer(40)),
///     ("POLY_ID".to_owned(), AttributeValue::Integer(7)),
/// ]);
/// let renamed = rename_attributes(&mut attributes, &[("CROWN_CLOSURE", "CR_CLOSURE")]);
///
/// assert_eq!(renamed, 1);
/// assert_eq!(attributes.get("CR_CLOSURE"), Some(&AttributeValue::Integer(40)));
/// assert!(attributes.contains_key("POLY_ID"));
/// ```
pub fn rename_attributes(
    attributes: &mut BTreeMap<String, AttributeValue>,
    pairs: &[(&str, &str)],
) -> usize {
    let mut renamed = 0;
    for &(source, canonical) in pairs {
        let Some(value) = attributes.remove(source) else {
            continue;
        };
        if attributes.contains_key(canonical) {
            continue;
        }
        attributes.insert(canonical.to_owned(), value);
        renamed += 1;
    }
    renamed
}
