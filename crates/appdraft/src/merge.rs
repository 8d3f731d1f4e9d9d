//! Merge machinery for the two ways a document absorbs external input.
//!
//! Session construction uses [`deep_merge`], which never removes keys. The
//! raw-document editing mode uses RFC 7386 merge-patch semantics instead
//! ([`apply_merge_patch`]), where `null` leaves delete keys.

use serde_json::Value;
use snafu::{ResultExt, Snafu, ensure};

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to parse document patch"))]
    ParsePatch { source: serde_yaml::Error },

    #[snafu(display("document patch must be a mapping at the top level"))]
    PatchNotAMapping,
}

/// Non-destructive deep merge of `overlay` into `base`.
///
/// Objects merge key-wise recursively, scalars and arrays replace wholesale,
/// `null` overlay values are skipped. Unlike a merge-patch, this can never
/// truncate sibling keys of the base.
pub fn deep_merge(base: &mut Value, overlay: &Value) {
    if let (Value::Object(base_map), Value::Object(overlay_map)) = (&mut *base, overlay) {
        for (key, overlay_value) in overlay_map {
            if overlay_value.is_null() {
                continue;
            }
            match base_map.get_mut(key) {
                Some(base_value) => deep_merge(base_value, overlay_value),
                None => {
                    base_map.insert(key.clone(), overlay_value.clone());
                }
            }
        }
    } else if !overlay.is_null() {
        *base = overlay.clone();
    }
}

/// Parses the textual patch submitted from the raw-document editor.
///
/// Accepts YAML (and therefore JSON). Anything that does not parse into a
/// top-level mapping is rejected before it can touch the document.
pub fn parse_patch(text: &str) -> Result<Value, Error> {
    let patch: Value = serde_yaml::from_str(text).context(ParsePatchSnafu)?;
    ensure!(patch.is_object(), PatchNotAMappingSnafu);
    Ok(patch)
}

/// Applies an RFC 7386 merge-patch: object keys deep-merge, `null` leaves
/// delete the corresponding key, arrays and scalars replace wholesale.
pub fn apply_merge_patch(doc: &mut Value, patch: &Value) {
    json_patch::merge(doc, patch);
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn deep_merge_preserves_siblings() {
        let mut base = json!({"a": 1, "b": {"c": 2, "d": 3}});
        deep_merge(&mut base, &json!({"b": {"c": 9}}));

        assert_eq!(base, json!({"a": 1, "b": {"c": 9, "d": 3}}));
    }

    #[test]
    fn deep_merge_replaces_arrays_wholesale() {
        let mut base = json!({"list": [1, 2, 3]});
        deep_merge(&mut base, &json!({"list": [4]}));

        assert_eq!(base, json!({"list": [4]}));
    }

    #[test]
    fn deep_merge_ignores_null_overlay_values() {
        let mut base = json!({"a": 1, "b": 2});
        deep_merge(&mut base, &json!({"a": null, "c": null}));

        assert_eq!(base, json!({"a": 1, "b": 2}));
    }

    #[test]
    fn merge_patch_deletes_on_null() {
        let mut doc = json!({"a": 1, "b": {"c": 2}});
        apply_merge_patch(&mut doc, &json!({"b": {"c": null, "d": 3}}));

        assert_eq!(doc, json!({"a": 1, "b": {"d": 3}}));
    }

    #[test]
    fn parse_patch_accepts_yaml_and_json() {
        let from_yaml = parse_patch("spec:\n  project: default\n").expect("YAML patch parses");
        let from_json = parse_patch(r#"{"spec": {"project": "default"}}"#)
            .expect("JSON patch parses");

        assert_eq!(from_yaml, from_json);
    }

    #[test]
    fn parse_patch_rejects_malformed_input() {
        assert!(parse_patch("{not yaml: [").is_err());
        assert!(parse_patch("just a string").is_err());
        assert!(parse_patch("- a\n- list").is_err());
    }
}
