//! Serde helpers shared by the wire types of both services.

use serde::{Deserialize, Deserializer};

/// Decode `null` the same way as a missing key: as `T::default()`.
///
/// Pair with `#[serde(default)]` so both absent and explicit-null fields
/// fall back silently.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    let value: Option<T> = Option::deserialize(deserializer)?;
    Ok(value.unwrap_or_default())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Sample {
        #[serde(default, deserialize_with = "super::null_as_default")]
        count: i32,
        #[serde(default, deserialize_with = "super::null_as_default")]
        tags: Vec<String>,
    }

    #[test]
    fn test_null_missing_and_present() {
        let nulls: Sample = serde_json::from_str(r#"{"count": null, "tags": null}"#).unwrap();
        assert_eq!(nulls.count, 0);
        assert!(nulls.tags.is_empty());

        let missing: Sample = serde_json::from_str("{}").unwrap();
        assert_eq!(missing.count, 0);

        let present: Sample = serde_json::from_str(r#"{"count": 3, "tags": ["a"]}"#).unwrap();
        assert_eq!(present.count, 3);
        assert_eq!(present.tags, vec!["a".to_string()]);
    }

    #[test]
    fn test_wrong_type_still_fails() {
        assert!(serde_json::from_str::<Sample>(r#"{"count": "many"}"#).is_err());
    }
}
