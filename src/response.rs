//! Raw-plus-typed accessors over response bodies.

use serde::de::DeserializeOwned;

use crate::error::{DecodeError, NormalizeError};
use crate::normalize::{join_items, normalize_collection, normalize_entity};

/// Body of a single-entity response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityResponse(Vec<u8>);

impl EntityResponse {
    pub fn new(raw: Vec<u8>) -> Self {
        Self(raw)
    }

    /// Body exactly as received.
    pub fn raw(&self) -> &[u8] {
        &self.0
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.0
    }

    /// Canonical entity bytes regardless of metadata verbosity.
    pub fn normalized(&self) -> Result<Vec<u8>, NormalizeError> {
        normalize_entity(&self.0)
    }

    /// Normalize and decode into `T`.
    pub fn unmarshal<T: DeserializeOwned>(&self) -> Result<T, DecodeError> {
        let bytes = self.normalized()?;
        serde_json::from_slice(&bytes).map_err(|source| DecodeError::Json { source })
    }
}

/// Body of a collection response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionResponse(Vec<u8>);

impl CollectionResponse {
    pub fn new(raw: Vec<u8>) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> &[u8] {
        &self.0
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.0
    }

    /// Canonical collection bytes: a JSON array of items.
    pub fn normalized(&self) -> Result<Vec<u8>, NormalizeError> {
        normalize_collection(&self.0).map(|items| join_items(&items))
    }

    /// Items in response order, each as an entity response.
    pub fn data(&self) -> Result<Vec<EntityResponse>, NormalizeError> {
        Ok(normalize_collection(&self.0)?
            .into_iter()
            .map(EntityResponse)
            .collect())
    }

    /// Normalize and decode all items into `Vec<T>`.
    pub fn unmarshal<T: DeserializeOwned>(&self) -> Result<Vec<T>, DecodeError> {
        let bytes = self.normalized()?;
        serde_json::from_slice(&bytes).map_err(|source| DecodeError::Json { source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        #[serde(rename = "Id")]
        id: u32,
        #[serde(rename = "Title")]
        title: String,
    }

    #[test]
    fn entity_unmarshal_from_verbose() {
        let resp = EntityResponse::new(
            br#"{"d":{"__metadata":{"type":"SP.Data.DocsItem"},"Id":7,"Title":"Plan"}}"#.to_vec(),
        );
        let item: Item = resp.unmarshal().unwrap();
        assert_eq!(
            item,
            Item {
                id: 7,
                title: "Plan".into()
            }
        );
    }

    #[test]
    fn entity_raw_is_untouched() {
        let raw = br#"{"d":{"Id":1}}"#.to_vec();
        let resp = EntityResponse::new(raw.clone());
        assert_eq!(resp.raw(), &raw[..]);
        assert_eq!(resp.normalized().unwrap(), br#"{"Id":1}"#.to_vec());
        assert_eq!(resp.into_raw(), raw);
    }

    #[test]
    fn collection_data_preserves_order() {
        let resp = CollectionResponse::new(
            br#"{"value":[{"Id":2,"Title":"b"},{"Id":1,"Title":"a"}]}"#.to_vec(),
        );
        let data = resp.data().unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data[0].raw(), br#"{"Id":2,"Title":"b"}"#);

        let items: Vec<Item> = resp.unmarshal().unwrap();
        assert_eq!(items[0].id, 2);
        assert_eq!(items[1].title, "a");
    }

    #[test]
    fn collection_normalized_is_bare_array() {
        let resp = CollectionResponse::new(br#"{"d":{"results":[{"Id":1},{"Id":2}]}}"#.to_vec());
        assert_eq!(resp.normalized().unwrap(), br#"[{"Id":1},{"Id":2}]"#.to_vec());
    }

    #[test]
    fn unmarshal_type_mismatch() {
        let resp = EntityResponse::new(br#"{"Id":"not a number","Title":"x"}"#.to_vec());
        let err = resp.unmarshal::<Item>().unwrap_err();
        assert!(matches!(err, DecodeError::Json { .. }));
    }

    #[test]
    fn collection_unrecognized_shape() {
        let resp = CollectionResponse::new(br#"{"unexpected":"shape"}"#.to_vec());
        let err = resp.data().unwrap_err();
        assert_eq!(err.raw(), resp.raw());
    }
}
