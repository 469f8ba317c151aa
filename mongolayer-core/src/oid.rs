//! Conversions between `ObjectId` values and their hex string form.

use bson::{Bson, oid::ObjectId};

use crate::{
    error::{DocumentStoreError, DocumentStoreResult},
    zero::IsZero,
};

/// Parses a 24 character hex string.
pub fn object_id_from_str(s: &str) -> DocumentStoreResult<ObjectId> {
    ObjectId::parse_str(s).map_err(|_| DocumentStoreError::InvalidObjectId(s.to_string()))
}

/// Parses every string, failing on the first invalid one.
pub fn object_ids_from_strs<S: AsRef<str>>(strs: &[S]) -> DocumentStoreResult<Vec<ObjectId>> {
    strs.iter().map(|s| object_id_from_str(s.as_ref())).collect()
}

pub fn string_from_object_id(id: &ObjectId) -> String {
    id.to_hex()
}

pub fn strings_from_object_ids(ids: &[ObjectId]) -> Vec<String> {
    ids.iter().map(|id| id.to_hex()).collect()
}

pub fn validate_object_id(s: &str) -> bool {
    ObjectId::parse_str(s).is_ok()
}

pub fn new_object_id() -> ObjectId {
    ObjectId::new()
}

/// Returns `true` for the all-zero id.
pub fn is_zero_object_id(id: &ObjectId) -> bool {
    id.is_zero()
}

/// Accepts either an `ObjectId` or its hex string.
pub fn to_object_id(value: &Bson) -> DocumentStoreResult<ObjectId> {
    match value {
        Bson::ObjectId(id) => Ok(*id),
        Bson::String(s) => object_id_from_str(s),
        other => Err(DocumentStoreError::InvalidObjectId(format!(
            "cannot convert {:?} to ObjectId",
            other.element_type()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const HEX: &str = "507f1f77bcf86cd799439011";

    #[test]
    fn parse_and_format() {
        let id = object_id_from_str(HEX).unwrap();
        assert_eq!(string_from_object_id(&id), HEX);
        assert!(validate_object_id(HEX));
    }

    #[test]
    fn invalid_strings() {
        assert!(!validate_object_id("not-an-id"));
        assert!(!validate_object_id(""));

        let err = object_id_from_str("xyz").unwrap_err();
        assert!(matches!(err, DocumentStoreError::InvalidObjectId(s) if s == "xyz"));
    }

    #[test]
    fn batch_conversion_fails_on_first_bad_entry() {
        let ids = object_ids_from_strs(&[HEX, HEX]).unwrap();
        assert_eq!(strings_from_object_ids(&ids), vec![HEX.to_string(), HEX.to_string()]);

        let err = object_ids_from_strs(&[HEX, "bad"]).unwrap_err();
        assert!(matches!(err, DocumentStoreError::InvalidObjectId(s) if s == "bad"));
    }

    #[test]
    fn zero_id() {
        assert!(is_zero_object_id(&ObjectId::from_bytes([0; 12])));
        assert!(!is_zero_object_id(&new_object_id()));
    }

    #[test]
    fn bson_conversion() {
        let id = new_object_id();
        assert_eq!(to_object_id(&Bson::ObjectId(id)).unwrap(), id);
        assert_eq!(to_object_id(&Bson::String(id.to_hex())).unwrap(), id);
        assert!(to_object_id(&Bson::Int32(1)).is_err());
    }
}
