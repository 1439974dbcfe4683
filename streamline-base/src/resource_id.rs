use serde::de::Visitor;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use uuid::Uuid;

/// Identifies a resource (mesh, texture, shader, ...) independently of the object holding its
/// loaded data. Used for logging and bookkeeping, the pipeline never interprets it.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Default)]
pub struct ResourceId(pub u128);

impl ResourceId {
    pub const fn null() -> Self {
        ResourceId(0)
    }

    pub fn random() -> Self {
        ResourceId(Uuid::new_v4().as_u128())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        ResourceId(uuid.as_u128())
    }

    pub fn as_uuid(&self) -> Uuid {
        Uuid::from_u128(self.0)
    }

    pub fn is_null(&self) -> bool {
        self.0 == 0
    }

    pub fn from_u128(u: u128) -> Self {
        Self(u)
    }

    pub fn as_u128(&self) -> u128 {
        self.0
    }
}

impl Debug for ResourceId {
    fn fmt(
        &self,
        f: &mut Formatter<'_>,
    ) -> fmt::Result {
        f.debug_tuple("ResourceId")
            .field(&self.as_uuid())
            .finish()
    }
}

impl Display for ResourceId {
    fn fmt(
        &self,
        f: &mut Formatter<'_>,
    ) -> fmt::Result {
        Display::fmt(&self.as_uuid(), f)
    }
}

impl Serialize for ResourceId {
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.as_uuid().to_string())
        } else {
            serializer.serialize_u128(self.0)
        }
    }
}

struct ResourceIdVisitor;

impl<'a> Visitor<'a> for ResourceIdVisitor {
    type Value = ResourceId;

    fn expecting(
        &self,
        fmt: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(fmt, "a UUID-formatted string")
    }

    fn visit_str<E: de::Error>(
        self,
        s: &str,
    ) -> Result<Self::Value, E> {
        Uuid::parse_str(s)
            .map(ResourceId::from_uuid)
            .map_err(|_| de::Error::invalid_value(de::Unexpected::Str(s), &self))
    }
}

impl<'de> Deserialize<'de> for ResourceId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            deserializer.deserialize_str(ResourceIdVisitor)
        } else {
            Ok(ResourceId(u128::deserialize(deserializer)?))
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn null_id() {
        assert!(ResourceId::null().is_null());
        assert!(!ResourceId::random().is_null());
        assert_eq!(ResourceId::default(), ResourceId::null());
    }

    #[test]
    fn human_readable_serde_uses_uuid_string() {
        let id = ResourceId::from_u128(0x522aaf985dc34578a4cc411ca6c0a826);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"522aaf98-5dc3-4578-a4cc-411ca6c0a826\"");

        let parsed: ResourceId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn binary_serde_keeps_raw_value() {
        let id = ResourceId::random();
        let bytes = bincode::serialize(&id).unwrap();
        assert_eq!(bytes.len(), 16);
        let parsed: ResourceId = bincode::deserialize(&bytes).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn rejects_malformed_string() {
        let result: Result<ResourceId, _> = serde_json::from_str("\"not-a-uuid\"");
        assert!(result.is_err());
    }
}
