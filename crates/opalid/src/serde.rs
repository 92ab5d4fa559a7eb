//! Serde support for the UUID-backed ID types.
//!
//! Integer-backed IDs ([`SessionSpaceId`], [`OpSpaceId`]) derive native
//! integer representations next to their definitions; [`StableId`] and
//! [`SessionId`] serialize as canonical lowercase UUID strings so they stay
//! readable in JSON payloads.
//!
//! [`SessionSpaceId`]: crate::SessionSpaceId
//! [`OpSpaceId`]: crate::OpSpaceId

use crate::{SessionId, StableId};
use ::serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use core::fmt;

impl Serialize for StableId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for StableId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct StableIdVisitor;

        impl de::Visitor<'_> for StableIdVisitor {
            type Value = StableId;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a v4 UUID string")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                v.parse().map_err(de::Error::custom)
            }
        }

        deserializer.deserialize_str(StableIdVisitor)
    }
}

impl Serialize for SessionId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.stable_id().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SessionId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        StableId::deserialize(deserializer).map(SessionId::from)
    }
}

#[cfg(test)]
mod tests {
    use crate::{CreationRangeIds, IdCreationRange, SessionSpaceId, StableId};

    #[test]
    fn stable_id_as_string_roundtrip() {
        let text = "e5f11e49-5b6c-4bb5-a554-e2e9bdbd8c54";
        let id: StableId = text.parse().unwrap();

        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, format!("\"{text}\""));
        let back: StableId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, id);
    }

    #[test]
    fn stable_id_rejects_non_v4() {
        let err = serde_json::from_str::<StableId>("\"e5f11e49-5b6c-1bb5-a554-e2e9bdbd8c54\"")
            .expect_err("should fail");
        assert!(err.to_string().contains("v4"));
    }

    #[test]
    fn creation_range_roundtrip() {
        let range = IdCreationRange {
            session_id: "8e3b4e2a-889d-4b34-9e6d-bd79e9267a9b".parse().unwrap(),
            ids: Some(CreationRangeIds {
                first_gen_count: 1,
                last_gen_count: 3,
            }),
        };

        let json = serde_json::to_string(&range).expect("serialize");
        assert_eq!(
            json,
            r#"{"session_id":"8e3b4e2a-889d-4b34-9e6d-bd79e9267a9b","ids":{"first_gen_count":1,"last_gen_count":3}}"#
        );
        let back: IdCreationRange = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, range);
    }

    #[test]
    fn compressed_ids_as_native_integers() {
        let id = SessionSpaceId::from_raw(-3);
        assert_eq!(serde_json::to_string(&id).unwrap(), "-3");
        assert_eq!(serde_json::from_str::<SessionSpaceId>("-3").unwrap(), id);
    }
}
