use crate::domain::entities::{CredentialEntry, KeyPage, ListKind};
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Response body of `GET /api/keys`
#[derive(Debug, Deserialize)]
pub struct KeyPageBody {
    /// `{ key: failureCount }` in server order
    #[serde(default, deserialize_with = "ordered_key_map")]
    pub keys: Vec<(String, u64)>,
    #[serde(default)]
    pub total_pages: u32,
}

impl KeyPageBody {
    pub fn into_page(self, kind: ListKind) -> KeyPage {
        KeyPage {
            entries: self
                .keys
                .into_iter()
                .map(|(key, failure_count)| CredentialEntry {
                    key,
                    status: kind,
                    failure_count,
                })
                .collect(),
            total_pages: self.total_pages,
        }
    }
}

/// Request body of `POST /api/config/keys/delete-selected`
#[derive(Debug, Serialize)]
pub struct DeleteKeysRequest<'a> {
    pub keys: &'a [String],
}

fn ordered_key_map<'de, D>(deserializer: D) -> Result<Vec<(String, u64)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct OrderedKeyMap;

    impl<'de> Visitor<'de> for OrderedKeyMap {
        type Value = Vec<(String, u64)>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a map of key to failure count")
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((key, count)) = map.next_entry::<String, u64>()? {
                entries.push((key, count));
            }
            Ok(entries)
        }
    }

    deserializer.deserialize_any(OrderedKeyMap)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_page_keeps_server_order() {
        let body: KeyPageBody =
            serde_json::from_str(r#"{"keys":{"zeta":1,"alpha":0,"mid":7},"total_pages":3}"#)
                .unwrap();
        let page = body.into_page(ListKind::Invalid);

        let keys: Vec<&str> = page.entries.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
        assert_eq!(page.entries[2].failure_count, 7);
        assert!(page.entries.iter().all(|e| e.status == ListKind::Invalid));
        assert_eq!(page.total_pages, 3);
    }

    #[test]
    fn test_key_page_null_keys() {
        let body: KeyPageBody = serde_json::from_str(r#"{"keys":null,"total_pages":0}"#).unwrap();
        assert!(body.keys.is_empty());
        assert_eq!(body.total_pages, 0);
    }

    #[test]
    fn test_delete_request_shape() {
        let keys = vec!["k1".to_string(), "k2".to_string()];
        let json = serde_json::to_string(&DeleteKeysRequest { keys: &keys }).unwrap();
        assert_eq!(json, r#"{"keys":["k1","k2"]}"#);
    }
}
