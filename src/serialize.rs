use std::fmt;
use std::marker::PhantomData;

use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::{AvlTree, Start};

impl<K, V> Serialize for AvlTree<K, V>
where
    K: Serialize,
    V: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self.avl_to_array() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

struct AvlTreeVisitor<K, V> {
    marker: PhantomData<fn() -> AvlTree<K, V>>,
}

impl<'de, K, V> Visitor<'de> for AvlTreeVisitor<K, V>
where
    K: Deserialize<'de> + Ord,
    V: Deserialize<'de>,
{
    type Value = AvlTree<K, V>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map")
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        // Serialized trees come in key order, so each entry lands below the maximum.
        let mut tree = AvlTree::new();
        while let Some((key, value)) = access.next_entry()? {
            tree.insert(key, value, Start::Max);
        }
        Ok(tree)
    }
}

impl<'de, K, V> Deserialize<'de> for AvlTree<K, V>
where
    K: Deserialize<'de> + Ord,
    V: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(AvlTreeVisitor {
            marker: PhantomData,
        })
    }
}
