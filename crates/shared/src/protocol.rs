use std::fmt;

use serde::{
    de::{MapAccess, Visitor},
    ser::SerializeMap,
    Deserialize, Deserializer, Serialize, Serializer,
};

/// Zero-based page of records as served by `GET /human-beings`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse<T> {
    pub content: Vec<T>,
    pub total_elements: u64,
    pub total_pages: u32,
    pub size: u32,
    pub number: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    pub page: u32,
    pub size: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl ListQuery {
    /// An empty search term is dropped so the backend sees no filter at all;
    /// anything else is sent as typed.
    pub fn new(page: u32, size: u32, search: &str) -> Self {
        Self {
            page,
            size,
            search: (!search.is_empty()).then(|| search.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoundtrackGroup {
    pub soundtrack_name: String,
    pub count: u64,
}

/// Result of `GET /human-beings/group/soundtrack`. The backend answers with a
/// JSON object; entries keep the order in which the backend wrote them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SoundtrackGroups(pub Vec<SoundtrackGroup>);

impl SoundtrackGroups {
    pub fn iter(&self) -> impl Iterator<Item = &SoundtrackGroup> {
        self.0.iter()
    }
}

impl<S: Into<String>> FromIterator<(S, u64)> for SoundtrackGroups {
    fn from_iter<I: IntoIterator<Item = (S, u64)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, count)| SoundtrackGroup {
                    soundtrack_name: name.into(),
                    count,
                })
                .collect(),
        )
    }
}

impl Serialize for SoundtrackGroups {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for group in &self.0 {
            map.serialize_entry(&group.soundtrack_name, &group.count)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for SoundtrackGroups {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct GroupsVisitor;

        impl<'de> Visitor<'de> for GroupsVisitor {
            type Value = SoundtrackGroups;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object mapping soundtrack names to counts")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut groups = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((soundtrack_name, count)) = access.next_entry::<String, u64>()? {
                    groups.push(SoundtrackGroup {
                        soundtrack_name,
                        count,
                    });
                }
                Ok(SoundtrackGroups(groups))
            }
        }

        deserializer.deserialize_map(GroupsVisitor)
    }
}
