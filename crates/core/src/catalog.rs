//! Task catalog - the checklist for each day of the challenge.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Ordered mapping from day number to that day's task descriptions.
///
/// Serialized with `"dayN"` keys. Deserialization also accepts bare
/// numeric keys, so `{"3": [...]}` and `{"day3": [...]}` are equivalent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskCatalog {
    days: BTreeMap<u32, Vec<String>>,
}

/// A catalog key that is neither `"dayN"` nor `"N"`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid catalog key: {0:?}")]
pub struct CatalogKeyError(pub String);

impl TaskCatalog {
    /// An empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Tasks for `day`, if any are configured.
    pub fn get(&self, day: u32) -> Option<&[String]> {
        self.days.get(&day).map(Vec::as_slice)
    }

    /// Replace the tasks for one day.
    pub fn insert(&mut self, day: u32, tasks: Vec<String>) {
        self.days.insert(day, tasks);
    }

    /// Number of configured days.
    pub fn len(&self) -> usize {
        self.days.len()
    }

    /// Whether no day is configured.
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Parse `"dayN"` or `"N"` into a day number. `N` must be plain ASCII
    /// digits.
    pub fn parse_key(key: &str) -> Result<u32, CatalogKeyError> {
        let digits = key.strip_prefix("day").unwrap_or(key);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CatalogKeyError(key.to_string()));
        }
        digits.parse().map_err(|_| CatalogKeyError(key.to_string()))
    }

    /// The bundled seven-day sample catalog used to seed a new data directory.
    pub fn sample() -> Self {
        let days: [&[&str]; 7] = [
            &[
                "Complete 20 pushups",
                "Practice box breathing for a total of 3 minutes",
                "No sugar for the day",
                "Capture a perspective distortion shot",
                "Learn Game Theory to see how strategy influences outcomes",
            ],
            &[
                "Hold a plank for a total of 2 minutes",
                "Zen sit for 5 minutes in quiet stillness",
                "Make bed in under 60 seconds",
                "Draw something without lifting the pen",
                "Learn about The Overview Effect experienced by astronauts",
            ],
            &[
                "Perform bodyweight squats for a total of 3 minutes",
                "Shadow box for a total of 3 minutes",
                "Eat one meal phone-free",
                "Draw your room as a simple map and label the areas",
                "Study the Great Depression and its long-term economic impact",
            ],
            &[
                "Walk briskly for 20 minutes",
                "Complete a 5-4-3-2-1 grounding check",
                "Write your sleep time and end the day accordingly",
                "Sketch a simple artwork using your non-dominant hand",
                "Understand Butterfly Effect and small changes compounding",
            ],
            &[
                "Hold a wall-sit for a total of 3 minutes",
                "Do Nadi Shodhana for 3 minutes",
                "Track your expenses for today",
                "Choose an everyday object and refine its design",
                "Understand game theory via one prisoner's dilemma",
            ],
            &[
                "Do step-ups for a total of 3 minutes",
                "Practice Qigong Inner Smile for 2 minutes",
                "Wake and drink 500 ml of water",
                "Write a letter to your future self @futureme.org",
                "Explore neuroplasticity to understand brain change",
            ],
            &[
                "Run/jog a total distance of 1 kilometer",
                "Hold gentle gaze on the vast sky",
                "Take 1-minute cold shower",
                "Make 20-second sound composition",
                "Learn what dopamine baseline is and how habits shift it",
            ],
        ];

        days.iter()
            .zip(1u32..)
            .map(|(tasks, day)| (day, tasks.iter().map(|t| t.to_string()).collect()))
            .collect()
    }
}

impl FromIterator<(u32, Vec<String>)> for TaskCatalog {
    fn from_iter<I: IntoIterator<Item = (u32, Vec<String>)>>(iter: I) -> Self {
        Self {
            days: iter.into_iter().collect(),
        }
    }
}

impl Serialize for TaskCatalog {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.days.len()))?;
        for (day, tasks) in &self.days {
            map.serialize_entry(&format!("day{}", day), tasks)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for TaskCatalog {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CatalogVisitor;

        impl<'de> Visitor<'de> for CatalogVisitor {
            type Value = TaskCatalog;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of day keys to task lists")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut catalog = TaskCatalog::new();
                while let Some((key, tasks)) = access.next_entry::<String, Vec<String>>()? {
                    let day = TaskCatalog::parse_key(&key).map_err(de::Error::custom)?;
                    catalog.insert(day, tasks);
                }
                Ok(catalog)
            }
        }

        deserializer.deserialize_map(CatalogVisitor)
    }
}
