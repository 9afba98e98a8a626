//! Layer identifiers.
//!
//! Layer names are interned once per process, so a `LayerId` is a 4-byte
//! `Copy` handle that compares in O(1). Ids travel through JSON as plain
//! strings; an empty string is rejected on load.

use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};

static LAYER_NAMES: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);
static NEXT_LAYER: AtomicU64 = AtomicU64::new(1);

const GENERATED_PREFIX: &str = "layer_";

#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LayerId(Spur);

impl LayerId {
    pub fn intern(name: &str) -> Self {
        LayerId(LAYER_NAMES.get_or_intern(name))
    }

    pub fn as_str(&self) -> &'static str {
        LAYER_NAMES.resolve(&self.0)
    }

    /// Next unused generated id (`layer_1`, `layer_2`, ...). Names already
    /// interned, for instance by a loaded mockup, are skipped.
    pub fn fresh() -> Self {
        loop {
            let n = NEXT_LAYER.fetch_add(1, Ordering::Relaxed);
            let name = format!("{GENERATED_PREFIX}{n}");
            if LAYER_NAMES.get(&name).is_none() {
                return Self::intern(&name);
            }
        }
    }
}

impl TryFrom<String> for LayerId {
    type Error = String;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        if name.trim().is_empty() {
            return Err("layer id must not be empty".into());
        }
        Ok(LayerId::intern(&name))
    }
}

impl From<LayerId> for String {
    fn from(id: LayerId) -> Self {
        id.as_str().to_string()
    }
}

impl fmt::Debug for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LayerId").field(&self.as_str()).finish()
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_name_same_id() {
        let a = LayerId::intern("front_print");
        assert_eq!(a, LayerId::intern("front_print"));
        assert_eq!(a.to_string(), "front_print");
        assert_eq!(format!("{a:?}"), "LayerId(\"front_print\")");
    }

    #[test]
    fn fresh_never_reissues_a_loaded_name() {
        let first = LayerId::fresh();
        assert!(first.as_str().starts_with(GENERATED_PREFIX));
        // Claim the next few generated names as if a document had used them.
        let n: u64 = first.as_str()[GENERATED_PREFIX.len()..].parse().unwrap();
        let taken: Vec<LayerId> = (1..=3)
            .map(|k| LayerId::intern(&format!("layer_{}", n + k)))
            .collect();
        let next = LayerId::fresh();
        assert!(!taken.contains(&next));
        assert_ne!(next, first);
    }

    #[test]
    fn serde_uses_plain_strings() {
        let id: LayerId = serde_json::from_str("\"logo\"").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"logo\"");
        assert!(serde_json::from_str::<LayerId>("\"  \"").is_err());
    }
}
