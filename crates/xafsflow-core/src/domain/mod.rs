pub mod errors;

pub use errors::{XafsError, XafsErrorCategory, XafsResult};

use serde::Serialize;
use std::fmt::{Display, Formatter};

pub const ENERGY_COLUMN: &str = "energy";
pub const FLAT_COLUMN: &str = "flat";
pub const SAMPLE_NAME_COLUMN: &str = "sample_name";
pub const SAMPLE_NUMBER_COLUMN: &str = "sample_number";

/// One cell of a categorical column, used to build partition keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum KeyValue {
    Integer(Option<i64>),
    Text(String),
}

impl Display for KeyValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Integer(Some(value)) => write!(f, "{value}"),
            Self::Integer(None) => f.write_str("<missing>"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize)]
#[serde(transparent)]
pub struct GroupKey(pub Vec<KeyValue>);

impl GroupKey {
    pub fn values(&self) -> &[KeyValue] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Label used when a key becomes a column name of an aligned array.
    pub fn label(&self) -> String {
        self.0
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl Display for GroupKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "({})", self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::{GroupKey, KeyValue};

    #[test]
    fn group_key_label_joins_components() {
        let key = GroupKey(vec![
            KeyValue::Text("hematite".to_string()),
            KeyValue::Integer(Some(2)),
        ]);
        assert_eq!(key.label(), "hematite/2");
        assert_eq!(key.to_string(), "(hematite/2)");
    }

    #[test]
    fn missing_integer_key_renders_placeholder() {
        let key = GroupKey(vec![KeyValue::Text("hematite".to_string()), KeyValue::Integer(None)]);
        assert_eq!(key.label(), "hematite/<missing>");
    }
}
