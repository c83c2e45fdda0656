// Raw emission records as delivered by the backend
use serde_json::{Map, Value};

/// One emission observation with no guaranteed schema.
///
/// The same logical field can appear under several names depending on
/// which backend version produced the record, so access goes through
/// [`RawRecord::get`] and the resolver's candidate tables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    fields: Map<String, Value>,
}

impl RawRecord {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Returns the value under `name`, treating JSON `null` as absent.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name).filter(|v| !v.is_null())
    }

    /// Returns the first present field among `candidates`, in order.
    pub fn first_of<'a>(&'a self, candidates: &[&'static str]) -> Option<(&'static str, &'a Value)> {
        candidates
            .iter()
            .find_map(|name| self.get(name).map(|v| (*name, v)))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Sets `name` only when the record has no usable value for it.
    pub fn insert_if_absent(&mut self, name: &str, value: Value) {
        if self.get(name).is_none() {
            self.fields.insert(name.to_string(), value);
        }
    }
}

impl From<Value> for RawRecord {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(fields) => Self::new(fields),
            // null, arrays and scalars carry no fields
            _ => Self::default(),
        }
    }
}

/// Intake adapter: one pass over the backend payload in its original order.
///
/// Never fails. Entries that are not JSON objects become empty records so
/// that downstream stages see every position of the input.
pub fn adapt<I>(values: I) -> Vec<RawRecord>
where
    I: IntoIterator<Item = Value>,
{
    values.into_iter().map(RawRecord::from).collect()
}
