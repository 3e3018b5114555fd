//! Typed views over the bags stored in the session payload

use serde_json::{Map, Value};
use sessionward_core::SessionPayload;

/// Borrow the object stored under `key`, replacing anything that is not an object
fn bag_mut<'a>(payload: &'a mut SessionPayload, key: &str) -> &'a mut Map<String, Value> {
    let slot = payload
        .entry(key.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    match slot {
        Value::Object(map) => map,
        _ => unreachable!("slot was just replaced with an object"),
    }
}

fn bag<'a>(payload: &'a SessionPayload, key: &str) -> Option<&'a Map<String, Value>> {
    payload.get(key).and_then(Value::as_object)
}

/// Name/value attributes of the session
pub struct AttributeBag<'a> {
    payload: &'a mut SessionPayload,
    key: &'a str,
}

impl<'a> AttributeBag<'a> {
    pub fn new(payload: &'a mut SessionPayload, key: &'a str) -> Self {
        Self { payload, key }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        bag(self.payload, self.key).and_then(|attributes| attributes.get(name))
    }

    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        bag_mut(self.payload, self.key).insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        match self.payload.get_mut(self.key) {
            Some(Value::Object(attributes)) => attributes.remove(name),
            _ => None,
        }
    }

    pub fn all(&self) -> Map<String, Value> {
        bag(self.payload, self.key).cloned().unwrap_or_default()
    }

    /// Drop every attribute, keeping the (now empty) bag
    pub fn clear(&mut self) -> Map<String, Value> {
        std::mem::take(bag_mut(self.payload, self.key))
    }
}

/// One-shot messages keyed by type, shown once and then discarded
pub struct FlashBag<'a> {
    payload: &'a mut SessionPayload,
    key: &'a str,
}

impl<'a> FlashBag<'a> {
    pub fn new(payload: &'a mut SessionPayload, key: &'a str) -> Self {
        Self { payload, key }
    }

    pub fn add(&mut self, kind: impl Into<String>, message: impl Into<Value>) {
        let messages = bag_mut(self.payload, self.key)
            .entry(kind.into())
            .or_insert_with(|| Value::Array(Vec::new()));
        match messages {
            Value::Array(list) => list.push(message.into()),
            other => *other = Value::Array(vec![message.into()]),
        }
    }

    /// Messages of one type, left in place
    pub fn peek(&self, kind: &str) -> Vec<Value> {
        bag(self.payload, self.key)
            .and_then(|flashes| flashes.get(kind))
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default()
    }

    /// Messages of one type, removed from the bag
    pub fn take(&mut self, kind: &str) -> Vec<Value> {
        match self.payload.get_mut(self.key) {
            Some(Value::Object(flashes)) => match flashes.remove(kind) {
                Some(Value::Array(list)) => list,
                Some(other) => vec![other],
                None => Vec::new(),
            },
            _ => Vec::new(),
        }
    }

    pub fn take_all(&mut self) -> Map<String, Value> {
        std::mem::take(bag_mut(self.payload, self.key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sessionward_core::{ATTRIBUTES_KEY, FLASHES_KEY};

    #[test]
    fn test_attribute_set_get_remove() {
        let mut payload = SessionPayload::new();
        let mut attributes = AttributeBag::new(&mut payload, ATTRIBUTES_KEY);

        assert!(!attributes.has("uid"));
        attributes.set("uid", 42);
        assert_eq!(attributes.get("uid"), Some(&json!(42)));
        assert_eq!(attributes.remove("uid"), Some(json!(42)));
        assert!(attributes.all().is_empty());

        assert_eq!(payload[ATTRIBUTES_KEY], json!({}));
    }

    #[test]
    fn test_attribute_bag_repairs_non_object() {
        let mut payload = SessionPayload::new();
        payload.insert(ATTRIBUTES_KEY.to_string(), json!("corrupt"));

        let mut attributes = AttributeBag::new(&mut payload, ATTRIBUTES_KEY);
        assert!(attributes.get("a").is_none());
        attributes.set("a", "b");
        assert_eq!(payload[ATTRIBUTES_KEY], json!({ "a": "b" }));
    }

    #[test]
    fn test_flashes_peek_and_take() {
        let mut payload = SessionPayload::new();
        let mut flashes = FlashBag::new(&mut payload, FLASHES_KEY);

        flashes.add("status", "Saved");
        flashes.add("status", "Published");
        flashes.add("error", "Oops");

        assert_eq!(flashes.peek("status").len(), 2);
        assert_eq!(flashes.take("status"), vec![json!("Saved"), json!("Published")]);
        assert!(flashes.peek("status").is_empty());

        let rest = flashes.take_all();
        assert_eq!(rest.len(), 1);
        assert_eq!(payload[FLASHES_KEY], json!({}));
    }
}
