//! Form-encoded request bodies.
//!
//! The remote store binds nested arrays from bracket-indexed keys, so lists are
//! flattened as `id[0]`, `id[1]` and lists of objects as `timeTaken[0][start]`.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormPayload(Vec<(String, String)>);

impl FormPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: &str, value: impl ToString) -> &mut Self {
        self.0.push((key.to_string(), value.to_string()));
        self
    }

    /// Builder form of [`push`](Self::push).
    pub fn with(mut self, key: &str, value: impl ToString) -> Self {
        self.push(key, value);
        self
    }

    pub fn push_indexed(&mut self, key: &str, index: usize, value: impl ToString) -> &mut Self {
        self.0.push((format!("{}[{}]", key, index), value.to_string()));
        self
    }

    pub fn push_nested(
        &mut self,
        key: &str,
        index: usize,
        field: &str,
        value: impl ToString,
    ) -> &mut Self {
        self.0
            .push((format!("{}[{}][{}]", key, index, field), value.to_string()));
        self
    }

    /// Flatten a scalar list as `key[i]`.
    pub fn push_list<V: ToString>(&mut self, key: &str, values: impl IntoIterator<Item = V>) -> &mut Self {
        for (i, value) in values.into_iter().enumerate() {
            self.push_indexed(key, i, value);
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
