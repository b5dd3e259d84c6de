//! The variable database.

use crate::{ConfigError, FromValue, Result, Value};
use std::collections::BTreeMap;
use std::path::Path;

/// Flat key → value database read by geometry components.
///
/// Keys are plain strings built by concatenating a component name with
/// a parameter name (`PlateThick2`). Lookups are exact: `PlateX3` never
/// matches `PlateX30`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VarStore {
    vars: BTreeMap<String, Value>,
}

impl VarStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable, replacing any previous value.
    pub fn add_variable(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.vars.insert(key.into(), value.into());
    }

    /// Remove a variable, returning its value.
    pub fn remove_variable(&mut self, key: &str) -> Option<Value> {
        self.vars.remove(key)
    }

    /// True if `key` is defined.
    pub fn has_variable(&self, key: &str) -> bool {
        self.vars.contains_key(key)
    }

    /// Raw stored value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.vars.get(key)
    }

    /// Number of variables.
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// True if no variables are defined.
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Keys starting with `prefix`, in sorted order.
    pub fn keys_with_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.vars
            .range(prefix.to_string()..)
            .take_while(move |(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.as_str())
    }

    /// Typed value of a required variable.
    pub fn eval_var<T: FromValue>(&self, key: &str) -> Result<T> {
        match self.vars.get(key) {
            Some(v) => T::from_value(key, v),
            None => Err(ConfigError::missing(key)),
        }
    }

    /// Typed value of an optional variable. A present value of the wrong
    /// type is still an error.
    pub fn eval_opt<T: FromValue>(&self, key: &str) -> Result<Option<T>> {
        self.vars.get(key).map(|v| T::from_value(key, v)).transpose()
    }

    /// Typed value, or `default` when the variable is absent.
    pub fn eval_def_var<T: FromValue>(&self, key: &str, default: T) -> Result<T> {
        Ok(self.eval_opt(key)?.unwrap_or(default))
    }

    /// Value of `primary`, falling back to `fallback`.
    pub fn eval_pair<T: FromValue>(&self, primary: &str, fallback: &str) -> Result<T> {
        match self.eval_opt(primary)? {
            Some(v) => Ok(v),
            None => self.eval_var(fallback),
        }
    }

    /// Parse a TOML document. Nested tables concatenate their names onto
    /// the keys below them, so `[Plate] NSlab = 3` defines `PlateNSlab`.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let table: toml::Table = text
            .parse()
            .map_err(|e: toml::de::Error| ConfigError::Parse(e.to_string()))?;
        let mut store = Self::new();
        for (key, value) in table {
            store.insert_toml(key, value)?;
        }
        Ok(store)
    }

    /// Parse a JSON object, flattening nested objects like
    /// [`VarStore::from_toml_str`].
    pub fn from_json_str(text: &str) -> Result<Self> {
        let root: serde_json::Value =
            serde_json::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        let serde_json::Value::Object(map) = root else {
            return Err(ConfigError::Parse("top level must be an object".into()));
        };
        let mut store = Self::new();
        for (key, value) in map {
            store.insert_json(key, value)?;
        }
        Ok(store)
    }

    /// Load a `.toml` or `.json` variable file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&text),
            _ => Self::from_toml_str(&text),
        }
    }

    /// Copy every variable of `other` into this store, overwriting.
    pub fn merge(&mut self, other: VarStore) {
        self.vars.extend(other.vars);
    }

    fn insert_toml(&mut self, key: String, value: toml::Value) -> Result<()> {
        match value {
            toml::Value::Table(table) => {
                for (sub, v) in table {
                    self.insert_toml(format!("{key}{sub}"), v)?;
                }
                Ok(())
            }
            other => {
                let v = toml_scalar(&key, other)?;
                self.vars.insert(key, v);
                Ok(())
            }
        }
    }

    fn insert_json(&mut self, key: String, value: serde_json::Value) -> Result<()> {
        match value {
            serde_json::Value::Object(map) => {
                for (sub, v) in map {
                    self.insert_json(format!("{key}{sub}"), v)?;
                }
                Ok(())
            }
            other => {
                let v: Value = serde_json::from_value(other)
                    .map_err(|e| ConfigError::Parse(format!("{key}: {e}")))?;
                self.vars.insert(key, v);
                Ok(())
            }
        }
    }
}

fn toml_scalar(key: &str, value: toml::Value) -> Result<Value> {
    Ok(match value {
        toml::Value::Boolean(b) => Value::Flag(b),
        toml::Value::Integer(i) => Value::Number(i as f64),
        toml::Value::Float(f) => Value::Number(f),
        toml::Value::String(s) => Value::Text(s),
        toml::Value::Array(items) => Value::List(
            items
                .into_iter()
                .map(|v| toml_scalar(key, v))
                .collect::<Result<Vec<_>>>()?,
        ),
        toml::Value::Datetime(_) | toml::Value::Table(_) => {
            return Err(ConfigError::Parse(format!(
                "{key}: unsupported value type"
            )))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eval_var_and_missing() {
        let mut store = VarStore::new();
        store.add_variable("PlateNSlab", 3);
        assert_eq!(store.eval_var::<usize>("PlateNSlab").unwrap(), 3);
        let err = store.eval_var::<f64>("PlateWidth").unwrap_err();
        assert!(err.is_missing());
        assert_eq!(err.to_string(), "variable `PlateWidth` not defined");
    }

    #[test]
    fn test_exact_key_match() {
        let mut store = VarStore::new();
        store.add_variable("MatL2X30", "U");
        assert!(!store.has_variable("MatL2X3"));
        assert_eq!(store.eval_opt::<String>("MatL2X3").unwrap(), None);
    }

    #[test]
    fn test_eval_opt_type_error() {
        let mut store = VarStore::new();
        store.add_variable("PlateTemp0", "hot");
        assert!(matches!(
            store.eval_opt::<f64>("PlateTemp0"),
            Err(ConfigError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_eval_def_and_pair() {
        let mut store = VarStore::new();
        store.add_variable("PlateTemp", 300.0);
        assert_eq!(store.eval_def_var("PlateTemp1", 20.0).unwrap(), 20.0);
        assert_eq!(store.eval_pair::<f64>("PlateTemp1", "PlateTemp").unwrap(), 300.0);
        assert!(store.eval_pair::<f64>("A", "B").unwrap_err().is_missing());
    }

    #[test]
    fn test_from_toml_nested_tables() {
        let store = VarStore::from_toml_str(
            r#"
            [Plate]
            NSlab = 2
            Width = 10.5
            Mat0 = "Be"
            DIndex = [1]
            Shared = true
            "#,
        )
        .unwrap();
        assert_eq!(store.eval_var::<usize>("PlateNSlab").unwrap(), 2);
        assert_eq!(store.eval_var::<f64>("PlateWidth").unwrap(), 10.5);
        assert_eq!(store.eval_var::<String>("PlateMat0").unwrap(), "Be");
        assert_eq!(store.eval_var::<Vec<usize>>("PlateDIndex").unwrap(), vec![1]);
        assert!(store.eval_var::<bool>("PlateShared").unwrap());
    }

    #[test]
    fn test_from_json_nested() {
        let store =
            VarStore::from_json_str(r#"{"Plate": {"XPts": [2.0, 1.0], "Mat": "U"}}"#).unwrap();
        assert_eq!(store.eval_var::<Vec<f64>>("PlateXPts").unwrap(), vec![2.0, 1.0]);
        assert_eq!(store.len(), 2);
        assert!(VarStore::from_json_str("[1, 2]").is_err());
    }

    #[test]
    fn test_keys_with_prefix() {
        let mut store = VarStore::new();
        store.add_variable("PlateA", 1);
        store.add_variable("PlateB", 2);
        store.add_variable("Other", 3);
        let keys: Vec<&str> = store.keys_with_prefix("Plate").collect();
        assert_eq!(keys, vec!["PlateA", "PlateB"]);
    }

    #[test]
    fn test_merge_overwrites() {
        let mut a = VarStore::new();
        a.add_variable("K", 1);
        let mut b = VarStore::new();
        b.add_variable("K", 2);
        a.merge(b);
        assert_eq!(a.eval_var::<usize>("K").unwrap(), 2);
    }
}
