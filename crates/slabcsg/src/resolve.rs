//! Per-cell settings resolved through an override chain.
//!
//! A grid cell `(layer, column, row)` takes its material or temperature
//! from the most specific variable that is defined:
//!
//! | scope            | key                      |
//! |------------------|--------------------------|
//! | [`Scope::Cell`]   | `<base>L<d>X<i>Z<j>`    |
//! | [`Scope::Column`] | `<base>L<d>X<i>`        |
//! | [`Scope::Row`]    | `<base>L<d>Z<j>`        |
//! | [`Scope::Layer`]  | `<base>L<d>`            |
//!
//! There is no default below the layer scope.

use slabcsg_config::{ConfigError, FromValue, VarStore};
use std::fmt;

/// How much of the grid a variable applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// One cell.
    Cell,
    /// Every row of one column.
    Column,
    /// Every column of one row.
    Row,
    /// The whole divided layer.
    Layer,
}

/// Scopes in the order they are tried.
pub const OVERRIDE_CHAIN: [Scope; 4] = [Scope::Cell, Scope::Column, Scope::Row, Scope::Layer];

/// Address of one grid cell under a variable base name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopedKey<'a> {
    /// Variable base name, e.g. `PlateMat`.
    pub base: &'a str,
    /// Divided-layer ordinal.
    pub layer: usize,
    /// Column index along X.
    pub column: usize,
    /// Row index along Z.
    pub row: usize,
}

impl<'a> ScopedKey<'a> {
    /// Address `(layer, column, row)` under `base`.
    pub fn new(base: &'a str, layer: usize, column: usize, row: usize) -> Self {
        Self {
            base,
            layer,
            column,
            row,
        }
    }

    /// Variable name for this cell at `scope`.
    pub fn render(&self, scope: Scope) -> String {
        let Self {
            base,
            layer,
            column,
            row,
        } = *self;
        match scope {
            Scope::Cell => format!("{base}L{layer}X{column}Z{row}"),
            Scope::Column => format!("{base}L{layer}X{column}"),
            Scope::Row => format!("{base}L{layer}Z{row}"),
            Scope::Layer => format!("{base}L{layer}"),
        }
    }
}

impl fmt::Display for ScopedKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(Scope::Cell))
    }
}

/// A resolved value with the scope and variable that supplied it.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<T> {
    /// The value.
    pub value: T,
    /// Scope it was found at.
    pub scope: Scope,
    /// Variable name it was read from.
    pub key: String,
}

/// Resolve a value for `(layer, column, row)` by walking [`OVERRIDE_CHAIN`].
///
/// A variable that exists with the wrong type is an error, not a reason
/// to fall through. If no scope defines the value the error names the
/// cell-level key.
pub fn resolve_xz<T: FromValue>(
    store: &VarStore,
    base: &str,
    layer: usize,
    column: usize,
    row: usize,
) -> Result<Resolved<T>, ConfigError> {
    let key = ScopedKey::new(base, layer, column, row);
    for scope in OVERRIDE_CHAIN {
        let name = key.render(scope);
        if let Some(value) = store.eval_opt::<T>(&name)? {
            return Ok(Resolved {
                value,
                scope,
                key: name,
            });
        }
    }
    Err(ConfigError::missing(key.render(Scope::Cell)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_keys() {
        let k = ScopedKey::new("PlateMat", 2, 3, 4);
        assert_eq!(k.render(Scope::Cell), "PlateMatL2X3Z4");
        assert_eq!(k.render(Scope::Column), "PlateMatL2X3");
        assert_eq!(k.render(Scope::Row), "PlateMatL2Z4");
        assert_eq!(k.render(Scope::Layer), "PlateMatL2");
        assert_eq!(k.to_string(), "PlateMatL2X3Z4");
    }

    #[test]
    fn test_falls_through_in_order() {
        let mut store = VarStore::new();
        store.add_variable("MatL0X1Z2", "Cell");
        store.add_variable("MatL0X1", "Column");
        store.add_variable("MatL0Z2", "Row");
        store.add_variable("MatL0", "Layer");

        let expect = [
            ("MatL0X1Z2", Scope::Cell),
            ("MatL0X1", Scope::Column),
            ("MatL0Z2", Scope::Row),
            ("MatL0", Scope::Layer),
        ];
        for (key, scope) in expect {
            let r = resolve_xz::<String>(&store, "Mat", 0, 1, 2).unwrap();
            assert_eq!(r.scope, scope);
            assert_eq!(r.key, key);
            store.remove_variable(key);
        }
        let err = resolve_xz::<String>(&store, "Mat", 0, 1, 2).unwrap_err();
        assert_eq!(err.to_string(), "variable `MatL0X1Z2` not defined");
    }

    #[test]
    fn test_column_beats_row() {
        let mut store = VarStore::new();
        store.add_variable("TempL1Z0", 400.0);
        store.add_variable("TempL1X0", 500.0);
        let r = resolve_xz::<f64>(&store, "Temp", 1, 0, 0).unwrap();
        assert_eq!(r.value, 500.0);
        assert_eq!(r.scope, Scope::Column);
    }

    #[test]
    fn test_no_prefix_collision() {
        let mut store = VarStore::new();
        store.add_variable("MatL2X30", "Wrong");
        store.add_variable("MatL2X3Z40", "Wrong");
        store.add_variable("MatL20", "Wrong");
        store.add_variable("MatL2", "Right");
        let r = resolve_xz::<String>(&store, "Mat", 2, 3, 4).unwrap();
        assert_eq!(r.value, "Right");
        assert_eq!(r.scope, Scope::Layer);
    }

    #[test]
    fn test_wrong_type_is_error() {
        let mut store = VarStore::new();
        store.add_variable("TempL0X0Z0", "hot");
        store.add_variable("TempL0", 300.0);
        let err = resolve_xz::<f64>(&store, "Temp", 0, 0, 0).unwrap_err();
        assert!(matches!(err, ConfigError::TypeMismatch { .. }));
    }
}
