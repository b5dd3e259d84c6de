#![warn(missing_docs)]

//! Variable database for the slabcsg geometry builder.
//!
//! Components read their dimensions and materials from a [`VarStore`]:
//! a flat map from string keys to typed [`Value`]s. Stores are usually
//! filled from a TOML or JSON file, or directly by the code that
//! generates an instrument's variables.
//!
//! # Example
//!
//! ```
//! use slabcsg_config::VarStore;
//!
//! let store = VarStore::from_toml_str("[Plate]\nNSlab = 2\nMat0 = \"Be\"").unwrap();
//! assert_eq!(store.eval_var::<usize>("PlateNSlab").unwrap(), 2);
//! assert!(store.has_variable("PlateMat0"));
//! ```

pub mod error;
pub mod store;
pub mod value;

pub use error::{ConfigError, Result};
pub use store::VarStore;
pub use value::{FromValue, Value};
