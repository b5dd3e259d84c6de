#![warn(missing_docs)]

//! Layered slab geometry for CSG transport models.
//!
//! A [`LayerStack`] builds an ordered stack of material slabs along a
//! beam axis, one cell per slab. A [`GridDivision`] then replaces the
//! cell of selected slabs with an X-Z grid of cells whose material and
//! temperature are resolved per cell. [`FissionPlate`] runs both as a
//! single component.
//!
//! Every component goes through the same three steps, in order:
//! [`Construct::populate`] reads variables, [`Construct::create_surfaces`]
//! adds planes to the [`Model`], and [`Construct::create_objects`] adds
//! cells.
//!
//! # Example
//!
//! ```
//! use slabcsg::{Construct, FissionPlate};
//! use slabcsg_config::VarStore;
//! use slabcsg_geom::Model;
//! use slabcsg_math::Frame;
//!
//! let store = VarStore::from_toml_str(r#"
//!     [Plate]
//!     NSlab = 1
//!     Width = 6.0
//!     Height = 4.0
//!     Thick0 = 1.0
//!     Mat0 = "Al"
//!     Temp0 = 300.0
//!     DIndex = [0]
//!     NXSpace = 2
//!     NZSpace = 1
//!     XPts = [0.0]
//!     MatL0 = "U"
//!     TempL0 = 600.0
//! "#).unwrap();
//!
//! let mut model = Model::new();
//! let mut plate = FissionPlate::new("Plate");
//! plate.create_all(&store, &mut model, &Frame::world()).unwrap();
//! assert_eq!(model.cell_count(), 2);
//! ```

use slabcsg_config::VarStore;
use slabcsg_geom::Model;
use slabcsg_math::Frame;

pub mod cell_grid;
pub mod error;
pub mod grid;
pub mod layers;
pub mod plate;
pub mod resolve;

pub use cell_grid::CellGrid;
pub use error::{BuildError, Result};
pub use grid::GridDivision;
pub use layers::{Layer, LayerStack, LinkPoint};
pub use plate::{DividedLayer, FissionPlate};
pub use resolve::{resolve_xz, Resolved, Scope, ScopedKey, OVERRIDE_CHAIN};

/// A geometry component built in three ordered steps.
pub trait Construct {
    /// Prefix of the variables the component reads.
    fn key_name(&self) -> &str;

    /// Read variables. Creates nothing in the model.
    fn populate(&mut self, store: &VarStore) -> Result<()>;

    /// Add the component's surfaces, placed by `frame`.
    fn create_surfaces(&mut self, model: &mut Model, frame: &Frame) -> Result<()>;

    /// Add the component's cells.
    fn create_objects(&mut self, model: &mut Model) -> Result<()>;

    /// Run all three steps.
    fn create_all(&mut self, store: &VarStore, model: &mut Model, frame: &Frame) -> Result<()> {
        self.populate(store)?;
        self.create_surfaces(model, frame)?;
        self.create_objects(model)
    }
}
