//! Layer stack with optional grid subdivision, built as one component.

use crate::grid::GridDivision;
use crate::layers::LayerStack;
use crate::{Construct, Result};
use slabcsg_config::VarStore;
use slabcsg_geom::{CellId, Model};
use slabcsg_math::Frame;
use tracing::debug;

/// Cells that replaced one divided layer.
#[derive(Debug, Clone, PartialEq)]
pub struct DividedLayer {
    /// Stack layer that was divided.
    pub layer: usize,
    /// The removed layer cell.
    pub parent: CellId,
    /// Grid cells, column-major: cell `(i, j)` is at `i * n_z + j`.
    pub cells: Vec<CellId>,
}

/// A slab stack whose selected layers are split into X-Z grids.
///
/// Both parts read their variables under the same key name.
#[derive(Debug, Clone)]
pub struct FissionPlate {
    stack: LayerStack,
    grid: GridDivision,
    divided: Vec<DividedLayer>,
}

impl FissionPlate {
    /// New plate reading variables under `key_name`.
    pub fn new(key_name: impl Into<String>) -> Self {
        let key_name = key_name.into();
        Self {
            stack: LayerStack::new(key_name.clone()),
            grid: GridDivision::new(key_name),
            divided: Vec::new(),
        }
    }

    /// The underlying layer stack.
    pub fn stack(&self) -> &LayerStack {
        &self.stack
    }

    /// Mutable layer stack, e.g. to share its front surface.
    pub fn stack_mut(&mut self) -> &mut LayerStack {
        &mut self.stack
    }

    /// The grid subdivision.
    pub fn grid(&self) -> &GridDivision {
        &self.grid
    }

    /// Layers replaced by grid cells, in `DIndex` order.
    pub fn divided_layers(&self) -> &[DividedLayer] {
        &self.divided
    }

    /// Grid cell `(i, j)` of divided layer `d`.
    pub fn grid_cell(&self, d: usize, i: usize, j: usize) -> Option<CellId> {
        let n_z = self.grid.n_z_space();
        if i >= self.grid.n_x_space() || j >= n_z {
            return None;
        }
        self.divided.get(d)?.cells.get(i * n_z + j).copied()
    }

    /// Every cell the plate currently owns, front to back.
    pub fn cell_ids(&self) -> Vec<CellId> {
        let mut out = Vec::new();
        for (index, &cell) in self.stack.cell_ids().iter().enumerate() {
            match self.divided.iter().find(|d| d.layer == index) {
                Some(div) => out.extend_from_slice(&div.cells),
                None => out.push(cell),
            }
        }
        out
    }
}

impl Construct for FissionPlate {
    fn key_name(&self) -> &str {
        self.stack.key_name()
    }

    fn populate(&mut self, store: &VarStore) -> Result<()> {
        self.divided.clear();
        self.stack.populate(store)?;
        self.grid.populate(store, &self.stack)
    }

    fn create_surfaces(&mut self, model: &mut Model, frame: &Frame) -> Result<()> {
        self.stack.create_surfaces(model, frame)?;
        self.grid.create_surfaces(model, frame)
    }

    fn create_objects(&mut self, model: &mut Model) -> Result<()> {
        self.stack.create_objects(model)?;
        let edits = self.grid.create_objects(&self.stack, model)?;
        for (edit, &layer) in edits.into_iter().zip(self.grid.divide_index()) {
            let parent = edit.remove;
            let cells = model.apply_edit(edit)?;
            debug!(key = %self.stack.key_name(), layer, parent = %parent, added = cells.len(), "replaced layer cell");
            self.divided.push(DividedLayer {
                layer,
                parent,
                cells,
            });
        }
        Ok(())
    }
}
