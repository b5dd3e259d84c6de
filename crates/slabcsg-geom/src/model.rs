//! Cell and surface tables.

use crate::{CellId, GeomError, HeadRule, Plane, Result, Sense, SurfaceId};
use serde::{Deserialize, Serialize};
use slabcsg_math::{Point3, Tolerance};
use std::collections::{BTreeMap, BTreeSet};

/// Hands out fresh surface and cell ids for one build.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    next_surface: Option<u32>,
    next_cell: Option<u32>,
}

impl IdAllocator {
    /// Allocator starting at the given surface and cell numbers.
    pub fn new(surface_base: u32, cell_base: u32) -> Self {
        Self {
            next_surface: Some(surface_base),
            next_cell: Some(cell_base),
        }
    }

    /// Next unused surface id.
    pub fn next_surface(&mut self) -> Result<SurfaceId> {
        take_next(&mut self.next_surface, "surface").map(SurfaceId)
    }

    /// Next unused cell id.
    pub fn next_cell(&mut self) -> Result<CellId> {
        take_next(&mut self.next_cell, "cell").map(CellId)
    }
}

fn take_next(slot: &mut Option<u32>, kind: &'static str) -> Result<u32> {
    let n = slot.ok_or(GeomError::IdsExhausted(kind))?;
    *slot = n.checked_add(1);
    Ok(n)
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

/// A material region: a half-space rule with material and temperature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    /// Cell number.
    pub id: CellId,
    /// Material identifier.
    pub material: String,
    /// Temperature.
    pub temperature: f64,
    /// Region of space the cell occupies.
    pub rule: HeadRule,
}

impl Cell {
    /// Create a cell.
    pub fn new(id: CellId, material: impl Into<String>, temperature: f64, rule: HeadRule) -> Self {
        Self {
            id,
            material: material.into(),
            temperature,
            rule,
        }
    }
}

/// Replace one cell by a set of new cells.
///
/// Built by a component and applied by the caller through
/// [`Model::apply_edit`], which checks the whole edit before touching
/// the model.
#[derive(Debug, Clone, PartialEq)]
pub struct CellEdit {
    /// Cell to remove.
    pub remove: CellId,
    /// Cells to insert in its place.
    pub insert: Vec<Cell>,
}

impl CellEdit {
    /// Edit replacing `remove` with `insert`.
    pub fn replace(remove: CellId, insert: Vec<Cell>) -> Self {
        Self { remove, insert }
    }

    /// Ids of the inserted cells.
    pub fn inserted_ids(&self) -> Vec<CellId> {
        self.insert.iter().map(|c| c.id).collect()
    }
}

/// Surfaces and cells of one geometry build.
#[derive(Debug, Clone, Default)]
pub struct Model {
    ids: IdAllocator,
    tolerance: Tolerance,
    surfaces: BTreeMap<SurfaceId, Plane>,
    cells: BTreeMap<CellId, Cell>,
}

impl Model {
    /// Create an empty model numbering surfaces and cells from 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty model with a custom id allocator.
    pub fn with_allocator(ids: IdAllocator) -> Self {
        Self {
            ids,
            ..Self::default()
        }
    }

    /// Tolerance used to detect coincident planes.
    pub fn tolerance(&self) -> &Tolerance {
        &self.tolerance
    }

    /// Add a plane and return its id.
    ///
    /// A plane coincident with an existing one (same orientation) reuses
    /// the existing id.
    pub fn add_plane(&mut self, plane: Plane) -> Result<SurfaceId> {
        if let Some(id) = self.find_plane(&plane) {
            return Ok(id);
        }
        let id = self.ids.next_surface()?;
        self.surfaces.insert(id, plane);
        Ok(id)
    }

    /// Id of an existing plane coincident with `plane`.
    pub fn find_plane(&self, plane: &Plane) -> Option<SurfaceId> {
        self.surfaces
            .iter()
            .find(|(_, p)| p.is_coincident(plane, &self.tolerance))
            .map(|(id, _)| *id)
    }

    /// Look up a plane.
    pub fn plane(&self, id: SurfaceId) -> Option<&Plane> {
        self.surfaces.get(&id)
    }

    /// Number of surfaces.
    pub fn surface_count(&self) -> usize {
        self.surfaces.len()
    }

    /// Allocate a fresh cell id.
    pub fn next_cell_id(&mut self) -> Result<CellId> {
        loop {
            let id = self.ids.next_cell()?;
            if !self.cells.contains_key(&id) {
                return Ok(id);
            }
        }
    }

    /// Insert a cell. Its id must be free and its surfaces known.
    pub fn add_cell(&mut self, cell: Cell) -> Result<CellId> {
        if self.cells.contains_key(&cell.id) {
            return Err(GeomError::DuplicateCell(cell.id));
        }
        self.check_surfaces(&cell.rule)?;
        let id = cell.id;
        self.cells.insert(id, cell);
        Ok(id)
    }

    /// Remove a cell and return it.
    pub fn remove_cell(&mut self, id: CellId) -> Result<Cell> {
        self.cells.remove(&id).ok_or(GeomError::MissingCell(id))
    }

    /// Look up a cell.
    pub fn cell(&self, id: CellId) -> Option<&Cell> {
        self.cells.get(&id)
    }

    /// All cells in id order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.values()
    }

    /// Number of cells.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Apply a replacement edit and return the inserted ids.
    ///
    /// Nothing is changed unless the removed cell exists, every new id is
    /// free and distinct, and every referenced surface is known.
    pub fn apply_edit(&mut self, edit: CellEdit) -> Result<Vec<CellId>> {
        if !self.cells.contains_key(&edit.remove) {
            return Err(GeomError::MissingCell(edit.remove));
        }
        let mut seen = BTreeSet::new();
        for cell in &edit.insert {
            let taken = cell.id != edit.remove && self.cells.contains_key(&cell.id);
            if taken || !seen.insert(cell.id) {
                return Err(GeomError::DuplicateCell(cell.id));
            }
            self.check_surfaces(&cell.rule)?;
        }
        self.cells.remove(&edit.remove);
        let ids = edit.inserted_ids();
        for cell in edit.insert {
            self.cells.insert(cell.id, cell);
        }
        Ok(ids)
    }

    /// True if `point` lies inside `rule`.
    pub fn is_inside(&self, rule: &HeadRule, point: &Point3) -> Result<bool> {
        let side_of = |id: SurfaceId| -> Result<Sense> {
            self.surfaces
                .get(&id)
                .map(|p| p.side(point))
                .ok_or(GeomError::UnknownSurface(id))
        };
        rule.is_valid(&side_of)
    }

    /// Cells whose rule contains `point`.
    pub fn cells_at(&self, point: &Point3) -> Result<Vec<CellId>> {
        let mut hits = Vec::new();
        for cell in self.cells.values() {
            if self.is_inside(&cell.rule, point)? {
                hits.push(cell.id);
            }
        }
        Ok(hits)
    }

    /// Cell table as pretty JSON, for inspection.
    pub fn cells_to_json(&self) -> std::result::Result<String, serde_json::Error> {
        let cells: Vec<&Cell> = self.cells.values().collect();
        serde_json::to_string_pretty(&cells)
    }

    fn check_surfaces(&self, rule: &HeadRule) -> Result<()> {
        match rule.surfaces().into_iter().find(|s| !self.surfaces.contains_key(s)) {
            Some(missing) => Err(GeomError::UnknownSurface(missing)),
            None => Ok(()),
        }
    }
}
