//! X-Z grid subdivision of selected layers.
//!
//! Each divided layer's single cell is replaced by `nx * nz` cells, one
//! per column `i` and row `j`. Internal planes sit at the partition
//! points; the outermost columns and rows are bounded by the slab's own
//! side surfaces rather than by an internal plane.
//!
//! Variables read by [`GridDivision::populate`] (prefix = key name):
//!
//! | key       | meaning                                            |
//! |-----------|----------------------------------------------------|
//! | `DIndex`  | layers to divide (absent or empty: no subdivision) |
//! | `NXSpace` | number of columns                                  |
//! | `NZSpace` | number of rows                                     |
//! | `XPts`    | `NXSpace - 1` internal X offsets from the axis     |
//! | `ZPts`    | `NZSpace - 1` internal Z offsets from the axis     |
//! | `Mat...`  | cell materials, see [`crate::resolve`]             |
//! | `Temp...` | cell temperatures, see [`crate::resolve`]          |

use crate::layers::LayerStack;
use crate::resolve::resolve_xz;
use crate::{BuildError, CellGrid, Result};
use slabcsg_config::VarStore;
use slabcsg_geom::{Cell, CellEdit, HalfSpace, HeadRule, Model, Plane, SurfaceId};
use slabcsg_math::Frame;
use tracing::{debug, warn};

/// Grid subdivision settings and surfaces for one layer stack.
#[derive(Debug, Clone)]
pub struct GridDivision {
    key_name: String,
    divide_index: Vec<usize>,
    n_x: usize,
    n_z: usize,
    x_pts: Vec<f64>,
    z_pts: Vec<f64>,
    mat_index: CellGrid<String>,
    mat_temp: CellGrid<f64>,
    x_planes: Vec<SurfaceId>,
    z_planes: Vec<SurfaceId>,
    surfaces_built: bool,
}

impl GridDivision {
    /// New, inactive subdivision reading variables under `key_name`.
    pub fn new(key_name: impl Into<String>) -> Self {
        Self {
            key_name: key_name.into(),
            divide_index: Vec::new(),
            n_x: 0,
            n_z: 0,
            x_pts: Vec::new(),
            z_pts: Vec::new(),
            mat_index: CellGrid::empty(0, 0),
            mat_temp: CellGrid::empty(0, 0),
            x_planes: Vec::new(),
            z_planes: Vec::new(),
            surfaces_built: false,
        }
    }

    /// Variable prefix.
    pub fn key_name(&self) -> &str {
        &self.key_name
    }

    /// True if at least one layer will be divided.
    pub fn is_active(&self) -> bool {
        !self.divide_index.is_empty()
    }

    /// Number of divided layers.
    pub fn n_divide(&self) -> usize {
        self.divide_index.len()
    }

    /// Stack layer of each divided layer.
    pub fn divide_index(&self) -> &[usize] {
        &self.divide_index
    }

    /// Columns along X.
    pub fn n_x_space(&self) -> usize {
        self.n_x
    }

    /// Rows along Z.
    pub fn n_z_space(&self) -> usize {
        self.n_z
    }

    /// Sorted internal X offsets.
    pub fn x_points(&self) -> &[f64] {
        &self.x_pts
    }

    /// Sorted internal Z offsets.
    pub fn z_points(&self) -> &[f64] {
        &self.z_pts
    }

    /// Materials, shaped `[n_divide][n_x][n_z]`.
    pub fn materials(&self) -> &CellGrid<String> {
        &self.mat_index
    }

    /// Temperatures, shaped `[n_divide][n_x][n_z]`.
    pub fn temperatures(&self) -> &CellGrid<f64> {
        &self.mat_temp
    }

    /// Internal X planes, in partition order.
    pub fn x_planes(&self) -> &[SurfaceId] {
        &self.x_planes
    }

    /// Internal Z planes, in partition order.
    pub fn z_planes(&self) -> &[SurfaceId] {
        &self.z_planes
    }

    /// Read the subdivision for `stack`, which must already be populated.
    ///
    /// Subdivision is switched off, with a warning, when no layer is
    /// selected, when any selected layer is outside the stack, or when the
    /// grid has no columns or rows.
    pub fn populate(&mut self, store: &VarStore, stack: &LayerStack) -> Result<()> {
        self.reset();
        let key = self.key_name.clone();
        let n_slab = stack.n_layers();

        let divide_index: Vec<usize> = store.eval_def_var(&format!("{key}DIndex"), Vec::new())?;
        if divide_index.is_empty() {
            warn!(key = %key, "no divided layers; grid subdivision disabled");
            return Ok(());
        }
        if let Some(bad) = divide_index.iter().find(|&&d| d >= n_slab) {
            warn!(
                key = %key,
                layer = *bad,
                n_slab,
                "divided layer outside stack; grid subdivision disabled"
            );
            return Ok(());
        }
        for (k, d) in divide_index.iter().enumerate() {
            if divide_index[..k].contains(d) {
                warn!(key = %key, layer = *d, "layer selected for division more than once");
            }
        }

        let n_x: usize = store.eval_var(&format!("{key}NXSpace"))?;
        let n_z: usize = store.eval_var(&format!("{key}NZSpace"))?;
        let n_cells = n_x
            .checked_mul(n_z)
            .and_then(|n| n.checked_mul(divide_index.len()))
            .ok_or_else(|| {
                BuildError::invalid(
                    format!("{key}NXSpace"),
                    format!("{n_x} x {n_z} grid on {} layers is too large", divide_index.len()),
                )
            })?;
        if n_cells == 0 {
            warn!(key = %key, n_x, n_z, "empty grid; grid subdivision disabled");
            return Ok(());
        }

        let x_pts = read_partition(store, &format!("{key}XPts"), n_x - 1, 0.5 * stack.width())?;
        let z_pts = read_partition(store, &format!("{key}ZPts"), n_z - 1, 0.5 * stack.height())?;

        let shape = [divide_index.len(), n_x, n_z];
        let mat_key = format!("{key}Mat");
        let temp_key = format!("{key}Temp");
        let mat_index = CellGrid::try_from_fn(shape, |d, i, j| {
            resolve_xz::<String>(store, &mat_key, d, i, j).map(|r| r.value)
        })?;
        let mat_temp = CellGrid::try_from_fn(shape, |d, i, j| {
            resolve_xz::<f64>(store, &temp_key, d, i, j).map(|r| r.value)
        })?;

        debug!(key = %key, n_divide = shape[0], n_x, n_z, "populated grid subdivision");
        self.divide_index = divide_index;
        self.n_x = n_x;
        self.n_z = n_z;
        self.x_pts = x_pts;
        self.z_pts = z_pts;
        self.mat_index = mat_index;
        self.mat_temp = mat_temp;
        Ok(())
    }

    /// Build one plane per partition point, in the stack's frame.
    pub fn create_surfaces(&mut self, model: &mut Model, frame: &Frame) -> Result<()> {
        if !self.is_active() {
            return Ok(());
        }
        let x = frame.x_axis.into_inner();
        let z = frame.z_axis.into_inner();
        self.x_planes = self
            .x_pts
            .iter()
            .map(|&px| model.add_plane(Plane::new(frame.point(px, 0.0, 0.0), x)))
            .collect::<slabcsg_geom::Result<Vec<_>>>()?;
        self.z_planes = self
            .z_pts
            .iter()
            .map(|&pz| model.add_plane(Plane::new(frame.point(0.0, 0.0, pz), z)))
            .collect::<slabcsg_geom::Result<Vec<_>>>()?;
        self.surfaces_built = true;
        Ok(())
    }

    /// Rule selecting column `i`.
    ///
    /// Column 0 is bounded below by the slab's left side and the last
    /// column above by its right side; with a single column the band is
    /// the full slab width.
    pub fn x_band(&self, i: usize, stack: &LayerStack) -> Result<HeadRule> {
        self.check_built("x_band")?;
        if i >= self.n_x {
            return Err(BuildError::index(&self.key_name, "column", i, self.n_x));
        }
        Ok(band(&self.x_planes, i, stack.left_edge()?, stack.right_edge()?))
    }

    /// Rule selecting row `j`; same boundary rule as [`GridDivision::x_band`]
    /// using the slab's base and top.
    pub fn z_band(&self, j: usize, stack: &LayerStack) -> Result<HeadRule> {
        self.check_built("z_band")?;
        if j >= self.n_z {
            return Err(BuildError::index(&self.key_name, "row", j, self.n_z));
        }
        Ok(band(&self.z_planes, j, stack.base_edge()?, stack.top_edge()?))
    }

    /// Replacement edits, one per divided layer, for a stack whose cells
    /// exist in `model`. Fresh cell ids are drawn from `model`; the model
    /// itself is not changed until the caller applies the edits.
    pub fn create_objects(&self, stack: &LayerStack, model: &mut Model) -> Result<Vec<CellEdit>> {
        if !self.is_active() {
            return Ok(Vec::new());
        }
        self.check_built("create_objects")?;

        let mut edits = Vec::with_capacity(self.divide_index.len());
        for (d, &layer) in self.divide_index.iter().enumerate() {
            let parent = stack.cell_index(layer)?;
            let slab = stack.front_surface(layer)?.intersect(stack.back_surface(layer)?);
            let mut cells = Vec::with_capacity(self.n_x * self.n_z);
            for i in 0..self.n_x {
                let column = slab.clone().intersect(self.x_band(i, stack)?);
                for j in 0..self.n_z {
                    let rule = column.clone().intersect(self.z_band(j, stack)?);
                    cells.push(Cell::new(
                        model.next_cell_id()?,
                        self.mat_index[(d, i, j)].clone(),
                        self.mat_temp[(d, i, j)],
                        rule,
                    ));
                }
            }
            debug!(key = %self.key_name, layer, parent = %parent, cells = cells.len(), "dividing layer");
            edits.push(CellEdit::replace(parent, cells));
        }
        Ok(edits)
    }

    fn check_built(&self, step: &'static str) -> Result<()> {
        if self.surfaces_built {
            Ok(())
        } else {
            Err(BuildError::phase(&self.key_name, step, "create_surfaces"))
        }
    }

    fn reset(&mut self) {
        let key_name = std::mem::take(&mut self.key_name);
        *self = Self::new(key_name);
    }
}

/// Band `k` between internal planes, with the outer edges substituted at
/// either end.
fn band(planes: &[SurfaceId], k: usize, lower: HeadRule, upper: HeadRule) -> HeadRule {
    let lo = match k {
        0 => lower,
        _ => HalfSpace::pos(planes[k - 1]).into(),
    };
    let hi = if k == planes.len() {
        upper
    } else {
        HalfSpace::neg(planes[k]).into()
    };
    lo.intersect(hi)
}

/// Read `expected` partition points and sort them ascending.
///
/// Repeated points and points outside `(-half_extent, half_extent)` are
/// reported but kept: they give empty bands.
fn read_partition(store: &VarStore, key: &str, expected: usize, half_extent: f64) -> Result<Vec<f64>> {
    let mut pts: Vec<f64> = if expected == 0 {
        store.eval_def_var(key, Vec::new())?
    } else {
        store.eval_var(key)?
    };
    if pts.len() != expected {
        return Err(BuildError::PartitionLength {
            key: key.to_string(),
            expected,
            found: pts.len(),
        });
    }
    pts.sort_by(f64::total_cmp);
    if pts.windows(2).any(|w| w[1] <= w[0]) {
        warn!(key, points = ?pts, "partition points not strictly increasing");
    }
    if pts.iter().any(|p| p.abs() >= half_extent) {
        warn!(key, points = ?pts, half_extent, "partition point on or outside slab edge");
    }
    Ok(pts)
}
