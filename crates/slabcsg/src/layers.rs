//! Ordered stack of material slabs along the beam axis.
//!
//! Variables read by [`LayerStack::populate`] (prefix = key name):
//!
//! | key          | meaning                               |
//! |--------------|---------------------------------------|
//! | `NSlab`      | number of layers                      |
//! | `Width`      | full width along local X              |
//! | `Height`     | full height along local Z             |
//! | `Thick<i>`   | thickness of layer `i` along local Y  |
//! | `Mat<i>`     | material of layer `i`                 |
//! | `Temp<i>`    | temperature of layer `i`              |
//!
//! The stack starts at the frame origin and grows along +Y; the
//! footprint is centred on the Y axis.

use crate::{BuildError, Construct, Result};
use slabcsg_config::VarStore;
use slabcsg_geom::{Cell, CellId, HalfSpace, HeadRule, Model, Plane, SurfaceId};
use slabcsg_math::{Frame, Point3, Vec3};
use tracing::debug;

/// One slab of the stack.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    /// Position in the stack, 0 at the front.
    pub index: usize,
    /// Extent along the beam axis.
    pub thickness: f64,
    /// Material identifier.
    pub material: String,
    /// Temperature.
    pub temperature: f64,
    /// Offset of the front face from the stack origin.
    pub start: f64,
}

impl Layer {
    /// Offset of the back face from the stack origin.
    pub fn end(&self) -> f64 {
        self.start + self.thickness
    }

    /// Offset of the layer mid-plane.
    pub fn mid(&self) -> f64 {
        self.start + 0.5 * self.thickness
    }
}

/// A point where another component can attach, with its outward axis.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkPoint {
    /// Global position.
    pub point: Point3,
    /// Outward unit direction.
    pub axis: Vec3,
}

#[derive(Debug, Clone)]
struct StackSurfaces {
    /// Plane 0; absent when the front is shared.
    front: Option<SurfaceId>,
    /// Back plane of each layer.
    backs: Vec<SurfaceId>,
    left: SurfaceId,
    right: SurfaceId,
    base: SurfaceId,
    top: SurfaceId,
}

/// Builder for an ordered stack of slabs, one cell per slab.
#[derive(Debug, Clone)]
pub struct LayerStack {
    key_name: String,
    width: f64,
    height: f64,
    layers: Vec<Layer>,
    front_shared: Option<HeadRule>,
    frame: Option<Frame>,
    surfaces: Option<StackSurfaces>,
    cells: Vec<CellId>,
}

impl LayerStack {
    /// New, unpopulated stack reading variables under `key_name`.
    pub fn new(key_name: impl Into<String>) -> Self {
        Self {
            key_name: key_name.into(),
            width: 0.0,
            height: 0.0,
            layers: Vec::new(),
            front_shared: None,
            frame: None,
            surfaces: None,
            cells: Vec::new(),
        }
    }

    /// Use an external rule as the front of layer 0 instead of building a
    /// plane. Call before [`Construct::create_surfaces`].
    pub fn set_front_shared(&mut self, rule: HeadRule) {
        self.front_shared = Some(rule);
    }

    /// True if layer 0's front comes from another component.
    pub fn is_front_shared(&self) -> bool {
        self.front_shared.is_some()
    }

    /// Number of layers.
    pub fn n_layers(&self) -> usize {
        self.layers.len()
    }

    /// All layers, front to back.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Layer `index`.
    pub fn layer(&self, index: usize) -> Result<&Layer> {
        self.layers
            .get(index)
            .ok_or_else(|| BuildError::index(&self.key_name, "layer", index, self.layers.len()))
    }

    /// Full width along local X.
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Full height along local Z.
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Sum of all layer thicknesses.
    pub fn total_depth(&self) -> f64 {
        self.layers.last().map_or(0.0, Layer::end)
    }

    /// Half-space rule in front of layer `index`'s front face.
    pub fn front_surface(&self, index: usize) -> Result<HeadRule> {
        let surf = self.surfaces("front_surface")?;
        self.layer(index)?;
        if index > 0 {
            return Ok(HalfSpace::pos(surf.backs[index - 1]).into());
        }
        match (&self.front_shared, surf.front) {
            (Some(rule), _) => Ok(rule.clone()),
            (None, Some(front)) => Ok(HalfSpace::pos(front).into()),
            (None, None) => Err(BuildError::phase(
                &self.key_name,
                "front_surface",
                "create_surfaces",
            )),
        }
    }

    /// Half-space rule behind layer `index`'s back face.
    pub fn back_surface(&self, index: usize) -> Result<HeadRule> {
        let surf = self.surfaces("back_surface")?;
        self.layer(index)?;
        Ok(HalfSpace::neg(surf.backs[index]).into())
    }

    /// Inside of the slab's -X boundary.
    pub fn left_edge(&self) -> Result<HeadRule> {
        Ok(HalfSpace::pos(self.surfaces("left_edge")?.left).into())
    }

    /// Inside of the slab's +X boundary.
    pub fn right_edge(&self) -> Result<HeadRule> {
        Ok(HalfSpace::neg(self.surfaces("right_edge")?.right).into())
    }

    /// Inside of the slab's -Z boundary.
    pub fn base_edge(&self) -> Result<HeadRule> {
        Ok(HalfSpace::pos(self.surfaces("base_edge")?.base).into())
    }

    /// Inside of the slab's +Z boundary.
    pub fn top_edge(&self) -> Result<HeadRule> {
        Ok(HalfSpace::neg(self.surfaces("top_edge")?.top).into())
    }

    /// The four lateral boundaries of the footprint.
    pub fn side_rule(&self) -> Result<HeadRule> {
        Ok(self
            .left_edge()?
            .intersect(self.right_edge()?)
            .intersect(self.base_edge()?)
            .intersect(self.top_edge()?))
    }

    /// Full region of layer `index`.
    pub fn layer_rule(&self, index: usize) -> Result<HeadRule> {
        Ok(self
            .front_surface(index)?
            .intersect(self.back_surface(index)?)
            .intersect(self.side_rule()?))
    }

    /// Envelope of the whole stack, for excluding it from an outer cell.
    pub fn outer_rule(&self) -> Result<HeadRule> {
        let last = self.layers.len().checked_sub(1).ok_or_else(|| {
            BuildError::phase(&self.key_name, "outer_rule", "populate")
        })?;
        Ok(self
            .front_surface(0)?
            .intersect(self.back_surface(last)?)
            .intersect(self.side_rule()?))
    }

    /// Cell created for layer `index`.
    pub fn cell_index(&self, index: usize) -> Result<CellId> {
        self.layer(index)?;
        self.cells
            .get(index)
            .copied()
            .ok_or_else(|| BuildError::phase(&self.key_name, "cell_index", "create_objects"))
    }

    /// Cells of all layers, front to back.
    pub fn cell_ids(&self) -> &[CellId] {
        &self.cells
    }

    /// Centre of the front face, pointing back up the beam.
    pub fn front_link(&self) -> Result<LinkPoint> {
        let frame = self.built_frame("front_link")?;
        Ok(LinkPoint {
            point: frame.point(0.0, 0.0, 0.0),
            axis: -frame.y_axis.into_inner(),
        })
    }

    /// Centre of the back face, pointing down the beam.
    pub fn back_link(&self) -> Result<LinkPoint> {
        let frame = self.built_frame("back_link")?;
        Ok(LinkPoint {
            point: frame.point(0.0, self.total_depth(), 0.0),
            axis: frame.y_axis.into_inner(),
        })
    }

    fn built_frame(&self, step: &'static str) -> Result<&Frame> {
        self.frame
            .as_ref()
            .ok_or_else(|| BuildError::phase(&self.key_name, step, "create_surfaces"))
    }

    fn surfaces(&self, step: &'static str) -> Result<&StackSurfaces> {
        self.surfaces
            .as_ref()
            .ok_or_else(|| BuildError::phase(&self.key_name, step, "create_surfaces"))
    }

    fn positive(&self, value: f64, key: &str) -> Result<f64> {
        if value > 0.0 {
            Ok(value)
        } else {
            Err(BuildError::invalid(key, format!("must be positive, got {value}")))
        }
    }
}

impl Construct for LayerStack {
    fn key_name(&self) -> &str {
        &self.key_name
    }

    fn populate(&mut self, store: &VarStore) -> Result<()> {
        let key = &self.key_name;
        let n_slab: usize = store.eval_var(&format!("{key}NSlab"))?;
        if n_slab == 0 {
            return Err(BuildError::invalid(format!("{key}NSlab"), "stack needs at least one layer"));
        }
        let width = self.positive(store.eval_var(&format!("{key}Width"))?, &format!("{key}Width"))?;
        let height = self.positive(store.eval_var(&format!("{key}Height"))?, &format!("{key}Height"))?;

        let mut layers = Vec::with_capacity(n_slab);
        let mut start = 0.0;
        for index in 0..n_slab {
            let thick_key = format!("{key}Thick{index}");
            let thickness = self.positive(store.eval_var(&thick_key)?, &thick_key)?;
            let material: String = store.eval_var(&format!("{key}Mat{index}"))?;
            let temperature: f64 = store.eval_var(&format!("{key}Temp{index}"))?;
            layers.push(Layer {
                index,
                thickness,
                material,
                temperature,
                start,
            });
            start += thickness;
        }
        debug!(key = %self.key_name, layers = n_slab, depth = start, "populated layer stack");

        self.width = width;
        self.height = height;
        self.layers = layers;
        self.surfaces = None;
        self.cells.clear();
        Ok(())
    }

    fn create_surfaces(&mut self, model: &mut Model, frame: &Frame) -> Result<()> {
        if self.layers.is_empty() {
            return Err(BuildError::phase(&self.key_name, "create_surfaces", "populate"));
        }
        let y = frame.y_axis.into_inner();
        let x = frame.x_axis.into_inner();
        let z = frame.z_axis.into_inner();

        let front = match self.front_shared {
            Some(_) => None,
            None => Some(model.add_plane(Plane::new(frame.point(0.0, 0.0, 0.0), y))?),
        };
        let backs = self
            .layers
            .iter()
            .map(|l| model.add_plane(Plane::new(frame.point(0.0, l.end(), 0.0), y)))
            .collect::<slabcsg_geom::Result<Vec<_>>>()?;
        let (hw, hh) = (0.5 * self.width, 0.5 * self.height);
        let left = model.add_plane(Plane::new(frame.point(-hw, 0.0, 0.0), x))?;
        let right = model.add_plane(Plane::new(frame.point(hw, 0.0, 0.0), x))?;
        let base = model.add_plane(Plane::new(frame.point(0.0, 0.0, -hh), z))?;
        let top = model.add_plane(Plane::new(frame.point(0.0, 0.0, hh), z))?;

        self.surfaces = Some(StackSurfaces {
            front,
            backs,
            left,
            right,
            base,
            top,
        });
        self.frame = Some(frame.clone());
        Ok(())
    }

    fn create_objects(&mut self, model: &mut Model) -> Result<()> {
        if !self.cells.is_empty() {
            return Err(BuildError::phase(&self.key_name, "create_objects", "a fresh populate"));
        }
        let mut cells = Vec::with_capacity(self.layers.len());
        for layer in &self.layers {
            let rule = self.layer_rule(layer.index)?;
            let id = model.next_cell_id()?;
            model.add_cell(Cell::new(id, layer.material.clone(), layer.temperature, rule))?;
            cells.push(id);
        }
        debug!(key = %self.key_name, cells = cells.len(), "created layer cells");
        self.cells = cells;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stack_store(key: &str, thick: &[f64]) -> VarStore {
        let mut store = VarStore::new();
        store.add_variable(format!("{key}NSlab"), thick.len());
        store.add_variable(format!("{key}Width"), 6.0);
        store.add_variable(format!("{key}Height"), 4.0);
        for (i, t) in thick.iter().enumerate() {
            store.add_variable(format!("{key}Thick{i}"), *t);
            store.add_variable(format!("{key}Mat{i}"), format!("M{i}"));
            store.add_variable(format!("{key}Temp{i}"), 300.0 + i as f64);
        }
        store
    }

    fn built(thick: &[f64]) -> (LayerStack, Model) {
        let store = stack_store("Plate", thick);
        let mut model = Model::new();
        let mut stack = LayerStack::new("Plate");
        stack.create_all(&store, &mut model, &Frame::world()).unwrap();
        (stack, model)
    }

    #[test]
    fn test_populate_cumulative_offsets() {
        let mut stack = LayerStack::new("Plate");
        stack.populate(&stack_store("Plate", &[1.0, 2.0, 0.5])).unwrap();
        assert_eq!(stack.n_layers(), 3);
        assert_eq!(stack.layer(1).unwrap().start, 1.0);
        assert_eq!(stack.layer(2).unwrap().end(), 3.5);
        assert_eq!(stack.total_depth(), 3.5);
        assert_eq!(stack.layer(2).unwrap().material, "M2");
    }

    #[test]
    fn test_populate_missing_is_fatal() {
        let mut store = stack_store("Plate", &[1.0, 2.0]);
        store.remove_variable("PlateTemp1");
        let mut stack = LayerStack::new("Plate");
        match stack.populate(&store) {
            Err(BuildError::Config(e)) => assert!(e.is_missing()),
            other => panic!("expected missing variable, got {other:?}"),
        }
        assert_eq!(stack.n_layers(), 0);
    }

    #[test]
    fn test_populate_rejects_bad_thickness() {
        let mut store = stack_store("Plate", &[1.0]);
        store.add_variable("PlateThick0", 0.0);
        let mut stack = LayerStack::new("Plate");
        assert!(matches!(
            stack.populate(&store),
            Err(BuildError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_surfaces_and_cells() {
        let (stack, model) = built(&[1.0, 2.0]);
        // Three transverse planes and four lateral ones.
        assert_eq!(model.surface_count(), 7);
        assert_eq!(model.cell_count(), 2);
        let c0 = model.cell(stack.cell_index(0).unwrap()).unwrap();
        assert_eq!(c0.material, "M0");
        assert_eq!(c0.temperature, 300.0);
        assert!(model.is_inside(&c0.rule, &Point3::new(0.0, 0.5, 0.0)).unwrap());
        assert!(!model.is_inside(&c0.rule, &Point3::new(0.0, 1.5, 0.0)).unwrap());
        assert!(!model.is_inside(&c0.rule, &Point3::new(3.5, 0.5, 0.0)).unwrap());
        assert_eq!(
            model.cells_at(&Point3::new(1.0, 2.0, -1.0)).unwrap(),
            vec![stack.cell_index(1).unwrap()]
        );
    }

    #[test]
    fn test_front_and_back_share_plane() {
        let (stack, _) = built(&[1.0, 2.0]);
        let back0 = stack.back_surface(0).unwrap();
        let front1 = stack.front_surface(1).unwrap();
        assert_eq!(back0.complement(), front1);
    }

    #[test]
    fn test_front_shared() {
        let store = stack_store("Plate", &[1.0]);
        let mut model = Model::new();
        let outer = model.add_plane(Plane::new(Point3::new(0.0, -0.5, 0.0), Vec3::y())).unwrap();
        let mut stack = LayerStack::new("Plate");
        stack.set_front_shared(HalfSpace::pos(outer).into());
        stack.create_all(&store, &mut model, &Frame::world()).unwrap();
        assert!(stack.is_front_shared());
        assert_eq!(stack.front_surface(0).unwrap(), HalfSpace::pos(outer).into());
        // Outer plane + one back plane + four lateral planes.
        assert_eq!(model.surface_count(), 6);
    }

    #[test]
    fn test_phase_errors() {
        let mut stack = LayerStack::new("Plate");
        assert!(matches!(stack.front_surface(0), Err(BuildError::Phase { .. })));
        stack.populate(&stack_store("Plate", &[1.0])).unwrap();
        assert!(matches!(stack.cell_index(0), Err(BuildError::Phase { .. })));
        assert!(matches!(stack.layer(3), Err(BuildError::Index { .. })));
    }

    #[test]
    fn test_links_follow_frame() {
        let store = stack_store("Plate", &[1.0, 2.0]);
        let mut model = Model::new();
        let frame = Frame::new(Point3::new(10.0, 0.0, 0.0), -Vec3::y(), Vec3::x());
        let mut stack = LayerStack::new("Plate");
        stack.create_all(&store, &mut model, &frame).unwrap();
        let back = stack.back_link().unwrap();
        assert!((back.point - Point3::new(13.0, 0.0, 0.0)).norm() < 1e-12);
        assert!((back.axis - Vec3::x()).norm() < 1e-12);
        let front = stack.front_link().unwrap();
        assert!((front.axis + Vec3::x()).norm() < 1e-12);
        let outer = stack.outer_rule().unwrap();
        assert!(model.is_inside(&outer, &Point3::new(12.5, 2.0, 1.0)).unwrap());
        assert!(!model.is_inside(&outer, &Point3::new(13.5, 0.0, 0.0)).unwrap());
    }
}
