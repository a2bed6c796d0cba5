//! Lookup of UI surfaces by the node they live on.

use std::collections::BTreeMap;

use glam::IVec2;
use umbra_core::{NodeId, Result, World};

use crate::component::UiComponent;
use crate::element3d::{MappingContext, MappingError, NO_MAPPING};

/// All UI surfaces of a world, keyed by node.
///
/// Inserting attaches the component, removing detaches it. At most one
/// surface lives on a node.
#[derive(Debug, Default)]
pub struct SurfaceTable {
    surfaces: BTreeMap<NodeId, UiComponent>,
}

impl SurfaceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches `component` to `node` and stores it.
    ///
    /// A surface already on the node is detached and returned.
    pub fn insert(
        &mut self,
        world: &mut World,
        node: NodeId,
        mut component: UiComponent,
    ) -> Result<Option<UiComponent>> {
        let previous = self.remove(world, node);
        component.attach_to_node(world, node)?;
        self.surfaces.insert(node, component);
        Ok(previous)
    }

    /// Detaches and returns the surface on `node`.
    pub fn remove(&mut self, world: &mut World, node: NodeId) -> Option<UiComponent> {
        let mut component = self.surfaces.remove(&node)?;
        component.detach(world);
        Some(component)
    }

    pub fn get(&self, node: NodeId) -> Option<&UiComponent> {
        self.surfaces.get(&node)
    }

    pub fn get_mut(&mut self, node: NodeId) -> Option<&mut UiComponent> {
        self.surfaces.get_mut(&node)
    }

    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }

    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.surfaces.keys().copied()
    }

    /// Maps a screen position onto the surface on `node`.
    pub fn screen_to_element(
        &mut self,
        node: NodeId,
        context: &MappingContext<'_>,
        screen: IVec2,
    ) -> IVec2 {
        self.surfaces
            .get_mut(&node)
            .map_or(NO_MAPPING, |s| s.screen_to_element(context, screen))
    }

    /// Finds the surface visible under a screen position.
    ///
    /// Surfaces hidden behind other geometry report as blocked, so at most
    /// one surface can answer a position.
    pub fn pick(&mut self, context: &MappingContext<'_>, screen: IVec2) -> Option<(NodeId, IVec2)> {
        for (node, surface) in &mut self.surfaces {
            match surface.root_mut().try_screen_to_element(context, screen) {
                Ok(position) => return Some((*node, position)),
                Err(MappingError::NoHit | MappingError::Blocked(_)) => {}
                Err(err) => log::trace!("surface on {node} skipped: {err}"),
            }
        }
        None
    }

    /// Drops surfaces whose node no longer exists. Returns how many.
    pub fn prune(&mut self, world: &mut World) -> usize {
        let before = self.surfaces.len();
        let dead: Vec<NodeId> = self
            .surfaces
            .keys()
            .copied()
            .filter(|node| !world.contains_node(*node))
            .collect();
        for node in dead {
            if let Some(mut component) = self.surfaces.remove(&node) {
                component.detach(world);
            }
        }
        let pruned = before - self.surfaces.len();
        if pruned > 0 {
            log::debug!("pruned {pruned} UI surfaces on removed nodes");
        }
        pruned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    use glam::{Mat4, UVec2, Vec3};
    use umbra_core::{Camera, DrawableKind, TriangleIndex, Viewport};
    use umbra_render::HeadlessDevice;

    use crate::scaling::UiScaling;

    fn surface_at(
        world: &mut World,
        index: &mut TriangleIndex,
        table: &mut SurfaceTable,
        device: &Rc<HeadlessDevice>,
        scene: umbra_core::SceneId,
        x: f32,
    ) -> NodeId {
        let node = world.create_node(scene, "panel").unwrap();
        table
            .insert(world, node, UiComponent::new(device.clone()))
            .unwrap();
        let model = world.static_model(node).unwrap();
        index.insert_quad(
            model,
            DrawableKind::StaticModel,
            Mat4::from_translation(Vec3::new(x, 0.0, 0.0)),
        );
        node
    }

    #[test]
    fn test_pick_finds_surface_under_cursor() {
        let device = Rc::new(HeadlessDevice::new());
        let mut world = World::new();
        let scene = world.create_scene();
        world.add_viewport(Viewport::new(scene, Camera::new(1.0)));
        let mut table = SurfaceTable::new();
        let mut index = TriangleIndex::new();
        let left = surface_at(&mut world, &mut index, &mut table, &device, scene, -0.75);
        let right = surface_at(&mut world, &mut index, &mut table, &device, scene, 0.75);
        world.set_spatial_index(scene, index).unwrap();

        let context = MappingContext {
            world: &world,
            scaling: UiScaling::default(),
            output_size: UVec2::new(400, 400),
        };
        let (hit, _) = table.pick(&context, IVec2::new(200 + 60, 200)).unwrap();
        assert_eq!(hit, right);
        let (hit, _) = table.pick(&context, IVec2::new(200 - 60, 200)).unwrap();
        assert_eq!(hit, left);
        assert!(table.pick(&context, IVec2::new(200, 5)).is_none());

        assert_eq!(
            table.screen_to_element(NodeId(999), &context, IVec2::new(200, 200)),
            NO_MAPPING
        );
    }

    #[test]
    fn test_insert_replaces_and_remove_detaches() {
        let device = Rc::new(HeadlessDevice::new());
        let mut world = World::new();
        let node = world.create_detached_node("panel");
        let mut table = SurfaceTable::new();

        assert!(table
            .insert(&mut world, node, UiComponent::new(device.clone()))
            .unwrap()
            .is_none());
        let replaced = table
            .insert(&mut world, node, UiComponent::new(device.clone()))
            .unwrap();
        assert!(replaced.is_some_and(|c| c.node().is_none()));
        assert_eq!(table.len(), 1);
        assert!(world.static_model(node).is_some());

        let removed = table.remove(&mut world, node).unwrap();
        assert!(removed.node().is_none());
        assert!(world.static_model(node).is_none());
        assert!(table.is_empty());
    }

    #[test]
    fn test_prune_drops_dead_nodes() {
        let device = Rc::new(HeadlessDevice::new());
        let mut world = World::new();
        let kept = world.create_detached_node("kept");
        let gone = world.create_detached_node("gone");
        let mut table = SurfaceTable::new();
        table
            .insert(&mut world, kept, UiComponent::new(device.clone()))
            .unwrap();
        table
            .insert(&mut world, gone, UiComponent::new(device.clone()))
            .unwrap();
        world.remove_node(gone);

        assert_eq!(table.prune(&mut world), 1);
        assert_eq!(table.nodes().collect::<Vec<_>>(), vec![kept]);
        assert_eq!(device.live_textures(), 1);
    }
}
