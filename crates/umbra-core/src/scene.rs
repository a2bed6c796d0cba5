//! Scene relation tables: scenes, nodes, drawables and viewports.
//!
//! Everything is keyed by id. Objects refer to each other only through ids,
//! so removing one never dangles a pointer; lookups through a stale id just
//! return `None`.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::camera::Camera;
use crate::error::{Result, UmbraError};
use crate::geometry::IntRect;
use crate::ids::{DrawableId, IdAllocator, NodeId, SceneId, ViewportId};
use crate::material::Material;
use crate::spatial::{DrawableKind, SpatialIndex};

/// A scene and its optional spatial index.
#[derive(Default)]
pub struct Scene {
    spatial_index: Option<Box<dyn SpatialIndex>>,
}

impl Scene {
    pub fn spatial_index(&self) -> Option<&dyn SpatialIndex> {
        self.spatial_index.as_deref()
    }
}

impl fmt::Debug for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scene")
            .field("has_spatial_index", &self.spatial_index.is_some())
            .finish()
    }
}

/// A node: a named attachment point for drawables.
#[derive(Debug, Clone)]
pub struct Node {
    name: String,
    scene: Option<SceneId>,
    drawables: Vec<DrawableId>,
}

impl Node {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The scene this node lives in, if any.
    pub fn scene(&self) -> Option<SceneId> {
        self.scene
    }

    pub fn drawables(&self) -> &[DrawableId] {
        &self.drawables
    }
}

/// A drawable component attached to a node.
#[derive(Debug, Clone)]
pub struct Drawable {
    node: NodeId,
    kind: DrawableKind,
    material: Option<Rc<Material>>,
}

impl Drawable {
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn kind(&self) -> DrawableKind {
        self.kind
    }

    pub fn material(&self) -> Option<&Rc<Material>> {
        self.material.as_ref()
    }
}

/// A viewport: which scene is rendered, through which camera, where.
#[derive(Debug, Clone, Default)]
pub struct Viewport {
    pub scene: Option<SceneId>,
    pub camera: Option<Camera>,
    /// Screen rectangle; [`IntRect::ZERO`] means the whole output.
    pub rect: IntRect,
}

impl Viewport {
    pub fn new(scene: SceneId, camera: Camera) -> Self {
        Self {
            scene: Some(scene),
            camera: Some(camera),
            rect: IntRect::ZERO,
        }
    }

    #[must_use]
    pub fn with_rect(mut self, rect: IntRect) -> Self {
        self.rect = rect;
        self
    }
}

/// Owner of all relation tables.
#[derive(Debug, Default)]
pub struct World {
    ids: IdAllocator,
    scenes: HashMap<SceneId, Scene>,
    nodes: HashMap<NodeId, Node>,
    drawables: HashMap<DrawableId, Drawable>,
    // Ordered: viewport index lookups follow insertion order.
    viewports: Vec<(ViewportId, Viewport)>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    // ========== Scenes ==========

    pub fn create_scene(&mut self) -> SceneId {
        let id = SceneId(self.ids.next_raw());
        self.scenes.insert(id, Scene::default());
        id
    }

    /// Removes a scene and every node in it.
    pub fn remove_scene(&mut self, scene: SceneId) -> bool {
        if self.scenes.remove(&scene).is_none() {
            return false;
        }
        let doomed: Vec<NodeId> = self
            .nodes
            .iter()
            .filter(|(_, n)| n.scene == Some(scene))
            .map(|(id, _)| *id)
            .collect();
        for node in doomed {
            self.remove_node(node);
        }
        true
    }

    pub fn scene(&self, scene: SceneId) -> Option<&Scene> {
        self.scenes.get(&scene)
    }

    /// Installs (or replaces) the scene's spatial index.
    pub fn set_spatial_index(
        &mut self,
        scene: SceneId,
        index: impl SpatialIndex + 'static,
    ) -> Result<()> {
        let entry = self
            .scenes
            .get_mut(&scene)
            .ok_or(UmbraError::SceneNotFound(scene))?;
        entry.spatial_index = Some(Box::new(index));
        Ok(())
    }

    pub fn clear_spatial_index(&mut self, scene: SceneId) {
        if let Some(entry) = self.scenes.get_mut(&scene) {
            entry.spatial_index = None;
        }
    }

    // ========== Nodes ==========

    pub fn create_node(&mut self, scene: SceneId, name: impl Into<String>) -> Result<NodeId> {
        if !self.scenes.contains_key(&scene) {
            return Err(UmbraError::SceneNotFound(scene));
        }
        Ok(self.insert_node(Some(scene), name.into()))
    }

    /// Creates a node outside of any scene.
    pub fn create_detached_node(&mut self, name: impl Into<String>) -> NodeId {
        self.insert_node(None, name.into())
    }

    fn insert_node(&mut self, scene: Option<SceneId>, name: String) -> NodeId {
        let id = NodeId(self.ids.next_raw());
        self.nodes.insert(
            id,
            Node {
                name,
                scene,
                drawables: Vec::new(),
            },
        );
        id
    }

    /// Removes a node and its drawables.
    pub fn remove_node(&mut self, node: NodeId) -> bool {
        let Some(removed) = self.nodes.remove(&node) else {
            return false;
        };
        for drawable in removed.drawables {
            self.drawables.remove(&drawable);
        }
        true
    }

    pub fn node(&self, node: NodeId) -> Option<&Node> {
        self.nodes.get(&node)
    }

    pub fn contains_node(&self, node: NodeId) -> bool {
        self.nodes.contains_key(&node)
    }

    /// First static model attached to the node.
    pub fn static_model(&self, node: NodeId) -> Option<DrawableId> {
        self.nodes.get(&node)?.drawables.iter().copied().find(|d| {
            self.drawables
                .get(d)
                .is_some_and(|dr| dr.kind == DrawableKind::StaticModel)
        })
    }

    // ========== Drawables ==========

    pub fn create_drawable(&mut self, node: NodeId, kind: DrawableKind) -> Result<DrawableId> {
        let id = DrawableId(self.ids.next_raw());
        let entry = self
            .nodes
            .get_mut(&node)
            .ok_or(UmbraError::NodeNotFound(node))?;
        entry.drawables.push(id);
        self.drawables.insert(
            id,
            Drawable {
                node,
                kind,
                material: None,
            },
        );
        Ok(id)
    }

    pub fn remove_drawable(&mut self, drawable: DrawableId) -> bool {
        let Some(removed) = self.drawables.remove(&drawable) else {
            return false;
        };
        if let Some(node) = self.nodes.get_mut(&removed.node) {
            node.drawables.retain(|d| *d != drawable);
        }
        true
    }

    pub fn drawable(&self, drawable: DrawableId) -> Option<&Drawable> {
        self.drawables.get(&drawable)
    }

    /// Sets the drawable's material and returns the previous one.
    pub fn set_material(
        &mut self,
        drawable: DrawableId,
        material: Option<Rc<Material>>,
    ) -> Option<Option<Rc<Material>>> {
        let entry = self.drawables.get_mut(&drawable)?;
        Some(std::mem::replace(&mut entry.material, material))
    }

    // ========== Viewports ==========

    pub fn add_viewport(&mut self, viewport: Viewport) -> ViewportId {
        let id = ViewportId(self.ids.next_raw());
        self.viewports.push((id, viewport));
        id
    }

    pub fn remove_viewport(&mut self, viewport: ViewportId) -> bool {
        let before = self.viewports.len();
        self.viewports.retain(|(id, _)| *id != viewport);
        self.viewports.len() != before
    }

    pub fn viewport(&self, viewport: ViewportId) -> Option<&Viewport> {
        self.viewports
            .iter()
            .find(|(id, _)| *id == viewport)
            .map(|(_, v)| v)
    }

    pub fn viewport_mut(&mut self, viewport: ViewportId) -> Option<&mut Viewport> {
        self.viewports
            .iter_mut()
            .find(|(id, _)| *id == viewport)
            .map(|(_, v)| v)
    }

    /// The `index`-th viewport (in insertion order) rendering `scene`.
    pub fn viewport_for_scene(&self, scene: SceneId, index: usize) -> Option<ViewportId> {
        self.viewports
            .iter()
            .filter(|(_, v)| v.scene == Some(scene))
            .nth(index)
            .map(|(id, _)| *id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::TriangleIndex;

    #[test]
    fn test_remove_node_expires_drawables() {
        let mut world = World::new();
        let scene = world.create_scene();
        let node = world.create_node(scene, "screen").unwrap();
        let model = world
            .create_drawable(node, DrawableKind::StaticModel)
            .unwrap();
        assert_eq!(world.static_model(node), Some(model));

        assert!(world.remove_node(node));
        assert!(world.node(node).is_none());
        assert!(world.drawable(model).is_none());
        assert!(!world.remove_node(node));
    }

    #[test]
    fn test_static_model_skips_other_kinds() {
        let mut world = World::new();
        let scene = world.create_scene();
        let node = world.create_node(scene, "n").unwrap();
        world
            .create_drawable(node, DrawableKind::BillboardSet)
            .unwrap();
        assert_eq!(world.static_model(node), None);
        let model = world
            .create_drawable(node, DrawableKind::StaticModel)
            .unwrap();
        assert_eq!(world.static_model(node), Some(model));
    }

    #[test]
    fn test_viewport_for_scene_by_index() {
        let mut world = World::new();
        let a = world.create_scene();
        let b = world.create_scene();
        let a0 = world.add_viewport(Viewport::new(a, Camera::default()));
        let _b0 = world.add_viewport(Viewport::new(b, Camera::default()));
        let a1 = world.add_viewport(Viewport::new(a, Camera::default()));

        assert_eq!(world.viewport_for_scene(a, 0), Some(a0));
        assert_eq!(world.viewport_for_scene(a, 1), Some(a1));
        assert_eq!(world.viewport_for_scene(a, 2), None);

        assert!(world.remove_viewport(a0));
        assert_eq!(world.viewport_for_scene(a, 0), Some(a1));
        assert!(world.viewport(a0).is_none());
    }

    #[test]
    fn test_remove_scene_removes_nodes() {
        let mut world = World::new();
        let scene = world.create_scene();
        world.set_spatial_index(scene, TriangleIndex::new()).unwrap();
        assert!(world.scene(scene).unwrap().spatial_index().is_some());
        let node = world.create_node(scene, "n").unwrap();
        assert!(world.remove_scene(scene));
        assert!(!world.contains_node(node));
        assert!(matches!(
            world.create_node(scene, "late"),
            Err(UmbraError::SceneNotFound(_))
        ));
    }

    #[test]
    fn test_set_material_returns_previous() {
        let mut world = World::new();
        let node = world.create_detached_node("n");
        let model = world
            .create_drawable(node, DrawableKind::StaticModel)
            .unwrap();
        let material = Rc::new(Material::new("t"));
        assert_eq!(world.set_material(model, Some(material.clone())), Some(None));
        let previous = world.set_material(model, None).unwrap();
        assert!(previous.is_some_and(|m| Rc::ptr_eq(&m, &material)));
        assert_eq!(world.set_material(DrawableId(999), None), None);
    }
}
