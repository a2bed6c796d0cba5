//! UI root elements rendered onto a surface in a 3D scene.
//!
//! Pointer positions arrive in screen space. [`UiElement3D`] turns them into
//! element pixels by casting a ray through the viewport camera, finding the
//! surface model in the scene's spatial index, and scaling the hit's texture
//! coordinate by the element size.

use glam::{IVec2, UVec2};
use thiserror::Error;
use umbra_core::{
    DrawableId, IntRect, LogOnce, NodeId, RayQuery, SceneId, UmbraError, ViewportId, World,
};

use crate::element::{ScreenMapping, TraversalMode, UiElement};
use crate::scaling::UiScaling;

/// Returned when a position has no counterpart in the other space.
pub const NO_MAPPING: IVec2 = IVec2::new(-1, -1);

/// Why a screen position could not be mapped onto a 3D UI surface.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum MappingError {
    #[error("element is not attached to a live node")]
    NodeExpired,

    #[error("node is not in a scene")]
    NotInScene,

    #[error("node has no static model")]
    NoModel,

    #[error("scene has no spatial index")]
    NoSpatialIndex,

    #[error("no viewport renders the scene")]
    NoViewport,

    #[error("viewport has no camera")]
    NoCamera,

    #[error("viewport renders {viewport_scene:?} but the element's node belongs to {node_scene}")]
    SceneMismatch {
        node_scene: SceneId,
        viewport_scene: Option<SceneId>,
    },

    #[error("viewport rectangle has no area")]
    EmptyViewport,

    #[error("ray hit nothing")]
    NoHit,

    #[error("surface hidden behind {0}")]
    Blocked(DrawableId),

    #[error("element to screen conversion is not supported for 3D elements")]
    Unsupported,
}

impl From<MappingError> for UmbraError {
    fn from(err: MappingError) -> Self {
        match err {
            MappingError::SceneMismatch {
                node_scene,
                viewport_scene,
            } => UmbraError::CrossSceneMismatch {
                node_scene,
                viewport_scene,
            },
            other => UmbraError::MissingDependency(other.to_string()),
        }
    }
}

/// What a mapping query needs from the outside world.
#[derive(Debug, Clone, Copy)]
pub struct MappingContext<'a> {
    pub world: &'a World,
    pub scaling: UiScaling,
    /// Size of the whole output, used when the viewport rectangle is unset.
    pub output_size: UVec2,
}

/// A UI root whose pixels live on a model in a 3D scene.
#[derive(Debug, Clone)]
pub struct UiElement3D {
    element: UiElement,
    node: Option<NodeId>,
    viewport: Option<ViewportId>,
    diagnostics: LogOnce,
}

impl UiElement3D {
    /// An enabled, breadth-first root of the given size.
    pub fn new(size: IVec2) -> Self {
        let mut element = UiElement::new(size);
        element.set_enabled(true);
        element.set_traversal_mode(TraversalMode::BreadthFirst);
        Self {
            element,
            node: None,
            viewport: None,
            diagnostics: LogOnce::new(),
        }
    }

    pub fn element(&self) -> &UiElement {
        &self.element
    }

    pub fn element_mut(&mut self) -> &mut UiElement {
        &mut self.element
    }

    pub fn size(&self) -> IVec2 {
        self.element.size()
    }

    pub fn set_size(&mut self, size: IVec2) {
        self.element.set_size(size);
    }

    /// The node carrying the surface model.
    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    pub fn set_node(&mut self, node: Option<NodeId>) {
        self.node = node;
    }

    /// The viewport the surface is seen through. Resolved lazily from the
    /// node's scene when unset.
    pub fn viewport(&self) -> Option<ViewportId> {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Option<ViewportId>) {
        self.viewport = viewport;
    }

    pub fn diagnostics(&self) -> &LogOnce {
        &self.diagnostics
    }

    /// Maps a screen position (UI coordinates) to element pixels.
    pub fn try_screen_to_element(
        &mut self,
        context: &MappingContext<'_>,
        screen: IVec2,
    ) -> Result<IVec2, MappingError> {
        let world = context.world;

        let node_id = self.node.ok_or(MappingError::NodeExpired)?;
        let node = world.node(node_id).ok_or(MappingError::NodeExpired)?;
        let scene_id = node.scene().ok_or(MappingError::NotInScene)?;
        let scene = world.scene(scene_id).ok_or(MappingError::NotInScene)?;
        let model = world.static_model(node_id).ok_or(MappingError::NoModel)?;

        if self.viewport.is_none() {
            self.viewport = world.viewport_for_scene(scene_id, 0);
        }
        let viewport = self
            .viewport
            .and_then(|id| world.viewport(id))
            .ok_or(MappingError::NoViewport)?;
        let index = scene.spatial_index().ok_or(MappingError::NoSpatialIndex)?;

        if viewport.scene != Some(scene_id) {
            return Err(MappingError::SceneMismatch {
                node_scene: scene_id,
                viewport_scene: viewport.scene,
            });
        }
        let camera = viewport.camera.as_ref().ok_or(MappingError::NoCamera)?;

        let rect = if viewport.rect.is_zero() {
            IntRect::from_size(context.output_size)
        } else {
            viewport.rect
        };
        if !rect.has_area() {
            return Err(MappingError::EmptyViewport);
        }

        let system = context.scaling.ui_to_system(screen);
        let normalized = (system - rect.min()).as_vec2() / rect.size().as_vec2();
        let ray = camera.screen_ray(normalized.x, normalized.y);

        for hit in index.raycast(&RayQuery::triangle_uv(ray)) {
            if hit.drawable != model {
                if hit.kind.is_excluded_by_default() {
                    continue;
                }
                return Err(MappingError::Blocked(hit.drawable));
            }
            let pixels = (hit.uv * self.size().as_vec2()).as_ivec2();
            return Ok(context.scaling.system_to_ui(pixels));
        }
        Err(MappingError::NoHit)
    }

    fn report(&mut self, err: MappingError) {
        match err {
            MappingError::SceneMismatch { .. } => {
                self.diagnostics.error("scene-mismatch", err);
            }
            MappingError::NoHit | MappingError::Blocked(_) => {
                log::trace!("no UI mapping: {err}");
            }
            MappingError::NodeExpired => {
                self.diagnostics.warn("node-expired", err);
            }
            MappingError::NotInScene => {
                self.diagnostics.warn("not-in-scene", err);
            }
            MappingError::NoModel => {
                self.diagnostics.warn("no-model", err);
            }
            MappingError::NoSpatialIndex => {
                self.diagnostics.warn("no-spatial-index", err);
            }
            MappingError::NoViewport => {
                self.diagnostics.warn("no-viewport", err);
            }
            MappingError::NoCamera => {
                self.diagnostics.warn("no-camera", err);
            }
            MappingError::EmptyViewport => {
                self.diagnostics.warn("empty-viewport", err);
            }
            MappingError::Unsupported => {
                self.diagnostics.error("unsupported", err);
            }
        }
    }
}

impl ScreenMapping for UiElement3D {
    fn screen_to_element(&mut self, context: &MappingContext<'_>, screen: IVec2) -> IVec2 {
        match self.try_screen_to_element(context, screen) {
            Ok(position) => position,
            Err(err) => {
                self.report(err);
                NO_MAPPING
            }
        }
    }

    /// Not supported: always reports an error and returns [`NO_MAPPING`].
    fn element_to_screen(&mut self, _position: IVec2) -> IVec2 {
        self.report(MappingError::Unsupported);
        NO_MAPPING
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Mat4, Vec3};
    use umbra_core::{Camera, DrawableKind, TriangleIndex, Viewport};

    struct Fixture {
        world: World,
        node: NodeId,
        model: DrawableId,
    }

    /// A unit quad at the origin facing a camera at (0, 0, 3).
    fn fixture() -> Fixture {
        let mut world = World::new();
        let scene = world.create_scene();
        let node = world.create_node(scene, "screen").unwrap();
        let model = world
            .create_drawable(node, DrawableKind::StaticModel)
            .unwrap();
        let mut index = TriangleIndex::new();
        index.insert_quad(model, DrawableKind::StaticModel, Mat4::IDENTITY);
        world.set_spatial_index(scene, index).unwrap();
        world.add_viewport(Viewport::new(scene, Camera::new(1.0)));
        Fixture { world, node, model }
    }

    fn context(world: &World) -> MappingContext<'_> {
        MappingContext {
            world,
            scaling: UiScaling::default(),
            output_size: UVec2::new(400, 400),
        }
    }

    fn element(node: NodeId) -> UiElement3D {
        let mut element = UiElement3D::new(IVec2::splat(512));
        element.set_node(Some(node));
        element
    }

    #[test]
    fn test_center_maps_to_center() {
        let f = fixture();
        let mut root = element(f.node);
        let p = root.screen_to_element(&context(&f.world), IVec2::new(200, 200));
        assert!((p - IVec2::splat(256)).abs().max_element() <= 1, "{p}");
        assert!(root.viewport().is_some());
    }

    #[test]
    fn test_miss_returns_sentinel() {
        let f = fixture();
        let mut root = element(f.node);
        let ctx = context(&f.world);
        assert_eq!(root.screen_to_element(&ctx, IVec2::new(2, 2)), NO_MAPPING);
        assert_eq!(
            root.try_screen_to_element(&ctx, IVec2::new(2, 2)),
            Err(MappingError::NoHit)
        );
    }

    #[test]
    fn test_missing_dependencies() {
        let mut f = fixture();
        let mut detached = UiElement3D::new(IVec2::splat(64));
        let ctx = context(&f.world);
        assert_eq!(
            detached.try_screen_to_element(&ctx, IVec2::ZERO),
            Err(MappingError::NodeExpired)
        );

        f.world.remove_drawable(f.model);
        let mut root = element(f.node);
        assert_eq!(
            root.try_screen_to_element(&context(&f.world), IVec2::ZERO),
            Err(MappingError::NoModel)
        );

        f.world.remove_node(f.node);
        assert_eq!(
            root.screen_to_element(&context(&f.world), IVec2::ZERO),
            NO_MAPPING
        );
        assert!(root.diagnostics().was_reported("node-expired"));
    }

    #[test]
    fn test_viewport_rect_offset() {
        let mut f = fixture();
        let scene = f.world.node(f.node).unwrap().scene().unwrap();
        let viewport = f.world.add_viewport(
            Viewport::new(scene, Camera::new(1.0)).with_rect(IntRect::new(100, 100, 300, 300)),
        );
        let mut root = element(f.node);
        root.set_viewport(Some(viewport));
        let p = root.screen_to_element(&context(&f.world), IVec2::new(200, 200));
        assert!((p - IVec2::splat(256)).abs().max_element() <= 1, "{p}");
    }

    #[test]
    fn test_ui_scale_applies_both_ways() {
        let f = fixture();
        let mut root = element(f.node);
        let ctx = MappingContext {
            scaling: UiScaling::new(2.0),
            ..context(&f.world)
        };
        // UI (100, 100) is system (200, 200): the quad center, texel 256,
        // which is UI 128.
        let p = root.screen_to_element(&ctx, IVec2::new(100, 100));
        assert!((p - IVec2::splat(128)).abs().max_element() <= 1, "{p}");
    }

    #[test]
    fn test_excluded_kinds_do_not_block() {
        let mut f = fixture();
        let scene = f.world.node(f.node).unwrap().scene().unwrap();
        let other = f.world.create_node(scene, "fx").unwrap();
        let particles = f
            .world
            .create_drawable(other, DrawableKind::ParticleEmitter)
            .unwrap();
        let mut index = TriangleIndex::new();
        index.insert_quad(f.model, DrawableKind::StaticModel, Mat4::IDENTITY);
        index.insert_quad(
            particles,
            DrawableKind::ParticleEmitter,
            Mat4::from_translation(Vec3::new(0.0, 0.0, 1.0)),
        );
        f.world.set_spatial_index(scene, index).unwrap();

        let mut root = element(f.node);
        let p = root.screen_to_element(&context(&f.world), IVec2::new(200, 200));
        assert!((p - IVec2::splat(256)).abs().max_element() <= 1, "{p}");
    }

    #[test]
    fn test_element_to_screen_unsupported() {
        let f = fixture();
        let mut root = element(f.node);
        assert_eq!(root.element_to_screen(IVec2::new(3, 4)), NO_MAPPING);
        assert!(root.diagnostics().was_reported("unsupported"));
    }

    #[test]
    fn test_mapping_error_conversion() {
        let err: UmbraError = MappingError::SceneMismatch {
            node_scene: SceneId(1),
            viewport_scene: Some(SceneId(2)),
        }
        .into();
        assert!(matches!(err, UmbraError::CrossSceneMismatch { .. }));
        let err: UmbraError = MappingError::NoCamera.into();
        assert!(matches!(err, UmbraError::MissingDependency(_)));
    }
}
