//! Pointer mapping onto UI surfaces placed in a scene.

use std::rc::Rc;

use umbra::*;

const OUTPUT: UVec2 = UVec2::new(400, 400);

struct Stage {
    device: Rc<HeadlessDevice>,
    world: World,
    scene: SceneId,
    index: TriangleIndex,
    surfaces: SurfaceTable,
}

impl Stage {
    /// An empty scene seen by a square camera at (0, 0, 3).
    fn new() -> Self {
        let mut world = World::new();
        let scene = world.create_scene();
        world.add_viewport(Viewport::new(scene, Camera::new(1.0)));
        Self {
            device: Rc::new(HeadlessDevice::new()),
            world,
            scene,
            index: TriangleIndex::new(),
            surfaces: SurfaceTable::new(),
        }
    }

    /// Adds a unit surface quad transformed by `transform`.
    fn add_surface(&mut self, transform: Mat4) -> NodeId {
        let node = self.world.create_node(self.scene, "panel").unwrap();
        let component = UiComponent::new(self.device.clone());
        self.surfaces
            .insert(&mut self.world, node, component)
            .unwrap();
        let model = self.world.static_model(node).unwrap();
        self.index
            .insert_quad(model, DrawableKind::StaticModel, transform);
        node
    }

    /// Adds a unit quad of some other kind in front of the origin.
    fn add_occluder(&mut self, kind: DrawableKind) -> DrawableId {
        let node = self.world.create_node(self.scene, "occluder").unwrap();
        let drawable = self.world.create_drawable(node, kind).unwrap();
        self.index.insert_quad(
            drawable,
            kind,
            Mat4::from_translation(Vec3::new(0.0, 0.0, 1.0)),
        );
        drawable
    }

    fn publish_index(&mut self) {
        let index = std::mem::take(&mut self.index);
        self.world.set_spatial_index(self.scene, index).unwrap();
    }

    fn map(&mut self, node: NodeId, screen: IVec2) -> IVec2 {
        let context = mapping_context(&self.world, &UiSurfaceOptions::default(), OUTPUT);
        self.surfaces.screen_to_element(node, &context, screen)
    }
}

fn center() -> IVec2 {
    (OUTPUT / 2).as_ivec2()
}

#[test]
fn test_center_maps_to_surface_center() {
    let mut stage = Stage::new();
    let node = stage.add_surface(Mat4::IDENTITY);
    stage.publish_index();

    let p = stage.map(node, center());
    let expected = IVec2::splat(UI_SURFACE_DEFAULT_TEXTURE_SIZE as i32 / 2);
    assert!((p - expected).abs().max_element() <= 1, "{p}");
}

/// Screen position of an element pixel on a unit quad placed by `transform`.
fn element_to_screen_via_camera(transform: Mat4, element: IVec2) -> IVec2 {
    let uv = element.as_vec2() / UI_SURFACE_DEFAULT_TEXTURE_SIZE as f32;
    let local = Vec3::new(uv.x - 0.5, 0.5 - uv.y, 0.0);
    let world = transform.transform_point3(local);
    let screen = Camera::new(1.0).world_to_screen_point(world);
    (screen * OUTPUT.as_vec2()).round().as_ivec2()
}

#[test]
fn test_screen_element_round_trip() {
    let transform = Mat4::from_translation(Vec3::new(0.2, 0.1, 0.0));
    let mut stage = Stage::new();
    let node = stage.add_surface(transform);
    stage.publish_index();

    for screen in [center(), IVec2::new(230, 190), IVec2::new(170, 215)] {
        let element = stage.map(node, screen);
        assert_ne!(element, NO_MAPPING);
        let back = element_to_screen_via_camera(transform, element);
        assert!(
            (back - screen).abs().max_element() <= 1,
            "{screen} -> {element} -> {back}"
        );
    }
}

#[test]
fn test_corners_follow_texture_orientation() {
    let mut stage = Stage::new();
    let node = stage.add_surface(Mat4::IDENTITY);
    stage.publish_index();

    // The quad spans roughly 160 pixels around the center at this distance.
    let upper_left = stage.map(node, center() - IVec2::splat(40));
    let lower_right = stage.map(node, center() + IVec2::splat(40));
    assert!(upper_left.x < 256 && upper_left.y < 256, "{upper_left}");
    assert!(lower_right.x > 256 && lower_right.y > 256, "{lower_right}");
}

#[test]
fn test_miss_returns_sentinel() {
    let mut stage = Stage::new();
    let node = stage.add_surface(Mat4::IDENTITY);
    stage.publish_index();
    assert_eq!(stage.map(node, IVec2::new(3, 3)), NO_MAPPING);
}

#[test]
fn test_blocking_geometry_returns_sentinel() {
    let mut stage = Stage::new();
    let node = stage.add_surface(Mat4::IDENTITY);
    let wall = stage.add_occluder(DrawableKind::StaticModel);
    stage.publish_index();

    assert_eq!(stage.map(node, center()), NO_MAPPING);
    let context = mapping_context(&stage.world, &UiSurfaceOptions::default(), OUTPUT);
    let root = stage.surfaces.get_mut(node).unwrap().root_mut();
    assert_eq!(
        root.try_screen_to_element(&context, center()),
        Err(MappingError::Blocked(wall))
    );
}

#[test]
fn test_billboards_do_not_block() {
    let mut stage = Stage::new();
    let node = stage.add_surface(Mat4::IDENTITY);
    stage.add_occluder(DrawableKind::BillboardSet);
    stage.publish_index();

    let p = stage.map(node, center());
    assert!((p - IVec2::splat(256)).abs().max_element() <= 1, "{p}");
}

#[test]
fn test_scene_mismatch_reported_once() {
    let mut stage = Stage::new();
    let node = stage.add_surface(Mat4::IDENTITY);
    stage.publish_index();

    let other = stage.world.create_scene();
    let foreign = stage
        .world
        .add_viewport(Viewport::new(other, Camera::new(1.0)));
    stage
        .surfaces
        .get_mut(node)
        .unwrap()
        .root_mut()
        .set_viewport(Some(foreign));

    for _ in 0..5 {
        assert_eq!(stage.map(node, center()), NO_MAPPING);
    }
    let diagnostics = stage.surfaces.get(node).unwrap().root().diagnostics();
    assert!(diagnostics.was_reported("scene-mismatch"));
    assert_eq!(diagnostics.count(), 1);

    let error: UmbraError = MappingError::SceneMismatch {
        node_scene: stage.scene,
        viewport_scene: Some(other),
    }
    .into();
    assert!(matches!(error, UmbraError::CrossSceneMismatch { .. }));
}

#[test]
fn test_ui_scale_applies_both_ways() {
    let mut stage = Stage::new();
    let node = stage.add_surface(Mat4::IDENTITY);
    stage.publish_index();

    let options = UiSurfaceOptions {
        ui_scale: 2.0,
        ..UiSurfaceOptions::default()
    };
    let context = mapping_context(&stage.world, &options, OUTPUT);
    // Screen center in UI units is half the system center.
    let p = stage
        .surfaces
        .screen_to_element(node, &context, center() / 2);
    assert!((p - IVec2::splat(128)).abs().max_element() <= 1, "{p}");
}

#[test]
fn test_element_to_screen_is_unsupported() {
    let mut stage = Stage::new();
    let node = stage.add_surface(Mat4::IDENTITY);
    let surface = stage.surfaces.get_mut(node).unwrap();
    assert_eq!(surface.element_to_screen(IVec2::new(10, 10)), NO_MAPPING);
    assert!(surface.root().diagnostics().was_reported("unsupported"));
}

#[test]
fn test_removed_node_is_pruned() {
    let mut stage = Stage::new();
    let node = stage.add_surface(Mat4::IDENTITY);
    stage.publish_index();
    assert_eq!(stage.device.live_textures(), 1);

    stage.world.remove_node(node);
    assert_eq!(stage.map(node, center()), NO_MAPPING);
    assert_eq!(stage.surfaces.prune(&mut stage.world), 1);
    assert_eq!(stage.device.live_textures(), 0);
}

#[test]
fn test_registry_creates_surfaces() {
    let registry = init().unwrap();
    let device = Rc::new(HeadlessDevice::new());
    let mut context = UiFactoryContext::new(device.clone());
    let component = registry
        .create(UI_COMPONENT_TYPE, &mut context)
        .unwrap()
        .into_component()
        .unwrap();
    assert_eq!(component.texture_size(), UI_SURFACE_DEFAULT_TEXTURE_SIZE);
    assert!(registry.create("NoSuchType", &mut context).is_err());
}
