//! The UI surface component: an off-screen UI drawn onto a model in a scene.

use std::rc::Rc;

use glam::{IVec2, UVec2};
use umbra_core::{
    clamp_ui_texture_size, DrawableId, DrawableKind, Material, NodeId, Result, TextureId,
    TextureUnit, UmbraError, World, DIFFUSE_UNLIT_TECHNIQUE, UI_SURFACE_DEFAULT_TEXTURE_SIZE,
};
use umbra_render::{RenderDevice, TextureDesc, TextureSampling};

use crate::element::ScreenMapping;
use crate::element3d::{MappingContext, UiElement3D};
use crate::offscreen::OffscreenUi;

/// Render target format of UI surfaces.
pub const UI_SURFACE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// How the component got its model, for undoing on detach.
#[derive(Debug, Clone)]
enum ModelBinding {
    /// We created the model and remove it again.
    Created(DrawableId),
    /// The node already had a model; its material is restored.
    Borrowed {
        model: DrawableId,
        previous: Option<Rc<Material>>,
    },
}

impl ModelBinding {
    fn model(&self) -> DrawableId {
        match self {
            Self::Created(model) | Self::Borrowed { model, .. } => *model,
        }
    }
}

/// A UI surface living on a node.
///
/// The component owns its render target. Attaching binds the surface
/// material to the node's static model (creating one if needed); detaching
/// undoes exactly that. Dropping releases the texture but cannot touch the
/// [`World`], so call [`UiComponent::detach`] first.
pub struct UiComponent {
    device: Rc<dyn RenderDevice>,
    texture: Option<TextureId>,
    texture_size: u32,
    ui: OffscreenUi,
    material: Rc<Material>,
    node: Option<NodeId>,
    binding: Option<ModelBinding>,
    viewport_index: usize,
}

impl std::fmt::Debug for UiComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UiComponent")
            .field("texture", &self.texture)
            .field("texture_size", &self.texture_size)
            .field("node", &self.node)
            .field("viewport_index", &self.viewport_index)
            .finish_non_exhaustive()
    }
}

fn surface_material(texture: Option<TextureId>) -> Rc<Material> {
    let mut material = Material::new(DIFFUSE_UNLIT_TECHNIQUE);
    if let Some(texture) = texture {
        material.set_texture(TextureUnit::Diffuse, texture);
    }
    Rc::new(material)
}

fn create_surface_texture(device: &dyn RenderDevice, size: u32) -> Result<TextureId> {
    let desc = TextureDesc::render_target("ui surface", UVec2::splat(size), UI_SURFACE_FORMAT)
        .with_sampling(TextureSampling::BILINEAR_CLAMP);
    Ok(device.create_texture(&desc)?)
}

fn root_size(size: u32) -> IVec2 {
    IVec2::splat(i32::try_from(size).unwrap_or(i32::MAX))
}

impl UiComponent {
    /// Creates a surface with the default texture size.
    pub fn new(device: Rc<dyn RenderDevice>) -> Self {
        Self::with_texture_size(device, UI_SURFACE_DEFAULT_TEXTURE_SIZE)
    }

    /// Creates a surface; `size` is clamped to the supported range.
    ///
    /// A failed allocation is logged and leaves the surface without a
    /// texture; [`UiComponent::set_texture_size`] can retry.
    pub fn with_texture_size(device: Rc<dyn RenderDevice>, size: u32) -> Self {
        let size = clamp_ui_texture_size(size);
        let texture = match create_surface_texture(&*device, size) {
            Ok(texture) => Some(texture),
            Err(err) => {
                log::error!("failed to create UI render target: {err}");
                None
            }
        };
        Self {
            device,
            texture,
            texture_size: size,
            ui: OffscreenUi::new(root_size(size), texture),
            material: surface_material(texture),
            node: None,
            binding: None,
            viewport_index: 0,
        }
    }

    pub fn root(&self) -> &UiElement3D {
        self.ui.root()
    }

    pub fn root_mut(&mut self) -> &mut UiElement3D {
        self.ui.root_mut()
    }

    pub fn modal_root(&self) -> &UiElement3D {
        self.ui.modal_root()
    }

    pub fn offscreen_ui(&self) -> &OffscreenUi {
        &self.ui
    }

    pub fn material(&self) -> &Rc<Material> {
        &self.material
    }

    /// The render target, if its allocation succeeded.
    pub fn texture(&self) -> Option<TextureId> {
        self.texture
    }

    pub fn texture_size(&self) -> u32 {
        self.texture_size
    }

    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    pub fn viewport_index(&self) -> usize {
        self.viewport_index
    }

    /// The model the surface material is bound to while attached.
    pub fn model(&self) -> Option<DrawableId> {
        self.binding.as_ref().map(ModelBinding::model)
    }

    /// Attaches the surface to `node`, detaching from any previous node.
    pub fn attach_to_node(&mut self, world: &mut World, node: NodeId) -> Result<()> {
        if !world.contains_node(node) {
            return Err(UmbraError::NodeNotFound(node));
        }
        if self.node.is_some() {
            self.detach(world);
        }

        let binding = match world.static_model(node) {
            Some(model) => {
                let previous = world
                    .set_material(model, Some(self.material.clone()))
                    .flatten();
                ModelBinding::Borrowed { model, previous }
            }
            None => {
                let model = world.create_drawable(node, DrawableKind::StaticModel)?;
                world.set_material(model, Some(self.material.clone()));
                ModelBinding::Created(model)
            }
        };
        log::debug!("UI surface attached to {node} (model {})", binding.model());

        self.binding = Some(binding);
        self.node = Some(node);
        let viewport = world
            .node(node)
            .and_then(|n| n.scene())
            .and_then(|scene| world.viewport_for_scene(scene, self.viewport_index));
        let root = self.ui.root_mut();
        root.set_node(Some(node));
        root.set_viewport(viewport);
        Ok(())
    }

    /// Undoes [`UiComponent::attach_to_node`]. A no-op when detached.
    pub fn detach(&mut self, world: &mut World) {
        match self.binding.take() {
            Some(ModelBinding::Created(model)) => {
                world.remove_drawable(model);
            }
            Some(ModelBinding::Borrowed { model, previous }) => {
                let still_ours = world
                    .drawable(model)
                    .and_then(|d| d.material())
                    .is_some_and(|m| Rc::ptr_eq(m, &self.material));
                if still_ours {
                    world.set_material(model, previous);
                }
            }
            None => {}
        }
        self.node = None;
        let root = self.ui.root_mut();
        root.set_node(None);
        root.set_viewport(None);
    }

    /// Selects which of the scene's viewports the surface is seen through.
    ///
    /// The index is remembered; the viewport is only re-resolved when the
    /// node is in a scene.
    pub fn set_viewport_index(&mut self, world: &World, index: usize) {
        self.viewport_index = index;
        let Some(scene) = self
            .node
            .and_then(|node| world.node(node))
            .and_then(|n| n.scene())
        else {
            return;
        };
        let viewport = world.viewport_for_scene(scene, index);
        self.ui.root_mut().set_viewport(viewport);
    }

    /// Reallocates the render target at a new (clamped) size and resizes
    /// both roots. On failure the old texture is kept.
    pub fn set_texture_size(&mut self, world: &mut World, size: u32) -> Result<()> {
        let size = clamp_ui_texture_size(size);
        if size == self.texture_size && self.texture.is_some() {
            return Ok(());
        }

        let texture = create_surface_texture(&*self.device, size)?;
        if let Some(old) = self.texture.replace(texture) {
            self.device.destroy_texture(old);
        }
        self.texture_size = size;
        self.ui.set_render_target(Some(texture));
        self.ui.resize(root_size(size));

        let material = surface_material(Some(texture));
        if let Some(model) = self.model() {
            world.set_material(model, Some(material.clone()));
        }
        self.material = material;
        Ok(())
    }

    /// Maps a screen position onto the surface, `(-1, -1)` if it misses.
    pub fn screen_to_element(&mut self, context: &MappingContext<'_>, screen: IVec2) -> IVec2 {
        self.ui.root_mut().screen_to_element(context, screen)
    }

    /// Always `(-1, -1)`: surfaces cannot map back to the screen.
    pub fn element_to_screen(&mut self, position: IVec2) -> IVec2 {
        self.ui.root_mut().element_to_screen(position)
    }
}

impl Drop for UiComponent {
    fn drop(&mut self) {
        if let Some(texture) = self.texture.take() {
            self.device.destroy_texture(texture);
        }
    }
}
