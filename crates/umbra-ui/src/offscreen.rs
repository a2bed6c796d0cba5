//! A UI tree rendered into a texture instead of the main output.

use glam::IVec2;
use umbra_core::TextureId;

use crate::element3d::UiElement3D;

/// Root, modal root and render target of an off-screen UI.
#[derive(Debug, Clone)]
pub struct OffscreenUi {
    root: UiElement3D,
    modal_root: UiElement3D,
    render_target: Option<TextureId>,
}

impl OffscreenUi {
    /// Creates both roots at `size` pixels.
    pub fn new(size: IVec2, render_target: Option<TextureId>) -> Self {
        Self {
            root: UiElement3D::new(size),
            modal_root: UiElement3D::new(size),
            render_target,
        }
    }

    pub fn root(&self) -> &UiElement3D {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut UiElement3D {
        &mut self.root
    }

    pub fn modal_root(&self) -> &UiElement3D {
        &self.modal_root
    }

    pub fn modal_root_mut(&mut self) -> &mut UiElement3D {
        &mut self.modal_root
    }

    pub fn render_target(&self) -> Option<TextureId> {
        self.render_target
    }

    pub fn set_render_target(&mut self, target: Option<TextureId>) {
        self.render_target = target;
    }

    /// Resizes both roots.
    pub fn resize(&mut self, size: IVec2) {
        self.root.set_size(size);
        self.modal_root.set_size(size);
    }
}
