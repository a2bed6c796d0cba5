//! Registration of the UI object types.

use std::rc::Rc;

use glam::IVec2;
use umbra_core::{clamp_ui_texture_size, Result, TypeRegistry, UiSurfaceOptions};
use umbra_render::RenderDevice;

use crate::component::UiComponent;
use crate::element3d::UiElement3D;

/// Tag of [`UiComponent`].
pub const UI_COMPONENT_TYPE: &str = "UiComponent";
/// Tag of [`UiElement3D`].
pub const UI_ELEMENT_3D_TYPE: &str = "UiElement3D";

/// Everything UI factories need.
pub struct UiFactoryContext {
    pub device: Rc<dyn RenderDevice>,
    pub options: UiSurfaceOptions,
}

impl UiFactoryContext {
    pub fn new(device: Rc<dyn RenderDevice>) -> Self {
        Self {
            device,
            options: UiSurfaceOptions::default(),
        }
    }

    pub fn with_options(mut self, options: UiSurfaceOptions) -> Self {
        self.options = options;
        self
    }
}

/// An object created through the UI registry.
#[derive(Debug)]
pub enum UiObject {
    Component(UiComponent),
    Element3D(UiElement3D),
}

impl UiObject {
    pub fn into_component(self) -> Option<UiComponent> {
        match self {
            Self::Component(component) => Some(component),
            Self::Element3D(_) => None,
        }
    }

    pub fn into_element_3d(self) -> Option<UiElement3D> {
        match self {
            Self::Element3D(element) => Some(element),
            Self::Component(_) => None,
        }
    }
}

pub type UiTypeRegistry = TypeRegistry<UiFactoryContext, UiObject>;

fn create_component(context: &mut UiFactoryContext) -> Result<UiObject> {
    Ok(UiObject::Component(UiComponent::with_texture_size(
        context.device.clone(),
        context.options.texture_size,
    )))
}

fn create_element_3d(context: &mut UiFactoryContext) -> Result<UiObject> {
    let size = clamp_ui_texture_size(context.options.texture_size);
    let edge = i32::try_from(size).unwrap_or(i32::MAX);
    Ok(UiObject::Element3D(UiElement3D::new(IVec2::splat(edge))))
}

/// Registers the UI types. Fails if either tag is already taken.
pub fn register_ui_types(registry: &mut UiTypeRegistry) -> Result<()> {
    registry.register(UI_COMPONENT_TYPE, create_component)?;
    registry.register(UI_ELEMENT_3D_TYPE, create_element_3d)?;
    Ok(())
}
