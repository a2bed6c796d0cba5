//! Plain UI elements and the screen-to-element mapping contract.

use glam::IVec2;

use crate::element3d::MappingContext;

/// Order in which children are visited for input and rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TraversalMode {
    BreadthFirst,
    #[default]
    DepthFirst,
}

/// A rectangular UI element positioned in screen space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiElement {
    position: IVec2,
    size: IVec2,
    enabled: bool,
    traversal_mode: TraversalMode,
}

impl Default for UiElement {
    fn default() -> Self {
        Self {
            position: IVec2::ZERO,
            size: IVec2::ZERO,
            enabled: true,
            traversal_mode: TraversalMode::default(),
        }
    }
}

impl UiElement {
    pub fn new(size: IVec2) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }

    pub fn position(&self) -> IVec2 {
        self.position
    }

    pub fn set_position(&mut self, position: IVec2) {
        self.position = position;
    }

    pub fn size(&self) -> IVec2 {
        self.size
    }

    pub fn set_size(&mut self, size: IVec2) {
        self.size = size.max(IVec2::ZERO);
    }

    pub fn width(&self) -> i32 {
        self.size.x
    }

    pub fn height(&self) -> i32 {
        self.size.y
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn traversal_mode(&self) -> TraversalMode {
        self.traversal_mode
    }

    pub fn set_traversal_mode(&mut self, mode: TraversalMode) {
        self.traversal_mode = mode;
    }

    /// Whether an element-local position lies inside the element.
    pub fn contains(&self, local: IVec2) -> bool {
        local.cmpge(IVec2::ZERO).all() && local.cmplt(self.size).all()
    }
}

/// Conversion between screen positions and element-local positions.
///
/// Both directions return `(-1, -1)` when no mapping exists.
pub trait ScreenMapping {
    fn screen_to_element(&mut self, context: &MappingContext<'_>, screen: IVec2) -> IVec2;

    fn element_to_screen(&mut self, position: IVec2) -> IVec2;
}

/// Flat elements map by translation only.
impl ScreenMapping for UiElement {
    fn screen_to_element(&mut self, _context: &MappingContext<'_>, screen: IVec2) -> IVec2 {
        screen - self.position
    }

    fn element_to_screen(&mut self, position: IVec2) -> IVec2 {
        position + self.position
    }
}
