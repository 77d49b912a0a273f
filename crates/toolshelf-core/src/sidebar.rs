//! Mobile drawer and the collapsible sidebar search panel.

pub const DEFAULT_COLLAPSE_WIDTH: u32 = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
}

impl Viewport {
    pub fn new(width: u32) -> Self {
        Self { width }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self { width: u32::MAX }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Drawer {
    open: bool,
    collapse_width: u32,
}

impl Drawer {
    pub fn new(collapse_width: u32) -> Self {
        Self {
            open: false,
            collapse_width,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Returns whether the state changed.
    pub fn open(&mut self) -> bool {
        !std::mem::replace(&mut self.open, true)
    }

    pub fn close(&mut self) -> bool {
        std::mem::replace(&mut self.open, false)
    }

    /// Clicks anywhere except the drawer itself and its opener dismiss it.
    pub fn on_body_click(&mut self, inside_sidebar: bool, inside_opener: bool) -> bool {
        if !self.open || inside_sidebar || inside_opener {
            return false;
        }
        self.close()
    }

    /// Narrow layouts collapse the drawer once a filter or sort is picked.
    pub fn on_selection(&mut self, viewport: &Viewport) -> bool {
        if viewport.width > self.collapse_width {
            return false;
        }
        self.close()
    }
}

impl Default for Drawer {
    fn default() -> Self {
        Self::new(DEFAULT_COLLAPSE_WIDTH)
    }
}

/// Which search input last received input; its value drives the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchSource {
    #[default]
    Header,
    Sidebar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchPanel {
    visible: bool,
}

impl SearchPanel {
    pub fn new(visible: bool) -> Self {
        Self { visible }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Flips visibility and returns the new `aria-expanded` value.
    pub fn toggle(&mut self) -> bool {
        self.visible = !self.visible;
        self.visible
    }
}

impl Default for SearchPanel {
    fn default() -> Self {
        Self::new(true)
    }
}
