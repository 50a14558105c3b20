use std::borrow::Cow;

/// Everything a lesson needs to know before it opens its window.
#[derive(Clone, Debug, PartialEq)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub title: Cow<'static, str>,
    /// requested core profile version, (major, minor)
    pub gl_version: (u8, u8),
    /// wait for vertical sync when presenting
    pub vsync: bool,
    /// rasterize polygons as outlines
    pub wireframe: bool,
}

impl WindowConfig {
    pub const DEFAULT: WindowConfig = WindowConfig {
        width: 800,
        height: 600,
        title: Cow::Borrowed("LearnOpenGL"),
        gl_version: (3, 3),
        vsync: true,
        wireframe: false,
    };

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_title(mut self, title: impl Into<Cow<'static, str>>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_vsync(mut self, vsync: bool) -> Self {
        self.vsync = vsync;
        self
    }

    pub fn with_wireframe(mut self, wireframe: bool) -> Self {
        self.wireframe = wireframe;
        self
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_lessons() {
        let config = WindowConfig::default();
        assert_eq!((config.width, config.height), (800, 600));
        assert_eq!(config.title, "LearnOpenGL");
        assert_eq!(config.gl_version, (3, 3));
        assert!(config.vsync);
        assert!(!config.wireframe);
    }

    #[test]
    fn setters_chain() {
        let config = WindowConfig::DEFAULT
            .with_size(1024, 768)
            .with_title(format!("lesson {}", 2))
            .with_vsync(false)
            .with_wireframe(true);
        assert_eq!((config.width, config.height), (1024, 768));
        assert_eq!(config.title, "lesson 2");
        assert!(!config.vsync);
        assert!(config.wireframe);
    }
}
