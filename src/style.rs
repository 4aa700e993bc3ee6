//! Appearance data shared by all widget kinds.
//!
//! Frame and background are plain data on the node plus draw logic in the
//! render pass — not a subclass axis. Fonts and textures are handles into
//! resources owned by the embedding application; the widget system never
//! loads or frees them.

use serde::{Deserialize, Serialize};

/// sRGB RGBA color.
pub type Color = [f32; 4];

/// Handle to a font owned by the host's text backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FontId(pub u32);

/// Handle to a texture owned by the host's render backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextureId(pub u32);

/// Border drawn just inside a widget's bounds. Absent frame = no border.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameStyle {
    /// Border thickness in pixels.
    pub width: i32,
    pub color: Color,
}

impl Default for FrameStyle {
    fn default() -> Self {
        Self {
            width: 1,
            color: [0.3, 0.3, 0.3, 1.0],
        }
    }
}

/// Widget background. When `image` is set it is drawn over the fill color;
/// a missing image falls back to the solid fill.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Background {
    pub color: Color,
    pub image: Option<TextureId>,
}

impl Default for Background {
    fn default() -> Self {
        Self {
            color: [0.8, 0.8, 0.8, 1.0],
            image: None,
        }
    }
}
