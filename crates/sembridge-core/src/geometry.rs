use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in framework logical pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// A rect with no area cannot be used to place a native element.
    pub fn is_empty(&self) -> bool {
        self.w <= 0.0 || self.h <= 0.0
    }
}

/// 4x4 transform in column-major order, the layout used by the editing
/// channel and by CSS `matrix3d()`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub m: [f32; 16],
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    pub fn identity() -> Self {
        let mut m = [0.0; 16];
        m[0] = 1.0;
        m[5] = 1.0;
        m[10] = 1.0;
        m[15] = 1.0;
        Self { m }
    }

    pub fn translate(x: f32, y: f32) -> Self {
        let mut t = Self::identity();
        t.m[12] = x;
        t.m[13] = y;
        t
    }

    /// Builds a transform from a column-major slice. Anything other than
    /// exactly 16 values is rejected.
    pub fn from_column_major(values: &[f64]) -> Option<Self> {
        if values.len() != 16 {
            return None;
        }
        let mut m = [0.0f32; 16];
        for (dst, src) in m.iter_mut().zip(values) {
            *dst = *src as f32;
        }
        Some(Self { m })
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::identity()
    }

    /// True when the matrix only translates in x/y.
    pub fn is_translation_only(&self) -> bool {
        let mut probe = *self;
        probe.m[12] = 0.0;
        probe.m[13] = 0.0;
        probe.is_identity()
    }

    /// The x/y translation component.
    pub fn translation(&self) -> (f32, f32) {
        (self.m[12], self.m[13])
    }

    /// CSS `transform` value. Pure translations use `translate()`, which
    /// keeps the style readable in devtools.
    pub fn to_css(&self) -> String {
        if self.is_translation_only() {
            let (x, y) = self.translation();
            return format!("translate({x}px, {y}px)");
        }
        let parts: Vec<String> = self.m.iter().map(|v| v.to_string()).collect();
        format!("matrix3d({})", parts.join(", "))
    }
}
