use noise::{NoiseFn, Perlin};

/// Kind of surface under a point of the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    /// White fighting area
    Mat,
    /// Dark band marking the ring edge
    Border,
    /// Anything outside the ring
    Floor,
}

/// The ring: a white disc with a dark border, textured with Perlin noise so
/// the light sensor never reads a perfectly flat value.
pub struct Ring {
    pub radius: f32,
    pub border_width: f32,
    white_raw: f32,
    black_raw: f32,
    floor_raw: f32,
    texture_amplitude: f32,
    perlin: Perlin,
}

impl Ring {
    pub fn new(
        radius: f32,
        border_width: f32,
        (white_raw, black_raw, floor_raw): (f32, f32, f32),
        texture_amplitude: f32,
        seed: u32,
    ) -> Self {
        Self {
            radius,
            border_width,
            white_raw,
            black_raw,
            floor_raw,
            texture_amplitude,
            perlin: Perlin::new(seed),
        }
    }

    pub fn surface_at(&self, x: f32, y: f32) -> Surface {
        let r = (x * x + y * y).sqrt();
        if r > self.radius {
            Surface::Floor
        } else if r > self.radius - self.border_width {
            Surface::Border
        } else {
            Surface::Mat
        }
    }

    /// Raw light reading a downward sensor would see at (x, y)
    pub fn reflectance(&self, x: f32, y: f32) -> f32 {
        let base = match self.surface_at(x, y) {
            Surface::Mat => self.white_raw,
            Surface::Border => self.black_raw,
            Surface::Floor => self.floor_raw,
        };
        let grain = self.perlin.get([x as f64 / 40.0, y as f64 / 40.0]) as f32;
        base + grain * self.texture_amplitude
    }

    /// Radius of the middle of the border band
    pub fn border_center(&self) -> f32 {
        self.radius - self.border_width / 2.0
    }
}
