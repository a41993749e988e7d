use serde::{Deserialize, Serialize};

/// A position reading in 3D space.
///
/// Plain value type, copied freely. Equality is exact floating-point
/// equality — the tracker relies on that to suppress duplicate readings
/// reported at literally the same coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3D {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance in 3D.
    pub fn distance(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Euclidean distance ignoring the z component.
    pub fn xy_distance(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Copy of this point projected onto the z=0 plane.
    pub fn xy_flattened(self) -> Self {
        Self {
            x: self.x,
            y: self.y,
            z: 0.0,
        }
    }
}
