use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self { Point { x, y } }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Rect { x, y, width, height }
    }

    /// An empty rect means "no geometry": callers leave the corresponding
    /// properties unset.
    pub fn is_empty(&self) -> bool { self.width <= 0.0 || self.height <= 0.0 }

    pub fn origin(&self) -> Point { Point::new(self.x, self.y) }

    pub fn with_origin(&self, origin: Point) -> Rect {
        Rect { x: origin.x, y: origin.y, ..*self }
    }
}
