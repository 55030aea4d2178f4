//! Video frames, face regions and detected faces.

use serde::{Deserialize, Serialize};

use liveness_protocol::BoundingBox;

use crate::DetectError;

// ---------------------------------------------------------------------------
// VideoFrame
// ---------------------------------------------------------------------------

/// One grayscale frame sampled from the capture device.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoFrame {
    width: u32,
    height: u32,
    luma: Vec<u8>,
    timestamp_ms: u64,
}

impl VideoFrame {
    /// Wraps a row-major luma buffer.
    ///
    /// # Errors
    /// `DetectError::InvalidFrame` if the buffer length isn't
    /// `width * height` or either dimension is zero.
    pub fn new(width: u32, height: u32, luma: Vec<u8>, timestamp_ms: u64) -> Result<Self, DetectError> {
        if width == 0 || height == 0 {
            return Err(DetectError::InvalidFrame(format!("{width}x{height}")));
        }
        let expected = width as usize * height as usize;
        if luma.len() != expected {
            return Err(DetectError::InvalidFrame(format!(
                "{width}x{height} needs {expected} bytes, got {}",
                luma.len()
            )));
        }
        Ok(Self {
            width,
            height,
            luma,
            timestamp_ms,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn timestamp_ms(&self) -> u64 {
        self.timestamp_ms
    }

    pub fn luma(&self) -> &[u8] {
        &self.luma
    }

    /// Brightness at pixel `(x, y)`, or `None` outside the frame.
    pub fn luma_at(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.luma.get(y as usize * self.width as usize + x as usize).copied()
    }

    /// Average brightness over the whole frame.
    pub fn mean_luma(&self) -> f64 {
        let sum: u64 = self.luma.iter().map(|&v| u64::from(v)).sum();
        sum as f64 / self.luma.len() as f64
    }
}

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// A point in frame pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// An axis-aligned rectangle in frame pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Region {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// A region of the given size centered on `center`.
    pub fn centered(center: Point, width: f64, height: f64) -> Self {
        Self::new(center.x - width / 2.0, center.y - height / 2.0, width, height)
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn center(&self) -> Point {
        Point {
            x: self.left + self.width / 2.0,
            y: self.top + self.height / 2.0,
        }
    }

    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Intersection over union with `other`, in `0.0..=1.0`.
    pub fn iou(&self, other: &Region) -> f64 {
        let w = (self.right().min(other.right()) - self.left.max(other.left)).max(0.0);
        let h = (self.bottom().min(other.bottom()) - self.top.max(other.top)).max(0.0);
        let intersection = w * h;
        let union = self.area() + other.area() - intersection;
        if union <= 0.0 {
            0.0
        } else {
            intersection / union
        }
    }

    /// Blends toward `other`; `weight` is the share kept from `self`.
    pub fn blend(&self, other: &Region, weight: f64) -> Region {
        let mix = |a: f64, b: f64| a * weight + b * (1.0 - weight);
        Region {
            left: mix(self.left, other.left),
            top: mix(self.top, other.top),
            width: mix(self.width, other.width),
            height: mix(self.height, other.height),
        }
    }

    /// Normalizes to the frame for the wire.
    pub fn to_wire(&self, frame_width: u32, frame_height: u32) -> BoundingBox {
        let fw = f64::from(frame_width.max(1));
        let fh = f64::from(frame_height.max(1));
        BoundingBox {
            width: (self.width / fw).clamp(0.0, 1.0),
            height: (self.height / fh).clamp(0.0, 1.0),
            left: (self.left / fw).clamp(0.0, 1.0),
            top: (self.top / fh).clamp(0.0, 1.0),
        }
    }
}

// ---------------------------------------------------------------------------
// Face
// ---------------------------------------------------------------------------

/// Facial keypoints reported by backends that support them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmarks {
    pub left_eye: Point,
    pub right_eye: Point,
    pub nose: Point,
    pub mouth: Point,
}

/// One face found in one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Face {
    pub region: Region,
    pub landmarks: Option<Landmarks>,
    /// Backend confidence in `0.0..=1.0`.
    pub confidence: f64,
    pub timestamp_ms: u64,
}
