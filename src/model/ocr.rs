use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    /// Axis-aligned hull of an OCR polygon given as (x, y) points.
    pub fn from_points(points: &[(f64, f64)]) -> Option<Self> {
        let first = points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.0, first.1, first.0, first.1);

        for &(x, y) in &points[1..] {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }

        Some(Self {
            x: min_x,
            y: min_y,
            width: max_x - min_x,
            height: max_y - min_y,
        })
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct OcrLine {
    pub text: String,

    #[serde(default)]
    pub bounding_box: Option<BoundingBox>,
}

impl OcrLine {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bounding_box: None,
        }
    }

    #[cfg(test)]
    pub fn at(text: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            text: text.into(),
            bounding_box: Some(BoundingBox {
                x,
                y,
                width: 0.0,
                height: 0.0,
            }),
        }
    }
}

/// Lines recognized on one image, in reading order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExtractionResult {
    pub image_path: PathBuf,
    pub page_width: Option<f64>,
    pub lines: Vec<OcrLine>,
}

impl ExtractionResult {
    pub fn from_text_lines<I, S>(image_path: impl Into<PathBuf>, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            image_path: image_path.into(),
            page_width: None,
            lines: lines.into_iter().map(OcrLine::plain).collect(),
        }
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(|l| l.text.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounding_box_hull_of_rotated_polygon() {
        let bb = BoundingBox::from_points(&[(12.0, 5.0), (80.0, 7.0), (79.0, 20.0), (10.0, 18.0)])
            .unwrap();
        assert_eq!(bb.x, 10.0);
        assert_eq!(bb.y, 5.0);
        assert_eq!(bb.width, 70.0);
        assert_eq!(bb.height, 15.0);
    }

    #[test]
    fn empty_polygon_has_no_box() {
        assert!(BoundingBox::from_points(&[]).is_none());
    }
}
