use opencv::core::{Mat, Point, Scalar};
use opencv::imgproc;

use crate::detector::FaceRegion;
use crate::predictor::LandmarkSet;
use crate::Result;

#[derive(Debug, Clone, Copy)]
pub struct RenderStyle {
    /// BGR
    pub color: Scalar,
    pub thickness: i32,
    pub draw_boxes: bool,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            color: Scalar::new(0.0, 255.0, 0.0, 0.0),
            thickness: 2,
            draw_boxes: false,
        }
    }
}

/// Draws landmarks (and face boxes if enabled) onto `frame`.
pub fn render(
    frame: &mut Mat,
    faces: &[FaceRegion],
    landmarks: &[LandmarkSet],
    style: &RenderStyle,
) -> Result<()> {
    if style.draw_boxes {
        for face in faces {
            imgproc::rectangle(
                frame,
                *face,
                style.color,
                style.thickness,
                imgproc::LINE_8,
                0,
            )?;
        }
    }

    for point in landmarks.iter().flatten() {
        let center = Point {
            x: point.x.round() as i32,
            y: point.y.round() as i32,
        };
        imgproc::circle(
            frame,
            center,
            style.thickness,
            style.color,
            imgproc::FILLED,
            imgproc::LINE_8,
            0,
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencv::core::{self, Point2f, Rect, Vec3b};
    use opencv::prelude::*;

    fn black(size: i32) -> Mat {
        Mat::new_rows_cols_with_default(size, size, core::CV_8UC3, Scalar::all(0.0)).unwrap()
    }

    fn pixel(frame: &Mat, x: i32, y: i32) -> Vec3b {
        *frame.at_2d::<Vec3b>(y, x).unwrap()
    }

    #[test]
    fn draws_landmarks_in_style_color() {
        let mut frame = black(100);
        let landmarks = vec![vec![Point2f::new(20.0, 30.0), Point2f::new(70.0, 60.0)]];

        render(
            &mut frame,
            &[Rect::new(10, 10, 80, 80)],
            &landmarks,
            &RenderStyle::default(),
        )
        .unwrap();

        for (x, y) in [(20, 30), (70, 60)] {
            let px = pixel(&frame, x, y);
            assert_eq!((px[0], px[1], px[2]), (0, 255, 0));
        }
        // boxes are off by default
        let corner = pixel(&frame, 10, 50);
        assert_eq!((corner[0], corner[1], corner[2]), (0, 0, 0));
    }

    #[test]
    fn draws_boxes_when_enabled() {
        let mut frame = black(100);
        let style = RenderStyle {
            color: Scalar::new(255.0, 0.0, 0.0, 0.0),
            draw_boxes: true,
            ..RenderStyle::default()
        };

        render(&mut frame, &[Rect::new(10, 10, 80, 80)], &[vec![]], &style).unwrap();

        let edge = pixel(&frame, 10, 50);
        assert_eq!((edge[0], edge[1], edge[2]), (255, 0, 0));
        let inside = pixel(&frame, 50, 50);
        assert_eq!((inside[0], inside[1], inside[2]), (0, 0, 0));
    }
}
