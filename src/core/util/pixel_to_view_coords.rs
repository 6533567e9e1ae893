use crate::core::data::position_params::PositionParams;
use crate::core::data::resolution::Resolution;

pub type Point4 = [f64; 4];

type Matrix4 = [[f64; 4]; 4];

const IDENTITY: Matrix4 = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

// Axis pairs in the same order as PositionParams::angles.
const PLANES: [(usize, usize); 6] = [(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)];

fn plane_rotation(a: usize, b: usize, angle: f64) -> Matrix4 {
    let (sin, cos) = angle.sin_cos();
    let mut m = IDENTITY;

    m[a][a] = cos;
    m[a][b] = -sin;
    m[b][a] = sin;
    m[b][b] = cos;

    m
}

fn multiply(lhs: &Matrix4, rhs: &Matrix4) -> Matrix4 {
    let mut out = [[0.0; 4]; 4];

    for (row, out_row) in out.iter_mut().enumerate() {
        for (col, cell) in out_row.iter_mut().enumerate() {
            *cell = (0..4).map(|k| lhs[row][k] * rhs[k][col]).sum();
        }
    }

    out
}

fn apply(m: &Matrix4, v: Point4) -> Point4 {
    let mut out = [0.0; 4];

    for (row, cell) in out.iter_mut().enumerate() {
        *cell = (0..4).map(|k| m[row][k] * v[k]).sum();
    }

    out
}

/// Maps pixel coordinates to points in the 4D parameter space.
///
/// The view is `size` wide along the rotated x axis, square pixels, with y
/// pointing down the image unless `y_flip` is set. Pixels are sampled at
/// their centres.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ViewBasis {
    top_left: Point4,
    delta_x: Point4,
    delta_y: Point4,
}

impl ViewBasis {
    #[must_use]
    pub fn new(position: &PositionParams, resolution: Resolution, y_flip: bool) -> Self {
        let rotation = PLANES
            .iter()
            .zip(position.angles())
            .fold(IDENTITY, |acc, (&(a, b), angle)| {
                multiply(&acc, &plane_rotation(a, b, angle))
            });

        let pixel_size = position.size() / resolution.width() as f64;
        let y_step = if y_flip { pixel_size } else { -pixel_size };

        let delta_x = apply(&rotation, [pixel_size, 0.0, 0.0, 0.0]);
        let delta_y = apply(&rotation, [0.0, y_step, 0.0, 0.0]);

        let half_width = resolution.width() as f64 / 2.0;
        let half_height = resolution.height() as f64 / 2.0;
        let centre = position.centre();

        let mut top_left = [0.0; 4];
        for axis in 0..4 {
            top_left[axis] = centre[axis] - delta_x[axis] * half_width - delta_y[axis] * half_height;
        }

        Self {
            top_left,
            delta_x,
            delta_y,
        }
    }

    #[must_use]
    pub fn point_at(&self, x: u32, y: u32) -> Point4 {
        let fx = x as f64 + 0.5;
        let fy = y as f64 + 0.5;
        let mut point = [0.0; 4];

        for (axis, value) in point.iter_mut().enumerate() {
            *value = self.top_left[axis] + self.delta_x[axis] * fx + self.delta_y[axis] * fy;
        }

        point
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::data::position_params::{N_PARAMS, XCENTER, XYANGLE};

    const EPSILON: f64 = 1e-12;

    fn assert_close(actual: Point4, expected: Point4) {
        for axis in 0..4 {
            assert!(
                (actual[axis] - expected[axis]).abs() < EPSILON,
                "axis {axis}: {actual:?} != {expected:?}"
            );
        }
    }

    #[test]
    fn test_top_left_pixel_of_default_view() {
        let basis = ViewBasis::new(
            &PositionParams::default(),
            Resolution::new(640, 480).unwrap(),
            false,
        );

        assert_close(basis.point_at(0, 0), [-2.0 + 0.003125, 1.5 - 0.003125, 0.0, 0.0]);
    }

    #[test]
    fn test_bottom_right_pixel_of_default_view() {
        let basis = ViewBasis::new(
            &PositionParams::default(),
            Resolution::new(640, 480).unwrap(),
            false,
        );

        assert_close(basis.point_at(639, 479), [2.0 - 0.003125, -1.5 + 0.003125, 0.0, 0.0]);
    }

    #[test]
    fn test_y_flip_mirrors_rows() {
        let resolution = Resolution::new(4, 4).unwrap();
        let normal = ViewBasis::new(&PositionParams::default(), resolution, false);
        let flipped = ViewBasis::new(&PositionParams::default(), resolution, true);

        let a = normal.point_at(1, 0);
        let b = flipped.point_at(1, 0);

        assert!((a[0] - b[0]).abs() < EPSILON);
        assert!((a[1] + b[1]).abs() < EPSILON);
    }

    #[test]
    fn test_centre_offsets_every_point() {
        let mut values = *PositionParams::default().as_array();
        values[XCENTER] = -0.75;
        let basis = ViewBasis::new(&PositionParams::new(values), Resolution::new(2, 2).unwrap(), false);

        assert_close(basis.point_at(0, 0), [-1.75, 1.0, 0.0, 0.0]);
        assert_close(basis.point_at(1, 1), [0.25, -1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_xy_rotation_turns_x_axis_into_y_axis() {
        let mut values = [0.0; N_PARAMS];
        values[4] = 2.0;
        values[XYANGLE] = std::f64::consts::FRAC_PI_2;
        let basis = ViewBasis::new(&PositionParams::new(values), Resolution::new(2, 2).unwrap(), false);

        // With a quarter turn, moving right in the image moves up the y axis.
        let left = basis.point_at(0, 0);
        let right = basis.point_at(1, 0);

        assert!((right[0] - left[0]).abs() < EPSILON);
        assert!((right[1] - left[1] - 1.0).abs() < EPSILON);
    }
}
