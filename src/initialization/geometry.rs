use crate::error::{Error, Result};
use ndarray::prelude::*;
use serde::{Deserialize, Serialize};

pub type Coordinate = [f64; 3];

/// Ordered particle positions, one row per particle (in nm).
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateSet {
    positions: Array2<f64>,
}

impl CoordinateSet {
    pub fn new(positions: Array2<f64>) -> Result<Self> {
        if positions.ncols() != 3 {
            return Err(Error::ConfigurationMismatch(format!(
                "coordinates need 3 components per particle, got {}",
                positions.ncols()
            )));
        }
        Ok(CoordinateSet { positions })
    }

    pub fn len(&self) -> usize {
        self.positions.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn view(&self) -> ArrayView2<f64> {
        self.positions.view()
    }

    pub fn coordinate(&self, index: usize) -> Coordinate {
        let row = self.positions.row(index);
        [row[0], row[1], row[2]]
    }

    pub fn iter(&self) -> impl Iterator<Item = Coordinate> + '_ {
        self.positions.outer_iter().map(|row| [row[0], row[1], row[2]])
    }

    pub fn into_inner(self) -> Array2<f64> {
        self.positions
    }
}

impl From<Vec<Coordinate>> for CoordinateSet {
    fn from(coordinates: Vec<Coordinate>) -> Self {
        CoordinateSet {
            positions: Array2::from(coordinates),
        }
    }
}

/// Axis-aligned bounds of a coordinate set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Coordinate,
    pub max: Coordinate,
}

impl BoundingBox {
    fn seeded(c: Coordinate) -> Self {
        BoundingBox { min: c, max: c }
    }

    fn extend(mut self, c: Coordinate) -> Self {
        for axis in 0..3 {
            self.min[axis] = self.min[axis].min(c[axis]);
            self.max[axis] = self.max[axis].max(c[axis]);
        }
        self
    }

    pub fn cell_dimensions(&self) -> CellDimensions {
        CellDimensions([
            self.max[0] - self.min[0],
            self.max[1] - self.min[1],
            self.max[2] - self.min[2],
        ])
    }
}

/// Edge lengths of an orthorhombic periodic cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellDimensions(pub [f64; 3]);

impl CellDimensions {
    pub fn lengths(&self) -> [f64; 3] {
        self.0
    }

    pub fn volume(&self) -> f64 {
        self.0.iter().product()
    }

    pub fn is_degenerate(&self) -> bool {
        self.volume() == 0.0
    }

    pub fn scaled(&self, factor: f64) -> CellDimensions {
        CellDimensions([self.0[0] * factor, self.0[1] * factor, self.0[2] * factor])
    }
}

/// Reduce a coordinate set to its bounding box in one pass, seeded with the
/// first coordinate.
pub fn bounding_box(coordinates: &CoordinateSet) -> Result<BoundingBox> {
    let mut points = coordinates.iter();
    let first: Coordinate = points.next().ok_or(Error::DegenerateInput)?;
    Ok(points.fold(BoundingBox::seeded(first), BoundingBox::extend))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn single_point_gives_zero_volume_box() {
        let coords: CoordinateSet = CoordinateSet::from(vec![[1.0, 2.0, 3.0]]);
        let bbox: BoundingBox = bounding_box(&coords).unwrap();
        assert_eq!(bbox.min, [1.0, 2.0, 3.0]);
        assert_eq!(bbox.max, [1.0, 2.0, 3.0]);
        assert_eq!(bbox.cell_dimensions(), CellDimensions([0.0, 0.0, 0.0]));
        assert!(bbox.cell_dimensions().is_degenerate());
    }

    #[test]
    fn three_points() {
        let coords: CoordinateSet = CoordinateSet::new(array![
            [0.0, 0.0, 0.0],
            [5.0, 1.0, 2.0],
            [-1.0, 8.0, 2.0]
        ])
        .unwrap();
        let bbox: BoundingBox = bounding_box(&coords).unwrap();
        assert_eq!(bbox.min, [-1.0, 0.0, 0.0]);
        assert_eq!(bbox.max, [5.0, 8.0, 2.0]);
        let cell: CellDimensions = bbox.cell_dimensions();
        assert_eq!(cell.lengths(), [6.0, 8.0, 2.0]);
        assert_relative_eq!(cell.volume(), 96.0);
    }

    #[test]
    fn empty_set_is_rejected() {
        let coords: CoordinateSet = CoordinateSet::new(Array2::zeros((0, 3))).unwrap();
        match bounding_box(&coords) {
            Err(Error::DegenerateInput) => {}
            other => panic!("expected DegenerateInput, got {:?}", other),
        }
    }

    #[test]
    fn box_is_tight() {
        let points: Vec<Coordinate> = (0..200)
            .map(|i| {
                let t: f64 = i as f64;
                [
                    (t * 0.37).sin() * 4.0,
                    (t * 1.13).cos() * 2.5 - 1.0,
                    (t * 0.071).sin() * (t * 0.3).cos() * 7.0,
                ]
            })
            .collect();
        let coords: CoordinateSet = CoordinateSet::from(points.clone());
        let bbox: BoundingBox = bounding_box(&coords).unwrap();
        for axis in 0..3 {
            assert!(bbox.min[axis] <= bbox.max[axis]);
            assert!(points.iter().any(|p| p[axis] == bbox.min[axis]));
            assert!(points.iter().any(|p| p[axis] == bbox.max[axis]));
            assert!(points
                .iter()
                .all(|p| p[axis] >= bbox.min[axis] && p[axis] <= bbox.max[axis]));
        }
    }

    #[test]
    fn wrong_column_count_is_rejected() {
        assert!(CoordinateSet::new(Array2::zeros((4, 2))).is_err());
    }
}
