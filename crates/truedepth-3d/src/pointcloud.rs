/// A single colored point in camera space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point3d {
    /// The position `(x, y, z)` in camera space.
    pub position: [f64; 3],
    /// The RGB color with channels in `[0, 1]`.
    pub color: [f64; 3],
}

/// A point cloud with points and per-point colors.
///
/// Positions and colors are stored in two contiguous arrays sharing the same index
/// order, which is the layout geometry libraries consume directly.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointCloud {
    // The points in the point cloud.
    points: Vec<[f64; 3]>,
    // The colors of the points.
    colors: Vec<[f64; 3]>,
}

impl PointCloud {
    /// Create an empty point cloud with room for `capacity` points.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
            colors: Vec::with_capacity(capacity),
        }
    }

    /// Append a point to the point cloud.
    pub fn push(&mut self, point: Point3d) {
        self.points.push(point.position);
        self.colors.push(point.color);
    }

    /// Get the number of points in the point cloud.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the point cloud is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Get as reference the points in the point cloud.
    pub fn points(&self) -> &[[f64; 3]] {
        &self.points
    }

    /// Get as reference the colors of the points in the point cloud.
    pub fn colors(&self) -> &[[f64; 3]] {
        &self.colors
    }

    /// The positions as one contiguous `[x0, y0, z0, x1, ...]` array.
    pub fn points_flat(&self) -> &[f64] {
        self.points.as_flattened()
    }

    /// The colors as one contiguous `[r0, g0, b0, r1, ...]` array.
    pub fn colors_flat(&self) -> &[f64] {
        self.colors.as_flattened()
    }

    /// Get the point at `index`.
    pub fn get(&self, index: usize) -> Option<Point3d> {
        Some(Point3d {
            position: *self.points.get(index)?,
            color: *self.colors.get(index)?,
        })
    }

    /// Iterate over the points in storage order.
    pub fn iter(&self) -> impl Iterator<Item = Point3d> + '_ {
        self.points
            .iter()
            .zip(self.colors.iter())
            .map(|(&position, &color)| Point3d { position, color })
    }

    /// Split the point cloud into its `(points, colors)` arrays.
    pub fn into_parts(self) -> (Vec<[f64; 3]>, Vec<[f64; 3]>) {
        (self.points, self.colors)
    }

    /// Get the minimum bound of the point cloud, `None` if it is empty.
    pub fn min_bound(&self) -> Option<[f64; 3]> {
        self.fold_bound(f64::min)
    }

    /// Get the maximum bound of the point cloud, `None` if it is empty.
    pub fn max_bound(&self) -> Option<[f64; 3]> {
        self.fold_bound(f64::max)
    }

    fn fold_bound(&self, f: impl Fn(f64, f64) -> f64) -> Option<[f64; 3]> {
        let first = *self.points.first()?;
        Some(self.points.iter().fold(first, |acc, p| {
            [f(acc[0], p[0]), f(acc[1], p[1]), f(acc[2], p[2])]
        }))
    }
}

impl FromIterator<Point3d> for PointCloud {
    fn from_iter<I: IntoIterator<Item = Point3d>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut pointcloud = Self::with_capacity(iter.size_hint().0);
        for point in iter {
            pointcloud.push(point);
        }
        pointcloud
    }
}
