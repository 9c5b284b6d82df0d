use crate::parallel;
use truedepth_image::{Image, ImageError, ImageSize};

/// Create a meshgrid of x and y coordinates
///
/// # Arguments
///
/// * `cols` - The number of columns indicating the width of the grid
/// * `rows` - The number of rows indicating the height of the grid
///
/// # Returns
///
/// A tuple of 2D grids of shape (rows, cols) containing the x and y coordinates.
/// Used as a map, this is the identity transformation.
pub fn meshgrid(cols: usize, rows: usize) -> Result<(Image<f32, 1>, Image<f32, 1>), ImageError> {
    meshgrid_from_fn(cols, rows, |x, y| (x as f32, y as f32))
}

/// Create a pair of grids by evaluating `f` on every pixel coordinate.
///
/// # Arguments
///
/// * `cols` - The number of columns indicating the width of the grid
/// * `rows` - The number of rows indicating the height of the grid
/// * `f` - The function receiving `(x, y)` and returning the values of both grids.
///
/// The grids are filled in row-major order in parallel by rows; `f` must be pure
/// so that the result does not depend on the scheduling.
pub fn meshgrid_from_fn(
    cols: usize,
    rows: usize,
    f: impl Fn(usize, usize) -> (f32, f32) + Send + Sync,
) -> Result<(Image<f32, 1>, Image<f32, 1>), ImageError> {
    let size = ImageSize {
        width: cols,
        height: rows,
    };

    let mut map_x = Image::from_size_val(size, 0.0)?;
    let mut map_y = Image::from_size_val(size, 0.0)?;

    parallel::par_iter_rows_grid(&mut map_x, &mut map_y, f);

    Ok((map_x, map_y))
}
