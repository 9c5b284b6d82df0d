use std::io::{BufWriter, Write};
use std::path::Path;

use crate::pointcloud::PointCloud;

/// Error types for the PLY module.
#[derive(Debug, thiserror::Error)]
pub enum PlyError {
    /// Failed to write the PLY file
    #[error("Failed to write PLY file")]
    Io(#[from] std::io::Error),
}

/// The vertex properties of every PLY file written by this module.
const VERTEX_PROPERTIES: [&str; 6] = [
    "property double x",
    "property double y",
    "property double z",
    "property uchar red",
    "property uchar green",
    "property uchar blue",
];

// colors in [0, 1] are quantized to 8 bits per channel
fn quantize_color(color: [f64; 3]) -> [u8; 3] {
    color.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8)
}

/// Write a point cloud as a binary little-endian PLY stream.
///
/// Every vertex holds its position as three `double` and its color as three `uchar`,
/// the layout read by common point cloud viewers.
///
/// # Arguments
///
/// * `writer` - The destination of the PLY stream.
/// * `pointcloud` - The point cloud to write.
pub fn write_ply_binary<W: Write>(
    writer: &mut W,
    pointcloud: &PointCloud,
) -> Result<(), PlyError> {
    writeln!(writer, "ply")?;
    writeln!(writer, "format binary_little_endian 1.0")?;
    writeln!(writer, "element vertex {}", pointcloud.len())?;
    for property in VERTEX_PROPERTIES {
        writeln!(writer, "{property}")?;
    }
    writeln!(writer, "end_header")?;

    for point in pointcloud.iter() {
        for v in point.position {
            writer.write_all(&v.to_le_bytes())?;
        }
        writer.write_all(&quantize_color(point.color))?;
    }

    writer.flush()?;
    Ok(())
}

/// Write a point cloud to a binary little-endian PLY file.
///
/// # Arguments
///
/// * `path` - The path to the PLY file, created or truncated.
/// * `pointcloud` - The point cloud to write.
pub fn write_ply_file(path: impl AsRef<Path>, pointcloud: &PointCloud) -> Result<(), PlyError> {
    let mut writer = BufWriter::new(std::fs::File::create(path)?);
    write_ply_binary(&mut writer, pointcloud)
}
