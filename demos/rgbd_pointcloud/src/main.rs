use argh::FromArgs;
use std::path::PathBuf;

use truedepth::{
    image::Image,
    io::{calibration::read_calibration_file, raw},
    k3d::io::ply::write_ply_file,
    PipelineConfig, RawFrame, RgbdPipeline,
};

#[derive(FromArgs)]
/// Undistort a raw RGB-D capture and back-project it into a colored point cloud
struct Args {
    /// path to the calibration JSON record
    #[argh(option, short = 'c')]
    calibration_path: PathBuf,

    /// path to the raw BGRA color buffer
    #[argh(option, short = 'i')]
    color_path: PathBuf,

    /// path to the raw little-endian float32 depth buffer
    #[argh(option, short = 'd')]
    depth_path: PathBuf,

    /// path to a JSON pipeline configuration
    #[argh(option)]
    config_path: Option<PathBuf>,

    /// frame width in pixels
    #[argh(option)]
    width: Option<usize>,

    /// frame height in pixels
    #[argh(option)]
    height: Option<usize>,

    /// exclusive lower bound of valid depth in meters
    #[argh(option)]
    min_depth: Option<f32>,

    /// exclusive upper bound of valid depth in meters
    #[argh(option)]
    max_depth: Option<f32>,

    /// output linear instead of sRGB point colors
    #[argh(switch)]
    linearize_color: bool,

    /// directory to write the map and depth envelopes to
    #[argh(option, short = 'o')]
    output_dir: Option<PathBuf>,

    /// path to write the points as a binary PLY file
    #[argh(option)]
    points_path: Option<PathBuf>,
}

fn load_config(args: &Args) -> Result<PipelineConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config_path {
        Some(path) => PipelineConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => PipelineConfig::default(),
    };

    // command line values take precedence over the file
    if let Some(width) = args.width {
        config.width = width;
    }
    if let Some(height) = args.height {
        config.height = height;
    }
    if let Some(min_depth) = args.min_depth {
        config.min_depth = min_depth;
    }
    if let Some(max_depth) = args.max_depth {
        config.max_depth = max_depth;
    }
    config.linearize_color |= args.linearize_color;

    config.validate()?;
    Ok(config)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Args = argh::from_env();
    let config = load_config(&args)?;
    let size = config.size();

    // read the calibration and build the undistortion map once
    let profile = read_calibration_file(&args.calibration_path, size)?;
    let pipeline = RgbdPipeline::new(profile, config)?;
    log::info!("intrinsics at {}: {:?}", size, pipeline.intrinsic());

    // read the raw buffers
    let bgra = raw::image_from_bgra_bytes(&std::fs::read(&args.color_path)?, size)?;
    let depth = raw::depth_from_le_bytes(&std::fs::read(&args.depth_path)?, size)?;
    let frame = RawFrame::new(bgra, depth)?;

    let undistorted = pipeline.undistort(&frame)?;
    let validated = pipeline.validate(&undistorted)?;
    let pointcloud = pipeline.backproject(&undistorted, &validated)?;

    let summary = serde_json::json!({
        "width": size.width,
        "height": size.height,
        "validPixels": validated.mask.count_valid(),
        "points": pointcloud.len(),
        "minBound": pointcloud.min_bound(),
        "maxBound": pointcloud.max_bound(),
    });
    log::info!("{summary}");

    if let Some(output_dir) = &args.output_dir {
        std::fs::create_dir_all(output_dir)?;
        std::fs::write(output_dir.join("map.b64"), pipeline.map_envelope()?)?;
        std::fs::write(
            output_dir.join("depth.b64"),
            pipeline.depth_envelope(&validated.depth)?,
        )?;

        // the mask as a raw byte buffer, e.g. to use as an alpha channel
        let mask: &Image<u8, 1> = validated.mask.as_image();
        std::fs::write(output_dir.join("mask.raw"), mask.as_slice())?;

        log::info!("wrote envelopes to {}", output_dir.display());
    }

    if let Some(points_path) = &args.points_path {
        write_ply_file(points_path, &pointcloud)?;
        log::info!("wrote {} points to {}", pointcloud.len(), points_path.display());
    }

    Ok(())
}
