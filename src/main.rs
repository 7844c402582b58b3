//! Offset geometry generator.
//!
//! Writes the ring steps used by `SpatialHash` to a geometry blob.
//!
//! Usage: `ringhash <max-distance-in-cells> <out-file>`

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use ringhash::RawGeometry;

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();
    let (max_distance, path) = match args.as_slice() {
        [distance, path] => match distance.parse::<u32>() {
            Ok(d) => (d, PathBuf::from(path)),
            Err(_) => {
                eprintln!("Invalid distance: {}", distance);
                return ExitCode::FAILURE;
            }
        },
        _ => {
            eprintln!("Usage: ringhash <max-distance-in-cells> <out-file>");
            return ExitCode::FAILURE;
        }
    };

    let geometry = match RawGeometry::generate(max_distance) {
        Ok(geometry) => geometry,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = geometry.save(&path) {
        eprintln!("{}", e);
        return ExitCode::FAILURE;
    }

    println!(
        "Wrote {} steps ({} offsets) to {}",
        geometry.step_count(),
        geometry.offset_count(),
        path.display()
    );
    for (i, step) in geometry.steps().iter().enumerate() {
        println!("  step {:>2}: {:>3} cells", i, step.len());
    }
    ExitCode::SUCCESS
}
