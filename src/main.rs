//! Minimal CLI harness for the convolutional inference engine.
//!
//! File layout, weight/image preprocessing, and softmax/top-k reporting
//! are all external-collaborator concerns (§1); this binary only honors
//! the DRAM boundary contract (§6): read a flat `f32` buffer, run the
//! network described by its own layer table, and dump the buffer back
//! out so the caller can find the result at `input_offset`.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use squeezenet_engine::compute;

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() != 5 {
        print_usage(&args[0]);
        return ExitCode::FAILURE;
    }

    let dram_path = PathBuf::from(&args[1]);
    let num_layers: u32 = match args[2].parse() {
        Ok(v) => v,
        Err(_) => {
            eprintln!("num_layers must be a non-negative integer");
            return ExitCode::FAILURE;
        }
    };
    let weights_offset: u32 = match args[3].parse() {
        Ok(v) => v,
        Err(_) => {
            eprintln!("weights_offset must be a non-negative integer");
            return ExitCode::FAILURE;
        }
    };
    let input_offset: u32 = match args[4].parse() {
        Ok(v) => v,
        Err(_) => {
            eprintln!("input_offset must be a non-negative integer");
            return ExitCode::FAILURE;
        }
    };

    let mut dram = match load_dram(&dram_path) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("error reading {}: {e}", dram_path.display());
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = compute::run(&mut dram, num_layers, weights_offset, input_offset) {
        eprintln!("engine error: {e}");
        return ExitCode::FAILURE;
    }

    if let Err(e) = write_dram(&dram_path, &dram) {
        eprintln!("error writing {}: {e}", dram_path.display());
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn print_usage(program: &str) {
    eprintln!("Usage: {program} <dram.bin> <num_layers> <weights_offset> <input_offset>");
    eprintln!();
    eprintln!("<dram.bin> is a flat little-endian f32 buffer: the layer table at offset 0,");
    eprintln!("followed by weights and input activations at the given offsets. The network's");
    eprintln!("output is written back into the same file at <input_offset>.");
}

fn load_dram(path: &PathBuf) -> std::io::Result<Vec<f32>> {
    let bytes = fs::read(path)?;
    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

fn write_dram(path: &PathBuf, dram: &[f32]) -> std::io::Result<()> {
    let bytes: Vec<u8> = dram.iter().flat_map(|v| v.to_le_bytes()).collect();
    fs::write(path, bytes)
}
