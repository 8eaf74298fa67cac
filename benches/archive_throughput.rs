// benches/archive_throughput.rs
//
// Archives a generated tree at several zstd levels and prints a table of
// size, ratio and wall time. Run with `cargo bench --bench archive_throughput`.
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::time::{Duration, Instant};

use rand::{rngs::StdRng, Rng, RngCore, SeedableRng};
use snaptar::archive::{create_archive, ArchiveOptions, ArchiveRequest};
use snaptar::compress::CompressionSettings;
use tempfile::tempdir;

const DIRS: usize = 16;
const FILES_PER_DIR: usize = 64;

struct BenchProfile {
    name: &'static str,
    level: i32,
    long_distance: bool,
}

struct BenchResult {
    profile: &'static str,
    archive_size: u64,
    content_size: u64,
    create_time: Duration,
}

// Helper to format bytes into a readable string
fn format_bytes(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * KIB;
    if bytes >= MIB {
        format!("{:.2} MiB", bytes as f64 / MIB as f64)
    } else if bytes >= KIB {
        format!("{:.2} KiB", bytes as f64 / KIB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

/// Half text-like, half random files so the levels actually differ.
fn generate_dataset(root: &Path) -> io::Result<()> {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let words = ["backup", "archive", "tar", "zstd", "checksum", "directory", "stream", "entry"];
    for d in 0..DIRS {
        let dir = root.join(format!("dir_{d:02}"));
        fs::create_dir_all(&dir)?;
        for f in 0..FILES_PER_DIR {
            let path = dir.join(format!("file_{f:03}"));
            let size = rng.gen_range(1024..64 * 1024);
            let mut data = Vec::with_capacity(size);
            if f % 2 == 0 {
                while data.len() < size {
                    data.extend_from_slice(words[rng.gen_range(0..words.len())].as_bytes());
                    data.push(b' ');
                }
                data.truncate(size);
            } else {
                data.resize(size, 0);
                rng.fill_bytes(&mut data);
            }
            fs::write(path, data)?;
        }
    }
    Ok(())
}

fn main() -> io::Result<()> {
    println!("--- snaptar archive throughput ---");
    let source = tempdir()?;
    generate_dataset(source.path())?;

    let profiles = [
        BenchProfile { name: "L3", level: 3, long_distance: false },
        BenchProfile { name: "L9 + LDM", level: 9, long_distance: true },
        BenchProfile { name: "L19 + LDM (default)", level: 19, long_distance: true },
    ];

    let mut results = Vec::new();
    for profile in &profiles {
        print!("Benchmarking {} ... ", profile.name);
        io::stdout().flush()?;

        let target = tempdir()?;
        let options = ArchiveOptions {
            compression: CompressionSettings {
                level: profile.level,
                long_distance_matching: profile.long_distance,
                ..Default::default()
            },
            ..Default::default()
        };
        let start = Instant::now();
        let result = create_archive(&ArchiveRequest::new(source.path(), target.path()), &options)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        let create_time = start.elapsed();
        println!("done");

        results.push(BenchResult {
            profile: profile.name,
            archive_size: result.stats.archive_bytes,
            content_size: result.stats.content_bytes,
            create_time,
        });
    }

    println!("\n{:<22} | {:>12} | {:>7} | {:>9}", "Profile", "Size", "Ratio", "Time");
    println!("{}", "-".repeat(60));
    for r in &results {
        println!(
            "{:<22} | {:>12} | {:>6.2}x | {:>8.2}s",
            r.profile,
            format_bytes(r.archive_size),
            r.content_size as f64 / r.archive_size.max(1) as f64,
            r.create_time.as_secs_f64(),
        );
    }
    Ok(())
}
