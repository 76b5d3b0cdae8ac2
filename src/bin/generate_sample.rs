use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{NaiveDate, TimeDelta};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

/// Write synthetic vdbench-style workload logs for trying out perf-observer.
#[derive(Parser)]
#[command(name = "generate_sample", about)]
struct Args {
    /// Output directory.
    #[arg(default_value = "sample_logs")]
    out_dir: PathBuf,

    /// Number of full-length workloads.
    #[arg(long, default_value_t = 3)]
    workloads: usize,

    /// Samples per workload.
    #[arg(long, default_value_t = 600)]
    samples: usize,

    #[arg(long, default_value_t = 42)]
    seed: u64,
}

/// Zero-mean normal noise; a non-positive spread gives no noise.
fn noise(rng: &mut StdRng, std_dev: f64) -> f64 {
    Normal::new(0.0, std_dev).map_or(0.0, |normal| normal.sample(rng))
}

/// Shape of one synthetic workload.
struct Profile {
    name: String,
    iops: f64,
    xfer_kb: f64,
    read_pct: f64,
    resp_ms: f64,
}

const HEADER: [&str; 7] = [
    "timestamp",
    "Interval",
    "Rate",
    "MB/sec",
    "Resp",
    "MB_read",
    "MB_write",
];
const ZONES: [&str; 3] = ["-BST", "-UTC", "-GMT"];

fn write_workload(
    path: &Path,
    profile: &Profile,
    samples: usize,
    rng: &mut StdRng,
) -> Result<()> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
    writer.write_record(HEADER)?;

    let start = NaiveDate::from_ymd_opt(2023, 4, 18)
        .and_then(|d| d.and_hms_opt(14, 0, 0))
        .context("start time")?;
    let mut now = start;

    for i in 0..samples {
        // ~1s reporting interval with jitter, plus the odd stall
        let stall = if i % 97 == 96 { 25_000 } else { 0 };
        let step_ms = 1_000 + noise(rng, 40.0) as i64 + stall;
        now += TimeDelta::milliseconds(step_ms.max(1));

        // ramp up and down over the first and last 10%
        let edge = (samples / 10).max(1) as f64;
        let ramp = (i as f64 / edge).min((samples - i) as f64 / edge).min(1.0);

        let rate = (profile.iops * ramp + noise(rng, profile.iops * 0.04)).max(0.0);
        let mb_sec = rate * profile.xfer_kb / 1024.0;
        let resp = profile.resp_ms / ramp.max(0.2) + noise(rng, profile.resp_ms * 0.1);
        let resp = resp.max(0.01);
        let mb_read = mb_sec * profile.read_pct;
        let mb_write = mb_sec - mb_read;

        let interval = if i % 131 == 130 {
            "n/a".to_string()
        } else {
            (i + 1).to_string()
        };
        let zone = ZONES[i % ZONES.len()];
        writer.write_record([
            format!("{}{zone}", now.format("%m/%d/%Y-%H:%M:%S")),
            interval,
            format!("{rate:.1}"),
            format!("{mb_sec:.2}"),
            format!("{resp:.3}"),
            format!("{mb_read:.2}"),
            format!("{mb_write:.2}"),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut rng = StdRng::seed_from_u64(args.seed);
    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("creating {}", args.out_dir.display()))?;

    let shapes = [
        ("seq_read_1m", 1_800.0, 1024.0, 1.0, 4.0),
        ("rand_write_8k", 24_000.0, 8.0, 0.0, 0.6),
        ("mixed_70_30_64k", 9_000.0, 64.0, 0.7, 1.8),
    ];

    let mut profiles: Vec<Profile> = (0..args.workloads)
        .map(|i| {
            let (name, iops, xfer_kb, read_pct, resp_ms) = shapes[i % shapes.len()];
            let name = if i < shapes.len() {
                name.to_string()
            } else {
                format!("{name}_{i}")
            };
            Profile {
                name,
                iops,
                xfer_kb,
                read_pct,
                resp_ms,
            }
        })
        .collect();

    // too short to survive the default trim
    profiles.push(Profile {
        name: "aborted_run".into(),
        iops: 500.0,
        xfer_kb: 4.0,
        read_pct: 0.5,
        resp_ms: 2.0,
    });

    for profile in &profiles {
        let samples = if profile.name == "aborted_run" { 5 } else { args.samples };
        let path = args.out_dir.join(format!("{}.csv", profile.name));
        write_workload(&path, profile, samples, &mut rng)?;
        println!("Wrote {samples} samples to {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> Profile {
        Profile {
            name: "w".into(),
            iops: 1_000.0,
            xfer_kb: 8.0,
            read_pct: 0.5,
            resp_ms: 1.0,
        }
    }

    #[test]
    fn same_seed_writes_same_log() {
        let dir = tempfile::tempdir().unwrap();
        let (a, b) = (dir.path().join("a.csv"), dir.path().join("b.csv"));
        write_workload(&a, &profile(), 50, &mut StdRng::seed_from_u64(7)).unwrap();
        write_workload(&b, &profile(), 50, &mut StdRng::seed_from_u64(7)).unwrap();

        let text = std::fs::read_to_string(&a).unwrap();
        assert_eq!(text, std::fs::read_to_string(&b).unwrap());
        assert_eq!(text.lines().count(), 51);
        assert!(text.starts_with("timestamp,Interval,Rate,MB/sec,Resp,MB_read,MB_write\n"));
    }

    #[test]
    fn zero_spread_means_no_noise() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(noise(&mut rng, 0.0), 0.0);
        assert_eq!(noise(&mut rng, -1.0), 0.0);
    }
}
