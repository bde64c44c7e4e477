use std::path::PathBuf;

use anyhow::{Context, Result};
use bci_dataset::{BciDataset, DatasetConfig, Mode};

fn main() -> Result<()> {
    env_logger::init();

    let config = match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => DatasetConfig::from_json_file(&path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => {
            let root = std::env::current_dir().context("resolving working directory")?;
            log::info!("no config given, using defaults rooted at {}", root.display());
            DatasetConfig::with_root(root)
        }
    };

    let mut dataset = BciDataset::open(&config).context("building dataset")?;
    println!("{dataset}");

    for mode in [Mode::Train, Mode::Test] {
        dataset.set_mode(mode);
        println!("{mode} samples: {}", dataset.len());
        if dataset.is_empty() {
            continue;
        }
        let sample = dataset
            .get(0)
            .with_context(|| format!("reading first {mode} sample"))?;
        let (rows, cols) = sample.data.shape();
        println!(
            "{mode} sample 0 - label: {} (target {}), count: {}, data shape: ({rows}, {cols})",
            sample.label,
            sample.target(),
            sample.count
        );
    }

    let degraded = dataset.diagnostics();
    if degraded.total() > 0 {
        println!(
            "degraded samples: {} unresolved, {} unreadable",
            degraded.unresolved, degraded.unmaterialized
        );
    }
    Ok(())
}
