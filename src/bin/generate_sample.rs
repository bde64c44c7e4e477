use std::path::PathBuf;

use anyhow::{Context, Result};
use bci_dataset::config::{DATA_FILE_NAME, LABEL_FILE_NAME};
use bci_dataset::data::filter::{BEGIN_COLUMN, COUNT_COLUMN, END_COLUMN, RESULT_COLUMN};
use bci_dataset::data::loader::write_table;
use bci_dataset::data::model::{Column, Table};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

/// Logistic growth curve of a positive culture, flat baseline otherwise.
fn reading(t: usize, len: usize, positive: bool, noise: &Normal<f64>, rng: &mut StdRng) -> f64 {
    let baseline = 1.0;
    let signal = if positive {
        let midpoint = len as f64 * 0.6;
        2.5 / (1.0 + (-(t as f64 - midpoint) / 25.0).exp())
    } else {
        0.0
    };
    baseline + signal + noise.sample(rng)
}

fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let out_dir = PathBuf::from(args.next().unwrap_or_else(|| "processed_data".into()));
    let n_samples: usize = match args.next() {
        Some(n) => n.parse().with_context(|| format!("sample count '{n}'"))?,
        None => 200,
    };
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let mut rng = StdRng::seed_from_u64(42);
    let noise = Normal::new(0.0, 0.02).context("building sensor noise distribution")?;

    let mut values: Vec<f64> = Vec::new();
    let mut results = Vec::with_capacity(n_samples);
    let mut counts = Vec::with_capacity(n_samples);
    let mut begins = Vec::with_capacity(n_samples);
    let mut ends = Vec::with_capacity(n_samples);

    for _ in 0..n_samples {
        // A few rows carry codes the dataset must drop.
        let code: i64 = match rng.gen_range(0..100) {
            0..=2 => 1,
            3..=4 => 4,
            5..=34 => 3,
            _ => 2,
        };
        // Positives run longer; that is the shortcut truncation removes.
        let len = if code == 3 {
            rng.gen_range(150..1500)
        } else {
            rng.gen_range(60..400)
        };

        let begin = values.len();
        values.extend((0..len).map(|t| reading(t, len, code == 3, &noise, &mut rng)));

        results.push(code);
        counts.push(len as i64);
        begins.push(begin as i64);
        // Inclusive end, as the upstream export writes it.
        ends.push((begin + len - 1) as i64);
    }

    let data = Table::new(vec![Column::float("Value", values)]);
    let labels = Table::new(vec![
        Column::int(RESULT_COLUMN, results),
        Column::int(COUNT_COLUMN, counts),
        Column::int(BEGIN_COLUMN, begins),
        Column::int(END_COLUMN, ends),
    ]);

    let data_path = out_dir.join(DATA_FILE_NAME);
    let label_path = out_dir.join(LABEL_FILE_NAME);
    write_table(&data_path, &data).context("writing measurement table")?;
    write_table(&label_path, &labels).context("writing label table")?;

    println!(
        "Wrote {n_samples} samples ({} measurement rows) to {} and {}",
        data.num_rows()?,
        data_path.display(),
        label_path.display()
    );
    Ok(())
}
