//! Writes the sample datasets the built-in dashboards open:
//! `sample_data-1.csv` (people by city) and `data/vdem_subset.{csv,parquet}`
//! (democracy indices by country and year).

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

const INDICES: [&str; 5] = [
    "v2x_libdem",
    "v2x_polyarchy",
    "v2x_partipdem",
    "v2x_delibdem",
    "v2x_egaldem",
];

/// Rows of the V-Dem-shaped table, column-major.
struct Indices {
    country: Vec<String>,
    year: Vec<i64>,
    values: [Vec<f64>; 5],
}

fn generate_indices(rng: &mut SimpleRng) -> Indices {
    // (country, score in 1970, score in 2023)
    let countries = [
        ("Ghana", 0.15, 0.62),
        ("Kenya", 0.20, 0.45),
        ("Nigeria", 0.10, 0.38),
        ("Senegal", 0.25, 0.55),
        ("South Africa", 0.30, 0.65),
    ];
    let years: Vec<i64> = (1970..=2023).collect();
    let mut out = Indices {
        country: Vec::new(),
        year: Vec::new(),
        values: Default::default(),
    };

    for (name, start, end) in countries {
        for &year in &years {
            let t = (year - 1970) as f64 / (2023 - 1970) as f64;
            let trend = start + (end - start) * t;
            out.country.push(name.to_string());
            out.year.push(year);
            for (i, column) in out.values.iter_mut().enumerate() {
                // Narrower indices sit a little below the electoral one.
                let offset = if i == 1 { 0.08 } else { -0.02 * i as f64 };
                let v = (trend + offset + rng.gauss(0.0, 0.02)).clamp(0.0, 1.0);
                column.push((v * 1000.0).round() / 1000.0);
            }
        }
    }
    out
}

fn write_indices_csv(path: &Path, data: &Indices) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    let mut header = vec!["country_name", "year"];
    header.extend(INDICES);
    writer.write_record(&header)?;
    for row in 0..data.year.len() {
        let mut record = vec![data.country[row].clone(), data.year[row].to_string()];
        record.extend(data.values.iter().map(|col| col[row].to_string()));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_indices_parquet(path: &Path, data: &Indices) -> Result<()> {
    let mut fields = vec![
        Field::new("country_name", DataType::Utf8, false),
        Field::new("year", DataType::Int64, false),
    ];
    fields.extend(INDICES.iter().map(|name| Field::new(*name, DataType::Float64, false)));
    let schema = Arc::new(Schema::new(fields));

    let mut columns: Vec<arrow::array::ArrayRef> = vec![
        Arc::new(StringArray::from(
            data.country.iter().map(|s| s.as_str()).collect::<Vec<_>>(),
        )),
        Arc::new(Int64Array::from(data.year.clone())),
    ];
    columns.extend(
        data.values
            .iter()
            .map(|col| Arc::new(Float64Array::from(col.clone())) as arrow::array::ArrayRef),
    );

    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;
    let file = std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn write_people_csv(path: &Path, rng: &mut SimpleRng) -> Result<()> {
    let names = ["Ada", "Kofi", "Ama", "Chidi", "Yaa", "Tunde", "Esi", "Kwame"];
    let cities = [("Lagos", 62000.0), ("Accra", 48000.0), ("Nairobi", 55000.0)];

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    writer.write_record(["Name", "Age", "City", "Salary"])?;
    for (i, name) in names.iter().enumerate() {
        let (city, base) = cities[i % cities.len()];
        let age = 22 + (rng.next_u64() % 40);
        let salary = (base + rng.gauss(0.0, 9000.0)).round();
        writer.write_record([
            name.to_string(),
            age.to_string(),
            city.to_string(),
            salary.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);

    std::fs::create_dir_all("data").context("creating data directory")?;

    let indices = generate_indices(&mut rng);
    write_indices_csv(Path::new("data/vdem_subset.csv"), &indices)?;
    write_indices_parquet(Path::new("data/vdem_subset.parquet"), &indices)?;
    write_people_csv(Path::new("sample_data-1.csv"), &mut rng)?;

    println!(
        "Wrote {} country-years to data/vdem_subset.{{csv,parquet}} and sample_data-1.csv",
        indices.year.len()
    );
    Ok(())
}
