use rand::Rng;
use std::fs::File;
use std::io::Error;
use std::path::Path;

pub const HEADER: [&str; 4] = [
    "id",
    "familyComposition",
    "numberOfChildren",
    "familyUnitInPayForDecember",
];

/// Writes `rows` valid households with ids `h1..=hN`.
pub fn generate_csv(path: &Path, rows: usize) -> Result<(), Error> {
    let file = File::create(path)?;
    let mut wtr = csv::WriterBuilder::new().from_writer(file);
    wtr.write_record(HEADER)?;

    let mut rng = rand::thread_rng();
    for i in 1..=rows {
        let composition = if rng.gen_bool(0.5) { "single" } else { "couple" };
        let children: u32 = rng.gen_range(0..=6);
        let in_pay = rng.gen_bool(0.8);
        wtr.write_record([
            format!("h{i}"),
            composition.to_string(),
            children.to_string(),
            in_pay.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
