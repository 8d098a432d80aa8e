//! Statistics file output.
//!
//! Files are tab-separated with a single header line, the layout expected by
//! the Home Assistant statistics importer.

use std::fs::File;
use std::path::Path;

use csv::{Terminator, WriterBuilder};
use tracing::{debug, info};

use crate::error::Result;
use crate::series::OutputRow;

/// Writes the header and every row from `rows` to `path`, replacing the file.
///
/// Returns the number of data rows written. Stops at the first row error; the
/// partially written file is left in place.
pub fn write_series<'a, I>(path: &Path, rows: I) -> Result<usize>
where
    I: IntoIterator<Item = Result<OutputRow<'a>>>,
{
    debug!(path = %path.display(), "Writing statistics file");

    let mut writer = WriterBuilder::new()
        .delimiter(b'\t')
        .terminator(Terminator::Any(b'\n'))
        .has_headers(false)
        .from_writer(File::create(path)?);

    writer.write_record(OutputRow::HEADER)?;

    let mut count = 0;
    for row in rows {
        writer.write_record(row?.to_record())?;
        count += 1;
    }
    writer.flush()?;

    info!(path = %path.display(), rows = count, "Statistics file saved");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::series::{RawSample, extract};
    use crate::tariff::TariffMode;
    use std::env;
    use std::fs;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        env::temp_dir().join(name)
    }

    #[test]
    fn test_write_series_layout() {
        let path = temp_path("sey_output_test_layout.tsv");
        let samples = vec![
            RawSample::new("2024-06-20T01:00:00", 1.5),
            RawSample::new("2024-06-20T02:00:00", 2.0),
        ];
        let rows = extract(&samples, "sensor:sey_water_consumption", "m³", TariffMode::NoTariff, 0.0);

        assert_eq!(write_series(&path, rows).unwrap(), 2);
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "statistic_id\tunit\tstart\tsum\n\
             sensor:sey_water_consumption\tm³\t20.06.2024 00:00\t1.500\n\
             sensor:sey_water_consumption\tm³\t20.06.2024 01:00\t3.500\n"
        );

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_series_header_only() {
        let path = temp_path("sey_output_test_empty.tsv");
        let rows = extract(&[], "sensor:x", "kWh", TariffMode::NoTariff, 3.0);

        assert_eq!(write_series(&path, rows).unwrap(), 0);
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "statistic_id\tunit\tstart\tsum\n"
        );

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_series_overwrites() {
        let path = temp_path("sey_output_test_overwrite.tsv");
        fs::write(&path, "stale content\nmore\nlines\n").unwrap();

        write_series(&path, extract(&[], "sensor:x", "kWh", TariffMode::NoTariff, 0.0)).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 1);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_series_propagates_row_error() {
        let path = temp_path("sey_output_test_error.tsv");
        let samples = vec![RawSample::new("2024-06-20T01:00:00", 1.0)];
        let rows = extract(
            &samples,
            "sensor:x",
            "CHF/kWh",
            TariffMode::CostLow { unit_price: None },
            0.0,
        );

        assert!(matches!(write_series(&path, rows), Err(Error::Configuration(_))));

        let _ = fs::remove_file(&path);
    }
}
