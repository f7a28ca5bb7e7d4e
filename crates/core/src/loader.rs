//! CSV ingestion.
//!
//! Only the shape of the file is checked here: required columns, non-empty
//! identifiers, unique country codes. Measure cells are kept as text so the
//! value policy decides what to do with blanks and junk.

use std::collections::{BTreeMap, HashSet};
use std::io::Read;
use std::path::Path;

use crate::error::LoadError;
use crate::measure::MeasureSet;
use crate::model::Record;

pub const ID_COLUMN: &str = "country_code";
pub const GROUP_COLUMN: &str = "region";

pub fn load_path(path: &Path, measures: &MeasureSet) -> Result<Vec<Record>, LoadError> {
    let file = std::fs::File::open(path)?;
    let records = read_records(file, measures)?;
    tracing::info!("loaded {} records from {}", records.len(), path.display());
    Ok(records)
}

pub fn read_records(reader: impl Read, measures: &MeasureSet) -> Result<Vec<Record>, LoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| LoadError::MissingColumn(name.to_string()))
    };
    let id_col = column(ID_COLUMN)?;
    let group_col = column(GROUP_COLUMN)?;
    let measure_cols: Vec<(String, usize)> = measures
        .names()
        .iter()
        .map(|m| column(m).map(|i| (m.clone(), i)))
        .collect::<Result<_, _>>()?;

    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::new();
    for row in rdr.records() {
        let row = row?;
        let line = row.position().map(|p| p.line()).unwrap_or(0);
        let field = |i: usize| row.get(i).unwrap_or("");

        let country_code = field(id_col);
        if country_code.is_empty() {
            return Err(LoadError::EmptyField { line, field: ID_COLUMN });
        }
        let region = field(group_col);
        if region.is_empty() {
            return Err(LoadError::EmptyField { line, field: GROUP_COLUMN });
        }
        if !seen.insert(country_code.to_string()) {
            return Err(LoadError::DuplicateId {
                line,
                country_code: country_code.to_string(),
            });
        }

        let measures: BTreeMap<String, String> = measure_cols
            .iter()
            .map(|(name, i)| (name.clone(), field(*i).to_string()))
            .collect();
        out.push(Record {
            country_code: country_code.to_string(),
            region: region.to_string(),
            measures,
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = "\
country_code,region,fertility_rate,life_expectancy,population
KEN,Sub-Saharan Africa,3.9,66.3,48461567
FRA,Europe & Central Asia,1.9,82.3,66859768
JPN,East Asia & Pacific,1.4,84.0,126529100
";

    #[test]
    fn reads_records_in_file_order() {
        let rs = read_records(SAMPLE.as_bytes(), &MeasureSet::default()).unwrap();
        assert_eq!(rs.len(), 3);
        assert_eq!(rs[0].country_code, "KEN");
        assert_eq!(rs[1].region, "Europe & Central Asia");
        assert_eq!(rs[2].raw("population"), Some("126529100"));
    }

    #[test]
    fn missing_measure_column() {
        let set = MeasureSet::new(["fertility_rate", "gdp"]);
        let err = read_records(SAMPLE.as_bytes(), &set).unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn(c) if c == "gdp"));
    }

    #[test]
    fn duplicate_code_reports_line() {
        let data = format!("{SAMPLE}KEN,Sub-Saharan Africa,1,1,1\n");
        let err = read_records(data.as_bytes(), &MeasureSet::default()).unwrap_err();
        match err {
            LoadError::DuplicateId { line, country_code } => {
                assert_eq!(line, 5);
                assert_eq!(country_code, "KEN");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn empty_region_rejected() {
        let data = "country_code,region,fertility_rate,life_expectancy,population\nKEN,,1,2,3\n";
        let err = read_records(data.as_bytes(), &MeasureSet::default()).unwrap_err();
        assert!(matches!(err, LoadError::EmptyField { field: "region", .. }));
    }

    #[test]
    fn load_from_disk() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(SAMPLE.as_bytes()).unwrap();
        let rs = load_path(f.path(), &MeasureSet::new(["population"])).unwrap();
        assert_eq!(rs.len(), 3);
        assert!(rs[0].raw("fertility_rate").is_none());
    }
}
