use anyhow::Context;
use log::info;
use std::path::Path;
use wx_data::{dataset::write_dataset_path, prepare, SplitPolicy};
use wx_meteo::Observation;
use wx_utils::paths::ensure_parent_dir;

/// Read raw observations, build the labelled feature table and write it.
pub fn run_preprocess(input: &str, output: &str) -> anyhow::Result<()> {
    let observations = Observation::from_path(Path::new(input))
        .with_context(|| format!("reading raw observations from {input}"))?;
    let rows = prepare(observations, &SplitPolicy::default())
        .with_context(|| format!("preparing {input}"))?;

    let output = Path::new(output);
    ensure_parent_dir(output)?;
    write_dataset_path(&rows, output)
        .with_context(|| format!("writing dataset to {}", output.display()))?;

    let test = rows.iter().filter(|r| r.is_test).count();
    info!(
        "Saved processed dataset {} ({} train, {} test rows)",
        output.display(),
        rows.len() - test,
        test
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;
    use wx_data::dataset::read_dataset_path;

    #[test]
    fn test_preprocess_fills_missing_day() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("raw.csv");
        fs::write(
            &input,
            "date,tmin,tmax,tavg,precip,wind_max,location,lat,lon\n\
             2024-01-01,1.0,9.0,5.0,0.0,10.0,\"Austin,US\",30.27,-97.74\n\
             2024-01-03,3.0,11.0,7.0,0.0,12.0,\"Austin,US\",30.27,-97.74\n",
        )
        .unwrap();
        let output = dir.path().join("processed/austin.csv");

        run_preprocess(input.to_str().unwrap(), output.to_str().unwrap()).unwrap();

        let rows = read_dataset_path(&output).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].target(), Some(6.0));
        assert_eq!(rows[1].observation.location.as_deref(), Some("Austin,US"));
        assert_eq!(rows[2].tavg_lag_1, Some(6.0));
        assert!(rows.iter().all(|r| r.is_test));
    }

    #[test]
    fn test_preprocess_rejects_missing_target_column() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("raw.csv");
        fs::write(&input, "date,tmin\n2024-01-01,1.0\n").unwrap();
        let output = dir.path().join("out.csv");
        assert!(run_preprocess(input.to_str().unwrap(), output.to_str().unwrap()).is_err());
        assert!(!output.exists());
    }
}
