use crate::model::ObjectTimingStats;
use polars::prelude::*;
use std::path::Path;

fn timing_frame(rows: &[ObjectTimingStats]) -> PolarsResult<DataFrame> {
    df![
        "object_name" => rows.iter().map(|r| r.object_name.clone()).collect::<Vec<_>>(),
        "count" => rows.iter().map(|r| r.count as u64).collect::<Vec<_>>(),
        "mean_ms" => rows.iter().map(|r| r.mean).collect::<Vec<_>>(),
        "std_ms" => rows.iter().map(|r| r.std).collect::<Vec<_>>(),
        "min_ms" => rows.iter().map(|r| r.min).collect::<Vec<_>>(),
        "median_ms" => rows.iter().map(|r| r.median).collect::<Vec<_>>(),
        "p90_ms" => rows.iter().map(|r| r.p90).collect::<Vec<_>>(),
        "p99_ms" => rows.iter().map(|r| r.p99).collect::<Vec<_>>(),
        "max_ms" => rows.iter().map(|r| r.max).collect::<Vec<_>>(),
    ]
}

/// Write the per-object timing table as CSV, a missing standard deviation is an empty field
pub fn write_timing_csv(rows: &[ObjectTimingStats], path: &Path) -> anyhow::Result<()> {
    let mut frame = timing_frame(rows)?;
    let mut file = std::fs::File::create(path)?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .with_float_precision(Some(2))
        .finish(&mut frame)?;

    log::debug!("Wrote {} timing rows to {}", rows.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn timing_table_as_csv() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("timing.csv");
        let rows = vec![
            ObjectTimingStats {
                object_name: "Device".to_string(),
                count: 2,
                mean: 30.0,
                std: Some(14.142),
                min: 20.0,
                median: 30.0,
                p90: 38.0,
                p99: 39.8,
                max: 40.0,
            },
            ObjectTimingStats {
                object_name: "Thread Network".to_string(),
                count: 1,
                mean: 1000.0,
                std: None,
                min: 1000.0,
                median: 1000.0,
                p90: 1000.0,
                p99: 1000.0,
                max: 1000.0,
            },
        ];

        write_timing_csv(&rows, &path)?;

        let content = std::fs::read_to_string(&path)?;
        let lines = content.lines().collect::<Vec<_>>();
        assert_eq!(
            lines[0],
            "object_name,count,mean_ms,std_ms,min_ms,median_ms,p90_ms,p99_ms,max_ms"
        );
        assert_eq!(lines[1], "Device,2,30.00,14.14,20.00,30.00,38.00,39.80,40.00");
        assert_eq!(
            lines[2],
            "Thread Network,1,1000.00,,1000.00,1000.00,1000.00,1000.00,1000.00"
        );
        Ok(())
    }
}
