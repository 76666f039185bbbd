use itertools::Itertools;
use latency_record_model::RunDescriptor;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Find every CSV result log below `dir`, in path order
pub fn discover_result_files(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file()
            && entry
                .path()
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
        {
            log::debug!("Found result file {}", entry.path().display());
            found.push(entry.into_path());
        }
    }

    Ok(found)
}

/// Keep the most recent run for each configuration fingerprint.
///
/// Runs without a start time sort before any dated run. The result is ordered by fingerprint.
pub fn latest_runs_by_config(
    runs: Vec<(RunDescriptor, PathBuf)>,
) -> Vec<(String, RunDescriptor, PathBuf)> {
    runs.into_iter()
        .into_group_map_by(|(descriptor, _)| descriptor.fingerprint())
        .into_iter()
        .filter_map(|(fingerprint, runs)| {
            runs.into_iter()
                .max_by(|(a, pa), (b, pb)| a.started_at.cmp(&b.started_at).then(pa.cmp(pb)))
                .map(|(descriptor, path)| (fingerprint, descriptor, path))
        })
        .sorted_by(|a, b| a.0.cmp(&b.0))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn run(name: &str) -> (RunDescriptor, PathBuf) {
        (
            RunDescriptor::from_name(name),
            PathBuf::from(format!("{name}.csv")),
        )
    }

    #[test]
    fn keep_latest_per_configuration() {
        let selected = latest_runs_by_config(vec![
            run("latency_20260223_154752_delay5000ms_10rounds"),
            run("latency_20260223_204618_delay5000ms_10rounds"),
            run("latency_20260222_101500_delay3000ms_10rounds"),
            run("latency_20260221_090000_delay5000ms_10rounds"),
        ]);

        let mut names = selected
            .iter()
            .map(|(_, descriptor, _)| descriptor.name.clone())
            .collect::<Vec<_>>();
        names.sort();
        assert_eq!(
            names,
            vec![
                "latency_20260222_101500_delay3000ms_10rounds",
                "latency_20260223_204618_delay5000ms_10rounds",
            ]
        );
    }

    #[test]
    fn undated_runs_lose_to_dated_runs() {
        let selected = latest_runs_by_config(vec![
            run("latency_20260223_154752_delay5000ms_10rounds"),
            (
                RunDescriptor {
                    started_at: None,
                    ..RunDescriptor::from_name("latency_20260223_154752_delay5000ms_10rounds")
                },
                PathBuf::from("copy.csv"),
            ),
        ]);

        assert_eq!(selected.len(), 1);
        assert_eq!(
            selected[0].2,
            PathBuf::from("latency_20260223_154752_delay5000ms_10rounds.csv")
        );
    }

    #[test]
    fn discover_csv_files_recursively() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        std::fs::create_dir(dir.path().join("nested"))?;
        std::fs::write(dir.path().join("b.csv"), "")?;
        std::fs::write(dir.path().join("nested").join("a.CSV"), "")?;
        std::fs::write(dir.path().join("notes.txt"), "")?;

        let found = discover_result_files(dir.path())?;
        let names = found
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect::<Vec<_>>();
        assert_eq!(
            names,
            vec![PathBuf::from("b.csv"), PathBuf::from("nested").join("a.CSV")]
        );
        Ok(())
    }
}
