use hieralign::dendrogram;
use hieralign::models::FeatureList;
use hieralign::{
    AlignmentResult,
    HierarchicalAligner,
    CancellationToken,
};
use indicatif::{
    ProgressBar,
    ProgressStyle,
};
use std::fs::File;
use std::io::{
    BufWriter,
    Write,
};
use std::path::{
    Path,
    PathBuf,
};
use std::time::Instant;
use tracing::{
    info,
    warn,
};

use crate::config::OutputConfig;
use crate::errors::CliError;

pub fn load_feature_lists(paths: &[PathBuf]) -> Result<Vec<FeatureList>, CliError> {
    let mut lists = Vec::with_capacity(paths.len());
    for path in paths {
        let st = Instant::now();
        let list = FeatureList::from_file(path)?;
        info!(
            "Loaded {} rows for sample '{}' from {} in {:?}",
            list.len(),
            list.sample.name,
            path.display(),
            st.elapsed()
        );
        lists.push(list);
    }
    Ok(lists)
}

fn progress_bar(quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let style = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] {msg:<18} [{wide_bar:.cyan/blue}] {pos}/{len} ({eta})",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar());
    ProgressBar::new(0).with_style(style)
}

/// A token that is canceled when the user hits Ctrl-C.
pub fn interrupt_token() -> CancellationToken {
    let cancel = CancellationToken::new();
    let handler_token = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || handler_token.cancel()) {
        warn!(
            "Could not install the Ctrl-C handler, the run cannot be interrupted: {}",
            e
        );
    }
    cancel
}

pub fn run_alignment(
    aligner: &HierarchicalAligner,
    lists: &[FeatureList],
    quiet: bool,
    cancel: &CancellationToken,
) -> Result<AlignmentResult, CliError> {
    let pb = progress_bar(quiet);
    let result = aligner.align(lists, &pb, cancel);
    pb.finish_and_clear();
    if cancel.is_canceled() {
        warn!("Alignment interrupted, no output is written");
    }
    Ok(result?)
}

pub fn write_aligned(result: &AlignmentResult, output: &OutputConfig) -> Result<PathBuf, CliError> {
    let path = output.directory.join(format!("{}.json", output.stem));
    let mut writer = BufWriter::new(File::create(&path)?);
    serde_json::to_writer_pretty(&mut writer, &result.aligned)?;
    writer.flush()?;
    info!(
        "Wrote {} aligned rows to {}",
        result.aligned.len(),
        path.display()
    );
    Ok(path)
}

/// Failures here are logged and do not fail the run.
pub fn maybe_export_dendrogram(
    result: &AlignmentResult,
    lists: &[FeatureList],
    directory: &Path,
    stem: &str,
) {
    match dendrogram::export(directory, stem, lists, &result.tree) {
        Ok((rows_path, linkage_path)) => info!(
            "Wrote dendrogram tables to {} and {}",
            rows_path.display(),
            linkage_path.display()
        ),
        Err(e) => warn!("Could not write the dendrogram: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hieralign::AlignmentParameters;
    use hieralign::models::{
        FeatureRow,
        Sample,
    };

    fn lists() -> Vec<FeatureList> {
        ["a", "b"]
            .iter()
            .map(|name| {
                FeatureList::new(
                    Sample::new(*name),
                    vec![FeatureRow::new(1, 250.0, 6.0).with_spectrum([(250.0, 10.0)])],
                )
            })
            .collect()
    }

    #[test]
    fn test_interrupted_run_is_an_error() {
        let aligner = HierarchicalAligner::new(AlignmentParameters::default()).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let res = run_alignment(&aligner, &lists(), true, &cancel);
        match res {
            Err(CliError::Alignment(e)) => assert!(e.is_canceled()),
            other => panic!("Expected a canceled alignment, got {:?}", other.map(|x| x.aligned.len())),
        }
    }

    #[test]
    fn test_uninterrupted_run_succeeds() {
        let aligner = HierarchicalAligner::new(AlignmentParameters::default()).unwrap();
        let result = run_alignment(&aligner, &lists(), true, &CancellationToken::new()).unwrap();
        assert_eq!(result.aligned.len(), 1);
    }
}
