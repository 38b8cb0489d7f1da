use hieralign::HierarchicalAligner;
use std::time::Instant;
use tracing::{
    info,
    instrument,
};

use crate::cli::{
    AlignArgs,
    WriteTemplateArgs,
};
use crate::config::Config;
use crate::errors::CliError;
use crate::processing::{
    interrupt_token,
    load_feature_lists,
    maybe_export_dendrogram,
    run_alignment,
    write_aligned,
};

const SENTINEL_NOTE: &str = "Note: the distance sentinels (same_sample, out_of_tolerance, \
below_min_score) must all be larger than the distance tolerance, which defaults to \
mz_weight + rt_weight. When raising the weights to 10 or more, raise the sentinels too \
or set a smaller distance_tolerance.";

/// Main function for the 'align' subcommand.
#[instrument(skip(args), fields(config = %args.config.display()))]
pub fn main_align(args: AlignArgs) -> Result<(), CliError> {
    let start = Instant::now();
    let mut config: Config = serde_json::from_str(&std::fs::read_to_string(&args.config)?)?;
    config.apply_args(&args)?;
    info!("Parsed configuration: {:#?}", config);

    let output = config
        .output
        .clone()
        .ok_or_else(|| CliError::Config("No output directory provided".to_string()))?;
    std::fs::create_dir_all(&output.directory)?;

    let lists = load_feature_lists(&config.inputs)?;
    let aligner = HierarchicalAligner::new(config.parameters.clone())?;
    let result = run_alignment(&aligner, &lists, args.quiet, &interrupt_token())?;

    write_aligned(&result, &output)?;
    if aligner.parameters().export_dendrogram {
        maybe_export_dendrogram(&result, &lists, &output.directory, &output.stem);
    }

    let summary = result.summary();
    println!(
        "Aligned {} rows from {} samples into {} rows ({} in every sample) in {:?}",
        summary.input_rows,
        lists.len(),
        summary.aligned_rows,
        summary.complete_rows,
        start.elapsed()
    );
    Ok(())
}

/// Main function for the 'write-template' subcommand.
pub fn main_write_template(args: WriteTemplateArgs) -> Result<(), CliError> {
    let target_dir = args.output_path;
    std::fs::create_dir_all(&target_dir)?;

    let config_path = target_dir.join("alignment_config_template.json");
    std::fs::write(
        &config_path,
        serde_json::to_string_pretty(&Config::template())?,
    )?;
    println!("Wrote configuration template to: {}", config_path.display());
    println!("{}", SENTINEL_NOTE);
    Ok(())
}
