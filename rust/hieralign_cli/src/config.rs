use hieralign::AlignmentParameters;
use serde::{
    Deserialize,
    Serialize,
};
use std::path::PathBuf;

use crate::cli::AlignArgs;
use crate::errors::CliError;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Feature list files, one per sample.
    #[serde(default)]
    pub inputs: Vec<PathBuf>,
    #[serde(default)]
    pub parameters: AlignmentParameters,
    pub output: Option<OutputConfig>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OutputConfig {
    pub directory: PathBuf,
    /// File stem for the aligned list and the dendrogram tables.
    #[serde(default = "default_stem")]
    pub stem: String,
}

fn default_stem() -> String {
    "aligned".to_string()
}

impl Config {
    pub fn template() -> Self {
        Self {
            inputs: vec![
                PathBuf::from("sample_1_features.json"),
                PathBuf::from("sample_2_features.json"),
            ],
            parameters: AlignmentParameters::default(),
            output: Some(OutputConfig {
                directory: PathBuf::from("aligned_output"),
                stem: default_stem(),
            }),
        }
    }

    /// Command line values take precedence over the file.
    pub fn apply_args(&mut self, args: &AlignArgs) -> Result<(), CliError> {
        if let Some(ref inputs) = args.inputs {
            self.inputs = inputs.clone();
        }
        if let Some(ref directory) = args.output_dir {
            match self.output {
                Some(ref mut output) => output.directory = directory.clone(),
                None => {
                    self.output = Some(OutputConfig {
                        directory: directory.clone(),
                        stem: default_stem(),
                    })
                }
            }
        }
        if args.dendrogram {
            self.parameters.export_dendrogram = true;
        }

        if self.inputs.is_empty() {
            return Err(CliError::Config(
                "No inputs provided, please provide them in either the config file or with the --inputs flag".to_string(),
            ));
        }
        if self.output.is_none() {
            return Err(CliError::Config(
                "No output directory provided, please provide one in either the config file or with the --output-dir flag".to_string(),
            ));
        }
        self.parameters.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> AlignArgs {
        AlignArgs {
            config: PathBuf::from("config.json"),
            inputs: None,
            output_dir: None,
            dendrogram: false,
            quiet: true,
        }
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let text = r#"{
            "inputs": ["a.json", "b.json"],
            "parameters": {"rt_tolerance": 0.2, "linkage": "max"},
            "output": {"directory": "out"}
        }"#;
        let mut config: Config = serde_json::from_str(text).unwrap();
        config.apply_args(&args()).unwrap();
        assert_eq!(config.parameters.rt_tolerance, 0.2);
        assert_eq!(config.parameters.mz_tolerance, AlignmentParameters::default().mz_tolerance);
        assert_eq!(config.output.unwrap().stem, "aligned");
    }

    #[test]
    fn test_args_override_config() {
        let mut config = Config::template();
        let mut args = args();
        args.inputs = Some(vec![PathBuf::from("x.json")]);
        args.output_dir = Some(PathBuf::from("elsewhere"));
        args.dendrogram = true;
        config.apply_args(&args).unwrap();
        assert_eq!(config.inputs, vec![PathBuf::from("x.json")]);
        assert_eq!(config.output.unwrap().directory, PathBuf::from("elsewhere"));
        assert!(config.parameters.export_dendrogram);
    }

    #[test]
    fn test_missing_inputs_rejected() {
        let mut config: Config = serde_json::from_str(r#"{"output": {"directory": "out"}}"#).unwrap();
        assert!(matches!(config.apply_args(&args()), Err(CliError::Config(_))));
    }

    #[test]
    fn test_bad_parameters_rejected() {
        let mut config = Config::template();
        config.parameters.mz_weight = 0.0;
        config.parameters.rt_weight = 0.0;
        assert!(matches!(config.apply_args(&args()), Err(CliError::Alignment(_))));
    }

    #[test]
    fn test_template_round_trips() {
        let text = serde_json::to_string_pretty(&Config::template()).unwrap();
        let parsed: Config = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.inputs.len(), 2);
        assert_eq!(parsed.parameters, AlignmentParameters::default());
    }
}
