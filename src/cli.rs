use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use log::{info, warn};
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::analyzer::ProjectAnalyzer;
use crate::config::Config;
use crate::error::JenkinsfixError;
use crate::output::{self, Status};
use crate::pipeline::{generate_from_template, repair_pipeline, validate_structure};
use crate::project::ProjectConfig;
use crate::report::{RunReport, Source};

#[derive(Parser)]
#[command(name = "jenkinsfix")]
#[command(version, about = "Jenkinsfile repair and generation tool", long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    generate: GenerateArgs,

    /// Configuration file (defaults to ./jenkinsfix.toml and friends)
    #[arg(short, long, global = true, env = "JENKINSFIX_CONFIG")]
    config: Option<PathBuf>,

    /// Write debug-level logs to this file instead of stderr
    #[arg(long, global = true)]
    debug_log: Option<PathBuf>,

    #[arg(short, long, global = true, default_value_t = false)]
    pretty: bool,
}

#[derive(Args)]
struct GenerateArgs {
    /// Project description JSON
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Where to write the Jenkinsfile
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Raw model output to repair; `-` reads stdin. Without it a template is used.
    #[arg(short, long)]
    raw: Option<PathBuf>,

    /// Location of the generation model; inference itself runs elsewhere
    #[arg(long, env = "JENKINSFIX_MODEL_PATH")]
    model_path: Option<PathBuf>,

    /// Write a JSON run report
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a Jenkinsfile for structural problems
    Validate {
        file: PathBuf,

        /// Fail when any problem is found
        #[arg(long, default_value_t = false)]
        strict: bool,
    },
    /// Describe a repository as project JSON
    Analyze {
        #[arg(default_value = ".")]
        dir: PathBuf,

        #[arg(short, long)]
        output: PathBuf,
    },
}

impl Cli {
    pub fn debug_log(&self) -> Option<&Path> {
        self.debug_log.as_deref()
    }

    fn execute_generate(&self, config: &Config) -> Result<Status> {
        let args = &self.generate;
        let input = args
            .input
            .as_deref()
            .ok_or_else(|| JenkinsfixError::Config("--input is required".to_string()))?;
        let output_path = args
            .output
            .as_deref()
            .ok_or_else(|| JenkinsfixError::Config("--output is required".to_string()))?;

        if let Some(model_path) = &args.model_path {
            info!(
                "Model path {} noted; inference runs outside jenkinsfix",
                model_path.display()
            );
        }

        let project_text = std::fs::read_to_string(input)
            .with_context(|| format!("Failed to read project file: {}", input.display()))?;
        let project = ProjectConfig::from_json_str(&project_text)?;
        info!("Generating pipeline for {} project", project.display_type());

        let (outcome, source) = match &args.raw {
            Some(raw_path) => {
                let raw = read_raw(raw_path)?;
                (repair_pipeline(&raw, &project, &config.render), Source::Llm)
            }
            None => (
                generate_from_template(&project, &config.render),
                Source::Template,
            ),
        };

        std::fs::write(output_path, &outcome.pipeline)
            .with_context(|| format!("Failed to write pipeline: {}", output_path.display()))?;
        info!("Pipeline written to: {}", output_path.display());

        let report = RunReport::new(input, output_path, &project, source, &outcome);
        let report_path = args.report.as_ref().or(config.output.report.as_ref());
        if let Some(report_path) = report_path {
            report.write(report_path, self.pretty || config.output.pretty)?;
            info!("Report written to: {}", report_path.display());
        }

        if output::stderr_is_terminal() {
            output::print_run_summary(&report);
        }
        Ok(Status::success())
    }

    fn execute_validate(&self, file: &Path, strict: bool) -> Result<Status> {
        let text = std::fs::read_to_string(file)
            .with_context(|| format!("Failed to read pipeline: {}", file.display()))?;
        let diagnostics = validate_structure(&text);
        output::print_diagnostics(&diagnostics);

        if strict && !diagnostics.is_empty() {
            bail!(
                "{} structural problem(s) found in {}",
                diagnostics.len(),
                file.display()
            );
        }
        Ok(Status::with_diagnostics(diagnostics))
    }

    fn execute_analyze(&self, config: &Config, dir: &Path, output_path: &Path) -> Result<Status> {
        info!("Analyzing repository: {}", dir.display());
        let project = ProjectAnalyzer::new(&config.analysis).analyze(dir)?;

        let json = if self.pretty || config.output.pretty {
            serde_json::to_string_pretty(&project)?
        } else {
            serde_json::to_string(&project)?
        };
        std::fs::write(output_path, json)
            .with_context(|| format!("Failed to write analysis: {}", output_path.display()))?;
        info!("Project description written to: {}", output_path.display());
        Ok(Status::success())
    }

    pub fn execute(&self) -> Result<Status> {
        let config = Config::load(self.config.as_deref())?;

        match &self.command {
            None => self.execute_generate(&config),
            Some(Commands::Validate { file, strict }) => self.execute_validate(file, *strict),
            Some(Commands::Analyze { dir, output }) => self.execute_analyze(&config, dir, output),
        }
    }
}

fn read_raw(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut raw = String::new();
        std::io::stdin()
            .read_to_string(&mut raw)
            .context("Failed to read model output from stdin")?;
        return Ok(raw);
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read model output: {}", path.display()))?;
    if raw.trim().is_empty() {
        warn!("Model output in {} is empty", path.display());
    }
    Ok(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use tempfile::TempDir;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("jenkinsfix").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_generate_repairs_raw_output() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("project.json");
        let raw = dir.path().join("raw.txt");
        let out = dir.path().join("Jenkinsfile");
        let report = dir.path().join("report.json");
        std::fs::write(
            &input,
            r#"{"project": {"type": "python", "build_tool": "pip", "dockerfile_present": false}}"#,
        )
        .unwrap();
        std::fs::write(&raw, "stage('Build') { steps { bat ''pip install .'' } }").unwrap();

        let cli = parse(&[
            "--input",
            input.to_str().unwrap(),
            "--output",
            out.to_str().unwrap(),
            "--raw",
            raw.to_str().unwrap(),
            "--report",
            report.to_str().unwrap(),
            "--config",
            dir.path().join("missing.toml").to_str().unwrap(),
        ]);
        // An explicit config path that does not exist is an error.
        assert!(cli.execute().is_err());

        let cli = parse(&[
            "--input",
            input.to_str().unwrap(),
            "--output",
            out.to_str().unwrap(),
            "--raw",
            raw.to_str().unwrap(),
            "--report",
            report.to_str().unwrap(),
        ]);
        assert!(cli.execute().unwrap().is_success());

        let pipeline = std::fs::read_to_string(&out).unwrap();
        assert!(pipeline.contains("bat 'pip install .'"));
        let report: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&report).unwrap()).unwrap();
        assert_eq!(report["source"], "llm");
        assert_eq!(report["stages"], serde_json::json!(["Build"]));
    }

    #[test]
    fn test_generate_without_raw_uses_template() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("project.json");
        let out = dir.path().join("Jenkinsfile");
        std::fs::write(&input, r#"{"type": "rust", "buildTool": "cargo"}"#).unwrap();

        let cli = parse(&["-i", input.to_str().unwrap(), "-o", out.to_str().unwrap()]);
        assert!(cli.execute().unwrap().is_success());
        let pipeline = std::fs::read_to_string(&out).unwrap();
        assert!(pipeline.contains("stage('Build')"));
        assert!(pipeline.contains("bat 'cargo build'"));
    }

    #[test]
    fn test_generate_requires_input() {
        let err = parse(&["--output", "Jenkinsfile"]).execute().unwrap_err();
        assert!(err.to_string().contains("--input is required"));
    }

    #[test]
    fn test_generate_rejects_bad_project() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("project.json");
        std::fs::write(&input, r#"{"dockerfilePresent": "yes"}"#).unwrap();
        let out = dir.path().join("Jenkinsfile");

        let err = parse(&["-i", input.to_str().unwrap(), "-o", out.to_str().unwrap()])
            .execute()
            .unwrap_err();
        assert!(err.downcast_ref::<JenkinsfixError>().is_some());
        assert!(!out.exists());
    }

    #[test]
    fn test_validate_reports_and_strict_fails() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("Jenkinsfile");
        std::fs::write(&file, "pipeline { agent any stages { stage('a') { steps { } } } }").unwrap();

        let status = parse(&["validate", file.to_str().unwrap()]).execute().unwrap();
        match status {
            Status::Success { diagnostics } => assert_eq!(diagnostics.unwrap().len(), 1),
            Status::Error { .. } => panic!("validate without --strict must succeed"),
        }

        let err = parse(&["validate", file.to_str().unwrap(), "--strict"])
            .execute()
            .unwrap_err();
        assert!(err.to_string().contains("1 structural problem(s)"));
    }

    #[test]
    fn test_analyze_writes_project_json() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("go.mod"), "module x\n").unwrap();
        let out = dir.path().join("project.json");

        let cli = parse(&[
            "analyze",
            dir.path().to_str().unwrap(),
            "--output",
            out.to_str().unwrap(),
            "--pretty",
        ]);
        assert!(cli.execute().unwrap().is_success());

        let project = ProjectConfig::from_json_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(project.project_type, "go");
        assert_eq!(project.build_tool, "go");
    }

    #[test]
    fn test_subcommand_conflicts_with_generate_flags() {
        assert!(Cli::try_parse_from(["jenkinsfix", "--input", "p.json", "validate", "x"]).is_err());
    }
}
