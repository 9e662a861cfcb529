use indexmap::IndexMap;
use log::debug;

use crate::config::RenderConfig;
use crate::project::{Platform, ProjectConfig, StageKey};

/// Canonical stage name -> commands, in Build/Test/Lint/Docker/Deploy order.
/// Stages without commands are absent.
pub type StageSteps = IndexMap<String, Vec<String>>;

/// Maps a project description to the shell commands each stage should run.
pub fn synthesize_steps(project: &ProjectConfig, render: &RenderConfig) -> StageSteps {
    let platform = render.platform;
    let mut steps = StageSteps::new();

    for key in StageKey::ALL {
        let command = match key {
            StageKey::Docker if !project.dockerfile_present => None,
            StageKey::Docker => Some(
                project
                    .script(key, platform)
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("docker build -t {} .", render.docker_tag)),
            ),
            StageKey::Build => project
                .script(key, platform)
                .or_else(|| default_build_command(&project.build_tool, platform))
                .map(str::to_string),
            StageKey::Test => project
                .script(key, platform)
                .or_else(|| default_test_command(project, platform))
                .map(str::to_string),
            StageKey::Lint | StageKey::Deploy => project.script(key, platform).map(str::to_string),
        };

        if let Some(command) = command {
            steps.insert(key.stage_name().to_string(), vec![command]);
        }
    }

    debug!(
        "Synthesized commands for stages: {:?}",
        steps.keys().collect::<Vec<_>>()
    );
    steps
}

fn default_build_command(build_tool: &str, platform: Platform) -> Option<&'static str> {
    let windows = platform == Platform::Windows;
    let command = match build_tool.trim().to_lowercase().as_str() {
        "pip" => "pip install -r requirements.txt",
        "poetry" => "poetry install",
        "maven" if windows => "mvn.cmd clean install",
        "maven" => "mvn clean install",
        "gradle" if windows => "gradlew.bat build",
        "gradle" => "./gradlew build",
        "npm" => "npm install",
        "yarn" => "yarn install",
        "cargo" => "cargo build",
        "go" => "go build ./...",
        _ => return None,
    };
    Some(command)
}

fn default_test_command(project: &ProjectConfig, platform: Platform) -> Option<&'static str> {
    let frameworks: Vec<String> = project
        .test_frameworks
        .iter()
        .map(|f| f.trim().to_lowercase())
        .filter(|f| !f.is_empty() && f != "none")
        .collect();

    let by_framework = frameworks.iter().find_map(|framework| {
        let command = match framework.as_str() {
            "unittest" => "python -m unittest discover",
            "pytest" => "pytest",
            "nose2" => "nose2",
            "jest" | "mocha" => "npm test",
            "cargo-test" => "cargo test",
            "testing" | "testify" => "go test ./...",
            _ => return None,
        };
        Some(command)
    });
    if by_framework.is_some() || frameworks.is_empty() {
        return by_framework;
    }

    let windows = platform == Platform::Windows;
    let command = match project.build_tool.trim().to_lowercase().as_str() {
        "maven" if windows => "mvn.cmd test",
        "maven" => "mvn test",
        "gradle" if windows => "gradlew.bat test",
        "gradle" => "./gradlew test",
        "npm" => "npm test",
        "yarn" => "yarn test",
        "cargo" => "cargo test",
        "go" => "go test ./...",
        _ => return None,
    };
    Some(command)
}

/// Commands known for a stage as named in generated text.
///
/// Tries the exact name, then a case-insensitive match, then keyword hints so
/// that `Install dependencies` finds the build commands and `Run tests` the
/// test commands.
pub fn commands_for<'a>(steps: &'a StageSteps, stage_name: &str) -> Option<&'a [String]> {
    if let Some(commands) = steps.get(stage_name) {
        return Some(commands);
    }

    let lower = stage_name.trim().to_lowercase();
    if let Some((_, commands)) = steps.iter().find(|(name, _)| name.to_lowercase() == lower) {
        return Some(commands);
    }

    let key = if lower.contains("docker") {
        StageKey::Docker
    } else if lower.contains("deploy") {
        StageKey::Deploy
    } else if lower.contains("lint") {
        StageKey::Lint
    } else if lower.contains("test") {
        StageKey::Test
    } else if ["build", "install", "compile"].iter().any(|k| lower.contains(k)) {
        StageKey::Build
    } else {
        return None;
    };
    steps.get(key.stage_name()).map(Vec::as_slice)
}
