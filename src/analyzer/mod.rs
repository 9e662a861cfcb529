//! Repository analysis.
//!
//! Walks a checkout, recognises the project type from well-known manifest
//! files and produces the [`ProjectConfig`] the pipeline generator consumes.
//! Detection is deterministic: signatures are tried in table order and the
//! first one with a marker file present wins.

mod dependencies;
mod signatures;

use indexmap::IndexMap;
use log::{debug, info};
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use crate::config::AnalysisConfig;
use crate::error::{JenkinsfixError, Result};
use crate::project::{ProjectConfig, ScriptVariants, StageKey};
use signatures::{BuildTool, Signature, SIGNATURES};

pub struct ProjectAnalyzer<'a> {
    config: &'a AnalysisConfig,
}

/// A file found during the walk, relative to the analyzed root.
struct FoundFile {
    relative: String,
    absolute: PathBuf,
    depth: usize,
}

impl FoundFile {
    fn file_name(&self) -> &str {
        self.absolute
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }
}

impl<'a> ProjectAnalyzer<'a> {
    pub fn new(config: &'a AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn analyze(&self, root: &Path) -> Result<ProjectConfig> {
        if !root.is_dir() {
            return Err(JenkinsfixError::Analysis(format!(
                "{} is not a directory",
                root.display()
            )));
        }

        let files = self.collect_files(root);
        debug!("Found {} file(s) under {}", files.len(), root.display());

        let (signature, tool) = detect(&files).ok_or_else(|| {
            JenkinsfixError::Analysis(format!("Cannot detect project type in {}", root.display()))
        })?;
        info!(
            "Detected {} project built with {}",
            signature.project_type, tool.name
        );

        let dependencies = files
            .iter()
            .filter(|f| f.file_name() == signature.dependency_file)
            .min_by_key(|f| f.depth)
            .map(|f| dependencies::read_dependencies(&f.absolute))
            .unwrap_or_default();

        let framework = detect_framework(signature, &dependencies);
        let has_requirements = files.iter().any(|f| f.file_name() == "requirements.txt");

        Ok(ProjectConfig {
            project_type: signature.project_type.to_string(),
            build_tool: tool.name.to_string(),
            test_frameworks: vec![framework.to_string()],
            dockerfile_present: files
                .iter()
                .any(|f| f.file_name().to_lowercase().ends_with("dockerfile")),
            files: files
                .iter()
                .take(self.config.max_files)
                .map(|f| f.relative.clone())
                .collect(),
            dependencies,
            scripts: scripts(tool, framework, has_requirements),
        })
    }

    fn collect_files(&self, root: &Path) -> Vec<FoundFile> {
        WalkDir::new(root)
            .max_depth(self.config.max_depth)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !self.is_ignored(entry))
            .filter_map(|e| e.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| {
                let relative = entry
                    .path()
                    .strip_prefix(root)
                    .unwrap_or_else(|_| entry.path())
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                FoundFile {
                    relative,
                    depth: entry.depth(),
                    absolute: entry.into_path(),
                }
            })
            .collect()
    }

    fn is_ignored(&self, entry: &DirEntry) -> bool {
        entry.depth() > 0
            && entry.file_type().is_dir()
            && entry
                .file_name()
                .to_str()
                .is_some_and(|name| self.config.ignore_dirs.iter().any(|d| d == name))
    }
}

fn detect(files: &[FoundFile]) -> Option<(&'static Signature, &'static BuildTool)> {
    let present = |name: &str| files.iter().any(|f| f.file_name().eq_ignore_ascii_case(name));

    SIGNATURES.iter().find_map(|signature| {
        let marker = signature.markers.iter().find(|m| present(m.file_name))?;
        let tool_name = if marker.build_tool == "npm" && present("yarn.lock") {
            "yarn"
        } else {
            marker.build_tool
        };
        signatures::build_tool(tool_name).map(|tool| (signature, tool))
    })
}

fn detect_framework(signature: &Signature, dependencies: &[String]) -> &'static str {
    signature
        .known_frameworks
        .iter()
        .find(|framework| {
            dependencies
                .iter()
                .any(|dep| dep == *framework || dep.ends_with(&format!("/{framework}")))
        })
        .copied()
        .unwrap_or(signature.default_framework)
}

fn scripts(tool: &BuildTool, framework: &str, has_requirements: bool) -> IndexMap<String, ScriptVariants> {
    let mut scripts = IndexMap::new();

    let build = if tool.name == "pip" && !has_requirements {
        ScriptVariants::new("pip install .", "pip install .")
    } else {
        ScriptVariants::new(tool.build.0, tool.build.1)
    };
    scripts.insert(StageKey::Build.as_str().to_string(), build);

    let test = match (tool.name, framework) {
        ("pip", "unittest") => ScriptVariants::new(
            "python -m unittest discover",
            "python -m unittest discover",
        ),
        ("pip", "nose2") => ScriptVariants::new("nose2", "nose2"),
        _ => ScriptVariants::new(tool.test.0, tool.test.1),
    };
    scripts.insert(StageKey::Test.as_str().to_string(), test);

    if let Some((unix, windows)) = tool.lint {
        scripts.insert(
            StageKey::Lint.as_str().to_string(),
            ScriptVariants::new(unix, windows),
        );
    }
    scripts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::Platform;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, relative: &str, content: &str) {
        let path = dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn analyze(dir: &TempDir) -> Result<ProjectConfig> {
        let config = AnalysisConfig::default();
        ProjectAnalyzer::new(&config).analyze(dir.path())
    }

    #[test]
    fn test_python_project_with_pytest() {
        let dir = TempDir::new().unwrap();
        write(&dir, "requirements.txt", "flask>=2\npytest\n");
        write(&dir, "app.py", "print('hi')\n");
        write(&dir, "Dockerfile", "FROM python:3.11\n");

        let project = analyze(&dir).unwrap();
        assert_eq!(project.project_type, "python");
        assert_eq!(project.build_tool, "pip");
        assert_eq!(project.test_frameworks, vec!["pytest"]);
        assert!(project.dockerfile_present);
        assert_eq!(project.dependencies, vec!["flask", "pytest"]);
        assert_eq!(project.files, vec!["Dockerfile", "app.py", "requirements.txt"]);
        assert_eq!(
            project.script(StageKey::Test, Platform::Windows),
            Some("pytest --verbose")
        );
        assert_eq!(project.script(StageKey::Lint, Platform::Unix), Some("flake8 ."));
    }

    #[test]
    fn test_pyproject_only_installs_package() {
        let dir = TempDir::new().unwrap();
        write(&dir, "pyproject.toml", "[project]\nname = \"x\"\n");

        let project = analyze(&dir).unwrap();
        assert_eq!(project.test_frameworks, vec!["unittest"]);
        assert_eq!(
            project.script(StageKey::Build, Platform::Unix),
            Some("pip install .")
        );
        assert!(!project.dockerfile_present);
    }

    #[test]
    fn test_java_wins_over_later_signatures() {
        let dir = TempDir::new().unwrap();
        write(&dir, "pom.xml", "<dependencies><dependency><artifactId>testng</artifactId></dependency></dependencies>");
        write(&dir, "tools/requirements.txt", "requests\n");

        let project = analyze(&dir).unwrap();
        assert_eq!(project.project_type, "java");
        assert_eq!(project.build_tool, "maven");
        assert_eq!(project.test_frameworks, vec!["testng"]);
        assert_eq!(
            project.script(StageKey::Build, Platform::Windows),
            Some("mvn.cmd clean install")
        );
        assert!(!project.scripts.contains_key("lint"));
    }

    #[test]
    fn test_yarn_lock_selects_yarn() {
        let dir = TempDir::new().unwrap();
        write(&dir, "package.json", r#"{"dependencies": {"express": "4"}}"#);
        write(&dir, "yarn.lock", "");

        let project = analyze(&dir).unwrap();
        assert_eq!(project.project_type, "nodejs");
        assert_eq!(project.build_tool, "yarn");
        assert_eq!(project.dependencies, vec!["express"]);
    }

    #[test]
    fn test_ignored_directories_are_skipped() {
        let dir = TempDir::new().unwrap();
        write(&dir, "go.mod", "module x\n\nrequire github.com/stretchr/testify v1.8.4\n");
        write(&dir, "node_modules/left-pad/package.json", "{}");
        write(&dir, "target/Dockerfile", "FROM scratch\n");

        let project = analyze(&dir).unwrap();
        assert_eq!(project.project_type, "go");
        assert_eq!(project.test_frameworks, vec!["testify"]);
        assert!(!project.dockerfile_present);
        assert_eq!(project.files, vec!["go.mod"]);
    }

    #[test]
    fn test_file_list_is_capped() {
        let dir = TempDir::new().unwrap();
        write(&dir, "Cargo.toml", "[dependencies]\nserde = \"1\"\n");
        for i in 0..30 {
            write(&dir, &format!("src/m{i:02}.rs"), "");
        }

        let project = analyze(&dir).unwrap();
        assert_eq!(project.project_type, "rust");
        assert_eq!(project.files.len(), 20);
        assert_eq!(project.files[0], "Cargo.toml");
        assert_eq!(project.files[1], "src/m00.rs");
    }

    #[test]
    fn test_unknown_project_is_an_error() {
        let dir = TempDir::new().unwrap();
        write(&dir, "README.md", "# hello\n");
        let err = analyze(&dir).unwrap_err();
        assert!(matches!(err, JenkinsfixError::Analysis(_)));
        assert!(err.to_string().contains("Cannot detect project type"));
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let config = AnalysisConfig::default();
        let err = ProjectAnalyzer::new(&config)
            .analyze(Path::new("/definitely/not/here"))
            .unwrap_err();
        assert!(matches!(err, JenkinsfixError::Analysis(_)));
    }
}
