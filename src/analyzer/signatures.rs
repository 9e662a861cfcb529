/// Commands for one build tool, as `(unix, windows)` pairs.
#[derive(Debug, Clone, Copy)]
pub struct BuildTool {
    pub name: &'static str,
    pub build: (&'static str, &'static str),
    pub test: (&'static str, &'static str),
    pub lint: Option<(&'static str, &'static str)>,
}

/// File whose presence identifies a project type.
#[derive(Debug, Clone, Copy)]
pub struct Marker {
    pub file_name: &'static str,
    pub build_tool: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct Signature {
    pub project_type: &'static str,
    pub markers: &'static [Marker],
    /// Framework assumed when dependencies do not name one.
    pub default_framework: &'static str,
    /// Frameworks recognised by dependency name, in priority order.
    pub known_frameworks: &'static [&'static str],
    pub dependency_file: &'static str,
}

/// Detection order matters: the first signature with a marker present wins.
pub const SIGNATURES: &[Signature] = &[
    Signature {
        project_type: "java",
        markers: &[
            Marker { file_name: "pom.xml", build_tool: "maven" },
            Marker { file_name: "build.gradle", build_tool: "gradle" },
            Marker { file_name: "build.gradle.kts", build_tool: "gradle" },
        ],
        default_framework: "junit5",
        known_frameworks: &["testng", "spock"],
        dependency_file: "pom.xml",
    },
    Signature {
        project_type: "python",
        markers: &[
            Marker { file_name: "requirements.txt", build_tool: "pip" },
            Marker { file_name: "setup.py", build_tool: "pip" },
            Marker { file_name: "pyproject.toml", build_tool: "pip" },
        ],
        default_framework: "unittest",
        known_frameworks: &["pytest", "nose2"],
        dependency_file: "requirements.txt",
    },
    Signature {
        project_type: "nodejs",
        markers: &[Marker { file_name: "package.json", build_tool: "npm" }],
        default_framework: "jest",
        known_frameworks: &["jest", "mocha", "cypress"],
        dependency_file: "package.json",
    },
    Signature {
        project_type: "rust",
        markers: &[Marker { file_name: "Cargo.toml", build_tool: "cargo" }],
        default_framework: "cargo-test",
        known_frameworks: &[],
        dependency_file: "Cargo.toml",
    },
    Signature {
        project_type: "go",
        markers: &[Marker { file_name: "go.mod", build_tool: "go" }],
        default_framework: "testing",
        known_frameworks: &["testify"],
        dependency_file: "go.mod",
    },
];

pub const BUILD_TOOLS: &[BuildTool] = &[
    BuildTool {
        name: "maven",
        build: ("mvn clean install", "mvn.cmd clean install"),
        test: ("mvn test", "mvn.cmd test"),
        lint: None,
    },
    BuildTool {
        name: "gradle",
        build: ("./gradlew build", "gradlew.bat build"),
        test: ("./gradlew test", "gradlew.bat test"),
        lint: None,
    },
    BuildTool {
        name: "pip",
        build: ("pip install -r requirements.txt", "pip install -r requirements.txt"),
        test: ("pytest --verbose", "pytest --verbose"),
        lint: Some(("flake8 .", "flake8 .")),
    },
    BuildTool {
        name: "npm",
        build: ("npm install", "npm install"),
        test: ("npm test", "npm test"),
        lint: Some(("npm run lint", "npm run lint")),
    },
    BuildTool {
        name: "yarn",
        build: ("yarn install", "yarn install"),
        test: ("yarn test", "yarn test"),
        lint: Some(("yarn lint", "yarn lint")),
    },
    BuildTool {
        name: "cargo",
        build: ("cargo build --release", "cargo build --release"),
        test: ("cargo test", "cargo test"),
        lint: Some(("cargo clippy -- -D warnings", "cargo clippy -- -D warnings")),
    },
    BuildTool {
        name: "go",
        build: ("go build -o bin/app", "go build -o bin/app.exe"),
        test: ("go test ./...", "go test ./..."),
        lint: Some(("go vet ./...", "go vet ./...")),
    },
];

pub fn build_tool(name: &str) -> Option<&'static BuildTool> {
    BUILD_TOOLS.iter().find(|tool| tool.name == name)
}
