use log::debug;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

/// Reads dependency names from a manifest. Unreadable or malformed manifests
/// yield no dependencies.
pub fn read_dependencies(path: &Path) -> Vec<String> {
    let Ok(text) = std::fs::read_to_string(path) else {
        debug!("Could not read dependency file {}", path.display());
        return Vec::new();
    };
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    parse_dependencies(file_name, &text)
}

pub fn parse_dependencies(file_name: &str, text: &str) -> Vec<String> {
    match file_name {
        "requirements.txt" => requirements(text),
        "package.json" => package_json(text),
        "Cargo.toml" => cargo_toml(text),
        "go.mod" => go_mod(text),
        "pom.xml" => pom_xml(text),
        _ => Vec::new(),
    }
}

fn requirements(text: &str) -> Vec<String> {
    static NAME: OnceLock<Regex> = OnceLock::new();
    let name = NAME.get_or_init(|| Regex::new(r"^([A-Za-z0-9][A-Za-z0-9_.-]*)").unwrap());

    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with('-'))
        .filter_map(|line| name.captures(line))
        .map(|caps| caps[1].to_string())
        .collect()
}

fn package_json(text: &str) -> Vec<String> {
    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(value) => value
            .get("dependencies")
            .and_then(|deps| deps.as_object())
            .map(|deps| deps.keys().cloned().collect())
            .unwrap_or_default(),
        Err(e) => {
            debug!("Ignoring malformed package.json: {}", e);
            Vec::new()
        }
    }
}

fn cargo_toml(text: &str) -> Vec<String> {
    match text.parse::<toml::Table>() {
        Ok(table) => table
            .get("dependencies")
            .and_then(|deps| deps.as_table())
            .map(|deps| deps.keys().cloned().collect())
            .unwrap_or_default(),
        Err(e) => {
            debug!("Ignoring malformed Cargo.toml: {}", e);
            Vec::new()
        }
    }
}

fn go_mod(text: &str) -> Vec<String> {
    static MODULE: OnceLock<Regex> = OnceLock::new();
    let module = MODULE.get_or_init(|| Regex::new(r"^([A-Za-z0-9_/.\-]+)\s+v\S+").unwrap());

    let mut deps = Vec::new();
    let mut in_block = false;
    for line in text.lines().map(str::trim) {
        let candidate = if in_block {
            if line.starts_with(')') {
                in_block = false;
                continue;
            }
            line
        } else if let Some(rest) = line.strip_prefix("require") {
            let rest = rest.trim();
            if rest.starts_with('(') {
                in_block = true;
                continue;
            }
            rest
        } else {
            continue;
        };
        if let Some(caps) = module.captures(candidate) {
            deps.push(caps[1].to_string());
        }
    }
    deps
}

fn pom_xml(text: &str) -> Vec<String> {
    static ARTIFACT: OnceLock<Regex> = OnceLock::new();
    let artifact = ARTIFACT.get_or_init(|| {
        Regex::new(r"(?s)<dependency>.*?<artifactId>\s*([^<\s]+)\s*</artifactId>").unwrap()
    });

    artifact
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .collect()
}
