//! Dependency Report - 매니페스트 파싱
//!
//! Parses the package manifests found among the analyzed files into runtime
//! and development dependency names per package manager, then recognises
//! frameworks, testing frameworks and build tools from those names.
//!
//! A manifest that fails to parse is recorded as a warning; it never fails
//! the run.

use lens_foundation::{FileRecord, PackageManager};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;
use tracing::{debug, warn};

/// Parsed dependency facts for the whole repository
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyReport {
    /// Manager → manifest paths that declared it
    pub package_managers: BTreeMap<PackageManager, BTreeSet<String>>,
    /// Manager → runtime dependency names
    pub dependencies: BTreeMap<PackageManager, BTreeSet<String>>,
    /// Manager → development / test dependency names
    pub dev_dependencies: BTreeMap<PackageManager, BTreeSet<String>>,
    pub frameworks: BTreeSet<String>,
    pub testing_frameworks: BTreeSet<String>,
    pub build_tools: BTreeSet<String>,
    /// Manifests that could not be parsed
    pub warnings: Vec<ManifestWarning>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestWarning {
    pub path: String,
    pub message: String,
}

impl DependencyReport {
    pub fn total(&self) -> usize {
        self.dependencies.values().map(BTreeSet::len).sum::<usize>()
            + self.dev_dependencies.values().map(BTreeSet::len).sum::<usize>()
    }

    /// Every dependency name (runtime and dev), lower-cased
    pub fn all_names(&self) -> BTreeSet<String> {
        self.dependencies
            .values()
            .chain(self.dev_dependencies.values())
            .flatten()
            .map(|n| n.to_lowercase())
            .collect()
    }

    /// Dependency names that match any of the patterns
    pub fn matching(&self, patterns: &[&str]) -> BTreeSet<String> {
        self.all_names()
            .into_iter()
            .filter(|name| patterns.iter().any(|p| matches_package(name, p)))
            .collect()
    }

    pub fn has_manager(&self, manager: PackageManager) -> bool {
        self.package_managers.contains_key(&manager)
    }
}

/// One parsed manifest
#[derive(Debug, Default)]
struct Manifest {
    runtime: Vec<String>,
    dev: Vec<String>,
}

// ============================================================================
// Known names
// ============================================================================

const FRAMEWORKS: &[(&str, &[&str])] = &[
    ("React", &["react", "@types/react"]),
    ("Vue.js", &["vue", "@vue/"]),
    ("Angular", &["@angular/", "angular"]),
    ("Express.js", &["express"]),
    ("Next.js", &["next"]),
    ("Nuxt.js", &["nuxt"]),
    ("Svelte", &["svelte", "@sveltejs/"]),
    ("NestJS", &["@nestjs/"]),
    ("Django", &["django"]),
    ("Flask", &["flask"]),
    ("FastAPI", &["fastapi"]),
    ("Spring", &["spring", "spring-boot"]),
    ("Rails", &["rails"]),
    ("Laravel", &["laravel/"]),
    ("Actix Web", &["actix-web"]),
    ("Axum", &["axum"]),
    ("Rocket", &["rocket"]),
    ("Gin", &["github.com/gin-gonic/gin"]),
    ("Echo", &["github.com/labstack/echo/"]),
];

const TESTING: &[(&str, &[&str])] = &[
    ("Jest", &["jest"]),
    ("Mocha", &["mocha"]),
    ("Chai", &["chai"]),
    ("Cypress", &["cypress"]),
    ("Puppeteer", &["puppeteer"]),
    ("Playwright", &["playwright", "@playwright/"]),
    ("Vitest", &["vitest"]),
    ("pytest", &["pytest"]),
    ("unittest", &["unittest"]),
    ("JUnit", &["junit"]),
    ("RSpec", &["rspec"]),
    ("PHPUnit", &["phpunit/"]),
    ("proptest", &["proptest"]),
    ("testify", &["github.com/stretchr/testify"]),
];

const BUILD_TOOLS: &[(&str, &[&str])] = &[
    ("Webpack", &["webpack"]),
    ("Rollup", &["rollup"]),
    ("Vite", &["vite"]),
    ("Parcel", &["parcel"]),
    ("Babel", &["@babel/", "babel"]),
    ("ESLint", &["eslint"]),
    ("Prettier", &["prettier"]),
    ("TypeScript", &["typescript"]),
    ("setuptools", &["setuptools"]),
    ("Black", &["black"]),
];

/// Exact name, or the pattern followed by a separator (`react-dom`, `@babel/core`).
/// Patterns ending in `/` are plain prefixes.
pub fn matches_package(name: &str, pattern: &str) -> bool {
    let name = name.to_lowercase();
    if pattern.ends_with('/') {
        return name.starts_with(pattern);
    }
    name == pattern
        || name
            .strip_prefix(pattern)
            .is_some_and(|rest| rest.starts_with(['-', '_', '.', '/', '@']))
}

fn classify(names: &BTreeSet<String>, table: &[(&str, &[&str])]) -> BTreeSet<String> {
    table
        .iter()
        .filter(|(_, patterns)| {
            names
                .iter()
                .any(|name| patterns.iter().any(|p| matches_package(name, p)))
        })
        .map(|(label, _)| label.to_string())
        .collect()
}

// ============================================================================
// Analyze
// ============================================================================

/// Parse every recognised manifest among the files
pub fn analyze<F: AsRef<FileRecord>>(files: &[F]) -> DependencyReport {
    let mut report = DependencyReport::default();

    for file in files.iter().map(AsRef::as_ref) {
        let Some(content) = file.content.as_deref() else {
            continue;
        };
        let Some((manager, parsed)) = parse_manifest(file.file_name(), content) else {
            continue;
        };

        match parsed {
            Ok(manifest) => {
                debug!(
                    "{}: {} runtime, {} dev dependencies",
                    file.path,
                    manifest.runtime.len(),
                    manifest.dev.len()
                );
                report
                    .package_managers
                    .entry(manager)
                    .or_default()
                    .insert(file.path.clone());
                report
                    .dependencies
                    .entry(manager)
                    .or_default()
                    .extend(manifest.runtime);
                report
                    .dev_dependencies
                    .entry(manager)
                    .or_default()
                    .extend(manifest.dev);
            }
            Err(message) => {
                warn!("Failed to parse {}: {}", file.path, message);
                report.warnings.push(ManifestWarning {
                    path: file.path.clone(),
                    message,
                });
            }
        }
    }

    report.dependencies.retain(|_, deps| !deps.is_empty());
    report.dev_dependencies.retain(|_, deps| !deps.is_empty());

    let names = report.all_names();
    report.frameworks = classify(&names, FRAMEWORKS);
    report.testing_frameworks = classify(&names, TESTING);
    report.build_tools = classify(&names, BUILD_TOOLS);
    report
}

type Parsed = Result<Manifest, String>;

/// Dispatch by file name
fn parse_manifest(name: &str, content: &str) -> Option<(PackageManager, Parsed)> {
    let parsed = match name {
        "package.json" => (node_manager(content), parse_package_json(content)),
        "requirements.txt" => (PackageManager::Pip, Ok(parse_requirements(content))),
        "Pipfile" => (PackageManager::Pipenv, parse_pipfile(content)),
        "pyproject.toml" => parse_pyproject(content),
        "Cargo.toml" => (PackageManager::Cargo, parse_cargo(content)),
        "go.mod" => (PackageManager::GoModules, Ok(parse_go_mod(content))),
        "pom.xml" => (PackageManager::Maven, Ok(parse_pom(content))),
        "build.gradle" | "build.gradle.kts" => (PackageManager::Gradle, Ok(parse_gradle(content))),
        "Gemfile" => (PackageManager::Bundler, Ok(parse_gemfile(content))),
        "composer.json" => (PackageManager::Composer, parse_composer(content)),
        _ => return None,
    };
    Some(parsed)
}

// ============================================================================
// JSON manifests
// ============================================================================

fn node_manager(content: &str) -> PackageManager {
    // "packageManager": "pnpm@8.6.0"
    let declared = serde_json::from_str::<serde_json::Value>(content)
        .ok()
        .and_then(|v| v.get("packageManager")?.as_str().map(str::to_string))
        .unwrap_or_default();
    if declared.starts_with("pnpm") {
        PackageManager::Pnpm
    } else if declared.starts_with("yarn") {
        PackageManager::Yarn
    } else {
        PackageManager::Npm
    }
}

fn json_keys(value: &serde_json::Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(|v| v.as_object())
        .map(|o| o.keys().cloned().collect())
        .unwrap_or_default()
}

fn parse_package_json(content: &str) -> Parsed {
    let value: serde_json::Value = serde_json::from_str(content).map_err(|e| e.to_string())?;
    let mut dev = json_keys(&value, "devDependencies");
    dev.extend(json_keys(&value, "peerDependencies"));
    Ok(Manifest {
        runtime: json_keys(&value, "dependencies"),
        dev,
    })
}

fn parse_composer(content: &str) -> Parsed {
    let value: serde_json::Value = serde_json::from_str(content).map_err(|e| e.to_string())?;
    let platform = |name: &String| name != "php" && !name.starts_with("ext-");
    Ok(Manifest {
        runtime: json_keys(&value, "require")
            .into_iter()
            .filter(platform)
            .collect(),
        dev: json_keys(&value, "require-dev")
            .into_iter()
            .filter(platform)
            .collect(),
    })
}

// ============================================================================
// TOML manifests
// ============================================================================

fn toml_keys(value: &toml::Value, path: &[&str]) -> Vec<String> {
    let mut current = value;
    for key in path {
        match current.get(key) {
            Some(next) => current = next,
            None => return Vec::new(),
        }
    }
    current
        .as_table()
        .map(|t| t.keys().cloned().collect())
        .unwrap_or_default()
}

/// PEP 508 requirement strings → names
fn toml_requirements(value: Option<&toml::Value>) -> Vec<String> {
    value
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|i| i.as_str())
                .filter_map(requirement_name)
                .collect()
        })
        .unwrap_or_default()
}

fn parse_pipfile(content: &str) -> Parsed {
    let value: toml::Value = toml::from_str(content).map_err(|e| e.to_string())?;
    Ok(Manifest {
        runtime: toml_keys(&value, &["packages"]),
        dev: toml_keys(&value, &["dev-packages"]),
    })
}

fn parse_pyproject(content: &str) -> (PackageManager, Parsed) {
    let value: toml::Value = match toml::from_str(content) {
        Ok(v) => v,
        Err(e) => return (PackageManager::Pip, Err(e.to_string())),
    };

    let poetry = value.get("tool").and_then(|t| t.get("poetry"));
    if poetry.is_some() {
        let runtime = toml_keys(&value, &["tool", "poetry", "dependencies"])
            .into_iter()
            .filter(|n| n != "python")
            .collect();
        let mut dev = toml_keys(&value, &["tool", "poetry", "dev-dependencies"]);
        if let Some(groups) = poetry
            .and_then(|p| p.get("group"))
            .and_then(|g| g.as_table())
        {
            for group in groups.values() {
                if let Some(deps) = group.get("dependencies").and_then(|d| d.as_table()) {
                    dev.extend(deps.keys().cloned());
                }
            }
        }
        return (PackageManager::Poetry, Ok(Manifest { runtime, dev }));
    }

    let project = value.get("project");
    let runtime = toml_requirements(project.and_then(|p| p.get("dependencies")));
    let dev = project
        .and_then(|p| p.get("optional-dependencies"))
        .and_then(|o| o.as_table())
        .map(|groups| {
            groups
                .values()
                .flat_map(|g| toml_requirements(Some(g)))
                .collect()
        })
        .unwrap_or_default();
    (PackageManager::Pip, Ok(Manifest { runtime, dev }))
}

fn parse_cargo(content: &str) -> Parsed {
    let value: toml::Value = toml::from_str(content).map_err(|e| e.to_string())?;
    let mut runtime = toml_keys(&value, &["dependencies"]);
    runtime.extend(toml_keys(&value, &["workspace", "dependencies"]));
    let mut dev = toml_keys(&value, &["dev-dependencies"]);
    dev.extend(toml_keys(&value, &["build-dependencies"]));
    Ok(Manifest { runtime, dev })
}

// ============================================================================
// Line / regex manifests
// ============================================================================

fn requirement_split() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[<>=!~;\[@\s]").unwrap())
}

/// `requests[socks]>=2.0 ; python_version>"3"` → `requests`
fn requirement_name(line: &str) -> Option<String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') || line.starts_with('-') {
        return None;
    }
    let name = requirement_split().split(line).next()?.trim();
    (!name.is_empty()).then(|| name.to_string())
}

fn parse_requirements(content: &str) -> Manifest {
    Manifest {
        runtime: content.lines().filter_map(requirement_name).collect(),
        dev: Vec::new(),
    }
}

fn parse_go_mod(content: &str) -> Manifest {
    let mut runtime = Vec::new();
    let mut in_block = false;

    for line in content.lines().map(str::trim) {
        if in_block {
            if line.starts_with(')') {
                in_block = false;
            } else if let Some(module) = line.split_whitespace().next() {
                if !module.starts_with("//") {
                    runtime.push(module.to_string());
                }
            }
        } else if line.starts_with("require (") || line == "require(" {
            in_block = true;
        } else if let Some(rest) = line.strip_prefix("require ") {
            if let Some(module) = rest.split_whitespace().next() {
                runtime.push(module.to_string());
            }
        }
    }

    Manifest {
        runtime,
        dev: Vec::new(),
    }
}

fn parse_pom(content: &str) -> Manifest {
    static DEP: OnceLock<Regex> = OnceLock::new();
    static ARTIFACT: OnceLock<Regex> = OnceLock::new();
    static SCOPE: OnceLock<Regex> = OnceLock::new();
    let dep = DEP.get_or_init(|| Regex::new(r"(?s)<dependency>(.*?)</dependency>").unwrap());
    let artifact =
        ARTIFACT.get_or_init(|| Regex::new(r"<artifactId>\s*([^<\s]+)\s*</artifactId>").unwrap());
    let scope = SCOPE.get_or_init(|| Regex::new(r"<scope>\s*test\s*</scope>").unwrap());

    let mut manifest = Manifest::default();
    for block in dep.captures_iter(content) {
        let body = &block[1];
        if let Some(name) = artifact.captures(body) {
            if scope.is_match(body) {
                manifest.dev.push(name[1].to_string());
            } else {
                manifest.runtime.push(name[1].to_string());
            }
        }
    }
    manifest
}

fn parse_gradle(content: &str) -> Manifest {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(
            r#"(?m)^\s*(implementation|api|compileOnly|runtimeOnly|testImplementation|testRuntimeOnly|androidTestImplementation)\s*\(?\s*['"]([^'":]+):([^'":]+)"#,
        )
        .unwrap()
    });

    let mut manifest = Manifest::default();
    for cap in re.captures_iter(content) {
        let name = cap[3].to_string();
        if cap[1].starts_with("test") || cap[1].starts_with("androidTest") {
            manifest.dev.push(name);
        } else {
            manifest.runtime.push(name);
        }
    }
    manifest
}

fn parse_gemfile(content: &str) -> Manifest {
    static GEM: OnceLock<Regex> = OnceLock::new();
    static GROUP: OnceLock<Regex> = OnceLock::new();
    let gem = GEM.get_or_init(|| Regex::new(r#"^gem\s+['"]([^'"]+)['"]"#).unwrap());
    let group = GROUP.get_or_init(|| Regex::new(r"^group\s+.*\b(test|development)\b.*\bdo\b").unwrap());

    let mut manifest = Manifest::default();
    let mut dev_group = false;
    for line in content.lines().map(str::trim) {
        if group.is_match(line) {
            dev_group = true;
        } else if line == "end" {
            dev_group = false;
        } else if let Some(cap) = gem.captures(line) {
            let name = cap[1].to_string();
            if dev_group {
                manifest.dev.push(name);
            } else {
                manifest.runtime.push(name);
            }
        }
    }
    manifest
}
