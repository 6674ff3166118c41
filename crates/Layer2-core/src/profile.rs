//! Project Profile - 프로젝트 유형 / 기술 스택 분류
//!
//! The project type is the first matching entry of a fixed precedence list;
//! technologies are collected from dependency names and marker files.

use crate::dependencies::DependencyReport;
use lens_foundation::{language, FileRecord, PackageManager};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectType {
    FrontendWeb,
    BackendWeb,
    NodeApplication,
    Django,
    Flask,
    FastApi,
    Python,
    Mobile,
    Java,
    Rust,
    Go,
    Ruby,
    Php,
    Containerized,
    Documentation,
    Unknown,
}

impl fmt::Display for ProjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::FrontendWeb => "Frontend Web Application",
            Self::BackendWeb => "Backend Web Service",
            Self::NodeApplication => "Node.js Application",
            Self::Django => "Django Web Application",
            Self::Flask => "Flask Web Application",
            Self::FastApi => "FastAPI Service",
            Self::Python => "Python Project",
            Self::Mobile => "Mobile Application",
            Self::Java => "Java Project",
            Self::Rust => "Rust Project",
            Self::Go => "Go Project",
            Self::Ruby => "Ruby Project",
            Self::Php => "PHP Project",
            Self::Containerized => "Containerized Application",
            Self::Documentation => "Documentation",
            Self::Unknown => "Unknown",
        };
        f.write_str(label)
    }
}

/// Technologies by area
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Technologies {
    pub frontend: BTreeSet<String>,
    pub backend: BTreeSet<String>,
    pub database: BTreeSet<String>,
    pub cloud: BTreeSet<String>,
    pub mobile: BTreeSet<String>,
}

impl Technologies {
    pub fn is_empty(&self) -> bool {
        self.frontend.is_empty()
            && self.backend.is_empty()
            && self.database.is_empty()
            && self.cloud.is_empty()
            && self.mobile.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectProfile {
    pub project_type: ProjectType,
    pub technologies: Technologies,
}

impl Default for ProjectProfile {
    fn default() -> Self {
        Self {
            project_type: ProjectType::Unknown,
            technologies: Technologies::default(),
        }
    }
}

// ============================================================================
// Technology tables: (label, dependency patterns)
// ============================================================================

type Table = &'static [(&'static str, &'static [&'static str])];

const FRONTEND: Table = &[
    ("React", &["react"]),
    ("Vue.js", &["vue"]),
    ("Angular", &["@angular/"]),
    ("Svelte", &["svelte"]),
    ("Next.js", &["next"]),
    ("Tailwind CSS", &["tailwindcss"]),
    ("Bootstrap", &["bootstrap"]),
    ("jQuery", &["jquery"]),
];

const BACKEND: Table = &[
    ("Express.js", &["express"]),
    ("NestJS", &["@nestjs/"]),
    ("Koa", &["koa"]),
    ("Django", &["django"]),
    ("Flask", &["flask"]),
    ("FastAPI", &["fastapi"]),
    ("Spring Boot", &["spring-boot-starter", "spring-boot"]),
    ("Rails", &["rails"]),
    ("Laravel", &["laravel/"]),
    ("Actix Web", &["actix-web"]),
    ("Axum", &["axum"]),
    ("Gin", &["github.com/gin-gonic/gin"]),
];

const DATABASE: Table = &[
    ("PostgreSQL", &["pg", "psycopg2", "psycopg", "postgres", "tokio-postgres", "postgresql"]),
    ("MySQL", &["mysql", "mysql2", "pymysql", "mysqlclient"]),
    ("MongoDB", &["mongodb", "mongoose", "pymongo", "motor"]),
    ("Redis", &["redis", "ioredis", "redis-py"]),
    ("SQLite", &["sqlite3", "rusqlite", "better-sqlite3"]),
    ("SQLAlchemy", &["sqlalchemy"]),
    ("Prisma", &["prisma", "@prisma/"]),
    ("Diesel", &["diesel"]),
    ("SQLx", &["sqlx"]),
];

const CLOUD: Table = &[
    ("AWS", &["boto3", "aws-sdk", "@aws-sdk/", "aws-config"]),
    ("Google Cloud", &["@google-cloud/", "google-cloud-storage", "google-cloud"]),
    ("Azure", &["@azure/", "azure-storage-blob", "azure-identity"]),
    ("Firebase", &["firebase", "firebase-admin"]),
];

const MOBILE: Table = &[
    ("React Native", &["react-native"]),
    ("Expo", &["expo"]),
    ("Ionic", &["@ionic/"]),
];

fn collect(deps: &DependencyReport, table: Table) -> BTreeSet<String> {
    table
        .iter()
        .filter(|(_, patterns)| !deps.matching(patterns).is_empty())
        .map(|(label, _)| label.to_string())
        .collect()
}

fn has_file<F: AsRef<FileRecord>>(files: &[F], pred: impl Fn(&FileRecord) -> bool) -> bool {
    files.iter().map(AsRef::as_ref).any(pred)
}

// ============================================================================
// Profile
// ============================================================================

/// Classify the project and collect its technologies
pub fn profile<F: AsRef<FileRecord>>(files: &[F], deps: &DependencyReport) -> ProjectProfile {
    let mut technologies = Technologies {
        frontend: collect(deps, FRONTEND),
        backend: collect(deps, BACKEND),
        database: collect(deps, DATABASE),
        cloud: collect(deps, CLOUD),
        mobile: collect(deps, MOBILE),
    };

    // 마커 파일
    if has_file(files, |f| f.file_name() == "pubspec.yaml") {
        technologies.mobile.insert("Flutter".to_string());
    }
    if has_file(files, |f| f.file_name() == "AndroidManifest.xml") {
        technologies.mobile.insert("Android".to_string());
    }
    if has_file(files, |f| f.file_name() == "Info.plist" || f.extension().as_deref() == Some("swift")) {
        technologies.mobile.insert("iOS".to_string());
    }
    if has_file(files, |f| f.file_name() == "Dockerfile") {
        technologies.cloud.insert("Docker".to_string());
    }
    if has_file(files, |f| f.dir_segments().any(|d| d == "k8s" || d == "kubernetes")) {
        technologies.cloud.insert("Kubernetes".to_string());
    }
    if has_file(files, |f| f.extension().as_deref() == Some("tf")) {
        technologies.cloud.insert("Terraform".to_string());
    }

    ProjectProfile {
        project_type: project_type(files, deps, &technologies),
        technologies,
    }
}

fn project_type<F: AsRef<FileRecord>>(
    files: &[F],
    deps: &DependencyReport,
    tech: &Technologies,
) -> ProjectType {
    let node = [PackageManager::Npm, PackageManager::Yarn, PackageManager::Pnpm]
        .iter()
        .any(|m| deps.has_manager(*m));
    let python = [PackageManager::Pip, PackageManager::Pipenv, PackageManager::Poetry]
        .iter()
        .any(|m| deps.has_manager(*m));

    if !tech.mobile.is_empty() {
        return ProjectType::Mobile;
    }
    if node {
        if ["React", "Vue.js", "Angular", "Svelte", "Next.js"]
            .iter()
            .any(|t| tech.frontend.contains(*t))
        {
            return ProjectType::FrontendWeb;
        }
        if !tech.backend.is_empty() {
            return ProjectType::BackendWeb;
        }
        return ProjectType::NodeApplication;
    }
    if python {
        if tech.backend.contains("Django") {
            return ProjectType::Django;
        }
        if tech.backend.contains("Flask") {
            return ProjectType::Flask;
        }
        if tech.backend.contains("FastAPI") {
            return ProjectType::FastApi;
        }
        return ProjectType::Python;
    }
    if deps.has_manager(PackageManager::Maven) || deps.has_manager(PackageManager::Gradle) {
        return ProjectType::Java;
    }
    if deps.has_manager(PackageManager::Cargo) {
        return ProjectType::Rust;
    }
    if deps.has_manager(PackageManager::GoModules) {
        return ProjectType::Go;
    }
    if deps.has_manager(PackageManager::Bundler) {
        return ProjectType::Ruby;
    }
    if deps.has_manager(PackageManager::Composer) {
        return ProjectType::Php;
    }

    // 매니페스트 없음: 파일 구성으로 판단
    if has_file(files, |f| f.file_name() == "Dockerfile") {
        return ProjectType::Containerized;
    }
    let code = files
        .iter()
        .filter(|f| language::detect(&f.as_ref().path).is_some_and(|l| l.is_code))
        .count();
    let docs = files
        .iter()
        .filter(|f| matches!(f.as_ref().extension().as_deref(), Some("md" | "rst" | "adoc")))
        .count();
    if docs > 0 && docs >= code {
        return ProjectType::Documentation;
    }
    if code > 0 {
        let dominant = files
            .iter()
            .filter_map(|f| f.as_ref().language.as_deref())
            .fold(BTreeMap::<&str, usize>::new(), |mut m, l| {
                *m.entry(l).or_default() += 1;
                m
            })
            .into_iter()
            .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(l, _)| l);
        return match dominant {
            Some("Python") => ProjectType::Python,
            Some("Rust") => ProjectType::Rust,
            Some("Go") => ProjectType::Go,
            Some("Java" | "Kotlin") => ProjectType::Java,
            Some("Ruby") => ProjectType::Ruby,
            Some("PHP") => ProjectType::Php,
            _ => ProjectType::Unknown,
        };
    }
    ProjectType::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dependencies;

    fn file(path: &str, content: &str) -> FileRecord {
        FileRecord::new(path, content.len() as u64).with_content(content)
    }

    fn run(files: &[FileRecord]) -> ProjectProfile {
        profile(files, &dependencies::analyze(files))
    }

    #[test]
    fn test_frontend_web() {
        let p = run(&[file(
            "package.json",
            r#"{"dependencies":{"react":"18","express":"4","mongoose":"7"}}"#,
        )]);
        assert_eq!(p.project_type, ProjectType::FrontendWeb);
        assert!(p.technologies.frontend.contains("React"));
        assert!(p.technologies.backend.contains("Express.js"));
        assert!(p.technologies.database.contains("MongoDB"));
    }

    #[test]
    fn test_python_frameworks() {
        let p = run(&[file("requirements.txt", "flask\nsqlalchemy\nboto3\n")]);
        assert_eq!(p.project_type, ProjectType::Flask);
        assert!(p.technologies.database.contains("SQLAlchemy"));
        assert!(p.technologies.cloud.contains("AWS"));
    }

    #[test]
    fn test_mobile_wins() {
        let p = run(&[
            file("package.json", r#"{"dependencies":{"react-native":"0.73","react":"18"}}"#),
            FileRecord::new("android/app/src/main/AndroidManifest.xml", 10),
        ]);
        assert_eq!(p.project_type, ProjectType::Mobile);
        assert!(p.technologies.mobile.contains("React Native"));
        assert!(p.technologies.mobile.contains("Android"));
    }

    #[test]
    fn test_without_manifests() {
        let docs = run(&[FileRecord::new("README.md", 1), FileRecord::new("guide.md", 1)]);
        assert_eq!(docs.project_type, ProjectType::Documentation);

        let go = run(&[FileRecord::new("main.go", 1), FileRecord::new("util.go", 1)]);
        assert_eq!(go.project_type, ProjectType::Go);

        let docker = run(&[FileRecord::new("Dockerfile", 1)]);
        assert_eq!(docker.project_type, ProjectType::Containerized);
        assert!(docker.technologies.cloud.contains("Docker"));

        assert_eq!(run(&[]).project_type, ProjectType::Unknown);
    }
}
