//! Pattern Detector - 아키텍처 / API / 패키지 매니저 패턴 탐지
//!
//! Every rule is an independent function over a read-only [`RepoView`]. A rule
//! returns the evidence (paths or dependency names) that triggered it, or an
//! empty set. The result is the union of all non-empty rule outputs, sorted by
//! pattern kind, so rule order never changes the output.

use crate::dependencies::{self, DependencyReport};
use lens_foundation::{language, ApiStyle, FileRecord, PatternFinding, PatternKind};
use rayon::prelude::*;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;
use tracing::debug;

// ============================================================================
// Repository view
// ============================================================================

/// Indexes shared by every rule
pub struct RepoView<'a> {
    files: Vec<&'a FileRecord>,
    /// lower-cased directory name → directory paths with that name
    dirs: BTreeMap<String, BTreeSet<String>>,
    deps: &'a DependencyReport,
}

impl<'a> RepoView<'a> {
    pub fn new<F: AsRef<FileRecord>>(files: &'a [F], deps: &'a DependencyReport) -> Self {
        let files: Vec<&FileRecord> = files.iter().map(AsRef::as_ref).collect();
        let mut dirs: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

        for file in &files {
            let mut prefix = String::new();
            for segment in file.dir_segments() {
                if !prefix.is_empty() {
                    prefix.push('/');
                }
                prefix.push_str(segment);
                dirs.entry(segment.to_lowercase())
                    .or_default()
                    .insert(prefix.clone());
            }
        }

        Self { files, dirs, deps }
    }

    /// Paths of directories with any of the given names
    fn dirs_named(&self, names: &[&str]) -> BTreeSet<String> {
        names
            .iter()
            .filter_map(|n| self.dirs.get(*n))
            .flatten()
            .cloned()
            .collect()
    }

    /// Number of distinct names (out of `names`) present as directories
    fn distinct_dirs(&self, names: &[&str]) -> usize {
        names.iter().filter(|n| self.dirs.contains_key(**n)).count()
    }

    fn files_where(&self, pred: impl Fn(&FileRecord) -> bool) -> BTreeSet<String> {
        self.files
            .iter()
            .filter(|f| pred(f))
            .map(|f| f.path.clone())
            .collect()
    }

    fn files_named(&self, names: &[&str]) -> BTreeSet<String> {
        self.files_where(|f| names.contains(&f.file_name().to_lowercase().as_str()))
    }

    fn files_with_extension(&self, exts: &[&str]) -> BTreeSet<String> {
        self.files_where(|f| f.extension().is_some_and(|e| exts.contains(&e.as_str())))
    }

    /// Code files whose content matches the regex
    fn content_matches(&self, re: &Regex) -> BTreeSet<String> {
        self.files
            .par_iter()
            .filter(|f| language::detect(&f.path).is_some_and(|l| l.is_code))
            .filter(|f| f.content.as_deref().is_some_and(|c| re.is_match(c)))
            .map(|f| f.path.clone())
            .collect::<Vec<_>>()
            .into_iter()
            .collect()
    }

    fn deps_matching(&self, patterns: &[&str]) -> BTreeSet<String> {
        self.deps.matching(patterns)
    }
}

// ============================================================================
// Rules
// ============================================================================

type RuleFn = fn(&RepoView<'_>) -> BTreeSet<String>;

struct Rule {
    kind: PatternKind,
    check: RuleFn,
}

const RULES: &[Rule] = &[
    Rule {
        kind: PatternKind::Mvc,
        check: mvc,
    },
    Rule {
        kind: PatternKind::Microservices,
        check: microservices,
    },
    Rule {
        kind: PatternKind::CleanArchitecture,
        check: clean_architecture,
    },
    Rule {
        kind: PatternKind::ComponentBased,
        check: component_based,
    },
    Rule {
        kind: PatternKind::ApiFirst,
        check: api_first,
    },
    Rule {
        kind: PatternKind::EventDriven,
        check: event_driven,
    },
    Rule {
        kind: PatternKind::Containerized,
        check: containerized,
    },
    Rule {
        kind: PatternKind::Monorepo,
        check: monorepo,
    },
    Rule {
        kind: PatternKind::Api(ApiStyle::Rest),
        check: rest_api,
    },
    Rule {
        kind: PatternKind::Api(ApiStyle::GraphQl),
        check: graphql_api,
    },
    Rule {
        kind: PatternKind::Api(ApiStyle::Rpc),
        check: rpc_api,
    },
    Rule {
        kind: PatternKind::Api(ApiStyle::Unknown),
        check: unclassified_api,
    },
];

const MVC_DIRS: &[&str] = &["models", "views", "controllers"];
const CLEAN_DIRS: &[&str] = &[
    "domain",
    "infrastructure",
    "application",
    "adapters",
    "usecases",
    "use_cases",
    "ports",
];
const COMPOSE_FILES: &[&str] = &[
    "docker-compose.yml",
    "docker-compose.yaml",
    "compose.yml",
    "compose.yaml",
];

/// At least two of models / views / controllers
fn mvc(view: &RepoView<'_>) -> BTreeSet<String> {
    if view.distinct_dirs(MVC_DIRS) >= 2 {
        view.dirs_named(MVC_DIRS)
    } else {
        BTreeSet::new()
    }
}

fn microservices(view: &RepoView<'_>) -> BTreeSet<String> {
    let mut evidence = view.dirs_named(&["services", "microservices"]);
    evidence.extend(view.files_named(COMPOSE_FILES));
    evidence
}

fn clean_architecture(view: &RepoView<'_>) -> BTreeSet<String> {
    if view.distinct_dirs(CLEAN_DIRS) >= 2 {
        view.dirs_named(CLEAN_DIRS)
    } else {
        BTreeSet::new()
    }
}

fn component_based(view: &RepoView<'_>) -> BTreeSet<String> {
    let mut evidence = view.dirs_named(&["components", "containers"]);
    evidence.extend(view.files_with_extension(&["vue", "svelte"]));
    evidence
}

fn api_first(view: &RepoView<'_>) -> BTreeSet<String> {
    view.files_named(&[
        "openapi.yaml",
        "openapi.yml",
        "openapi.json",
        "swagger.yaml",
        "swagger.yml",
        "swagger.json",
        "api.yaml",
        "api.yml",
    ])
}

fn event_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"\b(addEventListener|EventEmitter|add_listener|on_event)\b|@(EventListener|KafkaListener|RabbitListener|Subscribe)\b",
        )
        .unwrap()
    })
}

fn event_driven(view: &RepoView<'_>) -> BTreeSet<String> {
    let mut evidence = view.dirs_named(&["events", "listeners", "subscribers", "consumers"]);
    evidence.extend(view.content_matches(event_marker()));
    evidence.extend(view.deps_matching(&[
        "kafkajs",
        "kafka-python",
        "confluent-kafka",
        "rdkafka",
        "amqplib",
        "pika",
        "lapin",
        "nats",
        "celery",
        "bullmq",
        "spring-kafka",
        "spring-boot-starter-amqp",
    ]));
    evidence
}

fn containerized(view: &RepoView<'_>) -> BTreeSet<String> {
    let mut evidence = view.files_where(|f| {
        let name = f.file_name().to_lowercase();
        name == "dockerfile" || name.starts_with("dockerfile.") || name.ends_with(".dockerfile")
    });
    evidence.extend(view.files_named(COMPOSE_FILES));
    evidence.extend(view.dirs_named(&["k8s", "kubernetes", "helm"]));
    evidence
}

const WORKSPACE_MARKERS: &[&str] = &[
    "lerna.json",
    "pnpm-workspace.yaml",
    "nx.json",
    "turbo.json",
    "go.work",
    "rush.json",
];
const MANIFESTS: &[&str] = &[
    "package.json",
    "cargo.toml",
    "go.mod",
    "pyproject.toml",
    "pom.xml",
    "build.gradle",
];

fn monorepo(view: &RepoView<'_>) -> BTreeSet<String> {
    let mut evidence = view.files_named(WORKSPACE_MARKERS);

    // 루트 매니페스트의 workspace 선언
    evidence.extend(view.files_where(|f| {
        let name = f.file_name();
        f.depth() == 0
            && f.content.as_deref().is_some_and(|c| match name {
                "Cargo.toml" => c.lines().any(|l| l.trim() == "[workspace]"),
                "package.json" => c.contains("\"workspaces\""),
                _ => false,
            })
    }));

    // 하위 디렉터리의 매니페스트가 둘 이상
    let nested = view.files_where(|f| {
        f.depth() > 0 && MANIFESTS.contains(&f.file_name().to_lowercase().as_str())
    });
    if nested.len() >= 2 {
        evidence.extend(nested);
    }
    evidence
}

fn rest_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"@(app|router|bp|blueprint|api)\.(get|post|put|delete|patch|route)\(|\b(app|router)\.(get|post|put|delete|patch)\(\s*['"/]|@(Get|Post|Put|Delete|Patch|Request)Mapping\b|@RestController\b|\bHandleFunc\(|#\[(get|post|put|delete|patch)\("#,
        )
        .unwrap()
    })
}

const REST_DEPS: &[&str] = &[
    "express",
    "fastify",
    "koa",
    "@nestjs/",
    "fastapi",
    "flask",
    "djangorestframework",
    "spring-boot-starter-web",
    "actix-web",
    "axum",
    "rocket",
    "github.com/gin-gonic/gin",
    "github.com/labstack/echo/",
];

fn rest_api(view: &RepoView<'_>) -> BTreeSet<String> {
    let mut evidence = view.dirs_named(&["routes", "endpoints"]);
    evidence.extend(view.content_matches(rest_marker()));
    evidence.extend(view.deps_matching(REST_DEPS));
    evidence
}

fn graphql_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\btype\s+(Query|Mutation)\s*\{|\bgql`").unwrap())
}

const GRAPHQL_DEPS: &[&str] = &[
    "graphql",
    "apollo-server",
    "@apollo/",
    "graphene",
    "strawberry-graphql",
    "async-graphql",
    "juniper",
    "graphql-java",
    "github.com/99designs/gqlgen",
];

fn graphql_api(view: &RepoView<'_>) -> BTreeSet<String> {
    let mut evidence = view.files_with_extension(&["graphql", "gql"]);
    evidence.extend(view.content_matches(graphql_marker()));
    evidence.extend(view.deps_matching(GRAPHQL_DEPS));
    evidence
}

const RPC_DEPS: &[&str] = &[
    "grpcio",
    "@grpc/",
    "grpc",
    "tonic",
    "google.golang.org/grpc",
    "grpc-netty",
    "grpc-stub",
    "jsonrpc",
    "json-rpc",
    "jsonrpsee",
];

fn rpc_api(view: &RepoView<'_>) -> BTreeSet<String> {
    let mut evidence = view.files_with_extension(&["proto", "thrift"]);
    evidence.extend(view.deps_matching(RPC_DEPS));
    evidence
}

/// Files under an `api/` directory that carry no API style marker themselves
///
/// Judged per file, so files added elsewhere never withdraw the finding.
fn unclassified_api(view: &RepoView<'_>) -> BTreeSet<String> {
    view.files_where(|f| {
        let in_api_dir = f
            .dir_segments()
            .any(|d| d.eq_ignore_ascii_case("api") || d.eq_ignore_ascii_case("apis"));
        if !in_api_dir {
            return false;
        }
        let schema_file = f
            .extension()
            .is_some_and(|e| matches!(e.as_str(), "graphql" | "gql" | "proto" | "thrift"));
        let marked = f
            .content
            .as_deref()
            .is_some_and(|c| rest_marker().is_match(c) || graphql_marker().is_match(c));
        !schema_file && !marked
    })
}

// ============================================================================
// Detector
// ============================================================================

/// Run every rule; findings are sorted by kind
pub fn detect_with<F: AsRef<FileRecord>>(
    files: &[F],
    deps: &DependencyReport,
) -> Vec<PatternFinding> {
    let view = RepoView::new(files, deps);
    let mut findings: BTreeMap<PatternKind, BTreeSet<String>> = BTreeMap::new();

    for rule in RULES {
        let evidence = (rule.check)(&view);
        if !evidence.is_empty() {
            debug!("Pattern {}: {} evidence item(s)", rule.kind, evidence.len());
            findings.entry(rule.kind).or_default().extend(evidence);
        }
    }

    for (manager, manifests) in &deps.package_managers {
        findings
            .entry(PatternKind::PackageManager(*manager))
            .or_default()
            .extend(manifests.iter().cloned());
    }

    findings
        .into_iter()
        .map(|(kind, evidence)| PatternFinding { kind, evidence })
        .collect()
}

/// Detect patterns, parsing manifests on the way
pub fn detect<F: AsRef<FileRecord>>(files: &[F]) -> Vec<PatternFinding> {
    let deps = dependencies::analyze(files);
    detect_with(files, &deps)
}
