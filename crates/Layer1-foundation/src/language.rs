//! Language Registry - 확장자 기반 언어 판별
//!
//! Maps file names and extensions to a language spec: display name, comment
//! syntax (when registered) and the structural nesting style used by the
//! complexity scan.

use std::path::Path;

/// How nesting depth is measured for a language
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NestingStyle {
    /// `{ ... }` blocks
    Braces,
    /// Leading-whitespace blocks (Python, YAML, ...)
    Indentation,
}

/// Registered comment syntax
#[derive(Debug, Clone, Copy)]
pub struct CommentSyntax {
    /// Line comment prefixes (`//`, `#`, `--`)
    pub line: &'static [&'static str],
    /// Block comment delimiters (`/*` .. `*/`)
    pub block: &'static [(&'static str, &'static str)],
}

/// Static description of one language
#[derive(Debug)]
pub struct LanguageSpec {
    /// Display name, also used as the language tag
    pub name: &'static str,
    /// Lower-case extensions without the dot
    pub extensions: &'static [&'static str],
    /// Exact file names (e.g. `Dockerfile`)
    pub file_names: &'static [&'static str],
    /// `None` means the comment syntax is not registered
    pub comments: Option<CommentSyntax>,
    pub nesting: NestingStyle,
    /// Programming language (as opposed to markup/data)
    pub is_code: bool,
}

const C_STYLE: CommentSyntax = CommentSyntax {
    line: &["//"],
    block: &[("/*", "*/")],
};

const HASH: CommentSyntax = CommentSyntax {
    line: &["#"],
    block: &[],
};

const PYTHON: CommentSyntax = CommentSyntax {
    line: &["#"],
    block: &[("\"\"\"", "\"\"\""), ("'''", "'''")],
};

const PHP: CommentSyntax = CommentSyntax {
    line: &["//", "#"],
    block: &[("/*", "*/")],
};

const MARKUP: CommentSyntax = CommentSyntax {
    line: &[],
    block: &[("<!--", "-->")],
};

const CSS: CommentSyntax = CommentSyntax {
    line: &[],
    block: &[("/*", "*/")],
};

const SQL: CommentSyntax = CommentSyntax {
    line: &["--"],
    block: &[("/*", "*/")],
};

const fn code(
    name: &'static str,
    extensions: &'static [&'static str],
    comments: CommentSyntax,
    nesting: NestingStyle,
) -> LanguageSpec {
    LanguageSpec {
        name,
        extensions,
        file_names: &[],
        comments: Some(comments),
        nesting,
        is_code: true,
    }
}

const fn data(
    name: &'static str,
    extensions: &'static [&'static str],
    comments: Option<CommentSyntax>,
    nesting: NestingStyle,
) -> LanguageSpec {
    LanguageSpec {
        name,
        extensions,
        file_names: &[],
        comments,
        nesting,
        is_code: false,
    }
}

/// Registered languages
pub static LANGUAGES: &[LanguageSpec] = &[
    code("Python", &["py", "pyw"], PYTHON, NestingStyle::Indentation),
    code("JavaScript", &["js", "mjs", "cjs"], C_STYLE, NestingStyle::Braces),
    code("TypeScript", &["ts"], C_STYLE, NestingStyle::Braces),
    code("React", &["jsx"], C_STYLE, NestingStyle::Braces),
    code("React/TypeScript", &["tsx"], C_STYLE, NestingStyle::Braces),
    code("Java", &["java"], C_STYLE, NestingStyle::Braces),
    code("C++", &["cpp", "cc", "cxx", "hpp"], C_STYLE, NestingStyle::Braces),
    code("C", &["c", "h"], C_STYLE, NestingStyle::Braces),
    code("C#", &["cs"], C_STYLE, NestingStyle::Braces),
    code("Go", &["go"], C_STYLE, NestingStyle::Braces),
    code("Rust", &["rs"], C_STYLE, NestingStyle::Braces),
    code("PHP", &["php"], PHP, NestingStyle::Braces),
    code("Ruby", &["rb"], HASH, NestingStyle::Indentation),
    code("Swift", &["swift"], C_STYLE, NestingStyle::Braces),
    code("Kotlin", &["kt", "kts"], C_STYLE, NestingStyle::Braces),
    code("Scala", &["scala"], C_STYLE, NestingStyle::Braces),
    code("R", &["r"], HASH, NestingStyle::Braces),
    code("Objective-C", &["m", "mm"], C_STYLE, NestingStyle::Braces),
    code("Shell", &["sh", "bash", "zsh"], HASH, NestingStyle::Indentation),
    code("PowerShell", &["ps1"], HASH, NestingStyle::Braces),
    code("SQL", &["sql"], SQL, NestingStyle::Indentation),
    data("HTML", &["html", "htm"], Some(MARKUP), NestingStyle::Indentation),
    data("XML", &["xml"], Some(MARKUP), NestingStyle::Indentation),
    data("CSS", &["css"], Some(CSS), NestingStyle::Braces),
    data("SCSS", &["scss", "sass", "less"], Some(C_STYLE), NestingStyle::Braces),
    data("JSON", &["json"], None, NestingStyle::Braces),
    data("YAML", &["yaml", "yml"], Some(HASH), NestingStyle::Indentation),
    data("TOML", &["toml"], Some(HASH), NestingStyle::Indentation),
    data("INI", &["ini", "cfg", "conf"], None, NestingStyle::Indentation),
    data("Markdown", &["md", "markdown"], Some(MARKUP), NestingStyle::Indentation),
    data("reStructuredText", &["rst"], None, NestingStyle::Indentation),
    data("LaTeX", &["tex"], None, NestingStyle::Indentation),
    LanguageSpec {
        name: "Dockerfile",
        extensions: &["dockerfile"],
        file_names: &["Dockerfile"],
        comments: Some(HASH),
        nesting: NestingStyle::Indentation,
        is_code: false,
    },
    LanguageSpec {
        name: "Makefile",
        extensions: &["mk"],
        file_names: &["Makefile", "GNUmakefile"],
        comments: Some(HASH),
        nesting: NestingStyle::Indentation,
        is_code: false,
    },
];

/// Lower-case extension of a path, without the dot
pub fn extension_of(path: &str) -> Option<String> {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// File name component of a `/`-separated repository path
pub fn file_name_of(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Detect the language of a repository path
pub fn detect(path: &str) -> Option<&'static LanguageSpec> {
    let name = file_name_of(path);
    if let Some(spec) = LANGUAGES.iter().find(|l| l.file_names.contains(&name)) {
        return Some(spec);
    }

    let ext = extension_of(path)?;
    LANGUAGES
        .iter()
        .find(|l| l.extensions.contains(&ext.as_str()))
}

/// Look a language up by its tag
pub fn by_name(name: &str) -> Option<&'static LanguageSpec> {
    LANGUAGES.iter().find(|l| l.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_by_extension() {
        assert_eq!(detect("src/main.rs").map(|l| l.name), Some("Rust"));
        assert_eq!(detect("app/Views/Home.TSX").map(|l| l.name), Some("React/TypeScript"));
        assert_eq!(detect("docs/readme.md").map(|l| l.name), Some("Markdown"));
        assert!(detect("assets/logo.png").is_none());
        assert!(detect("LICENSE").is_none());
    }

    #[test]
    fn test_detect_by_file_name() {
        assert_eq!(detect("deploy/Dockerfile").map(|l| l.name), Some("Dockerfile"));
        assert_eq!(detect("Makefile").map(|l| l.name), Some("Makefile"));
    }

    #[test]
    fn test_unregistered_comment_syntax() {
        let json = by_name("JSON").unwrap();
        assert!(json.comments.is_none());
        assert!(!json.is_code);

        let py = by_name("Python").unwrap();
        assert_eq!(py.nesting, NestingStyle::Indentation);
        assert!(py.comments.is_some());
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("a/b/C.PY").as_deref(), Some("py"));
        assert_eq!(extension_of("Makefile"), None);
        assert_eq!(file_name_of("a/b/c.txt"), "c.txt");
    }
}
