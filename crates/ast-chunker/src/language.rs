use crate::error::ConfigError;
use crate::grammar::Grammar;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Supported source languages and dialects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Rust,
    Python,
    JavaScript,
    TypeScript,
    Tsx,
    Go,
    Java,
    Json,
    Yaml,
    Toml,
    Xml,
    Hcl,
    Dockerfile,
    Properties,
    PlainText,
}

/// Identifier → language table, built once and shared read-only
static REGISTRY: Lazy<HashMap<&'static str, Language>> = Lazy::new(|| {
    let mut table = HashMap::new();
    for language in Language::ALL {
        table.insert(language.as_str(), language);
        for alias in language.aliases() {
            table.insert(*alias, language);
        }
    }
    table
});

impl Language {
    /// Every registered language, in a stable order
    pub const ALL: [Language; 15] = [
        Language::Rust,
        Language::Python,
        Language::JavaScript,
        Language::TypeScript,
        Language::Tsx,
        Language::Go,
        Language::Java,
        Language::Json,
        Language::Yaml,
        Language::Toml,
        Language::Xml,
        Language::Hcl,
        Language::Dockerfile,
        Language::Properties,
        Language::PlainText,
    ];

    /// Resolve a language identifier (case-insensitive, aliases allowed)
    pub fn from_id(id: &str) -> Option<Self> {
        let key = id.trim().to_ascii_lowercase();
        REGISTRY.get(key.as_str()).copied()
    }

    /// Get canonical language name as string
    pub fn as_str(self) -> &'static str {
        match self {
            Language::Rust => "rust",
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Tsx => "tsx",
            Language::Go => "go",
            Language::Java => "java",
            Language::Json => "json",
            Language::Yaml => "yaml",
            Language::Toml => "toml",
            Language::Xml => "xml",
            Language::Hcl => "hcl",
            Language::Dockerfile => "dockerfile",
            Language::Properties => "properties",
            Language::PlainText => "text",
        }
    }

    /// Alternative identifiers that resolve to this language
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Language::Rust => &["rs"],
            Language::Python => &["py"],
            Language::JavaScript => &["js", "jsx"],
            Language::TypeScript => &["ts"],
            Language::Tsx => &[],
            Language::Go => &["golang"],
            Language::Java => &[],
            Language::Json => &[],
            Language::Yaml => &["yml"],
            Language::Toml => &[],
            Language::Xml => &["pom"],
            // Terraform is HCL with a provider vocabulary; one grammar serves both.
            Language::Hcl => &["terraform", "tf", "tfvars"],
            Language::Dockerfile => &["docker", "containerfile"],
            Language::Properties => &["java-properties"],
            Language::PlainText => &["plaintext", "txt"],
        }
    }

    /// Grammar that parses this language
    pub fn grammar(self) -> Grammar {
        match self {
            Language::Rust => Grammar::TreeSitter(tree_sitter_rust::LANGUAGE.into()),
            Language::Python => Grammar::TreeSitter(tree_sitter_python::LANGUAGE.into()),
            Language::JavaScript => Grammar::TreeSitter(tree_sitter_javascript::LANGUAGE.into()),
            Language::TypeScript => {
                Grammar::TreeSitter(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into())
            }
            Language::Tsx => Grammar::TreeSitter(tree_sitter_typescript::LANGUAGE_TSX.into()),
            Language::Go => Grammar::TreeSitter(tree_sitter_go::LANGUAGE.into()),
            Language::Java => Grammar::TreeSitter(tree_sitter_java::LANGUAGE.into()),
            Language::Json => Grammar::TreeSitter(tree_sitter_json::LANGUAGE.into()),
            Language::Yaml => Grammar::TreeSitter(tree_sitter_yaml::LANGUAGE.into()),
            Language::Toml => Grammar::TreeSitter(tree_sitter_toml_ng::LANGUAGE.into()),
            Language::Xml => Grammar::TreeSitter(tree_sitter_xml::LANGUAGE_XML.into()),
            Language::Hcl => Grammar::TreeSitter(tree_sitter_hcl::LANGUAGE.into()),
            Language::Dockerfile => {
                Grammar::TreeSitter(tree_sitter_containerfile::LANGUAGE.into())
            }
            Language::Properties => Grammar::TreeSitter(tree_sitter_properties::LANGUAGE.into()),
            Language::PlainText => Grammar::Lines,
        }
    }
}

impl FromStr for Language {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_id(s).ok_or_else(|| ConfigError::unsupported_language(s))
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
