//! Path to language classification.
//!
//! One table serves both the local and the remote source, so language
//! histograms from either side use the same labels for the same extension.

use std::path::Path;

use crate::model::LanguageTag;

pub const UNKNOWN: &str = "Unknown";

/// Extension (lowercase, without dot) to language label.
const EXTENSIONS: &[(&str, &str)] = &[
    ("py", "Python"),
    ("js", "JavaScript"),
    ("jsx", "JavaScript"),
    ("ts", "TypeScript"),
    ("tsx", "TypeScript"),
    ("java", "Java"),
    ("cpp", "C++"),
    ("cc", "C++"),
    ("cxx", "C++"),
    ("hpp", "C++"),
    ("c", "C"),
    ("h", "C/C++"),
    ("cs", "C#"),
    ("rb", "Ruby"),
    ("php", "PHP"),
    ("go", "Go"),
    ("rs", "Rust"),
    ("swift", "Swift"),
    ("kt", "Kotlin"),
    ("kts", "Kotlin"),
    ("scala", "Scala"),
    ("r", "R"),
    ("m", "MATLAB"),
    ("sh", "Shell"),
    ("bash", "Shell"),
    ("zsh", "Shell"),
    ("sql", "SQL"),
    ("html", "HTML"),
    ("htm", "HTML"),
    ("css", "CSS"),
    ("scss", "SCSS"),
    ("sass", "SASS"),
    ("less", "LESS"),
    ("md", "Markdown"),
    ("json", "JSON"),
    ("yaml", "YAML"),
    ("yml", "YAML"),
    ("xml", "XML"),
    ("txt", "Text"),
    ("rst", "reStructuredText"),
    ("tex", "TeX"),
    ("latex", "LaTeX"),
    ("bib", "BibTeX"),
    ("ini", "INI"),
    ("cfg", "INI"),
    ("conf", "INI"),
    ("toml", "TOML"),
    ("csv", "CSV"),
    ("tsv", "TSV"),
    ("diff", "Diff"),
    ("patch", "Diff"),
    ("dockerfile", "Dockerfile"),
    ("dockerignore", "Dockerfile"),
    ("gitignore", "Git"),
    ("env", "Properties"),
    ("properties", "Properties"),
];

/// Well-known file names without an extension.
const FILE_NAMES: &[(&str, &str)] = &[
    ("dockerfile", "Dockerfile"),
    ("containerfile", "Dockerfile"),
    ("makefile", "Makefile"),
    ("gnumakefile", "Makefile"),
    ("rakefile", "Ruby"),
    ("gemfile", "Ruby"),
    ("jenkinsfile", "Groovy"),
    ("vagrantfile", "Ruby"),
];

/// Classifies paths into language labels.
///
/// With the lexical stage enabled, names and extensions known to tokei's
/// language table win; anything it does not recognise falls back to the
/// static table above.
#[derive(Debug, Clone, Copy)]
pub struct Classifier {
    lexical: bool,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier {
    pub fn new() -> Self {
        Self { lexical: true }
    }

    pub fn extension_only() -> Self {
        Self { lexical: false }
    }

    pub fn is_lexical(&self) -> bool {
        self.lexical
    }

    /// Never fails; unrecognised paths yield [`UNKNOWN`].
    pub fn classify(&self, path: &str) -> LanguageTag {
        let path = path.trim();
        if path.is_empty() {
            return UNKNOWN.to_string();
        }
        if self.lexical {
            if let Some(lang) = self.lexical_lookup(path) {
                return lang;
            }
        }
        static_lookup(path).unwrap_or(UNKNOWN).to_string()
    }

    // Only paths `Path::extension` accepts go to tokei. Anything else, dotfiles
    // included, would fall through to its shebang sniffing, which reads the
    // path relative to the working directory.
    fn lexical_lookup(&self, path: &str) -> Option<LanguageTag> {
        Path::new(path).extension()?;
        let config = tokei::Config::default();
        tokei::LanguageType::from_path(Path::new(path), &config).map(|lang| lang.name().to_string())
    }
}

/// Classifies with the default (lexical, then static) classifier.
pub fn classify(path: &str) -> LanguageTag {
    Classifier::new().classify(path)
}

fn file_name_of(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

fn extension_of(path: &str) -> Option<String> {
    let name = file_name_of(path);
    // ".gitignore" style names have an empty stem; the tail is the extension.
    let (_, ext) = name.rsplit_once('.')?;
    if ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

fn static_lookup(path: &str) -> Option<&'static str> {
    if let Some(ext) = extension_of(path) {
        if let Some((_, lang)) = EXTENSIONS.iter().find(|(e, _)| *e == ext) {
            return Some(lang);
        }
    }
    let name = file_name_of(path).to_ascii_lowercase();
    FILE_NAMES.iter().find(|(n, _)| *n == name).map(|(_, lang)| *lang)
}
