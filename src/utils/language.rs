//! Extension-based language detection.

/// Implementation languages. Files in these languages outrank everything else.
const PRIMARY_LANGUAGES: &[(&str, &[&str])] = &[
    ("python", &["py", "pyw", "pyi"]),
    ("javascript", &["js", "mjs", "cjs"]),
    ("typescript", &["ts", "mts", "cts"]),
    ("tsx", &["tsx"]),
    ("jsx", &["jsx"]),
    ("java", &["java"]),
    ("cpp", &["cpp", "cc", "cxx", "c++"]),
    ("c", &["c"]),
    ("header", &["h", "hpp", "hxx", "hh"]),
    ("csharp", &["cs"]),
    ("php", &["php"]),
    ("ruby", &["rb"]),
    ("go", &["go"]),
    ("rust", &["rs"]),
    ("swift", &["swift"]),
    ("kotlin", &["kt", "kts"]),
    ("scala", &["scala"]),
    ("dart", &["dart"]),
    ("elixir", &["ex", "exs"]),
    ("haskell", &["hs"]),
    ("lua", &["lua"]),
    ("r", &["r"]),
    ("shell", &["sh", "bash", "zsh"]),
    ("powershell", &["ps1"]),
    ("sql", &["sql"]),
    ("vue", &["vue"]),
    ("svelte", &["svelte"]),
];

/// Markup, styling, configuration and docs.
const SECONDARY_LANGUAGES: &[(&str, &[&str])] = &[
    ("html", &["html", "htm"]),
    ("css", &["css"]),
    ("scss", &["scss"]),
    ("sass", &["sass"]),
    ("less", &["less"]),
    ("json", &["json"]),
    ("yaml", &["yaml", "yml"]),
    ("toml", &["toml"]),
    ("xml", &["xml"]),
    ("ini", &["ini", "cfg", "conf"]),
    ("markdown", &["md"]),
    ("batch", &["bat", "cmd"]),
];

/// Extension-less files recognised by name
const NAMED_FILES: &[(&str, &str)] = &[
    ("dockerfile", "dockerfile"),
    ("makefile", "makefile"),
    ("rakefile", "ruby"),
    ("gemfile", "ruby"),
];

/// Detects the language tag of a repository path from its file name
///
/// Returns `None` for anything without a recognised extension.
pub fn detect_language(path: &str) -> Option<&'static str> {
    let file_name = path.rsplit('/').next().unwrap_or(path).to_lowercase();

    if let Some((_, tag)) = NAMED_FILES.iter().find(|(name, _)| *name == file_name) {
        return Some(tag);
    }

    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() {
        return None;
    }

    PRIMARY_LANGUAGES
        .iter()
        .chain(SECONDARY_LANGUAGES.iter())
        .find(|(_, exts)| exts.contains(&ext))
        .map(|(tag, _)| *tag)
}

/// Whether a language tag denotes implementation code rather than markup or config
pub fn is_primary_language(tag: &str) -> bool {
    PRIMARY_LANGUAGES.iter().any(|(name, _)| *name == tag)
        || matches!(tag, "dockerfile" | "makefile")
}
