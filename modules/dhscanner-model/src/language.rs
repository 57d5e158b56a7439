use serde::{Deserialize, Serialize};

/// The closed set of languages this pipeline understands. `All` and `Unknown`
/// are not real source languages — `All` tags cross-language artifacts (the
/// knowledge base), `Unknown` tags a file whose suffix matched nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "js")]
    Js,
    #[serde(rename = "ts")]
    Ts,
    #[serde(rename = "tsx")]
    Tsx,
    #[serde(rename = "php")]
    Php,
    #[serde(rename = "py")]
    Py,
    #[serde(rename = "rb")]
    Rb,
    #[serde(rename = "cs")]
    Cs,
    #[serde(rename = "go")]
    Go,
    #[serde(rename = "blade.php")]
    BladePhp,
    #[serde(rename = "ALL")]
    All,
    #[serde(rename = "UNKNOWN")]
    Unknown,
}

impl Language {
    /// The exact wire string this language is known by (matches the raw
    /// suffix text, not a Rust identifier).
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Js => "js",
            Language::Ts => "ts",
            Language::Tsx => "tsx",
            Language::Php => "php",
            Language::Py => "py",
            Language::Rb => "rb",
            Language::Cs => "cs",
            Language::Go => "go",
            Language::BladePhp => "blade.php",
            Language::All => "ALL",
            Language::Unknown => "UNKNOWN",
        }
    }

    pub fn from_raw_str(raw: &str) -> Option<Language> {
        match raw {
            "js" => Some(Language::Js),
            "ts" => Some(Language::Ts),
            "tsx" => Some(Language::Tsx),
            "php" => Some(Language::Php),
            "py" => Some(Language::Py),
            "rb" => Some(Language::Rb),
            "cs" => Some(Language::Cs),
            "go" => Some(Language::Go),
            "blade.php" => Some(Language::BladePhp),
            "ALL" => Some(Language::All),
            "UNKNOWN" => Some(Language::Unknown),
            _ => None,
        }
    }

    /// Infer a language from a filename by trying progressively shorter
    /// dot-suffix chains, longest first — so `foo.blade.php` matches
    /// `blade.php` before falling back to `php`.
    pub fn from_filename(filename: &str) -> Option<Language> {
        let name = filename.rsplit('/').next().unwrap_or(filename);
        let mut parts: Vec<&str> = name.split('.').collect();
        if parts.len() < 2 {
            return None;
        }
        // parts[0] is the stem; every remaining element is one suffix.
        while parts.len() > 1 {
            parts.remove(0);
            let candidate = parts.join(".");
            if let Some(lang) = Language::from_raw_str(&candidate) {
                return Some(lang);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_php_suffix() {
        assert_eq!(Language::from_filename("index.php"), Some(Language::Php));
    }

    #[test]
    fn blade_php_beats_plain_php() {
        assert_eq!(Language::from_filename("view.blade.php"), Some(Language::BladePhp));
    }

    #[test]
    fn tsx_suffix() {
        assert_eq!(Language::from_filename("App.tsx"), Some(Language::Tsx));
    }

    #[test]
    fn unknown_extension_is_none() {
        assert_eq!(Language::from_filename("README.md"), None);
    }

    #[test]
    fn no_extension_is_none() {
        assert_eq!(Language::from_filename("Makefile"), None);
    }

    #[test]
    fn path_prefix_is_ignored() {
        assert_eq!(Language::from_filename("src/app/view.blade.php"), Some(Language::BladePhp));
    }

    #[test]
    fn round_trips_through_as_str() {
        for lang in [
            Language::Js, Language::Ts, Language::Tsx, Language::Php, Language::Py,
            Language::Rb, Language::Cs, Language::Go, Language::BladePhp,
        ] {
            assert_eq!(Language::from_raw_str(lang.as_str()), Some(lang));
        }
    }
}
