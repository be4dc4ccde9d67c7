//! Settings resolution: built-in defaults, then the config file, then flags.
//!
//! The config file is TOML. A file in the older INI layout, with bare values
//! under a `[DEFAULT]` section, is read too.

use std::path::{Path, PathBuf};

use ini::Ini;
use serde::{Deserialize, Serialize};
use tracing::debug;

use tvnotes::notebook::{DEFAULT_EXCLUDE, DEFAULT_EXTENSIONS};

use crate::{expand_root, NotebookConfig, NotebookError};

use super::args::GlobalArgs;

const DEFAULT_EDITOR: &str = "pico";
const DEFAULT_LOG_LEVEL: &str = "warn";

/// A list given either as a TOML array or as a comma-separated string.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum StringList {
    List(Vec<String>),
    Csv(String),
}

impl StringList {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            StringList::List(items) => items
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            StringList::Csv(s) => split_list(&s),
        }
    }
}

/// Split a comma-separated list, trimming items and dropping empty ones.
pub fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

/// Contents of the config file. Every key is optional; unknown keys are ignored.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ConfigFile {
    pub notes_dir: Option<PathBuf>,
    pub editor: Option<String>,
    pub extension: Option<String>,
    pub extensions: Option<StringList>,
    pub exclude: Option<StringList>,
    pub log_file: Option<PathBuf>,
    pub log_level: Option<String>,
}

impl ConfigFile {
    /// Load the config file. A missing file yields `None`.
    pub fn load(path: &Path) -> Result<Option<ConfigFile>, NotebookError> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(None);
        }
        let content = std::fs::read_to_string(path).map_err(|e| NotebookError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::parse(path, &content).map(Some)
    }

    pub fn parse(path: &Path, content: &str) -> Result<ConfigFile, NotebookError> {
        if is_ini_layout(content) {
            return Self::parse_ini(path, content);
        }
        toml::from_str(content).map_err(|e| NotebookError::Config {
            path: path.to_path_buf(),
            message: e.to_string().trim_end().to_string(),
        })
    }

    /// Read the `[DEFAULT]` section of an INI file. Values are taken verbatim
    /// (no escapes), list keys are comma-separated, `debug = true` means
    /// debug logging.
    pub fn parse_ini(path: &Path, content: &str) -> Result<ConfigFile, NotebookError> {
        let ini = Ini::load_from_str_noescape(content).map_err(|e| NotebookError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let Some(section) = ini.section(Some(INI_SECTION)) else {
            return Ok(ConfigFile::default());
        };
        let get = |key: &str| {
            section
                .get(key)
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let debug = get("debug").is_some_and(|v| {
            matches!(v.to_lowercase().as_str(), "1" | "yes" | "true" | "on")
        });
        Ok(ConfigFile {
            notes_dir: get("notes_dir").map(PathBuf::from),
            editor: get("editor"),
            extension: get("extension"),
            extensions: get("extensions").map(StringList::Csv),
            exclude: get("exclude").map(StringList::Csv),
            log_file: get("log_file").map(PathBuf::from),
            log_level: get("log_level").or_else(|| debug.then(|| "debug".to_string())),
        })
    }
}

const INI_SECTION: &str = "DEFAULT";

/// True if the file has a `[DEFAULT]` section header.
fn is_ini_layout(content: &str) -> bool {
    content.lines().any(|line| line.trim() == "[DEFAULT]")
}

/// Fully resolved settings. Serializes back to a valid config file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settings {
    #[serde(skip)]
    pub config_file: PathBuf,
    pub notes_dir: PathBuf,
    pub editor: String,
    pub extension: String,
    pub extensions: Vec<String>,
    pub exclude: Vec<String>,
    pub log_file: PathBuf,
    pub log_level: String,
}

impl Settings {
    /// Built-in defaults. `editor_env` is the value of `$EDITOR`, if set.
    pub fn defaults(editor_env: Option<String>) -> Settings {
        Settings {
            config_file: PathBuf::from("~/.tvrc"),
            notes_dir: PathBuf::from("~/Notes"),
            editor: editor_env
                .filter(|e| !e.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_EDITOR.to_string()),
            extension: "txt".to_string(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            exclude: DEFAULT_EXCLUDE.iter().map(|s| s.to_string()).collect(),
            log_file: PathBuf::from("~/.tvlog"),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }

    /// Resolve settings for this process from `$EDITOR`, the config file and `args`.
    pub fn resolve(args: &GlobalArgs) -> Result<Settings, NotebookError> {
        let mut settings = Settings::defaults(std::env::var("EDITOR").ok());
        if let Some(path) = &args.config {
            settings.config_file = path.clone();
        }
        let path = expand_root(&settings.config_file)?;
        if let Some(file) = ConfigFile::load(&path)? {
            settings.apply_file(file);
        }
        settings.config_file = path;
        settings.apply_args(args);
        Ok(settings)
    }

    pub fn apply_file(&mut self, file: ConfigFile) {
        if let Some(v) = file.notes_dir {
            self.notes_dir = v;
        }
        if let Some(v) = file.editor {
            self.editor = v;
        }
        if let Some(v) = file.extension {
            self.extension = v;
        }
        if let Some(v) = file.extensions {
            self.extensions = v.into_vec();
        }
        if let Some(v) = file.exclude {
            self.exclude = v.into_vec();
        }
        if let Some(v) = file.log_file {
            self.log_file = v;
        }
        if let Some(v) = file.log_level {
            self.log_level = v;
        }
    }

    pub fn apply_args(&mut self, args: &GlobalArgs) {
        if let Some(v) = &args.notes_dir {
            self.notes_dir = v.clone();
        }
        if let Some(v) = &args.editor {
            self.editor = v.clone();
        }
        if let Some(v) = &args.extension {
            self.extension = v.clone();
        }
        if let Some(v) = &args.extensions {
            self.extensions = split_list(v);
        }
        if let Some(v) = &args.exclude {
            self.exclude = split_list(v);
        }
        if let Some(v) = &args.log_file {
            self.log_file = v.clone();
        }
        if let Some(v) = &args.log_level {
            self.log_level = v.clone();
        }
    }

    pub fn notebook_config(&self) -> NotebookConfig {
        NotebookConfig::new(&self.notes_dir)
            .with_default_extension(self.extension.as_str())
            .with_extensions(self.extensions.iter().map(String::as_str))
            .with_exclude(self.exclude.iter().map(String::as_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_defaults() {
        let s = Settings::defaults(None);
        assert_eq!(s.editor, "pico");
        assert_eq!(s.extension, "txt");
        assert_eq!(s.extensions, vec![".txt", ".md", ".markdown", ".rst"]);
        assert_eq!(s.exclude, vec!["src", "backup", "ignore", "tmp", "old"]);
        assert_eq!(s.notes_dir, PathBuf::from("~/Notes"));
        assert_eq!(s.log_level, "warn");
    }

    #[test]
    fn test_editor_from_environment() {
        assert_eq!(Settings::defaults(Some("vim".into())).editor, "vim");
        assert_eq!(Settings::defaults(Some("  ".into())).editor, "pico");
    }

    #[test]
    fn test_split_list() {
        assert_eq!(split_list(".txt, .md ,, .rst "), vec![".txt", ".md", ".rst"]);
        assert!(split_list("").is_empty());
        assert!(split_list(" , ").is_empty());
    }

    #[test]
    fn test_parse_full_file() {
        let content = r#"
notes_dir = "~/Documents/notes"
editor = "nvim -p"
extension = "md"
extensions = ["md", "txt"]
exclude = "archive, drafts"
log_file = "/tmp/tv.log"
log_level = "debug"
"#;
        let file = ConfigFile::parse(Path::new("tvrc"), content).unwrap();
        let mut s = Settings::defaults(None);
        s.apply_file(file);
        assert_eq!(s.notes_dir, PathBuf::from("~/Documents/notes"));
        assert_eq!(s.editor, "nvim -p");
        assert_eq!(s.extension, "md");
        assert_eq!(s.extensions, vec!["md", "txt"]);
        assert_eq!(s.exclude, vec!["archive", "drafts"]);
        assert_eq!(s.log_file, PathBuf::from("/tmp/tv.log"));
        assert_eq!(s.log_level, "debug");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let file = ConfigFile::parse(Path::new("tvrc"), "editor = \"emacs\"\nunknown = 1\n").unwrap();
        let mut s = Settings::defaults(None);
        s.apply_file(file);
        assert_eq!(s.editor, "emacs");
        assert_eq!(s.extension, "txt");
        assert_eq!(s.notes_dir, PathBuf::from("~/Notes"));
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let err = ConfigFile::parse(Path::new("bad.toml"), "editor = [unclosed").unwrap_err();
        match err {
            NotebookError::Config { path, .. } => assert_eq!(path, PathBuf::from("bad.toml")),
            other => panic!("expected Config error, got {:?}", other),
        }
        assert!(ConfigFile::parse(Path::new("x"), "extension = 3").is_err());
    }

    #[test]
    fn test_parse_ini_default_section() {
        let content = "\
[DEFAULT]
editor = vim
# The filename extension to use for new files.
extension = .md
; The filename extensions to recognize in the notes dir.
extensions = .txt, .md, .markdown, .rst
exclude = src, backup, ignore, tmp, old
notes_dir = ~/Notes
log_file = ~/.tvlog
debug = True
";
        let file = ConfigFile::parse(Path::new("~/.tvrc"), content).unwrap();
        let mut s = Settings::defaults(None);
        s.apply_file(file);
        assert_eq!(s.editor, "vim");
        assert_eq!(s.extension, ".md");
        assert_eq!(s.extensions, vec![".txt", ".md", ".markdown", ".rst"]);
        assert_eq!(s.exclude, vec!["src", "backup", "ignore", "tmp", "old"]);
        assert_eq!(s.notes_dir, PathBuf::from("~/Notes"));
        assert_eq!(s.log_level, "debug");
        assert_eq!(s.notebook_config().default_extension, ".md");
    }

    #[test]
    fn test_parse_ini_keeps_backslashes_and_defaults() {
        let content = "[DEFAULT]\nnotes_dir = C:\\Users\\me\\Notes\ndebug = false\n";
        let file = ConfigFile::parse(Path::new("tvrc"), content).unwrap();
        assert_eq!(file.notes_dir, Some(PathBuf::from(r"C:\Users\me\Notes")));
        assert!(file.log_level.is_none());
        assert!(file.editor.is_none());
    }

    #[test]
    fn test_ini_without_default_section_is_empty() {
        let file = ConfigFile::parse_ini(Path::new("tvrc"), "[other]\neditor = vim\n").unwrap();
        assert_eq!(file, ConfigFile::default());
    }

    #[test]
    fn test_load_ini_file_from_disk() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(".tvrc");
        fs::write(&path, "[DEFAULT]\neditor = nano\nextension = .rst\n").unwrap();
        let file = ConfigFile::load(&path).unwrap().unwrap();
        assert_eq!(file.editor.as_deref(), Some("nano"));
        assert_eq!(file.extension.as_deref(), Some(".rst"));
    }

    #[test]
    fn test_load_missing_file_is_none() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(ConfigFile::load(&tmp.path().join("absent")).unwrap().is_none());
    }

    #[test]
    fn test_load_existing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("tvrc");
        fs::write(&path, "extension = \"rst\"\n").unwrap();
        let file = ConfigFile::load(&path).unwrap().unwrap();
        assert_eq!(file.extension.as_deref(), Some("rst"));
    }

    #[test]
    fn test_flags_override_file() {
        let mut s = Settings::defaults(None);
        s.apply_file(ConfigFile {
            editor: Some("emacs".into()),
            extension: Some("md".into()),
            ..Default::default()
        });
        let args = GlobalArgs {
            editor: Some("vi".into()),
            exclude: Some("a,b".into()),
            notes_dir: Some(PathBuf::from("/srv/notes")),
            ..Default::default()
        };
        s.apply_args(&args);
        assert_eq!(s.editor, "vi");
        assert_eq!(s.extension, "md");
        assert_eq!(s.exclude, vec!["a", "b"]);
        assert_eq!(s.notes_dir, PathBuf::from("/srv/notes"));
    }

    #[test]
    fn test_resolve_reads_explicit_config() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("custom.toml");
        fs::write(&path, "log_level = \"trace\"\n").unwrap();
        let args = GlobalArgs {
            config: Some(path.clone()),
            log_level: None,
            ..Default::default()
        };
        let s = Settings::resolve(&args).unwrap();
        assert_eq!(s.log_level, "trace");
        assert_eq!(s.config_file, path);
    }

    #[test]
    fn test_notebook_config_conversion() {
        let mut s = Settings::defaults(None);
        s.extension = "md".into();
        s.exclude = vec!["junk".into()];
        let config = s.notebook_config();
        assert_eq!(config.root, PathBuf::from("~/Notes"));
        assert_eq!(config.default_extension, "md");
        assert_eq!(config.exclude, vec!["junk"]);
        assert_eq!(config.extensions.len(), 4);
    }

    #[test]
    fn test_settings_serialize_as_config_file() {
        let s = Settings::defaults(Some("vim".into()));
        let text = toml::to_string(&s).unwrap();
        assert!(!text.contains("config_file"));
        let back = ConfigFile::parse(Path::new("roundtrip"), &text).unwrap();
        assert_eq!(back.editor.as_deref(), Some("vim"));
    }
}
