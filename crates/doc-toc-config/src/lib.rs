//! Configuration primitives and loader for the doc-toc toolkit.
//!
//! The loader resolves configuration using a fixed precedence stack:
//! override flag → working directory → git root → built-in defaults.
//! Parsed settings are normalised into typed structures so downstream crates
//! can operate without touching raw TOML.

use std::env;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use doc_toc_dom::Selector;
use globset::Glob;
use serde::Deserialize;
use thiserror::Error;

const CONFIG_FILE_NAME: &str = ".doc-toc.toml";

const DEFAULT_CONTENT_SELECTOR: &str = "[data-content]";
const DEFAULT_TOC_SELECTOR: &str = "[data-toc]";
const DEFAULT_RANKS: &[&str] = &["h2", "h3"];
const DEFAULT_LIST_CLASS: &str = "nav flex-column nav--page ps-2 small";
const DEFAULT_ITEM_CLASSES: &[&str] = &["nav-item", "nav-item ps-3"];
const DEFAULT_ANCHOR_STYLE: &str = "transform: translateY(-3rem)";
const DEFAULT_GLYPH_CLASS: &str = "anchor-icon fa fa-link-simple";
const DEFAULT_LINK_CLASS: &str = "heading-link";
const HEADING_TAGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];

/// Complete configuration resolved from defaults and on-disk overrides.
#[derive(Clone, Debug)]
pub struct Config {
    pub project: ProjectSettings,
    pub toc: TocSettings,
    pub sources: ConfigSources,
}

/// Project-level settings that declare which pages are processed.
#[derive(Clone, Debug)]
pub struct ProjectSettings {
    pub name: Option<String>,
    pub root: PathBuf,
    pub include: PatternList,
    pub exclude: PatternList,
}

/// Everything the TOC builder needs to plan and inject a table of contents.
#[derive(Clone, Debug)]
pub struct TocSettings {
    /// Region scanned for headings.
    pub content: Selector,
    /// Region that receives the generated navigation list.
    pub destination: Selector,
    /// Heading tags in rank order; index 0 is the major rank.
    pub ranks: Vec<String>,
    pub duplicates: DuplicatePolicy,
    pub reentry: ReentryPolicy,
    pub render: RenderSettings,
}

impl TocSettings {
    /// Rank of a heading tag, or `None` when the tag is not tracked.
    pub fn rank_of(&self, tag: &str) -> Option<usize> {
        self.ranks.iter().position(|candidate| candidate == tag)
    }
}

impl Default for TocSettings {
    fn default() -> Self {
        TocSettings {
            content: builtin_selector(DEFAULT_CONTENT_SELECTOR),
            destination: builtin_selector(DEFAULT_TOC_SELECTOR),
            ranks: DEFAULT_RANKS.iter().map(|tag| tag.to_string()).collect(),
            duplicates: DuplicatePolicy::Allow,
            reentry: ReentryPolicy::Repeat,
            render: RenderSettings::default(),
        }
    }
}

/// Markup details for injected anchors, glyphs, links and list entries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderSettings {
    pub list_class: String,
    pub item_classes: Vec<String>,
    pub anchor_style: String,
    pub glyph_class: String,
    pub link_class: String,
}

impl RenderSettings {
    /// Class for a navigation entry of the given rank; deeper ranks reuse the last class.
    pub fn item_class(&self, rank: usize) -> &str {
        self.item_classes
            .get(rank)
            .or_else(|| self.item_classes.last())
            .map(String::as_str)
            .unwrap_or("")
    }
}

impl Default for RenderSettings {
    fn default() -> Self {
        RenderSettings {
            list_class: DEFAULT_LIST_CLASS.to_string(),
            item_classes: DEFAULT_ITEM_CLASSES
                .iter()
                .map(|class| class.to_string())
                .collect(),
            anchor_style: DEFAULT_ANCHOR_STYLE.to_string(),
            glyph_class: DEFAULT_GLYPH_CLASS.to_string(),
            link_class: DEFAULT_LINK_CLASS.to_string(),
        }
    }
}

fn builtin_selector(source: &str) -> Selector {
    Selector::parse(source).unwrap_or_else(|err| panic!("built-in selector '{source}': {err}"))
}

/// How headings whose slugs collide are treated.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum DuplicatePolicy {
    /// Keep colliding slugs as they are.
    Allow,
    /// Append `-1`, `-2`, ... to later occurrences.
    Suffix,
}

impl DuplicatePolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            DuplicatePolicy::Allow => "allow",
            DuplicatePolicy::Suffix => "suffix",
        }
    }
}

impl fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DuplicatePolicy {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "allow" => Ok(DuplicatePolicy::Allow),
            "suffix" => Ok(DuplicatePolicy::Suffix),
            _ => Err(()),
        }
    }
}

/// What happens when the builder runs against an already processed page.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ReentryPolicy {
    /// Process every heading again, duplicating anchors and entries.
    Repeat,
    /// Leave headings that already carry an anchor alone.
    Skip,
}

impl ReentryPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            ReentryPolicy::Repeat => "repeat",
            ReentryPolicy::Skip => "skip",
        }
    }
}

impl fmt::Display for ReentryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ReentryPolicy {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "repeat" => Ok(ReentryPolicy::Repeat),
            "skip" => Ok(ReentryPolicy::Skip),
            _ => Err(()),
        }
    }
}

/// Pattern plus compiled matcher helper.
#[derive(Clone, Debug)]
pub struct Pattern {
    original: String,
    glob: Glob,
}

impl Pattern {
    fn new(source: ConfigSource, value: String) -> Result<Self, ConfigValidationError> {
        match Glob::new(&value) {
            Ok(glob) => Ok(Pattern {
                original: value,
                glob,
            }),
            Err(err) => Err(ConfigValidationError::new(
                Some(source),
                format!("invalid glob pattern '{value}': {err}"),
            )),
        }
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn glob(&self) -> &Glob {
        &self.glob
    }
}

/// Ordered list of glob patterns.
#[derive(Clone, Debug, Default)]
pub struct PatternList {
    patterns: Vec<Pattern>,
}

impl PatternList {
    fn new(patterns: Vec<Pattern>) -> Self {
        PatternList { patterns }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pattern> {
        self.patterns.iter()
    }
}

/// Provenance information for resolved configuration.
#[derive(Clone, Debug)]
pub struct ConfigSources {
    pub working_directory: PathBuf,
    pub layers: Vec<ConfigSource>,
}

/// Specific layer of configuration (default/git/local/override).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConfigSource {
    pub kind: ConfigSourceKind,
    pub path: Option<PathBuf>,
    pub base_dir: PathBuf,
}

impl ConfigSource {
    fn default(base_dir: PathBuf) -> Self {
        ConfigSource {
            kind: ConfigSourceKind::Default,
            path: None,
            base_dir,
        }
    }

    fn for_file(kind: ConfigSourceKind, path: PathBuf) -> Self {
        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        ConfigSource {
            kind,
            path: Some(path),
            base_dir,
        }
    }

    fn describe(&self) -> String {
        match (&self.kind, &self.path) {
            (ConfigSourceKind::Default, _) => "built-in defaults".to_owned(),
            (kind, Some(path)) => format!("{} at {}", kind, path.display()),
            (kind, None) => kind.to_string(),
        }
    }
}

/// Kinds of configuration sources, ordered from lowest to highest precedence.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConfigSourceKind {
    Default,
    GitRoot,
    Local,
    Override,
}

impl fmt::Display for ConfigSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConfigSourceKind::Default => "defaults",
            ConfigSourceKind::GitRoot => "git-root config",
            ConfigSourceKind::Local => "local config",
            ConfigSourceKind::Override => "override config",
        };
        f.write_str(label)
    }
}

/// Loader options, typically supplied by the CLI layer.
#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub override_path: Option<PathBuf>,
    pub working_dir: Option<PathBuf>,
}

impl LoadOptions {
    pub fn with_override_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.override_path = Some(path.into());
        self
    }

    pub fn with_working_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(path.into());
        self
    }
}

/// Errors surfaced while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to resolve working directory {attempted}: {source}")]
    WorkingDirectory {
        attempted: PathBuf,
        source: io::Error,
    },
    #[error("override config {path} not found")]
    OverrideNotFound { path: PathBuf },
    #[error("failed to read config {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("configuration validation failed:\n{0}")]
    Validation(ConfigValidationErrors),
}

impl Config {
    /// Loads configuration using the precedence rules and returns typed settings.
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let working_dir = resolve_working_dir(options.working_dir)?;
        let override_path = options
            .override_path
            .map(|path| make_absolute(&path, &working_dir));

        if let Some(path) = &override_path {
            if !path.exists() {
                return Err(ConfigError::OverrideNotFound { path: path.clone() });
            }
        }

        let default_source = ConfigSource::default(working_dir.clone());
        let mut merged = PartialConfig::default();
        merged.merge(defaults_layer(default_source.clone()));

        let mut source_layers = vec![default_source];

        let git_root = find_git_root(&working_dir);
        let git_config_path = git_root.as_ref().map(|root| root.join(CONFIG_FILE_NAME));
        let local_config_path = working_dir.join(CONFIG_FILE_NAME);

        if let Some(path) = git_config_path.as_ref() {
            if path.exists() && Some(path) != override_path.as_ref() && path != &local_config_path {
                let source = ConfigSource::for_file(ConfigSourceKind::GitRoot, path.clone());
                merged.merge(load_layer(path, source.clone())?);
                source_layers.push(source);
            }
        }

        if local_config_path.exists() && Some(&local_config_path) != override_path.as_ref() {
            let source = ConfigSource::for_file(ConfigSourceKind::Local, local_config_path.clone());
            merged.merge(load_layer(&local_config_path, source.clone())?);
            source_layers.push(source);
        }

        if let Some(path) = override_path {
            let source = ConfigSource::for_file(ConfigSourceKind::Override, path.clone());
            merged.merge(load_layer(&path, source.clone())?);
            source_layers.push(source);
        }

        let config = merged.finalize().map_err(ConfigError::Validation)?;
        Ok(Config {
            project: config.project,
            toc: config.toc,
            sources: ConfigSources {
                working_directory: working_dir,
                layers: source_layers,
            },
        })
    }

    /// Parse a single TOML document on top of the built-in defaults, without
    /// consulting the filesystem for further layers.
    pub fn from_toml_str(
        contents: &str,
        working_dir: impl Into<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let working_dir = working_dir.into();
        let default_source = ConfigSource::default(working_dir.clone());
        let inline_source = ConfigSource {
            kind: ConfigSourceKind::Override,
            path: None,
            base_dir: working_dir.clone(),
        };

        let mut merged = PartialConfig::default();
        merged.merge(defaults_layer(default_source.clone()));
        let layer = parse_layer(contents, inline_source.clone()).map_err(|err| match err {
            LayerParseError::Parse { source } => ConfigError::Parse {
                path: PathBuf::from("<inline>"),
                source,
            },
        })?;
        merged.merge(layer);

        let config = merged.finalize().map_err(ConfigError::Validation)?;
        Ok(Config {
            project: config.project,
            toc: config.toc,
            sources: ConfigSources {
                working_directory: working_dir,
                layers: vec![default_source, inline_source],
            },
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::load(LoadOptions::default()).unwrap_or_else(|err| {
            panic!("failed to load doc-toc defaults: {err}");
        })
    }
}

fn resolve_working_dir(override_dir: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
    match override_dir {
        Some(path) => fs::canonicalize(&path).map_err(|source| ConfigError::WorkingDirectory {
            attempted: path,
            source,
        }),
        None => env::current_dir().map_err(|source| ConfigError::WorkingDirectory {
            attempted: PathBuf::from("."),
            source,
        }),
    }
}

fn make_absolute(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn load_layer(path: &Path, source: ConfigSource) -> Result<PartialConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.into(),
        source,
    })?;
    parse_layer(&contents, source).map_err(|err| match err {
        LayerParseError::Parse { source } => ConfigError::Parse {
            path: path.into(),
            source,
        },
    })
}

fn parse_layer(contents: &str, source: ConfigSource) -> Result<PartialConfig, LayerParseError> {
    let raw: RawConfig =
        toml::from_str(contents).map_err(|source| LayerParseError::Parse { source })?;
    Ok(raw.into_partial(source))
}

fn defaults_layer(source: ConfigSource) -> PartialConfig {
    let project = ProjectPartial {
        root: Some(Located::new(PathBuf::from("."), source.clone())),
        include: Some(Located::new(vec!["**/*.html".into()], source.clone())),
        exclude: Some(Located::new(
            vec!["**/node_modules/**".into(), "**/vendor/**".into()],
            source.clone(),
        )),
        ..ProjectPartial::default()
    };

    let toc = TocPartial {
        content: Some(Located::new(DEFAULT_CONTENT_SELECTOR.into(), source.clone())),
        destination: Some(Located::new(DEFAULT_TOC_SELECTOR.into(), source.clone())),
        ranks: Some(Located::new(
            DEFAULT_RANKS.iter().map(|tag| tag.to_string()).collect(),
            source.clone(),
        )),
        duplicates: Some(Located::new("allow".into(), source.clone())),
        reentry: Some(Located::new("repeat".into(), source.clone())),
        list_class: Some(Located::new(DEFAULT_LIST_CLASS.into(), source.clone())),
        item_classes: Some(Located::new(
            DEFAULT_ITEM_CLASSES
                .iter()
                .map(|class| class.to_string())
                .collect(),
            source.clone(),
        )),
        anchor_style: Some(Located::new(DEFAULT_ANCHOR_STYLE.into(), source.clone())),
        glyph_class: Some(Located::new(DEFAULT_GLYPH_CLASS.into(), source.clone())),
        link_class: Some(Located::new(DEFAULT_LINK_CLASS.into(), source)),
    };

    PartialConfig {
        project: Some(project),
        toc: Some(toc),
    }
}

fn find_git_root(start: &Path) -> Option<PathBuf> {
    let mut current = Some(start);
    while let Some(dir) = current {
        if dir.join(".git").exists() {
            return Some(dir.to_path_buf());
        }
        current = dir.parent();
    }
    None
}

#[derive(Debug)]
enum LayerParseError {
    Parse { source: toml::de::Error },
}

#[derive(Clone, Debug, Default)]
struct PartialConfig {
    project: Option<ProjectPartial>,
    toc: Option<TocPartial>,
}

impl PartialConfig {
    fn merge(&mut self, mut other: PartialConfig) {
        if let Some(other_project) = other.project.take() {
            match &mut self.project {
                Some(project) => project.merge(other_project),
                None => self.project = Some(other_project),
            }
        }

        if let Some(other_toc) = other.toc.take() {
            match &mut self.toc {
                Some(toc) => toc.merge(other_toc),
                None => self.toc = Some(other_toc),
            }
        }
    }

    fn finalize(self) -> Result<ResolvedConfig, ConfigValidationErrors> {
        let mut errors = Vec::new();
        let fallback = || ConfigSource::default(PathBuf::from("."));

        let project_partial = self.project.unwrap_or_default();
        let project_root_loc = project_partial
            .root
            .unwrap_or_else(|| Located::new(PathBuf::from("."), fallback()));
        let project_root = resolve_path(&project_root_loc);
        let include_patterns = compile_patterns(
            project_partial.include.unwrap_or_default(),
            "project.include",
            &mut errors,
        );
        let exclude_patterns = compile_patterns(
            project_partial.exclude.unwrap_or_default(),
            "project.exclude",
            &mut errors,
        );

        let toc_partial = self.toc.unwrap_or_default();

        let content = parse_selector(
            toc_partial
                .content
                .unwrap_or_else(|| Located::new(DEFAULT_CONTENT_SELECTOR.into(), fallback())),
            "document.content",
            &mut errors,
        );
        let destination = parse_selector(
            toc_partial
                .destination
                .unwrap_or_else(|| Located::new(DEFAULT_TOC_SELECTOR.into(), fallback())),
            "document.toc",
            &mut errors,
        );

        let ranks = parse_ranks(
            toc_partial.ranks.unwrap_or_else(|| {
                Located::new(
                    DEFAULT_RANKS.iter().map(|tag| tag.to_string()).collect(),
                    fallback(),
                )
            }),
            &mut errors,
        );

        let duplicates = parse_policy::<DuplicatePolicy>(
            toc_partial
                .duplicates
                .unwrap_or_else(|| Located::new("allow".into(), fallback())),
            "slug.duplicates",
            "'allow' or 'suffix'",
            &mut errors,
        )
        .unwrap_or(DuplicatePolicy::Allow);

        let reentry = parse_policy::<ReentryPolicy>(
            toc_partial
                .reentry
                .unwrap_or_else(|| Located::new("repeat".into(), fallback())),
            "build.reentry",
            "'repeat' or 'skip'",
            &mut errors,
        )
        .unwrap_or(ReentryPolicy::Repeat);

        let item_classes = toc_partial.item_classes.unwrap_or_else(|| {
            Located::new(
                DEFAULT_ITEM_CLASSES
                    .iter()
                    .map(|class| class.to_string())
                    .collect(),
                fallback(),
            )
        });
        if item_classes.value.is_empty() {
            errors.push(ConfigValidationError::new(
                Some(item_classes.source.clone()),
                "render.item_classes must contain at least one class list".into(),
            ));
        }

        let defaults = RenderSettings::default();
        let render = RenderSettings {
            list_class: toc_partial
                .list_class
                .map(|located| located.value)
                .unwrap_or(defaults.list_class),
            item_classes: item_classes.value,
            anchor_style: toc_partial
                .anchor_style
                .map(|located| located.value)
                .unwrap_or(defaults.anchor_style),
            glyph_class: toc_partial
                .glyph_class
                .map(|located| located.value)
                .unwrap_or(defaults.glyph_class),
            link_class: toc_partial
                .link_class
                .map(|located| located.value)
                .unwrap_or(defaults.link_class),
        };

        if !errors.is_empty() {
            return Err(ConfigValidationErrors(errors));
        }

        let (Some(content), Some(destination)) = (content, destination) else {
            return Err(ConfigValidationErrors(vec![ConfigValidationError::new(
                None,
                "document selectors could not be resolved".into(),
            )]));
        };

        Ok(ResolvedConfig {
            project: ProjectSettings {
                name: project_partial.name.map(|name| name.value),
                root: project_root,
                include: PatternList::new(include_patterns),
                exclude: PatternList::new(exclude_patterns),
            },
            toc: TocSettings {
                content,
                destination,
                ranks,
                duplicates,
                reentry,
                render,
            },
        })
    }
}

#[derive(Clone, Debug, Default)]
struct ProjectPartial {
    name: Option<Located<String>>,
    root: Option<Located<PathBuf>>,
    include: Option<Located<Vec<String>>>,
    exclude: Option<Located<Vec<String>>>,
}

impl ProjectPartial {
    fn merge(&mut self, other: ProjectPartial) {
        if other.name.is_some() {
            self.name = other.name;
        }
        if other.root.is_some() {
            self.root = other.root;
        }
        if other.include.is_some() {
            self.include = other.include;
        }
        if other.exclude.is_some() {
            self.exclude = other.exclude;
        }
    }
}

#[derive(Clone, Debug, Default)]
struct TocPartial {
    content: Option<Located<String>>,
    destination: Option<Located<String>>,
    ranks: Option<Located<Vec<String>>>,
    duplicates: Option<Located<String>>,
    reentry: Option<Located<String>>,
    list_class: Option<Located<String>>,
    item_classes: Option<Located<Vec<String>>>,
    anchor_style: Option<Located<String>>,
    glyph_class: Option<Located<String>>,
    link_class: Option<Located<String>>,
}

impl TocPartial {
    fn merge(&mut self, other: TocPartial) {
        if other.content.is_some() {
            self.content = other.content;
        }
        if other.destination.is_some() {
            self.destination = other.destination;
        }
        if other.ranks.is_some() {
            self.ranks = other.ranks;
        }
        if other.duplicates.is_some() {
            self.duplicates = other.duplicates;
        }
        if other.reentry.is_some() {
            self.reentry = other.reentry;
        }
        if other.list_class.is_some() {
            self.list_class = other.list_class;
        }
        if other.item_classes.is_some() {
            self.item_classes = other.item_classes;
        }
        if other.anchor_style.is_some() {
            self.anchor_style = other.anchor_style;
        }
        if other.glyph_class.is_some() {
            self.glyph_class = other.glyph_class;
        }
        if other.link_class.is_some() {
            self.link_class = other.link_class;
        }
    }
}

#[derive(Clone, Debug)]
struct Located<T> {
    value: T,
    source: ConfigSource,
}

impl<T> Located<T> {
    fn new(value: T, source: ConfigSource) -> Self {
        Located { value, source }
    }
}

impl Default for Located<Vec<String>> {
    fn default() -> Self {
        Located::new(Vec::new(), ConfigSource::default(PathBuf::from(".")))
    }
}

fn resolve_path(located: &Located<PathBuf>) -> PathBuf {
    let path = &located.value;
    if path.is_absolute() {
        path.clone()
    } else {
        located.source.base_dir.join(path)
    }
}

fn compile_patterns(
    located: Located<Vec<String>>,
    context: &str,
    errors: &mut Vec<ConfigValidationError>,
) -> Vec<Pattern> {
    let mut patterns = Vec::new();
    for pattern in located.value {
        match Pattern::new(located.source.clone(), pattern.clone()) {
            Ok(compiled) => patterns.push(compiled),
            Err(err) => errors.push(err.with_context(context)),
        }
    }
    patterns
}

fn parse_selector(
    located: Located<String>,
    context: &str,
    errors: &mut Vec<ConfigValidationError>,
) -> Option<Selector> {
    match Selector::parse(&located.value) {
        Ok(selector) => Some(selector),
        Err(err) => {
            errors.push(
                ConfigValidationError::new(Some(located.source), err.to_string())
                    .with_context(context),
            );
            None
        }
    }
}

fn parse_ranks(
    located: Located<Vec<String>>,
    errors: &mut Vec<ConfigValidationError>,
) -> Vec<String> {
    if located.value.is_empty() {
        errors.push(
            ConfigValidationError::new(
                Some(located.source.clone()),
                "at least one heading tag is required".into(),
            )
            .with_context("headings.ranks"),
        );
        return Vec::new();
    }

    let mut ranks: Vec<String> = Vec::new();
    for tag in located.value {
        let normalized = tag.trim().to_ascii_lowercase();
        if !HEADING_TAGS.contains(&normalized.as_str()) {
            errors.push(
                ConfigValidationError::new(
                    Some(located.source.clone()),
                    format!("'{tag}' is not a heading tag (expected h1-h6)"),
                )
                .with_context("headings.ranks"),
            );
            continue;
        }
        if ranks.contains(&normalized) {
            errors.push(
                ConfigValidationError::new(
                    Some(located.source.clone()),
                    format!("heading tag '{normalized}' listed more than once"),
                )
                .with_context("headings.ranks"),
            );
            continue;
        }
        ranks.push(normalized);
    }
    ranks
}

fn parse_policy<P: std::str::FromStr>(
    located: Located<String>,
    context: &str,
    expected: &str,
    errors: &mut Vec<ConfigValidationError>,
) -> Option<P> {
    match located.value.parse::<P>() {
        Ok(policy) => Some(policy),
        Err(_) => {
            errors.push(
                ConfigValidationError::new(
                    Some(located.source),
                    format!("unknown policy '{}' (expected {expected})", located.value),
                )
                .with_context(context),
            );
            None
        }
    }
}

#[derive(Clone, Debug)]
struct ResolvedConfig {
    project: ProjectSettings,
    toc: TocSettings,
}

/// Container for validation failures, formatted as a bullet list.
#[derive(Debug)]
pub struct ConfigValidationErrors(pub Vec<ConfigValidationError>);

impl fmt::Display for ConfigValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, err) in self.0.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "- {err}")?;
        }
        Ok(())
    }
}

impl ConfigValidationErrors {
    pub fn iter(&self) -> impl Iterator<Item = &ConfigValidationError> {
        self.0.iter()
    }
}

/// Validation failure with optional provenance.
#[derive(Clone, Debug)]
pub struct ConfigValidationError {
    pub source: Option<ConfigSource>,
    pub message: String,
    pub context: Option<String>,
}

impl ConfigValidationError {
    fn new(source: Option<ConfigSource>, message: String) -> Self {
        ConfigValidationError {
            source,
            message,
            context: None,
        }
    }

    fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(context) = &self.context {
            write!(f, "{}: {}", context, self.message)?;
        } else {
            write!(f, "{}", self.message)?;
        }
        if let Some(source) = &self.source {
            write!(f, " ({})", source.describe())?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    project: Option<RawProject>,
    #[serde(default)]
    document: Option<RawDocument>,
    #[serde(default)]
    headings: Option<RawHeadings>,
    #[serde(default)]
    slug: Option<RawSlug>,
    #[serde(default)]
    build: Option<RawBuild>,
    #[serde(default)]
    render: Option<RawRender>,
}

impl RawConfig {
    fn into_partial(self, source: ConfigSource) -> PartialConfig {
        let locate = |value: Option<String>| value.map(|value| Located::new(value, source.clone()));

        let mut toc = TocPartial::default();
        if let Some(document) = self.document {
            toc.content = locate(document.content);
            toc.destination = locate(document.toc);
        }
        if let Some(headings) = self.headings {
            toc.ranks = headings
                .ranks
                .map(|value| Located::new(value, source.clone()));
        }
        if let Some(slug) = self.slug {
            toc.duplicates = locate(slug.duplicates);
        }
        if let Some(build) = self.build {
            toc.reentry = locate(build.reentry);
        }
        if let Some(render) = self.render {
            toc.list_class = locate(render.list_class);
            toc.item_classes = render
                .item_classes
                .map(|value| Located::new(value, source.clone()));
            toc.anchor_style = locate(render.anchor_style);
            toc.glyph_class = locate(render.glyph_class);
            toc.link_class = locate(render.link_class);
        }

        PartialConfig {
            project: self
                .project
                .map(|project| project.into_partial(source.clone())),
            toc: Some(toc),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawProject {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    root: Option<PathBuf>,
    #[serde(default)]
    include: Option<Vec<String>>,
    #[serde(default)]
    exclude: Option<Vec<String>>,
}

impl RawProject {
    fn into_partial(self, source: ConfigSource) -> ProjectPartial {
        ProjectPartial {
            name: self.name.map(|value| Located::new(value, source.clone())),
            root: self.root.map(|value| Located::new(value, source.clone())),
            include: self
                .include
                .map(|value| Located::new(value, source.clone())),
            exclude: self.exclude.map(|value| Located::new(value, source)),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDocument {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    toc: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawHeadings {
    #[serde(default)]
    ranks: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSlug {
    #[serde(default)]
    duplicates: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawBuild {
    #[serde(default)]
    reentry: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRender {
    #[serde(default)]
    list_class: Option<String>,
    #[serde(default)]
    item_classes: Option<Vec<String>>,
    #[serde(default)]
    anchor_style: Option<String>,
    #[serde(default)]
    glyph_class: Option<String>,
    #[serde(default)]
    link_class: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_class_falls_back_to_deepest_rank() {
        let render = RenderSettings::default();
        assert_eq!(render.item_class(0), "nav-item");
        assert_eq!(render.item_class(1), "nav-item ps-3");
        assert_eq!(render.item_class(4), "nav-item ps-3");
    }

    #[test]
    fn rank_of_follows_configured_order() {
        let settings = TocSettings::default();
        assert_eq!(settings.rank_of("h2"), Some(0));
        assert_eq!(settings.rank_of("h3"), Some(1));
        assert_eq!(settings.rank_of("h4"), None);
    }

    #[test]
    fn inline_layer_overrides_defaults() {
        let config = Config::from_toml_str(
            r#"
            [headings]
            ranks = ["H1", "h2"]

            [slug]
            duplicates = "suffix"
            "#,
            "/srv/site",
        )
        .expect("inline config");

        assert_eq!(config.toc.ranks, vec!["h1".to_string(), "h2".to_string()]);
        assert_eq!(config.toc.duplicates, DuplicatePolicy::Suffix);
        assert_eq!(config.toc.reentry, ReentryPolicy::Repeat);
        assert_eq!(config.project.root, PathBuf::from("/srv/site/."));
    }

    #[test]
    fn unknown_policy_is_reported_with_context() {
        let err = Config::from_toml_str("[build]\nreentry = \"once\"\n", "/srv/site")
            .expect_err("invalid policy");
        let message = err.to_string();
        assert!(message.contains("build.reentry: unknown policy 'once'"), "{message}");
    }
}
