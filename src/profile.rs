use crate::model::{AvailabilityState, FeeClass};
use anyhow::{Context, Result, bail};
use regex::Regex;
use scraper::Selector;
use serde::Deserialize;
use std::path::Path;
use walkdir::WalkDir;

/// Declarative per-site extraction bundle. Immutable after load; a new site
/// is supported by authoring one of these, not by branching engine logic.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteProfile {
    pub site: SiteMeta,
    pub matcher: UrlMatcher,
    pub fields: FieldTable,
    pub when: WhenRule,
    #[serde(default)]
    pub date: DateRule,
    #[serde(default)]
    pub venue: VenueRules,
    pub fee: FeeRule,
    #[serde(default)]
    pub availability: Vec<IndicatorCheck>,
    #[serde(default)]
    pub banner: Option<BannerRule>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SiteMeta {
    pub key: String,
    pub name: String,
    /// Timezone the site reports date/time in. Consulted when a date line
    /// omits the year; never used for hour-offset arithmetic.
    #[serde(default)]
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UrlMatcher {
    pub hosts: Vec<String>,
    /// Full-URL pattern applied after canonicalization.
    pub pattern: String,
    /// Human-readable accepted format, quoted verbatim in boundary errors.
    pub expected: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldTable {
    pub title: FieldSpec,
    pub host: FieldSpec,
}

/// Ordered fallback chain for one field. The first strategy whose selector
/// resolves wins, even if its text is empty.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldSpec {
    pub strategies: Vec<StrategySpec>,
    #[serde(default)]
    pub required: bool,
    #[serde(default = "default_true")]
    pub trim: bool,
    #[serde(default)]
    pub first_line: bool,
    #[serde(default)]
    pub regex: Option<String>,
    #[serde(default = "default_capture")]
    pub capture: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StrategySpec {
    pub selector: String,
    #[serde(default)]
    pub attr: Option<String>,
}

/// How the date/time block is laid out on the page: one element holding a
/// two-line block, or separate date and time elements.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "layout", rename_all = "snake_case")]
pub enum WhenRule {
    Combined { spec: FieldSpec },
    Split { date: FieldSpec, time: FieldSpec },
}

#[derive(Debug, Clone, Deserialize)]
pub struct DateRule {
    #[serde(default = "default_date_formats")]
    pub formats: Vec<String>,
    /// Resolve a year-less date line against the current year in the site's
    /// declared timezone.
    #[serde(default = "default_true")]
    pub infer_year: bool,
}

impl Default for DateRule {
    fn default() -> Self {
        Self {
            formats: default_date_formats(),
            infer_year: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct VenueRules {
    #[serde(default)]
    pub rules: Vec<VenueRule>,
    #[serde(default)]
    pub fallback: VenueFallback,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VenueRule {
    pub selector: String,
    pub kind: VenueKind,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VenueKind {
    Physical,
    Online,
    Hidden,
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VenueFallback {
    #[default]
    Unknown,
    Hidden,
}

/// Marker tables for fee classification. `default` applies when the element
/// is absent or no marker matches; the two built-in sites default in
/// opposite directions, which is preserved site behavior.
#[derive(Debug, Clone, Deserialize)]
pub struct FeeRule {
    pub selector: String,
    #[serde(default)]
    pub free_markers: Vec<String>,
    #[serde(default)]
    pub paid_markers: Vec<String>,
    pub default: FeeClass,
}

/// One availability indicator. Checks run in declared order; the first match
/// wins and evaluation stops.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "probe", rename_all = "snake_case")]
pub enum IndicatorCheck {
    /// Element presence alone decides.
    Present {
        selector: String,
        state: AvailabilityState,
    },
    /// A present element claims the decision; its text is substring-matched
    /// against the labels in order, and an unmatched text resolves to
    /// `unknown` rather than falling through to later checks.
    TextMap {
        selector: String,
        map: Vec<LabelState>,
    },
    /// Matches only when a present element's text equals one of the labels;
    /// otherwise evaluation continues.
    TextAny {
        selector: String,
        labels: Vec<String>,
        state: AvailabilityState,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct LabelState {
    pub label: String,
    pub state: AvailabilityState,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BannerRule {
    pub selector: String,
    /// Strip the query string from `src` (cache-busting parameters).
    #[serde(default)]
    pub strip_query: bool,
}

impl SiteProfile {
    pub fn validate(&self) -> Result<()> {
        if self.site.key.trim().is_empty() {
            bail!("site.key must not be empty");
        }
        if self.site.name.trim().is_empty() {
            bail!("site.name must not be empty");
        }
        if self.matcher.hosts.is_empty() {
            bail!("matcher.hosts must not be empty");
        }
        Regex::new(&self.matcher.pattern)
            .with_context(|| format!("invalid matcher.pattern {}", self.matcher.pattern))?;

        if let Some(tz) = &self.site.timezone
            && tz.parse::<chrono_tz::Tz>().is_err()
        {
            bail!("unknown site.timezone {tz}");
        }

        validate_spec("fields.title", &self.fields.title)?;
        validate_spec("fields.host", &self.fields.host)?;
        match &self.when {
            WhenRule::Combined { spec } => validate_spec("when.spec", spec)?,
            WhenRule::Split { date, time } => {
                validate_spec("when.date", date)?;
                validate_spec("when.time", time)?;
            }
        }

        for rule in &self.venue.rules {
            validate_selector("venue rule", &rule.selector)?;
        }
        validate_selector("fee", &self.fee.selector)?;
        for check in &self.availability {
            let selector = match check {
                IndicatorCheck::Present { selector, .. }
                | IndicatorCheck::TextMap { selector, .. }
                | IndicatorCheck::TextAny { selector, .. } => selector,
            };
            validate_selector("availability check", selector)?;
        }
        if let Some(banner) = &self.banner {
            validate_selector("banner", &banner.selector)?;
        }

        Ok(())
    }
}

fn validate_spec(name: &str, spec: &FieldSpec) -> Result<()> {
    if spec.strategies.is_empty() {
        bail!("{name} must declare at least one strategy");
    }
    for strategy in &spec.strategies {
        validate_selector(name, &strategy.selector)?;
    }
    if let Some(pattern) = &spec.regex {
        Regex::new(pattern).with_context(|| format!("invalid regex on {name}: {pattern}"))?;
    }
    Ok(())
}

fn validate_selector(context: &str, selector: &str) -> Result<()> {
    if Selector::parse(selector).is_err() {
        bail!("invalid {context} selector: {selector}");
    }
    Ok(())
}

/// The two sites shipped with the crate, authored in the same TOML dialect
/// external profiles use.
pub fn builtin_profiles() -> Result<Vec<SiteProfile>> {
    let sources = [
        ("meetup", include_str!("../profiles/meetup.toml")),
        ("luma", include_str!("../profiles/luma.toml")),
    ];

    let mut profiles = Vec::new();
    for (name, text) in sources {
        let profile: SiteProfile = toml::from_str(text)
            .with_context(|| format!("failed to parse built-in profile {name}"))?;
        profile
            .validate()
            .with_context(|| format!("invalid built-in profile {name}"))?;
        profiles.push(profile);
    }
    Ok(profiles)
}

/// Load additional site profiles from a directory of TOML files. Files load
/// in path order; load order is match priority.
pub fn load_profiles_from_dir(dir: &Path) -> Result<Vec<SiteProfile>> {
    if !dir.exists() {
        bail!("profile dir does not exist: {}", dir.display());
    }

    let mut profiles = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) != Some("toml") {
            continue;
        }

        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read profile: {}", path.display()))?;
        let profile: SiteProfile = toml::from_str(&text)
            .with_context(|| format!("failed to parse toml in {}", path.display()))?;
        profile
            .validate()
            .with_context(|| format!("invalid profile {}", path.display()))?;
        profiles.push(profile);
    }

    Ok(profiles)
}

fn default_true() -> bool {
    true
}

fn default_capture() -> usize {
    1
}

fn default_date_formats() -> Vec<String> {
    vec![
        "%B %d, %Y".to_string(),
        "%b %d, %Y".to_string(),
        "%Y-%m-%d".to_string(),
        "%B %d".to_string(),
        "%b %d".to_string(),
    ]
}
