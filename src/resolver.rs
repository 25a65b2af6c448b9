use crate::error::ExtractError;
use crate::profile::{SiteProfile, builtin_profiles, load_profiles_from_dir};
use anyhow::Result;
use regex::Regex;
use std::path::Path;
use tracing::{debug, info};
use url::Url;

/// Ordered set of site profiles; declaration order is match priority.
#[derive(Debug, Clone)]
pub struct ProfileSet {
    profiles: Vec<SiteProfile>,
}

impl ProfileSet {
    pub fn builtin() -> Result<Self> {
        Ok(Self {
            profiles: builtin_profiles()?,
        })
    }

    /// Append profiles from a TOML directory after the built-ins. Returns
    /// how many were loaded.
    pub fn load_extra_dir(&mut self, dir: &Path) -> Result<usize> {
        let extra = load_profiles_from_dir(dir)?;
        let loaded = extra.len();
        self.profiles.extend(extra);
        info!(dir = %dir.display(), loaded, "extra profiles loaded");
        Ok(loaded)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SiteProfile> {
        self.profiles.iter()
    }

    pub fn get(&self, key: &str) -> Option<&SiteProfile> {
        self.profiles.iter().find(|p| p.site.key == key)
    }

    /// Match a raw URL against the known URL shapes. Returns the selected
    /// profile and the canonicalized URL.
    ///
    /// A recognized host with the wrong path shape is `InvalidFormat`; a
    /// host no profile claims is `Unsupported`. The two are never confused.
    pub fn resolve(&self, raw_url: &str) -> Result<(&SiteProfile, String), ExtractError> {
        let trimmed = raw_url.trim();
        if trimmed.is_empty() {
            return Err(ExtractError::Unsupported {
                detail: format!("url is required; {}", self.accepted_formats()),
            });
        }

        let Ok(mut url) = Url::parse(trimmed) else {
            return Err(ExtractError::Unsupported {
                detail: self.accepted_formats(),
            });
        };
        url.set_query(None);
        url.set_fragment(None);

        let canonical = canonical_string(&url);
        let Some(host) = url.host_str() else {
            return Err(ExtractError::Unsupported {
                detail: self.accepted_formats(),
            });
        };

        for profile in &self.profiles {
            if !profile
                .matcher
                .hosts
                .iter()
                .any(|h| h.eq_ignore_ascii_case(host))
            {
                continue;
            }

            let pattern = Regex::new(&profile.matcher.pattern)
                .expect("matcher pattern validated at profile load");
            if pattern.is_match(&canonical) {
                debug!(site = %profile.site.key, url = %canonical, "profile resolved");
                return Ok((profile, canonical));
            }

            return Err(ExtractError::InvalidFormat {
                site: profile.site.name.clone(),
                expected: profile.matcher.expected.clone(),
            });
        }

        Err(ExtractError::Unsupported {
            detail: self.accepted_formats(),
        })
    }

    fn accepted_formats(&self) -> String {
        let formats = self
            .profiles
            .iter()
            .map(|p| format!("{} ({})", p.site.name, p.matcher.expected))
            .collect::<Vec<_>>()
            .join(", ");
        format!("supported sources: {formats}")
    }
}

/// Serialized URL with query/fragment already dropped and the trailing slash
/// trimmed. A bare-origin URL keeps its root slash.
fn canonical_string(url: &Url) -> String {
    let serialized = url.to_string();
    if url.path() != "/" && serialized.ends_with('/') {
        serialized.trim_end_matches('/').to_string()
    } else {
        serialized
    }
}
