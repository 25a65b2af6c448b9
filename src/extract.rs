use crate::error::{ExtractError, PageFault};
use crate::model::{AvailabilityState, BannerInfo, EventRecord, VenueInfo};
use crate::normalize;
use crate::page::PageHandle;
use crate::profile::{
    BannerRule, FieldSpec, IndicatorCheck, SiteProfile, VenueFallback, VenueKind, WhenRule,
};
use regex::Regex;
use tracing::{debug, warn};

/// Evaluate one field's ordered strategy chain. The first strategy whose
/// selector resolves wins and evaluation stops, even when the resolved text
/// is empty; non-empty validation belongs to normalizers.
pub fn extract_field<P: PageHandle>(
    page: &P,
    spec: &FieldSpec,
) -> Result<Option<String>, PageFault> {
    for strategy in &spec.strategies {
        let Some(element) = page.query_one(&strategy.selector)? else {
            continue;
        };
        let raw = match strategy.attr.as_deref() {
            Some(attr) => page.attr_of(&element, attr)?.unwrap_or_default(),
            None => page.text_of(&element)?,
        };
        return Ok(Some(apply_transforms(raw, spec)));
    }
    Ok(None)
}

fn apply_transforms(raw: String, spec: &FieldSpec) -> String {
    let mut value = raw;
    if spec.first_line {
        value = value.lines().next().unwrap_or_default().to_string();
    }
    if let Some(pattern) = &spec.regex {
        let re = Regex::new(pattern).expect("field regex validated at profile load");
        value = re
            .captures(&value)
            .and_then(|caps| caps.get(spec.capture))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();
    }
    if spec.trim {
        value = value.trim().to_string();
    }
    value
}

fn required_field<P: PageHandle>(
    page: &P,
    spec: &FieldSpec,
    name: &str,
) -> Result<String, ExtractError> {
    match extract_field(page, spec)? {
        Some(value) => Ok(value),
        None => {
            warn!(field = name, "required field absent; no strategy matched");
            Err(ExtractError::MissingRequiredField {
                field: name.to_string(),
            })
        }
    }
}

/// Run every configured extractor against the page and assemble the record.
/// One pass, no retries; a required field with no resolving strategy aborts,
/// optional absences degrade to sentinels.
pub fn run<P: PageHandle>(
    page: &P,
    profile: &SiteProfile,
    source_url: &str,
) -> Result<EventRecord, ExtractError> {
    let title = required_field(page, &profile.fields.title, "title")?;
    let host = required_field(page, &profile.fields.host, "host")?;

    let (date_line, time_line) = match &profile.when {
        WhenRule::Combined { spec } => {
            let block = required_field(page, spec, "when")?;
            let parts = normalize::split_when_block(&block);
            (parts.date_line, parts.time_line)
        }
        WhenRule::Split { date, time } => {
            let date_line = required_field(page, date, "when")?;
            let time_line = extract_field(page, time)?.unwrap_or_default();
            (date_line, time_line)
        }
    };

    let Some(date) =
        normalize::parse_event_date(&date_line, &profile.date, profile.site.timezone.as_deref())
    else {
        // A date line the normalizer cannot type is indistinguishable from a
        // restructured page.
        warn!(raw = %date_line, "date line matched no configured format");
        return Err(ExtractError::MissingRequiredField {
            field: "when".to_string(),
        });
    };

    let venue = resolve_venue(page, profile)?;

    let fee_text = match page.query_one(&profile.fee.selector)? {
        Some(element) => Some(page.text_of(&element)?),
        None => None,
    };
    let fee = normalize::classify_fee(fee_text.as_deref(), &profile.fee);

    let availability = classify_availability(page, &profile.availability)?;
    let banner = resolve_banner(page, profile.banner.as_ref())?;

    Ok(EventRecord {
        title,
        host,
        date,
        time: time_line,
        venue,
        fee,
        availability,
        source_url: source_url.to_string(),
        banner,
    })
}

/// First applicable venue rule wins; none applicable falls back to the
/// profile's sentinel.
fn resolve_venue<P: PageHandle>(page: &P, profile: &SiteProfile) -> Result<VenueInfo, PageFault> {
    for rule in &profile.venue.rules {
        let Some(element) = page.query_one(&rule.selector)? else {
            continue;
        };
        return Ok(match rule.kind {
            VenueKind::Physical => VenueInfo::Physical {
                name: page.text_of(&element)?,
            },
            VenueKind::Online => VenueInfo::Online {
                label: page.text_of(&element)?,
            },
            VenueKind::Hidden => VenueInfo::HiddenUntilRegistration,
        });
    }

    Ok(match profile.venue.fallback {
        VenueFallback::Unknown => VenueInfo::Unknown,
        VenueFallback::Hidden => VenueInfo::HiddenUntilRegistration,
    })
}

/// Ordered indicator checks; the first match wins and evaluation stops.
/// Nothing matching is a valid `unknown`, never an error.
fn classify_availability<P: PageHandle>(
    page: &P,
    checks: &[IndicatorCheck],
) -> Result<AvailabilityState, PageFault> {
    for check in checks {
        match check {
            IndicatorCheck::Present { selector, state } => {
                if page.query_one(selector)?.is_some() {
                    return Ok(*state);
                }
            }
            IndicatorCheck::TextMap { selector, map } => {
                let elements = page.query_all(selector)?;
                if elements.is_empty() {
                    continue;
                }
                for element in &elements {
                    let text = page.text_of(element)?;
                    for entry in map {
                        if text.contains(&entry.label) {
                            return Ok(entry.state);
                        }
                    }
                }
                // A present status element claims the decision even when its
                // text matches no known label.
                debug!(selector = %selector, "status element present but no label matched");
                return Ok(AvailabilityState::Unknown);
            }
            IndicatorCheck::TextAny {
                selector,
                labels,
                state,
            } => {
                for element in page.query_all(selector)? {
                    let text = page.text_of(&element)?;
                    if labels.iter().any(|label| text == *label) {
                        return Ok(*state);
                    }
                }
            }
        }
    }
    Ok(AvailabilityState::Unknown)
}

/// Banner is all-or-nothing per the underlying `<img>`: a missing element or
/// a missing/empty `src` yields no banner at all.
fn resolve_banner<P: PageHandle>(
    page: &P,
    rule: Option<&BannerRule>,
) -> Result<Option<BannerInfo>, PageFault> {
    let Some(rule) = rule else {
        return Ok(None);
    };
    let Some(element) = page.query_one(&rule.selector)? else {
        return Ok(None);
    };
    let Some(src) = page.attr_of(&element, "src")?.filter(|v| !v.is_empty()) else {
        return Ok(None);
    };

    let url = if rule.strip_query {
        normalize::strip_query(&src)
    } else {
        src
    };
    let alt = page.attr_of(&element, "alt")?.unwrap_or_default();

    Ok(Some(BannerInfo { url, alt }))
}
