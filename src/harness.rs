use crate::extract;
use crate::model::{AvailabilityState, FeeClass, VenueInfo};
use crate::page::HtmlPage;
use crate::resolver::ProfileSet;
use anyhow::{Context, Result};
use serde::Serialize;

/// Bundled fixture page per built-in profile, used to self-check that the
/// shipped selectors still line up with the extraction rules.
const FIXTURES: &[(&str, &str, &str)] = &[
    (
        "meetup",
        "https://www.meetup.com/rust-kl/events/305551234/",
        include_str!("../tests/fixtures/meetup_event.html"),
    ),
    (
        "luma",
        "https://lu.ma/ab12cd34",
        include_str!("../tests/fixtures/luma_event.html"),
    ),
];

#[derive(Debug, Clone, Serialize)]
pub struct HarnessReport {
    pub cases: Vec<CaseReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CaseReport {
    pub site: String,
    pub url: String,
    pub title: String,
    pub host: String,
    pub date: String,
    pub venue: VenueInfo,
    pub fee: FeeClass,
    pub availability: AvailabilityState,
    pub banner_present: bool,
}

/// Run every bundled fixture through resolution and extraction. Any missing
/// required field or resolution failure surfaces as an error.
pub fn run_harness(profiles: &ProfileSet) -> Result<HarnessReport> {
    let mut cases = Vec::new();

    for (key, url, html) in FIXTURES.iter().copied() {
        let (profile, canonical) = profiles
            .resolve(url)
            .with_context(|| format!("fixture url for {key} did not resolve"))?;
        let page = HtmlPage::parse(html);
        let record = extract::run(&page, profile, &canonical)
            .with_context(|| format!("fixture extraction failed for {key}"))?;

        cases.push(CaseReport {
            site: profile.site.key.clone(),
            url: canonical,
            title: record.title,
            host: record.host,
            date: record.date.to_string(),
            venue: record.venue,
            fee: record.fee,
            availability: record.availability,
            banner_present: record.banner.is_some(),
        });
    }

    Ok(HarnessReport { cases })
}
