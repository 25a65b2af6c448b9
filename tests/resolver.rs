use anyhow::Result;
use evex::error::{ExtractError, PageFault};
use evex::page::HtmlPage;
use evex::pipeline::extract_from_url;
use evex::resolver::ProfileSet;

const MEETUP_FIXTURE: &str = include_str!("fixtures/meetup_event.html");

fn profiles() -> ProfileSet {
    ProfileSet::builtin().expect("built-in profiles must load")
}

#[test]
fn canonicalization_strips_query_and_trailing_slash() -> Result<()> {
    let profiles = profiles();

    let (profile, canonical) =
        profiles.resolve("https://www.meetup.com/rust-kl/events/305551234/?utm_source=share")?;
    assert_eq!(profile.site.key, "meetup");
    assert_eq!(canonical, "https://www.meetup.com/rust-kl/events/305551234");

    let (_, bare) = profiles.resolve("https://www.meetup.com/rust-kl/events/305551234")?;
    assert_eq!(bare, canonical);

    let (profile, canonical) = profiles.resolve("https://lu.ma/ab12cd34/#details")?;
    assert_eq!(profile.site.key, "luma");
    assert_eq!(canonical, "https://lu.ma/ab12cd34");

    Ok(())
}

#[test]
fn unknown_host_is_unsupported_and_lists_accepted_formats() {
    let profiles = profiles();

    let err = profiles
        .resolve("https://www.eventbrite.com/e/123456")
        .unwrap_err();
    let ExtractError::Unsupported { detail } = err else {
        panic!("expected Unsupported, got {err:?}");
    };
    assert!(detail.contains("https://meetup.com/{hostSlug}/events/{eventId}"));
    assert!(detail.contains("https://lu.ma/{eventCode}"));
}

#[test]
fn known_host_with_wrong_path_is_invalid_format() {
    let profiles = profiles();

    let err = profiles
        .resolve("https://www.meetup.com/rust-kl/about/")
        .unwrap_err();
    assert!(matches!(
        err,
        ExtractError::InvalidFormat { ref site, ref expected }
            if site == "Meetup" && expected == "https://meetup.com/{hostSlug}/events/{eventId}"
    ));

    // Wrong code length on a recognized host is a format error too.
    let err = profiles.resolve("https://lu.ma/short").unwrap_err();
    assert!(matches!(
        err,
        ExtractError::InvalidFormat { ref site, .. } if site == "Luma"
    ));

    let err = profiles.resolve("https://lu.ma/ab12cd34/tickets").unwrap_err();
    assert!(matches!(err, ExtractError::InvalidFormat { .. }));
}

#[test]
fn empty_and_unparseable_input_is_unsupported() {
    let profiles = profiles();

    let err = profiles.resolve("").unwrap_err();
    assert!(matches!(err, ExtractError::Unsupported { .. }));

    let err = profiles.resolve("not a url at all").unwrap_err();
    assert!(matches!(err, ExtractError::Unsupported { .. }));
}

#[test]
fn extraction_is_identical_across_canonical_variants() -> Result<()> {
    let profiles = profiles();
    let provider = |url: &str| -> Result<HtmlPage, PageFault> {
        // The provider only ever sees the canonical form.
        assert_eq!(url, "https://www.meetup.com/rust-kl/events/305551234");
        Ok(HtmlPage::parse(MEETUP_FIXTURE))
    };

    let plain = extract_from_url(
        "https://www.meetup.com/rust-kl/events/305551234",
        &provider,
        &profiles,
    )?;
    let decorated = extract_from_url(
        "https://www.meetup.com/rust-kl/events/305551234/?ref=home&cb=171",
        &provider,
        &profiles,
    )?;

    assert_eq!(plain, decorated);
    Ok(())
}

#[test]
fn resolve_failure_never_reaches_the_provider() {
    let profiles = profiles();
    let provider = |_url: &str| -> Result<HtmlPage, PageFault> {
        panic!("provider must not be consulted for an unresolvable url");
    };

    let err = extract_from_url("https://example.org/events/1", &provider, &profiles).unwrap_err();
    assert!(matches!(err, ExtractError::Unsupported { .. }));
}

#[test]
fn provider_faults_surface_as_page_errors() {
    let profiles = profiles();
    let provider =
        |_url: &str| -> Result<HtmlPage, PageFault> { Err(PageFault::new("navigation timeout")) };

    let err = extract_from_url("https://lu.ma/ab12cd34", &provider, &profiles).unwrap_err();
    assert!(matches!(err, ExtractError::Page(_)));
    assert_eq!(err.kind(), "page_fault");
}
