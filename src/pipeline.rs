use crate::error::ExtractError;
use crate::extract;
use crate::fetch::PageProvider;
use crate::model::EventRecord;
use crate::resolver::ProfileSet;
use tracing::info;

/// Boundary operation: raw URL in, normalized record or typed failure out.
/// Resolution, navigation and extraction happen once; retry policy, if any,
/// belongs to the caller.
pub fn extract_from_url<P: PageProvider>(
    raw_url: &str,
    provider: &P,
    profiles: &ProfileSet,
) -> Result<EventRecord, ExtractError> {
    let (profile, canonical) = profiles.resolve(raw_url)?;
    let page = provider.open(&canonical)?;
    let record = extract::run(&page, profile, &canonical)?;

    info!(
        site = %profile.site.key,
        title = %record.title,
        availability = record.availability.as_str(),
        fee = record.fee.as_str(),
        venue = record.venue.kind(),
        "extraction complete"
    );

    Ok(record)
}
