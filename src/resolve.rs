//! Stadium name lookup for a club in a given season

use tracing::debug;

use crate::error::StoreError;
use crate::store::StadiumStore;

/// Name of the stadium `club` played at in `year`.
///
/// A past stadium applies if it closed in or after `year`, i.e. it was still
/// standing that season; when several qualify the earliest closure wins.
/// Otherwise the club's present stadium is used. `None` when the club has
/// neither.
pub fn resolve_stadium_name(
    store: &StadiumStore,
    club: &str,
    year: u16,
) -> Result<Option<String>, StoreError> {
    if let Some(name) = store.past_stadium_name(club, year)? {
        debug!(club, year, stadium = %name, "resolved to past stadium");
        return Ok(Some(name));
    }

    let present = store.present_stadium_name(club)?;
    debug!(club, year, stadium = ?present, "resolved against present stadiums");
    Ok(present)
}
