//! Draft eligibility derived from a birth date.

use chrono::{Datelike, NaiveDate};

/// Month and day of the yearly eligibility cutoff (August 15).
pub const DRAFT_CUTOFF: (u32, u32) = (8, 15);

/// Age at which a player born on or before the cutoff becomes eligible.
pub const DRAFT_AGE_BASE: i32 = 18;

/// Returns the first draft year a player born on `birth_day` is eligible for.
///
/// Players born on or before August 15 are eligible in the year they turn 18;
/// anyone born later in the year waits one more draft.
pub fn draft_year_for(birth_day: NaiveDate) -> i32 {
    let year = birth_day.year();
    if (birth_day.month(), birth_day.day()) <= DRAFT_CUTOFF {
        year + DRAFT_AGE_BASE
    } else {
        year + DRAFT_AGE_BASE + 1
    }
}
