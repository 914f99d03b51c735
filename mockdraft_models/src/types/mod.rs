mod league;
pub use self::league::{League, LeagueId, NewLeague};

mod team;
pub use self::team::{NewTeam, Team, TeamId};

mod prospect;
pub use self::prospect::{NewProspect, Prospect, ProspectId};
