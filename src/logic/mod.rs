//! Scheduling rules: input validation, reference checks, conflict detection, lifecycle policies.

mod conflicts;
mod lifecycle;
mod references;
mod validation;

pub use conflicts::find_conflict;
pub use lifecycle::{check_deletion, check_rating, check_result};
pub use references::{check_membership, check_references, References};
pub use validation::{
    parse_date, rating_from_json, validate_hall_name, validate_rating, validate_request, MatchRequest,
    MAX_HALL_NAME_LEN, MAX_RATING, MIN_RATING,
};
