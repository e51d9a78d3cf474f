use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::ValidationErrors;

use crate::{
    dto::validation::{parse_time, validate_pseudonym},
    state::{
        game::Score,
        interval::{Interval, seconds_to_interval},
    },
};

/// Form fields posted to `/save-score`. Both are optional so that missing fields are reported
/// through validation instead of a deserialisation failure.
#[derive(Debug, Default, Clone, Deserialize, Serialize, ToSchema)]
pub struct SaveScoreForm {
    /// Player pseudonym.
    pub pseudonym: Option<String>,
    /// Completion time in seconds, possibly fractional.
    pub time: Option<String>,
}

impl SaveScoreForm {
    /// Validate every field and build the normalised score.
    pub fn into_score(self) -> Result<Score, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let pseudonym = validate_pseudonym(self.pseudonym.as_deref())
            .map_err(|err| errors.add("pseudonym", err))
            .ok();
        let time = parse_time(self.time.as_deref())
            .map_err(|err| errors.add("time", err))
            .ok();

        match (pseudonym, time) {
            (Some(pseudonym), Some(time_seconds)) if errors.is_empty() => {
                Ok(Score::new(None, pseudonym, time_seconds))
            }
            _ => Err(errors),
        }
    }
}

/// Query string of `GET /scores`.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ScoresQuery {
    /// Maximum number of entries, defaults to the configured leaderboard size.
    pub limit: Option<usize>,
}

/// Leaderboard entry.
#[derive(Debug, Serialize, ToSchema)]
pub struct ScoreSummary {
    /// Store-assigned identifier.
    pub id: Option<Uuid>,
    /// Trimmed pseudonym.
    pub pseudonym: String,
    /// Completion time in whole seconds.
    pub time_seconds: u32,
    /// Completion time as a calendar interval.
    pub time: Interval,
}

impl From<Score> for ScoreSummary {
    fn from(value: Score) -> Self {
        Self {
            id: value.id,
            time: seconds_to_interval(value.time_seconds),
            pseudonym: value.pseudonym,
            time_seconds: value.time_seconds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pseudonym: Option<&str>, time: Option<&str>) -> SaveScoreForm {
        SaveScoreForm {
            pseudonym: pseudonym.map(str::to_owned),
            time: time.map(str::to_owned),
        }
    }

    #[test]
    fn valid_form_is_normalised() {
        let score = form(Some("  Ash "), Some("41.5")).into_score().unwrap();
        assert_eq!(score, Score::new(None, "Ash", 42));
    }

    #[test]
    fn every_invalid_field_is_reported() {
        let errors = form(Some("  "), Some("-1")).into_score().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("pseudonym"));
        assert!(fields.contains_key("time"));
    }

    #[test]
    fn missing_time_is_reported_alone() {
        let errors = form(Some("Misty"), None).into_score().unwrap_err();
        let fields = errors.field_errors();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields["time"][0].code, "time_required");
    }

    #[test]
    fn summary_carries_interval() {
        let summary = ScoreSummary::from(Score::new(Some(Uuid::nil()), "Brock", 156));
        assert_eq!(summary.time.minutes, 2);
        assert_eq!(summary.time.seconds, 36);
        assert_eq!(summary.time_seconds, 156);
    }
}
