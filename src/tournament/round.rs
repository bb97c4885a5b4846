//! Tournament rounds and their order.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Stage of the tournament a match belongs to.
///
/// Rounds form a strict progression: every round after the group stage is filled with the
/// winners of the round before it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum RoundTag {
    /// First round, seeded from the season roster.
    #[serde(alias = "group")]
    GroupStage,
    /// Winners of the group stage.
    #[serde(alias = "quarter_final")]
    Quarterfinal,
    /// Winners of the quarterfinal.
    #[serde(alias = "semi_final")]
    Semifinal,
    /// Winners of the semifinal.
    Final,
}

impl RoundTag {
    /// Every round in play order.
    pub const ALL: [RoundTag; 4] = [
        RoundTag::GroupStage,
        RoundTag::Quarterfinal,
        RoundTag::Semifinal,
        RoundTag::Final,
    ];

    /// Whether the round is seeded from the season roster rather than previous winners.
    pub fn is_first(self) -> bool {
        self.previous().is_none()
    }

    /// Round whose winners feed this one.
    pub fn previous(self) -> Option<Self> {
        match self {
            RoundTag::GroupStage => None,
            RoundTag::Quarterfinal => Some(RoundTag::GroupStage),
            RoundTag::Semifinal => Some(RoundTag::Quarterfinal),
            RoundTag::Final => Some(RoundTag::Semifinal),
        }
    }

    /// Stable wire/storage name.
    pub fn as_str(self) -> &'static str {
        match self {
            RoundTag::GroupStage => "group_stage",
            RoundTag::Quarterfinal => "quarterfinal",
            RoundTag::Semifinal => "semifinal",
            RoundTag::Final => "final",
        }
    }

    /// Parse a stored round name, accepting the same aliases as the JSON representation.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "group_stage" | "group" => Some(RoundTag::GroupStage),
            "quarterfinal" | "quarter_final" => Some(RoundTag::Quarterfinal),
            "semifinal" | "semi_final" => Some(RoundTag::Semifinal),
            "final" => Some(RoundTag::Final),
            _ => None,
        }
    }
}

impl fmt::Display for RoundTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progression_is_linear() {
        assert!(RoundTag::GroupStage.is_first());
        assert_eq!(RoundTag::Final.previous(), Some(RoundTag::Semifinal));
        assert!(!RoundTag::Final.is_first());

        for pair in RoundTag::ALL.windows(2) {
            assert_eq!(pair[1].previous(), Some(pair[0]));
        }
    }

    #[test]
    fn group_alias_is_accepted() {
        let round: RoundTag = serde_json::from_str("\"group\"").unwrap();
        assert_eq!(round, RoundTag::GroupStage);
        assert_eq!(
            serde_json::to_string(&RoundTag::GroupStage).unwrap(),
            "\"group_stage\""
        );
    }

    #[test]
    fn stored_names_parse_back() {
        for round in RoundTag::ALL {
            assert_eq!(RoundTag::from_name(round.as_str()), Some(round));
        }
        assert_eq!(RoundTag::from_name("knockout"), None);
    }
}
