pub mod delivery;
pub mod fixture;
pub mod ids;
pub mod innings;
pub mod overs;
pub mod partnership;
pub mod scorecard;

pub use delivery::{BallPosition, DeliveryEvent, DeliveryInput, ExtraType, WicketType};
pub use fixture::{
    Match, MatchResult, MatchStatus, MatchType, NewMatch, Toss, TossDecision, WinMargin,
};
pub use ids::{InningsId, MatchId, PlayerId, TeamId};
pub use innings::{Innings, InningsCompletion, InningsSummary};
pub use overs::{overs_from_balls, BALLS_PER_OVER};
pub use partnership::Partnership;
pub use scorecard::{BattingScorecard, BowlingScorecard};
