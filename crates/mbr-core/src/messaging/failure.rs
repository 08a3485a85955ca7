//! Classification of failed `setMessageReaction` calls.
//!
//! The backend reports failures as free text in `description`. The table below
//! is the compatibility list of substrings we know about; anything not listed
//! is `OtherBackendError`.

/// Why a single reaction attempt failed.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ReactionFailure {
    #[error("admin rights required")]
    PermissionMissing,

    #[error("bot is not a member of the chat")]
    NotAMember,

    #[error("reaction not supported by the chat")]
    UnsupportedReaction,

    #[error("network error: {0}")]
    NetworkError(String),

    #[error("backend error: {0}")]
    OtherBackendError(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Match {
    Exact,
    IgnoreCase,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Kind {
    PermissionMissing,
    NotAMember,
    UnsupportedReaction,
}

/// Known `description` substrings, Bot API 7.x.
const REACTION_FAILURE_TABLE_V1: &[(&str, Match, Kind)] = &[
    ("CHAT_ADMIN_REQUIRED", Match::Exact, Kind::PermissionMissing),
    ("bot is not a member", Match::IgnoreCase, Kind::NotAMember),
    ("REACTION_INVALID", Match::Exact, Kind::UnsupportedReaction),
];

impl ReactionFailure {
    /// Map a backend `description` onto a failure kind.
    pub fn from_description(description: &str) -> Self {
        let lower = description.to_lowercase();
        for (needle, how, kind) in REACTION_FAILURE_TABLE_V1 {
            let hit = match how {
                Match::Exact => description.contains(needle),
                Match::IgnoreCase => lower.contains(&needle.to_lowercase()),
            };
            if hit {
                return match kind {
                    Kind::PermissionMissing => ReactionFailure::PermissionMissing,
                    Kind::NotAMember => ReactionFailure::NotAMember,
                    Kind::UnsupportedReaction => ReactionFailure::UnsupportedReaction,
                };
            }
        }
        ReactionFailure::OtherBackendError(description.to_string())
    }

    /// Short stable label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ReactionFailure::PermissionMissing => "permission_missing",
            ReactionFailure::NotAMember => "not_a_member",
            ReactionFailure::UnsupportedReaction => "unsupported_reaction",
            ReactionFailure::NetworkError(_) => "network_error",
            ReactionFailure::OtherBackendError(_) => "other_backend_error",
        }
    }
}
