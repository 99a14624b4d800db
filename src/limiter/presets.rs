//! Preset Limits
//!
//! Named limiter configurations for the application's throttled actions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::limiter::RateLimitConfig;

const MINUTE_MS: u64 = 60 * 1000;
const HOUR_MS: u64 = 60 * MINUTE_MS;

// == Limit Action ==
/// Actions guarded by a preset rate limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitAction {
    SharingInvite,
    UserSearch,
    Login,
    ItemCreation,
    NotificationSend,
    FileUpload,
}

impl LimitAction {
    pub const ALL: [LimitAction; 6] = [
        LimitAction::SharingInvite,
        LimitAction::UserSearch,
        LimitAction::Login,
        LimitAction::ItemCreation,
        LimitAction::NotificationSend,
        LimitAction::FileUpload,
    ];

    /// Snake-case name, as used in URLs and logs.
    pub fn name(&self) -> &'static str {
        match self {
            LimitAction::SharingInvite => "sharing_invite",
            LimitAction::UserSearch => "user_search",
            LimitAction::Login => "login",
            LimitAction::ItemCreation => "item_creation",
            LimitAction::NotificationSend => "notification_send",
            LimitAction::FileUpload => "file_upload",
        }
    }

    /// The preset limit for this action, keys prefixed with the action name.
    pub fn config(&self) -> RateLimitConfig {
        let (max_attempts, window_ms) = match self {
            LimitAction::SharingInvite => (10, HOUR_MS),
            LimitAction::UserSearch => (30, MINUTE_MS),
            LimitAction::Login => (5, 15 * MINUTE_MS),
            LimitAction::ItemCreation => (60, MINUTE_MS),
            LimitAction::NotificationSend => (20, HOUR_MS),
            LimitAction::FileUpload => (10, HOUR_MS),
        };
        RateLimitConfig::preset(max_attempts, window_ms).with_prefix(self.name())
    }
}

impl fmt::Display for LimitAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LimitAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LimitAction::ALL
            .into_iter()
            .find(|action| action.name() == s)
            .ok_or_else(|| Error::UnknownAction(s.to_string()))
    }
}
