// SPDX-License-Identifier: MIT

//! Services module - the state managers consumed by UI layers.

pub mod auth;
pub mod notifications;
pub mod settings;

pub use auth::AuthService;
pub use notifications::{NotificationService, PollHandle};
pub use settings::SettingsService;
