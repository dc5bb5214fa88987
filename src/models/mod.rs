// SPDX-License-Identifier: MIT

//! Wire and state models shared across the managers.

pub mod notification;
pub mod settings;
pub mod user;

pub use notification::{Notification, NotificationState, UnreadCountResponse};
pub use settings::{SettingsRecord, SettingsUpdate};
pub use user::{
    ChangePasswordRequest, LoginRequest, LoginResponse, ProfileUpdate, RegisterRequest, Session,
    UserRecord,
};
