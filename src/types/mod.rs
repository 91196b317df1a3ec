// ABOUTME: Validated domain types for capstan.
// ABOUTME: Application names and ordered release identifiers.

mod app_name;
mod release_id;

pub use app_name::{AppName, AppNameError};
pub use release_id::{ParseReleaseIdError, ReleaseId};
