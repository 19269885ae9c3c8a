pub mod controller;
pub mod notification;

pub use controller::{CheckInController, ControllerState};
pub use notification::{EntrySource, Notification, NotificationKind};
