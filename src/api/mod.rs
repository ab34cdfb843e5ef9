//! REST collaborator calls made by the real-time layer.

mod client;

pub use client::{NotificationsApi, RestClient, UnreadNotification};
