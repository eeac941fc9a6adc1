pub mod auth_service;
pub mod event_access;
pub mod event_service;
pub mod guest_service;
pub mod identity;
pub mod membership;
pub mod notification;
pub mod short_code;
pub mod visibility;
