pub mod announcement;
pub mod device;
pub mod event;
pub mod guest_event;
pub mod health;
pub mod live;
pub mod schedule;
