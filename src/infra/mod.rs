pub mod factory;
pub mod push;
pub mod realtime;
pub mod repositories;
