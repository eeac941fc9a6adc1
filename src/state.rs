use std::sync::Arc;
use crate::config::Config;
use crate::domain::ports::{
    AnnouncementRepository, DeviceRepository, EventRepository, GuestEventRepository,
    PushService, ScheduleRepository, ShortCodeRegistry, UserRepository,
};
use crate::domain::services::{
    auth_service::AuthService, event_access::EventAccess, event_service::EventService,
    guest_service::GuestService, identity::IdentityService, notification::Notifier,
    short_code::ShortCodeAllocator,
};
use crate::infra::realtime::broadcast_hub::BroadcastHub;

/// Storage adapters for one backend.
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub events: Arc<dyn EventRepository>,
    pub short_codes: Arc<dyn ShortCodeRegistry>,
    pub guests: Arc<dyn GuestEventRepository>,
    pub schedule: Arc<dyn ScheduleRepository>,
    pub announcements: Arc<dyn AnnouncementRepository>,
    pub devices: Arc<dyn DeviceRepository>,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub auth_service: Arc<AuthService>,
    pub identity: IdentityService,
    pub event_service: Arc<EventService>,
    pub guest_service: Arc<GuestService>,
    pub device_repo: Arc<dyn DeviceRepository>,
    pub realtime: Arc<BroadcastHub>,
}

impl AppState {
    pub fn assemble(config: &Config, repos: Repositories, push: Arc<dyn PushService>) -> Self {
        let realtime = Arc::new(BroadcastHub::new(config.realtime_channel_capacity));
        let notifier = Notifier::new(repos.devices.clone(), push, realtime.clone());
        let access = EventAccess::new(repos.guests.clone());
        let identity = IdentityService::new(repos.users.clone());

        let event_service = Arc::new(EventService::new(
            repos.events.clone(),
            repos.schedule,
            repos.announcements,
            access,
            ShortCodeAllocator::new(repos.short_codes),
            notifier,
        ));
        let guest_service = Arc::new(GuestService::new(
            repos.guests,
            repos.events,
            event_service.clone(),
            identity.clone(),
        ));

        Self {
            config: config.clone(),
            auth_service: Arc::new(AuthService::new(config)),
            identity,
            event_service,
            guest_service,
            device_repo: repos.devices,
            realtime,
        }
    }
}
