pub mod broadcast_hub;
