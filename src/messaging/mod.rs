// Messaging - Channels, audio commands, notifications and listener registries

pub mod channels;
pub mod command;
pub mod notification;
pub mod subscription;
