pub mod clipboard;
pub mod key_service;
pub mod navigator;
pub mod task_spawner;
pub mod time_service;
