pub mod authenticator;
pub mod change_notifier;
pub mod config_service;
pub mod dto;
pub mod file_watcher;
pub mod in_memory_task_repository;
pub mod json_file_task_repository;
pub mod paths;
pub mod repository_factory;
pub mod storage;
pub mod task_table;

pub use crate::authenticator::{
    SingleUserAuthenticator, TokenAuthenticator, authenticator_from_config,
};
pub use crate::config_service::ConfigService;
pub use crate::in_memory_task_repository::InMemoryTaskRepository;
pub use crate::json_file_task_repository::JsonFileTaskRepository;
pub use crate::repository_factory::open_task_repository;
