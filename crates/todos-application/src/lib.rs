pub mod api;
pub mod live_query;
pub mod rpc;
pub mod task_service;

pub use api::{TaskApi, TaskRequest, TaskResponse};
pub use live_query::{LiveQuery, Subscription};
pub use task_service::{Ack, TaskService};
