pub mod rpc;
pub mod tasks;
