pub mod board;
pub mod connection;
pub mod coordinator;
pub mod lobby;
pub mod messages;
pub mod participant;
pub mod session;

pub use connection::HeartbeatConfig;
pub use coordinator::{Coordinator, CoordinatorHandle};
