pub use client::{BackendClient, RpcError};
pub use session::{Session, SessionError, SessionManager};
pub use types::{
    validate_display_name, Friend, Message, Principal, UserProfile, UserRole,
    MAX_DISPLAY_NAME_LEN,
};

mod client;
mod session;
mod types;
