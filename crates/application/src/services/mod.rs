pub mod chat_service;
pub mod contact_service;
pub mod user_service;

#[cfg(test)]
mod chat_service_tests;

pub use chat_service::{
    ChatService, ChatServiceDependencies, SendPrivateRequest, SendPublicRequest,
};
pub use contact_service::{ContactService, ContactServiceDependencies};
pub use user_service::{RegisterUserRequest, UserService, UserServiceDependencies};
