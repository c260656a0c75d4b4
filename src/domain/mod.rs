pub mod event;
pub mod model;
pub mod service;

pub use event::{FieldChange, UserCreated, UserDeleted, UserEvent, UserUpdated};
pub use model::{EventDispatcher, FindSpec, User, UserRepository, UserStatus};
pub use service::UserDomainService;
