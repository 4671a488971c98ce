// Authentication module
// Password hashing, bearer tokens, the request gate, and registration/login

pub mod handlers;
pub mod middleware;
pub mod models;
pub mod password;
pub mod repository;
pub mod service;
pub mod token;

// Re-export commonly used types
pub use handlers::{login_handler, register_handler};
pub use middleware::{require_auth, AuthenticatedUser};
pub use models::{LoginRequest, MessageResponse, RegisterRequest, TokenResponse, User};
pub use password::{HashingConfig, PasswordService};
pub use repository::{InMemoryUserRepository, PgUserRepository, UserRepository};
pub use service::AuthService;
pub use token::{TokenError, TokenService};
