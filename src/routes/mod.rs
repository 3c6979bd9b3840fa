mod captains;
mod health_check;
mod session;
mod users;

pub use captains::{register_captain, RegisterCaptainRequest, VehicleInput};
pub use health_check::health_check;
pub use session::{login, logout, profile, FullNameInput, LoginRequest};
pub use users::{register_user, RegisterUserRequest};
