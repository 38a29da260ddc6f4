//! Use-case layer: one struct per form submission, composed from the
//! credential store and the repositories. Handlers stay thin; these are the
//! units the mock-based tests exercise.

pub mod change_password;
pub mod login;
pub mod signup;

pub use change_password::ChangePasswordAction;
pub use login::LoginAction;
pub use signup::SignupAction;
