/// API route handlers
///
/// - `health`: Health check endpoint
/// - `signup`: Organization sign-up form and submission

pub mod health;
pub mod signup;
