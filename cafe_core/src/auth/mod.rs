//! Bearer-token authentication for the tournament API.
//!
//! ```
//! use cafe_core::auth::TokenService;
//!
//! let tokens = TokenService::new("an_example_secret_that_is_long_enough").unwrap();
//! let token = tokens.issue(7, "dice_goblin", false).unwrap();
//! assert_eq!(tokens.verify(&token).unwrap().sub, 7);
//! ```

pub mod errors;
pub mod models;
pub mod tokens;

pub use errors::{AuthError, AuthResult};
pub use models::{AccessTokenClaims, UserId};
pub use tokens::TokenService;
