//! SeaORM entity definitions
//!
//! These are database-specific entities separate from domain models.

pub mod contact_submission;
pub mod user;
pub mod verification_code;

// Re-exports for public API convenience
#[allow(unused_imports)]
pub use contact_submission::{
    ActiveModel as ContactSubmissionActiveModel, Entity as ContactSubmissionEntity,
    Model as ContactSubmissionModel,
};
#[allow(unused_imports)]
pub use user::{ActiveModel as UserActiveModel, Entity as UserEntity, Model as UserModel};
#[allow(unused_imports)]
pub use verification_code::{
    ActiveModel as VerificationCodeActiveModel, Entity as VerificationCodeEntity,
    Model as VerificationCodeModel,
};
