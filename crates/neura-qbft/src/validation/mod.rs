pub mod commit_validator;
pub mod message_validator;
pub mod prepare_validator;
pub mod proposal_validator;
pub mod round_change_message_validator;

#[cfg(test)]
mod tests;

pub use commit_validator::validate_commit;
pub use message_validator::{validate_signed_message, ValidationContext};
pub use prepare_validator::{validate_prepare, validate_prepare_for};
pub use proposal_validator::{is_proposal_justification, validate_proposal};
pub use round_change_message_validator::{highest_prepared, validate_round_change, validate_round_change_for_round};
