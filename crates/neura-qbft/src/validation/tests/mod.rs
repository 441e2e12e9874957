mod proposal_validator_tests;
mod round_change_message_validator_tests;

pub mod common_helpers;
