pub mod commit_payload;
pub mod message_factory;
pub mod prepare_payload;
pub mod proposal_payload;
pub mod qbft_payload;
pub mod round_change_payload;

pub use commit_payload::CommitData;
pub use message_factory::MessageFactory;
pub use prepare_payload::PrepareData;
pub use proposal_payload::ProposalData;
pub use qbft_payload::QbftPayload;
pub use round_change_payload::RoundChangeData;
