// Wire codes for QBFT message types.

pub const PROPOSAL: u8 = 0x00;
pub const PREPARE: u8 = 0x01;
pub const COMMIT: u8 = 0x02;
pub const ROUND_CHANGE: u8 = 0x03;

/// Number of distinct message codes.
pub const MESSAGE_SPACE: usize = 4;

pub fn message_name(code: u8) -> &'static str {
    match code {
        PROPOSAL => "Proposal",
        PREPARE => "Prepare",
        COMMIT => "Commit",
        ROUND_CHANGE => "RoundChange",
        _ => "<Invalid/Unknown QBFT Message Code>",
    }
}
