//! Control commands exchanged on the GL tunnel's control connection.
//!
//! Every command is a single 4-byte little-endian unsigned integer with no
//! framing around it.  The player sends [`TunnelCommand::Start`] once after
//! connecting; the rendering host then sends [`TunnelCommand::NewConnection`]
//! whenever it wants another data session and [`TunnelCommand::Ping`] as a
//! liveness check, which the player must answer with [`TunnelCommand::Pong`].

/// Size of one encoded control command in bytes.
pub const COMMAND_LEN: usize = 4;

/// A control command code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TunnelCommand {
    /// Host asks the player to open the next data session.
    NewConnection,
    /// Sent by the player right after the control connection is established.
    Start,
    /// Liveness check from the host.
    Ping,
    /// Reply to [`TunnelCommand::Ping`].
    Pong,
    /// Any code this player does not understand.
    Unknown(u32),
}

impl TunnelCommand {
    pub const NEW_CONNECTION_CODE: u32 = 1;
    pub const START_CODE: u32 = 1001;
    pub const PING_CODE: u32 = 1002;
    pub const PONG_CODE: u32 = 1003;

    /// Maps a numeric code to a command.
    pub fn from_code(code: u32) -> Self {
        match code {
            Self::NEW_CONNECTION_CODE => Self::NewConnection,
            Self::START_CODE => Self::Start,
            Self::PING_CODE => Self::Ping,
            Self::PONG_CODE => Self::Pong,
            other => Self::Unknown(other),
        }
    }

    /// Returns the numeric code of this command.
    pub fn code(self) -> u32 {
        match self {
            Self::NewConnection => Self::NEW_CONNECTION_CODE,
            Self::Start => Self::START_CODE,
            Self::Ping => Self::PING_CODE,
            Self::Pong => Self::PONG_CODE,
            Self::Unknown(code) => code,
        }
    }

    /// Decodes a command from its 4-byte little-endian wire form.
    pub fn from_wire(bytes: [u8; COMMAND_LEN]) -> Self {
        Self::from_code(u32::from_le_bytes(bytes))
    }

    /// Encodes the command into its 4-byte little-endian wire form.
    pub fn to_wire(self) -> [u8; COMMAND_LEN] {
        self.code().to_le_bytes()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
