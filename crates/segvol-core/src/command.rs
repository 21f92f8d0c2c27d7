use core::fmt::Display;

use segvol_peripheral::leds::LedMask;

pub const CMD_DEBUG_REQUEST: u8 = 0x10;
pub const CMD_GET_STATUS: u8 = 0x80;
pub const CMD_SET_LEDS: u8 = 0x81;
pub const CMD_SET_VOLUME: u8 = 0x82;

/// A request from the host, decoded from the first bytes of a report.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Asks for the oldest pending bytes of the debug log.
    DebugRequest,
    /// Asks for the LEDs and volume. The host application sends the
    /// number it wants displayed in byte 1, and a level in byte 2 that
    /// the device doesn't use. Only a report cut short right after the
    /// command byte carries no number.
    GetStatus { display: Option<u8> },
    /// Sets every LED at once. Byte `i` of the payload being exactly 1
    /// turns LED `i` on; any other value turns it off.
    SetLeds(LedMask),
    SetVolume(u8),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandError {
    Empty,
    Truncated { command: u8, expected: usize, got: usize },
    Unknown(u8),
}

impl Display for CommandError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            CommandError::Empty => write!(f, "Empty command received"),
            CommandError::Truncated { command, expected, got } => {
                write!(f, "Command {:x} truncated: expected {} bytes, got {}", command, expected, got)
            }
            CommandError::Unknown(command) => write!(f, "Unknown command received ({:x})", command),
        }
    }
}

impl Command {
    /// Decodes a command from the bytes sent by the host. Only the bytes
    /// the command needs are looked at; reports are zero padded so the
    /// rest is usually garbage.
    pub fn parse(bytes: &[u8]) -> Result<Command, CommandError> {
        let (&id, payload) = bytes.split_first().ok_or(CommandError::Empty)?;

        let expect = move |len: usize| {
            if payload.len() < len {
                Err(CommandError::Truncated {
                    command: id,
                    expected: len + 1,
                    got: bytes.len(),
                })
            } else {
                Ok(&payload[..len])
            }
        };

        match id {
            CMD_DEBUG_REQUEST => Ok(Command::DebugRequest),
            CMD_GET_STATUS => Ok(Command::GetStatus {
                display: payload.first().copied(),
            }),
            CMD_SET_LEDS => {
                let flags = expect(4)?;
                Ok(Command::SetLeds(LedMask::from_flags([
                    flags[0] == 1,
                    flags[1] == 1,
                    flags[2] == 1,
                    flags[3] == 1,
                ])))
            }
            CMD_SET_VOLUME => Ok(Command::SetVolume(expect(1)?[0])),
            other => Err(CommandError::Unknown(other)),
        }
    }

    pub const fn id(&self) -> u8 {
        match self {
            Command::DebugRequest => CMD_DEBUG_REQUEST,
            Command::GetStatus { .. } => CMD_GET_STATUS,
            Command::SetLeds(_) => CMD_SET_LEDS,
            Command::SetVolume(_) => CMD_SET_VOLUME,
        }
    }
}
