//! Improv frame codec
//!
//! Every frame is laid out as `[type][length][payload; length][checksum]`,
//! where the checksum is the 8-bit sum of all preceding bytes. Device-bound
//! frames carry a [`Command`]; client-bound result frames carry a list of
//! length-prefixed UTF-8 fields.

use thiserror::Error;

use super::command::{Command, RpcCommand};

/// Smallest possible frame: type, length and checksum
pub const MIN_FRAME_LEN: usize = 3;

/// The length byte limits the payload to 255 bytes
const MAX_PAYLOAD_LEN: usize = u8::MAX as usize;

/// Framing faults detected while decoding
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    #[error("Malformed frame")]
    Malformed,

    #[error("Checksum mismatch")]
    BadChecksum,
}

/// A decoded client-bound result frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub command: u8,
    pub fields: Vec<String>,
}

/// 8-bit sum of all bytes
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, byte| acc.wrapping_add(*byte))
}

/// Decode a device-bound command frame
pub fn decode(bytes: &[u8]) -> Result<Command, FrameError> {
    let (code, payload) = split_frame(bytes)?;

    match RpcCommand::try_from(code) {
        Ok(RpcCommand::WifiSettings) => {
            let mut fields = read_fields(payload)?.into_iter();
            match (fields.next(), fields.next(), fields.next()) {
                (Some(ssid), Some(password), None) => Ok(Command::WifiSettings { ssid, password }),
                _ => Err(FrameError::Malformed),
            }
        }
        Ok(RpcCommand::Identify) => Ok(Command::Identify),
        Ok(RpcCommand::GetDeviceInfo) => Ok(Command::GetDeviceInfo),
        Err(code) => Ok(Command::Unknown(code)),
    }
}

/// Encode a device-bound command frame
pub fn encode_command(command: &Command) -> Vec<u8> {
    match command {
        Command::WifiSettings { ssid, password } => {
            encode_frame(command.code(), &[ssid.as_str(), password.as_str()])
        }
        _ => encode_frame(command.code(), &[] as &[&str]),
    }
}

/// Encode a client-bound result frame
///
/// Fields are truncated (at a char boundary) so the payload never exceeds
/// 255 bytes; fields past that limit are dropped.
pub fn encode_response<S: AsRef<str>>(command: RpcCommand, fields: &[S]) -> Vec<u8> {
    encode_frame(command.into(), fields)
}

/// Decode a client-bound result frame
pub fn decode_response(bytes: &[u8]) -> Result<Response, FrameError> {
    let (command, payload) = split_frame(bytes)?;
    let fields = read_fields(payload)?;
    Ok(Response { command, fields })
}

/// Validate checksum and length, returning the type byte and payload
fn split_frame(bytes: &[u8]) -> Result<(u8, &[u8]), FrameError> {
    if bytes.len() < MIN_FRAME_LEN {
        return Err(FrameError::Malformed);
    }

    let (body, trailer) = bytes.split_at(bytes.len() - 1);
    if checksum(body) != trailer[0] {
        return Err(FrameError::BadChecksum);
    }

    let declared = body[1] as usize;
    let payload = &body[2..];
    if payload.len() != declared {
        return Err(FrameError::Malformed);
    }

    Ok((body[0], payload))
}

/// Split a payload into length-prefixed UTF-8 fields
fn read_fields(mut payload: &[u8]) -> Result<Vec<String>, FrameError> {
    let mut fields = Vec::new();

    while let Some((&len, rest)) = payload.split_first() {
        let len = len as usize;
        if len > rest.len() {
            return Err(FrameError::Malformed);
        }
        let (field, rest) = rest.split_at(len);
        let field = String::from_utf8(field.to_vec()).map_err(|_| FrameError::Malformed)?;
        fields.push(field);
        payload = rest;
    }

    Ok(fields)
}

fn encode_frame<S: AsRef<str>>(code: u8, fields: &[S]) -> Vec<u8> {
    let mut out = vec![code, 0];

    for field in fields {
        let remaining = MAX_PAYLOAD_LEN - (out.len() - 2);
        if remaining == 0 {
            break;
        }
        let field = truncate_at_char_boundary(field.as_ref(), remaining - 1);
        out.push(field.len() as u8);
        out.extend_from_slice(field.as_bytes());
    }

    out[1] = (out.len() - 2) as u8;
    out.push(checksum(&out));
    out
}

fn truncate_at_char_boundary(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
