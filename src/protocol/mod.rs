//! Improv wire formats: command/result frames and the discovery payload

pub mod advertisement;
pub mod command;
pub mod frame;

pub use advertisement::{AdvertisementData, project};
pub use command::{Command, RpcCommand};
pub use frame::{
    FrameError, Response, checksum, decode, decode_response, encode_command, encode_response,
};
