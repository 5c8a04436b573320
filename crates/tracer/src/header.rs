//! GAPII Connection Header
//!
//! The fixed 20-byte record sent as soon as the connection opens:
//!
//! | offset | field                   |
//! |--------|-------------------------|
//! | 0      | magic `spy0`            |
//! | 4      | protocol version        |
//! | 8      | observe frame frequency |
//! | 12     | observe draw frequency  |
//! | 16     | flags                   |
//!
//! Every field is a little-endian `u32` whatever the host byte order.

use byteorder::{ByteOrder, LittleEndian};
use gfxtrace_core::CaptureConfig;

use crate::error::{Result, TraceError};

pub const MAGIC: [u8; 4] = *b"spy0";
pub const PROTOCOL_VERSION: u32 = 3;
pub const HEADER_SIZE: usize = 20;

/// Pretend the driver does not support precompiled shaders
pub const FLAG_DISABLE_PRECOMPILED_SHADERS: u32 = 0x0000_0001;

/// Capture mode of a trace
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    /// Name of the capture file to produce
    pub trace_name: String,
    /// Observe the framebuffer after every N frames; 0 disables
    pub observe_frame_frequency: u32,
    /// Observe the framebuffer after every N draw calls; 0 disables
    pub observe_draw_frequency: u32,
    pub disable_precompiled_shaders: bool,
}

impl Options {
    pub fn new(trace_name: impl Into<String>) -> Self {
        Self {
            trace_name: trace_name.into(),
            ..Default::default()
        }
    }

    /// Options for `trace_name` using the configured capture settings
    pub fn from_config(trace_name: impl Into<String>, capture: &CaptureConfig) -> Self {
        Self {
            trace_name: trace_name.into(),
            observe_frame_frequency: capture.observe_frame_frequency,
            observe_draw_frequency: capture.observe_draw_frequency,
            disable_precompiled_shaders: capture.disable_precompiled_shaders,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionHeader {
    pub version: u32,
    pub observe_frame_frequency: u32,
    pub observe_draw_frequency: u32,
    pub flags: u32,
}

impl ConnectionHeader {
    pub fn from_options(options: &Options) -> Self {
        let mut flags = 0;
        if options.disable_precompiled_shaders {
            flags |= FLAG_DISABLE_PRECOMPILED_SHADERS;
        }
        Self {
            version: PROTOCOL_VERSION,
            observe_frame_frequency: options.observe_frame_frequency,
            observe_draw_frequency: options.observe_draw_frequency,
            flags,
        }
    }

    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut b = [0u8; HEADER_SIZE];
        b[0..4].copy_from_slice(&MAGIC);
        LittleEndian::write_u32(&mut b[4..8], self.version);
        LittleEndian::write_u32(&mut b[8..12], self.observe_frame_frequency);
        LittleEndian::write_u32(&mut b[12..16], self.observe_draw_frequency);
        LittleEndian::write_u32(&mut b[16..20], self.flags);
        b
    }

    /// Validate and decode a header as the agent receives it
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(TraceError::Protocol(format!(
                "header is {} bytes, expected {}",
                bytes.len(),
                HEADER_SIZE
            )));
        }
        if bytes[0..4] != MAGIC {
            return Err(TraceError::Protocol(format!("bad magic {:?}", &bytes[0..4])));
        }
        let version = LittleEndian::read_u32(&bytes[4..8]);
        if version != PROTOCOL_VERSION {
            return Err(TraceError::Protocol(format!(
                "unsupported protocol version {}",
                version
            )));
        }
        Ok(Self {
            version,
            observe_frame_frequency: LittleEndian::read_u32(&bytes[8..12]),
            observe_draw_frequency: LittleEndian::read_u32(&bytes[12..16]),
            flags: LittleEndian::read_u32(&bytes[16..20]),
        })
    }

    pub fn disables_precompiled_shaders(&self) -> bool {
        self.flags & FLAG_DISABLE_PRECOMPILED_SHADERS != 0
    }
}
