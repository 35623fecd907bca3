//! Email backend implementations
//!
//! This module provides different backend implementations for delivering emails:
//! - **SMTP**: Send emails via SMTP server (production)
//! - **Console**: Log emails instead of sending them (development)

pub mod console;
pub mod smtp;
