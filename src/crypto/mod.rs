// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Provider Cryptography
//!
//! The hybrid scheme the identity provider requires on the wire. Used by the
//! handshake, checkup and medication clients.

pub mod hybrid;

pub use hybrid::{
    decrypt_field, encrypt_field, wrap_key, EncryptionContext, SessionKey, KEY_LEN, PROTOCOL_IV,
};
