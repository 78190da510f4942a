// Copyright 2023 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

//! Matter device attestation verification.
//!
//! During commissioning a Matter device proves it is a genuine certified
//! product by returning its Device Attestation Certificate (DAC), usually
//! the Product Attestation Intermediate (PAI) that issued it, and a set of
//! attestation elements signed with the DAC key over the session challenge.
//!
//! The API allows:
//! * Decoding the TLV encoded attestation elements
//! * Checking the DAC/PAI chain of custody up to a known Product Attestation
//!   Authority (PAA)
//! * Verifying the attestation signature and nonce
//! * Choosing the PAA trust anchors through configuration

pub mod attestation;
pub mod config;
pub mod store;
