// Copyright 2023 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use clap::Parser;
use dacverifier::attestation::{AttestationRequest, VerificationResult};
use dacverifier::config::{Config, Policy};
use dacverifier::store::{
    base64, CertBuffer, ITrustAnchorStore, KeyIdentifier, TestTrustAnchorStore,
};
use std::error::Error;
use std::fs;
use std::process::ExitCode;
use tracing::info;

#[derive(Parser)]
enum DacVerifierCli {
    Verify(VerifyArgs),
    Lookup(LookupArgs),
}

#[derive(Debug, clap::Args)]
#[command(author, version, long_about = None,
    about = "Verify the attestation information returned by a Matter device \
    during commissioning")]
struct VerifyArgs {
    /// TLV encoded attestation elements
    #[arg(long, default_value = "elements.tlv")]
    payload: String,

    /// Attestation challenge from the secure session
    #[arg(long, default_value = "challenge.bin")]
    challenge: String,

    /// Raw (r || s) ECDSA P-256 attestation signature
    #[arg(long, default_value = "signature.bin")]
    signature: String,

    /// DER encoded PAI certificate
    #[arg(long)]
    pai: Option<String>,

    /// DER encoded DAC certificate
    #[arg(long, default_value = "dac.der")]
    dac: String,

    /// The attestation nonce sent to the device, hex encoded
    #[arg(short, long)]
    nonce: String,

    /// Verifier configuration (defaults to the development PAAs)
    #[arg(short, long)]
    config: Option<String>,
}

#[derive(Debug, clap::Args)]
#[command(author, version, long_about = None,
    about = "Look up a PAA certificate by its subject key identifier")]
struct LookupArgs {
    /// Subject key identifier, hex encoded
    #[arg(short, long)]
    key_id: String,

    /// Verifier configuration (defaults to the development PAAs)
    #[arg(short, long)]
    config: Option<String>,
}

fn main() -> ExitCode {
    {
        use tracing_subscriber::{fmt, EnvFilter};
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    match DacVerifierCli::parse() {
        DacVerifierCli::Verify(args) => match verify(&args) {
            Ok(r) => {
                println!("{r}");
                if r.is_success() {
                    ExitCode::SUCCESS
                } else {
                    ExitCode::FAILURE
                }
            }
            Err(e) => {
                eprintln!("verification failed: {e}");
                ExitCode::FAILURE
            }
        },

        DacVerifierCli::Lookup(args) => match lookup(&args) {
            Ok(cert) => {
                println!("{cert}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("lookup failed: {e}");
                ExitCode::FAILURE
            }
        },
    }
}

fn load_config(path: Option<&str>) -> Result<Config, Box<dyn Error>> {
    let c = match path {
        Some(p) => Config::load_json(&fs::read_to_string(p)?)?,
        None => Config::default(),
    };

    info!(policy = ?c.policy, "configuration loaded");

    Ok(c)
}

fn verify(args: &VerifyArgs) -> Result<VerificationResult, Box<dyn Error>> {
    let v = load_config(args.config.as_deref())?.build_verifier()?;

    let payload = fs::read(&args.payload)?;
    let challenge = fs::read(&args.challenge)?;
    let signature = fs::read(&args.signature)?;
    let dac = fs::read(&args.dac)?;
    let pai = args.pai.as_ref().map(fs::read).transpose()?;
    let nonce = hex::decode(&args.nonce)?;

    let req = AttestationRequest {
        payload: &payload,
        challenge: &challenge,
        signature: &signature,
        intermediate: pai.as_deref(),
        leaf: &dac,
        expected_nonce: &nonce,
    };

    Ok(v.verify_attestation(&req))
}

fn lookup(args: &LookupArgs) -> Result<String, Box<dyn Error>> {
    let c = load_config(args.config.as_deref())?;

    let key_id: KeyIdentifier = hex::decode(&args.key_id)?
        .as_slice()
        .try_into()
        .map_err(|_| "key-id must be 20 bytes")?;

    let mut buf = CertBuffer::for_certificate()?;

    match c.policy {
        Policy::TestAnchors => TestTrustAnchorStore::new().lookup(&key_id, &mut buf)?,
        Policy::TrustStore => c.load_trust_store()?.lookup(&key_id, &mut buf)?,
    }

    Ok(base64::encode(buf.as_slice()))
}
