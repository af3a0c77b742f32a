//! `vcflow sign`: sign a credential document with a local JWK.
//!
//! The document is signed as given, with no mapping applied. The output is
//! written next to the input as `<stem>.signed.<ext>`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result, bail};
use clap::Args;
use serde_json::Value;
use vcflow_jose::{LocalKey, PrivateKeyJwk};

#[derive(Args, Debug)]
pub struct SignArgs {
    /// Private JWK file holding the signing key
    #[arg(short, long)]
    pub key: PathBuf,

    /// Issuer DID. Defaults to the `did:key` of the signing key
    #[arg(short, long)]
    pub issuer: Option<String>,

    /// Subject DID, the JWT `sub`
    #[arg(short, long)]
    pub subject: String,

    /// Replace an existing output file without asking
    #[arg(long)]
    pub overwrite: bool,

    /// Credential document (JSON) to sign
    pub vc: PathBuf,
}

/// Sign the credential named in `args`. `confirm` is asked before an
/// existing output file is replaced.
pub async fn run(args: &SignArgs, confirm: impl FnOnce(&Path) -> Result<bool>) -> Result<()> {
    let key = read_key(&args.key)?;
    let vc: Value = serde_json::from_str(
        &fs::read_to_string(&args.vc).with_context(|| format!("reading {}", args.vc.display()))?,
    )
    .with_context(|| format!("parsing {}", args.vc.display()))?;
    if !vc.is_object() {
        bail!("{} is not a JSON object", args.vc.display());
    }

    let output = signed_path(&args.vc);
    if output.exists() && !args.overwrite && !confirm(&output)? {
        tracing::info!(path = %output.display(), "not overwritten");
        return Ok(());
    }

    let jwt = vcflow_vdc::sign_raw(&vc, &key, args.issuer.as_deref(), &args.subject).await?;
    fs::write(&output, jwt).with_context(|| format!("writing {}", output.display()))?;

    tracing::info!(path = %output.display(), "signed");
    Ok(())
}

fn read_key(path: &Path) -> Result<LocalKey> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("reading key {}", path.display()))?;
    let jwk: PrivateKeyJwk = serde_json::from_str(&contents)
        .with_context(|| format!("{} is not a private JWK", path.display()))?;
    Ok(LocalKey { jwk })
}

/// `dir/name.json` becomes `dir/name.signed.json`.
fn signed_path(vc: &Path) -> PathBuf {
    let stem = vc.file_stem().unwrap_or_default().to_string_lossy();
    let name = match vc.extension() {
        Some(ext) => format!("{stem}.signed.{}", ext.to_string_lossy()),
        None => format!("{stem}.signed"),
    };
    vc.with_file_name(name)
}
