//! Stamps the binary with its commit and build time.
//!
//! Only `VERGEN_GIT_SHA` and `VERGEN_BUILD_TIMESTAMP` are emitted; they back
//! `pagescript::GIT_SHA` and `pagescript::BUILD_TIMESTAMP` and show up in the
//! startup log line. Packagers building outside a checkout can export
//! `VERGEN_GIT_SHA` themselves, in which case git is not consulted.

use std::error::Error;
use vergen_gix::{Build, Emitter, Gix};

fn main() -> Result<(), Box<dyn Error>> {
    if std::env::var_os("VERGEN_GIT_SHA").is_some() {
        println!("cargo:warning=VERGEN_GIT_SHA set by the environment, not reading git");
        return Ok(());
    }

    let build = Build::builder().build_timestamp(true).build();
    let gix = Gix::builder().sha(false).build();
    Emitter::default()
        .add_instructions(&build)?
        .add_instructions(&gix)?
        .emit()?;
    Ok(())
}
