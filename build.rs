use anyhow::Error;
use vergen_gitcl::{Emitter, GitclBuilder};

fn emit_git_sha() -> Result<(), Error> {
    let gitcl = GitclBuilder::default().sha(true).build()?;

    Emitter::default().add_instructions(&gitcl)?.emit()?;
    Ok(())
}

pub fn main() -> Result<(), Error> {
    println!("cargo:rerun-if-changed=migrations");
    if let Ok(sha) = std::env::var("VERGEN_GIT_SHA") {
        if sha != "unknown" {
            println!("cargo:rustc-env=VERGEN_GIT_SHA={sha}");

            return Ok(());
        }
    }

    // source tarballs have no git metadata, the version string copes with a missing sha.
    if let Err(e) = emit_git_sha() {
        println!("cargo:warning=could not read git sha: {e}");
    }

    Ok(())
}
