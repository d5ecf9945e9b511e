use semver::Version;

pub fn get_version() -> String {
    let semver = env!("CARGO_PKG_VERSION").parse::<Version>();

    match (semver, option_env!("VERGEN_GIT_SHA")) {
        (Ok(semver), Some(sha)) if sha != "VERGEN_IDEMPOTENT_OUTPUT" => {
            format!("{} ({})", semver, &sha[..sha.len().min(7)])
        }
        (Ok(semver), _) => semver.to_string(),
        (Err(_), _) => {
            tracing::warn!("couldn't parse a semver out of Cargo.toml? defaulting to 0.0.0-unknown.");
            String::from("0.0.0-unknown")
        }
    }
}
