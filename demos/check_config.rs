//!
//! Normalizes a TOML configuration file and prints the result.
//!
//! ```sh
//! RUST_LOG=oidc_conf=debug cargo run --example check_config -- config/oidc.toml pretty
//! ```
//!
//! Missing `secret`, `baseURL`, `clientID`, `clientSecret` and `issuerBaseURL`
//! keys are filled from `SECRET`, `BASE_URL`, `CLIENT_ID`, `CLIENT_SECRET` and
//! `ISSUER_BASE_URL`.
//!
use {
    oidc_conf::{
        ProcessEnv, RawConfig, Result,
        config::{LogFormat, setup_tracing},
        validate_with,
    },
    std::{env, process::ExitCode},
};

fn run(path: &str) -> Result<()> {
    let raw = RawConfig::from_toml_file(path)?;
    let validated = validate_with(raw, &ProcessEnv)?;
    if let Some(advisory) = &validated.advisory {
        println!("warning ({}): {advisory}", advisory.field());
    }
    println!("{:#?}", validated.config);
    Ok(())
}

fn main() -> ExitCode {
    let mut args = env::args().skip(1);
    let Some(path) = args.next() else {
        eprintln!("usage: check_config <config.toml> [json|default|compact|pretty]");
        return ExitCode::from(2);
    };
    let format = match args.next().map(|f| f.parse::<LogFormat>()).transpose() {
        Ok(format) => format.unwrap_or_default(),
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::from(2);
        }
    };
    setup_tracing(format);

    match run(&path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}: {err}", err.error_code());
            ExitCode::FAILURE
        }
    }
}
