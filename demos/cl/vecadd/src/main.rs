use std::io::{self, BufWriter, Write};

use tracing_subscriber::EnvFilter;

use crate::runtime::OpenCl;

mod probe;
mod runtime;
#[cfg(test)]
mod stand_in;

fn main() {
    // stdout carries the probe's report, so diagnostics go to stderr.
    let filter = EnvFilter::from_env("CLPROBE_LOG");
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .compact()
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    let mut out = BufWriter::new(io::stdout().lock());
    let result = probe::run(&mut OpenCl, &mut out).and_then(|exit| {
        out.flush()?;
        Ok(exit)
    });
    let code = match result {
        Ok(exit) => exit.code(),
        Err(err) => {
            tracing::error!("Failed to write the report: {err}");
            1
        }
    };

    // process::exit skips destructors
    drop(out);
    std::process::exit(code);
}
