use std::{fs::OpenOptions, path::Path, sync::Arc};

use tracing_subscriber::{fmt, fmt::writer::MakeWriterExt, EnvFilter};

use crate::{errors::Error, Result};

/// Initialize logging/tracing for the dispatcher.
///
/// Logs go to stdout; when `log_file` is set they are also appended there.
/// The filter can be overridden with `RUST_LOG`.
pub fn init(service_name: &str, log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "info,mbr=info,mbr_core=info,mbr_telegram=info,{service_name}=info"
        ))
    });

    let builder = fmt().with_env_filter(filter).with_target(false);

    let installed = match log_file {
        Some(path) => {
            let file = Arc::new(OpenOptions::new().create(true).append(true).open(path)?);
            builder
                .with_ansi(false)
                .with_writer(std::io::stdout.and(file))
                .try_init()
        }
        None => builder.with_ansi(true).try_init(),
    };

    installed.map_err(|e| Error::Config(format!("failed to install log subscriber: {e}")))
}
