//! `clap`-derived CLI surface for the server binary. Does not change any
//! request-handling behavior — only process bootstrap in front of an
//! otherwise environment/file-configured daemon.

use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "edi-server", about = "EDI thread-aware dispatch gateway")]
pub struct Cli {
    /// Address to bind the HTTP listener to.
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Port to bind the HTTP listener to.
    #[arg(long, default_value_t = 19001)]
    pub port: u16,

    /// Directory holding per-thread `.jsonl` files. Defaults to
    /// `~/.edi-link/threads`.
    #[arg(long)]
    pub threads_dir: Option<PathBuf>,

    /// Port the Prometheus `/metrics` exposition listens on (same process,
    /// same router — this flag only documents it, it is not a second bind).
    #[arg(long, default_value_t = 19002)]
    pub metrics_port: u16,

    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Cli {
    /// Apply CLI overrides onto a loaded [`edi_config::Settings`] snapshot.
    pub fn apply(&self, settings: &mut edi_config::Settings) {
        settings.listen_host = self.host.clone();
        settings.listen_port = self.port;
        settings.metrics_port = self.metrics_port;
        if let Some(dir) = &self.threads_dir {
            settings.threads_dir = dir.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_compiled_settings_defaults() {
        let cli = Cli::parse_from(["edi-server"]);
        assert_eq!(cli.host, "0.0.0.0");
        assert_eq!(cli.port, 19001);
        assert_eq!(cli.metrics_port, 19002);
        assert_eq!(cli.log_format, LogFormat::Pretty);
    }

    #[test]
    fn apply_overrides_settings_fields() {
        let cli = Cli::parse_from(["edi-server", "--host", "127.0.0.1", "--port", "9000"]);
        let mut settings = edi_config::Settings::default();
        cli.apply(&mut settings);
        assert_eq!(settings.listen_host, "127.0.0.1");
        assert_eq!(settings.listen_port, 9000);
    }
}
