use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
/// Mappero - import, convert and route GPS tracks
pub struct Settings {
    /// JSON file holding the persisted router options
    #[clap(long, env = "MAPPERO_OPTIONS", value_name = "FILE", global = true)]
    pub options_file: Option<PathBuf>,

    /// Log debug output (ignored when RUST_LOG is set)
    #[clap(short, long, global = true)]
    pub verbose: bool,

    /// Timeout for remote routing requests, in seconds
    #[clap(long, env = "MAPPERO_TIMEOUT", default_value = "30", global = true)]
    pub timeout: u64,

    /// Override the Google gateway URL
    #[clap(long, env = "MAPPERO_GOOGLE_URL", global = true)]
    pub google_url: Option<String>,

    /// Override the Yandex gateway URL
    #[clap(long, env = "MAPPERO_YANDEX_URL", global = true)]
    pub yandex_url: Option<String>,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print point, segment and waypoint statistics for track files
    Info {
        /// GPX or KML files
        #[clap(required = true, value_name = "FILE")]
        files: Vec<PathBuf>,
    },

    /// Convert a GPX or KML file to GPX
    Convert {
        input: PathBuf,
        output: PathBuf,

        /// Omit the first point of every segment after the first, like
        /// older exports did
        #[clap(long)]
        legacy_segments: bool,
    },

    /// Calculate a route and write it as GPX
    Route {
        /// Routing backend (Direct, Google, Yandex)
        #[clap(short, long, default_value = "Direct")]
        router: String,

        /// Start: an address, or "lat,lon"
        #[clap(long)]
        from: String,

        /// Destination: an address, or "lat,lon"
        #[clap(long)]
        to: String,

        /// Departure as Unix time
        #[clap(long, value_name = "SECONDS")]
        depart: Option<u32>,

        /// Output file (stdout when omitted)
        #[clap(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Show or change persisted router options
    Options {
        /// Only show (and qualify keys for) this backend
        #[clap(short, long)]
        router: Option<String>,

        /// Set an option; repeatable
        #[clap(long = "set", value_name = "KEY=VALUE")]
        assignments: Vec<String>,
    },
}

impl Settings {
    pub fn from_cli() -> Self {
        match Settings::try_parse() {
            Ok(args) => args,
            Err(e) => e.exit(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_route_command() {
        let settings = Settings::try_parse_from([
            "mappero",
            "route",
            "--router",
            "yandex",
            "--from",
            "60.2,24.9",
            "--to",
            "Tampere",
            "-o",
            "out.gpx",
            "--verbose",
        ])
        .unwrap();
        assert!(settings.verbose);
        assert_eq!(settings.timeout, 30);
        match settings.command {
            Command::Route {
                router,
                from,
                to,
                output,
                depart,
            } => {
                assert_eq!(router, "yandex");
                assert_eq!(from, "60.2,24.9");
                assert_eq!(to, "Tampere");
                assert_eq!(output, Some(PathBuf::from("out.gpx")));
                assert_eq!(depart, None);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_options_command() {
        let settings = Settings::try_parse_from([
            "mappero",
            "options",
            "-r",
            "google",
            "--set",
            "avoid_highways=true",
            "--set",
            "x=1",
        ])
        .unwrap();
        match settings.command {
            Command::Options {
                router,
                assignments,
            } => {
                assert_eq!(router.as_deref(), Some("google"));
                assert_eq!(assignments.len(), 2);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_info_requires_files() {
        assert!(Settings::try_parse_from(["mappero", "info"]).is_err());
    }
}
