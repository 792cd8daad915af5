use std::path::PathBuf;

pub use clap::Parser;
use thiserror::Error;

use crate::report::OutputFormat;

/// Command-line configuration of `sntp-inspect`.
#[derive(Parser, Debug)]
#[command(author = "Piotr Olszewski", version, about, long_about = None)]
pub struct Configuration {
    /// Packet file to decode and print
    #[arg(short, long)]
    pub input: Option<PathBuf>,
    /// Treat the input file as hexadecimal text instead of raw bytes
    #[arg(long)]
    pub hex: bool,
    /// Build a client request stamped with the current time
    #[arg(short, long)]
    pub request: bool,
    /// Write the encoded request to this file instead of printing it as hex
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Format of the printed packet report
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Text)]
    pub output_format: OutputFormat,
    /// Version number placed in built requests
    #[arg(long, default_value_t = crate::packets::NTP_VERSION)]
    pub ntp_version: u8,
}

/// Reasons a parsed configuration cannot be run.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("Either --input or --request must be given")]
    NothingToDo,
    #[error("--input and --request are mutually exclusive")]
    ConflictingActions,
    #[error("NTP version {0} does not fit in 3 bits")]
    InvalidVersion(u8),
    #[error("--output requires --request")]
    OutputWithoutRequest,
    #[error("--hex requires --input")]
    HexWithoutInput,
}

impl Configuration {
    /// Checks option combinations that clap cannot express on its own.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        match (self.input.is_some(), self.request) {
            (false, false) => return Err(ConfigurationError::NothingToDo),
            (true, true) => return Err(ConfigurationError::ConflictingActions),
            _ => {}
        }
        if self.ntp_version > 7 {
            return Err(ConfigurationError::InvalidVersion(self.ntp_version));
        }
        if self.output.is_some() && !self.request {
            return Err(ConfigurationError::OutputWithoutRequest);
        }
        if self.hex && self.input.is_none() {
            return Err(ConfigurationError::HexWithoutInput);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Configuration {
        Configuration::try_parse_from(std::iter::once("sntp-inspect").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn validate_configuration_correct_test() {
        let conf = parse(&["--input", "packet.bin"]);
        assert_eq!(conf.validate(), Ok(()));
        assert_eq!(conf.output_format, OutputFormat::Text);
        assert_eq!(conf.ntp_version, 4);

        let conf = parse(&["-r", "-o", "request.bin", "-f", "json", "--ntp-version", "3"]);
        assert_eq!(conf.validate(), Ok(()));
        assert_eq!(conf.output_format, OutputFormat::Json);
        assert_eq!(conf.ntp_version, 3);
    }

    #[test]
    fn validate_configuration_incorrect_test() {
        assert_eq!(parse(&[]).validate(), Err(ConfigurationError::NothingToDo));
        assert_eq!(
            parse(&["-i", "a.bin", "-r"]).validate(),
            Err(ConfigurationError::ConflictingActions)
        );
        assert_eq!(
            parse(&["-r", "--ntp-version", "8"]).validate(),
            Err(ConfigurationError::InvalidVersion(8))
        );
        assert_eq!(
            parse(&["-i", "a.bin", "-o", "b.bin"]).validate(),
            Err(ConfigurationError::OutputWithoutRequest)
        );
        assert_eq!(
            parse(&["-r", "--hex"]).validate(),
            Err(ConfigurationError::HexWithoutInput)
        );
    }

    #[test]
    fn unknown_output_format_is_rejected() {
        let result = Configuration::try_parse_from(["sntp-inspect", "-r", "-f", "xml"]);
        assert!(result.is_err());
    }

    #[test]
    fn clap_definition_is_consistent() {
        use clap::CommandFactory;
        Configuration::command().debug_assert();
    }
}
