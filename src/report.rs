//! Human- and machine-readable rendering of decoded packets.
//!
//! Provides a serializable packet summary with calendar timestamps and multiple
//! output formats (text, JSON, CSV).

use std::fmt::Write;

use crate::{packets::SntpPacket, time::fixed_16_16_to_seconds};

/// Output format for packet reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output for machine consumption.
    Json,
    /// CSV output for spreadsheet import.
    Csv,
}

/// Serializable view of every packet field.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct PacketReport {
    pub leap_indicator: u8,
    pub leap_indicator_name: String,
    pub version: u8,
    pub mode: u8,
    pub mode_name: String,
    pub stratum: u8,
    pub poll: u8,
    pub precision: i8,
    pub root_delay: u32,
    pub root_delay_seconds: f64,
    pub root_dispersion: u32,
    pub root_dispersion_seconds: f64,
    pub reference_identifier: u32,
    pub reference_timestamp: String,
    pub originate_timestamp: String,
    pub receive_timestamp: String,
    pub transmit_timestamp: String,
}

impl PacketReport {
    /// Captures the fields of `packet`, rendering timestamps as RFC 3339 UTC.
    pub fn from_packet(packet: &SntpPacket) -> Self {
        PacketReport {
            leap_indicator: packet.li,
            leap_indicator_name: packet.leap_indicator().to_string(),
            version: packet.vn,
            mode: packet.mode,
            mode_name: packet.association_mode().to_string(),
            stratum: packet.stratum,
            poll: packet.poll,
            precision: packet.precision,
            root_delay: packet.root_delay,
            root_delay_seconds: fixed_16_16_to_seconds(packet.root_delay),
            root_dispersion: packet.root_dispersion,
            root_dispersion_seconds: fixed_16_16_to_seconds(packet.root_dispersion),
            reference_identifier: packet.reference_identifier,
            reference_timestamp: packet.reference_timestamp.to_string(),
            originate_timestamp: packet.originate_timestamp.to_string(),
            receive_timestamp: packet.receive_timestamp.to_string(),
            transmit_timestamp: packet.transmit_timestamp.to_string(),
        }
    }

    /// Renders the report in the given format.
    pub fn render(&self, format: OutputFormat) -> String {
        match format {
            OutputFormat::Text => self.render_text(),
            OutputFormat::Json => self.render_json(),
            OutputFormat::Csv => self.render_csv(),
        }
    }

    /// Prints the report to stdout in the given format.
    pub fn print(&self, format: OutputFormat) {
        println!("{}", self.render(format));
    }

    fn render_text(&self) -> String {
        let mut out = String::new();
        // Writing to a String cannot fail
        let _ = writeln!(
            out,
            "Leap Indicator: {} ({})",
            self.leap_indicator, self.leap_indicator_name
        );
        let _ = writeln!(out, "Version Number: {}", self.version);
        let _ = writeln!(out, "Mode: {} ({})", self.mode, self.mode_name);
        let _ = writeln!(out, "Stratum: {}", self.stratum);
        let _ = writeln!(out, "Poll Interval: {}", self.poll);
        let _ = writeln!(out, "Precision: {}", self.precision);
        let _ = writeln!(
            out,
            "Root Delay: {} ({:.6} s)",
            self.root_delay, self.root_delay_seconds
        );
        let _ = writeln!(
            out,
            "Root Dispersion: {} ({:.6} s)",
            self.root_dispersion, self.root_dispersion_seconds
        );
        let _ = writeln!(
            out,
            "Reference Identifier: {} (0x{:08x})",
            self.reference_identifier, self.reference_identifier
        );
        let _ = writeln!(out, "Reference Timestamp: {}", self.reference_timestamp);
        let _ = writeln!(out, "Originate Timestamp: {}", self.originate_timestamp);
        let _ = writeln!(out, "Receive Timestamp: {}", self.receive_timestamp);
        let _ = write!(out, "Transmit Timestamp: {}", self.transmit_timestamp);
        out
    }

    fn render_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    fn render_csv(&self) -> String {
        format!(
            "li,vn,mode,stratum,poll,precision,root_delay,root_dispersion,\
             reference_identifier,reference_timestamp,originate_timestamp,\
             receive_timestamp,transmit_timestamp\n\
             {},{},{},{},{},{},{},{},{},{},{},{},{}",
            self.leap_indicator,
            self.version,
            self.mode,
            self.stratum,
            self.poll,
            self.precision,
            self.root_delay,
            self.root_dispersion,
            self.reference_identifier,
            self.reference_timestamp,
            self.originate_timestamp,
            self.receive_timestamp,
            self.transmit_timestamp,
        )
    }
}
