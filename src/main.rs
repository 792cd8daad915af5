use std::{fs, io, process};

use thiserror::Error;

use sntp_packet::{
    configuration::{Configuration, Parser},
    packets::{PacketError, SntpPacket},
    report::PacketReport,
    time::{SystemClock, TimeError},
};

#[derive(Error, Debug)]
enum InspectError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid hex input: {0}")]
    Hex(#[from] hex::FromHexError),
    #[error("{0}")]
    Packet(#[from] PacketError),
    #[error("{0}")]
    Time(#[from] TimeError),
}

fn main() {
    env_logger::init();

    let conf = Configuration::parse();
    if let Err(e) = conf.validate() {
        eprintln!("Configuration is broken: {}", e);
        process::exit(2);
    }

    log::debug!("Configuration valid: {:?}", conf);

    let result = if conf.request {
        emit_request(&conf)
    } else {
        inspect(&conf)
    };

    if let Err(e) = result {
        log::error!("{}", e);
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Decodes the configured packet file and prints its report.
fn inspect(conf: &Configuration) -> Result<(), InspectError> {
    let Some(path) = conf.input.as_ref() else {
        return Ok(());
    };

    let raw = fs::read(path)?;
    let bytes = if conf.hex {
        let text: String = String::from_utf8_lossy(&raw).split_whitespace().collect();
        hex::decode(text)?
    } else {
        raw
    };
    log::info!("Read {} bytes from {}", bytes.len(), path.display());

    let packet = SntpPacket::from_bytes(&bytes)?;
    PacketReport::from_packet(&packet).print(conf.output_format);
    Ok(())
}

/// Builds a client request and writes it to the output file or stdout as hex.
fn emit_request(conf: &Configuration) -> Result<(), InspectError> {
    let mut packet = SntpPacket::client_request(&SystemClock)?;
    packet.vn = conf.ntp_version;
    let bytes = packet.to_bytes()?;

    match conf.output.as_ref() {
        Some(path) => {
            fs::write(path, bytes)?;
            log::info!("Wrote {}-byte request to {}", bytes.len(), path.display());
            PacketReport::from_packet(&packet).print(conf.output_format);
        }
        None => println!("{}", hex::encode(bytes)),
    }
    Ok(())
}
