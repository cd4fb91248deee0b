#![allow(dead_code)]

use avlwire::{Codec, Transport, sans::check::compute_crc};
use csv::{ReaderBuilder, StringRecord};

pub const PACKETS: &str = "fixtures/packets.csv";
pub const ELEMENTS: &str = "fixtures/elements.csv";

pub struct Fixture {
    pub name: String,
    pub codec: Codec,
    pub transport: Transport,
    pub data: Vec<u8>,
}

/// Every packet in the fixture table.
pub fn fixtures() -> Vec<Fixture> {
    read(PACKETS)
        .into_iter()
        .map(|r| Fixture {
            name: r[0].to_string(),
            codec: r[1].parse().unwrap(),
            transport: r[2].parse().unwrap(),
            data: hex(&r[3]),
        })
        .collect()
}

/// A packet from the fixture table, by name.
pub fn fixture(name: &str) -> Fixture {
    fixtures()
        .into_iter()
        .find(|f| f.name == name)
        .unwrap_or_else(|| panic!("no fixture named {name}"))
}

/// Expected elements of a packet as `(record, width, id, value)`, in wire
/// order. Variable-width elements have a width of zero.
pub fn elements(name: &str) -> Vec<(usize, usize, u16, u64)> {
    read(ELEMENTS)
        .into_iter()
        .filter(|r| &r[0] == name)
        .map(|r| {
            let width = if &r[2] == "x" { 0 } else { r[2].parse().unwrap() };
            (r[1].parse().unwrap(), width, r[3].parse().unwrap(), r[4].parse().unwrap())
        })
        .collect()
}

fn read(path: &str) -> Vec<StringRecord> {
    ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .unwrap()
        .records()
        .map(|r| r.unwrap())
        .collect()
}

pub fn hex(s: &str) -> Vec<u8> {
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
        .collect()
}

/// Payload of a stream frame.
pub fn stream_payload(frame: &[u8]) -> &[u8] {
    &frame[8..frame.len() - 4]
}

/// Wrap a payload in a stream frame with a valid length and CRC.
pub fn stream_frame(payload: &[u8]) -> Vec<u8> {
    let mut frame = vec![0; 4];
    frame.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    frame.extend_from_slice(payload);
    frame.extend_from_slice(&u32::from(compute_crc(0, payload)).to_be_bytes());
    frame
}

/// Wrap a payload in a datagram with a valid length, copying the header of
/// another datagram.
pub fn datagram(header: &[u8], payload: &[u8]) -> Vec<u8> {
    let mut frame = ((21 + payload.len()) as u16).to_be_bytes().to_vec();
    frame.extend_from_slice(&header[2..23]);
    frame.extend_from_slice(payload);
    frame
}
