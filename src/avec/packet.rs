//! Owned packet decoder implementation.
//!
//! _Requires Cargo feature `std`._

use std::vec::Vec;

use indexmap::IndexMap;

use crate::sans::{
    element::accumulate,
    frame::DeviceHeader,
    params::{Codec, Transport},
    record::Position,
};

use super::{Anomaly, FromRecord, FromRecords, slice::Error};

/// Records decoded from a frame.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Packet {
    /// Header of a datagram, absent for stream frames.
    pub device: Option<DeviceHeader>,
    pub records: Vec<Record>,
}

impl Packet {
    /// Anomalies of every record, paired with the index of their record.
    pub fn anomalies(&self) -> impl Iterator<Item = (usize, Anomaly)> + '_ {
        self.records
            .iter()
            .enumerate()
            .flat_map(|(index, r)| r.anomalies.iter().map(move |a| (index, *a)))
    }
}

/// A decoded record.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    /// 0 (low), 1 (high) or 2 (panic).
    pub priority: u8,
    pub position: Position,
    /// Identifier of the element that triggered the record.
    pub event: u16,
    /// Reason the record was created (codec 16 only).
    pub generation_type: Option<u8>,
    /// Element values by identifier, in wire order.
    pub elements: IndexMap<u16, u64>,
    pub anomalies: Vec<Anomaly>,
}

/// Decode the records of a frame from a slice.
///
/// Nothing is returned unless the whole frame decodes. Variable-width
/// elements wider than eight bytes are rejected, since they cannot be held as
/// integers; use [`decode_slice`](super::decode_slice) to receive them as
/// bytes.
///
/// This method is also re-exported as `avlwire::decode`.
///
/// _Requires Cargo feature `std`._
pub fn decode(codec: Codec, transport: Transport, r: &[u8]) -> Result<Packet, Error> {
    let mut collector = Collector::default();

    super::slice::decode(codec, transport, r, &mut collector)?;

    let records = collector
        .records
        .into_iter()
        .map(RecordBuilder::finish)
        .collect::<Result<_, _>>()?;

    Ok(Packet {
        device: collector.device,
        records,
    })
}

#[derive(Default)]
struct Collector {
    device: Option<DeviceHeader>,
    records: Vec<RecordBuilder>,
}

impl FromRecords for Collector {
    fn add_device(&mut self, device: DeviceHeader) {
        self.device = Some(device);
    }

    fn add_record(&mut self, _: usize) -> Option<&mut dyn FromRecord> {
        self.records.push(Default::default());
        self.records.last_mut().map(|r| r as _)
    }
}

#[derive(Default)]
struct RecordBuilder {
    record: Record,
    rejected: usize, // Distinct elements too wide to insert.
    error: Option<Error>,
}

impl RecordBuilder {
    fn finish(self) -> Result<Record, Error> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.record),
        }
    }
}

impl FromRecord for RecordBuilder {
    fn add_timestamp(&mut self, timestamp: u64) {
        self.record.timestamp = timestamp;
    }
    fn add_priority(&mut self, priority: u8) {
        self.record.priority = priority;
    }
    fn add_position(&mut self, position: Position) {
        self.record.position = position;
    }
    fn add_event(&mut self, event: u16) {
        self.record.event = event;
    }
    fn add_generation_type(&mut self, generation_type: u8) {
        self.record.generation_type = Some(generation_type);
    }

    fn add_u8(&mut self, id: u16, value: u8) {
        self.record.elements.insert(id, value.into());
    }
    fn add_u16(&mut self, id: u16, value: u16) {
        self.record.elements.insert(id, value.into());
    }
    fn add_u32(&mut self, id: u16, value: u32) {
        self.record.elements.insert(id, value.into());
    }
    fn add_u64(&mut self, id: u16, value: u64) {
        self.record.elements.insert(id, value);
    }
    fn add_bytes(&mut self, id: u16, value: &[u8]) {
        match accumulate(value) {
            Some(v) => {
                self.record.elements.insert(id, v);
            }
            None => {
                self.rejected += 1;
                self.error.get_or_insert(Error::ElementTooWide {
                    id,
                    length: value.len(),
                });
            }
        }
    }

    fn add_element_total(&mut self, _: u16) -> Option<usize> {
        Some(self.record.elements.len() + self.rejected)
    }

    fn add_anomaly(&mut self, anomaly: Anomaly) {
        self.record.anomalies.push(anomaly);
    }
}
