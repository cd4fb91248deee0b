#![cfg(feature = "std")]

mod util;

use avlwire::{
    Codec, Error, Packet, Transport,
    avec::Anomaly,
    sans::{frame::DeviceId, params::ParameterError},
};
use util::{datagram, elements, fixture, fixtures, stream_frame, stream_payload};

fn decode_fixture(name: &str) -> Result<Packet, Error> {
    let f = fixture(name);
    avlwire::decode(f.codec, f.transport, &f.data)
}

/// Decode a modified copy of a stream fixture's payload, with a valid frame.
fn decode_patched(name: &str, patch: impl FnOnce(&mut Vec<u8>)) -> Result<Packet, Error> {
    let f = fixture(name);
    let mut payload = stream_payload(&f.data).to_vec();
    patch(&mut payload);
    avlwire::decode(f.codec, Transport::Stream, &stream_frame(&payload))
}

fn pairs(packet: &Packet, record: usize) -> Vec<(u16, u64)> {
    packet.records[record]
        .elements
        .iter()
        .map(|(id, value)| (*id, *value))
        .collect()
}

#[test]
fn decode_codec_8_stream() {
    let packet = decode_fixture("c8-stream").unwrap();

    assert_eq!(packet.device, None);
    assert_eq!(packet.records.len(), 1);

    let record = &packet.records[0];
    assert_eq!(record.timestamp, 1560161086000);
    assert_eq!(record.priority, 1);
    assert_eq!(record.position.longitude, 0.0);
    assert_eq!(record.position.latitude, 0.0);
    assert_eq!(record.position.altitude, 0);
    assert_eq!(record.position.angle, 0);
    assert_eq!(record.position.satellites, 0);
    assert_eq!(record.position.speed, 0);
    assert_eq!(record.event, 1);
    assert_eq!(record.generation_type, None);
    assert_eq!(
        pairs(&packet, 0),
        [(21, 3), (1, 1), (66, 24079), (241, 24602), (78, 0)]
    );
    assert_eq!(record.anomalies, [Anomaly::InvalidFix]);
}

#[test]
fn decode_codec_8_datagram() {
    let packet = decode_fixture("c8-datagram").unwrap();

    let device = packet.device.unwrap();
    assert_eq!(device.length, 61);
    assert_eq!(device.packet_id, 51966);
    assert_eq!(device.record_sequence_id, 5);
    assert_eq!(device.device_id.to_string(), "333532303933303836343033363535");

    assert_eq!(packet.records.len(), 1);
    assert_eq!(packet.records[0].timestamp, 1560407006000);
    assert_eq!(pairs(&packet, 0), [(21, 3), (1, 1), (66, 23996)]);
}

#[test]
fn decode_codec_8_two_records() {
    let packet = decode_fixture("c8-stream-two-records").unwrap();

    assert_eq!(packet.records.len(), 2);
    assert_eq!(packet.records[0].timestamp, 1560160861000);
    assert_eq!(packet.records[1].timestamp, 1560160879000);
    assert_eq!(pairs(&packet, 0), [(1, 0)]);
    assert_eq!(pairs(&packet, 1), [(1, 1)]);
}

#[test]
fn decode_codec_8_extended() {
    let packet = decode_fixture("c8e-stream").unwrap();

    let record = &packet.records[0];
    assert_eq!(record.timestamp, 1560166592000);
    assert_eq!(record.event, 1);
    assert_eq!(record.generation_type, None);
    assert_eq!(
        pairs(&packet, 0),
        [
            (1, 1),
            (17, 29),
            (16, 22949000),
            (11, 893700218),
            (14, 500686954)
        ]
    );

    let packet = decode_fixture("c8e-datagram").unwrap();
    assert_eq!(packet.device.unwrap().record_sequence_id, 7);
    assert_eq!(packet.records[0].elements[&17], 157);
}

#[test]
fn decode_codec_16_stream() {
    let packet = decode_fixture("c16-stream").unwrap();

    assert_eq!(packet.records.len(), 2);

    for record in &packet.records {
        assert_eq!(record.generation_type, Some(5));
        assert_eq!(record.event, 11);
        assert_eq!(record.priority, 0);
    }

    assert_eq!(packet.records[0].timestamp, 1562760414000);
    assert_eq!(packet.records[1].timestamp, 1562760415000);
    assert_eq!(pairs(&packet, 0), [(1, 0), (3, 0), (11, 39), (66, 22074)]);
    assert_eq!(pairs(&packet, 1), [(1, 0), (3, 0), (11, 38), (66, 22074)]);
}

#[test]
fn decode_codec_16_datagram() {
    let packet = decode_fixture("c16-datagram").unwrap();

    let device = packet.device.unwrap();
    assert_eq!(device.record_sequence_id, 1);
    assert_eq!(device.device_id.to_string(), "333532303934303835323331353932");

    let record = &packet.records[0];
    assert_eq!(record.timestamp, 1447804801000);
    assert_eq!(record.event, 239);
    assert_eq!(record.generation_type, Some(5));
    assert_eq!(
        pairs(&packet, 0),
        [(1, 0), (3, 0), (180, 0), (239, 1), (66, 4378)]
    );
}

#[test]
fn decode_all_fixtures() {
    for f in fixtures() {
        let packet = avlwire::decode(f.codec, f.transport, &f.data).unwrap();

        let expected = elements(&f.name);
        let found: Vec<_> = packet
            .records
            .iter()
            .enumerate()
            .flat_map(|(i, r)| r.elements.iter().map(move |(id, v)| (i, *id, *v)))
            .collect();
        let expected: Vec<_> = expected.iter().map(|(i, _, id, v)| (*i, *id, *v)).collect();

        assert_eq!(found, expected, "{}", f.name);
        assert_eq!(packet.device.is_some(), f.transport == Transport::Datagram);
        assert!(
            packet.anomalies().all(|(_, a)| a == Anomaly::InvalidFix),
            "{}",
            f.name
        );
    }
}

#[test]
fn decode_is_deterministic() {
    for f in fixtures() {
        let first = avlwire::decode(f.codec, f.transport, &f.data);
        let second = avlwire::decode(f.codec, f.transport, &f.data);
        assert_eq!(first, second);
    }
}

#[test]
fn reject_mismatched_codec() {
    // Codec identifier flipped to 16, with a recomputed CRC.
    let err = decode_patched("c8-stream", |p| p[0] = 0x10).unwrap_err();
    assert_eq!(
        err,
        Error::CodecMismatch {
            expected: Codec::C8,
            found: 0x10
        }
    );

    let f = fixture("c8-datagram");
    let mut data = f.data.clone();
    data[23] = 0x10;
    assert!(matches!(
        avlwire::decode(Codec::C8, Transport::Datagram, &data),
        Err(Error::CodecMismatch { found: 0x10, .. })
    ));

    // Unknown identifiers never match.
    let err = decode_patched("c8-stream", |p| p[0] = 0x0C).unwrap_err();
    assert!(matches!(err, Error::CodecMismatch { found: 0x0C, .. }));

    for f in fixtures() {
        for codec in [Codec::C8, Codec::C8E, Codec::C16] {
            if codec != f.codec {
                let err = avlwire::decode(codec, f.transport, &f.data).unwrap_err();
                assert!(matches!(err, Error::CodecMismatch { .. }), "{}", f.name);
            }
        }
    }
}

#[test]
fn reject_mutated_payload() {
    for f in fixtures().into_iter().filter(|f| f.transport == Transport::Stream) {
        for i in 8..f.data.len() - 4 {
            let mut data = f.data.clone();
            data[i] ^= 0x01;

            let err = avlwire::decode(f.codec, f.transport, &data).unwrap_err();
            assert!(
                matches!(err, Error::ChecksumMismatch { .. }),
                "{} byte {i}: {err:?}",
                f.name
            );
        }
    }
}

#[test]
fn reject_bad_checksum() {
    let mut data = fixture("c8-stream").data;
    let n = data.len();
    data[n - 1] = 0xCE;

    assert_eq!(
        avlwire::decode(Codec::C8, Transport::Stream, &data),
        Err(Error::ChecksumMismatch {
            found: 0xC7CE,
            calculated: 0xC7CF
        })
    );
}

#[test]
fn reject_length_mismatch() {
    let mut data = fixture("c8-stream").data;
    data.push(0);
    assert_eq!(
        avlwire::decode(Codec::C8, Transport::Stream, &data),
        Err(Error::LengthMismatch {
            declared: 0x36,
            size: 67
        })
    );

    let mut data = fixture("c8-datagram").data;
    data.pop();
    assert_eq!(
        avlwire::decode(Codec::C8, Transport::Datagram, &data),
        Err(Error::LengthMismatch {
            declared: 0x3D,
            size: 62
        })
    );
}

#[test]
fn reject_short_frames() {
    assert_eq!(
        avlwire::decode(Codec::C8, Transport::Stream, &[0; 7]),
        Err(Error::TooShort {
            offset: 0,
            needed: 8
        })
    );
    assert_eq!(
        avlwire::decode(Codec::C8, Transport::Datagram, &[0]),
        Err(Error::TooShort {
            offset: 0,
            needed: 2
        })
    );

    // Minimum lengths, declaring an empty payload.
    assert_eq!(
        avlwire::decode(Codec::C8, Transport::Stream, &[0; 8]),
        Err(Error::LengthMismatch {
            declared: 0,
            size: 8
        })
    );
    assert_eq!(
        avlwire::decode(Codec::C8, Transport::Datagram, &[0; 2]),
        Err(Error::TooShort {
            offset: 2,
            needed: 6
        })
    );

    // A well-formed stream frame around an empty payload.
    assert_eq!(
        avlwire::decode(Codec::C8, Transport::Stream, &[0; 12]),
        Err(Error::TooShort {
            offset: 8,
            needed: 3
        })
    );
}

#[test]
fn reject_bad_preamble() {
    let mut data = fixture("c8-stream").data;
    data[2] = 0x01;

    assert_eq!(
        avlwire::decode(Codec::C8, Transport::Stream, &data),
        Err(Error::Preamble([0, 0, 1, 0]))
    );
}

#[test]
fn reject_bad_datagram_header() {
    let mut data = fixture("c8-datagram").data;
    data[4] = 0x02;
    assert_eq!(
        avlwire::decode(Codec::C8, Transport::Datagram, &data),
        Err(Error::UnexpectedMarker(2))
    );

    let mut data = fixture("c8-datagram").data;
    data[7] = 0x10;
    assert_eq!(
        avlwire::decode(Codec::C8, Transport::Datagram, &data),
        Err(Error::DeviceIdLengthMismatch(16))
    );
}

#[test]
fn reject_record_count_mismatch() {
    let err = decode_patched("c8-stream", |p| *p.last_mut().unwrap() = 2).unwrap_err();
    assert_eq!(
        err,
        Error::RecordCountMismatch {
            declared: 1,
            found: 2
        }
    );
}

#[test]
fn reject_uneven_records() {
    let err = decode_patched("c8-stream-two-records", |p| {
        p.remove(10);
    })
    .unwrap_err();
    assert_eq!(err, Error::UnevenRecords { bytes: 63, count: 2 });

    let err = decode_patched("c8-stream", |p| {
        p[1] = 0;
        *p.last_mut().unwrap() = 0;
    })
    .unwrap_err();
    assert_eq!(err, Error::UnevenRecords { bytes: 51, count: 0 });
}

#[test]
fn decode_empty_payload() {
    let packet = avlwire::decode(Codec::C8, Transport::Stream, &stream_frame(&[0x08, 0, 0]));
    assert_eq!(packet, Ok(Packet::default()));

    let f = fixture("c16-datagram");
    let packet = avlwire::decode(
        Codec::C16,
        Transport::Datagram,
        &datagram(&f.data, &[0x10, 0, 0]),
    )
    .unwrap();
    assert!(packet.records.is_empty());
    assert_eq!(packet.device.unwrap().length, 24);
}

#[test]
fn reject_element_count_mismatch() {
    // Declared total raised from 5 to 6.
    let err = decode_patched("c8-stream", |p| p[27] = 6).unwrap_err();
    assert_eq!(
        err,
        Error::ElementCountMismatch {
            record: 0,
            declared: 6,
            decoded: 5
        }
    );

    // Second one-byte element given the identifier of the first.
    let err = decode_patched("c8-stream-short", |p| p[31] = 21).unwrap_err();
    assert_eq!(
        err,
        Error::ElementCountMismatch {
            record: 0,
            declared: 3,
            decoded: 2
        }
    );
}

#[test]
fn decode_repeated_identifiers() {
    // Three one-byte elements, two sharing an identifier, against a declared
    // total of two distinct elements.
    let f = fixture("c8-stream-short");
    let payload = stream_payload(&f.data);

    let mut record = payload[2..28].to_vec();
    record[25] = 2;
    record.extend_from_slice(&[3, 1, 1, 1, 2, 21, 3, 0, 0, 0]);

    let mut payload = vec![0x08, 1];
    payload.extend_from_slice(&record);
    payload.push(1);

    let packet = avlwire::decode(Codec::C8, Transport::Stream, &stream_frame(&payload)).unwrap();
    assert_eq!(pairs(&packet, 0), [(1, 2), (21, 3)]);

    // The slice decoder matches every element decoded when its receiver does
    // not track identifiers.
    struct Ignore;

    impl avlwire::avec::FromRecords for Ignore {
        fn add_record(&mut self, _: usize) -> Option<&mut dyn avlwire::avec::FromRecord> {
            None
        }
    }

    let err = avlwire::avec::decode_slice(
        Codec::C8,
        Transport::Stream,
        &stream_frame(&payload),
        &mut Ignore,
    )
    .unwrap_err();
    assert_eq!(
        err,
        Error::ElementCountMismatch {
            record: 0,
            declared: 2,
            decoded: 3
        }
    );
}

#[test]
fn reject_truncated_record() {
    // Two-byte group count raised from 1 to 2, reading past the record.
    let err = decode_patched("c8-stream-short", |p| p[33] = 2).unwrap_err();
    assert!(matches!(err, Error::TooShort { .. }), "{err:?}");
}

#[test]
fn decode_wide_values() {
    let packet = decode_patched("c8-stream", |p| p[45..53].fill(0xFF)).unwrap();
    assert_eq!(packet.records[0].elements[&78], u64::MAX);
}

#[test]
fn decode_coordinates() {
    let packet = decode_patched("c8-stream", |p| {
        p[11..15].copy_from_slice(&(-1_234_567_890i32).to_be_bytes());
        p[15..19].copy_from_slice(&546_789_123i32.to_be_bytes());
        p[19..21].copy_from_slice(&120u16.to_be_bytes());
        p[21..23].copy_from_slice(&270u16.to_be_bytes());
        p[23] = 9;
        p[24..26].copy_from_slice(&50u16.to_be_bytes());
    })
    .unwrap();

    let record = &packet.records[0];
    assert!((record.position.longitude - -123.456789).abs() < 1e-9);
    assert!((record.position.latitude - 54.6789123).abs() < 1e-9);
    assert_eq!(record.position.altitude, 120);
    assert_eq!(record.position.angle, 270);
    assert_eq!(record.position.satellites, 9);
    assert_eq!(record.position.speed, 50);
    assert!(record.anomalies.is_empty());
}

#[test]
fn report_anomalies() {
    let packet = decode_patched("c8-stream", |p| p[10] = 3).unwrap();
    assert_eq!(
        packet.records[0].anomalies,
        [Anomaly::Priority(3), Anomaly::InvalidFix]
    );

    let f = fixture("c16-datagram");
    let mut data = f.data.clone();
    data[23 + 28] = 9;
    let packet = avlwire::decode(Codec::C16, Transport::Datagram, &data).unwrap();
    assert_eq!(packet.records[0].generation_type, Some(9));
    assert_eq!(
        packet.anomalies().collect::<Vec<_>>(),
        [(0, Anomaly::InvalidFix), (0, Anomaly::GenerationType(9))]
    );

    // A spare byte ahead of the trailing record count.
    let packet = decode_patched("c8-stream-short", |p| {
        let n = p.len();
        p.insert(n - 1, 0);
    })
    .unwrap();
    assert_eq!(
        packet.records[0].anomalies,
        [Anomaly::InvalidFix, Anomaly::TrailingBytes(1)]
    );
}

/// Build a codec 8 Extended payload from the reference record, with its
/// variable-width group replaced.
fn extended_payload(variable: &[(u16, &[u8])]) -> Vec<u8> {
    let f = fixture("c8e-stream");
    let payload = stream_payload(&f.data);
    let mut record = payload[2..payload.len() - 1].to_vec();

    // Drop the empty variable-width count, and raise the declared total.
    record.truncate(record.len() - 2);
    let total = 5 + variable.len() as u16;
    record[26..28].copy_from_slice(&total.to_be_bytes());

    record.extend_from_slice(&(variable.len() as u16).to_be_bytes());
    for (id, value) in variable {
        record.extend_from_slice(&id.to_be_bytes());
        record.extend_from_slice(&(value.len() as u16).to_be_bytes());
        record.extend_from_slice(value);
    }

    let mut payload = vec![0x8E, 1];
    payload.extend_from_slice(&record);
    payload.push(1);
    payload
}

#[test]
fn decode_variable_elements() {
    let payload = extended_payload(&[(256, &[0x01, 0x02, 0x03]), (257, &[])]);
    let packet = avlwire::decode(Codec::C8E, Transport::Stream, &stream_frame(&payload)).unwrap();

    let record = &packet.records[0];
    assert_eq!(record.elements.len(), 7);
    assert_eq!(record.elements[&256], 0x010203);
    assert_eq!(record.elements[&257], 0);
    assert_eq!(record.elements.get_index(5), Some((&256, &0x010203)));
}

#[test]
fn reject_wide_variable_elements() {
    let payload = extended_payload(&[(256, &[0xAB; 9])]);
    assert_eq!(
        avlwire::decode(Codec::C8E, Transport::Stream, &stream_frame(&payload)),
        Err(Error::ElementTooWide {
            id: 256,
            length: 9
        })
    );
}

#[test]
fn parse_parameters() {
    assert_eq!("8".parse(), Ok(Codec::C8));
    assert_eq!("8E".parse(), Ok(Codec::C8E));
    assert_eq!("8e".parse(), Ok(Codec::C8E));
    assert_eq!("16".parse(), Ok(Codec::C16));
    assert_eq!("12".parse::<Codec>(), Err(ParameterError::Codec));

    assert_eq!("TCP".parse(), Ok(Transport::Stream));
    assert_eq!("datagram".parse(), Ok(Transport::Datagram));
    assert_eq!("serial".parse::<Transport>(), Err(ParameterError::Transport));

    let err: Error = "9".parse::<Codec>().unwrap_err().into();
    assert_eq!(err, Error::InvalidParameter(ParameterError::Codec));

    for codec in [Codec::C8, Codec::C8E, Codec::C16] {
        assert_eq!(Codec::from_id(codec.id()), Some(codec));
        assert_eq!(codec.to_string().parse(), Ok(codec));
    }
}

#[test]
fn format_device_ids() {
    let id = DeviceId([0x12, 0xAB, 0xF0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x09]);
    assert_eq!(id.to_string(), "121011150000000000000000000000009");
}
