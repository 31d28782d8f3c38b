//! Integration tests for zcl-core's public API.
//!
//! These tests carry a weekly schedule the way the thermostat does: as an
//! octet-string attribute of the Aqara cluster, inside a manufacturer-specific
//! foundation frame.

use zcl_core::cluster::{foundation, lumi};
use zcl_core::protocol::args::{decode_args, encode_args, Arg, Args, ReadRecord, WriteRecord};
use zcl_core::protocol::sequence::SequenceCounter;
use zcl_core::{DataType, Frame, FrameControl, Schedule, ScheduleError, Status, Value};

const REFERENCE_SCHEDULE: &str = "mon,wed,fri|7:00,18.5|9:00,16.0|17:00,20.0|22:00,15.0";

fn write_schedule_frame(text: &str, seq: u8) -> Frame {
    let schedule = Schedule::parse(text).expect("schedule must parse");
    schedule.validate().expect("schedule must be valid");
    let buffer = schedule.encode().expect("schedule must encode");

    let attribute = lumi::LUMI.attribute("trvScheduleSettings").expect("known attribute");
    let args = Args::new().with(
        foundation::ATTRIBUTES_ARG,
        Arg::WriteRecords(vec![WriteRecord {
            id: attribute.id,
            data_type: attribute.data_type,
            value: Value::Bytes(buffer.to_vec()),
        }]),
    );
    let payload = encode_args(foundation::WRITE_ATTRIBUTES.args, &args).expect("args must encode");
    Frame::new(
        FrameControl::empty(),
        attribute.manufacturer_id,
        seq,
        foundation::WRITE_ATTRIBUTES_ID,
        payload,
    )
}

#[test]
fn test_schedule_write_frame_has_manufacturer_header_and_octet_string() {
    // Arrange
    let counter = SequenceCounter::starting_at(0x41);

    // Act
    let bytes = write_schedule_frame(REFERENCE_SCHEDULE, counter.next()).encode();

    // Assert – header: fc, mfr (LE), seq, cmd
    assert_eq!(&bytes[..5], &[0x04, 0x5F, 0x11, 0x41, 0x02]);
    // Record: attribute id (LE), octstr type, length 26, tag 0x04.
    assert_eq!(&bytes[5..10], &[0x76, 0x02, 0x41, 26, 0x04]);
    assert_eq!(bytes.len(), 5 + 2 + 1 + 1 + 26);
}

#[test]
fn test_schedule_survives_frame_decode() {
    // Arrange
    let bytes = write_schedule_frame(REFERENCE_SCHEDULE, 9).encode();

    // Act
    let frame = Frame::decode(&bytes).unwrap();
    let args = decode_args(foundation::WRITE_ATTRIBUTES.args, &frame.payload).unwrap();

    // Assert
    assert_eq!(frame.manufacturer_id, Some(lumi::MANUFACTURER_ID));
    let Some(Arg::WriteRecords(records)) = args.get(foundation::ATTRIBUTES_ARG) else {
        panic!("expected write records");
    };
    let buffer = records[0].value.as_bytes().expect("octet string");
    let schedule = Schedule::decode(buffer).unwrap();
    assert_eq!(schedule.to_string(), REFERENCE_SCHEDULE);
    assert_eq!(schedule.validate(), Ok(()));
}

#[test]
fn test_read_response_with_schedule_and_unsupported_attribute() {
    // Arrange – the device answers one attribute and rejects another.
    let buffer = Schedule::parse(REFERENCE_SCHEDULE).unwrap().encode().unwrap();
    let args = Args::new().with(
        foundation::ATTRIBUTES_ARG,
        Arg::ReadRecords(vec![
            ReadRecord {
                id: lumi::SCHEDULE_SETTINGS_ATTRIBUTE_ID,
                status: Status::Success,
                value: Some((DataType::OctetString, Value::Bytes(buffer.to_vec()))),
            },
            ReadRecord {
                id: 0x0279,
                status: Status::UnsupportedAttribute,
                value: None,
            },
        ]),
    );

    // Act
    let payload = encode_args(foundation::READ_ATTRIBUTES_RESPONSE.args, &args).unwrap();
    let decoded = decode_args(foundation::READ_ATTRIBUTES_RESPONSE.args, &payload).unwrap();

    // Assert
    assert_eq!(decoded, args);
}

#[test]
fn test_invalid_schedule_is_caught_before_it_reaches_the_wire() {
    let schedule = Schedule::parse("mon|8:00,20.0|8:30,20.0|14:00,20.0|20:00,20.0").unwrap();
    assert!(matches!(
        schedule.validate(),
        Err(ScheduleError::EventsTooClose { gap: 30, .. })
    ));
}
