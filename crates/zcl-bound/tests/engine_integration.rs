//! Integration tests for the bound-cluster engine.
//!
//! A simulated thermostat sits on the far side of an in-memory transport:
//! frames the engine sends land in a channel, the device answers them, and
//! its answers come back through `FrameRouter::on_frame` exactly as a radio
//! stack would deliver them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures_util::future::join_all;
use tokio::sync::mpsc;
use zcl_bound::{
    push_time, BoundCluster, EngineConfig, FixedClock, FrameMeta, FrameRouter, RetryPolicy, Role,
    RouteOutcome, TimeServer, Transport, TransportError,
};
use zcl_core::cluster::foundation::{
    ATTRIBUTES_ARG, READ_ATTRIBUTES, READ_ATTRIBUTES_ID, READ_ATTRIBUTES_RESPONSE,
    WRITE_ATTRIBUTES, WRITE_ATTRIBUTES_ID, WRITE_ATTRIBUTES_RESPONSE,
};
use zcl_core::cluster::{lumi, time, ClusterSpec};
use zcl_core::protocol::args::{decode_args, encode_args, ReadRecord, WriteStatusRecord};
use zcl_core::{Arg, Args, DataType, Frame, FrameControl, Schedule, Status, Value};

// ── Simulated radio and device ────────────────────────────────────────────────

type Sent = (u8, u16, Vec<u8>);

struct ChannelTransport {
    tx: mpsc::UnboundedSender<Sent>,
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn send_frame(&self, endpoint_id: u8, cluster_id: u16, frame: Vec<u8>) -> Result<(), TransportError> {
        self.tx
            .send((endpoint_id, cluster_id, frame))
            .map_err(|_| TransportError("device unreachable".to_string()))
    }
}

/// Attribute storage of a thermostat that answers reads and writes.
#[derive(Default)]
struct FakeThermostat {
    attributes: HashMap<(u16, u16), (DataType, Value)>,
    /// Manufacturer id seen on each request, in arrival order.
    seen_manufacturer_ids: Vec<Option<u16>>,
    /// Writes to swallow without answering.
    drop_writes: usize,
}

impl FakeThermostat {
    fn answer(&mut self, spec: &ClusterSpec, request: &Frame) -> Option<Vec<u8>> {
        self.seen_manufacturer_ids.push(request.manufacturer_id);
        let (response, args) = match request.command_id {
            READ_ATTRIBUTES_ID => {
                let mut args = decode_args(READ_ATTRIBUTES.args, &request.payload).ok()?;
                let Some(Arg::AttributeIds(ids)) = args.take(ATTRIBUTES_ARG) else {
                    return None;
                };
                let records = ids
                    .into_iter()
                    .map(|id| match self.attributes.get(&(spec.id, id)) {
                        Some(value) => ReadRecord {
                            id,
                            status: Status::Success,
                            value: Some(value.clone()),
                        },
                        None => ReadRecord {
                            id,
                            status: Status::UnsupportedAttribute,
                            value: None,
                        },
                    })
                    .collect();
                (&READ_ATTRIBUTES_RESPONSE, Arg::ReadRecords(records))
            }
            WRITE_ATTRIBUTES_ID => {
                if self.drop_writes > 0 {
                    self.drop_writes -= 1;
                    return None;
                }
                let mut args = decode_args(WRITE_ATTRIBUTES.args, &request.payload).ok()?;
                let Some(Arg::WriteRecords(records)) = args.take(ATTRIBUTES_ARG) else {
                    return None;
                };
                for record in records {
                    self.attributes
                        .insert((spec.id, record.id), (record.data_type, record.value));
                }
                let ok = WriteStatusRecord {
                    status: Status::Success,
                    id: None,
                };
                (&WRITE_ATTRIBUTES_RESPONSE, Arg::WriteStatusRecords(vec![ok]))
            }
            _ => return None,
        };
        let payload = encode_args(response.args, &Args::new().with(ATTRIBUTES_ARG, args)).ok()?;
        let control = FrameControl::empty().with(FrameControl::DIRECTION_TO_CLIENT);
        Some(Frame::new(control, request.manufacturer_id, request.sequence_number, response.id, payload).encode())
    }
}

fn spec_for(cluster_id: u16) -> &'static ClusterSpec {
    match cluster_id {
        lumi::CLUSTER_ID => &lumi::LUMI,
        _ => &time::TIME,
    }
}

/// Runs the device until the transport is dropped.
fn spawn_device(
    mut rx: mpsc::UnboundedReceiver<Sent>,
    router: Arc<FrameRouter>,
    device: Arc<Mutex<FakeThermostat>>,
) {
    tokio::spawn(async move {
        while let Some((endpoint_id, cluster_id, bytes)) = rx.recv().await {
            let Ok(request) = Frame::decode(&bytes) else { continue };
            let reply = device.lock().unwrap().answer(spec_for(cluster_id), &request);
            if let Some(reply) = reply {
                let meta = FrameMeta::new(endpoint_id, cluster_id);
                router.on_frame(meta, &reply).await.expect("engine accepts device reply");
            }
        }
    });
}

struct Harness {
    router: Arc<FrameRouter>,
    device: Arc<Mutex<FakeThermostat>>,
    lumi: Arc<BoundCluster>,
    time: Arc<BoundCluster>,
}

fn harness(config: &EngineConfig, device: FakeThermostat) -> Harness {
    let (tx, rx) = mpsc::unbounded_channel();
    let transport: Arc<dyn Transport> = Arc::new(ChannelTransport { tx });
    let lumi = Arc::new(
        BoundCluster::new(&lumi::LUMI, 1, transport.clone())
            .with_role(Role::Client)
            .with_config(config),
    );
    let time = Arc::new(
        BoundCluster::new(&time::TIME, 1, transport.clone())
            .with_role(Role::Client)
            .with_config(config),
    );
    let mut router = FrameRouter::new(transport);
    router.register(lumi.clone());
    router.register(time.clone());
    let router = Arc::new(router);
    let device = Arc::new(Mutex::new(device));
    spawn_device(rx, router.clone(), device.clone());
    Harness {
        router,
        device,
        lumi,
        time,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_schedule_written_to_lumi_cluster_reads_back_unchanged() {
    // Arrange
    let h = harness(&EngineConfig::default(), FakeThermostat::default());
    let text = "mon,wed,fri|7:00,18.5|9:00,16.0|17:00,20.0|22:00,15.0";
    let schedule = Schedule::parse(text).expect("parse");
    schedule.validate().expect("valid schedule");
    let buffer = schedule.encode().expect("encode").to_vec();

    // Act
    h.lumi
        .write_attributes(&[("trvScheduleSettings", Value::Bytes(buffer.clone()))])
        .await
        .expect("write accepted");
    let values = h
        .lumi
        .read_attributes(&["trvScheduleSettings"])
        .await
        .expect("read answered");

    // Assert
    let stored = values["trvScheduleSettings"].as_bytes().expect("octet string");
    assert_eq!(stored, buffer.as_slice());
    assert_eq!(Schedule::decode(stored).unwrap().to_string(), text);
    let seen = h.device.lock().unwrap().seen_manufacturer_ids.clone();
    assert_eq!(seen, vec![Some(lumi::MANUFACTURER_ID); 2]);
    assert_eq!(h.lumi.pending_count(), 0);
}

#[tokio::test]
async fn test_unsupported_attributes_are_left_out_of_reads() {
    // Arrange – the device only knows the child lock.
    let mut device = FakeThermostat::default();
    device
        .attributes
        .insert((lumi::CLUSTER_ID, 0x0277), (DataType::Uint8, Value::Unsigned(1)));
    let h = harness(&EngineConfig::default(), device);

    // Act
    let values = h
        .lumi
        .read_attributes(&["trvChildLock", "trvWindowOpen"])
        .await
        .unwrap();

    // Assert
    assert_eq!(values.len(), 1);
    assert_eq!(values["trvChildLock"], Value::Unsigned(1));
}

#[tokio::test]
async fn test_concurrent_reads_each_get_their_own_answer() {
    // Arrange – every time attribute holds a distinct value.
    let mut device = FakeThermostat::default();
    for attribute in time::TIME.attributes {
        let value = match attribute.data_type {
            DataType::Int32 => Value::Signed(-i32::from(attribute.id) - 1),
            _ => Value::Unsigned(u32::from(attribute.id % 200) + 1),
        };
        device
            .attributes
            .insert((time::CLUSTER_ID, attribute.id), (attribute.data_type, value));
    }
    let expected = device.attributes.clone();
    let h = harness(&EngineConfig::default(), device);

    // Act
    let reads = time::TIME
        .attributes
        .iter()
        .map(|a| h.time.read_attributes(std::slice::from_ref(&a.name)));
    let results = join_all(reads).await;

    // Assert
    for (attribute, result) in time::TIME.attributes.iter().zip(results) {
        let values = result.expect("read answered");
        assert_eq!(values.len(), 1);
        assert_eq!(values[attribute.name], expected[&(time::CLUSTER_ID, attribute.id)].1);
    }
    assert_eq!(h.time.pending_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_push_time_retries_after_dropped_write() {
    // Arrange
    let config = EngineConfig::from_toml_str("response_timeout_ms = 1000\n[retry]\ndelay_ms = 200").unwrap();
    let device = FakeThermostat {
        drop_writes: 1,
        ..FakeThermostat::default()
    };
    let h = harness(&config, device);
    let clock = FixedClock {
        unix_time: time::ZCL_EPOCH_OFFSET_SECS + 754_005_328,
        utc_offset_secs: 7200,
    };

    // Act
    push_time(&h.time, &clock, RetryPolicy::from(&config.retry))
        .await
        .expect("second attempt succeeds");

    // Assert
    let device = h.device.lock().unwrap();
    assert_eq!(
        device.attributes[&(time::CLUSTER_ID, time::TIME_ATTRIBUTE_ID)],
        (DataType::Utc, Value::Unsigned(754_005_328))
    );
    assert_eq!(
        device.attributes[&(time::CLUSTER_ID, time::TIME_ZONE_ATTRIBUTE_ID)],
        (DataType::Int32, Value::Signed(7200))
    );
    assert_eq!(device.seen_manufacturer_ids, vec![None, None]);
}

#[tokio::test(start_paused = true)]
async fn test_push_time_gives_up_after_configured_attempts() {
    let config = EngineConfig::from_toml_str("response_timeout_ms = 1000").unwrap();
    let device = FakeThermostat {
        drop_writes: 10,
        ..FakeThermostat::default()
    };
    let h = harness(&config, device);
    let clock = FixedClock {
        unix_time: 1_700_000_000,
        utc_offset_secs: 0,
    };

    let result = push_time(&h.time, &clock, RetryPolicy::from(&config.retry)).await;

    assert!(matches!(result, Err(zcl_bound::ClusterError::Timeout { .. })));
    assert_eq!(h.device.lock().unwrap().seen_manufacturer_ids.len(), 3);
    assert_eq!(h.time.pending_count(), 0);
}

#[tokio::test]
async fn test_device_time_read_is_answered_through_router() {
    // Arrange – coordinator side of the time cluster, no device loop.
    let (tx, mut rx) = mpsc::unbounded_channel();
    let transport: Arc<dyn Transport> = Arc::new(ChannelTransport { tx });
    let clock = FixedClock {
        unix_time: time::ZCL_EPOCH_OFFSET_SECS + 0x0102_0304,
        utc_offset_secs: 3600,
    };
    let server = BoundCluster::new(&time::TIME, 1, transport.clone())
        .with_inbound_handler(Arc::new(TimeServer::new(clock)));
    let mut router = FrameRouter::new(transport);
    router.register(Arc::new(server));
    let request = [0x00, 0x3C, 0x00, 0x00, 0x00, 0x02, 0x00];

    // Act
    let outcome = router
        .on_frame(FrameMeta::new(1, time::CLUSTER_ID), &request)
        .await;

    // Assert
    assert_eq!(outcome, Ok(RouteOutcome::Replied));
    let (endpoint, cluster, reply) = rx.recv().await.unwrap();
    assert_eq!((endpoint, cluster), (1, time::CLUSTER_ID));
    assert_eq!(
        reply,
        vec![
            0x18, 0x3C, 0x01, // header: to client, no default response, same seq
            0x00, 0x00, 0x00, 0xE2, 0x04, 0x03, 0x02, 0x01, // time
            0x02, 0x00, 0x00, 0x2B, 0x10, 0x0E, 0x00, 0x00, // timezone 3600
        ]
    );
}

#[tokio::test]
async fn test_report_for_unbound_endpoint_is_unclaimed() {
    let h = harness(&EngineConfig::default(), FakeThermostat::default());
    let outcome = h
        .router
        .on_frame(FrameMeta::new(2, lumi::CLUSTER_ID), &[0x18, 0x01, 0x0A])
        .await;
    assert_eq!(outcome, Ok(RouteOutcome::Unclaimed));
}
