//! Time cluster responder.
//!
//! Aqara thermostats keep their schedule clock by periodically reading the
//! coordinator's Time cluster (endpoint 1, cluster 0x000A).  [`TimeServer`]
//! answers those reads; [`push_time`] sets the clock on the device directly.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, info};
use zcl_core::cluster::foundation::{ATTRIBUTES_ARG, READ_ATTRIBUTES_ID};
use zcl_core::cluster::time::{TIME_ATTRIBUTE_ID, TIME_ZONE_ATTRIBUTE_ID, ZCL_EPOCH_OFFSET_SECS};
use zcl_core::protocol::args::{Arg, Args, ReadRecord};
use zcl_core::{ClusterSpec, CommandDescriptor, DataType, Status, Value};

use crate::application::bound_cluster::{BoundCluster, ClusterError, Role};
use crate::application::retry::{with_retry, RetryPolicy};
use crate::infrastructure::config::TimeConfig;
use crate::infrastructure::transport::{FrameMeta, InboundHandler};

/// Source of wall-clock time and the local UTC offset.
pub trait Clock: Send + Sync {
    /// Seconds since 1970-01-01T00:00:00Z.
    fn unix_time(&self) -> i64;

    /// Offset of local time from UTC, in seconds east.
    fn utc_offset_secs(&self) -> i32;

    /// Seconds since the ZCL epoch, 2000-01-01T00:00:00Z, clamped to `u32`.
    fn zcl_time(&self) -> u32 {
        let secs = self.unix_time() - ZCL_EPOCH_OFFSET_SECS;
        secs.clamp(0, i64::from(u32::MAX)) as u32
    }
}

/// The host clock with a configured UTC offset.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock {
    utc_offset_secs: i32,
}

impl SystemClock {
    pub fn new(utc_offset_secs: i32) -> Self {
        Self { utc_offset_secs }
    }
}

impl From<&TimeConfig> for SystemClock {
    fn from(config: &TimeConfig) -> Self {
        Self::new(config.utc_offset_secs)
    }
}

impl Clock for SystemClock {
    fn unix_time(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0)
    }

    fn utc_offset_secs(&self) -> i32 {
        self.utc_offset_secs
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock {
    pub unix_time: i64,
    pub utc_offset_secs: i32,
}

impl Clock for FixedClock {
    fn unix_time(&self) -> i64 {
        self.unix_time
    }

    fn utc_offset_secs(&self) -> i32 {
        self.utc_offset_secs
    }
}

/// Answers Time cluster reads from a device.
pub struct TimeServer<C: Clock> {
    clock: C,
}

impl<C: Clock> TimeServer<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    /// Builds the records for a read of `ids`.
    pub fn read_records(&self, ids: &[u16]) -> Vec<ReadRecord> {
        ids.iter()
            .map(|&id| {
                let value = match id {
                    TIME_ATTRIBUTE_ID => Some((DataType::Utc, Value::Unsigned(self.clock.zcl_time()))),
                    TIME_ZONE_ATTRIBUTE_ID => {
                        Some((DataType::Int32, Value::Signed(self.clock.utc_offset_secs())))
                    }
                    _ => None,
                };
                match value {
                    Some(value) => ReadRecord {
                        id,
                        status: Status::Success,
                        value: Some(value),
                    },
                    None => ReadRecord {
                        id,
                        status: Status::UnsupportedAttribute,
                        value: None,
                    },
                }
            })
            .collect()
    }
}

impl<C: Clock> InboundHandler for TimeServer<C> {
    fn on_attributes_reported(
        &self,
        cluster: &'static ClusterSpec,
        attributes: &HashMap<&'static str, Value>,
        meta: &FrameMeta,
    ) {
        debug!(cluster = %cluster, endpoint = meta.endpoint_id, ?attributes, "time report ignored");
    }

    fn on_command(
        &self,
        command: &'static CommandDescriptor,
        args: &Args,
        meta: &FrameMeta,
    ) -> Option<Args> {
        if !command.global || command.id != READ_ATTRIBUTES_ID {
            debug!(command = command.name, "time server ignores command");
            return None;
        }
        let Some(Arg::AttributeIds(ids)) = args.get(ATTRIBUTES_ARG) else {
            return None;
        };
        debug!(endpoint = meta.endpoint_id, ?ids, "device reads time");
        Some(Args::new().with(ATTRIBUTES_ARG, Arg::ReadRecords(self.read_records(ids))))
    }
}

/// Writes the current time and offset to the device's Time cluster.
///
/// `cluster` should be a [`Role::Client`] binding, which addresses the
/// device's server attributes.
pub async fn push_time(
    cluster: &BoundCluster,
    clock: &dyn Clock,
    retry: RetryPolicy,
) -> Result<(), ClusterError> {
    let zone = match cluster.role() {
        Role::Client => "timeZone",
        Role::Server => "timezone",
    };
    let time = clock.zcl_time();
    let offset = clock.utc_offset_secs();
    let values = [("time", Value::Unsigned(time)), (zone, Value::Signed(offset))];
    let values = &values[..];
    with_retry(retry, move || cluster.write_attributes(values)).await?;
    info!(time, offset, endpoint = cluster.endpoint_id(), "device time set");
    Ok(())
}
