//! BoundCluster: one cluster on one endpoint, spoken to over a [`Transport`].
//!
//! The engine turns the cluster's static command table into callable
//! operations.  Sending a command allocates a transaction sequence number,
//! registers a pending request under that number and hands the frame to the
//! transport; [`BoundCluster::handle_frame`] later resolves the request when
//! the device answers with the same number.  Frames nobody waits for go to
//! the [`InboundHandler`], which may answer them.
//!
//! # Exactly-once completion
//!
//! A pending request can complete in two ways: a matching response or the
//! timeout.  Both paths remove the entry from the pending table under its
//! lock before acting, so whichever removes it first wins and the other
//! becomes a no-op.  A caller that stops waiting early (its future is
//! dropped) takes its entry with it, so the number can be reused.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::ptr;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, error, warn};
use zcl_core::cluster::foundation::{
    self, ATTRIBUTES_ARG, DEFAULT_RESPONSE_ID, READ_ATTRIBUTES, REPORT_ATTRIBUTES_ID,
    WRITE_ATTRIBUTES,
};
use zcl_core::protocol::args::{
    decode_args, encode_args, Arg, Args, WriteRecord,
};
use zcl_core::protocol::sequence::SequenceCounter;
use zcl_core::{
    AttributeDescriptor, ClusterSpec, CommandDescriptor, Direction, Frame, FrameControl,
    ProtocolError, Status, Value,
};

use crate::infrastructure::config::EngineConfig;
use crate::infrastructure::transport::{FrameMeta, InboundHandler, Transport, TransportError};

/// How long a request waits for its response unless configured otherwise.
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_millis(25_000);

/// Errors returned by bound-cluster operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ClusterError {
    /// No correlated response arrived in time.
    #[error("no response to {command} (seq {sequence}) within {timeout:?}")]
    Timeout {
        command: &'static str,
        sequence: u8,
        timeout: Duration,
    },

    /// The device answered with a non-success status.
    #[error("{command} was rejected by the device: {status}")]
    RemoteStatus { command: &'static str, status: Status },

    #[error("`{attribute}` is not an attribute of {cluster}")]
    UnknownAttribute {
        cluster: &'static str,
        attribute: String,
    },

    /// One frame can only address a single manufacturer extension.
    #[error("attributes {0:?} span more than one manufacturer scope")]
    MixedManufacturerIds(Vec<&'static str>),

    #[error("`{command}` is not a command of {cluster}")]
    UnknownCommand {
        cluster: &'static str,
        command: String,
    },

    /// A request with this sequence number is still waiting.  The counter
    /// wrapped onto a live request; this is a bug in the caller's load, not a
    /// device error.
    #[error("sequence number {0} already has a pending request")]
    SequenceInUse(u8),

    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl ClusterError {
    /// True for failures a caller may retry: timeouts, device rejections and
    /// transmission failures.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ClusterError::Timeout { .. }
                | ClusterError::RemoteStatus { .. }
                | ClusterError::Transport(_)
        )
    }
}

/// Which side of the cluster this engine plays.
///
/// A `Server` binding answers the device and addresses the *client*
/// attributes of the peer; a `Client` binding addresses the device's server
/// attributes.  Global commands travel server→client for `Server` and
/// client→server for `Client`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Role {
    #[default]
    Server,
    Client,
}

/// Per-call options for [`BoundCluster::send_command`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendOptions {
    /// Wait for the correlated response.  Ignored (treated as `false`) when
    /// the frame disables the default response.
    pub wait_for_response: bool,
    /// Manufacturer scope for global commands.  Cluster-specific commands
    /// take it from their descriptor.
    pub manufacturer_id: Option<u16>,
}

impl Default for SendOptions {
    fn default() -> Self {
        Self {
            wait_for_response: true,
            manufacturer_id: None,
        }
    }
}

impl SendOptions {
    pub fn no_wait() -> Self {
        Self {
            wait_for_response: false,
            ..Self::default()
        }
    }
}

/// Name and id lookup over the foundation commands plus a cluster's own.
#[derive(Debug)]
pub struct CommandTable {
    by_name: HashMap<&'static str, &'static CommandDescriptor>,
    by_id: HashMap<u8, Vec<&'static CommandDescriptor>>,
}

impl CommandTable {
    /// Cluster commands shadow foundation commands of the same name.
    pub fn for_cluster(spec: &'static ClusterSpec) -> Self {
        let mut by_name = HashMap::new();
        let mut by_id: HashMap<u8, Vec<&'static CommandDescriptor>> = HashMap::new();
        for &command in foundation::COMMANDS.iter().chain(spec.commands) {
            by_name.insert(command.name, command);
            by_id.entry(command.id).or_default().push(command);
        }
        Self { by_name, by_id }
    }

    pub fn get(&self, name: &str) -> Option<&'static CommandDescriptor> {
        self.by_name.get(name).copied()
    }

    pub fn candidates(&self, id: u8) -> &[&'static CommandDescriptor] {
        self.by_id.get(&id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Picks the descriptor for an inbound frame.
    ///
    /// Some ids are reused for a request in one direction and a response in
    /// the other; when both match the header, the response-shaped descriptor
    /// wins.
    pub fn resolve(&self, frame: &Frame) -> Option<&'static CommandDescriptor> {
        let mut matching = self
            .candidates(frame.command_id)
            .iter()
            .copied()
            .filter(|c| c.matches(frame.frame_control, frame.manufacturer_id));
        let first = matching.next()?;
        if first.is_response {
            return Some(first);
        }
        Some(matching.find(|c| c.is_response).unwrap_or(first))
    }
}

/// A response delivered to a waiting caller.
#[derive(Debug)]
struct Response {
    command: &'static CommandDescriptor,
    args: Args,
}

struct PendingRequest {
    request: &'static CommandDescriptor,
    registered_at: Instant,
    resolver: oneshot::Sender<Result<Response, ClusterError>>,
}

impl PendingRequest {
    /// Only response-shaped frames complete a request; a device-initiated
    /// request that happens to reuse the number is handled as unsolicited.
    fn accepts(&self, command: &'static CommandDescriptor) -> bool {
        command.is_response
            || self
                .request
                .response
                .is_some_and(|expected| ptr::eq(expected, command))
    }
}

/// The caller's end of a pending request.
///
/// Dropping it closes the receiver and removes the table entry if it is still
/// there, which covers callers that give up before a response or timeout.
struct PendingWaiter<'a> {
    cluster: &'a BoundCluster,
    sequence: u8,
    receiver: oneshot::Receiver<Result<Response, ClusterError>>,
}

impl Drop for PendingWaiter<'_> {
    fn drop(&mut self) {
        self.receiver.close();
        let mut pending = self.cluster.lock_pending();
        // A closed resolver under our number can only be ours; a request that
        // reused the number after ours completed still has an open receiver.
        let abandoned = pending
            .get(&self.sequence)
            .is_some_and(|p| p.resolver.is_closed());
        if abandoned {
            pending.remove(&self.sequence);
            debug!(cluster = self.cluster.spec.name, sequence = self.sequence, "caller stopped waiting");
        }
    }
}

/// One cluster on one endpoint of a device.
pub struct BoundCluster {
    spec: &'static ClusterSpec,
    endpoint_id: u8,
    role: Role,
    commands: CommandTable,
    sequence: SequenceCounter,
    pending: Mutex<HashMap<u8, PendingRequest>>,
    transport: Arc<dyn Transport>,
    inbound: Option<Arc<dyn InboundHandler>>,
    response_timeout: Duration,
    reject_mixed_manufacturer_scope: bool,
}

impl std::fmt::Debug for BoundCluster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundCluster")
            .field("cluster", &self.spec.name)
            .field("endpoint_id", &self.endpoint_id)
            .field("role", &self.role)
            .field("pending", &self.pending_count())
            .finish_non_exhaustive()
    }
}

impl BoundCluster {
    pub fn new(spec: &'static ClusterSpec, endpoint_id: u8, transport: Arc<dyn Transport>) -> Self {
        Self {
            spec,
            endpoint_id,
            role: Role::default(),
            commands: CommandTable::for_cluster(spec),
            sequence: SequenceCounter::new(),
            pending: Mutex::new(HashMap::new()),
            transport,
            inbound: None,
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
            reject_mixed_manufacturer_scope: false,
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    pub fn with_inbound_handler(mut self, handler: Arc<dyn InboundHandler>) -> Self {
        self.inbound = Some(handler);
        self
    }

    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }

    /// Applies the engine settings from a loaded configuration.
    pub fn with_config(mut self, config: &EngineConfig) -> Self {
        self.response_timeout = config.response_timeout();
        self.reject_mixed_manufacturer_scope = config.reject_mixed_manufacturer_scope;
        self
    }

    /// Starts the sequence counter somewhere other than 0.
    pub fn with_sequence_start(mut self, start: u8) -> Self {
        self.sequence = SequenceCounter::starting_at(start);
        self
    }

    pub fn spec(&self) -> &'static ClusterSpec {
        self.spec
    }

    pub fn endpoint_id(&self) -> u8 {
        self.endpoint_id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn commands(&self) -> &CommandTable {
        &self.commands
    }

    /// Number of requests still waiting for a response.
    pub fn pending_count(&self) -> usize {
        self.lock_pending().len()
    }

    /// Allocates the next transaction sequence number.
    pub fn next_sequence_number(&self) -> u8 {
        self.sequence.next()
    }

    // ── Sending ──────────────────────────────────────────────────────────────

    /// Sends the command called `name`.
    ///
    /// Returns `Ok(None)` for fire-and-forget sends and for a successful
    /// default response, `Ok(Some(args))` for a command-specific response.
    ///
    /// # Errors
    ///
    /// - [`ClusterError::UnknownCommand`] if the cluster has no such command.
    /// - [`ClusterError::Timeout`] if no response arrives in time.
    /// - [`ClusterError::RemoteStatus`] for a failed default response.
    /// - [`ClusterError::Transport`] if the frame could not be sent.
    pub async fn send_command(
        &self,
        name: &str,
        args: Args,
        options: SendOptions,
    ) -> Result<Option<Args>, ClusterError> {
        let command = self
            .commands
            .get(name)
            .ok_or_else(|| ClusterError::UnknownCommand {
                cluster: self.spec.name,
                command: name.to_string(),
            })?;
        self.send(command, args, options).await
    }

    async fn send(
        &self,
        command: &'static CommandDescriptor,
        args: Args,
        options: SendOptions,
    ) -> Result<Option<Args>, ClusterError> {
        let payload = encode_args(command.args, &args)?;
        let manufacturer_id = match command.manufacturer_id {
            Some(id) => Some(id),
            None if command.global => options.manufacturer_id,
            None => None,
        };
        let sequence = self.sequence.next();
        let frame = Frame::new(
            self.frame_control_for(command),
            manufacturer_id,
            sequence,
            command.id,
            payload,
        );

        let wait = options.wait_for_response && !frame.frame_control.disable_default_response();
        if !wait {
            debug!(cluster = self.spec.name, command = command.name, sequence, "sending without waiting");
            self.transmit(&frame).await?;
            return Ok(None);
        }

        // Register before transmitting so a fast response cannot overtake us.
        let mut waiter = PendingWaiter {
            cluster: self,
            sequence,
            receiver: self.register_pending(sequence, command)?,
        };
        self.transmit(&frame).await?;

        let response = match tokio::time::timeout(self.response_timeout, &mut waiter.receiver).await {
            Ok(Ok(result)) => result?,
            Ok(Err(_)) => return Err(self.timeout_error(command, sequence)),
            Err(_) => {
                let removed = self.lock_pending().remove(&sequence);
                match removed {
                    Some(_) => {
                        debug!(cluster = self.spec.name, command = command.name, sequence, "request timed out");
                        return Err(self.timeout_error(command, sequence));
                    }
                    // The response won the race after the timer fired.
                    None => match waiter.receiver.try_recv() {
                        Ok(result) => result?,
                        Err(_) => return Err(self.timeout_error(command, sequence)),
                    },
                }
            }
        };

        Self::into_result(command, response)
    }

    fn into_result(
        command: &'static CommandDescriptor,
        response: Response,
    ) -> Result<Option<Args>, ClusterError> {
        if response.command.global && response.command.id == DEFAULT_RESPONSE_ID {
            let status = response.args.status("status").unwrap_or(Status::Failure);
            if !status.is_success() {
                return Err(ClusterError::RemoteStatus {
                    command: command.name,
                    status,
                });
            }
            return Ok(None);
        }
        Ok(Some(response.args))
    }

    fn frame_control_for(&self, command: &CommandDescriptor) -> FrameControl {
        let base = match command.frame_control {
            Some(control) => control,
            None if command.global => FrameControl::empty(),
            None => FrameControl::empty().with(FrameControl::CLUSTER_SPECIFIC),
        };
        let to_client = if command.global {
            self.role == Role::Server
        } else {
            command.direction == Direction::ToClient
        };
        if to_client {
            base.with(FrameControl::DIRECTION_TO_CLIENT)
        } else {
            base
        }
    }

    async fn transmit(&self, frame: &Frame) -> Result<(), ClusterError> {
        debug!(
            cluster = self.spec.name,
            endpoint = self.endpoint_id,
            sequence = frame.sequence_number,
            command_id = frame.command_id,
            control = %frame.frame_control,
            "send frame"
        );
        self.transport
            .send_frame(self.endpoint_id, self.spec.id, frame.encode())
            .await?;
        Ok(())
    }

    fn register_pending(
        &self,
        sequence: u8,
        request: &'static CommandDescriptor,
    ) -> Result<oneshot::Receiver<Result<Response, ClusterError>>, ClusterError> {
        let mut pending = self.lock_pending();
        if let Some(existing) = pending.get(&sequence) {
            error!(
                cluster = self.spec.name,
                sequence,
                waiting = existing.request.name,
                age_ms = existing.registered_at.elapsed().as_millis() as u64,
                "sequence number already pending"
            );
            return Err(ClusterError::SequenceInUse(sequence));
        }
        let (resolver, receiver) = oneshot::channel();
        pending.insert(
            sequence,
            PendingRequest {
                request,
                registered_at: Instant::now(),
                resolver,
            },
        );
        Ok(receiver)
    }

    fn timeout_error(&self, command: &'static CommandDescriptor, sequence: u8) -> ClusterError {
        ClusterError::Timeout {
            command: command.name,
            sequence,
            timeout: self.response_timeout,
        }
    }

    fn lock_pending(&self) -> MutexGuard<'_, HashMap<u8, PendingRequest>> {
        // A panic while holding the lock cannot leave the map half-updated.
        self.pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // ── Receiving ────────────────────────────────────────────────────────────

    /// Processes one inbound frame for this cluster.
    ///
    /// Returns the encoded response frame when an unsolicited command was
    /// answered by the inbound handler; the caller transmits it.
    pub fn handle_frame(
        &self,
        bytes: &[u8],
        meta: &FrameMeta,
    ) -> Result<Option<Vec<u8>>, ClusterError> {
        let frame = Frame::decode(bytes)?;
        debug!(
            cluster = self.spec.name,
            endpoint = meta.endpoint_id,
            sequence = frame.sequence_number,
            command_id = frame.command_id,
            control = %frame.frame_control,
            "handle frame"
        );

        let Some(command) = self.commands.resolve(&frame) else {
            debug!(
                cluster = self.spec.name,
                command_id = frame.command_id,
                "no command descriptor matches frame"
            );
            return Ok(None);
        };

        let pending = {
            let mut table = self.lock_pending();
            match table.get(&frame.sequence_number) {
                Some(p) if p.accepts(command) => table.remove(&frame.sequence_number),
                _ => None,
            }
        };

        if let Some(pending) = pending {
            let result = decode_args(command.args, &frame.payload)
                .map(|args| Response { command, args })
                .map_err(ClusterError::from);
            if pending.resolver.send(result).is_err() {
                debug!(sequence = frame.sequence_number, "caller stopped waiting");
            }
            return Ok(None);
        }

        let args = decode_args(command.args, &frame.payload)?;
        self.dispatch_unsolicited(&frame, command, args, meta)
    }

    fn dispatch_unsolicited(
        &self,
        frame: &Frame,
        command: &'static CommandDescriptor,
        args: Args,
        meta: &FrameMeta,
    ) -> Result<Option<Vec<u8>>, ClusterError> {
        let Some(handler) = &self.inbound else {
            debug!(cluster = self.spec.name, command = command.name, "no inbound handler");
            return Ok(None);
        };

        if command.global && command.id == REPORT_ATTRIBUTES_ID {
            let values = self.name_reported_attributes(args);
            handler.on_attributes_reported(self.spec, &values, meta);
            return Ok(None);
        }

        let reply = handler.on_command(command, &args, meta);
        let (Some(reply), Some(response)) = (reply, command.response) else {
            return Ok(None);
        };

        let mut control = if command.global {
            FrameControl::empty()
        } else {
            FrameControl::empty().with(FrameControl::CLUSTER_SPECIFIC)
        }
        .with(FrameControl::DISABLE_DEFAULT_RESPONSE);
        if !frame.frame_control.direction_to_client() {
            control = control.with(FrameControl::DIRECTION_TO_CLIENT);
        }
        let payload = encode_args(response.args, &reply)?;
        let out = Frame::new(
            control,
            frame.manufacturer_id,
            frame.sequence_number,
            response.id,
            payload,
        );
        debug!(
            cluster = self.spec.name,
            command = response.name,
            sequence = out.sequence_number,
            "answering unsolicited command"
        );
        Ok(Some(out.encode()))
    }

    fn name_reported_attributes(&self, mut args: Args) -> HashMap<&'static str, Value> {
        let Some(Arg::WriteRecords(records)) = args.take(ATTRIBUTES_ARG) else {
            return HashMap::new();
        };
        let mut values = HashMap::with_capacity(records.len());
        for record in records {
            let name = self
                .spec
                .client_attribute_by_id(record.id)
                .or_else(|| self.spec.attribute_by_id(record.id))
                .map(|a| a.name);
            match name {
                Some(name) => {
                    values.insert(name, record.value);
                }
                None => debug!(
                    cluster = self.spec.name,
                    attribute_id = record.id,
                    "report for unknown attribute"
                ),
            }
        }
        values
    }

    // ── Attributes ───────────────────────────────────────────────────────────

    fn attribute_table(&self) -> &'static [AttributeDescriptor] {
        match self.role {
            Role::Server => self.spec.client_attributes,
            Role::Client => self.spec.attributes,
        }
    }

    fn lookup_attribute(&self, name: &str) -> Result<&'static AttributeDescriptor, ClusterError> {
        self.attribute_table()
            .iter()
            .find(|a| a.name == name)
            .ok_or_else(|| ClusterError::UnknownAttribute {
                cluster: self.spec.name,
                attribute: name.to_string(),
            })
    }

    /// Manufacturer id to put on a frame addressing `attributes`.
    fn manufacturer_scope(
        &self,
        attributes: &[&'static AttributeDescriptor],
    ) -> Result<Option<u16>, ClusterError> {
        let scoped: Vec<u16> = attributes.iter().filter_map(|a| a.manufacturer_id).collect();
        let distinct: BTreeSet<u16> = scoped.iter().copied().collect();
        let names = || attributes.iter().map(|a| a.name).collect::<Vec<_>>();

        if distinct.len() > 1 {
            return Err(ClusterError::MixedManufacturerIds(names()));
        }
        if !scoped.is_empty() && scoped.len() != attributes.len() {
            if self.reject_mixed_manufacturer_scope {
                return Err(ClusterError::MixedManufacturerIds(names()));
            }
            warn!(
                cluster = self.spec.name,
                attributes = ?names(),
                "manufacturer-specific attributes mixed with standard ones; sending without manufacturer id"
            );
            return Ok(None);
        }
        Ok(scoped.first().copied())
    }

    /// Reads attributes by name.  An empty slice reads every attribute of the
    /// current namespace.
    ///
    /// Attributes the device reports with a failure status are left out of
    /// the result rather than failing the call.
    pub async fn read_attributes(
        &self,
        names: &[&str],
    ) -> Result<HashMap<&'static str, Value>, ClusterError> {
        let mut outstanding: Vec<&'static AttributeDescriptor> = if names.is_empty() {
            self.attribute_table().iter().collect()
        } else {
            names
                .iter()
                .map(|n| self.lookup_attribute(n))
                .collect::<Result<_, _>>()?
        };
        let mut seen = HashSet::new();
        outstanding.retain(|a| seen.insert(a.id));

        let mut values = HashMap::new();
        while !outstanding.is_empty() {
            let manufacturer_id = self.manufacturer_scope(&outstanding)?;
            let ids: Vec<u16> = outstanding.iter().map(|a| a.id).collect();
            debug!(cluster = self.spec.name, ?ids, ?manufacturer_id, "read attributes");

            let args = Args::new().with(ATTRIBUTES_ARG, Arg::AttributeIds(ids));
            let options = SendOptions {
                manufacturer_id,
                ..SendOptions::default()
            };
            let records = match self.send(&READ_ATTRIBUTES, args, options).await? {
                Some(mut response) => match response.take(ATTRIBUTES_ARG) {
                    Some(Arg::ReadRecords(records)) => records,
                    _ => Vec::new(),
                },
                None => Vec::new(),
            };
            if records.is_empty() {
                break;
            }

            let before = outstanding.len();
            for record in records {
                let Some(index) = outstanding.iter().position(|a| a.id == record.id) else {
                    continue;
                };
                let attribute = outstanding.remove(index);
                match record.value {
                    Some((_, value)) if record.status.is_success() => {
                        values.insert(attribute.name, value);
                    }
                    _ => debug!(
                        cluster = self.spec.name,
                        attribute = attribute.name,
                        status = %record.status,
                        "attribute read failed"
                    ),
                }
            }
            if outstanding.len() == before {
                warn!(cluster = self.spec.name, "read response answered none of the requested attributes");
                break;
            }
        }
        Ok(values)
    }

    /// Writes attributes in one writeAttributes command.
    ///
    /// # Errors
    ///
    /// [`ClusterError::RemoteStatus`] carrying the first failed record's status.
    pub async fn write_attributes(&self, values: &[(&str, Value)]) -> Result<(), ClusterError> {
        if values.is_empty() {
            return Ok(());
        }
        let mut attributes = Vec::with_capacity(values.len());
        let mut records = Vec::with_capacity(values.len());
        for (name, value) in values {
            let attribute = self.lookup_attribute(name)?;
            attributes.push(attribute);
            records.push(WriteRecord {
                id: attribute.id,
                data_type: attribute.data_type,
                value: value.clone(),
            });
        }
        let manufacturer_id = self.manufacturer_scope(&attributes)?;
        debug!(cluster = self.spec.name, ?manufacturer_id, count = records.len(), "write attributes");

        let args = Args::new().with(ATTRIBUTES_ARG, Arg::WriteRecords(records));
        let options = SendOptions {
            manufacturer_id,
            ..SendOptions::default()
        };
        let response = self.send(&WRITE_ATTRIBUTES, args, options).await?;

        if let Some(Arg::WriteStatusRecords(statuses)) = response.as_ref().and_then(|r| r.get(ATTRIBUTES_ARG)) {
            if let Some(failed) = statuses.iter().find(|s| !s.status.is_success()) {
                warn!(
                    cluster = self.spec.name,
                    attribute_id = ?failed.id,
                    status = %failed.status,
                    "attribute write rejected"
                );
                return Err(ClusterError::RemoteStatus {
                    command: WRITE_ATTRIBUTES.name,
                    status: failed.status,
                });
            }
        }
        Ok(())
    }
}
