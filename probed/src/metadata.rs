//! Fixed-layout header parser: decodes `MetaHeader`, the first
//! [`probe_wire::META_HEADER_SIZE`] bytes of every record, into task and
//! system identification fields.

use crate::bytestream::ByteStream;
use crate::error::DecodeError;
use probe_wire::{COMM_LEN, UTS_FIELD_LEN};
use serde::Serialize;

/// Host/kernel identification strings, byte-exact with the `utsname` block
/// the kernel producer copies into every record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostDetails {
    pub sysname: String,
    pub nodename: String,
    pub release: String,
    pub version: String,
    pub machine: String,
    pub domainname: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetaHeader {
    pub event_id: i32,
    pub nparams: u8,
    pub syscall_id: i32,
    pub timestamp_ns: u64,
    pub processor: u16,
    pub start_time_ns: u64,
    pub host_pid: u32,
    pub host_tgid: u32,
    pub host_ppid: u32,
    pub pid: u32,
    pub tgid: u32,
    pub ppid: u32,
    pub uid: u32,
    pub gid: u32,
    pub cgroup_id: u64,
    pub mount_ns_id: u64,
    pub pid_ns_id: u64,
    pub exec_id: u64,
    pub parent_exec_id: u64,
    pub comm: String,
    pub host: HostDetails,
}

/// Parses `MetaHeader` from the start of `stream`. On success, `stream`'s
/// cursor sits immediately after the fixed header, ready for the
/// directory/executable strings.
pub fn decode(stream: &mut ByteStream<'_>) -> Result<MetaHeader, DecodeError> {
    let event_id = stream.read_i32()?;
    let nparams = stream.read_u8()?;
    let syscall_id = stream.read_i32()?;
    let timestamp_ns = stream.read_u64()?;
    let processor = stream.read_u16()?;

    let start_time_ns = stream.read_u64()?;
    let host_pid = stream.read_u32()?;
    let host_tgid = stream.read_u32()?;
    let host_ppid = stream.read_u32()?;
    let pid = stream.read_u32()?;
    let tgid = stream.read_u32()?;
    let ppid = stream.read_u32()?;
    let uid = stream.read_u32()?;
    let gid = stream.read_u32()?;
    let cgroup_id = stream.read_u64()?;
    let mount_ns_id = stream.read_u64()?;
    let pid_ns_id = stream.read_u64()?;
    let exec_id = stream.read_u64()?;
    let parent_exec_id = stream.read_u64()?;
    let comm = stream.read_fixed_cstr(COMM_LEN)?;

    let host = HostDetails {
        sysname: stream.read_fixed_cstr(UTS_FIELD_LEN)?,
        nodename: stream.read_fixed_cstr(UTS_FIELD_LEN)?,
        release: stream.read_fixed_cstr(UTS_FIELD_LEN)?,
        version: stream.read_fixed_cstr(UTS_FIELD_LEN)?,
        machine: stream.read_fixed_cstr(UTS_FIELD_LEN)?,
        domainname: stream.read_fixed_cstr(UTS_FIELD_LEN)?,
    };

    Ok(MetaHeader {
        event_id,
        nparams,
        syscall_id,
        timestamp_ns,
        processor,
        start_time_ns,
        host_pid,
        host_tgid,
        host_ppid,
        pid,
        tgid,
        ppid,
        uid,
        gid,
        cgroup_id,
        mount_ns_id,
        pid_ns_id,
        exec_id,
        parent_exec_id,
        comm,
        host,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_header_bytes(event_id: i32, nparams: u8, syscall_id: i32) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&event_id.to_le_bytes());
        buf.push(nparams);
        buf.extend_from_slice(&syscall_id.to_le_bytes());
        buf.extend_from_slice(&0u64.to_le_bytes()); // timestamp_ns
        buf.extend_from_slice(&0u16.to_le_bytes()); // processor
        buf.extend_from_slice(&0u64.to_le_bytes()); // start_time_ns
        for _ in 0..8 {
            buf.extend_from_slice(&0u32.to_le_bytes()); // host_pid..gid
        }
        for _ in 0..5 {
            buf.extend_from_slice(&0u64.to_le_bytes()); // cgroup_id..parent_exec_id
        }
        let mut comm = [0u8; COMM_LEN];
        comm[..4].copy_from_slice(b"bash");
        buf.extend_from_slice(&comm);
        for _ in 0..6 {
            buf.extend_from_slice(&[0u8; UTS_FIELD_LEN]);
        }
        buf
    }

    #[test]
    fn decodes_fixed_header_fields() {
        let bytes = sample_header_bytes(2, 3, 0);
        let mut stream = ByteStream::new(&bytes, 0);
        let header = decode(&mut stream).unwrap();
        assert_eq!(header.event_id, 2);
        assert_eq!(header.nparams, 3);
        assert_eq!(header.comm, "bash");
        assert_eq!(stream.position(), probe_wire::META_HEADER_SIZE);
    }

    #[test]
    fn short_buffer_is_underrun() {
        let bytes = vec![0u8; 4];
        let mut stream = ByteStream::new(&bytes, 0);
        assert!(decode(&mut stream).is_err());
    }
}
