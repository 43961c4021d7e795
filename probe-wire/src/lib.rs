//! Wire-format definitions shared between a kernel-side event producer and
//! this repository's user-space consumer. Kept dependency-light and
//! `no_std`-friendly in spirit (though built against std) so it could be
//! vendored by a producer crate without pulling in the daemon's stack.

use serde::{Deserialize, Serialize};

/// Length of the fixed `comm` field in [`MetaHeader`](../probed/struct.MetaHeader.html).
pub const COMM_LEN: usize = 16;

/// Length of each fixed utsname-style string in the system identification block.
pub const UTS_FIELD_LEN: usize = 65;

/// Byte size of the fixed portion of the metadata header, field-by-field:
/// 4 (event_id) + 1 (nparams) + 4 (syscall_id) + 8 (timestamp_ns) + 2 (processor)
/// + 8 (start_time_ns) + 8*4 (host_pid..gid) + 5*8 (cgroup_id..parent_exec_id)
/// + COMM_LEN + 6*UTS_FIELD_LEN
pub const META_HEADER_SIZE: usize =
    4 + 1 + 4 + 8 + 2 + 8 + (8 * 4) + (5 * 8) + COMM_LEN + (6 * UTS_FIELD_LEN);

/// The closed set of parameter shapes a schema entry may declare. Each
/// variant fixes how many bytes a decoder consumes and how it interprets
/// them; only `Str`, `StrArr`, `ByteArr`, and `SockAddr` are length-prefixed
/// or variant-tagged rather than fixed width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamType {
    U8,
    U16,
    U32,
    U64,
    S8,
    S16,
    S32,
    S64,
    Str,
    StrArr,
    ByteArr,
    SockAddr,
    Ipv6,
    IovecArr,
    None,
}

/// Event-id tags as emitted in [`MetaHeader::event_id`]. The schema registry
/// is the authority mapping these to names/syscall-ids/params; these
/// constants exist so schema construction and tests can refer to them by
/// name instead of magic numbers.
pub mod event_id {
    pub const SYS_EXECVE_ENTRY: i32 = 2;
    pub const SYS_EXECVE_EXIT: i32 = 3;
    pub const SYS_EXECVEAT_ENTRY: i32 = 4;
    pub const SYS_EXECVEAT_EXIT: i32 = 5;
    pub const SYS_CLONE_ENTRY: i32 = 6;
    pub const SYS_CLONE_EXIT: i32 = 7;
    pub const SYS_CLOSE_ENTRY: i32 = 8;
    pub const SYS_CLOSE_EXIT: i32 = 9;
    pub const SYS_READ_ENTRY: i32 = 10;
    pub const SYS_READ_EXIT: i32 = 11;
    pub const SYS_WRITE_ENTRY: i32 = 12;
    pub const SYS_WRITE_EXIT: i32 = 13;
    pub const SYS_OPEN_ENTRY: i32 = 14;
    pub const SYS_OPEN_EXIT: i32 = 15;
    pub const SYS_READV_ENTRY: i32 = 16;
    pub const SYS_READV_EXIT: i32 = 17;
    pub const SYS_WRITEV_ENTRY: i32 = 18;
    pub const SYS_WRITEV_EXIT: i32 = 19;
    pub const SYS_OPENAT_ENTRY: i32 = 20;
    pub const SYS_OPENAT_EXIT: i32 = 21;
    pub const SYS_OPENAT2_ENTRY: i32 = 22;
    pub const SYS_OPENAT2_EXIT: i32 = 23;
    pub const SYS_LISTEN_ENTRY: i32 = 24;
    pub const SYS_LISTEN_EXIT: i32 = 25;
    pub const SYS_SOCKET_ENTRY: i32 = 26;
    pub const SYS_SOCKET_EXIT: i32 = 27;
    pub const SYS_ACCEPT_ENTRY: i32 = 28;
    pub const SYS_ACCEPT_EXIT: i32 = 29;
    pub const SYS_BIND_ENTRY: i32 = 30;
    pub const SYS_BIND_EXIT: i32 = 31;
    pub const SYS_CONNECT_ENTRY: i32 = 32;
    pub const SYS_CONNECT_EXIT: i32 = 33;
}

/// Socket address families the `SockAddr` param type knows how to decode.
pub mod af {
    pub const AF_UNIX: u8 = 1;
    pub const AF_INET: u8 = 2;
    pub const AF_INET6: u8 = 10;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meta_header_size_matches_field_layout() {
        assert_eq!(META_HEADER_SIZE, 4 + 1 + 4 + 8 + 2 + 8 + 32 + 40 + 16 + 390);
    }

    #[test]
    fn param_type_is_hashable_for_schema_maps() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(ParamType::Str);
        assert!(set.contains(&ParamType::Str));
    }
}
