//! Static, process-wide catalogue mapping event-id to its schema: name,
//! canonical syscall id, and ordered parameter list. Built once at startup
//! by [`build_catalogue`] and exposed read-only through [`schema_for`].

use crate::error::DecodeError;
use crate::formatters;
use once_cell::sync::Lazy;
use probe_wire::{event_id, ParamType};
use std::collections::HashMap;

pub type FormatterFn = fn(i64) -> String;

#[derive(Clone, Copy)]
pub struct ParamSchema {
    pub name: &'static str,
    pub ty: ParamType,
    pub native_type_label: &'static str,
    pub formatter: Option<FormatterFn>,
}

const fn param(name: &'static str, ty: ParamType, native: &'static str) -> ParamSchema {
    ParamSchema {
        name,
        ty,
        native_type_label: native,
        formatter: None,
    }
}

fn fparam(
    name: &'static str,
    ty: ParamType,
    native: &'static str,
    formatter: FormatterFn,
) -> ParamSchema {
    ParamSchema {
        name,
        ty,
        native_type_label: native,
        formatter: Some(formatter),
    }
}

pub struct EventSchema {
    pub event_id: i32,
    pub name: &'static str,
    pub syscall_id: i32,
    pub params: Vec<ParamSchema>,
}

static CATALOGUE: Lazy<HashMap<i32, EventSchema>> = Lazy::new(build_catalogue);

/// Constructs the hard-coded list of supported syscalls (entry/return pairs)
/// and indexes them by event-id tag. Pure function; called once behind the
/// `Lazy` above so the table is immutable for the life of the process.
fn build_catalogue() -> HashMap<i32, EventSchema> {
    use ParamType::*;
    let mut m = HashMap::new();

    let mut insert = |event_id: i32, name: &'static str, syscall_id: i32, params: Vec<ParamSchema>| {
        m.insert(
            event_id,
            EventSchema {
                event_id,
                name,
                syscall_id,
                params,
            },
        );
    };

    insert(
        event_id::SYS_EXECVE_ENTRY,
        "sys_execve_entry",
        59,
        vec![
            param("filename", Str, "char*"),
            param("argv", StrArr, "char**"),
            param("envp", StrArr, "char**"),
        ],
    );
    insert(
        event_id::SYS_EXECVE_EXIT,
        "sys_execve_exit",
        59,
        vec![param("return", S32, "int")],
    );
    insert(
        event_id::SYS_EXECVEAT_ENTRY,
        "sys_execveat_entry",
        322,
        vec![
            fparam("fd", S32, "int", formatters::execveat_dir),
            param("filename", Str, "char*"),
            param("argv", StrArr, "char**"),
            param("envp", StrArr, "char**"),
            fparam("flags", S32, "int", formatters::execveat_flags),
        ],
    );
    insert(
        event_id::SYS_EXECVEAT_EXIT,
        "sys_execveat_exit",
        322,
        vec![param("return", S32, "int")],
    );
    insert(
        event_id::SYS_CLONE_ENTRY,
        "sys_clone_entry",
        56,
        vec![
            fparam("clone_flags", U64, "unsigned long", formatters::clone_flags),
            param("newsp", S64, "unsigned long"),
            param("parent_tid", S32, "int*"),
            param("child_tid", S32, "int*"),
            param("tls", S64, "unsigned long"),
        ],
    );
    insert(
        event_id::SYS_CLONE_EXIT,
        "sys_clone_exit",
        56,
        vec![param("return", S32, "int")],
    );
    insert(
        event_id::SYS_CLOSE_ENTRY,
        "sys_close_entry",
        3,
        vec![param("fd", S32, "int")],
    );
    insert(
        event_id::SYS_CLOSE_EXIT,
        "sys_close_exit",
        3,
        vec![param("return", S32, "int")],
    );
    insert(
        event_id::SYS_READ_ENTRY,
        "sys_read_entry",
        0,
        vec![
            param("fd", S32, "int"),
            param("buf", ByteArr, "char*"),
            param("count", U32, "size_t"),
        ],
    );
    insert(
        event_id::SYS_READ_EXIT,
        "sys_read_exit",
        0,
        vec![param("return", S64, "ssize_t")],
    );
    insert(
        event_id::SYS_WRITE_ENTRY,
        "sys_write_entry",
        1,
        vec![
            param("fd", S32, "int"),
            param("buf", ByteArr, "char*"),
            param("count", U32, "size_t"),
        ],
    );
    insert(
        event_id::SYS_WRITE_EXIT,
        "sys_write_exit",
        1,
        vec![param("return", S64, "ssize_t")],
    );
    insert(
        event_id::SYS_OPEN_ENTRY,
        "sys_open_entry",
        2,
        vec![
            param("filename", Str, "char*"),
            fparam("flags", S32, "int", formatters::open_flags),
            fparam("mode", U32, "mode_t", formatters::open_mode),
        ],
    );
    insert(
        event_id::SYS_OPEN_EXIT,
        "sys_open_exit",
        2,
        vec![param("return", U32, "int")],
    );
    insert(
        event_id::SYS_READV_ENTRY,
        "sys_readv_entry",
        19,
        vec![
            param("fd", S32, "int"),
            param("vec", ByteArr, "iovec*"),
            param("vlen", S32, "int"),
        ],
    );
    insert(
        event_id::SYS_READV_EXIT,
        "sys_readv_exit",
        19,
        vec![param("return", S64, "ssize_t")],
    );
    insert(
        event_id::SYS_WRITEV_ENTRY,
        "sys_writev_entry",
        20,
        vec![
            param("fd", S32, "int"),
            param("vec", ByteArr, "iovec*"),
            param("vlen", S32, "int"),
        ],
    );
    insert(
        event_id::SYS_WRITEV_EXIT,
        "sys_writev_exit",
        20,
        vec![param("return", S64, "ssize_t")],
    );
    insert(
        event_id::SYS_OPENAT_ENTRY,
        "sys_openat_entry",
        257,
        vec![
            fparam("dfd", S32, "int", formatters::execveat_dir),
            param("filename", Str, "char*"),
            fparam("flags", S32, "int", formatters::open_flags),
            fparam("mode", U32, "mode_t", formatters::open_mode),
        ],
    );
    insert(
        event_id::SYS_OPENAT_EXIT,
        "sys_openat_exit",
        257,
        vec![param("return", U32, "int")],
    );
    insert(
        event_id::SYS_OPENAT2_ENTRY,
        "sys_openat2_entry",
        437,
        vec![
            fparam("dfd", S32, "int", formatters::execveat_dir),
            param("filename", Str, "char*"),
            fparam("flags", S64, "u64", formatters::openat2_flags),
            fparam("mode", S64, "u64", formatters::openat2_mode),
            fparam("resolve", S64, "u64", formatters::openat2_resolve),
            param("usize", S32, "size_t"),
        ],
    );
    insert(
        event_id::SYS_OPENAT2_EXIT,
        "sys_openat2_exit",
        437,
        vec![param("return", S64, "int")],
    );
    insert(
        event_id::SYS_LISTEN_ENTRY,
        "sys_listen_entry",
        50,
        vec![param("fd", S32, "int"), param("backlog", S32, "int")],
    );
    insert(
        event_id::SYS_LISTEN_EXIT,
        "sys_listen_exit",
        50,
        vec![param("return", S32, "int")],
    );
    insert(
        event_id::SYS_SOCKET_ENTRY,
        "sys_socket_entry",
        41,
        vec![
            fparam("family", S32, "int", formatters::socket_family),
            fparam("type", S32, "int", formatters::socket_type),
            fparam("protocol", S32, "int", formatters::socket_protocol),
        ],
    );
    insert(
        event_id::SYS_SOCKET_EXIT,
        "sys_socket_exit",
        41,
        vec![param("return", S32, "int")],
    );
    insert(
        event_id::SYS_ACCEPT_ENTRY,
        "sys_accept_entry",
        43,
        vec![
            param("fd", S32, "int"),
            param("upeer_sockaddr", SockAddr, "sockaddr*"),
            param("upper_addrlen", S32, "int*"),
        ],
    );
    insert(
        event_id::SYS_ACCEPT_EXIT,
        "sys_accept_exit",
        43,
        vec![param("return", S32, "int")],
    );
    insert(
        event_id::SYS_BIND_ENTRY,
        "sys_bind_entry",
        49,
        vec![
            param("fd", S32, "int"),
            param("umyaddr", SockAddr, "sockaddr*"),
            param("addrlen", S32, "int"),
        ],
    );
    insert(
        event_id::SYS_BIND_EXIT,
        "sys_bind_exit",
        49,
        vec![param("return", S32, "int")],
    );
    insert(
        event_id::SYS_CONNECT_ENTRY,
        "sys_connect_entry",
        42,
        vec![
            param("fd", S32, "int"),
            param("uservaddr", SockAddr, "sockaddr*"),
            param("addrlen", S32, "int"),
        ],
    );
    insert(
        event_id::SYS_CONNECT_EXIT,
        "sys_connect_exit",
        42,
        vec![param("return", S32, "int")],
    );

    m
}

/// Look up the schema for an event-id tag. Lock-free: the table is built
/// once and only ever read thereafter.
pub fn schema_for(tag: i32) -> Result<&'static EventSchema, DecodeError> {
    CATALOGUE
        .get(&tag)
        .ok_or(DecodeError::MissingEvent { event_id: tag })
}
