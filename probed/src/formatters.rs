//! Pure functions translating raw syscall flag/mode/family integers into
//! human-readable strings. Each formatter takes the parameter's raw value as
//! `i64` (the widest native type any parameter decodes to, see
//! [`crate::bytestream::ParamValue::as_i64`]) and returns the formatted
//! string; none of them can fail, since every input bit pattern is valid (an
//! unrecognised bit is simply omitted rather than rejected).

const AT_FDCWD: i64 = -100;

fn join_bits(raw: i64, bits: &[(i64, &str)], zero_symbol: &str) -> String {
    if raw == 0 {
        return zero_symbol.to_string();
    }
    let names: Vec<&str> = bits
        .iter()
        .filter(|(mask, _)| *mask != 0 && raw & mask == *mask)
        .map(|(_, name)| *name)
        .collect();
    if names.is_empty() {
        format!("0x{raw:x}")
    } else {
        names.join("|")
    }
}

/// `open(2)` / `openat(2)` flags. Access mode (the low two bits) is
/// exclusive; the remaining bits are an additive bitmask.
pub fn open_flags(raw: i64) -> String {
    const ACCMODE: i64 = 0x3;
    let mode = match raw & ACCMODE {
        0 => "O_RDONLY",
        1 => "O_WRONLY",
        2 => "O_RDWR",
        _ => "O_RDONLY",
    };
    let rest = raw & !ACCMODE;
    let extra = join_bits(
        rest,
        &[
            (0o100, "O_CREAT"),
            (0o200, "O_EXCL"),
            (0o400, "O_NOCTTY"),
            (0o1000, "O_TRUNC"),
            (0o2000, "O_APPEND"),
            (0o4000, "O_NONBLOCK"),
            (0o10000, "O_DSYNC"),
            (0o20000, "O_ASYNC"),
            (0o40000, "O_DIRECT"),
            (0o100000, "O_LARGEFILE"),
            (0o200000, "O_DIRECTORY"),
            (0o400000, "O_NOFOLLOW"),
            (0o1000000, "O_NOATIME"),
            (0o2000000, "O_CLOEXEC"),
            (0o4010000, "O_SYNC"),
            (0o10000000, "O_PATH"),
            (0o20200000, "O_TMPFILE"),
        ],
        "",
    );
    if extra.is_empty() {
        mode.to_string()
    } else {
        format!("{mode}|{extra}")
    }
}

/// Mode bits for `open(2)`/`openat(2)`'s third argument.
pub fn open_mode(raw: i64) -> String {
    join_bits(
        raw,
        &[
            (0o4000, "S_ISUID"),
            (0o2000, "S_ISGID"),
            (0o1000, "S_ISVTX"),
            (0o400, "S_IRUSR"),
            (0o200, "S_IWUSR"),
            (0o100, "S_IXUSR"),
            (0o40, "S_IRGRP"),
            (0o20, "S_IWGRP"),
            (0o10, "S_IXGRP"),
            (0o4, "S_IROTH"),
            (0o2, "S_IWOTH"),
            (0o1, "S_IXOTH"),
        ],
        "0",
    )
}

/// `openat2(2)` flags — identical bit layout to `open_flags`.
pub fn openat2_flags(raw: i64) -> String {
    open_flags(raw)
}

/// `openat2(2)` mode — identical bit layout to `open_mode`.
pub fn openat2_mode(raw: i64) -> String {
    open_mode(raw)
}

/// `openat2(2)` `resolve` bitmask.
pub fn openat2_resolve(raw: i64) -> String {
    join_bits(
        raw,
        &[
            (0x01, "RESOLVE_NO_XDEV"),
            (0x02, "RESOLVE_NO_MAGICLINKS"),
            (0x04, "RESOLVE_NO_SYMLINKS"),
            (0x08, "RESOLVE_BENEATH"),
            (0x10, "RESOLVE_IN_ROOT"),
            (0x20, "RESOLVE_CACHED"),
        ],
        "0",
    )
}

/// `clone(2)` flags.
pub fn clone_flags(raw: i64) -> String {
    join_bits(
        raw,
        &[
            (0x00000100, "CLONE_VM"),
            (0x00000200, "CLONE_FS"),
            (0x00000400, "CLONE_FILES"),
            (0x00000800, "CLONE_SIGHAND"),
            (0x00002000, "CLONE_PTRACE"),
            (0x00004000, "CLONE_VFORK"),
            (0x00008000, "CLONE_PARENT"),
            (0x00010000, "CLONE_THREAD"),
            (0x00020000, "CLONE_NEWNS"),
            (0x00040000, "CLONE_SYSVSEM"),
            (0x00080000, "CLONE_SETTLS"),
            (0x00100000, "CLONE_PARENT_SETTID"),
            (0x00200000, "CLONE_CHILD_CLEARTID"),
            (0x00400000, "CLONE_DETACHED"),
            (0x00800000, "CLONE_UNTRACED"),
            (0x01000000, "CLONE_CHILD_SETTID"),
            (0x02000000, "CLONE_NEWCGROUP"),
            (0x04000000, "CLONE_NEWUTS"),
            (0x08000000, "CLONE_NEWIPC"),
            (0x10000000, "CLONE_NEWUSER"),
            (0x20000000, "CLONE_NEWPID"),
            (0x40000000, "CLONE_NEWNET"),
            (0x80000000, "CLONE_IO"),
        ],
        "0",
    )
}

/// `socket(2)` address family.
pub fn socket_family(raw: i64) -> String {
    match raw {
        1 => "AF_UNIX".to_string(),
        2 => "AF_INET".to_string(),
        10 => "AF_INET6".to_string(),
        16 => "AF_NETLINK".to_string(),
        _ => format!("AF_{raw}"),
    }
}

/// `socket(2)` type, with the `SOCK_NONBLOCK`/`SOCK_CLOEXEC` flag bits
/// reported separately from the base type.
pub fn socket_type(raw: i64) -> String {
    let base = raw & 0xf;
    let name = match base {
        1 => "SOCK_STREAM",
        2 => "SOCK_DGRAM",
        3 => "SOCK_RAW",
        4 => "SOCK_RDM",
        5 => "SOCK_SEQPACKET",
        6 => "SOCK_DCCP",
        10 => "SOCK_PACKET",
        _ => return format!("SOCK_{raw}"),
    };
    let mut out = name.to_string();
    if raw & 0o4000 != 0 {
        out.push_str("|SOCK_NONBLOCK");
    }
    if raw & 0o2000000 != 0 {
        out.push_str("|SOCK_CLOEXEC");
    }
    out
}

/// `socket(2)` protocol.
pub fn socket_protocol(raw: i64) -> String {
    match raw {
        0 => "IPPROTO_IP".to_string(),
        1 => "IPPROTO_ICMP".to_string(),
        6 => "IPPROTO_TCP".to_string(),
        17 => "IPPROTO_UDP".to_string(),
        255 => "IPPROTO_RAW".to_string(),
        _ => format!("IPPROTO_{raw}"),
    }
}

/// `execveat(2)`/`openat(2)`/`openat2(2)` directory file descriptor.
/// `AT_FDCWD` is rendered symbolically; anything else is decimal.
pub fn execveat_dir(raw: i64) -> String {
    if raw == AT_FDCWD {
        "AT_FDCWD".to_string()
    } else {
        raw.to_string()
    }
}

/// `execveat(2)` flags.
pub fn execveat_flags(raw: i64) -> String {
    join_bits(
        raw,
        &[(0x1000, "AT_EMPTY_PATH"), (0x100, "AT_SYMLINK_NOFOLLOW")],
        "0",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_flags_zero_is_rdonly() {
        assert_eq!(open_flags(0), "O_RDONLY");
    }

    #[test]
    fn open_flags_combines_access_mode_and_creat() {
        // O_WRONLY|O_CREAT == 1 | 0o100
        assert_eq!(open_flags(1 | 0o100), "O_WRONLY|O_CREAT");
    }

    #[test]
    fn open_mode_matches_spec_scenario_s2() {
        assert_eq!(open_mode(0o644), "S_IRUSR|S_IWUSR|S_IRGRP|S_IROTH");
    }

    #[test]
    fn open_mode_zero_renders_zero_symbol() {
        assert_eq!(open_mode(0), "0");
    }

    #[test]
    fn clone_flags_joins_multiple_bits() {
        assert_eq!(
            clone_flags(0x00000100 | 0x00000200),
            "CLONE_VM|CLONE_FS"
        );
    }

    #[test]
    fn socket_family_known_and_unknown() {
        assert_eq!(socket_family(2), "AF_INET");
        assert_eq!(socket_family(999), "AF_999");
    }

    #[test]
    fn socket_type_reports_flags_separately() {
        assert_eq!(socket_type(1 | 0o4000), "SOCK_STREAM|SOCK_NONBLOCK");
    }

    #[test]
    fn execveat_dir_special_cases_at_fdcwd() {
        assert_eq!(execveat_dir(AT_FDCWD), "AT_FDCWD");
        assert_eq!(execveat_dir(4), "4");
    }

    #[test]
    fn openat2_resolve_zero_is_zero_symbol() {
        assert_eq!(openat2_resolve(0), "0");
        assert_eq!(openat2_resolve(0x08 | 0x01), "RESOLVE_NO_XDEV|RESOLVE_BENEATH");
    }
}
