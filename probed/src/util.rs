//! Primitive helpers shared by the metadata decoder and byte-stream reader:
//! little-endian integer reads, NUL-terminated fixed-array-to-string
//! conversion, IPv4/IPv6 formatting, and network-byte-order conversion.

/// 16-bit network-to-host byte order conversion (big-endian wire value to
/// native `u16`). On a little-endian host this is a byte swap; implemented
/// explicitly rather than relying on host endianness assumptions.
pub fn ntohs(value: u16) -> u16 {
    u16::from_be(value)
}

/// Decode a fixed-size, NUL-padded byte array to a `String`, truncating at
/// the first NUL byte (or using the whole array if none is present).
/// Non-UTF8 bytes before the terminator are lossily replaced rather than
/// failing, matching the forgiving treatment of kernel-supplied identifiers
/// like `comm` and utsname fields.
pub fn fixed_cstr(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

/// Format 4 bytes as a dotted-decimal IPv4 address.
pub fn format_ipv4(bytes: [u8; 4]) -> String {
    format!("{}.{}.{}.{}", bytes[0], bytes[1], bytes[2], bytes[3])
}

/// Format 16 bytes as a standard colon-hex IPv6 address.
pub fn format_ipv6(bytes: [u8; 16]) -> String {
    let addr = std::net::Ipv6Addr::from(bytes);
    addr.to_string()
}
