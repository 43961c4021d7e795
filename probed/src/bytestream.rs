//! Positional reader over a byte slice with typed primitives and socket
//! address variants. Never back-tracks: each read advances the cursor past
//! the bytes it consumed, and every read that would run past the end of the
//! buffer fails with [`DecodeError::Underrun`].

use crate::error::DecodeError;
use crate::util::{fixed_cstr, format_ipv4, format_ipv6, ntohs};
use probe_wire::af;

/// A decoded socket address, produced by [`ByteStream::read_sockaddr`].
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub enum SockAddrValue {
    Inet { addr: String, port: u16 },
    Inet6 { addr: String, port: u16 },
    Unix { path: String },
}

impl std::fmt::Display for SockAddrValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SockAddrValue::Inet { addr, port } => write!(f, "AF_INET {addr}:{port}"),
            SockAddrValue::Inet6 { addr, port } => write!(f, "AF_INET6 [{addr}]:{port}"),
            SockAddrValue::Unix { path } => write!(f, "AF_UNIX {path}"),
        }
    }
}

/// The decoded value of one parameter, before any formatter has run.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    S8(i8),
    S16(i16),
    S32(i32),
    S64(i64),
    Str(String),
    Bytes(Vec<u8>),
    SockAddr(Option<SockAddrValue>),
    Ipv6(String),
    None,
}

impl ParamValue {
    /// Sign-extended integer view, used to feed formatters that expect a
    /// single integer-ish input regardless of the declared width.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            ParamValue::U8(v) => Some(v as i64),
            ParamValue::U16(v) => Some(v as i64),
            ParamValue::U32(v) => Some(v as i64),
            ParamValue::U64(v) => Some(v as i64),
            ParamValue::S8(v) => Some(v as i64),
            ParamValue::S16(v) => Some(v as i64),
            ParamValue::S32(v) => Some(v as i64),
            ParamValue::S64(v) => Some(v),
            _ => None,
        }
    }

    /// Default string rendering used when a parameter schema declares no
    /// formatter.
    pub fn to_display_string(&self) -> String {
        match self {
            ParamValue::U8(v) => v.to_string(),
            ParamValue::U16(v) => v.to_string(),
            ParamValue::U32(v) => v.to_string(),
            ParamValue::U64(v) => v.to_string(),
            ParamValue::S8(v) => v.to_string(),
            ParamValue::S16(v) => v.to_string(),
            ParamValue::S32(v) => v.to_string(),
            ParamValue::S64(v) => v.to_string(),
            ParamValue::Str(s) => s.clone(),
            ParamValue::Bytes(b) => format!("<{} byte(s)>", b.len()),
            ParamValue::SockAddr(Some(sa)) => sa.to_string(),
            ParamValue::SockAddr(None) => String::new(),
            ParamValue::Ipv6(s) => s.clone(),
            ParamValue::None => String::new(),
        }
    }
}

pub struct ByteStream<'a> {
    buf: &'a [u8],
    pos: usize,
    declared_nparams: u8,
}

impl<'a> ByteStream<'a> {
    pub fn new(buf: &'a [u8], declared_nparams: u8) -> Self {
        Self {
            buf,
            pos: 0,
            declared_nparams,
        }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn declared_nparams(&self) -> u8 {
        self.declared_nparams
    }

    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    pub fn is_exhausted(&self) -> bool {
        self.pos >= self.buf.len()
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        if self.pos + n > self.buf.len() {
            return Err(DecodeError::Underrun {
                at: self.pos,
                needed: n,
            });
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, DecodeError> {
        Ok(u16::from_le_bytes(self.take(2)?.try_into().unwrap()))
    }

    pub fn read_u32(&mut self) -> Result<u32, DecodeError> {
        Ok(u32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }

    pub fn read_u64(&mut self) -> Result<u64, DecodeError> {
        Ok(u64::from_le_bytes(self.take(8)?.try_into().unwrap()))
    }

    pub fn read_i8(&mut self) -> Result<i8, DecodeError> {
        Ok(self.take(1)?[0] as i8)
    }

    pub fn read_i16(&mut self) -> Result<i16, DecodeError> {
        Ok(i16::from_le_bytes(self.take(2)?.try_into().unwrap()))
    }

    pub fn read_i32(&mut self) -> Result<i32, DecodeError> {
        Ok(i32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }

    pub fn read_i64(&mut self) -> Result<i64, DecodeError> {
        Ok(i64::from_le_bytes(self.take(8)?.try_into().unwrap()))
    }

    /// `u16` length prefix followed by that many bytes, interpreted as UTF-8.
    pub fn read_str(&mut self) -> Result<String, DecodeError> {
        let len = self.read_u16()? as usize;
        let bytes = self.take(len)?;
        std::str::from_utf8(bytes)
            .map(|s| s.to_string())
            .map_err(|_| DecodeError::MalformedString {
                at: self.pos - len,
            })
    }

    /// `u16` length prefix followed by that many raw bytes.
    pub fn read_bytes(&mut self) -> Result<Vec<u8>, DecodeError> {
        let len = self.read_u16()? as usize;
        Ok(self.take(len)?.to_vec())
    }

    /// Reads `n` raw bytes and truncates at the first NUL, for fixed-layout
    /// C-string fields like `comm` and the utsname block.
    pub fn read_fixed_cstr(&mut self, n: usize) -> Result<String, DecodeError> {
        Ok(fixed_cstr(self.take(n)?))
    }

    pub fn read_ipv4(&mut self) -> Result<String, DecodeError> {
        let bytes: [u8; 4] = self.take(4)?.try_into().unwrap();
        Ok(format_ipv4(bytes))
    }

    pub fn read_ipv6(&mut self) -> Result<String, DecodeError> {
        let bytes: [u8; 16] = self.take(16)?.try_into().unwrap();
        Ok(format_ipv6(bytes))
    }

    /// Dispatches on a leading family byte. Unknown families decode to
    /// `Ok(None)` rather than an error, per the spec's "no partial failure
    /// on an unrecognised socket family" rule.
    pub fn read_sockaddr(&mut self) -> Result<Option<SockAddrValue>, DecodeError> {
        let family = self.read_u8()?;
        match family {
            af::AF_INET => {
                let addr = self.read_ipv4()?;
                let port = ntohs(self.read_u16()?);
                Ok(Some(SockAddrValue::Inet { addr, port }))
            }
            af::AF_INET6 => {
                let addr = self.read_ipv6()?;
                let port = ntohs(self.read_u16()?);
                Ok(Some(SockAddrValue::Inet6 { addr, port }))
            }
            af::AF_UNIX => {
                let path = self.read_str()?;
                Ok(Some(SockAddrValue::Unix { path }))
            }
            _ => Ok(None),
        }
    }

    /// Dispatch by declared parameter type, returning a [`ParamValue`] ready
    /// for either default stringification or a formatter.
    pub fn read_param(&mut self, ty: probe_wire::ParamType) -> Result<ParamValue, DecodeError> {
        use probe_wire::ParamType::*;
        Ok(match ty {
            U8 => ParamValue::U8(self.read_u8()?),
            U16 => ParamValue::U16(self.read_u16()?),
            U32 => ParamValue::U32(self.read_u32()?),
            U64 => ParamValue::U64(self.read_u64()?),
            S8 => ParamValue::S8(self.read_i8()?),
            S16 => ParamValue::S16(self.read_i16()?),
            S32 => ParamValue::S32(self.read_i32()?),
            S64 => ParamValue::S64(self.read_i64()?),
            Str | StrArr => ParamValue::Str(self.read_str()?),
            ByteArr | IovecArr => ParamValue::Bytes(self.read_bytes()?),
            SockAddr => ParamValue::SockAddr(self.read_sockaddr()?),
            Ipv6 => ParamValue::Ipv6(self.read_ipv6()?),
            None => ParamValue::None,
        })
    }
}

pub fn fixed_cstr_field(bytes: &[u8]) -> String {
    fixed_cstr(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use probe_wire::ParamType;

    #[test]
    fn reads_little_endian_integers_in_order() {
        let buf = [0x01, 0x00, 0x02, 0x00, 0x00, 0x00];
        let mut bs = ByteStream::new(&buf, 2);
        assert_eq!(bs.read_u16().unwrap(), 1);
        assert_eq!(bs.read_u32().unwrap(), 2);
    }

    #[test]
    fn underrun_on_short_buffer() {
        let buf = [0x01];
        let mut bs = ByteStream::new(&buf, 1);
        assert_eq!(
            bs.read_u32().unwrap_err(),
            DecodeError::Underrun { at: 0, needed: 4 }
        );
    }

    #[test]
    fn read_str_respects_length_prefix() {
        let mut buf = vec![3, 0];
        buf.extend_from_slice(b"abc");
        let mut bs = ByteStream::new(&buf, 1);
        assert_eq!(bs.read_str().unwrap(), "abc");
        assert!(bs.is_exhausted());
    }

    #[test]
    fn declared_length_exceeding_buffer_is_underrun() {
        let buf = [10, 0, b'h', b'i'];
        let mut bs = ByteStream::new(&buf, 1);
        assert!(matches!(
            bs.read_str().unwrap_err(),
            DecodeError::Underrun { .. }
        ));
    }

    #[test]
    fn sockaddr_inet_decodes_ip_and_port_in_host_order() {
        let mut buf = vec![af::AF_INET];
        buf.extend_from_slice(&[127, 0, 0, 1]);
        buf.extend_from_slice(&0x1F90u16.to_be_bytes());
        let mut bs = ByteStream::new(&buf, 1);
        let sa = bs.read_sockaddr().unwrap().unwrap();
        assert_eq!(
            sa,
            SockAddrValue::Inet {
                addr: "127.0.0.1".to_string(),
                port: 8080
            }
        );
    }

    #[test]
    fn sockaddr_unix_decodes_path() {
        let mut buf = vec![af::AF_UNIX];
        let path = b"/run/x.sock";
        buf.extend_from_slice(&(path.len() as u16).to_le_bytes());
        buf.extend_from_slice(path);
        let mut bs = ByteStream::new(&buf, 1);
        let sa = bs.read_sockaddr().unwrap().unwrap();
        assert_eq!(
            sa,
            SockAddrValue::Unix {
                path: "/run/x.sock".to_string()
            }
        );
    }

    #[test]
    fn unknown_socket_family_is_none_not_error() {
        let buf = [0xFFu8];
        let mut bs = ByteStream::new(&buf, 1);
        assert_eq!(bs.read_sockaddr().unwrap(), None);
    }

    #[test]
    fn read_param_dispatches_by_type() {
        let buf = [0x2A, 0, 0, 0];
        let mut bs = ByteStream::new(&buf, 1);
        let v = bs.read_param(ParamType::S32).unwrap();
        assert_eq!(v.as_i64(), Some(42));
    }
}
