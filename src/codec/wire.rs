//! Primitive field encoding: host-native fixed-width numbers and
//! length-prefixed strings.

use super::CodecError;
use std::io::{Read, Write};

/// Largest length prefix accepted when decoding a single string.
const MAX_STRING_LEN: u64 = 16 * 1024 * 1024;

pub fn write_len<W: Write>(w: &mut W, len: usize) -> Result<(), CodecError> {
    w.write_all(&(len as u64).to_ne_bytes())?;
    Ok(())
}

pub fn read_len<R: Read>(r: &mut R) -> Result<u64, CodecError> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(u64::from_ne_bytes(buf))
}

pub fn write_str<W: Write>(w: &mut W, value: &str) -> Result<(), CodecError> {
    write_len(w, value.len())?;
    w.write_all(value.as_bytes())?;
    Ok(())
}

pub fn read_str<R: Read>(r: &mut R) -> Result<String, CodecError> {
    let len = read_len(r)?;
    if len > MAX_STRING_LEN {
        return Err(CodecError::LengthOutOfRange(len));
    }

    let mut bytes = Vec::with_capacity(len as usize);
    r.by_ref().take(len).read_to_end(&mut bytes)?;
    if bytes.len() as u64 != len {
        return Err(CodecError::Truncated { expected: len, found: bytes.len() as u64 });
    }

    String::from_utf8(bytes).map_err(|_| CodecError::InvalidUtf8)
}

/// Writes a list of strings as `[count][string]*`.
pub fn write_str_list<W: Write>(w: &mut W, values: &[String]) -> Result<(), CodecError> {
    write_len(w, values.len())?;
    for value in values {
        write_str(w, value)?;
    }
    Ok(())
}

pub fn read_str_list<R: Read>(r: &mut R) -> Result<Vec<String>, CodecError> {
    let count = read_len(r)?;
    let mut values = Vec::with_capacity(count.min(64) as usize);
    for _ in 0..count {
        values.push(read_str(r)?);
    }
    Ok(values)
}

pub fn write_i32<W: Write>(w: &mut W, value: i32) -> Result<(), CodecError> {
    w.write_all(&value.to_ne_bytes())?;
    Ok(())
}

pub fn read_i32<R: Read>(r: &mut R) -> Result<i32, CodecError> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(i32::from_ne_bytes(buf))
}

pub fn write_f64<W: Write>(w: &mut W, value: f64) -> Result<(), CodecError> {
    w.write_all(&value.to_ne_bytes())?;
    Ok(())
}

pub fn read_f64<R: Read>(r: &mut R) -> Result<f64, CodecError> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(f64::from_ne_bytes(buf))
}

/// Booleans occupy one byte: 0 or 1.
pub fn write_bool<W: Write>(w: &mut W, value: bool) -> Result<(), CodecError> {
    w.write_all(&[u8::from(value)])?;
    Ok(())
}

pub fn read_bool<R: Read>(r: &mut R) -> Result<bool, CodecError> {
    let mut buf = [0u8; 1];
    r.read_exact(&mut buf)?;
    Ok(buf[0] != 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_string_layout() {
        let mut buf = Vec::new();
        write_str(&mut buf, "RPG").unwrap();

        assert_eq!(buf.len(), 8 + 3);
        assert_eq!(&buf[..8], &3u64.to_ne_bytes());
        assert_eq!(&buf[8..], b"RPG");
    }

    #[test]
    fn test_empty_string() {
        let mut buf = Vec::new();
        write_str(&mut buf, "").unwrap();
        assert_eq!(buf, 0u64.to_ne_bytes());

        let decoded = read_str(&mut Cursor::new(buf)).unwrap();
        assert_eq!(decoded, "");
    }

    #[test]
    fn test_utf8_string() {
        let mut buf = Vec::new();
        write_str(&mut buf, "Ведьмак").unwrap();
        assert_eq!(read_str(&mut Cursor::new(buf)).unwrap(), "Ведьмак");
    }

    #[test]
    fn test_numbers() {
        let mut buf = Vec::new();
        write_i32(&mut buf, -1).unwrap();
        write_f64(&mut buf, 19.99).unwrap();
        write_bool(&mut buf, true).unwrap();
        assert_eq!(buf.len(), 4 + 8 + 1);

        let mut cursor = Cursor::new(buf);
        assert_eq!(read_i32(&mut cursor).unwrap(), -1);
        assert_eq!(read_f64(&mut cursor).unwrap(), 19.99);
        assert!(read_bool(&mut cursor).unwrap());
    }

    #[test]
    fn test_truncated_string() {
        let mut buf = Vec::new();
        write_len(&mut buf, 10).unwrap();
        buf.extend_from_slice(b"abc");

        let err = read_str(&mut Cursor::new(buf)).unwrap_err();
        assert!(matches!(err, CodecError::Truncated { expected: 10, found: 3 }));
    }

    #[test]
    fn test_absurd_length_rejected() {
        let buf = u64::MAX.to_ne_bytes().to_vec();
        let err = read_str(&mut Cursor::new(buf)).unwrap_err();
        assert!(matches!(err, CodecError::LengthOutOfRange(_)));
    }

    #[test]
    fn test_invalid_utf8() {
        let mut buf = Vec::new();
        write_len(&mut buf, 2).unwrap();
        buf.extend_from_slice(&[0xff, 0xfe]);

        let err = read_str(&mut Cursor::new(buf)).unwrap_err();
        assert!(matches!(err, CodecError::InvalidUtf8));
    }

    #[test]
    fn test_str_list() {
        let values = vec!["a".to_string(), String::new(), "ccc".to_string()];
        let mut buf = Vec::new();
        write_str_list(&mut buf, &values).unwrap();
        assert_eq!(read_str_list(&mut Cursor::new(buf)).unwrap(), values);
    }
}
