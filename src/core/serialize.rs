// Deterministic serialization helpers
//
// Every multi-byte integer is big-endian and every byte string carries a
// u32 length prefix, so two peers encoding the same logical value always
// produce identical bytes. Transaction IDs, signatures, and proof-of-work
// headers all hash this encoding.

use std::io::{self, Read, Write};

/// Write bytes with a u32 big-endian length prefix
pub fn write_var_bytes<W: Write>(writer: &mut W, data: &[u8]) -> io::Result<()> {
    write_u32(writer, data.len() as u32)?;
    writer.write_all(data)?;
    Ok(())
}

/// Read bytes with a u32 big-endian length prefix
pub fn read_var_bytes<R: Read + ?Sized>(reader: &mut R) -> io::Result<Vec<u8>> {
    let len = read_u32(reader)? as usize;
    let mut data = vec![0u8; len];
    reader.read_exact(&mut data)?;
    Ok(data)
}

pub fn write_u32<W: Write>(writer: &mut W, value: u32) -> io::Result<()> {
    writer.write_all(&value.to_be_bytes())
}

pub fn read_u32<R: Read + ?Sized>(reader: &mut R) -> io::Result<u32> {
    let mut bytes = [0u8; 4];
    reader.read_exact(&mut bytes)?;
    Ok(u32::from_be_bytes(bytes))
}

pub fn write_i32<W: Write>(writer: &mut W, value: i32) -> io::Result<()> {
    writer.write_all(&value.to_be_bytes())
}

pub fn read_i32<R: Read + ?Sized>(reader: &mut R) -> io::Result<i32> {
    let mut bytes = [0u8; 4];
    reader.read_exact(&mut bytes)?;
    Ok(i32::from_be_bytes(bytes))
}

pub fn write_i64<W: Write>(writer: &mut W, value: i64) -> io::Result<()> {
    writer.write_all(&value.to_be_bytes())
}

pub fn read_i64<R: Read + ?Sized>(reader: &mut R) -> io::Result<i64> {
    let mut bytes = [0u8; 8];
    reader.read_exact(&mut bytes)?;
    Ok(i64::from_be_bytes(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_var_bytes_round_trip() {
        let data = b"hello world";
        let mut buf = Vec::new();
        write_var_bytes(&mut buf, data).unwrap();
        assert_eq!(buf.len(), 4 + data.len());

        let mut cursor = Cursor::new(buf);
        let decoded = read_var_bytes(&mut cursor).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn test_var_bytes_empty() {
        let mut buf = Vec::new();
        write_var_bytes(&mut buf, &[]).unwrap();
        assert_eq!(buf, vec![0, 0, 0, 0]);

        let mut cursor = Cursor::new(buf);
        assert!(read_var_bytes(&mut cursor).unwrap().is_empty());
    }

    #[test]
    fn test_integers_are_big_endian() {
        let mut buf = Vec::new();
        write_i32(&mut buf, -1).unwrap();
        assert_eq!(buf, vec![0xff, 0xff, 0xff, 0xff]);

        let mut buf = Vec::new();
        write_i64(&mut buf, 1563897484).unwrap();
        assert_eq!(buf, vec![0, 0, 0, 0, 0x5d, 0x38, 0x5e, 0x8c]);

        let mut cursor = Cursor::new(buf);
        assert_eq!(read_i64(&mut cursor).unwrap(), 1563897484);
    }

    #[test]
    fn test_read_rejects_truncated_input() {
        let mut cursor = Cursor::new(vec![0, 0, 0, 9, 1, 2]);
        assert!(read_var_bytes(&mut cursor).is_err());
    }
}
