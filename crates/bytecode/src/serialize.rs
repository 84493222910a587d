//! Binary image serializer/loader.
//!
//! ```text
//! magic:         u32 = 0x4D69686F
//! cp_count:      u16
//!   cp_entry*    = tag:u8 + payload
//!     integer:   i64 big-endian two's-complement
//!     double:    IEEE-754 double, big-endian
//!     string:    null-terminated ASCII bytes
//! fp_count:      u16
//!   fp_entry*    = argc:u16 + code_len:u16 + code:u8[code_len]
//! ```
//!
//! All multi-byte fields are big-endian; the serializer/loader pair
//! round-trips a [`CodeObject`] byte-for-byte.

use crate::code::{CodeObject, Constant, FunctionInfo};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use loks_util::error::ErrorKind;
use std::io::{self, Read, Write};

/// The fixed magic number every bytecode image starts with.
pub const MAGIC: u32 = 0x4D69_686F;

/// Serializes a [`CodeObject`] into the binary image format above.
pub fn serialize(code: &CodeObject) -> Vec<u8> {
    let mut buf = Vec::new();
    write_code_object(&mut buf, code).expect("writing to a Vec<u8> never fails");
    buf
}

fn write_code_object(w: &mut impl Write, code: &CodeObject) -> io::Result<()> {
    w.write_u32::<BigEndian>(MAGIC)?;

    w.write_u16::<BigEndian>(code.constants.len() as u16)?;
    for constant in code.constants.iter() {
        write_constant(w, constant)?;
    }

    w.write_u16::<BigEndian>(code.functions.len() as u16)?;
    for func in code.functions.iter() {
        w.write_u16::<BigEndian>(func.arg_count)?;
        w.write_u16::<BigEndian>(func.code.len() as u16)?;
        w.write_all(&func.code)?;
    }
    Ok(())
}

fn write_constant(w: &mut impl Write, constant: &Constant) -> io::Result<()> {
    w.write_u8(constant.tag())?;
    match constant {
        Constant::Integer(n) => w.write_i64::<BigEndian>(*n),
        Constant::Double(d) => w.write_u64::<BigEndian>(d.to_bits()),
        Constant::String(s) => {
            w.write_all(s.as_bytes())?;
            w.write_u8(0)
        }
    }
}

/// Deserializes a binary image produced by [`serialize`], rejecting a
/// mismatched magic number or a truncated image with
/// `ErrorKind::InvalidBytecodeError`.
pub fn deserialize(bytes: &[u8]) -> Result<CodeObject, ErrorKind> {
    let mut cursor = io::Cursor::new(bytes);
    read_code_object(&mut cursor).map_err(|e| {
        ErrorKind::InvalidBytecodeError(format!("malformed bytecode image: {e}"))
    })
}

fn read_code_object(r: &mut impl Read) -> io::Result<CodeObject> {
    let magic = r.read_u32::<BigEndian>()?;
    if magic != MAGIC {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("bad magic number 0x{magic:08x}, expected 0x{MAGIC:08x}"),
        ));
    }

    let cp_count = r.read_u16::<BigEndian>()?;
    let mut constants = loks_util::index_vec::IndexVec::new();
    for _ in 0..cp_count {
        constants.push(read_constant(r)?);
    }

    let fp_count = r.read_u16::<BigEndian>()?;
    let mut functions = loks_util::index_vec::IndexVec::new();
    for _ in 0..fp_count {
        let arg_count = r.read_u16::<BigEndian>()?;
        let code_len = r.read_u16::<BigEndian>()?;
        let mut code = vec![0u8; code_len as usize];
        r.read_exact(&mut code)?;
        functions.push(FunctionInfo { arg_count, code });
    }

    Ok(CodeObject { constants, functions })
}

fn read_constant(r: &mut impl Read) -> io::Result<Constant> {
    let tag = r.read_u8()?;
    match tag {
        0x03 => Ok(Constant::Integer(r.read_i64::<BigEndian>()?)),
        0x06 => Ok(Constant::Double(f64::from_bits(r.read_u64::<BigEndian>()?))),
        0x08 => {
            let mut bytes = Vec::new();
            loop {
                let b = r.read_u8()?;
                if b == 0 {
                    break;
                }
                bytes.push(b);
            }
            String::from_utf8(bytes)
                .map(Constant::String)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
        }
        other => Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("unknown constant tag 0x{other:02x}"),
        )),
    }
}
