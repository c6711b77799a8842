//! Byte-stable PDF serialization.
//!
//! Objects are written in id order, dictionary keys sorted and numbers
//! formatted with a fixed precision, so identical documents always produce
//! identical bytes.

use crate::ComposerError;
use flate2::Compression;
use flate2::write::ZlibEncoder;
use lopdf::{Dictionary, Document, Object, StringFormat};
use std::collections::BTreeMap;
use std::io::Write;

/// zlib level used for every compressed stream.
const DEFLATE_LEVEL: u32 = 6;

/// Formats a real number with at most four decimals and no trailing zeros.
pub fn format_number(value: f32) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    let s = format!("{value:.4}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" || s.is_empty() {
        "0".to_string()
    } else {
        s.to_string()
    }
}

pub fn deflate(data: &[u8]) -> Result<Vec<u8>, ComposerError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(DEFLATE_LEVEL));
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Serializes `doc` with a classic cross-reference table.
///
/// The trailer carries `/Root` and `/Info` from `doc.trailer` and an `/ID`
/// pair made of `file_id`.
pub fn write_document(doc: &Document, file_id: &[u8]) -> Result<Vec<u8>, ComposerError> {
    let mut out: Vec<u8> = Vec::new();
    out.extend_from_slice(b"%PDF-1.7\n%\xE2\xE3\xCF\xD3\n");

    let mut offsets: BTreeMap<u32, (usize, u16)> = BTreeMap::new();
    for (&(number, generation), object) in &doc.objects {
        offsets.insert(number, (out.len(), generation));
        write!(out, "{number} {generation} obj\n")?;
        write_object(&mut out, object)?;
        out.extend_from_slice(b"\nendobj\n");
    }

    let size = offsets.keys().next_back().map_or(1, |max| max + 1);
    let xref_offset = out.len();
    write_xref(&mut out, &offsets, size)?;

    let mut trailer = Dictionary::new();
    for key in [b"Root".as_slice(), b"Info".as_slice()] {
        if let Ok(value) = doc.trailer.get(key) {
            trailer.set(key.to_vec(), value.clone());
        }
    }
    trailer.set("Size", size as i64);
    let id = Object::String(file_id.to_vec(), StringFormat::Hexadecimal);
    trailer.set("ID", Object::Array(vec![id.clone(), id]));

    out.extend_from_slice(b"trailer\n");
    write_dictionary(&mut out, &trailer)?;
    write!(out, "\nstartxref\n{xref_offset}\n%%EOF\n")?;
    Ok(out)
}

fn write_xref(
    out: &mut Vec<u8>,
    offsets: &BTreeMap<u32, (usize, u16)>,
    size: u32,
) -> Result<(), ComposerError> {
    writeln!(out, "xref\n0 {size}")?;
    out.extend_from_slice(b"0000000000 65535 f\r\n");
    for number in 1..size {
        match offsets.get(&number) {
            Some((offset, generation)) => write!(out, "{offset:010} {generation:05} n\r\n")?,
            None => out.extend_from_slice(b"0000000000 00000 f\r\n"),
        }
    }
    Ok(())
}

fn write_object(out: &mut Vec<u8>, object: &Object) -> Result<(), ComposerError> {
    match object {
        Object::Null => out.extend_from_slice(b"null"),
        Object::Boolean(b) => out.extend_from_slice(if *b { b"true" } else { b"false" }),
        Object::Integer(i) => write!(out, "{i}")?,
        Object::Real(r) => out.extend_from_slice(format_number(*r as f32).as_bytes()),
        Object::Name(name) => write_name(out, name),
        Object::String(bytes, StringFormat::Literal) => write_literal(out, bytes),
        Object::String(bytes, StringFormat::Hexadecimal) => {
            out.push(b'<');
            for b in bytes {
                write!(out, "{b:02X}")?;
            }
            out.push(b'>');
        }
        Object::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b' ');
                }
                write_object(out, item)?;
            }
            out.push(b']');
        }
        Object::Dictionary(dict) => write_dictionary(out, dict)?,
        Object::Stream(stream) => {
            let mut dict = stream.dict.clone();
            dict.set("Length", stream.content.len() as i64);
            write_dictionary(out, &dict)?;
            out.extend_from_slice(b"\nstream\n");
            out.extend_from_slice(&stream.content);
            out.extend_from_slice(b"\nendstream");
        }
        Object::Reference((number, generation)) => write!(out, "{number} {generation} R")?,
    }
    Ok(())
}

fn write_dictionary(out: &mut Vec<u8>, dict: &Dictionary) -> Result<(), ComposerError> {
    out.extend_from_slice(b"<<");
    let sorted: BTreeMap<&Vec<u8>, &Object> = dict.iter().collect();
    for (key, value) in sorted {
        write_name(out, key);
        out.push(b' ');
        write_object(out, value)?;
    }
    out.extend_from_slice(b">>");
    Ok(())
}

fn write_name(out: &mut Vec<u8>, name: &[u8]) {
    out.push(b'/');
    for &b in name {
        let regular = b.is_ascii_graphic()
            && !matches!(
                b,
                b'#' | b'/' | b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'%'
            );
        if regular {
            out.push(b);
        } else {
            out.extend_from_slice(format!("#{b:02X}").as_bytes());
        }
    }
}

fn write_literal(out: &mut Vec<u8>, bytes: &[u8]) {
    out.push(b'(');
    for &b in bytes {
        match b {
            b'(' | b')' | b'\\' => {
                out.push(b'\\');
                out.push(b);
            }
            b'\n' => out.extend_from_slice(b"\\n"),
            b'\r' => out.extend_from_slice(b"\\r"),
            _ => out.push(b),
        }
    }
    out.push(b')');
}
