//! Archive locator.
//!
//! Walks the local-file-header records of a PKZIP archive and extracts the
//! reference material the validators need from the first encrypted entry:
//! the 12-byte encryption preamble, the check byte (and which header field it
//! was derived from), the ciphertext range, and the stored CRC-32.
//!
//! Entries protected by WinZip-AES fail fast; the engine does not scan past
//! an AES first entry looking for a ZipCrypto one.

use std::ops::Range;
use zipcrack_core::keys::ENCRYPTION_HEADER_LEN;
use zipcrack_core::{CrackError, Result};

/// ZIP local file header signature.
pub const LOCAL_FILE_HEADER_SIG: u32 = 0x04034B50;

/// ZIP central directory header signature.
const CENTRAL_DIR_HEADER_SIG: u32 = 0x02014B50;

/// Data descriptor signature (PK\x07\x08).
const DATA_DESCRIPTOR_SIG: u32 = 0x08074B50;

/// General purpose bit 0: entry is encrypted.
const FLAG_ENCRYPTED: u16 = 0x0001;

/// General purpose bit 3: sizes and CRC live in a trailing data descriptor.
const FLAG_DATA_DESCRIPTOR: u16 = 0x0008;

/// General purpose bit 6: strong encryption (SES / AES).
const FLAG_STRONG_ENCRYPTION: u16 = 0x0040;

/// WinZip AES extra field header ID.
const WINZIP_AES_EXTRA_ID: u16 = 0x9901;

/// Fixed size of the local file header before name and extra fields.
const LOCAL_HEADER_FIXED_LEN: usize = 30;

/// Compression methods the full validator can handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Stored (no compression).
    Stored,
    /// Deflate compression.
    Deflate,
}

impl Method {
    /// Map the raw method identifier, rejecting everything but stored/deflate.
    pub fn from_u16(value: u16) -> Result<Self> {
        match value {
            0 => Ok(Self::Stored),
            8 => Ok(Self::Deflate),
            other => Err(CrackError::unsupported_compression(other)),
        }
    }
}

/// Which header field the check byte was derived from.
///
/// When general-purpose bit 3 is clear the writer knew the CRC at encryption
/// time and used its high byte; when bit 3 is set the CRC was not yet known
/// and the high byte of the DOS modification time stands in. This is the
/// PKZIP / Info-ZIP convention, and the locator targets that producer family
/// even when a bit-3 writer also happened to fill in the local CRC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckByteSource {
    /// High byte of the stored CRC-32.
    Crc32,
    /// High byte of the stored DOS modification time.
    ModTime,
}

/// Reference material for the first encrypted entry of an archive.
#[derive(Debug, Clone)]
pub struct EncryptedEntry {
    /// The 12-byte encryption preamble preceding the ciphertext.
    pub preamble: [u8; ENCRYPTION_HEADER_LEN],
    /// Expected plaintext value of the preamble's final byte.
    pub check_byte: u8,
    /// Provenance of [`Self::check_byte`].
    pub check_source: CheckByteSource,
    /// Byte range of the compressed ciphertext (preamble excluded).
    pub ciphertext: Range<usize>,
    /// Stored CRC-32 of the uncompressed plaintext.
    pub crc32: u32,
    /// Compression method of the plaintext.
    pub method: Method,
    /// Stored uncompressed size, when the headers carry one.
    pub uncompressed_size: Option<u64>,
}

#[inline]
fn read_u16(buf: &[u8], offset: usize) -> Option<u16> {
    let bytes = buf.get(offset..offset + 2)?;
    Some(u16::from_le_bytes([bytes[0], bytes[1]]))
}

#[inline]
fn read_u32(buf: &[u8], offset: usize) -> Option<u32> {
    let bytes = buf.get(offset..offset + 4)?;
    Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// Find the next occurrence of `sig` at or after `from`.
fn find_signature(archive: &[u8], from: usize, sig: u32) -> Option<usize> {
    let needle = sig.to_le_bytes();
    if from >= archive.len() {
        return None;
    }
    archive[from..]
        .windows(4)
        .position(|w| w == needle)
        .map(|p| from + p)
}

/// Search the extra field for a WinZip AES marker.
fn extra_has_aes_marker(extra: &[u8]) -> bool {
    let mut offset = 0;
    while offset + 4 <= extra.len() {
        let header_id = u16::from_le_bytes([extra[offset], extra[offset + 1]]);
        let data_size = u16::from_le_bytes([extra[offset + 2], extra[offset + 3]]) as usize;
        if header_id == WINZIP_AES_EXTRA_ID {
            return true;
        }
        offset += 4 + data_size;
    }
    false
}

/// Fields of one local file header, plus where its payload starts.
struct LocalHeader {
    flags: u16,
    method_raw: u16,
    mtime: u16,
    crc32: u32,
    compressed_size: u32,
    uncompressed_size: u32,
    extra: Range<usize>,
    data_offset: usize,
}

impl LocalHeader {
    /// Parse the record at `pos`; the caller has already matched the signature.
    fn parse(archive: &[u8], pos: usize) -> Option<Self> {
        let flags = read_u16(archive, pos + 6)?;
        let method_raw = read_u16(archive, pos + 8)?;
        let mtime = read_u16(archive, pos + 10)?;
        let crc32 = read_u32(archive, pos + 14)?;
        let compressed_size = read_u32(archive, pos + 18)?;
        let uncompressed_size = read_u32(archive, pos + 22)?;
        let name_len = read_u16(archive, pos + 26)? as usize;
        let extra_len = read_u16(archive, pos + 28)? as usize;

        let extra_start = pos + LOCAL_HEADER_FIXED_LEN + name_len;
        let data_offset = extra_start + extra_len;
        if data_offset > archive.len() {
            return None;
        }

        Some(Self {
            flags,
            method_raw,
            mtime,
            crc32,
            compressed_size,
            uncompressed_size,
            extra: extra_start..data_offset,
            data_offset,
        })
    }

    fn is_encrypted(&self) -> bool {
        self.flags & FLAG_ENCRYPTED != 0
    }

    fn has_data_descriptor(&self) -> bool {
        self.flags & FLAG_DATA_DESCRIPTOR != 0
    }
}

/// Metadata recovered from a central directory record.
struct CentralRecord {
    crc32: u32,
    compressed_size: u32,
    uncompressed_size: u32,
}

/// Look up the central directory record whose local-header offset is
/// `header_offset`. Bit-3 writers leave the local CRC and sizes zeroed; the
/// central directory always has the real values.
fn central_record_for(archive: &[u8], header_offset: usize) -> Option<CentralRecord> {
    let mut pos = 0usize;
    while let Some(hit) = find_signature(archive, pos, CENTRAL_DIR_HEADER_SIG) {
        if let (Some(crc32), Some(compressed), Some(uncompressed), Some(offset)) = (
            read_u32(archive, hit + 16),
            read_u32(archive, hit + 20),
            read_u32(archive, hit + 24),
            read_u32(archive, hit + 42),
        ) {
            if offset as usize == header_offset {
                return Some(CentralRecord {
                    crc32,
                    compressed_size: compressed,
                    uncompressed_size: uncompressed,
                });
            }
        }
        pos = hit + 4;
    }
    None
}

/// Bound a descriptor-terminated payload by scanning for PK\x07\x08.
fn descriptor_after(archive: &[u8], data_offset: usize) -> Option<(usize, u32)> {
    let sig_pos = find_signature(archive, data_offset, DATA_DESCRIPTOR_SIG)?;
    let crc32 = read_u32(archive, sig_pos + 4)?;
    Some((sig_pos - data_offset, crc32))
}

/// Find the first encrypted entry and extract its reference material.
///
/// Errors follow the acceptance rules in order: AES markers fail with
/// [`CrackError::UnsupportedEncryption`], a method other than stored/deflate
/// with [`CrackError::UnsupportedCompression`], a payload shorter than the
/// 12-byte preamble (or overrunning the buffer) with
/// [`CrackError::TruncatedArchive`], and an archive with no encrypted local
/// file header at all with [`CrackError::NoEncryptedEntry`].
pub fn locate(archive: &[u8]) -> Result<EncryptedEntry> {
    let mut pos = match find_signature(archive, 0, LOCAL_FILE_HEADER_SIG) {
        Some(p) => p,
        None => return Err(CrackError::NoEncryptedEntry),
    };

    loop {
        let Some(header) = LocalHeader::parse(archive, pos) else {
            return Err(CrackError::NoEncryptedEntry);
        };

        if header.is_encrypted() {
            return accept(archive, pos, &header);
        }

        // Skip this plaintext entry's payload and look at what follows.
        let next = if header.compressed_size > 0 {
            header.data_offset + header.compressed_size as usize
        } else if header.has_data_descriptor() {
            // Zero-size with a descriptor: the next signature bounds the data.
            match find_signature(archive, header.data_offset, LOCAL_FILE_HEADER_SIG) {
                Some(p) => p,
                None => return Err(CrackError::NoEncryptedEntry),
            }
        } else {
            header.data_offset
        };

        match read_u32(archive, next) {
            Some(LOCAL_FILE_HEADER_SIG) => pos = next,
            // Descriptor records sit between payload and the next header.
            Some(DATA_DESCRIPTOR_SIG) => {
                match find_signature(archive, next + 4, LOCAL_FILE_HEADER_SIG) {
                    Some(p) => pos = p,
                    None => return Err(CrackError::NoEncryptedEntry),
                }
            }
            // Central directory (or anything else): no more local headers.
            _ => return Err(CrackError::NoEncryptedEntry),
        }
    }
}

/// Apply the acceptance rules to an encrypted entry and build the reference.
fn accept(archive: &[u8], header_offset: usize, header: &LocalHeader) -> Result<EncryptedEntry> {
    if header.flags & FLAG_STRONG_ENCRYPTION != 0
        || extra_has_aes_marker(&archive[header.extra.clone()])
    {
        return Err(CrackError::UnsupportedEncryption);
    }

    let method = Method::from_u16(header.method_raw)?;

    // Bit-3 writers defer CRC and sizes to the data descriptor; recover the
    // real values from the central directory, falling back to the descriptor
    // itself for streamed archives with no directory.
    let mut crc32 = header.crc32;
    let mut compressed_size = header.compressed_size as u64;
    let mut uncompressed_size = if header.uncompressed_size > 0 {
        Some(header.uncompressed_size as u64)
    } else {
        None
    };

    if header.has_data_descriptor() && (crc32 == 0 || compressed_size == 0) {
        if let Some(record) = central_record_for(archive, header_offset) {
            if crc32 == 0 {
                crc32 = record.crc32;
            }
            if compressed_size == 0 {
                compressed_size = record.compressed_size as u64;
            }
            if uncompressed_size.is_none() && record.uncompressed_size > 0 {
                uncompressed_size = Some(record.uncompressed_size as u64);
            }
        } else if let Some((payload_len, descriptor_crc)) =
            descriptor_after(archive, header.data_offset)
        {
            if compressed_size == 0 {
                compressed_size = payload_len as u64;
            }
            if crc32 == 0 {
                crc32 = descriptor_crc;
            }
        }
    }

    let payload_start = header.data_offset;
    let payload_end = payload_start
        .checked_add(compressed_size as usize)
        .ok_or_else(|| CrackError::truncated("compressed size overflows the buffer"))?;

    if compressed_size < ENCRYPTION_HEADER_LEN as u64 {
        return Err(CrackError::truncated(format!(
            "encrypted payload is {compressed_size} bytes, shorter than the 12-byte preamble"
        )));
    }
    if payload_end > archive.len() {
        return Err(CrackError::truncated(format!(
            "compressed data runs to offset {payload_end} but the archive is {} bytes",
            archive.len()
        )));
    }

    let mut preamble = [0u8; ENCRYPTION_HEADER_LEN];
    preamble.copy_from_slice(&archive[payload_start..payload_start + ENCRYPTION_HEADER_LEN]);

    let (check_byte, check_source) = if header.has_data_descriptor() {
        ((header.mtime >> 8) as u8, CheckByteSource::ModTime)
    } else {
        ((crc32 >> 24) as u8, CheckByteSource::Crc32)
    };

    Ok(EncryptedEntry {
        preamble,
        check_byte,
        check_source,
        ciphertext: payload_start + ENCRYPTION_HEADER_LEN..payload_end,
        crc32,
        method,
        uncompressed_size,
    })
}
