//! In-memory ZIP fixtures for the end-to-end tests.
//!
//! Builds real PKZIP archives (local file header, ZipCrypto preamble,
//! encrypted and optionally deflated payload, central directory, end-of-
//! central-directory record) so the tests exercise the same byte layout the
//! locator sees in the wild.

// Each test binary pulls this module in and uses a different subset of it.
#![allow(dead_code)]

use flate2::Compression;
use flate2::write::DeflateEncoder;
use std::io::Write;
use zipcrack_core::{Crc32, Keys};

const LOCAL_FILE_HEADER_SIG: u32 = 0x04034B50;
const CENTRAL_DIR_HEADER_SIG: u32 = 0x02014B50;
const END_OF_CENTRAL_DIR_SIG: u32 = 0x06054B50;
const DATA_DESCRIPTOR_SIG: u32 = 0x08074B50;

const FLAG_ENCRYPTED: u16 = 0x0001;
const FLAG_DATA_DESCRIPTOR: u16 = 0x0008;

/// Fixed DOS timestamp for deterministic fixtures (12:34:56).
const DOS_MTIME: u16 = (12 << 11) | (34 << 5) | (56 / 2);
const DOS_MDATE: u16 = ((2024 - 1980) << 9) | (6 << 5) | 15;

/// How the fixture archive should be shaped.
#[derive(Clone, Copy, Default)]
pub struct ArchiveOptions {
    /// Compress with deflate instead of storing.
    pub deflate: bool,
    /// Set general-purpose bit 3: zero the local CRC/sizes, derive the check
    /// byte from the modification time, and append a data descriptor.
    pub data_descriptor: bool,
    /// Put an unencrypted entry in front of the encrypted one.
    pub leading_plain_entry: bool,
}

/// Build a ZipCrypto-encrypted archive holding `plaintext` under `name`.
pub fn encrypted_archive(
    password: &[u8],
    name: &str,
    plaintext: &[u8],
    options: ArchiveOptions,
) -> Vec<u8> {
    let crc32 = Crc32::compute(plaintext);
    let method: u16 = if options.deflate { 8 } else { 0 };

    let compressed = if options.deflate {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(plaintext).expect("deflate write");
        encoder.finish().expect("deflate finish")
    } else {
        plaintext.to_vec()
    };

    // Encrypt: 12-byte preamble first, then the compressed payload, all with
    // one continuous key stream.
    let check_byte = if options.data_descriptor {
        (DOS_MTIME >> 8) as u8
    } else {
        (crc32 >> 24) as u8
    };
    let mut keys = Keys::from_password(password);
    let preamble = keys.make_header(check_byte, 0xC0FFEE);
    let mut body = compressed;
    keys.encrypt_buffer(&mut body);

    let payload_len = (preamble.len() + body.len()) as u32;
    let flags = if options.data_descriptor {
        FLAG_ENCRYPTED | FLAG_DATA_DESCRIPTOR
    } else {
        FLAG_ENCRYPTED
    };

    let mut archive = Vec::new();

    if options.leading_plain_entry {
        write_plain_entry(&mut archive, "readme.txt", b"nothing to see here");
    }

    let local_offset = archive.len() as u32;

    // Local file header. Bit-3 writers do not know CRC or sizes yet.
    let (local_crc, local_sizes) = if options.data_descriptor {
        (0u32, (0u32, 0u32))
    } else {
        (crc32, (payload_len, plaintext.len() as u32))
    };
    write_local_header(
        &mut archive,
        flags,
        method,
        local_crc,
        local_sizes.0,
        local_sizes.1,
        name,
    );
    archive.extend_from_slice(&preamble);
    archive.extend_from_slice(&body);

    if options.data_descriptor {
        archive.extend_from_slice(&DATA_DESCRIPTOR_SIG.to_le_bytes());
        archive.extend_from_slice(&crc32.to_le_bytes());
        archive.extend_from_slice(&payload_len.to_le_bytes());
        archive.extend_from_slice(&(plaintext.len() as u32).to_le_bytes());
    }

    let cd_offset = archive.len() as u32;
    if options.leading_plain_entry {
        write_central_record(
            &mut archive,
            0,
            0,
            Crc32::compute(b"nothing to see here"),
            19,
            19,
            "readme.txt",
            0,
        );
    }
    write_central_record(
        &mut archive,
        flags,
        method,
        crc32,
        payload_len,
        plaintext.len() as u32,
        name,
        local_offset,
    );
    let cd_size = archive.len() as u32 - cd_offset;
    let entries = if options.leading_plain_entry { 2 } else { 1 };
    write_eocd(&mut archive, entries, cd_size, cd_offset);

    archive
}

/// Archive whose only entry is encrypted with the WinZip-AES scheme marker.
pub fn aes_archive() -> Vec<u8> {
    let mut extra = Vec::new();
    extra.extend_from_slice(&0x9901u16.to_le_bytes());
    extra.extend_from_slice(&7u16.to_le_bytes());
    extra.extend_from_slice(&2u16.to_le_bytes()); // AE-2
    extra.extend_from_slice(b"AE");
    extra.push(3); // AES-256
    extra.extend_from_slice(&8u16.to_le_bytes());

    let payload = [0xA5u8; 40];
    let mut archive = Vec::new();
    archive.extend_from_slice(&LOCAL_FILE_HEADER_SIG.to_le_bytes());
    archive.extend_from_slice(&51u16.to_le_bytes()); // version needed
    archive.extend_from_slice(&FLAG_ENCRYPTED.to_le_bytes());
    archive.extend_from_slice(&99u16.to_le_bytes()); // method: AES marker
    archive.extend_from_slice(&DOS_MTIME.to_le_bytes());
    archive.extend_from_slice(&DOS_MDATE.to_le_bytes());
    archive.extend_from_slice(&0u32.to_le_bytes()); // crc (AE-2 zeroes it)
    archive.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    archive.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    archive.extend_from_slice(&5u16.to_le_bytes()); // name len
    archive.extend_from_slice(&(extra.len() as u16).to_le_bytes());
    archive.extend_from_slice(b"x.bin");
    archive.extend_from_slice(&extra);
    archive.extend_from_slice(&payload);
    archive
}

/// Archive with a single unencrypted entry.
pub fn plain_archive() -> Vec<u8> {
    let mut archive = Vec::new();
    write_plain_entry(&mut archive, "open.txt", b"no password here");
    let cd_offset = archive.len() as u32;
    write_central_record(
        &mut archive,
        0,
        0,
        Crc32::compute(b"no password here"),
        16,
        16,
        "open.txt",
        0,
    );
    let cd_size = archive.len() as u32 - cd_offset;
    write_eocd(&mut archive, 1, cd_size, cd_offset);
    archive
}

fn write_plain_entry(archive: &mut Vec<u8>, name: &str, data: &[u8]) {
    write_local_header(
        archive,
        0,
        0,
        Crc32::compute(data),
        data.len() as u32,
        data.len() as u32,
        name,
    );
    archive.extend_from_slice(data);
}

#[allow(clippy::too_many_arguments)]
fn write_local_header(
    archive: &mut Vec<u8>,
    flags: u16,
    method: u16,
    crc32: u32,
    compressed_size: u32,
    uncompressed_size: u32,
    name: &str,
) {
    archive.extend_from_slice(&LOCAL_FILE_HEADER_SIG.to_le_bytes());
    archive.extend_from_slice(&20u16.to_le_bytes()); // version needed
    archive.extend_from_slice(&flags.to_le_bytes());
    archive.extend_from_slice(&method.to_le_bytes());
    archive.extend_from_slice(&DOS_MTIME.to_le_bytes());
    archive.extend_from_slice(&DOS_MDATE.to_le_bytes());
    archive.extend_from_slice(&crc32.to_le_bytes());
    archive.extend_from_slice(&compressed_size.to_le_bytes());
    archive.extend_from_slice(&uncompressed_size.to_le_bytes());
    archive.extend_from_slice(&(name.len() as u16).to_le_bytes());
    archive.extend_from_slice(&0u16.to_le_bytes()); // extra len
    archive.extend_from_slice(name.as_bytes());
}

#[allow(clippy::too_many_arguments)]
fn write_central_record(
    archive: &mut Vec<u8>,
    flags: u16,
    method: u16,
    crc32: u32,
    compressed_size: u32,
    uncompressed_size: u32,
    name: &str,
    local_offset: u32,
) {
    archive.extend_from_slice(&CENTRAL_DIR_HEADER_SIG.to_le_bytes());
    archive.extend_from_slice(&0x031Eu16.to_le_bytes()); // version made by
    archive.extend_from_slice(&20u16.to_le_bytes()); // version needed
    archive.extend_from_slice(&flags.to_le_bytes());
    archive.extend_from_slice(&method.to_le_bytes());
    archive.extend_from_slice(&DOS_MTIME.to_le_bytes());
    archive.extend_from_slice(&DOS_MDATE.to_le_bytes());
    archive.extend_from_slice(&crc32.to_le_bytes());
    archive.extend_from_slice(&compressed_size.to_le_bytes());
    archive.extend_from_slice(&uncompressed_size.to_le_bytes());
    archive.extend_from_slice(&(name.len() as u16).to_le_bytes());
    archive.extend_from_slice(&0u16.to_le_bytes()); // extra len
    archive.extend_from_slice(&0u16.to_le_bytes()); // comment len
    archive.extend_from_slice(&0u16.to_le_bytes()); // disk start
    archive.extend_from_slice(&0u16.to_le_bytes()); // internal attrs
    archive.extend_from_slice(&(0o100644u32 << 16).to_le_bytes()); // external
    archive.extend_from_slice(&local_offset.to_le_bytes());
    archive.extend_from_slice(name.as_bytes());
}

fn write_eocd(archive: &mut Vec<u8>, entries: u16, cd_size: u32, cd_offset: u32) {
    archive.extend_from_slice(&END_OF_CENTRAL_DIR_SIG.to_le_bytes());
    archive.extend_from_slice(&0u16.to_le_bytes()); // disk number
    archive.extend_from_slice(&0u16.to_le_bytes()); // cd disk
    archive.extend_from_slice(&entries.to_le_bytes());
    archive.extend_from_slice(&entries.to_le_bytes());
    archive.extend_from_slice(&cd_size.to_le_bytes());
    archive.extend_from_slice(&cd_offset.to_le_bytes());
    archive.extend_from_slice(&0u16.to_le_bytes()); // comment len
}
