//! Legacy Excel 97-2003 (`.xls`) writer for text-only sheets.
//!
//! The file is an OLE compound file holding one `Workbook` stream of BIFF8 records:
//!
//! ```text
//! globals: BOF CODEPAGE WINDOW1 FONT*5 XF*16 STYLE BOUNDSHEET SST [CONTINUE...] EOF
//! sheet:   BOF DIMENSIONS WINDOW2 (LABELSST | BLANK)* EOF
//! ```
//!
//! Every non-empty cell is a shared-string reference; empty cells are written as blanks.

use std::collections::HashMap;
use std::io::{Cursor, Write};

use crate::error::{ProcessingError, ProcessingResult};

use super::SheetContent;

/// Rows per sheet (header included).
pub const MAX_ROWS: usize = 65_536;
/// Columns per sheet.
pub const MAX_COLS: usize = 256;
/// Characters per cell, counted in UTF-16 code units.
pub const MAX_CELL_CHARS: usize = 32_767;
/// Characters per sheet name.
pub const MAX_SHEET_NAME_CHARS: usize = 31;

/// Largest record body; longer payloads continue in `CONTINUE` records.
const MAX_RECORD_DATA: usize = 8_224;
/// Streams shorter than this land in the mini stream, which older readers reject.
const MIN_STREAM_LEN: usize = 4_096;
const WORKBOOK_STREAM: &str = "/Workbook";

const BOF: u16 = 0x0809;
const EOF: u16 = 0x000A;
const CODEPAGE: u16 = 0x0042;
const WINDOW1: u16 = 0x003D;
const FONT: u16 = 0x0031;
const XF: u16 = 0x00E0;
const STYLE: u16 = 0x0293;
const BOUNDSHEET: u16 = 0x0085;
const SST: u16 = 0x00FC;
const CONTINUE: u16 = 0x003C;
const DIMENSIONS: u16 = 0x0200;
const WINDOW2: u16 = 0x023E;
const LABELSST: u16 = 0x00FD;
const BLANK: u16 = 0x0201;

const BIFF8: u16 = 0x0600;
const DT_GLOBALS: u16 = 0x0005;
const DT_WORKSHEET: u16 = 0x0010;
const CODEPAGE_UTF16: u16 = 1200;
/// XF index used by every cell: the first cell XF after the 15 style XFs.
const CELL_XF: u16 = 15;

/// Render a sheet as a complete `.xls` file.
pub fn render(sheet: &SheetContent<'_>) -> ProcessingResult<Vec<u8>> {
    check_limits(sheet)?;
    let stream = workbook_stream(sheet.sheet_name, &sheet.rows);
    compound_file(&stream)
}

fn check_limits(sheet: &SheetContent<'_>) -> ProcessingResult<()> {
    let limit = |message: String| ProcessingError::SheetLimit {
        group: sheet.group.to_string(),
        message,
    };

    if sheet.rows.len() > MAX_ROWS {
        return Err(limit(format!(
            "{} rows exceed the .xls limit of {MAX_ROWS}",
            sheet.rows.len()
        )));
    }
    let name_len = sheet.sheet_name.chars().count();
    if name_len == 0 || name_len > MAX_SHEET_NAME_CHARS {
        return Err(limit(format!(
            "sheet name '{}' must have 1 to {MAX_SHEET_NAME_CHARS} characters",
            sheet.sheet_name
        )));
    }
    for (r, row) in sheet.rows.iter().enumerate() {
        if row.len() > MAX_COLS {
            return Err(limit(format!("{} columns exceed the .xls limit of {MAX_COLS}", row.len())));
        }
        for (c, text) in row.iter().enumerate() {
            let units = text.encode_utf16().count();
            if units > MAX_CELL_CHARS {
                return Err(limit(format!(
                    "cell at row {} column {} has {units} characters (limit {MAX_CELL_CHARS})",
                    r + 1,
                    c + 1
                )));
            }
        }
    }
    Ok(())
}

/// Byte buffer that appends `[type][length][body]` records.
#[derive(Default)]
struct BiffWriter {
    buf: Vec<u8>,
}

impl BiffWriter {
    fn record(&mut self, typ: u16, data: &[u8]) {
        debug_assert!(data.len() <= MAX_RECORD_DATA, "record 0x{typ:04X} too long");
        self.buf.extend_from_slice(&typ.to_le_bytes());
        self.buf.extend_from_slice(&(data.len() as u16).to_le_bytes());
        self.buf.extend_from_slice(data);
    }

    fn len(&self) -> usize {
        self.buf.len()
    }

    fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}

/// Shared string table in first-use order.
#[derive(Default)]
struct SharedStrings {
    index: HashMap<String, u32>,
    strings: Vec<String>,
    references: u32,
}

impl SharedStrings {
    fn intern(&mut self, s: &str) -> u32 {
        self.references += 1;
        if let Some(&idx) = self.index.get(s) {
            return idx;
        }
        let idx = self.strings.len() as u32;
        self.index.insert(s.to_string(), idx);
        self.strings.push(s.to_string());
        idx
    }

    /// Record bodies: the first is the `SST` body, the rest are `CONTINUE` bodies.
    ///
    /// A string header (length + flags) never straddles two records. When the characters of a
    /// string spill into the next record, that record starts with a fresh flags byte.
    fn encode(&self) -> Vec<Vec<u8>> {
        let mut blocks: Vec<Vec<u8>> = Vec::new();
        let mut cur: Vec<u8> = Vec::with_capacity(MAX_RECORD_DATA);
        cur.extend_from_slice(&self.references.to_le_bytes());
        cur.extend_from_slice(&(self.strings.len() as u32).to_le_bytes());

        for s in &self.strings {
            let units: Vec<u16> = s.encode_utf16().collect();
            let compressed = units.iter().all(|&u| u <= 0xFF);
            let unit_len = if compressed { 1 } else { 2 };
            let flags = if compressed { 0x00 } else { 0x01 };

            if cur.len() + 3 + unit_len > MAX_RECORD_DATA {
                blocks.push(std::mem::take(&mut cur));
            }
            cur.extend_from_slice(&(units.len() as u16).to_le_bytes());
            cur.push(flags);

            let mut rest = units.as_slice();
            loop {
                let room = (MAX_RECORD_DATA - cur.len()) / unit_len;
                let (now, later) = rest.split_at(room.min(rest.len()));
                push_units(&mut cur, now, compressed);
                rest = later;
                if rest.is_empty() {
                    break;
                }
                blocks.push(std::mem::take(&mut cur));
                cur.push(flags);
            }
        }

        blocks.push(cur);
        blocks
    }
}

fn push_units(out: &mut Vec<u8>, units: &[u16], compressed: bool) {
    if compressed {
        out.extend(units.iter().map(|&u| u as u8));
    } else {
        for u in units {
            out.extend_from_slice(&u.to_le_bytes());
        }
    }
}

/// Build the BIFF8 `Workbook` stream for one sheet of text cells.
fn workbook_stream(sheet_name: &str, rows: &[Vec<String>]) -> Vec<u8> {
    let mut sst = SharedStrings::default();
    let n_cols = rows.iter().map(Vec::len).max().unwrap_or(0);

    let mut sheet = BiffWriter::default();
    sheet.record(BOF, &bof(DT_WORKSHEET));
    sheet.record(DIMENSIONS, &dimensions(rows.len(), n_cols));
    sheet.record(WINDOW2, &window2());
    for (r, row) in rows.iter().enumerate() {
        for (c, text) in row.iter().enumerate() {
            if text.is_empty() {
                sheet.record(BLANK, &blank(r, c));
            } else {
                let isst = sst.intern(text);
                sheet.record(LABELSST, &label_sst(r, c, isst));
            }
        }
    }
    sheet.record(EOF, &[]);

    let mut globals = BiffWriter::default();
    globals.record(BOF, &bof(DT_GLOBALS));
    globals.record(CODEPAGE, &CODEPAGE_UTF16.to_le_bytes());
    globals.record(WINDOW1, &window1());
    // Font index 4 is never referenced, but readers expect it to exist.
    for _ in 0..5 {
        globals.record(FONT, &font("Arial"));
    }
    for _ in 0..CELL_XF {
        globals.record(XF, &xf(true));
    }
    globals.record(XF, &xf(false));
    globals.record(STYLE, &[0x00, 0x80, 0x00, 0xFF]);
    // lbPlyPos is the first field of the BOUNDSHEET body; patched once the globals length is known.
    let sheet_offset_at = globals.len() + 4;
    globals.record(BOUNDSHEET, &boundsheet(sheet_name));
    let mut blocks = sst.encode().into_iter();
    if let Some(first) = blocks.next() {
        globals.record(SST, &first);
    }
    for block in blocks {
        globals.record(CONTINUE, &block);
    }
    globals.record(EOF, &[]);

    let mut stream = globals.into_inner();
    let sheet_pos = stream.len() as u32;
    stream[sheet_offset_at..sheet_offset_at + 4].copy_from_slice(&sheet_pos.to_le_bytes());
    stream.extend_from_slice(&sheet.into_inner());
    if stream.len() < MIN_STREAM_LEN {
        stream.resize(MIN_STREAM_LEN, 0);
    }
    stream
}

fn compound_file(stream: &[u8]) -> ProcessingResult<Vec<u8>> {
    let mut comp = cfb::CompoundFile::create_with_version(cfb::Version::V3, Cursor::new(Vec::new()))?;
    {
        let mut workbook = comp.create_stream(WORKBOOK_STREAM)?;
        workbook.write_all(stream)?;
        workbook.flush()?;
    }
    comp.flush()?;
    Ok(comp.into_inner().into_inner())
}

fn bof(dt: u16) -> Vec<u8> {
    let mut b = Vec::with_capacity(16);
    b.extend_from_slice(&BIFF8.to_le_bytes());
    b.extend_from_slice(&dt.to_le_bytes());
    b.extend_from_slice(&0x0DBB_u16.to_le_bytes()); // build
    b.extend_from_slice(&0x07CC_u16.to_le_bytes()); // year
    b.extend_from_slice(&0x0000_0041_u32.to_le_bytes()); // file history
    b.extend_from_slice(&0x0000_0006_u32.to_le_bytes()); // lowest BIFF version
    b
}

fn window1() -> Vec<u8> {
    [0x0000_u16, 0x0000, 0x25BC, 0x1572, 0x0038, 0x0000, 0x0000, 0x0001, 0x0258]
        .iter()
        .flat_map(|w| w.to_le_bytes())
        .collect()
}

fn font(name: &str) -> Vec<u8> {
    let mut b = Vec::with_capacity(16 + name.len());
    b.extend_from_slice(&200_u16.to_le_bytes()); // 10pt, in twips
    b.extend_from_slice(&0_u16.to_le_bytes()); // attributes
    b.extend_from_slice(&0x7FFF_u16.to_le_bytes()); // automatic colour
    b.extend_from_slice(&400_u16.to_le_bytes()); // normal weight
    b.extend_from_slice(&0_u16.to_le_bytes()); // no super/subscript
    b.extend_from_slice(&[0, 0, 0, 0]); // underline, family, charset, reserved
    push_short_string(&mut b, name);
    b
}

fn xf(style: bool) -> Vec<u8> {
    // Style XFs have no parent (0xFFF); the cell XF points at style XF 0.
    let (type_prot, used_attrs): (u16, u8) = if style { (0xFFF5, 0xF4) } else { (0x0001, 0xF8) };
    let mut b = Vec::with_capacity(20);
    b.extend_from_slice(&0_u16.to_le_bytes()); // font
    b.extend_from_slice(&0_u16.to_le_bytes()); // number format: General
    b.extend_from_slice(&type_prot.to_le_bytes());
    b.extend_from_slice(&[0x20, 0x00, 0x00, used_attrs]); // bottom aligned, no rotation/indent
    b.extend_from_slice(&0_u32.to_le_bytes()); // borders
    b.extend_from_slice(&0_u32.to_le_bytes()); // border colours
    b.extend_from_slice(&0x20C0_u16.to_le_bytes()); // pattern colours: system fg/bg
    b
}

fn boundsheet(name: &str) -> Vec<u8> {
    let mut b = Vec::with_capacity(8 + 2 * name.len());
    b.extend_from_slice(&0_u32.to_le_bytes()); // stream position, patched later
    b.push(0x00); // visible
    b.push(0x00); // worksheet
    push_short_string(&mut b, name);
    b
}

/// `ShortXLUnicodeString`: 8-bit length, flags, then Latin-1 or UTF-16LE characters.
fn push_short_string(out: &mut Vec<u8>, s: &str) {
    let units: Vec<u16> = s.encode_utf16().take(u8::MAX as usize).collect();
    let compressed = units.iter().all(|&u| u <= 0xFF);
    out.push(units.len() as u8);
    out.push(if compressed { 0x00 } else { 0x01 });
    push_units(out, &units, compressed);
}

fn dimensions(rows: usize, cols: usize) -> Vec<u8> {
    let mut b = Vec::with_capacity(14);
    b.extend_from_slice(&0_u32.to_le_bytes());
    b.extend_from_slice(&(rows as u32).to_le_bytes());
    b.extend_from_slice(&0_u16.to_le_bytes());
    b.extend_from_slice(&(cols as u16).to_le_bytes());
    b.extend_from_slice(&0_u16.to_le_bytes());
    b
}

fn window2() -> Vec<u8> {
    let mut b = Vec::with_capacity(18);
    b.extend_from_slice(&0x06B6_u16.to_le_bytes()); // grid, headers, zeros, selected
    b.extend_from_slice(&0_u16.to_le_bytes()); // top row
    b.extend_from_slice(&0_u16.to_le_bytes()); // left column
    b.extend_from_slice(&0x0000_0040_u32.to_le_bytes()); // gridline colour
    b.extend_from_slice(&0_u16.to_le_bytes());
    b.extend_from_slice(&0_u16.to_le_bytes());
    b.extend_from_slice(&0_u32.to_le_bytes());
    b
}

fn cell_header(r: usize, c: usize) -> Vec<u8> {
    let mut b = Vec::with_capacity(10);
    b.extend_from_slice(&(r as u16).to_le_bytes());
    b.extend_from_slice(&(c as u16).to_le_bytes());
    b.extend_from_slice(&CELL_XF.to_le_bytes());
    b
}

fn label_sst(r: usize, c: usize, isst: u32) -> Vec<u8> {
    let mut b = cell_header(r, c);
    b.extend_from_slice(&isst.to_le_bytes());
    b
}

fn blank(r: usize, c: usize) -> Vec<u8> {
    cell_header(r, c)
}
