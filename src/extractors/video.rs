//! Contenedores de video: cajas ISO-BMFF (MP4/MOV), elementos EBML
//! (Matroska/WebM), chunks RIFF (AVI) y etiquetas FLV.

use super::Extractor;
use crate::error::ExtractionError;
use crate::metadata::report::{ExtractionResult, MetadataMap, MetadataValue};
use chrono::{NaiveDate, TimeDelta};
use std::fs::File;
use std::io::{Cursor, Read, Seek, SeekFrom};
use std::path::Path;

pub const NO_METADATA_FOUND: &str = "No metadata found.";

const NAME: &str = "video";
const UNPARSEABLE: &str = "Unable to parse file.";
const MOOV_LIMIT: usize = 8 * 1024 * 1024;
const CHILD_LIMIT: usize = 4 * 1024 * 1024;
const MKV_HEAD_LIMIT: u64 = 16 * 1024 * 1024;
const AVI_HEAD_LIMIT: u64 = 1024 * 1024;
const FLV_HEAD_LIMIT: u64 = 1024 * 1024;
const EBML_MAGIC: [u8; 4] = [0x1A, 0x45, 0xDF, 0xA3];
const QUICKTIME_TOP_LEVEL: [&[u8; 4]; 6] = [b"ftyp", b"moov", b"mdat", b"free", b"wide", b"skip"];

pub struct VideoExtractor;

impl Extractor for VideoExtractor {
    fn name(&self) -> &'static str {
        NAME
    }

    fn read(&self, path: &Path) -> Result<ExtractionResult, ExtractionError> {
        let mut file = File::open(path).map_err(|error| ExtractionError::file_access(path, error))?;
        let mut magic = [0_u8; 12];
        let read = file
            .read(&mut magic)
            .map_err(|error| ExtractionError::file_access(path, error))?;
        file.seek(SeekFrom::Start(0))
            .map_err(|error| ExtractionError::file_access(path, error))?;

        let metadata = if read >= 4 && magic[0..4] == EBML_MAGIC {
            read_mkv_metadata(&mut file)
        } else if read >= 8 && QUICKTIME_TOP_LEVEL.iter().any(|kind| magic[4..8] == kind[..]) {
            read_mp4_metadata(&mut file)
        } else if read == 12 && &magic[0..4] == b"RIFF" && &magic[8..12] == b"AVI " {
            read_avi_metadata(&mut file)
        } else if read >= 9 && &magic[0..3] == b"FLV" {
            read_flv_metadata(&mut file)
        } else {
            return Err(ExtractionError::failure(NAME, UNPARSEABLE));
        };

        if metadata.is_empty() {
            Ok(ExtractionResult::NotFound(NO_METADATA_FOUND.to_string()))
        } else {
            Ok(ExtractionResult::Metadata(metadata))
        }
    }
}

// === MP4 / MOV ===

#[derive(Default)]
struct MovieHeader {
    duration: Option<u64>,
    timescale: Option<u32>,
    creation_time: Option<u64>,
    modification_time: Option<u64>,
}

fn read_mp4_metadata<R: Read + Seek>(reader: &mut R) -> MetadataMap {
    let mut metadata = MetadataMap::new();
    let mut brands = Vec::new();
    let mut movie = MovieHeader::default();
    let mut tracks = Vec::new();
    let mut moov_seen = false;
    let mut moov_before_mdat = false;
    let mut mdat_seen = false;

    while let Some(header) = read_box_header(reader) {
        match &header.kind {
            b"ftyp" => {
                let Some(payload) = read_box_payload(reader, &header, CHILD_LIMIT) else {
                    break;
                };
                if payload.len() >= 8 {
                    brands.push(fourcc(&payload[0..4]));
                    brands.extend(payload[8..].chunks_exact(4).map(fourcc));
                }
            }
            b"moov" => {
                moov_seen = true;
                moov_before_mdat = !mdat_seen;
                let Some(payload) = read_box_payload(reader, &header, MOOV_LIMIT) else {
                    break;
                };
                parse_mp4_moov(&payload, &mut movie, &mut tracks);
            }
            kind => {
                if kind == b"mdat" {
                    mdat_seen = true;
                }
                let Some(skip) = header.payload_size.and_then(|size| i64::try_from(size).ok())
                else {
                    break;
                };
                if reader.seek(SeekFrom::Current(skip)).is_err() {
                    break;
                }
            }
        }
    }

    brands.retain(|brand| !brand.is_empty());
    brands.dedup();
    if !brands.is_empty() {
        metadata.insert(
            "Brands".into(),
            MetadataValue::from(brands.into_iter().map(MetadataValue::from).collect::<Vec<_>>()),
        );
    }
    if let (Some(duration), Some(timescale)) = (movie.duration, movie.timescale)
        && timescale > 0
    {
        let seconds = duration as f64 / f64::from(timescale);
        metadata.insert("Duration".into(), MetadataValue::from(round2(seconds)));
        metadata.insert("Timescale".into(), MetadataValue::from(timescale));
    }
    if let Some(created) = movie.creation_time.and_then(format_mp4_time) {
        metadata.insert("Creation Time".into(), MetadataValue::from(created));
    }
    if let Some(modified) = movie.modification_time.and_then(format_mp4_time) {
        metadata.insert("Modification Time".into(), MetadataValue::from(modified));
    }
    if moov_seen {
        metadata.insert("Fast Start".into(), MetadataValue::from(moov_before_mdat));
    }
    if !tracks.is_empty() {
        metadata.insert("Track Count".into(), MetadataValue::from(tracks.len()));
        metadata.insert(
            "Tracks".into(),
            MetadataValue::from(tracks.into_iter().map(MetadataValue::from).collect::<Vec<_>>()),
        );
    }
    if !metadata.is_empty() {
        metadata.insert("Container".into(), MetadataValue::from("MP4/QuickTime"));
    }
    metadata
}

fn parse_mp4_moov(data: &[u8], movie: &mut MovieHeader, tracks: &mut Vec<MetadataMap>) {
    for_each_box(data, |kind, payload| match kind {
        b"mvhd" => parse_mvhd(payload, movie),
        b"trak" => {
            let track = parse_mp4_trak(payload);
            if !track.is_empty() {
                tracks.push(track);
            }
        }
        _ => {}
    });
}

fn parse_mvhd(payload: &[u8], movie: &mut MovieHeader) {
    match payload.first() {
        Some(1) if payload.len() >= 32 => {
            movie.creation_time = Some(be_u64(&payload[4..12]));
            movie.modification_time = Some(be_u64(&payload[12..20]));
            movie.timescale = Some(be_u32(&payload[20..24]));
            movie.duration = Some(be_u64(&payload[24..32]));
        }
        Some(0) if payload.len() >= 20 => {
            movie.creation_time = Some(u64::from(be_u32(&payload[4..8])));
            movie.modification_time = Some(u64::from(be_u32(&payload[8..12])));
            movie.timescale = Some(be_u32(&payload[12..16]));
            movie.duration = Some(u64::from(be_u32(&payload[16..20])));
        }
        _ => {}
    }
}

fn parse_mp4_trak(data: &[u8]) -> MetadataMap {
    let mut track = MetadataMap::new();
    for_each_box(data, |kind, payload| match kind {
        b"tkhd" => {
            // Versión 1 usa tiempos de 64 bits: las dimensiones se desplazan 12 bytes.
            let offset = if payload.first() == Some(&1) { 88 } else { 76 };
            let Some(dimensions) = payload.get(offset..offset + 8) else {
                return;
            };
            let width = be_u32(&dimensions[0..4]) >> 16;
            let height = be_u32(&dimensions[4..8]) >> 16;
            if width > 0 && height > 0 {
                track.insert("Width".into(), MetadataValue::from(width));
                track.insert("Height".into(), MetadataValue::from(height));
            }
        }
        b"mdia" => parse_mp4_mdia(payload, &mut track),
        _ => {}
    });
    track
}

fn parse_mp4_mdia(data: &[u8], track: &mut MetadataMap) {
    for_each_box(data, |kind, payload| match kind {
        b"hdlr" if payload.len() >= 12 => {
            track.insert("Handler".into(), MetadataValue::from(fourcc(&payload[8..12])));
        }
        b"mdhd" => {
            let timing = match payload.first() {
                Some(1) if payload.len() >= 32 => {
                    Some((be_u32(&payload[20..24]), be_u64(&payload[24..32])))
                }
                Some(0) if payload.len() >= 20 => Some((
                    be_u32(&payload[12..16]),
                    u64::from(be_u32(&payload[16..20])),
                )),
                _ => None,
            };
            if let Some((timescale, duration)) = timing
                && timescale > 0
            {
                track.insert(
                    "Duration".into(),
                    MetadataValue::from(round2(duration as f64 / f64::from(timescale))),
                );
            }
        }
        b"minf" => for_each_box(payload, |kind, payload| {
            if kind == b"stbl" {
                for_each_box(payload, |kind, payload| {
                    if kind == b"stsd" {
                        parse_mp4_stsd(payload, track);
                    }
                });
            }
        }),
        _ => {}
    });
}

fn parse_mp4_stsd(payload: &[u8], track: &mut MetadataMap) {
    if payload.len() < 16 {
        return;
    }
    track.insert("Codec".into(), MetadataValue::from(fourcc(&payload[12..16])));
    let is_audio = track
        .get("Handler")
        .and_then(MetadataValue::as_text)
        .is_some_and(|handler| handler == "soun");
    // Entrada de audio: canales en 32..34, frecuencia 16.16 en 40..44.
    if is_audio && payload.len() >= 44 {
        let channels = u32::from(u16::from_be_bytes([payload[32], payload[33]]));
        let sample_rate = be_u32(&payload[40..44]) >> 16;
        track.insert("Channels".into(), MetadataValue::from(channels));
        track.insert("Sample Rate".into(), MetadataValue::from(sample_rate));
    }
}

struct BoxHeader {
    kind: [u8; 4],
    /// `None` cuando la caja se extiende hasta el final del archivo.
    payload_size: Option<u64>,
}

fn read_box_header<R: Read>(reader: &mut R) -> Option<BoxHeader> {
    let mut buffer = [0_u8; 8];
    reader.read_exact(&mut buffer).ok()?;
    let size = u64::from(be_u32(&buffer[0..4]));
    let mut kind = [0_u8; 4];
    kind.copy_from_slice(&buffer[4..8]);
    let payload_size = match size {
        0 => None,
        1 => {
            let mut large = [0_u8; 8];
            reader.read_exact(&mut large).ok()?;
            Some(u64::from_be_bytes(large).checked_sub(16)?)
        }
        _ => Some(size.checked_sub(8)?),
    };
    Some(BoxHeader { kind, payload_size })
}

fn read_box_payload<R: Read>(reader: &mut R, header: &BoxHeader, limit: usize) -> Option<Vec<u8>> {
    let mut buffer = Vec::new();
    match header.payload_size {
        Some(size) => {
            let size = usize::try_from(size).ok()?;
            let wanted = size.min(limit);
            reader.by_ref().take(wanted as u64).read_to_end(&mut buffer).ok()?;
            if buffer.len() < wanted {
                return None;
            }
            let remaining = (size - wanted) as u64;
            if remaining > 0 {
                std::io::copy(&mut reader.by_ref().take(remaining), &mut std::io::sink()).ok()?;
            }
        }
        None => {
            reader.by_ref().take(limit as u64).read_to_end(&mut buffer).ok()?;
        }
    }
    Some(buffer)
}

/// Recorre las cajas hijas de `data`, ignorando la cola truncada.
fn for_each_box(data: &[u8], mut visit: impl FnMut(&[u8; 4], &[u8])) {
    let mut cursor = Cursor::new(data);
    while let Some(header) = read_box_header(&mut cursor) {
        let start = cursor.position() as usize;
        let end = match header.payload_size {
            Some(size) => match usize::try_from(size).ok().and_then(|size| start.checked_add(size)) {
                Some(end) if end <= data.len() => end,
                _ => break,
            },
            None => data.len(),
        };
        visit(&header.kind, &data[start..end]);
        cursor.set_position(end as u64);
    }
}

/// Segundos desde 1904-01-01 (época QuickTime); cero se trata como ausente.
fn format_mp4_time(seconds: u64) -> Option<String> {
    if seconds == 0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1904, 1, 1)?.and_hms_opt(0, 0, 0)?;
    let delta = TimeDelta::try_seconds(i64::try_from(seconds).ok()?)?;
    let moment = epoch.checked_add_signed(delta)?;
    Some(moment.format("%Y-%m-%dT%H:%M:%SZ").to_string())
}

// === Matroska / WebM ===

const EBML_HEADER: u32 = 0x1A45DFA3;
const SEGMENT: u32 = 0x18538067;
const INFO: u32 = 0x1549A966;
const TRACKS: u32 = 0x1654AE6B;
const TRACK_ENTRY: u32 = 0xAE;

fn read_mkv_metadata<R: Read>(reader: &mut R) -> MetadataMap {
    let mut data = Vec::new();
    if reader.take(MKV_HEAD_LIMIT).read_to_end(&mut data).is_err() {
        return MetadataMap::new();
    }

    let mut metadata = MetadataMap::new();
    for_each_element(&data, |id, payload| match id {
        EBML_HEADER => parse_mkv_ebml_header(payload, &mut metadata),
        SEGMENT => for_each_element(payload, |id, payload| match id {
            INFO => parse_mkv_info(payload, &mut metadata),
            TRACKS => parse_mkv_tracks(payload, &mut metadata),
            _ => {}
        }),
        _ => {}
    });

    if !metadata.is_empty() {
        metadata.insert("Container".into(), MetadataValue::from("Matroska"));
    }
    metadata
}

fn parse_mkv_ebml_header(data: &[u8], metadata: &mut MetadataMap) {
    for_each_element(data, |id, payload| {
        if id == 0x4282 {
            metadata.insert("Doc Type".into(), MetadataValue::from(read_ebml_string(payload)));
        }
    });
}

fn parse_mkv_info(data: &[u8], metadata: &mut MetadataMap) {
    let mut timecode_scale = 1_000_000_u64;
    let mut duration = None;
    for_each_element(data, |id, payload| match id {
        0x7BA9 => {
            metadata.insert("Title".into(), MetadataValue::from(read_ebml_string(payload)));
        }
        0x4D80 => {
            metadata.insert("Muxing App".into(), MetadataValue::from(read_ebml_string(payload)));
        }
        0x5741 => {
            metadata.insert("Writing App".into(), MetadataValue::from(read_ebml_string(payload)));
        }
        0x2AD7B1 => timecode_scale = read_ebml_uint(payload),
        0x4489 => duration = read_ebml_float(payload),
        _ => {}
    });
    if let Some(duration) = duration {
        let seconds = duration * timecode_scale as f64 / 1_000_000_000.0;
        metadata.insert("Duration".into(), MetadataValue::from(round2(seconds)));
    }
}

fn parse_mkv_tracks(data: &[u8], metadata: &mut MetadataMap) {
    let mut tracks = Vec::new();
    for_each_element(data, |id, payload| {
        if id == TRACK_ENTRY {
            tracks.push(MetadataValue::from(parse_mkv_track_entry(payload)));
        }
    });
    if !tracks.is_empty() {
        metadata.insert("Track Count".into(), MetadataValue::from(tracks.len()));
        metadata.insert("Tracks".into(), MetadataValue::from(tracks));
    }
}

fn parse_mkv_track_entry(data: &[u8]) -> MetadataMap {
    let mut track = MetadataMap::new();
    for_each_element(data, |id, payload| {
        let (key, value) = match id {
            0xD7 => ("Number", MetadataValue::from(read_ebml_uint(payload))),
            0x83 => ("Type", MetadataValue::from(mkv_track_type_label(read_ebml_uint(payload)))),
            0x86 => ("Codec", MetadataValue::from(read_ebml_string(payload))),
            0x258688 => ("Codec Name", MetadataValue::from(read_ebml_string(payload))),
            0x22B59C => ("Language", MetadataValue::from(read_ebml_string(payload))),
            _ => return,
        };
        track.insert(key.into(), value);
    });
    track
}

fn mkv_track_type_label(value: u64) -> &'static str {
    match value {
        1 => "video",
        2 => "audio",
        17 => "subtitles",
        _ => "other",
    }
}

/// Recorre los elementos EBML de `data`; un elemento cortado por el límite de
/// lectura se visita con lo disponible.
fn for_each_element(data: &[u8], mut visit: impl FnMut(u32, &[u8])) {
    let mut cursor = Cursor::new(data);
    while let Some((id, size)) = read_ebml_element(&mut cursor) {
        let start = cursor.position() as usize;
        let end = match size.and_then(|size| usize::try_from(size).ok()) {
            Some(size) => start.saturating_add(size).min(data.len()),
            None => data.len(),
        };
        visit(id, &data[start..end]);
        if end >= data.len() {
            break;
        }
        cursor.set_position(end as u64);
    }
}

fn read_ebml_element(cursor: &mut Cursor<&[u8]>) -> Option<(u32, Option<u64>)> {
    let id = read_ebml_id(cursor)?;
    let size = read_ebml_size(cursor)?;
    Some((id, size))
}

fn read_ebml_id(cursor: &mut Cursor<&[u8]>) -> Option<u32> {
    let first = read_byte(cursor)?;
    let length = first.leading_zeros() + 1;
    if length > 4 {
        return None;
    }
    let mut value = u32::from(first);
    for _ in 1..length {
        value = (value << 8) | u32::from(read_byte(cursor)?);
    }
    Some(value)
}

/// Tamaño variable; todos los bits de valor a uno significan "desconocido".
fn read_ebml_size(cursor: &mut Cursor<&[u8]>) -> Option<Option<u64>> {
    let first = read_byte(cursor)?;
    let length = first.leading_zeros() + 1;
    if length > 8 {
        return None;
    }
    let mask = 0xFF_u8.checked_shr(length).unwrap_or(0);
    let mut value = u64::from(first & mask);
    let mut all_ones = first & mask == mask;
    for _ in 1..length {
        let byte = read_byte(cursor)?;
        all_ones &= byte == 0xFF;
        value = (value << 8) | u64::from(byte);
    }
    Some(if all_ones { None } else { Some(value) })
}

fn read_byte(cursor: &mut Cursor<&[u8]>) -> Option<u8> {
    let mut byte = [0_u8; 1];
    cursor.read_exact(&mut byte).ok()?;
    Some(byte[0])
}

fn read_ebml_uint(data: &[u8]) -> u64 {
    data.iter().fold(0_u64, |value, &b| (value << 8) | u64::from(b))
}

fn read_ebml_string(data: &[u8]) -> String {
    String::from_utf8_lossy(data)
        .trim_matches(char::from(0))
        .trim()
        .to_string()
}

fn read_ebml_float(data: &[u8]) -> Option<f64> {
    match data.len() {
        4 => Some(f64::from(f32::from_be_bytes([data[0], data[1], data[2], data[3]]))),
        8 => Some(f64::from_be_bytes([
            data[0], data[1], data[2], data[3], data[4], data[5], data[6], data[7],
        ])),
        _ => None,
    }
}

// === AVI (RIFF) ===

#[derive(Default)]
struct AviSummary {
    micros_per_frame: u32,
    total_frames: u32,
    width: u32,
    height: u32,
    streams: Vec<MetadataMap>,
}

fn read_avi_metadata<R: Read>(reader: &mut R) -> MetadataMap {
    let mut data = Vec::new();
    if reader.take(AVI_HEAD_LIMIT).read_to_end(&mut data).is_err() || data.len() < 12 {
        return MetadataMap::new();
    }

    let mut summary = AviSummary::default();
    let mut metadata = MetadataMap::new();
    for_each_riff_chunk(&data[12..], |id, payload| {
        if id != b"LIST" || payload.len() < 4 {
            return;
        }
        match &payload[0..4] {
            b"hdrl" => parse_avi_hdrl(&payload[4..], &mut summary),
            b"INFO" => parse_riff_info(&payload[4..], &mut metadata),
            _ => {}
        }
    });

    if summary.micros_per_frame > 0 {
        let frame_rate = 1_000_000.0 / f64::from(summary.micros_per_frame);
        metadata.insert("Frame Rate".into(), MetadataValue::from(round2(frame_rate)));
        if summary.total_frames > 0 {
            let seconds =
                f64::from(summary.total_frames) * f64::from(summary.micros_per_frame) / 1_000_000.0;
            metadata.insert("Duration".into(), MetadataValue::from(round2(seconds)));
        }
    }
    if summary.width > 0 && summary.height > 0 {
        metadata.insert("Width".into(), MetadataValue::from(summary.width));
        metadata.insert("Height".into(), MetadataValue::from(summary.height));
    }
    if !summary.streams.is_empty() {
        metadata.insert("Track Count".into(), MetadataValue::from(summary.streams.len()));
        metadata.insert(
            "Tracks".into(),
            MetadataValue::from(
                summary
                    .streams
                    .into_iter()
                    .map(MetadataValue::from)
                    .collect::<Vec<_>>(),
            ),
        );
    }
    if !metadata.is_empty() {
        metadata.insert("Container".into(), MetadataValue::from("AVI"));
    }
    metadata
}

fn parse_avi_hdrl(data: &[u8], summary: &mut AviSummary) {
    for_each_riff_chunk(data, |id, payload| match id {
        b"avih" if payload.len() >= 40 => {
            summary.micros_per_frame = le_u32(&payload[0..4]);
            summary.total_frames = le_u32(&payload[16..20]);
            summary.width = le_u32(&payload[32..36]);
            summary.height = le_u32(&payload[36..40]);
        }
        b"LIST" if payload.starts_with(b"strl") => {
            let stream = parse_avi_strl(&payload[4..]);
            if !stream.is_empty() {
                summary.streams.push(stream);
            }
        }
        _ => {}
    });
}

/// Cabecera `strh` más el formato `strf` (BITMAPINFOHEADER o WAVEFORMATEX).
fn parse_avi_strl(data: &[u8]) -> MetadataMap {
    let mut stream = MetadataMap::new();
    let mut kind = [0_u8; 4];
    for_each_riff_chunk(data, |id, payload| match id {
        b"strh" if payload.len() >= 36 => {
            kind.copy_from_slice(&payload[0..4]);
            stream.insert("Type".into(), MetadataValue::from(avi_stream_type_label(&kind)));
            let handler = fourcc(&payload[4..8]);
            if !handler.is_empty() {
                stream.insert("Codec".into(), MetadataValue::from(handler));
            }
            let scale = le_u32(&payload[20..24]);
            let rate = le_u32(&payload[24..28]);
            let length = le_u32(&payload[32..36]);
            if scale > 0 && rate > 0 {
                let units_per_second = f64::from(rate) / f64::from(scale);
                if &kind == b"vids" {
                    stream.insert("Frame Rate".into(), MetadataValue::from(round2(units_per_second)));
                }
                if length > 0 {
                    stream.insert(
                        "Duration".into(),
                        MetadataValue::from(round2(f64::from(length) / units_per_second)),
                    );
                }
            }
        }
        b"strf" => match &kind {
            b"vids" if payload.len() >= 20 => {
                // biHeight negativo indica un bitmap de arriba hacia abajo.
                let width = (le_u32(&payload[4..8]) as i32).unsigned_abs();
                let height = (le_u32(&payload[8..12]) as i32).unsigned_abs();
                stream.insert("Width".into(), MetadataValue::from(width));
                stream.insert("Height".into(), MetadataValue::from(height));
                let compression = fourcc(&payload[16..20]);
                if !compression.is_empty() {
                    stream.insert("Codec".into(), MetadataValue::from(compression));
                }
            }
            b"auds" if payload.len() >= 8 => {
                let format_tag = u16::from_le_bytes([payload[0], payload[1]]);
                let channels = u16::from_le_bytes([payload[2], payload[3]]);
                stream.insert("Codec".into(), MetadataValue::from(format!("0x{format_tag:04X}")));
                stream.insert("Channels".into(), MetadataValue::from(u32::from(channels)));
                stream.insert("Sample Rate".into(), MetadataValue::from(le_u32(&payload[4..8])));
            }
            _ => {}
        },
        _ => {}
    });
    stream
}

fn avi_stream_type_label(kind: &[u8; 4]) -> &'static str {
    match kind {
        b"vids" => "video",
        b"auds" => "audio",
        b"txts" => "subtitles",
        _ => "other",
    }
}

fn parse_riff_info(data: &[u8], metadata: &mut MetadataMap) {
    for_each_riff_chunk(data, |id, payload| {
        let key = match id {
            b"INAM" => "Title",
            b"ISFT" => "Writing App",
            b"IART" => "Artist",
            b"ICMT" => "Comment",
            b"ICRD" => "Creation Date",
            _ => return,
        };
        let value = fourcc(payload);
        if !value.is_empty() {
            metadata.insert(key.into(), MetadataValue::from(value));
        }
    });
}

/// Recorre chunks RIFF (id, tamaño little-endian, relleno a par); el último
/// chunk se visita truncado si excede el búfer.
fn for_each_riff_chunk(data: &[u8], mut visit: impl FnMut(&[u8; 4], &[u8])) {
    let mut offset = 0;
    while offset + 8 <= data.len() {
        let mut id = [0_u8; 4];
        id.copy_from_slice(&data[offset..offset + 4]);
        let size = le_u32(&data[offset + 4..offset + 8]) as usize;
        let start = offset + 8;
        let end = start.saturating_add(size).min(data.len());
        visit(&id, &data[start..end]);
        offset = start.saturating_add(size).saturating_add(size & 1);
    }
}

// === FLV ===

fn read_flv_metadata<R: Read>(reader: &mut R) -> MetadataMap {
    let mut data = Vec::new();
    if reader.take(FLV_HEAD_LIMIT).read_to_end(&mut data).is_err() || data.len() < 9 {
        return MetadataMap::new();
    }

    let mut metadata = MetadataMap::new();
    metadata.insert("Container".into(), MetadataValue::from("FLV"));
    metadata.insert("Version".into(), MetadataValue::from(u32::from(data[3])));
    metadata.insert("Has Audio".into(), MetadataValue::from(data[4] & 0x04 != 0));
    metadata.insert("Has Video".into(), MetadataValue::from(data[4] & 0x01 != 0));

    // Primera etiqueta tras la cabecera y el PreviousTagSize0.
    let header_size = be_u32(&data[5..9]) as usize;
    let tag_start = header_size.saturating_add(4);
    let Some(tag_header) = data.get(tag_start..tag_start + 11) else {
        return metadata;
    };
    const SCRIPT_TAG: u8 = 18;
    if tag_header[0] != SCRIPT_TAG {
        return metadata;
    }
    let body_size = u32::from_be_bytes([0, tag_header[1], tag_header[2], tag_header[3]]) as usize;
    let body_start = tag_start + 11;
    let body_end = body_start.saturating_add(body_size).min(data.len());
    let script = parse_flv_on_metadata(&data[body_start..body_end]);

    for (source, key) in [
        ("duration", "Duration"),
        ("width", "Width"),
        ("height", "Height"),
        ("framerate", "Frame Rate"),
    ] {
        if let Some(MetadataValue::Float(value)) = script.get(source) {
            metadata.insert(key.into(), MetadataValue::from(round2(*value)));
        }
    }
    if !script.is_empty() {
        metadata.insert("Script Data".into(), MetadataValue::from(script));
    }
    metadata
}

/// Decodifica el arreglo AMF0 de `onMetaData`; solo números, booleanos y cadenas.
fn parse_flv_on_metadata(data: &[u8]) -> MetadataMap {
    let mut values = MetadataMap::new();
    let mut cursor = Cursor::new(data);
    match read_amf_value(&mut cursor) {
        Some(MetadataValue::Text(name)) if name == "onMetaData" => {}
        _ => return values,
    }
    let Some(kind) = read_byte(&mut cursor) else {
        return values;
    };
    const AMF_OBJECT: u8 = 0x03;
    const AMF_ECMA_ARRAY: u8 = 0x08;
    match kind {
        AMF_ECMA_ARRAY => {
            let mut count = [0_u8; 4];
            if cursor.read_exact(&mut count).is_err() {
                return values;
            }
        }
        AMF_OBJECT => {}
        _ => return values,
    }
    while let Some(key) = read_amf_string(&mut cursor) {
        if key.is_empty() {
            break;
        }
        let Some(value) = read_amf_value(&mut cursor) else {
            break;
        };
        values.insert(key, value);
    }
    values
}

fn read_amf_value(cursor: &mut Cursor<&[u8]>) -> Option<MetadataValue> {
    match read_byte(cursor)? {
        0x00 => {
            let mut number = [0_u8; 8];
            cursor.read_exact(&mut number).ok()?;
            Some(MetadataValue::from(f64::from_be_bytes(number)))
        }
        0x01 => Some(MetadataValue::from(read_byte(cursor)? != 0)),
        0x02 => read_amf_string(cursor).map(MetadataValue::from),
        _ => None,
    }
}

fn read_amf_string(cursor: &mut Cursor<&[u8]>) -> Option<String> {
    let mut length = [0_u8; 2];
    cursor.read_exact(&mut length).ok()?;
    let mut text = vec![0_u8; usize::from(u16::from_be_bytes(length))];
    cursor.read_exact(&mut text).ok()?;
    Some(String::from_utf8_lossy(&text).into_owned())
}

// === Helpers ===

fn be_u32(bytes: &[u8]) -> u32 {
    u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

fn le_u32(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

fn be_u64(bytes: &[u8]) -> u64 {
    u64::from_be_bytes([
        bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
    ])
}

fn fourcc(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .trim_matches(char::from(0))
        .trim()
        .to_string()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
