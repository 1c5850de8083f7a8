//! Metadata de audio MPEG: cabecera de trama, Xing/Info y etiquetas ID3.

use super::Extractor;
use crate::error::ExtractionError;
use crate::metadata::report::{ExtractionResult, MetadataMap, MetadataValue, insert_or_unknown};
use std::fs;
use std::path::Path;

const NAME: &str = "audio";
const ID3V1_TAG_LEN: usize = 128;

/// Géneros ID3v1 con la extensión de Winamp (índices 0 a 147).
const ID3V1_GENRES: [&str; 148] = [
    "Blues", "Classic Rock", "Country", "Dance", "Disco", "Funk", "Grunge", "Hip-Hop", "Jazz",
    "Metal", "New Age", "Oldies", "Other", "Pop", "R&B", "Rap", "Reggae", "Rock", "Techno",
    "Industrial", "Alternative", "Ska", "Death Metal", "Pranks", "Soundtrack", "Euro-Techno",
    "Ambient", "Trip-Hop", "Vocal", "Jazz+Funk", "Fusion", "Trance", "Classical",
    "Instrumental", "Acid", "House", "Game", "Sound Clip", "Gospel", "Noise", "Alternative Rock",
    "Bass", "Soul", "Punk", "Space", "Meditative", "Instrumental Pop", "Instrumental Rock",
    "Ethnic", "Gothic", "Darkwave", "Techno-Industrial", "Electronic", "Pop-Folk", "Eurodance",
    "Dream", "Southern Rock", "Comedy", "Cult", "Gangsta", "Top 40", "Christian Rap",
    "Pop/Funk", "Jungle", "Native American", "Cabaret", "New Wave", "Psychedelic", "Rave",
    "Showtunes", "Trailer", "Lo-Fi", "Tribal", "Acid Punk", "Acid Jazz", "Polka", "Retro",
    "Musical", "Rock & Roll", "Hard Rock", "Folk", "Folk-Rock", "National Folk", "Swing",
    "Fast Fusion", "Bebop", "Latin", "Revival", "Celtic", "Bluegrass", "Avantgarde",
    "Gothic Rock", "Progressive Rock", "Psychedelic Rock", "Symphonic Rock", "Slow Rock",
    "Big Band", "Chorus", "Easy Listening", "Acoustic", "Humour", "Speech", "Chanson", "Opera",
    "Chamber Music", "Sonata", "Symphony", "Booty Bass", "Primus", "Porn Groove", "Satire",
    "Slow Jam", "Club", "Tango", "Samba", "Folklore", "Ballad", "Power Ballad", "Rhythmic Soul",
    "Freestyle", "Duet", "Punk Rock", "Drum Solo", "A Cappella", "Euro-House", "Dance Hall",
    "Goa", "Drum & Bass", "Club-House", "Hardcore", "Terror", "Indie", "BritPop", "Afro-Punk",
    "Polsk Punk", "Beat", "Christian Gangsta Rap", "Heavy Metal", "Black Metal", "Crossover",
    "Contemporary Christian", "Christian Rock", "Merengue", "Salsa", "Thrash Metal", "Anime",
    "JPop", "Synthpop",
];

pub struct AudioExtractor;

impl Extractor for AudioExtractor {
    fn name(&self) -> &'static str {
        NAME
    }

    fn read(&self, path: &Path) -> Result<ExtractionResult, ExtractionError> {
        let data = fs::read(path).map_err(|error| ExtractionError::file_access(path, error))?;
        read_mp3_metadata(&data).map(ExtractionResult::Metadata)
    }
}

fn read_mp3_metadata(data: &[u8]) -> Result<MetadataMap, ExtractionError> {
    let (mut tags, audio_offset) = match parse_id3v2(data) {
        Some((tags, offset)) => (tags, offset),
        None => (Id3Tags::default(), 0),
    };
    let mut audio_end = data.len();
    if let Some(fallback) = parse_id3v1(data) {
        audio_end -= ID3V1_TAG_LEN;
        tags.merge_missing(fallback);
    }

    let (frame_offset, header) = find_frame_header(&data[..audio_end], audio_offset)
        .ok_or_else(|| ExtractionError::failure(NAME, "no MPEG audio frame found"))?;
    let xing = detect_xing_header(&data[frame_offset..audio_end], &header);

    let mut metadata = MetadataMap::new();
    let bitrate = header.bitrate_kbps.map(|kbps| u64::from(kbps) * 1000);
    if let Some(bitrate) = bitrate {
        metadata.insert("Bitrate".into(), MetadataValue::from(bitrate));
    }
    metadata.insert("Sample Rate".into(), MetadataValue::from(header.sample_rate));
    metadata.insert("Channels".into(), MetadataValue::from(header.channels));
    metadata.insert("MPEG Version".into(), MetadataValue::from(header.mpeg_version));
    metadata.insert("Layer".into(), MetadataValue::from(header.layer));
    metadata.insert(
        "Bitrate Mode".into(),
        MetadataValue::from(xing.mode.unwrap_or("Unknown")),
    );
    if let Some(version) = tags.version.take() {
        metadata.insert("ID3 Version".into(), MetadataValue::from(version));
    }

    let audio_bytes = audio_end.saturating_sub(frame_offset) as u64;
    let length = match xing.frame_count {
        Some(frames) if header.sample_rate > 0 => {
            Some(f64::from(frames) * f64::from(header.samples_per_frame) / f64::from(header.sample_rate))
        }
        _ => bitrate
            .filter(|bits| *bits > 0)
            .map(|bits| audio_bytes as f64 * 8.0 / bits as f64),
    };
    if let Some(length) = length {
        metadata.insert(
            "Length".into(),
            MetadataValue::from((length * 100.0).round() / 100.0),
        );
    }

    insert_or_unknown(&mut metadata, "Artist", tags.artist);
    insert_or_unknown(&mut metadata, "Album", tags.album);
    insert_or_unknown(&mut metadata, "Title", tags.title);
    insert_or_unknown(&mut metadata, "Track Number", tags.track);
    insert_or_unknown(&mut metadata, "Genre", tags.genre.as_deref().map(resolve_genre));
    insert_or_unknown(&mut metadata, "Year", tags.year);

    Ok(metadata)
}

#[derive(Default)]
struct Id3Tags {
    version: Option<String>,
    title: Option<String>,
    artist: Option<String>,
    album: Option<String>,
    year: Option<String>,
    track: Option<String>,
    genre: Option<String>,
}

impl Id3Tags {
    fn merge_missing(&mut self, other: Id3Tags) {
        self.version = self.version.take().or(other.version);
        self.title = self.title.take().or(other.title);
        self.artist = self.artist.take().or(other.artist);
        self.album = self.album.take().or(other.album);
        self.year = self.year.take().or(other.year);
        self.track = self.track.take().or(other.track);
        self.genre = self.genre.take().or(other.genre);
    }
}

/// Devuelve las etiquetas ID3v2 y el desplazamiento donde empieza el audio.
fn parse_id3v2(data: &[u8]) -> Option<(Id3Tags, usize)> {
    if data.len() < 10 || &data[0..3] != b"ID3" {
        return None;
    }
    let major = data[3];
    let size = synchsafe_to_u32(&data[6..10]) as usize;
    let end = (10 + size).min(data.len());
    let tag_data = &data[10..end];

    let mut tags = Id3Tags {
        version: Some(format!("v2.{}.{}", major, data[4])),
        ..Id3Tags::default()
    };

    // ID3v2.2: id de tres letras y tamaño de 3 bytes; 2.3/2.4: cuatro y cuatro.
    let (id_len, header_len) = if major <= 2 { (3, 6) } else { (4, 10) };
    let mut offset = 0;
    while offset + header_len <= tag_data.len() {
        let frame_id = &tag_data[offset..offset + id_len];
        if frame_id.iter().all(|b| *b == 0) {
            break;
        }
        let size_bytes = &tag_data[offset + id_len..offset + 2 * id_len];
        let frame_size = match major {
            0..=2 => u32::from_be_bytes([0, size_bytes[0], size_bytes[1], size_bytes[2]]),
            3 => u32::from_be_bytes([size_bytes[0], size_bytes[1], size_bytes[2], size_bytes[3]]),
            _ => synchsafe_to_u32(size_bytes),
        } as usize;
        let frame_start = offset + header_len;
        let frame_end = frame_start.saturating_add(frame_size);
        if frame_end > tag_data.len() {
            break;
        }
        let frame = &tag_data[frame_start..frame_end];
        match frame_id {
            b"TIT2" | b"TT2" => tags.title = decode_id3_text(frame),
            b"TPE1" | b"TP1" => tags.artist = decode_id3_text(frame),
            b"TALB" | b"TAL" => tags.album = decode_id3_text(frame),
            b"TDRC" | b"TYER" | b"TYE" => tags.year = decode_id3_text(frame),
            b"TRCK" | b"TRK" => tags.track = decode_id3_text(frame),
            b"TCON" | b"TCO" => tags.genre = decode_id3_text(frame),
            _ => {}
        }
        offset = frame_end;
    }

    Some((tags, end))
}

fn parse_id3v1(data: &[u8]) -> Option<Id3Tags> {
    if data.len() < ID3V1_TAG_LEN {
        return None;
    }
    let tag = &data[data.len() - ID3V1_TAG_LEN..];
    if &tag[0..3] != b"TAG" {
        return None;
    }
    let track = if tag[125] == 0 && tag[126] != 0 {
        Some(tag[126].to_string())
    } else {
        None
    };
    Some(Id3Tags {
        version: Some("v1".to_string()),
        title: read_latin1_field(&tag[3..33]),
        artist: read_latin1_field(&tag[33..63]),
        album: read_latin1_field(&tag[63..93]),
        year: read_latin1_field(&tag[93..97]),
        track,
        genre: ID3V1_GENRES.get(usize::from(tag[127])).map(|name| name.to_string()),
    })
}

/// Traduce referencias numéricas de género (`17`, `(17)`, `(17)Rock`, `(RX)`).
fn resolve_genre(raw: &str) -> String {
    let raw = raw.trim();
    if let Some(rest) = raw.strip_prefix('(')
        && let Some((reference, refinement)) = rest.split_once(')')
    {
        let refinement = refinement.trim();
        if !refinement.is_empty() && !refinement.starts_with('(') {
            return refinement.to_string();
        }
        return match reference {
            "RX" => "Remix".to_string(),
            "CR" => "Cover".to_string(),
            other => genre_by_index(other).unwrap_or_else(|| raw.to_string()),
        };
    }
    genre_by_index(raw).unwrap_or_else(|| raw.to_string())
}

fn genre_by_index(text: &str) -> Option<String> {
    let index: usize = text.parse().ok()?;
    ID3V1_GENRES.get(index).map(|name| name.to_string())
}

fn read_latin1_field(data: &[u8]) -> Option<String> {
    let text: String = data
        .iter()
        .take_while(|b| **b != 0)
        .map(|b| char::from(*b))
        .collect();
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

fn synchsafe_to_u32(bytes: &[u8]) -> u32 {
    let mut value = 0_u32;
    for &b in bytes {
        value = (value << 7) | (b as u32 & 0x7F);
    }
    value
}

fn decode_id3_text(frame: &[u8]) -> Option<String> {
    if frame.is_empty() {
        return None;
    }
    let encoding = frame[0];
    let data = &frame[1..];
    let text = match encoding {
        0 => data.iter().map(|b| char::from(*b)).collect::<String>(),
        1 | 2 => {
            if data.len() < 2 {
                return None;
            }
            let (data, little_endian) = match data {
                [0xFF, 0xFE, rest @ ..] => (rest, true),
                [0xFE, 0xFF, rest @ ..] => (rest, false),
                _ => (data, encoding == 1),
            };
            let utf16 = data
                .chunks_exact(2)
                .map(|chunk| {
                    if little_endian {
                        u16::from_le_bytes([chunk[0], chunk[1]])
                    } else {
                        u16::from_be_bytes([chunk[0], chunk[1]])
                    }
                })
                .collect::<Vec<_>>();
            String::from_utf16_lossy(&utf16)
        }
        3 => String::from_utf8_lossy(data).into_owned(),
        _ => return None,
    };
    let text = text.trim_matches(char::from(0)).trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

struct Mp3FrameHeader {
    mpeg_version: &'static str,
    layer: &'static str,
    bitrate_kbps: Option<u32>,
    sample_rate: u32,
    samples_per_frame: u32,
    channels: &'static str,
    mpeg1: bool,
    mono: bool,
}

fn find_frame_header(data: &[u8], start: usize) -> Option<(usize, Mp3FrameHeader)> {
    let mut offset = start;
    while offset + 4 <= data.len() {
        if data[offset] == 0xFF
            && data[offset + 1] & 0xE0 == 0xE0
            && let Some(header) = parse_frame_header(&data[offset..offset + 4])
        {
            return Some((offset, header));
        }
        offset += 1;
    }
    None
}

fn parse_frame_header(bytes: &[u8]) -> Option<Mp3FrameHeader> {
    let header = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    let version_bits = (header >> 19) & 0x3;
    let layer_bits = (header >> 17) & 0x3;
    let bitrate_index = (header >> 12) & 0xF;
    let sample_index = (header >> 10) & 0x3;
    let channel_mode = (header >> 6) & 0x3;

    if version_bits == 0b01 || layer_bits == 0 || bitrate_index == 0xF || sample_index == 0b11 {
        return None;
    }

    let (mpeg_version, sample_rate) = match version_bits {
        0b11 => ("MPEG1", mp3_sample_rate(sample_index, 44100, 48000, 32000)?),
        0b10 => ("MPEG2", mp3_sample_rate(sample_index, 22050, 24000, 16000)?),
        _ => ("MPEG2.5", mp3_sample_rate(sample_index, 11025, 12000, 8000)?),
    };
    let layer = match layer_bits {
        0b01 => "Layer III",
        0b10 => "Layer II",
        _ => "Layer I",
    };
    let samples_per_frame = match (layer_bits, version_bits) {
        (0b11, _) => 384,
        (0b10, _) => 1152,
        (_, 0b11) => 1152,
        _ => 576,
    };
    let channels = match channel_mode {
        0 => "Stereo",
        1 => "Joint Stereo",
        2 => "Dual Channel",
        _ => "Mono",
    };

    Some(Mp3FrameHeader {
        mpeg_version,
        layer,
        bitrate_kbps: mp3_bitrate(layer_bits, version_bits, bitrate_index),
        sample_rate,
        samples_per_frame,
        channels,
        mpeg1: version_bits == 0b11,
        mono: channel_mode == 0b11,
    })
}

fn mp3_sample_rate(index: u32, a: u32, b: u32, c: u32) -> Option<u32> {
    match index {
        0 => Some(a),
        1 => Some(b),
        2 => Some(c),
        _ => None,
    }
}

fn mp3_bitrate(layer_bits: u32, version_bits: u32, index: u32) -> Option<u32> {
    if index == 0 || index == 0xF {
        return None;
    }
    let table = match (version_bits, layer_bits) {
        (0b11, 0b01) => [0, 32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 0],
        (0b11, 0b10) => [0, 32, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 384, 0],
        (0b11, 0b11) => [0, 32, 64, 96, 128, 160, 192, 224, 256, 288, 320, 352, 384, 416, 448, 0],
        (_, 0b11) => [0, 32, 48, 56, 64, 80, 96, 112, 128, 144, 160, 176, 192, 224, 256, 0],
        _ => [0, 8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160, 0],
    };
    Some(table[index as usize])
}

struct XingHeader {
    mode: Option<&'static str>,
    frame_count: Option<u32>,
}

/// Lee la cabecera Xing/Info tras la side info de la primera trama, o la
/// cabecera VBRI de Fraunhofer a 32 bytes de la cabecera.
fn detect_xing_header(frame: &[u8], header: &Mp3FrameHeader) -> XingHeader {
    let side_info = match (header.mpeg1, header.mono) {
        (true, false) => 32,
        (true, true) | (false, false) => 17,
        (false, true) => 9,
    };
    let xing_offset = 4 + side_info;
    match frame.get(xing_offset..xing_offset + 4) {
        Some(b"Xing") => {
            return XingHeader {
                mode: Some("VBR"),
                frame_count: parse_xing_frames(frame, xing_offset),
            };
        }
        Some(b"Info") => {
            return XingHeader {
                mode: Some("CBR"),
                frame_count: parse_xing_frames(frame, xing_offset),
            };
        }
        _ => {}
    }

    const VBRI_OFFSET: usize = 4 + 32;
    if frame.get(VBRI_OFFSET..VBRI_OFFSET + 4) == Some(&b"VBRI"[..]) {
        let frame_count = frame
            .get(VBRI_OFFSET + 14..VBRI_OFFSET + 18)
            .map(|count| u32::from_be_bytes([count[0], count[1], count[2], count[3]]));
        return XingHeader {
            mode: Some("VBR"),
            frame_count,
        };
    }

    XingHeader {
        mode: None,
        frame_count: None,
    }
}

fn parse_xing_frames(data: &[u8], idx: usize) -> Option<u32> {
    let flags = data.get(idx + 4..idx + 8)?;
    if flags[3] & 0x1 == 0 {
        return None;
    }
    let count = data.get(idx + 8..idx + 12)?;
    Some(u32::from_be_bytes([count[0], count[1], count[2], count[3]]))
}
