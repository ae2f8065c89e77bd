//! NumPy `.npy` / `.npz` array files for density grids.

use crate::error::{Result, SamplerError};
use crate::precision::{ArrayData, Precision};
use constants::array_file::{
    NPY_EXTENSION, NPY_HEADER_ALIGNMENT, NPY_MAGIC, NPY_VERSION, NPZ_ENTRY_NAME, NPZ_EXTENSION,
};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Array read back from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedArray {
    pub shape: Vec<usize>,
    pub data: ArrayData,
}

/// `{stem}.npy` or `{stem}.npz`, keeping any dots already in the stem.
pub fn array_path(stem: &Path, compressed: bool) -> PathBuf {
    let extension = if compressed { NPZ_EXTENSION } else { NPY_EXTENSION };
    let mut name = OsString::from(stem.as_os_str());
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

/// Serialize a C-ordered array in `.npy` format.
pub fn encode_npy(shape: &[usize], data: &ArrayData) -> Vec<u8> {
    let header = npy_header(shape, data.precision());
    let payload = data.to_le_bytes();

    let mut bytes = Vec::with_capacity(NPY_MAGIC.len() + 4 + header.len() + payload.len());
    bytes.extend_from_slice(NPY_MAGIC);
    bytes.push(NPY_VERSION.0);
    bytes.push(NPY_VERSION.1);
    bytes.extend_from_slice(&(header.len() as u16).to_le_bytes());
    bytes.extend_from_slice(header.as_bytes());
    bytes.extend_from_slice(&payload);
    bytes
}

fn npy_header(shape: &[usize], precision: Precision) -> String {
    let dims = match shape {
        [single] => format!("{single},"),
        _ => shape
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join(", "),
    };
    let mut header = format!(
        "{{'descr': '{}', 'fortran_order': False, 'shape': ({}), }}",
        precision.descr(),
        dims
    );

    // magic + version + length field, then the header padded so data starts aligned
    let preamble = NPY_MAGIC.len() + 2 + 2;
    let unpadded = preamble + header.len() + 1;
    let padding = (NPY_HEADER_ALIGNMENT - unpadded % NPY_HEADER_ALIGNMENT) % NPY_HEADER_ALIGNMENT;
    header.push_str(&" ".repeat(padding));
    header.push('\n');
    header
}

/// Write `data` next to `stem` as `.npy`, or as a deflated single-entry `.npz`.
/// Returns the path that was written.
pub fn write_array(
    stem: &Path,
    shape: &[usize],
    data: &ArrayData,
    compressed: bool,
) -> Result<PathBuf> {
    let path = array_path(stem, compressed);
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let bytes = encode_npy(shape, data);
    let mut writer = BufWriter::new(File::create(&path)?);

    if compressed {
        let mut archive = ZipWriter::new(writer);
        let options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        archive.start_file(NPZ_ENTRY_NAME, options)?;
        archive.write_all(&bytes)?;
        archive.finish()?.flush()?;
    } else {
        writer.write_all(&bytes)?;
        writer.flush()?;
    }

    Ok(path)
}

/// Read a `.npy` file or the first array of a `.npz` archive.
pub fn load_array(path: &Path) -> Result<LoadedArray> {
    let is_archive = path
        .extension()
        .map(|e| e.to_string_lossy().eq_ignore_ascii_case(NPZ_EXTENSION))
        .unwrap_or(false);

    let bytes = if is_archive {
        let mut archive = ZipArchive::new(File::open(path)?)?;
        if archive.is_empty() {
            return Err(SamplerError::MalformedArray("archive has no entries".into()));
        }
        let mut entry = archive.by_index(0)?;
        let mut bytes = Vec::new();
        entry.read_to_end(&mut bytes)?;
        bytes
    } else {
        fs::read(path)?
    };

    decode_npy(&bytes)
}

pub fn decode_npy(bytes: &[u8]) -> Result<LoadedArray> {
    let malformed = |reason: &str| SamplerError::MalformedArray(reason.to_string());

    if bytes.len() < 10 || !bytes.starts_with(NPY_MAGIC) {
        return Err(malformed("missing .npy magic"));
    }

    let (header_len, header_start) = match bytes[6] {
        1 => (u16::from_le_bytes([bytes[8], bytes[9]]) as usize, 10),
        2 | 3 if bytes.len() >= 12 => (
            u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize,
            12,
        ),
        _ => return Err(malformed("unsupported .npy version")),
    };

    let data_start = header_start + header_len;
    if bytes.len() < data_start {
        return Err(malformed("truncated header"));
    }
    let header = std::str::from_utf8(&bytes[header_start..data_start])
        .map_err(|_| malformed("header is not valid text"))?;

    let descr = quoted_value(header, "descr").ok_or_else(|| malformed("missing descr"))?;
    let precision = Precision::from_descr(descr)
        .ok_or_else(|| SamplerError::MalformedArray(format!("unsupported dtype {descr}")))?;

    if header.contains("'fortran_order': True") {
        return Err(malformed("fortran ordered arrays are not supported"));
    }

    let shape = parse_shape(header).ok_or_else(|| malformed("missing or invalid shape"))?;
    let expected = shape
        .iter()
        .try_fold(precision.byte_width(), |acc, &dim| acc.checked_mul(dim))
        .ok_or_else(|| malformed("shape overflows the addressable size"))?;
    let payload = &bytes[data_start..];
    if payload.len() != expected {
        return Err(SamplerError::MalformedArray(format!(
            "expected {} data bytes, found {}",
            expected,
            payload.len()
        )));
    }

    let data = ArrayData::from_le_bytes(payload, precision)
        .ok_or_else(|| malformed("payload does not match dtype width"))?;

    Ok(LoadedArray { shape, data })
}

fn quoted_value<'a>(header: &'a str, key: &str) -> Option<&'a str> {
    let marker = format!("'{key}': '");
    let start = header.find(&marker)? + marker.len();
    let end = header[start..].find('\'')? + start;
    Some(&header[start..end])
}

fn parse_shape(header: &str) -> Option<Vec<usize>> {
    let marker = "'shape': (";
    let start = header.find(marker)? + marker.len();
    let end = header[start..].find(')')? + start;

    header[start..end]
        .split(',')
        .map(str::trim)
        .filter(|dim| !dim.is_empty())
        .map(|dim| dim.parse::<usize>().ok())
        .collect()
}
