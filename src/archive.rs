//! Archive extraction.
//!
//! The decoder is picked from the file's content signature, falling back to
//! its extension when the signature is hidden or missing. Problems with the
//! archive itself come back as an [`UnpackOutcome`] so the caller can route
//! the file elsewhere; only I/O failures around the archive (opening it,
//! writing the destination) are returned as errors.

use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::io::{self, BufReader, Cursor, Read, Write};
use std::path::Path;
use tracing::{debug, warn};
use zip::result::ZipError;

/// Decompressed bytes inspected to tell a gzipped tarball from a plain gzip stream.
const TAR_PROBE_LEN: usize = 512;

/// Formats this module can extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    Tar,
    Gzip,
}

/// Result of an extraction attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnpackOutcome {
    /// The archive was extracted; `files` regular files were written.
    Extracted { files: usize },
    /// The content is recognizable but not an archive we can extract.
    Unsupported { format: String },
    /// The content is not a readable archive.
    Corrupt { reason: String },
}

impl std::fmt::Display for UnpackOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Extracted { files } => write!(f, "extracted {} file(s)", files),
            Self::Unsupported { format } => write!(f, "unsupported archive format: {}", format),
            Self::Corrupt { reason } => write!(f, "corrupt archive: {}", reason),
        }
    }
}

/// Internal failure of a single extraction, split by who is to blame.
enum UnpackError {
    Unsupported(String),
    Corrupt(String),
    Io(io::Error),
}

impl UnpackError {
    /// Classifies an error raised while reading archive data.
    fn from_read(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::InvalidData
            | io::ErrorKind::InvalidInput
            | io::ErrorKind::UnexpectedEof
            | io::ErrorKind::Other => Self::Corrupt(e.to_string()),
            _ => Self::Io(e),
        }
    }

    fn from_zip(e: ZipError) -> Self {
        match e {
            ZipError::Io(e) => Self::from_read(e),
            ZipError::UnsupportedArchive(reason) => Self::Unsupported(reason.to_string()),
            other => Self::Corrupt(other.to_string()),
        }
    }
}

impl From<io::Error> for UnpackError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

/// Bytes read from the head of a file for signature checks.
const SNIFF_LEN: u64 = 8192;

/// What content detection found out about a file.
struct Detected {
    /// Decoder to try, from the content signature or else the extension.
    format: Option<ArchiveFormat>,
    /// MIME type of recognizable non-archive content.
    foreign: Option<String>,
}

fn detect(path: &Path) -> io::Result<Detected> {
    let mut head = Vec::new();
    File::open(path)?.take(SNIFF_LEN).read_to_end(&mut head)?;

    // Checked before `infer::get`: office documents and other zip containers
    // report their own MIME type but carry a plain zip signature.
    let by_signature = if infer::archive::is_zip(&head) {
        Some(ArchiveFormat::Zip)
    } else if infer::archive::is_gz(&head) {
        Some(ArchiveFormat::Gzip)
    } else if infer::archive::is_tar(&head) {
        Some(ArchiveFormat::Tar)
    } else {
        None
    };
    if by_signature.is_some() {
        return Ok(Detected {
            format: by_signature,
            foreign: None,
        });
    }

    // Self-extracting stubs and similar prefixes hide the signature, so the
    // extension still gets a chance at picking the decoder.
    Ok(Detected {
        format: format_from_extension(path),
        foreign: infer::get(&head).map(|kind| kind.mime_type().to_string()),
    })
}

fn format_from_extension(path: &Path) -> Option<ArchiveFormat> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "zip" => Some(ArchiveFormat::Zip),
        "tar" => Some(ArchiveFormat::Tar),
        "gz" | "tgz" => Some(ArchiveFormat::Gzip),
        _ => None,
    }
}

/// Extracts `archive` into `destination`, creating it.
///
/// `destination` must not exist yet. If extraction fails part way, whatever
/// was written is removed again before the outcome is returned, and the
/// source archive is never touched.
pub fn unpack(archive: &Path, destination: &Path) -> io::Result<UnpackOutcome> {
    let detected = detect(archive)?;
    let Some(format) = detected.format else {
        return Ok(match detected.foreign {
            Some(format) => UnpackOutcome::Unsupported { format },
            None => UnpackOutcome::Corrupt {
                reason: "no recognizable archive signature".to_string(),
            },
        });
    };
    debug!(archive = %archive.display(), ?format, "extracting");

    fs::create_dir_all(destination)?;
    let result = match format {
        ArchiveFormat::Zip => unpack_zip(archive, destination),
        ArchiveFormat::Tar => File::open(archive)
            .map_err(UnpackError::from)
            .and_then(|file| unpack_tar(BufReader::new(file), destination)),
        ArchiveFormat::Gzip => unpack_gzip(archive, destination),
    };

    let outcome = match (result, detected.foreign) {
        (Ok(files), _) => return Ok(UnpackOutcome::Extracted { files }),
        (Err(UnpackError::Io(e)), _) => return Err(e),
        (Err(UnpackError::Unsupported(format)), _) => UnpackOutcome::Unsupported { format },
        // Some other kind of file that only carries an archive extension.
        (Err(UnpackError::Corrupt(_)), Some(format)) => UnpackOutcome::Unsupported { format },
        (Err(UnpackError::Corrupt(reason)), None) => UnpackOutcome::Corrupt { reason },
    };
    fs::remove_dir_all(destination)?;
    Ok(outcome)
}

fn unpack_zip(archive: &Path, destination: &Path) -> Result<usize, UnpackError> {
    let file = File::open(archive)?;
    let mut reader =
        zip::ZipArchive::new(BufReader::new(file)).map_err(UnpackError::from_zip)?;
    let mut files = 0;

    for i in 0..reader.len() {
        let mut entry = reader.by_index(i).map_err(UnpackError::from_zip)?;
        let Some(relative) = entry.enclosed_name() else {
            warn!(entry = entry.name(), "skipping zip entry outside the extraction directory");
            continue;
        };
        let target = destination.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&target)?;
            continue;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&target)?;
        io::copy(&mut entry, &mut out).map_err(UnpackError::from_read)?;
        files += 1;
    }

    Ok(files)
}

fn unpack_tar<R: Read>(reader: R, destination: &Path) -> Result<usize, UnpackError> {
    let mut archive = tar::Archive::new(reader);
    let mut files = 0;

    for entry in archive.entries().map_err(UnpackError::from_read)? {
        let mut entry = entry.map_err(UnpackError::from_read)?;
        let is_file = entry.header().entry_type().is_file();
        // unpack_in refuses paths that would land outside `destination`
        let written = entry
            .unpack_in(destination)
            .map_err(UnpackError::from_read)?;
        if written && is_file {
            files += 1;
        }
    }

    Ok(files)
}

fn unpack_gzip(archive: &Path, destination: &Path) -> Result<usize, UnpackError> {
    let mut decoder = GzDecoder::new(BufReader::new(File::open(archive)?));
    let mut head = Vec::with_capacity(TAR_PROBE_LEN);
    (&mut decoder)
        .take(TAR_PROBE_LEN as u64)
        .read_to_end(&mut head)
        .map_err(UnpackError::from_read)?;

    if infer::archive::is_tar(&head) {
        return unpack_tar(Cursor::new(head).chain(decoder), destination);
    }

    // A single compressed file: name it after the archive minus ".gz".
    let name = archive
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_else(|| "unpacked".into());
    let mut out = File::create(destination.join(name))?;
    out.write_all(&head)?;
    io::copy(&mut decoder, &mut out).map_err(UnpackError::from_read)?;
    Ok(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use tempfile::TempDir;

    fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let file = File::create(path).expect("Failed to create zip");
        let mut writer = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();
        for (name, data) in entries {
            writer.start_file(*name, options).expect("Failed to start entry");
            writer.write_all(data).expect("Failed to write entry");
        }
        writer.finish().expect("Failed to finish zip");
    }

    fn write_tar_gz(path: &Path, entries: &[(&str, &[u8])]) {
        let file = File::create(path).expect("Failed to create tar.gz");
        let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
        for (name, data) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, name, *data)
                .expect("Failed to append entry");
        }
        builder
            .into_inner()
            .expect("Failed to finish tar")
            .finish()
            .expect("Failed to finish gzip");
    }

    #[test]
    fn test_unpack_zip() {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let archive = temp.path().join("bundle.zip");
        write_zip(&archive, &[("a.txt", b"alpha"), ("nested/b.txt", b"beta")]);
        let dest = temp.path().join("out");

        let outcome = unpack(&archive, &dest).expect("unpack failed");
        assert_eq!(outcome, UnpackOutcome::Extracted { files: 2 });
        assert_eq!(fs::read(dest.join("a.txt")).unwrap(), b"alpha");
        assert_eq!(fs::read(dest.join("nested/b.txt")).unwrap(), b"beta");
        assert!(archive.exists(), "source archive is left to the caller");
    }

    #[test]
    fn test_unpack_tar_gz() {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let archive = temp.path().join("bundle.tar.gz");
        write_tar_gz(&archive, &[("inner/c.txt", b"gamma")]);
        let dest = temp.path().join("out");

        let outcome = unpack(&archive, &dest).expect("unpack failed");
        assert_eq!(outcome, UnpackOutcome::Extracted { files: 1 });
        assert_eq!(fs::read(dest.join("inner/c.txt")).unwrap(), b"gamma");
    }

    #[test]
    fn test_unpack_plain_gzip() {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let archive = temp.path().join("data.csv.gz");
        let mut encoder = GzEncoder::new(
            File::create(&archive).expect("Failed to create gz"),
            Compression::default(),
        );
        encoder.write_all(b"a,b\n1,2\n").expect("Failed to write gz");
        encoder.finish().expect("Failed to finish gz");
        let dest = temp.path().join("out");

        let outcome = unpack(&archive, &dest).expect("unpack failed");
        assert_eq!(outcome, UnpackOutcome::Extracted { files: 1 });
        assert_eq!(fs::read(dest.join("data.csv")).unwrap(), b"a,b\n1,2\n");
    }

    #[test]
    fn test_unpack_garbage_is_corrupt() {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let archive = temp.path().join("corrupt.zip");
        fs::write(&archive, "this is not an archive").unwrap();
        let dest = temp.path().join("out");

        let outcome = unpack(&archive, &dest).expect("unpack failed");
        assert!(matches!(outcome, UnpackOutcome::Corrupt { .. }));
        assert!(!dest.exists());
        assert!(archive.exists());
    }

    #[test]
    fn test_unpack_truncated_zip_cleans_up() {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let archive = temp.path().join("broken.zip");
        write_zip(&archive, &[("a.txt", b"alpha")]);
        let bytes = fs::read(&archive).unwrap();
        fs::write(&archive, &bytes[..12]).unwrap();
        let dest = temp.path().join("out");

        let outcome = unpack(&archive, &dest).expect("unpack failed");
        assert!(matches!(outcome, UnpackOutcome::Corrupt { .. }));
        assert!(!dest.exists(), "partial extraction must be removed");
    }

    #[test]
    fn test_unpack_foreign_format_is_unsupported() {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let archive = temp.path().join("picture.zip");
        fs::write(
            &archive,
            [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D],
        )
        .unwrap();
        let dest = temp.path().join("out");

        let outcome = unpack(&archive, &dest).expect("unpack failed");
        assert_eq!(
            outcome,
            UnpackOutcome::Unsupported {
                format: "image/png".to_string()
            }
        );
        assert!(!dest.exists());
    }

    #[test]
    fn test_unpack_zip_with_office_layout() {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let archive = temp.path().join("backup.zip");
        write_zip(&archive, &[("word/notes.txt", b"n"), ("word/todo.txt", b"t")]);
        let dest = temp.path().join("out");

        let outcome = unpack(&archive, &dest).expect("unpack failed");
        assert_eq!(outcome, UnpackOutcome::Extracted { files: 2 });
        assert_eq!(fs::read(dest.join("word/todo.txt")).unwrap(), b"t");
    }

    #[test]
    fn test_unpack_zip_with_leading_stub() {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let plain = temp.path().join("plain.zip");
        write_zip(&plain, &[("payload.txt", b"inside")]);
        let mut bytes = b"#!/bin/sh\necho self-extracting\nexit 0\n".to_vec();
        bytes.extend(fs::read(&plain).unwrap());
        let archive = temp.path().join("sfx.zip");
        fs::write(&archive, bytes).unwrap();
        let dest = temp.path().join("out");

        let outcome = unpack(&archive, &dest).expect("unpack failed");
        assert_eq!(outcome, UnpackOutcome::Extracted { files: 1 });
        assert_eq!(fs::read(dest.join("payload.txt")).unwrap(), b"inside");
    }

    #[test]
    fn test_format_chosen_by_signature_then_extension() {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let zip_path = temp.path().join("x.bin");
        write_zip(&zip_path, &[("a.txt", b"a")]);
        let gz_path = temp.path().join("x.tar.gz");
        write_tar_gz(&gz_path, &[("a.txt", b"a")]);
        let text = temp.path().join("x.txt");
        fs::write(&text, "hello").unwrap();
        let named = temp.path().join("x.TGZ");
        fs::write(&named, "hello").unwrap();

        assert_eq!(detect(&zip_path).unwrap().format, Some(ArchiveFormat::Zip));
        assert_eq!(detect(&gz_path).unwrap().format, Some(ArchiveFormat::Gzip));
        assert_eq!(detect(&text).unwrap().format, None);
        assert_eq!(detect(&named).unwrap().format, Some(ArchiveFormat::Gzip));
    }

    #[test]
    fn test_outcome_display() {
        let outcome = UnpackOutcome::Corrupt {
            reason: "bad header".to_string(),
        };
        assert_eq!(outcome.to_string(), "corrupt archive: bad header");
    }
}
