//! Writes the installer artifact.
//!
//! The artifact is a zip holding the serialised model, the conditions, the
//! pack layout and bundled resources. Pack data goes either into one entry
//! per pack or, in multi-volume mode, through gzip into a
//! [`SpanningWriter`] volume set next to the artifact. Loose packs carry no
//! data at all; their files are read from beside the installer at install
//! time.

use crate::config::PackagingConfig;
use crate::descriptor::{Descriptor, LANGPACK_RESOURCE_PREFIX, LICENCE_RESOURCE_IDS};
use crate::error::{CompilerError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use flate2::Compression as GzLevel;
use flate2::write::GzEncoder;
use instill_common::model::{
    CONDITIONS_RESOURCE, Compression, INSTALLATION_RESOURCE, InstallationModel,
    LICENCE_RESOURCE, PACKS_RESOURCE, Pack, PackData, PacksInfo, VOLUMES_RESOURCE,
    custom_resource, langpack_resource, pack_resource,
};
use instill_common::spanning::{SpanningWriter, VolumeOptions, VolumeSet, VolumesInfo};
use instill_common::xml::to_xml_string;
use log::{debug, info};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, Read, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Extension of the first volume of a multi-volume set.
pub const VOLUME_EXTENSION: &str = "pak";

/// What [`package`] produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackageOutput {
    /// Path of the installer artifact.
    pub artifact: Utf8PathBuf,
    /// The volume set, in multi-volume mode.
    pub volumes: Option<VolumeSet>,
    /// Number of packs written.
    pub packs: usize,
    /// Number of pack files recorded.
    pub files: usize,
    /// Uncompressed bytes of pack data.
    pub payload_bytes: u64,
}

/// Path of the first volume for `artifact`: the same stem with `.pak`.
#[must_use]
pub fn volume_base(artifact: &Utf8Path) -> Utf8PathBuf {
    artifact.with_extension(VOLUME_EXTENSION)
}

/// Writes `descriptor` to `artifact`, filling in file sizes, digests and
/// stream positions on its model.
///
/// # Errors
///
/// Returns [`CompilerError::Io`] when a source cannot be read or the
/// artifact cannot be written, [`CompilerError::Archive`] for zip failures
/// and [`CompilerError::Spanning`] for volume failures.
pub fn package(
    descriptor: &mut Descriptor,
    artifact: &Utf8Path,
    config: &PackagingConfig,
) -> Result<PackageOutput> {
    if let Some(parent) = artifact.parent().filter(|parent| !parent.as_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|err| CompilerError::io(parent, err))?;
    }
    let file = File::create(artifact).map_err(|err| CompilerError::io(artifact, err))?;
    let mut archive = Archive {
        zip: ZipWriter::new(file),
        path: artifact.to_owned(),
    };
    let base_dir = descriptor.base_dir.clone();

    let mut packs_info = PacksInfo::default();
    let volumes = if config.multi_volume {
        let set = write_volumes(
            &mut descriptor.model,
            &base_dir,
            &volume_base(artifact),
            config.volume_options(),
            &mut packs_info,
        )?;
        info!("wrote {} volume(s) starting at {}", set.volume_count, set.base);
        Some(set)
    } else {
        write_pack_entries(
            &mut archive,
            &mut descriptor.model,
            &base_dir,
            config.compression,
            &mut packs_info,
        )?;
        None
    };
    descriptor.model.multi_volume = volumes.is_some();

    archive.json(INSTALLATION_RESOURCE, &descriptor.model)?;
    let conditions = to_xml_string(&descriptor.rules.write_xml())?;
    archive.entry(CONDITIONS_RESOURCE, conditions.as_bytes())?;
    archive.json(PACKS_RESOURCE, &packs_info)?;
    if let Some(set) = &volumes {
        let first_volume = set.base.file_name().unwrap_or(set.base.as_str()).to_owned();
        archive.json(
            VOLUMES_RESOURCE,
            &VolumesInfo {
                first_volume,
                volume_count: set.volume_count,
                payload_len: set.payload_len,
            },
        )?;
    }
    for resource in &descriptor.resources {
        let bytes =
            std::fs::read(&resource.path).map_err(|err| CompilerError::io(&resource.path, err))?;
        let entry = if LICENCE_RESOURCE_IDS.contains(&resource.id.as_str()) {
            LICENCE_RESOURCE.to_owned()
        } else if let Some(iso3) = resource.id.strip_prefix(LANGPACK_RESOURCE_PREFIX) {
            serde_json::from_slice::<BTreeMap<String, String>>(&bytes).map_err(|source| {
                CompilerError::Json {
                    resource: resource.path.to_string(),
                    source,
                }
            })?;
            langpack_resource(iso3)
        } else {
            custom_resource(&resource.id)
        };
        archive.entry(&entry, &bytes)?;
    }
    archive
        .zip
        .finish()
        .map_err(|source| CompilerError::Archive {
            path: artifact.to_owned(),
            source,
        })?;

    let model = &descriptor.model;
    Ok(PackageOutput {
        artifact: artifact.to_owned(),
        volumes,
        packs: model.packs.len(),
        files: model.packs.iter().map(|pack| pack.files.len()).sum(),
        payload_bytes: model.packs.iter().map(|pack| pack.size).sum(),
    })
}

struct Archive {
    zip: ZipWriter<File>,
    path: Utf8PathBuf,
}

impl Archive {
    fn start(&mut self, name: &str, options: SimpleFileOptions) -> Result<()> {
        self.zip
            .start_file(name, options)
            .map_err(|source| CompilerError::Archive {
                path: self.path.clone(),
                source,
            })
    }

    fn entry(&mut self, name: &str, bytes: &[u8]) -> Result<()> {
        self.start(name, deflated())?;
        self.zip
            .write_all(bytes)
            .map_err(|err| CompilerError::io(&self.path, err))
    }

    fn json(&mut self, name: &str, value: &impl Serialize) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value).map_err(|source| CompilerError::Json {
            resource: name.to_owned(),
            source,
        })?;
        self.entry(name, &bytes)
    }
}

fn deflated() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(CompressionMethod::Deflated)
}

fn write_pack_entries(
    archive: &mut Archive,
    model: &mut InstallationModel,
    base_dir: &Utf8Path,
    compression: Compression,
    packs_info: &mut PacksInfo,
) -> Result<()> {
    for (index, pack) in model.packs.iter_mut().enumerate() {
        if pack.loose {
            packs_info.packs.push(describe_loose(pack, base_dir)?);
            continue;
        }
        let options = match compression {
            Compression::Deflate => deflated(),
            Compression::None | Compression::Gzip | Compression::Zstd => {
                SimpleFileOptions::default().compression_method(CompressionMethod::Stored)
            }
        }
        .large_file(pack.size >= u64::from(u32::MAX));
        archive.start(&pack_resource(index), options)?;

        let path = archive.path.clone();
        let io_error = |err| CompilerError::io(&path, err);
        let mut offset = 0;
        match compression {
            Compression::None | Compression::Deflate => {
                stream_pack(pack, base_dir, &mut archive.zip, &path, &mut offset)?;
            }
            Compression::Gzip => {
                let mut encoder = GzEncoder::new(&mut archive.zip, GzLevel::default());
                stream_pack(pack, base_dir, &mut encoder, &path, &mut offset)?;
                encoder.finish().map_err(io_error)?;
            }
            Compression::Zstd => {
                let mut encoder = zstd::Encoder::new(&mut archive.zip, 0).map_err(io_error)?;
                stream_pack(pack, base_dir, &mut encoder, &path, &mut offset)?;
                encoder.finish().map_err(io_error)?;
            }
        }
        debug!("pack {} stored as {compression} ({offset} bytes)", pack.name);
        packs_info.packs.push(PackData {
            name: pack.name.clone(),
            compression,
            stream_offset: 0,
            stream_len: offset,
        });
    }
    Ok(())
}

fn write_volumes(
    model: &mut InstallationModel,
    base_dir: &Utf8Path,
    base: &Utf8Path,
    options: VolumeOptions,
    packs_info: &mut PacksInfo,
) -> Result<VolumeSet> {
    let writer = SpanningWriter::create(base, options)?;
    let mut encoder = GzEncoder::new(writer, GzLevel::default());
    let mut offset = 0;
    for pack in &mut model.packs {
        if pack.loose {
            packs_info.packs.push(describe_loose(pack, base_dir)?);
            continue;
        }
        let mut pack_len = 0;
        stream_pack(pack, base_dir, &mut encoder, base, &mut pack_len)?;
        packs_info.packs.push(PackData {
            name: pack.name.clone(),
            compression: Compression::Gzip,
            stream_offset: offset,
            stream_len: pack_len,
        });
        offset += pack_len;
    }
    let writer = encoder.finish().map_err(|err| CompilerError::io(base, err))?;
    Ok(writer.finish()?)
}

fn describe_loose(pack: &mut Pack, base_dir: &Utf8Path) -> Result<PackData> {
    let mut ignored = 0;
    stream_pack(pack, base_dir, &mut io::sink(), base_dir, &mut ignored)?;
    for file in &mut pack.files {
        file.position = 0;
    }
    Ok(PackData {
        name: pack.name.clone(),
        compression: Compression::None,
        stream_offset: 0,
        stream_len: 0,
    })
}

fn stream_pack(
    pack: &mut Pack,
    base_dir: &Utf8Path,
    sink: &mut impl Write,
    sink_path: &Utf8Path,
    offset: &mut u64,
) -> Result<()> {
    for file in &mut pack.files {
        let source = base_dir.join(&file.source);
        let (size, digest) = copy_hashed(&source, sink, sink_path)?;
        file.position = *offset;
        file.size = size;
        file.sha256 = digest;
        *offset += size;
    }
    pack.size = pack.files.iter().map(|file| file.size).sum();
    Ok(())
}

/// Copies `source` into `sink`, returning its length and SHA-256 hex digest.
fn copy_hashed(
    source: &Utf8Path,
    sink: &mut impl Write,
    sink_path: &Utf8Path,
) -> Result<(u64, String)> {
    let mut file = File::open(source).map_err(|err| CompilerError::io(source, err))?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];
    let mut total = 0_u64;
    loop {
        let bytes_read = file
            .read(&mut buffer)
            .map_err(|err| CompilerError::io(source, err))?;
        let Some(chunk) = buffer.get(..bytes_read).filter(|chunk| !chunk.is_empty()) else {
            break;
        };
        hasher.update(chunk);
        sink.write_all(chunk)
            .map_err(|err| CompilerError::io(sink_path, err))?;
        total += chunk.len() as u64;
    }
    Ok((total, format!("{:x}", hasher.finalize())))
}

#[cfg(test)]
#[path = "packager_tests.rs"]
mod tests;
