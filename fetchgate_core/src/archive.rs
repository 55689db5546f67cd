use std::io::Write;
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::GatewayError;

/// Package `dir` into `<dir-name>.zip` inside `archive_dir`, returning the
/// archive's bare file name.
///
/// Entry names are the path segments from `dir` down to each regular file,
/// joined with `/` and prefixed with the name of `dir` itself behind a
/// leading separator, so every entry name starts with an empty segment.
/// Directories themselves produce no entries. Each file is read fully into
/// memory before being written.
pub fn archive(dir: &Path, archive_dir: &Path) -> Result<String, GatewayError> {
    std::fs::create_dir_all(archive_dir).map_err(|e| GatewayError::Archive(e.to_string()))?;

    let dir_name = dir
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| GatewayError::Archive(format!("directory has no usable name: {:?}", dir)))?;
    let out_name = format!("{}.zip", dir_name);
    let out_path = archive_dir.join(&out_name);

    let file =
        std::fs::File::create(&out_path).map_err(|e| GatewayError::Archive(e.to_string()))?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    add_entries(&mut zip, dir, &format!("/{}", dir_name), options)?;
    zip.finish().map_err(|e| GatewayError::Archive(e.to_string()))?;

    log::info!("[archive] wrote {:?}", out_path);
    Ok(out_name)
}

fn add_entries(
    zip: &mut ZipWriter<std::fs::File>,
    dir: &Path,
    prefix: &str,
    options: SimpleFileOptions,
) -> Result<(), GatewayError> {
    for entry in std::fs::read_dir(dir).map_err(|e| GatewayError::Archive(e.to_string()))? {
        let entry = entry.map_err(|e| GatewayError::Archive(e.to_string()))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let path = entry.path();
        log::debug!("[archive] visiting {}/{}", prefix, name);
        if path.is_dir() {
            add_entries(zip, &path, &format!("{}/{}", prefix, name), options)?;
        } else {
            let contents =
                std::fs::read(&path).map_err(|e| GatewayError::Archive(e.to_string()))?;
            zip.start_file(format!("{}/{}", prefix, name), options)
                .map_err(|e| GatewayError::Archive(e.to_string()))?;
            zip.write_all(&contents)
                .map_err(|e| GatewayError::Archive(e.to_string()))?;
        }
    }
    Ok(())
}
