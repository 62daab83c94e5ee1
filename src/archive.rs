//! Unpacking the published dataset archive

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use zip::ZipArchive;

use crate::ui::{Phase, Ui};

/// Extract the `.csv` members of `zip_path` into `dest_dir`, flattening any
/// directory prefix. Returns the written paths.
pub fn unpack_dataset(zip_path: &Path, dest_dir: &Path, ui: &mut impl Ui) -> Result<Vec<PathBuf>> {
    let file = File::open(zip_path)
        .with_context(|| format!("Failed to open archive: {:?}", zip_path))?;
    let mut archive =
        ZipArchive::new(BufReader::new(file)).context("Failed to read zip archive")?;

    fs::create_dir_all(dest_dir)
        .with_context(|| format!("Failed to create directory: {:?}", dest_dir))?;

    ui.set_phase(Phase::Unpacking);
    ui.set_info(format!("{} -> {}", zip_path.display(), dest_dir.display()));

    let total = archive.len() as u64;
    let mut written = Vec::new();

    for i in 0..archive.len() {
        let mut member = archive
            .by_index(i)
            .context("Failed to read file from archive")?;
        ui.set_progress(i as u64 + 1, total, "members");

        if member.is_dir() {
            continue;
        }

        // enclosed_name rejects absolute paths and `..` components
        let file_name = match member
            .enclosed_name()
            .and_then(|p| p.file_name().map(|n| n.to_os_string()))
        {
            Some(name) => name,
            None => continue,
        };

        let is_csv = Path::new(&file_name)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if !is_csv {
            continue;
        }

        let dest_path = dest_dir.join(&file_name);
        let mut dest_file = File::create(&dest_path)
            .with_context(|| format!("Failed to create file: {:?}", dest_path))?;
        io::copy(&mut member, &mut dest_file)
            .with_context(|| format!("Failed to extract: {:?}", file_name))?;

        ui.log(format!("extracted {}", dest_path.display()));
        written.push(dest_path);
    }

    ui.clear_progress();
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::SilentUi;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    #[test]
    fn test_unpack_keeps_only_csv_members() {
        let dir = TempDir::new().unwrap();
        let zip_path = dir.path().join("dataset.zip");

        let mut zip = zip::ZipWriter::new(File::create(&zip_path).unwrap());
        let options = SimpleFileOptions::default();
        zip.add_directory("bears/", options).unwrap();
        zip.start_file("bears/deployments.csv", options).unwrap();
        zip.write_all(b"BearID,PTT_ID\n1,2\n").unwrap();
        zip.start_file("bears/README.txt", options).unwrap();
        zip.write_all(b"metadata").unwrap();
        zip.start_file("bears/status.CSV", options).unwrap();
        zip.write_all(b"DeployID\n1\n").unwrap();
        zip.finish().unwrap();

        let dest = dir.path().join("out");
        let mut written = unpack_dataset(&zip_path, &dest, &mut SilentUi::new()).unwrap();
        written.sort();

        assert_eq!(
            written,
            vec![dest.join("deployments.csv"), dest.join("status.CSV")]
        );
        assert_eq!(
            fs::read_to_string(dest.join("deployments.csv")).unwrap(),
            "BearID,PTT_ID\n1,2\n"
        );
        assert!(!dest.join("README.txt").exists());
    }
}
