//! Copies a matched folder's photos into the media root.

use anyhow::{Context, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::natural::natural_cmp;
use super::slug::site_slug;

/// Extensions accepted as site photos, compared case-insensitively.
pub const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];

/// Subdirectory of the media root holding site photos.
pub const PHOTOS_DIR: &str = "photos";

/// A photo copied into the media root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachedImage {
    /// Path relative to the media root, `/`-separated.
    pub relative: String,
    pub sort_order: i64,
}

fn image_extension(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    IMAGE_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// Image files directly inside `folder`, in natural name order.
pub fn list_images(folder: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files: Vec<(String, PathBuf)> = Vec::new();
    for entry in fs::read_dir(folder)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() || image_extension(&path).is_none() {
            continue;
        }
        files.push((entry.file_name().to_string_lossy().into_owned(), path));
    }
    files.sort_by(|(a, _), (b, _)| natural_cmp(a, b));
    Ok(files.into_iter().map(|(_, p)| p).collect())
}

/// Copy up to `max_images` photos for a site.
///
/// Files land at `<media_root>/photos/<slug>/<id>_<pos>.<ext>` with `pos`
/// starting at 1 and `sort_order` equal to `pos - 1`, so a skipped file leaves
/// a gap in both. A file that fails to copy is logged and skipped. Failing to
/// create the site directory is an error.
pub fn attach_images(
    sources: &[PathBuf],
    media_root: &Path,
    site_id: i64,
    region: &str,
    governorate: &str,
    max_images: usize,
) -> Result<Vec<AttachedImage>> {
    if sources.is_empty() || max_images == 0 {
        return Ok(Vec::new());
    }
    let slug = site_slug(region, governorate);
    let dest_dir = media_root.join(PHOTOS_DIR).join(&slug);
    fs::create_dir_all(&dest_dir)
        .with_context(|| format!("failed to create media directory {}", dest_dir.display()))?;

    let mut attached = Vec::new();
    for (idx, src) in sources.iter().take(max_images).enumerate() {
        let pos = idx + 1;
        let ext = image_extension(src).unwrap_or_else(|| "jpg".to_string());
        let file_name = format!("{site_id}_{pos}.{ext}");
        let dest = dest_dir.join(&file_name);
        match fs::copy(src, &dest) {
            Ok(bytes) => {
                debug!(src = %src.display(), dest = %dest.display(), bytes, "copied site image");
                attached.push(AttachedImage {
                    relative: format!("{PHOTOS_DIR}/{slug}/{file_name}"),
                    sort_order: idx as i64,
                });
            }
            Err(err) => {
                warn!(
                    src = %src.display(),
                    dest = %dest.display(),
                    error = %err,
                    "failed to copy site image; skipping"
                );
            }
        }
    }
    Ok(attached)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let p = dir.join(name);
        fs::write(&p, name.as_bytes()).unwrap();
        p
    }

    #[test]
    fn lists_only_images_in_natural_order() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["img10.jpg", "img2.PNG", "img1.jpeg", "notes.txt", "clip.mp4"] {
            touch(dir.path(), name);
        }
        fs::create_dir(dir.path().join("nested.jpg")).unwrap();

        let names: Vec<String> = list_images(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["img1.jpeg", "img2.PNG", "img10.jpg"]);
    }

    #[test]
    fn copies_up_to_max_with_lowercased_extensions() {
        let src = tempfile::tempdir().unwrap();
        let media = tempfile::tempdir().unwrap();
        let sources = vec![
            touch(src.path(), "a.JPG"),
            touch(src.path(), "b.webp"),
            touch(src.path(), "c.png"),
        ];

        let attached =
            attach_images(&sources, media.path(), 7, "Eastern", "Al Jandal", 2).unwrap();
        assert_eq!(
            attached,
            vec![
                AttachedImage {
                    relative: "photos/eastern_al_jandal/7_1.jpg".into(),
                    sort_order: 0
                },
                AttachedImage {
                    relative: "photos/eastern_al_jandal/7_2.webp".into(),
                    sort_order: 1
                },
            ]
        );
        let copied = media.path().join("photos/eastern_al_jandal/7_1.jpg");
        assert_eq!(fs::read(copied).unwrap(), b"a.JPG");
        assert!(!media.path().join("photos/eastern_al_jandal/7_3.png").exists());
    }

    #[test]
    fn missing_source_is_skipped() {
        let src = tempfile::tempdir().unwrap();
        let media = tempfile::tempdir().unwrap();
        let sources = vec![src.path().join("gone.jpg"), touch(src.path(), "ok.jpg")];

        let attached = attach_images(&sources, media.path(), 1, "", "", 4).unwrap();
        assert_eq!(attached.len(), 1);
        assert_eq!(attached[0].relative, "photos/unassigned/1_2.jpg");
        assert_eq!(attached[0].sort_order, 1);
    }
}
