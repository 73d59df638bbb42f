//! Display surface backed by an HTML file on disk.

use std::future::Future;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::render::template::base_href;
use crate::render::{AssetMapping, DisplaySurface};

/// Writes every preview document to one output file
#[derive(Debug, Clone)]
pub struct FileSurface {
    output: PathBuf,
    // (virtual base, local base)
    base_rewrite: Option<(String, String)>,
}

impl FileSurface {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
            base_rewrite: None,
        }
    }

    pub fn output(&self) -> &Path {
        &self.output
    }
}

impl DisplaySurface for FileSurface {
    /// A file has no virtual hosts, so the base URL points at the folder itself
    fn map_virtual_host(&mut self, mapping: &AssetMapping) -> Result<()> {
        let folder = std::fs::canonicalize(&mapping.folder).with_context(|| {
            format!("Asset folder not found: {}", mapping.folder.display())
        })?;

        self.base_rewrite = Some((
            format!("<base href=\"{}\">", base_href(&mapping.host)),
            format!("<base href=\"{}\">", file_url(&folder)),
        ));
        Ok(())
    }

    fn load_document(&mut self, html: String) -> impl Future<Output = Result<()>> + Send {
        let html = match &self.base_rewrite {
            Some((virtual_base, local_base)) => html.replacen(virtual_base, local_base, 1),
            None => html,
        };
        let output = self.output.clone();

        async move {
            tokio::fs::write(&output, html)
                .await
                .with_context(|| format!("Failed to write preview: {}", output.display()))
        }
    }
}

/// `file://` URL of a directory, with a trailing slash
fn file_url(folder: &Path) -> String {
    let mut path = folder.to_string_lossy().replace('\\', "/");
    if !path.starts_with('/') {
        path.insert(0, '/');
    }
    if !path.ends_with('/') {
        path.push('/');
    }
    format!("file://{path}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::Renderer;
    use tempfile::tempdir;

    #[test]
    fn test_file_url() {
        assert_eq!(file_url(Path::new("/srv/docs")), "file:///srv/docs/");
        assert_eq!(file_url(Path::new("/srv/docs/")), "file:///srv/docs/");
    }

    #[tokio::test]
    async fn test_writes_document() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("preview.html");
        let mut surface = FileSurface::new(&output);

        surface.load_document("<p>one</p>".to_string()).await.unwrap();
        surface.load_document("<p>two</p>".to_string()).await.unwrap();

        assert_eq!(std::fs::read_to_string(&output).unwrap(), "<p>two</p>");
    }

    #[tokio::test]
    async fn test_mapping_rewrites_base() {
        let dir = tempdir().unwrap();
        let assets = dir.path().join("assets");
        std::fs::create_dir(&assets).unwrap();
        let output = dir.path().join("preview.html");

        let mut surface = FileSurface::new(&output);
        surface
            .map_virtual_host(&AssetMapping {
                host: "local.example".to_string(),
                folder: assets.clone(),
            })
            .unwrap();

        let html = Renderer::default().render("![a](a.png)").unwrap().into_html();
        surface.load_document(html).await.unwrap();

        let written = std::fs::read_to_string(&output).unwrap();
        assert!(!written.contains("https://local.example/"));
        let expected = file_url(&std::fs::canonicalize(&assets).unwrap());
        assert!(written.contains(&format!("<base href=\"{expected}\">")));
    }

    #[test]
    fn test_missing_asset_folder() {
        let dir = tempdir().unwrap();
        let mut surface = FileSurface::new(dir.path().join("out.html"));
        let result = surface.map_virtual_host(&AssetMapping {
            host: "local.example".to_string(),
            folder: dir.path().join("nope"),
        });
        assert!(result.is_err());
    }
}
