use base64::Engine as _;

use super::*;

/// Contents of `retis_in_container.sh`, fetched once and installed on every
/// node.
#[derive(Clone)]
pub struct RetisScript {
    contents: Vec<u8>,
}

impl RetisScript {
    pub fn new(contents: impl Into<Vec<u8>>) -> Self {
        let contents = contents.into();
        Self { contents }
    }

    pub async fn download(url: &str) -> Result<Self, ScriptError> {
        tracing::info!(url, "Downloading RETIS helper script");
        let download_error = |source| ScriptError::Download {
            url: url.to_string(),
            source,
        };
        let contents = reqwest::get(url)
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(download_error)?
            .bytes()
            .await
            .map_err(download_error)?;
        if contents.is_empty() {
            return Err(ScriptError::Empty {
                url: url.to_string(),
            });
        }

        tracing::info!(url, bytes = contents.len(), "Downloaded RETIS helper script");
        Ok(Self::new(contents.to_vec()))
    }

    pub fn contents(&self) -> &[u8] {
        &self.contents
    }

    /// Shell snippet writing the script to `path` (creating `directory`
    /// first) and marking it executable. The contents travel base64 encoded
    /// so no copy into a debug pod is needed.
    pub(crate) fn install_command(&self, directory: &str, path: &str) -> String {
        let encoded = base64::engine::general_purpose::STANDARD.encode(&self.contents);
        let directory = escape(directory);
        let path = escape(path);
        format!("mkdir -p {directory} && echo {encoded} | base64 -d > {path} && chmod a+x {path}")
    }
}

impl fmt::Debug for RetisScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetisScript")
            .field("contents", &format_args!("<{} bytes>", self.contents.len()))
            .finish()
    }
}
