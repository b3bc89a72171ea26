//! Sample management: upload, download, reanalyze, delete.

use std::path::Path;

use intel::{SampleHash, Sha1};
use sha1::{Digest, Sha1 as Sha1Hasher};
use tracing::{info, instrument};

use crate::endpoints::{self, BULK_LIMIT};
use crate::{TiCloudClient, TiCloudError};

/// SHA-1 of an in-memory sample, as required by the upload path.
pub fn sha1_of(content: &[u8]) -> Option<Sha1> {
    let digest = Sha1Hasher::digest(content);
    Sha1::new(format!("{digest:x}"))
}

/// The hash type shared by every hash; mixed types cannot share a bulk request.
fn single_type(hashes: &[SampleHash]) -> Result<intel::HashType, TiCloudError> {
    let first = hashes
        .first()
        .ok_or_else(|| TiCloudError::InvalidInput("no hashes given".to_string()))?
        .hash_type();
    if hashes.iter().any(|h| h.hash_type() != first) {
        return Err(TiCloudError::InvalidInput(
            "all hashes in one request must be of the same type".to_string(),
        ));
    }
    Ok(first)
}

impl TiCloudClient {
    /// Uploads a file from disk under its own file name.
    ///
    /// Returns the HTTP status code of the metadata request, which completes
    /// the upload.
    #[instrument(skip(self, path), fields(path = %path.display()))]
    pub async fn upload_sample_from_path(&self, path: &Path) -> Result<u16, TiCloudError> {
        let content = tokio::fs::read(path)
            .await
            .map_err(|source| TiCloudError::Io {
                path: path.display().to_string(),
                source,
            })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.upload_sample(content, &name).await
    }

    /// Uploads sample bytes with the given file name.
    #[instrument(skip(self, content), fields(size = content.len()))]
    pub async fn upload_sample(
        &self,
        content: Vec<u8>,
        file_name: &str,
    ) -> Result<u16, TiCloudError> {
        let sha1 = sha1_of(&content)
            .ok_or_else(|| TiCloudError::InvalidInput("cannot hash sample".to_string()))?;
        let what = format!("upload {sha1}");

        self.post_raw(
            &endpoints::upload(&sha1),
            "application/octet-stream",
            content,
            &what,
        )
        .await?;
        let status = self
            .post_raw(
                &endpoints::upload_meta(&sha1),
                "application/octet-stream",
                endpoints::upload_meta_xml(file_name, "").into_bytes(),
                &what,
            )
            .await?;
        info!(%sha1, status, "Sample uploaded");
        Ok(status)
    }

    /// Downloads the raw sample bytes.
    #[instrument(skip(self, hash), fields(hash = %hash))]
    pub async fn download_sample(&self, hash: &SampleHash) -> Result<Vec<u8>, TiCloudError> {
        self.get_bytes(&endpoints::download(hash), &format!("sample {hash}"))
            .await
    }

    /// Requests reanalysis of one or more samples; returns the response text.
    #[instrument(skip(self, hashes), fields(count = hashes.len()))]
    pub async fn reanalyze_samples(&self, hashes: &[SampleHash]) -> Result<String, TiCloudError> {
        let hash_type = single_type(hashes)?;
        if let [hash] = hashes {
            return self
                .get_text(&endpoints::reanalyze(hash), &format!("sample {hash}"))
                .await;
        }
        self.bulk_text(endpoints::REANALYZE_BULK, hash_type, hashes, "reanalysis")
            .await
    }

    /// Deletes one or more samples; returns the response text.
    #[instrument(skip(self, hashes), fields(count = hashes.len()))]
    pub async fn delete_samples(&self, hashes: &[SampleHash]) -> Result<String, TiCloudError> {
        let hash_type = single_type(hashes)?;
        if let [hash] = hashes {
            return self
                .delete_text(&endpoints::delete(hash), &format!("sample {hash}"))
                .await;
        }
        self.bulk_text(endpoints::DELETE_BULK, hash_type, hashes, "deletion")
            .await
    }

    async fn bulk_text(
        &self,
        path: &str,
        hash_type: intel::HashType,
        hashes: &[SampleHash],
        what: &str,
    ) -> Result<String, TiCloudError> {
        let mut responses = Vec::new();
        for chunk in hashes.chunks(BULK_LIMIT) {
            let raw: Vec<&str> = chunk.iter().map(SampleHash::as_str).collect();
            let body = endpoints::bulk_hash_query(hash_type, &raw);
            responses.push(self.post_text(path, &body, what).await?);
        }
        Ok(responses.join("\n"))
    }
}
