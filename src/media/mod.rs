//! 临时媒体文件存储
//!
//! 生成的图片 / 音频写入数据目录，文件名带时间戳和 uuid 片段保证唯一，
//! 通过 `/media/<文件名>` 静态服务对外暴露。
//! 没有生命周期管理：文件存活到进程重启或外部清理为止。

use crate::error::MediaError;
use std::path::{Path, PathBuf};

/// 媒体 URL 前缀，与 server 的静态路由保持一致
pub const MEDIA_URL_PREFIX: &str = "/media";

/// 媒体文件存储
#[derive(Debug, Clone)]
pub struct MediaStore {
    data_dir: PathBuf,
}

impl MediaStore {
    /// 创建存储，数据目录不存在时自动创建
    pub fn new(data_dir: impl Into<PathBuf>) -> Result<Self, MediaError> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir)?;
        Ok(Self { data_dir })
    }

    /// 数据目录路径
    pub fn dir(&self) -> &Path {
        &self.data_dir
    }

    /// 保存场景插图，返回公开 URL
    pub async fn save_image(&self, bytes: &[u8], ext: &str) -> Result<String, MediaError> {
        self.save("image", bytes, ext).await
    }

    /// 保存旁白音频，返回公开 URL
    pub async fn save_audio(&self, bytes: &[u8], ext: &str) -> Result<String, MediaError> {
        self.save("story", bytes, ext).await
    }

    async fn save(&self, prefix: &str, bytes: &[u8], ext: &str) -> Result<String, MediaError> {
        let filename = unique_filename(prefix, ext);
        let path = self.data_dir.join(&filename);
        tokio::fs::write(&path, bytes).await?;
        tracing::debug!(
            "[MEDIA] 已保存 {} ({} 字节)",
            path.display(),
            bytes.len()
        );
        Ok(format!("{}/{}", MEDIA_URL_PREFIX, filename))
    }
}

/// 生成唯一文件名：`<前缀>_<时间戳>_<uuid前8位>.<扩展名>`
fn unique_filename(prefix: &str, ext: &str) -> String {
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("{}_{}_{}.{}", prefix, timestamp, &id[..8], ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_image_returns_media_url() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path()).unwrap();

        let url = store.save_image(b"fake-webp-bytes", "webp").await.unwrap();
        assert!(url.starts_with("/media/image_"));
        assert!(url.ends_with(".webp"));

        // 文件确实落盘
        let filename = url.strip_prefix("/media/").unwrap();
        let content = std::fs::read(dir.path().join(filename)).unwrap();
        assert_eq!(content, b"fake-webp-bytes");
    }

    #[tokio::test]
    async fn test_save_audio_unique_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path()).unwrap();

        let a = store.save_audio(b"mp3-a", "mp3").await.unwrap();
        let b = store.save_audio(b"mp3-b", "mp3").await.unwrap();
        assert_ne!(a, b);
        assert!(a.starts_with("/media/story_"));
    }

    #[test]
    fn test_new_creates_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("data").join("media");
        let store = MediaStore::new(&nested).unwrap();
        assert!(store.dir().exists());
    }
}
