//! 存储 - 基础设施层
//!
//! 持有文件系统（或内存），只暴露"整文件读 / 整文件写"的能力

use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{AppError, AppResult};

/// 整文件存储
///
/// 职责：
/// - 按 key（文件路径）读写完整内容
/// - key 不存在时 `read` 返回 `None`
/// - 不认识 Question / ScoreRecord
pub trait Storage: Send + Sync {
    fn read(&self, key: &str) -> AppResult<Option<Vec<u8>>>;

    fn write(&self, key: &str, bytes: &[u8]) -> AppResult<()>;
}

impl<S: Storage + ?Sized> Storage for &S {
    fn read(&self, key: &str) -> AppResult<Option<Vec<u8>>> {
        (**self).read(key)
    }

    fn write(&self, key: &str, bytes: &[u8]) -> AppResult<()> {
        (**self).write(key, bytes)
    }
}

impl<S: Storage + ?Sized> Storage for std::sync::Arc<S> {
    fn read(&self, key: &str) -> AppResult<Option<Vec<u8>>> {
        (**self).read(key)
    }

    fn write(&self, key: &str, bytes: &[u8]) -> AppResult<()> {
        (**self).write(key, bytes)
    }
}

/// 基于文件系统的存储
///
/// 相对路径以 `root` 为基准；写入时先写同目录临时文件再原子替换
///
/// 读写是阻塞的，异步上下文中经 `spawn_blocking` 调用
#[derive(Debug, Clone, Default)]
pub struct FileStorage {
    root: Option<PathBuf>,
}

impl FileStorage {
    /// 使用当前工作目录
    pub fn new() -> Self {
        Self { root: None }
    }

    /// 相对路径以指定目录为基准
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn resolve(&self, key: &str) -> PathBuf {
        match &self.root {
            Some(root) => root.join(key),
            None => PathBuf::from(key),
        }
    }
}

impl Storage for FileStorage {
    fn read(&self, key: &str) -> AppResult<Option<Vec<u8>>> {
        let path = self.resolve(key);
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::file_read_failed(path.display().to_string(), e)),
        }
    }

    fn write(&self, key: &str, bytes: &[u8]) -> AppResult<()> {
        let path = self.resolve(key);
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let path_str = path.display().to_string();

        debug!("写入文件 {} ({} 字节)", path_str, bytes.len());

        let mut tmp = NamedTempFile::new_in(&dir)
            .map_err(|e| AppError::file_write_failed(path_str.clone(), e))?;
        tmp.write_all(bytes)
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| AppError::file_write_failed(path_str.clone(), e))?;
        tmp.persist(&path)
            .map_err(|e| AppError::file_write_failed(path_str, e.error))?;

        Ok(())
    }
}

/// 内存存储，用于测试和不落盘的场景
#[derive(Debug, Default)]
pub struct MemoryStorage {
    files: Mutex<HashMap<String, Vec<u8>>>,
    read_only: bool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// 所有写入都失败的存储，用于模拟磁盘错误
    pub fn read_only() -> Self {
        Self {
            files: Mutex::default(),
            read_only: true,
        }
    }

    /// 预置文件内容
    pub fn with_file(self, key: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.lock().insert(key.into(), bytes.into());
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>> {
        // 单线程使用，锁中毒时继续使用内部数据
        self.files.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Storage for MemoryStorage {
    fn read(&self, key: &str) -> AppResult<Option<Vec<u8>>> {
        Ok(self.lock().get(key).cloned())
    }

    fn write(&self, key: &str, bytes: &[u8]) -> AppResult<()> {
        if self.read_only {
            return Err(AppError::file_write_failed(
                key,
                std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only storage"),
            ));
        }
        self.lock().insert(key.to_string(), bytes.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_storage_missing_file_reads_none() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::with_root(dir.path());
        assert!(storage.read("scores.json").unwrap().is_none());
    }

    #[test]
    fn test_file_storage_rewrites_whole_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::with_root(dir.path());

        storage.write("quiz.json", b"first version, rather long").unwrap();
        storage.write("quiz.json", b"second").unwrap();

        assert_eq!(storage.read("quiz.json").unwrap().unwrap(), b"second");
        assert!(dir.path().join("quiz.json").is_file());
    }

    #[test]
    fn test_file_storage_write_into_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::with_root(dir.path().join("nope"));
        let err = storage.write("quiz.json", b"[]").unwrap_err();
        assert!(matches!(err, AppError::File(_)));
    }

    #[test]
    fn test_memory_storage() {
        let storage = MemoryStorage::new().with_file("a", "1");
        assert_eq!(storage.read("a").unwrap().unwrap(), b"1");
        storage.write("b", b"2").unwrap();
        assert_eq!(storage.read("b").unwrap().unwrap(), b"2");

        let read_only = MemoryStorage::read_only();
        assert!(read_only.write("a", b"x").is_err());
    }
}
