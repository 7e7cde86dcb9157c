//! 基础设施层实现。
//!
//! 提供应用层端口的具体适配器，目前是本地文件系统上的上传存储。

pub mod file_storage;

pub use file_storage::LocalUploadStore;
