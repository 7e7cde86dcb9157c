//! 领域实体定义
//!
//! 包含在线参与者、登录资料与上传文件。

pub mod file_upload;
pub mod participant;
pub mod user;

pub use file_upload::{FileKind, StoredFile, DEFAULT_CONTENT_TYPE};
pub use participant::Participant;
pub use user::LoginProfile;
