//! 控制层错误类型

use thiserror::Error;

/// 注册表操作可能出现的错误；命令循环全部就地处理，不外泄
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("unknown workspace {0}")]
    UnknownWorkspace(u32),
}
