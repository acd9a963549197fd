//! LWG Studio - LWG 教学语言编辑器/调试器客户端控制器
//!
//! 模块划分：
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **controls**: 控制面状态机（运行/调试角色切换、边界标志、加速键）
//! - **core**: 会话控制器、命令循环、UI 状态投影、错误类型
//! - **exec**: 执行服务客户端（HTTP 实现 / Mock）与响应分类
//! - **observability**: 日志初始化
//! - **ui**: Ratatui TUI 界面
//! - **workspace**: Workspace 注册表、共享编辑面、变量字段管理

pub mod config;
pub mod controls;
pub mod core;
pub mod exec;
pub mod observability;
pub mod ui;
pub mod workspace;
