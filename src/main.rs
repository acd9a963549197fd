//! LWG Studio - LWG 教学语言编辑器/调试器客户端
//!
//! 入口：初始化日志、创建会话控制器与 TUI，并运行主循环。

use anyhow::Context;
use lwg_studio::{core::create_controller, observability, ui::run_app};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 日志：默认 info，可通过 RUST_LOG 覆盖
    observability::init();

    // 创建控制器：返回命令发送端与状态接收端
    let (cmd_tx, state_rx) =
        create_controller(None).context("Failed to create session controller")?;

    // 启动 TUI 主循环（消费 state，向 cmd_tx 发送用户指令）
    run_app(state_rx, cmd_tx)
        .await
        .context("App run failed")?;

    Ok(())
}
