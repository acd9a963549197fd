//! 事件处理
//!
//! 轮询 crossterm 键盘事件：全局快捷键（Ctrl+R 运行、Ctrl+D 调试、Ctrl+K 停止、
//! Ctrl+T 新建、Ctrl+Q 退出）直接转为 Command 发送，F10/F11 作为加速键原样上报
//! 由控制面按当前模式解析，其余按键交给 run_app 处理编辑与确认。

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tokio::sync::mpsc;

use crate::controls::AcceleratorKey;
use crate::core::Command;

/// 应用事件：来自快捷键的 Command 或原始 KeyEvent
#[derive(Debug, Clone)]
pub enum AppEvent {
    Command(Command),
    Key(KeyEvent),
}

/// 事件处理器：持有 cmd_tx，poll 时读键盘并返回 AppEvent
pub struct EventHandler {
    cmd_tx: mpsc::UnboundedSender<Command>,
}

impl EventHandler {
    pub fn new(cmd_tx: mpsc::UnboundedSender<Command>) -> Self {
        Self { cmd_tx }
    }

    pub fn poll(&self) -> anyhow::Result<Option<AppEvent>> {
        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    return Ok(Some(self.handle_key(key)));
                }
            }
        }
        Ok(None)
    }

    pub fn send(&self, command: Command) {
        let _ = self.cmd_tx.send(command);
    }

    fn handle_key(&self, key: KeyEvent) -> AppEvent {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('q') if ctrl => {
                self.send(Command::Quit);
                AppEvent::Command(Command::Quit)
            }
            KeyCode::Char('r') if ctrl => {
                self.send(Command::Run);
                AppEvent::Command(Command::Run)
            }
            KeyCode::Char('d') if ctrl => {
                self.send(Command::Debug);
                AppEvent::Command(Command::Debug)
            }
            KeyCode::Char('k') if ctrl => {
                self.send(Command::Stop);
                AppEvent::Command(Command::Stop)
            }
            KeyCode::Char('t') if ctrl => {
                self.send(Command::OpenWorkspace);
                AppEvent::Command(Command::OpenWorkspace)
            }
            KeyCode::F(10) => {
                self.send(Command::Accelerator(AcceleratorKey::F10));
                AppEvent::Command(Command::Accelerator(AcceleratorKey::F10))
            }
            KeyCode::F(11) => {
                self.send(Command::Accelerator(AcceleratorKey::F11));
                AppEvent::Command(Command::Accelerator(AcceleratorKey::F11))
            }
            _ => AppEvent::Key(key),
        }
    }
}
