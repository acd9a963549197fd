//! TUI 应用主循环
//!
//! 进入全屏/原始模式，轮询 state_rx 与键盘事件：快捷键在 event 层直接转为
//! Command，其余按键在这里按焦点处理（源码编辑、变量增删改名、页签切换、
//! 关闭确认），每帧用 draw 渲染最新 UiState。

use std::io::{self, Stdout};

use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::{mpsc, watch};

use crate::core::{Command, UiState};
use crate::ui::event::{AppEvent, EventHandler};
use crate::ui::render::{draw, FieldEdit, InputFocus, InputState};
use crate::workspace::vars::filter_name_input;

/// 运行 TUI：启用原始模式与全屏，循环 poll 事件 + 渲染，退出时恢复终端
pub async fn run_app(
    mut state_rx: watch::Receiver<UiState>,
    cmd_tx: mpsc::UnboundedSender<Command>,
) -> anyhow::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let event_handler = EventHandler::new(cmd_tx);
    let mut input_state = InputState::default();
    let mut editor_buffer = String::new();
    let mut synced_epoch = u64::MAX;
    let mut applied_focus: Option<String> = None;

    loop {
        let state = state_rx.borrow_and_update().clone();

        // 编辑面换了内容（打开/切换/关闭）：编辑缓冲与本地输入状态跟着换。
        // 关闭最后一个 Workspace 会以相同 id 重建，所以不能只看 active。
        if state.workspace_epoch != synced_epoch {
            synced_epoch = state.workspace_epoch;
            editor_buffer = state.source_text.clone();
            input_state.selected_variable = 0;
            input_state.editing = FieldEdit::None;
        }

        // 新增变量的一次性聚焦信号
        if state.focused_field != applied_focus {
            applied_focus = state.focused_field.clone();
            if let Some(name) = &state.focused_field {
                if let Some(position) = state.variables.iter().position(|b| &b.name == name) {
                    input_state.focus = InputFocus::Variables;
                    input_state.selected_variable = position;
                    input_state.editing = FieldEdit::None;
                }
            }
        }

        if let Ok(Some(ev)) = event_handler.poll() {
            match ev {
                AppEvent::Command(Command::Quit) => break,
                AppEvent::Command(_) => {}
                AppEvent::Key(key) if state.pending_close.is_some() => {
                    handle_close_confirmation(&event_handler, &state, key);
                }
                AppEvent::Key(key) => {
                    handle_edit_key(
                        &event_handler,
                        &state,
                        &mut input_state,
                        &mut editor_buffer,
                        key,
                    );
                }
            }
        }

        terminal.draw(|f| draw(f, &state, &editor_buffer, &input_state))?;
        tokio::task::yield_now().await;
    }

    restore_terminal(&mut terminal)?;
    Ok(())
}

fn handle_close_confirmation(events: &EventHandler, state: &UiState, key: KeyEvent) {
    let Some(id) = state.pending_close else { return };
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => {
            events.send(Command::CloseWorkspace {
                id,
                confirmed: true,
            });
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            events.send(Command::DismissClose);
        }
        _ => {}
    }
}

fn handle_edit_key(
    events: &EventHandler,
    state: &UiState,
    input_state: &mut InputState,
    editor_buffer: &mut String,
    key: KeyEvent,
) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    // 与焦点无关的页签操作
    match key.code {
        KeyCode::Char('w') if ctrl => {
            events.send(Command::CloseWorkspace {
                id: state.active,
                confirmed: false,
            });
            return;
        }
        KeyCode::Left if ctrl => {
            if let Some(id) = neighbour_tab(state, false) {
                events.send(Command::SwitchWorkspace(id));
            }
            return;
        }
        KeyCode::Right if ctrl => {
            if let Some(id) = neighbour_tab(state, true) {
                events.send(Command::SwitchWorkspace(id));
            }
            return;
        }
        KeyCode::Tab => {
            input_state.focus = match input_state.focus {
                InputFocus::Editor => InputFocus::Variables,
                InputFocus::Variables => InputFocus::Editor,
            };
            input_state.editing = FieldEdit::None;
            return;
        }
        _ => {}
    }

    match input_state.focus {
        InputFocus::Editor => handle_editor_key(events, state, editor_buffer, key),
        InputFocus::Variables => handle_variables_key(events, state, input_state, key),
    }
}

fn handle_editor_key(
    events: &EventHandler,
    state: &UiState,
    editor_buffer: &mut String,
    key: KeyEvent,
) {
    if !state.editable {
        return;
    }
    match key.code {
        KeyCode::Char(c) => {
            editor_buffer.push(c);
            events.send(Command::SetSource(editor_buffer.clone()));
        }
        KeyCode::Enter => {
            editor_buffer.push('\n');
            events.send(Command::SetSource(editor_buffer.clone()));
        }
        KeyCode::Backspace => {
            editor_buffer.pop();
            events.send(Command::SetSource(editor_buffer.clone()));
        }
        _ => {}
    }
}

fn handle_variables_key(
    events: &EventHandler,
    state: &UiState,
    input_state: &mut InputState,
    key: KeyEvent,
) {
    let selected = state.variables.get(input_state.selected_variable);

    match std::mem::take(&mut input_state.editing) {
        FieldEdit::Rename { mut buffer } => {
            match key.code {
                KeyCode::Enter => {
                    if let Some(binding) = selected {
                        events.send(Command::RenameVariable {
                            old: binding.name.clone(),
                            candidate: buffer,
                        });
                    }
                }
                KeyCode::Esc => {}
                KeyCode::Backspace => {
                    buffer.pop();
                    input_state.editing = FieldEdit::Rename { buffer };
                }
                KeyCode::Char(c) => {
                    buffer.push(c);
                    input_state.editing = FieldEdit::Rename {
                        buffer: filter_name_input(&buffer),
                    };
                }
                _ => input_state.editing = FieldEdit::Rename { buffer },
            }
            return;
        }
        FieldEdit::Value { mut buffer } => {
            match key.code {
                KeyCode::Enter | KeyCode::Esc => {}
                KeyCode::Backspace => {
                    buffer.pop();
                    if let Some(binding) = selected {
                        events.send(Command::SetVariableValue {
                            name: binding.name.clone(),
                            raw: buffer.clone(),
                        });
                    }
                    input_state.editing = FieldEdit::Value { buffer };
                }
                KeyCode::Char(c) => {
                    buffer.push(c);
                    if let Some(binding) = selected {
                        events.send(Command::SetVariableValue {
                            name: binding.name.clone(),
                            raw: buffer.clone(),
                        });
                    }
                    input_state.editing = FieldEdit::Value { buffer };
                }
                _ => input_state.editing = FieldEdit::Value { buffer },
            }
            return;
        }
        FieldEdit::None => {}
    }

    match key.code {
        KeyCode::Up => {
            input_state.selected_variable = input_state.selected_variable.saturating_sub(1);
        }
        KeyCode::Down => {
            input_state.selected_variable = (input_state.selected_variable + 1)
                .min(state.variables.len().saturating_sub(1));
        }
        KeyCode::Char('a') => events.send(Command::AddVariable),
        KeyCode::Char('d') => {
            if let Some(binding) = selected {
                events.send(Command::RemoveVariable(binding.name.clone()));
            }
        }
        KeyCode::Char('r') => {
            if let Some(binding) = selected {
                input_state.editing = FieldEdit::Rename {
                    buffer: binding.name.clone(),
                };
            }
        }
        KeyCode::Enter => {
            if let Some(binding) = selected {
                input_state.editing = FieldEdit::Value {
                    buffer: binding.value.clone(),
                };
            }
        }
        _ => {}
    }
}

/// 活动页签的前/后邻居 id
fn neighbour_tab(state: &UiState, forward: bool) -> Option<u32> {
    let position = state.workspaces.iter().position(|id| *id == state.active)?;
    let target = if forward {
        position + 1
    } else {
        position.checked_sub(1)?
    };
    state.workspaces.get(target).copied()
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> anyhow::Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}
