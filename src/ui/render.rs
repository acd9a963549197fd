//! 界面渲染
//!
//! 根据 UiState 绘制：顶部项目页签条，主体左侧源码（带行号与调试高亮行）、
//! 右侧变量字段与输出区，底部状态栏显示模式、可用动作、提示与关闭确认。

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::controls::{Action, ControlMode};
use crate::core::UiState;
use crate::workspace::OutputView;

/// 输入焦点：源码区或变量区
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputFocus {
    #[default]
    Editor,
    Variables,
}

/// 变量字段的编辑子状态
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FieldEdit {
    #[default]
    None,
    /// 正在改值（缓冲为原始输入）
    Value { buffer: String },
    /// 正在重命名（缓冲已过即时过滤）
    Rename { buffer: String },
}

/// UI 本地输入状态（不进控制器）
#[derive(Debug, Clone, Default)]
pub struct InputState {
    pub focus: InputFocus,
    pub selected_variable: usize,
    pub editing: FieldEdit,
}

/// 绘制一帧
pub fn draw(f: &mut Frame, state: &UiState, editor_buffer: &str, input_state: &InputState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(5),
            Constraint::Length(2),
        ])
        .split(f.area());

    draw_tabs(f, state, chunks[0]);

    let main = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(chunks[1]);

    draw_editor(f, state, editor_buffer, input_state, main[0]);

    let side = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(main[1]);

    draw_variables(f, state, input_state, side[0]);
    draw_output(f, state, side[1]);
    draw_status(f, state, chunks[2]);
}

fn draw_tabs(f: &mut Frame, state: &UiState, area: Rect) {
    let mut spans: Vec<Span> = Vec::new();
    for id in &state.workspaces {
        let label = format!(" Project {} ", id);
        if *id == state.active {
            spans.push(Span::styled(
                label,
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ));
        } else {
            spans.push(Span::styled(label, Style::default().fg(Color::Gray)));
        }
        spans.push(Span::raw("│"));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_editor(
    f: &mut Frame,
    state: &UiState,
    editor_buffer: &str,
    input_state: &InputState,
    area: Rect,
) {
    let focused = input_state.focus == InputFocus::Editor;
    let border = if focused { Color::Yellow } else { Color::DarkGray };
    let block = Block::default()
        .title(" 代码 ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border));

    let mut lines: Vec<Line> = Vec::new();
    for (index, text) in editor_buffer.split('\n').enumerate() {
        let number = index as u32 + 1;
        let highlighted = state.highlighted_line == Some(number);
        let marker = if highlighted { "▶" } else { " " };
        let style = if highlighted {
            Style::default().fg(Color::Black).bg(Color::Yellow)
        } else {
            Style::default()
        };
        lines.push(Line::from(vec![
            Span::styled(
                format!("{}{:>3} ", marker, number),
                Style::default().fg(Color::DarkGray),
            ),
            Span::styled(text.to_string(), style),
        ]));
    }
    if focused && state.editable {
        if let Some(last) = lines.last_mut() {
            last.spans.push(Span::styled("█", Style::default().fg(Color::Yellow)));
        }
    }

    let paragraph = Paragraph::new(Text::from(lines))
        .block(block)
        .wrap(Wrap { trim: false });
    f.render_widget(paragraph, area);
}

fn draw_variables(f: &mut Frame, state: &UiState, input_state: &InputState, area: Rect) {
    let focused = input_state.focus == InputFocus::Variables;
    let border = if focused { Color::Yellow } else { Color::DarkGray };
    let block = Block::default()
        .title(" 变量 ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border));

    let mut lines: Vec<Line> = Vec::new();
    for (index, binding) in state.variables.iter().enumerate() {
        let selected = focused && index == input_state.selected_variable;
        let (name, value) = match (&input_state.editing, selected) {
            (FieldEdit::Rename { buffer }, true) => (format!("{}█", buffer), binding.value.clone()),
            (FieldEdit::Value { buffer }, true) => (binding.name.clone(), format!("{}█", buffer)),
            _ => (binding.name.clone(), binding.value.clone()),
        };
        let shown_value = if value.is_empty() { "·".to_string() } else { value };
        let style = if selected {
            Style::default().fg(Color::Black).bg(Color::Cyan)
        } else {
            Style::default()
        };
        lines.push(Line::from(Span::styled(
            format!(" {}: {} ", name, shown_value),
            style,
        )));
    }
    if state.variables.is_empty() {
        lines.push(Line::from(Span::styled(
            " (无变量，按 a 添加) ",
            Style::default().fg(Color::DarkGray),
        )));
    }

    f.render_widget(Paragraph::new(Text::from(lines)).block(block), area);
}

fn draw_output(f: &mut Frame, state: &UiState, area: Rect) {
    let block = Block::default()
        .title(" 输出 ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let mut lines: Vec<Line> = Vec::new();
    match &state.output {
        OutputView::Empty => {
            lines.push(Line::from(Span::styled(
                "—",
                Style::default().fg(Color::DarkGray),
            )));
        }
        OutputView::Listing { heading, bindings } => {
            lines.push(Line::from(Span::styled(
                heading.clone(),
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            )));
            for (name, value) in bindings {
                lines.push(Line::from(format!("{}: {}", name, value)));
            }
        }
        OutputView::Errors(errors) => {
            for error in errors {
                for line in error.split('\n') {
                    lines.push(Line::from(Span::styled(
                        line.to_string(),
                        Style::default().fg(Color::Red),
                    )));
                }
            }
        }
        OutputView::Notice(notice) => {
            lines.push(Line::from(Span::styled(
                notice.clone(),
                Style::default().fg(Color::Yellow),
            )));
        }
    }

    let paragraph = Paragraph::new(Text::from(lines))
        .block(block)
        .wrap(Wrap { trim: false });
    f.render_widget(paragraph, area);
}

fn action_hint(action: Action) -> &'static str {
    match action {
        Action::Run => "Ctrl+R 运行",
        Action::Debug => "Ctrl+D 调试",
        Action::StepBackward => "F10 上一步",
        Action::StepForward => "F11 下一步",
        Action::Stop => "Ctrl+K 停止",
    }
}

fn draw_status(f: &mut Frame, state: &UiState, area: Rect) {
    let mode = match state.mode {
        ControlMode::RunControls => "空闲".to_string(),
        ControlMode::DebugControls { .. } if state.busy => "调试中…".to_string(),
        ControlMode::DebugControls { .. } => "调试".to_string(),
    };

    let actions = state
        .actions
        .iter()
        .map(|a| action_hint(*a))
        .collect::<Vec<_>>()
        .join(" │ ");

    let first = Line::from(vec![
        Span::styled(
            format!(" {} ", mode),
            Style::default().fg(Color::Black).bg(Color::Yellow),
        ),
        Span::raw(" "),
        Span::styled(actions, Style::default().fg(Color::DarkGray)),
        Span::styled(
            " │ Tab 切换焦点 │ Ctrl+T 新建 │ Ctrl+W 关闭 │ Ctrl+Q 退出",
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let second = if let Some(id) = state.pending_close {
        Line::from(Span::styled(
            format!(" 确认关闭 Project {}？代码尚未执行过 (y/n) ", id),
            Style::default().fg(Color::Black).bg(Color::Red),
        ))
    } else if let Some(notice) = &state.notice {
        Line::from(Span::styled(
            format!(" {} ", notice),
            Style::default().fg(Color::Yellow),
        ))
    } else {
        Line::from(Span::raw(""))
    };

    f.render_widget(Paragraph::new(vec![first, second]), area);
}
