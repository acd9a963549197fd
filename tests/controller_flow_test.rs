//! 会话控制器集成测试（Mock 执行服务）

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    use lwg_studio::controls::{AcceleratorKey, Action, ControlMode};
    use lwg_studio::core::{Command, SessionController};
    use lwg_studio::exec::protocol::{TYPE_BORDER_FIRST, TYPE_BORDER_LAST, TYPE_SUCCESS};
    use lwg_studio::exec::{ExecError, MockExecBackend};
    use lwg_studio::workspace::OutputView;

    fn setup() -> (SessionController, Arc<MockExecBackend>) {
        let mock = Arc::new(MockExecBackend::new());
        let controller = SessionController::new(mock.clone());
        (controller, mock)
    }

    async fn type_program(controller: &mut SessionController, code: &str) {
        controller
            .handle_command(Command::SetSource(code.to_string()))
            .await;
    }

    fn actions(controller: &SessionController) -> Vec<Action> {
        controller.ui_state().actions
    }

    #[tokio::test]
    async fn empty_source_run_never_reaches_the_network() {
        let (mut controller, mock) = setup();

        controller.handle_command(Command::Run).await;

        assert_eq!(mock.process_calls.load(Ordering::SeqCst), 0);
        let state = controller.ui_state();
        assert_eq!(
            state.output,
            OutputView::Notice("No code to execute.".to_string())
        );
        assert!(state.editable);
        assert!(state.actions.contains(&Action::Run));
        assert!(state.actions.contains(&Action::Debug));
    }

    #[tokio::test]
    async fn run_success_renders_variable_listing() {
        let (mut controller, mock) = setup();
        type_program(&mut controller, "X1 := X0 + 2").await;
        controller.handle_command(Command::AddVariable).await;
        controller
            .handle_command(Command::SetVariableValue {
                name: "X0".to_string(),
                raw: "5".to_string(),
            })
            .await;
        mock.push_process(Ok(MockExecBackend::success_response(&[("0", 5), ("1", 7)])));

        controller.handle_command(Command::Run).await;

        assert_eq!(mock.process_calls.load(Ordering::SeqCst), 1);
        let state = controller.ui_state();
        assert_eq!(
            state.output,
            OutputView::Listing {
                heading: "Success! Variables:".to_string(),
                bindings: vec![("x0".to_string(), 5), ("x1".to_string(), 7)],
            }
        );
        assert!(state.editable);
        assert!(!state.busy);
    }

    #[tokio::test]
    async fn run_error_outcome_renders_errors_and_stays_idle() {
        let (mut controller, mock) = setup();
        type_program(&mut controller, "LOOP X0").await;
        mock.push_process(Ok(MockExecBackend::error_response(&[
            "There were syntax errors in your code.",
            "line 1: unexpected end of input",
        ])));

        controller.handle_command(Command::Run).await;

        let state = controller.ui_state();
        assert_eq!(state.mode, ControlMode::RunControls);
        match state.output {
            OutputView::Errors(errors) => assert_eq!(errors.len(), 2),
            other => panic!("unexpected output {:?}", other),
        }
    }

    #[tokio::test]
    async fn run_transport_failure_restores_controls_and_editability() {
        let (mut controller, mock) = setup();
        type_program(&mut controller, "X0 := 1").await;
        mock.push_process(Err(ExecError::Network("connection refused".to_string())));

        controller.handle_command(Command::Run).await;

        let state = controller.ui_state();
        assert!(state.editable);
        assert!(!state.busy);
        assert!(state.actions.contains(&Action::Run));
        assert!(state.actions.contains(&Action::Debug));
        assert!(matches!(state.output, OutputView::Notice(_)));
    }

    #[tokio::test]
    async fn debug_success_enters_debug_mode_and_fetches_first_step() {
        let (mut controller, mock) = setup();
        type_program(&mut controller, "X0 := X0 + 1").await;
        mock.push_debug(Ok(MockExecBackend::success_response(&[])));
        mock.push_next(Ok(MockExecBackend::step_response(
            TYPE_BORDER_FIRST,
            1,
            &[("0", 1)],
        )));

        controller.handle_command(Command::Debug).await;

        assert_eq!(mock.debug_calls.load(Ordering::SeqCst), 1);
        assert_eq!(mock.next_calls.load(Ordering::SeqCst), 1);
        let state = controller.ui_state();
        assert_eq!(
            state.mode,
            ControlMode::DebugControls {
                at_first: true,
                at_last: false
            }
        );
        assert_eq!(state.highlighted_line, Some(1));
        assert!(state.editable);
    }

    #[tokio::test]
    async fn scripted_border_sequence_drives_step_availability() {
        let (mut controller, mock) = setup();
        type_program(&mut controller, "X0 := X0 + 1\nX1 := X0").await;
        mock.push_debug(Ok(MockExecBackend::success_response(&[])));
        mock.push_next(Ok(MockExecBackend::step_response(
            TYPE_BORDER_FIRST,
            1,
            &[("0", 1)],
        )));
        mock.push_next(Ok(MockExecBackend::step_response(
            TYPE_SUCCESS,
            2,
            &[("0", 1), ("1", 1)],
        )));
        mock.push_next(Ok(MockExecBackend::step_response(
            TYPE_BORDER_LAST,
            2,
            &[("0", 1), ("1", 1)],
        )));

        // 启动调试即强制取第一步：border_first 关掉后退
        controller.handle_command(Command::Debug).await;
        let current = actions(&controller);
        assert!(!current.contains(&Action::StepBackward));
        assert!(current.contains(&Action::StepForward));

        // 中间步：两个方向都可用
        controller.handle_command(Command::StepForward).await;
        let current = actions(&controller);
        assert!(current.contains(&Action::StepBackward));
        assert!(current.contains(&Action::StepForward));

        // 最后一步：前进关掉
        controller.handle_command(Command::StepForward).await;
        let current = actions(&controller);
        assert!(current.contains(&Action::StepBackward));
        assert!(!current.contains(&Action::StepForward));
        assert_eq!(mock.next_calls.load(Ordering::SeqCst), 3);

        // 被关掉的前进再按也不发请求
        controller.handle_command(Command::StepForward).await;
        assert_eq!(mock.next_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn debug_error_outcome_does_not_enter_debug_mode() {
        let (mut controller, mock) = setup();
        type_program(&mut controller, "GOTO M1").await;
        mock.push_debug(Ok(MockExecBackend::error_response(&[
            "There were runtime errors in your code.",
        ])));

        controller.handle_command(Command::Debug).await;

        assert_eq!(mock.next_calls.load(Ordering::SeqCst), 0);
        let state = controller.ui_state();
        assert_eq!(state.mode, ControlMode::RunControls);
        assert!(matches!(state.output, OutputView::Errors(_)));
        assert!(state.editable);
    }

    #[tokio::test]
    async fn unknown_outcome_kind_renders_generic_notice() {
        let (mut controller, mock) = setup();
        type_program(&mut controller, "X0 := 1").await;
        mock.push_process(Ok(lwg_studio::exec::ExecResponse {
            kind: "partial".to_string(),
            variables: Default::default(),
            errors: Vec::new(),
        }));

        controller.handle_command(Command::Run).await;

        let state = controller.ui_state();
        assert_eq!(
            state.output,
            OutputView::Notice("An unknown error occurred.".to_string())
        );
        assert_eq!(state.mode, ControlMode::RunControls);
    }

    #[tokio::test]
    async fn stop_leaves_debug_mode_even_when_transport_fails() {
        let (mut controller, mock) = setup();
        type_program(&mut controller, "X0 := 1").await;
        mock.push_debug(Ok(MockExecBackend::success_response(&[])));
        mock.push_next(Ok(MockExecBackend::step_response(
            TYPE_BORDER_FIRST,
            1,
            &[("0", 1)],
        )));
        mock.fail_stop_with(ExecError::Network("connection reset".to_string()));

        controller.handle_command(Command::Debug).await;
        assert!(controller.ui_state().mode != ControlMode::RunControls);

        controller.handle_command(Command::Stop).await;

        assert_eq!(mock.stop_calls.load(Ordering::SeqCst), 1);
        let state = controller.ui_state();
        assert_eq!(state.mode, ControlMode::RunControls);
        assert_eq!(state.highlighted_line, None);
        assert!(state.actions.contains(&Action::Run));
    }

    #[tokio::test]
    async fn stop_is_also_available_while_idle() {
        let (mut controller, mock) = setup();
        controller.handle_command(Command::Stop).await;
        assert_eq!(mock.stop_calls.load(Ordering::SeqCst), 1);
        assert_eq!(controller.ui_state().mode, ControlMode::RunControls);
    }

    #[tokio::test]
    async fn accelerators_only_step_while_debugging() {
        let (mut controller, mock) = setup();
        type_program(&mut controller, "X0 := 1").await;

        controller
            .handle_command(Command::Accelerator(AcceleratorKey::F11))
            .await;
        assert_eq!(mock.next_calls.load(Ordering::SeqCst), 0);

        mock.push_debug(Ok(MockExecBackend::success_response(&[])));
        mock.push_next(Ok(MockExecBackend::step_response(
            TYPE_BORDER_FIRST,
            1,
            &[("0", 1)],
        )));
        mock.push_next(Ok(MockExecBackend::step_response(
            TYPE_SUCCESS,
            2,
            &[("0", 2)],
        )));
        mock.push_previous(Ok(MockExecBackend::step_response(
            TYPE_BORDER_FIRST,
            1,
            &[("0", 1)],
        )));

        controller.handle_command(Command::Debug).await;
        controller
            .handle_command(Command::Accelerator(AcceleratorKey::F11))
            .await;
        assert_eq!(mock.next_calls.load(Ordering::SeqCst), 2);

        controller
            .handle_command(Command::Accelerator(AcceleratorKey::F10))
            .await;
        assert_eq!(mock.previous_calls.load(Ordering::SeqCst), 1);
        let state = controller.ui_state();
        assert!(!state.actions.contains(&Action::StepBackward));
    }

    #[tokio::test]
    async fn switching_workspaces_preserves_edits() {
        let (mut controller, _) = setup();
        type_program(&mut controller, "WHILE X0 != 0 DO X0 := X0 - 1 END").await;
        controller.handle_command(Command::AddVariable).await;
        controller
            .handle_command(Command::SetVariableValue {
                name: "X0".to_string(),
                raw: "3".to_string(),
            })
            .await;

        let epoch_before = controller.ui_state().workspace_epoch;
        controller.handle_command(Command::OpenWorkspace).await;
        let state = controller.ui_state();
        assert_eq!(state.active, 2);
        assert_eq!(state.source_text, "");
        assert!(state.variables.is_empty());
        assert!(state.workspace_epoch > epoch_before);

        controller.handle_command(Command::SwitchWorkspace(1)).await;
        let state = controller.ui_state();
        assert_eq!(state.active, 1);
        assert_eq!(state.source_text, "WHILE X0 != 0 DO X0 := X0 - 1 END");
        assert_eq!(state.variables.len(), 1);
        assert_eq!(state.variables[0].value, "3");
    }

    #[tokio::test]
    async fn closing_with_unexecuted_code_is_a_two_phase_confirmation() {
        let (mut controller, _) = setup();
        type_program(&mut controller, "X0 := 1").await;

        controller
            .handle_command(Command::CloseWorkspace {
                id: 1,
                confirmed: false,
            })
            .await;
        let state = controller.ui_state();
        assert_eq!(state.pending_close, Some(1));
        assert_eq!(state.workspaces, vec![1]);

        // 关掉最后一个 Workspace 会以相同 id 重建；epoch 必须递增，
        // 否则界面分不清「还是原来的 1 号」和「换成了新的 1 号」
        let epoch_before = state.workspace_epoch;
        controller
            .handle_command(Command::CloseWorkspace {
                id: 1,
                confirmed: true,
            })
            .await;
        let state = controller.ui_state();
        assert_eq!(state.pending_close, None);
        assert_eq!(state.workspaces, vec![1]);
        assert_eq!(state.source_text, "");
        assert!(state.workspace_epoch > epoch_before);
    }

    #[tokio::test]
    async fn closing_after_any_output_skips_confirmation() {
        let (mut controller, mock) = setup();
        type_program(&mut controller, "X0 := 1").await;
        mock.push_process(Ok(MockExecBackend::success_response(&[("0", 1)])));
        controller.handle_command(Command::Run).await;

        controller
            .handle_command(Command::CloseWorkspace {
                id: 1,
                confirmed: false,
            })
            .await;
        let state = controller.ui_state();
        assert_eq!(state.pending_close, None);
        assert_eq!(state.source_text, "");
    }

    #[tokio::test]
    async fn rename_rejection_surfaces_a_notice_and_reverts() {
        let (mut controller, _) = setup();
        controller.handle_command(Command::AddVariable).await;
        controller.handle_command(Command::AddVariable).await;

        controller
            .handle_command(Command::RenameVariable {
                old: "X0".to_string(),
                candidate: "X1".to_string(),
            })
            .await;

        let state = controller.ui_state();
        assert!(state.notice.is_some());
        let names: Vec<&str> = state.variables.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["X0", "X1"]);
    }
}
