//! The `computer` tool: validates agent actions and dispatches them to the
//! input backend and the screenshot pipeline.
//!
//! One instance serves one agent session. [`ComputerTool::invoke`] takes
//! `&mut self`; actions run to completion one at a time. Hold actions leave
//! buttons or keys pressed after they return, and nothing releases them
//! except the matching release action.

use std::path::Path;

use base64::Engine;
use log::{debug, info};
use tokio::time::sleep;
use uuid::Uuid;

use crate::action::{
    self, Action, ActionRequest, Capture, Click, GameControl, KeyStroke, PointerMotion, TextInput,
};
use crate::config::{Config, DisplaySettings, ScreenshotConfig, TypingConfig};
use crate::error::{Result, ToolError};
use crate::input::keyboard;
use crate::input::{HeldInput, HeldInputs, InputBackend, InputError, MouseButton};
use crate::result::{ToolDescriptor, ToolOptions, ToolResult};
use crate::scaling::{CoordinateMapper, Resolution, SCALING_TARGETS};
use crate::shell::{CommandRunner, ShellRunner};

pub struct ComputerTool<I, R = ShellRunner> {
    display: DisplaySettings,
    mapper: CoordinateMapper,
    input: I,
    runner: R,
    screenshot: ScreenshotConfig,
    typing: TypingConfig,
    held: HeldInputs,
}

impl<I: InputBackend, R: CommandRunner> ComputerTool<I, R> {
    pub fn new(display: DisplaySettings, config: &Config, input: I, runner: R) -> Self {
        let mapper = CoordinateMapper::new(display.size, SCALING_TARGETS, config.scaling.enabled);
        match mapper.target() {
            Some(target) => info!(
                "Scaling {}x{} to {} ({}x{})",
                display.size.width,
                display.size.height,
                target.name,
                target.resolution.width,
                target.resolution.height
            ),
            None => debug!("No scaling target for {}x{}", display.size.width, display.size.height),
        }

        Self {
            display,
            mapper,
            input,
            runner,
            screenshot: config.screenshot.clone(),
            typing: config.typing.clone(),
            held: HeldInputs::default(),
        }
    }

    /// Options advertised to the agent, in scaled space
    pub fn options(&self) -> ToolOptions {
        ToolOptions::new(&self.mapper, self.display.display_num)
    }

    pub fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(self.options())
    }

    /// Inputs currently held by hold actions
    pub fn held(&self) -> &HeldInputs {
        &self.held
    }

    /// Validate and run one wire request.
    pub async fn invoke(&mut self, request: &ActionRequest) -> Result<ToolResult> {
        let action = Action::parse(request)?;
        self.run(action).await
    }

    /// Run an already validated action.
    pub async fn run(&mut self, action: Action) -> Result<ToolResult> {
        let kind = action.kind();
        debug!("Dispatching {}", kind);

        match action {
            Action::Pointer { motion, x, y } => self.pointer(motion, x, y),
            Action::Input { input: TextInput::Key, text } => self.key(&text).await,
            Action::Input { input: TextInput::Type, text } => self.type_text(&text).await,
            Action::Capture(Capture::Screenshot) => self.take_screenshot().await,
            Action::Capture(Capture::CursorPosition) => {
                let (px, py) = self.input.position()?;
                let (x, y) = self.mapper.to_logical(px, py);
                Ok(ToolResult::output(format!("X={},Y={}", x, y)))
            }
            Action::Click(click) => {
                self.click(click)?;
                Ok(ToolResult::output(format!("Performed {}", kind)))
            }
            Action::Game(control) => {
                self.game(control)?;
                Ok(ToolResult::output(format!("Performed {}", kind)))
            }
        }
    }

    fn pointer(&mut self, motion: PointerMotion, x: u32, y: u32) -> Result<ToolResult> {
        let (x, y) = self.mapper.to_physical(x, y)?;
        match motion {
            PointerMotion::Move => {
                self.input.move_to(x, y)?;
                Ok(ToolResult::output(format!("Moved mouse to {},{}", x, y)))
            }
            PointerMotion::Drag => {
                self.input.button(MouseButton::Left, true)?;
                let moved = self.input.move_to(x, y);
                let released = self.input.button(MouseButton::Left, false);
                moved.and(released)?;
                Ok(ToolResult::output(format!("Dragged mouse to {},{}", x, y)))
            }
        }
    }

    async fn key(&mut self, text: &str) -> Result<ToolResult> {
        match action::resolve_key(text) {
            KeyStroke::Hold { key, duration } => {
                self.input.key(&key, true)?;
                sleep(duration).await;
                self.input.key(&key, false)?;
            }
            KeyStroke::Press(key) => self.press(&key)?,
        }
        Ok(ToolResult::output(format!("Pressed key: {}", text)))
    }

    /// Press and release `key`, holding any `mod+` prefixes around it.
    fn press(&mut self, key: &str) -> Result<()> {
        let (modifiers, main_key) =
            keyboard::parse_key_combo(key).map_err(|_| InputError::UnknownKey(key.to_string()))?;
        let mut held = Vec::with_capacity(modifiers.len());
        let mut outcome = Ok(());
        for m in &modifiers {
            if let Err(e) = self.input.key(m, true) {
                outcome = Err(e);
                break;
            }
            held.push(*m);
        }
        if outcome.is_ok() {
            outcome = self
                .input
                .key(main_key, true)
                .and_then(|()| self.input.key(main_key, false));
        }
        // Release in reverse even after a failure; the first error wins
        for m in held.iter().rev() {
            let released = self.input.key(m, false);
            outcome = outcome.and(released);
        }
        outcome.map_err(ToolError::from)
    }

    async fn type_text(&mut self, text: &str) -> Result<ToolResult> {
        let delay = self.typing.delay();
        for chunk in action::chunks(text, self.typing.chunk_size) {
            for c in chunk.chars() {
                self.input.type_char(c)?;
                sleep(delay).await;
            }
        }

        sleep(self.screenshot.delay()).await;
        let shot = self.take_screenshot().await?;
        Ok(ToolResult {
            output: Some(format!("Typed: {}", text)),
            error: None,
            base64_image: shot.base64_image,
        })
    }

    fn click(&mut self, click: Click) -> Result<()> {
        let (button, times) = match click {
            Click::Left => (MouseButton::Left, 1),
            Click::Right => (MouseButton::Right, 1),
            Click::Middle => (MouseButton::Middle, 1),
            Click::Double => (MouseButton::Left, 2),
        };
        for _ in 0..times {
            self.input.button(button, true)?;
            self.input.button(button, false)?;
        }
        Ok(())
    }

    fn game(&mut self, control: GameControl) -> Result<()> {
        match control {
            GameControl::LeftDown => {
                self.input.button(MouseButton::Left, true)?;
                self.held.hold(HeldInput::Button(MouseButton::Left));
                info!("Holding left mouse button");
            }
            GameControl::LeftUp => {
                self.input.button(MouseButton::Left, false)?;
                self.held.release(&HeldInput::Button(MouseButton::Left));
            }
            GameControl::HoldArrow(arrow) => {
                self.input.key(arrow.key_name(), true)?;
                self.held.hold(HeldInput::Key(arrow.key_name().to_string()));
                info!("Holding {} arrow", arrow.key_name());
            }
            GameControl::ReleaseArrow(arrow) => {
                self.input.key(arrow.key_name(), false)?;
                self.held.release(&HeldInput::Key(arrow.key_name().to_string()));
            }
        }
        Ok(())
    }

    /// Capture the screen, normalise it to the configured size (and to the
    /// scaling target, when one is selected) and return it base64-encoded.
    pub async fn take_screenshot(&self) -> Result<ToolResult> {
        let output_dir = &self.screenshot.output_dir;
        tokio::fs::create_dir_all(output_dir).await?;
        let path = output_dir.join(format!("screenshot_{}.png", Uuid::new_v4().simple()));
        let path_str = path.display().to_string();

        let capture = self.screenshot.capture_command.replace("{path}", &path_str);
        let result = self
            .runner
            .run(&format!("{}{}", self.display.command_prefix(), capture))
            .await;

        self.runner.run(&self.resize_command(&path_str, self.mapper.size())).await;
        if self.mapper.target().is_some() {
            let scaled = self.mapper.scaled_size();
            self.runner.run(&self.resize_command(&path_str, scaled)).await;
        }

        if !file_exists(&path).await {
            return Err(ToolError::Capture(result.stderr));
        }
        let bytes = tokio::fs::read(&path).await?;
        debug!("Captured {} ({} bytes)", path_str, bytes.len());
        Ok(ToolResult::from(result).with_image(base64::engine::general_purpose::STANDARD.encode(bytes)))
    }

    fn resize_command(&self, path: &str, size: Resolution) -> String {
        self.screenshot
            .resize_command
            .replace("{path}", path)
            .replace("{width}", &size.width.to_string())
            .replace("{height}", &size.height.to_string())
    }
}

async fn file_exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}
