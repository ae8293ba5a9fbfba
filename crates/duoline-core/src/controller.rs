//! Routes commands to the active line.

use crate::config::{ControlConfig, DemoConfig};
use crate::input::LineCommand;
use crate::line::{HostLine, Line, LineVariant, RasterLine};
use crate::surface::SharedSurface;

/// Which of the two lines receives commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ActiveLine {
    #[default]
    First,
    Second,
}

impl ActiveLine {
    /// The other line.
    pub fn toggle(self) -> Self {
        match self {
            ActiveLine::First => ActiveLine::Second,
            ActiveLine::Second => ActiveLine::First,
        }
    }

    fn index(self) -> usize {
        match self {
            ActiveLine::First => 0,
            ActiveLine::Second => 1,
        }
    }
}

/// Apply one command to `line`.
///
/// `ToggleActive` concerns the controller, not a line, and is ignored here.
pub fn apply<L: Line + ?Sized>(line: &mut L, command: LineCommand, controls: &ControlConfig) {
    let step = controls.move_step;
    match command {
        LineCommand::ToggleActive => {}
        LineCommand::MoveUp => line.move_by(0, -step),
        LineCommand::MoveDown => line.move_by(0, step),
        LineCommand::MoveLeft => line.move_by(-step, 0),
        LineCommand::MoveRight => line.move_by(step, 0),
        LineCommand::RotateCounterClockwise => line.rotate_counter_clockwise(),
        LineCommand::RotateClockwise => line.rotate_clockwise(),
        LineCommand::Shrink => line.resize(-controls.resize_step),
        LineCommand::Grow => line.resize(controls.resize_step),
    }
}

/// Two lines and the selector deciding which one is driven.
#[derive(Debug)]
pub struct Controller {
    lines: [LineVariant; 2],
    active: ActiveLine,
    controls: ControlConfig,
}

impl Controller {
    /// Drive `first` and `second`, starting with `first`.
    pub fn new(first: LineVariant, second: LineVariant, controls: ControlConfig) -> Self {
        Self {
            lines: [first, second],
            active: ActiveLine::default(),
            controls,
        }
    }

    /// The two-line demo: a host line first and a raster line second.
    ///
    /// The raster line is registered first so it sits underneath.
    pub fn demo(surface: &SharedSurface, config: &DemoConfig) -> Self {
        let controls = config.controls;
        let raster = RasterLine::new(surface, config.raster_segment(), controls);
        let host = HostLine::new(surface, config.host_segment(), controls);
        log::info!(
            "Demo ready: host line {}, raster line {}",
            host.handle(),
            raster.handle()
        );
        Self::new(host.into(), raster.into(), controls)
    }

    /// Run one command.
    pub fn handle(&mut self, command: LineCommand) {
        if command == LineCommand::ToggleActive {
            self.active = self.active.toggle();
            log::debug!(
                "Active line is now {:?} ({})",
                self.active,
                self.active_line().kind().name()
            );
            return;
        }

        log::debug!(
            "{:?} on {:?} ({})",
            command,
            self.active,
            self.active_line().kind().name()
        );
        let controls = self.controls;
        apply(self.active_line_mut(), command, &controls);
    }

    /// Which line is selected.
    pub fn active(&self) -> ActiveLine {
        self.active
    }

    pub fn active_line(&self) -> &LineVariant {
        &self.lines[self.active.index()]
    }

    pub fn active_line_mut(&mut self) -> &mut LineVariant {
        &mut self.lines[self.active.index()]
    }

    pub fn line(&self, which: ActiveLine) -> &LineVariant {
        &self.lines[which.index()]
    }

    pub fn lines(&self) -> &[LineVariant; 2] {
        &self.lines
    }

    pub fn controls(&self) -> &ControlConfig {
        &self.controls
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line::LineKind;
    use crate::scene::Scene;
    use kurbo::Point;

    fn demo() -> (SharedSurface, Controller) {
        let surface: SharedSurface = Scene::with_size(550.0, 550.0).into_shared();
        let controller = Controller::demo(&surface, &DemoConfig::default());
        (surface, controller)
    }

    #[test]
    fn test_demo_layout() {
        let (_surface, controller) = demo();
        assert_eq!(controller.active(), ActiveLine::First);
        assert_eq!(controller.line(ActiveLine::First).kind(), LineKind::Host);
        assert_eq!(controller.line(ActiveLine::Second).kind(), LineKind::Raster);
    }

    #[test]
    fn test_toggle_twice_restores() {
        let (_surface, mut controller) = demo();
        controller.handle(LineCommand::ToggleActive);
        assert_eq!(controller.active(), ActiveLine::Second);
        assert_eq!(controller.active_line().kind(), LineKind::Raster);
        controller.handle(LineCommand::ToggleActive);
        assert_eq!(controller.active(), ActiveLine::First);
    }

    #[test]
    fn test_commands_reach_active_line_only() {
        let (_surface, mut controller) = demo();
        controller.handle(LineCommand::MoveDown);
        controller.handle(LineCommand::MoveRight);

        let host = controller.line(ActiveLine::First).endpoints();
        let raster = controller.line(ActiveLine::Second).endpoints();
        assert_eq!(host.p0, Point::new(200.0, 200.0));
        assert_eq!(raster.p0, Point::new(100.0, 200.0));
    }

    #[test]
    fn test_apply_steps() {
        let surface: SharedSurface = Scene::with_size(550.0, 550.0).into_shared();
        let controls = ControlConfig {
            move_step: 5,
            rotation_step: 45.0,
            resize_step: 3,
            min_length: 0.0,
        };
        let mut line = RasterLine::new(
            &surface,
            kurbo::Line::new((10.0, 10.0), (20.0, 10.0)),
            controls,
        );

        apply(&mut line, LineCommand::MoveUp, &controls);
        apply(&mut line, LineCommand::MoveLeft, &controls);
        assert_eq!(line.pose().origin, Point::new(5.0, 5.0));

        apply(&mut line, LineCommand::Grow, &controls);
        assert!((line.length() - 13.0).abs() < 1e-10);
        apply(&mut line, LineCommand::Shrink, &controls);
        apply(&mut line, LineCommand::Shrink, &controls);
        assert!((line.length() - 7.0).abs() < 1e-10);

        apply(&mut line, LineCommand::RotateCounterClockwise, &controls);
        assert!((line.rotation() + 45.0).abs() < 1e-10);

        let before = line.endpoints();
        apply(&mut line, LineCommand::ToggleActive, &controls);
        assert_eq!(line.endpoints(), before);
    }

    #[test]
    fn test_apply_through_trait_object() {
        let (_surface, mut controller) = demo();
        let controls = *controller.controls();
        let line: &mut dyn Line = controller.active_line_mut();
        apply(line, LineCommand::Grow, &controls);
        assert!((controller.active_line().length() - 110.0).abs() < 1e-10);
    }
}
